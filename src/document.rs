//! Document Model
//!
//! 解析結果の永続ツリー。ルートは文書、各ノードは子ノードを
//! 挿入順（行順）のマップとして所有します。

use indexmap::IndexMap;
use serde::Serialize;

use crate::constants::DEFAULT_LOT;
use crate::types::{AttributeKey, Attributes, CriterionFamily, TagName, TagRole};

/// 計算された実体化パス
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComputedPaths {
    /// Request文書での実体化パス
    pub request_path: String,
    /// Response文書での回答パス（QUESTIONのみ）
    pub response_content: Option<String>,
    /// 回答値のパス（QUESTIONのみ）
    pub response_value: Option<String>,
}

/// 文書ツリーのノード
///
/// JSONには`type`、属性、`components`（子がある場合）の順で出力されます。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    #[serde(rename = "type")]
    pub kind: TagName,

    #[serde(flatten)]
    pub attributes: Attributes,

    #[serde(rename = "components", skip_serializing_if = "IndexMap::is_empty")]
    pub children: IndexMap<String, Node>,

    /// `Start`で開かれたコンテナか、`SelfClosing`の葉か
    #[serde(skip)]
    pub role: TagRole,

    /// 生成識別子（例: `RG2`）
    #[serde(skip)]
    pub identifier: String,

    /// ワークシート上のラベル（タグ列の左隣）
    #[serde(skip)]
    pub label: Option<String>,

    #[serde(skip)]
    pub row: u32,

    #[serde(skip)]
    pub column: u32,

    /// カーディナリティの`(d)`
    #[serde(skip)]
    pub occurrence: Option<u32>,

    #[serde(skip)]
    pub paths: ComputedPaths,
}

impl Node {
    /// 新しいノードを生成
    pub fn new(kind: TagName, role: TagRole, identifier: impl Into<String>) -> Self {
        Self {
            kind,
            attributes: Attributes::new(),
            children: IndexMap::new(),
            role,
            identifier: identifier.into(),
            label: None,
            row: 0,
            column: 0,
            occurrence: None,
            paths: ComputedPaths::default(),
        }
    }

    /// 属性値を取得
    pub fn attr(&self, key: AttributeKey) -> Option<&str> {
        self.attributes.get(&key).map(String::as_str)
    }

    /// 属性を設定（ビルダー形式）
    pub fn with_attr(mut self, key: AttributeKey, value: impl Into<String>) -> Self {
        self.attributes.insert(key, value.into());
        self
    }

    /// 子ノードを追加（ビルダー形式）
    pub fn with_child(mut self, key: impl Into<String>, child: Node) -> Self {
        self.children.insert(key.into(), child);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.attr(AttributeKey::Name)
    }

    pub fn description(&self) -> Option<&str> {
        self.attr(AttributeKey::Description)
    }

    pub fn cardinality(&self) -> &str {
        self.attr(AttributeKey::Cardinality).unwrap_or("1")
    }

    pub fn property_data_type(&self) -> Option<&str> {
        self.attr(AttributeKey::PropertyDataType)
    }

    pub fn element_code(&self) -> Option<&str> {
        self.attr(AttributeKey::ElementCode)
    }

    /// 繰り返しの2番目以降の出現か
    pub fn is_repeated_occurrence(&self) -> bool {
        self.occurrence.is_some_and(|n| n > 1)
    }

    /// 表示用のカーディナリティ（`(1)`を除去）
    pub fn display_cardinality(&self) -> String {
        self.cardinality().replace("(1)", "").trim().to_string()
    }

    /// コンテナの入れ子の深さ（葉は0、子を持たないコンテナは1）
    pub fn container_depth(&self) -> usize {
        match self.role {
            TagRole::SelfClosing => 0,
            _ => 1 + self.children.values().map(Node::container_depth).max().unwrap_or(0),
        }
    }

    /// 深さ優先で自身と子孫を訪問
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Node, usize)) {
        self.walk_at(0, visit);
    }

    fn walk_at<'a>(&'a self, depth: usize, visit: &mut dyn FnMut(&'a Node, usize)) {
        visit(self, depth);
        for child in self.children.values() {
            child.walk_at(depth + 1, visit);
        }
    }

    /// 平坦なタグ列に戻す
    pub fn tag_sequence(&self, out: &mut Vec<(TagRole, TagName)>) {
        match self.role {
            TagRole::SelfClosing => out.push((TagRole::SelfClosing, self.kind)),
            _ => {
                out.push((TagRole::Start, self.kind));
                for child in self.children.values() {
                    child.tag_sequence(out);
                }
                out.push((TagRole::End, self.kind));
            }
        }
    }
}

/// クライテリオン（ツリーのルート）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Criterion {
    /// 表示用タグ（例: `C1 - EG`）
    pub tag: String,

    #[serde(flatten)]
    pub node: Node,

    /// 全体での通し番号
    #[serde(skip)]
    pub number: u32,

    #[serde(skip)]
    pub sheet: String,

    #[serde(skip)]
    pub family: CriterionFamily,

    /// パスの起点 `C<n><namespace><elementCode>`
    #[serde(skip)]
    pub root_path: String,

    /// このクライテリオンが対象とするロット
    #[serde(skip)]
    pub lots: Vec<String>,
}

impl Criterion {
    /// 文書内のキー（`tag`の` - `より前）
    pub fn key(&self) -> &str {
        self.tag.split(" - ").next().unwrap_or(&self.tag)
    }

    pub fn name(&self) -> Option<&str> {
        self.node.name()
    }

    /// 指定ロットを対象とするか
    pub fn has_lot(&self, lot: &str) -> bool {
        self.lots.iter().any(|l| l == lot)
    }

    /// 選定基準でロットが指定されていない場合は既定ロットを補う
    pub(crate) fn ensure_default_lot(&mut self) {
        if self.family == CriterionFamily::SC && self.lots.is_empty() {
            self.lots.push(DEFAULT_LOT.to_string());
        }
    }
}

/// 解析済み文書
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    /// 文書バージョン（ファイル名から取得できた場合）
    pub version: Option<String>,

    /// キー → クライテリオン（出現順）
    pub criteria: IndexMap<String, Criterion>,

    /// 全体で収集したロット識別子（出現順、重複なし）
    pub lot_ids: Vec<String>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Criterion> {
        self.criteria.get(key)
    }

    /// ロット識別子を追加（重複は無視）
    pub(crate) fn add_lot(&mut self, lot: &str) {
        if !self.lot_ids.iter().any(|l| l == lot) {
            self.lot_ids.push(lot.to_string());
        }
    }

    /// 並べ替えたロット識別子
    pub fn sorted_lots(&self) -> Vec<String> {
        let mut lots = self.lot_ids.clone();
        lots.sort();
        lots
    }

    /// 文書全体を平坦なタグ列に戻す
    pub fn tag_sequence(&self) -> Vec<(TagRole, TagName)> {
        let mut out = Vec::new();
        for criterion in self.criteria.values() {
            criterion.node.tag_sequence(&mut out);
        }
        out
    }
}
