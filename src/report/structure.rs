//! Structure Reports
//!
//! タグ構造の一覧、親子関係の集計、コードリストとプロパティデータ型の抽出。

use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::fmt;
use tracing::warn;

use crate::parser::RowClassifier;
use crate::report::{columns_of, tagged_rows};
use crate::types::{AttributeKey, TagName, TagRole, Worksheet};

/// 葉要素の集合を表すキー
pub const TERMINAL_NODE: &str = "$TERMINAL_NODE$";

/// カーディナリティが空の場合の表記
const MISSING_CARDINALITY: &str = "?!?";

/// タグ構造の1行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureLine {
    pub depth: usize,
    pub role: TagRole,
    pub tag: TagName,
    pub cardinality: Option<String>,
}

impl fmt::Display for StructureLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}\t{}",
            "\t".repeat(self.depth),
            self.tag,
            self.cardinality.as_deref().unwrap_or_default()
        )
    }
}

/// シートのすべてのタグ行を深さ付きで列挙
pub fn full_structure(sheet: &Worksheet, classifier: &RowClassifier) -> Vec<StructureLine> {
    let columns = columns_of(sheet);
    tagged_rows(sheet, classifier)
        .map(|tagged| StructureLine {
            depth: tagged.depth(),
            role: tagged.token.role,
            tag: tagged.token.name,
            cardinality: columns.cardinality(tagged.row),
        })
        .collect()
}

/// 要素ごとの子要素の集計
///
/// 親タグ → `子タグ  カーディナリティ` の集合。葉要素は[`TERMINAL_NODE`]の
/// 下に集められます。複数シート・複数ワークブックを順に追加できます。
#[derive(Debug, Clone, Default)]
pub struct ElementStructure {
    children: IndexMap<String, BTreeSet<String>>,
    /// カーディナリティが空の要素（`親:子`）
    pub missing_cardinality: Vec<String>,
}

impl ElementStructure {
    pub fn new() -> Self {
        Self::default()
    }

    /// シートの構造を追加
    pub fn add_sheet(&mut self, sheet: &Worksheet, classifier: &RowClassifier) {
        let columns = columns_of(sheet);
        let mut path: Vec<TagName> = Vec::new();

        for tagged in tagged_rows(sheet, classifier) {
            let tag = tagged.token.name;
            let cardinality = columns.cardinality(tagged.row);
            let entry = format!(
                "{}  {}",
                tag,
                cardinality.as_deref().unwrap_or(MISSING_CARDINALITY)
            );

            match tagged.token.role {
                TagRole::Start => {
                    if tag == TagName::Criterion {
                        path.clear();
                    }
                    let parent = path.last().copied();
                    path.push(tag);
                    self.children.entry(tag.to_string()).or_default();
                    if let Some(parent) = parent {
                        self.children.entry(parent.to_string()).or_default().insert(entry);
                    }
                    if tag != TagName::Criterion && cardinality.is_none() {
                        self.note_missing(&sheet.name, parent, tag);
                    }
                }
                TagRole::SelfClosing => {
                    let parent = path.last().copied();
                    if let Some(parent) = parent {
                        self.children.entry(parent.to_string()).or_default().insert(entry);
                    }
                    self.children
                        .entry(TERMINAL_NODE.to_string())
                        .or_default()
                        .insert(tag.to_string());
                    if cardinality.is_none() {
                        self.note_missing(&sheet.name, parent, tag);
                    }
                }
                TagRole::End => {
                    path.pop();
                    if tag == TagName::Criterion {
                        path.clear();
                    }
                }
            }
        }
    }

    fn note_missing(&mut self, sheet: &str, parent: Option<TagName>, tag: TagName) {
        let parent = parent.map(|p| p.to_string()).unwrap_or_default();
        warn!(sheet, parent = %parent, tag = %tag, "no cardinality");
        self.missing_cardinality.push(format!("{parent}:{tag}"));
    }

    /// 親タグと子要素の集合（出現順、子要素は整列済み）
    pub fn entries(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn children_of(&self, parent: &str) -> Option<&BTreeSet<String>> {
        self.children.get(parent)
    }
}

/// コードリストを持つ要素
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeListUse {
    pub depth: usize,
    pub tag: TagName,
    pub code_list: String,
}

impl fmt::Display for CodeListUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}\t{}", "\t".repeat(self.depth), self.tag, self.code_list)
    }
}

/// コードリスト列が空でない要素を列挙
pub fn code_list_uses(sheet: &Worksheet, classifier: &RowClassifier) -> Vec<CodeListUse> {
    let columns = columns_of(sheet);
    tagged_rows(sheet, classifier)
        .filter_map(|tagged| {
            columns
                .value(tagged.row, AttributeKey::CodeList)
                .map(|code_list| CodeListUse {
                    depth: tagged.depth(),
                    tag: tagged.token.name,
                    code_list,
                })
        })
        .collect()
}

/// プロパティデータ型の一覧
///
/// `TAG::PDT`、CODEの場合は`TAG::CODE - <コードリスト>`。重複なしで整列済み。
pub fn property_data_types<'s>(
    sheets: impl IntoIterator<Item = &'s Worksheet>,
    classifier: &RowClassifier,
) -> BTreeSet<String> {
    let mut types = BTreeSet::new();
    for sheet in sheets {
        let columns = columns_of(sheet);
        for tagged in tagged_rows(sheet, classifier) {
            let Some(pdt) = columns.value(tagged.row, AttributeKey::PropertyDataType) else {
                continue;
            };
            let tag = tagged.token.name;
            let entry = match (pdt.as_str(), columns.value(tagged.row, AttributeKey::CodeList)) {
                ("CODE", Some(code_list)) => format!("{tag}::{pdt} - {code_list}"),
                _ => format!("{tag}::{pdt}"),
            };
            types.insert(entry);
        }
    }
    types
}
