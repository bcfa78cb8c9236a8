//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// セルの値を表す列挙型
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// 数値（f64）
    Number(f64),

    /// 文字列
    String(String),

    /// 論理値
    Bool(bool),

    /// エラー値（例: #DIV/0!）
    Error(String),

    /// 空セル
    Empty,
}

impl CellValue {
    /// 値が空かどうかを判定
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// 表示上の文字列に変換
    ///
    /// 数値セルも文字列として扱えるように、表計算ソフトの表示と同じ規則で
    /// 変換します（整数値は小数点なし、論理値は `true`/`false`）。
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Number(n) => format_number(*n),
            CellValue::String(s) => s.clone(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Error(e) => e.clone(),
            CellValue::Empty => String::new(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// ワークシートの1行
///
/// 論理列インデックスからセル値へのマッピング。読み込み後は変更されません。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    /// ワークシート上の行番号（1始まり）
    pub number: u32,

    /// 論理列インデックス → セル値
    pub cells: BTreeMap<u32, CellValue>,
}

impl Row {
    /// 新しい行を生成
    pub fn new(number: u32) -> Self {
        Self {
            number,
            cells: BTreeMap::new(),
        }
    }

    /// セル値を設定（ビルダー形式、主にテスト用）
    pub fn with_cell(mut self, col: u32, value: impl Into<String>) -> Self {
        self.cells.insert(col, CellValue::String(value.into()));
        self
    }

    /// 指定列のセルを文字列として取得（存在しない場合は`None`）
    pub fn text(&self, col: u32) -> Option<String> {
        self.cells
            .get(&col)
            .filter(|v| !v.is_empty())
            .map(CellValue::to_text)
    }

    /// 指定列のセルを前後の空白を除いた文字列として取得
    ///
    /// 空文字列になる場合は`None`を返します。
    pub fn trimmed(&self, col: u32) -> Option<String> {
        self.text(col)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// すべてのセルが空かどうか
    pub fn is_blank(&self) -> bool {
        self.cells.values().all(|v| v.to_text().trim().is_empty())
    }
}

/// ワークシート
///
/// `rows[0]` は列ラベルを保持するヘッダー行です。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Worksheet {
    /// シート名
    pub name: String,

    /// ヘッダー行を含むすべての行
    pub rows: Vec<Row>,
}

impl Worksheet {
    /// ヘッダー行
    pub fn header(&self) -> Option<&Row> {
        self.rows.first()
    }
}

/// タグの語彙
///
/// ワークシートに現れる構造要素の種類。閉じた語彙です。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TagName {
    Criterion,
    Subcriterion,
    Legislation,
    RequirementGroup,
    RequirementSubgroup,
    Requirement,
    QuestionGroup,
    QuestionSubgroup,
    Question,
    Caption,
    AdditionalDescriptionLine,
}

impl TagName {
    /// すべてのタグ
    pub const ALL: [TagName; 11] = [
        TagName::Criterion,
        TagName::Subcriterion,
        TagName::Legislation,
        TagName::RequirementGroup,
        TagName::RequirementSubgroup,
        TagName::Requirement,
        TagName::QuestionGroup,
        TagName::QuestionSubgroup,
        TagName::Question,
        TagName::Caption,
        TagName::AdditionalDescriptionLine,
    ];

    /// ワークシート上の表記
    pub fn as_str(self) -> &'static str {
        match self {
            TagName::Criterion => "CRITERION",
            TagName::Subcriterion => "SUBCRITERION",
            TagName::Legislation => "LEGISLATION",
            TagName::RequirementGroup => "REQUIREMENT_GROUP",
            TagName::RequirementSubgroup => "REQUIREMENT_SUBGROUP",
            TagName::Requirement => "REQUIREMENT",
            TagName::QuestionGroup => "QUESTION_GROUP",
            TagName::QuestionSubgroup => "QUESTION_SUBGROUP",
            TagName::Question => "QUESTION",
            TagName::Caption => "CAPTION",
            TagName::AdditionalDescriptionLine => "ADDITIONAL_DESCRIPTION_LINE",
        }
    }

    /// 識別子の生成に使用する短縮タグ
    pub fn short(self) -> &'static str {
        match self {
            TagName::Criterion => "C",
            TagName::Subcriterion => "SBC",
            TagName::Legislation => "L",
            TagName::RequirementGroup => "RG",
            TagName::RequirementSubgroup => "RSG",
            TagName::Requirement => "RQ",
            TagName::QuestionGroup => "QG",
            TagName::QuestionSubgroup => "QSG",
            TagName::Question => "Q",
            TagName::Caption => "CA",
            TagName::AdditionalDescriptionLine => "ADL",
        }
    }

    /// 表記からタグを解決（語彙外なら`None`）
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// REQUIREMENT_GROUP / REQUIREMENT_SUBGROUP
    pub fn is_requirement_group(self) -> bool {
        matches!(self, TagName::RequirementGroup | TagName::RequirementSubgroup)
    }

    /// QUESTION_GROUP / QUESTION_SUBGROUP
    pub fn is_question_group(self) -> bool {
        matches!(self, TagName::QuestionGroup | TagName::QuestionSubgroup)
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// タグの役割
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagRole {
    /// `{NAME` 入れ子を開く
    Start,
    /// `NAME}` 入れ子を閉じる
    End,
    /// `{NAME}` 1行で完結する葉
    SelfClosing,
}

/// 分類済みのタグトークン
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagToken {
    pub role: TagRole,
    pub name: TagName,
    /// タグが見つかった列（論理列インデックス）
    pub column: u32,
}

impl TagToken {
    /// 入れ子の深さ（`column - 2`）
    pub fn depth(&self) -> i64 {
        i64::from(self.column) - 2
    }
}

/// 属性キー
///
/// 列ラベルレジストリの論理名。宣言順がJSON出力の順序になります。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttributeKey {
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "description")]
    Description,
    #[serde(rename = "examplevalue")]
    ExampleValue,
    #[serde(rename = "buyervalue")]
    BuyerValue,
    #[serde(rename = "sellervalue")]
    SellerValue,
    #[serde(rename = "cardinality")]
    Cardinality,
    #[serde(rename = "propertydatatype")]
    PropertyDataType,
    #[serde(rename = "elementUUID")]
    ElementUuid,
    #[serde(rename = "elementcode")]
    ElementCode,
    #[serde(rename = "codelist")]
    CodeList,
    #[serde(rename = "requestpath")]
    RequestPath,
    #[serde(rename = "responsepath")]
    ResponsePath,
    #[serde(rename = "responsecontent1")]
    ResponseContent1,
    #[serde(rename = "responsecontent2")]
    ResponseContent2,
    #[serde(rename = "responsecontent3")]
    ResponseContent3,
}

impl AttributeKey {
    /// すべての属性キー（レジストリ順）
    pub const ALL: [AttributeKey; 15] = [
        AttributeKey::Name,
        AttributeKey::Description,
        AttributeKey::ExampleValue,
        AttributeKey::BuyerValue,
        AttributeKey::SellerValue,
        AttributeKey::Cardinality,
        AttributeKey::PropertyDataType,
        AttributeKey::ElementUuid,
        AttributeKey::ElementCode,
        AttributeKey::CodeList,
        AttributeKey::RequestPath,
        AttributeKey::ResponsePath,
        AttributeKey::ResponseContent1,
        AttributeKey::ResponseContent2,
        AttributeKey::ResponseContent3,
    ];

    /// JSON出力でのキー名
    pub fn as_str(self) -> &'static str {
        match self {
            AttributeKey::Name => "name",
            AttributeKey::Description => "description",
            AttributeKey::ExampleValue => "examplevalue",
            AttributeKey::BuyerValue => "buyervalue",
            AttributeKey::SellerValue => "sellervalue",
            AttributeKey::Cardinality => "cardinality",
            AttributeKey::PropertyDataType => "propertydatatype",
            AttributeKey::ElementUuid => "elementUUID",
            AttributeKey::ElementCode => "elementcode",
            AttributeKey::CodeList => "codelist",
            AttributeKey::RequestPath => "requestpath",
            AttributeKey::ResponsePath => "responsepath",
            AttributeKey::ResponseContent1 => "responsecontent1",
            AttributeKey::ResponseContent2 => "responsecontent2",
            AttributeKey::ResponseContent3 => "responsecontent3",
        }
    }

    /// ヘッダー行での列ラベル
    pub fn label(self) -> &'static str {
        match self {
            AttributeKey::Name => "Name",
            AttributeKey::Description => "Description",
            AttributeKey::ExampleValue => "Value(example)",
            AttributeKey::BuyerValue => "Buyer Value (example)",
            AttributeKey::SellerValue => "Seller Value (example)",
            AttributeKey::Cardinality => "Cardinality",
            AttributeKey::PropertyDataType => "PropertyDataType",
            AttributeKey::ElementUuid => "ElementUUID",
            AttributeKey::ElementCode => "Element Code",
            AttributeKey::CodeList => "Code List",
            AttributeKey::RequestPath => "XML PATH Like VARIANT ID Request",
            AttributeKey::ResponsePath => "XML PATH LIKE VARIANT ID Response Structure",
            AttributeKey::ResponseContent1 => "XML PATH LIKE VARIANT ID Response Contents (1)",
            AttributeKey::ResponseContent2 => "XML PATH LIKE VARIANT ID Response Contents (2)",
            AttributeKey::ResponseContent3 => "XML PATH LIKE VARIANT ID Response Contents (3)",
        }
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 属性の集合（空の値は保持しない）
pub type Attributes = BTreeMap<AttributeKey, String>;

/// クライテリオンの分類（シート名から決定）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CriterionFamily {
    /// 除外事由（Exclusion Grounds）
    EG,
    /// 選定基準（Selection Criteria）
    SC,
    /// その他
    OT,
}

impl CriterionFamily {
    /// シート名から分類を決定
    pub fn from_sheet_name(sheet: &str) -> Self {
        if sheet.starts_with("EG") {
            CriterionFamily::EG
        } else if sheet.starts_with("SC") {
            CriterionFamily::SC
        } else {
            CriterionFamily::OT
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CriterionFamily::EG => "EG",
            CriterionFamily::SC => "SC",
            CriterionFamily::OT => "OT",
        }
    }
}
