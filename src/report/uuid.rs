//! UUID Reports
//!
//! 要素UUIDの一覧と重複検出、クライテリオン説明とINDICATORの抽出。

use indexmap::IndexMap;
use serde::Deserialize;
use std::fmt;
use tracing::debug;

use crate::error::EspdError;
use crate::parser::RowClassifier;
use crate::report::{columns_of, tagged_rows, TaggedRow};
use crate::types::{AttributeKey, TagName, TagRole, Worksheet};

/// 正規形式のUUIDの文字数
const UUID_LENGTH: usize = 36;

fn element_tag(tagged: &TaggedRow<'_>) -> String {
    match tagged.token.name {
        TagName::Criterion => format!(
            "CRITERION-{}",
            tagged.label.as_deref().unwrap_or_default()
        ),
        name => name.to_string(),
    }
}

/// INDICATOR抽出の1要素
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorEntry {
    pub depth: usize,
    pub tag: TagName,
    /// QUESTIONは発注者の値、QUESTION_SUBGROUPは要素コード
    pub value: String,
}

/// クライテリオンごとのINDICATOR
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriterionIndicators {
    pub element_code: String,
    pub entries: Vec<IndicatorEntry>,
}

/// INDICATORのQUESTIONと、それに続くQUESTION_SUBGROUPを抽出
///
/// ONTRUE/ONFALSEの分岐がどのINDICATORに続いているかを確認するための一覧です。
pub fn indicator_report(sheet: &Worksheet, classifier: &RowClassifier) -> Vec<CriterionIndicators> {
    let columns = columns_of(sheet);
    let mut report: Vec<CriterionIndicators> = Vec::new();
    let mut after_indicator = false;

    for tagged in tagged_rows(sheet, classifier) {
        let tag = tagged.token.name;
        match (tagged.token.role, tag) {
            (TagRole::Start, TagName::Criterion) => {
                after_indicator = false;
                report.push(CriterionIndicators {
                    element_code: columns
                        .value(tagged.row, AttributeKey::ElementCode)
                        .unwrap_or_default(),
                    entries: Vec::new(),
                });
            }
            (TagRole::Start, TagName::QuestionSubgroup) if after_indicator => {
                if let Some(current) = report.last_mut() {
                    current.entries.push(IndicatorEntry {
                        depth: tagged.depth(),
                        tag,
                        value: columns
                            .value(tagged.row, AttributeKey::ElementCode)
                            .unwrap_or_default(),
                    });
                }
            }
            (TagRole::SelfClosing, TagName::Question)
                if columns.value(tagged.row, AttributeKey::PropertyDataType).as_deref()
                    == Some("INDICATOR") =>
            {
                after_indicator = true;
                if let Some(current) = report.last_mut() {
                    current.entries.push(IndicatorEntry {
                        depth: tagged.depth(),
                        tag,
                        value: columns
                            .value(tagged.row, AttributeKey::BuyerValue)
                            .unwrap_or_default(),
                    });
                }
            }
            (TagRole::End, TagName::Criterion) => after_indicator = false,
            _ => {}
        }
    }
    report
}

/// クライテリオンの説明
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriterionDescription {
    pub sheet: String,
    pub element_code: String,
    /// `CRITERION-<ラベル>`
    pub tag: String,
    pub uuid: String,
    pub description: String,
}

impl fmt::Display for CriterionDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.sheet, self.element_code, self.tag, self.uuid, self.description
        )
    }
}

/// クライテリオンごとに要素コード、UUID、説明を抽出
pub fn criterion_descriptions(sheet: &Worksheet, classifier: &RowClassifier) -> Vec<CriterionDescription> {
    let columns = columns_of(sheet);
    tagged_rows(sheet, classifier)
        .filter(|t| t.token.role == TagRole::Start && t.token.name == TagName::Criterion)
        .map(|tagged| CriterionDescription {
            sheet: sheet.name.clone(),
            element_code: columns
                .value(tagged.row, AttributeKey::ElementCode)
                .unwrap_or_default(),
            tag: element_tag(&tagged),
            uuid: columns
                .value(tagged.row, AttributeKey::ElementUuid)
                .unwrap_or_default(),
            description: columns
                .value(tagged.row, AttributeKey::Description)
                .unwrap_or_default(),
        })
        .collect()
}

/// UUID → 使用箇所（`シート::クライテリオン要素コード`）
///
/// 複数のシート・ワークブックをまたいで蓄積します。
#[derive(Debug, Clone, Default)]
pub struct UuidIndex {
    uses: IndexMap<String, Vec<String>>,
}

impl UuidIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// シート内のUUIDを追加
    pub fn add_sheet(&mut self, sheet: &Worksheet, classifier: &RowClassifier) {
        let columns = columns_of(sheet);
        let mut owner = String::new();

        for tagged in tagged_rows(sheet, classifier) {
            if tagged.token.role == TagRole::Start && tagged.token.name == TagName::Criterion {
                owner = format!(
                    "{}::{}",
                    sheet.name,
                    columns
                        .value(tagged.row, AttributeKey::ElementCode)
                        .unwrap_or_default()
                );
            }
            if let Some(uuid) = columns.value(tagged.row, AttributeKey::ElementUuid) {
                self.uses.entry(uuid).or_default().push(owner.clone());
            }
        }
        debug!(sheet = %sheet.name, uuids = self.uses.len(), "indexed UUIDs");
    }

    /// 登録済みのUUID数
    pub fn len(&self) -> usize {
        self.uses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uses.is_empty()
    }

    /// 2回以上使われているUUIDと使用箇所
    pub fn duplicates(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.uses
            .iter()
            .filter(|(_, owners)| owners.len() > 1)
            .map(|(uuid, owners)| (uuid.as_str(), owners.as_slice()))
    }
}

/// UUID辞書の1行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UuidEntry {
    pub sheet: String,
    /// 所属するクライテリオンの要素コード
    pub element_code: String,
    pub tag: String,
    pub uuid: String,
}

impl fmt::Display for UuidEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}\t{}", self.sheet, self.element_code, self.tag, self.uuid)
    }
}

/// 36文字のUUIDを持つすべての要素を列挙
pub fn uuid_dictionary(sheet: &Worksheet, classifier: &RowClassifier) -> Vec<UuidEntry> {
    let columns = columns_of(sheet);
    let mut element_code = String::new();
    let mut entries = Vec::new();

    for tagged in tagged_rows(sheet, classifier) {
        if tagged.token.role == TagRole::Start && tagged.token.name == TagName::Criterion {
            element_code = columns
                .value(tagged.row, AttributeKey::ElementCode)
                .unwrap_or_default();
        }
        match columns.value(tagged.row, AttributeKey::ElementUuid) {
            Some(uuid) if uuid.len() == UUID_LENGTH => entries.push(UuidEntry {
                sheet: sheet.name.clone(),
                element_code: element_code.clone(),
                tag: element_tag(&tagged),
                uuid,
            }),
            _ => {}
        }
    }
    entries
}

#[derive(Debug, Deserialize)]
struct ServiceFile {
    #[serde(default)]
    criteria: Vec<ServiceEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceEntry {
    uuid: Option<String>,
    criterion_type: Option<ServiceType>,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ServiceType {
    code: Option<String>,
}

/// ESPDサービスのクライテリオン
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCriterion {
    pub code: String,
    /// `EC-n`、`SC-n`、`OT-n`
    pub label: String,
    pub uuid: String,
    pub description: String,
}

impl fmt::Display for ServiceCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ESPD_SERVICE\t{}\t{}\t{}\t{}",
            self.code, self.label, self.uuid, self.description
        )
    }
}

/// ESPDサービスのJSONファイルからクライテリオンを抽出
///
/// # 引数
///
/// * `file_name` - ファイル名（`exclusion`を含めば`EC`、`selection`を含めば`SC`、それ以外は`OT`）
/// * `json` - ファイルの内容
///
/// UUIDまたは種別コードを持たないエントリは番号を消費しません。
pub fn service_criteria(file_name: &str, json: &str) -> Result<Vec<ServiceCriterion>, EspdError> {
    let prefix = if file_name.contains("exclusion") {
        "EC"
    } else if file_name.contains("selection") {
        "SC"
    } else {
        "OT"
    };

    let file: ServiceFile = serde_json::from_str(json)?;
    let criteria = file
        .criteria
        .into_iter()
        .filter_map(|entry| {
            let code = entry.criterion_type.and_then(|t| t.code)?;
            let uuid = entry.uuid?;
            Some((code, uuid, entry.description))
        })
        .enumerate()
        .map(|(idx, (code, uuid, description))| ServiceCriterion {
            code,
            label: format!("{}-{}", prefix, idx + 1),
            uuid,
            description,
        })
        .collect();
    Ok(criteria)
}
