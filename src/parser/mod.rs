//! Parser Module
//!
//! ワークブックの読み込みと、タグ構造の解析（列解決 → 行分類 → スタックマシン
//! → ツリー実体化）を1つのパスにまとめたモジュール。

mod archive;
mod classify;
mod columns;
mod machine;
mod tree;
mod workbook;

pub use classify::{classify_cell, Classification, RowClassifier};
pub use columns::ColumnMap;
pub use machine::{Placement, RowFacts, RunState, StackMachine, Step};
pub use tree::SheetTree;
pub use workbook::WorkbookReader;

pub(crate) use tree::TreeBuilder;

use tracing::{debug, warn};

use crate::api::WorkbookKind;
use crate::error::EspdError;
use crate::types::{AttributeKey, Attributes, TagToken, Worksheet};

/// タグを持つ1行の処理結果
#[derive(Debug, Clone, PartialEq)]
pub struct RowEvent {
    /// 行番号（1始まり）
    pub row: u32,
    pub token: TagToken,
    /// タグ列の左隣のラベル
    pub label: Option<String>,
    /// 解決済みの列から読み取った属性（空の値は含まない）
    pub attributes: Attributes,
    pub step: Step,
}

impl RowEvent {
    pub fn attr(&self, key: AttributeKey) -> Option<&str> {
        self.attributes.get(&key).map(String::as_str)
    }
}

/// 1シート分の走査結果
///
/// 構造エラーが発生した場合でも、それまでに処理したイベントは保持されます。
#[derive(Debug)]
pub struct SheetScan {
    pub sheet: String,
    pub columns: ColumnMap,
    pub events: Vec<RowEvent>,
    /// シートの処理を中断したエラー
    pub error: Option<EspdError>,
    /// 同時に開いていた要素数の最大値
    pub max_open: usize,
}

impl SheetScan {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// シートを走査してイベント列を生成
///
/// `rows[0]`のヘッダー行から列位置を解決し、各行を分類してスタックマシンに
/// 渡します。語彙外のタグは警告を出して読み飛ばします。
///
/// # 引数
///
/// * `sheet` - 対象のワークシート
/// * `classifier` - 探索する列範囲を持つ分類器
/// * `kind` - Request / Response の別
/// * `run` - シートをまたいで共有される状態
pub fn scan_sheet(
    sheet: &Worksheet,
    classifier: &RowClassifier,
    kind: WorkbookKind,
    run: &mut RunState,
) -> SheetScan {
    let columns = sheet.header().map(ColumnMap::resolve).unwrap_or_default();
    if columns.is_empty() {
        warn!(sheet = %sheet.name, "no known column labels in header row");
    }

    let mut machine = StackMachine::new(&sheet.name, kind, run);
    let mut events = Vec::new();
    let mut error = None;

    for row in &sheet.rows {
        let token = match classifier.classify(row) {
            Classification::Tag(token) => token,
            Classification::Unknown { name, column } => {
                warn!(sheet = %sheet.name, row = row.number, column, tag = %name, "unknown tag skipped");
                continue;
            }
            Classification::None => continue,
        };

        let cardinality = columns.cardinality(row);
        let element_code = columns.value(row, AttributeKey::ElementCode);
        let property_data_type = columns.value(row, AttributeKey::PropertyDataType);
        let facts = RowFacts {
            number: row.number,
            cardinality: cardinality.as_deref(),
            element_code: element_code.as_deref(),
            property_data_type: property_data_type.as_deref(),
        };

        match machine.step(&token, facts) {
            Ok(step) => events.push(RowEvent {
                row: row.number,
                label: RowClassifier::label(row, token.column),
                attributes: columns.attributes(row),
                token,
                step,
            }),
            Err(e) => {
                error = Some(e);
                break;
            }
        }
    }

    let max_open = machine.max_open();
    if error.is_none() {
        error = machine.finish().err();
    }
    if let Some(e) = &error {
        warn!(sheet = %sheet.name, error = %e, "sheet aborted");
    } else {
        debug!(sheet = %sheet.name, events = events.len(), "sheet scanned");
    }

    SheetScan {
        sheet: sheet.name.clone(),
        columns,
        events,
        error,
        max_open,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::IdentifierPolicy;
    use crate::types::{Row, TagName, TagRole};

    fn header() -> Row {
        Row::new(2)
            .with_cell(18, "Name")
            .with_cell(19, "Cardinality")
            .with_cell(20, "PropertyDataType")
            .with_cell(21, "Element Code")
    }

    fn sheet(rows: Vec<Row>) -> Worksheet {
        let mut all = vec![header()];
        all.extend(rows);
        Worksheet {
            name: "EG-Test".to_string(),
            rows: all,
        }
    }

    #[test]
    fn test_scan_single_criterion() {
        let ws = sheet(vec![
            Row::new(3).with_cell(1, "1").with_cell(2, "{CRITERION").with_cell(21, "CRIME-ORG"),
            Row::new(4).with_cell(2, "CRITERION}"),
        ]);
        let mut run = RunState::new();
        let scan = scan_sheet(&ws, &RowClassifier::new(1, 17), WorkbookKind::Response, &mut run);

        assert!(scan.is_ok());
        assert_eq!(scan.events.len(), 2);
        assert_eq!(scan.events[0].label.as_deref(), Some("1"));
        assert!(matches!(
            &scan.events[0].step,
            Step::OpenCriterion { identifier, root, .. }
                if identifier == "C1" && root == "C1_EG_CRIME-ORG"
        ));

        let tree = TreeBuilder::new(&ws.name, IdentifierPolicy::Generated).build(&scan.events);
        assert_eq!(tree.criteria.len(), 1);
        assert!(tree.criteria[0].node.children.is_empty());
    }

    #[test]
    fn test_scan_skips_unknown_and_blank_rows() {
        let ws = sheet(vec![
            Row::new(3).with_cell(2, "{CRITERION"),
            Row::new(4).with_cell(3, "{RESPONSE}"),
            Row::new(5).with_cell(3, "   "),
            Row::new(6).with_cell(2, "CRITERION}"),
        ]);
        let mut run = RunState::new();
        let scan = scan_sheet(&ws, &RowClassifier::new(1, 17), WorkbookKind::Response, &mut run);

        assert!(scan.is_ok());
        assert_eq!(scan.events.len(), 2);
    }

    #[test]
    fn test_scan_keeps_events_before_error() {
        let ws = sheet(vec![
            Row::new(3).with_cell(2, "{CRITERION"),
            Row::new(4).with_cell(3, "{QUESTION_GROUP"),
            Row::new(5).with_cell(2, "CRITERION}"),
        ]);
        let mut run = RunState::new();
        let scan = scan_sheet(&ws, &RowClassifier::new(1, 17), WorkbookKind::Response, &mut run);

        assert_eq!(scan.events.len(), 2);
        assert!(matches!(scan.error, Some(EspdError::MismatchedClose { row: 5, .. })));
        assert_eq!(run.criterion_counter(), 1);
    }

    #[test]
    fn test_scan_reports_unclosed() {
        let ws = sheet(vec![Row::new(3).with_cell(2, "{CRITERION")]);
        let mut run = RunState::new();
        let scan = scan_sheet(&ws, &RowClassifier::new(1, 17), WorkbookKind::Response, &mut run);
        assert!(matches!(scan.error, Some(EspdError::UnclosedElement { row: 3, .. })));
    }

    #[test]
    fn test_token_roles_in_events() {
        let ws = sheet(vec![
            Row::new(3).with_cell(2, "{CRITERION"),
            Row::new(4).with_cell(3, "{CAPTION}"),
            Row::new(5).with_cell(2, "CRITERION}"),
        ]);
        let mut run = RunState::new();
        let scan = scan_sheet(&ws, &RowClassifier::new(1, 17), WorkbookKind::Response, &mut run);
        let roles: Vec<(TagRole, TagName)> =
            scan.events.iter().map(|e| (e.token.role, e.token.name)).collect();

        assert_eq!(
            roles,
            vec![
                (TagRole::Start, TagName::Criterion),
                (TagRole::SelfClosing, TagName::Caption),
                (TagRole::End, TagName::Criterion),
            ]
        );
    }
}
