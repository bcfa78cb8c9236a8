//! Label and Path Findings
//!
//! ワークシートに書かれたラベルと実体化パスを、スタックマシンが計算した
//! 値と比較します。

use std::fmt;

use crate::api::WorkbookKind;
use crate::parser::{RowEvent, SheetScan, Step};
use crate::types::{AttributeKey, TagName};

/// 検査の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// タグ左隣のラベル
    Tag,
    /// `XML PATH Like VARIANT ID Request`
    RequestPath,
    /// `... Response Contents (1)`
    ResponseContent,
    /// `... Response Contents (3)`
    ResponseValue,
}

/// 1件の検査結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub check: Check,
    pub sheet: String,
    pub row: u32,
    pub tag: TagName,
    /// 入れ子の深さ（CRITERIONが0）
    pub depth: usize,
    pub label: String,
    /// 計算された値
    pub expected: String,
    /// ワークシート上の値
    pub found: String,
}

impl Finding {
    pub fn is_ok(&self) -> bool {
        self.expected == self.found
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indent = "\t".repeat(self.depth);
        match self.check {
            Check::Tag => write!(f, "{}\t{}{}", self.label, indent, self.tag),
            _ => write!(
                f,
                "{}\t{:<60}\t{:<60}\t{}{}",
                self.label, self.found, self.expected, indent, self.tag
            ),
        }
    }
}

fn depth_of(event: &RowEvent) -> usize {
    usize::try_from(event.token.depth()).unwrap_or(0)
}

fn finding(scan: &SheetScan, event: &RowEvent, check: Check, expected: String, found: Option<&str>) -> Finding {
    Finding {
        check,
        sheet: scan.sheet.clone(),
        row: event.row,
        tag: event.token.name,
        depth: depth_of(event),
        label: event.label.clone().unwrap_or_default(),
        expected,
        found: found.unwrap_or_default().to_string(),
    }
}

/// ラベルの検査
///
/// 開始タグと単独タグのラベルが`<短縮タグ><カウンタ>`と一致するかを調べます。
/// CRITERIONのラベルは番号だけでも一致とみなします。
pub fn tag_findings(scan: &SheetScan) -> Vec<Finding> {
    scan.events
        .iter()
        .filter_map(|event| {
            let expected = match &event.step {
                Step::OpenCriterion { number, identifier, .. } => {
                    let numeric = event.label.as_deref().is_some_and(|l| l.parse::<u32>().is_ok());
                    if numeric {
                        number.to_string()
                    } else {
                        identifier.clone()
                    }
                }
                Step::Open(placement) | Step::Leaf(placement) => placement.identifier.clone(),
                Step::Close { .. } => return None,
            };
            Some(finding(scan, event, Check::Tag, expected, event.label.as_deref()))
        })
        .collect()
}

/// 実体化パスの検査
///
/// すべての開始タグと単独タグでRequestパスを比較します。Responseワークブック
/// では、QUESTIONの回答パスと回答値パスも比較します。
pub fn path_findings(scan: &SheetScan, kind: WorkbookKind) -> Vec<Finding> {
    let mut findings = Vec::new();
    for event in &scan.events {
        let request = event.attr(AttributeKey::RequestPath);
        match &event.step {
            Step::OpenCriterion { root, .. } => {
                findings.push(finding(scan, event, Check::RequestPath, root.clone(), request));
            }
            Step::Open(placement) => {
                findings.push(finding(
                    scan,
                    event,
                    Check::RequestPath,
                    placement.request_path.clone(),
                    request,
                ));
            }
            Step::Leaf(placement) => {
                if !kind.is_request() {
                    if let Some(content) = &placement.response_content {
                        findings.push(finding(
                            scan,
                            event,
                            Check::ResponseContent,
                            content.clone(),
                            event.attr(AttributeKey::ResponseContent1),
                        ));
                    }
                    if let Some(value) = &placement.response_value {
                        findings.push(finding(
                            scan,
                            event,
                            Check::ResponseValue,
                            value.clone(),
                            event.attr(AttributeKey::ResponseContent3),
                        ));
                    }
                }
                findings.push(finding(
                    scan,
                    event,
                    Check::RequestPath,
                    placement.request_path.clone(),
                    request,
                ));
            }
            Step::Close { .. } => {}
        }
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{scan_sheet, RowClassifier, RunState};
    use crate::report::test_support::sheet;
    use crate::types::AttributeKey as K;

    fn scan(kind: WorkbookKind, rows: &[(u32, &str, &str, &[(K, &str)])]) -> SheetScan {
        let ws = sheet("EG-Test", rows);
        let mut run = RunState::new();
        scan_sheet(&ws, &RowClassifier::new(1, 17), kind, &mut run)
    }

    #[test]
    fn test_tag_findings() {
        let scan = scan(
            WorkbookKind::Response,
            &[
                (2, "1", "{CRITERION", &[(K::ElementCode, "CRIME-ORG")]),
                (3, "L1", "{LEGISLATION}", &[]),
                (3, "RG1", "{REQUIREMENT_GROUP", &[(K::Cardinality, "1")]),
                (4, "RQ7", "{REQUIREMENT}", &[(K::Cardinality, "1")]),
                (3, "", "REQUIREMENT_GROUP}", &[]),
                (2, "", "CRITERION}", &[]),
            ],
        );
        let findings = tag_findings(&scan);

        assert_eq!(findings.len(), 4);
        assert!(findings[0].is_ok());
        assert!(findings[1].is_ok());
        assert!(findings[2].is_ok());
        assert!(!findings[3].is_ok());
        assert_eq!(findings[3].expected, "RQ1");
        assert_eq!(findings[3].found, "RQ7");
        assert_eq!(findings[3].depth, 2);
        assert_eq!(findings[3].to_string(), "RQ7\t\t\tREQUIREMENT");
    }

    #[test]
    fn test_path_findings_response() {
        let scan = scan(
            WorkbookKind::Response,
            &[
                (2, "C1", "{CRITERION", &[(K::ElementCode, "CRIME-ORG"), (K::RequestPath, "C1_EG_CRIME-ORG")]),
                (3, "QG1", "{QUESTION_GROUP", &[(K::Cardinality, "1"), (K::RequestPath, "C1_EG_CRIME-ORG/QG1")]),
                (
                    4,
                    "Q1",
                    "{QUESTION}",
                    &[
                        (K::Cardinality, "1"),
                        (K::PropertyDataType, "INDICATOR"),
                        (K::RequestPath, "C1_EG_CRIME-ORG/QG1/Q1"),
                        (K::ResponseContent1, "C1_EG_CRIME-ORG/QG1/Q1/R1"),
                        (K::ResponseContent3, "wrong"),
                    ],
                ),
                (3, "", "QUESTION_GROUP}", &[]),
                (2, "", "CRITERION}", &[]),
            ],
        );
        let findings = path_findings(&scan, WorkbookKind::Response);

        assert_eq!(findings.len(), 5);
        let nok: Vec<_> = findings.iter().filter(|f| !f.is_ok()).collect();
        assert_eq!(nok.len(), 1);
        assert_eq!(nok[0].check, Check::ResponseValue);
        assert_eq!(nok[0].expected, "C1_EG_CRIME-ORG/QG1/Q1/R1/RV");
        assert_eq!(nok[0].found, "wrong");
    }

    #[test]
    fn test_path_findings_request_skips_response_checks() {
        let scan = scan(
            WorkbookKind::Request,
            &[
                (2, "C1", "{CRITERION", &[(K::ElementCode, "X")]),
                (3, "Q1", "{QUESTION}", &[(K::Cardinality, "1")]),
                (2, "", "CRITERION}", &[]),
            ],
        );
        let findings = path_findings(&scan, WorkbookKind::Request);

        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.check == Check::RequestPath));
        assert!(!findings[1].is_ok());
        assert_eq!(findings[1].found, "");
    }
}
