//! Row Tag Classifier
//!
//! 行の探索範囲内で最初のタグセルを見つけ、開始・終了・単独タグに分類するモジュール。

use crate::types::{Row, TagName, TagRole, TagToken};

/// 行の分類結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// 語彙内のタグ
    Tag(TagToken),

    /// 括弧で囲まれているが語彙外の名前
    Unknown { name: String, column: u32 },

    /// 探索範囲内にタグがない（空行・構造を持たない行）
    None,
}

/// 行タグ分類器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowClassifier {
    first: u32,
    last: u32,
}

impl RowClassifier {
    /// 探索する列範囲（両端を含む）を指定して生成
    pub fn new(first: u32, last: u32) -> Self {
        Self { first, last }
    }

    /// 行を分類
    ///
    /// 範囲内の列を左から順に調べ、空でない最初の括弧付きセルをタグとします。
    /// 括弧のないテキストは読み飛ばして探索を続けます。
    /// 数値セルも文字列に変換してから判定します。
    pub fn classify(&self, row: &Row) -> Classification {
        for column in self.first..=self.last {
            let Some(text) = row.trimmed(column) else {
                continue;
            };
            let Some((role, name)) = classify_cell(&text) else {
                continue;
            };
            return match TagName::parse(&name) {
                Some(name) => Classification::Tag(TagToken { role, name, column }),
                None => Classification::Unknown { name, column },
            };
        }
        Classification::None
    }

    /// タグ列の左隣にあるラベル（生成識別子または文字どおりの番号）
    pub fn label(row: &Row, column: u32) -> Option<String> {
        column.checked_sub(1).and_then(|col| row.trimmed(col))
    }
}

/// 1つのセルを分類
///
/// # 戻り値
///
/// * `Some((role, name))` - `{`で始まるか`}`で終わる場合。`name`は最初の`{`と
///   最初の`}`を取り除いたテキスト
/// * `None` - 括弧を持たないテキスト
pub fn classify_cell(text: &str) -> Option<(TagRole, String)> {
    let text = text.trim();
    let opens = text.starts_with('{');
    let closes = text.ends_with('}');

    let role = match (opens, closes) {
        (true, true) => TagRole::SelfClosing,
        (true, false) => TagRole::Start,
        (false, true) => TagRole::End,
        (false, false) => return None,
    };

    let name = text.replacen('{', "", 1).replacen('}', "", 1).trim().to_string();
    Some((role, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellValue;

    #[test]
    fn test_classify_cell_roles() {
        assert_eq!(
            classify_cell("{CRITERION"),
            Some((TagRole::Start, "CRITERION".to_string()))
        );
        assert_eq!(
            classify_cell("CRITERION}"),
            Some((TagRole::End, "CRITERION".to_string()))
        );
        assert_eq!(
            classify_cell("  {QUESTION}  "),
            Some((TagRole::SelfClosing, "QUESTION".to_string()))
        );
        assert_eq!(classify_cell("Some description"), None);
    }

    #[test]
    fn test_classify_skips_text_before_tag() {
        let row = Row::new(4)
            .with_cell(1, "RG1")
            .with_cell(3, "{REQUIREMENT_GROUP")
            .with_cell(5, "{QUESTION}");
        let classifier = RowClassifier::new(1, 17);

        match classifier.classify(&row) {
            Classification::Tag(token) => {
                assert_eq!(token.role, TagRole::Start);
                assert_eq!(token.name, TagName::RequirementGroup);
                assert_eq!(token.column, 3);
                assert_eq!(token.depth(), 1);
            }
            other => panic!("Expected tag, got {:?}", other),
        }
        assert_eq!(RowClassifier::label(&row, 3), None);
        assert_eq!(RowClassifier::label(&row, 2).as_deref(), Some("RG1"));
    }

    #[test]
    fn test_classify_blank_row() {
        let classifier = RowClassifier::new(1, 17);
        assert_eq!(classifier.classify(&Row::new(1)), Classification::None);

        let spaces = Row::new(2).with_cell(2, "   ").with_cell(3, "");
        assert_eq!(classifier.classify(&spaces), Classification::None);
    }

    #[test]
    fn test_classify_respects_scan_range() {
        let row = Row::new(3).with_cell(18, "{QUESTION}");
        assert_eq!(RowClassifier::new(1, 17).classify(&row), Classification::None);
        assert!(matches!(
            RowClassifier::new(1, 18).classify(&row),
            Classification::Tag(_)
        ));
    }

    #[test]
    fn test_classify_unknown_name() {
        let row = Row::new(3).with_cell(4, "{RESPONSE}");
        assert_eq!(
            RowClassifier::new(1, 17).classify(&row),
            Classification::Unknown {
                name: "RESPONSE".to_string(),
                column: 4
            }
        );
    }

    #[test]
    fn test_classify_numeric_cell_is_coerced() {
        let mut row = Row::new(3);
        row.cells.insert(2, CellValue::Number(7.0));
        row.cells.insert(3, CellValue::String("{CAPTION}".to_string()));

        assert!(matches!(
            RowClassifier::new(1, 17).classify(&row),
            Classification::Tag(TagToken { column: 3, .. })
        ));
    }
}
