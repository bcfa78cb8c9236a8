//! Report Module
//!
//! ワークブックの検査ツール群。解析と同じ列解決・行分類を使い、結果を
//! 構造化されたデータとして返します。表示（色付けなど）は呼び出し側が行います。
//!
//! - [`findings`]: ラベル（生成識別子）と実体化パスの検査
//! - [`structure`]: タグ構造、コードリスト、プロパティデータ型の抽出
//! - [`uuid`]: UUIDの一覧、重複検出、INDICATORの抽出
//! - [`ecertis`]: UUIDごとのeCERTISレコードの照会

pub mod ecertis;
pub mod findings;
pub mod structure;
pub mod uuid;

use serde_json::{Map, Value};

use crate::parser::{Classification, ColumnMap, RowClassifier};
use crate::types::{Row, TagToken, Worksheet};

pub use ecertis::{ecertis_url, ecertis_uuids, lookup_ecertis, read_ecertis_uuids, ECERTIS_URL};
pub use findings::{path_findings, tag_findings, Check, Finding};
pub use structure::{
    code_list_uses, full_structure, property_data_types, CodeListUse, ElementStructure,
    StructureLine, TERMINAL_NODE,
};
pub use uuid::{
    criterion_descriptions, indicator_report, service_criteria, uuid_dictionary,
    CriterionDescription, CriterionIndicators, IndicatorEntry, ServiceCriterion, UuidEntry,
    UuidIndex,
};

/// タグを持つ行
#[derive(Debug, Clone)]
pub struct TaggedRow<'s> {
    pub token: TagToken,
    pub row: &'s Row,
    /// タグ列の左隣のラベル
    pub label: Option<String>,
}

impl TaggedRow<'_> {
    /// 入れ子の深さ（CRITERIONが0）
    pub fn depth(&self) -> usize {
        usize::try_from(self.token.depth()).unwrap_or(0)
    }
}

/// 語彙内のタグを持つ行を順に返す
///
/// 構造エラーがあっても中断しないため、壊れたシートの調査にも使えます。
pub fn tagged_rows<'s>(
    sheet: &'s Worksheet,
    classifier: &'s RowClassifier,
) -> impl Iterator<Item = TaggedRow<'s>> + 's {
    sheet.rows.iter().filter_map(move |row| match classifier.classify(row) {
        Classification::Tag(token) => Some(TaggedRow {
            label: RowClassifier::label(row, token.column),
            token,
            row,
        }),
        _ => None,
    })
}

/// シートのヘッダー行から列位置を解決
pub(crate) fn columns_of(sheet: &Worksheet) -> ColumnMap {
    sheet.header().map(ColumnMap::resolve).unwrap_or_default()
}

/// すべての行を列キー → 値のJSONオブジェクトとして出力
///
/// 先頭はヘッダー行（列ラベル）です。
pub fn dump_rows(sheet: &Worksheet) -> Vec<Value> {
    sheet
        .rows
        .iter()
        .map(|row| {
            let object: Map<String, Value> = row
                .cells
                .iter()
                .filter(|(_, v)| !v.is_empty())
                .map(|(col, v)| (col.to_string(), Value::String(v.to_text())))
                .collect();
            Value::Object(object)
        })
        .collect()
}
