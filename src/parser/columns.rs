//! Column Resolver
//!
//! ヘッダー行の列ラベルから、属性キーごとの列位置を解決するモジュール。
//! シートのテンプレートごとに列位置が異なるため、シートごとに再計算します。

use std::collections::BTreeMap;

use crate::types::{AttributeKey, Attributes, Row};

/// 属性キー → 列インデックス
///
/// ヘッダー行に見つからないラベルは未解決のまま残り、そのシートでは
/// 該当する属性が設定されることはありません（エラーではありません）。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    columns: BTreeMap<AttributeKey, u32>,
}

impl ColumnMap {
    /// ヘッダー行から列位置を解決
    ///
    /// 同じラベルが複数の列にある場合は、最も左の列を採用します。
    pub fn resolve(header: &Row) -> Self {
        let columns = AttributeKey::ALL
            .into_iter()
            .filter_map(|key| {
                header
                    .cells
                    .iter()
                    .find(|(_, value)| value.to_text().trim() == key.label())
                    .map(|(col, _)| (key, *col))
            })
            .collect();
        Self { columns }
    }

    /// 列位置を取得
    pub fn column(&self, key: AttributeKey) -> Option<u32> {
        self.columns.get(&key).copied()
    }

    /// 解決済みの属性キー数
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// 行から属性値を取得（前後の空白を除去、空なら`None`）
    pub fn value(&self, row: &Row, key: AttributeKey) -> Option<String> {
        self.column(key).and_then(|col| row.trimmed(col))
    }

    /// 行のカーディナリティ（未設定なら`None`）
    pub fn cardinality(&self, row: &Row) -> Option<String> {
        self.value(row, AttributeKey::Cardinality)
    }

    /// 解決済みのすべての列から属性を読み取る
    ///
    /// 空の値は保持しません。
    pub fn attributes(&self, row: &Row) -> Attributes {
        self.columns
            .iter()
            .filter_map(|(key, col)| row.trimmed(*col).map(|v| (*key, v)))
            .collect()
    }
}
