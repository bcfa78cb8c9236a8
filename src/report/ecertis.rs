//! eCERTIS Lookup
//!
//! ワークブックの`uuid`列のUUIDごとに、eCERTISにレコードがあるかを照会します。

use indexmap::IndexSet;
use std::io::{Read, Seek};
use tracing::debug;

use crate::error::EspdError;
use crate::parser::WorkbookReader;
use crate::remote::{fetch_each, Fetch, Lookup};
use crate::security::SecurityConfig;
use crate::types::Worksheet;

/// eCERTISのESPDクライテリオンAPI
pub const ECERTIS_URL: &str = "https://ec.europa.eu/growth/tools-databases/ecertisrest/criteria/espd";

const UUID_HEADER: &str = "uuid";

/// 位置ベースで読み込んだシートの`uuid`列から、重複を除いたUUIDを出現順に返す
///
/// 先頭行を列名とします。`uuid`列のないシートは無視します。
pub fn ecertis_uuids(sheets: &[Worksheet]) -> Vec<String> {
    let mut uuids = IndexSet::new();
    for sheet in sheets {
        let Some(header) = sheet.rows.first() else {
            continue;
        };
        let Some(col) = header
            .cells
            .iter()
            .find(|(_, v)| v.to_text().trim() == UUID_HEADER)
            .map(|(col, _)| *col)
        else {
            debug!(sheet = %sheet.name, "no uuid column");
            continue;
        };
        for row in &sheet.rows[1..] {
            if let Some(uuid) = row.text(col) {
                let uuid = uuid.trim();
                if !uuid.is_empty() {
                    uuids.insert(uuid.to_string());
                }
            }
        }
    }
    uuids.into_iter().collect()
}

/// ワークブックのすべてのシートからUUIDを読み込む
pub fn read_ecertis_uuids<R: Read + Seek>(
    reader: R,
    security: &SecurityConfig,
) -> Result<Vec<String>, EspdError> {
    let mut workbook = WorkbookReader::open(reader, security)?;
    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        sheets.push(workbook.read_positional(&name)?);
    }
    Ok(ecertis_uuids(&sheets))
}

/// UUIDの照会URL
pub fn ecertis_url(uuid: &str) -> String {
    format!("{}/{}", ECERTIS_URL, uuid)
}

/// UUIDを1件ずつ照会
///
/// 応答の内容は使わず、ステータスまたはエラーだけを記録します。
pub fn lookup_ecertis<F: Fetch + ?Sized>(fetcher: &F, uuids: &[String]) -> Vec<Lookup> {
    let requests: Vec<(String, String)> = uuids
        .iter()
        .map(|uuid| (uuid.clone(), ecertis_url(uuid)))
        .collect();
    fetch_each(fetcher, &requests, |_, _| Ok(()))
}
