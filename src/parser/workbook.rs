//! Workbook Reader Module
//!
//! calamineを使用したワークブックの読み込み。
//! 1行目の列キー行を論理列インデックスとして解釈し、以降の行を`Row`に変換します。

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek};
use tracing::{debug, warn};

use crate::api::SheetSelector;
use crate::error::EspdError;
use crate::parser::archive;
use crate::security::SecurityConfig;
use crate::types::{CellValue, Row, Worksheet};

/// ワークブックリーダー
///
/// calamineのラッパーとして、ワークブックレベルの操作を提供します。
pub struct WorkbookReader {
    workbook: Sheets<Cursor<Vec<u8>>>,
}

impl WorkbookReader {
    /// ワークブックを開く
    ///
    /// 入力全体をメモリに読み込み、サイズ制限とアーカイブ構造を検査してから
    /// calamineに渡します。
    ///
    /// # 引数
    ///
    /// * `reader` - ワークブックを読み込むためのリーダー（Read + Seekトレイトを実装）
    /// * `security` - 適用するセキュリティ制限
    pub fn open<R: Read + Seek>(mut reader: R, security: &SecurityConfig) -> Result<Self, EspdError> {
        let mut buffer = Vec::new();
        let bytes_read = reader.read_to_end(&mut buffer)?;
        security.check_input_size(bytes_read as u64)?;

        if archive::is_zip(&buffer) {
            let summary = archive::inspect(Cursor::new(buffer.as_slice()), security)?;
            debug!(
                files = summary.file_count,
                worksheets = summary.worksheet_entries.len(),
                "archive inspected"
            );
        }

        let workbook = open_workbook_auto_from_rs(Cursor::new(buffer))?;
        Ok(Self { workbook })
    }

    /// すべてのシート名を取得
    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    /// シート選択方式に基づいてシートを選択
    ///
    /// # 戻り値
    ///
    /// * `Ok(Vec<String>)` - 選択されたシート名のリスト
    /// * `Err(EspdError::Config)` - シートが見つからない、またはインデックスが範囲外の場合
    pub fn select_sheets(&self, selector: &SheetSelector) -> Result<Vec<String>, EspdError> {
        let all_sheet_names = self.sheet_names();
        let by_index = |index: usize| {
            all_sheet_names.get(index).cloned().ok_or_else(|| {
                EspdError::Config(format!(
                    "Sheet index {} is out of range (total: {})",
                    index,
                    all_sheet_names.len()
                ))
            })
        };
        let by_name = |name: &String| {
            if all_sheet_names.contains(name) {
                Ok(name.clone())
            } else {
                Err(EspdError::Config(format!("Sheet '{}' not found", name)))
            }
        };

        match selector {
            SheetSelector::All => Ok(all_sheet_names.clone()),
            SheetSelector::Index(index) => Ok(vec![by_index(*index)?]),
            SheetSelector::Name(name) => Ok(vec![by_name(name)?]),
            SheetSelector::Indices(indices) => indices.iter().map(|i| by_index(*i)).collect(),
            SheetSelector::Names(names) => names.iter().map(by_name).collect(),
            SheetSelector::Prefix(prefix) => Ok(all_sheet_names
                .iter()
                .filter(|name| name.starts_with(prefix.as_str()))
                .cloned()
                .collect()),
        }
    }

    /// 列キー行を解釈してシートを読み込む
    ///
    /// 先頭行のセル値（数値）を論理列インデックスとして使用し、以降の行は
    /// キーを持つ列のセルだけを保持します。空行は読み飛ばします。
    /// 戻り値の`rows[0]`が列ラベルのヘッダー行になります。
    pub fn read_sheet(&mut self, name: &str) -> Result<Worksheet, EspdError> {
        let range = self.workbook.worksheet_range(name)?;
        Ok(keyed_worksheet(name, &range))
    }

    /// 位置ベースでシートを読み込む
    ///
    /// 列キー行を持たないワークブック（コードリスト、EAテーブル）用。
    /// 論理列インデックスは0始まりの物理列位置です。
    pub fn read_positional(&mut self, name: &str) -> Result<Worksheet, EspdError> {
        let range = self.workbook.worksheet_range(name)?;
        let (row_offset, col_offset) = range.start().unwrap_or((0, 0));

        let rows = range
            .rows()
            .enumerate()
            .map(|(idx, cells)| {
                let mut row = Row::new(row_offset + idx as u32 + 1);
                for (col, cell) in cells.iter().enumerate() {
                    let value = convert_cell(cell);
                    if !value.is_empty() {
                        row.cells.insert(col_offset + col as u32, value);
                    }
                }
                row
            })
            .collect();

        Ok(Worksheet {
            name: name.to_string(),
            rows,
        })
    }
}

/// calamineのセル値を変換
pub(crate) fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::String(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Error(e) => CellValue::Error(format!("{:?}", e)),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Empty => CellValue::Empty,
    }
}

fn keyed_worksheet(name: &str, range: &Range<Data>) -> Worksheet {
    let (row_offset, _) = range.start().unwrap_or((0, 0));
    let mut physical = range.rows().enumerate();

    let keys: BTreeMap<usize, u32> = match physical.next() {
        Some((_, key_row)) => key_row
            .iter()
            .enumerate()
            .filter_map(|(pos, cell)| {
                let text = convert_cell(cell).to_text();
                match text.trim().parse::<u32>() {
                    Ok(key) => Some((pos, key)),
                    Err(_) => {
                        if !text.trim().is_empty() {
                            warn!(sheet = name, key = %text, "non-numeric column key ignored");
                        }
                        None
                    }
                }
            })
            .collect(),
        None => BTreeMap::new(),
    };

    let mut rows = Vec::new();
    for (idx, cells) in physical {
        let mut row = Row::new(row_offset + idx as u32 + 1);
        for (pos, key) in &keys {
            if let Some(cell) = cells.get(*pos) {
                let value = convert_cell(cell);
                if !value.is_empty() {
                    row.cells.insert(*key, value);
                }
            }
        }
        if !row.cells.is_empty() {
            rows.push(row);
        }
    }

    debug!(sheet = name, rows = rows.len(), "worksheet read");
    Worksheet {
        name: name.to_string(),
        rows,
    }
}
