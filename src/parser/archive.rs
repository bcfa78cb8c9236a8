//! Archive Inspection Module
//!
//! calamineに渡す前に、XLSX（ZIPアーカイブ）の構造を検査するモジュール。
//! エントリ数、パス、展開後サイズの上限を確認します。

use std::io::{Read, Seek};
use zip::ZipArchive;

use crate::error::EspdError;
use crate::security::{validate_zip_path, SecurityConfig};

/// 検査結果の概要
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct ArchiveSummary {
    /// エントリ数
    pub file_count: usize,
    /// 展開後サイズの合計
    pub decompressed_size: u64,
    /// `xl/worksheets/` 配下のワークシートXML
    pub worksheet_entries: Vec<String>,
}

/// ZIPシグネチャで始まるかどうか
///
/// `.xls`などのZIP以外の形式は検査の対象外です。
pub(crate) fn is_zip(bytes: &[u8]) -> bool {
    bytes.starts_with(b"PK\x03\x04")
}

/// アーカイブを検査
///
/// # 引数
///
/// * `reader` - XLSXファイルのリーダー
/// * `config` - 適用するセキュリティ制限
///
/// # 戻り値
///
/// * `Ok(ArchiveSummary)` - すべての制限を満たす場合
/// * `Err(EspdError::SecurityViolation)` - 制限に違反した場合
/// * `Err(EspdError::Zip)` - ZIPとして読み込めない場合
pub(crate) fn inspect<R: Read + Seek>(
    reader: R,
    config: &SecurityConfig,
) -> Result<ArchiveSummary, EspdError> {
    let mut archive = ZipArchive::new(reader).map_err(|e| EspdError::Zip(e.to_string()))?;

    if archive.len() > config.max_file_count {
        return Err(EspdError::SecurityViolation(format!(
            "ZIP archive contains too many files: {} (max: {})",
            archive.len(),
            config.max_file_count
        )));
    }

    let mut summary = ArchiveSummary {
        file_count: archive.len(),
        ..ArchiveSummary::default()
    };

    for i in 0..archive.len() {
        let file = archive
            .by_index(i)
            .map_err(|e| EspdError::Zip(e.to_string()))?;

        let file_name = file.name().to_string();
        validate_zip_path(&file_name)
            .map_err(|e| EspdError::SecurityViolation(format!("Invalid ZIP path: {}", e)))?;

        let file_size = file.size();
        if file_size > config.max_file_size {
            return Err(EspdError::SecurityViolation(format!(
                "File '{}' exceeds maximum size: {} bytes (max: {} bytes)",
                file_name, file_size, config.max_file_size
            )));
        }

        summary.decompressed_size = summary
            .decompressed_size
            .checked_add(file_size)
            .ok_or_else(|| {
                EspdError::SecurityViolation(
                    "Total decompressed size calculation overflow".to_string(),
                )
            })?;

        if summary.decompressed_size > config.max_decompressed_size {
            return Err(EspdError::SecurityViolation(format!(
                "Total decompressed size exceeds maximum: {} bytes (max: {} bytes)",
                summary.decompressed_size, config.max_decompressed_size
            )));
        }

        if file_name.starts_with("xl/worksheets/") && file_name.ends_with(".xml") {
            summary.worksheet_entries.push(file_name);
        }
    }

    Ok(summary)
}
