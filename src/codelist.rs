//! Code List Module
//!
//! コードリストのワークブックを読み込み、技術的なコードリストを
//! genericode形式で書き出すモジュール。
//!
//! 各ワークシートは1つのコードリストです。先頭にキーと値の行（`ShortName`、
//! `ListID`など）が並び、`Code`行の後にコード表が続きます。

use indexmap::IndexMap;
use std::fs;
use std::io::{Read, Seek, Write};
use std::path::Path;
use tracing::{info, warn};

use crate::error::EspdError;
use crate::output::xml::{write_document, XmlElement};
use crate::parser::WorkbookReader;
use crate::remote::{fetch_each, Fetch, Lookup};
use crate::security::SecurityConfig;
use crate::types::{Row, Worksheet};

/// genericodeの名前空間
const GENERICODE_NS: &str = "http://docs.oasis-open.org/codelist/ns/genericode/1.0/";

/// 技術的なコードリストのCanonicalUriの接頭辞
const TECHNICAL_URI_PREFIX: &str = "https://github.com/";

/// コード表の言語列（列E以降の順）
pub const LANGUAGES: [&str; 24] = [
    "bul", "spa", "ces", "dan", "deu", "est", "ell", "eng", "fra", "gle", "hrv", "ita", "lav",
    "lit", "hun", "mlt", "nld", "pol", "por", "ron", "slk", "slv", "fin", "swe",
];

/// 言語列の開始位置（列E）
const FIRST_LANGUAGE_COLUMN: u32 = 4;

/// コードリストの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeListKind {
    /// このリポジトリで管理するリスト（genericodeを生成）
    Technical,
    /// 外部（EU Vocabularies）で管理するリスト
    External,
}

/// コード表の1行
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeEntry {
    pub code: String,
    pub name: String,
    pub description: String,
    pub status: String,
    /// 言語コード → 名称（空の値は保持しない）
    pub names: IndexMap<&'static str, String>,
}

/// 1つのコードリスト定義
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeListDefinition {
    /// 識別用のキーと値（`ShortName`、`ListID`など）
    pub identification: IndexMap<String, String>,
    /// コード → 行
    pub codes: IndexMap<String, CodeEntry>,
}

impl CodeListDefinition {
    fn field(&self, key: &str) -> Option<&str> {
        self.identification.get(key).map(String::as_str)
    }

    fn field_or_empty(&self, key: &str) -> &str {
        self.field(key).unwrap_or_default()
    }

    pub fn short_name(&self) -> &str {
        self.field_or_empty("ShortName")
    }

    /// CanonicalUriから種類を判定
    pub fn kind(&self) -> CodeListKind {
        if self.field_or_empty("CanonicalUri").starts_with(TECHNICAL_URI_PREFIX) {
            CodeListKind::Technical
        } else {
            CodeListKind::External
        }
    }

    /// 表示名（外部リストはLongName、技術リストはListID）
    pub fn name(&self) -> &str {
        match self.kind() {
            CodeListKind::External => self.field_or_empty("LongName"),
            CodeListKind::Technical => self.field_or_empty("ListID"),
        }
    }

    pub fn location(&self) -> &str {
        self.field_or_empty("LocationUri")
    }

    /// 出力ファイル名（`<ShortName>.gc`）
    pub fn file_name(&self) -> String {
        format!("{}.gc", self.short_name())
    }
}

const IDENTIFICATION_KEYS: [&str; 9] = [
    "ShortName",
    "ListID",
    "Version",
    "LongName",
    "CanonicalVersionUri",
    "LocationUri",
    "AgencyIdentifier",
    "CanonicalUri",
    "AgencyLongName",
];

fn cell(row: &Row, col: u32) -> String {
    row.text(col).unwrap_or_default()
}

/// 位置ベースで読み込んだワークシートからコードリストを解析
///
/// # 戻り値
///
/// * `Err(EspdError::Config)` - `ShortName`または`CanonicalUri`がない場合
pub fn parse_code_list(sheet: &Worksheet) -> Result<CodeListDefinition, EspdError> {
    let mut list = CodeListDefinition::default();
    let mut in_table = false;

    for row in sheet.rows.iter().filter(|r| !r.is_blank()) {
        let key = cell(row, 0);
        if in_table {
            if key.trim().is_empty() {
                warn!(sheet = %sheet.name, row = row.number, "code row without code");
                continue;
            }
            let names = LANGUAGES
                .iter()
                .enumerate()
                .filter_map(|(idx, lang)| {
                    row.text(FIRST_LANGUAGE_COLUMN + idx as u32)
                        .filter(|v| !v.is_empty())
                        .map(|v| (*lang, v))
                })
                .collect();
            list.codes.insert(
                key.clone(),
                CodeEntry {
                    code: key,
                    name: cell(row, 1),
                    description: cell(row, 2),
                    status: cell(row, 3),
                    names,
                },
            );
        } else if key == "Code" {
            in_table = true;
        } else if IDENTIFICATION_KEYS.contains(&key.as_str()) {
            list.identification.insert(key, cell(row, 1));
        } else {
            warn!(sheet = %sheet.name, key = %key, "unknown code list key");
        }
    }

    for required in ["ShortName", "CanonicalUri"] {
        if list.field(required).map_or(true, str::is_empty) {
            return Err(EspdError::Config(format!(
                "Code list sheet '{}' has no {}",
                sheet.name, required
            )));
        }
    }
    Ok(list)
}

fn column(id: &str, use_: &str, short_name: &str, data_type: &str, lang: &str) -> XmlElement {
    XmlElement::new("Column")
        .attr("Id", id)
        .attr("Use", use_)
        .child(XmlElement::new("ShortName").text(short_name))
        .child(XmlElement::new("Data").attr("Type", data_type).attr("Lang", lang))
}

fn value(column_ref: &str, text: &str) -> XmlElement {
    XmlElement::new("Value")
        .attr("ColumnRef", column_ref)
        .child(XmlElement::new("SimpleValue").text(text))
}

/// genericode文書を組み立てる
pub fn genericode(list: &CodeListDefinition) -> XmlElement {
    let short_name = list.short_name();
    let long_name = list
        .field("LongName")
        .filter(|v| !v.is_empty())
        .unwrap_or(short_name);

    let agency = match list.field("AgencyLongName").filter(|v| !v.is_empty()) {
        Some(agency_name) => XmlElement::new("Agency")
            .child(XmlElement::new("LongName").text(agency_name))
            .child(XmlElement::new("Identifier").attr("Identifier", list.field_or_empty("AgencyIdentifier"))),
        None => XmlElement::new("Agency")
            .child(XmlElement::new("ShortName").text("Publications Office"))
            .child(XmlElement::new("LongName").text("Publications Office of the European Union"))
            .child(XmlElement::new("Identifier").attr("Identifier", "TED-OP-ESPD")),
    };

    let identification = XmlElement::new("Identification")
        .child(XmlElement::new("ShortName").text(short_name))
        .child(XmlElement::new("LongName").text(long_name))
        .child(
            XmlElement::new("LongName")
                .attr("Identifier", "listId")
                .text(list.field_or_empty("ListID")),
        )
        .child(XmlElement::new("Version").text(list.field_or_empty("Version")))
        .child(XmlElement::new("CanonicalUri").text(list.field_or_empty("CanonicalUri")))
        .child(XmlElement::new("CanonicalVersionUri").text(list.field_or_empty("CanonicalVersionUri")))
        .child(XmlElement::new("LocationUri").text(list.field_or_empty("LocationUri")))
        .child(agency);

    let mut columns = XmlElement::new("ColumnSet")
        .child(column("code", "required", "Code", "normalizedString", "eng"))
        .child(column("Name", "optional", "Name", "string", "eng"))
        .child(column("status", "required", "Status", "normalizedString", "eng"));
    for lang in LANGUAGES {
        columns.push(column(&format!("name-{lang}"), "optional", "Name", "string", lang));
    }
    columns.push(
        XmlElement::new("Key")
            .attr("Id", "codeKey")
            .child(XmlElement::new("ShortName").text("CodeKey"))
            .child(XmlElement::new("ColumnRef").attr("Ref", "code")),
    );

    let mut rows = XmlElement::new("SimpleCodeList");
    for entry in list.codes.values() {
        let mut row = XmlElement::new("Row")
            .child(value("code", &entry.code))
            .child(value("Name", &entry.name))
            .child(value("status", &entry.status));
        for (lang, name) in &entry.names {
            row.push(value(&format!("name-{lang}"), name));
        }
        rows.push(row);
    }

    XmlElement::new("gc:CodeList")
        .attr("xmlns:gc", GENERICODE_NS)
        .child(identification)
        .child(columns)
        .child(rows)
}

/// genericode文書を書き出す
pub fn write_genericode<W: Write>(list: &CodeListDefinition, writer: W) -> Result<(), EspdError> {
    write_document(&genericode(list), writer)
}

/// ワークブックのすべてのコードリストを読み込む
///
/// 解析できないシートは警告を出して読み飛ばします。
pub fn read_code_lists<R: Read + Seek>(
    reader: R,
    security: &SecurityConfig,
) -> Result<Vec<CodeListDefinition>, EspdError> {
    let mut workbook = WorkbookReader::open(reader, security)?;
    let mut lists = Vec::new();
    for name in workbook.sheet_names() {
        let sheet = workbook.read_positional(&name)?;
        match parse_code_list(&sheet) {
            Ok(list) => {
                info!(sheet = %name, codes = list.codes.len(), kind = ?list.kind(), "code list read");
                lists.push(list);
            }
            Err(e) => warn!(sheet = %name, error = %e, "code list skipped"),
        }
    }
    Ok(lists)
}

/// 外部コードリストを`LocationUri`から取得し、`out_dir`に`<ShortName>.gc`として保存
///
/// 技術的なコードリストは対象外です。`LocationUri`のないリストは取得せずに
/// 失敗として記録します。
pub fn download_external<F: Fetch + ?Sized>(
    lists: &[CodeListDefinition],
    fetcher: &F,
    out_dir: &Path,
) -> Vec<Lookup> {
    let mut missing = Vec::new();
    let mut requests = Vec::new();
    for list in lists.iter().filter(|l| l.kind() == CodeListKind::External) {
        if list.location().is_empty() {
            warn!(list = list.short_name(), "external code list without LocationUri");
            missing.push(Lookup {
                item: list.short_name().to_string(),
                url: String::new(),
                outcome: Err("missing LocationUri".to_string()),
            });
        } else {
            info!(
                list = list.short_name(),
                version = list.field_or_empty("CanonicalVersionUri"),
                "download"
            );
            requests.push((list.short_name().to_string(), list.location().to_string()));
        }
    }

    let mut lookups = fetch_each(fetcher, &requests, |name, fetched| {
        fs::create_dir_all(out_dir)?;
        fs::write(out_dir.join(format!("{}.gc", name)), &fetched.body)?;
        Ok(())
    });
    lookups.extend(missing);
    lookups
}
