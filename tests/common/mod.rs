//! テスト用ワークブック生成
//!
//! 1行目に列キー（1から始まる数値）、2行目に列ラベルを持つ、
//! クライテリオン・ワークブックと同じ形式のXLSXをメモリ上に生成します。

#![allow(dead_code)]

use espdxl::AttributeKey;
use espdxl::AttributeKey as K;
use rust_xlsxwriter::{Workbook, XlsxError};

/// 属性ラベルを置く列キー（この順に20から）
pub const ATTRIBUTE_COLUMNS: [AttributeKey; 11] = [
    AttributeKey::Name,
    AttributeKey::Description,
    AttributeKey::Cardinality,
    AttributeKey::PropertyDataType,
    AttributeKey::ElementCode,
    AttributeKey::ElementUuid,
    AttributeKey::BuyerValue,
    AttributeKey::RequestPath,
    AttributeKey::ResponseContent1,
    AttributeKey::ResponseContent3,
    AttributeKey::CodeList,
];

const FIRST_ATTRIBUTE_KEY: u16 = 20;

/// データ行: `(タグ列キー, ラベル, タグ, [(属性, 値)])`
pub type Line = (u16, &'static str, &'static str, &'static [(AttributeKey, &'static str)]);

fn attribute_key(key: AttributeKey) -> u16 {
    let pos = ATTRIBUTE_COLUMNS.iter().position(|k| *k == key).unwrap_or(0);
    FIRST_ATTRIBUTE_KEY + pos as u16
}

/// 列キー`key`の物理列（0始まり）
fn physical(key: u16) -> u16 {
    key - 1
}

/// シート名とデータ行からワークブックを生成
pub fn workbook(sheets: &[(&str, &[Line])]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let last_key = FIRST_ATTRIBUTE_KEY + ATTRIBUTE_COLUMNS.len() as u16 - 1;

    for (name, lines) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name)?;

        for key in 1..=last_key {
            worksheet.write_number(0, physical(key), f64::from(key))?;
        }
        for key in ATTRIBUTE_COLUMNS {
            worksheet.write_string(1, physical(attribute_key(key)), key.label())?;
        }

        for (idx, (col, label, tag, attrs)) in lines.iter().enumerate() {
            let row = idx as u32 + 2;
            worksheet.write_string(row, physical(*col), *tag)?;
            if !label.is_empty() {
                worksheet.write_string(row, physical(col - 1), *label)?;
            }
            for (key, value) in attrs.iter() {
                let column = physical(attribute_key(*key));
                match value.parse::<f64>() {
                    Ok(number) => worksheet.write_number(row, column, number)?,
                    Err(_) => worksheet.write_string(row, column, *value)?,
                };
            }
        }
    }

    workbook.save_to_buffer()
}

/// 除外基準シート（2クライテリオン）
pub const CONVICTIONS: &[Line] = &[
    (
        2,
        "C1",
        "{CRITERION",
        &[
            (K::Name, "Participation in a criminal organisation"),
            (K::Description, "Has the economic operator been convicted?"),
            (K::ElementCode, "CRIME-ORG"),
            (K::ElementUuid, "005eb9ed-1347-4ca3-bb29-9bc0db64e1ab"),
        ],
    ),
    (3, "L1", "{LEGISLATION}", &[(K::Cardinality, "0..n")]),
    (3, "QG1", "{QUESTION_GROUP", &[(K::Cardinality, "1")]),
    (
        4,
        "Q1",
        "{QUESTION}",
        &[
            (K::Cardinality, "1"),
            (K::PropertyDataType, "INDICATOR"),
            (K::Description, "Your answer?"),
            (K::ElementUuid, "974c8196-9d1c-419c-9ca9-45bb9f5fd59a"),
        ],
    ),
    (4, "QSG1", "{QUESTION_SUBGROUP", &[(K::Cardinality, "0..1"), (K::ElementCode, "ONTRUE")]),
    (
        5,
        "Q1",
        "{QUESTION}",
        &[(K::Cardinality, "1"), (K::PropertyDataType, "DATE"), (K::Description, "Date of conviction")],
    ),
    (4, "", "QUESTION_SUBGROUP}", &[]),
    (3, "", "QUESTION_GROUP}", &[]),
    (2, "", "CRITERION}", &[]),
    (
        2,
        "C2",
        "{CRITERION",
        &[
            (K::Name, "Corruption"),
            (K::ElementCode, "CORRUPTION"),
            (K::ElementUuid, "005eb9ed-1347-4ca3-bb29-9bc0db64e1ab"),
        ],
    ),
    (3, "L1", "{LEGISLATION}", &[(K::Cardinality, "0..n")]),
    (3, "QG1", "{QUESTION_GROUP", &[(K::Cardinality, "1")]),
    (4, "Q1", "{QUESTION}", &[(K::Cardinality, "1"), (K::PropertyDataType, "INDICATOR")]),
    (3, "", "QUESTION_GROUP}", &[]),
    (2, "", "CRITERION}", &[]),
];

/// 選定基準シート（ロット識別子つき）
pub const SUITABILITY: &[Line] = &[
    (
        2,
        "C3",
        "{CRITERION",
        &[(K::Name, "General yearly turnover"), (K::ElementCode, "GENERAL-TURNOVER")],
    ),
    (3, "RG1", "{REQUIREMENT_GROUP", &[(K::Cardinality, "1")]),
    (
        4,
        "RQ1",
        "{REQUIREMENT}",
        &[
            (K::Cardinality, "1"),
            (K::PropertyDataType, "LOT_IDENTIFIER"),
            (K::BuyerValue, "LOT-0001"),
        ],
    ),
    (
        4,
        "RQ2",
        "{REQUIREMENT}",
        &[
            (K::Cardinality, "1"),
            (K::PropertyDataType, "CODE"),
            (K::CodeList, "Country"),
        ],
    ),
    (3, "", "REQUIREMENT_GROUP}", &[]),
    (2, "", "CRITERION}", &[]),
];

/// 標準のテスト用ワークブック
pub fn criterion_workbook() -> Vec<u8> {
    workbook(&[("EG-Convictions", CONVICTIONS), ("SC-Suitability", SUITABILITY)])
        .expect("fixture workbook")
}
