//! EA Tables Module
//!
//! Enterprise Architectのリポジトリから書き出したテーブル群をJSONに変換するモジュール。
//!
//! 入力はテーブルごとに1つのワークシートを持つワークブックで、各シートの
//! 先頭行が列名です。オブジェクトにはプロパティと属性を`Object_ID`で結合します。

use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use std::io::{Read, Seek};
use tracing::{debug, info};

use crate::error::EspdError;
use crate::parser::WorkbookReader;
use crate::security::SecurityConfig;
use crate::types::{CellValue, Worksheet};

pub const OBJECT_TABLE: &str = "t_object";
pub const PROPERTY_TABLE: &str = "t_objectproperties";
pub const ATTRIBUTE_TABLE: &str = "t_attribute";
pub const CONNECTOR_TABLE: &str = "t_connector";

/// 結合キーの列名
const OBJECT_ID: &str = "Object_ID";

/// テーブルの1行
pub type Record = Map<String, Value>;

/// 読み込んだテーブル群
#[derive(Debug, Clone, Default)]
pub struct EaTables {
    pub objects: Vec<Record>,
    pub object_properties: Vec<Record>,
    pub attributes: Vec<Record>,
    pub connectors: Vec<Record>,
}

fn cell_json(value: &CellValue) -> Value {
    match value {
        CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Value::from(*n as i64),
        CellValue::Number(n) => Number::from_f64(*n).map(Value::Number).unwrap_or(Value::Null),
        CellValue::Bool(b) => Value::Bool(*b),
        CellValue::String(s) | CellValue::Error(s) => Value::String(s.clone()),
        CellValue::Empty => Value::Null,
    }
}

/// 位置ベースで読み込んだシートをレコードの列に変換
///
/// 先頭行を列名とし、列名のない列は無視します。空のセルは`null`になります。
pub fn table_records(sheet: &Worksheet) -> Vec<Record> {
    let Some(header) = sheet.rows.first() else {
        return Vec::new();
    };
    let names: Vec<(u32, String)> = header
        .cells
        .iter()
        .map(|(col, v)| (*col, v.to_text().trim().to_string()))
        .filter(|(_, name)| !name.is_empty())
        .collect();

    sheet.rows[1..]
        .iter()
        .filter(|row| !row.is_blank())
        .map(|row| {
            names
                .iter()
                .map(|(col, name)| {
                    let value = row.cells.get(col).map(cell_json).unwrap_or(Value::Null);
                    (name.clone(), value)
                })
                .collect()
        })
        .collect()
}

fn join_key(record: &Record) -> Option<String> {
    match record.get(OBJECT_ID)? {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()),
        other => Some(other.to_string()),
    }
}

fn group_by_object(records: &[Record]) -> HashMap<String, Vec<Record>> {
    let mut groups: HashMap<String, Vec<Record>> = HashMap::new();
    for record in records {
        if let Some(key) = join_key(record) {
            groups.entry(key).or_default().push(record.clone());
        }
    }
    groups
}

impl EaTables {
    /// ワークブックから4つのテーブルを読み込む
    ///
    /// # 戻り値
    ///
    /// * `Err(EspdError::Config)` - テーブルのシートが見つからない場合
    pub fn read<R: Read + Seek>(reader: R, security: &SecurityConfig) -> Result<Self, EspdError> {
        let mut workbook = WorkbookReader::open(reader, security)?;
        let available = workbook.sheet_names();
        let mut table = |name: &str| -> Result<Vec<Record>, EspdError> {
            if !available.iter().any(|s| s == name) {
                return Err(EspdError::Config(format!("Table '{}' not found", name)));
            }
            let records = table_records(&workbook.read_positional(name)?);
            debug!(table = name, records = records.len(), "table read");
            Ok(records)
        };

        Ok(Self {
            objects: table(OBJECT_TABLE)?,
            object_properties: table(PROPERTY_TABLE)?,
            attributes: table(ATTRIBUTE_TABLE)?,
            connectors: table(CONNECTOR_TABLE)?,
        })
    }

    /// オブジェクトとコネクタのJSONに変換
    ///
    /// 各オブジェクトに`properties`と`attributes`の配列を追加します。
    pub fn to_json(&self) -> Value {
        let properties = group_by_object(&self.object_properties);
        let attributes = group_by_object(&self.attributes);

        let objects: Vec<Value> = self
            .objects
            .iter()
            .map(|object| {
                let key = join_key(object);
                let related = |groups: &HashMap<String, Vec<Record>>| {
                    let records = key
                        .as_ref()
                        .and_then(|k| groups.get(k))
                        .cloned()
                        .unwrap_or_default();
                    Value::Array(records.into_iter().map(Value::Object).collect())
                };
                let mut object = object.clone();
                object.insert("properties".to_string(), related(&properties));
                object.insert("attributes".to_string(), related(&attributes));
                Value::Object(object)
            })
            .collect();

        info!(
            objects = objects.len(),
            connectors = self.connectors.len(),
            "EA tables converted"
        );

        let mut root = Map::new();
        root.insert("objects".to_string(), Value::Array(objects));
        root.insert(
            "connectors".to_string(),
            Value::Array(self.connectors.iter().cloned().map(Value::Object).collect()),
        );
        Value::Object(root)
    }
}
