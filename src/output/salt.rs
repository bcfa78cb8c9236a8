//! PlantUML Salt Emitters
//!
//! 文書ツリーからPlantUML Saltの画面モックアップとツリーテーブルを生成するモジュール。

use indexmap::IndexMap;
use std::io::Write;

use crate::document::{Criterion, Document, Node};
use crate::error::EspdError;
use crate::types::{TagName, TagRole};

/// 説明文の最大表示文字数
const MAX_DESCRIPTION: usize = 60;
/// 切り詰め時に残す文字数
const TRUNCATED_LENGTH: usize = 56;

/// 長い説明文を切り詰める
///
/// 60文字を超える場合は先頭56文字に`...`を付けます。
fn shorten(text: &str) -> String {
    if text.chars().count() > MAX_DESCRIPTION {
        let mut short: String = text.chars().take(TRUNCATED_LENGTH).collect();
        short.push_str("...");
        short
    } else {
        text.to_string()
    }
}

fn label(node: &Node) -> &str {
    node.label.as_deref().unwrap_or(&node.identifier)
}

/// 空でない部分を空白で連結
fn join(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// 画面モックアップ形式のエミッター
///
/// クライテリオンごとに`@startsalt`〜`@endsalt`のブロックを出力します。
/// グループは枠、INDICATORはYes/Noのラジオボタン、その他の値は入力欄になります。
pub struct SaltMockupEmitter;

impl SaltMockupEmitter {
    pub fn render<W: Write>(&self, doc: &Document, writer: &mut W) -> Result<(), EspdError> {
        for criterion in doc.criteria.values() {
            write_mockup(criterion, writer)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn write_mockup<W: Write>(criterion: &Criterion, writer: &mut W) -> Result<(), EspdError> {
    let node = &criterion.node;
    writeln!(writer, "@startsalt")?;
    writeln!(
        writer,
        "{{+\n{} - {}",
        join(&[label(node), node.name().unwrap_or_default()]),
        shorten(node.description().unwrap_or_default())
    )?;
    for child in node.children.values() {
        write_mockup_node(child, writer)?;
    }
    writeln!(writer, "}}")?;
    writeln!(writer, "@endsalt")?;
    Ok(())
}

fn write_mockup_node<W: Write>(node: &Node, writer: &mut W) -> Result<(), EspdError> {
    let description = node.description().unwrap_or_default();
    match node.kind {
        TagName::Legislation => writeln!(writer, "{}", label(node))?,
        _ if node.role != TagRole::SelfClosing => {
            let answer = match node.element_code() {
                Some("ONTRUE") => "YES",
                Some("ONFALSE") => "NO",
                _ => "",
            };
            writeln!(
                writer,
                "{{^ \"{}\"",
                join(&[label(node), node.name().unwrap_or_default(), description, answer])
            )?;
            writeln!(writer, ".")?;
            for child in node.children.values() {
                write_mockup_node(child, writer)?;
            }
            writeln!(writer, "}} | *")?;
        }
        _ if node.property_data_type() == Some("INDICATOR") => {
            writeln!(writer, "{}  {} | {{ () Yes | () No}}", label(node), description)?;
        }
        _ => writeln!(
            writer,
            "{} {} | \" {} \"",
            label(node),
            description,
            node.property_data_type().unwrap_or_default()
        )?,
    }
    Ok(())
}

/// ツリーテーブル形式のエミッター
///
/// ワークシートごとに1つのツリーテーブルを出力します。行頭の`+`の数が深さです。
pub struct SaltTreeTableEmitter;

impl SaltTreeTableEmitter {
    pub fn render<W: Write>(&self, doc: &Document, writer: &mut W) -> Result<(), EspdError> {
        let mut sheets: IndexMap<&str, Vec<&Criterion>> = IndexMap::new();
        for criterion in doc.criteria.values() {
            sheets.entry(criterion.sheet.as_str()).or_default().push(criterion);
        }

        for criteria in sheets.values() {
            writeln!(writer, "@startsalt\n{{")?;
            for criterion in criteria {
                writeln!(writer, "== {}\n{{T-", criterion.name().unwrap_or_default())?;
                let mut lines = Vec::new();
                criterion.node.walk(&mut |node, depth| {
                    let description = match node.description() {
                        Some(d) if depth == 0 => shorten(d),
                        Some(d) => d.to_string(),
                        None => ".".to_string(),
                    };
                    lines.push(format!("{} {} | {}", "+".repeat(depth + 1), label(node), description));
                });
                for line in lines {
                    writeln!(writer, "{line}")?;
                }
                writeln!(writer, "}}\n==\n")?;
            }
            writeln!(writer, "}}\n@endsalt")?;
        }
        writer.flush()?;
        Ok(())
    }
}
