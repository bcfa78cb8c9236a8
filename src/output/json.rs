//! JSON Emitter
//!
//! 文書ツリーをJSONとして出力するモジュール。
//!
//! `JsonEmitter`はツリーをそのまま、`VueModelEmitter`は繰り返しの
//! 2番目以降の出現を除いたVue用のモデルを出力します。

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::io::Write;

use crate::document::{Document, Node};
use crate::error::EspdError;
use crate::types::AttributeKey;

/// JSON形式のエミッター
///
/// キーはクライテリオンのキー（`C1`など）、値はクライテリオンのツリーです。
/// インデントは空白4文字です。
pub struct JsonEmitter;

impl JsonEmitter {
    pub fn render<W: Write>(&self, doc: &Document, writer: &mut W) -> Result<(), EspdError> {
        write_pretty(doc, writer)
    }
}

/// Vueコンポーネント用のJSONモデルを出力するエミッター
///
/// `model_view`で絞り込んだ文書を`JsonEmitter`と同じ書式で出力します。
pub struct VueModelEmitter;

impl VueModelEmitter {
    pub fn render<W: Write>(&self, doc: &Document, writer: &mut W) -> Result<(), EspdError> {
        write_pretty(&model_view(doc), writer)
    }
}

/// Vue用のモデルを構築
///
/// 各要素のカーディナリティから`(1)`を除き、なお`(`を含む要素
/// （繰り返しの2番目以降の出現）はその子孫ごと取り除きます。
/// カーディナリティのない要素には`1`が入ります。
pub fn model_view(doc: &Document) -> Document {
    let mut model = doc.clone();
    for criterion in model.criteria.values_mut() {
        prune_occurrences(&mut criterion.node);
    }
    model
}

fn prune_occurrences(node: &mut Node) {
    node.children.retain(|_, child| !child.display_cardinality().contains('('));
    for child in node.children.values_mut() {
        let cardinality = child.display_cardinality();
        child.attributes.insert(AttributeKey::Cardinality, cardinality);
        prune_occurrences(child);
    }
}

fn write_pretty<W: Write>(doc: &Document, writer: &mut W) -> Result<(), EspdError> {
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(&mut *writer, formatter);
    doc.criteria.serialize(&mut serializer)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
