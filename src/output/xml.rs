//! XML Element Model
//!
//! UBL文書を組み立てるための軽量な要素ツリーと、quick-xmlによる書き出し。

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

use crate::error::EspdError;

/// 要素の子ノード
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    Comment(String),
}

/// XML要素
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// 属性を追加（ビルダー形式）
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// 複数の属性を追加（ビルダー形式）
    pub fn attrs<K: Into<String>, V: Into<String>>(
        mut self,
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        self.attributes
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// テキストを追加（ビルダー形式）
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    /// 子要素を追加（ビルダー形式）
    pub fn child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// コメントを追加（ビルダー形式）
    pub fn comment(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Comment(text.into()));
        self
    }

    pub fn push(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    pub fn push_comment(&mut self, text: impl Into<String>) {
        self.children.push(XmlNode::Comment(text.into()));
    }

    /// 属性値を取得
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// 子要素を順に返す
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// 名前が一致する最初の子要素
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.name == name)
    }

    /// 名前が一致するすべての子要素
    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.elements().filter(move |e| e.name == name)
    }

    /// 直下のテキストを連結
    pub fn text_content(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// 直下のコメント
    pub fn comments(&self) -> impl Iterator<Item = &str> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Comment(c) => Some(c.as_str()),
            _ => None,
        })
    }
}

/// `cbc:<name>`要素をテキスト付きで生成
pub fn cbc(name: &str, text: impl Into<String>) -> XmlElement {
    XmlElement::new(format!("cbc:{name}")).text(text)
}

/// `cac:<name>`要素を生成
pub fn cac(name: &str) -> XmlElement {
    XmlElement::new(format!("cac:{name}"))
}

/// XML宣言付きで文書を書き出す（インデント4）
pub fn write_document<W: Write>(root: &XmlElement, writer: W) -> Result<(), EspdError> {
    let mut xml = Writer::new_with_indent(writer, b' ', 4);
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;
    write_element(&mut xml, root)?;
    xml.into_inner().write_all(b"\n")?;
    Ok(())
}

fn write_element<W: Write>(xml: &mut Writer<W>, element: &XmlElement) -> Result<(), EspdError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        return xml.write_event(Event::Empty(start)).map_err(xml_error);
    }

    xml.write_event(Event::Start(start)).map_err(xml_error)?;
    for child in &element.children {
        match child {
            XmlNode::Element(e) => write_element(xml, e)?,
            XmlNode::Text(t) => xml
                .write_event(Event::Text(BytesText::new(t)))
                .map_err(xml_error)?,
            XmlNode::Comment(c) => xml
                .write_event(Event::Comment(BytesText::from_escaped(c.replace("--", "- -"))))
                .map_err(xml_error)?,
        }
    }
    xml.write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(xml_error)
}

fn xml_error(e: quick_xml::Error) -> EspdError {
    EspdError::Xml(e.to_string())
}
