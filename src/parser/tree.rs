//! Tree Materializer
//!
//! スタックマシンが出力した配置イベントを、永続的な所有ツリーに畳み込むモジュール。
//! 子ノードの追加は追記のみで、行順が保持されます。

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::api::IdentifierPolicy;
use crate::document::{ComputedPaths, Criterion, Node};
use crate::parser::machine::{Placement, Step};
use crate::parser::RowEvent;
use crate::types::{AttributeKey, CriterionFamily, TagName, TagRole};

/// 1シート分の実体化結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetTree {
    /// 完成したクライテリオン（出現順）
    pub criteria: Vec<Criterion>,
    /// このシートで見つかったロット識別子
    pub lots: Vec<String>,
}

struct Draft {
    tag: String,
    number: u32,
    root_path: String,
    lots: Vec<String>,
}

/// ツリービルダー
pub(crate) struct TreeBuilder<'s> {
    sheet: &'s str,
    family: CriterionFamily,
    policy: IdentifierPolicy,
    draft: Option<Draft>,
    stack: Vec<(String, Node)>,
    result: SheetTree,
}

impl<'s> TreeBuilder<'s> {
    pub fn new(sheet: &'s str, policy: IdentifierPolicy) -> Self {
        Self {
            sheet,
            family: CriterionFamily::from_sheet_name(sheet),
            policy,
            draft: None,
            stack: Vec::new(),
            result: SheetTree::default(),
        }
    }

    /// イベント列をすべて適用して結果を返す
    pub fn build(mut self, events: &[RowEvent]) -> SheetTree {
        for event in events {
            self.apply(event);
        }
        if !self.stack.is_empty() {
            warn!(sheet = self.sheet, "incomplete criterion discarded");
        }
        self.result
    }

    fn apply(&mut self, event: &RowEvent) {
        match &event.step {
            Step::OpenCriterion {
                number,
                identifier,
                root,
            } => self.open_criterion(event, *number, identifier, root),
            Step::Open(placement) => {
                let node = self.node(event, placement);
                let key = self.child_key(&node);
                self.stack.push((key, node));
            }
            Step::Leaf(placement) => {
                let node = self.node(event, placement);
                self.collect_lot(&node);
                let key = self.child_key(&node);
                self.attach(key, node);
            }
            Step::Close { tag } if *tag == TagName::Criterion => self.close_criterion(),
            Step::Close { .. } => {
                if let Some((key, node)) = self.stack.pop() {
                    self.attach(key, node);
                }
            }
        }
    }

    fn open_criterion(&mut self, event: &RowEvent, number: u32, identifier: &str, root: &str) {
        let mut node = Node::new(TagName::Criterion, TagRole::Start, identifier);
        node.attributes = event.attributes.clone();
        node.label = event.label.clone();
        node.row = event.row;
        node.column = event.token.column;
        node.paths = ComputedPaths {
            request_path: root.to_string(),
            ..ComputedPaths::default()
        };

        let key = match self.policy {
            IdentifierPolicy::Literal => event.label.clone().unwrap_or_else(|| identifier.to_string()),
            IdentifierPolicy::Generated => identifier.to_string(),
        };
        let tag = format!("{} - {}", key, self.family.as_str());
        debug!(sheet = self.sheet, row = event.row, criterion = %tag, "criterion opened");

        self.draft = Some(Draft {
            tag,
            number,
            root_path: root.to_string(),
            lots: Vec::new(),
        });
        self.stack.clear();
        self.stack.push((key, node));
    }

    fn close_criterion(&mut self) {
        let (Some(draft), Some((_, node))) = (self.draft.take(), self.stack.pop()) else {
            return;
        };
        let mut criterion = Criterion {
            tag: draft.tag,
            node,
            number: draft.number,
            sheet: self.sheet.to_string(),
            family: self.family,
            root_path: draft.root_path,
            lots: draft.lots,
        };
        criterion.ensure_default_lot();
        self.result.criteria.push(criterion);
    }

    fn node(&self, event: &RowEvent, placement: &Placement) -> Node {
        let mut node = Node::new(placement.tag, placement.role, placement.identifier.clone());
        node.attributes = event.attributes.clone();
        node.attributes
            .entry(AttributeKey::Cardinality)
            .or_insert_with(|| "1".to_string());
        node.label = event.label.clone();
        node.row = event.row;
        node.column = event.token.column;
        node.occurrence = placement.occurrence;
        node.paths = ComputedPaths {
            request_path: placement.request_path.clone(),
            response_content: placement.response_content.clone(),
            response_value: placement.response_value.clone(),
        };
        node
    }

    fn child_key(&self, node: &Node) -> String {
        match (self.policy, &node.label) {
            (IdentifierPolicy::Literal, Some(label)) => label.clone(),
            _ => node.identifier.clone(),
        }
    }

    fn collect_lot(&mut self, node: &Node) {
        if node.kind != TagName::Requirement || node.property_data_type() != Some("LOT_IDENTIFIER") {
            return;
        }
        let (Some(lot), Some(draft)) = (node.attr(AttributeKey::BuyerValue), self.draft.as_mut()) else {
            return;
        };
        if !draft.lots.iter().any(|l| l == lot) {
            draft.lots.push(lot.to_string());
        }
        if !self.result.lots.iter().any(|l| l == lot) {
            self.result.lots.push(lot.to_string());
        }
    }

    fn attach(&mut self, key: String, node: Node) {
        let Some((_, parent)) = self.stack.last_mut() else {
            warn!(sheet = self.sheet, row = node.row, "element without parent ignored");
            return;
        };
        insert_child(&mut parent.children, key, node);
    }
}

/// 子ノードを追加
///
/// 同じキーの兄弟がすでにある場合は`<key>(<k>)`（kは2から）として追加します。
pub(crate) fn insert_child(children: &mut IndexMap<String, Node>, key: String, node: Node) {
    if !children.contains_key(&key) {
        children.insert(key, node);
        return;
    }
    let mut k = 2;
    while children.contains_key(&format!("{key}({k})")) {
        k += 1;
    }
    let unique = format!("{key}({k})");
    debug!(key = %key, unique = %unique, row = node.row, "sibling key collision");
    children.insert(unique, node);
}
