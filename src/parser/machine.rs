//! Nesting/Path Stack Machine
//!
//! 分類済みのタグトークンを行順に受け取り、階層ごとの出現カウンタ、
//! パススタック、および`/R<n>`接尾辞スタックを管理するモジュール。
//! 各トークンに対して識別子と実体化パスを計算し、`Step`として返します。

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::{trace, warn};

use crate::api::WorkbookKind;
use crate::constants::{is_invalid_criterion, namespace_for_sheet};
use crate::error::EspdError;
use crate::types::{TagName, TagRole, TagToken};

/// 解析全体で共有される状態
///
/// クライテリオン番号はワークブック全体（複数シート）で単調増加します。
/// 失敗したシートで消費した番号も戻しません。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunState {
    criterion_counter: u32,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 最後に割り当てたクライテリオン番号
    pub fn criterion_counter(&self) -> u32 {
        self.criterion_counter
    }

    fn next_criterion(&mut self) -> u32 {
        self.criterion_counter += 1;
        if is_invalid_criterion(self.criterion_counter) {
            self.criterion_counter += 1;
        }
        self.criterion_counter
    }
}

/// 状態遷移に必要な行の値
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowFacts<'r> {
    /// 行番号（1始まり）
    pub number: u32,
    pub cardinality: Option<&'r str>,
    pub element_code: Option<&'r str>,
    pub property_data_type: Option<&'r str>,
}

/// カーディナリティに含まれる出現番号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Occurrence {
    /// 括弧を含まない（`1`、`0..n`など）
    Plain,
    /// `(d)` 形式の出現番号
    Marked(u32),
    /// 括弧を含むが1桁の`(d)`ではない
    Malformed,
}

fn occurrence_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\((\d)\)").ok())
        .as_ref()
}

/// カーディナリティから出現番号を取り出す
pub(crate) fn occurrence(cardinality: Option<&str>) -> Occurrence {
    let Some(card) = cardinality.filter(|c| c.contains('(')) else {
        return Occurrence::Plain;
    };
    occurrence_pattern()
        .and_then(|re| re.captures(card))
        .and_then(|caps| caps.get(1))
        .and_then(|digit| digit.as_str().parse().ok())
        .map_or(Occurrence::Malformed, Occurrence::Marked)
}

/// グループが接尾辞スタックに積む値
fn group_suffix(cardinality: Option<&str>) -> String {
    match occurrence(cardinality) {
        Occurrence::Marked(d) => format!("/R{d}"),
        Occurrence::Malformed => String::new(),
        Occurrence::Plain => {
            if cardinality.is_some_and(|c| c.contains("..n")) {
                "/R1".to_string()
            } else {
                String::new()
            }
        }
    }
}

/// REQUIREMENT自身の接尾辞
fn leaf_suffix(cardinality: Option<&str>) -> String {
    match occurrence(cardinality) {
        Occurrence::Marked(d) => format!("/R{d}"),
        Occurrence::Plain => "/R1".to_string(),
        Occurrence::Malformed => String::new(),
    }
}

/// 回答値の種類ごとの接尾辞
fn value_suffix(property_data_type: Option<&str>) -> &'static str {
    match property_data_type {
        Some("PERIOD") => "/RAP",
        Some("EVIDENCE_IDENTIFIER") => "/RES",
        _ => "/RV",
    }
}

/// 要素の配置情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub tag: TagName,
    pub role: TagRole,
    /// 短縮タグ＋カウンタ（例: `RG2`）
    pub identifier: String,
    pub counter: u32,
    /// `(d)` 形式で示された出現番号
    pub occurrence: Option<u32>,
    /// Request文書での実体化パス
    pub request_path: String,
    /// Response文書での回答パス（QUESTIONのみ）
    pub response_content: Option<String>,
    /// 回答値のパス（QUESTIONのみ）
    pub response_value: Option<String>,
    /// この要素を含めた、開いている要素の数
    pub open_depth: usize,
}

/// 1トークンの処理結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// クライテリオンの開始
    OpenCriterion {
        number: u32,
        /// `C<n>`
        identifier: String,
        /// パスの起点 `C<n><namespace><elementCode>`
        root: String,
    },
    /// コンテナ要素の開始
    Open(Placement),
    /// 葉要素
    Leaf(Placement),
    /// 要素の終了
    Close { tag: TagName },
}

/// 入れ子・パスのスタックマシン（1シート分）
#[derive(Debug)]
pub struct StackMachine<'a> {
    sheet: &'a str,
    namespace: &'static str,
    kind: WorkbookKind,
    run: &'a mut RunState,
    counters: BTreeMap<i64, BTreeMap<TagName, u32>>,
    path: Vec<String>,
    open: Vec<(TagName, u32)>,
    request_suffixes: Vec<(TagName, String)>,
    response_suffixes: Vec<(TagName, String)>,
    max_open: usize,
}

impl<'a> StackMachine<'a> {
    pub fn new(sheet: &'a str, kind: WorkbookKind, run: &'a mut RunState) -> Self {
        Self {
            sheet,
            namespace: namespace_for_sheet(sheet),
            kind,
            run,
            counters: BTreeMap::new(),
            path: Vec::new(),
            open: Vec::new(),
            request_suffixes: Vec::new(),
            response_suffixes: Vec::new(),
            max_open: 0,
        }
    }

    /// トークンを1つ処理
    ///
    /// # 戻り値
    ///
    /// * `Ok(Step)` - 状態遷移の結果
    /// * `Err(EspdError)` - 入れ子構造の違反（シートの処理を中断すべきエラー）
    pub fn step(&mut self, token: &TagToken, facts: RowFacts<'_>) -> Result<Step, EspdError> {
        trace!(row = facts.number, tag = %token.name, role = ?token.role, "step");
        match (token.role, token.name) {
            (TagRole::Start, TagName::Criterion) => self.open_criterion(token, facts),
            (TagRole::Start, _) => self.open_element(token, facts),
            (TagRole::SelfClosing, _) => self.leaf(token, facts),
            (TagRole::End, _) => self.close(token, facts),
        }
    }

    /// シート末尾で呼び出し、閉じられていない要素がないことを確認
    pub fn finish(self) -> Result<(), EspdError> {
        match self.open.last() {
            Some((tag, row)) => Err(EspdError::UnclosedElement {
                sheet: self.sheet.to_string(),
                row: *row,
                tag: tag.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// (深さ, タグ) のカウンタ値
    pub fn counter(&self, depth: i64, tag: TagName) -> Option<u32> {
        self.counters.get(&depth).and_then(|level| level.get(&tag)).copied()
    }

    /// CRITERION以外のカウンタが残っていないか
    pub fn has_element_counters(&self) -> bool {
        self.counters
            .values()
            .flat_map(|level| level.keys())
            .any(|tag| *tag != TagName::Criterion)
    }

    /// 現在開いている要素数
    pub fn open_depth(&self) -> usize {
        self.open.len()
    }

    /// 同時に開いていた要素数の最大値
    pub fn max_open(&self) -> usize {
        self.max_open
    }

    fn reset(&mut self) {
        self.counters.clear();
        self.path.clear();
        self.request_suffixes.clear();
        self.response_suffixes.clear();
    }

    fn push_open(&mut self, tag: TagName, row: u32) {
        self.open.push((tag, row));
        self.max_open = self.max_open.max(self.open.len());
    }

    fn open_criterion(&mut self, token: &TagToken, facts: RowFacts<'_>) -> Result<Step, EspdError> {
        if !self.open.is_empty() {
            return Err(EspdError::NestedCriterion {
                sheet: self.sheet.to_string(),
                row: facts.number,
            });
        }

        let number = self.run.next_criterion();
        self.reset();
        self.counters
            .entry(token.depth())
            .or_default()
            .insert(TagName::Criterion, number);

        let root = format!(
            "{}{}{}{}",
            TagName::Criterion.short(),
            number,
            self.namespace,
            facts.element_code.unwrap_or_default()
        );
        self.path.push(root.clone());
        self.push_open(TagName::Criterion, facts.number);

        Ok(Step::OpenCriterion {
            number,
            identifier: format!("{}{}", TagName::Criterion.short(), number),
            root,
        })
    }

    fn open_element(&mut self, token: &TagToken, facts: RowFacts<'_>) -> Result<Step, EspdError> {
        self.require_criterion(token, facts)?;

        let counter = self.next_counter(token, facts);
        let identifier = format!("{}{}", token.name.short(), counter);
        self.path.push(identifier.clone());
        self.push_open(token.name, facts.number);

        if token.name.is_requirement_group() {
            self.request_suffixes
                .push((token.name, group_suffix(facts.cardinality)));
        }
        if !self.kind.is_request() && token.name.is_question_group() {
            self.response_suffixes
                .push((token.name, group_suffix(facts.cardinality)));
        }

        Ok(Step::Open(Placement {
            tag: token.name,
            role: TagRole::Start,
            identifier,
            counter,
            occurrence: marked(facts.cardinality),
            request_path: self.path.join("/"),
            response_content: None,
            response_value: None,
            open_depth: self.open.len(),
        }))
    }

    fn leaf(&mut self, token: &TagToken, facts: RowFacts<'_>) -> Result<Step, EspdError> {
        if token.name == TagName::Criterion {
            return Err(if self.open.is_empty() {
                EspdError::OrphanElement {
                    sheet: self.sheet.to_string(),
                    row: facts.number,
                    tag: token.name.to_string(),
                }
            } else {
                EspdError::NestedCriterion {
                    sheet: self.sheet.to_string(),
                    row: facts.number,
                }
            });
        }
        self.require_criterion(token, facts)?;

        let counter = self.next_counter(token, facts);
        let identifier = format!("{}{}", token.name.short(), counter);
        let base = format!("{}/{}", self.path.join("/"), identifier);

        let request_path = if token.name == TagName::Requirement {
            format!(
                "{}{}{}",
                base,
                concat(&self.request_suffixes),
                leaf_suffix(facts.cardinality)
            )
        } else {
            base.clone()
        };

        let (response_content, response_value) =
            if !self.kind.is_request() && token.name == TagName::Question {
                let content = format!("{}{}/R1", base, concat(&self.response_suffixes));
                let value = format!("{}{}", content, value_suffix(facts.property_data_type));
                (Some(content), Some(value))
            } else {
                (None, None)
            };

        Ok(Step::Leaf(Placement {
            tag: token.name,
            role: TagRole::SelfClosing,
            identifier,
            counter,
            occurrence: marked(facts.cardinality),
            request_path,
            response_content,
            response_value,
            open_depth: self.open.len() + 1,
        }))
    }

    fn close(&mut self, token: &TagToken, facts: RowFacts<'_>) -> Result<Step, EspdError> {
        match self.open.last() {
            None => {
                return Err(EspdError::UnexpectedClose {
                    sheet: self.sheet.to_string(),
                    row: facts.number,
                    tag: token.name.to_string(),
                })
            }
            Some((expected, _)) if *expected != token.name => {
                return Err(EspdError::MismatchedClose {
                    sheet: self.sheet.to_string(),
                    row: facts.number,
                    expected: expected.to_string(),
                    found: token.name.to_string(),
                })
            }
            Some(_) => {}
        }
        self.open.pop();

        if token.name == TagName::Criterion {
            self.reset();
        } else {
            self.counters.remove(&(token.depth() + 1));
            self.path.pop();
            if self.request_suffixes.last().map(|(t, _)| *t) == Some(token.name) {
                self.request_suffixes.pop();
            }
            if self.response_suffixes.last().map(|(t, _)| *t) == Some(token.name) {
                self.response_suffixes.pop();
            }
        }

        Ok(Step::Close { tag: token.name })
    }

    fn require_criterion(&self, token: &TagToken, facts: RowFacts<'_>) -> Result<(), EspdError> {
        if self.open.is_empty() {
            return Err(EspdError::OrphanElement {
                sheet: self.sheet.to_string(),
                row: facts.number,
                tag: token.name.to_string(),
            });
        }
        Ok(())
    }

    /// 出現カウンタを更新して値を返す
    ///
    /// 初出なら1。既出の場合、括弧を含まないカーディナリティなら加算します。
    /// 開始タグの`(1)`はResponse用ワークブックでのみ加算し、それ以外の
    /// `(d)`は直前の識別子を再利用します。
    fn next_counter(&mut self, token: &TagToken, facts: RowFacts<'_>) -> u32 {
        let occurrence = occurrence(facts.cardinality);
        let request = self.kind.is_request();
        let level = self.counters.entry(token.depth()).or_default();

        let Some(count) = level.get_mut(&token.name) else {
            level.insert(token.name, 1);
            return 1;
        };

        let bump = match (token.role, occurrence) {
            (_, Occurrence::Plain) => true,
            (TagRole::Start, Occurrence::Marked(1)) => !request,
            (_, Occurrence::Marked(_)) => false,
            (_, Occurrence::Malformed) => {
                warn!(
                    sheet = self.sheet,
                    row = facts.number,
                    cardinality = facts.cardinality.unwrap_or_default(),
                    "undefined cardinality, counter not incremented"
                );
                false
            }
        };
        if bump {
            *count += 1;
        }
        *count
    }
}

fn marked(cardinality: Option<&str>) -> Option<u32> {
    match occurrence(cardinality) {
        Occurrence::Marked(d) => Some(d),
        _ => None,
    }
}

fn concat(suffixes: &[(TagName, String)]) -> String {
    suffixes.iter().map(|(_, s)| s.as_str()).collect()
}
