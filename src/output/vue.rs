//! Vue Emitters
//!
//! 文書ツリーからBootstrapVueを使ったVueコンポーネント（JavaScript）を生成するモジュール。
//!
//! - 閲覧用（`espd_<version>.js`）: クライテリオンの構造をカードとして表示
//! - 回答用（`espd_response_<version>.js`）: `exp`モデルに回答値を保持するフォーム
//!
//! 繰り返しの2番目以降の出現（カーディナリティに`(d)`が残るもの）は出力しません。

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt::Write as _;
use std::io::Write;
use tracing::{debug, warn};

use crate::document::{Criterion, Document, Node};
use crate::error::EspdError;
use crate::constants::string_to_property;
use crate::output::EmitContext;
use crate::types::{AttributeKey, CriterionFamily, TagName};

/// Vue関連の出力ファイル名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VueFileNames {
    /// JSONモデル（`espd_edm_<version>.json`）
    pub model: String,
    /// 閲覧用コンポーネント（`espd_<version>.js`）
    pub viewer: String,
    /// 回答用コンポーネント（`espd_response_<version>.js`）
    pub response: String,
}

/// バージョン名から出力ファイル名を生成
///
/// ```rust
/// use espdxl::vue_file_names;
///
/// let names = vue_file_names("v4.0.0");
/// assert_eq!(names.model, "espd_edm_v4.0.0.json");
/// assert_eq!(names.viewer, "espd_v4.0.0.js");
/// assert_eq!(names.response, "espd_response_v4.0.0.js");
/// ```
pub fn vue_file_names(name_version: &str) -> VueFileNames {
    VueFileNames {
        model: format!("espd_edm_{name_version}.json"),
        viewer: format!("espd_{name_version}.js"),
        response: format!("espd_response_{name_version}.js"),
    }
}

fn name_version(ctx: &EmitContext) -> String {
    format!("v{}", ctx.version)
}

fn write_banner<W: Write>(ctx: &EmitContext, writer: &mut W) -> Result<(), EspdError> {
    write!(
        writer,
        "/**\n * VueJS components for ESDP-EDM \n * generated on {} \n */\n\n",
        ctx.issued_at.to_rfc3339()
    )?;
    Ok(())
}

/// テンプレートリテラルに埋め込めるようにエスケープ
fn template_literal(s: &str) -> String {
    s.replace('\\', "\\\\").replace('`', "\\`").replace("${", "\\${")
}

/// 繰り返しの2番目以降の出現でないか
fn is_rendered(node: &Node) -> bool {
    !node.display_cardinality().contains('(')
}

fn is_repeatable(node: &Node) -> bool {
    node.display_cardinality().ends_with("..n")
}

fn is_indicator(node: &Node) -> bool {
    node.kind == TagName::Question && node.property_data_type() == Some("INDICATOR")
}

fn request_path(node: &Node) -> String {
    node.attr(AttributeKey::RequestPath)
        .map(str::to_string)
        .unwrap_or_else(|| node.paths.request_path.clone())
}

fn response_path(node: &Node) -> String {
    node.attr(AttributeKey::ResponsePath)
        .map(str::to_string)
        .or_else(|| node.paths.response_content.clone())
        .unwrap_or_else(|| node.paths.request_path.clone())
}

/// 先頭の`/`より前の部分
fn path_head(path: &str) -> &str {
    path.split('/').next().unwrap_or(path)
}

/// ラジオボタンの選択肢
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct RadioOption {
    text: String,
    value: usize,
}

/// `[a, b, c]`形式の要素コードから選択肢を生成
fn radio_options(element_code: &str) -> Vec<RadioOption> {
    element_code
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .enumerate()
        .map(|(value, text)| RadioOption {
            text: text.trim().to_string(),
            value,
        })
        .collect()
}

/// 開いているラジオグループ
struct RadioGroup {
    select: String,
    options: Vec<RadioOption>,
}

impl RadioGroup {
    /// 後続のサブグループを表示する条件
    fn condition(&self, node: &Node) -> Option<String> {
        let code = node.element_code().unwrap_or_default();
        self.options
            .iter()
            .find(|o| o.text == code)
            .map(|o| format!("{}==={}", self.select, o.value))
    }
}

fn radio_group_markup(id: &str, label: &str, model: &str, options: &str) -> String {
    format!(
        "<b-form-group label=\"{label}\" v-slot=\"{{ ariaDescribedby }}\">\n\
         <b-form-radio-group id=\"radio-group-{id}\" v-model=\"{model}\" :options=\"{options}\" \
         :aria-describedby=\"ariaDescribedby\" name=\"radio-options\"></b-form-radio-group>\n\
         </b-form-group>\n"
    )
}

/// 閲覧用Vueコンポーネントのエミッター
pub struct VueViewerEmitter;

impl VueViewerEmitter {
    pub fn render<W: Write>(
        &self,
        doc: &Document,
        ctx: &EmitContext,
        writer: &mut W,
    ) -> Result<(), EspdError> {
        let nv = name_version(ctx);
        write_banner(ctx, writer)?;

        let mut viewer = Viewer::default();
        for criterion in doc.criteria.values() {
            let tag = criterion.tag.as_str();
            let name = criterion.name().unwrap_or_default();
            let (template, data) = viewer.criterion(criterion, tag);
            let data = serde_json::to_string_pretty(&Value::Object(data))?;

            debug!(criterion = %tag, "vue viewer component");
            write!(
                writer,
                "\n\n/**\n * Version - {nv}\n * Component - {tag} - {name}\n */\n\
                 Vue.component(\"{nv} - {tag}\", {{\n    data() {{\n        return {data}\n    }},\n    \
                 template: `{}`\n}})",
                template_literal(&template)
            )?;
        }
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// 閲覧用テンプレートの組み立て
///
/// チェックボックスの番号（`selectedNN`）は文書全体で通し番号です。
#[derive(Default)]
struct Viewer {
    template: String,
    data: Map<String, Value>,
    sel_count: u32,
}

impl Viewer {
    fn criterion(&mut self, criterion: &Criterion, tag: &str) -> (String, Map<String, Value>) {
        let node = &criterion.node;
        self.template = format!(
            "<div>\n<b-card title=\"{} - {}\">\n<b-card-text>{}</b-card-text>\n",
            tag,
            node.name().unwrap_or_default(),
            node.description().unwrap_or_default()
        );
        self.data = Map::new();
        for child in node.children.values() {
            self.node(child);
        }
        self.template.push_str("</b-card>\n</div>");
        (
            std::mem::take(&mut self.template),
            std::mem::take(&mut self.data),
        )
    }

    fn node(&mut self, node: &Node) {
        if !is_rendered(node) {
            debug!(node = %node.identifier, "repeated occurrence skipped");
            return;
        }
        match node.kind {
            TagName::Subcriterion | TagName::RequirementGroup => {
                self.template.push_str("<b-card>");
                self.heading(node);
                for child in node.children.values() {
                    self.node(child);
                }
                self.template.push_str("</b-card>");
            }
            TagName::RequirementSubgroup => {
                self.template.push_str("<b-card>");
                self.heading(node);
                self.radio_children(node);
                self.template.push_str("</b-card>");
            }
            TagName::QuestionGroup => {
                self.cardinality_card(node);
                self.question_children(node);
                self.template.push_str("\n</b-card>");
            }
            TagName::QuestionSubgroup => self.question_children(node),
            TagName::Question if is_indicator(node) => {
                self.indicator(node);
            }
            TagName::Question | TagName::Requirement => {
                let _ = write!(
                    self.template,
                    "\n<b-form-group label=\"{} - {} [{}]\" label-cols-sm=\"6\" label-cols-lg=\"8\" \
                     content-cols-sm content-cols-lg=\"4\">\n\
                     <b-form-input placeholder=\"{}\"></b-form-input>\n</b-form-group>",
                    node.kind,
                    node.description().unwrap_or_default(),
                    node.display_cardinality(),
                    node.property_data_type().unwrap_or_default()
                );
            }
            TagName::Legislation => self.legislation(node),
            TagName::Caption | TagName::AdditionalDescriptionLine => self.caption(node),
            TagName::Criterion => warn!(node = %node.identifier, "nested criterion ignored"),
        }
    }

    fn heading(&mut self, node: &Node) {
        if let (Some(name), Some(description)) = (node.name(), node.description()) {
            let _ = write!(
                self.template,
                "<p>{} <em>{}</em> [<em>{}</em>]</p>",
                name,
                description,
                node.display_cardinality()
            );
        }
    }

    fn cardinality_card(&mut self, node: &Node) {
        let _ = write!(
            self.template,
            "\n<b-card class=\"my-1\"> <p>Cardinality [<em>{}</em>]</p>",
            node.display_cardinality()
        );
    }

    fn legislation(&mut self, node: &Node) {
        let _ = write!(
            self.template,
            "<b-card-text class=\"my-1\">LEGISLATION [<em>{}</em>]</b-card-text>",
            node.display_cardinality()
        );
    }

    fn caption(&mut self, node: &Node) {
        let _ = write!(
            self.template,
            "<b-card-text>{} - {}</b-card-text>",
            node.kind,
            node.description().unwrap_or_default()
        );
    }

    /// INDICATORの質問をスイッチとして出力し、変数名を返す
    fn indicator(&mut self, node: &Node) -> String {
        self.sel_count += 1;
        let nn = format!("{:02}", self.sel_count);
        let var = format!("selected{nn}");
        let _ = write!(
            self.template,
            "\n<b-form-group>\n{} {} [{}] <b-form-checkbox id=\"radio-group-{nn}\" v-model=\"{var}\" \
             name=\"radio-options{nn}\" inline=\"true\" switch><b>({{{{ {var}?'Yes':'No' }}}})</b>\
             </b-form-checkbox>\n</b-form-group>",
            node.kind,
            node.description().unwrap_or_default(),
            node.display_cardinality()
        );
        self.data.insert(var.clone(), Value::Bool(true));
        var
    }

    fn radio_children(&mut self, node: &Node) {
        let mut radio: Option<RadioGroup> = None;
        for child in node.children.values() {
            match child.kind {
                TagName::Requirement if child.attr(AttributeKey::BuyerValue) == Some("RADIO_BUTTON_TRUE") => {
                    radio = Some(self.radio(child));
                }
                TagName::RequirementSubgroup => match radio.as_ref().map(|r| r.condition(child)) {
                    Some(Some(condition)) => {
                        let _ = write!(self.template, "<template v-if=\"{condition}\">");
                        self.node(child);
                        self.template.push_str("</template>");
                    }
                    Some(None) => {
                        warn!(node = %child.identifier, "element code matches no radio option");
                        self.node(child);
                    }
                    None => self.node(child),
                },
                _ => self.node(child),
            }
        }
    }

    fn radio(&mut self, node: &Node) -> RadioGroup {
        self.sel_count += 1;
        let base = path_head(&response_path(node)).replace('-', "_");
        let select = format!("val_{base}");
        let option = format!("opt_{base}");
        let options = radio_options(node.element_code().unwrap_or_default());

        self.template.push_str(&radio_group_markup(
            &format!("{:02}", self.sel_count),
            node.description().unwrap_or_default(),
            &select,
            &option,
        ));
        self.data.insert(
            option,
            serde_json::to_value(&options).unwrap_or(Value::Null),
        );
        self.data.insert(
            select.clone(),
            Value::from(options.first().map(|o| o.value).unwrap_or(0)),
        );
        RadioGroup { select, options }
    }

    /// QUESTION_GROUP / QUESTION_SUBGROUPの子要素
    ///
    /// `ONTRUE`/`ONFALSE`の子グループは直前のINDICATORの値で表示を切り替えます。
    fn question_children(&mut self, node: &Node) {
        let mut indicator = String::new();
        for child in node.children.values() {
            if !is_rendered(child) {
                continue;
            }
            match child.kind {
                TagName::Question if is_indicator(child) => indicator = self.indicator(child),
                TagName::QuestionGroup | TagName::QuestionSubgroup => {
                    match child.element_code() {
                        Some(code @ ("ONTRUE" | "ONFALSE")) => {
                            let negate = if code == "ONTRUE" { "" } else { "!" };
                            let _ = write!(self.template, "\n<div v-if=\"{negate}{indicator}\">");
                            self.cardinality_card(child);
                            self.node(child);
                            self.template.push_str("\n</b-card>\n</div>");
                        }
                        Some("ON*") => {
                            self.cardinality_card(child);
                            self.node(child);
                            self.template.push_str("</b-card>");
                        }
                        _ => self.node(child),
                    }
                }
                _ => self.node(child),
            }
        }
    }
}

/// 回答用Vueコンポーネントのエミッター
///
/// 各コンポーネントは`exp`オブジェクトに回答値を保持します。キーは回答パスを
/// JavaScriptのプロパティ名に変換したものです。
pub struct VueResponseEmitter;

impl VueResponseEmitter {
    pub fn render<W: Write>(
        &self,
        doc: &Document,
        ctx: &EmitContext,
        writer: &mut W,
    ) -> Result<(), EspdError> {
        let nv = name_version(ctx);
        write_banner(ctx, writer)?;

        let mut form = ResponseForm::default();
        for criterion in doc.criteria.values() {
            let key = criterion.key();
            form.criterion(criterion);

            debug!(criterion = %criterion.tag, "vue response component");
            write!(
                writer,
                "\n\n/**\n * Component - {} - {}\n */\n\
                 Vue.component(\"{nv}-{key}\", {{\n    data() {{\n        return {{\n{}            exp: {{\n{}            }}\n        }}\n    }},\n    \
                 template: `{}`\n}})",
                criterion.tag,
                criterion.name().unwrap_or_default(),
                entries(&form.data),
                entries(&form.exp),
                template_literal(&form.template)
            )?;
        }
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

fn entries(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("            \"{k}\": {v},\n"))
        .collect()
}

/// 回答用テンプレートの組み立て
#[derive(Default)]
struct ResponseForm {
    template: String,
    data: Vec<(String, String)>,
    exp: Vec<(String, String)>,
    sel_count: u32,
}

impl ResponseForm {
    fn criterion(&mut self, criterion: &Criterion) {
        self.template.clear();
        self.data.clear();
        self.exp.clear();

        let key = criterion.key();
        let node = &criterion.node;
        let name = node.name().unwrap_or_default();
        let description = node.description().unwrap_or_default();
        let selection = criterion.family == CriterionFamily::SC;

        if selection {
            self.exp.push((
                format!("cb_{key}"),
                format!("window.espd_model['{key}'].selected"),
            ));
            let _ = write!(
                self.template,
                "<div>\n<b-form-checkbox id=\"checkbox-{key}\" v-model=\"exp['cb_{key}']\" \
                 :disabled=\"window.espd_doc.role === 'eo'\" name=\"checkbox-{key}\" value=\"OK\" \
                 unchecked-value=\"KO\">\n<strong>{name}</strong>\n<p>{description}</p>\n\
                 </b-form-checkbox>\n<template v-if=\"exp['cb_{key}'] ==='OK'\">\n"
            );
        } else {
            let _ = write!(
                self.template,
                "<div>\n<strong>{name}</strong>\n<p>{description}</p>\n"
            );
        }

        for child in node.children.values() {
            self.node(child);
        }

        if selection {
            self.template.push_str("</template>");
        }
        self.template.push_str("\n</div>");
    }

    fn node(&mut self, node: &Node) {
        if !is_rendered(node) {
            debug!(node = %node.identifier, "repeated occurrence skipped");
            return;
        }
        match node.kind {
            TagName::Subcriterion => {
                self.template.push_str("<div>");
                for child in node.children.values() {
                    self.node(child);
                }
                self.template.push_str("</div>");
            }
            TagName::RequirementGroup => {
                self.template.push_str("<div>");
                self.repeatable(node, |form| {
                    for child in node.children.values() {
                        form.node(child);
                    }
                });
                self.template.push_str("</div>");
            }
            TagName::RequirementSubgroup => {
                self.template.push_str("<div>");
                self.repeatable(node, |form| form.radio_children(node));
                self.template.push_str("</div>");
            }
            TagName::QuestionGroup => {
                self.template.push_str("\n<div>");
                self.repeatable(node, |form| form.question_children(node));
                self.template.push_str("\n</div>");
            }
            TagName::QuestionSubgroup => {
                self.repeatable(node, |form| form.question_children(node));
            }
            TagName::Question if is_indicator(node) => {
                self.sel_count += 1;
                let var = string_to_property(&response_path(node));
                self.exp.push((var.clone(), "true".to_string()));
                self.switch(node, &var);
            }
            TagName::Question => self.question(node),
            TagName::Legislation => self.template.push_str("<em>LEGISLATION</em>"),
            TagName::Caption | TagName::AdditionalDescriptionLine => {
                let _ = write!(
                    self.template,
                    "<div>{}</div>",
                    node.description().unwrap_or("ADDITIONAL CAPTION")
                );
            }
            TagName::Requirement => self.requirement(node),
            TagName::Criterion => warn!(node = %node.identifier, "nested criterion ignored"),
        }
    }

    /// `..n`のグループは追加ボタン付きのカードで囲む
    fn repeatable(&mut self, node: &Node, body: impl FnOnce(&mut Self)) {
        if !is_repeatable(node) {
            body(self);
            return;
        }
        let path = request_path(node);
        let html = format!("html_{}", string_to_property(&path));
        self.data.push((html.clone(), "''".to_string()));
        let _ = write!(
            self.template,
            "<div v-html=\"{html}\"></div><b-card footer-tag=\"footer\">"
        );
        body(self);
        let _ = write!(
            self.template,
            "<template #footer>\n<b-button variant=\"success\" @click=\"{html} = renderHTML('{path}', exp)\">\
             <b-icon icon=\"plus-square-fill\" aria-hidden=\"true\"></b-icon></b-button>\n</template>\n</b-card>"
        );
    }

    fn switch(&mut self, node: &Node, var: &str) {
        let _ = write!(
            self.template,
            "\n<br/>[Q] {} <b-form-checkbox v-model=\"exp['{var}']\" name=\"check-button\" inline=\"true\" switch>\n\
             <b>[{{{{ exp['{var}']?'Yes':'No' }}}}]</b>\n</b-form-checkbox>\n",
            node.description().unwrap_or_default()
        );
    }

    fn question(&mut self, node: &Node) {
        let var = string_to_property(&response_path(node));
        let description = node.description().unwrap_or_default();
        self.exp.push((var.clone(), "[]".to_string()));
        if is_repeatable(node) {
            let _ = write!(
                self.template,
                "<b-form-group label=\"[Q] {description}\" label-cols-sm=\"6\" label-cols-lg=\"8\" \
                 content-cols-sm content-cols-lg=\"4\">\n\
                 <b-form-tags v-model=\"exp['{var}']\" placeholder=\"Add value\"></b-form-tags></b-form-group>"
            );
        } else {
            let _ = write!(
                self.template,
                "\n<b-form-group label=\"[Q] {description}\" label-cols-sm=\"6\" label-cols-lg=\"8\" \
                 content-cols-sm content-cols-lg=\"4\">\n\
                 <b-form-input placeholder=\"{}\" v-model=\"exp['{var}'][0]\"></b-form-input>\n</b-form-group>",
                node.property_data_type().unwrap_or_default()
            );
        }
    }

    fn requirement(&mut self, node: &Node) {
        let path = response_path(node);
        let description = node.description().unwrap_or_default();
        self.exp.push((string_to_property(&path), "''".to_string()));

        if node.property_data_type() == Some("LOT_IDENTIFIER") {
            let criterion = path.split('_').next().unwrap_or_default();
            let lots = format!("lotid_{criterion}");
            self.exp.push((
                lots.clone(),
                format!("window.espd_model['{criterion}'].lots"),
            ));
            let available = format!("window.espd_doc.options.filter(opt => exp['{lots}'].indexOf(opt) === -1)");
            let _ = write!(
                self.template,
                "\n<b-form-group label-class=\"font-weight-bold\" label=\"[R] {description}\" label-for=\"tags-component-select_item\">\n\
                 <b-form-tags id=\"tags-component-select_item\" v-model=\"exp['{lots}']\" size=\"lg\" class=\"mb-2\" add-on-change no-outer-focus>\n\
                 <template v-slot=\"{{ tags, inputAttrs, inputHandlers, disabled, removeTag }}\">\n\
                 <ul v-if=\"tags.length > 0\" class=\"list-inline d-inline-block mb-2\">\n\
                 <li v-for=\"tag in tags\" :key=\"tag\" class=\"list-inline-item\">\n\
                 <b-form-tag @remove=\"removeTag(tag)\" :title=\"tag\" :disabled=\"disabled\" variant=\"info\">{{{{ tag }}}}</b-form-tag>\n\
                 </li>\n</ul>\n\
                 <b-form-select v-bind=\"inputAttrs\" v-on=\"inputHandlers\" :disabled=\"disabled || {available}.length === 0\" :options=\"{available}\">\n\
                 <template #first>\n<option disabled value=\"\">Choose a tag...</option>\n</template>\n\
                 </b-form-select>\n</template>\n</b-form-tags>\n</b-form-group>\n"
            );
        } else {
            let _ = write!(
                self.template,
                "\n<b-form-group label-class=\"font-weight-bold\" label=\"[R] {description}\" \
                 label-cols-sm=\"6\" label-cols-lg=\"8\" content-cols-sm content-cols-lg=\"4\">\n\
                 <b-form-input placeholder=\"{}\"></b-form-input>\n</b-form-group>\n",
                node.property_data_type().unwrap_or_default()
            );
        }
    }

    fn radio_children(&mut self, node: &Node) {
        let mut radio: Option<RadioGroup> = None;
        for child in node.children.values() {
            match child.kind {
                TagName::Requirement if child.attr(AttributeKey::BuyerValue) == Some("RADIO_BUTTON_TRUE") => {
                    radio = Some(self.radio(child));
                }
                TagName::RequirementSubgroup => match radio.as_ref().map(|r| r.condition(child)) {
                    Some(Some(condition)) => {
                        let _ = write!(self.template, "<template v-if=\"exp.{condition}\">");
                        self.node(child);
                        self.template.push_str("</template>");
                    }
                    Some(None) => {
                        warn!(node = %child.identifier, "element code matches no radio option");
                        self.node(child);
                    }
                    None => self.node(child),
                },
                _ => self.node(child),
            }
        }
    }

    fn radio(&mut self, node: &Node) -> RadioGroup {
        self.sel_count += 1;
        let path = response_path(node);
        let select = string_to_property(&path);
        let option = format!("opt_{}", path_head(&path).replace('-', "__"));
        let options = radio_options(node.element_code().unwrap_or_default());
        let first = options.first().map(|o| o.value).unwrap_or(0).to_string();

        self.data.push((
            option.clone(),
            serde_json::to_string(&options).unwrap_or_else(|_| "[]".to_string()),
        ));
        self.data.push((select.clone(), first.clone()));
        self.exp.push((select.clone(), first));

        let label = format!("[R] {}", node.description().unwrap_or_default());
        self.template.push_str(&radio_group_markup(
            &format!("{:02}", self.sel_count),
            &label,
            &format!("exp.{select}"),
            &option,
        ));
        RadioGroup { select, options }
    }

    fn question_children(&mut self, node: &Node) {
        let mut indicator = String::new();
        for child in node.children.values() {
            if !is_rendered(child) {
                continue;
            }
            match child.kind {
                TagName::Question if is_indicator(child) => {
                    indicator = string_to_property(&response_path(child));
                    self.exp.push((indicator.clone(), "false".to_string()));
                    self.switch(child, &indicator);
                }
                TagName::QuestionGroup | TagName::QuestionSubgroup => match child.element_code() {
                    Some(code @ ("ONTRUE" | "ONFALSE")) => {
                        let negate = if code == "ONTRUE" { "" } else { "!" };
                        let _ = write!(self.template, "\n<div v-if=\"{negate}exp['{indicator}']\">\n");
                        self.node(child);
                        self.template.push_str("\n</div>");
                    }
                    Some("ON*") => {
                        self.template.push_str("<div>");
                        self.node(child);
                        self.template.push_str("</div>");
                    }
                    _ => self.node(child),
                },
                TagName::Caption => {
                    let _ = write!(
                        self.template,
                        "<div>{}</div>",
                        child.description().unwrap_or("CAPTION")
                    );
                }
                _ => self.node(child),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TagRole;
    use chrono::{FixedOffset, TimeZone};

    fn context(version: &str) -> EmitContext {
        let offset = FixedOffset::east_opt(0).unwrap();
        EmitContext::new(version)
            .unwrap()
            .with_issued_at(offset.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap())
    }

    fn leaf(kind: TagName, id: &str, pdt: &str) -> Node {
        let mut node = Node::new(kind, TagRole::SelfClosing, id)
            .with_attr(AttributeKey::Description, format!("{id} text"))
            .with_attr(AttributeKey::PropertyDataType, pdt);
        node.paths.request_path = format!("C1_EG_X/QG1/{id}");
        node.paths.response_content = Some(format!("C1_EG_X/QG1/{id}/R1"));
        node
    }

    fn group(kind: TagName, id: &str, code: Option<&str>, children: Vec<Node>) -> Node {
        let mut node = Node::new(kind, TagRole::Start, id).with_attr(AttributeKey::Cardinality, "1");
        if let Some(code) = code {
            node = node.with_attr(AttributeKey::ElementCode, code);
        }
        node.paths.request_path = format!("C1_EG_X/{id}");
        for child in children {
            let key = child.identifier.clone();
            node.children.insert(key, child);
        }
        node
    }

    fn document(family: CriterionFamily, children: Vec<Node>) -> Document {
        let mut node = group(TagName::Criterion, "C1", None, children)
            .with_attr(AttributeKey::Name, "Bankruptcy")
            .with_attr(AttributeKey::Description, "Is the operator `bankrupt`?");
        node.label = Some("1".to_string());
        let mut doc = Document::new();
        doc.criteria.insert(
            "C1".to_string(),
            Criterion {
                tag: format!("C1 - {}", family.as_str()),
                node,
                number: 1,
                sheet: "EG-Test".to_string(),
                family,
                root_path: "C1_EG_X".to_string(),
                lots: Vec::new(),
            },
        );
        doc
    }

    fn indicator_document(family: CriterionFamily) -> Document {
        document(
            family,
            vec![group(
                TagName::QuestionGroup,
                "QG1",
                None,
                vec![
                    leaf(TagName::Question, "Q1", "INDICATOR"),
                    group(
                        TagName::QuestionSubgroup,
                        "QSG1",
                        Some("ONTRUE"),
                        vec![leaf(TagName::Question, "Q2", "DESCRIPTION")],
                    ),
                ],
            )],
        )
    }

    fn render_viewer(doc: &Document, version: &str) -> String {
        let mut out = Vec::new();
        VueViewerEmitter.render(doc, &context(version), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn render_response(doc: &Document) -> String {
        let mut out = Vec::new();
        VueResponseEmitter.render(doc, &context("4.0.0"), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_viewer_component_header() {
        let js = render_viewer(&indicator_document(CriterionFamily::EG), "3.3.0");

        assert!(js.starts_with("/**\n * VueJS components for ESDP-EDM \n * generated on 2024-01-02T03:04:05+00:00 \n */\n\n"));
        assert!(js.contains(" * Version - v3.3.0\n * Component - C1 - EG - Bankruptcy\n"));
        assert!(js.contains("Vue.component(\"v3.3.0 - C1 - EG\""));
        assert!(js.contains("<b-card title=\"C1 - EG - Bankruptcy\">"));
        assert!(js.contains("Is the operator \\`bankrupt\\`?"));
    }

    #[test]
    fn test_viewer_indicator_controls_subgroup() {
        let js = render_viewer(&indicator_document(CriterionFamily::EG), "3.3.0");

        assert!(js.contains("v-model=\"selected01\""));
        assert!(js.contains("\"selected01\": true"));
        assert!(js.contains("<div v-if=\"selected01\">"));
        assert!(js.contains("<b-form-input placeholder=\"DESCRIPTION\">"));
    }

    #[test]
    fn test_viewer_literal_tag_for_latest_version() {
        let js = render_viewer(&indicator_document(CriterionFamily::EG), "4.0.0");
        assert!(js.contains("Vue.component(\"v4.0.0 - C1 - EG\""));
    }

    #[test]
    fn test_viewer_radio_group() {
        let mut radio = leaf(TagName::Requirement, "RQ1", "CODE")
            .with_attr(AttributeKey::BuyerValue, "RADIO_BUTTON_TRUE")
            .with_attr(AttributeKey::ElementCode, "[RED, GREEN]");
        radio.paths.response_content = None;
        radio.paths.request_path = "C1_EG_X-Y/RSG1/RQ1".to_string();
        let doc = document(
            CriterionFamily::EG,
            vec![group(
                TagName::RequirementSubgroup,
                "RSG1",
                None,
                vec![
                    radio,
                    group(TagName::RequirementSubgroup, "RSG2", Some("GREEN"), Vec::new()),
                ],
            )],
        );

        let js = render_viewer(&doc, "3.3.0");

        assert!(js.contains("v-model=\"val_C1_EG_X_Y\""));
        assert!(js.contains(":options=\"opt_C1_EG_X_Y\""));
        assert!(js.contains("<template v-if=\"val_C1_EG_X_Y===1\">"));
        assert!(js.contains("\"text\": \"GREEN\""));
    }

    #[test]
    fn test_repeated_occurrence_is_skipped() {
        let mut repeated = group(TagName::RequirementGroup, "RG2", None, Vec::new())
            .with_attr(AttributeKey::Cardinality, "1..n (2)")
            .with_attr(AttributeKey::Name, "Second")
            .with_attr(AttributeKey::Description, "occurrence");
        repeated.occurrence = Some(2);
        let doc = document(CriterionFamily::EG, vec![repeated]);

        assert!(!render_viewer(&doc, "3.3.0").contains("Second"));
    }

    #[test]
    fn test_response_model_keys() {
        let js = render_response(&indicator_document(CriterionFamily::EG));

        assert!(js.contains("Vue.component(\"v4.0.0-C1\""));
        assert!(js.contains("\"C1_EG_X$QG1$Q1$R1\": false,"));
        assert!(js.contains("\"C1_EG_X$QG1$Q2$R1\": [],"));
        assert!(js.contains("<div v-if=\"exp['C1_EG_X$QG1$Q1$R1']\">"));
        assert!(!js.contains("cb_C1"));
    }

    #[test]
    fn test_response_selection_criterion_checkbox() {
        let js = render_response(&indicator_document(CriterionFamily::SC));

        assert!(js.contains("\"cb_C1\": window.espd_model['C1'].selected,"));
        assert!(js.contains("<template v-if=\"exp['cb_C1'] ==='OK'\">"));
    }

    #[test]
    fn test_response_repeatable_group() {
        let rg = group(
            TagName::RequirementGroup,
            "RG1",
            None,
            vec![leaf(TagName::Requirement, "RQ1", "AMOUNT")],
        )
        .with_attr(AttributeKey::Cardinality, "1..n");
        let js = render_response(&document(CriterionFamily::EG, vec![rg]));

        assert!(js.contains("\"html_C1_EG_X$RG1\": '',"));
        assert!(js.contains("renderHTML('C1_EG_X/RG1', exp)"));
        assert!(js.contains("<b-form-input placeholder=\"AMOUNT\">"));
    }

    #[test]
    fn test_response_lot_identifier() {
        let mut lot = leaf(TagName::Requirement, "RQ1", "LOT_IDENTIFIER");
        lot.paths.response_content = Some("C7_SC_LOTS/RG1/RQ1".to_string());
        let js = render_response(&document(CriterionFamily::SC, vec![lot]));

        assert!(js.contains("\"lotid_C7\": window.espd_model['C7'].lots,"));
        assert!(js.contains("v-model=\"exp['lotid_C7']\""));
    }

    #[test]
    fn test_radio_options() {
        assert_eq!(
            radio_options("[A, B ,C]"),
            vec![
                RadioOption { text: "A".into(), value: 0 },
                RadioOption { text: "B".into(), value: 1 },
                RadioOption { text: "C".into(), value: 2 },
            ]
        );
    }
}
