//! UBL Emitters
//!
//! 文書ツリーから`QualificationApplicationRequest`と
//! `QualificationApplicationResponse`のXML文書を生成するモジュール。
//! Response文書にはRequest部（クライテリオンの定義）も含まれます。

use std::io::Write;
use tracing::{debug, warn};

use crate::api::EmissionMode;
use crate::constants::{code_list_attrs, CodeList, DEFAULT_LOT};
use crate::document::{Criterion, Document, Node};
use crate::error::EspdError;
use crate::output::xml::{cac, cbc, write_document, XmlElement};
use crate::output::EmitContext;
use crate::types::{AttributeKey, CriterionFamily, TagName};

const REQUEST_NS: &str = "urn:oasis:names:specification:ubl:schema:xsd:QualificationApplicationRequest-2";
const RESPONSE_NS: &str = "urn:oasis:names:specification:ubl:schema:xsd:QualificationApplicationResponse-2";
const CAC_NS: &str = "urn:oasis:names:specification:ubl:schema:xsd:CommonAggregateComponents-2";
const CBC_NS: &str = "urn:oasis:names:specification:ubl:schema:xsd:CommonBasicComponents-2";
const SERVICE_AGENCY: &str = "XXXESPD-SERVICEXXX";

/// UBL Request形式のエミッター
pub struct UblRequestEmitter;

impl UblRequestEmitter {
    pub fn render<W: Write>(
        &self,
        doc: &Document,
        ctx: &EmitContext,
        writer: &mut W,
    ) -> Result<(), EspdError> {
        write_document(&request_document(doc, ctx)?, writer)
    }
}

/// UBL Response形式のエミッター
pub struct UblResponseEmitter;

impl UblResponseEmitter {
    pub fn render<W: Write>(
        &self,
        doc: &Document,
        ctx: &EmitContext,
        writer: &mut W,
    ) -> Result<(), EspdError> {
        write_document(&response_document(doc, ctx)?, writer)
    }
}

/// Request文書の要素ツリーを生成
pub fn request_document(doc: &Document, ctx: &EmitContext) -> Result<XmlElement, EspdError> {
    let ubl = Ubl::new(ctx);
    let mut root = ubl.root("QualificationApplicationRequest", REQUEST_NS);
    ubl.header(&mut root);
    root.push(ubl.contracting_party());
    root.push(ubl.procurement_project());
    for lot in doc.sorted_lots() {
        root.push(ubl.lot("ProcurementProjectLot", &lot));
    }
    for criterion in doc.criteria.values() {
        ubl.request_criterion(&mut root, criterion)?;
    }
    Ok(root)
}

/// Response文書の要素ツリーを生成
///
/// 回答は既定ロット（`LOT-0000`）に対してのみ作成します。
pub fn response_document(doc: &Document, ctx: &EmitContext) -> Result<XmlElement, EspdError> {
    let ubl = Ubl::new(ctx);
    let mut root = ubl.root("QualificationApplicationResponse", RESPONSE_NS);
    ubl.header(&mut root);
    root.push(ubl.contracting_party());
    root.push(ubl.economic_operator());
    root.push(ubl.procurement_project());
    root.push(ubl.lot("ProcurementProjectLot", DEFAULT_LOT));

    for criterion in doc.criteria.values() {
        ubl.request_criterion(&mut root, criterion)?;
    }

    let mut evidence = Vec::new();
    for criterion in doc.criteria.values() {
        if criterion.family == CriterionFamily::SC && !criterion.has_lot(DEFAULT_LOT) {
            debug!(criterion = %criterion.tag, "not answered for default lot");
            continue;
        }
        let name = criterion.name().unwrap_or_default();
        for child in criterion.node.children.values() {
            ubl.respond(&mut root, child, name, &mut evidence);
        }
    }

    for id in &evidence {
        root.push(ubl.evidence(id));
    }
    Ok(root)
}

struct Ubl<'c> {
    ctx: &'c EmitContext,
}

impl<'c> Ubl<'c> {
    fn new(ctx: &'c EmitContext) -> Self {
        Self { ctx }
    }

    fn version(&self) -> &str {
        &self.ctx.version
    }

    fn code(&self, list: CodeList) -> Vec<(&'static str, String)> {
        code_list_attrs(self.version(), list)
            .map(|attrs| {
                attrs
                    .as_pairs()
                    .into_iter()
                    .map(|(k, v)| (k, v.to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn scheme(&self, agency: &str) -> [(&'static str, String); 3] {
        [
            ("schemeID", "Criterion".to_string()),
            ("schemeAgencyID", agency.to_string()),
            ("schemeVersionID", self.version().to_string()),
        ]
    }

    fn id(&self, agency: &str, text: impl Into<String>) -> XmlElement {
        cbc("ID", text).attrs(self.scheme(agency))
    }

    fn root(&self, name: &str, namespace: &str) -> XmlElement {
        XmlElement::new(name)
            .attr("xmlns", namespace)
            .attr(
                "xsi:schemaLocation",
                format!("{namespace} ../xsdrt/maindoc/UBL-{name}-2.3.xsd"),
            )
            .attr("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance")
            .attr("xmlns:fn", "http://www.w3.org/2005/xpath-functions")
            .attr("xmlns:xs", "http://www.w3.org/2001/XMLSchema")
            .attr("xmlns:cac", CAC_NS)
            .attr("xmlns:cbc", CBC_NS)
            .attr("xmlns:espd", format!("urn:com:grow:espd:{}", self.version()))
    }

    fn header(&self, root: &mut XmlElement) {
        let v = self.version();
        let issued = self.ctx.issued_at;

        root.push_comment(format!(" The ESPD-EDM-V{v} is entirely based on OASIS UBL-2.3 "));
        root.push(cbc("UBLVersionID", "2.3").attr("schemeAgencyID", "OASIS-UBL-TC"));
        root.push_comment(format!(
            " How ESPD-EDM-V{v} uses the UBL-2.3 schemas whilst keeping conformance "
        ));
        root.push(
            cbc("ProfileExecutionID", format!("ESPD-EDMv{v}"))
                .attr("schemeAgencyID", "OP")
                .attr("schemeVersionID", v),
        );
        root.push_comment(
            " The identifier of this document is generally generated by the systems that creates the ESPD ",
        );
        root.push(
            cbc("ID", format!("ESPDREQ-DGPE-{}", self.ctx.document_id))
                .attr("schemeAgencyID", "DGPE"),
        );
        root.push_comment(
            " Indicates whether this document is an original or a copy. In this case the document is the original ",
        );
        root.push(cbc("CopyIndicator", "false"));
        root.push_comment(
            " The unique identifier for this instance of the document. Copies of this document should have different UUIDs ",
        );
        root.push(
            cbc("UUID", self.ctx.document_uuid.as_str())
                .attr("schemeID", "ISO/IEC 9834-8:2008 - 4UUID")
                .attr("schemeAgencyID", "XXXESPD-SERVICEXXX")
                .attr("schemeVersionID", v),
        );
        root.push_comment(
            " The reference number the contracting authority assigns to this procurement procedure ",
        );
        root.push(cbc("ContractFolderID", "PP.20170419.1024-9").attr("schemeAgencyID", "DGPE"));
        root.push(cbc("IssueDate", issued.format("%Y-%m-%d").to_string()));
        root.push(cbc("IssueTime", issued.format("%H:%M:%S%:z").to_string()));
        root.push_comment(
            " The version of the content of this document. If the document is modified the element cbc:PreviousVersionID should be instantiated ",
        );
        root.push(
            cbc("VersionID", v)
                .attr("schemeAgencyID", "OP")
                .attr("schemeVersionID", v),
        );
        root.push_comment(
            " The type of the procurement procedure; this information is provided by eForms and the concret notice per procedure. ",
        );
        root.push(cbc("ProcedureCode", "Open").attrs(self.code(CodeList::ProcedureCode)));
    }

    fn postal_address(&self, street: &str, city: &str, zone: &str) -> XmlElement {
        cac("PostalAddress")
            .child(cbc("StreetName", street))
            .child(cbc("CityName", city))
            .child(cbc("PostalZone", zone))
            .child(
                cac("Country").child(
                    cbc("IdentificationCode", "BEL").attrs(self.code(CodeList::Country)),
                ),
            )
    }

    fn contracting_party(&self) -> XmlElement {
        cac("ContractingParty")
            .child(cbc("BuyerProfileURI", "DV"))
            .child(
                cac("Party")
                    .child(cbc("WebsiteURI", "DV"))
                    .child(
                        cbc("EndpointID", "DV")
                            .attr("schemeID", "DV")
                            .attr("schemeAgencyID", "OP"),
                    )
                    .child(
                        cac("PartyIdentification")
                            .child(cbc("ID", "B82387770").attr("schemeAgencyID", "VIES")),
                    )
                    .child(cac("PartyName").child(cbc("Name", "DV")))
                    .child(self.postal_address("DV", "DV", "DV"))
                    .child(
                        cac("Contact")
                            .child(cbc("Name", "DV"))
                            .child(cbc("Telephone", "DV"))
                            .child(cbc("ElectronicMail", "DV")),
                    ),
            )
    }

    fn economic_operator(&self) -> XmlElement {
        cac("EconomicOperatorParty")
            .child(
                cac("EconomicOperatorRole")
                    .child(cbc("RoleCode", "group-mem").attrs(self.code(CodeList::EoRoleType))),
            )
            .child(
                cac("Party")
                    .child(cbc("WebsiteURI", "https://www.ProcurerWebsite.eu"))
                    .child(
                        cbc("IndustryClassificationCode", "sme")
                            .attrs(self.code(CodeList::EconomicOperatorSize)),
                    )
                    .child(
                        cac("PartyIdentification")
                            .child(cbc("ID", "AD123456789").attr("schemeAgencyID", "OP")),
                    )
                    .child(cac("PartyName").child(cbc("Name", "__Procurer Official Name__")))
                    .child(self.postal_address("__ProcurerStreet__", "__ProcurerCity__", "12345"))
                    .child(
                        cac("Contact")
                            .child(cbc("Name", "__ProcurerContactName__"))
                            .child(cbc("Telephone", "654321"))
                            .child(cbc("Telefax", "098765"))
                            .child(cbc("ElectronicMail", "__ProcurerContact@gov.eu")),
                    ),
            )
    }

    fn procurement_project(&self) -> XmlElement {
        cac("ProcurementProject").child(cbc("Description", "Description of Project."))
    }

    fn lot(&self, element: &str, lot: &str) -> XmlElement {
        cac(element).child(self.id("OP", lot))
    }

    fn evidence(&self, id: &str) -> XmlElement {
        cac("Evidence")
            .child(cbc("ID", id).attr("schemeAgencyID", "XXXAGENCYXXX"))
            .child(
                cbc("ConfidentialityLevelCode", "CONFIDENTIAL")
                    .attrs(self.code(CodeList::AccessRight)),
            )
            .child(
                cac("DocumentReference")
                    .child(cbc("ID", "SAT-11121233").attr("schemeAgencyID", "XXXAGENCYXXX"))
                    .child(cac("Attachment").child(
                        cac("ExternalReference").child(cbc(
                            "URI",
                            "http:dod.gov.usa/sat/it/soft/prk?id=11121233",
                        )),
                    ))
                    .child(
                        cac("IssuerParty")
                            .child(
                                cac("PartyIdentification").child(
                                    cbc("ID", "XXXXXXXX").attr("schemeAgencyID", "XXXAGENCYXXX"),
                                ),
                            )
                            .child(cac("PartyName").child(cbc("Name", "USA DoD"))),
                    ),
            )
    }

    /// 属性値を取得（欠落時は厳格モードならエラー、そうでなければ空文字列）
    fn attr(&self, node: &Node, key: AttributeKey) -> Result<String, EspdError> {
        match node.attr(key) {
            Some(value) => Ok(value.to_string()),
            None if self.ctx.mode == EmissionMode::Strict => Err(EspdError::MissingAttribute {
                node: node.identifier.clone(),
                attribute: key.as_str().to_string(),
            }),
            None => {
                debug!(node = %node.identifier, attribute = %key, "attribute missing");
                Ok(String::new())
            }
        }
    }

    fn request_path(node: &Node) -> String {
        node.attr(AttributeKey::RequestPath)
            .map(str::to_string)
            .unwrap_or_else(|| node.paths.request_path.clone())
    }

    fn request_criterion(&self, root: &mut XmlElement, criterion: &Criterion) -> Result<(), EspdError> {
        let node = &criterion.node;
        let request_path = Self::request_path(node);
        let id = if request_path.contains("_OT_") {
            request_path
        } else {
            self.attr(node, AttributeKey::ElementUuid)?
        };

        let mut element = cac("TenderingCriterion")
            .child(self.id("OP", id))
            .child(
                cbc("CriterionTypeCode", self.attr(node, AttributeKey::ElementCode)?)
                    .attrs(self.code(CodeList::Criterion)),
            )
            .child(cbc("Name", self.attr(node, AttributeKey::Name)?))
            .child(cbc("Description", self.attr(node, AttributeKey::Description)?));

        if criterion.family == CriterionFamily::SC {
            for lot in &criterion.lots {
                element.push(self.lot("ProcurementProjectLotReference", lot));
            }
        }
        for child in node.children.values() {
            self.request_node(&mut element, child)?;
        }

        root.push_comment(format!(" Criterion: {} ", criterion.name().unwrap_or_default()));
        root.push(element);
        Ok(())
    }

    fn request_node(&self, parent: &mut XmlElement, node: &Node) -> Result<(), EspdError> {
        match node.kind {
            TagName::Criterion => {
                warn!(node = %node.identifier, "nested criterion ignored");
                parent.push_comment(format!(" Unknown {} - UBL mapping not implemented ", node.kind));
            }
            TagName::Subcriterion => {
                let mut element = cac("SubTenderingCriterion")
                    .child(self.id("OP", Self::request_path(node)))
                    .child(cbc("Name", self.attr(node, AttributeKey::Name)?))
                    .child(cbc("Description", self.attr(node, AttributeKey::Description)?));
                self.request_children(&mut element, node)?;
                parent.push(element);
            }
            TagName::Legislation => {
                parent.push(
                    cac("Legislation")
                        .child(self.id("OP", Self::request_path(node)))
                        .child(cbc("Title", "[Legislation Title]"))
                        .child(cbc("Description", "[Legislation Description]"))
                        .child(cbc("JurisdictionLevel", "EU"))
                        .child(cbc("Article", "[Article, e.g. Article 2.I.a]"))
                        .child(cbc("URI", "http://eur-lex.europa.eu/"))
                        .child(cac("Language").child(
                            cbc("LocaleCode", "ENG").attrs(self.code(CodeList::Language)),
                        )),
                );
            }
            TagName::AdditionalDescriptionLine => {
                parent.push(cbc("Description", self.attr(node, AttributeKey::Description)?));
            }
            TagName::RequirementGroup
            | TagName::QuestionGroup
            | TagName::RequirementSubgroup
            | TagName::QuestionSubgroup => {
                if node.is_repeated_occurrence() {
                    debug!(node = %node.identifier, "repeated occurrence not rendered in request");
                    return Ok(());
                }
                let name = match node.kind {
                    TagName::RequirementGroup | TagName::QuestionGroup => {
                        "TenderingCriterionPropertyGroup"
                    }
                    _ => "SubsidiaryTenderingCriterionPropertyGroup",
                };
                let mut element = cac(name).child(self.id("OP", Self::request_path(node))).child(
                    cbc("PropertyGroupTypeCode", self.attr(node, AttributeKey::ElementCode)?)
                        .attrs(self.code(CodeList::PropertyGroupType)),
                );
                self.request_children(&mut element, node)?;
                parent.push(element);
            }
            TagName::Question | TagName::Caption => {
                parent.push(self.property(node)?);
            }
            TagName::Requirement => {
                let mut element = self.property(node)?;
                element.push_comment(
                    " No answer is expected here from the economic operator, as this is a REQUIREMENT issued by the contracting authority. Hence the element \"cbc:ValueDataTypeCode\" contains the type of value of the requirement issued by the contracting authority  ",
                );
                self.expected_value(&mut element, node)?;
                parent.push(element);
            }
        }
        Ok(())
    }

    fn request_children(&self, element: &mut XmlElement, node: &Node) -> Result<(), EspdError> {
        for child in node.children.values() {
            self.request_node(element, child)?;
        }
        Ok(())
    }

    fn property(&self, node: &Node) -> Result<XmlElement, EspdError> {
        Ok(cac("TenderingCriterionProperty")
            .child(self.id("OP", Self::request_path(node)))
            .child(cbc("Name", self.attr(node, AttributeKey::Name)?))
            .child(cbc("Description", self.attr(node, AttributeKey::Description)?))
            .child(cbc("TypeCode", node.kind.as_str()).attrs(self.code(CodeList::CriterionElementType)))
            .child(
                cbc("ValueDataTypeCode", node.property_data_type().unwrap_or("NONE"))
                    .attrs(self.code(CodeList::ResponseDataType)),
            ))
    }

    /// REQUIREMENTの期待値（発注者側の値）
    fn expected_value(&self, element: &mut XmlElement, node: &Node) -> Result<(), EspdError> {
        let buyer = node.attr(AttributeKey::BuyerValue);
        let value = |default: &str| buyer.unwrap_or(default).to_string();
        let Some(pdt) = node.property_data_type() else {
            if self.ctx.mode == EmissionMode::Strict {
                return Err(EspdError::MissingAttribute {
                    node: node.identifier.clone(),
                    attribute: AttributeKey::PropertyDataType.as_str().to_string(),
                });
            }
            element.push_comment(" PropertyDataType: undefined not defined ");
            return Ok(());
        };

        match pdt {
            "AMOUNT" => element.push(cbc("ExpectedAmount", value("0")).attr("currencyID", "EUR")),
            "IDENTIFIER" | "EVIDENCE_IDENTIFIER" | "ECONOMIC_OPERATOR_IDENTIFIER" | "LOT_IDENTIFIER" => {
                element.push(cbc("ExpectedID", value("")).attr("schemeAgencyID", "OP"))
            }
            "CODE_BOOLEAN" => element.push(
                cbc("ExpectedCode", value("")).attrs(self.code(CodeList::BooleanGuiControlType)),
            ),
            "CODE_COUNTRY" => {
                element.push(cbc("ExpectedCode", value("")).attrs(self.code(CodeList::Country)))
            }
            "ECONOMIC_OPERATOR_ROLE_CODE" => {
                element.push(cbc("ExpectedCode", value("")).attrs(self.code(CodeList::EoRoleType)))
            }
            "DESCRIPTION" => element.push(cbc("ExpectedDescription", value(""))),
            "PERCENTAGE" => {
                element.push(cbc("ValueUnitCode", "PERCENTAGE"));
                element.push(cbc("ExpectedValueNumeric", value("0")));
            }
            "INDICATOR" => element.push(cbc("ExpectedIndicator", value("false"))),
            "DATE" => {
                element.push(cbc("ValueUnitCode", "DATE"));
                element.push(cbc("ExpectedValueNumeric", value("2000-01-01")));
            }
            "PERIOD" => element.push(
                cac("ApplicablePeriod")
                    .child(cbc("StartDate", "2000-01-01"))
                    .child(cbc("EndDate", "2050-12-31")),
            ),
            "MINIMUM_QUANTITY_INTEGER" | "MINIMUM_QUANTITY_YEAR" | "MINIMUM_QUANTITY"
            | "QUANTITY_INTEGER" | "QUANTITY" | "QUANTITY_YEAR" => {
                element.push(cbc("ExpectedValueNumeric", value("0")))
            }
            "MAXIMUM_AMOUNT" => element.push(cbc("MaximumAmount", value("0")).attr("currencyID", "EUR")),
            "MINIMUM_AMOUNT" => element.push(cbc("MinimumAmount", value("0")).attr("currencyID", "EUR")),
            "MAXIMUM_VALUE_NUMERIC" => element.push(cbc("MaximumValueNumeric", value(""))),
            "MINIMUM_VALUE_NUMERIC" => element.push(cbc("MinimumValueNumeric", value(""))),
            "TRANSLATION_TYPE_CODE" => element.push(cbc("TranslationTypeCode", value(""))),
            "COPY_QUALITY_TYPE_CODE" => element.push(cbc("CopyQualityTypeCode", value(""))),
            "CERTIFICATION_LEVEL_DESCRIPTION" => {
                element.push(cbc("CertificationLevelDescription", value("")))
            }
            "URL" => element.push(cbc("ExpectedURI", value("")).attr("schemeAgencyID", "OP")),
            "CODE" => {
                if let Some(list) = node.attr(AttributeKey::CodeList).and_then(code_list_for) {
                    element.push(cbc("ExpectedCode", value("")).attrs(self.code(list)));
                }
            }
            other => {
                if self.ctx.mode == EmissionMode::Strict {
                    return Err(EspdError::UnsupportedDataType {
                        node: node.identifier.clone(),
                        data_type: other.to_string(),
                    });
                }
                warn!(node = %node.identifier, data_type = other, "property data type not mapped");
                element.push_comment(format!(" PropertyDataType: {other} not defined "));
            }
        }
        Ok(())
    }

    /// Response部の再帰処理
    fn respond(&self, root: &mut XmlElement, node: &Node, criterion: &str, evidence: &mut Vec<String>) {
        match node.kind {
            TagName::QuestionGroup | TagName::QuestionSubgroup => {
                for child in answered_children(node) {
                    self.respond(root, child, criterion, evidence);
                }
            }
            TagName::RequirementGroup => {
                let default_lot = node.children.values().any(|c| {
                    c.kind == TagName::Requirement
                        && c.property_data_type() == Some("LOT_IDENTIFIER")
                        && c.attr(AttributeKey::BuyerValue) == Some(DEFAULT_LOT)
                });
                if default_lot {
                    for child in node.children.values() {
                        self.respond(root, child, criterion, evidence);
                    }
                }
            }
            TagName::Question => {
                let (comments, element) = self.response(node, criterion, evidence);
                for comment in comments {
                    root.push_comment(comment);
                }
                root.push(element);
            }
            _ => {
                for child in node.children.values() {
                    self.respond(root, child, criterion, evidence);
                }
            }
        }
    }

    fn response(&self, node: &Node, criterion: &str, evidence: &mut Vec<String>) -> (Vec<String>, XmlElement) {
        let request_path = Self::request_path(node);
        let response_path = node
            .attr(AttributeKey::ResponsePath)
            .map(str::to_string)
            .unwrap_or_else(|| request_path.clone());
        let content1 = node
            .attr(AttributeKey::ResponseContent1)
            .map(str::to_string)
            .or_else(|| node.paths.response_content.clone())
            .unwrap_or_default();
        let content2 = node
            .attr(AttributeKey::ResponseContent2)
            .map(str::to_string)
            .unwrap_or_else(|| request_path.clone());
        let content3 = node
            .attr(AttributeKey::ResponseContent3)
            .map(str::to_string)
            .or_else(|| node.paths.response_value.clone())
            .unwrap_or_default();
        let seller = node.attr(AttributeKey::SellerValue);
        let seller_or = |default: &str| seller.unwrap_or(default).to_string();

        let comments = vec![
            format!("  Answer to Criterion:{criterion}  "),
            format!(
                " Property: {} (PropertyID: {}) ",
                node.description().unwrap_or_default(),
                response_path
            ),
        ];

        let mut element = cac("TenderingCriterionResponse")
            .child(self.id(SERVICE_AGENCY, content1))
            .child(cbc("ValidatedCriterionPropertyID", content2).attrs(self.scheme(SERVICE_AGENCY)));

        let response_value = |value: XmlElement| {
            cac("ResponseValue")
                .child(self.id(SERVICE_AGENCY, content3.as_str()))
                .child(value)
        };

        match node.property_data_type().unwrap_or_default() {
            "PERIOD" => element.push(
                cac("ApplicablePeriod")
                    .child(cbc("StartDate", "2017-01-01"))
                    .child(cbc("EndDate", "2017-12-12")),
            ),
            "EVIDENCE_IDENTIFIER" => {
                element.push(
                    cac("EvidenceSupplied")
                        .child(cbc("ID", content3.as_str()).attr("schemeAgencyID", "OP")),
                );
                evidence.push(content3.clone());
            }
            "DESCRIPTION" => {
                element.push(response_value(cbc("Description", seller_or("Dummy Description"))))
            }
            "INDICATOR" => element.push(response_value(cbc("ResponseIndicator", "true"))),
            "IDENTIFIER" => element.push(response_value(
                cbc("ResponseID", seller_or("Dummy ID")).attr("schemeAgencyID", "OP"),
            )),
            "ECONOMIC_OPERATOR_IDENTIFIER" => element.push(response_value(
                cbc("ResponseID", seller_or("Dummy EO_ID")).attr("schemeAgencyID", "XXXEOIDXXX"),
            )),
            "QUAL_IDENTIFIER" => element.push(response_value(
                cbc("ResponseID", seller_or("Dummy QUAL_ID")).attr("schemeAgencyID", "XXXQUALIDXXX"),
            )),
            "URL" => element.push(response_value(cbc(
                "ResponseURI",
                seller_or("www.no-such-site.eu"),
            ))),
            "AMOUNT" => element.push(response_value(
                cbc("ResponseAmount", "1000000000").attr("currencyID", "EUR"),
            )),
            "PERCENTAGE" => element.push(response_value(
                cbc("ResponseNumeric", seller_or("3.14")).attr("format", "PERCENTAGE"),
            )),
            "QUANTITY_INTEGER" => element.push(response_value(
                cbc("ResponseQuantity", seller_or("42")).attr("unitCode", "INTEGER"),
            )),
            "QUANTITY_YEAR" => element.push(response_value(
                cbc("ResponseQuantity", seller_or("2000")).attr("unitCode", "YEAR"),
            )),
            "QUANTITY" => element.push(response_value(cbc("ResponseQuantity", seller_or("60")))),
            "DATE" => element.push(response_value(cbc("ResponseDate", "2000-01-01"))),
            "TIME" => element.push(response_value(cbc(
                "ResponseTime",
                seller_or("00:00:00+00:00"),
            ))),
            "CODE_COUNTRY" => element.push(response_value(
                cbc("ResponseCode", "BEL").attrs(self.code(CodeList::Country)),
            )),
            "CODE" => {
                if let Some(list) = node.attr(AttributeKey::CodeList).and_then(code_list_for) {
                    element.push(response_value(
                        cbc("ResponseCode", "dummy-value").attrs(self.code(list)),
                    ));
                }
            }
            other => debug!(node = %node.identifier, data_type = other, "no response value"),
        }

        if response_path.contains("_SC_") {
            element.push(self.lot("ProcurementProjectLotReference", DEFAULT_LOT));
        }
        (comments, element)
    }
}

/// `CODE`型で参照するコードリスト名
fn code_list_for(name: &str) -> Option<CodeList> {
    match name {
        "Occupation" => Some(CodeList::Occupation),
        "FinancialRatioType" => Some(CodeList::FinancialRatioType),
        "EoRoleType" => Some(CodeList::EoRoleType),
        _ => None,
    }
}

/// 回答対象の子ノード
///
/// 直下のINDICATOR型QUESTIONに回答値がある場合、その値と逆の条件
/// （`ONTRUE` / `ONFALSE`）を持つグループを除外します。
fn answered_children(node: &Node) -> Vec<&Node> {
    let indicator = node
        .children
        .values()
        .filter(|c| c.kind == TagName::Question && c.property_data_type() == Some("INDICATOR"))
        .filter_map(|c| c.attr(AttributeKey::SellerValue))
        .last();

    node.children
        .values()
        .filter(|c| {
            if !c.kind.is_question_group() {
                return true;
            }
            !matches!(
                (c.element_code(), indicator),
                (Some("ONTRUE"), Some("false")) | (Some("ONFALSE"), Some("true"))
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Node;
    use crate::types::TagRole;
    use chrono::{FixedOffset, TimeZone};

    fn context() -> EmitContext {
        let offset = FixedOffset::east_opt(3600).unwrap();
        EmitContext::new("3.3.0")
            .unwrap()
            .with_issued_at(offset.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap())
            .with_ids("doc-id", "doc-uuid")
    }

    fn question(id: &str, pdt: &str) -> Node {
        let mut node = Node::new(TagName::Question, TagRole::SelfClosing, id)
            .with_attr(AttributeKey::Description, "Your answer")
            .with_attr(AttributeKey::PropertyDataType, pdt);
        node.paths.request_path = format!("C1_EG_CRIME/QG1/{id}");
        node.paths.response_content = Some(format!("C1_EG_CRIME/QG1/{id}/R1"));
        node.paths.response_value = Some(format!("C1_EG_CRIME/QG1/{id}/R1/RV"));
        node
    }

    fn criterion(family: CriterionFamily, children: Vec<(&str, Node)>) -> Criterion {
        let mut node = Node::new(TagName::Criterion, TagRole::Start, "C1")
            .with_attr(AttributeKey::Name, "Participation in a criminal organisation")
            .with_attr(AttributeKey::Description, "Has the economic operator ...")
            .with_attr(AttributeKey::ElementCode, "CRIME-ORG")
            .with_attr(AttributeKey::ElementUuid, "005eb9ed-1347-4ca3-bb29-9bc0db64e1ab");
        node.paths.request_path = "C1_EG_CRIME-ORG".to_string();
        for (key, child) in children {
            node.children.insert(key.to_string(), child);
        }
        Criterion {
            tag: format!("C1 - {}", family.as_str()),
            node,
            number: 1,
            sheet: "EG-Test".to_string(),
            family,
            root_path: "C1_EG_CRIME-ORG".to_string(),
            lots: Vec::new(),
        }
    }

    fn document(criterion: Criterion) -> Document {
        let mut doc = Document::new();
        doc.criteria.insert("C1".to_string(), criterion);
        doc
    }

    fn responses(root: &XmlElement) -> Vec<&XmlElement> {
        root.find_all("cac:TenderingCriterionResponse").collect()
    }

    #[test]
    fn test_request_header_and_criterion() {
        let group = Node::new(TagName::QuestionGroup, TagRole::Start, "QG1")
            .with_attr(AttributeKey::ElementCode, "ON*")
            .with_child("Q1", question("Q1", "INDICATOR"));
        let doc = document(criterion(CriterionFamily::EG, vec![("QG1", group)]));

        let root = request_document(&doc, &context()).unwrap();

        assert_eq!(root.name, "QualificationApplicationRequest");
        assert_eq!(root.attribute("xmlns:espd"), Some("urn:com:grow:espd:3.3.0"));
        assert_eq!(root.find("cbc:IssueDate").unwrap().text_content(), "2024-05-06");
        assert_eq!(root.find("cbc:IssueTime").unwrap().text_content(), "07:08:09+01:00");
        assert_eq!(root.find("cbc:ID").unwrap().text_content(), "ESPDREQ-DGPE-doc-id");

        let tc = root.find("cac:TenderingCriterion").unwrap();
        assert_eq!(
            tc.find("cbc:ID").unwrap().text_content(),
            "005eb9ed-1347-4ca3-bb29-9bc0db64e1ab"
        );
        let group = tc.find("cac:TenderingCriterionPropertyGroup").unwrap();
        assert_eq!(group.find("cbc:PropertyGroupTypeCode").unwrap().text_content(), "ON*");
        let property = group.find("cac:TenderingCriterionProperty").unwrap();
        assert_eq!(property.find("cbc:ID").unwrap().text_content(), "C1_EG_CRIME/QG1/Q1");
        assert_eq!(property.find("cbc:TypeCode").unwrap().text_content(), "QUESTION");
    }

    #[test]
    fn test_request_skips_repeated_groups() {
        let mut repeated = Node::new(TagName::RequirementGroup, TagRole::Start, "RG1")
            .with_attr(AttributeKey::Cardinality, "(2)");
        repeated.occurrence = Some(2);
        let first = Node::new(TagName::RequirementGroup, TagRole::Start, "RG1")
            .with_attr(AttributeKey::Cardinality, "(1)");
        let doc = document(criterion(
            CriterionFamily::EG,
            vec![("RG1", first), ("RG1(2)", repeated)],
        ));

        let root = request_document(&doc, &context()).unwrap();
        let tc = root.find("cac:TenderingCriterion").unwrap();
        assert_eq!(tc.find_all("cac:TenderingCriterionPropertyGroup").count(), 1);
    }

    #[test]
    fn test_requirement_expected_values() {
        let amount = Node::new(TagName::Requirement, TagRole::SelfClosing, "RQ1")
            .with_attr(AttributeKey::PropertyDataType, "AMOUNT")
            .with_attr(AttributeKey::BuyerValue, "1500");
        let unknown = Node::new(TagName::Requirement, TagRole::SelfClosing, "RQ2")
            .with_attr(AttributeKey::PropertyDataType, "MYSTERY");
        let group = Node::new(TagName::RequirementGroup, TagRole::Start, "RG1")
            .with_child("RQ1", amount)
            .with_child("RQ2", unknown);
        let doc = document(criterion(CriterionFamily::EG, vec![("RG1", group)]));

        let root = request_document(&doc, &context()).unwrap();
        let group = root
            .find("cac:TenderingCriterion")
            .and_then(|tc| tc.find("cac:TenderingCriterionPropertyGroup"))
            .unwrap();
        let properties: Vec<&XmlElement> = group.find_all("cac:TenderingCriterionProperty").collect();

        let expected = properties[0].find("cbc:ExpectedAmount").unwrap();
        assert_eq!(expected.text_content(), "1500");
        assert_eq!(expected.attribute("currencyID"), Some("EUR"));
        assert!(properties[1]
            .comments()
            .any(|c| c.contains("PropertyDataType: MYSTERY not defined")));
    }

    #[test]
    fn test_strict_mode_rejects_unknown_data_type() {
        let unknown = Node::new(TagName::Requirement, TagRole::SelfClosing, "RQ1")
            .with_attr(AttributeKey::Name, "n")
            .with_attr(AttributeKey::Description, "d")
            .with_attr(AttributeKey::PropertyDataType, "MYSTERY");
        let doc = document(criterion(CriterionFamily::EG, vec![("RQ1", unknown)]));
        let ctx = context().with_mode(EmissionMode::Strict);

        assert!(matches!(
            request_document(&doc, &ctx),
            Err(EspdError::UnsupportedDataType { data_type, .. }) if data_type == "MYSTERY"
        ));
    }

    #[test]
    fn test_strict_mode_rejects_missing_attribute() {
        let caption = Node::new(TagName::Caption, TagRole::SelfClosing, "CA1");
        let doc = document(criterion(CriterionFamily::EG, vec![("CA1", caption)]));
        let ctx = context().with_mode(EmissionMode::Strict);

        assert!(matches!(
            request_document(&doc, &ctx),
            Err(EspdError::MissingAttribute { node, attribute }) if node == "CA1" && attribute == "name"
        ));
    }

    #[test]
    fn test_indicator_question_emits_indicator_value() {
        let group = Node::new(TagName::QuestionGroup, TagRole::Start, "QG1")
            .with_child("Q1", question("Q1", "INDICATOR"));
        let doc = document(criterion(CriterionFamily::EG, vec![("QG1", group)]));

        let root = response_document(&doc, &context()).unwrap();
        let answers = responses(&root);
        assert_eq!(answers.len(), 1);

        let value = answers[0].find("cac:ResponseValue").unwrap();
        let names: Vec<&str> = value.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["cbc:ID", "cbc:ResponseIndicator"]);
        assert_eq!(value.find("cbc:ResponseIndicator").unwrap().text_content(), "true");
        assert!(value.find("cbc:Description").is_none());
        assert_eq!(
            value.find("cbc:ID").unwrap().text_content(),
            "C1_EG_CRIME/QG1/Q1/R1/RV"
        );
        assert_eq!(
            answers[0].find("cbc:ID").unwrap().text_content(),
            "C1_EG_CRIME/QG1/Q1/R1"
        );
    }

    #[test]
    fn test_indicator_filters_conditional_groups() {
        let on_true = Node::new(TagName::QuestionSubgroup, TagRole::Start, "QSG1")
            .with_attr(AttributeKey::ElementCode, "ONTRUE")
            .with_child("Q1", question("Q2", "DESCRIPTION"));
        let on_false = Node::new(TagName::QuestionSubgroup, TagRole::Start, "QSG2")
            .with_attr(AttributeKey::ElementCode, "ONFALSE")
            .with_child("Q1", question("Q3", "DATE"));
        let group = Node::new(TagName::QuestionGroup, TagRole::Start, "QG1")
            .with_child(
                "Q1",
                question("Q1", "INDICATOR").with_attr(AttributeKey::SellerValue, "false"),
            )
            .with_child("QSG1", on_true)
            .with_child("QSG2", on_false);
        let doc = document(criterion(CriterionFamily::EG, vec![("QG1", group)]));

        let root = response_document(&doc, &context()).unwrap();
        let answers = responses(&root);

        assert_eq!(answers.len(), 2);
        assert!(answers[1]
            .find("cac:ResponseValue")
            .and_then(|v| v.find("cbc:ResponseDate"))
            .is_some());
    }

    #[test]
    fn test_selection_criterion_without_default_lot_is_not_answered() {
        let group = Node::new(TagName::QuestionGroup, TagRole::Start, "QG1")
            .with_child("Q1", question("Q1", "INDICATOR"));
        let mut sc = criterion(CriterionFamily::SC, vec![("QG1", group)]);
        sc.lots = vec!["LOT-0001".to_string()];
        let doc = document(sc);

        let request = request_document(&doc, &context()).unwrap();
        let tc = request.find("cac:TenderingCriterion").unwrap();
        assert_eq!(tc.find_all("cac:ProcurementProjectLotReference").count(), 1);

        let response = response_document(&doc, &context()).unwrap();
        assert!(responses(&response).is_empty());
    }

    #[test]
    fn test_evidence_collected_in_response() {
        let group = Node::new(TagName::QuestionGroup, TagRole::Start, "QG1")
            .with_child("Q1", question("Q1", "EVIDENCE_IDENTIFIER"));
        let doc = document(criterion(CriterionFamily::EG, vec![("QG1", group)]));

        let root = response_document(&doc, &context()).unwrap();

        let evidence: Vec<&XmlElement> = root.find_all("cac:Evidence").collect();
        assert_eq!(evidence.len(), 1);
        assert_eq!(
            evidence[0].find("cbc:ID").unwrap().text_content(),
            "C1_EG_CRIME/QG1/Q1/R1/RV"
        );
        assert!(root.find("cac:EconomicOperatorParty").is_some());
    }

    #[test]
    fn test_render_writes_xml() {
        let doc = document(criterion(CriterionFamily::EG, Vec::new()));
        let mut out = Vec::new();
        UblRequestEmitter.render(&doc, &context(), &mut out).unwrap();
        let xml = String::from_utf8(out).unwrap();

        assert!(xml.contains("<QualificationApplicationRequest xmlns=\""));
        assert!(xml.contains("<!-- Criterion: Participation in a criminal organisation -->"));
    }
}
