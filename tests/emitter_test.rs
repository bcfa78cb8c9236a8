//! Emitter Integration Tests
//!
//! 生成したワークブックを解析し、各出力形式の内容を検証します。

mod common;

use chrono::DateTime;
use std::io::Cursor;

use common::{criterion_workbook, workbook, Line};
use espdxl::AttributeKey as K;
use espdxl::output::{request_document, response_document};
use espdxl::{
    Document, EmissionMode, EmitContext, EspdError, OutputEmitter, OutputFormat, ParserBuilder,
};

fn document() -> Document {
    ParserBuilder::new()
        .build()
        .unwrap()
        .parse(Cursor::new(criterion_workbook()))
        .unwrap()
        .document
}

fn context() -> EmitContext {
    EmitContext::new("4.0.0")
        .unwrap()
        .with_issued_at(DateTime::parse_from_rfc3339("2024-05-01T10:30:00+02:00").unwrap())
        .with_ids("0001", "11111111-2222-3333-4444-555555555555")
}

fn render(format: OutputFormat, doc: &Document, ctx: &EmitContext) -> String {
    let mut out = Vec::new();
    OutputEmitter::from_format(format).render(doc, ctx, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_request_document_structure() {
    let root = request_document(&document(), &context()).unwrap();

    assert_eq!(root.name, "QualificationApplicationRequest");
    assert_eq!(root.find("cbc:IssueDate").unwrap().text_content(), "2024-05-01");
    assert_eq!(root.find("cbc:IssueTime").unwrap().text_content(), "10:30:00+02:00");
    assert_eq!(root.find("cbc:VersionID").unwrap().text_content(), "4.0.0");

    let lots: Vec<String> = root
        .find_all("cac:ProcurementProjectLot")
        .map(|lot| lot.find("cbc:ID").unwrap().text_content())
        .collect();
    assert_eq!(lots, vec!["LOT-0001"]);

    let criteria: Vec<_> = root.find_all("cac:TenderingCriterion").collect();
    assert_eq!(criteria.len(), 3);
    assert_eq!(
        criteria[0].find("cbc:ID").unwrap().text_content(),
        "005eb9ed-1347-4ca3-bb29-9bc0db64e1ab"
    );
    assert_eq!(
        criteria[0].find("cbc:CriterionTypeCode").unwrap().text_content(),
        "CRIME-ORG"
    );

    let group = criteria[0].find("cac:TenderingCriterionPropertyGroup").unwrap();
    assert_eq!(group.find("cbc:ID").unwrap().text_content(), "C1_EG_CRIME-ORG/QG1");
    let property = group.find("cac:TenderingCriterionProperty").unwrap();
    assert_eq!(property.find("cbc:ValueDataTypeCode").unwrap().text_content(), "INDICATOR");
    let subgroup = group
        .find("cac:SubsidiaryTenderingCriterionPropertyGroup")
        .unwrap();
    assert_eq!(subgroup.find("cbc:PropertyGroupTypeCode").unwrap().text_content(), "ONTRUE");

    let lot_refs: Vec<_> = criteria[2]
        .find_all("cac:ProcurementProjectLotReference")
        .collect();
    assert_eq!(lot_refs.len(), 1);
}

#[test]
fn test_response_document_answers() {
    let root = response_document(&document(), &context()).unwrap();

    assert_eq!(root.name, "QualificationApplicationResponse");
    assert!(root.find("cac:EconomicOperatorParty").is_some());
    assert_eq!(root.find_all("cac:TenderingCriterion").count(), 3);

    // C3はLOT-0000を対象としないため回答しない
    let responses: Vec<_> = root.find_all("cac:TenderingCriterionResponse").collect();
    assert_eq!(responses.len(), 3);

    let ids: Vec<String> = responses
        .iter()
        .map(|r| r.find("cbc:ID").unwrap().text_content())
        .collect();
    assert_eq!(
        ids,
        vec![
            "C1_EG_CRIME-ORG/QG1/Q1/R1",
            "C1_EG_CRIME-ORG/QG1/QSG1/Q1/R1",
            "C2_EG_CORRUPTION/QG1/Q1/R1",
        ]
    );

    let value = responses[0].find("cac:ResponseValue").unwrap();
    assert_eq!(value.find("cbc:ID").unwrap().text_content(), "C1_EG_CRIME-ORG/QG1/Q1/R1/RV");
    assert_eq!(value.find("cbc:ResponseIndicator").unwrap().text_content(), "true");
}

#[test]
fn test_written_xml_declaration() {
    let xml = render(OutputFormat::UblRequest, &document(), &context());

    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(xml.contains("<QualificationApplicationRequest xmlns="));
    assert!(xml.contains("<cbc:UUID"));
    assert!(xml.contains("11111111-2222-3333-4444-555555555555"));
    assert!(xml.trim_end().ends_with("</QualificationApplicationRequest>"));
}

#[test]
fn test_strict_mode_reports_missing_attribute() {
    let ctx = context().with_mode(EmissionMode::Strict);
    let result = request_document(&document(), &ctx);

    match result {
        Err(EspdError::MissingAttribute { attribute, .. }) => {
            assert!(!attribute.is_empty());
        }
        other => panic!("Expected MissingAttribute, got {:?}", other.map(|r| r.name)),
    }
}

#[test]
fn test_json_output() {
    let json = render(OutputFormat::Json, &document(), &context());
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["C1", "C2", "C3"]);
    assert_eq!(value["C1"]["tag"], "C1 - EG");
    assert_eq!(value["C1"]["type"], "CRITERION");
    assert_eq!(value["C1"]["elementcode"], "CRIME-ORG");
    assert_eq!(
        value["C1"]["components"]["QG1"]["components"]["QSG1"]["components"]["Q1"]["propertydatatype"],
        "DATE"
    );
    assert_eq!(value["C3"]["components"]["RG1"]["components"]["RQ1"]["buyervalue"], "LOT-0001");
    assert!(json.contains("\n    \"C1\""));
}

#[test]
fn test_vue_components() {
    let doc = document();
    let ctx = context();

    let viewer = render(OutputFormat::VueViewer, &doc, &ctx);
    assert!(viewer.starts_with("/**\n * VueJS components for ESDP-EDM"));
    assert!(viewer.contains("Vue.component(\"v4.0.0 - C1 - EG\""));
    assert!(viewer.contains("Vue.component(\"v4.0.0 - C3 - SC\""));

    let response = render(OutputFormat::VueResponse, &doc, &ctx);
    assert!(response.contains("Vue.component(\"v4.0.0-C1\""));
    assert!(response.contains("exp: {"));
    assert_eq!(response.matches("Vue.component(").count(), 3);
}

#[test]
fn test_vue_files_written() {
    let dir = tempfile::tempdir().unwrap();
    let names = espdxl::vue_file_names("v4.0.0");
    let doc = document();
    let ctx = context();

    for (format, name) in [
        (OutputFormat::VueModel, &names.model),
        (OutputFormat::VueViewer, &names.viewer),
        (OutputFormat::VueResponse, &names.response),
    ] {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        OutputEmitter::from_format(format).render(&doc, &ctx, &mut file).unwrap();
    }

    assert!(dir.path().join("espd_edm_v4.0.0.json").exists());
    assert!(dir.path().join("espd_v4.0.0.js").exists());
    let response = std::fs::read_to_string(dir.path().join("espd_response_v4.0.0.js")).unwrap();
    assert!(response.contains("Component - C2 - EG - Corruption"));
}

/// 繰り返しの2番目の出現を持つ選定基準シート
const REPEATED_GROUP: &[Line] = &[
    (2, "C1", "{CRITERION", &[(K::Name, "Turnover"), (K::ElementCode, "TURNOVER")]),
    (3, "RG1", "{REQUIREMENT_GROUP", &[(K::Cardinality, "1..n (1)")]),
    (4, "RQ1", "{REQUIREMENT}", &[(K::Cardinality, "1"), (K::PropertyDataType, "AMOUNT")]),
    (3, "", "REQUIREMENT_GROUP}", &[]),
    (3, "RG1", "{REQUIREMENT_GROUP", &[(K::Cardinality, "(2)")]),
    (4, "RQ1", "{REQUIREMENT}", &[(K::Cardinality, "1"), (K::PropertyDataType, "AMOUNT")]),
    (3, "", "REQUIREMENT_GROUP}", &[]),
    (2, "", "CRITERION}", &[]),
];

#[test]
fn test_vue_model_skips_repeated_occurrences() {
    let bytes = workbook(&[("SC-Turnover", REPEATED_GROUP)]).unwrap();
    let doc = ParserBuilder::new()
        .build()
        .unwrap()
        .parse(Cursor::new(bytes))
        .unwrap()
        .document;
    let ctx = context();

    let raw: serde_json::Value =
        serde_json::from_str(&render(OutputFormat::Json, &doc, &ctx)).unwrap();
    assert_eq!(raw["C1"]["components"].as_object().unwrap().len(), 2);

    let model: serde_json::Value =
        serde_json::from_str(&render(OutputFormat::VueModel, &doc, &ctx)).unwrap();
    let components = model["C1"]["components"].as_object().unwrap();
    assert_eq!(components.keys().collect::<Vec<_>>(), vec!["RG1"]);
    assert_eq!(components["RG1"]["cardinality"], "1..n");
    assert_eq!(components["RG1"]["components"]["RQ1"]["type"], "REQUIREMENT");
}

#[test]
fn test_salt_outputs() {
    let doc = document();
    let ctx = context();

    let mockup = render(OutputFormat::SaltMockup, &doc, &ctx);
    assert_eq!(mockup.matches("@startsalt").count(), 3);
    assert_eq!(mockup.matches("@endsalt").count(), 3);
    assert!(mockup.contains("Participation in a criminal organisation"));
    assert!(mockup.contains("{ () Yes | () No}"));

    let tree = render(OutputFormat::SaltTreeTable, &doc, &ctx);
    assert_eq!(tree.matches("@startsalt").count(), 2);
    assert!(tree.contains("== General yearly turnover"));
}
