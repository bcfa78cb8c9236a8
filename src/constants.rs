//! Constants Module
//!
//! ワークブックの解釈と出力に使用する固定テーブル。
//! 名前空間マップ、欠番となるクライテリオン番号、コードリストのバージョン表を保持する。

/// シート名の接頭辞 → パスの名前空間マーカー（先頭から順に照合）
pub const NAMESPACE_MAP: [(&str, &str); 5] = [
    ("EG-", "_EG_"),
    ("SC-", "_SC_"),
    ("SC_", "_SC_"),
    ("OTHER-", "_OT_"),
    ("OTHER.", "_OT_"),
];

/// 採番しないクライテリオン番号
pub const INVALID_CRITERION: [u32; 3] = [33, 62, 64];

/// タグを探索する列範囲の既定値
pub const DEFAULT_SCAN_RANGE: (u32, u32) = (1, 17);

/// ロットが指定されていない場合のロット識別子
pub const DEFAULT_LOT: &str = "LOT-0000";

/// サポートしている文書バージョン
pub const SUPPORTED_VERSIONS: [&str; 2] = ["4.0.0", "3.3.0"];

/// シート名から名前空間マーカーを取得
///
/// 一致する接頭辞がない場合は空文字列を返します。
pub fn namespace_for_sheet(sheet: &str) -> &'static str {
    NAMESPACE_MAP
        .iter()
        .find(|(prefix, _)| sheet.starts_with(prefix))
        .map(|(_, ns)| *ns)
        .unwrap_or("")
}

/// 欠番かどうか
pub fn is_invalid_criterion(n: u32) -> bool {
    INVALID_CRITERION.contains(&n)
}

/// コードリストの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeList {
    AccessRight,
    Country,
    Criterion,
    Currency,
    DocRefContentType,
    EconomicOperatorSize,
    EoRoleType,
    Language,
    Occupation,
    EoidType,
    FinancialRatioType,
    PropertyGroupType,
    CriterionElementType,
    ResponseDataType,
    BooleanGuiControlType,
    ProfileExecutionId,
    ProcedureCode,
}

/// コードリストを参照する要素に付与する属性値
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeListAttrs {
    pub list_id: String,
    pub list_agency_id: &'static str,
    pub list_version_id: String,
}

impl CodeListAttrs {
    /// `listID` / `listAgencyID` / `listVersionID` の組
    pub fn as_pairs(&self) -> [(&'static str, &str); 3] {
        [
            ("listID", self.list_id.as_str()),
            ("listAgencyID", self.list_agency_id),
            ("listVersionID", self.list_version_id.as_str()),
        ]
    }
}

const AUTHORITY: &str = "http://publications.europa.eu/resource/authority/";

/// 外部（Publications Office）リストのバージョン
fn authority_version(version: &str, list: CodeList) -> Option<&'static str> {
    let v = match (version, list) {
        ("4.0.0", CodeList::AccessRight) => "20240612-0",
        ("4.0.0", CodeList::Country) => "20240925-0",
        ("4.0.0", CodeList::Criterion) => "20240612-0",
        ("4.0.0", CodeList::Currency) => "20220928-0",
        ("4.0.0", CodeList::DocRefContentType) => "20220928-0",
        ("4.0.0", CodeList::EconomicOperatorSize) => "20240612-0",
        ("4.0.0", CodeList::EoRoleType) => "20211208-0",
        ("4.0.0", CodeList::Language) => "20240925-0",
        ("4.0.0", CodeList::Occupation) => "20221214-0",
        ("3.3.0", CodeList::AccessRight) => "20220316-0",
        ("3.3.0", CodeList::Country) => "20220928-0",
        ("3.3.0", CodeList::Criterion) => "20230315-0",
        ("3.3.0", CodeList::Currency) => "20220928-0",
        ("3.3.0", CodeList::DocRefContentType) => "20220316-0",
        ("3.3.0", CodeList::EconomicOperatorSize) => "20240612-0",
        ("3.3.0", CodeList::EoRoleType) => "20211208-0",
        ("3.3.0", CodeList::Language) => "20220928-0",
        ("3.3.0", CodeList::Occupation) => "20221214-0",
        _ => return None,
    };
    Some(v)
}

/// 文書バージョンとコードリストから属性値を取得
///
/// # 戻り値
///
/// 未対応のバージョンの場合は`None`
pub fn code_list_attrs(version: &str, list: CodeList) -> Option<CodeListAttrs> {
    if !SUPPORTED_VERSIONS.contains(&version) {
        return None;
    }

    let external = |name: &str, agency: &'static str| {
        authority_version(version, list).map(|v| CodeListAttrs {
            list_id: format!("{AUTHORITY}{name}"),
            list_agency_id: agency,
            list_version_id: v.to_string(),
        })
    };
    let technical = |id: &str| {
        Some(CodeListAttrs {
            list_id: id.to_string(),
            list_agency_id: "OP",
            list_version_id: version.to_string(),
        })
    };

    match list {
        CodeList::AccessRight => external("access-right", "OP"),
        CodeList::Country => external("country", "OP"),
        CodeList::Criterion => external("criterion", "OP"),
        CodeList::Currency => external("currency", "OP"),
        CodeList::DocRefContentType => external("docrefcontent-type", "OP"),
        CodeList::EconomicOperatorSize => external("economic-operator-size", "OP"),
        CodeList::EoRoleType => external("eo-role-type", "OP"),
        CodeList::Language => external("language", "OP"),
        CodeList::Occupation => external("occupation", "EMPL"),
        CodeList::EoidType => technical("eoid-type"),
        CodeList::FinancialRatioType => technical("financial-ratio-type"),
        CodeList::PropertyGroupType => technical("property-group-type"),
        CodeList::CriterionElementType => technical("criterion-element-type"),
        CodeList::ResponseDataType => technical("response-data-type"),
        CodeList::BooleanGuiControlType => technical("boolean-gui-control-type"),
        CodeList::ProfileExecutionId => technical("profile-execution-id"),
        CodeList::ProcedureCode => Some(CodeListAttrs {
            list_id: "Dummy_procurement-procedure-type".to_string(),
            list_agency_id: "OP",
            list_version_id: "yyyymmdd-0".to_string(),
        }),
    }
}

/// JavaScriptのプロパティ名として使える文字列に変換
///
/// `-` → `__`、`/` → `$`、`@` → `$$`
pub fn string_to_property(s: &str) -> String {
    s.replace('-', "__").replace('/', "$").replace('@', "$$")
}
