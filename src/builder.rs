//! Builder Module
//!
//! Fluent Builder APIを提供し、`CriterionParser`インスタンスを段階的に構築する。

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use tracing::{info, warn};

use crate::api::{IdentifierPolicy, SheetSelector, WorkbookKind};
use crate::constants::DEFAULT_SCAN_RANGE;
use crate::document::Document;
use crate::error::EspdError;
use crate::parser::{scan_sheet, RowClassifier, RunState, SheetScan, TreeBuilder, WorkbookReader};
use crate::security::SecurityConfig;
use crate::types::Worksheet;

/// 解析処理の設定を保持する内部構造体
#[derive(Debug, Clone)]
pub(crate) struct ParserConfig {
    /// タグを探索する列範囲（両端を含む）
    pub scan_range: (u32, u32),

    /// 識別子の生成方式
    pub identifier_policy: IdentifierPolicy,

    /// Request / Response の別
    pub workbook_kind: WorkbookKind,

    /// シート選択方式
    pub sheet_selector: SheetSelector,

    /// セキュリティ制限
    pub security: SecurityConfig,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            scan_range: DEFAULT_SCAN_RANGE,
            identifier_policy: IdentifierPolicy::Generated,
            workbook_kind: WorkbookKind::Response,
            sheet_selector: SheetSelector::All,
            security: SecurityConfig::default(),
        }
    }
}

/// Fluent Builder APIを提供する構造体
///
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみを
/// オーバーライドできます。
///
/// # 使用例
///
/// ```rust,no_run
/// use espdxl::{IdentifierPolicy, ParserBuilder, WorkbookKind};
///
/// # fn main() -> Result<(), espdxl::EspdError> {
/// let parser = ParserBuilder::new()
///     .with_identifier_policy(IdentifierPolicy::Literal)
///     .with_workbook_kind(WorkbookKind::Request)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ParserBuilder {
    config: ParserConfig,
}

impl ParserBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - 探索列範囲: 1..=17
    /// - 識別子: 生成（`Generated`）
    /// - ワークブック: Response
    /// - シート選択: すべてのシート
    pub fn new() -> Self {
        Self::default()
    }

    /// タグを探索する列範囲を指定する
    ///
    /// # 引数
    ///
    /// * `first` - 最初の列（論理列インデックス、1以上）
    /// * `last` - 最後の列（`first`以上）
    pub fn with_scan_range(mut self, first: u32, last: u32) -> Self {
        self.config.scan_range = (first, last);
        self
    }

    /// 識別子の生成方式を指定する
    pub fn with_identifier_policy(mut self, policy: IdentifierPolicy) -> Self {
        self.config.identifier_policy = policy;
        self
    }

    /// ワークブックの種類を指定する
    pub fn with_workbook_kind(mut self, kind: WorkbookKind) -> Self {
        self.config.workbook_kind = kind;
        self
    }

    /// 解析対象のシートを選択する
    pub fn with_sheet_selector(mut self, selector: SheetSelector) -> Self {
        self.config.sheet_selector = selector;
        self
    }

    /// セキュリティ制限を指定する
    pub fn with_security(mut self, security: SecurityConfig) -> Self {
        self.config.security = security;
        self
    }

    /// 設定を検証して`CriterionParser`を構築する
    ///
    /// # 戻り値
    ///
    /// * `Ok(CriterionParser)` - 設定が有効な場合
    /// * `Err(EspdError::Config)` - 列範囲やセキュリティ設定が無効な場合
    pub fn build(self) -> Result<CriterionParser, EspdError> {
        let (first, last) = self.config.scan_range;
        if first == 0 {
            return Err(EspdError::Config(
                "Invalid scan range: first column must be at least 1".to_string(),
            ));
        }
        if first > last {
            return Err(EspdError::Config(format!(
                "Invalid scan range: first column ({}) > last column ({})",
                first, last
            )));
        }
        self.config.security.validate()?;

        Ok(CriterionParser {
            config: self.config,
        })
    }
}

/// 構造エラーで処理を中断したシート
#[derive(Debug)]
pub struct SheetFailure {
    pub sheet: String,
    pub error: EspdError,
}

/// 解析結果
///
/// 失敗したシートがあっても、他のシートから構築した文書は有効です。
#[derive(Debug)]
pub struct ParseOutcome {
    pub document: Document,
    pub failures: Vec<SheetFailure>,
}

impl ParseOutcome {
    /// すべてのシートを解析できたか
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// 解析処理のファサード
///
/// # 使用例
///
/// ```rust,no_run
/// use espdxl::ParserBuilder;
/// use std::fs::File;
///
/// # fn main() -> Result<(), espdxl::EspdError> {
/// let parser = ParserBuilder::new().build()?;
/// let outcome = parser.parse(File::open("ESPD-criterion_v3.3.0.xlsx")?)?;
/// for failure in &outcome.failures {
///     eprintln!("{}: {}", failure.sheet, failure.error);
/// }
/// println!("{} criteria", outcome.document.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CriterionParser {
    config: ParserConfig,
}

impl CriterionParser {
    pub fn workbook_kind(&self) -> WorkbookKind {
        self.config.workbook_kind
    }

    pub fn identifier_policy(&self) -> IdentifierPolicy {
        self.config.identifier_policy
    }

    fn classifier(&self) -> RowClassifier {
        let (first, last) = self.config.scan_range;
        RowClassifier::new(first, last)
    }

    /// 選択されたシートを読み込む
    pub fn read_worksheets<R: Read + Seek>(&self, reader: R) -> Result<Vec<Worksheet>, EspdError> {
        let mut workbook = WorkbookReader::open(reader, &self.config.security)?;
        let names = workbook.select_sheets(&self.config.sheet_selector)?;
        names.iter().map(|name| workbook.read_sheet(name)).collect()
    }

    /// シートを順に走査する
    ///
    /// クライテリオン番号はシートをまたいで連番になります。
    pub fn scan_worksheets(&self, sheets: &[Worksheet]) -> Vec<SheetScan> {
        let classifier = self.classifier();
        let mut run = RunState::new();
        sheets
            .iter()
            .map(|sheet| scan_sheet(sheet, &classifier, self.config.workbook_kind, &mut run))
            .collect()
    }

    /// 読み込み済みのシートから文書を構築する
    ///
    /// 構造エラーのあるシートは文書に含めず、`failures`に記録します。
    pub fn parse_worksheets(&self, sheets: &[Worksheet]) -> ParseOutcome {
        let mut document = Document::new();
        let mut failures = Vec::new();

        for scan in self.scan_worksheets(sheets) {
            if let Some(error) = scan.error {
                failures.push(SheetFailure {
                    sheet: scan.sheet,
                    error,
                });
                continue;
            }

            let tree = TreeBuilder::new(&scan.sheet, self.config.identifier_policy).build(&scan.events);
            info!(sheet = %scan.sheet, criteria = tree.criteria.len(), "worksheet parsed");
            for lot in &tree.lots {
                document.add_lot(lot);
            }
            for criterion in tree.criteria {
                let key = criterion.key().to_string();
                if document.criteria.contains_key(&key) {
                    warn!(sheet = %scan.sheet, key = %key, "duplicate criterion key replaced");
                }
                document.criteria.insert(key, criterion);
            }
        }

        ParseOutcome { document, failures }
    }

    /// ワークブックを解析する
    ///
    /// # 戻り値
    ///
    /// * `Ok(ParseOutcome)` - 文書と、失敗したシートの一覧
    /// * `Err(EspdError)` - ワークブック自体を読み込めない場合
    pub fn parse<R: Read + Seek>(&self, reader: R) -> Result<ParseOutcome, EspdError> {
        let sheets = self.read_worksheets(reader)?;
        Ok(self.parse_worksheets(&sheets))
    }

    /// ファイルを解析し、ファイル名から文書バージョンを設定する
    pub fn parse_path(&self, path: &Path) -> Result<ParseOutcome, EspdError> {
        info!(path = %path.display(), kind = ?self.config.workbook_kind, "parsing workbook");
        let mut outcome = self.parse(File::open(path)?)?;
        outcome.document.version = version_from_path(path);
        Ok(outcome)
    }
}

/// ファイル名の`_v<version>`接尾辞から文書バージョンを取得
///
/// ```rust
/// use espdxl::version_from_path;
/// use std::path::Path;
///
/// assert_eq!(
///     version_from_path(Path::new("data/ESPD-criterion_v4.0.0.xlsx")).as_deref(),
///     Some("4.0.0")
/// );
/// assert_eq!(version_from_path(Path::new("criteria.xlsx")), None);
/// ```
pub fn version_from_path(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let (_, version) = stem.rsplit_once("_v")?;
    if version.is_empty() {
        None
    } else {
        Some(version.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Row;

    fn worksheet(name: &str, rows: Vec<Row>) -> Worksheet {
        let mut all = vec![Row::new(2).with_cell(18, "Name").with_cell(19, "Cardinality")];
        all.extend(rows);
        Worksheet {
            name: name.to_string(),
            rows: all,
        }
    }

    fn criterion_rows(start: u32, name: &str) -> Vec<Row> {
        vec![
            Row::new(start).with_cell(2, "{CRITERION").with_cell(18, name),
            Row::new(start + 1).with_cell(3, "{LEGISLATION}"),
            Row::new(start + 2).with_cell(2, "CRITERION}"),
        ]
    }

    #[test]
    fn test_parser_builder_new() {
        let builder = ParserBuilder::new();
        assert_eq!(builder.config.scan_range, (1, 17));
        assert_eq!(builder.config.identifier_policy, IdentifierPolicy::Generated);
        assert_eq!(builder.config.workbook_kind, WorkbookKind::Response);
        assert_eq!(builder.config.sheet_selector, SheetSelector::All);
    }

    #[test]
    fn test_builder_method_chaining() {
        let builder = ParserBuilder::new()
            .with_scan_range(2, 12)
            .with_identifier_policy(IdentifierPolicy::Literal)
            .with_workbook_kind(WorkbookKind::Request)
            .with_sheet_selector(SheetSelector::Prefix("EG".to_string()));

        assert_eq!(builder.config.scan_range, (2, 12));
        assert_eq!(builder.config.identifier_policy, IdentifierPolicy::Literal);
        assert!(builder.config.workbook_kind.is_request());
        assert!(matches!(
            builder.config.sheet_selector,
            SheetSelector::Prefix(ref p) if p == "EG"
        ));
    }

    #[test]
    fn test_build_with_invalid_scan_range() {
        match ParserBuilder::new().with_scan_range(5, 3).build() {
            Err(EspdError::Config(msg)) => assert!(msg.contains("first column")),
            other => panic!("Expected Config error, got {:?}", other),
        }
        assert!(ParserBuilder::new().with_scan_range(0, 3).build().is_err());
    }

    #[test]
    fn test_build_with_invalid_security() {
        let security = SecurityConfig {
            max_file_count: 0,
            ..SecurityConfig::default()
        };
        assert!(matches!(
            ParserBuilder::new().with_security(security).build(),
            Err(EspdError::Config(_))
        ));
    }

    #[test]
    fn test_parse_worksheets_numbers_across_sheets() {
        let parser = ParserBuilder::new().build().unwrap();
        let sheets = vec![
            worksheet("EG-Convictions", criterion_rows(3, "Crime")),
            worksheet("SC-Suitability", criterion_rows(3, "Enrolment")),
        ];

        let outcome = parser.parse_worksheets(&sheets);

        assert!(outcome.is_complete());
        let keys: Vec<&String> = outcome.document.criteria.keys().collect();
        assert_eq!(keys, vec!["C1", "C2"]);
        assert_eq!(outcome.document.criteria["C2"].tag, "C2 - SC");
        assert_eq!(outcome.document.criteria["C2"].name(), Some("Enrolment"));
    }

    #[test]
    fn test_failed_sheet_keeps_other_sheets() {
        let parser = ParserBuilder::new().build().unwrap();
        let mut broken = criterion_rows(3, "Broken");
        broken.pop();
        let sheets = vec![
            worksheet("EG-Broken", broken),
            worksheet("EG-Good", criterion_rows(3, "Good")),
        ];

        let outcome = parser.parse_worksheets(&sheets);

        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].sheet, "EG-Broken");
        assert!(outcome.failures[0].error.is_structural());
        assert_eq!(outcome.document.len(), 1);
        assert!(outcome.document.get("C2").is_some());
    }

    #[test]
    fn test_version_from_path() {
        assert_eq!(
            version_from_path(Path::new("ESPD-criterion-request-_v3.3.0.xlsx")).as_deref(),
            Some("3.3.0")
        );
        assert_eq!(version_from_path(Path::new("ESPD_v.xlsx")), None);
        assert_eq!(version_from_path(Path::new("plain.xlsx")), None);
    }

    #[test]
    fn test_parse_invalid_input() {
        let parser = ParserBuilder::new().build().unwrap();
        let result = parser.parse(std::io::Cursor::new(Vec::<u8>::new()));
        assert!(result.is_err());
    }
}
