//! Public API Types
//!
//! 公開APIで使用する列挙型を定義するモジュール。

/// 識別子の生成方式
///
/// 子要素のキーおよびクライテリオンのキーをどのように決めるかを指定します。
/// 文書バージョンごとに選択される戦略パラメータです。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum IdentifierPolicy {
    /// 短縮タグと出現カウンタから生成した識別子（例: `RG2`、`C14`）
    #[default]
    Generated,

    /// ワークシートのラベル列に書かれた値をそのまま使用
    ///
    /// 最新の文書バージョン（4.0.0）で使用されます。ラベルが空の場合は
    /// 生成した識別子にフォールバックします。
    Literal,
}

impl IdentifierPolicy {
    /// 文書バージョンから識別子の生成方式を選択
    ///
    /// ```rust
    /// use espdxl::IdentifierPolicy;
    ///
    /// assert_eq!(IdentifierPolicy::for_version("4.0.0"), IdentifierPolicy::Literal);
    /// assert_eq!(IdentifierPolicy::for_version("3.3.0"), IdentifierPolicy::Generated);
    /// ```
    pub fn for_version(version: &str) -> Self {
        match version.trim_start_matches('v') {
            "4.0.0" => IdentifierPolicy::Literal,
            _ => IdentifierPolicy::Generated,
        }
    }
}

/// ワークブックの種類
///
/// RequestワークブックとResponseワークブックでは、カウンタの増加規則と
/// レスポンスパスの計算有無が異なります。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum WorkbookKind {
    /// Request用ワークブック（`-request-`を含むファイル名）
    Request,

    /// Response用ワークブック（デフォルト）
    #[default]
    Response,
}

impl WorkbookKind {
    /// ファイル名からワークブックの種類を判定
    pub fn from_file_name(name: &str) -> Self {
        if name.contains("-request-") {
            WorkbookKind::Request
        } else {
            WorkbookKind::Response
        }
    }

    /// Request用ワークブックかどうか
    pub fn is_request(self) -> bool {
        self == WorkbookKind::Request
    }
}

/// 出力時のエラー処理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum EmissionMode {
    /// 欠落した属性や未定義の型を出力中のコメントとして記録（デフォルト）
    #[default]
    Permissive,

    /// 欠落した属性や未定義の型をエラーとして返す
    Strict,
}

/// シート選択方式
///
/// 解析対象のシートを選択する方法を指定します。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum SheetSelector {
    /// すべてのシートを解析（デフォルト）
    #[default]
    All,

    /// インデックス指定（0始まり）
    Index(usize),

    /// シート名指定
    Name(String),

    /// 複数のインデックス指定
    Indices(Vec<usize>),

    /// 複数のシート名指定
    Names(Vec<String>),

    /// シート名の接頭辞指定（例: `"SC-"`）
    Prefix(String),
}

/// 出力フォーマット
///
/// 文書ツリーを変換する際の出力形式を指定します。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OutputFormat {
    /// ツリー構造をそのまま反映したJSON
    Json,

    /// Vueコンポーネントが読み込むJSONモデル（繰り返しの出現を除く）
    VueModel,

    /// UBL `QualificationApplicationRequest` 文書
    UblRequest,

    /// UBL `QualificationApplicationResponse` 文書
    UblResponse,

    /// 閲覧用のVueコンポーネント
    VueViewer,

    /// 回答フォーム用のVueコンポーネント
    VueResponse,

    /// PlantUML Saltによる画面モックアップ（クライテリオンごと）
    SaltMockup,

    /// PlantUML Saltによるツリーテーブル（シートごと）
    SaltTreeTable,
}

impl OutputFormat {
    /// 出力ファイルの拡張子
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json | OutputFormat::VueModel => "json",
            OutputFormat::UblRequest | OutputFormat::UblResponse => "xml",
            OutputFormat::VueViewer | OutputFormat::VueResponse => "js",
            OutputFormat::SaltMockup | OutputFormat::SaltTreeTable => "puml",
        }
    }
}
