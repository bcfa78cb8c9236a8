//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use thiserror::Error;

/// espdxlクレート全体で使用するエラー型
///
/// ワークブックの読み込み、タグ構造の解析、各形式への出力処理中に発生する
/// すべてのエラーを統一的に扱うために使用されます。
///
/// # エラーの種類
///
/// - `Io` / `Parse` / `Zip` / `Json` / `Xml`: 下位ライブラリ由来のエラー
/// - `Config`: 設定の検証に失敗したエラー
/// - `SecurityViolation`: 入力サイズやアーカイブ構造の制限違反
/// - `Http`: eCERTISや外部コードリストへのHTTPアクセスの失敗
/// - `UnexpectedClose` 〜 `OrphanElement`: タグの入れ子構造の違反（シート単位で中断）
/// - `MissingAttribute` / `UnsupportedDataType`: 厳格モードでの出力エラー
///
/// # 使用例
///
/// ```rust,no_run
/// use espdxl::EspdError;
/// use std::fs::File;
///
/// fn open_workbook(path: &str) -> Result<(), EspdError> {
///     let _file = File::open(path)?; // Ioエラーが自動的に変換される
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum EspdError {
    /// I/O操作中に発生したエラー
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ワークブックの解析中に発生したエラー（calamine由来）
    #[error("Failed to parse workbook: {0}")]
    Parse(#[from] calamine::Error),

    /// ZIPアーカイブの解析エラー
    #[error("ZIP archive error: {0}")]
    Zip(String),

    /// JSONの読み書きエラー
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// XMLの書き出しエラー
    #[error("XML error: {0}")]
    Xml(String),

    /// 設定の検証に失敗したエラー
    ///
    /// `ParserBuilder::build()`や出力コンテキストの生成時に、無効な設定が
    /// 検出された場合に発生します。
    ///
    /// ```rust,no_run
    /// use espdxl::{EspdError, ParserBuilder};
    ///
    /// let result = ParserBuilder::new().with_scan_range(10, 2).build();
    /// if let Err(EspdError::Config(msg)) = result {
    ///     println!("設定エラー: {}", msg);
    /// }
    /// ```
    #[error("Configuration error: {0}")]
    Config(String),

    /// セキュリティ制限に違反したエラー
    #[error("Security violation: {0}")]
    SecurityViolation(String),

    /// HTTPアクセスの失敗（接続エラー、タイムアウト、4xx/5xx応答）
    #[error("HTTP request to {url} failed: {message}")]
    Http {
        /// 要求したURL
        url: String,
        /// 失敗の内容
        message: String,
    },

    /// 開いている要素がない状態で終了タグが現れた
    #[error("Unexpected closing tag '{tag}' at sheet '{sheet}', row {row}")]
    UnexpectedClose {
        /// シート名
        sheet: String,
        /// 行番号（1始まり）
        row: u32,
        /// 終了タグ名
        tag: String,
    },

    /// 終了タグが直近の開始タグと一致しない
    #[error("Mismatched closing tag at sheet '{sheet}', row {row}: expected '{expected}', found '{found}'")]
    MismatchedClose {
        /// シート名
        sheet: String,
        /// 行番号（1始まり）
        row: u32,
        /// 閉じられるべきタグ名
        expected: String,
        /// 実際の終了タグ名
        found: String,
    },

    /// シート末尾で閉じられていない要素が残っている
    #[error("Unclosed element '{tag}' opened at sheet '{sheet}', row {row}")]
    UnclosedElement {
        /// シート名
        sheet: String,
        /// 開始タグの行番号
        row: u32,
        /// 開始タグ名
        tag: String,
    },

    /// CRITERIONの内側で別のCRITERIONが開始された
    #[error("Nested CRITERION at sheet '{sheet}', row {row}")]
    NestedCriterion {
        /// シート名
        sheet: String,
        /// 行番号（1始まり）
        row: u32,
    },

    /// CRITERIONの外側に要素が現れた
    #[error("Element '{tag}' outside of any CRITERION at sheet '{sheet}', row {row}")]
    OrphanElement {
        /// シート名
        sheet: String,
        /// 行番号（1始まり）
        row: u32,
        /// タグ名
        tag: String,
    },

    /// 出力に必要な属性が存在しない（厳格モード）
    #[error("Missing attribute '{attribute}' on node {node}")]
    MissingAttribute {
        /// ノードの識別子
        node: String,
        /// 属性キー
        attribute: String,
    },

    /// 未定義のPropertyDataType（厳格モード）
    #[error("PropertyDataType '{data_type}' not defined (node {node})")]
    UnsupportedDataType {
        /// ノードの識別子
        node: String,
        /// PropertyDataTypeの値
        data_type: String,
    },
}

impl EspdError {
    /// 入れ子構造の違反かどうか
    ///
    /// 構造エラーは該当シートのみを中断し、他のシートの処理は継続されます。
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            EspdError::UnexpectedClose { .. }
                | EspdError::MismatchedClose { .. }
                | EspdError::UnclosedElement { .. }
                | EspdError::NestedCriterion { .. }
                | EspdError::OrphanElement { .. }
        )
    }
}
