//! Output Format Module
//!
//! 文書ツリーを各出力形式に変換するエミッター群と、その切り替えを提供するモジュール。

mod json;
mod salt;
mod ubl;
mod vue;
pub mod xml;

use chrono::{DateTime, FixedOffset, Local};
use std::io::Write;
use uuid::Uuid;

use crate::api::{EmissionMode, OutputFormat};
use crate::constants::SUPPORTED_VERSIONS;
use crate::document::Document;
use crate::error::EspdError;

pub use json::{model_view, JsonEmitter, VueModelEmitter};
pub use salt::{SaltMockupEmitter, SaltTreeTableEmitter};
pub use ubl::{request_document, response_document, UblRequestEmitter, UblResponseEmitter};
pub use vue::{vue_file_names, VueFileNames, VueResponseEmitter, VueViewerEmitter};

/// 出力時のコンテキスト
///
/// 文書バージョン、エラー処理方式、発行日時、文書IDをまとめて保持します。
/// テストでは`with_issued_at`と`with_ids`で固定値を注入できます。
#[derive(Debug, Clone)]
pub struct EmitContext {
    /// 文書バージョン（例: `3.3.0`）
    pub version: String,
    pub mode: EmissionMode,
    pub issued_at: DateTime<FixedOffset>,
    pub document_id: String,
    pub document_uuid: String,
}

impl EmitContext {
    /// 現在時刻とランダムなUUIDでコンテキストを生成
    ///
    /// # 引数
    ///
    /// * `version` - 文書バージョン（先頭の`v`は無視）
    ///
    /// # 戻り値
    ///
    /// * `Err(EspdError::Config)` - サポートしていないバージョンの場合
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use espdxl::EmitContext;
    ///
    /// let ctx = EmitContext::new("v4.0.0").unwrap();
    /// assert_eq!(ctx.version, "4.0.0");
    /// assert!(EmitContext::new("2.1.1").is_err());
    /// ```
    pub fn new(version: &str) -> Result<Self, EspdError> {
        let version = version.trim().trim_start_matches('v');
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(EspdError::Config(format!(
                "Unsupported document version '{}' (supported: {})",
                version,
                SUPPORTED_VERSIONS.join(", ")
            )));
        }

        let now = Local::now();
        Ok(Self {
            version: version.to_string(),
            mode: EmissionMode::default(),
            issued_at: now.with_timezone(now.offset()),
            document_id: Uuid::new_v4().to_string(),
            document_uuid: Uuid::new_v4().to_string(),
        })
    }

    pub fn with_mode(mut self, mode: EmissionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_issued_at(mut self, issued_at: DateTime<FixedOffset>) -> Self {
        self.issued_at = issued_at;
        self
    }

    /// 文書IDとUUIDを指定
    pub fn with_ids(mut self, document_id: impl Into<String>, document_uuid: impl Into<String>) -> Self {
        self.document_id = document_id.into();
        self.document_uuid = document_uuid.into();
        self
    }
}

/// 出力エミッター（Strategy Pattern）
///
/// 各出力形式をenumとして表現します。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEmitter {
    Json,
    VueModel,
    UblRequest,
    UblResponse,
    VueViewer,
    VueResponse,
    SaltMockup,
    SaltTreeTable,
}

impl OutputEmitter {
    /// 出力フォーマットからエミッターを生成
    pub fn from_format(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => OutputEmitter::Json,
            OutputFormat::VueModel => OutputEmitter::VueModel,
            OutputFormat::UblRequest => OutputEmitter::UblRequest,
            OutputFormat::UblResponse => OutputEmitter::UblResponse,
            OutputFormat::VueViewer => OutputEmitter::VueViewer,
            OutputFormat::VueResponse => OutputEmitter::VueResponse,
            OutputFormat::SaltMockup => OutputEmitter::SaltMockup,
            OutputFormat::SaltTreeTable => OutputEmitter::SaltTreeTable,
        }
    }

    /// 文書を指定された形式で出力する
    ///
    /// # 引数
    ///
    /// * `doc` - 出力する文書
    /// * `ctx` - バージョンや発行日時などの出力コンテキスト
    /// * `writer` - 出力先のライター
    ///
    /// # 戻り値
    ///
    /// * `Ok(())` - 出力に成功した場合
    /// * `Err(EspdError)` - 書き込みエラー、または厳格モードでの属性欠落
    pub fn render<W: Write>(
        &self,
        doc: &Document,
        ctx: &EmitContext,
        writer: &mut W,
    ) -> Result<(), EspdError> {
        match self {
            OutputEmitter::Json => JsonEmitter.render(doc, writer),
            OutputEmitter::VueModel => VueModelEmitter.render(doc, writer),
            OutputEmitter::UblRequest => UblRequestEmitter.render(doc, ctx, writer),
            OutputEmitter::UblResponse => UblResponseEmitter.render(doc, ctx, writer),
            OutputEmitter::VueViewer => VueViewerEmitter.render(doc, ctx, writer),
            OutputEmitter::VueResponse => VueResponseEmitter.render(doc, ctx, writer),
            OutputEmitter::SaltMockup => SaltMockupEmitter.render(doc, writer),
            OutputEmitter::SaltTreeTable => SaltTreeTableEmitter.render(doc, writer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_versions() {
        let ctx = EmitContext::new(" v3.3.0 ").unwrap();
        assert_eq!(ctx.version, "3.3.0");
        assert_eq!(ctx.mode, EmissionMode::Permissive);
        assert_ne!(ctx.document_id, ctx.document_uuid);

        let err = EmitContext::new("9.9.9").unwrap_err();
        assert!(matches!(err, EspdError::Config(_)));
    }

    #[test]
    fn test_context_overrides() {
        let ctx = EmitContext::new("4.0.0")
            .unwrap()
            .with_mode(EmissionMode::Strict)
            .with_ids("id", "uuid");
        assert_eq!(ctx.mode, EmissionMode::Strict);
        assert_eq!(ctx.document_id, "id");
        assert_eq!(ctx.document_uuid, "uuid");
    }

    #[test]
    fn test_from_format() {
        assert_eq!(OutputEmitter::from_format(OutputFormat::Json), OutputEmitter::Json);
        assert_eq!(
            OutputEmitter::from_format(OutputFormat::SaltTreeTable),
            OutputEmitter::SaltTreeTable
        );
    }

    #[test]
    fn test_render_dispatch_json() {
        let ctx = EmitContext::new("3.3.0").unwrap();
        let mut out = Vec::new();
        OutputEmitter::Json.render(&Document::new(), &ctx, &mut out).unwrap();
        assert_eq!(out, b"{}\n");
    }
}
