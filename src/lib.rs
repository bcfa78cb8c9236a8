//! espdxl - ESPD criterion workbook parser and converter
//!
//! This crate reads the ESPD criterion workbooks (one worksheet per group of
//! criteria, nesting encoded by `{TAG` / `TAG}` / `{TAG}` cells) and turns
//! them into a tree of criteria that can be emitted as JSON, UBL
//! `QualificationApplicationRequest` / `QualificationApplicationResponse`
//! documents, VueJS components or PlantUML Salt diagrams.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::fs::File;
//! use espdxl::{EmitContext, OutputEmitter, OutputFormat, ParserBuilder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Parse every worksheet of the workbook
//!     let parser = ParserBuilder::new().build()?;
//!     let outcome = parser.parse(File::open("ESPD-criterion_v4.0.0.xlsx")?)?;
//!
//!     // Worksheets with broken nesting are reported, the rest is usable
//!     for failure in &outcome.failures {
//!         eprintln!("{}: {}", failure.sheet, failure.error);
//!     }
//!
//!     // Write the UBL request document
//!     let ctx = EmitContext::new("4.0.0")?;
//!     let output = File::create("ESPD_Request.xml")?;
//!     let mut writer = std::io::BufWriter::new(output);
//!     OutputEmitter::from_format(OutputFormat::UblRequest)
//!         .render(&outcome.document, &ctx, &mut writer)?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Custom Configuration
//!
//! ```rust,no_run
//! use std::path::Path;
//! use espdxl::{IdentifierPolicy, ParserBuilder, SheetSelector, WorkbookKind};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let parser = ParserBuilder::new()
//!         .with_sheet_selector(SheetSelector::Prefix("SC-".to_string())) // selection criteria only
//!         .with_workbook_kind(WorkbookKind::Request)
//!         .with_identifier_policy(IdentifierPolicy::Literal)
//!         .with_scan_range(1, 17)
//!         .build()?;
//!
//!     // The document version is taken from the `_v<version>` file name suffix
//!     let outcome = parser.parse_path(Path::new("ESPD-criterion-request-_v4.0.0.xlsx"))?;
//!     println!("{} criteria", outcome.document.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Reports
//!
//! The [`report`] module holds the workbook checks (label and path
//! findings, structures, code lists, UUIDs). [`codelist`] converts code list
//! workbooks to genericode and [`ea`] converts EA repository tables to JSON.
//! The eCERTIS lookup and external code list downloads go through the
//! [`remote`] fetcher, one request at a time.

pub mod api;
pub mod builder;
pub mod codelist;
pub mod constants;
pub mod document;
pub mod ea;
pub mod error;
pub mod output;
pub mod parser;
pub mod remote;
pub mod report;
pub mod security;
pub mod types;

// 公開API
pub use api::{EmissionMode, IdentifierPolicy, OutputFormat, SheetSelector, WorkbookKind};
pub use builder::{
    version_from_path, CriterionParser, ParseOutcome, ParserBuilder, SheetFailure,
};
pub use constants::{DEFAULT_SCAN_RANGE, SUPPORTED_VERSIONS};
pub use document::{Criterion, Document, Node};
pub use error::EspdError;
pub use output::{vue_file_names, EmitContext, OutputEmitter};
pub use parser::{scan_sheet, RowClassifier, RowEvent, SheetScan};
pub use security::SecurityConfig;
pub use types::{AttributeKey, CellValue, Row, TagName, TagRole, Worksheet};
