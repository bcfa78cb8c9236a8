use std::{io::Write, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use espdxl::{EmissionMode, EmitContext, OutputEmitter, OutputFormat};

use super::{create_output, WorkbookArgs};

const REQUEST_FILE: &str = "ESPD_Request.xml";
const RESPONSE_FILE: &str = "ESPD_Response.xml";

#[derive(Debug, Parser)]
#[command(about = "Generate ESPD Request and Response XML files")]
pub struct Espd {
    /// ESPD-EDM version written to the documents
    #[arg(long, default_value = "4.0.0")]
    svid: String,

    /// Directory for the XML files
    #[arg(long, value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Fail on missing attributes and unknown data types
    #[arg(long)]
    strict: bool,

    #[command(flatten)]
    workbooks: WorkbookArgs,
}

impl Espd {
    pub fn run(self) -> anyhow::Result<()> {
        let mode = if self.strict {
            EmissionMode::Strict
        } else {
            EmissionMode::Permissive
        };
        let ctx = EmitContext::new(&self.svid)?.with_mode(mode);
        let prefixed = self.workbooks.files().len() > 1;

        for path in self.workbooks.files() {
            let outcome = self.workbooks.parse(path)?;
            let prefix = if prefixed {
                let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
                format!("{stem}_")
            } else {
                String::new()
            };

            for (format, name) in [
                (OutputFormat::UblRequest, REQUEST_FILE),
                (OutputFormat::UblResponse, RESPONSE_FILE),
            ] {
                let mut writer = create_output(&self.out_dir, &format!("{prefix}{name}"))?;
                OutputEmitter::from_format(format)
                    .render(&outcome.document, &ctx, &mut writer)
                    .with_context(|| format!("cannot write {name} for {}", path.display()))?;
                writer.flush()?;
            }
        }
        Ok(())
    }
}
