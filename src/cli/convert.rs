use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::Parser;
use espdxl::{vue_file_names, Document, EmissionMode, EmitContext, OutputEmitter, OutputFormat};

use super::{create_output, WorkbookArgs};

#[derive(Debug, Parser)]
#[command(about = "Convert criterion workbooks")]
pub struct Convert {
    /// Output to produce
    #[arg(value_enum)]
    target: Target,

    /// Document version used when the file name carries none
    #[arg(long, default_value = "4.0.0")]
    svid: String,

    /// Directory for output files (stdout when omitted, except for Vue)
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Fail on missing attributes instead of skipping the node
    #[arg(long)]
    strict: bool,

    #[command(flatten)]
    workbooks: WorkbookArgs,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum, PartialEq, Eq)]
enum Target {
    /// Criterion tree as JSON
    Json,
    /// JSON model, viewer and response components for VueJS
    Vue,
    /// PlantUML Salt mockup for each criterion
    Salt,
    /// PlantUML tree table for each worksheet
    TreeTable,
}

impl Target {
    fn formats(self) -> &'static [OutputFormat] {
        match self {
            Target::Json => &[OutputFormat::Json],
            Target::Vue => &[
                OutputFormat::VueModel,
                OutputFormat::VueViewer,
                OutputFormat::VueResponse,
            ],
            Target::Salt => &[OutputFormat::SaltMockup],
            Target::TreeTable => &[OutputFormat::SaltTreeTable],
        }
    }
}

impl Convert {
    pub fn run(self) -> anyhow::Result<()> {
        for path in self.workbooks.files() {
            let outcome = self.workbooks.parse(path)?;
            let document = outcome.document;
            let version = document.version.clone().unwrap_or_else(|| self.svid.clone());
            let mode = if self.strict {
                EmissionMode::Strict
            } else {
                EmissionMode::Permissive
            };
            let ctx = EmitContext::new(&version)
                .with_context(|| format!("cannot convert {}", path.display()))?
                .with_mode(mode);

            for format in self.target.formats() {
                self.emit(path, &document, &ctx, *format)?;
            }
        }
        Ok(())
    }

    fn emit(
        &self,
        path: &Path,
        document: &Document,
        ctx: &EmitContext,
        format: OutputFormat,
    ) -> anyhow::Result<()> {
        let emitter = OutputEmitter::from_format(format);
        let out_dir = match (&self.out_dir, self.target) {
            (Some(dir), _) => dir.clone(),
            (None, Target::Vue) => PathBuf::from("."),
            (None, _) => {
                let stdout = io::stdout();
                let mut out = stdout.lock();
                emitter.render(document, ctx, &mut out)?;
                return Ok(());
            }
        };

        let mut writer = create_output(&out_dir, &self.file_name(path, ctx, format))?;
        emitter.render(document, ctx, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    fn file_name(&self, path: &Path, ctx: &EmitContext, format: OutputFormat) -> String {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("criterion");
        let names = vue_file_names(&format!("v{}", ctx.version));
        match (self.target, format) {
            (Target::Vue, OutputFormat::VueModel) => names.model,
            (Target::Vue, OutputFormat::VueViewer) => names.viewer,
            (Target::Vue, _) => names.response,
            (Target::TreeTable, _) => format!("{stem}_treetable.{}", format.extension()),
            _ => format!("{stem}.{}", format.extension()),
        }
    }
}
