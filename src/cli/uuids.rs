use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
};

use anyhow::Context;
use clap::Parser;
use espdxl::report::{self, UuidIndex};

use super::terminal::Colorize;
use super::{heading, WorkbookArgs};

#[derive(Debug, Parser)]
#[command(about = "UUID reports for criterion workbooks")]
pub struct Uuids {
    #[command(subcommand)]
    report: Report,
}

#[derive(Debug, clap::Subcommand)]
enum Report {
    /// INDICATOR questions and the subgroups that follow them
    Indicators(WorkbookArgs),
    /// Element code, UUID and description of each criterion
    Descriptions(WorkbookArgs),
    /// UUIDs used by more than one element across all workbooks
    Duplicates(WorkbookArgs),
    /// Every element carrying a full UUID
    Dictionary(WorkbookArgs),
    /// Criteria listed in ESPD-service JSON files
    ServiceCriteria {
        /// JSON files (exclusion, selection or other criteria)
        #[arg(required = true, value_name = "JSONFILE")]
        files: Vec<PathBuf>,
    },
}

impl Uuids {
    pub fn run(self) -> anyhow::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();

        match self.report {
            Report::Indicators(workbooks) => {
                let classifier = workbooks.classifier();
                for path in workbooks.files() {
                    let (_, sheets) = workbooks.read(path)?;
                    heading(&mut out, &path.display().to_string())?;
                    for sheet in &sheets {
                        heading(&mut out, &sheet.name)?;
                        for criterion in report::indicator_report(sheet, &classifier) {
                            writeln!(out, "{}", criterion.element_code.info())?;
                            for entry in criterion.entries {
                                writeln!(
                                    out,
                                    "{}{}\t{}",
                                    "\t".repeat(entry.depth),
                                    entry.tag.as_str().success(),
                                    entry.value
                                )?;
                            }
                        }
                    }
                }
            }
            Report::Descriptions(workbooks) => {
                let classifier = workbooks.classifier();
                for path in workbooks.files() {
                    let (_, sheets) = workbooks.read(path)?;
                    heading(&mut out, &path.display().to_string())?;
                    for sheet in &sheets {
                        for description in report::criterion_descriptions(sheet, &classifier) {
                            writeln!(out, "{description}")?;
                        }
                    }
                }
            }
            Report::Duplicates(workbooks) => {
                let classifier = workbooks.classifier();
                let mut index = UuidIndex::new();
                for path in workbooks.files() {
                    let (_, sheets) = workbooks.read(path)?;
                    for sheet in &sheets {
                        index.add_sheet(sheet, &classifier);
                    }
                }
                for (uuid, owners) in index.duplicates() {
                    writeln!(out, "{}", uuid.success())?;
                    for owner in owners {
                        writeln!(out, "\t{}", owner.info())?;
                    }
                }
            }
            Report::Dictionary(workbooks) => {
                let classifier = workbooks.classifier();
                for path in workbooks.files() {
                    let (_, sheets) = workbooks.read(path)?;
                    for sheet in &sheets {
                        for entry in report::uuid_dictionary(sheet, &classifier) {
                            writeln!(out, "{entry}")?;
                        }
                    }
                }
            }
            Report::ServiceCriteria { files } => {
                for path in files {
                    let json = fs::read_to_string(&path)
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
                    heading(&mut out, &path.display().to_string())?;
                    for criterion in report::service_criteria(name, &json)? {
                        writeln!(out, "{criterion}")?;
                    }
                }
            }
        }
        Ok(())
    }
}
