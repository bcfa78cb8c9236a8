use std::{
    fs::File,
    io::{self, Write},
};

use anyhow::Context;
use clap::Parser;
use espdxl::report::{self, ElementStructure, Finding};
use espdxl::{SecurityConfig, SheetScan};
use unicode_width::UnicodeWidthStr;

use super::terminal::{pad, verdict, Colorize};
use super::{heading, print_lookups, ProxyArgs, WorkbookArgs};

#[derive(Debug, Parser)]
#[command(about = "Inspect criterion workbooks")]
pub struct Check {
    /// Report to produce
    #[arg(value_enum)]
    report: Report,

    /// Only print failed checks (tags, paths)
    #[arg(long)]
    failures_only: bool,

    #[command(flatten)]
    workbooks: WorkbookArgs,

    #[command(flatten)]
    proxy: ProxyArgs,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum, PartialEq, Eq)]
enum Report {
    /// Print every row of every worksheet as JSON
    AllJson,
    /// Print the tag structure of each worksheet
    FullStructures,
    /// Print each element with its children and cardinalities
    EachStructure,
    /// Compare element labels with the generated identifiers
    Tags,
    /// Compare materialized paths with the path columns
    Paths,
    /// List elements bound to a code list
    Codelists,
    /// List the property data types in use
    Pdt,
    /// Look up the `uuid` column of each file in eCERTIS
    Ecertis,
}

impl Check {
    pub fn run(self) -> anyhow::Result<()> {
        if self.report == Report::Ecertis {
            return self.lookup_ecertis();
        }

        let stdout = io::stdout();
        let mut out = stdout.lock();
        let classifier = self.workbooks.classifier();

        let mut structure = ElementStructure::new();
        let mut all_sheets = Vec::new();
        let mut summary = Vec::new();

        for path in self.workbooks.files() {
            let (parser, sheets) = self.workbooks.read(path)?;
            heading(&mut out, &path.display().to_string())?;

            match self.report {
                Report::AllJson => {
                    for sheet in &sheets {
                        heading(&mut out, &sheet.name)?;
                        let rows = report::dump_rows(sheet);
                        writeln!(out, "{}", serde_json::to_string_pretty(&rows)?)?;
                    }
                }
                Report::FullStructures => {
                    for sheet in &sheets {
                        heading(&mut out, &sheet.name)?;
                        for line in report::full_structure(sheet, &classifier) {
                            writeln!(out, "{line}")?;
                        }
                    }
                }
                Report::EachStructure => {
                    for sheet in &sheets {
                        structure.add_sheet(sheet, &classifier);
                    }
                }
                Report::Tags | Report::Paths => {
                    for scan in parser.scan_worksheets(&sheets) {
                        let findings = if self.report == Report::Tags {
                            report::tag_findings(&scan)
                        } else {
                            report::path_findings(&scan, parser.workbook_kind())
                        };
                        heading(&mut out, &scan.sheet)?;
                        self.print_findings(&mut out, &findings)?;
                        print_scan_error(&mut out, &scan)?;
                        let failed = findings.iter().filter(|f| !f.is_ok()).count();
                        summary.push((scan.sheet.clone(), findings.len(), failed));
                    }
                }
                Report::Codelists => {
                    for sheet in &sheets {
                        heading(&mut out, &sheet.name)?;
                        for code_list in report::code_list_uses(sheet, &classifier) {
                            writeln!(out, "{code_list}")?;
                        }
                    }
                }
                Report::Pdt => all_sheets.extend(sheets),
                Report::Ecertis => {}
            }
        }

        match self.report {
            Report::EachStructure => print_structure(&mut out, &structure)?,
            Report::Pdt => {
                for entry in report::property_data_types(&all_sheets, &classifier) {
                    writeln!(out, "{entry}")?;
                }
            }
            Report::Tags | Report::Paths => print_summary(&mut out, &summary)?,
            _ => {}
        }
        Ok(())
    }

    fn lookup_ecertis(&self) -> anyhow::Result<()> {
        let fetcher = self.proxy.fetcher()?;
        let stdout = io::stdout();
        let mut out = stdout.lock();

        for path in self.workbooks.files() {
            let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            let uuids = report::read_ecertis_uuids(file, &SecurityConfig::default())
                .with_context(|| format!("failed to read {}", path.display()))?;
            heading(&mut out, &path.display().to_string())?;
            let lookups = report::lookup_ecertis(&fetcher, &uuids);
            print_lookups(&mut out, &lookups)?;
            let failed = lookups.iter().filter(|l| !l.is_ok()).count();
            writeln!(out, "\n{} UUIDs looked up, {} failed", lookups.len(), failed)?;
        }
        Ok(())
    }

    fn print_findings(&self, out: &mut impl Write, findings: &[Finding]) -> io::Result<()> {
        for finding in findings {
            if self.failures_only && finding.is_ok() {
                continue;
            }
            writeln!(out, "{} {}", verdict(finding.is_ok()), finding)?;
        }
        Ok(())
    }
}

fn print_scan_error(out: &mut impl Write, scan: &SheetScan) -> io::Result<()> {
    if let Some(error) = &scan.error {
        writeln!(out, "{} {}", "[ERROR]".failure(), error)?;
    }
    Ok(())
}

fn print_structure(out: &mut impl Write, structure: &ElementStructure) -> io::Result<()> {
    for (parent, children) in structure.entries() {
        writeln!(out, "{}", parent.success())?;
        for child in children {
            writeln!(out, "\t{child}")?;
        }
    }
    for missing in &structure.missing_cardinality {
        writeln!(out, "{} {}", "No cardinality".warning(), missing)?;
    }
    Ok(())
}

fn print_summary(out: &mut impl Write, summary: &[(String, usize, usize)]) -> io::Result<()> {
    let width = summary.iter().map(|(sheet, ..)| sheet.width()).max().unwrap_or(0) + 2;
    writeln!(out)?;
    for (sheet, total, failed) in summary {
        let counts = format!("{total} checked, {failed} failed");
        let counts = if *failed == 0 { counts.success() } else { counts.failure() };
        writeln!(out, "{}{}", pad(sheet, width), counts)?;
    }
    Ok(())
}
