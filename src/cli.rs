use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

mod check;
mod codelist;
mod convert;
mod ea;
mod espd;
mod terminal;
mod uuids;

use anyhow::Context;
use check::Check;
use clap::ArgAction;
use codelist::Codelist;
use convert::Convert;
use ea::Ea2Json;
use espd::Espd;
use espdxl::remote::{HttpFetcher, Lookup, ProxyConfig, REQUEST_TIMEOUT};
use espdxl::{
    CriterionParser, IdentifierPolicy, ParseOutcome, ParserBuilder, RowClassifier, WorkbookKind,
    Worksheet, DEFAULT_SCAN_RANGE,
};
use terminal::Colorize;
use tracing::warn;
use uuids::Uuids;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);
        self.command.run()
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Inspect criterion workbooks (structures, labels, paths)
    Check(Check),

    /// Convert criterion workbooks to JSON, Vue components or PlantUML
    Convert(Convert),

    /// Generate ESPD Request and Response XML documents
    Espd(Espd),

    /// List, check and extract element UUIDs
    Uuid(Uuids),

    /// Generate genericode files from a code list workbook
    Codelist(Codelist),

    /// Convert EA repository tables to JSON
    #[command(name = "ea2json")]
    Ea2Json(Ea2Json),
}

impl Command {
    fn run(self) -> anyhow::Result<()> {
        match self {
            Self::Check(command) => command.run(),
            Self::Convert(command) => command.run(),
            Self::Espd(command) => command.run(),
            Self::Uuid(command) => command.run(),
            Self::Codelist(command) => command.run(),
            Self::Ea2Json(command) => command.run(),
        }
    }
}

/// Options shared by every command reading criterion workbooks
#[derive(Debug, clap::Args)]
pub struct WorkbookArgs {
    /// Criterion workbooks to process
    #[arg(required = true, value_name = "EXCELFILE")]
    files: Vec<PathBuf>,

    /// First column scanned for tags
    #[arg(long, default_value_t = DEFAULT_SCAN_RANGE.0)]
    first_column: u32,

    /// Last column scanned for tags
    #[arg(long, default_value_t = DEFAULT_SCAN_RANGE.1)]
    last_column: u32,

    /// Apply request-workbook rules regardless of the file name
    #[arg(long)]
    request: bool,
}

impl WorkbookArgs {
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn classifier(&self) -> RowClassifier {
        RowClassifier::new(self.first_column, self.last_column)
    }

    fn kind(&self, path: &Path) -> WorkbookKind {
        if self.request {
            WorkbookKind::Request
        } else {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            WorkbookKind::from_file_name(name)
        }
    }

    /// Build a parser configured for one workbook
    pub fn parser(&self, path: &Path) -> anyhow::Result<CriterionParser> {
        let version = espdxl::version_from_path(path).unwrap_or_default();
        let parser = ParserBuilder::new()
            .with_scan_range(self.first_column, self.last_column)
            .with_workbook_kind(self.kind(path))
            .with_identifier_policy(IdentifierPolicy::for_version(&version))
            .build()?;
        Ok(parser)
    }

    /// Read every worksheet of a workbook
    pub fn read(&self, path: &Path) -> anyhow::Result<(CriterionParser, Vec<Worksheet>)> {
        let parser = self.parser(path)?;
        let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let sheets = parser
            .read_worksheets(file)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok((parser, sheets))
    }

    /// Parse a workbook, reporting worksheets that failed
    pub fn parse(&self, path: &Path) -> anyhow::Result<ParseOutcome> {
        let outcome = self
            .parser(path)?
            .parse_path(path)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        for failure in &outcome.failures {
            warn!(sheet = %failure.sheet, error = %failure.error, "worksheet skipped");
        }
        Ok(outcome)
    }
}

/// Proxy options for commands reaching remote services
#[derive(Debug, clap::Args)]
pub struct ProxyArgs {
    /// Proxy server host (direct connection when omitted)
    #[arg(long, value_name = "HOST")]
    proxy_server: Option<String>,

    /// Proxy server port
    #[arg(long, default_value_t = 8012)]
    proxy_port: u16,

    /// Proxy server user
    #[arg(long, default_value = "")]
    user: String,

    /// Proxy server password
    #[arg(long, default_value = "")]
    password: String,
}

impl ProxyArgs {
    pub fn fetcher(&self) -> anyhow::Result<HttpFetcher> {
        let proxy = self.proxy_server.as_ref().map(|server| ProxyConfig {
            server: server.clone(),
            port: self.proxy_port,
            user: self.user.clone(),
            password: self.password.clone(),
        });
        Ok(HttpFetcher::new(proxy.as_ref(), REQUEST_TIMEOUT)?)
    }
}

/// Print one line per remote lookup
pub fn print_lookups(out: &mut impl Write, lookups: &[Lookup]) -> std::io::Result<()> {
    for lookup in lookups {
        writeln!(out, "{} {}", terminal::verdict(lookup.is_ok()), lookup)?;
    }
    Ok(())
}

/// Open an output file inside the output directory
pub fn create_output(dir: &Path, name: &str) -> anyhow::Result<BufWriter<File>> {
    std::fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(name);
    let file = File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
    println!("{} {}", "Written".success(), path.display());
    Ok(BufWriter::new(file))
}

/// Write a heading line for a workbook or worksheet
pub fn heading(out: &mut impl Write, text: &str) -> std::io::Result<()> {
    writeln!(out, "{}", text.info())
}
