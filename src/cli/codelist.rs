use std::{fs::File, io::Write, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use espdxl::codelist::{download_external, read_code_lists, write_genericode, CodeListKind};
use espdxl::SecurityConfig;

use super::terminal::Colorize;
use super::{create_output, print_lookups, ProxyArgs};

#[derive(Debug, Parser)]
#[command(about = "Process a code list workbook")]
pub struct Codelist {
    /// Code list workbook
    #[arg(value_name = "EXCELFILE")]
    file: PathBuf,

    /// Directory for the genericode files
    #[arg(long, value_name = "DIR", default_value = "gc")]
    out_dir: PathBuf,

    /// Only list external code lists instead of downloading them
    #[arg(long)]
    skip_download: bool,

    #[command(flatten)]
    proxy: ProxyArgs,
}

impl Codelist {
    pub fn run(self) -> anyhow::Result<()> {
        let file = File::open(&self.file)
            .with_context(|| format!("failed to open {}", self.file.display()))?;
        let lists = read_code_lists(file, &SecurityConfig::default())?;

        for list in &lists {
            match list.kind() {
                CodeListKind::Technical => {
                    let mut writer = create_output(&self.out_dir, &list.file_name())?;
                    write_genericode(list, &mut writer)?;
                    writer.flush()?;
                }
                CodeListKind::External => {
                    println!(
                        "{} {} ({})",
                        "External".warning(),
                        list.name(),
                        list.location()
                    );
                }
            }
        }

        if !self.skip_download {
            let fetcher = self.proxy.fetcher()?;
            let lookups = download_external(&lists, &fetcher, &self.out_dir);
            print_lookups(&mut std::io::stdout().lock(), &lookups)?;
        }
        Ok(())
    }
}
