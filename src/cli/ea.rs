use std::{
    fs::File,
    io::{self, Write},
    path::PathBuf,
};

use anyhow::Context;
use clap::Parser;
use espdxl::ea::EaTables;
use espdxl::SecurityConfig;

#[derive(Debug, Parser)]
#[command(about = "Extract EA repository tables to JSON")]
pub struct Ea2Json {
    /// Workbook with the t_object, t_objectproperties, t_attribute and t_connector sheets
    #[arg(value_name = "EAFILE")]
    file: PathBuf,
}

impl Ea2Json {
    pub fn run(self) -> anyhow::Result<()> {
        let file = File::open(&self.file)
            .with_context(|| format!("failed to open {}", self.file.display()))?;
        let tables = EaTables::read(file, &SecurityConfig::default())
            .with_context(|| format!("failed to read {}", self.file.display()))?;

        let stdout = io::stdout();
        let mut out = stdout.lock();
        serde_json::to_writer_pretty(&mut out, &tables.to_json())?;
        writeln!(out)?;
        Ok(())
    }
}
