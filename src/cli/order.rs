//! Print a safe processing order for the units of a directory.
//!
//! ```bash
//! modep order src/
//! modep order src/ --kind interface
//! modep order src/ --format json
//! ```
//!
//! For the implementation kind only units with an implementation part are
//! listed; for the interface kind every unit is.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use super::common::{Analysis, KindArg, OutputFormat, target_dir};
use crate::unit::Kind;

/// Arguments of `modep order`.
#[derive(Debug, Args)]
pub struct OrderCommand {
    /// Directory containing the units (defaults to the current directory)
    dir: Option<PathBuf>,

    /// Which part of the units to order
    #[arg(short, long, value_enum, default_value = "implementation")]
    kind: KindArg,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct OrderReport {
    dir: String,
    kind: Kind,
    order: Vec<String>,
}

impl OrderCommand {
    /// Compute and print the order.
    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        let dir = target_dir(self.dir);
        let analysis = Analysis::load(&dir, config_path).await?;
        let units = analysis.units();
        let kind = Kind::from(self.kind);

        let order = match kind {
            Kind::Implementation => {
                analysis.pair.implementation.top_closed_implementations(&units).await?
            }
            Kind::Interface => analysis.pair.interface.top_closed(&units).await?,
        };
        let names: Vec<String> = order.iter().map(|unit| unit.name().to_string()).collect();

        match self.format {
            OutputFormat::Text => {
                for name in &names {
                    println!("{name}");
                }
            }
            OutputFormat::Json => {
                let report = OrderReport {
                    dir: dir.display().to_string(),
                    kind,
                    order: names,
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
        Ok(())
    }
}
