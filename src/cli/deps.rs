//! Print the dependencies of one unit.
//!
//! ```bash
//! modep deps parser src/
//! modep deps parser src/ --kind interface --format json
//! ```
//!
//! The list contains every unit of the directory the unit depends on,
//! directly or through other units: the alias first, then the direct
//! dependencies in the order the tool reported them, then the rest. The unit
//! may be named by its module name (`Parser`) or its file stem (`parser`).

use anyhow::{Result, anyhow};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use super::common::{Analysis, KindArg, OutputFormat, closest_name, target_dir};
use crate::unit::{Kind, module_name};

/// Arguments of `modep deps`.
#[derive(Debug, Args)]
pub struct DepsCommand {
    /// Name of the unit
    unit: String,

    /// Directory containing the units (defaults to the current directory)
    dir: Option<PathBuf>,

    /// Which part of the unit to analyze
    #[arg(short, long, value_enum, default_value = "implementation")]
    kind: KindArg,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct DepsReport {
    unit: String,
    kind: Kind,
    deps: Vec<String>,
}

impl DepsCommand {
    /// Resolve and print the unit's dependencies.
    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        let dir = target_dir(self.dir);
        let analysis = Analysis::load(&dir, config_path).await?;

        let found = analysis
            .scope
            .get(&self.unit)
            .or_else(|| analysis.scope.get(&module_name(&self.unit)));
        let Some(unit) = found else {
            let names = analysis.scope.names();
            let hint = closest_name(&self.unit, names.iter().map(String::as_str))
                .map(|name| format!(". Did you mean '{name}'?"))
                .unwrap_or_default();
            return Err(anyhow!("No unit named '{}' in {}{hint}", self.unit, dir.display()));
        };

        let kind = Kind::from(self.kind);
        let deps = analysis.pair.get(kind).deps_of(unit)?.await?;
        let names: Vec<String> = deps.iter().map(|dep| dep.name().to_string()).collect();

        match self.format {
            OutputFormat::Text => {
                for name in &names {
                    println!("{name}");
                }
            }
            OutputFormat::Json => {
                let report = DepsReport {
                    unit: unit.name().to_string(),
                    kind,
                    deps: names,
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
        Ok(())
    }
}
