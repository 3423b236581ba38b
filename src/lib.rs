//! modep - module dependency analysis for incremental builds
//!
//! modep computes the inter-unit dependency graph of a set of compilation
//! units and exposes a safe build order over it. Dependencies come from an
//! external dependency-extraction tool run on each unit's source; its output
//! is cached next to the source and re-validated against the structural rules
//! of the unit set.
//!
//! # Architecture Overview
//!
//! The crate is layered bottom-up:
//!
//! 1. [`unit`] - [`Unit`](unit::Unit), [`Kind`](unit::Kind) and the
//!    [`Scope`](unit::Scope) lookup table of one directory
//! 2. [`resolver::parser`] - validates one line of tool output and resolves
//!    its names against the scope
//! 3. [`resolver`] - registers the `.d` / `.all-deps` rules of each unit and
//!    hands out deferred, memoized dependency lists
//! 4. [`graph`] - per-kind [`DependencyGraph`](graph::DependencyGraph) with
//!    lookup and topological closure, and the [`GraphPair`](graph::GraphPair)
//!    of both kinds
//!
//! Supporting modules:
//!
//! - [`build`] - memoizing "produce this file" context with cycle detection
//! - [`tool`] - the [`DepTool`](tool::DepTool) seam and the subprocess runner
//! - [`config`] - `modep.toml` loading
//! - [`core`] - [`ModepError`](core::ModepError) and user-facing reporting
//! - [`cli`] - the `modep` command
//!
//! # Artifacts
//!
//! For a source `lib/foo.ml` the build produces:
//!
//! - `lib/foo.ml.d` - the tool's output, verbatim: `foo.ml: Bar Baz`
//! - `lib/foo.ml.all-deps` - every unit `Foo` depends on, one name per line,
//!   direct dependencies first
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use modep_cli::build::BuildContext;
//! use modep_cli::config::ModepConfig;
//! use modep_cli::graph::GraphPair;
//! use modep_cli::tool::CommandDepTool;
//! use modep_cli::unit::Scope;
//! use std::collections::HashSet;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let dir = Path::new("src");
//! let config = ModepConfig::load_for(dir, None).await?;
//! let scope = Arc::new(Scope::discover(dir, &config.units, config.strict)?);
//! let tool = Arc::new(CommandDepTool::new(config.tool.clone()));
//! let pair = GraphPair::new(BuildContext::new(), tool, Arc::clone(&scope), HashSet::new());
//!
//! let units: Vec<_> = scope.units().cloned().collect();
//! for unit in pair.implementation.top_closed_implementations(&units).await? {
//!     println!("{}", unit.name());
//! }
//! # Ok(())
//! # }
//! ```

pub mod build;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod graph;
pub mod resolver;
pub mod tool;
pub mod unit;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
