//! The lookup table of units in one directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use walkdir::WalkDir;

use crate::config::UnitsConfig;
use crate::core::{ModepError, Result};
use crate::unit::{Unit, module_name};

/// Read-only name → unit table for one directory, plus the optional alias
/// and library-interface units.
///
/// The scope is passed explicitly to every operation that needs name
/// resolution. Units are stored in name order so diagnostics listing the
/// known names are stable.
#[derive(Debug, Clone)]
pub struct Scope {
    dir: PathBuf,
    units: BTreeMap<String, Arc<Unit>>,
    alias: Option<Arc<Unit>>,
    library_interface: Option<Arc<Unit>>,
    strict: bool,
}

impl Scope {
    /// Start building a scope for `dir`.
    pub fn builder(dir: impl Into<PathBuf>) -> ScopeBuilder {
        ScopeBuilder {
            dir: dir.into(),
            units: Vec::new(),
            alias: None,
            library_interface: None,
            strict: false,
        }
    }

    /// Discover the units of `dir` by pairing interface and implementation
    /// files that share a stem.
    ///
    /// Units are named by [`module_name`], so `foo.ml` becomes `Foo`. The
    /// configured alias and library-interface names go through the same
    /// mapping. Only the directory itself is scanned, not its subdirectories.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be read or when the
    /// configured alias or library-interface unit is not among the
    /// discovered units.
    pub fn discover(dir: &Path, config: &UnitsConfig, strict: bool) -> Result<Self> {
        let mut parts: BTreeMap<String, (Option<PathBuf>, Option<PathBuf>)> = BTreeMap::new();

        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| ModepError::FileSystemError {
                operation: "scanning".to_string(),
                path: dir.display().to_string(),
                reason: e.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let (Some(stem), Some(ext)) = (
                path.file_stem().and_then(|s| s.to_str()),
                path.extension().and_then(|e| e.to_str()),
            ) else {
                continue;
            };

            if ext == config.interface_extension {
                parts.entry(module_name(stem)).or_default().0 = Some(path.to_path_buf());
            } else if ext == config.implementation_extension {
                parts.entry(module_name(stem)).or_default().1 = Some(path.to_path_buf());
            }
        }

        tracing::debug!(
            target: "scope",
            "Discovered {} units in {}",
            parts.len(),
            dir.display()
        );

        let mut builder = Self::builder(dir).strict(strict);
        for (name, (interface, implementation)) in parts {
            builder = builder.unit(Unit::new(name, interface, implementation)?);
        }
        if let Some(alias) = &config.alias {
            builder = builder.alias(module_name(alias));
        }
        if let Some(library_interface) = &config.library_interface {
            builder = builder.library_interface(module_name(library_interface));
        }
        builder.build()
    }

    /// Directory the scope describes.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Look a unit up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<Unit>> {
        self.units.get(name)
    }

    /// All units, in name order.
    pub fn units(&self) -> impl Iterator<Item = &Arc<Unit>> {
        self.units.values()
    }

    /// All unit names, in order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.units.keys().cloned().collect()
    }

    /// Number of units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the scope has no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// The alias (re-export) unit, if any.
    #[must_use]
    pub fn alias(&self) -> Option<&Arc<Unit>> {
        self.alias.as_ref()
    }

    /// The library-interface unit, if any.
    #[must_use]
    pub fn library_interface(&self) -> Option<&Arc<Unit>> {
        self.library_interface.as_ref()
    }

    /// Whether `unit` is the alias unit of this scope.
    #[must_use]
    pub fn is_alias(&self, unit: &Unit) -> bool {
        self.alias.as_ref().is_some_and(|alias| alias.name() == unit.name())
    }

    /// Whether dependency names absent from the scope are errors.
    #[must_use]
    pub const fn strict(&self) -> bool {
        self.strict
    }
}

/// Builder for [`Scope`].
#[derive(Debug)]
pub struct ScopeBuilder {
    dir: PathBuf,
    units: Vec<Unit>,
    alias: Option<String>,
    library_interface: Option<String>,
    strict: bool,
}

impl ScopeBuilder {
    /// Add a unit.
    #[must_use]
    pub fn unit(mut self, unit: Unit) -> Self {
        self.units.push(unit);
        self
    }

    /// Add several units.
    #[must_use]
    pub fn units(mut self, units: impl IntoIterator<Item = Unit>) -> Self {
        self.units.extend(units);
        self
    }

    /// Designate the alias unit by name.
    #[must_use]
    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.alias = Some(name.into());
        self
    }

    /// Designate the library-interface unit by name.
    #[must_use]
    pub fn library_interface(mut self, name: impl Into<String>) -> Self {
        self.library_interface = Some(name.into());
        self
    }

    /// Report dependency names that are not units of the scope.
    #[must_use]
    pub const fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Finish the scope.
    ///
    /// # Errors
    ///
    /// Returns [`ModepError::ConfigError`] for duplicate unit names or for an
    /// alias / library-interface name that is not one of the units.
    pub fn build(self) -> Result<Scope> {
        let mut units = BTreeMap::new();
        for unit in self.units {
            let name = unit.name().to_string();
            if units.insert(name.clone(), Arc::new(unit)).is_some() {
                return Err(ModepError::ConfigError {
                    message: format!("unit {name} is defined twice in {}", self.dir.display()),
                });
            }
        }

        let lookup = |role: &str, name: Option<String>| -> Result<Option<Arc<Unit>>> {
            name.map(|name| {
                units.get(&name).cloned().ok_or_else(|| ModepError::ConfigError {
                    message: format!(
                        "{role} unit {name} is not a unit of {}",
                        self.dir.display()
                    ),
                })
            })
            .transpose()
        };
        let alias = lookup("alias", self.alias)?;
        let library_interface = lookup("library interface", self.library_interface)?;

        Ok(Scope {
            dir: self.dir,
            units,
            alias,
            library_interface,
            strict: self.strict,
        })
    }
}
