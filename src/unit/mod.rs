//! Compilation units and the scopes that contain them.
//!
//! A [`Unit`] is one compilation unit, split into an optional interface part
//! and an optional implementation part. Dependencies are computed separately
//! for each [`Kind`] because the two texts may reference different units.
//! A [`Scope`] is the read-only lookup table of all units in one directory,
//! together with the optional alias and library-interface units.

mod scope;

pub use scope::{Scope, ScopeBuilder};

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::constants::{ALL_DEPS_SUFFIX, RAW_DEPS_SUFFIX};
use crate::core::{ModepError, Result};

/// The part of a unit being analyzed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// The interface text of a unit
    Interface,
    /// The implementation text of a unit
    Implementation,
}

impl Kind {
    /// Both kinds, interface first.
    pub const ALL: [Self; 2] = [Self::Interface, Self::Implementation];

    /// Lowercase name used in logs and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Interface => "interface",
            Self::Implementation => "implementation",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One compilation unit.
///
/// Two units are interchangeable only when their names match; the name is
/// unique within a [`Scope`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    name: String,
    interface: Option<PathBuf>,
    implementation: Option<PathBuf>,
}

impl Unit {
    /// Create a unit from its optional parts.
    ///
    /// # Errors
    ///
    /// Returns [`ModepError::ConfigError`] when neither part is present.
    pub fn new(
        name: impl Into<String>,
        interface: Option<PathBuf>,
        implementation: Option<PathBuf>,
    ) -> Result<Self> {
        let name = name.into();
        if interface.is_none() && implementation.is_none() {
            return Err(ModepError::ConfigError {
                message: format!("unit {name} has neither an interface nor an implementation"),
            });
        }
        Ok(Self {
            name,
            interface,
            implementation,
        })
    }

    /// A unit with only an implementation part.
    pub fn implementation_only(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            interface: None,
            implementation: Some(path.into()),
        }
    }

    /// A unit with only an interface part.
    pub fn interface_only(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            interface: Some(path.into()),
            implementation: None,
        }
    }

    /// A unit with both parts.
    pub fn with_both(
        name: impl Into<String>,
        interface: impl Into<PathBuf>,
        implementation: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            interface: Some(interface.into()),
            implementation: Some(implementation.into()),
        }
    }

    /// The unit's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source file for the given kind, if the unit has that part.
    #[must_use]
    pub fn source(&self, kind: Kind) -> Option<&Path> {
        match kind {
            Kind::Interface => self.interface.as_deref(),
            Kind::Implementation => self.implementation.as_deref(),
        }
    }

    /// Whether the unit has a part of the given kind.
    #[must_use]
    pub fn has(&self, kind: Kind) -> bool {
        self.source(kind).is_some()
    }

    /// The kind whose resolved artifact dependents merge: the interface when
    /// there is one, the implementation otherwise.
    #[must_use]
    pub fn exported_kind(&self) -> Kind {
        if self.interface.is_some() {
            Kind::Interface
        } else {
            Kind::Implementation
        }
    }

    /// Path of the raw tool output artifact, `<source>.d`.
    #[must_use]
    pub fn raw_deps_path(&self, kind: Kind) -> Option<PathBuf> {
        self.source(kind).map(|source| with_suffix(source, RAW_DEPS_SUFFIX))
    }

    /// Path of the resolved cache artifact, `<source>.all-deps`.
    #[must_use]
    pub fn all_deps_path(&self, kind: Kind) -> Option<PathBuf> {
        self.source(kind).map(|source| with_suffix(source, ALL_DEPS_SUFFIX))
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// The module name a file stem is known by: the stem with its first letter
/// capitalized, the way `ocamldep -modules` reports it.
#[must_use]
pub fn module_name(stem: &str) -> String {
    let mut chars = stem.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os: OsString = path.as_os_str().to_owned();
    os.push(suffix);
    PathBuf::from(os)
}
