use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use crate::unit::{Scope, Unit};

/// Source files in a temporary directory and the scope describing them.
///
/// Files are created empty as units are added; the dependency tool in tests
/// is a [`FakeDepTool`](super::FakeDepTool), so their content never matters.
#[derive(Debug)]
pub struct ScopeFixture {
    dir: TempDir,
    units: Vec<Unit>,
    alias: Option<String>,
    library_interface: Option<String>,
    strict: bool,
}

impl Default for ScopeFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeFixture {
    /// An empty fixture in a fresh temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
            units: Vec::new(),
            alias: None,
            library_interface: None,
            strict: false,
        }
    }

    fn touch(&self, file: &str) -> PathBuf {
        let path = self.path(file);
        std::fs::write(&path, "").expect("failed to create source file");
        path
    }

    /// Add a unit with only `<name>.ml`.
    #[must_use]
    pub fn implementation(mut self, name: &str) -> Self {
        let implementation = self.touch(&format!("{name}.ml"));
        self.units.push(Unit::implementation_only(name, implementation));
        self
    }

    /// Add a unit with only `<name>.mli`.
    #[must_use]
    pub fn interface(mut self, name: &str) -> Self {
        let interface = self.touch(&format!("{name}.mli"));
        self.units.push(Unit::interface_only(name, interface));
        self
    }

    /// Add a unit with both `<name>.mli` and `<name>.ml`.
    #[must_use]
    pub fn both(mut self, name: &str) -> Self {
        let interface = self.touch(&format!("{name}.mli"));
        let implementation = self.touch(&format!("{name}.ml"));
        self.units.push(Unit::with_both(name, interface, implementation));
        self
    }

    /// Designate the alias unit.
    #[must_use]
    pub fn alias(mut self, name: &str) -> Self {
        self.alias = Some(name.to_string());
        self
    }

    /// Designate the library-interface unit.
    #[must_use]
    pub fn library_interface(mut self, name: &str) -> Self {
        self.library_interface = Some(name.to_string());
        self
    }

    /// Turn on strict name resolution.
    #[must_use]
    pub const fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// The fixture directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of `file` inside the fixture directory.
    #[must_use]
    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.path().join(file)
    }

    /// Build the scope for the units added so far.
    ///
    /// # Panics
    ///
    /// Panics if the units do not form a valid scope.
    #[must_use]
    pub fn scope(&self) -> Arc<Scope> {
        let mut builder =
            Scope::builder(self.dir.path()).units(self.units.iter().cloned()).strict(self.strict);
        if let Some(alias) = &self.alias {
            builder = builder.alias(alias.clone());
        }
        if let Some(library_interface) = &self.library_interface {
            builder = builder.library_interface(library_interface.clone());
        }
        Arc::new(builder.build().expect("fixture units do not form a valid scope"))
    }
}
