//! Parsing and validation of raw dependency-tool output.
//!
//! The tool prints a single line `<file>: <name> <name> ...` for the file it
//! was given. [`parse_output`] checks that shape, resolves every name against
//! the [`Scope`], and applies the alias and library-interface rules.

use std::path::Path;
use std::sync::Arc;

use crate::core::{ModepError, Result};
use crate::unit::{Scope, Unit};

/// Characters separating dependency names.
const BLANKS: &[char] = &[' ', '\t', '\r', '\n'];

/// Turn the raw output lines for `unit`'s `source` file into the list of units
/// it directly depends on.
///
/// The result keeps the tool's order, without the unit itself and without
/// names unknown to the scope. When the scope has an alias unit it comes
/// first.
///
/// # Errors
///
/// - [`ModepError::MalformedOutput`] unless `lines` is exactly one
///   `<file>: <names>` line whose file basename matches `source`
/// - [`ModepError::UnresolvedDependency`] for an unknown name in strict mode
/// - [`ModepError::InvertedLibraryDependency`] when a unit other than the
///   library-interface unit or the alias depends on the library-interface unit
pub fn parse_output(
    lines: &[String],
    source: &Path,
    unit: &Unit,
    scope: &Scope,
) -> Result<Vec<Arc<Unit>>> {
    let names = split_line(lines, source)?;
    let mut deps = resolve_names(&names, unit, scope)?;
    check_library_interface(&deps, unit, scope)?;

    if let Some(alias) = scope.alias() {
        deps.insert(0, Arc::clone(alias));
    }
    Ok(deps)
}

fn malformed(lines: &[String], source: &Path) -> ModepError {
    ModepError::MalformedOutput {
        file: source.display().to_string(),
        lines: lines.to_vec(),
    }
}

/// Validate the line shape and return the raw names.
fn split_line<'a>(lines: &'a [String], source: &Path) -> Result<Vec<&'a str>> {
    let [line] = lines else {
        return Err(malformed(lines, source));
    };
    let Some((file, names)) = line.split_once(':') else {
        return Err(malformed(lines, source));
    };

    let reported = Path::new(file).file_name();
    if reported.is_none() || reported != source.file_name() {
        return Err(malformed(lines, source));
    }

    Ok(names.split(BLANKS).filter(|name| !name.is_empty()).collect())
}

fn resolve_names(names: &[&str], unit: &Unit, scope: &Scope) -> Result<Vec<Arc<Unit>>> {
    let mut deps = Vec::with_capacity(names.len());
    for &name in names {
        if name == unit.name() {
            continue;
        }
        match scope.get(name) {
            Some(dep) => deps.push(Arc::clone(dep)),
            None if scope.strict() => {
                return Err(ModepError::UnresolvedDependency {
                    unit: unit.name().to_string(),
                    name: name.to_string(),
                    dir: scope.dir().display().to_string(),
                });
            }
            None => {
                tracing::trace!(target: "resolver", "{}: ignoring external name {}", unit, name);
            }
        }
    }
    Ok(deps)
}

fn check_library_interface(deps: &[Arc<Unit>], unit: &Unit, scope: &Scope) -> Result<()> {
    let Some(library_interface) = scope.library_interface() else {
        return Ok(());
    };
    if unit.name() == library_interface.name() || scope.is_alias(unit) {
        return Ok(());
    }
    if deps.iter().any(|dep| dep.name() == library_interface.name()) {
        return Err(ModepError::InvertedLibraryDependency {
            unit: unit.name().to_string(),
            library_interface: library_interface.name().to_string(),
            dir: scope.dir().display().to_string(),
        });
    }
    Ok(())
}
