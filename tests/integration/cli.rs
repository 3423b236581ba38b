use predicates::prelude::*;
use std::fs;

use crate::common::TestProject;

fn chain_project() -> TestProject {
    let project = TestProject::new().unwrap();
    project.source("a.ml", "B").unwrap().source("b.ml", "C").unwrap().source("c.ml", "").unwrap();
    project
}

#[test]
fn test_order_prints_dependencies_first() {
    let project = chain_project();

    project
        .modep_command()
        .args(["order", "src"])
        .assert()
        .success()
        .stdout("C\nB\nA\n");

    assert_eq!(fs::read_to_string(project.path("a.ml.d")).unwrap(), "a.ml: B\n");
    assert_eq!(fs::read_to_string(project.path("a.ml.all-deps")).unwrap(), "B\nC\n");
}

#[test]
fn test_order_json() {
    let project = chain_project();

    project
        .modep_command()
        .args(["order", "src", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"kind\": \"implementation\""))
        .stdout(predicate::str::contains("\"order\""))
        .stdout(predicate::str::contains("\"C\""));
}

#[test]
fn test_interface_only_units_skipped_for_implementations() {
    let project = TestProject::new().unwrap();
    project.source("a.ml", "Sig").unwrap().source("sig.mli", "").unwrap();

    project.modep_command().args(["order", "src"]).assert().success().stdout("A\n");

    project
        .modep_command()
        .args(["order", "src", "--kind", "interface"])
        .assert()
        .success()
        .stdout("A\nSig\n");
}

#[test]
fn test_deps_lists_transitive_units() {
    let project = chain_project();

    project.modep_command().args(["deps", "A", "src"]).assert().success().stdout("B\nC\n");
    project.modep_command().args(["deps", "a", "src"]).assert().success().stdout("B\nC\n");
    project.modep_command().args(["deps", "C", "src"]).assert().success().stdout("");
}

#[test]
fn test_deps_suggests_close_name() {
    let project = TestProject::new().unwrap();
    project.source("parser.ml", "").unwrap();

    project
        .modep_command()
        .args(["deps", "parsr", "src"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No unit named 'parsr'"))
        .stderr(predicate::str::contains("Did you mean 'Parser'?"));
}

#[test]
fn test_alias_unit_listed_everywhere() {
    let project = TestProject::new().unwrap();
    project.write_config("[units]\nalias = \"lib__\"\n").unwrap();
    project
        .source("a.ml", "B")
        .unwrap()
        .source("b.ml", "")
        .unwrap()
        .source("lib__.ml", "A B")
        .unwrap();

    project.modep_command().args(["deps", "a", "src"]).assert().success().stdout("Lib__\nB\n");
    project.modep_command().args(["deps", "lib__", "src"]).assert().success().stdout("");
    project.modep_command().args(["order", "src"]).assert().success().stdout("Lib__\nB\nA\n");
}

#[test]
fn test_cycle_is_reported() {
    let project = TestProject::new().unwrap();
    project.source("a.ml", "B").unwrap().source("b.ml", "A").unwrap();

    project
        .modep_command()
        .args(["order", "src"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("dependency cycle between units in"))
        .stderr(predicate::str::contains("   -> A"))
        .stderr(predicate::str::contains("   -> B"));
}

#[test]
fn test_inverted_library_dependency() {
    let project = TestProject::new().unwrap();
    project.write_config("[units]\nlibrary_interface = \"mylib\"\n").unwrap();
    project.source("mylib.ml", "").unwrap().source("helper.ml", "Mylib").unwrap();

    project
        .modep_command()
        .args(["order", "src"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unit Helper in directory"))
        .stderr(predicate::str::contains("depends on Mylib"));
}

#[test]
fn test_strict_mode_rejects_unknown_names() {
    let project = TestProject::new().unwrap();
    project.write_config("strict = true\n").unwrap();
    project.source("a.ml", "List").unwrap();

    project
        .modep_command()
        .args(["order", "src"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unit A depends on List"));

    project.write_config("").unwrap();
    project.modep_command().args(["clean", "src"]).assert().success();
    project.modep_command().args(["order", "src"]).assert().success().stdout("A\n");
}

#[test]
fn test_malformed_tool_output() {
    let project = TestProject::new().unwrap();
    fs::write(project.path("modep.toml"), "[tool]\nprogram = \"echo\"\n").unwrap();
    project.source("a.ml", "").unwrap();

    project
        .modep_command()
        .args(["order", "src"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unexpected output for src/a.ml"))
        .stderr(predicate::str::contains("> -modules -impl src/a.ml"));
}

#[test]
fn test_missing_tool() {
    let project = TestProject::new().unwrap();
    fs::write(project.path("modep.toml"), "[tool]\nprogram = \"no-such-dep-tool-xyz\"\n").unwrap();
    project.source("a.ml", "").unwrap();

    project
        .modep_command()
        .args(["order", "src"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'no-such-dep-tool-xyz' not found"));
}

#[test]
fn test_config_from_environment() {
    let project = TestProject::new().unwrap();
    project.source("a.ml", "List").unwrap();
    let strict = project.path("../strict.toml");
    fs::write(&strict, format!("strict = true\n[tool]\nprogram = \"{}\"\n", project.tool.display()))
        .unwrap();

    project
        .modep_command()
        .env("MODEP_CONFIG", &strict)
        .args(["order", "src"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("depends on List"));
}

#[test]
fn test_clean_removes_artifacts() {
    let project = chain_project();
    project.modep_command().args(["order", "src"]).assert().success();
    assert!(project.path("b.ml.d").exists());

    project
        .modep_command()
        .args(["clean", "src"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 6 artifacts"));

    assert!(!project.path("b.ml.d").exists());
    assert!(!project.path("a.ml.all-deps").exists());
    assert!(project.path("a.ml").exists());
    assert!(project.path("modep.toml").exists());
}
