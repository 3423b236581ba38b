use modep_cli::build::BuildContext;
use modep_cli::core::ModepError;
use modep_cli::graph::GraphPair;
use modep_cli::test_utils::{FakeDepTool, ScopeFixture, init_test_logging};
use modep_cli::tool::DepTool;
use modep_cli::unit::{Kind, Unit};
use std::collections::HashSet;
use std::sync::Arc;

fn names(units: &[Arc<Unit>]) -> Vec<String> {
    units.iter().map(|u| u.name().to_string()).collect()
}

/// A small library: `mylib` is the library interface, `mylib__` the alias.
fn library() -> (ScopeFixture, Arc<FakeDepTool>) {
    let fixture = ScopeFixture::new()
        .both("mylib")
        .implementation("mylib__")
        .both("parser")
        .implementation("lexer")
        .interface("ast")
        .alias("mylib__")
        .library_interface("mylib");
    let tool = FakeDepTool::new()
        .output(fixture.path("mylib.mli"), "mylib.mli: Parser Ast parser ast")
        .output(fixture.path("mylib.ml"), "mylib.ml: parser lexer")
        .output(fixture.path("parser.mli"), "parser.mli: ast Stdlib")
        .output(fixture.path("parser.ml"), "parser.ml: lexer ast parser")
        .output(fixture.path("lexer.ml"), "lexer.ml: ast");
    (fixture, Arc::new(tool))
}

#[tokio::test]
async fn test_library_build_order() {
    init_test_logging(None);
    let (fixture, tool) = library();
    let scope = fixture.scope();
    let pair = GraphPair::new(
        BuildContext::new(),
        Arc::clone(&tool) as Arc<dyn DepTool>,
        Arc::clone(&scope),
        HashSet::new(),
    );
    let units: Vec<_> = scope.units().cloned().collect();

    let order = pair.implementation.top_closed_implementations(&units).await.unwrap();
    assert_eq!(names(&order), vec!["mylib__", "lexer", "parser", "mylib"]);

    let order = pair.interface.top_closed(&units).await.unwrap();
    let position = |name: &str| order.iter().position(|u| u.name() == name).unwrap();
    assert!(position("ast") < position("parser"));
    assert!(position("parser") < position("mylib"));
    assert!(position("mylib__") < position("mylib"));

    // Every source was analyzed exactly once across both graphs.
    for file in ["mylib.mli", "mylib.ml", "parser.mli", "parser.ml", "lexer.ml", "ast.mli"] {
        assert_eq!(tool.calls(&fixture.path(file)), 1, "{file}");
    }
    assert_eq!(tool.calls(&fixture.path("mylib__.ml")), 0);
}

#[tokio::test]
async fn test_concurrent_tasks_share_work() {
    let (fixture, tool) = library();
    let scope = fixture.scope();
    let pair = Arc::new(GraphPair::new(
        BuildContext::new(),
        Arc::clone(&tool) as Arc<dyn DepTool>,
        Arc::clone(&scope),
        HashSet::new(),
    ));

    let mut handles = Vec::new();
    for _ in 0..4 {
        for unit in scope.units() {
            let deps = pair.implementation.deps_of(unit).unwrap();
            handles.push(tokio::spawn(deps));
        }
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(tool.calls(&fixture.path("parser.ml")), 1);
    assert_eq!(tool.calls(&fixture.path("lexer.ml")), 1);
    assert_eq!(tool.calls(&fixture.path("ast.mli")), 1);
}

#[tokio::test]
async fn test_alias_in_every_list() {
    let (fixture, tool) = library();
    let scope = fixture.scope();
    let pair = GraphPair::new(BuildContext::new(), tool, Arc::clone(&scope), HashSet::new());

    for unit in scope.units() {
        let deps = pair.implementation.deps_of(unit).unwrap().await.unwrap();
        if unit.name() == "mylib__" {
            assert!(deps.is_empty());
        } else if unit.has(Kind::Implementation) {
            assert!(names(&deps).contains(&"mylib__".to_string()), "{}", unit.name());
        }
    }

    let parser = scope.get("parser").unwrap();
    let deps = pair.implementation.deps_of(parser).unwrap().await.unwrap();
    assert_eq!(names(&deps), vec!["mylib__", "lexer", "ast"]);
}

#[tokio::test]
async fn test_second_build_reuses_artifacts() {
    let (fixture, tool) = library();
    let scope = fixture.scope();
    let units: Vec<_> = scope.units().cloned().collect();

    let first = GraphPair::new(BuildContext::new(), tool, Arc::clone(&scope), HashSet::new());
    let expected = first.implementation.top_closed_implementations(&units).await.unwrap();

    // Everything is on disk now; a new build told so never runs the tool.
    let quiet = Arc::new(FakeDepTool::new());
    let resolved: HashSet<String> = scope.names().into_iter().collect();
    let second = GraphPair::new(
        BuildContext::new(),
        Arc::clone(&quiet) as Arc<dyn DepTool>,
        Arc::clone(&scope),
        resolved,
    );
    let again = second.implementation.top_closed_implementations(&units).await.unwrap();

    assert_eq!(names(&again), names(&expected));
    assert_eq!(quiet.total_calls(), 0);
}

#[tokio::test]
async fn test_inverted_dependency_fails_the_order() {
    let fixture = ScopeFixture::new()
        .implementation("mylib")
        .implementation("helper")
        .library_interface("mylib");
    let tool = FakeDepTool::new().output(fixture.path("helper.ml"), "helper.ml: mylib");
    let scope = fixture.scope();
    let pair = GraphPair::new(BuildContext::new(), Arc::new(tool), Arc::clone(&scope), HashSet::new());

    let units: Vec<_> = scope.units().cloned().collect();
    let err = pair.implementation.top_closed_implementations(&units).await.unwrap_err();
    match err {
        ModepError::InvertedLibraryDependency {
            unit,
            library_interface,
            ..
        } => {
            assert_eq!(unit, "helper");
            assert_eq!(library_interface, "mylib");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_cycle_reports_both_units() {
    let fixture = ScopeFixture::new().implementation("a").implementation("b").implementation("c");
    let tool = FakeDepTool::new()
        .output(fixture.path("a.ml"), "a.ml: b")
        .output(fixture.path("b.ml"), "b.ml: c")
        .output(fixture.path("c.ml"), "c.ml: b");
    let scope = fixture.scope();
    let pair = GraphPair::new(BuildContext::new(), Arc::new(tool), Arc::clone(&scope), HashSet::new());

    let units: Vec<_> = scope.units().cloned().collect();
    let err = pair.implementation.top_closed(&units).await.unwrap_err();
    let ModepError::CircularDependency {
        chain, ..
    } = err
    else {
        panic!("expected a cycle, got {err}");
    };
    assert_eq!(chain.first(), chain.last());
    assert!(chain.contains(&"b".to_string()));
    assert!(chain.contains(&"c".to_string()));
    assert!(!chain.contains(&"a".to_string()));

    // Each step of the chain follows a dependency the tool reported.
    let edges = [("a", "b"), ("b", "c"), ("c", "b")];
    for step in chain.windows(2) {
        assert!(
            edges.contains(&(step[0].as_str(), step[1].as_str())),
            "{} -> {} is not a dependency",
            step[0],
            step[1]
        );
    }
}

#[tokio::test]
async fn test_tool_failure_propagates() {
    let fixture = ScopeFixture::new().implementation("a");
    let tool = FakeDepTool::new().failure(
        fixture.path("a.ml"),
        ModepError::ToolFailed {
            file: "a.ml".to_string(),
            code: Some(2),
            stderr: "syntax error".to_string(),
        },
    );
    let scope = fixture.scope();
    let pair = GraphPair::new(BuildContext::new(), Arc::new(tool), Arc::clone(&scope), HashSet::new());

    let err = pair.implementation.deps_of(scope.get("a").unwrap()).unwrap().await.unwrap_err();
    assert!(matches!(err, ModepError::ToolFailed { code: Some(2), .. }));
    assert!(!fixture.path("a.ml.d").exists());
}
