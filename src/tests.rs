/*
MIT License

Copyright (c) 2026 Raja Lehtihet and Wael El Oraiby

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

//! Crate unit tests.

use super::*;
use approx::assert_relative_eq;
use glam::DVec3;
use std::rc::Rc;

fn first_caret_column(pointer: &str) -> Option<usize> {
    pointer.chars().position(|ch| ch == '^').map(|idx| idx + 1)
}

/// Session on a shared symbolic backend.
fn symbolic_session() -> (Session, Rc<SymbolicBackend>) {
    let backend = Rc::new(SymbolicBackend::new());
    let session =
        Session::with_config(SessionConfig::new().with_shared_backend(backend.clone()));
    (session, backend)
}

fn loaded(source: &str) -> (Session, Rc<SymbolicBackend>) {
    let (mut session, backend) = symbolic_session();
    session.load_script(source).expect("script should load");
    (session, backend)
}

fn term(result: &BuildResult) -> String {
    result
        .shape
        .downcast_ref::<SymbolicShape>()
        .map(|shape| shape.term.clone())
        .unwrap_or_default()
}

fn assert_parse_error_case(case_name: &str, source: &str, expected_line: usize) {
    let mut session = Session::new();
    let err = session.load_script(source).expect_err("parse should fail");
    assert_eq!(err.line, expected_line, "{case_name}: unexpected error line");
    assert!(err.column > 0, "{case_name}: expected non-zero column");
    let expected_snippet = source
        .lines()
        .nth(err.line.saturating_sub(1))
        .unwrap_or_default();
    assert_eq!(
        err.snippet, expected_snippet,
        "{case_name}: snippet should match source line"
    );
    assert_eq!(
        first_caret_column(&err.pointer),
        Some(err.column),
        "{case_name}: caret column mismatch"
    );
    assert_eq!(session.names().count(), 0, "{case_name}: partial model");
}

#[test]
fn cone_script_binds_one_feature_and_caches_one_entry() {
    let (session, backend) =
        loaded("p0 = Vector(0,0,0); p1 = Vector(0,0,10); c = Cone(p0, p1, 5, 2);");
    assert_eq!(session.binding_kind("p0"), Some(SymbolKind::Vector));
    assert_eq!(session.binding_kind("c"), Some(SymbolKind::Feature));

    let cone = session.feature("c").expect("c is a feature");
    assert_eq!(cone.type_name(), "Cone");
    let kinds: Vec<&str> = cone.arguments().iter().map(Argument::kind_name).collect();
    assert_eq!(kinds, vec!["vector", "vector", "scalar", "scalar"]);
    assert_eq!(cone.status(), BuildStatus::Unbuilt);

    let result = session.build("c").expect("cone builds");
    assert_eq!(term(&result), "Cone([0, 0, 0], [0, 0, 10], 5, 2)");
    assert_eq!(result.points["p1"], DVec3::new(0.0, 0.0, 10.0));
    assert_eq!(result.values["D0"], 5.0);
    assert_eq!(backend.build_count(), 1);
    assert_eq!(session.cache_stats().entries, 1);
}

#[test]
fn identical_scripts_hash_identically_across_sessions() {
    let src = "p0 = Vector(0,0,0); p1 = Vector(0,0,10); c = Cone(p0, p1, 5, 2);";
    let (first, _) = loaded(src);
    let (second, _) = loaded(src);
    let hash = first.structural_hash("c").expect("hash");
    assert_eq!(hash, second.structural_hash("c").expect("hash"));
    assert_eq!(
        hash.to_hex(),
        "5e6c0cdbb9240a9230459f51f941f472870657975963a5a06d8a293bb95af47f"
    );
}

#[test]
fn order_sensitive_arguments_change_the_hash() {
    let (session, _) = loaded(
        "p0 = [0, 0, 0]; p1 = [0, 0, 10];\n\
         a = Cone(p0, p1, 5, 2);\n\
         b = Cone(p1, p0, 5, 2);",
    );
    assert_ne!(
        session.structural_hash("a").expect("hash"),
        session.structural_hash("b").expect("hash")
    );
}

#[test]
fn structurally_equal_features_share_one_build() {
    let (session, backend) = loaded(
        "a = Box([0, 0, 0], [1, 1, 1]);\n\
         s = 0.5;\n\
         b = Box([-0, 0, 0], [2 * s, 2 * s, 4 * s ^ 2]);",
    );
    assert_eq!(
        session.structural_hash("a").expect("hash"),
        session.structural_hash("b").expect("hash")
    );
    let a = session.build("a").expect("a builds");
    let b = session.build("b").expect("b builds");
    assert!(Rc::ptr_eq(&a, &b));
    assert_eq!(backend.build_count(), 1);
    let stats = session.cache_stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.backend_builds, 1);
}

#[test]
fn building_twice_returns_the_memoized_result() {
    let (session, backend) = loaded("s = Sphere([0, 0, 0], 4);");
    let first = session.build("s").expect("sphere builds");
    let second = session.build("s").expect("sphere builds");
    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(backend.build_count(), 1);
    assert_eq!(
        session.feature("s").expect("feature").status(),
        BuildStatus::Built
    );
}

#[test]
fn dependencies_build_before_dependents() {
    let (session, backend) = loaded(
        "base = Box([0, 0, 0], [2, 2, 2]);\n\
         hole = Cylinder([1, 1, 0], [1, 1, 2], 1);\n\
         part = Subtract(base, hole);",
    );
    session.build("part").expect("part builds");
    assert_eq!(backend.build_log(), vec!["base", "hole", "part"]);
}

#[test]
fn optional_fallbacks_are_structurally_explicit() {
    let (session, _) = loaded(
        "a = Cylinder([0, 0, 0], [0, 0, 1], 5);\n\
         b = Cylinder([0, 0, 0], [0, 0, 1], 5, 0);\n\
         prof = Box([0, 0, 0], [1, 1, 0.1]);\n\
         e1 = Extrude(prof, [0, 0, 1]);\n\
         e2 = Extrude(prof, [0, 0, 1], forward);\n\
         e3 = Extrude(prof, [0, 0, 1], centered);",
    );
    let hash = |name| session.structural_hash(name).expect("hash");
    assert_eq!(hash("a"), hash("b"));
    assert_eq!(hash("e1"), hash("e2"));
    assert_ne!(hash("e1"), hash("e3"));
}

#[test]
fn unknown_feature_type_creates_nothing() {
    let mut session = Session::new();
    let err = session
        .load_script("x = 1;\nf = Frobnicate(1, 2);")
        .expect_err("unknown type");
    assert_eq!(err.kind, CompileErrorKind::UnknownFeatureType);
    assert!(err.message.contains("Unknown feature type 'Frobnicate'"));
    assert_eq!(err.line, 2);
    assert_eq!(err.column, 5);
    assert_eq!(session.names().count(), 0);
}

#[test]
fn reports_line_and_column_for_missing_argument() {
    let src = "a = Box([0,0,0], [1,1,1]);\nb = Sphere([0,0,0] 5);";
    let mut session = Session::new();
    let err = session.load_script(src).expect_err("parse should fail");
    assert_eq!(err.kind, CompileErrorKind::Syntax);
    assert_eq!(err.line, 2);
    assert_eq!(err.column, 20);
    assert_eq!(err.snippet, "b = Sphere([0,0,0] 5);");
    assert_eq!(first_caret_column(&err.pointer), Some(err.column));
    assert!(err.message.contains("Sphere expects argument 'D: scalar'"));
    assert!(err.to_string().contains("<script>:2:20"));
}

#[test]
fn reports_parse_errors_for_invalid_forms() {
    let cases = vec![
        ("missing semicolon", "a = Box([0,0,0], [1,1,1])\nb = 2;", 2usize),
        ("unclosed vector", "v = [1, 2;", 1),
        ("dangling operator", "x = 1;\ny = x + ;", 2),
        ("missing export target", "export ;", 1),
        ("bad selection filter", "b = Box([0,0,0],[1,1,1]);\ne = edges(b, 3);", 2),
        ("unknown option word", "p = Box([0,0,0],[1,1,1]);\ne = Extrude(p, [0,0,1], sideways);", 2),
        ("trailing comma", "c = Cylinder([0,0,0], [0,0,1], 5, );", 1),
        ("too few operands", "b = Box([0,0,0],[1,1,1]);\nu = Union(b);", 2),
    ];
    for (case_name, source, expected_line) in cases {
        assert_parse_error_case(case_name, source, expected_line);
    }
}

#[test]
fn names_of_the_wrong_kind_are_explained() {
    let mut session = Session::new();
    let err = session
        .load_script("v = [1, 0, 0];\ns = Sphere(v, v);")
        .expect_err("vector used as scalar");
    assert!(
        err.message.contains("'v' is a vector, expected scalar expression"),
        "{}",
        err.message
    );

    let err = session
        .load_script("s = Sphere([0, 0, 0], radius);")
        .expect_err("unbound scalar");
    assert!(
        err.message.contains("unknown identifier 'radius'"),
        "{}",
        err.message
    );
}

#[test]
fn duplicate_and_reserved_names_are_rejected() {
    let mut session = Session::new();
    let err = session
        .load_script("a = 1;\na = 2;")
        .expect_err("duplicate");
    assert_eq!(err.kind, CompileErrorKind::DuplicateSymbol);
    assert_eq!(err.line, 2);
    assert_eq!(err.column, 1);

    session.load_script("a = 1;").expect("first binding");
    let err = session.load_script("a = 3;").expect_err("rebinding");
    assert_eq!(err.kind, CompileErrorKind::DuplicateSymbol);
    assert_relative_eq!(session.scalar("a").expect("a"), 1.0);

    for src in ["sin = 1;", "Box = 2;", "edges = 3;", "Plane = 4;"] {
        let err = session.load_script(src).expect_err("reserved");
        assert_eq!(err.kind, CompileErrorKind::ReservedName, "{src}");
    }
}

#[test]
fn failed_loads_leave_the_session_unchanged() {
    let mut session = Session::new();
    session.load_script("x = 1;").expect("loads");
    session
        .load_script("y = 2;\nz = ;")
        .expect_err("second statement is invalid");
    assert_eq!(session.names().collect::<Vec<_>>(), vec!["x"]);
    assert_eq!(session.binding_kind("y"), None);
}

#[test]
fn evaluates_values_datums_and_feature_references() {
    let (session, backend) = loaded(
        "r = 2;\n\
         h = r ^ 3 + abs(-1);\n\
         dir = normalize([0, 3, 4]);\n\
         ax = Axis([0, 0, 0], [0, 0, 5]);\n\
         top = ax.origin + h * ax.direction;\n\
         c = Cylinder([0, 0, 0], top, 2 * r);\n\
         rad = c$D / 2;\n\
         tip = c@p1 - [0, 0, 1];\n\
         len = mag(cross(dir, [1, 0, 0]));\n\
         z = tip.z;",
    );
    assert_relative_eq!(session.scalar("h").expect("h"), 9.0);
    assert_relative_eq!(session.vector("dir").expect("dir").y, 0.6);
    assert!(matches!(
        session.datum("ax").expect("axis"),
        Datum::Axis { direction, .. } if direction == DVec3::Z
    ));
    assert_eq!(backend.build_count(), 0);

    assert_relative_eq!(session.scalar("rad").expect("rad"), 2.0);
    assert_eq!(backend.build_count(), 1);
    assert_eq!(
        session.vector("tip").expect("tip"),
        DVec3::new(0.0, 0.0, 8.0)
    );
    assert_relative_eq!(session.scalar("len").expect("len"), 1.0);
    assert_relative_eq!(session.scalar("z").expect("z"), 8.0);
    assert_eq!(backend.build_count(), 1);
}

#[test]
fn sub_results_have_their_own_identity() {
    let (session, _) = loaded(
        "bx = Box([0, 0, 0], [1, 1, 1]);\n\
         moved = Translate(bx, [0, 0, 2]);\n\
         inner = moved!base;",
    );
    let inner = session.build("inner").expect("sub-result");
    let bx = session.build("bx").expect("box");
    assert!(Rc::ptr_eq(&inner, &bx));
    assert_ne!(
        session.structural_hash("inner").expect("hash"),
        session.structural_hash("bx").expect("hash")
    );
    assert!(matches!(
        session.feature("inner"),
        Err(BuildError::Evaluation(_))
    ));

    let (session, _) = loaded("bx = Box([0, 0, 0], [1, 1, 1]);\nbad = bx!nothing;");
    assert!(matches!(
        session.build("bad"),
        Err(BuildError::MissingSubResult { .. })
    ));
}

#[test]
fn selections_combine_ids_of_one_feature() {
    let (session, _) = loaded(
        "b = Box([0, 0, 0], [1, 1, 1]);\n\
         some = edges(b, \"0,2\") | edges(b, \"5\");\n\
         rest = edges(b) - some;\n\
         f = Fillet(some, 0.25);",
    );
    let some = session.selection("some").expect("selection");
    assert_eq!(some.kind, EntityKind::Edge);
    assert_eq!(some.ids.iter().copied().collect::<Vec<_>>(), vec![0, 2, 5]);
    assert_eq!(session.selection("rest").expect("selection").ids.len(), 9);

    let fillet = session.build("f").expect("fillet builds");
    assert_eq!(term(&fillet), "Fillet(edges{0,2,5}, 0.25)");

    let (session, _) = loaded(
        "a = Box([0, 0, 0], [1, 1, 1]);\n\
         b = Box([0, 0, 0], [2, 2, 2]);\n\
         mixed = edges(a) | edges(b);\n\
         kinds = edges(a) | faces(a);\n\
         wrong = faces(a, \"9\");",
    );
    assert!(matches!(
        session.selection("mixed"),
        Err(BuildError::IncompatibleSelections { .. })
    ));
    assert!(matches!(
        session.selection("kinds"),
        Err(BuildError::IncompatibleSelections { .. })
    ));
    assert!(matches!(
        session.selection("wrong"),
        Err(BuildError::Selection {
            source: BackendError::InvalidFilter(_),
            ..
        })
    ));
}

#[test]
fn place_accepts_plane_and_frame_forms() {
    let (session, backend) = loaded(
        "pl = Plane([0, 0, 5], [0, 0, 2]);\n\
         b = Box([0, 0, 0], [1, 1, 1]);\n\
         on_plane = Place(b, pl);\n\
         in_frame = Place(b, [0, 0, 5], [1, 0, 0], [0, 0, 1]);",
    );
    let on_plane = session.feature("on_plane").expect("feature");
    let in_frame = session.feature("in_frame").expect("feature");
    assert_eq!(on_plane.parameters().len(), 2);
    assert_eq!(in_frame.parameters().len(), 4);
    assert_ne!(
        session.structural_hash("on_plane").expect("hash"),
        session.structural_hash("in_frame").expect("hash")
    );
    let placed = session.build("on_plane").expect("builds");
    assert_eq!(
        term(&placed),
        "Place(Box([0, 0, 0], [1, 1, 1]), Plane([0, 0, 5], [0, 0, 1]))"
    );
    session.build("in_frame").expect("builds");
    assert_eq!(backend.build_count(), 3);
}

#[test]
fn place_rejects_points_and_axes() {
    let cases = [
        (
            "literal axis",
            "b = Box([0, 0, 0], [1, 1, 1]);\np = Place(b, Axis([0, 0, 0], [0, 0, 1]));",
            "axis",
            2,
        ),
        (
            "named point",
            "pt = Point([0, 0, 1]);\nb = Box([0, 0, 0], [1, 1, 1]);\np = Place(b, pt);",
            "point",
            3,
        ),
    ];
    for (case_name, src, found, line) in cases {
        let mut session = Session::new();
        let err = session.load_script(src).expect_err(case_name);
        assert_eq!(err.kind, CompileErrorKind::Syntax, "{case_name}");
        assert_eq!(err.line, line, "{case_name}");
        assert!(
            err.message.contains(&format!("expects a plane datum, found {found}")),
            "{case_name}: {}",
            err.message
        );
    }
}

#[test]
fn failures_propagate_with_their_root_cause() {
    let backend = Rc::new(SymbolicBackend::new().failing_on("Sphere"));
    let mut session =
        Session::with_config(SessionConfig::new().with_shared_backend(backend.clone()));
    session
        .load_script(
            "s = Sphere([0, 0, 0], 4);\n\
             t = Translate(s, [1, 0, 0]);\n\
             u = Union(t, Box([0, 0, 0], [1, 1, 1]));",
        )
        .expect("loads");

    let err = session.build("u").expect_err("sphere fails");
    assert_eq!(err.propagation_path(), vec!["u", "t"]);
    assert!(matches!(
        err.root_cause(),
        BuildError::Backend { feature, source: BackendError::OperationFailed(_) } if feature == "s"
    ));
    assert_eq!(backend.build_count(), 1);

    // Failures are memoized, not retried.
    session.build("u").expect_err("still failing");
    session.build("t").expect_err("still failing");
    assert_eq!(backend.build_count(), 1);
    assert_eq!(
        session.feature("s").expect("feature").status(),
        BuildStatus::Failed
    );
}

#[test]
fn infeasible_constructions_fail_as_backend_errors() {
    let (session, _) = loaded("s = Sphere([0, 0, 0], 1 - 1);");
    let err = session.build("s").expect_err("zero diameter");
    assert!(matches!(
        err,
        BuildError::Backend {
            source: BackendError::Infeasible(_),
            ..
        }
    ));
}

#[test]
fn cycles_are_reported_as_circular_dependencies() {
    let (session, backend) = loaded(
        "a = Translate(b, [1, 0, 0]);\n\
         b = Translate(a, [0, 1, 0]);",
    );
    let err = session.build("a").expect_err("cycle");
    assert!(matches!(
        err.root_cause(),
        BuildError::CircularDependency { .. }
    ));
    assert_eq!(backend.build_count(), 0);

    let (session, _) = loaded("x = y;\ny = x;");
    let err = session.build("x").expect_err("alias cycle");
    assert!(matches!(
        err.root_cause(),
        BuildError::CircularDependency { .. }
    ));
}

#[test]
fn unresolved_feature_names_fail_at_build_time() {
    let (session, _) = loaded("t = Translate(missing, [1, 0, 0]);");
    let err = session.build("t").expect_err("missing");
    assert!(matches!(
        err.root_cause(),
        BuildError::UnresolvedReference { kind: SymbolKind::Feature, name } if name == "missing"
    ));
}

#[test]
fn forward_references_build_once_bound() {
    let (mut session, backend) = loaded("t = Translate(later, [1, 0, 0]);");
    let err = session.build("t").expect_err("later is unbound");
    assert!(matches!(
        err.root_cause(),
        BuildError::UnresolvedReference { name, .. } if name == "later"
    ));
    assert_eq!(
        session.feature("t").expect("feature").status(),
        BuildStatus::Unbuilt
    );

    session
        .load_script("later = Box([0, 0, 0], [1, 1, 1]);")
        .expect("script should load");
    let built = session.build("t").expect("builds once bound");
    assert_eq!(term(&built), "Translate(Box([0, 0, 0], [1, 1, 1]), [1, 0, 0])");
    assert_eq!(
        session.feature("t").expect("feature").status(),
        BuildStatus::Built
    );
    assert_eq!(backend.build_count(), 2);
}

#[test]
fn exports_select_outputs_in_statement_order() {
    let (session, _) = loaded(
        "a = Box([0, 0, 0], [1, 1, 1]);\n\
         b = Sphere([0, 0, 0], 2);\n\
         export a as \"out/a.step\";\n\
         export Translate(b, [1, 0, 0]);",
    );
    let outputs = session.outputs();
    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs[0].label, "a");
    assert_eq!(outputs[0].path.as_deref(), Some("out/a.step"));
    assert_eq!(outputs[1].label, "Translate@4:8");
    assert_eq!(outputs[1].path, None);

    let built = session.build_outputs().expect("outputs build");
    assert_eq!(built.len(), 2);
    assert_eq!(built[0].hash, session.structural_hash("a").expect("hash"));
}

#[test]
fn last_feature_is_the_default_output() {
    let (session, _) = loaded(
        "a = Box([0, 0, 0], [1, 1, 1]);\n\
         b = Sphere([0, 0, 0], 2);\n\
         v = [1, 0, 0];",
    );
    let outputs = session.outputs();
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].label, "b");

    let (session, _) = loaded("x = 1;");
    assert!(matches!(session.build_outputs(), Err(BuildError::NoOutputs)));
}

#[test]
fn evaluate_script_reports_compile_and_build_errors() {
    let backend: Rc<dyn GeometryBackend> = Rc::new(SymbolicBackend::new());
    let outputs = evaluate_script("b = Box([0, 0, 0], [1, 1, 1]);", backend.clone())
        .expect("evaluates");
    assert_eq!(outputs[0].label, "b");

    assert!(matches!(
        evaluate_script("b = Box(;", backend),
        Err(ScriptError::Compile(_))
    ));
    assert!(matches!(
        evaluate_script("b = Box([0, 0, 0], [1, 1, 1]);", Rc::new(NullBackend)),
        Err(ScriptError::Build(BuildError::Backend {
            source: BackendError::KernelNotAvailable(_),
            ..
        }))
    ));
}

#[test]
fn shared_cache_spans_sessions() {
    let backend = Rc::new(SymbolicBackend::new());
    let cache = ResultCache::new();
    let config = SessionConfig::new()
        .with_shared_backend(backend.clone())
        .with_cache_scope(CacheScope::Shared(cache.clone()));
    let src = "b = Box([0, 0, 0], [1, 1, 1]);";

    let mut first = Session::with_config(config.clone());
    first.load_script(src).expect("loads");
    first.build("b").expect("builds");
    let mut second = Session::with_config(config);
    second.load_script(src).expect("loads");
    second.build("b").expect("builds");

    assert_eq!(backend.build_count(), 1);
    assert_eq!(cache.stats().hits, 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn disabled_cache_builds_every_feature() {
    let backend = Rc::new(SymbolicBackend::new());
    let mut session = Session::with_config(
        SessionConfig::new()
            .with_shared_backend(backend.clone())
            .with_cache_scope(CacheScope::Disabled),
    );
    session
        .load_script("a = Box([0, 0, 0], [1, 1, 1]);\nb = Box([0, 0, 0], [1, 1, 1]);")
        .expect("loads");
    session.build("a").expect("builds");
    session.build("b").expect("builds");
    assert_eq!(backend.build_count(), 2);
    assert!(session.engine().cache().is_empty());
}

#[test]
fn loads_multi_file_project() {
    let (mut session, backend) = symbolic_session();
    let sources = vec![
        ScriptSource::new(
            "main.cad",
            "import \"lib/parts.cad\";\nbody = Union(base, Box([0, 0, 0], [1, 1, 1]));",
        ),
        ScriptSource::new(
            "lib/parts.cad",
            "import \"../shared/dims.cad\";\nbase = Sphere([0, 0, 0], size);",
        ),
        ScriptSource::new("shared/dims.cad", "size = 3;"),
    ];
    session.load_project("main.cad", &sources).expect("project loads");
    assert_eq!(
        session.names().collect::<Vec<_>>(),
        vec!["size", "base", "body"]
    );
    assert!(session.model().is_loaded("lib/parts.cad"));
    session.build("body").expect("builds");
    assert_eq!(backend.build_count(), 3);

    // Loaded modules are skipped on later loads.
    let more = vec![
        ScriptSource::new("extra.cad", "import \"shared/dims.cad\";\nbig = 2 * size;"),
        ScriptSource::new("shared/dims.cad", "size = 3;"),
    ];
    session.load_project("extra.cad", &more).expect("extra loads");
    assert_relative_eq!(session.scalar("big").expect("big"), 6.0);
}

#[test]
fn reports_import_cycles_with_the_chain() {
    let mut session = Session::new();
    let sources = vec![
        ScriptSource::new("a.cad", "import \"b.cad\";\nx = 1;"),
        ScriptSource::new("b.cad", "import \"a.cad\";\ny = 2;"),
    ];
    let err = session.load_project("a.cad", &sources).expect_err("cycle");
    assert_eq!(err.kind, CompileErrorKind::Import);
    assert!(
        err.message
            .contains("Import cycle detected: a.cad -> b.cad -> a.cad"),
        "{}",
        err.message
    );
    assert_eq!(err.file, "b.cad");
    assert_eq!(session.names().count(), 0);
}

#[test]
fn reports_missing_import_with_callsite_location() {
    let mut session = Session::new();
    let sources = vec![ScriptSource::new(
        "main.cad",
        "x = 1;\n",
    )];
    let err = session
        .load_project("other.cad", &sources)
        .expect_err("entry missing");
    assert!(err.message.contains("Entry source 'other.cad' was not provided"));

    let sources = vec![ScriptSource::new(
        "main.cad",
        "// parts\nimport \"missing.cad\";\nx = 1;",
    )];
    let err = session
        .load_project("main.cad", &sources)
        .expect_err("import missing");
    assert_eq!(err.kind, CompileErrorKind::Import);
    assert_eq!(err.line, 2);
    assert_eq!(err.column, 1);
    assert!(err.message.contains("Failed to load import 'missing.cad'"));
}

#[test]
fn imports_must_lead_the_module() {
    let mut session = Session::new();
    let sources = vec![
        ScriptSource::new("main.cad", "x = 1;\nimport \"b.cad\";"),
        ScriptSource::new("b.cad", "y = 2;"),
    ];
    let err = session
        .load_project("main.cad", &sources)
        .expect_err("late import");
    assert!(err.message.contains("imports must precede"));
    assert_eq!(err.line, 2);

    let err = session
        .load_script("import \"b.cad\";\nx = 1;")
        .expect_err("no loader");
    assert_eq!(err.kind, CompileErrorKind::Import);
    assert!(err.message.contains("no loader configured"));
}

#[test]
fn custom_feature_types_extend_the_grammar() {
    const SLOT: &[Param] = &[
        Param::required("base", ParamKind::Feature),
        Param::required("width", ParamKind::Scalar),
        Param::optional("depth", ParamKind::Scalar, Fallback::Scalar(1.0)),
    ];
    let mut registry = FeatureRegistry::with_builtins();
    registry
        .register(FeatureTypeDescriptor::new("Slot", SLOT, "Cuts a slot."))
        .expect("registers");

    let backend = Rc::new(SymbolicBackend::new());
    let mut session = Session::with_config(
        SessionConfig::new()
            .with_shared_backend(backend.clone())
            .with_registry(registry),
    );
    session
        .load_script("s = Slot(Box([0, 0, 0], [4, 4, 4]), 2);")
        .expect("custom type parses");
    let slot = session.build("s").expect("builds");
    assert_eq!(term(&slot), "Slot(Box([0, 0, 0], [4, 4, 4]), 2, 1)");
    assert!(session.registry().documentation().contains("Slot(base: feature"));

    let mut plain = Session::new();
    let err = plain
        .load_script("s = Slot(Box([0, 0, 0], [4, 4, 4]), 2);")
        .expect_err("not registered globally");
    assert_eq!(err.kind, CompileErrorKind::UnknownFeatureType);
}

#[test]
fn comments_and_inline_features_parse() {
    let (session, _) = loaded(
        "# dimensions\n\
         w = 4; // width\n\
         part = Union(Box([0, 0, 0], [w, w, w]), Sphere([0, 0, 0], w), Cone([0, 0, 0], [0, 0, w], w, 0));\n\
         ring = Revolve(Box([1, 0, 0], [1, 1, 1]), Axis([0, 0, 0], [0, 0, 1]));",
    );
    let part = session.build("part").expect("union builds");
    assert_eq!(part.sub_results.len(), 3);
    assert!(part.sub_results.contains_key("operands2"));
    let ring = session.build("ring").expect("revolve builds");
    assert_relative_eq!(ring.values["angle"], std::f64::consts::TAU);
}
