mod common;

use autodeps_core::{AutodepsConfig, AutodepsError};
use autodeps_indexer::{load_graph, GraphSource, IndexBuilder, PathResolver};
use common::*;

#[test]
fn java_library_jar_is_indexed_with_aliases_and_skips() {
    let layout = Layout::new();
    write_jar(
        &layout.bin().join("a/liba.jar"),
        &["com.x.Foo", "com.x.Bar"],
    );
    let graph = FakeGraph::new();
    let config = AutodepsConfig::default();

    let json = snapshot(vec![
        rule(
            "//a:a",
            "java_library",
            vec![
                list_attr("visibility", &["//visibility:public"]),
                list_attr("exports", &["//b:b"]),
            ],
            &["//a:liba.jar", "//a:liba-src.jar"],
        ),
        rule(
            "//a:a_alias",
            "alias",
            vec![string_attr("actual", "//a:a")],
            &[],
        ),
        rule("//gen:one", "genrule", vec![], &["//gen:one.txt"]),
        rule("//gen:two", "genrule", vec![], &["//gen:two.txt"]),
        source_file("//a:Foo.java", "/ws/a/Foo.java:1:1"),
    ]);

    let outcome = IndexBuilder::new(&graph, &layout.workspace, &config)
        .build_from_json(&json)
        .expect("index build should succeed");

    let index = outcome.index;
    assert_eq!(index.libraries().len(), 1);
    let lib = index.library("//a:a").unwrap();
    assert_eq!(lib.classes(), ["com.x.Foo", "com.x.Bar"]);
    assert_eq!(lib.archive_refs(), ["//a:liba.jar"]);
    assert_eq!(
        lib.visibility(),
        Some(&["//visibility:public".to_string()][..])
    );
    assert_eq!(lib.exports(), Some(&["//b:b".to_string()][..]));
    assert_eq!(index.alias().get("//a:a_alias"), Some("//a:a"));

    assert_eq!(outcome.report.skipped_kinds.len(), 1);
    assert!(outcome.report.skipped_kinds.contains("genrule"));
    assert!(index.library("//gen:one").is_none());
    assert!(graph.builds.borrow().is_empty());
}

#[test]
fn first_candidate_root_wins() {
    let layout = Layout::new();
    let graph = FakeGraph::new();
    write_jar(&layout.base().join("a/a.jar"), &["com.x.InBase"]);
    write_jar(&layout.bin().join("a/a.jar"), &["com.x.InBin"]);

    let resolver = PathResolver::new(&layout.workspace, &graph);
    assert_eq!(
        resolver.resolve("//a:a.jar", "//a:a").unwrap(),
        layout.base().join("a/a.jar")
    );

    write_jar(&layout.root().join("a/a.jar"), &["com.x.InRoot"]);
    assert_eq!(
        resolver.resolve("//a:a.jar", "//a:a").unwrap(),
        layout.root().join("a/a.jar")
    );
    assert!(graph.builds.borrow().is_empty());
}

#[test]
fn external_and_generated_references_are_probed() {
    let layout = Layout::new();
    let graph = FakeGraph::new();
    write_jar(
        &layout.base().join("external/scala_2_12/lib/jline.jar"),
        &["jline.Terminal"],
    );
    write_jar(
        &layout.root().join("bazel-out/k8-fastbuild/bin/p/libp.jar"),
        &["p.P"],
    );

    let resolver = PathResolver::new(&layout.workspace, &graph);
    assert_eq!(
        resolver.resolve("@scala_2_12//:lib/jline.jar", "@scala_2_12//:jline").unwrap(),
        layout.base().join("external/scala_2_12/lib/jline.jar")
    );
    assert_eq!(
        resolver.guess("bazel-out/k8-fastbuild/bin/p/libp.jar"),
        Some(layout.root().join("bazel-out/k8-fastbuild/bin/p/libp.jar"))
    );
}

#[test]
fn missing_output_is_built_once_per_rule() {
    let layout = Layout::new();
    let graph = FakeGraph::new()
        .on_build("//w:w", layout.bin().join("w/w_deploy.jar"), &["w.Main"])
        .with_outputs("//w:w_missing.jar", &[]);

    let resolver = PathResolver::new(&layout.workspace, &graph);
    assert_eq!(
        resolver.resolve("//w:w_deploy.jar", "//w:w").unwrap(),
        layout.bin().join("w/w_deploy.jar")
    );

    let err = resolver.resolve("//w:w_missing.jar", "//w:w").unwrap_err();
    assert!(matches!(err, AutodepsError::UnresolvableArchive { .. }));
    assert_eq!(*graph.builds.borrow(), vec!["//w:w"]);
    assert_eq!(resolver.built_rules(), 1);
}

#[test]
fn output_query_is_the_last_resort() {
    let layout = Layout::new();
    write_jar(
        &layout.base().join("execroot/ws/bazel-out/bin/t/t.jar"),
        &["t.T"],
    );
    let graph = FakeGraph::new()
        .with_outputs("//t:t.jar", &["execroot/ws/bazel-out/bin/t/t.jar"])
        .with_outputs("//u:u.jar", &["a/u.jar", "b/u.jar"]);

    let resolver = PathResolver::new(&layout.workspace, &graph);
    assert_eq!(
        resolver.resolve("//t:t.jar", "//t:t").unwrap(),
        layout.base().join("execroot/ws/bazel-out/bin/t/t.jar")
    );
    assert_eq!(*graph.builds.borrow(), vec!["//t:t"]);

    // Two candidate locations: nothing is guessed.
    let err = resolver.resolve("//u:u.jar", "//u:u").unwrap_err();
    assert!(matches!(err, AutodepsError::UnresolvableArchive { .. }));
}

#[test]
fn imports_fall_back_to_queried_outputs() {
    let layout = Layout::new();
    write_jar(&layout.root().join("third_party/guava.jar"), &["com.google.Guava"]);
    write_jar(
        &layout.root().join("bazel-out/bin/m/processed.jar"),
        &["m.Processed"],
    );
    let graph = FakeGraph::new().with_outputs(
        "//m:m",
        &["bazel-out/bin/m/processed.jar", "bazel-out/bin/m/m.jdeps"],
    );
    let config = AutodepsConfig::default();

    let json = snapshot(vec![
        rule(
            "//third_party:guava",
            "java_import",
            vec![list_attr("jars", &["//third_party:guava.jar"])],
            &[],
        ),
        rule(
            "//m:m",
            "java_import",
            vec![list_attr("jars", &["//m:not_there.jar"])],
            &[],
        ),
    ]);

    let index = IndexBuilder::new(&graph, &layout.workspace, &config)
        .build_from_json(&json)
        .unwrap()
        .index;

    assert_eq!(
        index.library("//third_party:guava").unwrap().archive_refs(),
        ["//third_party:guava.jar"]
    );
    let m = index.library("//m:m").unwrap();
    assert_eq!(m.archive_refs(), ["bazel-out/bin/m/processed.jar"]);
    assert_eq!(m.classes(), ["m.Processed"]);
    assert_eq!(*graph.output_queries.borrow(), vec!["//m:m"]);
}

#[test]
fn jar_generators_always_query_outputs() {
    let layout = Layout::new();
    write_jar(
        &layout.root().join("bazel-out/bin/proto/libfoo-speed.jar"),
        &["proto.FooProto"],
    );
    let graph = FakeGraph::new().with_outputs(
        "//proto:foo_java_proto",
        &["bazel-out/bin/proto/libfoo-speed.jar"],
    );
    let config = AutodepsConfig::default();

    let json = snapshot(vec![rule(
        "//proto:foo_java_proto",
        "java_proto_library",
        vec![],
        &[],
    )]);
    let index = IndexBuilder::new(&graph, &layout.workspace, &config)
        .build_from_json(&json)
        .unwrap()
        .index;

    assert_eq!(
        index.library("//proto:foo_java_proto").unwrap().classes(),
        ["proto.FooProto"]
    );
}

#[test]
fn unreadable_library_keeps_descriptor_without_classes() {
    let layout = Layout::new();
    write_jar(&layout.bin().join("ok/libok.jar"), &["ok.Ok"]);
    std::fs::create_dir_all(layout.bin().join("bad")).unwrap();
    std::fs::write(layout.bin().join("bad/libbad.jar"), b"not a jar").unwrap();
    let graph = FakeGraph::new();
    let config = AutodepsConfig::default();

    let json = snapshot(vec![
        rule("//bad:bad", "java_library", vec![], &["//bad:libbad.jar"]),
        rule("//gone:gone", "java_library", vec![], &["//gone:libgone.jar"]),
        rule("//ok:ok", "java_library", vec![], &["//ok:libok.jar"]),
        rule("//empty:empty", "java_library", vec![], &[]),
    ]);
    let outcome = IndexBuilder::new(&graph, &layout.workspace, &config)
        .build_from_json(&json)
        .unwrap();

    let index = &outcome.index;
    assert_eq!(index.libraries().len(), 4);
    assert!(index.library("//bad:bad").unwrap().classes().is_empty());
    assert!(index.library("//gone:gone").unwrap().classes().is_empty());
    assert!(index.library("//empty:empty").unwrap().classes().is_empty());
    assert_eq!(index.library("//ok:ok").unwrap().classes(), ["ok.Ok"]);

    let failed: Vec<_> = outcome
        .report
        .failures
        .iter()
        .map(|f| f.library.as_str())
        .collect();
    assert_eq!(failed, vec!["//bad:bad", "//gone:gone"]);
}

#[test]
fn failed_build_aborts_the_run() {
    let layout = Layout::new();
    let graph = FakeGraph::new().failing_build("//a:a");
    let config = AutodepsConfig::default();

    let json = snapshot(vec![rule(
        "//a:a",
        "java_library",
        vec![],
        &["//a:liba.jar"],
    )]);
    let err = IndexBuilder::new(&graph, &layout.workspace, &config)
        .build_from_json(&json)
        .unwrap_err();
    assert!(matches!(err, AutodepsError::BuildFailed { .. }));
}

#[test]
fn excluded_libraries_are_not_scanned() {
    let layout = Layout::new();
    let graph = FakeGraph::new();
    let config = AutodepsConfig::default();

    let json = snapshot(vec![rule(
        "@debezium_1_7//:compile_time_only_dependencies",
        "java_import",
        vec![list_attr("jars", &["/absolute/does/not/exist.jar"])],
        &[],
    )]);
    let outcome = IndexBuilder::new(&graph, &layout.workspace, &config)
        .build_from_json(&json)
        .unwrap();

    let lib = outcome
        .index
        .library("@debezium_1_7//:compile_time_only_dependencies")
        .unwrap();
    assert!(lib.classes().is_empty());
    assert_eq!(lib.archive_refs(), ["/absolute/does/not/exist.jar"]);
    assert_eq!(outcome.report.excluded.len(), 1);
    assert!(outcome.report.failures.is_empty());
    assert!(graph.builds.borrow().is_empty());
    assert!(graph.output_queries.borrow().is_empty());
}

#[test]
fn excluded_jar_generators_are_never_queried() {
    let layout = Layout::new();
    let graph = FakeGraph::new().with_outputs(
        "//proto:foo_java_proto",
        &["bazel-out/bin/proto/libfoo-speed.jar"],
    );
    let mut config = AutodepsConfig::default();
    config.index.exclude.push("//proto:foo_java_proto".into());

    let json = snapshot(vec![rule(
        "//proto:foo_java_proto",
        "java_proto_library",
        vec![],
        &[],
    )]);
    let outcome = IndexBuilder::new(&graph, &layout.workspace, &config)
        .build_from_json(&json)
        .unwrap();

    let lib = outcome.index.library("//proto:foo_java_proto").unwrap();
    assert!(lib.archive_refs().is_empty());
    assert!(lib.classes().is_empty());
    assert_eq!(outcome.report.excluded, vec!["//proto:foo_java_proto"]);
    assert!(graph.output_queries.borrow().is_empty());
}

#[test]
fn alias_without_actual_is_malformed_not_skipped() {
    let layout = Layout::new();
    let graph = FakeGraph::new();
    let config = AutodepsConfig::default();

    let json = snapshot(vec![
        rule("//a:dangling", "alias", vec![], &[]),
        rule("//gen:one", "genrule", vec![], &["//gen:one.txt"]),
    ]);
    let outcome = IndexBuilder::new(&graph, &layout.workspace, &config)
        .build_from_json(&json)
        .unwrap();

    assert!(outcome.index.alias().is_empty());
    assert_eq!(outcome.report.malformed, vec!["//a:dangling"]);
    assert_eq!(
        outcome.report.skipped_kinds.iter().collect::<Vec<_>>(),
        vec!["genrule"]
    );
    assert!(!outcome.report.skipped_kinds.contains("alias"));
}

#[test]
fn shared_classes_keep_traversal_order() {
    let layout = Layout::new();
    write_jar(&layout.bin().join("y/liby.jar"), &["com.x.C"]);
    write_jar(&layout.bin().join("x/libx.jar"), &["com.x.C", "com.x.D"]);
    let graph = FakeGraph::new();
    let config = AutodepsConfig::default();

    let json = snapshot(vec![
        rule("//y:y", "java_library", vec![], &["//y:liby.jar"]),
        rule("//x:x", "java_library", vec![], &["//x:libx.jar"]),
    ]);
    let index = IndexBuilder::new(&graph, &layout.workspace, &config)
        .build_from_json(&json)
        .unwrap()
        .index;

    assert_eq!(index.class_index().providers("com.x.C"), ["//y:y", "//x:x"]);
}

#[test]
fn graph_source_snapshot_and_seed() {
    let layout = Layout::new();
    let graph = FakeGraph::new();
    let file = layout.root().join("graph.json");
    let json = snapshot(vec![rule("//a:a", "java_library", vec![], &[])]);
    std::fs::write(&file, &json).unwrap();

    let loaded = load_graph(&GraphSource::Snapshot(file), &graph).unwrap();
    assert_eq!(loaded, json);
    assert!(graph.builds.borrow().is_empty());

    // The seed is built before its dependencies are queried.
    let err = load_graph(&GraphSource::Seed("//common:common".into()), &graph).unwrap_err();
    assert!(matches!(err, AutodepsError::GraphQueryFailed { .. }));
    assert_eq!(*graph.builds.borrow(), vec!["//common:common"]);
}
