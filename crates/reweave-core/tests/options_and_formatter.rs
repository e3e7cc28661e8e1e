//! Loading `.reweave.toml` from disk, and plugging a custom formatter
//! into generation for a tree built by hand

use std::fs;

use reweave_core::config::{IndentStyle, CONFIG_FILE_NAME};
use reweave_core::{
    apply_edits, open, ConfigError, FormatOptions, Formatter, FreshNode, NodeKind, NodeSpec,
    Property, Slot, SyntaxTree, TreeBuilder,
};
use tempfile::TempDir;

#[test]
fn test_load_from_searches_parent_directories() {
    let temp = TempDir::new().unwrap();
    let nested = temp.path().join("src").join("deep");
    fs::create_dir_all(&nested).unwrap();
    let config_path = temp.path().join(CONFIG_FILE_NAME);
    fs::write(&config_path, "[whitespace]\nindent = \"tabs\"\n").unwrap();

    let (options, found) = FormatOptions::load_from(&nested).unwrap().unwrap();
    assert_eq!(found, config_path);
    assert_eq!(options.whitespace.indent, IndentStyle::Tabs);
    assert_eq!(options.indent_unit(), "\t");
}

#[test]
fn test_load_from_without_config() {
    let temp = TempDir::new().unwrap();
    assert!(FormatOptions::load_from(temp.path()).unwrap().is_none());
}

#[test]
fn test_load_path_reports_the_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(CONFIG_FILE_NAME);
    fs::write(&path, "[braces]\ncuddle_else = \"sometimes\"\n").unwrap();

    match FormatOptions::load_path(&path) {
        Err(ConfigError::Parse { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected a parse error, got {other:?}"),
    }
    assert!(matches!(
        FormatOptions::load_path(&temp.path().join("missing.toml")),
        Err(ConfigError::Io { .. })
    ));
}

/// `f(a);` built the way an external parser would
fn call_tree() -> SyntaxTree {
    let source = "f(a);";
    let mut builder = TreeBuilder::new(source);
    let f = builder
        .push(NodeSpec::new(NodeKind::SimpleName, 0..1).property(Property::Identifier, "f", 0..1))
        .unwrap();
    let a = builder
        .push(NodeSpec::new(NodeKind::SimpleName, 2..3).property(Property::Identifier, "a", 2..3))
        .unwrap();
    let call = builder
        .push(
            NodeSpec::new(NodeKind::MethodInvocation, 0..4)
                .child(Slot::Name, f)
                .list(Slot::Arguments, vec![a]),
        )
        .unwrap();
    let statement = builder
        .push(NodeSpec::new(NodeKind::ExpressionStatement, 0..5).child(Slot::Expression, call))
        .unwrap();
    let root = builder
        .push(NodeSpec::new(NodeKind::CompilationUnit, 0..5).list(Slot::Statements, vec![statement]))
        .unwrap();
    builder.finish(root).unwrap()
}

struct Marking;

impl Formatter for Marking {
    fn format(&self, text: &str, _indent_level: usize, kind: NodeKind) -> String {
        format!("<{kind}:{text}>")
    }
}

#[test]
fn test_custom_formatter_sees_fresh_nodes() {
    let tree = call_tree();
    let call = tree[tree[tree.root()].list(Slot::Statements)[0]]
        .child(Slot::Expression)
        .unwrap();
    let mut state = open(&tree);
    let b = state.create(FreshNode::name("b")).unwrap();
    state.list(call, Slot::Arguments).unwrap().insert_last(b).unwrap();

    let edits = state
        .generate_with(&FormatOptions::default(), &Marking)
        .unwrap();
    assert_eq!(
        apply_edits(tree.source(), &edits).unwrap(),
        "f(a, <SimpleName:b>);"
    );
}
