use super::read_input;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use quire_editor::EditorState;
use quire_model::Tree;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// JSON snapshot to inspect
    pub input: PathBuf,

    /// Fail when node types were skipped
    #[arg(long)]
    pub strict: bool,
}

/// Attached nodes per type tag, the root included
pub fn count_nodes(tree: &Tree) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for key in tree.preorder() {
        if let Some(node) = tree.get(key) {
            *counts.entry(node.type_name()).or_insert(0) += 1;
        }
    }
    counts
}

pub fn check(args: CheckArgs) -> Result<()> {
    println!("🔍 {} {}", "Checking".green().bold(), args.input.display());
    let source = read_input(&args.input)?;
    let (state, skipped) = EditorState::from_json_str(&source)?;

    state.tree().validate()?;
    for (node_type, count) in count_nodes(state.tree()) {
        println!("   {:<12} {}", node_type, count);
    }

    if skipped.is_empty() {
        println!("   {} no unknown node types", "✓".green());
        return Ok(());
    }
    println!("   {} {} skipped:", "⚠".yellow(), skipped.len());
    for node_type in &skipped {
        println!("     {}", node_type.yellow());
    }
    if args.strict {
        return Err(anyhow!("{} unknown node types", skipped.len()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_model::Fragment;

    #[test]
    fn test_count_nodes() {
        let tree = Tree::from_fragment(
            &Fragment::root()
                .with_child(Fragment::paragraph().with_child(Fragment::text("a")))
                .with_child(Fragment::paragraph().with_child(Fragment::text("b"))),
        )
        .unwrap();

        let counts = count_nodes(&tree);
        assert_eq!(counts.get("root"), Some(&1));
        assert_eq!(counts.get("paragraph"), Some(&2));
        assert_eq!(counts.get("text"), Some(&2));
    }
}
