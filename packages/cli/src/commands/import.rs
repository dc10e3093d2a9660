use super::{read_input, write_output};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use quire_editor::EditorState;
use quire_html::{import_html, ConversionMap};
use quire_model::Tree;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// HTML page to convert
    pub input: PathBuf,

    /// Compact JSON instead of pretty-printed
    #[arg(long)]
    pub compact: bool,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Snapshot JSON for an HTML document
pub fn html_to_snapshot(html: &str, pretty: bool) -> Result<String> {
    let fragment = import_html(html, &ConversionMap::default());
    let mut tree = Tree::from_fragment(&fragment)?;
    tree.ensure_block()?;
    Ok(EditorState::new(tree, None).to_json_string(pretty)?)
}

pub fn import(args: ImportArgs) -> Result<()> {
    let html = read_input(&args.input)?;
    let json = html_to_snapshot(&html, !args.compact)?;
    let target = write_output(args.out.as_deref(), &json)?;
    if args.out.is_some() {
        println!("  {} {} → {}", "✓".green(), args.input.display(), target);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_snapshot() {
        let json = html_to_snapshot("<h2>Title</h2><p>Body <b>text</b></p>", false).unwrap();
        let (state, skipped) = EditorState::from_json_str(&json).unwrap();
        assert!(skipped.is_empty());
        let text = state.text_content();
        assert!(text.starts_with("Title"), "{}", text);
        assert!(text.ends_with("text"), "{}", text);
        assert_eq!(state.tree().children(state.tree().root()).len(), 2);
    }

    #[test]
    fn test_empty_page_still_has_a_block() {
        let json = html_to_snapshot("", false).unwrap();
        let (state, _) = EditorState::from_json_str(&json).unwrap();
        assert_eq!(state.tree().children(state.tree().root()).len(), 1);
    }
}
