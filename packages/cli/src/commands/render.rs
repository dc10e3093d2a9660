use super::{read_input, write_output};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use quire_editor::{Editor, EditorConfig, RenderOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// JSON snapshot to render
    pub input: PathBuf,

    /// Indent block elements
    #[arg(long)]
    pub pretty: bool,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

pub fn render(args: RenderArgs, cwd: &Path) -> Result<()> {
    let config = EditorConfig::load_dir(cwd)?;
    debug!(namespace = %config.namespace, "loaded config");
    let source = read_input(&args.input)?;

    let (editor, skipped) = Editor::from_json_str(config, &source)?;
    for node_type in &skipped {
        eprintln!("  {} skipped unknown node type {}", "⚠".yellow(), node_type.bold());
    }

    let options = RenderOptions {
        pretty: args.pretty,
        ..RenderOptions::default()
    };
    let html = editor.render_html(&options)?;
    let target = write_output(args.out.as_deref(), &html)?;
    if args.out.is_some() {
        println!("  {} {} → {}", "✓".green(), args.input.display(), target);
    }
    Ok(())
}
