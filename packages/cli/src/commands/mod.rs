pub mod check;
pub mod import;
pub mod render;

pub use check::{check, CheckArgs};
pub use import::{import, ImportArgs};
pub use render::{render, RenderArgs};

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub(crate) fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}

/// Write to `out`, or stdout when no file is given. Returns where the
/// output went.
pub(crate) fn write_output(out: Option<&Path>, content: &str) -> Result<String> {
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, content)?;
            Ok(path.display().to_string())
        }
        None => {
            println!("{}", content);
            Ok("stdout".to_string())
        }
    }
}
