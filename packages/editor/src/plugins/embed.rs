//! # Embeds
//!
//! URL-based embeds. Each [`EmbedConfig`] recognises URLs of one provider
//! and knows which command inserts the matched content. `INSERT_EMBED`
//! tries every config in order; the embed popover asks for a URL of one
//! specific provider.

use super::Popover;
use crate::builtins::run;
use crate::commands::{CommandPriority, Disposer, INSERT_EMBED, INSERT_YOUTUBE, SHOW_EMBED_DIALOG};
use crate::editor::Editor;
use crate::palette::{PaletteCategory, PaletteCommand};
use quire_model::NodeKind;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

pub const YOUTUBE_EMBED_TYPE: &str = "youtube-video";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedMatch {
    pub id: String,
    pub url: String,
}

#[derive(Debug)]
pub struct EmbedConfig {
    pub kind: &'static str,
    pub content_name: &'static str,
    pub example_url: &'static str,
    pub keywords: &'static [&'static str],
    pub parse_url: fn(&str) -> Option<EmbedMatch>,
    pub insert: fn(&mut Editor, &EmbedMatch) -> bool,
}

pub static YOUTUBE_EMBED: EmbedConfig = EmbedConfig {
    kind: YOUTUBE_EMBED_TYPE,
    content_name: "Youtube Video",
    example_url: "https://www.youtube.com/watch?v=jNQXAC9IVRw",
    keywords: &["youtube", "video"],
    parse_url: parse_youtube_url,
    insert: insert_youtube,
};

pub static EMBED_CONFIGS: [&EmbedConfig; 1] = [&YOUTUBE_EMBED];

fn youtube_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"^.*(youtu\.be/|v/|u/\w/|embed/|watch\?v=|&v=)([^#&?]*).*").ok()
        })
        .as_ref()
}

/// Video id of a YouTube URL; ids are always 11 characters
pub fn parse_youtube_url(url: &str) -> Option<EmbedMatch> {
    let captures = youtube_pattern()?.captures(url)?;
    let id = captures.get(2)?.as_str();
    (id.chars().count() == 11).then(|| EmbedMatch {
        id: id.to_string(),
        url: url.to_string(),
    })
}

fn insert_youtube(editor: &mut Editor, found: &EmbedMatch) -> bool {
    editor.dispatch(INSERT_YOUTUBE, found.id.clone())
}

/// First config recognising `url`
pub fn find_embed(url: &str) -> Option<(&'static EmbedConfig, EmbedMatch)> {
    EMBED_CONFIGS
        .iter()
        .find_map(|config| (config.parse_url)(url).map(|found| (*config, found)))
}

pub fn embed_config(kind: &str) -> Option<&'static EmbedConfig> {
    EMBED_CONFIGS.iter().copied().find(|config| config.kind == kind)
}

/// Popover asking for the URL of one embed provider
#[derive(Debug, Clone, Default)]
pub struct EmbedDialog {
    popover: Popover<&'static EmbedConfig>,
}

impl EmbedDialog {
    pub fn register(editor: &Editor) -> (Self, Disposer) {
        let dialog = Self::default();

        let priority = CommandPriority::Editor;
        let youtube = editor.register_command(INSERT_YOUTUBE, priority, |editor, id| {
            let kind = NodeKind::youtube(id.clone());
            run(editor, move |tx| {
                tx.insert_block(kind)?;
                Ok(true)
            })
        });

        let embed = editor.register_command(INSERT_EMBED, priority, |editor, url| {
            match find_embed(url) {
                Some((config, found)) => (config.insert)(editor, &found),
                None => {
                    debug!(url = %url, "no embed provider for url");
                    false
                }
            }
        });

        let show = {
            let popover = dialog.popover.clone();
            editor.register_command(SHOW_EMBED_DIALOG, CommandPriority::Low, move |_, kind| {
                match embed_config(kind) {
                    Some(config) => {
                        popover.open(config);
                        true
                    }
                    None => false,
                }
            })
        };

        let palette = editor.palette().register(
            PaletteCommand::new("insert_youtube_command", "Youtube", |editor| {
                editor.dispatch(SHOW_EMBED_DIALOG, YOUTUBE_EMBED_TYPE.to_string());
                Ok(())
            })
            .with_description("Insert a Youtube video")
            .with_keywords(&["youtube"])
            .with_icon("youtube")
            .with_category(PaletteCategory::Media),
        );

        (dialog, Disposer::merge([youtube, embed, show, palette]))
    }

    pub fn is_open(&self) -> bool {
        self.popover.is_open()
    }

    /// The provider the popover is asking for
    pub fn config(&self) -> Option<&'static EmbedConfig> {
        self.popover.current()
    }

    /// Insert `url` with the open provider. A URL the provider does not
    /// recognise leaves the popover open and returns `false`.
    pub fn submit(&self, editor: &mut Editor, url: &str) -> bool {
        let Some(config) = self.popover.current() else {
            return false;
        };
        let Some(found) = (config.parse_url)(url) else {
            return false;
        };
        self.popover.close();
        (config.insert)(editor, &found)
    }

    pub fn dismiss(&self) -> bool {
        self.popover.close().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_youtube_url_forms() {
        for url in [
            "https://www.youtube.com/watch?v=jNQXAC9IVRw",
            "https://youtu.be/jNQXAC9IVRw",
            "https://www.youtube.com/embed/jNQXAC9IVRw?start=3",
            "https://www.youtube.com/watch?feature=share&v=jNQXAC9IVRw",
            "https://www.youtube.com/v/jNQXAC9IVRw",
        ] {
            assert_eq!(
                parse_youtube_url(url).map(|found| found.id),
                Some("jNQXAC9IVRw".to_string()),
                "{}",
                url
            );
        }
        assert!(parse_youtube_url("https://www.youtube.com/watch?v=short").is_none());
        assert!(parse_youtube_url("https://example.com").is_none());
    }

    #[test]
    fn test_insert_embed_resolves_provider() {
        let mut editor = Editor::default();
        let (_dialog, _d) = EmbedDialog::register(&editor);

        assert!(editor.dispatch(INSERT_EMBED, "https://youtu.be/jNQXAC9IVRw".to_string()));
        let tree = editor.state().tree();
        let videos: Vec<_> = tree
            .preorder()
            .into_iter()
            .filter(|key| tree.get(*key).is_some_and(|node| node.is_youtube()))
            .collect();
        assert_eq!(videos.len(), 1);

        assert!(!editor.dispatch(INSERT_EMBED, "https://example.com".to_string()));
    }

    #[test]
    fn test_dialog_keeps_open_on_unknown_url() {
        let mut editor = Editor::default();
        let (dialog, _d) = EmbedDialog::register(&editor);

        assert!(editor.dispatch(SHOW_EMBED_DIALOG, YOUTUBE_EMBED_TYPE.to_string()));
        assert_eq!(dialog.config().map(|c| c.kind), Some(YOUTUBE_EMBED_TYPE));
        assert!(!dialog.submit(&mut editor, "https://example.com"));
        assert!(dialog.is_open());
        assert!(dialog.submit(&mut editor, "https://youtu.be/jNQXAC9IVRw"));
        assert!(!dialog.dismiss());
    }
}
