use crate::builtins::run;
use crate::commands::{CommandPriority, Disposer, INSERT_DIVIDER};
use crate::editor::Editor;
use crate::palette::PaletteCommand;
use quire_model::NodeKind;

/// Horizontal rules: the insert command and its palette entry
pub fn register(editor: &Editor) -> Disposer {
    let insert = editor.register_command(INSERT_DIVIDER, CommandPriority::Editor, |editor, _| {
        run(editor, |tx| {
            tx.insert_block(NodeKind::divider())?;
            Ok(true)
        })
    });
    let palette = editor.palette().register(
        PaletteCommand::new("insert_divider_command", "Divider", |editor| {
            editor.dispatch(INSERT_DIVIDER, ());
            Ok(())
        })
        .with_description("Insert a horizontal divider line")
        .with_keywords(&["divider", "hr", "horizontal", "line", "separator"])
        .with_icon("minus"),
    );
    Disposer::merge([insert, palette])
}
