//! # Tools
//!
//! Toolbar descriptors rebuilt from the selection record on every render.
//! A tool never stores state of its own: whether it is active or disabled
//! comes from the [`ToolContext`], and executing it goes through the
//! command bus or an editor update.

use crate::commands::{
    LinkEditorRequest, FORMAT_ELEMENT, FORMAT_TEXT, INSERT_ORDERED_LIST, INSERT_UNORDERED_LIST,
    REDO, SHOW_FLOATING_LINK_EDITOR, TOGGLE_LINK, UNDO,
};
use crate::editor::Editor;
use crate::plugins::code::DEFAULT_CODE_LANGUAGE;
use crate::selection_state::{BlockKind, SelectionState};
use crate::state::EditorState;
use quire_model::{Alignment, HeadingLevel, ListType, NodeKind, TextFormatType};
use serde_json::Value;
use std::fmt;
use std::rc::Rc;
use tracing::warn;

pub type Action = Rc<dyn Fn(&mut Editor)>;
pub type ValueAction = Rc<dyn Fn(&mut Editor, &str)>;
pub type RenderFn = Rc<dyn Fn(&EditorState) -> Value>;

/// Everything a tool factory reads
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    pub selection: SelectionState,
    pub can_undo: bool,
    pub can_redo: bool,
    /// Caret position reported by the host, for floating editors
    pub caret_coordinates: Option<(f64, f64)>,
}

#[derive(Clone)]
pub struct ToggleTool {
    pub id: &'static str,
    pub label: &'static str,
    pub is_active: bool,
    pub disabled: bool,
    pub execute: Action,
}

#[derive(Clone)]
pub struct ToggleGroup {
    pub id: &'static str,
    pub label: &'static str,
    pub tools: Vec<ToggleTool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropdownItem {
    pub label: &'static str,
    pub value: &'static str,
}

#[derive(Clone)]
pub struct DropdownTool {
    pub id: &'static str,
    pub label: &'static str,
    pub items: Vec<DropdownItem>,
    pub value: String,
    pub execute: ValueAction,
}

#[derive(Clone)]
pub struct ValueTool {
    pub id: &'static str,
    pub label: &'static str,
    pub value: String,
    pub execute: ValueAction,
}

/// A tool the host renders itself from a view model
#[derive(Clone)]
pub struct CustomTool {
    pub id: &'static str,
    pub label: &'static str,
    pub render: RenderFn,
    pub execute: Action,
}

#[derive(Clone)]
pub enum Tool {
    Toggle(ToggleTool),
    ToggleGroup(ToggleGroup),
    Dropdown(DropdownTool),
    Value(ValueTool),
    Custom(CustomTool),
}

impl Tool {
    pub fn id(&self) -> &'static str {
        match self {
            Tool::Toggle(tool) => tool.id,
            Tool::ToggleGroup(group) => group.id,
            Tool::Dropdown(tool) => tool.id,
            Tool::Value(tool) => tool.id,
            Tool::Custom(tool) => tool.id,
        }
    }

    /// The toggle with `id`, searching inside groups
    pub fn toggle(&self, id: &str) -> Option<&ToggleTool> {
        match self {
            Tool::Toggle(tool) if tool.id == id => Some(tool),
            Tool::ToggleGroup(group) => group.tools.iter().find(|tool| tool.id == id),
            _ => None,
        }
    }
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Tool::Toggle(_) => "toggle",
            Tool::ToggleGroup(_) => "toggle-group",
            Tool::Dropdown(_) => "dropdown",
            Tool::Value(_) => "value",
            Tool::Custom(_) => "custom",
        };
        write!(f, "Tool({}, {})", kind, self.id())
    }
}

fn toggle(
    id: &'static str,
    label: &'static str,
    is_active: bool,
    execute: impl Fn(&mut Editor) + 'static,
) -> ToggleTool {
    ToggleTool {
        id,
        label,
        is_active,
        disabled: false,
        execute: Rc::new(execute),
    }
}

// ----------------------------------------------------------------------
// Formatting
// ----------------------------------------------------------------------

pub fn formatting_group(ctx: &ToolContext) -> Tool {
    let format = ctx.selection.format;
    let tool = |id, label, active, format: TextFormatType| {
        toggle(id, label, active, move |editor: &mut Editor| {
            editor.dispatch(FORMAT_TEXT, format);
        })
    };
    Tool::ToggleGroup(ToggleGroup {
        id: "formatting",
        label: "Text Formatting",
        tools: vec![
            tool("bold", "Bold", format.bold, TextFormatType::Bold),
            tool("italic", "Italic", format.italic, TextFormatType::Italic),
            tool("underline", "Underline", format.underline, TextFormatType::Underline),
            tool(
                "strikethrough",
                "Strikethrough",
                format.strikethrough,
                TextFormatType::Strikethrough,
            ),
            tool("code", "Code", format.code, TextFormatType::Code),
        ],
    })
}

pub fn alignment_group(ctx: &ToolContext) -> Tool {
    let current = ctx.selection.alignment;
    let tool = |id, label, alignment: Alignment| {
        toggle(id, label, current == alignment, move |editor: &mut Editor| {
            editor.dispatch(FORMAT_ELEMENT, alignment);
        })
    };
    Tool::ToggleGroup(ToggleGroup {
        id: "alignments",
        label: "Alignments",
        tools: vec![
            tool("align-left", "Align Left", Alignment::Left),
            tool("align-center", "Align Center", Alignment::Center),
            tool("align-right", "Align Right", Alignment::Right),
            tool("align-justify", "Justify", Alignment::Justify),
        ],
    })
}

// ----------------------------------------------------------------------
// Blocks
// ----------------------------------------------------------------------

/// A second press on an active list tool turns the items back into
/// paragraphs
pub fn list_group(ctx: &ToolContext) -> Tool {
    let tool = |id, label, list_type: ListType| {
        let active = ctx.selection.element == Some(BlockKind::List(list_type));
        toggle(id, label, active, move |editor: &mut Editor| {
            if active {
                set_blocks(editor, NodeKind::paragraph);
            } else if list_type == ListType::Bullet {
                editor.dispatch(INSERT_UNORDERED_LIST, ());
            } else {
                editor.dispatch(INSERT_ORDERED_LIST, ());
            }
        })
    };
    Tool::ToggleGroup(ToggleGroup {
        id: "lists",
        label: "Lists",
        tools: vec![
            tool("bullet-list", "Bullet List", ListType::Bullet),
            tool("numbered-list", "Numbered List", ListType::Number),
        ],
    })
}

pub const BLOCK_TYPE_ITEMS: [DropdownItem; 6] = [
    DropdownItem {
        label: "Paragraph",
        value: "paragraph",
    },
    DropdownItem {
        label: "Heading 1",
        value: "h1",
    },
    DropdownItem {
        label: "Heading 2",
        value: "h2",
    },
    DropdownItem {
        label: "Heading 3",
        value: "h3",
    },
    DropdownItem {
        label: "Code Block",
        value: "code",
    },
    DropdownItem {
        label: "Quote",
        value: "quote",
    },
];

/// Dropdown value for the block holding the selection
pub fn block_type_value(selection: &SelectionState) -> String {
    match selection.element {
        Some(BlockKind::Heading(level)) => level.tag().to_string(),
        Some(BlockKind::Code) => "code".to_string(),
        Some(BlockKind::Quote) => "quote".to_string(),
        _ => "paragraph".to_string(),
    }
}

/// Element kind a block-type dropdown value stands for
pub fn block_type_kind(value: &str) -> Option<NodeKind> {
    match value {
        "paragraph" => Some(NodeKind::paragraph()),
        "code" => Some(NodeKind::code(Some(DEFAULT_CODE_LANGUAGE.to_string()))),
        "quote" => Some(NodeKind::quote()),
        tag => HeadingLevel::from_tag(tag).map(NodeKind::heading),
    }
}

pub fn block_type_tool(ctx: &ToolContext) -> Tool {
    Tool::Dropdown(DropdownTool {
        id: "block-type",
        label: "Block Type",
        items: BLOCK_TYPE_ITEMS.to_vec(),
        value: block_type_value(&ctx.selection),
        execute: Rc::new(|editor: &mut Editor, value: &str| {
            if block_type_kind(value).is_none() {
                warn!(value, "unknown block type");
                return;
            }
            let value = value.to_string();
            set_blocks(editor, move || {
                block_type_kind(&value).unwrap_or_else(NodeKind::paragraph)
            });
        }),
    })
}

fn set_blocks(editor: &mut Editor, make: impl Fn() -> NodeKind + 'static) {
    let result = editor.update(move |tx| {
        tx.set_blocks_type(make)?;
        Ok(())
    });
    if let Err(err) = result {
        warn!(%err, "could not change block type");
    }
}

// ----------------------------------------------------------------------
// Color, link, history
// ----------------------------------------------------------------------

pub fn color_picker_tool(ctx: &ToolContext) -> Tool {
    Tool::Value(ValueTool {
        id: "color-picker",
        label: "Color Picker",
        value: ctx.selection.text_color.clone(),
        execute: Rc::new(|editor: &mut Editor, value: &str| {
            let color = value.to_string();
            let result = editor.update(move |tx| {
                tx.patch_style("color", Some(&color))?;
                Ok(())
            });
            if let Err(err) = result {
                warn!(%err, "could not set text color");
            }
        }),
    })
}

/// Removes the link under the selection, or asks the host to open the
/// floating link editor
pub fn link_tool(ctx: &ToolContext) -> Tool {
    let active = ctx.selection.is_link_active;
    let request = LinkEditorRequest {
        url: ctx.selection.link_url.clone().unwrap_or_default(),
        coordinates: ctx.caret_coordinates,
    };
    Tool::Toggle(toggle("link", "Link", active, move |editor: &mut Editor| {
        if active {
            editor.dispatch(TOGGLE_LINK, None);
        } else {
            editor.dispatch(SHOW_FLOATING_LINK_EDITOR, request.clone());
        }
    }))
}

pub fn history_group(ctx: &ToolContext) -> Tool {
    let mut undo = toggle("undo", "Undo", false, |editor: &mut Editor| {
        editor.dispatch(UNDO, ());
    });
    undo.disabled = !ctx.can_undo;
    let mut redo = toggle("redo", "Redo", false, |editor: &mut Editor| {
        editor.dispatch(REDO, ());
    });
    redo.disabled = !ctx.can_redo;
    Tool::ToggleGroup(ToggleGroup {
        id: "history",
        label: "History",
        tools: vec![undo, redo],
    })
}

/// The standard toolbar, left to right
pub fn default_toolbar(ctx: &ToolContext) -> Vec<Tool> {
    vec![
        history_group(ctx),
        block_type_tool(ctx),
        formatting_group(ctx),
        color_picker_tool(ctx),
        link_tool(ctx),
        list_group(ctx),
        alignment_group(ctx),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection_state::FormatState;

    #[test]
    fn test_formatting_group_reflects_selection() {
        let ctx = ToolContext {
            selection: SelectionState {
                format: FormatState {
                    bold: true,
                    ..FormatState::default()
                },
                ..SelectionState::default()
            },
            ..ToolContext::default()
        };
        let group = formatting_group(&ctx);
        assert!(group.toggle("bold").unwrap().is_active);
        assert!(!group.toggle("italic").unwrap().is_active);
        assert!(group.toggle("align-left").is_none());
    }

    #[test]
    fn test_history_tools_disabled_from_availability() {
        let ctx = ToolContext {
            can_undo: true,
            ..ToolContext::default()
        };
        let group = history_group(&ctx);
        assert!(!group.toggle("undo").unwrap().disabled);
        assert!(group.toggle("redo").unwrap().disabled);
    }

    #[test]
    fn test_block_type_value() {
        let mut selection = SelectionState::default();
        assert_eq!(block_type_value(&selection), "paragraph");
        selection.element = Some(BlockKind::Heading(HeadingLevel::H3));
        assert_eq!(block_type_value(&selection), "h3");
        selection.element = Some(BlockKind::List(ListType::Bullet));
        assert_eq!(block_type_value(&selection), "paragraph");
        assert!(block_type_kind("h7").is_none());
    }

    #[test]
    fn test_default_toolbar_ids() {
        let ids: Vec<&str> = default_toolbar(&ToolContext::default())
            .iter()
            .map(Tool::id)
            .collect();
        assert_eq!(
            ids,
            vec![
                "history",
                "block-type",
                "formatting",
                "color-picker",
                "link",
                "lists",
                "alignments"
            ]
        );
    }
}
