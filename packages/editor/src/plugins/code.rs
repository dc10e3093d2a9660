//! Code block languages

use crate::builtins::run;
use crate::commands::{CommandPriority, Disposer, SET_CODE_LANGUAGE};
use crate::editor::Editor;
use quire_model::ElementKind;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub value: &'static str,
    pub label: &'static str,
}

pub const SUPPORTED_LANGUAGES: [Language; 18] = [
    Language { value: "javascript", label: "JavaScript" },
    Language { value: "typescript", label: "TypeScript" },
    Language { value: "python", label: "Python" },
    Language { value: "java", label: "Java" },
    Language { value: "cpp", label: "C++" },
    Language { value: "csharp", label: "C#" },
    Language { value: "php", label: "PHP" },
    Language { value: "ruby", label: "Ruby" },
    Language { value: "go", label: "Go" },
    Language { value: "rust", label: "Rust" },
    Language { value: "swift", label: "Swift" },
    Language { value: "kotlin", label: "Kotlin" },
    Language { value: "html", label: "HTML" },
    Language { value: "css", label: "CSS" },
    Language { value: "sql", label: "SQL" },
    Language { value: "json", label: "JSON" },
    Language { value: "bash", label: "Bash" },
    Language { value: "shell", label: "Shell" },
];

pub const DEFAULT_CODE_LANGUAGE: &str = "javascript";

pub fn is_valid_language(value: &str) -> bool {
    SUPPORTED_LANGUAGES.iter().any(|language| language.value == value)
}

/// SET_CODE_LANGUAGE: unknown languages and non-code nodes are left to
/// other handlers
pub fn register(editor: &Editor) -> Disposer {
    editor.register_command(SET_CODE_LANGUAGE, CommandPriority::Editor, |editor, payload| {
        if !is_valid_language(&payload.language) {
            debug!(language = %payload.language, "unsupported code language");
            return false;
        }
        let key = payload.key;
        let language = payload.language.clone();
        run(editor, move |tx| {
            if !tx.tree().get(key).is_some_and(|node| node.is_code()) {
                return Ok(false);
            }
            if let Some(element) = tx.tree_mut().writable(key)?.as_element_mut() {
                element.kind = ElementKind::Code {
                    language: Some(language),
                };
            }
            Ok(true)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CodeLanguage;
    use crate::state::EditorState;
    use quire_model::{Fragment, NodeKind, Tree};

    #[test]
    fn test_set_code_language() {
        let tree = Tree::from_fragment(
            &Fragment::root().with_child(
                Fragment::new(NodeKind::code(None)).with_child(Fragment::text("let x = 1;")),
            ),
        )
        .unwrap();
        let code = tree.children(tree.root())[0];
        let mut editor = Editor::with_state(Default::default(), EditorState::new(tree, None));
        let _d = register(&editor);

        assert!(!editor.dispatch(
            SET_CODE_LANGUAGE,
            CodeLanguage {
                key: code,
                language: "cobol".to_string()
            }
        ));
        assert!(editor.dispatch(
            SET_CODE_LANGUAGE,
            CodeLanguage {
                key: code,
                language: "rust".to_string()
            }
        ));
        assert_eq!(
            editor.state().tree().get(code).and_then(|n| n.element_kind()),
            Some(&ElementKind::Code {
                language: Some("rust".to_string())
            })
        );
    }

    #[test]
    fn test_language_list() {
        assert!(is_valid_language(DEFAULT_CODE_LANGUAGE));
        assert!(is_valid_language("shell"));
        assert!(!is_valid_language("JavaScript"));
    }
}
