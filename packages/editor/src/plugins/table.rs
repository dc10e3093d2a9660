//! # Tables
//!
//! Tables are plain elements: `table > row > cell > paragraph`. The first
//! row of a new table holds header cells. Row and column commands act on
//! the cell holding the caret and do nothing outside a table; spans are
//! not taken into account.

use crate::builtins::run;
use crate::commands::{
    CommandPriority, Disposer, TableSize, DELETE_TABLE_COLUMN, DELETE_TABLE_ROW, INSERT_TABLE,
    INSERT_TABLE_COLUMN, INSERT_TABLE_ROW,
};
use crate::editor::Editor;
use crate::errors::EditorError;
use crate::palette::PaletteCommand;
use crate::range::point_node;
use crate::transaction::Transaction;
use quire_model::{ElementKind, Fragment, Node, NodeKey, NodeKind, Tree};
use tracing::debug;

/// Where the caret sits inside a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPosition {
    pub table: NodeKey,
    pub row: NodeKey,
    pub cell: NodeKey,
    pub row_index: usize,
    pub column_index: usize,
}

fn cell_fragment(header: bool) -> Fragment {
    Fragment::new(NodeKind::table_cell(header)).with_child(Fragment::paragraph())
}

fn row_fragment(columns: usize, header: bool) -> Fragment {
    (0..columns).fold(Fragment::new(NodeKind::table_row()), |row, _| {
        row.with_child(cell_fragment(header))
    })
}

pub fn table_fragment(size: TableSize) -> Fragment {
    (0..size.rows).fold(Fragment::new(NodeKind::table()), |table, index| {
        table.with_child(row_fragment(size.columns, index == 0))
    })
}

fn is_header_cell(tree: &Tree, key: NodeKey) -> bool {
    matches!(
        tree.get(key).and_then(Node::element_kind),
        Some(ElementKind::TableCell { header: true, .. })
    )
}

/// Table, row and cell around the caret
pub fn caret_cell(tx: &Transaction) -> Option<CellPosition> {
    let tree = tx.tree();
    let anchor = tx.range()?.anchor;
    let cell = tree.nearest(point_node(tree, &anchor), Node::is_table_cell)?;
    let row = tree.parent(cell).filter(|key| tree.get(*key).is_some_and(Node::is_table_row))?;
    let table = tree.parent(row).filter(|key| tree.get(*key).is_some_and(Node::is_table))?;
    Some(CellPosition {
        table,
        row,
        cell,
        row_index: tree.index_in_parent(row)?,
        column_index: tree.index_in_parent(cell)?,
    })
}

/// Caret at the start of the cell at (`row`, `column`), both clamped
fn select_cell(
    tx: &mut Transaction,
    table: NodeKey,
    row: usize,
    column: usize,
) -> Result<(), EditorError> {
    let tree = tx.tree();
    let rows = tree.children(table);
    let cell = rows
        .get(row.min(rows.len().saturating_sub(1)))
        .and_then(|row| {
            let cells = tree.children(*row);
            cells.get(column.min(cells.len().saturating_sub(1))).copied()
        })
        .map(|cell| tree.children(cell).first().copied().unwrap_or(cell));
    match cell {
        Some(target) => tx.select_start(target),
        None => Ok(()),
    }
}

fn insert_table(tx: &mut Transaction, size: TableSize) -> Result<bool, EditorError> {
    if size.rows == 0 || size.columns == 0 {
        debug!(?size, "refusing empty table");
        return Ok(false);
    }
    let inserted = tx.insert_fragments(&[table_fragment(size)])?;
    let Some(table) = inserted.first().copied() else {
        return Ok(false);
    };
    if tx.tree().next_sibling(table).is_none() {
        let paragraph = tx.tree_mut().create(NodeKind::paragraph());
        tx.tree_mut().insert_after(table, paragraph)?;
    }
    select_cell(tx, table, 0, 0)?;
    Ok(true)
}

fn insert_row(tx: &mut Transaction, after: bool) -> Result<bool, EditorError> {
    let Some(at) = caret_cell(tx) else {
        return Ok(false);
    };
    let columns = tx.tree().children(at.row).len();
    let index = at.row_index + usize::from(after);
    tx.tree_mut()
        .insert_fragment(at.table, index, &row_fragment(columns, false))?;
    Ok(true)
}

fn insert_column(tx: &mut Transaction, after: bool) -> Result<bool, EditorError> {
    let Some(at) = caret_cell(tx) else {
        return Ok(false);
    };
    let index = at.column_index + usize::from(after);
    for row in tx.tree().children(at.table).to_vec() {
        let header = tx
            .tree()
            .children(row)
            .get(at.column_index)
            .is_some_and(|cell| is_header_cell(tx.tree(), *cell));
        tx.tree_mut().insert_fragment(row, index, &cell_fragment(header))?;
    }
    Ok(true)
}

fn delete_row(tx: &mut Transaction) -> Result<bool, EditorError> {
    let Some(at) = caret_cell(tx) else {
        return Ok(false);
    };
    if tx.tree().children(at.table).len() <= 1 {
        return tx.remove_nodes(&[at.table]);
    }
    tx.tree_mut().remove(at.row)?;
    select_cell(tx, at.table, at.row_index, at.column_index)?;
    Ok(true)
}

fn delete_column(tx: &mut Transaction) -> Result<bool, EditorError> {
    let Some(at) = caret_cell(tx) else {
        return Ok(false);
    };
    for row in tx.tree().children(at.table).to_vec() {
        if let Some(cell) = tx.tree().children(row).get(at.column_index).copied() {
            tx.tree_mut().remove(cell)?;
        }
        if tx.tree().children(row).is_empty() {
            tx.tree_mut().remove(row)?;
        }
    }
    if tx.tree().children(at.table).is_empty() {
        return tx.remove_nodes(&[at.table]);
    }
    select_cell(tx, at.table, at.row_index, at.column_index)?;
    Ok(true)
}

/// Table commands and the palette entry
pub fn register(editor: &Editor) -> Disposer {
    let priority = CommandPriority::Editor;
    let insert = editor.register_command(INSERT_TABLE, priority, |editor, size| {
        let size = *size;
        run(editor, move |tx| insert_table(tx, size))
    });
    let row = editor.register_command(INSERT_TABLE_ROW, priority, |editor, after| {
        let after = *after;
        run(editor, move |tx| insert_row(tx, after))
    });
    let column = editor.register_command(INSERT_TABLE_COLUMN, priority, |editor, after| {
        let after = *after;
        run(editor, move |tx| insert_column(tx, after))
    });
    let remove_row = editor.register_command(DELETE_TABLE_ROW, priority, |editor, _| {
        run(editor, delete_row)
    });
    let remove_column = editor.register_command(DELETE_TABLE_COLUMN, priority, |editor, _| {
        run(editor, delete_column)
    });
    let palette = editor.palette().register(
        PaletteCommand::new("insert-table", "Table", |editor| {
            editor.dispatch(INSERT_TABLE, TableSize::default());
            Ok(())
        })
        .with_description("Insert a table")
        .with_keywords(&["/table", "table", "grid"])
        .with_icon("table"),
    );
    Disposer::merge([insert, row, column, remove_row, remove_column, palette])
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_model::{Point, Selection};

    fn editor() -> Editor {
        let mut editor = Editor::default();
        let first = editor.state().tree().children(editor.state().tree().root())[0];
        let caret = Point::element(first, 0);
        editor.set_selection(Some(Selection::range(caret, caret))).unwrap();
        editor
    }

    fn table(editor: &Editor) -> Option<NodeKey> {
        let tree = editor.state().tree();
        tree.children(tree.root())
            .iter()
            .copied()
            .find(|key| tree.get(*key).is_some_and(Node::is_table))
    }

    fn shape(editor: &Editor) -> Vec<usize> {
        let tree = editor.state().tree();
        table(editor)
            .map(|table| tree.children(table).iter().map(|row| tree.children(*row).len()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_insert_table_structure() {
        let mut editor = editor();
        let _d = register(&editor);

        assert!(!editor.dispatch(INSERT_TABLE, TableSize { rows: 0, columns: 2 }));
        assert!(editor.dispatch(INSERT_TABLE, TableSize { rows: 2, columns: 3 }));
        assert_eq!(shape(&editor), vec![3, 3]);

        let tree = editor.state().tree();
        let table = table(&editor).unwrap();
        let rows = tree.children(table);
        assert!(tree.children(rows[0]).iter().all(|cell| is_header_cell(tree, *cell)));
        assert!(!tree.children(rows[1]).iter().any(|cell| is_header_cell(tree, *cell)));
        assert!(tree
            .next_sibling(table)
            .is_some_and(|next| tree.node(next).unwrap().is_paragraph()));

        let anchor = editor.state().selection().unwrap().as_range().unwrap().anchor;
        let first_cell = tree.children(rows[0])[0];
        assert_eq!(tree.parent(anchor.key), Some(first_cell));
    }

    #[test]
    fn test_insert_row_and_column() {
        let mut editor = editor();
        let _d = register(&editor);
        editor.dispatch(INSERT_TABLE, TableSize { rows: 2, columns: 2 });

        assert!(editor.dispatch(INSERT_TABLE_ROW, true));
        assert_eq!(shape(&editor), vec![2, 2, 2]);
        assert!(editor.dispatch(INSERT_TABLE_COLUMN, false));
        assert_eq!(shape(&editor), vec![3, 3, 3]);

        let tree = editor.state().tree();
        let rows = tree.children(table(&editor).unwrap());
        assert!(is_header_cell(tree, tree.children(rows[0])[0]));
        assert!(!is_header_cell(tree, tree.children(rows[1])[0]));
    }

    #[test]
    fn test_delete_until_table_is_gone() {
        let mut editor = editor();
        let _d = register(&editor);
        editor.dispatch(INSERT_TABLE, TableSize { rows: 2, columns: 2 });

        assert!(editor.dispatch(DELETE_TABLE_COLUMN, ()));
        assert_eq!(shape(&editor), vec![1, 1]);
        assert!(editor.dispatch(DELETE_TABLE_ROW, ()));
        assert_eq!(shape(&editor), vec![1]);
        assert!(editor.dispatch(DELETE_TABLE_ROW, ()));
        assert!(table(&editor).is_none());
        assert!(!editor.dispatch(DELETE_TABLE_ROW, ()));
    }

    #[test]
    fn test_row_commands_outside_table() {
        let mut editor = editor();
        let _d = register(&editor);
        assert!(!editor.dispatch(INSERT_TABLE_ROW, true));
        assert!(!editor.dispatch(INSERT_TABLE_COLUMN, true));
    }
}
