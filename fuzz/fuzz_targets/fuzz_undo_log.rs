#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tabula_core::{ColumnDef, ColumnType, Datastore, MemoryDatastore, TableId};
use tabula_undo::{UndoConfig, UndoableDatastore};

#[derive(Debug, Arbitrary)]
enum Op {
    CreateTable(u8),
    DeleteTable(u8),
    AddColumn { table: u8, name: u8, long: bool },
    DeleteColumn { table: u8, column: u8 },
    AddRow(u8),
    DeleteRow { table: u8, row: u8 },
    SetCell { table: u8, row: u8, column: u8, value: i32 },
    Rename { table: u8, name: u8 },
    Begin,
    End,
    Rollback,
    Undo,
    Redo,
}

#[derive(Debug, Arbitrary)]
struct Input {
    max_entries: u8,
    ops: Vec<Op>,
}

fn table_at(ds: &UndoableDatastore<MemoryDatastore>, index: u8) -> Option<TableId> {
    let count = ds.store().table_count();
    if count == 0 {
        return None;
    }
    ds.store()
        .table_at(usize::from(index) % count)
        .map(|t| t.id())
}

fuzz_target!(|input: Input| {
    let config = UndoConfig::new(usize::from(input.max_entries).max(1));
    let mut ds = UndoableDatastore::with_config(MemoryDatastore::new(), config);

    for op in input.ops.iter().take(256) {
        // Usage errors are expected; anything fatal is a bug.
        let result = match *op {
            Op::CreateTable(name) => ds.create_table(&format!("t{name}"), None).map(drop),
            Op::DeleteTable(index) => match table_at(&ds, index) {
                Some(table) => ds.delete_table(table),
                None => Ok(()),
            },
            Op::AddColumn { table, name, long } => match table_at(&ds, table) {
                Some(table) => {
                    let ty = if long { ColumnType::Long } else { ColumnType::Text };
                    ds.add_column(table, ColumnDef::new(format!("c{name}"), ty))
                        .map(drop)
                }
                None => Ok(()),
            },
            Op::DeleteColumn { table, column } => match table_at(&ds, table) {
                Some(table) => ds.delete_column(table, usize::from(column) % 4),
                None => Ok(()),
            },
            Op::AddRow(table) => match table_at(&ds, table) {
                Some(table) => ds.create_empty_row(table, None).map(drop),
                None => Ok(()),
            },
            Op::DeleteRow { table, row } => match table_at(&ds, table) {
                Some(table) => ds.delete_row(table, usize::from(row) % 8).map(drop),
                None => Ok(()),
            },
            Op::SetCell {
                table,
                row,
                column,
                value,
            } => match table_at(&ds, table) {
                Some(table) => ds
                    .set_value(table, usize::from(row) % 8, usize::from(column) % 4, i64::from(value))
                    .map(drop),
                None => Ok(()),
            },
            Op::Rename { table, name } => match table_at(&ds, table) {
                Some(table) => ds.set_table_name(table, format!("t{name}")).map(drop),
                None => Ok(()),
            },
            Op::Begin => ds.start_transaction().map(drop),
            Op::End => ds.end_transaction().map(drop),
            Op::Rollback => ds.rollback_transaction(),
            Op::Undo => ds.undo(),
            Op::Redo => ds.redo(),
        };
        if let Err(err) = result {
            assert!(!err.is_fatal(), "fatal error after {op:?}: {err}");
        }

        let log = ds.log();
        assert!(log.position() <= log.len(), "cursor past end of history");
        assert_eq!(
            ds.store().listeners_suppressed(),
            ds.is_in_transaction(),
            "listener suppression leaked"
        );
    }

    if ds.is_in_transaction() {
        ds.end_transaction().unwrap();
    }
    while ds.has_undo() {
        ds.undo().unwrap();
    }
    assert!(!ds.log().is_poisoned());
});
