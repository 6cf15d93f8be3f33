//! Prints recovered rows as semicolon-delimited text, one row per line,
//! each line tagged with where the row came from.
//!
//! Each line carries a short row-kind tag prefix so a reader can tell a
//! live row from a scavenged one at a glance. Tags used here:
//!
//! * `C`   — a live cell from a reachable table's b-tree.
//! * `FC`  — a freeblock candidate that decoded into a plausible record.
//! * `F`   — freeblock bytes that did not decode; printed as hex.
//! * `U`   — an unallocated-region candidate that decoded.
//! * `DC`  — a live-looking cell recovered from an orphan (unreachable)
//!           leaf page.
//! * `DFC` — a freeblock candidate decoded on an orphan leaf page.
//! * `DF`  — undecoded freeblock bytes on an orphan leaf page.
//! * `DU`  — an unallocated-region candidate decoded on an orphan leaf page.

use std::fmt::Write as _;

use crate::btree::freeblock::ScavengedCell;
use crate::database::{Database, Row};
use crate::schema::TableSchema;
use crate::sql_value::Value;

fn escape_field(value: &Value, raw_blob_output: bool) -> String {
    match value {
        Value::Blob(bytes) if raw_blob_output => hex::encode(bytes),
        other => other.to_string().replace(';', ","),
    }
}

/// Builds one output line: `page;tag;row_id;col1;col2;...`. `row_id` is
/// empty for rows with no genuine row key — freeblock and
/// unallocated candidates never recover one, since the scavenger starts
/// decoding past where a live cell's `payload_len`/`row_id` varint pair
/// would be (see `btree::freeblock::scavenge`).
fn row_line(tag: &str, page: u32, row_id: Option<i64>, values: &[Value], raw_blob_output: bool) -> String {
    let mut line = format!("{page};{tag};{}", row_id.map(|r| r.to_string()).unwrap_or_default());
    for v in values {
        let _ = write!(line, ";{}", escape_field(v, raw_blob_output));
    }
    line
}

pub fn format_row(row: &Row, raw_blob_output: bool) -> String {
    row_line("C", row.page, Some(row.row_id), &row.values, raw_blob_output)
}

pub fn format_orphan_row(page: u32, row_id: i64, values: &[Value], raw_blob_output: bool) -> String {
    row_line("DC", page, Some(row_id), values, raw_blob_output)
}

pub fn format_scavenged(page: u32, cell: &ScavengedCell, is_orphan_page: bool, raw_blob_output: bool) -> String {
    use crate::btree::freeblock::ScavengeSource;
    let tag = match (&cell.source, is_orphan_page) {
        (ScavengeSource::Freeblock, false) => "FC",
        (ScavengeSource::Freeblock, true) => "DFC",
        (ScavengeSource::Unallocated, false) => "U",
        (ScavengeSource::Unallocated, true) => "DU",
    };
    match &cell.record {
        Some(record) => row_line(tag, page, None, &record.fields, raw_blob_output),
        // Raw, undecoded bytes: no column values recovered, but the tag
        // still needs a distinct name so a reader doesn't confuse it with
        // a decoded candidate at the same freeblock/unallocated offset.
        None => {
            let raw_tag = match (&cell.source, is_orphan_page) {
                (ScavengeSource::Freeblock, false) => "F",
                (ScavengeSource::Freeblock, true) => "DF",
                (ScavengeSource::Unallocated, false) => "U",
                (ScavengeSource::Unallocated, true) => "DU",
            };
            format!("{page};{raw_tag};")
        }
    }
}

/// The `Page;Type;col1;col2;...` header line printed once per table,
/// before its rows.
pub fn format_table_header(schema: &TableSchema) -> String {
    let mut line = "Page;Type".to_string();
    for name in schema.column_names() {
        let _ = write!(line, ";{name}");
    }
    line
}

/// Renders one live row, writing any `BLOB`-declared column's bytes out to
/// `bin2file_dir` (when set) and substituting the written path for the
/// value in the printed line. Columns the schema doesn't call out as
/// `BLOB` are rendered normally even
/// if the underlying value happens to be a blob (e.g. an un-typed column) —
/// extraction is driven by the *declared* type, not the stored shape.
pub fn format_row_extracting_blobs(
    row: &Row,
    schema: Option<&TableSchema>,
    table_name: &str,
    bin2file_dir: Option<&std::path::Path>,
    raw_blob_output: bool,
) -> String {
    let mut line = format!("{};C;{}", row.page, row.row_id);
    for (i, v) in row.values.iter().enumerate() {
        let is_blob_column = schema.map(|s| s.column_is_blob(i)).unwrap_or(false);
        let rendered = match (bin2file_dir, is_blob_column, v.as_blob_bytes()) {
            (Some(dir), true, Some(bytes)) => {
                match crate::blob::write_blob(dir, table_name, row.page, row.row_id, i, bytes) {
                    Ok(path) => path.display().to_string(),
                    Err(e) => {
                        log::warn!("failed to write blob for {table_name} row {}: {e}", row.row_id);
                        escape_field(v, raw_blob_output)
                    }
                }
            }
            _ => escape_field(v, raw_blob_output),
        };
        let _ = write!(line, ";{rendered}");
    }
    line
}

/// Prints a one-line `name;root_page;column1,column2,...` summary of each
/// recovered table.
pub fn print_schema(db: &Database) {
    for table in &db.tables {
        println!(
            "{};{};{}",
            table.schema.name,
            table.schema.root_page,
            table.schema.column_names().join(",")
        );
    }
}

pub fn print_table_list(db: &Database) {
    for table in &db.tables {
        println!("{}", table.schema.name);
    }
}

pub fn print_info(db: &Database) {
    println!("page_size;{}", db.page_size);
    println!("page_count;{}", db.page_count);
    println!("text_encoding;{:?}", db.header.text_encoding);
    println!("incremental_vacuum;{}", db.header.incremental_vacuum);
    println!("table_count;{}", db.tables.len());
}
