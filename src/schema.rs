//! Reconstructs the table catalog by reading `sqlite_schema` (page 1's
//! table b-tree) and parsing each table's column list out of its stored
//! `CREATE TABLE` text.
//!
//! The catalog tree is walked with the same `btree::walker::walk` every
//! other table uses, pulling `tbl_name`/`rootpage`/`sql` out of each
//! record — there's no SQL grammar here, since this reader never executes
//! SQL and only needs the column list. Column-name extraction is a small
//! five-step algorithm: strip the statement down to its parenthesized
//! column list, split on top-level commas, discard table-level constraint
//! clauses, and take the first identifier of what's left as the column
//! name.

use std::str::FromStr;

use crate::btree::cell::Cell;
use crate::sql_type::SqlType;
use crate::sql_value::Value;

pub const SCHEMA_ROOT_PAGE: u32 = 1;

/// A single column of a recovered table, as named in its `CREATE TABLE`
/// text. `declared_type` is `None` when the column had no type word (SQLite
/// allows this) or the word isn't one of the four basic types this reader
/// recognizes (`sql_type::SqlType`) — e.g. `VARCHAR(20)` or a typo.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub declared_type: Option<SqlType>,
}

#[derive(Debug, Clone)]
pub struct TableSchema {
    pub name: String,
    pub root_page: u32,
    pub sql: String,
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Whether `column_index` was declared `BLOB`, used to decide whether a
    /// value should be treated as blob-extractable even when its serial
    /// type alone wouldn't say so — extraction keys off the *declared*
    /// column type, not the stored value's shape.
    pub fn column_is_blob(&self, column_index: usize) -> bool {
        matches!(
            self.columns.get(column_index).and_then(|c| c.declared_type),
            Some(SqlType::Blob)
        )
    }
}

/// Extracts table definitions from already-decoded `sqlite_schema` cells.
/// `database::Database::open` walks the schema tree once and reuses both
/// the cells (for the catalog) and the visited page set (for orphan
/// detection), calling this to turn the cells into table definitions. Rows
/// whose `sql` can't be parsed keep an empty column list rather than
/// dropping the table — the rest of the reader can still recover rows by
/// serial-type shape alone.
pub fn tables_from_cells(cells: &[(u32, Cell)]) -> Vec<TableSchema> {
    let mut tables = Vec::new();
    for (_page, cell) in cells {
        let record = match cell {
            Cell::TableLeaf { record, .. } => record,
            _ => continue,
        };
        let fields = &record.fields;
        if fields.len() < 5 {
            continue;
        }
        let kind = text_field(&fields[0]);
        if kind.as_deref() != Some("table") {
            continue;
        }
        let name = match text_field(&fields[2]) {
            Some(n) => n,
            None => continue,
        };
        let root_page = match &fields[3] {
            Value::Int(n) if *n >= 0 => *n as u32,
            _ => continue,
        };
        let sql = text_field(&fields[4]).unwrap_or_default();
        let columns = parse_column_names(&sql);
        tables.push(TableSchema {
            name,
            root_page,
            sql,
            columns,
        });
    }
    tables
}

fn text_field(value: &Value) -> Option<String> {
    match value {
        Value::Text(s) => Some(s.clone()),
        _ => None,
    }
}

/// Extracts column definitions from a `CREATE TABLE ... (...)` statement.
///
/// 1. Find the outermost parenthesized group (the column/constraint list).
/// 2. Split its contents on commas that are not nested inside parentheses
///    or quotes.
/// 3. Drop clauses that open with a table-constraint keyword
///    (`PRIMARY`, `UNIQUE`, `CHECK`, `FOREIGN`, `CONSTRAINT`).
/// 4. The first token of what remains, with surrounding quoting stripped,
///    is the column name; the second token, if it parses as one of the
///    four basic SQL types, is the declared type.
pub fn parse_column_names(sql: &str) -> Vec<ColumnDef> {
    let body = match column_list_body(sql) {
        Some(b) => b,
        None => return Vec::new(),
    };
    split_top_level(&body)
        .into_iter()
        .filter_map(|clause| column_from_clause(&clause))
        .collect()
}

fn column_list_body(sql: &str) -> Option<String> {
    let start = sql.find('(')?;
    let bytes = sql.as_bytes();
    let mut depth = 0i32;
    let mut end = None;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    end = Some(i);
                    break;
                }
            }
            _ => {}
        }
    }
    let end = end?;
    Some(sql[start + 1..end].to_string())
}

fn split_top_level(body: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut current = String::new();
    for c in body.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' | '`' => {
                    quote = Some(c);
                    current.push(c);
                }
                '[' => {
                    quote = Some(']');
                    current.push(c);
                }
                '(' => {
                    depth += 1;
                    current.push(c);
                }
                ')' => {
                    depth -= 1;
                    current.push(c);
                }
                ',' if depth == 0 => {
                    parts.push(current.trim().to_string());
                    current = String::new();
                }
                _ => current.push(c),
            },
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

const TABLE_CONSTRAINT_KEYWORDS: &[&str] = &["PRIMARY", "UNIQUE", "CHECK", "FOREIGN", "CONSTRAINT"];

fn column_from_clause(clause: &str) -> Option<ColumnDef> {
    let trimmed = clause.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut words = trimmed.split_whitespace();
    let first_word = words.next().unwrap_or("");
    let first_word_upper = first_word.trim_matches(|c| !char::is_alphanumeric(c)).to_uppercase();
    if TABLE_CONSTRAINT_KEYWORDS.contains(&first_word_upper.as_str()) {
        return None;
    }
    let name = unquote_identifier(first_word);
    let declared_type = words.next().and_then(|w| SqlType::from_str(w).ok());
    Some(ColumnDef { name, declared_type })
}

fn unquote_identifier(token: &str) -> String {
    let token = token.trim();
    if token.len() >= 2 {
        let bytes = token.as_bytes();
        let pairs = [(b'"', b'"'), (b'`', b'`'), (b'[', b']')];
        for (open, close) in pairs {
            if bytes[0] == open && bytes[bytes.len() - 1] == close {
                return token[1..token.len() - 1].to_string();
            }
        }
    }
    token.to_string()
}
