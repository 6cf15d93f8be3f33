//! Finds leaf-table pages that aren't reachable from any table's b-tree and
//! remaps them to a candidate table by column-count.
//!
//! Once every live table has been walked, any page that self-describes as
//! a table-leaf page but was never visited is either a page SQLite
//! detached when a table was dropped, or one left behind by a
//! vacuum/rebalance. Matching is column-count only, since a dropped
//! table's schema row is gone and there's nothing more precise left to
//! match against.

use std::collections::HashSet;

use crate::btree::cell::{self, Cell};
use crate::btree::header::{self, PageKind};
use crate::dbheader::TextEncoding;
use crate::file_view::FileView;
use crate::schema::TableSchema;
use crate::sql_value::Value;

/// A leaf-table page no interior page points at anymore, together with the
/// rows it still holds and the set of tables it might have belonged to.
#[derive(Debug, Clone)]
pub struct OrphanLeaf {
    pub page_num: u32,
    pub column_count: usize,
    pub candidate_tables: Vec<String>,
    /// Every cell this page decoded cleanly, kept so a caller can render
    /// `DC` rows under each candidate table rather than just a summary.
    pub rows: Vec<(i64, Vec<Value>)>,
}

/// Scans every page not in `reachable` for an unvisited table-leaf page,
/// decodes its cells, and matches it against `schemas` by column count.
pub fn find_orphans(
    view: &FileView,
    reachable: &HashSet<u32>,
    schemas: &[TableSchema],
    encoding: TextEncoding,
) -> Vec<OrphanLeaf> {
    let mut orphans = Vec::new();
    for page_num in 1..=view.effective_page_count() {
        if reachable.contains(&page_num) {
            continue;
        }
        let page = match view.page_bytes(page_num) {
            Some(p) => p,
            None => continue,
        };
        let header = match header::parse(page, page_num) {
            Some(h) => h,
            None => continue,
        };
        if header.kind != PageKind::LeafTable {
            continue;
        }
        let offsets = header::cell_pointers(page, &header);
        let mut rows = Vec::new();
        for offset in &offsets {
            if let Ok(Cell::TableLeaf { row_id, record, .. }) =
                cell::decode(PageKind::LeafTable, view, page, *offset as usize, encoding)
            {
                rows.push((row_id, record.fields));
            }
        }
        if rows.is_empty() {
            continue;
        }
        // A page's rows all belong to the same table, so they share a
        // column count; take the most common one defensively in case a
        // handful of cells misdecoded.
        let column_count = most_common(&rows.iter().map(|(_, f)| f.len()).collect::<Vec<_>>());
        let candidate_tables: Vec<String> = schemas
            .iter()
            .filter(|s| s.columns.len() == column_count)
            .map(|s| s.name.clone())
            .collect();
        orphans.push(OrphanLeaf {
            page_num,
            column_count,
            candidate_tables,
            rows,
        });
    }
    orphans
}

fn most_common(counts: &[usize]) -> usize {
    let mut tally: Vec<(usize, usize)> = Vec::new();
    for &c in counts {
        match tally.iter_mut().find(|(v, _)| *v == c) {
            Some((_, n)) => *n += 1,
            None => tally.push((c, 1)),
        }
    }
    tally.into_iter().max_by_key(|(_, n)| *n).map(|(v, _)| v).unwrap_or(0)
}
