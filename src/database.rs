//! Ties every phase of the forensic read together into one `Database`
//! model: parse the file header, recover the schema, walk every table's
//! b-tree, reclassify overflow pages, find orphan leaves, and (optionally)
//! scavenge deleted-row remnants.
//!
//! The whole file is loaded into memory at open time rather than paged on
//! demand, since a forensic pass visits every page regardless. Phases run
//! in a strict order: header, then schema, then per-table walks (which
//! double as the reachability set), then orphan/pointer-map/freeblock
//! passes, which all depend on knowing which pages are already accounted
//! for.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use log::{debug, warn};

use crate::btree::cell::Cell;
use crate::btree::freeblock::{self, ScavengedCell};
use crate::btree::header::{self, PageKind};
use crate::btree::walker::walk;
use crate::config::Cli;
use crate::dbheader::{self, FileHeader};
use crate::error::{Error, Result};
use crate::file_view::FileView;
use crate::orphan::{self, OrphanLeaf};
use crate::pointer_map::{self, PointerMapEntry};
use crate::schema::{self, TableSchema};
use crate::sql_value::Value;

#[derive(Debug, Clone)]
pub struct Row {
    pub row_id: i64,
    pub values: Vec<Value>,
    pub page: u32,
    pub overflow_pages: Vec<u32>,
    /// True if the payload's overflow chain was cut short.
    pub truncated: bool,
}

#[derive(Debug, Clone)]
pub struct Table {
    pub schema: TableSchema,
    pub rows: Vec<Row>,
    /// Every page visited while walking this table's own b-tree (root,
    /// interior routing pages, leaves, and any overflow pages its cells
    /// spilled into). Used to tell a freeblock/unallocated scavenge hit on
    /// one of this table's own live pages apart from one found on an
    /// orphan leaf later reattached to this table as a candidate.
    pub pages: HashSet<u32>,
}

pub struct Database {
    pub header: FileHeader,
    pub page_size: u32,
    pub page_count: u32,
    pub tables: Vec<Table>,
    pub orphans: Vec<OrphanLeaf>,
    pub pointer_map: Vec<(u32, PointerMapEntry)>,
    pub deleted_freeblock: Vec<(u32, ScavengedCell)>,
    pub deleted_unallocated: Vec<(u32, ScavengedCell)>,
}

impl Database {
    /// Reads and analyzes a whole database file from disk according to the
    /// passes requested in `cli`.
    pub fn open(path: &Path, cli: &Cli) -> Result<Database> {
        let data = fs::read(path)?;
        Self::from_bytes(&data, cli)
    }

    pub fn from_bytes(data: &[u8], cli: &Cli) -> Result<Database> {
        let header = dbheader::parse(data).map_err(|e| match e {
            dbheader::Error::WrongMagic | dbheader::Error::TooShort => Error::NotADatabase,
            dbheader::Error::UnsupportedPageSize => {
                Error::UnsupportedConfiguration("page size".to_string())
            }
        })?;

        let view = FileView {
            data,
            page_size: header.page_size,
            reserved_tail: header.reserved_tail,
            declared_page_count: header.declared_page_count,
        };
        let page_count = view.effective_page_count();
        debug!(
            "opened database: page_size={} page_count={} encoding={:?} incremental_vacuum={}",
            header.page_size, page_count, header.text_encoding, header.incremental_vacuum
        );

        // Phase 1: recover the schema by walking sqlite_schema's own tree.
        // Its visited-page set seeds "reachable" — sqlite_schema's own
        // pages are never orphans.
        let schema_walk = walk(&view, schema::SCHEMA_ROOT_PAGE, header.text_encoding);
        let table_schemas = schema::tables_from_cells(&schema_walk.cells);
        let mut reachable: HashSet<u32> = schema_walk.visited_pages.clone();
        let mut overflow_pages: HashSet<u32> = HashSet::new();
        record_overflow_pages(&schema_walk.cells, &mut overflow_pages);

        // Phase 2: walk every recovered table's own b-tree.
        let mut tables = Vec::with_capacity(table_schemas.len());
        for schema in table_schemas {
            let result = walk(&view, schema.root_page, header.text_encoding);
            reachable.extend(result.visited_pages.iter().copied());
            record_overflow_pages(&result.cells, &mut overflow_pages);
            if result.truncated {
                warn!("table '{}' (root page {}) walk was truncated", schema.name, schema.root_page);
            }
            let pages = result.visited_pages.clone();
            let rows = result
                .cells
                .into_iter()
                .filter_map(|(page, cell)| match cell {
                    Cell::TableLeaf {
                        row_id,
                        record,
                        overflow_pages: cell_overflow,
                    } => Some(Row {
                        row_id,
                        values: record.fields,
                        page,
                        overflow_pages: cell_overflow,
                        truncated: record.truncated,
                    }),
                    _ => None,
                })
                .collect();
            tables.push(Table { schema, rows, pages });
        }
        reachable.extend(overflow_pages.iter().copied());

        // Phase 3: pointer-map pages are reachable-by-definition (they are
        // infrastructure, not orphaned data) when auto/incremental-vacuum
        // is on.
        let usable_size = view.usable_size();
        let mut pointer_map_entries = Vec::new();
        if header.incremental_vacuum {
            for page_num in 1..=page_count {
                if pointer_map::is_pointer_map_page(page_num, usable_size) {
                    reachable.insert(page_num);
                    if let Some(page) = view.page_bytes(page_num) {
                        for entry in pointer_map::decode_page(page) {
                            pointer_map_entries.push((page_num, entry));
                        }
                    }
                }
            }
        }

        // Phase 4: orphan leaf detection, against every page now accounted
        // for as live schema/table/overflow/pointer-map content.
        let orphans = if cli.recover_orphans() {
            let schemas_for_match: Vec<TableSchema> = tables.iter().map(|t| t.schema.clone()).collect();
            orphan::find_orphans(&view, &reachable, &schemas_for_match, header.text_encoding)
        } else {
            Vec::new()
        };

        // Phase 5: freeblock/unallocated scavenging, opt-in since it's the
        // most expensive pass and only useful when hunting deleted rows.
        let mut deleted_freeblock = Vec::new();
        let mut deleted_unallocated = Vec::new();
        if cli.scavenge_freespace() || cli.scavenge_unallocated() {
            for page_num in 1..=page_count {
                let page = match view.page_bytes(page_num) {
                    Some(p) => p,
                    None => continue,
                };
                let page_header = match header::parse(page, page_num) {
                    Some(h) if h.kind == PageKind::LeafTable || h.kind == PageKind::LeafIndex => h,
                    _ => continue,
                };
                for found in freeblock::scavenge(page, &page_header, header.text_encoding) {
                    match found.source {
                        freeblock::ScavengeSource::Freeblock if cli.scavenge_freespace() => {
                            deleted_freeblock.push((page_num, found))
                        }
                        freeblock::ScavengeSource::Unallocated if cli.scavenge_unallocated() => {
                            deleted_unallocated.push((page_num, found))
                        }
                        _ => {}
                    }
                }
            }
        }

        Ok(Database {
            header,
            page_size: view.page_size,
            page_count,
            tables,
            orphans,
            pointer_map: pointer_map_entries,
            deleted_freeblock,
            deleted_unallocated,
        })
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.schema.name == name)
    }

    pub fn table_by_root_page(&self, root_page: u32) -> Option<&Table> {
        self.tables.iter().find(|t| t.schema.root_page == root_page)
    }
}

fn record_overflow_pages(cells: &[(u32, Cell)], into: &mut HashSet<u32>) {
    for (_, cell) in cells {
        let pages = match cell {
            Cell::TableLeaf { overflow_pages, .. }
            | Cell::IndexLeaf { overflow_pages, .. }
            | Cell::IndexInterior { overflow_pages, .. } => overflow_pages,
            Cell::TableInterior { .. } => continue,
        };
        into.extend(pages.iter().copied());
    }
}
