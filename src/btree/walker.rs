//! Walks a whole b-tree from its root page, yielding every leaf cell in key
//! order along with the set of pages visited.
//!
//! A forensic walk must tolerate a corrupt tree — a child pointer that is
//! out of range, points back up the tree, or revisits an already-visited
//! page stops that branch rather than recursing forever or panicking. The
//! walker also records every page it visits, which `database::Database`
//! uses to tell "reachable" pages apart from orphans.

use std::collections::HashSet;

use crate::dbheader::TextEncoding;
use crate::file_view::FileView;

use super::cell::{decode, Cell};
use super::header::{self, PageKind};

pub struct WalkResult {
    pub cells: Vec<(u32, Cell)>,
    pub visited_pages: HashSet<u32>,
    /// True if the walk stopped early anywhere in the tree (cycle,
    /// out-of-range child, or unreadable page).
    pub truncated: bool,
}

/// Walks the b-tree rooted at `root_page`, which must be a table or index
/// b-tree root (either kind; both variants are walked the same way — the
/// difference is only in cell layout, handled by `cell::decode`).
pub fn walk(view: &FileView, root_page: u32, encoding: TextEncoding) -> WalkResult {
    let mut cells = Vec::new();
    let mut visited = HashSet::new();
    let mut truncated = false;
    walk_page(view, root_page, encoding, &mut cells, &mut visited, &mut truncated);
    WalkResult {
        cells,
        visited_pages: visited,
        truncated,
    }
}

fn walk_page(
    view: &FileView,
    page_num: u32,
    encoding: TextEncoding,
    cells: &mut Vec<(u32, Cell)>,
    visited: &mut HashSet<u32>,
    truncated: &mut bool,
) {
    if page_num == 0 || page_num > view.effective_page_count() || !visited.insert(page_num) {
        *truncated = true;
        return;
    }
    let page = match view.page_bytes(page_num) {
        Some(p) => p,
        None => {
            *truncated = true;
            return;
        }
    };
    let header = match header::parse(page, page_num) {
        Some(h) => h,
        None => {
            *truncated = true;
            return;
        }
    };
    let offsets = header::cell_pointers(page, &header);
    if offsets.len() < header.cell_count as usize {
        *truncated = true;
    }

    for &offset in &offsets {
        match decode(header.kind, view, page, offset as usize, encoding) {
            Ok(Cell::TableInterior { left_child_page, .. }) => {
                walk_page(view, left_child_page, encoding, cells, visited, truncated);
            }
            Ok(Cell::IndexInterior { left_child_page, .. }) => {
                walk_page(view, left_child_page, encoding, cells, visited, truncated);
            }
            Ok(cell @ Cell::TableLeaf { .. }) => cells.push((page_num, cell)),
            Ok(cell @ Cell::IndexLeaf { .. }) => cells.push((page_num, cell)),
            Err(_) => {
                *truncated = true;
            }
        }
    }

    if let Some(rightmost) = header.rightmost_pointer {
        if matches!(header.kind, PageKind::InteriorTable | PageKind::InteriorIndex) {
            walk_page(view, rightmost, encoding, cells, visited, truncated);
        }
    }
}
