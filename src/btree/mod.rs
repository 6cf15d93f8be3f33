//! B-tree page parsing.
//!
//! SQLite stores every table and index as a b-tree; a page is either an
//! interior node (routing only) or a leaf (cells live here), and each of
//! table/index x interior/leaf has its own cell layout. A forensic reader
//! additionally has to recognise pages a live engine would never hand it
//! directly: pointer-map pages, overflow pages, and pages whose self-
//! reported type byte doesn't match any of the four known values.
//!
//! `header` classifies a page and reads its fixed fields, `cell` decodes
//! the per-kind cell formats (delegating to the sibling `overflow` module
//! for spilled payloads), `freeblock` scavenges free/unallocated regions
//! for stray cells, and `walker` drives the classify-decode-recurse loop
//! across a whole tree.

pub mod cell;
pub mod freeblock;
pub mod header;
pub mod walker;

pub use header::PageKind;
