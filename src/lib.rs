//! Forensic reader for the on-disk SQLite file format.
//!
//! Reconstructs the logical contents of every table in a raw database file,
//! and recovers records a live engine considers deleted: bytes still
//! sitting in intra-page free blocks, in unallocated page slack, or on
//! leaf-table pages no interior page points at anymore. No live engine,
//! journal replay, or write support is involved — see `database::Database`
//! for the single entry point that drives the whole read.

pub mod blob;
pub mod btree;
pub mod byte_reader;
pub mod config;
pub mod database;
pub mod dbheader;
pub mod error;
pub mod file_view;
pub mod formatting;
pub mod orphan;
pub mod overflow;
pub mod pointer_map;
pub mod schema;
pub mod serial_type;
pub mod sql_type;
pub mod sql_value;

pub use database::Database;
