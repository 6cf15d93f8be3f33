//! Command-line configuration.
//!
//! Uses `clap`'s derive API for the CLI surface: which analysis passes to
//! run, what to restrict output to, and where to write extracted blobs.
//! Each flag is a long, self-explanatory name rather than a short letter —
//! the behavior matters, not brevity.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "sqlite-forensics", version, about = "Forensic reader for the SQLite on-disk file format")]
pub struct Cli {
    /// Path to the SQLite database file to analyze.
    pub database: PathBuf,

    /// Print verbose per-page/per-cell diagnostics to stderr.
    #[arg(long)]
    pub debug: bool,

    /// Scavenge freeblock regions for deleted-row remnants.
    #[arg(long)]
    pub freespace: bool,

    /// Scavenge unallocated regions for deleted-row remnants.
    #[arg(long)]
    pub unallocated: bool,

    /// Shorthand for --freespace and --unallocated together.
    #[arg(long)]
    pub deleted: bool,

    /// Attempt to reattach orphan leaf pages to a candidate table by
    /// column-count matching.
    #[arg(long)]
    pub recover_orphans: bool,

    /// Print the recovered schema (table names, root pages, CREATE
    /// statements) and exit.
    #[arg(long)]
    pub schema: bool,

    /// Print file-header and page-count summary information and exit.
    #[arg(long)]
    pub info: bool,

    /// Decode and print pointer-map pages, if any, and exit.
    #[arg(long)]
    pub ptrmap: bool,

    /// List recovered table names and exit.
    #[arg(long)]
    pub list_tables: bool,

    /// Restrict row output to a single table by name.
    #[arg(long, value_name = "NAME")]
    pub table: Option<String>,

    /// Restrict row output to a single table's root page number.
    #[arg(long, value_name = "PAGE")]
    pub table_page: Option<u32>,

    /// Write any blob column's content to a file named by row id and column
    /// index under this directory, sniffing the file type from a magic
    /// number rather than trusting the column's declared type.
    #[arg(long, value_name = "DIR")]
    pub bin2file: Option<PathBuf>,

    /// Print blob columns as the raw bytes rather than `<BLOB:n bytes>`.
    #[arg(long)]
    pub bin2out: bool,

    /// Run every analysis pass (schema, rows, deleted rows, orphans,
    /// pointer map) and print all of it.
    #[arg(long)]
    pub all: bool,
}

impl Cli {
    pub fn scavenge_freespace(&self) -> bool {
        self.freespace || self.deleted || self.all
    }

    pub fn scavenge_unallocated(&self) -> bool {
        self.unallocated || self.deleted || self.all
    }

    pub fn recover_orphans(&self) -> bool {
        self.recover_orphans || self.all
    }
}
