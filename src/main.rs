//! Command-line entry point.
//!
//! Parses a `clap` CLI (`config::Cli`), drives `database::Database` through
//! its single pass that recovers every table, orphan leaf and scavenged
//! row the flags ask for, then prints whatever was requested — `main` just
//! decides what to print and, for blob columns, where to write them.

use std::process::ExitCode;

use clap::Parser;

use sqlite_forensics::config::Cli;
use sqlite_forensics::database::{Database, Table};
use sqlite_forensics::formatting;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    if cli.table.is_some() && cli.table_page.is_some() {
        eprintln!("error: --table and --table-page are mutually exclusive");
        return ExitCode::from(2);
    }

    let db = match Database::open(&cli.database, &cli) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(1);
        }
    };

    let mut printed_summary = false;
    if cli.info {
        formatting::print_info(&db);
        printed_summary = true;
    }
    if cli.schema {
        formatting::print_schema(&db);
        printed_summary = true;
    }
    if cli.list_tables {
        formatting::print_table_list(&db);
        printed_summary = true;
    }
    if cli.ptrmap {
        print_pointer_map(&db);
        printed_summary = true;
    }

    // A pure summary invocation (--info/--schema/--list-tables/--ptrmap and
    // nothing else) doesn't also dump rows; any other invocation, including
    // plain `sqlite-forensics db.sqlite` with no flags, does.
    if !printed_summary || cli.table.is_some() || cli.table_page.is_some() {
        dump_rows(&db, &cli);
    }

    ExitCode::SUCCESS
}

fn print_pointer_map(db: &Database) {
    for (page, entry) in &db.pointer_map {
        println!("{page};{:?};{}", entry.entry_type, entry.parent_page);
    }
}

fn dump_rows(db: &Database, cli: &Cli) {
    let targets: Vec<&Table> = if let Some(name) = &cli.table {
        db.table(name).into_iter().collect()
    } else if let Some(page) = cli.table_page {
        db.table_by_root_page(page).into_iter().collect()
    } else {
        db.tables.iter().collect()
    };

    if targets.is_empty() {
        if cli.table.is_some() || cli.table_page.is_some() {
            eprintln!("error: no matching table found");
        }
        return;
    }

    for table in targets {
        dump_table(db, table, cli);
    }
}

fn dump_table(db: &Database, table: &Table, cli: &Cli) {
    println!("{}", formatting::format_table_header(&table.schema));

    for row in &table.rows {
        println!("{}", formatting::format_row_extracting_blobs(
            row,
            Some(&table.schema),
            &table.schema.name,
            cli.bin2file.as_deref(),
            cli.bin2out,
        ));
    }

    if cli.scavenge_freespace() {
        for (page, cell) in &db.deleted_freeblock {
            if table.pages.contains(page) {
                println!("{}", formatting::format_scavenged(*page, cell, false, cli.bin2out));
            }
        }
    }
    if cli.scavenge_unallocated() {
        for (page, cell) in &db.deleted_unallocated {
            if table.pages.contains(page) {
                println!("{}", formatting::format_scavenged(*page, cell, false, cli.bin2out));
            }
        }
    }

    if cli.recover_orphans() {
        for orphan in db.orphans.iter().filter(|o| o.candidate_tables.contains(&table.schema.name)) {
            for (row_id, values) in &orphan.rows {
                println!("{}", formatting::format_orphan_row(orphan.page_num, *row_id, values, cli.bin2out));
            }
            if cli.scavenge_freespace() {
                for (page, cell) in &db.deleted_freeblock {
                    if *page == orphan.page_num {
                        println!("{}", formatting::format_scavenged(*page, cell, true, cli.bin2out));
                    }
                }
            }
            if cli.scavenge_unallocated() {
                for (page, cell) in &db.deleted_unallocated {
                    if *page == orphan.page_num {
                        println!("{}", formatting::format_scavenged(*page, cell, true, cli.bin2out));
                    }
                }
            }
        }
    }
}
