//! # CLI - stream dataset shell
//!
//! A REPL-style command-line interface over a dataset container. Reads
//! commands from stdin, runs them against the container and prints results
//! to stdout. Logs go to stderr, so piping commands in and reading stdout
//! back works for scripted use.
//!
//! ## Commands
//!
//! ```text
//! IMPORT WCUP path name [sid_field] [key_field]   Load a WorldCup'98 log
//! GEN name max_sid max_hid max_key max_time [seed] Generate uniform records
//! LIST                      List entries
//! INFO name                 Print metadata and annotations
//! HEAD name [n]             Print the first n records (default 10)
//! DROP name                 Delete an entry
//! COPY src dst              Copy an entry
//! HASH_STREAMS name m       Map stream ids into [0, m)
//! HASH_SOURCES name n       Map source ids into [0, n)
//! NEGATE name               Negate every update
//! SHIFT name dt             Shift timestamps by dt
//! WINDOW name tw            Add expiry records tw after each record
//! MERGE dst src...          Merge entries into dst
//! SLICE src dst from to     Store the time window [from, to) of src as dst
//! ANNOTATE name attr value  Set an annotation
//! EXIT / QUIT               Leave the shell
//! ```
//!
//! ## Configuration
//!
//! ```text
//! DDS_CONTAINER      container directory      (default: "data/dds")
//! DDS_COMPRESSION    "zstd" or "none"         (default: "zstd")
//! DDS_ZSTD_LEVEL     zstd compression level   (default: 3)
//! DDS_CHUNK_RECORDS  records per data chunk   (default: 65536)
//! RUST_LOG           log filter               (default: "info")
//! ```
//!
//! ## Example
//!
//! ```text
//! $ cargo run -p cli
//! dds shell (container=data/dds, compression=Zstd(3), chunk=65536)
//! > GEN u 4 2 100 1000 7
//! OK (1000 records)
//! > WINDOW u 50
//! OK (2000 records)
//! > INFO u
//! <StreamDataset of length 2000>
//! ...
//! > EXIT
//! bye
//! ```

mod session;

use anyhow::{Context, Result};
use config::Config;
use container::Container;
use std::io::{self, BufRead, Write};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::session::{Session, Step};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();

    let cfg = Config::from_env();
    let container = Container::with_options(&cfg.container_dir, cfg.write_options())
        .with_context(|| format!("opening container {}", cfg.container_dir.display()))?;
    info!(
        container = %cfg.container_dir.display(),
        entries = container.names()?.len(),
        "container opened"
    );
    let session = Session::new(container);

    println!(
        "dds shell (container={}, compression={:?}, chunk={})",
        cfg.container_dir.display(),
        cfg.compression,
        cfg.chunk_records
    );
    println!("Commands: IMPORT WCUP | GEN | LIST | INFO | HEAD | DROP | COPY");
    println!("          HASH_STREAMS | HASH_SOURCES | NEGATE | SHIFT | WINDOW");
    println!("          MERGE | SLICE | ANNOTATE | EXIT");
    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        match session.execute(&line) {
            Step::Output(text) => {
                if !text.is_empty() {
                    println!("{}", text);
                }
            }
            Step::Exit => {
                println!("bye");
                break;
            }
        }
        print!("> ");
        io::stdout().flush().ok();
    }

    Ok(())
}
