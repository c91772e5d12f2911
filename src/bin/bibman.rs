//! bibman Binary
//!
//! Command-line front end: sync, query and serve.

use std::io;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use bibman::store::IndexKind;
use bibman::{Config, Context, QueryOptions, Result, SyncOptions};

/// bibman
#[derive(Parser, Debug)]
#[command(name = "bibman")]
#[command(about = "Personal bibliography manager")]
#[command(version)]
struct Args {
    /// Bibliography file
    #[arg(short, long)]
    bibfile: PathBuf,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, default_value = "info")]
    loglevel: String,

    /// Bibliography format
    #[arg(long, default_value = "bibtex")]
    format: String,

    /// Fetch backends in priority order
    #[arg(long = "fetch-prio", value_delimiter = ',', default_value = "crossref")]
    fetch_prio: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find documents missing from the bibliography
    #[command(alias = "s")]
    Sync {
        /// Directories to scan
        #[arg(short, long = "path", required = true)]
        paths: Vec<PathBuf>,

        /// File extensions to consider
        #[arg(long, value_delimiter = ',', default_value = "pdf")]
        extlist: Vec<String>,

        /// Append new entries instead of printing them
        #[arg(short, long)]
        append: bool,

        /// Bibliographies whose entries also count as cataloged
        #[arg(short, long = "exclude")]
        excludes: Vec<PathBuf>,

        /// Skip checksums and duplicate detection
        #[arg(long)]
        nohash: bool,

        /// Prompt for corrections of every new entry
        #[arg(short, long)]
        interactive: bool,

        /// Fetch metadata remotely
        #[arg(long)]
        remote: bool,

        /// Rename files after corrections (interactive only)
        #[arg(long)]
        rename: bool,

        /// Verify checksums of cataloged files
        #[arg(long)]
        verify: bool,
    },

    /// Query the key or keywords index
    #[command(alias = "q")]
    Query {
        /// Index to query
        #[arg(short, long, default_value = "key")]
        index: IndexKind,

        /// OR-combined values; `,` joins AND terms; `-` reads stdin
        #[arg(required = true)]
        values: Vec<String>,

        /// Copy referenced files into this directory
        #[arg(short, long)]
        copy: Option<PathBuf>,

        /// Give copied files a descriptive name
        #[arg(long)]
        rename: bool,
    },

    /// Serve the bibliography over HTTP
    #[command(alias = "w")]
    Serve {
        /// Listen address (host:port)
        #[arg(short, long, default_value = "127.0.0.1:8080")]
        listen: String,
    },
}

fn main() {
    let args = Args::parse();

    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.loglevel));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let started = Instant::now();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }

    tracing::info!("All done in {:.2} sec", started.elapsed().as_secs_f64());
}

fn run(args: Args) -> Result<()> {
    let mut builder = Config::builder()
        .bibfile(&args.bibfile)
        .format(&args.format)
        .fetch_priority(args.fetch_prio);

    if let Commands::Serve { listen } = &args.command {
        builder = builder.listen_addr(listen);
    }

    let ctx = Context::new(builder.build())?;

    let stdin = io::stdin();
    let stdout = io::stdout();

    match args.command {
        Commands::Sync {
            paths,
            extlist,
            append,
            excludes,
            nohash,
            interactive,
            remote,
            rename,
            verify,
        } => {
            let opts = SyncOptions {
                paths,
                extensions: extlist,
                append,
                excludes,
                checksum: !nohash,
                interactive,
                remote,
                rename,
                verify,
            };
            bibman::sync::run_sync(&ctx, &opts, &mut stdin.lock(), &mut stdout.lock())?;
        }
        Commands::Query {
            index,
            values,
            copy,
            rename,
        } => {
            let opts = QueryOptions {
                index,
                values,
                copy,
                rename,
            };
            bibman::query::run_query(&ctx, &opts, stdin.lock(), &mut stdout.lock())?;
        }
        Commands::Serve { .. } => {
            bibman::web::serve(&ctx)?;
        }
    }

    Ok(())
}
