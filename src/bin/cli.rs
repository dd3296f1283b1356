//! offsetidx CLI
//!
//! Build, inspect and query offsets tables from the command line.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use offsetidx::{
    CompanionSource, Config, IndexStore, MonotoneSequence, OffsetsTable, RecordFile,
    RecordFileWriter,
};
use tracing_subscriber::{fmt, EnvFilter};

/// offsetidx CLI
#[derive(Parser, Debug)]
#[command(name = "offsetidx")]
#[command(about = "Elias-Fano offsets tables for record files")]
#[command(version)]
struct Args {
    /// Cache directory (defaults to `.offsetidx` next to the record file)
    #[arg(short, long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Skip checksum verification when mapping tables
    #[arg(long, global = true)]
    no_verify: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a record file with one record per input line
    Pack {
        /// Output record file
        out: PathBuf,

        /// Text input, one record per line
        input: PathBuf,

        /// Data version stored in the record file header
        #[arg(short, long, default_value = "1")]
        data_version: u64,
    },

    /// Build (or reuse) the offsets table of a record file
    Build {
        /// The record file
        records: PathBuf,
    },

    /// Print the offset and payload of the record at an ordinal
    Offset {
        /// The record file
        records: PathBuf,

        /// Record ordinal
        index: usize,
    },

    /// Print the ordinal of the record starting at an offset
    Index {
        /// The record file
        records: PathBuf,

        /// Record start offset
        offset: u32,
    },

    /// Describe a persisted offsets table
    Info {
        /// The table file
        table: PathBuf,
    },

    /// Print the offsets stored in a table
    Dump {
        /// The table file
        table: PathBuf,

        /// Maximum number of offsets to print
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,offsetidx=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> offsetidx::Result<()> {
    match &args.command {
        Commands::Pack {
            out,
            input,
            data_version,
        } => {
            let reader = BufReader::new(File::open(input)?);
            let mut writer = RecordFileWriter::create(out, *data_version)?;
            for line in reader.lines() {
                writer.append(line?.as_bytes())?;
            }
            let summary = writer.finish()?;
            println!(
                "{}: {} records, {} data bytes",
                summary.path.display(),
                summary.record_count,
                summary.data_len
            );
        }

        Commands::Build { records } => {
            let file = RecordFile::open(records)?;
            let store = open_store(&args, records)?;
            let table = store.offsets_table(&file)?;
            let path = store.index_path(&file.identity(), &offsetidx::IndexKind::Offsets);

            let stats = store.stats();
            println!(
                "{}: {} entries, {} bytes ({})",
                path.display(),
                table.len(),
                table.size_in_bytes(),
                if stats.builds > 0 { "built" } else { "cached" }
            );
        }

        Commands::Offset { records, index } => {
            let file = RecordFile::open(records)?;
            let table = open_store(&args, records)?.offsets_table(&file)?;

            let offset = table.offset_at(*index)?;
            let payload = file.read_record(offset)?;
            println!("{}\t{}", offset, String::from_utf8_lossy(payload));
        }

        Commands::Index { records, offset } => {
            let file = RecordFile::open(records)?;
            let table = open_store(&args, records)?.offsets_table(&file)?;
            println!("{}", table.index_at(*offset)?);
        }

        Commands::Info { table } => {
            let table = OffsetsTable::load(table, &config_for(&args, table).load_options())?;
            let index = table.compact_index();

            println!("entries:      {}", index.len());
            println!("min offset:   {:?}", table.min_offset());
            println!("max offset:   {:?}", table.max_offset());
            println!("low width:    {}", index.low_width());
            println!("size:         {} bytes", index.size_in_bytes());
            if !index.is_empty() {
                println!(
                    "bits/entry:   {:.2}",
                    (index.size_in_bytes() * 8) as f64 / index.len() as f64
                );
            }
        }

        Commands::Dump { table, limit } => {
            let table = OffsetsTable::load(table, &config_for(&args, table).load_options())?;
            let limit = limit.unwrap_or(usize::MAX);
            for (ordinal, offset) in table.iter().enumerate().take(limit) {
                println!("{}\t{}", ordinal, offset);
            }
        }
    }
    Ok(())
}

/// Config honoring the global flags; the cache root defaults next to `anchor`
fn config_for(args: &Args, anchor: &Path) -> Config {
    let cache_dir = args.cache_dir.clone().unwrap_or_else(|| {
        anchor
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(".offsetidx")
    });

    Config::builder()
        .cache_dir(cache_dir)
        .verify_checksum(!args.no_verify)
        .build()
}

fn open_store(args: &Args, records: &Path) -> offsetidx::Result<IndexStore> {
    IndexStore::open(config_for(args, records))
}
