//! Command-line front end for building and querying a token value index.
#![forbid(unsafe_code)]

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use valindex::index::{IndexKind, QueryDescriptor, TokenIndex, ValueIndexes};
use valindex::{IndexOptions, Payload};

#[derive(Parser, Debug)]
#[command(
    name = "valindex",
    version,
    about = "Build a token value index from a file and query it",
    disable_help_subcommand = true
)]
struct Cli {
    /// Newline-separated tokens; a token's pointer is the line of its first
    /// occurrence and its size the number of occurrences.
    #[arg(value_name = "TOKENS")]
    tokens: PathBuf,

    #[arg(long, env = "VALINDEX_CONFIG", value_name = "FILE", help = "TOML index options")]
    config: Option<PathBuf>,

    #[arg(
        long,
        value_enum,
        default_value_t = KindArg::Text,
        help = "Index to load the tokens into"
    )]
    kind: KindArg,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for results"
    )]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Exact lookup of one or more tokens.
    Lookup {
        #[arg(required = true)]
        tokens: Vec<String>,
        #[arg(long, help = "Also list the lookup cache, most recent first")]
        cached: bool,
    },
    /// All tokens starting with PREFIX.
    Prefix {
        prefix: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Tokens from START onwards.
    Range {
        start: String,
        #[arg(long, help = "Walk towards smaller tokens")]
        desc: bool,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Tree shape and cache counters.
    Stats,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum KindArg {
    Text,
    Attribute,
}

impl From<KindArg> for IndexKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Text => IndexKind::Text,
            KindArg::Attribute => IndexKind::Attribute,
        }
    }
}

#[derive(Debug, Serialize)]
struct Row {
    token: String,
    found: bool,
    size: u32,
    pointer: u64,
}

#[derive(Debug, Serialize)]
struct LookupReport {
    rows: Vec<Row>,
    cached: Vec<Row>,
}

impl Row {
    fn hit(token: &[u8], payload: Payload) -> Self {
        Self {
            token: String::from_utf8_lossy(token).into_owned(),
            found: true,
            size: payload.size,
            pointer: payload.pointer,
        }
    }

    fn miss(token: &str) -> Self {
        Self {
            token: token.to_owned(),
            found: false,
            size: 0,
            pointer: 0,
        }
    }
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let options = match &cli.config {
        Some(path) => IndexOptions::load(path)?,
        None => IndexOptions::default(),
    };
    let kind = IndexKind::from(cli.kind);
    let mut indexes = ValueIndexes::new(&options)?;
    load_tokens(&cli.tokens, indexes.get_mut(kind))?;
    let index = indexes.get_mut(kind);

    match cli.command {
        Command::Lookup { tokens, cached } => {
            let rows: Vec<Row> = tokens
                .iter()
                .map(|token| match index.lookup_token(token.as_bytes()) {
                    Some(payload) => Row::hit(token.as_bytes(), payload),
                    None => Row::miss(token),
                })
                .collect();
            if cached {
                let report = LookupReport {
                    cached: index
                        .cached_tokens()
                        .into_iter()
                        .map(|entry| Row::hit(entry.key, entry.payload))
                        .collect(),
                    rows,
                };
                emit(cli.format, &report, || {
                    print_rows(&report.rows);
                    for row in &report.cached {
                        println!("cached\t{}\t{}\t{}", row.token, row.size, row.pointer);
                    }
                })?;
            } else {
                emit(cli.format, &rows, || print_rows(&rows))?;
            }
        }
        Command::Prefix { prefix, limit } => {
            let rows = collect_rows(index, QueryDescriptor::prefix(prefix), limit);
            emit(cli.format, &rows, || print_rows(&rows))?;
        }
        Command::Range { start, desc, limit } => {
            let descriptor = if desc {
                QueryDescriptor::descending_from(start)
            } else {
                QueryDescriptor::ascending_from(start)
            };
            let rows = collect_rows(index, descriptor, limit);
            emit(cli.format, &rows, || print_rows(&rows))?;
        }
        Command::Stats => {
            let stats = index.index_stats();
            emit(cli.format, &stats, || {
                println!(
                    "entries={} height={} black_height={} rotations={}",
                    stats.entries, stats.height, stats.black_height, stats.rotations
                );
                println!(
                    "cache: entries={} hits={} misses={} evictions={}",
                    stats.cached, stats.cache.hits, stats.cache.misses, stats.cache.evictions
                );
            })?;
        }
    }
    Ok(())
}

fn load_tokens(path: &Path, index: &mut dyn TokenIndex) -> Result<(), Box<dyn Error>> {
    let raw = fs::read(path)?;
    let mut order: Vec<&[u8]> = Vec::new();
    let mut seen: FxHashMap<&[u8], Payload> = FxHashMap::default();
    for (line_no, line) in raw.split(|b| *b == b'\n').enumerate() {
        let token = line.strip_suffix(b"\r").unwrap_or(line);
        if token.is_empty() {
            continue;
        }
        let entry = seen.entry(token).or_insert_with(|| {
            order.push(token);
            Payload::new(0, line_no as u64 + 1)
        });
        entry.size += 1;
    }
    for token in &order {
        let payload = seen[token];
        index.insert_token(token, payload.size, payload.pointer)?;
    }
    info!(path = %path.display(), tokens = order.len(), "valindex.load");
    Ok(())
}

fn collect_rows(
    index: &dyn TokenIndex,
    descriptor: QueryDescriptor,
    limit: Option<usize>,
) -> Vec<Row> {
    debug!(?descriptor, "valindex.scan");
    index
        .scan_tokens(descriptor)
        .take(limit.unwrap_or(usize::MAX))
        .map(|(token, payload)| Row::hit(token, payload))
        .collect()
}

fn emit<T, F>(format: OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: Serialize,
    F: Fn(),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(),
    }
    Ok(())
}

fn print_rows(rows: &[Row]) {
    for row in rows {
        if row.found {
            println!("{}\t{}\t{}", row.token, row.size, row.pointer);
        } else {
            println!("{}\t-", row.token);
        }
    }
}
