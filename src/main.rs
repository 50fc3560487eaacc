use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, LevelFilter};
use mxliff::analysis::Stats;
use mxliff::{Document, EngineConfig, Segment, UnitKey, UnitState};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LevelFilter {
    fn from(level: CliLogLevel) -> Self {
        match level {
            CliLogLevel::Error => LevelFilter::Error,
            CliLogLevel::Warn => LevelFilter::Warn,
            CliLogLevel::Info => LevelFilter::Info,
            CliLogLevel::Debug => LevelFilter::Debug,
            CliLogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Inspect, validate and edit MXLIFF files without disturbing their bytes
#[derive(Parser, Debug)]
#[command(name = "mxliff", version, about)]
struct Cli {
    /// Logging level (RUST_LOG overrides it)
    #[arg(long, value_enum, default_value = "warn", global = true)]
    log_level: CliLogLevel,

    /// Engine configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that each file is written back unchanged
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List the units of a file
    Units {
        path: PathBuf,
        /// Index of the <file> block
        #[arg(long, default_value_t = 0)]
        file: usize,
        #[arg(long)]
        json: bool,
    },

    /// State counts, large length changes and gender variants
    Stats {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },

    /// Move a unit to a new workflow state
    SetState {
        path: PathBuf,
        unit_id: String,
        state: UnitState,
        #[arg(long, default_value_t = 0)]
        file: usize,
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace a unit's target. Inline tags are written as {id>, <id} and {id}.
    SetTarget {
        path: PathBuf,
        unit_id: String,
        text: String,
        #[arg(long, default_value_t = 0)]
        file: usize,
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.into())
        .parse_default_env()
        .init();

    let config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
            EngineConfig::from_json(&text).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => EngineConfig::default(),
    };
    debug!("configuration: {:?}", config);

    match cli.command {
        Commands::Check { files } => check(&files, &config),
        Commands::Units { path, file, json } => units(&path, file, json, &config),
        Commands::Stats { path, json } => stats(&path, json, &config),
        Commands::SetState {
            path,
            unit_id,
            state,
            file,
            output,
        } => {
            let mut document = open(&path, &config)?;
            let key = UnitKey::new(file, unit_id);
            document.set_state(&key, state)?;
            write(&document, output.as_deref())
        }
        Commands::SetTarget {
            path,
            unit_id,
            text,
            file,
            output,
        } => {
            let mut document = open(&path, &config)?;
            let key = UnitKey::new(file, unit_id);
            let pair = document
                .get_segments(&key)
                .ok_or_else(|| anyhow!("no trans-unit '{}' in file {}", key.id, key.file))?;
            document.set_target_segment(&key, Segment::from_markers(&text, &pair.source))?;
            write(&document, output.as_deref())
        }
    }
}

fn open(path: &Path, config: &EngineConfig) -> Result<Document> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Document::load_with(&bytes, config).with_context(|| format!("loading {}", path.display()))
}

fn write(document: &Document, output: Option<&Path>) -> Result<()> {
    let bytes = mxliff::serialize(document);
    match output {
        Some(path) => fs::write(path, bytes).with_context(|| format!("writing {}", path.display())),
        None => std::io::stdout().write_all(&bytes).context("writing to stdout"),
    }
}

fn check(files: &[PathBuf], config: &EngineConfig) -> Result<()> {
    let inputs = files
        .iter()
        .map(|path| fs::read(path).with_context(|| format!("reading {}", path.display())))
        .collect::<Result<Vec<_>>>()?;

    let results = mxliff::validate_many(&inputs, config);
    let mut failed = 0;
    for (path, result) in files.iter().zip(&results) {
        match result {
            Ok(()) => println!("ok    {}", path.display()),
            Err(err) => {
                failed += 1;
                println!("FAIL  {}: {}", path.display(), err);
                for diff in err.diffs() {
                    println!("      {}", diff);
                }
            }
        }
    }

    if failed > 0 {
        return Err(anyhow!("{} of {} file(s) failed the round trip", failed, files.len()));
    }
    Ok(())
}

fn units(path: &Path, file: usize, json: bool, config: &EngineConfig) -> Result<()> {
    let document = open(path, config)?;
    if document.file_info(file).is_none() {
        return Err(anyhow!("{} has {} file block(s)", path.display(), document.file_count()));
    }

    let units = document.list_units(file);
    if json {
        println!("{}", serde_json::to_string_pretty(&units)?);
        return Ok(());
    }
    for unit in units {
        println!(
            "{:<24} {:<10} {}{}",
            unit.id(),
            unit.state,
            if unit.has_translation { "translated text" } else { "no target" },
            unit.context_key.as_ref().map(|k| format!("  [{}]", k)).unwrap_or_default()
        );
    }
    Ok(())
}

fn stats(path: &Path, json: bool, config: &EngineConfig) -> Result<()> {
    let document = open(path, config)?;
    let stats = Stats::collect(&document);
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{} unit(s)", stats.units);
    for (state, count) in &stats.states {
        println!("  {:<10} {}", state, count);
    }
    if !stats.expansions.is_empty() {
        println!("length changes over {}%:", config.expansion_threshold);
        for report in &stats.expansions {
            println!("  {}", report);
        }
    }
    if !stats.variants.is_empty() {
        println!("gender variants:");
        for pair in &stats.variants {
            println!("  {} -> {}: {}", pair.base, pair.variant, pair.added_words.join(" "));
        }
    }
    Ok(())
}
