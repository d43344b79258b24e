use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use tempfile::NamedTempFile;
use wordbreak::{Search, Segmenter};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Segment(args) => segment(args),
        Command::Dump(args) => dump(args),
    }
}

/// Split text without spaces into words
#[derive(Debug, Parser)]
#[command(name = "wordbreak", version, about)]
struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Segment each TEXT argument, or each line of stdin
    Segment(SegmentArgs),
    /// Build a model from corpus files and write it as a binary snapshot
    Dump(DumpArgs),
}

#[derive(Debug, Args)]
struct SegmentArgs {
    /// Directory containing en-unigrams.txt and en-bigrams.txt
    #[arg(short, long, value_name = "DIR", env = "WORDBREAK_DATA")]
    data: Option<PathBuf>,

    /// Snapshot written by `wordbreak dump`, used instead of --data
    #[arg(short, long, value_name = "FILE")]
    model: Option<PathBuf>,

    /// Append the score of each segmentation
    #[arg(short, long)]
    score: bool,

    #[command(flatten)]
    tuning: Tuning,

    /// Text to segment (reads lines from stdin if absent)
    text: Vec<String>,
}

#[derive(Debug, Args)]
struct DumpArgs {
    /// Directory containing en-unigrams.txt and en-bigrams.txt
    #[arg(short, long, value_name = "DIR", env = "WORDBREAK_DATA")]
    data: PathBuf,

    /// Snapshot file to write
    #[arg(short, long, value_name = "FILE")]
    out: PathBuf,

    #[command(flatten)]
    tuning: Tuning,
}

#[derive(Debug, Args)]
struct Tuning {
    /// Maximum word length to consider
    #[arg(long, value_name = "N")]
    limit: Option<usize>,

    /// Weight of the bigram model relative to the unigram model, between 0 and 1
    #[arg(long, value_name = "WEIGHT")]
    bigram_weight: Option<f64>,
}

impl Tuning {
    fn apply(&self, segmenter: &mut Segmenter) {
        if let Some(limit) = self.limit {
            segmenter.set_limit(limit);
        }
        if let Some(weight) = self.bigram_weight {
            segmenter.set_bigram_weight(weight);
        }
    }
}

fn segment(args: SegmentArgs) -> Result<()> {
    let mut segmenter = match (&args.model, &args.data) {
        (Some(model), _) => load_model(model)?,
        (None, Some(dir)) => load_data(dir)?,
        (None, None) => bail!("either --data or --model is required"),
    };
    args.tuning.apply(&mut segmenter);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut search = Search::new();
    let mut failed = 0;

    let mut process = |input: &str| -> Result<()> {
        match segmenter.try_segment(input, &mut search) {
            Ok(score) => {
                let mut first = true;
                for word in &search {
                    if !first {
                        out.write_all(b" ")?;
                    }
                    out.write_all(word.as_bytes())?;
                    first = false;
                }
                match args.score {
                    true => writeln!(out, "\t{:.6}", score)?,
                    false => writeln!(out)?,
                }
            }
            Err(e) => {
                log::debug!("no result for {:?}", input);
                eprintln!("error: {:?}: {}", input, e);
                failed += 1;
            }
        }
        Ok(())
    };

    match args.text.is_empty() {
        true => {
            for line in io::stdin().lock().lines() {
                let line = line.context("failed to read from stdin")?;
                process(line.trim_end())?;
            }
        }
        false => {
            for text in &args.text {
                process(text)?;
            }
        }
    }

    out.flush()?;
    match failed {
        0 => Ok(()),
        n => Err(anyhow!("{} input(s) could not be segmented", n)),
    }
}

fn dump(args: DumpArgs) -> Result<()> {
    let mut segmenter = load_data(&args.data)?;
    args.tuning.apply(&mut segmenter);

    let parent = match args.out.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    // Write to a temporary file first so an interrupted dump never leaves a partial snapshot
    let file = NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temporary file in {}", parent.display()))?;
    let mut writer = BufWriter::with_capacity(32 * 1024 * 1024, &file);
    bincode::serialize_into(&mut writer, &segmenter).context("serialization error")?;
    writer.flush()?;
    drop(writer);

    file.persist(&args.out)
        .with_context(|| format!("failed to write {}", args.out.display()))?;
    log::info!(
        "wrote {} words and {} word pairs to {}",
        segmenter.num_words(),
        segmenter.num_pairs(),
        args.out.display()
    );
    Ok(())
}

fn load_data(dir: &Path) -> Result<Segmenter> {
    let segmenter = wordbreak::corpus::load_dir(dir)
        .with_context(|| format!("failed to load corpus from {}", dir.display()))?;
    log::info!(
        "loaded {} words and {} word pairs from {}",
        segmenter.num_words(),
        segmenter.num_pairs(),
        dir.display()
    );
    Ok(segmenter)
}

fn load_model(path: &Path) -> Result<Segmenter> {
    let f = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let segmenter = bincode::deserialize_from(BufReader::with_capacity(32 * 1024 * 1024, f))
        .with_context(|| format!("deserialization error in {}", path.display()))?;
    log::info!("loaded model from {}", path.display());
    Ok(segmenter)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}
