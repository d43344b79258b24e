//! Read word frequency data from text files
//!
//! Unigram files contain one `word<TAB>frequency` entry per line, bigram files contain
//! `word1<SPACE>word2<TAB>frequency`. The parsers are lazy: they yield one entry per line and
//! can be fed straight into [`Segmenter::try_new()`].

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::num::ParseFloatError;
use std::path::{Path, PathBuf};

use smartstring::alias::String;
use thiserror::Error;

use crate::Segmenter;

/// Build a `Segmenter` from `en-unigrams.txt` and `en-bigrams.txt` in `dir`
pub fn load_dir(dir: &Path) -> Result<Segmenter, ParseError> {
    let unigrams = unigrams(open(&dir.join(UNIGRAMS_FILE))?);
    let bigrams = bigrams(open(&dir.join(BIGRAMS_FILE))?);
    Segmenter::try_new(unigrams, bigrams)
}

fn open(path: &Path) -> Result<BufReader<File>, ParseError> {
    log::info!("reading {}", path.display());
    match File::open(path) {
        Ok(f) => Ok(BufReader::with_capacity(4 * 1024 * 1024, f)),
        Err(source) => Err(ParseError::Open {
            path: path.to_owned(),
            source,
        }),
    }
}

/// Parse `word<TAB>frequency` lines from `reader`
pub fn unigrams<R: BufRead>(reader: R) -> Unigrams<R> {
    Unigrams(LineReader::new(reader))
}

/// Parse `word1<SPACE>word2<TAB>frequency` lines from `reader`
pub fn bigrams<R: BufRead>(reader: R) -> Bigrams<R> {
    Bigrams(LineReader::new(reader))
}

/// Iterator over unigram entries, see [`unigrams()`]
pub struct Unigrams<R>(LineReader<R>);

impl<R: BufRead> Iterator for Unigrams<R> {
    type Item = Result<(String, f64), ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (line, ln) = match self.0.next_line()? {
            Ok(next) => next,
            Err(e) => return Some(Err(e)),
        };

        Some(parse_unigram(line, ln))
    }
}

fn parse_unigram(line: usize, ln: &str) -> Result<(String, f64), ParseError> {
    let split = ln.find('\t').ok_or(ParseError::MissingSeparator {
        line,
        separator: '\t',
    })?;

    let freq = parse_frequency(line, &ln[split + 1..])?;
    Ok((ln[..split].into(), freq))
}

/// Iterator over bigram entries, see [`bigrams()`]
pub struct Bigrams<R>(LineReader<R>);

impl<R: BufRead> Iterator for Bigrams<R> {
    type Item = Result<((String, String), f64), ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (line, ln) = match self.0.next_line()? {
            Ok(next) => next,
            Err(e) => return Some(Err(e)),
        };

        Some(parse_bigram(line, ln))
    }
}

fn parse_bigram(line: usize, ln: &str) -> Result<((String, String), f64), ParseError> {
    let score_split = ln.find('\t').ok_or(ParseError::MissingSeparator {
        line,
        separator: '\t',
    })?;

    let words = &ln[..score_split];
    let word_split = words.find(' ').ok_or(ParseError::MissingSeparator {
        line,
        separator: ' ',
    })?;

    let word1 = words[..word_split].into();
    let word2 = words[word_split + 1..].into();
    let freq = parse_frequency(line, &ln[score_split + 1..])?;
    Ok(((word1, word2), freq))
}

fn parse_frequency(line: usize, s: &str) -> Result<f64, ParseError> {
    s.trim()
        .parse::<f64>()
        .map_err(|source| ParseError::InvalidFrequency { line, source })
}

/// Reads lines into a reused buffer, keeping track of line numbers
struct LineReader<R> {
    reader: R,
    buf: std::string::String,
    line: usize,
}

impl<R: BufRead> LineReader<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            buf: std::string::String::new(),
            line: 0,
        }
    }

    /// Returns the next non-blank line (without line terminator) and its 1-based number
    fn next_line(&mut self) -> Option<Result<(usize, &str), ParseError>> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => self.line += 1,
                Err(e) => return Some(Err(e.into())),
            }

            if !self.buf.trim().is_empty() {
                break;
            }
        }

        let ln = self.buf.trim_end_matches(|c| c == '\n' || c == '\r');
        Some(Ok((self.line, ln)))
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to open {path:?}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("line {line}: missing {separator:?} separator")]
    MissingSeparator { line: usize, separator: char },
    #[error("line {line}: invalid frequency: {source}")]
    InvalidFrequency {
        line: usize,
        source: ParseFloatError,
    },
}

pub const UNIGRAMS_FILE: &str = "en-unigrams.txt";
pub const BIGRAMS_FILE: &str = "en-bigrams.txt";
