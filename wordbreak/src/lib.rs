use std::convert::Infallible;
use std::ops::Range;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smartstring::alias::String;
use thiserror::Error;

mod bigrams;
pub mod corpus;
#[cfg(feature = "test-cases")]
pub mod test_cases;
#[cfg(feature = "__test_data")]
pub mod test_data;
mod trie;
mod unigrams;

use bigrams::Bigrams;
use trie::Trie;
use unigrams::{Unigrams, WordId};

/// Central data structure used to calculate word probabilities
///
/// A `Segmenter` is immutable once built and can be shared between threads; each thread needs
/// its own `Search`.
#[cfg_attr(feature = "with-serde", derive(Deserialize, Serialize))]
pub struct Segmenter {
    unigrams: Unigrams,
    bigrams: Bigrams,
    trie: Trie,
    limit: usize,
    bigram_weight: f64,
}

impl Segmenter {
    /// Create `Segmenter` from the given iterators
    ///
    /// Both iterators are consumed exactly once. Duplicate words (or word pairs) have their
    /// frequencies summed; entries with a frequency that is not strictly positive are skipped.
    ///
    /// Note: the `String` types used in this API are defined in the `smartstring` crate. Any
    /// `&str` or `String` can be converted into the `String` used here by calling `into()` on it.
    pub fn new<U, B>(unigrams: U, bigrams: B) -> Self
    where
        U: IntoIterator<Item = (String, f64)>,
        B: IntoIterator<Item = ((String, String), f64)>,
    {
        let result = Self::try_new(
            unigrams.into_iter().map(Ok::<_, Infallible>),
            bigrams.into_iter().map(Ok::<_, Infallible>),
        );

        match result {
            Ok(segmenter) => segmenter,
            Err(never) => match never {},
        }
    }

    /// Create `Segmenter` from fallible iterators
    ///
    /// Construction stops at the first `Err` item, which is returned.
    pub fn try_new<U, B, E>(unigrams: U, bigrams: B) -> Result<Self, E>
    where
        U: IntoIterator<Item = Result<(String, f64), E>>,
        B: IntoIterator<Item = Result<((String, String), f64), E>>,
    {
        let unigrams = Unigrams::build(unigrams)?;
        let bigrams = Bigrams::build(bigrams, &unigrams)?;
        let trie = Trie::new(unigrams.words());
        log::debug!(
            "segmenter ready with {} words and {} word pairs",
            unigrams.len(),
            bigrams.len()
        );

        Ok(Self {
            unigrams,
            bigrams,
            trie,
            limit: DEFAULT_LIMIT,
            bigram_weight: DEFAULT_BIGRAM_WEIGHT,
        })
    }

    /// Segment the text in `input`
    ///
    /// Requires that `input` consists of ASCII letters only; uppercase letters are
    /// folded to lowercase. On success, `search` holds the words of the most likely segmentation
    /// and the total (natural log) score is returned. Returns `None` if `input` contains other
    /// characters or cannot be covered by known words.
    pub fn segment(&self, input: &str, search: &mut Search) -> Option<f64> {
        self.try_segment(input, search).ok()
    }

    /// Segment the text in `input`, reporting why segmentation failed
    ///
    /// The `search` parameter contains caches that are used during segmentation; passing it in
    /// allows the callers to reuse the cache allocations.
    pub fn try_segment(&self, input: &str, search: &mut Search) -> Result<f64, SegmentError> {
        search.clear();
        normalize_into(input, &mut search.text)?;
        let score = SegmentState::new(self, search).run()?;
        search.score = Some(score);
        Ok(score)
    }

    /// Returns the sentence's score
    ///
    /// Returns the relative probability for the given sentence in the corpus represented by
    /// this `Segmenter`, using the same model as `segment()`. Words missing from the corpus are
    /// penalized according to their length. Will return `None` iff given an empty iterator.
    pub fn score_sentence<'a>(&self, words: impl Iterator<Item = &'a str>) -> Option<f64> {
        let mut total = None;
        let mut previous = None;
        for word in words {
            let (score, id) = match normalize(word).and_then(|w| self.unigrams.id(&w)) {
                Some(id) => (self.score(id, previous), Some(id)),
                None => (self.unigrams.unknown(word.len()), None),
            };

            total = Some(total.unwrap_or(0.0) + score);
            previous = id;
        }

        total
    }

    /// Log probability of `word`, or `None` if it is not a known word
    pub fn probability_of(&self, word: &str) -> Option<f64> {
        let id = self.unigrams.id(&normalize(word)?)?;
        Some(self.unigrams.score(id))
    }

    /// Change applied to the log probability of `second` when it directly follows `first`
    ///
    /// Returns `None` if there is no data for this word pair, in which case `second` is scored
    /// by its unigram probability alone.
    pub fn adjustment_for(&self, first: &str, second: &str) -> Option<f64> {
        let first = self.unigrams.id(&normalize(first)?)?;
        let second = self.unigrams.id(&normalize(second)?)?;
        self.bigrams.get(first, second)?;
        Some(self.score(second, Some(first)) - self.unigrams.score(second))
    }

    /// Score `word` in the context of the `previous` word
    fn score(&self, word: WordId, previous: Option<WordId>) -> f64 {
        let unigram = self.unigrams.score(word);
        let conditional = match previous.and_then(|prev| self.bigrams.get(prev, word)) {
            Some(conditional) => conditional,
            None => return unigram,
        };

        // Interpolate the conditional probability of the word given the previous word with its
        // unconditional probability, so rare pairs don't completely override the unigram data.
        let weight = self.bigram_weight;
        (weight * conditional.exp() + (1.0 - weight) * unigram.exp()).ln()
    }

    /// Number of distinct known words
    pub fn num_words(&self) -> usize {
        self.unigrams.len()
    }

    /// Number of distinct word pairs with bigram data
    pub fn num_pairs(&self) -> usize {
        self.bigrams.len()
    }

    /// Customize the word length `limit`
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
    }

    /// Customize how much weight the bigram model gets relative to the unigram model
    ///
    /// `0.0` ignores bigrams, `1.0` uses the conditional probability on its own. Values outside
    /// that range are clamped.
    pub fn set_bigram_weight(&mut self, weight: f64) {
        self.bigram_weight = match weight.is_nan() {
            true => DEFAULT_BIGRAM_WEIGHT,
            false => weight.max(0.0).min(1.0),
        };
    }
}

struct SegmentState<'a> {
    data: &'a Segmenter,
    text: &'a [u8],
    best: &'a mut Vec<Candidate>,
    result: &'a mut Vec<Range<usize>>,
}

impl<'a> SegmentState<'a> {
    fn new(data: &'a Segmenter, search: &'a mut Search) -> Self {
        let Search { text, best, result, .. } = search;

        Self {
            data,
            text: text.as_bytes(),
            best,
            result,
        }
    }

    /// Find the best segmentation of `text`, returning its score
    ///
    /// `best[i]` holds the best way to reach offset `i`. Offsets are relaxed from left to right,
    /// and a candidate only replaces the recorded best if it scores strictly higher, so on a tie
    /// the split whose last word starts earliest wins.
    fn run(mut self) -> Result<f64, SegmentError> {
        let len = self.text.len();
        self.best.clear();
        self.best.resize(len + 1, Candidate::UNREACHABLE);
        self.best[0] = Candidate::START;

        for start in 0..len {
            let from = self.best[start];
            if !from.is_reachable() {
                continue;
            }

            for (end, word) in self.data.trie.prefixes(self.text, start, self.data.limit) {
                let score = from.score + self.data.score(word, from.word);
                if score > self.best[end].score {
                    self.best[end] = Candidate {
                        score,
                        start,
                        word: Some(word),
                    };
                }
            }
        }

        let last = self.best[len];
        if !last.is_reachable() {
            return Err(SegmentError::NoSegmentation);
        }

        let mut end = len;
        while end > 0 {
            let start = self.best[end].start;
            self.result.push(start..end);
            end = start;
        }

        self.result.reverse();
        Ok(last.score)
    }
}

/// Best known way to reach an offset in the input
#[derive(Clone, Copy, Debug)]
struct Candidate {
    score: f64,
    /// Offset where the word ending here starts
    start: usize,
    word: Option<WordId>,
}

impl Candidate {
    const START: Self = Self {
        score: 0.0,
        start: 0,
        word: None,
    };

    const UNREACHABLE: Self = Self {
        score: f64::NEG_INFINITY,
        start: 0,
        word: None,
    };

    fn is_reachable(&self) -> bool {
        self.score > f64::NEG_INFINITY
    }
}

/// Search buffer and result set
///
/// Holds the words found by the last successful call to `Segmenter::segment()`, along with
/// buffers that are reused between calls.
#[derive(Clone, Debug, Default)]
pub struct Search {
    text: std::string::String,
    best: Vec<Candidate>,
    result: Vec<Range<usize>>,
    score: Option<f64>,
}

impl Search {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove the previous result, keeping the allocations
    pub fn clear(&mut self) {
        self.text.clear();
        self.best.clear();
        self.result.clear();
        self.score = None;
    }

    /// Iterate over the words found, from left to right
    pub fn words(&self) -> Words<'_> {
        Words {
            text: &self.text,
            ranges: self.result.iter(),
        }
    }

    /// Get the word at `idx`
    pub fn get(&self, idx: usize) -> Option<&str> {
        self.result.get(idx).map(|range| &self.text[range.clone()])
    }

    pub fn len(&self) -> usize {
        self.result.len()
    }

    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }

    /// Score of the last successful segmentation
    pub fn score(&self) -> Option<f64> {
        self.score
    }
}

impl<'a> IntoIterator for &'a Search {
    type Item = &'a str;
    type IntoIter = Words<'a>;

    fn into_iter(self) -> Words<'a> {
        self.words()
    }
}

/// Iterator over the words in a `Search`
#[derive(Clone, Debug)]
pub struct Words<'a> {
    text: &'a str,
    ranges: std::slice::Iter<'a, Range<usize>>,
}

impl<'a> Iterator for Words<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let range = self.ranges.next()?;
        Some(&self.text[range.clone()])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ranges.size_hint()
    }
}

impl ExactSizeIterator for Words<'_> {}

/// Lowercase `input` into `out`, rejecting anything but ASCII letters
fn normalize_into(input: &str, out: &mut std::string::String) -> Result<(), SegmentError> {
    out.reserve(input.len());
    for c in input.chars() {
        match c.is_ascii_alphabetic() {
            true => out.push(c.to_ascii_lowercase()),
            false => return Err(SegmentError::InvalidCharacter),
        }
    }

    Ok(())
}

/// Normalize a corpus word, returning `None` if it contains unsupported characters
pub(crate) fn normalize(word: &str) -> Option<String> {
    if word.is_empty() || !word.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }

    let mut word = String::from(word);
    word.make_ascii_lowercase();
    Some(word)
}

/// Reasons why `Segmenter::try_segment()` did not produce a result
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum SegmentError {
    #[error("invalid character")]
    InvalidCharacter,
    #[error("no segmentation into known words")]
    NoSegmentation,
}

type HashMap<K, V> = std::collections::HashMap<K, V, ahash::RandomState>;

const DEFAULT_LIMIT: usize = 24;
const DEFAULT_BIGRAM_WEIGHT: f64 = 0.5;

#[cfg(test)]
pub mod tests {
    use super::*;

    fn segmenter(unigrams: &[(&str, f64)], bigrams: &[(&str, &str, f64)]) -> Segmenter {
        Segmenter::new(
            unigrams.iter().map(|&(word, freq)| (word.into(), freq)),
            bigrams
                .iter()
                .map(|&(first, second, freq)| ((first.into(), second.into()), freq)),
        )
    }

    fn words(search: &Search) -> Vec<&str> {
        search.words().collect()
    }

    #[test]
    fn test_clean() {
        let mut out = std::string::String::new();
        assert_eq!(
            normalize_into("Can't buy me love!", &mut out),
            Err(SegmentError::InvalidCharacter)
        );

        out.clear();
        normalize_into("CantBuyMeLove", &mut out).unwrap();
        assert_eq!(out, "cantbuymelove");

        assert_eq!(normalize("Spain").as_deref(), Some("spain"));
        assert_eq!(normalize("naïve"), None);
        assert_eq!(normalize(""), None);
    }

    #[test]
    fn bigram_reinforced() {
        let segmenter = segmenter(
            &[("choose", 50.0), ("chooses", 10.0), ("spain", 50.0), ("pain", 10.0)],
            &[("choose", "spain", 10.0), ("chooses", "pain", 10.0)],
        );

        let mut search = Search::new();
        let score = segmenter.segment("choosespain", &mut search).unwrap();
        assert_eq!(words(&search), vec!["choose", "spain"]);
        assert_eq!(search.score(), Some(score));

        let expected = segmenter
            .score_sentence(["choose", "spain"].iter().copied())
            .unwrap();
        assert!((score - expected).abs() < 1e-12);
        let other = segmenter
            .score_sentence(["chooses", "pain"].iter().copied())
            .unwrap();
        assert!(other < score);
        assert!(segmenter.adjustment_for("choose", "spain").unwrap() > 0.0);
    }

    #[test]
    fn bigram_outweighs_frequent_unigram() {
        let segmenter = segmenter(
            &[
                ("choose", 80_000.0),
                ("chooses", 7_000.0),
                ("spain", 20_000.0),
                ("pain", 90_000.0),
            ],
            &[("choose", "spain", 7.0), ("chooses", "pain", 0.0)],
        );

        let mut search = Search::new();
        segmenter.segment("choosespain", &mut search).unwrap();
        assert_eq!(words(&search), vec!["choose", "spain"]);
        assert_eq!(segmenter.num_pairs(), 1);
        assert!(segmenter.adjustment_for("choose", "spain").unwrap() > 0.0);
    }

    #[test]
    fn bigram_flips_unigram_choice() {
        let mut segmenter = segmenter(
            &[
                ("choose", 80_000.0),
                ("chooses", 7_000.0),
                ("spain", 20_000.0),
                ("pain", 90_000.0),
            ],
            &[("chooses", "pain", 7.0), ("choose", "spain", 1.0)],
        );

        let mut search = Search::new();
        segmenter.segment("choosespain", &mut search).unwrap();
        assert_eq!(words(&search), vec!["chooses", "pain"]);

        segmenter.set_bigram_weight(0.0);
        segmenter.segment("choosespain", &mut search).unwrap();
        assert_eq!(words(&search), vec!["choose", "spain"]);
    }

    #[test]
    fn empty_input() {
        let segmenter = segmenter(&[("a", 1.0)], &[]);
        let mut search = Search::new();
        assert_eq!(segmenter.segment("", &mut search), Some(0.0));
        assert!(search.is_empty());
        assert_eq!(search.words().len(), 0);
    }

    #[test]
    fn failures() {
        let segmenter = segmenter(&[("choose", 1.0), ("spain", 1.0)], &[]);
        let mut search = Search::new();

        assert_eq!(
            segmenter.try_segment("xyz", &mut search),
            Err(SegmentError::NoSegmentation)
        );
        assert_eq!(
            segmenter.try_segment("choosespainx", &mut search),
            Err(SegmentError::NoSegmentation)
        );
        assert_eq!(
            segmenter.try_segment("choose spain", &mut search),
            Err(SegmentError::InvalidCharacter)
        );
        assert_eq!(segmenter.segment("choose-spain", &mut search), None);
        assert!(search.is_empty());
        assert_eq!(search.score(), None);
    }

    #[test]
    fn case_folding() {
        let segmenter = segmenter(&[("Choose", 1.0), ("spain", 1.0)], &[]);
        let mut search = Search::new();
        segmenter.segment("ChooseSPAIN", &mut search).unwrap();
        assert_eq!(words(&search), vec!["choose", "spain"]);
        assert!(segmenter.probability_of("CHOOSE").is_some());
    }

    #[test]
    fn no_single_character_fallback() {
        let segmenter = segmenter(&[("ab", 1.0), ("c", 1.0)], &[]);
        let mut search = Search::new();
        assert_eq!(segmenter.segment("abd", &mut search), None);
        segmenter.segment("abc", &mut search).unwrap();
        assert_eq!(words(&search), vec!["ab", "c"]);
    }

    #[test]
    fn ties_prefer_longest_final_word() {
        // "a" + "bc" and "ab" + "c" score exactly the same
        let segmenter = segmenter(&[("a", 1.0), ("c", 1.0), ("ab", 2.0), ("bc", 2.0)], &[]);
        let mut search = Search::new();
        segmenter.segment("abc", &mut search).unwrap();
        assert_eq!(words(&search), vec!["a", "bc"]);

        // independent of the order in which words were added
        let segmenter = segmenter_rev(&[("a", 1.0), ("c", 1.0), ("ab", 2.0), ("bc", 2.0)]);
        segmenter.segment("abc", &mut search).unwrap();
        assert_eq!(words(&search), vec!["a", "bc"]);
    }

    fn segmenter_rev(unigrams: &[(&str, f64)]) -> Segmenter {
        segmenter(&unigrams.iter().rev().copied().collect::<Vec<_>>(), &[])
    }

    #[test]
    fn prefers_higher_probability() {
        let segmenter = segmenter(&[("now", 1.0), ("here", 1.0), ("nowhere", 100.0)], &[]);
        let mut search = Search::new();
        segmenter.segment("nowhere", &mut search).unwrap();
        assert_eq!(words(&search), vec!["nowhere"]);

        let segmenter = segmenter_rev(&[("now", 100.0), ("here", 100.0), ("nowhere", 1.0)]);
        segmenter.segment("nowhere", &mut search).unwrap();
        assert_eq!(words(&search), vec!["now", "here"]);
    }

    #[test]
    fn limit() {
        let mut segmenter = segmenter(&[("abc", 1.0), ("a", 1.0), ("bc", 1.0)], &[]);
        let mut search = Search::new();
        segmenter.segment("abc", &mut search).unwrap();
        assert_eq!(words(&search), vec!["abc"]);

        segmenter.set_limit(2);
        segmenter.segment("abc", &mut search).unwrap();
        assert_eq!(words(&search), vec!["a", "bc"]);
    }

    #[test]
    fn bigram_weight() {
        let mut segmenter = segmenter(
            &[("choose", 80_000.0), ("spain", 20_000.0), ("pain", 90_000.0)],
            &[("choose", "spain", 7.0)],
        );

        segmenter.set_bigram_weight(0.0);
        let adjustment = segmenter.adjustment_for("choose", "spain").unwrap();
        assert!(adjustment.abs() < 1e-9);

        segmenter.set_bigram_weight(1.0);
        // the only pair holds all bigram mass: ln(1) - ln(P(choose))
        let cond = -segmenter.probability_of("choose").unwrap();
        let uni = segmenter.probability_of("spain").unwrap();
        let adjustment = segmenter.adjustment_for("choose", "spain").unwrap();
        assert!((adjustment - (cond - uni)).abs() < 1e-9);

        segmenter.set_bigram_weight(7.0);
        assert_eq!(segmenter.bigram_weight, 1.0);
        segmenter.set_bigram_weight(f64::NAN);
        assert_eq!(segmenter.bigram_weight, DEFAULT_BIGRAM_WEIGHT);

        assert_eq!(segmenter.adjustment_for("spain", "choose"), None);
        assert_eq!(segmenter.adjustment_for("choose", "portugal"), None);
    }

    #[test]
    fn score_sentence() {
        let segmenter = segmenter(&[("a", 1.0), ("b", 3.0)], &[]);
        assert_eq!(segmenter.score_sentence(std::iter::empty()), None);

        let known = segmenter.score_sentence(["a", "b"].iter().copied()).unwrap();
        assert!((known - (0.25f64.ln() + 0.75f64.ln())).abs() < 1e-12);

        let short = segmenter.score_sentence(["x"].iter().copied()).unwrap();
        let long = segmenter.score_sentence(["xyzzy"].iter().copied()).unwrap();
        assert!(long < short);
        assert!((short - 0.25f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn search_reuse() {
        let segmenter = segmenter(
            &[("this", 4.0), ("is", 4.0), ("a", 4.0), ("test", 4.0), ("spain", 1.0)],
            &[],
        );

        let mut search = Search::new();
        segmenter.segment("thisisatest", &mut search).unwrap();
        assert_eq!(words(&search), vec!["this", "is", "a", "test"]);
        assert_eq!(search.get(3), Some("test"));
        assert_eq!(search.get(4), None);

        segmenter.segment("spain", &mut search).unwrap();
        assert_eq!(words(&search), vec!["spain"]);
        assert_eq!(search.len(), 1);
        assert_eq!((&search).into_iter().count(), 1);

        // the word sequence can be iterated more than once
        let iter = search.words();
        assert_eq!(iter.clone().count(), 1);
        assert_eq!(iter.collect::<Vec<_>>(), vec!["spain"]);
    }

    #[test]
    fn trie_matches_unigrams() {
        let segmenter = segmenter(
            &[("x", 1.0), ("xy", 0.0), ("xyz", 1.0), ("Xyz", 1.0), ("x1", 1.0)],
            &[],
        );

        assert_eq!(segmenter.num_words(), 2);
        for (id, word) in segmenter.unigrams.words() {
            assert_eq!(segmenter.trie.get(word), Some(id));
        }
        assert_eq!(segmenter.trie.get("xy"), None);
    }
}
