#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smartstring::alias::String;

use crate::{normalize, HashMap};

/// Identifier of a word in the `Unigrams` table
pub(crate) type WordId = u32;

/// Log probabilities of single words
///
/// Words are assigned dense ids in order of first appearance, so that the prefix index and the
/// bigram table can refer to them without hashing strings in the search loop.
#[cfg_attr(feature = "with-serde", derive(Deserialize, Serialize))]
pub(crate) struct Unigrams {
    ids: HashMap<String, WordId>,
    words: Vec<String>,
    /// `ln(count / total)` per word
    scores: Vec<f64>,
    total: f64,
}

impl Unigrams {
    /// Consume `iter` once, summing duplicate words
    ///
    /// Entries with a frequency that is not strictly positive, or with a word that does not
    /// normalize, are skipped. The first `Err` item aborts the build.
    pub(crate) fn build<I, E>(iter: I) -> Result<Self, E>
    where
        I: IntoIterator<Item = Result<(String, f64), E>>,
    {
        let mut ids = HashMap::default();
        let mut words = Vec::new();
        let mut counts = Vec::new();
        let mut skipped = 0;

        for item in iter {
            let (word, freq) = item?;
            if !(freq.is_finite() && freq > 0.0) {
                log::trace!("skipping unigram {:?} with frequency {}", word, freq);
                skipped += 1;
                continue;
            }

            let word = match normalize(&word) {
                Some(word) => word,
                None => {
                    log::trace!("skipping unigram {:?}: unsupported characters", word);
                    skipped += 1;
                    continue;
                }
            };

            match ids.get(&word) {
                Some(&id) => counts[id as usize] += freq,
                None => {
                    ids.insert(word.clone(), words.len() as WordId);
                    words.push(word);
                    counts.push(freq);
                }
            }
        }

        let total = counts.iter().sum::<f64>();
        let scores = counts.iter().map(|count| (count / total).ln()).collect();
        log::debug!("built {} unigrams ({} entries skipped)", words.len(), skipped);

        Ok(Self {
            ids,
            words,
            scores,
            total,
        })
    }

    /// Look up the id of an already normalized word
    pub(crate) fn id(&self, word: &str) -> Option<WordId> {
        self.ids.get(word).copied()
    }

    pub(crate) fn score(&self, id: WordId) -> f64 {
        self.scores[id as usize]
    }

    /// Score for a word that is not in the table
    ///
    /// Penalize words not found in the unigrams according to their length, a crucial
    /// heuristic: `10 / (total * 10^len)` in log space. Without any counted words nothing is
    /// reachable, unknown words included.
    pub(crate) fn unknown(&self, len: usize) -> f64 {
        if !(self.total > 0.0) {
            return f64::NEG_INFINITY;
        }
        std::f64::consts::LN_10 * (1.0 - len as f64) - self.total.ln()
    }

    pub(crate) fn words(&self) -> impl Iterator<Item = (WordId, &str)> + '_ {
        self.words
            .iter()
            .enumerate()
            .map(|(id, word)| (id as WordId, word.as_str()))
    }

    pub(crate) fn len(&self) -> usize {
        self.words.len()
    }
}
