#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smartstring::alias::String;

use crate::unigrams::{Unigrams, WordId};
use crate::{normalize, HashMap};

/// Conditional log probabilities of word pairs
///
/// For a pair `(first, second)` this stores `ln(P(second | first))`, estimated as the pair's
/// share of all bigram counts divided by the unigram probability of `first`. Both
/// distributions are normalized by their own totals, so the two corpora need not come from
/// the same number of tokens.
#[cfg_attr(feature = "with-serde", derive(Deserialize, Serialize))]
pub(crate) struct Bigrams {
    conditional: HashMap<(WordId, WordId), f64>,
}

impl Bigrams {
    /// Consume `iter` once, summing duplicate pairs
    ///
    /// Pairs referencing a word that is not in `unigrams` are skipped, as are pairs with a
    /// frequency that is not strictly positive. The first `Err` item aborts the build.
    pub(crate) fn build<I, E>(iter: I, unigrams: &Unigrams) -> Result<Self, E>
    where
        I: IntoIterator<Item = Result<((String, String), f64), E>>,
    {
        let mut counts = HashMap::<(WordId, WordId), f64>::default();
        let mut skipped = 0;

        for item in iter {
            let ((first, second), freq) = item?;
            if !(freq.is_finite() && freq > 0.0) {
                log::trace!("skipping bigram ({:?}, {:?}): frequency {}", first, second, freq);
                skipped += 1;
                continue;
            }

            let ids = normalize(&first)
                .and_then(|first| unigrams.id(&first))
                .zip(normalize(&second).and_then(|second| unigrams.id(&second)));

            match ids {
                Some(key) => *counts.entry(key).or_default() += freq,
                None => {
                    log::trace!("skipping bigram ({:?}, {:?}): unknown word", first, second);
                    skipped += 1;
                }
            }
        }

        let total = counts.values().sum::<f64>().ln();
        let conditional = counts
            .into_iter()
            .map(|((first, second), freq)| {
                // ln(freq / total) - ln(P(first))
                ((first, second), freq.ln() - total - unigrams.score(first))
            })
            .collect::<HashMap<_, _>>();

        log::debug!("built {} bigrams ({} entries skipped)", conditional.len(), skipped);
        Ok(Self { conditional })
    }

    pub(crate) fn get(&self, first: WordId, second: WordId) -> Option<f64> {
        self.conditional.get(&(first, second)).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.conditional.len()
    }
}
