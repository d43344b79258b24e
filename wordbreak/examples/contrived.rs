use std::collections::HashMap;

use wordbreak::{Search, Segmenter};

fn main() {
    let mut unigrams = HashMap::new();

    unigrams.insert("choose".into(), 80_000.0);
    unigrams.insert("chooses".into(), 7_000.0);

    unigrams.insert("spain".into(), 20_000.0);
    unigrams.insert("pain".into(), 90_000.0);

    let mut bigrams = HashMap::new();

    bigrams.insert(("choose".into(), "spain".into()), 7.0);
    bigrams.insert(("chooses".into(), "pain".into()), 0.0);

    let segmenter = Segmenter::new(unigrams, bigrams);
    let mut search = Search::default();

    match segmenter.segment("choosespain", &mut search) {
        Some(score) => {
            let words = search.words().collect::<Vec<_>>();
            println!("{:?} (score {:.3})", words, score);
        }
        None => println!("no segmentation found"),
    }
}
