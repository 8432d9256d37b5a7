//! Headline polarity scoring

use std::collections::HashSet;

use super::source::Headline;

/// Maps a piece of text to a polarity in [-1, 1]
pub trait PolarityAnalyzer: Send + Sync {
    fn polarity(&self, text: &str) -> f64;
}

const POSITIVE_WORDS: &[&str] = &[
    "adoption", "approval", "approved", "bull", "bullish", "breakout", "boost", "gain", "gains",
    "good", "great", "growth", "high", "inflow", "inflows", "integrate", "launch", "optimistic",
    "partnership", "positive", "profit", "rally", "rallies", "rebound", "record", "recover",
    "recovery", "rise", "rises", "soar", "soars", "strong", "support", "surge", "surges", "upgrade",
    "win", "wins",
];

const NEGATIVE_WORDS: &[&str] = &[
    "ban", "banned", "bear", "bearish", "collapse", "crash", "crashes", "decline", "drop", "drops",
    "dump", "exploit", "fail", "fails", "fall", "falls", "fear", "fraud", "hack", "hacked", "lawsuit",
    "liquidation", "liquidations", "loss", "losses", "low", "negative", "outflow", "outflows",
    "plunge", "plunges", "reject", "rejected", "risk", "scam", "selloff", "sell-off", "slump",
    "weak",
];

const NEGATIONS: &[&str] = &["not", "no", "never", "without", "isn't", "won't", "don't"];

/// Word-list analyzer tuned for crypto headlines.
///
/// Each token found in the positive or negative list counts +1 or -1; a
/// negation flips the next scored token. The result is the mean over scored
/// tokens, or 0 when nothing matched.
#[derive(Debug, Clone)]
pub struct LexiconAnalyzer {
    positive: HashSet<String>,
    negative: HashSet<String>,
}

impl Default for LexiconAnalyzer {
    fn default() -> Self {
        Self::new(POSITIVE_WORDS.iter().copied(), NEGATIVE_WORDS.iter().copied())
    }
}

impl LexiconAnalyzer {
    pub fn new<'a>(
        positive: impl IntoIterator<Item = &'a str>,
        negative: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self {
            positive: positive.into_iter().map(str::to_lowercase).collect(),
            negative: negative.into_iter().map(str::to_lowercase).collect(),
        }
    }
}

impl PolarityAnalyzer for LexiconAnalyzer {
    fn polarity(&self, text: &str) -> f64 {
        let mut total = 0.0;
        let mut scored = 0u32;
        let mut negate = false;

        let tokens = text
            .split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '\''))
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);

        for token in tokens {
            if NEGATIONS.contains(&token.as_str()) {
                negate = true;
                continue;
            }
            let weight = if self.positive.contains(&token) {
                1.0
            } else if self.negative.contains(&token) {
                -1.0
            } else {
                continue;
            };
            total += if negate { -weight } else { weight };
            scored += 1;
            negate = false;
        }

        if scored == 0 {
            0.0
        } else {
            (total / f64::from(scored)).clamp(-1.0, 1.0)
        }
    }
}

/// Mean polarity over a set of headlines, `None` when there are none
pub fn mean_polarity(analyzer: &dyn PolarityAnalyzer, headlines: &[Headline]) -> Option<f64> {
    if headlines.is_empty() {
        return None;
    }
    let sum: f64 = headlines.iter().map(|h| analyzer.polarity(&h.title)).sum();
    Some((sum / headlines.len() as f64).clamp(-1.0, 1.0))
}
