// src/sentiment/vader.rs
//! Rule-based polarity scorer in the VADER style: lexicon valences adjusted for
//! boosters, negation, caps emphasis, "but" contrast and punctuation, folded
//! into a compound score in [-1, 1].

use once_cell::sync::Lazy;
use std::collections::HashMap;

use super::Sentiment;

static LEXICON: Lazy<HashMap<String, f64>> = Lazy::new(|| {
    let raw = include_str!("../../assets/vader_lexicon.json");
    serde_json::from_str::<HashMap<String, f64>>(raw).expect("valid vader lexicon")
});

const B_INCR: f64 = 0.293;
const B_DECR: f64 = -0.293;
const C_INCR: f64 = 0.733;
const N_SCALAR: f64 = -0.74;
const NORM_ALPHA: f64 = 15.0;

/// Compound threshold for a non-neutral label (inclusive).
pub const POLARITY_THRESHOLD: f64 = 0.05;

fn booster(word: &str) -> Option<f64> {
    let v = match word {
        "absolutely" | "amazingly" | "completely" | "considerably" | "decidedly"
        | "deeply" | "enormously" | "entirely" | "especially" | "exceptionally"
        | "extremely" | "fully" | "greatly" | "highly" | "hugely" | "incredibly"
        | "intensely" | "majorly" | "more" | "most" | "particularly" | "purely"
        | "quite" | "really" | "remarkably" | "so" | "substantially" | "thoroughly"
        | "totally" | "tremendously" | "uber" | "unbelievably" | "utterly" | "very" => B_INCR,
        "almost" | "barely" | "hardly" | "kinda" | "less" | "little" | "marginally"
        | "occasionally" | "partly" | "scarcely" | "slightly" | "somewhat" | "sorta" => B_DECR,
        _ => return None,
    };
    Some(v)
}

fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not"
            | "no"
            | "never"
            | "none"
            | "nobody"
            | "nothing"
            | "neither"
            | "nor"
            | "nowhere"
            | "cannot"
            | "without"
            | "aint"
            | "dont"
            | "doesnt"
            | "didnt"
            | "isnt"
            | "wasnt"
            | "arent"
            | "werent"
            | "wont"
            | "cant"
            | "couldnt"
            | "shouldnt"
            | "wouldnt"
            | "hasnt"
            | "havent"
            | "hadnt"
    ) || tok.ends_with("n't")
}

/// Words with surrounding punctuation stripped; single characters dropped.
fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\''))
        .filter(|w| w.chars().count() > 1)
        .collect()
}

fn is_all_caps(w: &str) -> bool {
    w.chars().any(|c| c.is_alphabetic()) && w.chars().all(|c| !c.is_lowercase())
}

fn sign(x: f64) -> f64 {
    if x < 0.0 {
        -1.0
    } else {
        1.0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VaderScorer;

impl VaderScorer {
    pub fn new() -> Self {
        Self
    }

    /// Compound polarity in [-1, 1]; 0.0 for empty or unknown text.
    pub fn compound(&self, text: &str) -> f64 {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return 0.0;
        }
        let lower: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();

        let caps = tokens.iter().filter(|t| is_all_caps(t)).count();
        let cap_diff = caps > 0 && caps < tokens.len();

        let mut valences = Vec::with_capacity(tokens.len());
        for (i, word) in lower.iter().enumerate() {
            if booster(word).is_some() {
                valences.push(0.0);
                continue;
            }
            let Some(&base) = LEXICON.get(word.as_str()) else {
                valences.push(0.0);
                continue;
            };

            let mut v = base;
            if cap_diff && is_all_caps(tokens[i]) {
                v += sign(v) * C_INCR;
            }

            // Look back up to three tokens for boosters and negators.
            for k in 1..=3usize {
                if i < k {
                    break;
                }
                let prev = lower[i - k].as_str();
                if LEXICON.contains_key(prev) && !is_negator(prev) {
                    continue;
                }
                if let Some(mut scalar) = booster(prev) {
                    if v < 0.0 {
                        scalar = -scalar;
                    }
                    if cap_diff && is_all_caps(tokens[i - k]) {
                        scalar += sign(v) * C_INCR;
                    }
                    scalar *= match k {
                        2 => 0.95,
                        3 => 0.9,
                        _ => 1.0,
                    };
                    v += scalar;
                }
                if is_negator(prev) {
                    v *= N_SCALAR;
                }
            }
            valences.push(v);
        }

        // "but" shifts weight to the second clause.
        if let Some(bi) = lower.iter().position(|w| w == "but") {
            for (i, v) in valences.iter_mut().enumerate() {
                if i < bi {
                    *v *= 0.5;
                } else if i > bi {
                    *v *= 1.5;
                }
            }
        }

        let mut sum: f64 = valences.iter().sum();
        if sum != 0.0 {
            sum += sign(sum) * punctuation_emphasis(text);
        }
        normalize(sum)
    }

    /// `(label, compound)` with the ±0.05 cut-offs inclusive on the labeled side.
    pub fn label(&self, text: &str) -> (Sentiment, f64) {
        let c = self.compound(text);
        (Sentiment::from_compound(c), c)
    }
}

fn punctuation_emphasis(text: &str) -> f64 {
    let ep = text.matches('!').count().min(4) as f64 * 0.292;
    let qm = text.matches('?').count();
    let qm_amp = match qm {
        0 | 1 => 0.0,
        2 | 3 => qm as f64 * 0.18,
        _ => 0.96,
    };
    ep + qm_amp
}

fn normalize(score: f64) -> f64 {
    (score / (score * score + NORM_ALPHA).sqrt()).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_unknown_are_zero() {
        let v = VaderScorer::new();
        assert_eq!(v.compound(""), 0.0);
        assert_eq!(v.compound("   "), 0.0);
        assert_eq!(v.compound("WWDC keynote recap"), 0.0);
    }

    #[test]
    fn single_word_matches_reference_normalization() {
        // good = 1.9 -> 1.9 / sqrt(1.9^2 + 15)
        let expected = 1.9 / (1.9f64 * 1.9 + 15.0).sqrt();
        let got = VaderScorer::new().compound("good");
        assert!((got - expected).abs() < 1e-9, "{got} vs {expected}");
    }

    #[test]
    fn negation_flips_polarity() {
        let v = VaderScorer::new();
        assert!(v.compound("the update is good") > 0.0);
        assert!(v.compound("the update is not good") < 0.0);
        assert!(v.compound("the update isn't good") < 0.0);
    }

    #[test]
    fn booster_increases_magnitude() {
        let v = VaderScorer::new();
        assert!(v.compound("very good") > v.compound("good"));
        assert!(v.compound("slightly good") < v.compound("good"));
    }

    #[test]
    fn caps_and_exclamation_add_emphasis() {
        let v = VaderScorer::new();
        assert!(v.compound("the demo was GREAT") > v.compound("the demo was great"));
        assert!(v.compound("great!!") > v.compound("great"));
    }

    #[test]
    fn but_weights_second_clause() {
        let v = VaderScorer::new();
        assert!(v.compound("the design is great but the price is terrible") < 0.0);
    }

    #[test]
    fn disappointing_headline_is_negative() {
        let (label, c) = VaderScorer::new().label("Apple WWDC disappoints investors");
        assert!(c <= -POLARITY_THRESHOLD, "{c}");
        assert_eq!(label, Sentiment::Negative);
    }

    #[test]
    fn compound_stays_in_range() {
        let v = VaderScorer::new();
        let c = v.compound("best best best amazing incredible outstanding!!!!");
        assert!(c > 0.9 && c <= 1.0);
        let c = v.compound("worst disaster crisis fraud scam killed!!!!");
        assert!((-1.0..-0.9).contains(&c));
    }
}
