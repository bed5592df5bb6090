//! Intent classification for free-text feedback
//!
//! The refiner only consumes [`Intents`]; how they are extracted is behind the
//! [`IntentClassifier`] trait. [`KeywordClassifier`] is the bundled
//! implementation: whole-word keyword matching, one direction per clause.

use regex::Regex;

use crate::error::Result;
use crate::models::Category;
use crate::refine::{Direction, Intents};

/// Maps feedback text to per-category directions
pub trait IntentClassifier {
    fn classify(&self, text: &str) -> Intents;
}

const INCREASE_WORDS: &[&str] = &["more", "increase", "higher", "raise", "boost"];
const DECREASE_WORDS: &[&str] = &["less", "reduce", "decrease", "lower", "cut"];

/// Keyword-based classifier
///
/// Feedback is split into clauses on punctuation and on "and"/"but", so
/// "more food but less entertainment" yields two opposite intents. A clause
/// mentioning categories without any direction word contributes nothing.
/// When a category appears in several clauses, the last one wins.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    clause_split: Regex,
    increase: Regex,
    decrease: Regex,
    categories: Vec<(Category, Regex)>,
}

impl KeywordClassifier {
    pub fn new() -> Result<Self> {
        let categories = Category::ALL
            .into_iter()
            .map(|c| word_pattern(c.aliases()).map(|re| (c, re)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            clause_split: Regex::new(r"(?i)[,;.!?]|\band\b|\bbut\b")?,
            increase: word_pattern(INCREASE_WORDS)?,
            decrease: word_pattern(DECREASE_WORDS)?,
            categories,
        })
    }

    fn clause_direction(&self, clause: &str) -> Option<Direction> {
        // Pick whichever direction word appears first in the clause
        let up = self.increase.find(clause).map(|m| m.start());
        let down = self.decrease.find(clause).map(|m| m.start());
        match (up, down) {
            (Some(u), Some(d)) if d < u => Some(Direction::Decrease),
            (Some(_), _) => Some(Direction::Increase),
            (None, Some(_)) => Some(Direction::Decrease),
            (None, None) => None,
        }
    }
}

impl IntentClassifier for KeywordClassifier {
    fn classify(&self, text: &str) -> Intents {
        let mut intents = Intents::new();
        for clause in self.clause_split.split(text) {
            let Some(direction) = self.clause_direction(clause) else {
                continue;
            };
            for (category, pattern) in &self.categories {
                if pattern.is_match(clause) {
                    intents.insert(*category, direction);
                }
            }
        }
        intents
    }
}

/// Case-insensitive whole-word alternation of `words`
fn word_pattern(words: &[&str]) -> Result<Regex> {
    let alternatives: Vec<String> = words.iter().map(|w| regex::escape(w)).collect();
    Ok(Regex::new(&format!(
        r"(?i)\b(?:{})\b",
        alternatives.join("|")
    ))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> Intents {
        KeywordClassifier::new().unwrap().classify(text)
    }

    #[test]
    fn test_single_intent() {
        let intents = classify("I want more money for food");
        assert_eq!(intents.len(), 1);
        assert_eq!(intents[&Category::Food], Direction::Increase);
    }

    #[test]
    fn test_opposite_intents_in_separate_clauses() {
        let intents = classify("Increase groceries but cut entertainment");
        assert_eq!(intents[&Category::Food], Direction::Increase);
        assert_eq!(intents[&Category::Entertainment], Direction::Decrease);
    }

    #[test]
    fn test_case_insensitive_aliases() {
        let intents = classify("LESS RENT, more Medical.");
        assert_eq!(intents[&Category::Housing], Direction::Decrease);
        assert_eq!(intents[&Category::Healthcare], Direction::Increase);
    }

    #[test]
    fn test_whole_words_only() {
        // "carpet" must not match "car"; "lowered" is not "lower"
        let intents = classify("more carpet cleaning");
        assert!(intents.is_empty());
        assert!(classify("I lowered the food bill").is_empty());
    }

    #[test]
    fn test_clause_without_direction_is_ignored() {
        let intents = classify("food is fine, but reduce transport");
        assert_eq!(intents.len(), 1);
        assert_eq!(intents[&Category::Transportation], Direction::Decrease);
    }

    #[test]
    fn test_multi_word_alias() {
        let intents = classify("less going out");
        assert_eq!(intents[&Category::Entertainment], Direction::Decrease);
    }

    #[test]
    fn test_deterministic() {
        let classifier = KeywordClassifier::new().unwrap();
        let text = "raise health, lower fun; boost misc";
        assert_eq!(classifier.classify(text), classifier.classify(text));
        assert_eq!(classifier.classify(text).len(), 3);
    }
}
