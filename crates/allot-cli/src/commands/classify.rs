//! Classify command implementation

use allot_core::{Intents, IntentClassifier, KeywordClassifier};
use anyhow::Result;

/// Extract intents with the bundled keyword classifier
pub fn classify_feedback(text: &str) -> Result<Intents> {
    let classifier = KeywordClassifier::new()?;
    Ok(classifier.classify(text))
}

pub fn cmd_classify(text: &str) -> Result<()> {
    let intents = classify_feedback(text)?;

    if intents.is_empty() {
        println!("No category changes recognized.");
        println!();
        println!("Tip: name a category and a direction, e.g. \"more food, less entertainment\"");
        return Ok(());
    }

    println!("Recognized {} intent(s):", intents.len());
    for (category, direction) in &intents {
        println!("  {:<15} {}", category.label(), direction);
    }
    Ok(())
}
