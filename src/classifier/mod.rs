//! Visual-necessity classifier.
//!
//! Decides, from a transcribed question alone, whether the student is
//! pointing at something on paper or on screen that we need to see before
//! answering. Rule based and deterministic: a fixed list of cue categories is
//! matched against the lower-cased utterance and every match adds a weight.
//!
//! Weights are kept in integer points (100 points = confidence 1.0); the
//! confidence is compared against the configured threshold as given.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Points added for every match of a cue pattern.
const MATCH_POINTS: u32 = 15;
/// Flat bonus when the utterance names an exercise or question.
const TASK_WORD_POINTS: u32 = 30;
/// Flat bonus for "this one here" style idioms.
const NEAR_DEICTIC_POINTS: u32 = 40;
const FULL_CONFIDENCE: u32 = 100;

const TASK_WORDS: &[&str] = &["exercício", "questão", "exercise", "question"];

const NEAR_DEICTIC_IDIOMS: &[&str] = &[
    "esse aqui",
    "esta aqui",
    "isso aqui",
    "essa figura aqui",
    "this one here",
    "this here",
    "that here",
];

/// Kinds of cue the classifier looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CueCategory {
    /// "this", "that", "here".
    Deictic,
    /// "show", "see", "look".
    AttentionVerb,
    /// "figure", "diagram", "exercise".
    VisualObject,
    /// "is written", "is showing".
    OnScreenReferent,
    /// "what does this mean".
    ComprehensionFailure,
    /// "help me with this".
    HelpRequest,
}

impl CueCategory {
    pub const ALL: [CueCategory; 6] = [
        CueCategory::Deictic,
        CueCategory::AttentionVerb,
        CueCategory::VisualObject,
        CueCategory::OnScreenReferent,
        CueCategory::ComprehensionFailure,
        CueCategory::HelpRequest,
    ];

    /// Pattern for this category. Single words are anchored on word
    /// boundaries; multi-word phrases match as substrings.
    fn pattern(&self) -> &'static str {
        match self {
            CueCategory::Deictic => {
                r"\b(?:esse|essa|este|esta|esses|essas|estes|estas|aqui|aí|isso|isto|this|that|these|those|here)\b"
            }
            CueCategory::AttentionVerb => {
                r"\b(?:mostr\w+|ver|veja|vejo|olh\w+|observ\w*|show\w*|see|look\w*)\b"
            }
            CueCategory::VisualObject => {
                r"\b(?:figura|imagem|foto|desenho|gráfico|diagrama|exercício|questão|problema|figure|image|photo|picture|drawing|chart|graph|diagram|exercise|question|problem)\b"
            }
            CueCategory::OnScreenReferent => {
                r"\b(?:(?:tá|está)\s+(?:escrito|mostrando|aparecendo)|is\s+(?:written|showing|appearing))"
            }
            CueCategory::ComprehensionFailure => {
                r"o que (?:é|significa|quer dizer) (?:isso|isto)|não (?:entendi|compreendi) (?:esse|este|essa|esta)|what does (?:this|that) mean|i don'?t understand (?:this|that)"
            }
            CueCategory::HelpRequest => {
                r"(?:ajuda|me ajude|help) com (?:isso|este|esse)|help me with (?:this|that)"
            }
        }
    }
}

/// Outcome of classifying one utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub needs_image: bool,
    /// Clamped to [0, 1].
    pub confidence: f64,
    pub matched_phrases: BTreeSet<String>,
    pub rationale: String,
}

struct CompiledCue {
    category: CueCategory,
    regex: Regex,
}

/// Rule-based scorer for "does this question need a picture?".
pub struct VisualNeedClassifier {
    cues: Vec<CompiledCue>,
    threshold: f64,
}

impl VisualNeedClassifier {
    /// Classifier with the default 0.5 threshold.
    pub fn new() -> Self {
        Self::with_threshold(0.5)
    }

    /// Classifier with a custom inclusive confidence threshold.
    pub fn with_threshold(threshold: f64) -> Self {
        let cues = CueCategory::ALL
            .iter()
            .map(|category| CompiledCue {
                category: *category,
                regex: Regex::new(category.pattern()).expect("Invalid cue pattern"),
            })
            .collect();

        Self {
            cues,
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    /// Classify an utterance. Never fails; empty input scores zero.
    pub fn classify(&self, utterance: &str) -> ClassificationResult {
        let text = utterance.to_lowercase();
        let mut points = 0u32;
        let mut matched_phrases = BTreeSet::new();

        for cue in &self.cues {
            let mut hits = 0u32;
            for m in cue.regex.find_iter(&text) {
                hits += 1;
                matched_phrases.insert(m.as_str().to_string());
            }
            if hits > 0 {
                tracing::trace!(category = ?cue.category, hits, "visual cue matched");
            }
            points += hits * MATCH_POINTS;
        }

        if TASK_WORDS.iter().any(|word| text.contains(word)) {
            points += TASK_WORD_POINTS;
        }

        if NEAR_DEICTIC_IDIOMS.iter().any(|idiom| text.contains(idiom)) {
            points += NEAR_DEICTIC_POINTS;
        }

        let points = points.min(FULL_CONFIDENCE);
        let confidence = points as f64 / FULL_CONFIDENCE as f64;
        let rationale = format!("Detected {} visual references", matched_phrases.len());

        ClassificationResult {
            needs_image: confidence >= self.threshold,
            confidence,
            matched_phrases,
            rationale,
        }
    }
}

impl Default for VisualNeedClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify with the default threshold.
pub fn classify(utterance: &str) -> ClassificationResult {
    VisualNeedClassifier::new().classify(utterance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_utterance_scores_zero() {
        let result = classify("");
        assert!(!result.needs_image);
        assert_eq!(result.confidence, 0.0);
        assert!(result.matched_phrases.is_empty());
        assert_eq!(result.rationale, "Detected 0 visual references");

        let blank = classify("   \t\n");
        assert_eq!(blank.confidence, 0.0);
        assert!(!blank.needs_image);
    }

    #[test]
    fn test_no_cues_means_no_image() {
        let result = classify("Bom dia professor, quanto é dois mais dois?");
        assert_eq!(result.confidence, 0.0);
        assert!(!result.needs_image);

        let english = classify("Why is the sky blue during the day?");
        assert_eq!(english.confidence, 0.0);
    }

    #[test]
    fn test_pointing_at_a_figure_needs_image() {
        let result = classify("Olhe essa figura aqui");
        assert!(result.needs_image);
        assert!(result.confidence >= 0.5);
        assert!(result.matched_phrases.contains("olhe"));
        assert!(result.matched_phrases.contains("figura"));
        assert!(result.matched_phrases.contains("aqui"));
    }

    #[test]
    fn test_english_cues() {
        let result = classify("Can you look at this one here? I don't understand this diagram");
        assert!(result.needs_image);
        assert!(result.matched_phrases.contains("look"));
        assert!(result.matched_phrases.contains("diagram"));
        assert!(result.matched_phrases.contains("i don't understand this"));
    }

    #[test]
    fn test_task_word_bonus() {
        // "questão" matches the visual-object cue (15) plus the flat bonus (30).
        let result = classify("questão");
        assert_eq!(result.confidence, 0.45);
        assert!(!result.needs_image);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        // "exercício" (15 + 30) plus "aqui" (15) = 60 points.
        let at = VisualNeedClassifier::with_threshold(0.6).classify("exercício aqui");
        assert_eq!(at.confidence, 0.6);
        assert!(at.needs_image);

        let above = VisualNeedClassifier::with_threshold(0.61).classify("exercício aqui");
        assert!(!above.needs_image);
    }

    #[test]
    fn test_threshold_between_point_steps_is_not_rounded() {
        let result = VisualNeedClassifier::with_threshold(0.604).classify("exercício aqui");
        assert_eq!(result.confidence, 0.6);
        assert!(!result.needs_image);

        let below = VisualNeedClassifier::with_threshold(0.596).classify("exercício aqui");
        assert!(below.needs_image);
    }

    #[test]
    fn test_repeated_matches_count_but_phrases_dedupe() {
        let result = classify("aqui aqui aqui");
        assert_eq!(result.confidence, 0.45);
        assert_eq!(result.matched_phrases.len(), 1);
        assert_eq!(result.rationale, "Detected 1 visual references");
    }

    #[test]
    fn test_overlapping_categories_each_score() {
        // "isso" is both a deictic cue and part of the help-request phrase.
        let result = classify("me ajude com isso");
        assert_eq!(result.confidence, 0.3);
        assert!(result.matched_phrases.contains("isso"));
        assert!(result.matched_phrases.contains("me ajude com isso"));
    }

    #[test]
    fn test_word_boundaries_for_single_tokens() {
        // "thistle" and "nowhere" must not match "this" / "here".
        let result = classify("thistle grows nowhere");
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_confidence_is_monotonic_and_clamped() {
        let steps = [
            "o que",
            "o que é isso",
            "o que é isso aqui",
            "o que é isso aqui na figura",
            "olha, o que é isso aqui na figura do exercício",
            "olha, o que é isso aqui na figura do exercício? não entendi esse problema, me ajude com isso",
        ];

        let mut previous = 0.0;
        for step in steps {
            let confidence = classify(step).confidence;
            assert!(confidence >= previous, "{step:?} dropped to {confidence}");
            assert!(confidence <= 1.0);
            previous = confidence;
        }
        assert_eq!(previous, 1.0);
    }

    #[test]
    fn test_original_casing_does_not_matter() {
        assert_eq!(classify("OLHE ESSA FIGURA AQUI"), classify("olhe essa figura aqui"));
    }
}
