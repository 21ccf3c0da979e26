//! Deterministic text analysis: keyword frequency, lexicon sentiment,
//! complexity/readability heuristics, extractive summarization, and
//! rule-based categorization.
//!
//! None of this needs the embedding provider or touches storage; it
//! runs entirely over text already in memory, so callers must gather
//! content before invoking these functions rather than holding a
//! transaction open across the call.

use serde::Serialize;
use std::collections::HashMap;

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "if", "then", "else", "of", "to", "in", "on", "for",
    "with", "at", "by", "from", "up", "about", "into", "over", "after", "is", "are", "was",
    "were", "be", "been", "being", "have", "has", "had", "do", "does", "did", "will", "would",
    "could", "should", "this", "that", "these", "those", "it", "its", "as", "not", "no", "so",
    "than", "too", "very", "can", "just", "i", "you", "he", "she", "we", "they", "them", "his",
    "her", "their", "our", "my", "your",
];

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "happy", "love", "like", "best", "awesome", "wonderful",
    "fantastic", "success", "improve", "improved", "benefit", "win", "positive", "nice",
    "helpful", "pleased", "glad",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "awful", "hate", "dislike", "worst", "fail", "failed", "failure",
    "problem", "issue", "bug", "broken", "negative", "sad", "angry", "frustrated", "annoying",
    "worse", "wrong",
];

fn tokenize_words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

fn split_sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Top-N keyword frequency over `text`, excluding [`STOPWORDS`].
pub fn top_keywords(text: &str, n: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for word in tokenize_words(text) {
        if word.len() < 3 || STOPWORDS.contains(&word.as_str()) {
            continue;
        }
        *counts.entry(word).or_insert(0) += 1;
    }
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(n);
    ranked
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentResult {
    pub positive: usize,
    pub negative: usize,
    pub score: f64,
}

/// Lexicon-based sentiment: counts positive/negative hits and reduces
/// them to a single score in `[-1, 1]`.
pub fn sentiment(text: &str) -> SentimentResult {
    let words = tokenize_words(text);
    let positive = words.iter().filter(|w| POSITIVE_WORDS.contains(&w.as_str())).count();
    let negative = words.iter().filter(|w| NEGATIVE_WORDS.contains(&w.as_str())).count();
    let total = positive + negative;
    let score = if total == 0 {
        0.0
    } else {
        (positive as f64 - negative as f64) / total as f64
    };
    SentimentResult { positive, negative, score }
}

/// Average words per sentence.
pub fn complexity(text: &str) -> f64 {
    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return 0.0;
    }
    let total_words: usize = sentences.iter().map(|s| tokenize_words(s).len()).sum();
    total_words as f64 / sentences.len() as f64
}

/// Average word length, a crude readability proxy.
pub fn readability(text: &str) -> f64 {
    let words = tokenize_words(text);
    if words.is_empty() {
        return 0.0;
    }
    let total_chars: usize = words.iter().map(|w| w.chars().count()).sum();
    total_chars as f64 / words.len() as f64
}

/// Extractive summary: scores each sentence by keyword overlap with
/// the text's own top-20 keywords, then greedily takes the
/// highest-scoring sentences (in their original order) until
/// `max_chars` is exhausted.
pub fn summarize(text: &str, max_chars: usize) -> String {
    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return String::new();
    }

    let keywords: std::collections::HashSet<String> =
        top_keywords(text, 20).into_iter().map(|(w, _)| w).collect();

    let mut scored: Vec<(usize, &str, usize)> = sentences
        .iter()
        .enumerate()
        .map(|(idx, sentence)| {
            let score = tokenize_words(sentence)
                .into_iter()
                .filter(|w| keywords.contains(w))
                .count();
            (idx, *sentence, score)
        })
        .collect();

    scored.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(&b.0)));

    let mut chosen: Vec<(usize, &str)> = Vec::new();
    let mut used_chars = 0usize;
    for (idx, sentence, _) in scored {
        if used_chars + sentence.len() > max_chars && !chosen.is_empty() {
            continue;
        }
        chosen.push((idx, sentence));
        used_chars += sentence.len();
        if used_chars >= max_chars {
            break;
        }
    }

    chosen.sort_by_key(|(idx, _)| *idx);
    chosen
        .into_iter()
        .map(|(_, s)| s)
        .collect::<Vec<_>>()
        .join(". ")
}

/// The categories `categorize_memories` classifies into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryCategory {
    Technical,
    Planning,
    Ideas,
    Research,
    Other,
}

impl MemoryCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryCategory::Technical => "technical",
            MemoryCategory::Planning => "planning",
            MemoryCategory::Ideas => "ideas",
            MemoryCategory::Research => "research",
            MemoryCategory::Other => "other",
        }
    }
}

const TECHNICAL_KEYWORDS: &[&str] = &[
    "code", "bug", "function", "api", "database", "server", "deploy", "compile", "error",
    "debug", "algorithm", "library", "framework", "config", "schema", "endpoint",
];

const PLANNING_KEYWORDS: &[&str] = &[
    "plan", "roadmap", "deadline", "milestone", "schedule", "todo", "task", "sprint", "goal",
    "priority", "backlog",
];

const IDEAS_KEYWORDS: &[&str] = &[
    "idea", "brainstorm", "concept", "what if", "maybe", "imagine", "possibility", "inspiration",
];

const RESEARCH_KEYWORDS: &[&str] = &[
    "research", "study", "paper", "experiment", "hypothesis", "data", "analysis", "finding",
    "survey", "source", "citation",
];

fn contains_any(text: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|k| text.contains(*k)).count()
}

/// Rule-based classification by keyword-lexicon hit counts; ties fall
/// back to `Other`.
pub fn categorize(text: &str) -> MemoryCategory {
    let lower = text.to_lowercase();
    let scores = [
        (MemoryCategory::Technical, contains_any(&lower, TECHNICAL_KEYWORDS)),
        (MemoryCategory::Planning, contains_any(&lower, PLANNING_KEYWORDS)),
        (MemoryCategory::Ideas, contains_any(&lower, IDEAS_KEYWORDS)),
        (MemoryCategory::Research, contains_any(&lower, RESEARCH_KEYWORDS)),
    ];

    scores
        .into_iter()
        .filter(|(_, score)| *score > 0)
        .max_by_key(|(_, score)| *score)
        .map(|(category, _)| category)
        .unwrap_or(MemoryCategory::Other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_keywords_excludes_stopwords() {
        let kws = top_keywords("the rust language is great the rust community is great", 3);
        assert!(kws.iter().any(|(w, _)| w == "rust"));
        assert!(kws.iter().any(|(w, _)| w == "great"));
        assert!(!kws.iter().any(|(w, _)| w == "the"));
    }

    #[test]
    fn sentiment_scores_positive_text_above_zero() {
        let result = sentiment("this is great and wonderful, I love it");
        assert!(result.score > 0.0);
        assert_eq!(result.negative, 0);
    }

    #[test]
    fn sentiment_is_zero_with_no_lexicon_hits() {
        let result = sentiment("the cat sat on the mat");
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn complexity_counts_average_sentence_length() {
        let value = complexity("one two three. four five.");
        assert!((value - 2.5).abs() < 0.01);
    }

    #[test]
    fn readability_is_average_word_length() {
        let value = readability("cat dog");
        assert!((value - 3.0).abs() < 0.01);
    }

    #[test]
    fn summarize_respects_char_budget() {
        let text = "Rust is a systems language. It focuses on safety. \
                     The weather today is unrelated. Ownership prevents data races.";
        let summary = summarize(text, 40);
        assert!(summary.len() <= 80);
        assert!(!summary.is_empty());
    }

    #[test]
    fn summarize_preserves_original_order() {
        let text = "First sentence about rust. Second sentence about rust too. Unrelated filler.";
        let summary = summarize(text, 1000);
        let first_pos = summary.find("First").unwrap();
        let second_pos = summary.find("Second").unwrap();
        assert!(first_pos < second_pos);
    }

    #[test]
    fn categorize_picks_highest_scoring_lexicon() {
        assert_eq!(categorize("fix the bug in the api endpoint"), MemoryCategory::Technical);
        assert_eq!(categorize("plan the roadmap for next sprint"), MemoryCategory::Planning);
        assert_eq!(categorize("just a random note about lunch"), MemoryCategory::Other);
    }
}
