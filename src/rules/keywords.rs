use std::collections::{HashMap, HashSet};

use super::text::strip_trailing_punctuation;

/// Russian and English function words ignored by keyword extraction.
const DEFAULT_STOP_WORDS: &[&str] = &[
    // ru
    "и", "в", "во", "не", "что", "он", "на", "я", "с", "со", "как", "а", "то", "все", "она",
    "так", "его", "но", "да", "ты", "к", "у", "же", "вы", "за", "бы", "по", "только", "ее",
    "мне", "было", "вот", "от", "меня", "еще", "нет", "о", "из", "ему", "теперь", "когда",
    "даже", "ну", "ли", "если", "уже", "или", "ни", "быть", "был", "него", "до", "вас",
    "нибудь", "опять", "уж", "вам", "ведь", "там", "потом", "себя", "ничего", "ей", "может",
    "они", "тут", "где", "есть", "надо", "ней", "для", "мы", "тебя", "их", "чем", "была",
    "сам", "чтоб", "без", "будто", "чего", "раз", "тоже", "себе", "под", "будет", "ж", "тогда",
    "кто", "этот", "того", "потому", "этого", "какой", "совсем", "ним", "здесь", "этом",
    "один", "почти", "мой", "тем", "чтобы", "нее", "сейчас", "были", "куда", "зачем", "всех",
    "никогда", "можно", "при", "наконец", "два", "об", "другой", "хоть", "после", "над",
    "больше", "тот", "через", "эти", "нас", "про", "всего", "них", "какая", "много", "разве",
    "три", "эту", "моя", "впрочем", "хорошо", "свою", "этой", "перед", "иногда", "лучше",
    "чуть", "том", "нельзя", "такой", "им", "более", "всегда", "конечно", "всю", "между",
    "меняю", "обмен", "обменяю", "ищу", "нужен", "нужна", "нужно", "хочу",
    // en
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is",
    "it", "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there",
    "these", "they", "this", "to", "was", "will", "with",
];

/// Stop-word-filtered keyword weighting.
#[derive(Debug, Clone)]
pub struct ContextualKeywords {
    stop_words: HashSet<String>,
}

impl Default for ContextualKeywords {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextualKeywords {
    pub fn new() -> Self {
        Self {
            stop_words: DEFAULT_STOP_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }

    pub fn with_stop_words<I, S>(stop_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            stop_words: stop_words
                .into_iter()
                .map(|w| w.into().to_lowercase())
                .collect(),
        }
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    /// Lowercased keywords in text order (duplicates kept).
    pub fn extract(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split_whitespace()
            .map(strip_trailing_punctuation)
            .filter(|token| !token.is_empty() && !self.stop_words.contains(*token))
            .map(str::to_string)
            .collect()
    }

    /// Term frequency normalized by the most frequent keyword, in `(0, 1]`.
    pub fn weights(&self, text: &str) -> HashMap<String, f64> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for keyword in self.extract(text) {
            *counts.entry(keyword).or_default() += 1;
        }

        let Some(max) = counts.values().copied().max() else {
            return HashMap::new();
        };

        counts
            .into_iter()
            .map(|(keyword, count)| (keyword, count as f64 / max as f64))
            .collect()
    }

    /// Sum of weight products over shared keywords divided by the size of the
    /// keyword union, capped at 1.0.
    pub fn similarity(&self, text1: &str, text2: &str) -> f64 {
        let weights1 = self.weights(text1);
        let weights2 = self.weights(text2);

        if weights1.is_empty() || weights2.is_empty() {
            return 0.0;
        }

        let shared: f64 = weights1
            .iter()
            .filter_map(|(keyword, w1)| weights2.get(keyword).map(|w2| w1 * w2))
            .sum();

        let union = weights1
            .keys()
            .chain(weights2.keys())
            .collect::<HashSet<_>>()
            .len();

        (shared / union as f64).min(1.0)
    }
}
