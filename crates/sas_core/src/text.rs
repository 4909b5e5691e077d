//! Text utilities shared by the extractor, the backends and the pipeline.

use std::fmt;

/// Number of whitespace-delimited words in `text`.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Indents every line of `text` by two spaces.
pub fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("  {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Maximum number of words a backend accepts in one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WordBudget {
    /// No limit: paragraphs are passed through unmerged.
    #[default]
    Unlimited,
    Max(usize),
}

impl WordBudget {
    /// Negative values disable merging.
    pub fn from_signed(max_words: i64) -> Self {
        usize::try_from(max_words)
            .map(WordBudget::Max)
            .unwrap_or(WordBudget::Unlimited)
    }
}

impl fmt::Display for WordBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WordBudget::Unlimited => f.write_str("unlimited"),
            WordBudget::Max(n) => write!(f, "{} words", n),
        }
    }
}

/// Merges adjacent paragraphs into chunks that stay under `budget`.
///
/// A paragraph is appended to the running chunk only while the merged
/// chunk would stay strictly below the budget; otherwise the running chunk
/// is emitted and a new one starts with the paragraph. Paragraphs are never
/// split, so a single paragraph longer than the budget becomes its own
/// chunk. With [`WordBudget::Unlimited`] every paragraph is its own chunk.
pub fn compress(paragraphs: &[String], budget: WordBudget) -> Vec<String> {
    let max_words = match budget {
        WordBudget::Unlimited => return paragraphs.to_vec(),
        WordBudget::Max(n) => n,
    };

    let mut chunks = Vec::new();
    let mut buffer = String::new();
    let mut buffer_words = 0;

    for paragraph in paragraphs {
        let words = word_count(paragraph);
        if buffer.is_empty() {
            buffer.push_str(paragraph);
            buffer_words = words;
        } else if buffer_words + words < max_words {
            buffer.push(' ');
            buffer.push_str(paragraph);
            buffer_words += words;
        } else {
            chunks.push(std::mem::take(&mut buffer));
            buffer.push_str(paragraph);
            buffer_words = words;
        }
    }

    if !buffer.is_empty() {
        chunks.push(buffer);
    }
    chunks
}
