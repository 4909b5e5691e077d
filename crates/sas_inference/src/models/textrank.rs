//! Extractive summarization with TextRank.
//!
//! Sentences are nodes of an undirected graph weighted by word overlap
//! (normalized by sentence length), ranked with PageRank, and the top
//! share of sentences is returned in document order.

use std::collections::HashSet;
use std::fmt;

use sas_core::{ConfigSchema, ParamKind, ResolvedParams, Result, SummarizationMethod};
use stop_words::{get, LANGUAGE};

use super::SummarizationBackend;

#[derive(Debug, Clone)]
pub struct PageRank {
    /// Damping factor (typically 0.85)
    pub damping: f64,
    pub max_iterations: usize,
    /// L1 convergence threshold
    pub threshold: f64,
}

impl Default for PageRank {
    fn default() -> Self {
        Self {
            damping: 0.85,
            max_iterations: 100,
            threshold: 1e-6,
        }
    }
}

impl PageRank {
    /// Scores the nodes of a symmetric weighted adjacency matrix. Nodes
    /// without edges spread their mass uniformly.
    pub fn run(&self, weights: &[Vec<f64>]) -> Vec<f64> {
        let n = weights.len();
        if n == 0 {
            return Vec::new();
        }

        let totals: Vec<f64> = weights.iter().map(|row| row.iter().sum()).collect();
        let teleport = (1.0 - self.damping) / n as f64;
        let mut scores = vec![1.0 / n as f64; n];
        let mut next = vec![0.0; n];

        for _ in 0..self.max_iterations {
            let dangling: f64 = (0..n).filter(|&i| totals[i] <= 0.0).map(|i| scores[i]).sum();
            next.fill(teleport + self.damping * dangling / n as f64);

            for (i, row) in weights.iter().enumerate() {
                if totals[i] <= 0.0 {
                    continue;
                }
                for (j, &w) in row.iter().enumerate() {
                    if w > 0.0 {
                        next[j] += self.damping * scores[i] * w / totals[i];
                    }
                }
            }

            let delta: f64 = scores.iter().zip(&next).map(|(a, b)| (a - b).abs()).sum();
            std::mem::swap(&mut scores, &mut next);
            if delta <= self.threshold {
                break;
            }
        }
        scores
    }
}

/// Splits text after `.`, `!` or `?` followed by whitespace.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            let at_boundary = chars.peek().map_or(true, |(_, next)| next.is_whitespace());
            if at_boundary {
                let end = i + c.len_utf8();
                let sentence = text[start..end].trim();
                if !sentence.is_empty() {
                    sentences.push(sentence);
                }
                start = end;
            }
        }
    }
    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}

pub struct TextRankModel {
    schema: ConfigSchema,
    stopwords: HashSet<String>,
    pagerank: PageRank,
}

impl fmt::Debug for TextRankModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextRankModel")
            .field("stopwords", &self.stopwords.len())
            .field("pagerank", &self.pagerank)
            .finish()
    }
}

impl Default for TextRankModel {
    fn default() -> Self {
        Self::new()
    }
}

impl TextRankModel {
    pub fn new() -> Self {
        Self {
            schema: ConfigSchema::new(SummarizationMethod::Textrank).param("ratio", ParamKind::Ratio, 0.2),
            stopwords: get(LANGUAGE::English).iter().map(|s| s.to_string()).collect(),
            pagerank: PageRank::default(),
        }
    }

    fn tokens(&self, sentence: &str) -> HashSet<String> {
        sentence
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .filter(|w| !self.stopwords.contains(w))
            .collect()
    }

    fn similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
        let common = a.intersection(b).count();
        if common == 0 {
            return 0.0;
        }
        let norm = (a.len() as f64).ln() + (b.len() as f64).ln();
        if norm <= 0.0 {
            return 0.0;
        }
        common as f64 / norm
    }

    /// Selects the highest-ranked `ratio` share of sentences (at least one),
    /// returned in their original order.
    pub fn extract(&self, text: &str, ratio: f64) -> String {
        let sentences = split_sentences(text);
        if sentences.len() <= 1 {
            return sentences.concat();
        }

        let tokens: Vec<_> = sentences.iter().map(|s| self.tokens(s)).collect();
        let n = sentences.len();
        let mut weights = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in (i + 1)..n {
                let w = Self::similarity(&tokens[i], &tokens[j]);
                weights[i][j] = w;
                weights[j][i] = w;
            }
        }
        let scores = self.pagerank.run(&weights);

        let keep = ((n as f64 * ratio).round() as usize).clamp(1, n);
        let mut ranked: Vec<usize> = (0..n).collect();
        ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));
        let mut selected = ranked[..keep].to_vec();
        selected.sort_unstable();

        selected
            .into_iter()
            .map(|i| sentences[i])
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait::async_trait]
impl SummarizationBackend for TextRankModel {
    fn name(&self) -> &str {
        "TextRank"
    }

    fn schema(&self) -> &ConfigSchema {
        &self.schema
    }

    async fn summarize(&self, text: &str, params: &ResolvedParams) -> Result<String> {
        Ok(self.extract(text, params.f64("ratio")?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sentences() {
        let sentences = split_sentences("KRAS is mutated. Is it common? Yes! Values were 3.5 mM and rising");
        assert_eq!(
            sentences,
            vec!["KRAS is mutated.", "Is it common?", "Yes!", "Values were 3.5 mM and rising"]
        );
        assert!(split_sentences("   ").is_empty());
    }

    #[test]
    fn test_pagerank_favours_connected_nodes() {
        // star: node 0 is linked to everyone else
        let weights = vec![
            vec![0.0, 1.0, 1.0, 1.0],
            vec![1.0, 0.0, 0.0, 0.0],
            vec![1.0, 0.0, 0.0, 0.0],
            vec![1.0, 0.0, 0.0, 0.0],
        ];
        let scores = PageRank::default().run(&weights);
        let sum: f64 = scores.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(scores[1..].iter().all(|&s| scores[0] > s));
    }

    #[test]
    fn test_pagerank_without_edges_is_uniform() {
        let scores = PageRank::default().run(&vec![vec![0.0; 3]; 3]);
        assert!(scores.iter().all(|s| (s - 1.0 / 3.0).abs() < 1e-9));
        assert!(PageRank::default().run(&[]).is_empty());
    }

    #[test]
    fn test_extract_keeps_central_sentence_in_order() {
        let model = TextRankModel::new();
        let text = "The unrelated weather was sunny. \
                    KRAS mutations drive pancreatic cancer growth. \
                    Pancreatic cancer growth depends on KRAS signalling. \
                    KRAS signalling mutations were measured in cancer cohorts.";
        let summary = model.extract(text, 0.5);
        assert_eq!(split_sentences(&summary).len(), 2);
        assert!(!summary.contains("weather"));

        let positions: Vec<_> = split_sentences(&summary)
            .iter()
            .map(|s| text.find(s).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_extract_never_empty() {
        let model = TextRankModel::new();
        assert_eq!(model.extract("Only one sentence here", 0.01), "Only one sentence here");
        assert!(!model.extract("First one. Second one. Third one.", 0.01).is_empty());
    }
}
