//! Built-in article list and configuration grid used when `summarize` is
//! run without input files.

use sas_core::{SummarizationConfig, SummarizationMethod};

pub const ARTICLE_URLS: [&str; 4] = [
    // KRAS alleles
    "https://www.nature.com/articles/s41467-021-22125-z",
    // Deep learning for Alzheimer's
    "https://www.nature.com/articles/s41467-021-26703-z",
    // CRISPR selection
    "https://www.nature.com/articles/s41467-021-26788-6",
    // Cardiac Myc
    "https://www.nature.com/articles/s41467-020-15552-x",
];

const TEXTRANK_RATIOS: [f64; 4] = [0.01, 0.05, 0.1, 0.2];
const BART_RATIOS: [(f64, f64); 3] = [(0.05, 0.1), (0.1, 0.2), (0.2, 0.3)];

pub fn urls() -> Vec<String> {
    ARTICLE_URLS.iter().map(|u| u.to_string()).collect()
}

pub fn configurations() -> Vec<SummarizationConfig> {
    let textrank = TEXTRANK_RATIOS
        .iter()
        .map(|&ratio| SummarizationConfig::new(SummarizationMethod::Textrank).with_param("ratio", ratio));
    let bart = BART_RATIOS.iter().map(|&(min_ratio, max_ratio)| {
        SummarizationConfig::new(SummarizationMethod::Bart)
            .with_param("min_ratio", min_ratio)
            .with_param("max_ratio", max_ratio)
    });
    textrank.chain(bart).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sas_inference::{create_dispatcher, Config};

    #[test]
    fn test_default_grid() {
        let configs = configurations();
        assert_eq!(configs.len(), 7);
        assert_eq!(
            configs.iter().filter(|c| c.method == SummarizationMethod::Bart).count(),
            3
        );
        assert_eq!(urls().len(), 4);
    }

    #[test]
    fn test_default_grid_is_valid() {
        let dispatcher = create_dispatcher(&Config::default()).unwrap();
        for config in configurations() {
            assert!(dispatcher.validate(&config).is_ok(), "{} rejected", config);
        }
    }
}
