use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::text::indent;
use crate::Error;

/// Raw bytes of a fetched webpage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    pub url: String,
    pub content: Vec<u8>,
}

impl RawPage {
    pub fn new(url: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            url: url.into(),
            content: content.into(),
        }
    }

    /// Page content decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }
}

/// The five canonical parts of a scientific article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    Abstract,
    Introduction,
    Methods,
    Results,
    Discussion,
}

impl Region {
    pub const ALL: [Region; 5] = [
        Region::Abstract,
        Region::Introduction,
        Region::Methods,
        Region::Results,
        Region::Discussion,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Region::Abstract => "Abstract",
            Region::Introduction => "Introduction",
            Region::Methods => "Methods",
            Region::Results => "Results",
            Region::Discussion => "Discussion",
        }
    }

    /// Methods and Results are split into titled sub-sections.
    pub fn is_nested(&self) -> bool {
        matches!(self, Region::Methods | Region::Results)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered mapping of sub-section title to its paragraphs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NestedText(IndexMap<String, Vec<String>>);

impl NestedText {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a sub-section. A repeated title replaces the earlier
    /// paragraphs but keeps its original position.
    pub fn insert(&mut self, title: impl Into<String>, paragraphs: Vec<String>) {
        self.0.insert(title.into(), paragraphs);
    }

    pub fn get(&self, title: &str) -> Option<&Vec<String>> {
        self.0.get(title)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }

    pub fn titles(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn paragraph_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}

impl FromIterator<(String, Vec<String>)> for NestedText {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Borrowed view of one region, tagged by shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Section<'a> {
    Flat(&'a [String]),
    Nested(&'a NestedText),
}

impl Section<'_> {
    pub fn is_empty(&self) -> bool {
        match self {
            Section::Flat(paragraphs) => paragraphs.is_empty(),
            Section::Nested(nested) => nested.is_empty(),
        }
    }
}

/// Organized text of a scientific article. Every region is always present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleText {
    #[serde(rename = "Abstract")]
    pub abstract_text: Vec<String>,
    #[serde(rename = "Introduction")]
    pub introduction: Vec<String>,
    #[serde(rename = "Methods")]
    pub methods: NestedText,
    #[serde(rename = "Results")]
    pub results: NestedText,
    #[serde(rename = "Discussion")]
    pub discussion: Vec<String>,
}

impl ArticleText {
    pub fn section(&self, region: Region) -> Section<'_> {
        match region {
            Region::Abstract => Section::Flat(&self.abstract_text),
            Region::Introduction => Section::Flat(&self.introduction),
            Region::Methods => Section::Nested(&self.methods),
            Region::Results => Section::Nested(&self.results),
            Region::Discussion => Section::Flat(&self.discussion),
        }
    }

    pub fn sections(&self) -> impl Iterator<Item = (Region, Section<'_>)> {
        Region::ALL.into_iter().map(move |region| (region, self.section(region)))
    }

    pub fn is_empty(&self) -> bool {
        self.sections().all(|(_, section)| section.is_empty())
    }
}

impl fmt::Display for ArticleText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Abstract: {} paragraph(s)", self.abstract_text.len())?;
        writeln!(f, "Introduction: {} paragraph(s)", self.introduction.len())?;
        writeln!(
            f,
            "Methods: {} section(s), {} paragraph(s)",
            self.methods.len(),
            self.methods.paragraph_count()
        )?;
        writeln!(
            f,
            "Results: {} section(s), {} paragraph(s)",
            self.results.len(),
            self.results.paragraph_count()
        )?;
        write!(f, "Discussion: {} paragraph(s)", self.discussion.len())
    }
}

/// A parsed article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub url: String,
    pub text: ArticleText,
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "(url: {})", self.url)?;
        write!(f, "{}", indent(&self.text.to_string()))
    }
}

/// Available summarization methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SummarizationMethod {
    Textrank,
    Bart,
    T5,
    Pegasus,
    Gpt3,
    Lead,
}

impl SummarizationMethod {
    pub const ALL: [SummarizationMethod; 6] = [
        SummarizationMethod::Textrank,
        SummarizationMethod::Bart,
        SummarizationMethod::T5,
        SummarizationMethod::Pegasus,
        SummarizationMethod::Gpt3,
        SummarizationMethod::Lead,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SummarizationMethod::Textrank => "TEXTRANK",
            SummarizationMethod::Bart => "BART",
            SummarizationMethod::T5 => "T5",
            SummarizationMethod::Pegasus => "PEGASUS",
            SummarizationMethod::Gpt3 => "GPT3",
            SummarizationMethod::Lead => "LEAD",
        }
    }
}

impl fmt::Display for SummarizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SummarizationMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::Parse(format!("Unknown summarization method: {}", s)))
    }
}

/// A scalar backend parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    /// Numeric view; integers widen to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(i) => Some(*i as f64),
            ParamValue::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "bool",
            ParamValue::Int(_) => "integer",
            ParamValue::Float(_) => "float",
            ParamValue::Text(_) => "string",
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Int(i) => write!(f, "{}", i),
            // Whole floats keep their decimal point so result keys tell 1.0 from 1.
            ParamValue::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{:.1}", x),
            ParamValue::Float(x) => write!(f, "{}", x),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

/// Method plus backend keyword parameters. Keys are kept sorted so that
/// every rendering of a configuration is stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizationConfig {
    pub method: SummarizationMethod,
    #[serde(default, alias = "config_kwargs")]
    pub params: BTreeMap<String, ParamValue>,
}

impl SummarizationConfig {
    pub fn new(method: SummarizationMethod) -> Self {
        Self {
            method,
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Human-readable parameter listing.
    pub fn describe(&self) -> String {
        if self.params.is_empty() {
            return "Default configuration".to_string();
        }
        self.params
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for SummarizationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.method, self.describe())
    }
}

/// The result of summarizing one article under one configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizedDocument {
    pub title: String,
    pub url: String,
    pub text: ArticleText,
    pub config: SummarizationConfig,
    pub summary: ArticleText,
    pub summarized_at: DateTime<Utc>,
}

impl SummarizedDocument {
    pub fn new(document: Document, config: SummarizationConfig, summary: ArticleText) -> Self {
        Self {
            title: document.title,
            url: document.url,
            text: document.text,
            config,
            summary,
            summarized_at: Utc::now(),
        }
    }
}

impl fmt::Display for SummarizedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "(url: {})", self.url)?;
        writeln!(f, "(config: {})", self.config)?;
        writeln!(f)?;
        writeln!(f, " Original text:")?;
        writeln!(f, "{}", indent(&self.text.to_string()))?;
        writeln!(f)?;
        writeln!(f, " Summarized text:")?;
        write!(f, "{}", indent(&self.summary.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_text() -> ArticleText {
        let mut results = NestedText::new();
        results.insert("Cohort", vec!["p1".to_string(), "p2".to_string()]);
        results.insert("Validation", vec!["p3".to_string()]);
        ArticleText {
            abstract_text: vec!["abs".to_string()],
            introduction: vec!["i1".to_string(), "i2".to_string()],
            methods: NestedText::new(),
            results,
            discussion: vec![],
        }
    }

    #[test]
    fn test_section_shapes() {
        let text = sample_text();
        assert!(matches!(text.section(Region::Introduction), Section::Flat(p) if p.len() == 2));
        assert!(matches!(text.section(Region::Results), Section::Nested(n) if n.len() == 2));
        assert!(text.section(Region::Methods).is_empty());
        assert_eq!(text.sections().count(), 5);
    }

    #[test]
    fn test_nested_insert_keeps_order_and_last_wins() {
        let mut nested = NestedText::new();
        nested.insert("b", vec!["1".to_string()]);
        nested.insert("a", vec!["2".to_string()]);
        nested.insert("b", vec!["3".to_string()]);
        let titles: Vec<_> = nested.titles().cloned().collect();
        assert_eq!(titles, vec!["b", "a"]);
        assert_eq!(nested.get("b").unwrap(), &vec!["3".to_string()]);
    }

    #[test]
    fn test_article_text_serializes_region_names() {
        let json = serde_json::to_value(sample_text()).unwrap();
        for region in Region::ALL {
            assert!(json.get(region.name()).is_some(), "missing {}", region);
        }
        assert_eq!(json["Results"]["Cohort"][1], "p2");
    }

    #[test]
    fn test_method_round_trips_through_strings() {
        assert_eq!("textrank".parse::<SummarizationMethod>().unwrap(), SummarizationMethod::Textrank);
        assert_eq!(
            serde_json::to_string(&SummarizationMethod::Gpt3).unwrap(),
            "\"GPT3\""
        );
        assert!("unknown".parse::<SummarizationMethod>().is_err());
    }

    #[test]
    fn test_config_from_json_accepts_config_kwargs_alias() {
        let config: SummarizationConfig = serde_json::from_str(
            r#"{"method": "BART", "config_kwargs": {"min_ratio": 0.1, "num_beams": 4, "do_sample": true}}"#,
        )
        .unwrap();
        assert_eq!(config.method, SummarizationMethod::Bart);
        assert_eq!(config.params["min_ratio"], ParamValue::Float(0.1));
        assert_eq!(config.params["num_beams"], ParamValue::Int(4));
        assert_eq!(config.params["do_sample"], ParamValue::Bool(true));
    }

    #[test]
    fn test_config_describe() {
        let config = SummarizationConfig::new(SummarizationMethod::Textrank);
        assert_eq!(config.describe(), "Default configuration");
        let config = config.with_param("ratio", 0.1);
        assert_eq!(config.describe(), "ratio: 0.1");
    }

    #[test]
    fn test_document_display() {
        let doc = Document {
            title: "A title".to_string(),
            url: "https://example.com".to_string(),
            text: sample_text(),
        };
        let shown = doc.to_string();
        assert!(shown.starts_with("A title\n(url: https://example.com)"));
        assert!(shown.contains("  Results: 2 section(s), 3 paragraph(s)"));
    }

    #[test]
    fn test_article_text_emptiness() {
        assert!(ArticleText::default().is_empty());
        let text = sample_text();
        assert!(!text.is_empty());
        assert_eq!(text.results.paragraph_count(), 3);
    }

    #[test]
    fn test_param_value_display() {
        assert_eq!(ParamValue::Float(1.0).to_string(), "1.0");
        assert_eq!(ParamValue::Float(0.05).to_string(), "0.05");
        assert_eq!(ParamValue::Int(1).to_string(), "1");
        assert_eq!(ParamValue::from("ada").to_string(), "ada");
    }
}
