//! Turns a cached article page into a [`Document`].
//!
//! Section blocks are read in document order and keyed by their heading.
//! Methods-like and results-like sections keep their sub-headings as an
//! ordered map; every other recognized section becomes a flat paragraph
//! list. Headings that map to none of the five regions are dropped.

use lazy_static::lazy_static;
use regex::Regex;
use sas_core::{ArticleText, Document, Error, NestedText, RawPage, Region, Result};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref RESULTS_HEADING: Regex = Regex::new(r"(?i)\bresults?\b").unwrap();
    static ref METHODS_HEADING: Regex = Regex::new(r"(?i)\bmethods?\b").unwrap();
}

const CITATION_SEPARATORS: &[char] = &[',', ';', '-', '\u{2013}', '\u{2014}'];

/// CSS selectors describing the article markup.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub title: String,
    pub section: String,
    pub heading: String,
    pub sub_heading: String,
    pub paragraph: String,
    /// Removed from the page before any text is read.
    pub strip: Vec<String>,
    /// Reference markers; always removed.
    pub citation: String,
    /// Element wrapping reference markers. Removed only when it holds
    /// nothing but markers and separators, so exponents and charges stay.
    pub citation_wrapper: String,
}

impl Default for ExtractorConfig {
    /// Nature-family article pages.
    fn default() -> Self {
        Self {
            title: "h1".to_string(),
            section: ".c-article-section".to_string(),
            heading: "h2".to_string(),
            sub_heading: "h3".to_string(),
            paragraph: "p".to_string(),
            strip: vec!["figure".to_string(), "img".to_string()],
            citation: "a[data-track-action=\"reference anchor\"]".to_string(),
            citation_wrapper: "sup".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SectionExtractor {
    title: Selector,
    section: Selector,
    heading: Selector,
    sub_heading: Selector,
    paragraph: Selector,
    nested_walk: Selector,
    strip: Vec<Selector>,
    citation: Selector,
    citation_wrapper: Selector,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Parse(format!("Invalid selector '{}': {:?}", css, e)))
}

fn element_text(element: ElementRef<'_>) -> String {
    let raw: String = element.text().collect();
    WHITESPACE.replace_all(raw.trim(), " ").into_owned()
}

/// Region a section heading belongs to, if any.
pub fn classify_heading(heading: &str) -> Option<Region> {
    let heading = heading.trim();
    if let Some(region) = Region::ALL
        .into_iter()
        .find(|region| heading.eq_ignore_ascii_case(region.name()))
    {
        return Some(region);
    }
    if RESULTS_HEADING.is_match(heading) {
        Some(Region::Results)
    } else if METHODS_HEADING.is_match(heading) {
        Some(Region::Methods)
    } else {
        None
    }
}

impl SectionExtractor {
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        Ok(Self {
            title: selector(&config.title)?,
            section: selector(&config.section)?,
            heading: selector(&config.heading)?,
            sub_heading: selector(&config.sub_heading)?,
            paragraph: selector(&config.paragraph)?,
            nested_walk: selector(&format!("{}, {}", config.sub_heading, config.paragraph))?,
            strip: config
                .strip
                .iter()
                .map(|css| selector(css))
                .collect::<Result<_>>()?,
            citation: selector(&config.citation)?,
            citation_wrapper: selector(&config.citation_wrapper)?,
        })
    }

    pub fn extract(&self, page: &RawPage) -> Result<Document> {
        let mut html = Html::parse_document(&page.text());
        self.strip_non_content(&mut html);

        let title = html
            .select(&self.title)
            .map(element_text)
            .find(|t| !t.is_empty())
            .ok_or_else(|| Error::Parse(format!("No title found in {}", page.url)))?;

        let mut text = ArticleText::default();
        let mut matched = 0;
        for section in html.select(&self.section) {
            let Some(heading) = section.select(&self.heading).next().map(element_text) else {
                continue;
            };
            let Some(region) = classify_heading(&heading) else {
                debug!("Skipping section '{}'", heading);
                continue;
            };
            matched += 1;
            match region {
                Region::Abstract => text.abstract_text = self.flat(section),
                Region::Introduction => text.introduction = self.flat(section),
                Region::Discussion => text.discussion = self.flat(section),
                Region::Methods => text.methods = self.nested(section, &heading)?,
                Region::Results => text.results = self.nested(section, &heading)?,
            }
        }

        if matched == 0 {
            return Err(Error::Parse(format!("No recognizable sections in {}", page.url)));
        }
        Ok(Document {
            title,
            url: page.url.clone(),
            text,
        })
    }

    fn strip_non_content(&self, html: &mut Html) {
        let mut ids: Vec<_> = self
            .strip
            .iter()
            .flat_map(|sel| html.select(sel).map(|el| el.id()).collect::<Vec<_>>())
            .collect();
        for anchor in html.select(&self.citation) {
            ids.push(anchor.id());
            let wrapper = anchor
                .parent()
                .and_then(ElementRef::wrap)
                .filter(|parent| self.citation_wrapper.matches(parent));
            if let Some(wrapper) = wrapper {
                if self.holds_only_citations(wrapper) {
                    ids.push(wrapper.id());
                }
            }
        }
        for id in ids {
            if let Some(mut node) = html.tree.get_mut(id) {
                node.detach();
            }
        }
    }

    fn holds_only_citations(&self, wrapper: ElementRef<'_>) -> bool {
        wrapper.descendants().all(|node| {
            let Some(text) = node.value().as_text() else {
                return true;
            };
            text.chars()
                .all(|c| c.is_whitespace() || CITATION_SEPARATORS.contains(&c))
                || node
                    .ancestors()
                    .take_while(|ancestor| ancestor.id() != wrapper.id())
                    .filter_map(ElementRef::wrap)
                    .any(|element| self.citation.matches(&element))
        })
    }

    fn flat(&self, section: ElementRef<'_>) -> Vec<String> {
        section
            .select(&self.paragraph)
            .map(element_text)
            .filter(|p| !p.is_empty())
            .collect()
    }

    fn nested(&self, section: ElementRef<'_>, heading: &str) -> Result<NestedText> {
        let mut nested = NestedText::new();
        let mut current: Option<(String, Vec<String>)> = None;

        for element in section.select(&self.nested_walk) {
            if self.sub_heading.matches(&element) {
                if let Some((title, paragraphs)) = current.take() {
                    close_sub_section(&mut nested, heading, title, paragraphs)?;
                }
                current = Some((element_text(element), Vec::new()));
                continue;
            }
            let paragraph = element_text(element);
            if paragraph.is_empty() {
                continue;
            }
            match current.as_mut() {
                Some((_, paragraphs)) => paragraphs.push(paragraph),
                None => current = Some((heading.to_string(), vec![paragraph])),
            }
        }
        if let Some((title, paragraphs)) = current {
            close_sub_section(&mut nested, heading, title, paragraphs)?;
        }
        Ok(nested)
    }
}

fn close_sub_section(
    nested: &mut NestedText,
    heading: &str,
    title: String,
    paragraphs: Vec<String>,
) -> Result<()> {
    if paragraphs.is_empty() {
        return Err(Error::Parse(format!(
            "Sub-section '{}' of '{}' has no paragraphs",
            title, heading
        )));
    }
    nested.insert(title, paragraphs);
    Ok(())
}
