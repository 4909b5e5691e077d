use std::fmt;

use sas_core::{ConfigSchema, ParamKind, ResolvedParams, Result, SummarizationMethod};

use super::SummarizationBackend;

/// Offline baseline that keeps the leading share of the words.
pub struct LeadModel {
    schema: ConfigSchema,
}

impl fmt::Debug for LeadModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeadModel").finish()
    }
}

impl Default for LeadModel {
    fn default() -> Self {
        Self::new()
    }
}

impl LeadModel {
    pub fn new() -> Self {
        Self {
            schema: ConfigSchema::new(SummarizationMethod::Lead).param("ratio", ParamKind::Ratio, 0.2),
        }
    }
}

#[async_trait::async_trait]
impl SummarizationBackend for LeadModel {
    fn name(&self) -> &str {
        "Lead"
    }

    fn schema(&self) -> &ConfigSchema {
        &self.schema
    }

    async fn summarize(&self, text: &str, params: &ResolvedParams) -> Result<String> {
        let ratio = params.f64("ratio")?;
        let words: Vec<&str> = text.split_whitespace().collect();
        let keep = ((words.len() as f64 * ratio).ceil() as usize).max(1);
        Ok(words.into_iter().take(keep).collect::<Vec<_>>().join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sas_core::ParamValue;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_lead_model() {
        let model = LeadModel::new();
        let text = "one two three four five six seven eight nine ten";

        let defaults = model.schema().resolve(&BTreeMap::new()).unwrap();
        assert_eq!(model.summarize(text, &defaults).await.unwrap(), "one two");

        let params: BTreeMap<_, _> = [("ratio".to_string(), ParamValue::Float(0.01))].into();
        let tiny = model.schema().resolve(&params).unwrap();
        assert_eq!(model.summarize(text, &tiny).await.unwrap(), "one");
    }
}
