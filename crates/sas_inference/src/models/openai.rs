//! GPT-3 completions backend.

use std::fmt;

use reqwest::Client;
use sas_core::{
    ConfigSchema, Error, ParamKind, ResolvedParams, Result, SummarizationMethod, WordBudget,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::SummarizationBackend;

const ENGINES: &[&str] = &["davinci", "curie", "babbage", "ada"];
const MAX_INPUT_WORDS: usize = 1200;
const DELIMITER: &str = "\"\"\"";

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: String,
    temperature: f64,
    max_tokens: usize,
    top_p: f64,
    frequency_penalty: f64,
    presence_penalty: f64,
    stop: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

fn schema() -> ConfigSchema {
    ConfigSchema::new(SummarizationMethod::Gpt3)
        .param("engine", ParamKind::Choice(ENGINES), "davinci")
        .param("temperature", ParamKind::PositiveFloat, 0.3)
        .param("max_tokens", ParamKind::PositiveInt, 150)
        .param("top_p", ParamKind::PositiveFloat, 1.0)
        .param("frequency_penalty", ParamKind::Float, 0.1)
        .param("presence_penalty", ParamKind::Float, 0.1)
}

fn prompt(text: &str) -> String {
    format!(
        "Summarize the following scientific article:\n{d}\n{text}\n{d}\nSummary:\n{d}\n",
        d = DELIMITER,
        text = text
    )
}

fn completion_request<'a>(text: &str, params: &'a ResolvedParams) -> Result<CompletionRequest<'a>> {
    Ok(CompletionRequest {
        model: params.str("engine")?,
        prompt: prompt(text),
        temperature: params.f64("temperature")?,
        max_tokens: params.usize("max_tokens")?,
        top_p: params.f64("top_p")?,
        frequency_penalty: params.f64("frequency_penalty")?,
        presence_penalty: params.f64("presence_penalty")?,
        stop: vec![DELIMITER],
    })
}

fn extract_completion(response: CompletionResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.text.trim().to_string())
        .ok_or_else(|| Error::Inference("completion response has no choices".to_string()))
}

pub struct Gpt3Model {
    client: Client,
    endpoint: String,
    api_key: String,
    schema: ConfigSchema,
}

impl fmt::Debug for Gpt3Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gpt3Model")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl Gpt3Model {
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Result<Self> {
        let base = super::base_url(base_url)?;
        Ok(Self {
            client,
            endpoint: format!("{}/completions", base),
            api_key: api_key.to_string(),
            schema: schema(),
        })
    }
}

#[async_trait::async_trait]
impl SummarizationBackend for Gpt3Model {
    fn name(&self) -> &str {
        "GPT-3"
    }

    fn schema(&self) -> &ConfigSchema {
        &self.schema
    }

    fn word_budget(&self) -> WordBudget {
        WordBudget::Max(MAX_INPUT_WORDS)
    }

    async fn summarize(&self, text: &str, params: &ResolvedParams) -> Result<String> {
        let request = completion_request(text, params)?;
        debug!("Requesting completion from {} ({} max tokens)", request.model, request.max_tokens);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!("OpenAI returned {}: {}", status, body.trim())));
        }
        extract_completion(response.json::<CompletionResponse>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sas_core::ParamValue;
    use std::collections::BTreeMap;

    #[test]
    fn test_prompt_wraps_text() {
        assert_eq!(
            prompt("Cells divide."),
            "Summarize the following scientific article:\n\"\"\"\nCells divide.\n\"\"\"\nSummary:\n\"\"\"\n"
        );
    }

    #[test]
    fn test_request_uses_defaults_and_overrides() {
        let mut raw = BTreeMap::new();
        raw.insert("engine".to_string(), ParamValue::from("curie"));
        raw.insert("max_tokens".to_string(), ParamValue::Int(60));
        let params = schema().resolve(&raw).unwrap();

        let request = completion_request("text", &params).unwrap();
        assert_eq!(request.model, "curie");
        assert_eq!(request.max_tokens, 60);
        assert_eq!(request.temperature, 0.3);
        assert_eq!(request.stop, vec!["\"\"\""]);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["presence_penalty"], 0.1);
    }

    #[test]
    fn test_unknown_engine_is_rejected() {
        let mut raw = BTreeMap::new();
        raw.insert("engine".to_string(), ParamValue::from("gpt-9"));
        assert!(matches!(schema().resolve(&raw), Err(Error::ConfigValidation { .. })));
    }

    #[test]
    fn test_extract_completion() {
        let response: CompletionResponse =
            serde_json::from_str(r#"{"choices": [{"text": "  A short summary.\n"}]}"#).unwrap();
        assert_eq!(extract_completion(response).unwrap(), "A short summary.");

        let empty: CompletionResponse = serde_json::from_str("{}").unwrap();
        assert!(extract_completion(empty).is_err());
    }

    #[test]
    fn test_debug_hides_key() {
        let model = Gpt3Model::new(Client::new(), "https://api.openai.com/v1/", "sk-secret").unwrap();
        let debug = format!("{:?}", model);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("https://api.openai.com/v1/completions"));
    }
}
