//! Abstractive summarization through the HuggingFace inference API.
//!
//! BART, T5 and Pegasus share one parameter schema. Output lengths are
//! requested relative to the input word count.

use std::fmt;

use reqwest::Client;
use sas_core::{
    word_count, ConfigSchema, Error, ParamKind, ResolvedParams, Result, SummarizationMethod, WordBudget,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::SummarizationBackend;
use crate::Config;

const MIN_MAX_LENGTH: usize = 100;
const MIN_MIN_LENGTH: usize = 50;
const MAX_INPUT_WORDS: usize = 650;

#[derive(Debug, Serialize, PartialEq)]
struct GenerationParameters {
    max_length: usize,
    min_length: usize,
    do_sample: bool,
    early_stopping: bool,
    length_penalty: f64,
    no_repeat_ngram_size: usize,
    num_beams: usize,
    temperature: f64,
    top_k: usize,
    top_p: f64,
}

#[derive(Debug, Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

#[derive(Debug, Serialize)]
struct SummarizationRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParameters,
    options: InferenceOptions,
}

#[derive(Debug, Deserialize)]
struct SummaryText {
    summary_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SummarizationResponse {
    Summaries(Vec<SummaryText>),
    Failure { error: String },
}

fn schema(method: SummarizationMethod) -> ConfigSchema {
    ConfigSchema::new(method)
        .param("max_ratio", ParamKind::PositiveFloat, 0.3)
        .param("min_ratio", ParamKind::PositiveFloat, 0.1)
        .param("do_sample", ParamKind::Bool, false)
        .param("early_stopping", ParamKind::Bool, true)
        .param("length_penalty", ParamKind::PositiveFloat, 2.0)
        .param("no_repeat_ngram_size", ParamKind::PositiveInt, 3)
        .param("num_beams", ParamKind::PositiveInt, 4)
        .param("temperature", ParamKind::PositiveFloat, 1.0)
        .param("top_k", ParamKind::PositiveInt, 50)
        .param("top_p", ParamKind::PositiveFloat, 1.0)
        .constraint(ratios_ordered)
}

fn ratios_ordered(params: &ResolvedParams) -> std::result::Result<(), String> {
    let max_ratio = params.f64("max_ratio").map_err(|e| e.to_string())?;
    let min_ratio = params.f64("min_ratio").map_err(|e| e.to_string())?;
    if min_ratio > max_ratio {
        return Err(format!(
            "min_ratio ({}) is larger than max_ratio ({})",
            min_ratio, max_ratio
        ));
    }
    Ok(())
}

fn generation_parameters(n_words: usize, params: &ResolvedParams) -> Result<GenerationParameters> {
    let max_ratio = params.f64("max_ratio")?;
    let min_ratio = params.f64("min_ratio")?;
    let max_length = ((n_words as f64 * max_ratio) as usize).max(MIN_MAX_LENGTH);
    let min_length = ((n_words as f64 * min_ratio) as usize)
        .max(MIN_MIN_LENGTH)
        .min(max_length);

    Ok(GenerationParameters {
        max_length,
        min_length,
        do_sample: params.bool("do_sample")?,
        early_stopping: params.bool("early_stopping")?,
        length_penalty: params.f64("length_penalty")?,
        no_repeat_ngram_size: params.usize("no_repeat_ngram_size")?,
        num_beams: params.usize("num_beams")?,
        temperature: params.f64("temperature")?,
        top_k: params.usize("top_k")?,
        top_p: params.f64("top_p")?,
    })
}

fn extract_summary(response: SummarizationResponse) -> Result<String> {
    match response {
        SummarizationResponse::Summaries(mut summaries) if summaries.len() == 1 => {
            Ok(summaries.remove(0).summary_text.trim().to_string())
        }
        SummarizationResponse::Summaries(summaries) => Err(Error::Inference(format!(
            "expected one summary, got {}",
            summaries.len()
        ))),
        SummarizationResponse::Failure { error } => Err(Error::Inference(error)),
    }
}

pub struct HuggingFaceModel {
    client: Client,
    endpoint: String,
    api_token: Option<String>,
    model: &'static str,
    schema: ConfigSchema,
}

impl fmt::Debug for HuggingFaceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HuggingFaceModel")
            .field("client", &"<reqwest::Client>")
            .field("endpoint", &self.endpoint)
            .field("api_token", &self.api_token.as_deref().map(|_| "<redacted>"))
            .finish()
    }
}

impl HuggingFaceModel {
    pub fn new(
        client: Client,
        config: &Config,
        method: SummarizationMethod,
        model: &'static str,
    ) -> Result<Self> {
        let base = super::base_url(&config.huggingface_base_url)?;
        Ok(Self {
            client,
            endpoint: format!("{}/models/{}", base, model),
            api_token: config.huggingface_api_token.clone(),
            model,
            schema: schema(method),
        })
    }

    pub fn bart(client: Client, config: &Config) -> Result<Self> {
        Self::new(client, config, SummarizationMethod::Bart, "facebook/bart-large-cnn")
    }

    pub fn t5(client: Client, config: &Config) -> Result<Self> {
        Self::new(client, config, SummarizationMethod::T5, "t5-base")
    }

    pub fn pegasus(client: Client, config: &Config) -> Result<Self> {
        Self::new(client, config, SummarizationMethod::Pegasus, "google/pegasus-xsum")
    }

    pub fn model(&self) -> &str {
        self.model
    }
}

#[async_trait::async_trait]
impl SummarizationBackend for HuggingFaceModel {
    fn name(&self) -> &str {
        self.model
    }

    fn schema(&self) -> &ConfigSchema {
        &self.schema
    }

    fn word_budget(&self) -> WordBudget {
        WordBudget::Max(MAX_INPUT_WORDS)
    }

    async fn summarize(&self, text: &str, params: &ResolvedParams) -> Result<String> {
        let parameters = generation_parameters(word_count(text), params)?;
        debug!(
            "Requesting {} summary ({}-{} tokens)",
            self.model, parameters.min_length, parameters.max_length
        );
        let request = SummarizationRequest {
            inputs: text,
            parameters,
            options: InferenceOptions { wait_for_model: true },
        };

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "{} returned {}: {}",
                self.model,
                status,
                body.trim()
            )));
        }
        extract_summary(response.json::<SummarizationResponse>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sas_core::ParamValue;
    use std::collections::BTreeMap;

    fn resolve(items: &[(&str, ParamValue)]) -> Result<ResolvedParams> {
        let params: BTreeMap<_, _> = items.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        schema(SummarizationMethod::Bart).resolve(&params)
    }

    #[test]
    fn test_lengths_follow_ratios_with_floors() {
        let params = resolve(&[]).unwrap();
        let short = generation_parameters(100, &params).unwrap();
        assert_eq!((short.min_length, short.max_length), (50, 100));

        let long = generation_parameters(1000, &params).unwrap();
        assert_eq!((long.min_length, long.max_length), (100, 300));
        assert_eq!(long.num_beams, 4);
        assert!(long.early_stopping);
    }

    #[test]
    fn test_min_length_never_exceeds_max_length() {
        let params = resolve(&[("min_ratio", ParamValue::Float(0.5)), ("max_ratio", ParamValue::Float(0.5))]).unwrap();
        let generated = generation_parameters(150, &params).unwrap();
        assert!(generated.min_length <= generated.max_length);
    }

    #[test]
    fn test_inverted_ratios_are_rejected() {
        let err = resolve(&[("min_ratio", ParamValue::Float(0.4)), ("max_ratio", ParamValue::Float(0.2))]).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { method: SummarizationMethod::Bart, .. }));
    }

    #[test]
    fn test_schema_rejects_non_positive_values() {
        assert!(resolve(&[("num_beams", ParamValue::Int(0))]).is_err());
        assert!(resolve(&[("max_ratio", ParamValue::Float(-0.3))]).is_err());
        assert!(resolve(&[("ratio", ParamValue::Float(0.3))]).is_err());
    }

    #[test]
    fn test_extract_summary() {
        let ok: SummarizationResponse =
            serde_json::from_str(r#"[{"summary_text": "  A short summary. "}]"#).unwrap();
        assert_eq!(extract_summary(ok).unwrap(), "A short summary.");

        let failed: SummarizationResponse =
            serde_json::from_str(r#"{"error": "Model is overloaded"}"#).unwrap();
        assert!(matches!(extract_summary(failed), Err(Error::Inference(msg)) if msg.contains("overloaded")));

        let empty: SummarizationResponse = serde_json::from_str("[]").unwrap();
        assert!(extract_summary(empty).is_err());
    }

    #[test]
    fn test_models_and_endpoints() {
        let config = Config::default();
        let bart = HuggingFaceModel::bart(Client::new(), &config).unwrap();
        assert_eq!(bart.schema().method(), SummarizationMethod::Bart);
        assert_eq!(
            bart.endpoint,
            "https://api-inference.huggingface.co/models/facebook/bart-large-cnn"
        );
        assert_eq!(bart.word_budget(), WordBudget::Max(650));
        let pegasus = HuggingFaceModel::pegasus(Client::new(), &config).unwrap();
        assert_eq!(pegasus.model(), "google/pegasus-xsum");
    }
}
