use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use trainer_core::model::{ScenarioDraft, ScenarioId};

use crate::error::ProviderError;
use crate::providers::ScenarioGenerator;

#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl GeneratorConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("TRAINER_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url =
            env::var("TRAINER_AI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
        let model = env::var("TRAINER_AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
        Some(Self {
            base_url,
            api_key,
            model,
            timeout: Duration::from_secs(20),
        })
    }
}

/// Chat-completions-backed scenario generator.
///
/// Asks the model for a strict-JSON scenario record and parses the reply
/// into a [`ScenarioDraft`]. The draft is still unvalidated at this point;
/// the selector checks the scenario invariants before accepting it.
#[derive(Clone)]
pub struct ChatScenarioGenerator {
    client: Client,
    config: GeneratorConfig,
}

impl ChatScenarioGenerator {
    /// Build a generator from the given config.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Http` if the HTTP client cannot be built.
    pub fn new(config: GeneratorConfig) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Build a generator from environment configuration, if present.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Http` if the HTTP client cannot be built.
    pub fn from_env() -> Result<Option<Self>, ProviderError> {
        match GeneratorConfig::from_env() {
            Some(config) => Ok(Some(Self::new(config)?)),
            None => Ok(None),
        }
    }

    fn build_prompt(difficulty: u8, theme: Option<&str>) -> String {
        let mut prompt =
            format!("Generate a cybersecurity training scenario at difficulty level {difficulty}");
        if let Some(theme) = theme {
            prompt.push_str(&format!(" about {theme}"));
        }
        prompt.push_str(
            ". Respond with a single JSON object with the fields: id, title, description, \
             content, options (an array of 2 to 4 answer strings), correct_answer (the index \
             of the right option), difficulty, explanation, theme. No prose outside the JSON.",
        );
        prompt
    }
}

#[async_trait]
impl ScenarioGenerator for ChatScenarioGenerator {
    async fn generate(
        &self,
        difficulty: u8,
        theme: Option<&str>,
    ) -> Result<ScenarioDraft, ProviderError> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let payload = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "You are a cybersecurity training scenario generator. Create \
                              realistic and educational security-awareness scenarios as \
                              multiple-choice questions."
                        .to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: Self::build_prompt(difficulty, theme),
                },
            ],
            temperature: 0.7,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::Http(e)
                }
            })?;

        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::Malformed("empty completion".into()))?;

        parse_scenario_reply(&content)
    }
}

/// Parses a model reply into a draft, salvaging the first JSON object when
/// the model wraps it in prose. A missing id is filled with a fresh
/// generated one.
fn parse_scenario_reply(content: &str) -> Result<ScenarioDraft, ProviderError> {
    let json_slice = match serde_json::from_str::<serde_json::Value>(content) {
        Ok(_) => content,
        Err(_) => {
            let start = content.find('{');
            let end = content.rfind('}');
            match (start, end) {
                (Some(start), Some(end)) if start < end => &content[start..=end],
                _ => {
                    return Err(ProviderError::Malformed(
                        "no JSON object in completion".into(),
                    ));
                }
            }
        }
    };

    let mut value: serde_json::Value = serde_json::from_str(json_slice)
        .map_err(|e| ProviderError::Malformed(e.to_string()))?;

    if let Some(object) = value.as_object_mut() {
        let missing_id = object
            .get("id")
            .and_then(serde_json::Value::as_str)
            .is_none_or(str::is_empty);
        if missing_id {
            object.insert(
                "id".into(),
                serde_json::Value::String(ScenarioId::generated().to_string()),
            );
        }
    }

    serde_json::from_value(value).map_err(|e| ProviderError::Malformed(e.to_string()))
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLY: &str = r#"{
        "id": "gen_test",
        "title": "QR Code Parking Scam",
        "description": "A quishing attempt",
        "content": "A sticker QR code on a parking meter offers mobile payment.",
        "options": ["Scan and pay", "Use the official app or meter instead"],
        "correct_answer": 1,
        "difficulty": 3,
        "explanation": "Stickers over meters are a common QR phishing vector.",
        "theme": "quishing"
    }"#;

    #[test]
    fn parses_plain_json_reply() {
        let draft = parse_scenario_reply(REPLY).unwrap();
        assert_eq!(draft.id.as_str(), "gen_test");
        assert_eq!(draft.difficulty, 3);
    }

    #[test]
    fn salvages_json_wrapped_in_prose() {
        let wrapped = format!("Sure! Here is the scenario:\n{REPLY}\nLet me know.");
        let draft = parse_scenario_reply(&wrapped).unwrap();
        assert_eq!(draft.theme, "quishing");
    }

    #[test]
    fn fills_in_missing_id() {
        let no_id = REPLY.replace(r#""id": "gen_test","#, "");
        let draft = parse_scenario_reply(&no_id).unwrap();
        assert!(draft.id.as_str().starts_with("gen_"));
    }

    #[test]
    fn rejects_reply_without_json() {
        let err = parse_scenario_reply("I cannot help with that.").unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));
    }

    #[test]
    fn prompt_includes_difficulty_and_theme() {
        let prompt = ChatScenarioGenerator::build_prompt(4, Some("smishing"));
        assert!(prompt.contains("difficulty level 4"));
        assert!(prompt.contains("about smishing"));
    }
}
