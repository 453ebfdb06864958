//! PsyGPT completion-service client.
//!
//! Three operations, each one blocking POST with a JSON body: create a chat
//! session, ask for a structured dose card, ask a freeform question. No
//! retries; callers translate any error into a fixed apology reply.

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::card;

const TEMPERATURE: f32 = 0.5;
const CARD_MAX_TOKENS: u32 = 4096;
const QUESTION_MAX_TOKENS: u32 = 4000;

pub struct PsyGptClient {
    base_url: String,
    api_key: String,
    bearer_token: String,
    model_id: String,
    info_prompt_suffix: String,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct CreateChatRequest {
    name: String,
}

#[derive(Deserialize)]
struct CreateChatResponse {
    chat_id: String,
}

#[derive(Serialize)]
struct QuestionRequest<'a> {
    model: &'a str,
    question: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct QuestionResponse {
    assistant: String,
}

impl PsyGptClient {
    pub fn new(
        base_url: String,
        api_key: String,
        bearer_token: String,
        model_id: String,
        info_prompt_suffix: String,
    ) -> Self {
        Self {
            base_url,
            api_key,
            bearer_token,
            model_id,
            info_prompt_suffix,
            http: reqwest::Client::new(),
        }
    }

    /// Create a fresh chat session named after the query.
    pub async fn create_chat(&self, query: &str) -> Result<String, Error> {
        let request = CreateChatRequest {
            name: format!("Card => {query}"),
        };
        let url = format!("{}/chat", self.base_url);
        let response: CreateChatResponse = self.post(&url, &request).await?;
        debug!("Created chat session {}", response.chat_id);
        Ok(response.chat_id)
    }

    /// Ask for a structured drug-information card for a substance.
    pub async fn ask_dose_card(&self, substance: &str, chat_id: &str) -> Result<String, Error> {
        let question = dose_card_question(substance, &self.info_prompt_suffix);
        self.ask(chat_id, question, CARD_MAX_TOKENS).await
    }

    /// Ask a freeform conversational question.
    pub async fn ask_question(&self, query: &str, chat_id: &str) -> Result<String, Error> {
        self.ask(chat_id, conversational_question(query), QUESTION_MAX_TOKENS)
            .await
    }

    async fn ask(&self, chat_id: &str, question: String, max_tokens: u32) -> Result<String, Error> {
        let request = QuestionRequest {
            model: &self.model_id,
            question,
            temperature: TEMPERATURE,
            max_tokens,
        };
        let url = format!("{}/chat/{}/question", self.base_url, chat_id);
        let response: QuestionResponse = self.post(&url, &request).await?;
        Ok(response.assistant)
    }

    async fn post<T: Serialize, R: DeserializeOwned>(&self, url: &str, body: &T) -> Result<R, Error> {
        let response = self
            .http
            .post(url)
            .header("Openai-Api-Key", &self.api_key)
            .bearer_auth(&self.bearer_token)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!("{status}: {body}")));
        }

        response.json().await.map_err(|e| Error::Parse(e.to_string()))
    }
}

fn dose_card_question(substance: &str, suffix: &str) -> String {
    format!(
        "Generate a drug information card for {substance}. Respond only with the card. \
         Use the provided example and follow the exact syntax given.\n\n \
         Example drug information card for Gabapentin:\n\n{card}\n\nNotes 1. {suffix}",
        card = card::example_card(),
    )
}

fn conversational_question(query: &str) -> String {
    format!(
        "{query}\n\n(Please respond conversationally to the query. If additional relevant \
         details are available, incorporate that information naturally into your response \
         without directly mentioning the source. If the available information does not fully \
         address the query, feel free to rely on your own knowledge to provide a helpful, \
         friendly response within 30000 characters.)"
    )
}

#[derive(Debug)]
pub enum Error {
    Http(String),
    Api(String),
    Parse(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Http(e) => write!(f, "HTTP error: {e}"),
            Error::Api(e) => write!(f, "API error: {e}"),
            Error::Parse(e) => write!(f, "Parse error: {e}"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dose_card_question_embeds_full_card() {
        let question = dose_card_question("Caffeine", "Cite your sources.");
        assert!(question.starts_with("Generate a drug information card for Caffeine."));
        assert!(question.contains(&card::example_card()));
        assert!(question.ends_with("Notes 1. Cite your sources."));
    }

    #[test]
    fn test_conversational_question_keeps_query_verbatim() {
        let question = conversational_question("what is harm reduction");
        assert!(question.starts_with("what is harm reduction\n\n("));
        assert!(question.contains("respond conversationally"));
    }
}
