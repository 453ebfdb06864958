//! Command handlers - maps one incoming message body to at most one reply.

use tracing::{info, warn};

use crate::command::{self, Command, Keyword};
use crate::psygpt::{self, PsyGptClient};

pub const WELCOME: &str = "Welcome to PsyAI Bot! Type /info [Drug Name] for info or /ask [Your question] for general queries.";

const CHAT_ID_APOLOGY: &str = "Sorry, I couldn't fetch the chat ID. Please try again later.";
const INFO_APOLOGY: &str = "Sorry, I couldn't fetch the information. Please try again later.";

/// Seam over the completion-service calls so handlers can be tested without
/// a live backend.
pub trait SessionApi {
    async fn create_chat(&self, query: &str) -> Result<String, psygpt::Error>;
    async fn ask_dose_card(&self, substance: &str, chat_id: &str) -> Result<String, psygpt::Error>;
    async fn ask_question(&self, query: &str, chat_id: &str) -> Result<String, psygpt::Error>;
}

impl SessionApi for PsyGptClient {
    async fn create_chat(&self, query: &str) -> Result<String, psygpt::Error> {
        PsyGptClient::create_chat(self, query).await
    }

    async fn ask_dose_card(&self, substance: &str, chat_id: &str) -> Result<String, psygpt::Error> {
        PsyGptClient::ask_dose_card(self, substance, chat_id).await
    }

    async fn ask_question(&self, query: &str, chat_id: &str) -> Result<String, psygpt::Error> {
        PsyGptClient::ask_question(self, query, chat_id).await
    }
}

/// Compute the reply for an incoming message body. None means the message
/// is not addressed to the bot and gets no reply at all.
pub async fn respond(body: &str, api: &impl SessionApi) -> Option<String> {
    match command::parse(body) {
        Command::Start => Some(WELCOME.to_string()),
        Command::Info(substance) => Some(info_reply(&substance, api).await),
        Command::Ask(query) => Some(ask_reply(&query, api).await),
        Command::Missing(keyword) => Some(missing_argument(keyword)),
        Command::Unrecognized => None,
    }
}

fn missing_argument(keyword: Keyword) -> String {
    format!("Missing argument. Usage: {}", keyword.usage())
}

/// A fresh session is created per invocation; nothing is reused across
/// messages.
async fn info_reply(substance: &str, api: &impl SessionApi) -> String {
    info!("📋 Fetching dose card for '{substance}'");

    let chat_id = match api.create_chat(substance).await {
        Ok(chat_id) => chat_id,
        Err(e) => {
            warn!("Failed to create chat session: {e}");
            return CHAT_ID_APOLOGY.to_string();
        }
    };

    match api.ask_dose_card(substance, &chat_id).await {
        Ok(answer) => answer,
        Err(e) => {
            warn!("Failed to fetch dose card: {e}");
            INFO_APOLOGY.to_string()
        }
    }
}

async fn ask_reply(query: &str, api: &impl SessionApi) -> String {
    info!("💬 Answering freeform question");

    let chat_id = match api.create_chat(query).await {
        Ok(chat_id) => chat_id,
        Err(e) => {
            warn!("Failed to create chat session: {e}");
            return CHAT_ID_APOLOGY.to_string();
        }
    };

    match api.ask_question(query, &chat_id).await {
        Ok(answer) => answer,
        Err(e) => {
            warn!("Failed to fetch answer: {e}");
            INFO_APOLOGY.to_string()
        }
    }
}
