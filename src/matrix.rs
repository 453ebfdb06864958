//! Matrix client-server API transport.
//!
//! Covers the three calls the bot needs: password login, the long-polling
//! /sync loop, and sending an m.text message into a room.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub struct MatrixClient {
    homeserver: String,
    access_token: String,
    user_id: String,
    http: reqwest::Client,
    txn_counter: AtomicU64,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    identifier: LoginIdentifier<'a>,
    password: &'a str,
}

#[derive(Serialize)]
struct LoginIdentifier<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    user: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    user_id: String,
    access_token: String,
}

#[derive(Deserialize)]
struct SyncResponse {
    next_batch: String,
    #[serde(default)]
    rooms: Rooms,
}

#[derive(Deserialize, Default)]
struct Rooms {
    #[serde(default)]
    join: HashMap<String, JoinedRoom>,
}

#[derive(Deserialize)]
struct JoinedRoom {
    #[serde(default)]
    timeline: Timeline,
}

#[derive(Deserialize, Default)]
struct Timeline {
    #[serde(default)]
    events: Vec<TimelineEvent>,
}

#[derive(Deserialize)]
struct TimelineEvent {
    #[serde(rename = "type")]
    kind: String,
    sender: String,
    #[serde(default)]
    content: EventContent,
}

#[derive(Deserialize, Default)]
struct EventContent {
    #[serde(default)]
    msgtype: String,
    #[serde(default)]
    body: String,
}

#[derive(Serialize)]
struct TextMessageContent<'a> {
    msgtype: &'static str,
    body: &'a str,
}

/// A text message received from a joined room.
#[derive(Debug, Clone)]
pub struct RoomMessage {
    pub room_id: String,
    pub sender: String,
    pub body: String,
}

/// One sync round: the messages it delivered plus the token to resume from.
pub struct SyncBatch {
    pub next_batch: String,
    pub messages: Vec<RoomMessage>,
}

impl MatrixClient {
    /// Authenticate against the homeserver with a password login.
    /// An unauthenticated client cannot exist.
    pub async fn login(homeserver: &str, user: &str, password: &str) -> Result<Self, Error> {
        let http = reqwest::Client::new();
        let request = LoginRequest {
            kind: "m.login.password",
            identifier: LoginIdentifier {
                kind: "m.id.user",
                user,
            },
            password,
        };

        let homeserver = homeserver.trim_end_matches('/').to_string();
        let response = http
            .post(format!("{homeserver}/_matrix/client/v3/login"))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!("{status}: {body}")));
        }

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        info!("✅ Logged in as {}", login.user_id);

        Ok(Self {
            homeserver,
            access_token: login.access_token,
            user_id: login.user_id,
            http,
            txn_counter: AtomicU64::new(0),
        })
    }

    /// The server-resolved user ID of the logged-in account.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Long-poll the homeserver for new events.
    pub async fn sync(&self, since: Option<&str>, timeout_ms: u64) -> Result<SyncBatch, Error> {
        let mut url = format!(
            "{}/_matrix/client/v3/sync?timeout={timeout_ms}",
            self.homeserver
        );
        if let Some(token) = since {
            url.push_str("&since=");
            url.push_str(&urlencoding::encode(token));
        }

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!("{status}: {body}")));
        }

        let sync: SyncResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        Ok(extract_messages(sync))
    }

    /// Send a plain-text message into a room.
    pub async fn send_text(&self, room_id: &str, body: &str) -> Result<(), Error> {
        let url = format!(
            "{}/_matrix/client/v3/rooms/{}/send/m.room.message/{}",
            self.homeserver,
            urlencoding::encode(room_id),
            self.next_txn_id()
        );
        let content = TextMessageContent {
            msgtype: "m.text",
            body,
        };

        let response = self
            .http
            .put(&url)
            .bearer_auth(&self.access_token)
            .json(&content)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!("{status}: {body}")));
        }

        debug!("Sent message to {room_id}");
        Ok(())
    }

    /// Transaction IDs must be unique per access token; timestamp plus a
    /// process-local counter covers restarts within the same millisecond.
    fn next_txn_id(&self) -> String {
        let seq = self.txn_counter.fetch_add(1, Ordering::Relaxed);
        format!("psyai-{}-{}", chrono::Utc::now().timestamp_millis(), seq)
    }
}

/// Flatten a sync response into the text messages of all joined rooms.
fn extract_messages(sync: SyncResponse) -> SyncBatch {
    let mut messages = Vec::new();
    for (room_id, room) in sync.rooms.join {
        for event in room.timeline.events {
            if event.kind == "m.room.message" && event.content.msgtype == "m.text" {
                messages.push(RoomMessage {
                    room_id: room_id.clone(),
                    sender: event.sender,
                    body: event.content.body,
                });
            }
        }
    }
    SyncBatch {
        next_batch: sync.next_batch,
        messages,
    }
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
