// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Minimal Slack Web API client.
//!
//! Covers the three calls Waggle makes: `chat.postMessage`,
//! `conversations.members`, and `auth.test`. The base URL is injectable
//! so tests can point it at a local mock server.

use serde::Deserialize;
use waggle_core::{MessageId, OutboundMessage, UserId, WaggleError};

const DEFAULT_BASE_URL: &str = "https://slack.com/api";

#[derive(Clone)]
pub struct SlackClient {
    http: reqwest::Client,
    token: String,
    base_url: String,
}

impl std::fmt::Debug for SlackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackClient")
            .field("token", &"[redacted]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    ts: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MembersResponse {
    ok: bool,
    #[serde(default)]
    members: Vec<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

#[derive(Debug, Deserialize)]
struct AuthTestResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl SlackClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn api_error(call: &str, detail: impl std::fmt::Display) -> WaggleError {
        WaggleError::Channel {
            message: format!("Slack {call} failed: {detail}"),
            source: None,
        }
    }

    fn transport_error(call: &str, error: reqwest::Error) -> WaggleError {
        WaggleError::Channel {
            message: format!("Slack {call} transport error: {error}"),
            source: Some(Box::new(error)),
        }
    }

    /// Post a direct message. The recipient user id doubles as the
    /// channel for DMs.
    pub async fn post_message(&self, msg: &OutboundMessage) -> Result<MessageId, WaggleError> {
        let mut body = serde_json::json!({
            "channel": msg.user.0,
            "text": msg.text,
        });
        if let Some(blocks) = &msg.blocks {
            body["blocks"] = blocks.clone();
        }

        let response: PostMessageResponse = self
            .http
            .post(format!("{}/chat.postMessage", self.base_url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::transport_error("chat.postMessage", e))?
            .json()
            .await
            .map_err(|e| Self::transport_error("chat.postMessage", e))?;

        if !response.ok {
            return Err(Self::api_error(
                "chat.postMessage",
                response.error.as_deref().unwrap_or("unknown error"),
            ));
        }
        Ok(MessageId(response.ts.unwrap_or_default()))
    }

    /// List all members of a channel, following cursor pagination.
    pub async fn conversation_members(
        &self,
        channel: &str,
    ) -> Result<Vec<UserId>, WaggleError> {
        let mut members = Vec::new();
        let mut cursor = String::new();

        loop {
            let mut request = self
                .http
                .get(format!("{}/conversations.members", self.base_url))
                .bearer_auth(&self.token)
                .query(&[("channel", channel), ("limit", "200")]);
            if !cursor.is_empty() {
                request = request.query(&[("cursor", cursor.as_str())]);
            }

            let response: MembersResponse = request
                .send()
                .await
                .map_err(|e| Self::transport_error("conversations.members", e))?
                .json()
                .await
                .map_err(|e| Self::transport_error("conversations.members", e))?;

            if !response.ok {
                return Err(Self::api_error(
                    "conversations.members",
                    response.error.as_deref().unwrap_or("unknown error"),
                ));
            }
            members.extend(response.members.into_iter().map(UserId));

            cursor = response
                .response_metadata
                .map(|meta| meta.next_cursor)
                .unwrap_or_default();
            if cursor.is_empty() {
                break;
            }
        }
        Ok(members)
    }

    /// Token sanity check, used by the adapter health check.
    pub async fn auth_test(&self) -> Result<(), WaggleError> {
        let response: AuthTestResponse = self
            .http
            .post(format!("{}/auth.test", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Self::transport_error("auth.test", e))?
            .json()
            .await
            .map_err(|e| Self::transport_error("auth.test", e))?;

        if !response.ok {
            return Err(Self::api_error(
                "auth.test",
                response.error.as_deref().unwrap_or("unknown error"),
            ));
        }
        Ok(())
    }
}
