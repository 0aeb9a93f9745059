// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Slack [`ChannelAdapter`] implementation.
//!
//! Outbound messages go through the Web API client; inbound events are
//! produced by the webhook server and drained via an mpsc channel.

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use waggle_config::model::SlackConfig;
use waggle_core::{
    AdapterType, ChannelAdapter, HealthStatus, InboundEvent, MessageId, OutboundMessage,
    PluginAdapter, UserId, WaggleError,
};

use crate::client::SlackClient;
use crate::server::{self, ServerState};

const EVENT_QUEUE_DEPTH: usize = 256;

pub struct SlackChannel {
    config: SlackConfig,
    client: SlackClient,
    inbound_tx: mpsc::Sender<InboundEvent>,
    inbound_rx: Mutex<mpsc::Receiver<InboundEvent>>,
    server_task: Mutex<Option<JoinHandle<()>>>,
}

impl SlackChannel {
    /// Build the adapter. Requires a bot token; the webhook server is
    /// not started until [`ChannelAdapter::connect`].
    pub fn new(config: SlackConfig) -> Result<Self, WaggleError> {
        let token = config.bot_token.clone().ok_or_else(|| {
            WaggleError::Config("slack.bot_token is required to use the Slack adapter".into())
        })?;
        let (inbound_tx, inbound_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        Ok(Self {
            config,
            client: SlackClient::new(token),
            inbound_tx,
            inbound_rx: Mutex::new(inbound_rx),
            server_task: Mutex::new(None),
        })
    }

    pub fn client(&self) -> &SlackClient {
        &self.client
    }
}

#[async_trait]
impl PluginAdapter for SlackChannel {
    fn name(&self) -> &str {
        "slack"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, WaggleError> {
        match self.client.auth_test().await {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(error) => Ok(HealthStatus::Unhealthy(error.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), WaggleError> {
        if let Some(task) = self.server_task.lock().await.take() {
            task.abort();
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for SlackChannel {
    async fn connect(&mut self) -> Result<(), WaggleError> {
        let signing_secret = self.config.signing_secret.clone().ok_or_else(|| {
            WaggleError::Config(
                "slack.signing_secret is required to receive Slack events".into(),
            )
        })?;

        let state = ServerState::new(self.inbound_tx.clone());
        let (_, task) = server::bind_and_serve(
            &self.config.listen_address,
            self.config.listen_port,
            signing_secret,
            state,
        )
        .await?;
        *self.server_task.lock().await = Some(task);
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, WaggleError> {
        self.client.post_message(&msg).await
    }

    async fn next_event(&self) -> Result<InboundEvent, WaggleError> {
        self.inbound_rx
            .lock()
            .await
            .recv()
            .await
            .ok_or_else(|| WaggleError::Channel {
                message: "inbound event channel closed".into(),
                source: None,
            })
    }

    async fn list_members(&self) -> Result<Vec<UserId>, WaggleError> {
        let channel = self.config.channel_id.as_deref().ok_or_else(|| {
            WaggleError::Config(
                "slack.channel_id is required for channel-scoped audiences".into(),
            )
        })?;
        self.client.conversation_members(channel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SlackConfig {
        SlackConfig {
            bot_token: Some("xoxb-test".into()),
            signing_secret: Some("secret".into()),
            channel_id: None,
            listen_address: "127.0.0.1".into(),
            listen_port: 0,
        }
    }

    #[test]
    fn new_requires_a_bot_token() {
        let mut missing = config();
        missing.bot_token = None;
        assert!(SlackChannel::new(missing).is_err());
        assert!(SlackChannel::new(config()).is_ok());
    }

    #[tokio::test]
    async fn connect_requires_a_signing_secret() {
        let mut missing = config();
        missing.signing_secret = None;
        let mut adapter = SlackChannel::new(missing).unwrap();
        assert!(adapter.connect().await.is_err());
    }

    #[tokio::test]
    async fn list_members_requires_a_channel_id() {
        let adapter = SlackChannel::new(config()).unwrap();
        assert!(adapter.list_members().await.is_err());
    }

    #[tokio::test]
    async fn connect_and_shutdown_lifecycle() {
        let mut adapter = SlackChannel::new(config()).unwrap();
        adapter.connect().await.unwrap();
        assert!(adapter.server_task.lock().await.is_some());
        adapter.shutdown().await.unwrap();
        assert!(adapter.server_task.lock().await.is_none());
    }
}
