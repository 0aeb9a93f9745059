// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory channel adapter double.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Notify;
use waggle_core::{
    AdapterType, ChannelAdapter, HealthStatus, InboundEvent, MessageId, OutboundMessage,
    PluginAdapter, UserId, WaggleError,
};

/// A scriptable [`ChannelAdapter`] that records every outbound message and
/// replays queued inbound events.
#[derive(Default)]
pub struct MockChannel {
    sent: Mutex<Vec<OutboundMessage>>,
    inbound: Mutex<VecDeque<InboundEvent>>,
    inbound_ready: Notify,
    members: Mutex<Vec<UserId>>,
    failing: Mutex<HashSet<String>>,
    counter: AtomicU64,
}

impl MockChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an inbound event for [`ChannelAdapter::next_event`].
    pub fn push_event(&self, event: InboundEvent) {
        self.inbound.lock().unwrap().push_back(event);
        self.inbound_ready.notify_one();
    }

    /// Every message sent so far, in order.
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Messages sent to one user, in order.
    pub fn sent_to(&self, user: &UserId) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|message| &message.user == user)
            .cloned()
            .collect()
    }

    pub fn clear_sent(&self) {
        self.sent.lock().unwrap().clear();
    }

    /// Make [`ChannelAdapter::send`] fail for this user.
    pub fn fail_sends_to(&self, user: &UserId) {
        self.failing.lock().unwrap().insert(user.0.clone());
    }

    pub fn set_members(&self, members: Vec<UserId>) {
        *self.members.lock().unwrap() = members;
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 0, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, WaggleError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), WaggleError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    async fn connect(&mut self) -> Result<(), WaggleError> {
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, WaggleError> {
        if self.failing.lock().unwrap().contains(&msg.user.0) {
            return Err(WaggleError::Channel {
                message: format!("scripted send failure for {}", msg.user),
                source: None,
            });
        }
        self.sent.lock().unwrap().push(msg);
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        Ok(MessageId(format!("mock-{n}")))
    }

    async fn next_event(&self) -> Result<InboundEvent, WaggleError> {
        loop {
            if let Some(event) = self.inbound.lock().unwrap().pop_front() {
                return Ok(event);
            }
            self.inbound_ready.notified().await;
        }
    }

    async fn list_members(&self) -> Result<Vec<UserId>, WaggleError> {
        Ok(self.members.lock().unwrap().clone())
    }
}
