// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire models for the Slack Events API and interactivity payloads,
//! and their mapping onto [`InboundEvent`].
//!
//! Only the fields Waggle consumes are modelled; everything else in the
//! payloads is ignored by serde.

use serde::Deserialize;
use waggle_core::{ActionEvent, EventKind, InboundEvent, UserId};

/// Outer envelope of an Events API POST.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventEnvelope {
    UrlVerification {
        challenge: String,
    },
    EventCallback {
        event_id: String,
        event: CallbackEvent,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CallbackEvent {
    Message(MessageEvent),
    AppMention {
        user: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct MessageEvent {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub channel_type: Option<String>,
    /// Present when the sender is a bot; those messages are dropped.
    #[serde(default)]
    pub bot_id: Option<String>,
    /// Present for edits, joins, and other non-plain messages.
    #[serde(default)]
    pub subtype: Option<String>,
}

/// Interactive component ids the bot understands.
///
/// These strings are the wire contract with the Block Kit payloads built
/// in `waggle-checkin::messages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString)]
pub enum ActionId {
    #[strum(serialize = "weekly_checkin_yes")]
    ParticipationYes,
    #[strum(serialize = "weekly_checkin_no")]
    ParticipationNo,
    #[strum(serialize = "categories_checkboxes")]
    Categories,
    #[strum(serialize = "categories_next")]
    CategoriesNext,
    #[strum(serialize = "tools_checkboxes")]
    Tools,
    #[strum(serialize = "tools_next")]
    ToolsNext,
    #[strum(serialize = "custom_details_submit")]
    DetailsSubmit,
    #[strum(serialize = "custom_details_skip")]
    DetailsSkip,
}

/// A `block_actions` interactivity payload.
#[derive(Debug, Deserialize)]
pub struct InteractionPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub user: InteractionUser,
    #[serde(default)]
    pub actions: Vec<InteractionAction>,
    #[serde(default)]
    pub state: Option<InteractionState>,
    #[serde(default)]
    pub trigger_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InteractionUser {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InteractionAction {
    pub action_id: String,
    #[serde(default)]
    pub selected_options: Option<Vec<SelectedOption>>,
}

#[derive(Debug, Deserialize)]
pub struct SelectedOption {
    pub value: String,
}

/// `state.values` keeps the full current input state of the message,
/// keyed by block id then action id. Kept as raw JSON and probed by path.
#[derive(Debug, Deserialize)]
pub struct InteractionState {
    #[serde(default)]
    pub values: serde_json::Value,
}

/// A slash command POST (form-encoded).
#[derive(Debug, Deserialize)]
pub struct SlashCommand {
    pub command: String,
    #[serde(default)]
    pub text: String,
    pub user_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub trigger_id: Option<String>,
}

/// Map an Events API callback onto an engine event.
///
/// Returns `None` for event types the bot ignores: channel chatter,
/// bot echoes of its own messages, and message subtypes like edits.
pub fn callback_to_event(event_id: String, event: CallbackEvent) -> Option<InboundEvent> {
    match event {
        CallbackEvent::Message(message) => {
            if message.channel_type.as_deref() != Some("im") {
                return None;
            }
            if message.bot_id.is_some() || message.subtype.is_some() {
                return None;
            }
            let user = message.user?;
            Some(InboundEvent {
                id: event_id,
                user: UserId(user),
                display_name: None,
                kind: EventKind::Message(message.text.unwrap_or_default()),
            })
        }
        // A mention in a channel gets the help blurb via DM.
        CallbackEvent::AppMention { user } => Some(InboundEvent {
            id: event_id,
            user: UserId(user),
            display_name: None,
            kind: EventKind::Command {
                name: "help".to_string(),
                text: String::new(),
            },
        }),
        CallbackEvent::Other => None,
    }
}

/// Map a `block_actions` payload onto an engine event.
pub fn interaction_to_event(payload: InteractionPayload) -> Option<InboundEvent> {
    if payload.kind != "block_actions" {
        return None;
    }
    let action = payload.actions.first()?;
    let action_id: ActionId = action.action_id.parse().ok()?;

    let selection = |action: &InteractionAction| -> Vec<String> {
        action
            .selected_options
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|option| option.value.clone())
            .collect()
    };
    let state_value = |block: &str, action_id: &str| -> Option<String> {
        payload
            .state
            .as_ref()?
            .values
            .get(block)?
            .get(action_id)?
            .get("value")?
            .as_str()
            .map(str::to_string)
    };

    let action_event = match action_id {
        ActionId::ParticipationYes => ActionEvent::ParticipationYes,
        ActionId::ParticipationNo => ActionEvent::ParticipationNo,
        ActionId::Categories => ActionEvent::CategoriesSelected(selection(action)),
        ActionId::CategoriesNext => ActionEvent::CategoriesNext,
        ActionId::Tools => ActionEvent::ToolsSelected(selection(action)),
        ActionId::ToolsNext => ActionEvent::ToolsNext {
            other_tool: state_value("other_tool_input", "other_tool_name"),
        },
        ActionId::DetailsSubmit => {
            ActionEvent::DetailsSubmit(state_value("custom_details", "input"))
        }
        ActionId::DetailsSkip => ActionEvent::DetailsSkip,
    };

    // block_actions payloads carry no event_id; the trigger_id is unique
    // per interaction and serves the same de-dup purpose.
    let id = payload
        .trigger_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let display_name = payload.user.name.or(payload.user.username);

    Some(InboundEvent {
        id,
        user: UserId(payload.user.id),
        display_name,
        kind: EventKind::Action(action_event),
    })
}

/// Map a slash command onto an engine event.
pub fn command_to_event(command: SlashCommand) -> InboundEvent {
    let name = command
        .command
        .trim_start_matches('/')
        .to_string();
    let id = command
        .trigger_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    InboundEvent {
        id,
        user: UserId(command.user_id),
        display_name: command.user_name,
        kind: EventKind::Command {
            name,
            text: command.text,
        },
    }
}
