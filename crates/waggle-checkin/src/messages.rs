// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound message templates. Every prompt the engine sends is built
//! here so the interaction surface can be reviewed in one place.
//!
//! Block payloads follow Slack Block Kit. Action and block ids are part
//! of the wire contract with the interactivity webhook and must stay in
//! sync with `waggle-slack`.

use serde_json::json;
use waggle_core::{OutboundMessage, UserId};

use crate::catalog::{CATEGORIES, TOOLS};

pub const ACTION_YES: &str = "weekly_checkin_yes";
pub const ACTION_NO: &str = "weekly_checkin_no";
pub const ACTION_CATEGORIES: &str = "categories_checkboxes";
pub const ACTION_CATEGORIES_NEXT: &str = "categories_next";
pub const ACTION_TOOLS: &str = "tools_checkboxes";
pub const ACTION_TOOLS_NEXT: &str = "tools_next";
pub const ACTION_DETAILS_SUBMIT: &str = "custom_details_submit";
pub const ACTION_DETAILS_SKIP: &str = "custom_details_skip";

pub const BLOCK_OTHER_TOOL: &str = "other_tool_input";
pub const ACTION_OTHER_TOOL: &str = "other_tool_name";
pub const BLOCK_DETAILS: &str = "custom_details";
pub const ACTION_DETAILS_INPUT: &str = "input";

const CHECKIN_TITLE: &str = "🐝 Waggle Weekly Check-in";
const CHECKIN_DESCRIPTION: &str =
    "Hey there! It's time for your weekly AI check-in. Have you played with AI this week?";
const AI_DEFINITION: &str = "Playing with AI means experimenting with AI tools, building \
     something using AI, exploring new AI features, or learning about AI concepts. It could be \
     as simple as trying a new prompt or as complex as building an AI-powered application!";

fn greeting(display_name: Option<&str>) -> String {
    match display_name {
        Some(name) => format!("Hey {name}!"),
        None => "Hey there!".to_string(),
    }
}

/// Opening prompt with the yes/no buttons.
pub fn participation_prompt(user: &UserId, display_name: Option<&str>) -> OutboundMessage {
    let greeting = greeting(display_name);
    let blocks = json!([
        {
            "type": "header",
            "text": { "type": "plain_text", "text": CHECKIN_TITLE }
        },
        {
            "type": "section",
            "text": { "type": "mrkdwn", "text": format!("{greeting} {CHECKIN_DESCRIPTION}") }
        },
        {
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": format!("*What does \"playing with AI\" mean?*\n{AI_DEFINITION}")
            }
        },
        {
            "type": "actions",
            "elements": [
                {
                    "type": "button",
                    "text": { "type": "plain_text", "text": "Yes, I played with AI! 🎉" },
                    "style": "primary",
                    "action_id": ACTION_YES
                },
                {
                    "type": "button",
                    "text": { "type": "plain_text", "text": "Not this week 😔" },
                    "action_id": ACTION_NO
                }
            ]
        }
    ]);
    OutboundMessage::with_blocks(user.clone(), CHECKIN_DESCRIPTION, blocks)
}

/// Mid-week nudge for users who have not answered yet.
pub fn reminder_prompt(user: &UserId, display_name: Option<&str>) -> OutboundMessage {
    let greeting = greeting(display_name);
    let blocks = json!([
        {
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": format!(
                    "{greeting} Just a friendly reminder that we haven't heard from you yet \
                     this week about your AI adventures! 🐝"
                )
            }
        },
        {
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": "Even if you didn't experiment with AI this week, we'd love to hear \
                         from you. You can respond with `/waggle` to get started!"
            }
        },
        {
            "type": "actions",
            "elements": [
                {
                    "type": "button",
                    "text": { "type": "plain_text", "text": "Take Check-in Now 🚀" },
                    "style": "primary",
                    "action_id": ACTION_YES
                },
                {
                    "type": "button",
                    "text": { "type": "plain_text", "text": "Not this week" },
                    "action_id": ACTION_NO
                }
            ]
        }
    ]);
    OutboundMessage::with_blocks(
        user.clone(),
        "Just a friendly reminder about your weekly AI check-in!",
        blocks,
    )
}

pub fn category_prompt(user: &UserId) -> OutboundMessage {
    let options: Vec<_> = CATEGORIES
        .iter()
        .map(|category| {
            json!({
                "text": {
                    "type": "plain_text",
                    "text": format!("{} {}", category.emoji, category.name)
                },
                "value": category.id
            })
        })
        .collect();
    let description =
        "Great! Let's capture what you explored. What category best describes your AI activity?";
    let blocks = json!([
        {
            "type": "header",
            "text": { "type": "plain_text", "text": "What did you work on?" }
        },
        {
            "type": "section",
            "text": { "type": "mrkdwn", "text": description }
        },
        {
            "type": "section",
            "text": { "type": "mrkdwn", "text": "Select all categories that apply:" },
            "accessory": {
                "type": "checkboxes",
                "options": options,
                "action_id": ACTION_CATEGORIES
            }
        },
        {
            "type": "actions",
            "elements": [
                {
                    "type": "button",
                    "text": { "type": "plain_text", "text": "Next ➡️" },
                    "style": "primary",
                    "action_id": ACTION_CATEGORIES_NEXT
                }
            ]
        }
    ]);
    OutboundMessage::with_blocks(user.clone(), description, blocks)
}

pub fn tool_prompt(user: &UserId) -> OutboundMessage {
    let options: Vec<_> = TOOLS
        .iter()
        .map(|tool| {
            json!({
                "text": {
                    "type": "plain_text",
                    "text": format!("{} {}", tool.emoji, tool.name)
                },
                "value": tool.id
            })
        })
        .collect();
    let description =
        "Which AI tools or platforms did you experiment with? (You can select multiple)";
    let blocks = json!([
        {
            "type": "header",
            "text": { "type": "plain_text", "text": "Which tools did you use?" }
        },
        {
            "type": "section",
            "text": { "type": "mrkdwn", "text": description }
        },
        {
            "type": "section",
            "text": { "type": "mrkdwn", "text": "Select all tools you used:" },
            "accessory": {
                "type": "checkboxes",
                "options": options,
                "action_id": ACTION_TOOLS
            }
        },
        {
            "type": "input",
            "block_id": BLOCK_OTHER_TOOL,
            "optional": true,
            "element": {
                "type": "plain_text_input",
                "action_id": ACTION_OTHER_TOOL,
                "placeholder": {
                    "type": "plain_text",
                    "text": "If you selected 'Other Tool', please specify which one..."
                }
            },
            "label": { "type": "plain_text", "text": "Other Tool Name (optional)" }
        },
        {
            "type": "actions",
            "elements": [
                {
                    "type": "button",
                    "text": { "type": "plain_text", "text": "Next ➡️" },
                    "style": "primary",
                    "action_id": ACTION_TOOLS_NEXT
                }
            ]
        }
    ]);
    OutboundMessage::with_blocks(user.clone(), description, blocks)
}

pub fn details_prompt(user: &UserId) -> OutboundMessage {
    let description = "Feel free to share more details about what you built, learned, or \
                       discovered. This helps inspire others in the community!";
    let blocks = json!([
        {
            "type": "header",
            "text": { "type": "plain_text", "text": "Tell us more! (Optional)" }
        },
        {
            "type": "section",
            "text": { "type": "mrkdwn", "text": description }
        },
        {
            "type": "input",
            "block_id": BLOCK_DETAILS,
            "element": {
                "type": "plain_text_input",
                "action_id": ACTION_DETAILS_INPUT,
                "multiline": true,
                "placeholder": {
                    "type": "plain_text",
                    "text": "Tell us about your AI adventure..."
                }
            },
            "label": { "type": "plain_text", "text": "Details" }
        },
        {
            "type": "actions",
            "elements": [
                {
                    "type": "button",
                    "text": { "type": "plain_text", "text": "Submit 🚀" },
                    "style": "primary",
                    "action_id": ACTION_DETAILS_SUBMIT
                },
                {
                    "type": "button",
                    "text": { "type": "plain_text", "text": "Skip" },
                    "action_id": ACTION_DETAILS_SKIP
                }
            ]
        }
    ]);
    OutboundMessage::with_blocks(user.clone(), description, blocks)
}

pub fn thank_you(user: &UserId) -> OutboundMessage {
    let text = "Your AI adventure has been recorded in the hive. Keep exploring and inspiring \
                others!";
    let blocks = json!([
        {
            "type": "section",
            "text": { "type": "mrkdwn", "text": text }
        }
    ]);
    OutboundMessage::with_blocks(user.clone(), text, blocks)
}

pub fn no_response_ack(user: &UserId) -> OutboundMessage {
    OutboundMessage::text(
        user.clone(),
        "That's totally fine! We'll check in again next week. Feel free to reach out if you \
         have any questions about AI tools or want to explore something specific.",
    )
}

pub fn session_expired(user: &UserId) -> OutboundMessage {
    OutboundMessage::text(
        user.clone(),
        "Your session has expired. Please use /waggle to start a new check-in.",
    )
}

pub fn select_category_warning(user: &UserId) -> OutboundMessage {
    OutboundMessage::text(user.clone(), "Please select at least one category before continuing.")
}

pub fn select_tool_warning(user: &UserId) -> OutboundMessage {
    OutboundMessage::text(user.clone(), "Please select at least one tool before continuing.")
}

pub fn opted_out_notice(user: &UserId) -> OutboundMessage {
    OutboundMessage::text(
        user.clone(),
        "You've opted out of weekly check-ins. Reply with \"opt in\" if you'd like to start \
         receiving them again.",
    )
}

pub fn opt_out_confirmation(user: &UserId) -> OutboundMessage {
    OutboundMessage::text(
        user.clone(),
        "I've noted your opt-out request. You won't receive weekly check-ins anymore. Reply \
         with \"opt in\" if you'd like to opt back in.",
    )
}

pub fn opt_in_confirmation(user: &UserId) -> OutboundMessage {
    OutboundMessage::text(
        user.clone(),
        "Great! I've opted you back in to weekly check-ins. You'll receive your next check-in \
         on schedule.",
    )
}

pub fn generic_failure(user: &UserId) -> OutboundMessage {
    OutboundMessage::text(
        user.clone(),
        "Sorry, I encountered an error. Please try again or contact an admin if the problem \
         persists.",
    )
}

pub fn help(user: &UserId) -> OutboundMessage {
    let text = "🐝 *Waggle Help*\n\n\
        *What is Waggle?*\n\
        I'm a bot that helps track AI experimentation and engagement in our community. I send \
        weekly check-ins to see what AI tools you've been exploring.\n\n\
        *Available Commands:*\n\
        • `/waggle` - Manually trigger a weekly check-in\n\
        • `/waggle-help` - Show this help message\n\n\
        *How it works:*\n\
        1. I'll send you a weekly DM asking if you \"played with AI\"\n\
        2. If yes, you can select categories and tools you used\n\
        3. Optionally share details about what you built or learned\n\
        4. Your responses help build a knowledge base of community AI projects\n\n\
        *Privacy:*\n\
        • Your responses are stored securely\n\
        • You can opt out anytime by replying \"opt out\"\n\
        • Admins can see aggregated analytics\n\n\
        *Need help?*\n\
        Contact an admin or reply with \"help\" to this message.";
    OutboundMessage::text(user.clone(), text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserId {
        UserId("U123".into())
    }

    fn action_ids(message: &OutboundMessage) -> Vec<String> {
        let mut ids = Vec::new();
        fn walk(value: &serde_json::Value, ids: &mut Vec<String>) {
            match value {
                serde_json::Value::Object(map) => {
                    if let Some(id) = map.get("action_id").and_then(|v| v.as_str()) {
                        ids.push(id.to_string());
                    }
                    for nested in map.values() {
                        walk(nested, ids);
                    }
                }
                serde_json::Value::Array(items) => {
                    for item in items {
                        walk(item, ids);
                    }
                }
                _ => {}
            }
        }
        walk(message.blocks.as_ref().unwrap(), &mut ids);
        ids
    }

    #[test]
    fn participation_prompt_carries_yes_no_actions() {
        let message = participation_prompt(&user(), Some("Ada"));
        assert!(message.text.contains("weekly AI check-in"));
        let ids = action_ids(&message);
        assert!(ids.contains(&ACTION_YES.to_string()));
        assert!(ids.contains(&ACTION_NO.to_string()));
        let rendered = message.blocks.unwrap().to_string();
        assert!(rendered.contains("Hey Ada!"));
    }

    #[test]
    fn participation_prompt_without_name_uses_generic_greeting() {
        let message = participation_prompt(&user(), None);
        assert!(message.blocks.unwrap().to_string().contains("Hey there!"));
    }

    #[test]
    fn category_prompt_lists_every_category() {
        let message = category_prompt(&user());
        let rendered = message.blocks.unwrap().to_string();
        for category in CATEGORIES {
            assert!(rendered.contains(category.id), "missing {}", category.id);
        }
    }

    #[test]
    fn tool_prompt_includes_other_tool_input() {
        let message = tool_prompt(&user());
        let rendered = message.blocks.unwrap().to_string();
        assert!(rendered.contains(BLOCK_OTHER_TOOL));
        assert!(rendered.contains(ACTION_OTHER_TOOL));
        for tool in TOOLS {
            assert!(rendered.contains(tool.id), "missing {}", tool.id);
        }
    }

    #[test]
    fn details_prompt_offers_submit_and_skip() {
        let ids = action_ids(&details_prompt(&user()));
        assert!(ids.contains(&ACTION_DETAILS_SUBMIT.to_string()));
        assert!(ids.contains(&ACTION_DETAILS_SKIP.to_string()));
    }
}
