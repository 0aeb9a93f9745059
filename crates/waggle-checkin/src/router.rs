// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Free-text intent routing for direct messages.
//!
//! Matching is keyword containment on the lowercased text, checked in
//! priority order. Anything unrecognized starts a check-in, which keeps
//! the bot useful even when the user just says "hi".

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Help,
    OptOut,
    OptIn,
    Restart,
    StartCheckin,
}

pub fn route(text: &str) -> Intent {
    let text = text.to_lowercase();
    // "opt out" must be checked before "opt in": "opt out" does not
    // contain "opt in", but explicit ordering keeps the priority obvious.
    if text.contains("help") || text.contains("what") {
        Intent::Help
    } else if text.contains("opt out") || text.contains("optout") {
        Intent::OptOut
    } else if text.contains("opt in") || text.contains("optin") {
        Intent::OptIn
    } else if text.contains("restart") {
        Intent::Restart
    } else {
        Intent::StartCheckin
    }
}
