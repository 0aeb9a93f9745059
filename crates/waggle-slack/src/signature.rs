// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slack request signature verification (signing secret scheme, v0).
//!
//! The signature is `v0=` followed by the hex HMAC-SHA256 of
//! `"v0:{timestamp}:{body}"` under the app's signing secret. Requests
//! older than five minutes are rejected to limit replay.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const VERSION: &str = "v0";
const MAX_SKEW_SECS: i64 = 300;

/// Compute the expected signature header value for a request body.
pub fn compute(signing_secret: &str, timestamp: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    format!("{VERSION}={}", hex::encode(mac.finalize().into_bytes()))
}

/// Verify a request against the current clock.
pub fn verify(signing_secret: &str, timestamp: &str, body: &[u8], provided: &str) -> bool {
    verify_at(
        signing_secret,
        timestamp,
        body,
        provided,
        chrono::Utc::now().timestamp(),
    )
}

/// Verify with an explicit "now" for testability.
pub fn verify_at(
    signing_secret: &str,
    timestamp: &str,
    body: &[u8],
    provided: &str,
    now_unix: i64,
) -> bool {
    let Ok(request_time) = timestamp.parse::<i64>() else {
        return false;
    };
    if (now_unix - request_time).abs() > MAX_SKEW_SECS {
        return false;
    }
    let Some(sig_hex) = provided.strip_prefix("v0=") else {
        return false;
    };
    let Ok(sig_bytes) = hex::decode(sig_hex) else {
        return false;
    };

    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    // verify_slice is constant-time.
    mac.verify_slice(&sig_bytes).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";

    #[test]
    fn computed_signature_verifies() {
        let body = b"payload=%7B%22type%22%3A%22block_actions%22%7D";
        let timestamp = "1700000000";
        let signature = compute(SECRET, timestamp, body);
        assert!(signature.starts_with("v0="));
        assert!(verify_at(SECRET, timestamp, body, &signature, 1_700_000_010));
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let body = b"{}";
        let timestamp = "1700000000";
        let signature = compute(SECRET, timestamp, body);
        assert!(!verify_at(SECRET, timestamp, body, &signature, 1_700_000_000 + 301));
        assert!(!verify_at(SECRET, timestamp, body, &signature, 1_700_000_000 - 301));
    }

    #[test]
    fn wrong_secret_or_body_is_rejected() {
        let body = b"{}";
        let timestamp = "1700000000";
        let signature = compute(SECRET, timestamp, body);
        assert!(!verify_at("other-secret", timestamp, body, &signature, 1_700_000_000));
        assert!(!verify_at(SECRET, timestamp, b"{} ", &signature, 1_700_000_000));
    }

    #[test]
    fn malformed_header_is_rejected() {
        assert!(!verify_at(SECRET, "not-a-number", b"{}", "v0=00", 0));
        assert!(!verify_at(SECRET, "1700000000", b"{}", "v1=00", 1_700_000_000));
        assert!(!verify_at(SECRET, "1700000000", b"{}", "v0=zz", 1_700_000_000));
    }
}
