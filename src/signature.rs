//! Request signing for the streaming completion endpoint.
//!
//! Every completion request carries an `x-signature` header derived from a
//! canonical payload summary, the user's literal prompt text, and a
//! millisecond timestamp. The key rotates on fixed 5-minute windows, so the
//! same inputs produce the same signature only within one window.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::constants::{SIGNATURE_SECRET, SIGNATURE_WINDOW_MS};

type HmacSha256 = Hmac<Sha256>;

/// Computes hex-encoded HMAC-SHA256 of `message` under `key`.
fn hmac_hex(key: &[u8], message: &[u8]) -> String {
    // HMAC accepts keys of any length, so new_from_slice cannot fail.
    let mut mac =
        HmacSha256::new_from_slice(key).expect("HMAC key of any length is accepted");
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

/// Base64-encodes `action` the way a browser `btoa` sees it.
///
/// The remote counterpart runs `btoa` over the raw UTF-8 bytes of the prompt,
/// treating each byte as a single-byte code point. Encoding the bytes
/// directly reproduces that result, including the mangled output for
/// non-ASCII prompts. Do not "fix" this; the server computes the same thing.
fn encode_action(action: &str) -> String {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    STANDARD.encode(action.as_bytes())
}

/// Derives the signature for one completion request.
///
/// `payload_summary` is the canonical `requestId,..,timestamp,..,user_id,..`
/// string, `action` is the literal prompt text, and `timestamp_ms` is the
/// request timestamp in milliseconds. The timestamp selects the 5-minute key
/// window and is also part of the signed payload, so identical inputs yield
/// identical signatures and any change to the window changes the key.
pub fn sign(payload_summary: &str, action: &str, timestamp_ms: i64) -> String {
    let window = timestamp_ms / SIGNATURE_WINDOW_MS;
    let window_key = hmac_hex(SIGNATURE_SECRET.as_bytes(), window.to_string().as_bytes());
    let payload = format!(
        "{}|{}|{}",
        payload_summary,
        encode_action(action),
        timestamp_ms
    );
    hmac_hex(window_key.as_bytes(), payload.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUMMARY: &str = "requestId,req-1,timestamp,1700000000000,user_id,u-1";

    #[test]
    fn deterministic_for_identical_inputs() {
        let ts = 1_700_000_000_000;
        let a = sign(SUMMARY, "list files", ts);
        let b = sign(SUMMARY, "list files", ts);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn changes_across_window_boundary() {
        let ts = 1_700_000_000_000;
        let same_window = sign(SUMMARY, "hello", ts);
        // Same window index, same inputs -> same signature.
        assert_eq!(same_window, sign(SUMMARY, "hello", ts));
        // One full window later the derived key differs.
        let next_window = sign(SUMMARY, "hello", ts + SIGNATURE_WINDOW_MS);
        assert_ne!(same_window, next_window);
    }

    #[test]
    fn action_and_summary_are_both_signed() {
        let ts = 1_700_000_000_000;
        assert_ne!(sign(SUMMARY, "a", ts), sign(SUMMARY, "b", ts));
        assert_ne!(
            sign(SUMMARY, "a", ts),
            sign("requestId,req-2,timestamp,1700000000000,user_id,u-1", "a", ts)
        );
    }

    #[test]
    fn encode_action_uses_raw_utf8_bytes() {
        assert_eq!(encode_action("hello"), "aGVsbG8=");
        // "é" is C3 A9 in UTF-8; btoa over those bytes yields "w6k=".
        assert_eq!(encode_action("é"), "w6k=");
        assert_eq!(encode_action(""), "");
    }

    #[test]
    fn non_ascii_actions_sign_without_panicking() {
        let ts = 1_700_000_000_000;
        let sig = sign(SUMMARY, "日本語のプロンプト", ts);
        assert_eq!(sig.len(), 64);
    }
}
