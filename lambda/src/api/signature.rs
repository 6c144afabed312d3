use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::error;

/// Requests older than this are rejected as replays.
const MAX_REQUEST_AGE_SECS: u64 = 300;
/// Tolerated clock skew for timestamps in the future.
const MAX_CLOCK_SKEW_SECS: u64 = 60;

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

/// Verify `X-Slack-Signature` against the current time.
pub fn verify_slack_signature(
    request_body: &str,
    timestamp: &str,
    signature: &str,
    signing_secret: &str,
) -> bool {
    verify_slack_signature_at(request_body, timestamp, signature, signing_secret, now_secs())
}

/// Verify a signature as of `now` (seconds since the epoch).
pub fn verify_slack_signature_at(
    request_body: &str,
    timestamp: &str,
    signature: &str,
    signing_secret: &str,
    now: u64,
) -> bool {
    let Ok(ts) = timestamp.parse::<u64>() else {
        error!("Invalid request timestamp: '{}'", timestamp);
        return false;
    };
    if now.saturating_sub(ts) > MAX_REQUEST_AGE_SECS || ts > now + MAX_CLOCK_SKEW_SECS {
        error!("Timestamp out of range, potential replay attack");
        return false;
    }

    let Some(expected) = signature
        .strip_prefix("v0=")
        .and_then(|hex_sig| hex::decode(hex_sig).ok())
    else {
        error!("Malformed signature header");
        return false;
    };

    let mut mac = match Hmac::<Sha256>::new_from_slice(signing_secret.as_bytes()) {
        Ok(mac) => mac,
        Err(e) => {
            error!("Failed to create HMAC: {}", e);
            return false;
        }
    };
    mac.update(format!("v0:{timestamp}:{request_body}").as_bytes());

    if mac.verify_slice(&expected).is_ok() {
        true
    } else {
        error!("Signature verification failed");
        false
    }
}

pub fn compute_signature(timestamp: &str, request_body: &str, signing_secret: &str) -> String {
    let base_string = format!("v0:{timestamp}:{request_body}");
    let mut mac = match Hmac::<Sha256>::new_from_slice(signing_secret.as_bytes()) {
        Ok(mac) => mac,
        Err(e) => {
            error!("Failed to create HMAC: {}", e);
            return String::new();
        }
    };
    mac.update(base_string.as_bytes());
    format!("v0={}", hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";
    const NOW: u64 = 1_531_420_618;

    #[test]
    fn accepts_freshly_signed_body() {
        let body = "token=x&command=%2Fsummarize&text=42";
        let ts = NOW.to_string();
        let sig = compute_signature(&ts, body, SECRET);
        assert!(verify_slack_signature_at(body, &ts, &sig, SECRET, NOW));
    }

    #[test]
    fn rejects_tampered_body_and_wrong_secret() {
        let ts = NOW.to_string();
        let sig = compute_signature(&ts, "text=42", SECRET);
        assert!(!verify_slack_signature_at("text=43", &ts, &sig, SECRET, NOW));
        assert!(!verify_slack_signature_at("text=42", &ts, &sig, "other", NOW));
    }

    #[test]
    fn rejects_stale_and_future_timestamps() {
        let old = (NOW - MAX_REQUEST_AGE_SECS - 1).to_string();
        let sig = compute_signature(&old, "b", SECRET);
        assert!(!verify_slack_signature_at("b", &old, &sig, SECRET, NOW));

        let future = (NOW + MAX_CLOCK_SKEW_SECS + 1).to_string();
        let sig = compute_signature(&future, "b", SECRET);
        assert!(!verify_slack_signature_at("b", &future, &sig, SECRET, NOW));
    }

    #[test]
    fn rejects_garbage_headers() {
        assert!(!verify_slack_signature_at("b", "soon", "v0=00", SECRET, NOW));
        assert!(!verify_slack_signature_at("b", &NOW.to_string(), "v1=zz", SECRET, NOW));
    }
}
