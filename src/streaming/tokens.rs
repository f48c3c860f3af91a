//! Short-lived streaming tokens for external players.
//!
//! A token grants unauthenticated access to exactly one file until it
//! expires. Players such as mpv or VLC cannot carry a session cookie, so the
//! web UI issues a token and hands the player a URL that embeds it.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rand::RngCore;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Bytes of randomness per token (256 bits).
const TOKEN_BYTES: usize = 32;

/// A token bound to one file.
#[derive(Debug, Clone, Serialize)]
pub struct StreamingToken {
    pub token: String,
    /// Relative path of the file the token unlocks.
    pub filename: String,
    pub user_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl StreamingToken {
    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Thread-safe token table.
#[derive(Clone)]
pub struct StreamingTokenStore {
    tokens: Arc<DashMap<String, StreamingToken>>,
    ttl: chrono::Duration,
}

impl StreamingTokenStore {
    /// Create a store whose tokens live for `ttl_secs` seconds.
    pub fn new(ttl_secs: u64) -> Self {
        let ttl = i64::try_from(ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX);
        Self {
            tokens: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Issue a token for `filename`. Expired tokens are purged first.
    pub fn issue(&self, filename: &str, user_id: &str) -> StreamingToken {
        self.purge_expired();

        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);

        let now = Utc::now();
        let token = StreamingToken {
            token: URL_SAFE_NO_PAD.encode(bytes),
            filename: filename.to_string(),
            user_id: user_id.to_string(),
            issued_at: now,
            expires_at: now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        };

        self.tokens.insert(token.token.clone(), token.clone());
        tracing::debug!(
            filename = %token.filename,
            user_id = %token.user_id,
            expires_at = %token.expires_at,
            "Issued streaming token"
        );

        token
    }

    /// Check that `token` exists, has not expired and is bound to `filename`.
    ///
    /// Tokens stay valid for repeated requests until they expire, since
    /// players issue many range requests per file.
    pub fn validate(&self, token: &str, filename: &str) -> bool {
        self.validate_at(token, filename, Utc::now())
    }

    pub(crate) fn validate_at(&self, token: &str, filename: &str, now: DateTime<Utc>) -> bool {
        if self
            .tokens
            .remove_if(token, |_, entry| entry.is_expired_at(now))
            .is_some()
        {
            tracing::debug!("Rejected expired streaming token");
            return false;
        }

        match self.tokens.get(token) {
            Some(entry) if entry.filename == filename => true,
            Some(_) => {
                tracing::debug!(filename, "Streaming token bound to a different file");
                false
            }
            None => false,
        }
    }

    /// Invalidate a token immediately.
    pub fn revoke(&self, token: &str) -> bool {
        self.tokens.remove(token).is_some()
    }

    /// Remove every expired token, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let before = self.tokens.len();
        self.tokens.retain(|_, entry| !entry.is_expired_at(now));
        let removed = before.saturating_sub(self.tokens.len());

        if removed > 0 {
            tracing::debug!(removed, "Purged expired streaming tokens");
        }

        removed
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Start a background task that periodically purges expired tokens.
pub fn start_sweep_task(
    store: StreamingTokenStore,
    interval_secs: u64,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            store.purge_expired();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_validate() {
        let store = StreamingTokenStore::new(3600);
        let token = store.issue("Shows/Lost/e1.mp4", "admin");

        assert_eq!(token.token.len(), 43);
        assert!(!token.token.contains('='));
        assert_eq!(store.len(), 1);
        assert!(store.validate(&token.token, "Shows/Lost/e1.mp4"));
        // Reusable within the window.
        assert!(store.validate(&token.token, "Shows/Lost/e1.mp4"));
    }

    #[test]
    fn test_tokens_are_unique() {
        let store = StreamingTokenStore::new(3600);
        let a = store.issue("a.mp4", "admin");
        let b = store.issue("a.mp4", "admin");
        assert_ne!(a.token, b.token);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_filename_mismatch() {
        let store = StreamingTokenStore::new(3600);
        let token = store.issue("a.mp4", "admin");
        assert!(!store.validate(&token.token, "b.mp4"));
        // A mismatch does not consume the token.
        assert!(store.validate(&token.token, "a.mp4"));
    }

    #[test]
    fn test_unknown_token() {
        let store = StreamingTokenStore::new(3600);
        assert!(!store.validate("nope", "a.mp4"));
    }

    #[test]
    fn test_expiry_boundary() {
        let store = StreamingTokenStore::new(60);
        let token = store.issue("a.mp4", "admin");

        let just_before = token.expires_at - chrono::Duration::seconds(1);
        assert!(store.validate_at(&token.token, "a.mp4", just_before));

        assert!(!store.validate_at(&token.token, "a.mp4", token.expires_at));
        // Removed on sight.
        assert!(store.is_empty());
    }

    #[test]
    fn test_issue_purges_expired() {
        let store = StreamingTokenStore::new(0);
        store.issue("a.mp4", "admin");
        store.issue("b.mp4", "admin");
        // Each issuance purges the previously issued, already-expired token.
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_zero_ttl_is_never_valid() {
        let store = StreamingTokenStore::new(0);
        let token = store.issue("a.mp4", "admin");
        assert!(!store.validate(&token.token, "a.mp4"));
    }

    #[test]
    fn test_revoke() {
        let store = StreamingTokenStore::new(3600);
        let token = store.issue("a.mp4", "admin");
        assert!(store.revoke(&token.token));
        assert!(!store.revoke(&token.token));
        assert!(!store.validate(&token.token, "a.mp4"));
    }

    #[test]
    fn test_purge_keeps_live_tokens() {
        let store = StreamingTokenStore::new(3600);
        let token = store.issue("a.mp4", "admin");
        assert_eq!(store.purge_expired(), 0);
        let later = token.expires_at + chrono::Duration::seconds(1);
        assert_eq!(store.purge_expired_at(later), 1);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_sweep_task() {
        let store = StreamingTokenStore::new(0);
        store.tokens.insert(
            "stale".to_string(),
            StreamingToken {
                token: "stale".to_string(),
                filename: "a.mp4".to_string(),
                user_id: "admin".to_string(),
                issued_at: Utc::now(),
                expires_at: Utc::now(),
            },
        );

        let handle = start_sweep_task(store.clone(), 1);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(store.is_empty());
        handle.abort();
    }
}
