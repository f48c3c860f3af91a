//! Media-server refresh notifications.

pub mod jellyfin;

pub use jellyfin::JellyfinClient;

use crate::config::Config;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Something that can be told to rescan its library.
#[async_trait]
pub trait LibraryNotifier: Send + Sync {
    fn name(&self) -> &str;

    async fn refresh_library(&self) -> Result<()>;
}

/// The configured notifier, if any.
pub fn from_config(config: &Config) -> Option<Arc<dyn LibraryNotifier>> {
    config
        .jellyfin
        .enabled
        .then(|| Arc::new(JellyfinClient::new(&config.jellyfin)) as Arc<dyn LibraryNotifier>)
}

/// Ask `notifier` to refresh. Errors are logged and reported as `false`.
pub async fn notify_refresh(notifier: &dyn LibraryNotifier) -> bool {
    match notifier.refresh_library().await {
        Ok(()) => {
            tracing::info!("{} library refresh triggered", notifier.name());
            true
        }
        Err(e) => {
            tracing::warn!("Failed to notify {}: {:#}", notifier.name(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    #[async_trait]
    impl LibraryNotifier for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn refresh_library(&self) -> Result<()> {
            anyhow::bail!("unreachable")
        }
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        assert!(from_config(&config).is_none());

        config.jellyfin.enabled = true;
        config.jellyfin.api_key = "k".to_string();
        assert_eq!(from_config(&config).unwrap().name(), "Jellyfin");
    }

    #[tokio::test]
    async fn test_notify_refresh_swallows_errors() {
        assert!(!notify_refresh(&Failing).await);
    }
}
