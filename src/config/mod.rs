mod types;

pub use types::*;

use anyhow::{Context, Result};
use mediacast_common::MediaType;
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./config.toml",
        "./mediacast.toml",
        "~/.config/mediacast/config.toml",
        "/etc/mediacast/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    let config = Config::default();
    validate_config(&config)?;
    Ok(config)
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    let thumbs = &config.thumbnails;
    if thumbs.width == 0 || thumbs.height == 0 {
        anyhow::bail!(
            "Thumbnail dimensions must be non-zero (got {}x{})",
            thumbs.width,
            thumbs.height
        );
    }
    if !(1..=100).contains(&thumbs.jpeg_quality) {
        anyhow::bail!(
            "Thumbnail jpeg_quality must be between 1 and 100 (got {})",
            thumbs.jpeg_quality
        );
    }
    if thumbs.video_timestamps.is_empty() {
        anyhow::bail!("Thumbnail video_timestamps cannot be empty");
    }

    if config.streaming.chunk_size == 0 {
        anyhow::bail!("Streaming chunk_size cannot be 0");
    }

    let auth = &config.server.auth;
    if auth.enabled && auth.api_key.is_none() && auth.password_hash.is_none() {
        tracing::warn!("Authentication is enabled but neither api_key nor password_hash is set");
    }

    if config.jellyfin.enabled && config.jellyfin.api_key.is_empty() {
        anyhow::bail!("Jellyfin is enabled but has no API key");
    }

    if !config.library.root.exists() {
        tracing::warn!("Media root does not exist: {:?}", config.library.root);
    } else {
        for media_type in MediaType::ALL {
            let dir = config.library.media_dir(media_type);
            if !dir.exists() {
                tracing::debug!("Media directory for {} does not exist: {:?}", media_type, dir);
            }
        }
    }

    Ok(())
}
