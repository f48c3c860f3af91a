mod cli;

use mediacast::{
    config,
    server::{self, auth},
};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use mediacast_av::Prober;
use mediacast_parser::parse_episode;
use std::path::Path;

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting Mediacast server");
    tracing::info!("Media root: {:?}", config.library.root);
    tracing::info!("Thumbnail cache: {:?}", config.thumbnails.dir);
    if config.server.auth.enabled {
        tracing::info!("Authentication enabled");
    }

    server::start_server(config).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "mediacast=trace,mediacast_av=debug,mediacast_parser=debug,tower_http=debug".to_string()
        } else {
            "mediacast=debug,mediacast_av=info,tower_http=info".to_string()
        }
    });

    // Logs go to stderr so `--json` output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Probe { file, json } => probe_file(&file, cli.config.as_deref(), json),
        Commands::Parse { filenames, json } => parse_filenames(&filenames, json),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("mediacast {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::HashPassword { password } => hash_password(&password),
        Commands::GenerateApiKey => generate_api_key(),
    }
}

fn probe_file(file: &Path, config_path: Option<&Path>, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = config::load_config_or_default(config_path)?;
    let prober = Prober::new(config.tools.ffprobe(), config.tools.timeout());

    let rt = tokio::runtime::Runtime::new()?;
    let probe = rt.block_on(prober.probe(file))?;
    let verdict = config.playback.classify(Some(&probe));

    if json {
        let output = serde_json::json!({
            "probe": probe,
            "compatibility": verdict,
            "web_compatible": verdict.is_compatible(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("File: {}", file.display());
    println!("Container: {}", probe.container_format);
    println!("Size: {} bytes", probe.size_bytes);
    let secs = probe.duration_seconds as u64;
    println!(
        "Duration: {:02}:{:02}:{:02}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60
    );
    if let (Some(w), Some(h)) = (probe.width, probe.height) {
        println!("Resolution: {}x{}", w, h);
    }
    if let Some(bit_rate) = probe.bit_rate {
        println!("Bit rate: {} kb/s", bit_rate / 1000);
    }
    println!(
        "Video: {}",
        probe.video_codec.as_deref().unwrap_or("(none)")
    );
    println!(
        "Audio: {}",
        probe.audio_codec.as_deref().unwrap_or("(none)")
    );

    println!();
    let mark = |ok: bool| if ok { "✓" } else { "✗" };
    println!("{} container", mark(verdict.container_ok));
    println!("{} video codec", mark(verdict.video_ok));
    println!("{} audio codec", mark(verdict.audio_ok));
    if verdict.is_compatible() {
        println!("\nPlays directly in the browser");
    } else {
        println!("\nNeeds an external player");
    }

    Ok(())
}

fn parse_filenames(filenames: &[String], json: bool) -> Result<()> {
    let parsed: Vec<_> = filenames.iter().map(|name| (name, parse_episode(name))).collect();

    if json {
        let output: Vec<_> = parsed
            .iter()
            .map(|(name, info)| serde_json::json!({ "filename": name, "episode": info }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for (name, info) in &parsed {
        println!("{}", name);
        println!(
            "  Series: {}",
            info.series_name.as_deref().unwrap_or("(unknown)")
        );
        if let Some(season) = info.season {
            println!("  Season: {}", season);
        }
        match info.episode {
            Some(episode) => println!("  Episode: {}", episode),
            None => println!("  Episode: (none)"),
        }
    }

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    println!("Checking external tools...\n");

    let tools = mediacast_av::check_tools(&config.tools.ffmpeg(), &config.tools.ffprobe());
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Video thumbnails and playback checks are disabled without them.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Auth enabled: {}", config.server.auth.enabled);
            println!("  Media root: {:?}", config.library.root);
            println!("  Thumbnails: {:?}", config.thumbnails.dir);
            println!("  Stream token TTL: {}s", config.streaming.token_ttl_secs);
            println!("  Jellyfin enabled: {}", config.jellyfin.enabled);
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Media root: {:?}", config.library.root);
        }
    }

    Ok(())
}

fn hash_password(password: &str) -> Result<()> {
    let hash = auth::hash_password(password)?;
    println!("{}", hash);
    Ok(())
}

fn generate_api_key() -> Result<()> {
    let key = auth::generate_api_key();
    println!("{}", key);
    Ok(())
}
