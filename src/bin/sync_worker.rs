use anyhow::{Context, Result, anyhow, bail};
use catch_sync::application::ports::sync_runner::SyncRunner;
use catch_sync::infrastructure::sync::MANUAL_SYNC_TAG;
use catch_sync::shared::AppConfig;
use catch_sync::{AppState, init_logging};
use std::env;

#[derive(Debug, Clone, Default)]
struct CliOptions {
    database_url: Option<String>,
    api_base_url: Option<String>,
    once: bool,
}

fn usage() -> &'static str {
    "Usage: sync_worker [--database-url <url>] [--api-base-url <url>] [--once]"
}

fn parse_args<I>(mut args: I) -> Result<CliOptions>
where
    I: Iterator<Item = String>,
{
    let mut options = CliOptions::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--database-url" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("--database-url requires a value"))?;
                options.database_url = Some(value);
            }
            "--api-base-url" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("--api-base-url requires a value"))?;
                options.api_base_url = Some(value.trim_end_matches('/').to_string());
            }
            "--once" => options.once = true,
            "-h" | "--help" => {
                println!("{}", usage());
                std::process::exit(0);
            }
            other => bail!("Unknown argument: {other}\n{}", usage()),
        }
    }
    Ok(options)
}

#[tokio::main]
async fn main() -> Result<()> {
    let options = parse_args(env::args().skip(1))?;

    let mut config = AppConfig::from_env();
    if let Some(url) = options.database_url {
        config.database.url = url;
    }
    if let Some(url) = options.api_base_url {
        config.api.base_url = url;
    }
    if options.once {
        config.sync.auto_sync = false;
    }
    config.validate().map_err(|err| anyhow!(err))?;

    init_logging();
    tracing::info!("Starting catch-sync worker v{}", env!("CARGO_PKG_VERSION"));

    let state = AppState::initialize(config)
        .await
        .context("Failed to initialize sync worker")?;

    if options.once {
        let Some(sync) = state.sync_service.clone() else {
            bail!("offline store is unavailable; nothing to sync");
        };
        let result = sync.run_once(MANUAL_SYNC_TAG).await?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        state.shutdown().await;
        return Ok(());
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutdown signal received");
    state.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> impl Iterator<Item = String> {
        values
            .iter()
            .map(|value| value.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn parses_known_flags() {
        let options = parse_args(args(&[
            "--database-url",
            "sqlite::memory:",
            "--api-base-url",
            "http://localhost:8080/",
            "--once",
        ]))
        .unwrap();
        assert_eq!(options.database_url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(options.api_base_url.as_deref(), Some("http://localhost:8080"));
        assert!(options.once);
    }

    #[test]
    fn rejects_unknown_flags_and_missing_values() {
        assert!(parse_args(args(&["--verbose"])).is_err());
        assert!(parse_args(args(&["--database-url"])).is_err());
    }
}
