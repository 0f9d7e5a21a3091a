use std::process::ExitCode;

use clap::Parser;

/// Entry point for Kuma Sync.
///
/// Logs at `info` unless `RUST_LOG` says otherwise and exits non-zero when the
/// sync could not be completed.
///
/// # Examples
///
/// ```bash
/// UPTIME_KUMA_URL=https://uptime.example.com TRAEFIK_1_URL=http://traefik:8080 cargo run -- --reset-tags
/// ```
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = kuma_sync::config::Args::parse();
    match kuma_sync::run(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
