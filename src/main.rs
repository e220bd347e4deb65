mod app;
mod cli;
mod command;
mod config;
mod console;
mod models;
mod paths;
mod provider;
mod session;
mod transcript;

#[cfg(feature = "tui")]
mod tui;

use anyhow::Context;
use clap::Parser;
use session::Session;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Args::parse();

    if let Some(cli::Command::Models) = args.cmd {
        return app::print_models(&mut std::io::stdout());
    }

    let config_path = paths::config_path();
    let cfg = match &config_path {
        Some(path) => config::Config::load(path)?.unwrap_or_default(),
        None => config::Config::default(),
    };
    tracing::debug!(?config_path, ?cfg, "resolved config");

    let http = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;
    let backends = app::build_backends(&http, &cfg)?;

    let model_id = args
        .model
        .clone()
        .or_else(|| cfg.model.clone())
        .unwrap_or_else(|| models::DEFAULT_MODEL.to_string());
    let model = models::resolve(&model_id).context("invalid model selection")?;

    #[cfg(feature = "tui")]
    if let Some(cli::Command::Tui) = args.cmd {
        let session = Session::new(model, args.api_key.clone());
        return tui::run_tui(session, &backends).await;
    }

    let api_key = match args.api_key.clone() {
        Some(key) => Some(key),
        None => app::prompt_api_key()?,
    };
    let mut session = Session::new(model, api_key);

    let prompt = args.prompt.join(" ");
    if !prompt.trim().is_empty() {
        return app::run_once(&mut session, &backends, &prompt, std::io::stdout()).await;
    }

    let stdin = std::io::stdin();
    app::run_repl(stdin.lock(), std::io::stdout(), session, &backends).await?;
    Ok(())
}
