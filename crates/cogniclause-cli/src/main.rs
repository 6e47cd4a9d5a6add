mod cli;
mod display;

use std::io::Read;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use cogniclause_core::LevelFilter;
use cogniclause_session::{
    AnonymousIdentity, EvaluationSession, IdentityProvider, SessionError, SessionState,
    StaticIdentity, load_history,
};
use cogniclause_sync::{ApiClient, AuthIdentity, BackendConfig, RestRecordStore, read_upload};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!("cogniclause v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Evaluate { text, stdin } => {
            let text = match text {
                Some(text) if !stdin => text,
                _ => read_stdin()?,
            };
            let session = build_session(&cli.config)?;
            report(&session, session.submit_text(&text).await, cli.json)
        }
        Command::Upload { file } => {
            let upload = read_upload(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            let session = build_session(&cli.config)?;
            report(&session, session.submit_file(Some(upload)).await, cli.json)
        }
        Command::History {
            search,
            level,
            page,
            page_size,
        } => show_history(&cli.config, &search, level, page, page_size, cli.json).await,
        Command::Health => {
            let client = ApiClient::new(cli.config.api_url.clone(), cli.config.request_timeout())?;
            let health = client.health().await?;
            match health.message {
                Some(msg) => println!("{}: {}", health.status, msg),
                None => println!("{}", health.status),
            }
            Ok(())
        }
        Command::SignOut => {
            let identity = identity_provider(&cli.config)?;
            identity.sign_out().await?;
            println!("Signed out.");
            Ok(())
        }
    }
}

fn read_stdin() -> anyhow::Result<String> {
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("reading contract text from stdin")?;
    Ok(buf)
}

fn build_session(config: &Config) -> anyhow::Result<EvaluationSession> {
    let client = ApiClient::new(config.api_url.clone(), config.request_timeout())?;
    let identity = identity_provider(config)?;
    Ok(EvaluationSession::new(
        Arc::new(client),
        identity,
        config.session_config(),
    ))
}

/// Static id if given, else the backend session, else anonymous.
fn identity_provider(config: &Config) -> anyhow::Result<Arc<dyn IdentityProvider>> {
    if let Some(id) = config.user_id.as_deref().filter(|id| !id.trim().is_empty()) {
        return Ok(Arc::new(StaticIdentity::new(id)));
    }
    match (config.backend(), config.access_token.as_deref()) {
        (Some((url, key)), Some(token)) => {
            let client = reqwest::Client::builder()
                .timeout(config.request_timeout())
                .build()?;
            let backend =
                BackendConfig::new(url.to_string(), key.to_string(), Some(token.to_string()));
            Ok(Arc::new(AuthIdentity::new(client, backend)))
        }
        _ => Ok(Arc::new(AnonymousIdentity)),
    }
}

/// Print the session's final state. Failures become a non-zero exit.
fn report(
    session: &EvaluationSession,
    submitted: Result<cogniclause_session::Completion, SessionError>,
    json: bool,
) -> anyhow::Result<()> {
    if let Err(SessionError::Validation(message)) = submitted {
        bail!(message);
    }
    match session.state() {
        SessionState::Succeeded { result, document } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", display::render_evaluation(&result, document.as_ref()));
            }
            Ok(())
        }
        SessionState::Failed { message } => bail!(message),
        other => bail!("evaluation did not complete (state: {other:?})"),
    }
}

async fn show_history(
    config: &Config,
    search: &str,
    level: LevelFilter,
    page: usize,
    page_size: usize,
    json: bool,
) -> anyhow::Result<()> {
    let Some((url, key)) = config.backend() else {
        bail!("history needs --backend-url and --backend-key (or SUPABASE_URL and SUPABASE_KEY)");
    };
    let client = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()?;
    let backend =
        BackendConfig::new(url.to_string(), key.to_string(), config.access_token.clone());
    let store = RestRecordStore::new(client, backend);
    let identity = identity_provider(config)?;

    let mut view = load_history(
        &store,
        identity.as_ref(),
        config.session_config().identity_timeout,
        page_size,
    )
    .await?;
    view.set_search(search);
    view.set_level_filter(level);
    view.set_page(page);

    let slice = view.current_page();
    if json {
        println!("{}", serde_json::to_string_pretty(&slice)?);
    } else {
        print!("{}", display::render_history(&slice));
    }
    Ok(())
}
