//! CLI entry point for mundi.

mod cli;

use clap::Parser;
use mundi::api::{ApiClient, ModelClient};
use mundi::build_info::startup_metadata_line;
use mundi::config::{load_config_with_diagnostics, Config};
use mundi::conversation::{ConversationService, ServiceSettings, UserIdentity};
use mundi::prompt::{render_system_prompt, SystemPromptParams};
use mundi::render::Renderer;
use mundi::repl::{
    prompt_login, prompt_session_menu, run_chat_loop, CLEAR_COMMANDS, EXIT_COMMANDS,
};
use mundi::store::SqliteStore;
use mundi::tools::country::CountryInfoTool;
use mundi::tools::exchange::ExchangeRateTool;
use mundi::tools::fetch::build_http_client;
use mundi::tools::ToolRegistry;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = cli::Args::parse();
    init_logging();

    let renderer = Renderer::new(!args.no_color);

    // Load config.
    let loaded = match load_config_with_diagnostics(args.config.as_deref().map(Path::new)) {
        Ok(loaded) => loaded,
        Err(e) => {
            renderer.error(&e.to_string());
            std::process::exit(1);
        }
    };
    for warning in &loaded.diagnostics.deprecations {
        renderer.warn(warning);
    }
    let mut config = loaded.config;
    apply_cli_overrides(&mut config, &args);

    let store = match SqliteStore::open(&config.storage.db_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            renderer.error(&format!(
                "failed to open database {}: {e}",
                config.storage.db_path.display()
            ));
            std::process::exit(1);
        }
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let login = match args.login.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        Some(login) => login.to_string(),
        None => match prompt_login(&renderer, &mut lines).await {
            Ok(Some(login)) => login,
            Ok(None) => exit_process(0),
            Err(e) => {
                renderer.error(&e.to_string());
                std::process::exit(1);
            }
        },
    };
    let user_id = match store.ensure_user(&login) {
        Ok(id) => id,
        Err(e) => {
            renderer.error(&format!("failed to load user `{login}`: {e}"));
            std::process::exit(1);
        }
    };

    renderer.banner(&config.model.name);
    renderer.info(&startup_metadata_line());

    let session = match prompt_session_menu(&renderer, &store, user_id, &mut lines).await {
        Ok(session) => session,
        Err(e) => {
            renderer.error(&e.to_string());
            std::process::exit(1);
        }
    };
    match session {
        None => renderer.info("New conversation started."),
        Some(id) => renderer.info(&format!("Conversation loaded (ID: {id}).")),
    }
    renderer.info("Type 'sair' or 'quit' to exit, 'limpar' or 'clear' to clear the history.");

    let service = build_service(&config, store, UserIdentity { id: user_id, login });
    match run_chat_loop(&service, &renderer, &mut lines, session).await {
        Ok(exit) => {
            debug!(?exit, "chat loop ended");
            exit_process(0)
        }
        Err(e) => {
            renderer.error(&format!("failed to read input: {e}"));
            exit_process(1)
        }
    }
}

/// Leave without waiting for runtime shutdown. A stdin read parked on the
/// blocking pool would otherwise keep the process alive after Ctrl-C, with
/// SIGINT already claimed by the signal handler.
fn exit_process(code: i32) -> ! {
    let _ = std::io::stdout().flush();
    std::process::exit(code)
}

/// `MUNDI_LOG` wins over `RUST_LOG`; warnings only by default. Logs go to
/// stderr because stdout carries the answer.
fn init_logging() {
    let filter = std::env::var("MUNDI_LOG")
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn apply_cli_overrides(config: &mut Config, args: &cli::Args) {
    if let Some(model) = args.model.as_deref().filter(|m| !m.trim().is_empty()) {
        config.model.name = model.to_string();
    }
    if let Some(db) = args.db.as_deref().filter(|p| !p.trim().is_empty()) {
        config.storage.db_path = PathBuf::from(db);
    }
}

fn build_service(
    config: &Config,
    store: Arc<SqliteStore>,
    user: UserIdentity,
) -> ConversationService {
    let fetch_http = build_http_client(config.network.fetch_timeout());
    let retry_delay = config.network.retry_delay();
    let tools = ToolRegistry::with_defaults(
        CountryInfoTool::new(
            fetch_http.clone(),
            &config.tools.country_api_base_url,
            retry_delay,
        ),
        ExchangeRateTool::new(fetch_http, &config.tools.exchange_api_base_url, retry_delay),
    );

    let definitions = tools.definitions();
    let system_prompt = render_system_prompt(SystemPromptParams {
        enabled_tools: definitions.iter().map(|d| d.name.as_str()).collect(),
        exit_commands: &EXIT_COMMANDS,
        clear_commands: &CLEAR_COMMANDS,
    });

    let client: Arc<dyn ModelClient> =
        Arc::new(ApiClient::new(&config.api, config.network.api_timeout()));
    ConversationService::new(
        store,
        client,
        tools,
        ServiceSettings {
            model: config.model.clone(),
            memory: config.memory.clone(),
            system_prompt,
        },
        user,
    )
}
