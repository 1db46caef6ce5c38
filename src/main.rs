use std::env;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ems_client::api::{ApiClient, ReloadCounter, ReqwestTransport};
use ems_client::auth::{AuthService, AuthState};
use ems_client::config::ClientConfig;
use ems_client::download::DirectoryDownloader;
use ems_client::i18n::Language;
use ems_client::storage::{FileStore, LANG_KEY, SessionStore};
use ems_client::ui::{NotificationBar, StdinPrompt};
use ems_client::{App, AppState};

/// `ems-client [module] [km|en|jp]` renders one module page to stdout.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "ems_client=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig::new_from_env()?;
    let store = Arc::new(FileStore::open(&config.session_file)?);
    let args: Vec<String> = env::args().collect();
    if let Some(lang) = args.get(2).and_then(|code| Language::from_code(code)) {
        store.set(LANG_KEY, lang.code())?;
    }
    let transport = Arc::new(ReqwestTransport::new()?);
    let api = ApiClient::new(
        &config.api_base_url,
        transport,
        store,
        Arc::new(ReloadCounter::new()),
    );

    let auth = AuthService::new(api.clone());
    if let AuthState::LoggedOut = auth.bootstrap() {
        match (env::var("EMS_USERNAME"), env::var("EMS_PASSWORD")) {
            (Ok(username), Ok(password)) => {
                auth.login(&username, &password).await?;
            }
            _ => {
                error!("not logged in; set EMS_USERNAME and EMS_PASSWORD");
                return Ok(());
            }
        }
    }

    let notifier = Arc::new(NotificationBar::new());
    let state = AppState::new(
        api,
        notifier.clone(),
        Arc::new(StdinPrompt),
        Arc::new(DirectoryDownloader::new(config.download_dir.clone())),
    )
    .with_search_debounce(config.search_debounce);
    let app = App::new(state);

    let module = args.get(1).map(String::as_str).unwrap_or("dashboard");
    info!("api at {}, opening {}", config.api_base_url, module);

    let content = app.render_module(module).await;
    println!("{}", app.render_page(&content));
    println!("{}", notifier.render());

    Ok(())
}
