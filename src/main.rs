use mimalloc::MiMalloc;
use resq::auth::LoginStore;
use resq::db::DatabaseConfig;
use resq::llm::ModelConfig;
use resq::server::AppState;
use resq::translator::TranslatorArgs;
use tokio::net::TcpListener;
use tracing::info;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = &resq::config::CONFIG;
    let _log_guard = resq::logging::init(&cfg.tracing)?;

    info!(
        bind = %cfg.server.bind_address(),
        database_config = %cfg.paths.database_config.display(),
        model_config = %cfg.paths.model_config.display(),
        login_config = %cfg.auth.login_config.display(),
        logs = %cfg.tracing.dir.display(),
    );

    let store = LoginStore::from_path(&cfg.auth.login_config)?;
    let database = DatabaseConfig::from_path(&cfg.paths.database_config)?;
    let model = ModelConfig::from_path(&cfg.paths.model_config)?;

    let translator = resq::translator::spawn(TranslatorArgs { database, model }).await?;
    if cfg.translator.warm_start {
        translator.warm_up();
    }

    let state = AppState::new(translator, store, cfg)?;
    let app = resq::server::resq_router(state);

    let addr = cfg.server.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
