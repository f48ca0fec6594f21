// --- Moulinette d'inventaire Sage X3 - Point d'entrée ---

use stocktake::config::Config;
use stocktake::run_server;
use stocktake::sessions::SessionStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    config.ensure_folders()?;

    let store = SessionStore::new(&config.sessions_db_path);
    store.init_db().map_err(|e| std::io::Error::other(e.to_string()))?;

    info!("démarrage de la moulinette Sage X3 sur http://{}", config.bind_addr);
    let bind = config.bind_addr.clone();
    run_server(&bind, config, store).await
}
