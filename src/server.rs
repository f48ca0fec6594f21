use actix_cors::Cors;
use actix_web::{web, App, HttpServer};

use crate::config::Config;
use crate::server_handlers::{
    analyze_handler, cleanup_handler, delete_session_handler, download_handler, health_handler,
    list_sessions_handler, process_handler, upload_handler,
};
use crate::sessions::SessionStore;

/// Monte l'application et sert l'API. CORS permissif, avec
/// `Content-Disposition` exposé pour les téléchargements.
pub async fn run_server(
    bind_addr: &str,
    config: Config,
    store: SessionStore,
) -> std::io::Result<()> {
    let config_data = web::Data::new(config);
    let store_data = web::Data::new(store);

    HttpServer::new(move || {
        let cors = Cors::permissive().expose_headers([actix_web::http::header::CONTENT_DISPOSITION]);

        App::new()
            .wrap(cors)
            .app_data(config_data.clone())
            .app_data(store_data.clone())
            .route("/api/upload", web::post().to(upload_handler))
            .route("/api/process", web::post().to(process_handler))
            .route(
                "/api/download/{file_type}/{session_id}",
                web::get().to(download_handler),
            )
            .route("/api/sessions", web::get().to(list_sessions_handler))
            .route(
                "/api/sessions/{session_id}",
                web::delete().to(delete_session_handler),
            )
            .route("/api/analyze/{session_id}", web::get().to(analyze_handler))
            .route("/api/health", web::get().to(health_handler))
            .route("/api/cleanup", web::post().to(cleanup_handler))
    })
    .bind(bind_addr)?
    .run()
    .await
}
