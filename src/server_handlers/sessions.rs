use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use tracing::error;

use crate::sage::parser;
use crate::screening;
use crate::sessions::SessionStore;

/// GET /api/sessions — liste les sessions, les plus récentes d'abord.
/// Paramètres : `limit` (50 par défaut) et `include_expired`.
pub async fn list_sessions_handler(
    query: web::Query<std::collections::HashMap<String, String>>,
    store: web::Data<SessionStore>,
) -> impl Responder {
    let limit = query
        .get("limit")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(50);
    let include_expired = query
        .get("include_expired")
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(false);

    match store.list(limit, include_expired) {
        Ok(sessions) => HttpResponse::Ok().json(json!({"sessions": sessions})),
        Err(e) => {
            error!("listage des sessions impossible : {}", e);
            HttpResponse::InternalServerError().json(json!({"error": "Erreur interne du serveur"}))
        }
    }
}

/// DELETE /api/sessions/{session_id}
pub async fn delete_session_handler(
    path: web::Path<String>,
    store: web::Data<SessionStore>,
) -> impl Responder {
    let session_id = path.into_inner();
    match store.delete(&session_id) {
        Ok(true) => HttpResponse::Ok().json(json!({"success": true})),
        Ok(false) => HttpResponse::NotFound().json(json!({"error": "Session non trouvée"})),
        Err(e) => {
            error!("suppression de session impossible : {}", e);
            HttpResponse::InternalServerError().json(json!({"error": "Erreur interne du serveur"}))
        }
    }
}

/// GET /api/analyze/{session_id} — redétecte la structure du fichier
/// d'origine de la session (types de lignes, largeurs, échantillon).
pub async fn analyze_handler(
    path: web::Path<String>,
    store: web::Data<SessionStore>,
) -> impl Responder {
    let session_id = path.into_inner();

    let session = match store.get(&session_id) {
        Ok(Some(s)) => s,
        Ok(None) => {
            return HttpResponse::NotFound().json(json!({"error": "Session non trouvée"}))
        }
        Err(e) => {
            error!("lecture de session impossible : {}", e);
            return HttpResponse::InternalServerError()
                .json(json!({"error": "Erreur interne du serveur"}));
        }
    };

    if !std::path::Path::new(&session.original_file_path).exists() {
        return HttpResponse::NotFound().json(json!({"error": "Fichier non trouvé"}));
    }

    let extension = screening::file_extension(&session.original_filename);
    match parser::analyze_structure(&session.original_file_path, &extension) {
        Ok(info) => HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Format détecté",
            "format_info": info,
        })),
        Err(e) => HttpResponse::Ok().json(json!({
            "success": false,
            "message": format!("{}", e),
            "format_info": {},
        })),
    }
}

/// GET /api/health — état de la base et nombre de sessions actives.
pub async fn health_handler(store: web::Data<SessionStore>) -> impl Responder {
    let db_healthy = store.health_check();
    let sessions_count = store.list(1000, false).map(|s| s.len()).unwrap_or(0);

    let status = if db_healthy { "healthy" } else { "degraded" };
    HttpResponse::Ok().json(json!({
        "status": status,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "database": if db_healthy { "healthy" } else { "error" },
        "active_sessions_count": sessions_count,
    }))
}

/// POST /api/cleanup — supprime les sessions sans accès depuis `hours`
/// heures (24 par défaut).
pub async fn cleanup_handler(
    body: Option<web::Json<serde_json::Value>>,
    store: web::Data<SessionStore>,
) -> impl Responder {
    let hours = body
        .as_ref()
        .and_then(|b| b.get("hours"))
        .and_then(|v| v.as_i64())
        .unwrap_or(24);

    match store.cleanup_expired(hours) {
        Ok(count) => HttpResponse::Ok().json(json!({"cleaned_sessions": count})),
        Err(e) => {
            error!("nettoyage des sessions impossible : {}", e);
            HttpResponse::InternalServerError().json(json!({"error": "Erreur nettoyage"}))
        }
    }
}
