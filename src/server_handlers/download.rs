use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use tracing::error;

use crate::sessions::SessionStore;

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// GET /api/download/{file_type}/{session_id} — sert le template généré
/// ou l'export corrigé de la session, en pièce jointe.
pub async fn download_handler(
    path: web::Path<(String, String)>,
    store: web::Data<SessionStore>,
) -> impl Responder {
    let (file_type, session_id) = path.into_inner();

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

    let (filepath, mime) = match file_type.as_str() {
        "template" => match session.template_file_path {
            Some(p) => (p, XLSX_MIME),
            None => {
                return HttpResponse::NotFound().json(json!({"error": "Template non généré"}))
            }
        },
        "final" => match session.final_file_path {
            Some(p) => (p, "text/csv"),
            None => {
                return HttpResponse::NotFound()
                    .json(json!({"error": "Fichier final non généré"}))
            }
        },
        _ => return HttpResponse::BadRequest().json(json!({"error": "Type de fichier invalide"})),
    };

    let path = std::path::Path::new(&filepath);
    let download_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file_type.clone());

    match tokio::fs::read(path).await {
        Ok(bytes) => HttpResponse::Ok()
            .content_type(mime)
            .append_header((
                actix_web::http::header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", download_name),
            ))
            .body(bytes),
        Err(_) => {
            HttpResponse::NotFound().json(json!({"error": "Fichier non trouvé sur le serveur"}))
        }
    }
}
