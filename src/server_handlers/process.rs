use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use futures_util::stream::StreamExt;
use serde_json::json;
use tracing::{error, info};

use crate::config::Config;
use crate::models::Strategy;
use crate::pipeline::{reconcile, template, validate};
use crate::sage::{export, parser};
use crate::screening;
use crate::sessions::{SessionStore, SessionUpdate};

use super::{blocking_semaphore, read_field_bytes, read_field_text};

/// Erreur du traitement bloquant : message utilisateur + détails
/// éventuels (liste de la validation du template).
enum ProcessError {
    Rejected(String, Vec<String>),
    Internal(String),
}

impl From<crate::error::SageError> for ProcessError {
    fn from(e: crate::error::SageError) -> ProcessError {
        ProcessError::Rejected(format!("{}", e), Vec::new())
    }
}

/// POST /api/process — reçoit le template complété, valide la saisie,
/// reparse l'export d'origine de la session, répartit les écarts selon
/// la stratégie demandée et écrit l'export corrigé.
pub async fn process_handler(
    mut payload: Multipart,
    config: web::Data<Config>,
    store: web::Data<SessionStore>,
) -> impl Responder {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut client_filename: Option<String> = None;
    let mut session_id: Option<String> = None;
    let mut strategy_token: Option<String> = None;

    while let Some(field_res) = payload.next().await {
        let mut field = match field_res {
            Ok(f) => f,
            Err(e) => {
                return HttpResponse::BadRequest()
                    .json(json!({"error": format!("multipart invalide : {}", e)}))
            }
        };

        match field.name() {
            "file" => {
                client_filename = field
                    .content_disposition()
                    .get_filename()
                    .map(|s| s.to_string());
                match read_field_bytes(&mut field).await {
                    Ok(bytes) => file_bytes = Some(bytes),
                    Err(e) => return HttpResponse::BadRequest().json(json!({"error": e})),
                }
            }
            "session_id" => match read_field_text(&mut field).await {
                Ok(v) => session_id = Some(v.trim().to_string()),
                Err(e) => return HttpResponse::BadRequest().json(json!({"error": e})),
            },
            "strategy" => match read_field_text(&mut field).await {
                Ok(v) => strategy_token = Some(v.trim().to_string()),
                Err(e) => return HttpResponse::BadRequest().json(json!({"error": e})),
            },
            _ => {}
        }
    }

    let (bytes, session_id) = match (file_bytes, session_id) {
        (Some(b), Some(s)) if !s.is_empty() => (b, s),
        _ => return HttpResponse::BadRequest().json(json!({"error": "Paramètres manquants"})),
    };

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

    let filename = match client_filename.as_deref().and_then(screening::sanitize_filename) {
        Some(n) => n,
        None => return HttpResponse::BadRequest().json(json!({"error": "Nom de fichier vide"})),
    };
    let lower = filename.to_lowercase();
    if !lower.ends_with(".xlsx") && !lower.ends_with(".xls") {
        return HttpResponse::BadRequest()
            .json(json!({"error": "Seuls les fichiers Excel sont acceptés"}));
    }

    let strategy = match strategy_token.as_deref().filter(|s| !s.is_empty()) {
        None => Strategy::EarliestFirst,
        Some(token) => match Strategy::from_token(token) {
            Some(s) => s,
            None => {
                return HttpResponse::BadRequest()
                    .json(json!({"error": format!("Stratégie inconnue : {}", token)}))
            }
        },
    };

    // Sauvegarde temporaire du template complété.
    let temp_path = config
        .processed_folder
        .join(format!("temp_{}_{}", session_id, filename));
    if let Err(e) = tokio::fs::write(&temp_path, &bytes).await {
        error!("sauvegarde du template complété impossible : {}", e);
        return HttpResponse::InternalServerError()
            .json(json!({"error": "Erreur interne du serveur"}));
    }

    let sem = blocking_semaphore();
    let permit = match sem.acquire_owned().await {
        Ok(p) => p,
        Err(_) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": "Erreur interne du serveur"}))
        }
    };

    let completed_path = config
        .processed_folder
        .join(format!("completed_{}_{}", session_id, filename));
    let final_folder = config.final_folder.clone();
    let original_path = session.original_file_path.clone();
    let original_filename = session.original_filename.clone();
    let temp_block = temp_path.clone();
    let completed_block = completed_path.clone();

    let blocking_handle = tokio::task::spawn_blocking(move || {
        let _permit = permit;

        // Validation de la saisie utilisateur.
        let completed = match template::read_completed_template(&temp_block) {
            Ok(c) => c,
            Err(e) => {
                let _ = std::fs::remove_file(&temp_block);
                return Err(ProcessError::Rejected(format!("{}", e), Vec::new()));
            }
        };
        let (is_valid, message, errors) = validate::validate_completion(&completed);
        if !is_valid {
            let _ = std::fs::remove_file(&temp_block);
            return Err(ProcessError::Rejected(message, errors));
        }
        std::fs::rename(&temp_block, &completed_block)
            .map_err(|e| ProcessError::Internal(format!("{}", e)))?;

        // Reparse de l'export d'origine : la session ne retient que des
        // chemins, jamais de tables en mémoire.
        let extension = screening::file_extension(&original_filename);
        let parsed = parser::parse_export(&original_path, &extension)?;

        let (allocations, stats) = reconcile::reconcile(&parsed.rows, &completed, strategy)?;

        let stem = original_filename
            .rsplit_once('.')
            .map(|(s, _)| s)
            .unwrap_or(&original_filename);
        let final_path = final_folder.join(format!("corrected_{}.csv", stem));
        export::write_corrected_export(&parsed.headers, &allocations, &final_path)?;

        Ok::<_, ProcessError>((final_path, stats))
    });

    let result = match blocking_handle.await {
        Ok(res) => res,
        Err(e) => {
            error!("tâche de traitement interrompue : {}", e);
            return HttpResponse::InternalServerError()
                .json(json!({"error": "Erreur interne du serveur"}));
        }
    };

    let (final_path, stats) = match result {
        Ok(v) => v,
        Err(ProcessError::Rejected(message, details)) => {
            return HttpResponse::BadRequest()
                .json(json!({"error": message, "details": details}));
        }
        Err(ProcessError::Internal(e)) => {
            error!("traitement du template complété échoué : {}", e);
            return HttpResponse::InternalServerError()
                .json(json!({"error": "Erreur interne du serveur"}));
        }
    };

    let _ = store.update(
        &session_id,
        &SessionUpdate {
            completed_file_path: Some(completed_path.to_string_lossy().to_string()),
            final_file_path: Some(final_path.to_string_lossy().to_string()),
            status: Some("completed".to_string()),
            strategy_used: Some(strategy.as_str().to_string()),
            ..Default::default()
        },
    );

    info!(
        "session {} traitée : {} articles ajustés, écart total {:.3}",
        session_id, stats.adjusted_articles, stats.total_discrepancy
    );

    HttpResponse::Ok().json(json!({
        "success": true,
        "final_url": format!("/api/download/final/{}", session_id),
        "stats": {
            "total_discrepancy": stats.total_discrepancy,
            "adjusted_items": stats.adjusted_articles,
            "strategy_used": strategy.as_str(),
            "unallocated": stats.unallocated,
        }
    }))
}
