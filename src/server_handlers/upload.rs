use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use futures_util::stream::StreamExt;
use serde_json::json;
use tracing::{error, info};

use crate::config::Config;
use crate::pipeline::RunContext;
use crate::screening;
use crate::sessions::{SessionStore, SessionUpdate};

use super::{blocking_semaphore, read_field_bytes};

/// POST /api/upload — reçoit un export Sage X3, le contrôle, crée une
/// session, exécute Parse → Agrégation → Template et renvoie l'URL du
/// template avec les statistiques. En cas d'échec du pipeline, le
/// fichier sauvegardé et la session sont supprimés.
pub async fn upload_handler(
    mut payload: Multipart,
    config: web::Data<Config>,
    store: web::Data<SessionStore>,
) -> impl Responder {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut client_filename: Option<String> = None;

    while let Some(field_res) = payload.next().await {
        let mut field = match field_res {
            Ok(f) => f,
            Err(e) => {
                return HttpResponse::BadRequest()
                    .json(json!({"error": format!("multipart invalide : {}", e)}))
            }
        };

        if field.name() == "file" {
            client_filename = field
                .content_disposition()
                .get_filename()
                .map(|s| s.to_string());
            match read_field_bytes(&mut field).await {
                Ok(bytes) => file_bytes = Some(bytes),
                Err(e) => return HttpResponse::BadRequest().json(json!({"error": e})),
            }
        }
    }

    let bytes = match file_bytes {
        Some(b) => b,
        None => {
            return HttpResponse::BadRequest().json(json!({"error": "Aucun fichier fourni"}))
        }
    };
    let client_filename = match client_filename {
        Some(n) if !n.trim().is_empty() => n,
        _ => return HttpResponse::BadRequest().json(json!({"error": "Nom de fichier vide"})),
    };

    // Contrôles de sécurité avant toute écriture.
    let filename = match screening::screen_upload(&client_filename, &bytes, config.max_file_size) {
        Ok(name) => name,
        Err(e) => return HttpResponse::BadRequest().json(json!({"error": format!("{}", e)})),
    };
    let extension = screening::file_extension(&filename);
    let received_at = Utc::now();

    let session_id = match store.create(&filename, "", "uploading") {
        Ok(id) => id,
        Err(e) => {
            error!("création de session impossible : {}", e);
            return HttpResponse::InternalServerError()
                .json(json!({"error": "Erreur interne du serveur"}));
        }
    };

    let filepath = config
        .upload_folder
        .join(format!("{}_{}", session_id, filename));
    if let Err(e) = tokio::fs::write(&filepath, &bytes).await {
        error!("sauvegarde de l'upload impossible : {}", e);
        let _ = store.delete(&session_id);
        return HttpResponse::InternalServerError()
            .json(json!({"error": "Erreur interne du serveur"}));
    }
    let _ = store.update(
        &session_id,
        &SessionUpdate {
            original_file_path: Some(filepath.to_string_lossy().to_string()),
            ..Default::default()
        },
    );

    // Pipeline sur un thread bloquant, borné par le sémaphore global.
    let sem = blocking_semaphore();
    let permit = match sem.acquire_owned().await {
        Ok(p) => p,
        Err(_) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": "Erreur interne du serveur"}))
        }
    };

    let sid = session_id.clone();
    let path_block = filepath.clone();
    let processed_folder = config.processed_folder.clone();
    let blocking_handle = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        let ctx = RunContext::ingest(&sid, &path_block, &extension, received_at)?;
        let template_path = ctx.write_template(&processed_folder)?;
        Ok::<_, crate::error::SageError>((ctx, template_path))
    });

    let result = match blocking_handle.await {
        Ok(res) => res,
        Err(e) => {
            error!("tâche de traitement interrompue : {}", e);
            let _ = tokio::fs::remove_file(&filepath).await;
            let _ = store.delete(&session_id);
            return HttpResponse::InternalServerError()
                .json(json!({"error": "Erreur interne du serveur"}));
        }
    };

    let (ctx, template_path) = match result {
        Ok(v) => v,
        Err(e) => {
            let _ = tokio::fs::remove_file(&filepath).await;
            let _ = store.delete(&session_id);
            return HttpResponse::BadRequest().json(json!({"error": format!("{}", e)}));
        }
    };

    let header_lines = serde_json::to_string(&ctx.parsed.headers).unwrap_or_default();
    let _ = store.update(
        &session_id,
        &SessionUpdate {
            template_file_path: Some(template_path.to_string_lossy().to_string()),
            status: Some("template_generated".to_string()),
            inventory_date: ctx.inventory_date.map(|d| d.to_string()),
            nb_articles: Some(ctx.nb_articles() as i64),
            nb_lots: Some(ctx.nb_lots() as i64),
            total_quantity: Some(ctx.total_quantity()),
            header_lines: Some(header_lines),
            ..Default::default()
        },
    );

    info!(
        "upload traité : session {}, {} articles, {} lots",
        session_id,
        ctx.nb_articles(),
        ctx.nb_lots()
    );

    HttpResponse::Ok().json(json!({
        "success": true,
        "session_id": session_id,
        "template_url": format!("/api/download/template/{}", session_id),
        "stats": {
            "nb_articles": ctx.nb_articles(),
            "total_quantity": ctx.total_quantity(),
            "nb_lots": ctx.nb_lots(),
            "inventory_date": ctx.inventory_date.map(|d| d.to_string()),
        }
    }))
}
