pub mod download;
pub mod process;
pub mod sessions;
pub mod upload;

pub use download::*;
pub use process::*;
pub use sessions::*;
pub use upload::*;

use actix_multipart::Field;
use futures_util::stream::StreamExt;
use std::sync::{Arc, OnceLock};
use tokio::sync::Semaphore;

/// Sémaphore global bornant le travail bloquant (parsing, Excel) au
/// nombre de cœurs disponibles.
pub(crate) fn blocking_semaphore() -> Arc<Semaphore> {
    static GLOBAL_SEM: OnceLock<Arc<Semaphore>> = OnceLock::new();
    GLOBAL_SEM
        .get_or_init(|| {
            let procs = num_cpus::get();
            Arc::new(Semaphore::new(std::cmp::max(1, procs)))
        })
        .clone()
}

/// Lit entièrement un champ multipart en mémoire.
pub(crate) async fn read_field_bytes(field: &mut Field) -> Result<Vec<u8>, String> {
    let mut data: Vec<u8> = Vec::new();
    while let Some(chunk) = field.next().await {
        match chunk {
            Ok(bytes) => data.extend_from_slice(&bytes),
            Err(e) => return Err(format!("erreur de flux multipart : {}", e)),
        }
    }
    Ok(data)
}

/// Lit un champ multipart texte (session_id, strategy, ...).
pub(crate) async fn read_field_text(field: &mut Field) -> Result<String, String> {
    let bytes = read_field_bytes(field).await?;
    String::from_utf8(bytes).map_err(|e| format!("champ texte invalide : {}", e))
}
