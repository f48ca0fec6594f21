// Contrôles de sécurité des uploads, exécutés avant que le pipeline ne
// voie le fichier : taille, nom, extension, et signature du contenu.

use crate::error::{Result, SageError};

/// Signature ZIP des conteneurs `.xlsx`.
const ZIP_MAGIC: [u8; 2] = [0x50, 0x4B];
/// Signature OLE2 des anciens classeurs `.xls`.
const OLE2_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Extensions acceptées, point compris, en minuscules.
pub const ALLOWED_EXTENSIONS: [&str; 3] = [".csv", ".xlsx", ".xls"];

/// Nettoie un nom de fichier fourni par le client : seul le dernier
/// composant est conservé, et tout nom contenant `..` est rejeté.
pub fn sanitize_filename(name: &str) -> Option<String> {
    if name.contains("..") {
        return None;
    }
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim()
        .to_string();
    if base.is_empty() { None } else { Some(base) }
}

/// Extension en minuscules, point compris ("rapport.XLSX" -> ".xlsx").
pub fn file_extension(name: &str) -> String {
    match name.rfind('.') {
        Some(i) => name[i..].to_lowercase(),
        None => String::new(),
    }
}

/// Heuristique texte pour les CSV : pas d'octet nul dans l'échantillon.
fn looks_like_text(sample: &[u8]) -> bool {
    !sample.contains(&0)
}

/// Valide un upload avant tout traitement : fichier non vide, sous la
/// taille maximale, extension autorisée, et premiers octets cohérents
/// avec l'extension. La signature est stricte pour les conteneurs
/// binaires, indicative pour le CSV.
pub fn screen_upload(filename: &str, data: &[u8], max_size: usize) -> Result<String> {
    if data.is_empty() {
        return Err(SageError::Validation("Fichier vide".to_string()));
    }
    if data.len() > max_size {
        return Err(SageError::Validation(format!(
            "Fichier trop volumineux ({:.1}MB > {:.1}MB)",
            data.len() as f64 / 1024.0 / 1024.0,
            max_size as f64 / 1024.0 / 1024.0
        )));
    }

    let filename = sanitize_filename(filename)
        .ok_or_else(|| SageError::Validation("Nom de fichier invalide".to_string()))?;

    let ext = file_extension(&filename);
    if ext.is_empty() {
        return Err(SageError::Validation(
            "Extension de fichier manquante".to_string(),
        ));
    }
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(SageError::Validation(format!(
            "Extension {} non autorisée",
            ext
        )));
    }

    let sample = &data[..data.len().min(1024)];
    let content_ok = match ext.as_str() {
        ".xlsx" => data.starts_with(&ZIP_MAGIC),
        ".xls" => data.starts_with(&OLE2_MAGIC),
        ".csv" => looks_like_text(sample),
        _ => false,
    };
    if !content_ok {
        return Err(SageError::Validation(format!(
            "Contenu du fichier incompatible avec l'extension {}",
            ext
        )));
    }

    Ok(filename)
}
