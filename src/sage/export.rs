use std::path::Path;
use tracing::warn;

use crate::error::Result;
use crate::models::Allocation;
use crate::sage::{col, DELIMITER};

/// Reconstruit les lignes du fichier corrigé : en-têtes d'origine dans
/// leur ordre, puis une ligne par lot ajusté dont seule la colonne
/// quantité est remplacée par la quantité corrigée arrondie à l'entier.
/// Tout le reste de la ligne d'origine est préservé octet pour octet.
pub fn render_corrected_lines(headers: &[String], allocations: &[Allocation]) -> String {
    let mut out = String::new();

    for h in headers {
        out.push_str(h);
        out.push('\n');
    }

    for alloc in allocations {
        let mut parts: Vec<&str> = alloc.raw_line.split(DELIMITER).collect();
        if parts.len() <= col::QUANTITE {
            // Ne devrait pas arriver : le parseur garantit 15 colonnes.
            warn!(
                "ligne brute trop courte pour le lot {}, ignorée",
                alloc.lot_number
            );
            continue;
        }
        let corrected = format!("{}", alloc.corrected_quantity.round() as i64);
        parts[col::QUANTITE] = &corrected;
        out.push_str(&parts.join(&DELIMITER.to_string()));
        out.push('\n');
    }

    out
}

/// Écrit le fichier corrigé sur disque.
pub fn write_corrected_export<P: AsRef<Path>>(
    headers: &[String],
    allocations: &[Allocation],
    path: P,
) -> Result<()> {
    let content = render_corrected_lines(headers, allocations);
    std::fs::write(path, content)?;
    Ok(())
}
