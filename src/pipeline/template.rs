use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{Result, SageError};
use crate::models::{AggregateRow, CompletedRow, CompletedTemplate};
use crate::sage::io;

/// En-têtes du template de saisie, dans l'ordre des colonnes.
const TEMPLATE_HEADERS: [&str; 9] = [
    "Numéro Session",
    "Numéro Inventaire",
    "Code Article",
    "Statut Article",
    "Quantité Théorique",
    "Quantité Réelle",
    "Unites",
    "Depots",
    "Emplacements",
];

/// Nom de la feuille du template.
const SHEET_NAME: &str = "Inventaire";

/// Convertit un index de colonne 1-based en lettres ("A", "B", ... "AA").
fn column_index_to_letters(mut index: usize) -> String {
    let mut letters = String::new();
    while index > 0 {
        let rem = (index - 1) % 26;
        letters.insert(0, (b'A' + rem as u8) as char);
        index = (index - 1) / 26;
    }
    letters
}

/// Génère le template Excel de saisie : une ligne par agrégat, quantités
/// théorique et réelle initialisées à zéro pour le comptage physique.
/// Renvoie le chemin du fichier écrit
/// (`{site}_{inventaire}_{session}.xlsx` dans `output_folder`).
pub fn generate_template<P: AsRef<Path>>(
    aggregates: &[AggregateRow],
    session_id: &str,
    output_folder: P,
) -> Result<PathBuf> {
    let first = aggregates
        .first()
        .ok_or(SageError::EmptyInput("génération du template"))?;

    let mut book = umya_spreadsheet::new_file();
    let sheet = book
        .get_sheet_mut(&0)
        .ok_or_else(|| SageError::Read("classeur sans feuille".to_string()))?;
    sheet.set_name(SHEET_NAME);

    for (c, header) in TEMPLATE_HEADERS.iter().enumerate() {
        sheet
            .get_cell_mut(((c + 1) as u32, 1u32))
            .set_value(header.to_string());
    }

    // Largeurs : contenu le plus long + 2, plafonné à 50.
    let mut widths: Vec<usize> = TEMPLATE_HEADERS.iter().map(|h| h.chars().count()).collect();

    for (r, agg) in aggregates.iter().enumerate() {
        let cells: [String; 9] = [
            agg.session_number.clone(),
            agg.inventory_number.clone(),
            agg.article_code.clone(),
            agg.status.clone(),
            "0".to_string(),
            "0".to_string(),
            agg.unit.clone(),
            agg.zone.clone(),
            agg.location.clone(),
        ];
        for (c, value) in cells.iter().enumerate() {
            widths[c] = widths[c].max(value.chars().count());
            sheet
                .get_cell_mut(((c + 1) as u32, (r + 2) as u32))
                .set_value(value.clone());
        }
    }

    for (c, w) in widths.iter().enumerate() {
        let letters = column_index_to_letters(c + 1);
        sheet
            .get_column_dimension_mut(&letters)
            .set_width((w + 2).min(50) as f64);
    }

    let filename = format!(
        "{}_{}_{}.xlsx",
        first.site, first.inventory_number, session_id
    );
    let filepath = output_folder.as_ref().join(filename);

    umya_spreadsheet::writer::xlsx::write(&book, &filepath)
        .map_err(|e| SageError::Read(format!("Écriture du template impossible : {}", e)))?;

    info!(
        "template généré : {} ({} articles)",
        filepath.display(),
        aggregates.len()
    );
    Ok(filepath)
}

/// Relit un template complété par l'utilisateur. La première ligne non
/// vide fournit les en-têtes ; les cellules de quantité vides ou non
/// numériques deviennent `None` (rejetées ensuite par la validation).
pub fn read_completed_template<P: AsRef<Path>>(path: P) -> Result<CompletedTemplate> {
    let sheet_rows = io::read_sheet_rows(path)?;
    let mut iter = sheet_rows
        .into_iter()
        .filter(|r| r.iter().any(|c| !c.trim().is_empty()));

    let columns: Vec<String> = iter
        .next()
        .ok_or(SageError::EmptyInput("lecture du template complété"))?
        .into_iter()
        .map(|c| c.trim().to_string())
        .collect();

    let find = |name: &str| columns.iter().position(|h| h == name);
    let article_idx = find("Code Article");
    let theoretical_idx = find("Quantité Théorique");
    let actual_idx = find("Quantité Réelle");

    let cell = |row: &[String], idx: Option<usize>| -> String {
        idx.and_then(|i| row.get(i).cloned()).unwrap_or_default()
    };
    let numeric = |row: &[String], idx: Option<usize>| -> Option<f64> {
        let s = cell(row, idx);
        let s = s.trim();
        if s.is_empty() { None } else { s.parse::<f64>().ok() }
    };

    let rows: Vec<CompletedRow> = iter
        .map(|r| CompletedRow {
            article_code: cell(&r, article_idx).trim().to_string(),
            theoretical_quantity: numeric(&r, theoretical_idx),
            actual_quantity: numeric(&r, actual_idx),
        })
        .collect();

    Ok(CompletedTemplate { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lettres_de_colonnes() {
        assert_eq!(column_index_to_letters(1), "A");
        assert_eq!(column_index_to_letters(9), "I");
        assert_eq!(column_index_to_letters(26), "Z");
        assert_eq!(column_index_to_letters(27), "AA");
    }

    #[test]
    fn test_template_vide_refuse() {
        let err = generate_template(&[], "s", std::env::temp_dir()).unwrap_err();
        assert!(matches!(err, SageError::EmptyInput(_)));
    }
}
