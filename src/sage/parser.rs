use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;
use std::path::Path;
use tracing::info;

use crate::error::{Result, SageError};
use crate::models::StockRow;
use crate::sage::{col, dates, io, COLUMN_NAMES, DELIMITER, EXPECTED_COLUMNS};

/// Résultat du parsing d'un export : lignes d'en-tête opaques, lignes de
/// stock typées, et premier numéro d'inventaire rencontré.
#[derive(Debug, Clone)]
pub struct ParsedExport {
    /// Lignes `E;` et `L;`, conservées verbatim dans l'ordre du fichier.
    pub headers: Vec<String>,
    pub rows: Vec<StockRow>,
    pub first_inventory_number: Option<String>,
}

impl ParsedExport {
    /// Date d'inventaire dérivée du premier numéro d'inventaire, l'année
    /// venant de l'horodatage de réception du fichier.
    pub fn inventory_date(&self, received_at: DateTime<Utc>) -> Option<NaiveDate> {
        self.first_inventory_number
            .as_deref()
            .and_then(|n| dates::inventory_date(n, received_at))
    }
}

/// Construit une `StockRow` à partir de 15 champs exactement.
fn build_stock_row(parts: Vec<String>) -> StockRow {
    let raw_line = parts.join(";");
    let quantity = {
        let s = parts[col::QUANTITE].trim();
        s.parse::<f64>().ok()
    };
    let lot_number = parts[col::NUMERO_LOT].clone();
    let lot_date = dates::lot_date(&lot_number);

    StockRow {
        line_type: parts[col::TYPE_LIGNE].clone(),
        session_number: parts[col::NUMERO_SESSION].clone(),
        inventory_number: parts[col::NUMERO_INVENTAIRE].clone(),
        rank: parts[col::RANG].clone(),
        site: parts[col::SITE].clone(),
        quantity,
        real_quantity_input: parts[col::QUANTITE_REELLE_IN_INPUT].clone(),
        count_indicator: parts[col::INDICATEUR_COMPTE].clone(),
        article_code: parts[col::CODE_ARTICLE].clone(),
        location: parts[col::EMPLACEMENT].clone(),
        status: parts[col::STATUT].clone(),
        unit: parts[col::UNITE].clone(),
        value: parts[col::VALEUR].clone(),
        zone: parts[col::ZONE_PK].clone(),
        lot_number,
        lot_date,
        raw_line,
    }
}

/// Normalise une ligne `S;` : au moins 15 champs exigés (sinon erreur de
/// format indexée sur la ligne), surplus tronqué, complétée à vide si
/// besoin après troncature.
fn normalize_s_parts(mut parts: Vec<String>, line_number: usize) -> Result<Vec<String>> {
    if parts.len() < EXPECTED_COLUMNS {
        return Err(SageError::Format {
            line: line_number,
            expected: EXPECTED_COLUMNS,
            found: parts.len(),
        });
    }
    parts.truncate(EXPECTED_COLUMNS);
    while parts.len() < EXPECTED_COLUMNS {
        parts.push(String::new());
    }
    Ok(parts)
}

/// Parse un export au format texte délimité (CSV `;`).
pub fn parse_csv<P: AsRef<Path>>(path: P) -> Result<ParsedExport> {
    let path = path.as_ref();
    if std::fs::metadata(path)?.len() == 0 {
        return Err(SageError::EmptyFile);
    }
    let content = std::fs::read_to_string(path)?;

    let mut headers: Vec<String> = Vec::new();
    let mut rows: Vec<StockRow> = Vec::new();
    let mut first_inventory_number: Option<String> = None;

    for (i, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with("E;") || line.starts_with("L;") {
            headers.push(line.to_string());
        } else if line.starts_with("S;") {
            let parts: Vec<String> = line.split(DELIMITER).map(|s| s.to_string()).collect();
            let parts = normalize_s_parts(parts, i + 1)?;

            if first_inventory_number.is_none() {
                first_inventory_number = Some(parts[col::NUMERO_INVENTAIRE].clone());
            }
            rows.push(build_stock_row(parts));
        }
        // Toute autre ligne est ignorée.
    }

    if rows.is_empty() {
        return Err(SageError::NoData);
    }

    info!("{} lignes S; et {} en-têtes lues (CSV)", rows.len(), headers.len());
    Ok(ParsedExport {
        headers,
        rows,
        first_inventory_number,
    })
}

/// Parse un export au format classeur Excel (`.xlsx` / `.xls`).
pub fn parse_xlsx<P: AsRef<Path>>(path: P) -> Result<ParsedExport> {
    let path = path.as_ref();
    if std::fs::metadata(path)?.len() == 0 {
        return Err(SageError::EmptyFile);
    }
    let sheet_rows = io::read_sheet_rows(path)?;

    let mut headers: Vec<String> = Vec::new();
    let mut rows: Vec<StockRow> = Vec::new();
    let mut first_inventory_number: Option<String> = None;

    for (i, cells) in sheet_rows.into_iter().enumerate() {
        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        let mut parts: Vec<String> = cells.into_iter().map(|c| c.trim().to_string()).collect();
        parts.truncate(EXPECTED_COLUMNS);

        let line_type = parts.first().cloned().unwrap_or_default();
        match line_type.as_str() {
            "E" | "L" => headers.push(parts.join(";")),
            "S" => {
                let parts = normalize_s_parts(parts, i + 1)?;
                if first_inventory_number.is_none() {
                    first_inventory_number = Some(parts[col::NUMERO_INVENTAIRE].clone());
                }
                rows.push(build_stock_row(parts));
            }
            _ => {}
        }
    }

    if rows.is_empty() {
        return Err(SageError::NoData);
    }

    info!("{} lignes S; et {} en-têtes lues (XLSX)", rows.len(), headers.len());
    Ok(ParsedExport {
        headers,
        rows,
        first_inventory_number,
    })
}

/// Parse un export selon l'extension déclarée du fichier.
pub fn parse_export<P: AsRef<Path>>(path: P, extension: &str) -> Result<ParsedExport> {
    match extension.to_lowercase().as_str() {
        ".csv" | "csv" => parse_csv(path),
        ".xlsx" | "xlsx" | ".xls" | "xls" => parse_xlsx(path),
        other => Err(SageError::Read(format!(
            "Extension non supportée : {}",
            other
        ))),
    }
}

/// Décrit la structure détectée d'un fichier déjà uploadé (pour
/// l'endpoint d'analyse) : types de lignes et largeurs pour le CSV,
/// dimensions et échantillon pour l'Excel.
pub fn analyze_structure<P: AsRef<Path>>(path: P, extension: &str) -> Result<serde_json::Value> {
    let expected = json!({
        "columns_required": EXPECTED_COLUMNS,
        "column_names": COLUMN_NAMES,
        "expected_line_types": ["E", "L", "S"],
    });

    match extension.to_lowercase().as_str() {
        ".csv" | "csv" => {
            let content = std::fs::read_to_string(path)?;
            let lines: Vec<&str> = content
                .lines()
                .map(|l| l.trim())
                .filter(|l| !l.is_empty())
                .take(10)
                .collect();

            let columns_per_line: Vec<usize> =
                lines.iter().map(|l| l.split(DELIMITER).count()).collect();
            let tag_indexes = |tag: &str| -> Vec<usize> {
                lines
                    .iter()
                    .enumerate()
                    .filter(|(_, l)| l.starts_with(tag))
                    .map(|(i, _)| i)
                    .collect()
            };

            Ok(json!({
                "format": "csv",
                "total_lines": lines.len(),
                "e_lines": tag_indexes("E;"),
                "l_lines": tag_indexes("L;"),
                "s_lines": tag_indexes("S;"),
                "columns_per_line": columns_per_line,
                "expected_format": expected,
            }))
        }
        ".xlsx" | "xlsx" | ".xls" | "xls" => {
            let rows = io::read_sheet_rows(path)?;
            let total_cols = rows.iter().map(|r| r.len()).max().unwrap_or(0);
            let sample: Vec<serde_json::Value> = rows
                .iter()
                .take(10)
                .enumerate()
                .map(|(i, r)| {
                    json!({
                        "row": i + 1,
                        "columns": r.iter().filter(|c| !c.is_empty()).count(),
                        "first_col": r.first().cloned().unwrap_or_default(),
                        "data": r.iter().take(5).collect::<Vec<_>>(),
                    })
                })
                .collect();

            Ok(json!({
                "format": "xlsx",
                "total_rows": rows.len(),
                "total_cols": total_cols,
                "sample_data": sample,
                "expected_format": expected,
            }))
        }
        other => Err(SageError::Read(format!(
            "Extension non supportée : {}",
            other
        ))),
    }
}
