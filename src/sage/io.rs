use calamine::{open_workbook, open_workbook_auto, Data, Reader, Xlsx};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::warn;

use crate::error::SageError;

/// Convertit une cellule calamine en chaîne. Les flottants entiers sont
/// rendus sans partie décimale pour rester fidèles au fichier source
/// ("10" et non "10.0").
pub fn cell_to_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if (f.floor() - f).abs() < f64::EPSILON {
                format!("{}", *f as i64)
            } else {
                format!("{}", f)
            }
        }
        Data::Int(i) => format!("{}", i),
        Data::Bool(b) => format!("{}", b),
        Data::Empty => String::new(),
        Data::Error(_) => String::new(),
        Data::DateTime(s) => s.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

fn first_sheet_rows<R>(workbook: &mut R) -> Result<Vec<Vec<String>>, SageError>
where
    R: Reader<BufReader<File>>,
    R::Error: std::fmt::Display,
{
    let names = workbook.sheet_names().to_owned();
    let sheet = names
        .first()
        .cloned()
        .ok_or_else(|| SageError::Read("classeur sans feuille".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| SageError::Read(format!("feuille '{}' illisible : {}", sheet, e)))?;

    let mut rows: Vec<Vec<String>> = Vec::new();
    for r in range.rows() {
        rows.push(r.iter().map(cell_to_string).collect());
    }
    Ok(rows)
}

/// Lit la première feuille d'un classeur Excel en lignes de chaînes.
/// Le lecteur XLSX est tenté d'abord ; en cas d'échec (ancien conteneur
/// `.xls`, par exemple) un lecteur de secours auto-détecté prend le relais
/// avant de remonter l'erreur.
pub fn read_sheet_rows<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<String>>, SageError> {
    let path = path.as_ref();
    match open_workbook::<Xlsx<_>, _>(path) {
        Ok(mut workbook) => first_sheet_rows(&mut workbook),
        Err(e) => {
            warn!("lecture XLSX échouée ({}), tentative du lecteur de secours", e);
            match open_workbook_auto(path) {
                Ok(mut workbook) => first_sheet_rows(&mut workbook),
                Err(e2) => Err(SageError::Read(format!(
                    "Impossible de lire le fichier Excel : {} (secours : {})",
                    e, e2
                ))),
            }
        }
    }
}
