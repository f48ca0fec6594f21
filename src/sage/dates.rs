use chrono::{DateTime, Datelike, NaiveDate, Utc};
use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

fn lot_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Lots au format CPKU###MMYY#### ; le motif peut apparaître n'importe
    // où dans le numéro, l'entourage est arbitraire.
    RE.get_or_init(|| Regex::new(r"CPKU\d{3}(\d{2})(\d{2})\d{4}").expect("motif lot valide"))
}

fn inventory_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // JJMM immédiatement avant le littéral INV.
    RE.get_or_init(|| Regex::new(r"(\d{2})(\d{2})INV").expect("motif inventaire valide"))
}

/// Extrait la date d'un numéro de lot Sage X3 : premier jour du mois
/// porté par le lot, année 2000 + YY. Renvoie `None` (jamais d'erreur)
/// si le motif est absent ou la date hors plage.
pub fn lot_date(lot_number: &str) -> Option<NaiveDate> {
    let caps = lot_pattern().captures(lot_number)?;
    let month: u32 = caps.get(1)?.as_str().parse().ok()?;
    let year: i32 = caps.get(2)?.as_str().parse::<i32>().ok()? + 2000;

    match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(d) => Some(d),
        None => {
            warn!("date invalide dans le lot : {}", lot_number);
            None
        }
    }
}

/// Extrait la date d'inventaire du numéro d'inventaire. Le fichier ne
/// porte que JJMM ; l'année vient de l'horodatage de réception, jamais
/// de la chaîne elle-même.
pub fn inventory_date(
    inventory_number: &str,
    reference_timestamp: DateTime<Utc>,
) -> Option<NaiveDate> {
    let caps = inventory_pattern().captures(inventory_number)?;
    let day: u32 = caps.get(1)?.as_str().parse().ok()?;
    let month: u32 = caps.get(2)?.as_str().parse().ok()?;

    match NaiveDate::from_ymd_opt(reference_timestamp.year(), month, day) {
        Some(d) => Some(d),
        None => {
            warn!(
                "date invalide dans le numéro d'inventaire : {}",
                inventory_number
            );
            None
        }
    }
}
