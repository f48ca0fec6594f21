use std::collections::HashMap;

use crate::error::{Result, SageError};
use crate::models::{AggregateRow, StockRow};

/// Agrège les lignes de stock par clé métier
/// (article, statut, emplacement, zone, unité) : quantité totale,
/// premières valeurs session/inventaire/site du groupe, et plus
/// ancienne date de lot. Les lignes sans date sont exclues du minimum.
///
/// Sortie triée par date minimale croissante, groupes sans date en fin ;
/// l'ordre de première apparition départage les ex aequo.
pub fn aggregate(rows: &[StockRow]) -> Result<Vec<AggregateRow>> {
    if rows.is_empty() {
        return Err(SageError::EmptyInput("agrégation"));
    }

    type Key = (String, String, String, String, String);
    let mut index: HashMap<Key, usize> = HashMap::new();
    let mut groups: Vec<AggregateRow> = Vec::new();

    for row in rows {
        let key: Key = (
            row.article_code.clone(),
            row.status.clone(),
            row.location.clone(),
            row.zone.clone(),
            row.unit.clone(),
        );

        match index.get(&key) {
            Some(&i) => {
                let g = &mut groups[i];
                g.total_quantity += row.quantity.unwrap_or(0.0);
                g.min_lot_date = match (g.min_lot_date, row.lot_date) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, None) => a,
                    (None, b) => b,
                };
            }
            None => {
                index.insert(key, groups.len());
                groups.push(AggregateRow {
                    article_code: row.article_code.clone(),
                    status: row.status.clone(),
                    location: row.location.clone(),
                    zone: row.zone.clone(),
                    unit: row.unit.clone(),
                    total_quantity: row.quantity.unwrap_or(0.0),
                    session_number: row.session_number.clone(),
                    inventory_number: row.inventory_number.clone(),
                    site: row.site.clone(),
                    min_lot_date: row.lot_date,
                });
            }
        }
    }

    // Tri stable : les groupes sans date restent derrière, dans leur
    // ordre d'apparition.
    groups.sort_by(|a, b| match (a.min_lot_date, b.min_lot_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    Ok(groups)
}
