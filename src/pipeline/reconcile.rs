use tracing::{info, warn};

use crate::error::{Result, SageError};
use crate::models::{Allocation, CompletedTemplate, ReconcileStats, StockRow, Strategy};

/// Seuil en dessous duquel un reliquat ou un ajustement est considéré nul.
pub const TOLERANCE: f64 = 0.001;

/// Répartit les écarts saisis (réel − théorique) sur les lots d'origine.
///
/// Pour chaque article en écart, les lots sont parcourus dans l'ordre de
/// la stratégie (dates absentes toujours en dernier) et chacun absorbe ce
/// qu'il peut : un ajout est plafonné au double de la quantité du lot,
/// un retrait ne peut pas rendre le lot négatif. Le parcours s'arrête
/// quand le reliquat passe sous [`TOLERANCE`] ou que les lots sont
/// épuisés. Un reliquat non imputable est abandonné — comportement
/// hérité du système source — mais journalisé et compté dans les
/// statistiques.
pub fn reconcile(
    rows: &[StockRow],
    completed: &CompletedTemplate,
    strategy: Strategy,
) -> Result<(Vec<Allocation>, ReconcileStats)> {
    if rows.is_empty() {
        return Err(SageError::EmptyInput("répartition des écarts"));
    }
    if completed.rows.is_empty() {
        return Err(SageError::EmptyInput("répartition des écarts"));
    }

    let mut allocations: Vec<Allocation> = Vec::new();
    let mut stats = ReconcileStats::default();

    for entry in &completed.rows {
        let theoretical = entry.theoretical_quantity.unwrap_or(0.0);
        let actual = entry.actual_quantity.unwrap_or(0.0);
        let variance = actual - theoretical;

        // Écart nul : aucun lot touché, aucune allocation.
        if variance.abs() < TOLERANCE {
            continue;
        }

        let article = entry.article_code.trim();
        let mut lots: Vec<&StockRow> = rows
            .iter()
            .filter(|r| r.article_code.trim() == article)
            .collect();

        if lots.is_empty() {
            warn!("aucun lot pour l'article {}, écart {} ignoré", article, variance);
            continue;
        }

        // Dates absentes en dernier, quelle que soit la stratégie.
        lots.sort_by(|a, b| match (a.lot_date, b.lot_date) {
            (Some(x), Some(y)) => match strategy {
                Strategy::EarliestFirst => x.cmp(&y),
                Strategy::LatestFirst => y.cmp(&x),
            },
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });

        let mut remaining = variance;
        let mut touched = false;

        for lot in lots {
            if remaining.abs() < TOLERANCE {
                break;
            }
            let lot_qty = lot.quantity.unwrap_or(0.0);

            let adjustment = if remaining > 0.0 {
                // Sous-stock : un lot peut au plus doubler en une passe.
                remaining.min(lot_qty * 2.0)
            } else {
                // Sur-stock : un lot ne peut pas devenir négatif.
                remaining.max(-lot_qty)
            };

            if adjustment.abs() > TOLERANCE {
                allocations.push(Allocation {
                    article_code: lot.article_code.clone(),
                    lot_number: lot.lot_number.clone(),
                    original_quantity: lot_qty,
                    adjustment,
                    corrected_quantity: lot_qty + adjustment,
                    lot_date: lot.lot_date,
                    raw_line: lot.raw_line.clone(),
                });
                remaining -= adjustment;
                touched = true;
            }
        }

        if remaining.abs() >= TOLERANCE {
            warn!(
                "article {} : reliquat de {:.3} non imputable, abandonné",
                article, remaining
            );
            stats.unallocated += remaining;
        }

        stats.total_discrepancy += variance;
        if touched {
            stats.adjusted_articles += 1;
        }
    }

    info!(
        "répartition terminée : {} allocations, {} articles ajustés, écart total {:.3}",
        allocations.len(),
        stats.adjusted_articles,
        stats.total_discrepancy
    );
    Ok((allocations, stats))
}
