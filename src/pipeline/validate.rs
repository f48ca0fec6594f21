use crate::error::{Result, SageError};
use crate::models::{CompletedTemplate, StockRow};

/// Colonnes que le template complété doit impérativement porter.
pub const REQUIRED_TEMPLATE_COLUMNS: [&str; 5] = [
    "Numéro Session",
    "Numéro Inventaire",
    "Code Article",
    "Quantité Théorique",
    "Quantité Réelle",
];

/// Valide la structure métier des lignes parsées : toute quantité doit
/// être numérique et positive ou nulle, tout code article non vide.
/// Rejet (pas de panique) au premier type d'anomalie rencontré.
pub fn validate_structure(rows: &[StockRow]) -> Result<()> {
    let invalid_qty = rows.iter().filter(|r| r.quantity.is_none()).count();
    if invalid_qty > 0 {
        return Err(SageError::Validation(format!(
            "{} valeurs de quantité invalides détectées",
            invalid_qty
        )));
    }

    let negative_qty = rows
        .iter()
        .filter(|r| r.quantity.is_some_and(|q| q < 0.0))
        .count();
    if negative_qty > 0 {
        return Err(SageError::Validation(format!(
            "{} quantités négatives détectées",
            negative_qty
        )));
    }

    let empty_articles = rows
        .iter()
        .filter(|r| r.article_code.trim().is_empty())
        .count();
    if empty_articles > 0 {
        return Err(SageError::Validation(format!(
            "{} codes articles vides détectés",
            empty_articles
        )));
    }

    Ok(())
}

/// Vérifie le template complété par l'utilisateur : colonnes requises
/// présentes, quantités réelles toutes saisies et numériques, aucune
/// négative. Renvoie (validité, message, liste d'erreurs lisibles) ;
/// l'appelant décide d'interrompre ou non. Les listes d'articles fautifs
/// sont tronquées aux 5 premiers.
pub fn validate_completion(template: &CompletedTemplate) -> (bool, String, Vec<String>) {
    let mut errors: Vec<String> = Vec::new();

    let missing: Vec<&str> = REQUIRED_TEMPLATE_COLUMNS
        .iter()
        .filter(|c| !template.columns.iter().any(|h| h == *c))
        .copied()
        .collect();
    if !missing.is_empty() {
        errors.push(format!("Colonnes manquantes: {}", missing.join(", ")));
    }

    if template.columns.iter().any(|h| h == "Quantité Réelle") {
        let missing_qty: Vec<&str> = template
            .rows
            .iter()
            .filter(|r| r.actual_quantity.is_none())
            .map(|r| r.article_code.as_str())
            .collect();
        if !missing_qty.is_empty() {
            errors.push(format!(
                "Quantités réelles manquantes pour: {}",
                missing_qty.iter().take(5).cloned().collect::<Vec<_>>().join(", ")
            ));
            if missing_qty.len() > 5 {
                errors.push(format!("... et {} autres articles", missing_qty.len() - 5));
            }
        }

        let negative_qty: Vec<&str> = template
            .rows
            .iter()
            .filter(|r| r.actual_quantity.is_some_and(|q| q < 0.0))
            .map(|r| r.article_code.as_str())
            .collect();
        if !negative_qty.is_empty() {
            errors.push(format!(
                "Quantités négatives pour: {}",
                negative_qty.iter().take(5).cloned().collect::<Vec<_>>().join(", ")
            ));
            if negative_qty.len() > 5 {
                errors.push(format!("... et {} autres articles", negative_qty.len() - 5));
            }
        }
    }

    let is_valid = errors.is_empty();
    let message = if is_valid {
        "Template valide".to_string()
    } else {
        "Erreurs détectées".to_string()
    };

    (is_valid, message, errors)
}
