use chrono::NaiveDate;
use stocktake::error::SageError;
use stocktake::models::{CompletedRow, CompletedTemplate, StockRow, Strategy};
use stocktake::pipeline::reconcile::{reconcile, TOLERANCE};

fn lot(article: &str, qty: f64, date: Option<(i32, u32, u32)>, lot_number: &str) -> StockRow {
    let lot_date = date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));
    StockRow {
        line_type: "S".to_string(),
        session_number: "SES1".to_string(),
        inventory_number: "INV1".to_string(),
        rank: "1".to_string(),
        site: "SITE1".to_string(),
        quantity: Some(qty),
        real_quantity_input: String::new(),
        count_indicator: String::new(),
        article_code: article.to_string(),
        location: "EMP1".to_string(),
        status: "A".to_string(),
        unit: "UN".to_string(),
        value: String::new(),
        zone: "Z1".to_string(),
        lot_number: lot_number.to_string(),
        lot_date,
        raw_line: format!(
            "S;SES1;INV1;1;SITE1;{};;;{};EMP1;A;UN;;Z1;{}",
            qty, article, lot_number
        ),
    }
}

fn completed(entries: &[(&str, f64, f64)]) -> CompletedTemplate {
    CompletedTemplate {
        columns: vec![
            "Numéro Session".to_string(),
            "Numéro Inventaire".to_string(),
            "Code Article".to_string(),
            "Quantité Théorique".to_string(),
            "Quantité Réelle".to_string(),
        ],
        rows: entries
            .iter()
            .map(|(article, theoretical, actual)| CompletedRow {
                article_code: article.to_string(),
                theoretical_quantity: Some(*theoretical),
                actual_quantity: Some(*actual),
            })
            .collect(),
    }
}

/// Les trois lots du scénario de référence : 10/20/30, datés
/// janvier/février/mars.
fn reference_lots() -> Vec<StockRow> {
    vec![
        lot("X", 10.0, Some((2025, 1, 1)), "LOT-JAN"),
        lot("X", 20.0, Some((2025, 2, 1)), "LOT-FEV"),
        lot("X", 30.0, Some((2025, 3, 1)), "LOT-MAR"),
    ]
}

#[test]
fn test_surplus_impute_au_lot_le_plus_ancien() {
    // Théorique 60, réel 65 : +5 sur le lot de janvier (plafond 20).
    let (allocations, stats) = reconcile(
        &reference_lots(),
        &completed(&[("X", 60.0, 65.0)]),
        Strategy::EarliestFirst,
    )
    .unwrap();

    assert_eq!(allocations.len(), 1);
    assert_eq!(allocations[0].lot_number, "LOT-JAN");
    assert!((allocations[0].adjustment - 5.0).abs() < TOLERANCE);
    assert!((allocations[0].corrected_quantity - 15.0).abs() < TOLERANCE);
    assert_eq!(stats.adjusted_articles, 1);
    assert!((stats.total_discrepancy - 5.0).abs() < TOLERANCE);
    assert!(stats.unallocated.abs() < TOLERANCE);
}

#[test]
fn test_manquant_retire_des_lots_les_plus_anciens() {
    // Théorique 60, réel 40 : janvier vidé (-10), février -10.
    let (allocations, _) = reconcile(
        &reference_lots(),
        &completed(&[("X", 60.0, 40.0)]),
        Strategy::EarliestFirst,
    )
    .unwrap();

    assert_eq!(allocations.len(), 2);
    assert_eq!(allocations[0].lot_number, "LOT-JAN");
    assert!((allocations[0].corrected_quantity - 0.0).abs() < TOLERANCE);
    assert_eq!(allocations[1].lot_number, "LOT-FEV");
    assert!((allocations[1].corrected_quantity - 10.0).abs() < TOLERANCE);
}

#[test]
fn test_ecart_nul_ne_touche_aucun_lot() {
    let (allocations, stats) = reconcile(
        &reference_lots(),
        &completed(&[("X", 60.0, 60.0)]),
        Strategy::EarliestFirst,
    )
    .unwrap();

    assert!(allocations.is_empty());
    assert_eq!(stats.adjusted_articles, 0);
    assert!(stats.total_discrepancy.abs() < TOLERANCE);
}

#[test]
fn test_les_deux_strategies_parcourent_les_lots_en_ordre_inverse() {
    // Retrait total : chaque stratégie doit toucher les trois lots.
    let earliest = reconcile(
        &reference_lots(),
        &completed(&[("X", 60.0, 0.0)]),
        Strategy::EarliestFirst,
    )
    .unwrap()
    .0;
    let latest = reconcile(
        &reference_lots(),
        &completed(&[("X", 60.0, 0.0)]),
        Strategy::LatestFirst,
    )
    .unwrap()
    .0;

    let order_e: Vec<&str> = earliest.iter().map(|a| a.lot_number.as_str()).collect();
    let mut order_l: Vec<&str> = latest.iter().map(|a| a.lot_number.as_str()).collect();
    order_l.reverse();
    assert_eq!(order_e, vec!["LOT-JAN", "LOT-FEV", "LOT-MAR"]);
    assert_eq!(order_e, order_l);
}

#[test]
fn test_lots_sans_date_toujours_en_dernier() {
    let mut lots = reference_lots();
    lots.push(lot("X", 100.0, None, "LOT-SANS-DATE"));

    for strategy in [Strategy::EarliestFirst, Strategy::LatestFirst] {
        let (allocations, _) = reconcile(
            &lots,
            &completed(&[("X", 160.0, 0.0)]),
            strategy,
        )
        .unwrap();
        assert_eq!(
            allocations.last().unwrap().lot_number,
            "LOT-SANS-DATE",
            "stratégie {:?}",
            strategy
        );
    }
}

#[test]
fn test_conservation_quand_les_lots_suffisent() {
    // Variance +25 absorbable : la somme des ajustements vaut la variance.
    let (allocations, stats) = reconcile(
        &reference_lots(),
        &completed(&[("X", 60.0, 85.0)]),
        Strategy::EarliestFirst,
    )
    .unwrap();

    let sum: f64 = allocations.iter().map(|a| a.adjustment).sum();
    assert!((sum - 25.0).abs() < TOLERANCE);
    assert!(stats.unallocated.abs() < TOLERANCE);
}

#[test]
fn test_ajout_plafonne_au_double_du_lot() {
    // Un seul lot de 10 : un surplus de 30 ne peut en imputer que 20.
    let lots = vec![lot("X", 10.0, Some((2025, 1, 1)), "LOT-JAN")];
    let (allocations, stats) = reconcile(
        &lots,
        &completed(&[("X", 10.0, 40.0)]),
        Strategy::EarliestFirst,
    )
    .unwrap();

    assert_eq!(allocations.len(), 1);
    assert!((allocations[0].adjustment - 20.0).abs() < TOLERANCE);
    assert!((allocations[0].corrected_quantity - 30.0).abs() < TOLERANCE);
    // Le reliquat est abandonné mais compté.
    assert!((stats.unallocated - 10.0).abs() < TOLERANCE);
}

#[test]
fn test_retrait_ne_rend_jamais_un_lot_negatif() {
    let lots = vec![lot("X", 10.0, Some((2025, 1, 1)), "LOT-JAN")];
    let (allocations, stats) = reconcile(
        &lots,
        &completed(&[("X", 10.0, 0.0)]),
        Strategy::EarliestFirst,
    )
    .unwrap();

    assert_eq!(allocations.len(), 1);
    assert!(allocations[0].corrected_quantity >= 0.0);
    assert!((allocations[0].corrected_quantity - 0.0).abs() < TOLERANCE);
    assert!(stats.unallocated.abs() < TOLERANCE);

    // Retrait excédentaire : la somme imputée reste bornée par le stock.
    let (allocations, stats) = reconcile(
        &lots,
        &completed(&[("X", 50.0, 0.0)]),
        Strategy::EarliestFirst,
    )
    .unwrap();
    let sum: f64 = allocations.iter().map(|a| a.adjustment).sum();
    assert!(sum.abs() < 50.0);
    assert!(allocations.iter().all(|a| a.corrected_quantity >= 0.0));
    assert!((stats.unallocated - (-40.0)).abs() < TOLERANCE);
}

#[test]
fn test_article_sans_lot_ignore_sans_erreur() {
    let (allocations, stats) = reconcile(
        &reference_lots(),
        &completed(&[("INCONNU", 0.0, 12.0)]),
        Strategy::EarliestFirst,
    )
    .unwrap();

    assert!(allocations.is_empty());
    assert_eq!(stats.adjusted_articles, 0);
}

#[test]
fn test_prerequis_manquants() {
    let err = reconcile(
        &[],
        &completed(&[("X", 0.0, 1.0)]),
        Strategy::EarliestFirst,
    )
    .unwrap_err();
    assert!(matches!(err, SageError::EmptyInput(_)));

    let empty = CompletedTemplate {
        columns: vec![],
        rows: vec![],
    };
    let err = reconcile(&reference_lots(), &empty, Strategy::EarliestFirst).unwrap_err();
    assert!(matches!(err, SageError::EmptyInput(_)));
}
