// Chaîne complète sur un petit export : parsing, agrégation, saisie
// simulée, répartition des écarts et réémission du fichier corrigé.

use stocktake::models::{CompletedRow, CompletedTemplate, Strategy};
use stocktake::pipeline::{aggregate::aggregate, reconcile::reconcile, validate::validate_structure};
use stocktake::sage::export::render_corrected_lines;
use stocktake::sage::parser::parse_csv;

use std::path::PathBuf;

const EXPORT: &str = "\
E;SES1;entete;;;;;;;;;;;;
L;SES1;lot;;;;;;;;;;;;
S;SES1;2904INV001;1;SITE1;10;;;X;EMP1;A;UN;100;Z1;CPKU12501250001
S;SES1;2904INV001;2;SITE1;20;;;X;EMP1;A;UN;200;Z1;CPKU12502250002
S;SES1;2904INV001;3;SITE1;30;;;X;EMP1;A;UN;300;Z1;CPKU12503250003
S;SES1;2904INV001;4;SITE1;7;;;Y;EMP2;A;UN;70;Z2;CPKU12501250004
";

fn fixture() -> PathBuf {
    let path = std::env::temp_dir().join(format!("stocktake_e2e_{}.csv", std::process::id()));
    std::fs::write(&path, EXPORT).unwrap();
    path
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

#[test]
fn test_chaine_complete_surplus() {
    let parsed = parse_csv(fixture()).unwrap();
    validate_structure(&parsed.rows).unwrap();

    let aggs = aggregate(&parsed.rows).unwrap();
    let x = aggs.iter().find(|a| a.article_code == "X").unwrap();
    assert_eq!(x.total_quantity, 60.0);
    assert_eq!(
        x.min_lot_date,
        chrono::NaiveDate::from_ymd_opt(2025, 1, 1)
    );

    // L'utilisateur compte 65 pour X, Y inchangé.
    let saisie = completed(&[("X", 60.0, 65.0), ("Y", 7.0, 7.0)]);
    let (allocations, stats) =
        reconcile(&parsed.rows, &saisie, Strategy::EarliestFirst).unwrap();

    assert_eq!(allocations.len(), 1);
    assert_eq!(stats.adjusted_articles, 1);

    let out = render_corrected_lines(&parsed.headers, &allocations);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "E;SES1;entete;;;;;;;;;;;;");
    assert_eq!(lines[1], "L;SES1;lot;;;;;;;;;;;;");
    // Seule la quantité du lot de janvier change : 10 -> 15.
    assert_eq!(
        lines[2],
        "S;SES1;2904INV001;1;SITE1;15;;;X;EMP1;A;UN;100;Z1;CPKU12501250001"
    );
}

#[test]
fn test_ligne_inchangee_restituee_octet_pour_octet() {
    let parsed = parse_csv(fixture()).unwrap();

    // Ajustement nul forcé : la ligne réémise doit être identique à la
    // ligne source.
    let lot = &parsed.rows[3];
    let alloc = stocktake::models::Allocation {
        article_code: lot.article_code.clone(),
        lot_number: lot.lot_number.clone(),
        original_quantity: lot.quantity.unwrap(),
        adjustment: 0.0,
        corrected_quantity: lot.quantity.unwrap(),
        lot_date: lot.lot_date,
        raw_line: lot.raw_line.clone(),
    };
    let out = render_corrected_lines(&[], &[alloc]);
    assert_eq!(
        out,
        "S;SES1;2904INV001;4;SITE1;7;;;Y;EMP2;A;UN;70;Z2;CPKU12501250004\n"
    );
}

#[test]
fn test_date_inventaire_derivee_du_premier_numero() {
    use chrono::TimeZone;
    let parsed = parse_csv(fixture()).unwrap();
    let ts = chrono::Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap();
    assert_eq!(
        parsed.inventory_date(ts),
        chrono::NaiveDate::from_ymd_opt(2025, 4, 29)
    );
}
