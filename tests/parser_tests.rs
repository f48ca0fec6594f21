use stocktake::error::SageError;
use stocktake::pipeline::validate::validate_structure;
use stocktake::sage::parser::parse_csv;

use std::path::PathBuf;

fn write_fixture(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("stocktake_parser_{}_{}", std::process::id(), name));
    std::fs::write(&path, content).unwrap();
    path
}

const VALID_CSV: &str = "\
E;SES1;entete;;;;;;;;;;;;
L;SES1;lot;;;;;;;;;;;;
S;SES1;2904INV001;1;SITE1;10;;;ART1;EMP1;A;UN;100;Z1;CPKU12501250001
S;SES1;2904INV001;2;SITE1;20;;;ART1;EMP1;A;UN;200;Z1;CPKU12502250002

S;SES1;2904INV001;3;SITE1;30;;;ART2;EMP2;A;UN;300;Z2;LOTSANSDATE
";

#[test]
fn test_parse_csv_nominal() {
    let path = write_fixture("nominal.csv", VALID_CSV);
    let parsed = parse_csv(&path).unwrap();

    assert_eq!(parsed.headers.len(), 2);
    assert_eq!(parsed.headers[0], "E;SES1;entete;;;;;;;;;;;;");
    assert_eq!(parsed.rows.len(), 3);
    assert_eq!(parsed.first_inventory_number.as_deref(), Some("2904INV001"));

    let first = &parsed.rows[0];
    assert_eq!(first.article_code, "ART1");
    assert_eq!(first.quantity, Some(10.0));
    assert_eq!(first.site, "SITE1");
    assert_eq!(first.lot_number, "CPKU12501250001");
    assert!(first.lot_date.is_some());
    assert_eq!(
        first.raw_line,
        "S;SES1;2904INV001;1;SITE1;10;;;ART1;EMP1;A;UN;100;Z1;CPKU12501250001"
    );

    // Le lot sans motif de date reste sans date, sans erreur.
    assert!(parsed.rows[2].lot_date.is_none());
}

#[test]
fn test_ligne_courte_echoue_avec_numero_de_ligne() {
    // 10 colonnes au lieu de 15, en 3e ligne du fichier.
    let content = "\
E;SES1;entete
S;SES1;INV1;1;SITE1;10;;;ART1;EMP1;A;UN;100;Z1;LOT1
S;SES1;INV1;2;SITE1;20;;;ART1;EMP1
";
    let path = write_fixture("courte.csv", content);
    let err = parse_csv(&path).unwrap_err();
    match err {
        SageError::Format {
            line,
            expected,
            found,
        } => {
            assert_eq!(line, 3);
            assert_eq!(expected, 15);
            assert_eq!(found, 10);
        }
        other => panic!("erreur inattendue : {:?}", other),
    }
    assert!(format!("{}", parse_csv(&path).unwrap_err()).contains("Ligne 3"));
}

#[test]
fn test_colonnes_excedentaires_tronquees() {
    let content = "S;SES1;INV1;1;SITE1;10;;;ART1;EMP1;A;UN;100;Z1;LOT1;EXTRA;EXTRA2\n";
    let path = write_fixture("extra.csv", content);
    let parsed = parse_csv(&path).unwrap();
    assert_eq!(parsed.rows.len(), 1);
    // La ligne brute est reconstituée sur les 15 colonnes canoniques.
    assert_eq!(
        parsed.rows[0].raw_line,
        "S;SES1;INV1;1;SITE1;10;;;ART1;EMP1;A;UN;100;Z1;LOT1"
    );
}

#[test]
fn test_fichier_vide() {
    let path = write_fixture("vide.csv", "");
    assert!(matches!(parse_csv(&path).unwrap_err(), SageError::EmptyFile));
}

#[test]
fn test_aucune_donnee_s() {
    let path = write_fixture("sans_s.csv", "E;SES1;entete\nL;SES1;lot\n");
    assert!(matches!(parse_csv(&path).unwrap_err(), SageError::NoData));
}

#[test]
fn test_quantite_non_numerique_rejetee_par_la_validation() {
    let content = "S;SES1;INV1;1;SITE1;abc;;;ART1;EMP1;A;UN;100;Z1;LOT1\n";
    let path = write_fixture("qty.csv", content);
    let parsed = parse_csv(&path).unwrap();
    assert!(parsed.rows[0].quantity.is_none());

    let err = validate_structure(&parsed.rows).unwrap_err();
    assert!(format!("{}", err).contains("quantité invalides"));
}

#[test]
fn test_code_article_vide_rejete() {
    let content = "S;SES1;INV1;1;SITE1;10;;; ;EMP1;A;UN;100;Z1;LOT1\n";
    let path = write_fixture("article.csv", content);
    let parsed = parse_csv(&path).unwrap();
    let err = validate_structure(&parsed.rows).unwrap_err();
    assert!(format!("{}", err).contains("codes articles vides"));
}
