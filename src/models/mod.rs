// Structures de données principales du pipeline Sage X3.

use chrono::NaiveDate;

/// Une ligne de stock `S;` parsée : les 15 colonnes de l'export Sage X3,
/// plus la date de lot dérivée et la ligne brute d'origine (conservée
/// telle quelle pour la réémission finale).
#[derive(Debug, Clone, serde::Serialize)]
pub struct StockRow {
    pub line_type: String,
    pub session_number: String,
    pub inventory_number: String,
    pub rank: String,
    pub site: String,
    /// Quantité théorique. `None` si la valeur source n'est pas numérique ;
    /// la validation structurelle rejette alors le fichier.
    pub quantity: Option<f64>,
    pub real_quantity_input: String,
    pub count_indicator: String,
    pub article_code: String,
    pub location: String,
    pub status: String,
    pub unit: String,
    pub value: String,
    pub zone: String,
    pub lot_number: String,
    /// Date extraite du numéro de lot, si le motif est présent.
    pub lot_date: Option<NaiveDate>,
    /// Ligne source, reconstituée sur les 15 colonnes canoniques.
    pub raw_line: String,
}

/// Une ligne agrégée : une par combinaison
/// (article, statut, emplacement, zone, unité).
#[derive(Debug, Clone, serde::Serialize)]
pub struct AggregateRow {
    pub article_code: String,
    pub status: String,
    pub location: String,
    pub zone: String,
    pub unit: String,
    pub total_quantity: f64,
    pub session_number: String,
    pub inventory_number: String,
    pub site: String,
    /// Plus ancienne date de lot du groupe ; absente si aucun lot n'en porte.
    pub min_lot_date: Option<NaiveDate>,
}

/// Le template complété relu depuis Excel. La liste des en-têtes est
/// conservée telle que trouvée pour signaler les colonnes manquantes.
#[derive(Debug, Clone)]
pub struct CompletedTemplate {
    pub columns: Vec<String>,
    pub rows: Vec<CompletedRow>,
}

/// Une ligne saisie par l'utilisateur dans le template.
#[derive(Debug, Clone)]
pub struct CompletedRow {
    pub article_code: String,
    /// `None` = cellule vide ou non numérique.
    pub theoretical_quantity: Option<f64>,
    pub actual_quantity: Option<f64>,
}

/// Stratégie d'imputation des écarts sur les lots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Les lots les plus anciens absorbent l'écart en premier.
    EarliestFirst,
    /// Les lots les plus récents absorbent l'écart en premier.
    LatestFirst,
}

impl Strategy {
    /// Reconnaît les jetons canoniques et les alias historiques du
    /// frontend (`FIFO`/`LIFO`).
    pub fn from_token(token: &str) -> Option<Strategy> {
        match token.trim().to_uppercase().as_str() {
            "EARLIEST_FIRST" | "FIFO" => Some(Strategy::EarliestFirst),
            "LATEST_FIRST" | "LIFO" => Some(Strategy::LatestFirst),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::EarliestFirst => "EARLIEST_FIRST",
            Strategy::LatestFirst => "LATEST_FIRST",
        }
    }
}

/// Une correction émise pour un lot pendant la répartition d'un écart.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Allocation {
    pub article_code: String,
    pub lot_number: String,
    pub original_quantity: f64,
    /// Ajustement signé appliqué au lot.
    pub adjustment: f64,
    pub corrected_quantity: f64,
    pub lot_date: Option<NaiveDate>,
    /// Ligne brute du lot, pour la réémission avec la seule colonne
    /// quantité remplacée.
    pub raw_line: String,
}

/// Statistiques d'une passe de répartition.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ReconcileStats {
    /// Somme signée des écarts traités.
    pub total_discrepancy: f64,
    /// Nombre d'articles ayant reçu au moins un ajustement.
    pub adjusted_articles: usize,
    /// Part des écarts restée sans lot pour l'absorber (comportement
    /// hérité : abandonnée, mais remontée ici et en log).
    pub unallocated: f64,
}

/// Une session de traitement telle que stockée en base.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionRecord {
    pub id: String,
    pub original_filename: String,
    pub original_file_path: String,
    pub template_file_path: Option<String>,
    pub completed_file_path: Option<String>,
    pub final_file_path: Option<String>,
    pub status: String,
    pub strategy_used: Option<String>,
    pub inventory_date: Option<String>,
    pub nb_articles: Option<i64>,
    pub nb_lots: Option<i64>,
    pub total_quantity: Option<f64>,
    /// Lignes d'en-tête `E;`/`L;` du fichier d'origine, en JSON.
    pub header_lines: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub last_accessed: String,
}
