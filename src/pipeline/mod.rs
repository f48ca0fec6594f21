// Pipeline métier : agrégation, template de saisie, validation et
// répartition des écarts. L'état d'un traitement vit dans un
// `RunContext` possédé par l'invocation — aucun état global.

pub mod aggregate;
pub mod reconcile;
pub mod template;
pub mod validate;

use chrono::{DateTime, NaiveDate, Utc};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::AggregateRow;
use crate::sage::parser::{self, ParsedExport};

/// Tables d'un traitement en cours, construites une fois à l'ingestion
/// et passées explicitement d'étape en étape.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub session_id: String,
    pub received_at: DateTime<Utc>,
    pub parsed: ParsedExport,
    pub aggregates: Vec<AggregateRow>,
    pub inventory_date: Option<NaiveDate>,
}

impl RunContext {
    /// Parse le fichier, valide la structure métier et agrège les lignes.
    /// Toute erreur interrompt l'ingestion ; aucune table partielle n'est
    /// renvoyée.
    pub fn ingest<P: AsRef<Path>>(
        session_id: &str,
        path: P,
        extension: &str,
        received_at: DateTime<Utc>,
    ) -> Result<RunContext> {
        let parsed = parser::parse_export(path, extension)?;
        validate::validate_structure(&parsed.rows)?;
        let aggregates = aggregate::aggregate(&parsed.rows)?;
        let inventory_date = parsed.inventory_date(received_at);

        Ok(RunContext {
            session_id: session_id.to_string(),
            received_at,
            parsed,
            aggregates,
            inventory_date,
        })
    }

    /// Écrit le template de saisie pour ce traitement.
    pub fn write_template<P: AsRef<Path>>(&self, output_folder: P) -> Result<PathBuf> {
        template::generate_template(&self.aggregates, &self.session_id, output_folder)
    }

    pub fn nb_articles(&self) -> usize {
        self.aggregates.len()
    }

    pub fn nb_lots(&self) -> usize {
        self.parsed.rows.len()
    }

    pub fn total_quantity(&self) -> f64 {
        self.aggregates.iter().map(|a| a.total_quantity).sum()
    }
}
