use chrono::{Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::models::SessionRecord;

/// Magasin de sessions adossé à SQLite. Chaque opération ouvre une
/// connexion courte ; le magasin lui-même ne retient que le chemin.
#[derive(Debug, Clone)]
pub struct SessionStore {
    db_path: PathBuf,
}

/// Mise à jour partielle d'une session : seuls les champs renseignés
/// sont écrits. `updated_at` et `last_accessed` sont rafraîchis à
/// chaque mise à jour.
#[derive(Debug, Clone, Default)]
pub struct SessionUpdate {
    pub original_file_path: Option<String>,
    pub template_file_path: Option<String>,
    pub completed_file_path: Option<String>,
    pub final_file_path: Option<String>,
    pub status: Option<String>,
    pub strategy_used: Option<String>,
    pub inventory_date: Option<String>,
    pub nb_articles: Option<i64>,
    pub nb_lots: Option<i64>,
    pub total_quantity: Option<f64>,
    pub header_lines: Option<String>,
}

fn now_str() -> String {
    Utc::now().to_rfc3339()
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<SessionRecord> {
    Ok(SessionRecord {
        id: row.get("id")?,
        original_filename: row.get("original_filename")?,
        original_file_path: row.get("original_file_path")?,
        template_file_path: row.get("template_file_path")?,
        completed_file_path: row.get("completed_file_path")?,
        final_file_path: row.get("final_file_path")?,
        status: row.get("status")?,
        strategy_used: row.get("strategy_used")?,
        inventory_date: row.get("inventory_date")?,
        nb_articles: row.get("nb_articles")?,
        nb_lots: row.get("nb_lots")?,
        total_quantity: row.get("total_quantity")?,
        header_lines: row.get("header_lines")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        last_accessed: row.get("last_accessed")?,
    })
}

const SELECT_COLUMNS: &str = "id, original_filename, original_file_path, template_file_path, \
     completed_file_path, final_file_path, status, strategy_used, inventory_date, \
     nb_articles, nb_lots, total_quantity, header_lines, created_at, updated_at, last_accessed";

impl SessionStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> SessionStore {
        SessionStore {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    fn open(&self) -> Result<Connection, Box<dyn Error>> {
        Ok(Connection::open(&self.db_path)?)
    }

    /// Crée le répertoire et la table si nécessaire.
    pub fn init_db(&self) -> Result<(), Box<dyn Error>> {
        if let Some(dir) = self.db_path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                std::fs::create_dir_all(dir)?;
            }
        }

        let conn = self.open()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                original_filename TEXT NOT NULL,
                original_file_path TEXT NOT NULL,
                template_file_path TEXT,
                completed_file_path TEXT,
                final_file_path TEXT,
                status TEXT NOT NULL,
                strategy_used TEXT,
                inventory_date TEXT,
                nb_articles INTEGER,
                nb_lots INTEGER,
                total_quantity REAL,
                header_lines TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                last_accessed TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Crée une session et renvoie son identifiant.
    pub fn create(
        &self,
        original_filename: &str,
        original_file_path: &str,
        status: &str,
    ) -> Result<String, Box<dyn Error>> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = now_str();

        let conn = self.open()?;
        conn.execute(
            "INSERT INTO sessions (id, original_filename, original_file_path, status,
                                   created_at, updated_at, last_accessed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?5)",
            params![id, original_filename, original_file_path, status, now],
        )?;

        info!("session créée : {}", id);
        Ok(id)
    }

    /// Récupère une session et rafraîchit `last_accessed`.
    pub fn get(&self, session_id: &str) -> Result<Option<SessionRecord>, Box<dyn Error>> {
        let conn = self.open()?;
        let sql = format!("SELECT {} FROM sessions WHERE id = ?1", SELECT_COLUMNS);
        let record = conn
            .query_row(&sql, params![session_id], row_to_record)
            .optional()?;

        if record.is_some() {
            conn.execute(
                "UPDATE sessions SET last_accessed = ?1 WHERE id = ?2",
                params![now_str(), session_id],
            )?;
        }
        Ok(record)
    }

    /// Met à jour les champs renseignés de `updates`. Renvoie `false`
    /// si la session n'existe pas.
    pub fn update(&self, session_id: &str, updates: &SessionUpdate) -> Result<bool, Box<dyn Error>> {
        let mut sets: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        macro_rules! set_field {
            ($field:ident) => {
                if let Some(v) = &updates.$field {
                    sets.push(format!("{} = ?{}", stringify!($field), values.len() + 1));
                    values.push(Box::new(v.clone()));
                }
            };
        }

        set_field!(original_file_path);
        set_field!(template_file_path);
        set_field!(completed_file_path);
        set_field!(final_file_path);
        set_field!(status);
        set_field!(strategy_used);
        set_field!(inventory_date);
        set_field!(nb_articles);
        set_field!(nb_lots);
        set_field!(total_quantity);
        set_field!(header_lines);

        let now = now_str();
        sets.push(format!("updated_at = ?{}", values.len() + 1));
        values.push(Box::new(now.clone()));
        sets.push(format!("last_accessed = ?{}", values.len() + 1));
        values.push(Box::new(now));

        let sql = format!(
            "UPDATE sessions SET {} WHERE id = ?{}",
            sets.join(", "),
            values.len() + 1
        );
        values.push(Box::new(session_id.to_string()));

        let conn = self.open()?;
        let refs: Vec<&dyn rusqlite::ToSql> = values.iter().map(|b| b.as_ref()).collect();
        let changed = conn.execute(&sql, refs.as_slice())?;

        if changed > 0 {
            info!("session {} mise à jour", session_id);
        }
        Ok(changed > 0)
    }

    /// Liste les sessions, les plus récentes d'abord. Sans
    /// `include_expired`, les sessions sans accès depuis 24 h sont omises.
    pub fn list(
        &self,
        limit: usize,
        include_expired: bool,
    ) -> Result<Vec<SessionRecord>, Box<dyn Error>> {
        let conn = self.open()?;
        let mut records: Vec<SessionRecord> = Vec::new();

        if include_expired {
            let sql = format!(
                "SELECT {} FROM sessions ORDER BY created_at DESC LIMIT ?1",
                SELECT_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![limit as i64], row_to_record)?;
            for r in rows {
                records.push(r?);
            }
        } else {
            let cutoff = (Utc::now() - Duration::hours(24)).to_rfc3339();
            let sql = format!(
                "SELECT {} FROM sessions WHERE last_accessed > ?1 ORDER BY created_at DESC LIMIT ?2",
                SELECT_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![cutoff, limit as i64], row_to_record)?;
            for r in rows {
                records.push(r?);
            }
        }

        Ok(records)
    }

    /// Supprime une session. Renvoie `false` si elle n'existait pas.
    pub fn delete(&self, session_id: &str) -> Result<bool, Box<dyn Error>> {
        let conn = self.open()?;
        let changed = conn.execute("DELETE FROM sessions WHERE id = ?1", params![session_id])?;
        if changed > 0 {
            info!("session {} supprimée", session_id);
        }
        Ok(changed > 0)
    }

    /// Supprime les sessions sans accès depuis `hours` heures et renvoie
    /// le nombre de lignes effacées.
    pub fn cleanup_expired(&self, hours: i64) -> Result<usize, Box<dyn Error>> {
        let cutoff = (Utc::now() - Duration::hours(hours)).to_rfc3339();
        let conn = self.open()?;
        let count = conn.execute(
            "DELETE FROM sessions WHERE last_accessed < ?1",
            params![cutoff],
        )?;
        info!("{} sessions expirées supprimées", count);
        Ok(count)
    }

    /// Sonde de santé : la base répond-elle ?
    pub fn health_check(&self) -> bool {
        self.open()
            .and_then(|conn| {
                conn.query_row("SELECT 1", [], |r| r.get::<_, i64>(0))
                    .map_err(|e| Box::new(e) as Box<dyn Error>)
            })
            .is_ok()
    }
}
