use std::env;
use std::path::PathBuf;

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Configuration du service, lue depuis l'environnement (un fichier
/// `.env` est chargé au démarrage s'il existe).
#[derive(Debug, Clone)]
pub struct Config {
    /// Dossier des fichiers reçus.
    pub upload_folder: PathBuf,
    /// Dossier des templates générés et complétés.
    pub processed_folder: PathBuf,
    /// Dossier des exports corrigés.
    pub final_folder: PathBuf,
    /// Chemin de la base SQLite des sessions.
    pub sessions_db_path: PathBuf,
    /// Taille maximale d'un upload, en octets.
    pub max_file_size: usize,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Config {
        let max_file_size = env::var("MAX_FILE_SIZE")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(16 * 1024 * 1024);

        Config {
            upload_folder: PathBuf::from(env_or("UPLOAD_FOLDER", "uploads")),
            processed_folder: PathBuf::from(env_or("PROCESSED_FOLDER", "processed")),
            final_folder: PathBuf::from(env_or("FINAL_FOLDER", "final")),
            sessions_db_path: PathBuf::from(env_or("SESSIONS_DB_PATH", "data/sessions.db")),
            max_file_size,
            bind_addr: env_or("BIND_ADDR", "127.0.0.1:8080"),
        }
    }

    /// Crée les dossiers de travail au démarrage.
    pub fn ensure_folders(&self) -> std::io::Result<()> {
        for dir in [&self.upload_folder, &self.processed_folder, &self.final_folder] {
            std::fs::create_dir_all(dir)?;
        }
        if let Some(parent) = self.sessions_db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}
