use thiserror::Error;

/// Erreurs du traitement d'un export Sage X3, du parsing à l'écriture
/// du fichier corrigé. Les messages sont destinés à l'utilisateur final
/// et remontés tels quels par l'API.
#[derive(Error, Debug)]
pub enum SageError {
    /// Ligne S; trop courte : le format d'export est figé à 15 colonnes.
    #[error("Ligne {line} (S;) : format invalide. {expected} colonnes requises, {found} trouvées")]
    Format {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Le fichier est vide")]
    EmptyFile,

    #[error("Aucune ligne de stock (S;) trouvée dans le fichier")]
    NoData,

    /// Étape appelée sans données d'entrée ({0} nomme l'étape).
    #[error("Aucune donnée fournie pour : {0}")]
    EmptyInput(&'static str),

    #[error("Lecture impossible : {0}")]
    Read(String),

    #[error("Validation échouée : {0}")]
    Validation(String),

    #[error("Erreur d'entrée/sortie : {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = SageError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_format_ligne() {
        let e = SageError::Format {
            line: 3,
            expected: 15,
            found: 10,
        };
        assert_eq!(
            format!("{}", e),
            "Ligne 3 (S;) : format invalide. 15 colonnes requises, 10 trouvées"
        );
    }

    #[test]
    fn test_conversion_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "introuvable");
        let e: SageError = io.into();
        assert!(matches!(e, SageError::Io(_)));
        assert!(format!("{}", e).contains("introuvable"));
    }

    #[test]
    fn test_message_entree_vide() {
        let e = SageError::EmptyInput("agrégation");
        assert_eq!(format!("{}", e), "Aucune donnée fournie pour : agrégation");
    }
}
