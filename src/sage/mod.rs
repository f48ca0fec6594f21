// Format de fichier Sage X3 : constantes de colonnes, lecture, parsing,
// extraction de dates et réémission de l'export corrigé.

pub mod dates;
pub mod export;
pub mod io;
pub mod parser;

/// Séparateur de champs des exports Sage X3.
pub const DELIMITER: char = ';';

/// Nombre de colonnes attendues sur une ligne de données `S;`.
pub const EXPECTED_COLUMNS: usize = 15;

/// Index des colonnes d'une ligne `S;` (0-based).
pub mod col {
    pub const TYPE_LIGNE: usize = 0;
    pub const NUMERO_SESSION: usize = 1;
    pub const NUMERO_INVENTAIRE: usize = 2;
    pub const RANG: usize = 3;
    pub const SITE: usize = 4;
    pub const QUANTITE: usize = 5;
    pub const QUANTITE_REELLE_IN_INPUT: usize = 6;
    pub const INDICATEUR_COMPTE: usize = 7;
    pub const CODE_ARTICLE: usize = 8;
    pub const EMPLACEMENT: usize = 9;
    pub const STATUT: usize = 10;
    pub const UNITE: usize = 11;
    pub const VALEUR: usize = 12;
    pub const ZONE_PK: usize = 13;
    pub const NUMERO_LOT: usize = 14;
}

/// Noms des 15 colonnes, dans l'ordre du fichier.
pub const COLUMN_NAMES: [&str; EXPECTED_COLUMNS] = [
    "TYPE_LIGNE",
    "NUMERO_SESSION",
    "NUMERO_INVENTAIRE",
    "RANG",
    "SITE",
    "QUANTITE",
    "QUANTITE_REELLE_IN_INPUT",
    "INDICATEUR_COMPTE",
    "CODE_ARTICLE",
    "EMPLACEMENT",
    "STATUT",
    "UNITE",
    "VALEUR",
    "ZONE_PK",
    "NUMERO_LOT",
];
