// Bibliothèque racine du crate `stocktake` : traitement des exports
// d'inventaire Sage X3 (parsing, agrégation, template de saisie,
// répartition des écarts, réémission corrigée) et API HTTP associée.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod sage;
pub mod screening;
pub mod server;
mod server_handlers;
pub mod sessions;

pub use server::run_server;
