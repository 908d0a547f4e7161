// ============================================================================
// Module : models
// ============================================================================
// Ce module contient toutes les structures de données de l'application
//
// CONCEPT RUST : Modules et visibilité
// - "pub mod" : déclare un sous-module publique (accessible depuis l'extérieur)
// - Sans "pub", le module serait privé au crate
// ============================================================================

pub mod transaction; // Transactions du document store (achat / vente)
pub mod price_quote; // Cotations de l'agrégateur
pub mod portfolio;   // Agrégation de l'historique par crypto

// Re-export des structures principales pour simplifier les imports
// Au lieu de : use cryptotracker::models::transaction::Transaction;
// On peut faire : use cryptotracker::models::Transaction;
pub use transaction::{parse_datetime, Action, NewTransaction, Transaction, TransactionId, TransactionPatch};
pub use price_quote::{ExchangeQuote, PriceQuote};
pub use portfolio::{Holding, Portfolio};
