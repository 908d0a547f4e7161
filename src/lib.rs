// ============================================================================
// CryptoTracker - Library
// ============================================================================
// Expose les modules publics pour le binaire, les tests et toute autre UI
// ============================================================================

pub mod api;     // Clients RestDB (transactions) et CriptoYa (prix)
pub mod app;     // État de l'application
pub mod config;  // Configuration de déploiement
pub mod error;   // RemoteError, AuthRequired
pub mod models;  // Structures de données
pub mod router;  // Table de routage et RouteGuard
pub mod session; // Contexte d'authentification

pub use error::{AuthRequired, RemoteError};
