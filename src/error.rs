// ============================================================================
// Module : error
// ============================================================================
// Taxonomie des erreurs renvoyées par les clients distants (document store
// et agrégateur de prix).
//
// CONCEPT RUST : thiserror
// - #[derive(Error)] génère l'implémentation de std::error::Error
// - #[source] chaîne la cause sous-jacente (visible avec {:?} ou anyhow)
// - Le binaire convertit ensuite en anyhow::Error avec ?
// ============================================================================

use reqwest::StatusCode;
use thiserror::Error;

/// Échec d'un appel vers une API distante
///
/// Chaque variante porte le nom de l'opération qui a échoué
/// (ex: "list_transactions") pour que le message reste lisible côté appelant.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// La requête n'a pas abouti (DNS, connexion, timeout...)
    #[error("{operation} : échec de la requête HTTP")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Le serveur a répondu avec un statut hors 2xx
    #[error("{operation} : le serveur a retourné HTTP {status} : {body}")]
    Status {
        operation: &'static str,
        status: StatusCode,
        body: String,
    },

    /// Réponse 2xx dont le corps ne correspond pas au format attendu
    #[error("{operation} : réponse JSON invalide")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// L'URL de la requête n'a pas pu être construite
    #[error("{operation} : URL invalide ({url})")]
    InvalidUrl { operation: &'static str, url: String },
}

impl RemoteError {
    /// Statut HTTP de la réponse, si le serveur a répondu
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            RemoteError::Status { status, .. } => Some(*status),
            RemoteError::Transport { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Vrai si le serveur a répondu 404 (enregistrement inexistant)
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// Nom de l'opération qui a échoué
    pub fn operation(&self) -> &'static str {
        match self {
            RemoteError::Transport { operation, .. }
            | RemoteError::Status { operation, .. }
            | RemoteError::Decode { operation, .. }
            | RemoteError::InvalidUrl { operation, .. } => *operation,
        }
    }
}

/// Navigation refusée par le RouteGuard : aucun utilisateur connecté
///
/// Le guard lui-même ne renvoie jamais d'erreur (il redirige vers /login) ;
/// cette erreur sert aux appelants qui ne peuvent pas afficher la vue de login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("authentification requise : connectez-vous d'abord (/login)")]
pub struct AuthRequired;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_is_not_found() {
        let err = RemoteError::Status {
            operation: "delete_transaction",
            status: StatusCode::NOT_FOUND,
            body: "{}".to_string(),
        };

        assert!(err.is_not_found());
        assert_eq!(err.operation(), "delete_transaction");
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_decode_error_has_no_status() {
        let source = serde_json::from_str::<u32>("\"oops\"").unwrap_err();
        let err = RemoteError::Decode {
            operation: "get_crypto_price",
            source,
        };

        assert_eq!(err.status(), None);
        assert!(!err.is_not_found());
    }
}
