// ============================================================================
// Module : api
// ============================================================================
// Ce module contient les clients des APIs distantes :
// - restdb   : document store qui persiste les transactions
// - criptoya : agrégateur de prix des cryptos (lecture seule)
//
// Les deux clients partagent le même cycle de requête (send_json) :
// une requête, pas de retry, chaque échec est loggé puis renvoyé tel quel.
// ============================================================================

pub mod criptoya; // Client de l'agrégateur de prix
pub mod restdb;   // Client du document store

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::HeaderMap;
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::error::RemoteError;

// Re-export des clients principaux
pub use criptoya::PriceClient;
pub use restdb::TransactionStore;

/// Construit le client HTTP partagé par toutes les requêtes d'un client API
///
/// CONCEPT : Builder pattern (reqwest)
/// - default_headers : attachés à chaque requête (ex: clé API)
/// - timeout : seulement si configuré, sinon défaut du transport
fn build_http_client(headers: HeaderMap, timeout: Option<Duration>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .user_agent(concat!("cryptotracker/", env!("CARGO_PKG_VERSION")))
        .default_headers(headers);

    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    builder.build().context("Échec de la création du client HTTP")
}

/// Ajoute des segments de chemin à une URL de base
///
/// Chaque segment est encodé (percent-encoding) : un '/' dans une valeur
/// ne peut pas créer de segment supplémentaire.
fn endpoint(base: &Url, operation: &'static str, segments: &[&str]) -> Result<Url, RemoteError> {
    let mut url = base.clone();
    {
        let mut path = url.path_segments_mut().map_err(|_| {
            error!(operation, url = %base, "Base URL cannot take path segments");
            RemoteError::InvalidUrl {
                operation,
                url: base.to_string(),
            }
        })?;
        path.pop_if_empty().extend(segments);
    }
    Ok(url)
}

/// Envoie une requête et désérialise la réponse JSON
///
/// CONCEPT RUST : Généricité avec DeserializeOwned
/// - T est choisi par l'appelant (Vec<Transaction>, PriceQuote...)
/// - Un corps qui ne correspond pas à T devient RemoteError::Decode
async fn send_json<T: DeserializeOwned>(
    operation: &'static str,
    request: RequestBuilder,
) -> Result<T, RemoteError> {
    let response = request.send().await.map_err(|source| {
        error!(operation, error = %source, "HTTP request failed");
        RemoteError::Transport { operation, source }
    })?;

    let status = response.status();
    debug!(operation, status = %status, "Received HTTP response");

    let body = response.text().await.map_err(|source| {
        error!(operation, error = %source, "Failed to read response body");
        RemoteError::Transport { operation, source }
    })?;

    // Vérifie que la réponse est un succès HTTP (200-299)
    if !status.is_success() {
        error!(operation, status = %status, body = %body, "Remote API returned error status");
        return Err(RemoteError::Status {
            operation,
            status,
            body,
        });
    }

    serde_json::from_str(&body).map_err(|source| {
        error!(operation, error = %source, "Failed to decode response body");
        RemoteError::Decode { operation, source }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_appends_segments() {
        let base = Url::parse("https://example.restdb.io/rest/").unwrap();
        let url = endpoint(&base, "test", &["transactions", "abc123"]).unwrap();

        assert_eq!(url.as_str(), "https://example.restdb.io/rest/transactions/abc123");
    }

    #[test]
    fn test_endpoint_encodes_slashes() {
        let base = Url::parse("https://criptoya.com/api/").unwrap();
        let url = endpoint(&base, "test", &["btc", "usd/ars", "1"]).unwrap();

        assert_eq!(url.as_str(), "https://criptoya.com/api/btc/usd%2Fars/1");
    }

    #[test]
    fn test_endpoint_rejects_non_base_url() {
        let base = Url::parse("mailto:prices@example.com").unwrap();
        let err = endpoint(&base, "get_crypto_price", &["btc"]).unwrap_err();

        assert!(matches!(err, RemoteError::InvalidUrl { operation: "get_crypto_price", .. }));
    }
}
