// ============================================================================
// API Client : CriptoYa (agrégateur de prix)
// ============================================================================
// Récupère la cotation actuelle d'une crypto pour une monnaie fiat et un
// volume donnés : GET https://criptoya.com/api/<coin>/<fiat>/<volume>
//
// Pas d'authentification, aucun état : le client ne connaît ni l'utilisateur
// ni le document store.
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Url;
use tracing::{debug, info, instrument};

use super::{build_http_client, endpoint, send_json};
use crate::config::Config;
use crate::error::RemoteError;
use crate::models::PriceQuote;

/// Client de l'agrégateur de prix
#[derive(Debug, Clone)]
pub struct PriceClient {
    http_client: reqwest::Client,
    base_url: Url,
}

impl PriceClient {
    /// Crée le client à partir de la configuration
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_base_url(config.price_url.clone(), config.timeout)
    }

    /// Crée le client avec une URL de base explicite (utile pour les tests)
    pub fn with_base_url(base_url: Url, timeout: Option<Duration>) -> Result<Self> {
        if base_url.cannot_be_a_base() {
            anyhow::bail!("URL de l'agrégateur invalide : {}", base_url);
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self {
            http_client: build_http_client(headers, timeout)?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Récupère la cotation de `coin` en `fiat` pour `volume` unités
    ///
    /// Les valeurs sont insérées telles quelles dans le chemin (aucune
    /// validation), mais chacune est encodée comme un seul segment.
    ///
    /// # Exemple
    /// let quote = client.get_crypto_price("btc", "usd", "1").await?;
    /// println!("{:?}", quote.best_ask());
    #[instrument(skip(self))]
    pub async fn get_crypto_price(&self, coin: &str, fiat: &str, volume: &str) -> Result<PriceQuote, RemoteError> {
        const OPERATION: &str = "get_crypto_price";

        let url = endpoint(&self.base_url, OPERATION, &[coin, fiat, volume])?;
        debug!(url = %url, "Fetching crypto price");

        let quote: PriceQuote = send_json(OPERATION, self.http_client.get(url)).await?;

        info!(exchanges = quote.len(), "Crypto price fetched");
        Ok(quote)
    }
}
