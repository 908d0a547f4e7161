// ============================================================================
// API Client : RestDB (document store des transactions)
// ============================================================================
// Traduit les opérations logiques (lister, acheter, vendre, modifier,
// supprimer) en requêtes sur la collection "transactions".
//
// - GET    transactions?q={"user_id":"<id>"}  filtre côté serveur
// - POST   transactions                        création
// - PATCH  transactions/<id>                   mise à jour partielle
// - DELETE transactions/<id>                   suppression
//
// Chaque requête porte l'en-tête x-apikey (clé de déploiement, pas une clé
// par utilisateur). Une opération = une requête, aucun retry, aucun cache.
// ============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use super::{build_http_client, endpoint, send_json};
use crate::config::Config;
use crate::error::RemoteError;
use crate::models::{NewTransaction, Transaction, TransactionId, TransactionPatch};

/// Nom de l'en-tête qui porte la clé API
pub const API_KEY_HEADER: &str = "x-apikey";

/// Réponse du store à une suppression : {"result": ["<id>"]}
#[derive(Debug, Deserialize)]
struct DeleteResponse {
    result: Vec<TransactionId>,
}

/// Client de la collection "transactions"
#[derive(Debug, Clone)]
pub struct TransactionStore {
    http_client: reqwest::Client,
    base_url: Url,
}

impl TransactionStore {
    const COLLECTION: &'static str = "transactions";

    /// Crée le client à partir de la configuration
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_base_url(config.store_url.clone(), &config.api_key, config.timeout)
    }

    /// Crée le client avec une URL de base explicite (utile pour les tests)
    pub fn with_base_url(base_url: Url, api_key: &str, timeout: Option<Duration>) -> Result<Self> {
        if base_url.cannot_be_a_base() {
            anyhow::bail!("URL du document store invalide : {}", base_url);
        }

        let mut api_key = HeaderValue::from_str(api_key).context("Clé API invalide pour un en-tête HTTP")?;
        // Jamais affichée dans les logs de reqwest
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, api_key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        Ok(Self {
            http_client: build_http_client(headers, timeout)?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Liste les transactions d'un utilisateur
    ///
    /// Le filtre est appliqué par le store ; l'ordre est celui qu'il renvoie
    /// (pas forcément chronologique).
    #[instrument(skip(self))]
    pub async fn list_transactions(&self, user_id: &str) -> Result<Vec<Transaction>, RemoteError> {
        const OPERATION: &str = "list_transactions";

        let url = endpoint(&self.base_url, OPERATION, &[Self::COLLECTION])?;
        // CONCEPT : json! échappe les guillemets éventuels du user_id
        let filter = serde_json::json!({ "user_id": user_id }).to_string();
        debug!(url = %url, filter = %filter, "Listing transactions");

        let request = self.http_client.get(url).query(&[("q", filter)]);
        let transactions: Vec<Transaction> = send_json(OPERATION, request).await?;

        info!(count = transactions.len(), "Transactions listed");
        Ok(transactions)
    }

    /// Enregistre un achat
    pub async fn create_purchase(
        &self,
        user_id: &str,
        crypto_code: &str,
        crypto_amount: f64,
        money: f64,
        datetime: DateTime<Utc>,
    ) -> Result<Transaction, RemoteError> {
        let body = NewTransaction::purchase(user_id, crypto_code, crypto_amount, money, datetime);
        self.create_transaction(&body).await
    }

    /// Enregistre une vente
    pub async fn create_sale(
        &self,
        user_id: &str,
        crypto_code: &str,
        crypto_amount: f64,
        money: f64,
        datetime: DateTime<Utc>,
    ) -> Result<Transaction, RemoteError> {
        let body = NewTransaction::sale(user_id, crypto_code, crypto_amount, money, datetime);
        self.create_transaction(&body).await
    }

    /// Soumet une transaction et retourne la version confirmée par le store
    ///
    /// Aucune validation locale : le store est la seule source de vérité.
    #[instrument(skip(self, body), fields(user_id = %body.user_id, action = %body.action, crypto_code = %body.crypto_code))]
    pub async fn create_transaction(&self, body: &NewTransaction) -> Result<Transaction, RemoteError> {
        const OPERATION: &str = "create_transaction";

        let url = endpoint(&self.base_url, OPERATION, &[Self::COLLECTION])?;
        debug!(url = %url, "Creating transaction");

        let created: Transaction = send_json(OPERATION, self.http_client.post(url).json(body)).await?;

        info!(id = %created.id, "Transaction created");
        Ok(created)
    }

    /// Applique une mise à jour partielle (merge) sur une transaction
    ///
    /// Un identifiant inconnu est signalé par le store (RemoteError::Status).
    #[instrument(skip(self, patch), fields(id = %id))]
    pub async fn update_transaction(
        &self,
        id: &TransactionId,
        patch: &TransactionPatch,
    ) -> Result<Transaction, RemoteError> {
        const OPERATION: &str = "update_transaction";

        let url = endpoint(&self.base_url, OPERATION, &[Self::COLLECTION, id.as_str()])?;
        debug!(url = %url, ?patch, "Updating transaction");

        let updated: Transaction = send_json(OPERATION, self.http_client.patch(url).json(patch)).await?;

        info!("Transaction updated");
        Ok(updated)
    }

    /// Supprime une transaction et retourne les identifiants supprimés
    ///
    /// Pas idempotent : supprimer deux fois le même identifiant échoue
    /// la seconde fois (le store répond "not found").
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_transaction(&self, id: &TransactionId) -> Result<Vec<TransactionId>, RemoteError> {
        const OPERATION: &str = "delete_transaction";

        let url = endpoint(&self.base_url, OPERATION, &[Self::COLLECTION, id.as_str()])?;
        debug!(url = %url, "Deleting transaction");

        let response: DeleteResponse = send_json(OPERATION, self.http_client.delete(url)).await?;

        info!(deleted = response.result.len(), "Transaction deleted");
        Ok(response.result)
    }
}
