// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état global de l'application : clients distants, contexte
// d'authentification, session persistée et vue courante.
//
// PATTERN : Cette structure suit le pattern "Application State"
// - Toute UI (CLI, TUI, web...) passe par App
// - Les opérations qui demandent un utilisateur utilisent le contexte
//   d'authentification au lieu d'un état global
// ============================================================================

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use crate::api::{PriceClient, TransactionStore};
use crate::config::Config;
use crate::error::AuthRequired;
use crate::models::{Action, NewTransaction, Portfolio, PriceQuote, Transaction};
use crate::router::{Navigation, Route, RouteGuard};
use crate::session::{AuthContext, SessionFile};

/// État principal de l'application
pub struct App {
    store: TransactionStore,
    prices: PriceClient,
    auth: AuthContext,
    session_file: SessionFile,
    guard: RouteGuard,

    /// Vue actuellement affichée
    pub current_route: Route,
}

impl App {
    /// Construit l'application depuis la configuration et restaure la session
    pub fn new(config: &Config) -> Result<Self> {
        let store = TransactionStore::new(config)?;
        let prices = PriceClient::new(config)?;
        let session_file = SessionFile::new(config.session_file.clone());
        let auth = session_file.load()?;

        Ok(Self::with_parts(store, prices, auth, session_file))
    }

    /// Assemble l'application à partir de composants déjà construits
    pub fn with_parts(
        store: TransactionStore,
        prices: PriceClient,
        auth: AuthContext,
        session_file: SessionFile,
    ) -> Self {
        let guard = RouteGuard::new(auth.clone());
        Self {
            store,
            prices,
            auth,
            session_file,
            guard,
            current_route: Route::Home,
        }
    }

    pub fn store(&self) -> &TransactionStore {
        &self.store
    }

    pub fn prices(&self) -> &PriceClient {
        &self.prices
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    // ========================================================================
    // Session
    // ========================================================================

    /// Connecte un utilisateur et persiste son identifiant
    pub fn login(&mut self, user_id: &str) -> Result<()> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            anyhow::bail!("Identifiant utilisateur vide");
        }

        self.auth.login(user_id);
        self.session_file.save(&self.auth)?;
        Ok(())
    }

    /// Déconnecte l'utilisateur et efface la session persistée
    pub fn logout(&mut self) -> Result<()> {
        self.auth.logout();
        self.session_file.clear()
    }

    /// Utilisateur connecté, ou AuthRequired
    pub fn require_user(&self) -> Result<String> {
        self.auth.current_user().ok_or_else(|| AuthRequired.into())
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Tente d'ouvrir une vue ; le RouteGuard peut rediriger vers /login
    pub fn navigate(&mut self, path: &str) -> Navigation {
        let navigation = self.guard.resolve(path);
        if let Some(route) = navigation.target() {
            self.current_route = route;
        }
        navigation
    }

    // ========================================================================
    // Transactions de l'utilisateur connecté
    // ========================================================================

    /// Historique de l'utilisateur connecté
    pub async fn my_transactions(&self) -> Result<Vec<Transaction>> {
        let user_id = self.require_user()?;
        let transactions = self
            .store
            .list_transactions(&user_id)
            .await
            .context("Échec du chargement de l'historique")?;
        Ok(transactions)
    }

    /// Enregistre un achat ou une vente via la vue /new-transaction
    ///
    /// La navigation passe par le RouteGuard : sans utilisateur connecté,
    /// la vue courante devient /login et l'appel échoue avec AuthRequired.
    #[instrument(skip(self))]
    pub async fn record_transaction(
        &mut self,
        action: Action,
        crypto_code: &str,
        crypto_amount: f64,
        money: f64,
        datetime: DateTime<Utc>,
    ) -> Result<Transaction> {
        if let Navigation::Redirect(_) = self.navigate(Route::NewTransaction.path()) {
            return Err(AuthRequired.into());
        }

        let user_id = self.require_user()?;
        let body = match action {
            Action::Purchase => NewTransaction::purchase(user_id, crypto_code, crypto_amount, money, datetime),
            Action::Sale => NewTransaction::sale(user_id, crypto_code, crypto_amount, money, datetime),
        };

        let created = self
            .store
            .create_transaction(&body)
            .await
            .context("Échec de l'enregistrement de la transaction")?;

        info!(id = %created.id, "Transaction recorded");
        Ok(created)
    }

    /// Positions de l'utilisateur connecté (vue /analysis)
    pub async fn portfolio(&self) -> Result<Portfolio> {
        let transactions = self.my_transactions().await?;
        Ok(Portfolio::from_transactions(&transactions))
    }

    /// Cotation unitaire (volume 1) d'une crypto, pour valoriser une position
    pub async fn unit_price(&self, crypto_code: &str, fiat: &str) -> Result<PriceQuote> {
        let quote = self
            .prices
            .get_crypto_price(&crypto_code.to_lowercase(), &fiat.to_lowercase(), "1")
            .await
            .with_context(|| format!("Échec de la récupération du prix de {}", crypto_code))?;
        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Url;

    fn offline_app(auth: AuthContext) -> App {
        // Port 1 : aucune requête ne doit aboutir dans ces tests
        let base = Url::parse("http://127.0.0.1:1/").unwrap();
        let store = TransactionStore::with_base_url(base.clone(), "secret", None).unwrap();
        let prices = PriceClient::with_base_url(base, None).unwrap();
        let session = SessionFile::new(
            std::env::temp_dir().join(format!("cryptotracker-app-{}", std::process::id())),
        );
        App::with_parts(store, prices, auth, session)
    }

    #[test]
    fn test_app_starts_on_home() {
        let app = offline_app(AuthContext::new());
        assert_eq!(app.current_route, Route::Home);
    }

    #[test]
    fn test_navigate_redirects_to_login() {
        let mut app = offline_app(AuthContext::new());

        assert_eq!(app.navigate("/new-transaction"), Navigation::Redirect(Route::Login));
        assert_eq!(app.current_route, Route::Login);

        // Un chemin inconnu ne change pas la vue
        assert_eq!(app.navigate("/nowhere"), Navigation::NotFound);
        assert_eq!(app.current_route, Route::Login);
    }

    #[tokio::test]
    async fn test_record_without_login_is_auth_required() {
        let mut app = offline_app(AuthContext::new());

        let err = app
            .record_transaction(Action::Purchase, "BTC", 1.0, 100.0, Utc::now())
            .await
            .unwrap_err();

        assert!(err.downcast_ref::<AuthRequired>().is_some());
        assert_eq!(app.current_route, Route::Login);
    }

    #[tokio::test]
    async fn test_history_requires_login() {
        let app = offline_app(AuthContext::new());
        let err = app.my_transactions().await.unwrap_err();
        assert!(err.downcast_ref::<AuthRequired>().is_some());
    }

    #[test]
    fn test_login_rejects_empty_id() {
        let mut app = offline_app(AuthContext::new());
        assert!(app.login("   ").is_err());
        assert!(!app.auth().is_authenticated());
    }
}
