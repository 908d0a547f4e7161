// ============================================================================
// Module : config
// ============================================================================
// Configuration de déploiement lue depuis l'environnement (et un éventuel
// fichier .env chargé par le binaire via dotenv).
//
// Variables :
// - CRYPTOTRACKER_API_KEY       (obligatoire) clé du document store
// - CRYPTOTRACKER_STORE_URL     URL de base du document store
// - CRYPTOTRACKER_PRICE_URL     URL de base de l'agrégateur de prix
// - CRYPTOTRACKER_TIMEOUT_SECS  timeout des requêtes (défaut : celui du transport)
// - CRYPTOTRACKER_SESSION_FILE  chemin du fichier de session
// - CRYPTOTRACKER_LOG_DIR       répertoire des logs (défaut : à côté de la session)
// - RUST_LOG                    filtre des logs
// ============================================================================

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::Url;

pub const ENV_API_KEY: &str = "CRYPTOTRACKER_API_KEY";
pub const ENV_STORE_URL: &str = "CRYPTOTRACKER_STORE_URL";
pub const ENV_PRICE_URL: &str = "CRYPTOTRACKER_PRICE_URL";
pub const ENV_TIMEOUT_SECS: &str = "CRYPTOTRACKER_TIMEOUT_SECS";
pub const ENV_SESSION_FILE: &str = "CRYPTOTRACKER_SESSION_FILE";
pub const ENV_LOG_DIR: &str = "CRYPTOTRACKER_LOG_DIR";
pub const ENV_LOG_FILTER: &str = "RUST_LOG";

/// Par défaut : debug pour cryptotracker, info pour les dépendances
pub const DEFAULT_LOG_FILTER: &str = "cryptotracker=debug,info";

pub const DEFAULT_STORE_URL: &str = "https://laboratorio3-5459.restdb.io/rest/";
pub const DEFAULT_PRICE_URL: &str = "https://criptoya.com/api/";

/// Configuration complète de l'application
#[derive(Clone)]
pub struct Config {
    /// URL de base du document store (se termine toujours par '/')
    pub store_url: Url,

    /// Clé statique envoyée dans l'en-tête x-apikey
    pub api_key: String,

    /// URL de base de l'agrégateur (se termine toujours par '/')
    pub price_url: Url,

    /// Timeout explicite des requêtes ; None = défaut du transport
    pub timeout: Option<Duration>,

    /// Fichier qui mémorise l'utilisateur connecté
    pub session_file: PathBuf,
}

// La clé API ne doit jamais apparaître dans les logs
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("store_url", &self.store_url.as_str())
            .field("api_key", &"<redacted>")
            .field("price_url", &self.price_url.as_str())
            .field("timeout", &self.timeout)
            .field("session_file", &self.session_file)
            .finish()
    }
}

impl Config {
    /// Construit une configuration avec les URLs par défaut
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            store_url: parse_base_url(DEFAULT_STORE_URL)?,
            api_key: api_key.into(),
            price_url: parse_base_url(DEFAULT_PRICE_URL)?,
            timeout: None,
            session_file: default_session_file(),
        })
    }

    /// Lit la configuration depuis les variables d'environnement du processus
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Lit la configuration via une fonction de lookup
    ///
    /// CONCEPT RUST : Closures génériques
    /// - F: Fn(&str) -> Option<String> accepte std::env::var ou une HashMap en test
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Une variable vide est traitée comme absente
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = get(ENV_API_KEY)
            .with_context(|| format!("Variable {} manquante (clé API du document store)", ENV_API_KEY))?;

        let store_url = parse_base_url(&get(ENV_STORE_URL).unwrap_or_else(|| DEFAULT_STORE_URL.to_string()))
            .with_context(|| format!("{} invalide", ENV_STORE_URL))?;

        let price_url = parse_base_url(&get(ENV_PRICE_URL).unwrap_or_else(|| DEFAULT_PRICE_URL.to_string()))
            .with_context(|| format!("{} invalide", ENV_PRICE_URL))?;

        let timeout = match get(ENV_TIMEOUT_SECS) {
            Some(raw) => {
                let secs: u64 = raw
                    .parse()
                    .with_context(|| format!("{} doit être un entier : {:?}", ENV_TIMEOUT_SECS, raw))?;
                if secs == 0 {
                    bail!("{} doit être strictement positif", ENV_TIMEOUT_SECS);
                }
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let session_file = get(ENV_SESSION_FILE)
            .map(PathBuf::from)
            .unwrap_or_else(default_session_file);

        Ok(Self {
            store_url,
            api_key,
            price_url,
            timeout,
            session_file,
        })
    }
}

/// Parse une URL de base http(s) et garantit le '/' final
///
/// Sans '/' final, Url::join remplacerait le dernier segment
/// ("https://x/rest" + "transactions" -> "https://x/transactions").
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }

    let url = Url::parse(&normalized).with_context(|| format!("URL invalide : {}", raw))?;

    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        bail!("URL de base non supportée (http ou https attendu) : {}", raw);
    }

    Ok(url)
}

/// Emplacement par défaut du fichier de session
///
/// - Linux/WSL : ~/.local/share/cryptotracker/session
/// - macOS : ~/Library/Application Support/cryptotracker/session
/// - Windows : C:\Users\<user>\AppData\Roaming\cryptotracker\session
fn default_session_file() -> PathBuf {
    data_dir().join("session")
}

/// Répertoire de données de l'application (session, logs)
fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cryptotracker")
}

// ============================================================================
// Paramètres du logging
// ============================================================================
// Lus séparément de Config : le logging démarre avant que la clé API soit
// validée, pour que cette erreur-là soit elle aussi loggée. Le binaire doit
// charger le .env avant de les lire.
// ============================================================================

/// Filtre des logs (RUST_LOG), ou DEFAULT_LOG_FILTER
pub fn log_filter<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(ENV_LOG_FILTER)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

/// Répertoire des logs
///
/// - Linux/WSL : ~/.local/share/cryptotracker/logs
/// - macOS : ~/Library/Application Support/cryptotracker/logs
/// - Windows : C:\Users\<user>\AppData\Roaming\cryptotracker\logs
pub fn log_dir<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    lookup(ENV_LOG_DIR)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| data_dir().join("logs"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_api_key_required() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains(ENV_API_KEY));

        assert!(Config::from_lookup(lookup(&[(ENV_API_KEY, "  ")])).is_err());
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[(ENV_API_KEY, "secret")])).unwrap();

        assert_eq!(config.store_url.as_str(), DEFAULT_STORE_URL);
        assert_eq!(config.price_url.as_str(), DEFAULT_PRICE_URL);
        assert_eq!(config.timeout, None);
        assert!(config.session_file.ends_with("session"));
    }

    #[test]
    fn test_overrides_and_trailing_slash() {
        let config = Config::from_lookup(lookup(&[
            (ENV_API_KEY, "secret"),
            (ENV_STORE_URL, "http://127.0.0.1:9000/rest"),
            (ENV_TIMEOUT_SECS, "15"),
            (ENV_SESSION_FILE, "/tmp/ct-session"),
        ]))
        .unwrap();

        assert_eq!(config.store_url.as_str(), "http://127.0.0.1:9000/rest/");
        assert_eq!(config.timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.session_file, PathBuf::from("/tmp/ct-session"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(Config::from_lookup(lookup(&[(ENV_API_KEY, "k"), (ENV_TIMEOUT_SECS, "0")])).is_err());
        assert!(Config::from_lookup(lookup(&[(ENV_API_KEY, "k"), (ENV_TIMEOUT_SECS, "abc")])).is_err());
        assert!(Config::from_lookup(lookup(&[(ENV_API_KEY, "k"), (ENV_PRICE_URL, "mailto:a@b.c")])).is_err());
    }

    #[test]
    fn test_log_settings() {
        assert_eq!(log_filter(lookup(&[])), DEFAULT_LOG_FILTER);
        assert_eq!(log_filter(lookup(&[(ENV_LOG_FILTER, "cryptotracker=trace")])), "cryptotracker=trace");

        // Les logs vont à côté du fichier de session, pas dans le répertoire courant
        let config = Config::from_lookup(lookup(&[(ENV_API_KEY, "k")])).unwrap();
        assert_eq!(Some(log_dir(lookup(&[]))), config.session_file.parent().map(|p| p.join("logs")));
        assert_eq!(log_dir(lookup(&[(ENV_LOG_DIR, "/var/log/ct")])), PathBuf::from("/var/log/ct"));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = Config::from_lookup(lookup(&[(ENV_API_KEY, "super-secret")])).unwrap();
        let debug = format!("{:?}", config);

        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
