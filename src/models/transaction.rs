// ============================================================================
// Structure : Transaction
// ============================================================================
// Représente un achat ou une vente de crypto enregistré dans le document store
//
// CONCEPTS RUST :
// 1. Newtype pattern : TransactionId enveloppe une String pour éviter de
//    confondre un identifiant de transaction avec un identifiant utilisateur
// 2. #[serde(rename = "...")] : le store nomme l'identifiant "_id"
// 3. #[serde(with = "...")] : format de date personnalisé
// ============================================================================

use std::fmt;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Identifiant opaque attribué par le document store à la création
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransactionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TransactionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Type de transaction : achat ou vente
///
/// CONCEPT RUST : #[serde(rename_all = "lowercase")]
/// - Action::Purchase <-> "purchase"
/// - Toute autre valeur est rejetée à la désérialisation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Purchase,
    Sale,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Purchase => "purchase",
            Action::Sale => "sale",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "purchase" => Ok(Action::Purchase),
            "sale" => Ok(Action::Sale),
            other => Err(format!("action inconnue : {} (attendu : purchase ou sale)", other)),
        }
    }
}

/// Corps envoyé au store pour créer une transaction
///
/// Aucune validation numérique : montant et prix sont transmis tels quels,
/// c'est le store qui accepte ou refuse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub user_id: String,
    pub action: Action,
    pub crypto_code: String,
    pub crypto_amount: f64,
    pub money: f64,
    #[serde(with = "datetime_format")]
    pub datetime: DateTime<Utc>,
}

impl NewTransaction {
    /// Crée le corps d'un achat
    pub fn purchase(
        user_id: impl Into<String>,
        crypto_code: impl Into<String>,
        crypto_amount: f64,
        money: f64,
        datetime: DateTime<Utc>,
    ) -> Self {
        Self::with_action(Action::Purchase, user_id, crypto_code, crypto_amount, money, datetime)
    }

    /// Crée le corps d'une vente
    pub fn sale(
        user_id: impl Into<String>,
        crypto_code: impl Into<String>,
        crypto_amount: f64,
        money: f64,
        datetime: DateTime<Utc>,
    ) -> Self {
        Self::with_action(Action::Sale, user_id, crypto_code, crypto_amount, money, datetime)
    }

    fn with_action(
        action: Action,
        user_id: impl Into<String>,
        crypto_code: impl Into<String>,
        crypto_amount: f64,
        money: f64,
        datetime: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            action,
            crypto_code: crypto_code.into(),
            crypto_amount,
            money,
            datetime,
        }
    }
}

/// Transaction confirmée par le store (avec son identifiant)
///
/// Les métadonnées ajoutées par le store (_created, _changed...) sont ignorées.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "_id")]
    pub id: TransactionId,
    pub user_id: String,
    pub action: Action,
    pub crypto_code: String,
    pub crypto_amount: f64,
    pub money: f64,
    #[serde(with = "datetime_format")]
    pub datetime: DateTime<Utc>,
}

impl Transaction {
    /// Champs de la transaction sans l'identifiant
    pub fn fields(&self) -> NewTransaction {
        NewTransaction {
            user_id: self.user_id.clone(),
            action: self.action,
            crypto_code: self.crypto_code.clone(),
            crypto_amount: self.crypto_amount,
            money: self.money,
            datetime: self.datetime,
        }
    }

    /// Formatte la transaction pour l'affichage (une ligne)
    pub fn display(&self) -> String {
        format!(
            "{:<26} {:<8} {:<6} {:>14.8} {:>12.2}  {}",
            self.id,
            self.action,
            self.crypto_code,
            self.crypto_amount,
            self.money,
            self.datetime.format("%Y-%m-%d %H:%M"),
        )
    }
}

/// Mise à jour partielle : seuls les champs Some(...) sont envoyés
///
/// CONCEPT RUST : Builder pattern par valeur
/// - Chaque méthode consomme self et le retourne modifié
/// - TransactionPatch::new().money(500.0)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crypto_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crypto_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub money: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "datetime_format::option"
    )]
    pub datetime: Option<DateTime<Utc>>,
}

impl TransactionPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    pub fn crypto_code(mut self, crypto_code: impl Into<String>) -> Self {
        self.crypto_code = Some(crypto_code.into());
        self
    }

    pub fn crypto_amount(mut self, crypto_amount: f64) -> Self {
        self.crypto_amount = Some(crypto_amount);
        self
    }

    pub fn money(mut self, money: f64) -> Self {
        self.money = Some(money);
        self
    }

    pub fn datetime(mut self, datetime: DateTime<Utc>) -> Self {
        self.datetime = Some(datetime);
        self
    }

    /// Vrai si aucun champ n'est renseigné
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ============================================================================
// Format des dates
// ============================================================================
// En entrée on accepte :
// - RFC 3339 ("2024-05-01T12:00:00.000Z"), ce que renvoie le store
// - "YYYY-MM-DDTHH:MM[:SS]" sans fuseau (format d'un champ datetime-local), lu en UTC
// En sortie : toujours RFC 3339, précision milliseconde, suffixe Z
// ============================================================================

/// Parse une date dans l'un des formats acceptés
pub fn parse_datetime(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let raw = raw.trim();
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => Ok(dt.with_timezone(&Utc)),
        Err(rfc_err) => ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
            .ok_or(rfc_err),
    }
}

pub mod datetime_format {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_datetime(&raw).map_err(|e| serde::de::Error::custom(format!("date invalide {:?} : {}", raw, e)))
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            dt: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => super::serialize(dt, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => parse_datetime(&raw)
                    .map(Some)
                    .map_err(|e| serde::de::Error::custom(format!("date invalide {:?} : {}", raw, e))),
                None => Ok(None),
            }
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_new_purchase_body() {
        let body = NewTransaction::purchase("user-1", "BTC", 0.5, 30000.0, sample_date());
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(
            value,
            json!({
                "user_id": "user-1",
                "action": "purchase",
                "crypto_code": "BTC",
                "crypto_amount": 0.5,
                "money": 30000.0,
                "datetime": "2024-05-01T12:30:00.000Z"
            })
        );
    }

    #[test]
    fn test_sale_action_fixed() {
        let body = NewTransaction::sale("user-1", "ETH", 2.0, 5000.0, sample_date());
        assert_eq!(body.action, Action::Sale);
    }

    #[test]
    fn test_transaction_from_store_json() {
        // Le store ajoute des métadonnées qu'on ignore
        let raw = json!({
            "_id": "6650f1c2a1b2c3d4e5f60718",
            "user_id": "user-1",
            "action": "sale",
            "crypto_code": "BTC",
            "crypto_amount": 0.25,
            "money": 16000,
            "datetime": "2024-05-01T12:30:00.000Z",
            "_created": "2024-05-01T12:31:00.000Z",
            "_changed": "2024-05-01T12:31:00.000Z"
        });

        let tx: Transaction = serde_json::from_value(raw).unwrap();
        assert_eq!(tx.id.as_str(), "6650f1c2a1b2c3d4e5f60718");
        assert_eq!(tx.action, Action::Sale);
        assert_eq!(tx.money, 16000.0);
        assert_eq!(tx.datetime, sample_date());
    }

    #[test]
    fn test_unknown_action_rejected() {
        let raw = json!({
            "_id": "x",
            "user_id": "user-1",
            "action": "swap",
            "crypto_code": "BTC",
            "crypto_amount": 1.0,
            "money": 1.0,
            "datetime": "2024-05-01T12:30:00Z"
        });

        assert!(serde_json::from_value::<Transaction>(raw).is_err());
    }

    #[test]
    fn test_parse_datetime_local_format() {
        assert_eq!(parse_datetime("2024-05-01T12:30").unwrap(), sample_date());
        assert_eq!(parse_datetime("2024-05-01T14:30:00+02:00").unwrap(), sample_date());
        assert!(parse_datetime("hier").is_err());
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let patch = TransactionPatch::new().money(500.0);
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({ "money": 500.0 }));
        assert!(!patch.is_empty());
        assert!(TransactionPatch::new().is_empty());
    }

    #[test]
    fn test_action_from_str() {
        assert_eq!("Purchase".parse::<Action>().unwrap(), Action::Purchase);
        assert_eq!("sale".parse::<Action>().unwrap(), Action::Sale);
        assert!("swap".parse::<Action>().is_err());
    }
}
