// ============================================================================
// Structure : PriceQuote
// ============================================================================
// Cotation instantanée renvoyée par l'agrégateur (CriptoYa) pour un triplet
// (crypto, monnaie fiat, volume). Non persistée.
//
// La forme est définie par l'agrégateur : un objet JSON dont chaque clé est
// le nom d'un exchange. Chaque entrée est gardée telle quelle (JSON brut) ;
// les champs connus se lisent via des accesseurs typés. La re-sérialisation
// redonne exactement le corps reçu (null, entiers, chaînes compris).
// ============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Prix proposé par un exchange (objet JSON brut)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeQuote {
    pub raw: Map<String, Value>,
}

impl ExchangeQuote {
    /// Lit un champ numérique ; CriptoYa envoie parfois les prix en chaîne
    ///
    /// CONCEPT RUST : Option chaining
    /// - null, champ absent ou texte non numérique -> None
    fn number(&self, field: &str) -> Option<f64> {
        match self.raw.get(field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Prix unitaire à l'achat
    pub fn ask(&self) -> Option<f64> {
        self.number("ask")
    }

    /// Coût total pour le volume demandé (frais inclus)
    pub fn total_ask(&self) -> Option<f64> {
        self.number("totalAsk")
    }

    /// Prix unitaire à la vente
    pub fn bid(&self) -> Option<f64> {
        self.number("bid")
    }

    /// Montant total reçu pour le volume demandé (frais déduits)
    pub fn total_bid(&self) -> Option<f64> {
        self.number("totalBid")
    }

    /// Horodatage Unix de la cotation (éventuellement fractionnaire)
    pub fn time(&self) -> Option<f64> {
        self.number("time")
    }

    /// Champ quelconque, tel que reçu
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.raw.get(field)
    }
}

/// Cotations par exchange (clé = nom de l'exchange, ex: "binance")
///
/// CONCEPT RUST : #[serde(transparent)]
/// - La struct se (dé)sérialise exactement comme son unique champ
/// - Un corps qui n'est pas un objet JSON est rejeté
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceQuote {
    pub exchanges: BTreeMap<String, ExchangeQuote>,
}

impl PriceQuote {
    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    pub fn get(&self, exchange: &str) -> Option<&ExchangeQuote> {
        self.exchanges.get(exchange)
    }

    /// Exchange le moins cher pour acheter (plus petit `ask`)
    ///
    /// Un prix nul ou négatif signifie "pas d'offre" et est ignoré.
    pub fn best_ask(&self) -> Option<(&str, f64)> {
        self.offers(ExchangeQuote::ask).min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Exchange le plus offrant pour vendre (plus grand `bid`)
    pub fn best_bid(&self) -> Option<(&str, f64)> {
        self.offers(ExchangeQuote::bid).max_by(|a, b| a.1.total_cmp(&b.1))
    }

    fn offers<'a>(
        &'a self,
        price: fn(&ExchangeQuote) -> Option<f64>,
    ) -> impl Iterator<Item = (&'a str, f64)> + 'a {
        self.exchanges
            .iter()
            .filter_map(move |(name, quote)| price(quote).map(|p| (name.as_str(), p)))
            .filter(|(_, p)| *p > 0.0)
    }
}
