// ============================================================================
// Structure : Portfolio
// ============================================================================
// Agrège l'historique des transactions d'un utilisateur par crypto
// (vue "Analyse") : quantité nette détenue, argent dépensé et récupéré.
//
// CONCEPTS RUST :
// 1. BTreeMap : map triée par clé (affichage stable par code crypto)
// 2. Entry API : insertion ou mise à jour en un seul lookup
// ============================================================================

use std::collections::BTreeMap;

use crate::models::{Action, PriceQuote, Transaction};

/// Position sur une crypto
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Holding {
    /// Code de la crypto, en majuscules (ex: "BTC")
    pub crypto_code: String,

    /// Quantité achetée moins quantité vendue
    pub net_amount: f64,

    /// Somme de `money` des achats
    pub money_spent: f64,

    /// Somme de `money` des ventes
    pub money_received: f64,

    /// Nombre de transactions prises en compte
    pub transactions: usize,
}

impl Holding {
    fn new(crypto_code: String) -> Self {
        Self {
            crypto_code,
            ..Self::default()
        }
    }

    fn record(&mut self, tx: &Transaction) {
        match tx.action {
            Action::Purchase => {
                self.net_amount += tx.crypto_amount;
                self.money_spent += tx.money;
            }
            Action::Sale => {
                self.net_amount -= tx.crypto_amount;
                self.money_received += tx.money;
            }
        }
        self.transactions += 1;
    }

    /// Résultat réalisé : argent récupéré moins argent dépensé
    pub fn net_money(&self) -> f64 {
        self.money_received - self.money_spent
    }

    /// Valeur actuelle de la position au meilleur prix de vente
    ///
    /// La cotation doit être demandée pour un volume de 1 (prix unitaire).
    /// Retourne None si aucun exchange ne propose de prix.
    pub fn valuation(&self, quote: &PriceQuote) -> Option<f64> {
        let (_, bid) = quote.best_bid()?;
        Some(self.net_amount * bid)
    }
}

/// Positions d'un utilisateur, une par code crypto
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Portfolio {
    pub holdings: BTreeMap<String, Holding>,
}

impl Portfolio {
    /// Construit le portefeuille à partir d'un historique de transactions
    ///
    /// Les codes sont normalisés en majuscules : "btc" et "BTC" sont la même position.
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let mut holdings: BTreeMap<String, Holding> = BTreeMap::new();

        for tx in transactions {
            let code = tx.crypto_code.trim().to_uppercase();
            holdings
                .entry(code.clone())
                .or_insert_with(|| Holding::new(code))
                .record(tx);
        }

        Self { holdings }
    }

    pub fn get(&self, crypto_code: &str) -> Option<&Holding> {
        self.holdings.get(&crypto_code.trim().to_uppercase())
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Holding> {
        self.holdings.values()
    }
}
