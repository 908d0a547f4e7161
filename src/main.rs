// ============================================================================
// CryptoTracker - Ligne de commande
// ============================================================================
// Suivi des achats / ventes de cryptos d'un utilisateur, stockés dans un
// document store distant, avec consultation des prix en direct.
//
// CONCEPTS RUST CLÉS :
// 1. clap derive : sous-commandes déclarées comme un enum
// 2. #[tokio::main] : runtime async pour les appels HTTP
// 3. anyhow : propagation d'erreurs avec contexte jusqu'à main
// ============================================================================

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use cryptotracker::app::App;
use cryptotracker::config::{self, Config};
use cryptotracker::models::{parse_datetime, Action, TransactionId, TransactionPatch};
use cryptotracker::router::Navigation;

// ============================================================================
// Arguments
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "cryptotracker", version, about = "Suivi de transactions crypto")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Se connecter (mémorise l'identifiant utilisateur)
    Login { user_id: String },

    /// Se déconnecter
    Logout,

    /// Affiche l'utilisateur connecté
    Whoami,

    /// Historique des transactions de l'utilisateur connecté
    List,

    /// Enregistre un achat
    Buy(TradeArgs),

    /// Enregistre une vente
    Sell(TradeArgs),

    /// Modifie une transaction (seuls les champs fournis changent)
    Update {
        id: String,
        #[arg(long)]
        action: Option<Action>,
        #[arg(long)]
        crypto_code: Option<String>,
        #[arg(long)]
        crypto_amount: Option<f64>,
        #[arg(long)]
        money: Option<f64>,
        /// Date (RFC 3339 ou YYYY-MM-DDTHH:MM)
        #[arg(long)]
        datetime: Option<String>,
    },

    /// Supprime une transaction
    Delete { id: String },

    /// Cotation d'une crypto (ex: price btc usd 1)
    Price {
        coin: String,
        fiat: String,
        volume: String,
    },

    /// Ouvre une vue (soumis au contrôle d'accès)
    Open { path: String },

    /// Positions par crypto, valorisées au meilleur prix de vente
    Portfolio {
        /// Monnaie de valorisation
        #[arg(long, default_value = "usd")]
        fiat: String,
    },
}

#[derive(Debug, clap::Args)]
struct TradeArgs {
    /// Code de la crypto (ex: BTC)
    crypto_code: String,

    /// Quantité (en unités entières, décimales acceptées)
    crypto_amount: f64,

    /// Montant en monnaie fiat
    money: f64,

    /// Date de la transaction (défaut : maintenant)
    #[arg(long)]
    datetime: Option<String>,
}

// ============================================================================
// Initialisation du logging
// ============================================================================

/// Initialise le système de logging vers fichier
///
/// Les logs sont écrits à côté du fichier de session, avec rotation quotidienne :
/// - Linux/WSL : ~/.local/share/cryptotracker/logs/cryptotracker.log
/// - macOS : ~/Library/Application Support/cryptotracker/logs/cryptotracker.log
/// - Windows : C:\Users\<user>\AppData\Roaming\cryptotracker\logs\cryptotracker.log
///
/// Le .env doit être chargé avant : RUST_LOG et CRYPTOTRACKER_LOG_DIR peuvent y être définis.
///
/// # Utilisation
/// ```bash
/// tail -f ~/.local/share/cryptotracker/logs/cryptotracker.log
/// RUST_LOG=cryptotracker=trace cryptotracker list
/// ```
fn init_logging() -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env = |key: &str| std::env::var(key).ok();
    let log_dir = config::log_dir(env);
    let filter = config::log_filter(env);

    // Crée le répertoire s'il n'existe pas
    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    // Rotation::DAILY : nouveau fichier chaque jour (cryptotracker.log.2024-01-15)
    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "cryptotracker.log");

    // Un filtre invalide ne doit pas faire taire les logs
    let env_filter = tracing_subscriber::EnvFilter::try_new(&filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config::DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender) // Écrit dans le fichier
                .with_ansi(false) // Pas de codes couleur dans le fichier
                .with_target(true) // Inclut le module (ex: cryptotracker::api::restdb)
                .with_thread_ids(true) // Inclut l'ID du thread (utile pour async)
                .with_line_number(true), // Inclut le numéro de ligne
        )
        .with(env_filter)
        .init();

    info!(?log_dir, %filter, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Le .env d'abord : il peut définir RUST_LOG (absent = pas une erreur)
    dotenv::dotenv().ok();

    init_logging().unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    let cli = Cli::parse();
    let config = Config::from_env()?;
    info!(?config, "Configuration loaded");

    let mut app = App::new(&config)?;

    let result = run(&mut app, cli.command).await;
    if let Err(e) = &result {
        error!(error = ?e, "Command failed");
    }
    result
}

/// Exécute une sous-commande
async fn run(app: &mut App, command: Command) -> Result<()> {
    match command {
        Command::Login { user_id } => {
            app.login(&user_id)?;
            println!("✅ Connecté en tant que {}", user_id.trim());
        }

        Command::Logout => {
            app.logout()?;
            println!("👋 Déconnecté");
        }

        Command::Whoami => match app.auth().current_user() {
            Some(user_id) => println!("{}", user_id),
            None => println!("Non connecté"),
        },

        Command::List => {
            let transactions = app.my_transactions().await?;
            if transactions.is_empty() {
                println!("Aucune transaction");
            }
            for tx in &transactions {
                println!("{}", tx.display());
            }
        }

        Command::Buy(args) => record(app, Action::Purchase, args).await?,
        Command::Sell(args) => record(app, Action::Sale, args).await?,

        Command::Update {
            id,
            action,
            crypto_code,
            crypto_amount,
            money,
            datetime,
        } => {
            let patch = TransactionPatch {
                user_id: None,
                action,
                crypto_code,
                crypto_amount,
                money,
                datetime: datetime.as_deref().map(parse_datetime).transpose().context("Date invalide")?,
            };
            if patch.is_empty() {
                anyhow::bail!("Rien à modifier : fournir au moins un champ (--money, --crypto-amount...)");
            }

            let updated = app.store().update_transaction(&TransactionId::from(id), &patch).await?;
            println!("✏️  {}", updated.display());
        }

        Command::Delete { id } => {
            let deleted = app.store().delete_transaction(&TransactionId::from(id)).await?;
            for id in deleted {
                println!("🗑️  {}", id);
            }
        }

        Command::Price { coin, fiat, volume } => {
            let quote = app.prices().get_crypto_price(&coin, &fiat, &volume).await?;
            println!("{}", serde_json::to_string_pretty(&quote)?);
        }

        Command::Open { path } => match app.navigate(&path) {
            Navigation::Proceed(route) => println!("→ {} ({})", route.name(), route),
            Navigation::Redirect(route) => println!("🔒 Connexion requise, redirection vers {}", route),
            Navigation::NotFound => println!("Aucune vue pour {}", path),
        },

        Command::Portfolio { fiat } => {
            let portfolio = app.portfolio().await?;
            if portfolio.is_empty() {
                println!("Aucune position");
            }
            for holding in portfolio.iter() {
                // Une cotation indisponible n'empêche pas d'afficher la position
                let value = match app.unit_price(&holding.crypto_code, &fiat).await {
                    Ok(quote) => holding
                        .valuation(&quote)
                        .map(|v| format!("{:.2} {}", v, fiat.to_uppercase()))
                        .unwrap_or_else(|| "N/A".to_string()),
                    Err(e) => {
                        error!(crypto_code = %holding.crypto_code, error = ?e, "Valuation failed");
                        "N/A".to_string()
                    }
                };
                println!(
                    "{:<6} {:>14.8}  dépensé {:>12.2}  récupéré {:>12.2}  valeur {}",
                    holding.crypto_code, holding.net_amount, holding.money_spent, holding.money_received, value
                );
            }
        }
    }

    Ok(())
}

/// Enregistre un achat ou une vente pour l'utilisateur connecté
async fn record(app: &mut App, action: Action, args: TradeArgs) -> Result<()> {
    let datetime = match args.datetime.as_deref() {
        Some(raw) => parse_datetime(raw).with_context(|| format!("Date invalide : {}", raw))?,
        None => chrono::Utc::now(),
    };

    let created = app
        .record_transaction(action, &args.crypto_code, args.crypto_amount, args.money, datetime)
        .await?;

    println!("✅ {}", created.display());
    Ok(())
}
