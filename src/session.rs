// ============================================================================
// Module : session
// ============================================================================
// Contexte d'authentification : qui est connecté ?
//
// Deux états seulement : non authentifié / authentifié. La présence d'un
// identifiant utilisateur non vide suffit ; il n'est jamais revalidé auprès
// d'un serveur (pas d'expiration, pas de refresh).
//
// CONCEPTS RUST :
// 1. Arc<RwLock<...>> : état partagé entre le RouteGuard et les appelants
// 2. Clone bon marché : cloner l'AuthContext clone seulement l'Arc
// 3. RAII : le verrou est relâché à la fin de chaque méthode
// ============================================================================

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use tracing::{debug, info};

/// Contexte d'authentification partagé
///
/// Cycle de vie : login() après un login réussi, logout() à la déconnexion.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    user_id: Arc<RwLock<Option<String>>>,
}

impl AuthContext {
    /// Contexte non authentifié
    pub fn new() -> Self {
        Self::default()
    }

    /// Contexte déjà authentifié (ex: session restaurée depuis le disque)
    pub fn with_user(user_id: impl Into<String>) -> Self {
        let context = Self::new();
        context.login(user_id);
        context
    }

    /// Enregistre l'utilisateur connecté
    pub fn login(&self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        info!(user_id = %user_id, "User logged in");
        // Un verrou empoisonné contient quand même une valeur valide
        *self.user_id.write().unwrap_or_else(|e| e.into_inner()) = Some(user_id);
    }

    /// Oublie l'utilisateur connecté
    pub fn logout(&self) {
        info!("User logged out");
        *self.user_id.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Identifiant de l'utilisateur connecté
    ///
    /// Un identifiant vide compte comme absent.
    pub fn current_user(&self) -> Option<String> {
        self.user_id
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .filter(|id| !id.is_empty())
            .cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }
}

// ============================================================================
// Persistance de la session
// ============================================================================
// Seule donnée persistée localement : l'identifiant de l'utilisateur
// connecté, sur une ligne, dans un seul fichier.
// ============================================================================

/// Fichier qui mémorise l'utilisateur connecté entre deux exécutions
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Restaure le contexte ; un fichier absent donne un contexte non authentifié
    pub fn load(&self) -> Result<AuthContext> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let user_id = content.trim();
                debug!(path = ?self.path, authenticated = !user_id.is_empty(), "Session loaded");
                if user_id.is_empty() {
                    Ok(AuthContext::new())
                } else {
                    Ok(AuthContext::with_user(user_id))
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = ?self.path, "No session file");
                Ok(AuthContext::new())
            }
            Err(e) => Err(e).with_context(|| format!("Échec de la lecture de la session {:?}", self.path)),
        }
    }

    /// Sauvegarde l'état du contexte (supprime le fichier si non authentifié)
    pub fn save(&self, context: &AuthContext) -> Result<()> {
        let Some(user_id) = context.current_user() else {
            return self.clear();
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Échec de la création du répertoire {:?}", parent))?;
        }

        fs::write(&self.path, format!("{}\n", user_id))
            .with_context(|| format!("Échec de l'écriture de la session {:?}", self.path))?;

        debug!(path = ?self.path, "Session saved");
        Ok(())
    }

    /// Supprime le fichier de session (sans erreur s'il n'existe pas)
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = ?self.path, "Session cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Échec de la suppression de la session {:?}", self.path)),
        }
    }
}
