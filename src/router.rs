// ============================================================================
// Module : router
// ============================================================================
// Table de routage des vues et RouteGuard (contrôle d'accès avant navigation)
//
// CONCEPT RUST : Enums pour state machines
// - Route : une variante par vue, le compilateur force à toutes les gérer
// - Navigation : résultat de la décision (continuer ou rediriger)
// ============================================================================

use std::fmt;

use tracing::{debug, warn};

use crate::session::AuthContext;

/// Vues de l'application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    TransactionHistory,
    NewTransaction,
    Analysis,
}

impl Route {
    /// Toutes les vues de la table de routage
    pub const ALL: [Route; 5] = [
        Route::Home,
        Route::Login,
        Route::TransactionHistory,
        Route::NewTransaction,
        Route::Analysis,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/home",
            Route::Login => "/login",
            Route::TransactionHistory => "/transaction-history",
            Route::NewTransaction => "/new-transaction",
            Route::Analysis => "/analysis",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Route::Home => "Home",
            Route::Login => "Login",
            Route::TransactionHistory => "TransactionHistory",
            Route::NewTransaction => "NewTransaction",
            Route::Analysis => "Analysis",
        }
    }

    /// Seule la création de transaction exige d'être connecté
    pub fn requires_auth(&self) -> bool {
        matches!(self, Route::NewTransaction)
    }

    /// Retrouve une vue à partir de son chemin
    ///
    /// "/" (et le chemin vide) redirige vers /home. Le '#' du mode hash et
    /// un '/' final sont tolérés : "#/login", "/login/".
    pub fn from_path(path: &str) -> Option<Route> {
        let path = path.trim().trim_start_matches('#');
        let path = path.trim_end_matches('/');

        if path.is_empty() {
            return Some(Route::Home);
        }

        Route::ALL.into_iter().find(|route| route.path() == path)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Issue d'une tentative de navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// La navigation continue vers la vue demandée
    Proceed(Route),

    /// Accès refusé : la navigation est redirigée (la destination initiale est oubliée)
    Redirect(Route),

    /// Aucun chemin ne correspond
    NotFound,
}

impl Navigation {
    /// Vue finalement affichée, si elle existe
    pub fn target(&self) -> Option<Route> {
        match self {
            Navigation::Proceed(route) | Navigation::Redirect(route) => Some(*route),
            Navigation::NotFound => None,
        }
    }
}

/// Contrôle d'accès évalué avant chaque navigation
///
/// Ne modifie jamais le contexte d'authentification, et ne bloque jamais :
/// un refus se traduit toujours par une redirection vers /login.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    auth: AuthContext,
}

impl RouteGuard {
    pub fn new(auth: AuthContext) -> Self {
        Self { auth }
    }

    /// Décide si la navigation vers `route` peut continuer
    pub fn check(&self, route: Route) -> Navigation {
        if route.requires_auth() && !self.auth.is_authenticated() {
            warn!(requested = %route, "Authentication required, redirecting to login");
            return Navigation::Redirect(Route::Login);
        }

        debug!(route = %route, "Navigation allowed");
        Navigation::Proceed(route)
    }

    /// Résout un chemin puis applique le contrôle d'accès
    pub fn resolve(&self, path: &str) -> Navigation {
        match Route::from_path(path) {
            Some(route) => self.check(route),
            None => {
                debug!(path, "No route matches path");
                Navigation::NotFound
            }
        }
    }
}
