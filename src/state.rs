//! # Application State
//!
//! Theme, current view and authentication session live in one explicit
//! [`AppState`] that the host passes by reference to whichever controller
//! needs it. Theme preference is persisted through a [`PreferenceStore`],
//! which is `localStorage` in the browser and a map elsewhere.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::config::Config;
use crate::constants::THEME_STORAGE_KEY;

/// Key/value persistence for user preferences.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

impl PreferenceStore for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.insert(key.to_string(), value.to_string());
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn is_dark(&self) -> bool {
        *self == Theme::Dark
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("Unknown theme: {}", other)),
        }
    }
}

/// Screens reachable from the navigation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    #[default]
    Dashboard,
    Upload,
    Credentials,
    Nfts,
    RequestVerification,
    VerificationRequests,
    Admin,
}

impl View {
    pub fn id(&self) -> &'static str {
        match self {
            View::Dashboard => "dashboard",
            View::Upload => "upload",
            View::Credentials => "credentials",
            View::Nfts => "nfts",
            View::RequestVerification => "request-verification",
            View::VerificationRequests => "verification-requests",
            View::Admin => "admin",
        }
    }

    /// Resolves a navigation id; unknown ids land on the dashboard.
    pub fn from_id(id: &str) -> Self {
        match id {
            "upload" => View::Upload,
            "credentials" => View::Credentials,
            "nfts" => View::Nfts,
            "request-verification" => View::RequestVerification,
            "verification-requests" => View::VerificationRequests,
            "admin" => View::Admin,
            _ => View::Dashboard,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AuthSession {
    pub principal: Option<String>,
}

impl AuthSession {
    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Config,
    pub theme: Theme,
    pub view: View,
    pub session: AuthSession,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            theme: Theme::default(),
            view: View::default(),
            session: AuthSession::default(),
        }
    }

    /// Identity provider the login button sends the user to.
    pub fn login_url(&self) -> &str {
        &self.config.identity_provider
    }

    pub fn sign_in(&mut self, principal: impl Into<String>) {
        self.session.principal = Some(principal.into());
    }

    /// Ends the session and returns to the dashboard.
    pub fn sign_out(&mut self) {
        self.session = AuthSession::default();
        self.view = View::Dashboard;
    }

    pub fn navigate(&mut self, view: View) {
        self.view = view;
    }

    pub fn navigate_to_id(&mut self, id: &str) {
        self.view = View::from_id(id);
    }

    /// Applies the saved theme, keeping dark when nothing valid is stored.
    pub fn restore_theme(&mut self, store: &dyn PreferenceStore) {
        self.theme = store
            .get(THEME_STORAGE_KEY)
            .and_then(|saved| saved.parse().ok())
            .unwrap_or_default();
    }

    pub fn toggle_theme(&mut self, store: &mut dyn PreferenceStore) -> Theme {
        self.theme = self.theme.toggled();
        store.set(THEME_STORAGE_KEY, self.theme.as_str());
        self.theme
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::LOCAL_IDENTITY_PROVIDER;

    #[test]
    fn unknown_view_ids_fall_back_to_dashboard() {
        assert_eq!(View::from_id("verification-requests"), View::VerificationRequests);
        assert_eq!(View::from_id("wallet"), View::Dashboard);
        for view in [View::Upload, View::Nfts, View::Admin] {
            assert_eq!(View::from_id(view.id()), view);
        }
    }

    #[test]
    fn theme_names_match_document_classes() {
        assert_eq!(Theme::Dark.as_str(), "dark");
        assert_eq!(Theme::Light.as_str(), "light");
        assert_eq!("light".parse::<Theme>(), Ok(Theme::Light));
        assert_eq!(Theme::Light.toggled().as_str(), "dark");
    }

    #[test]
    fn theme_defaults_to_dark_and_persists_toggles() {
        let mut store: HashMap<String, String> = HashMap::new();
        let mut state = AppState::new(Config::default());
        state.restore_theme(&store);
        assert!(state.theme.is_dark());

        state.toggle_theme(&mut store);
        let mut reloaded = AppState::new(Config::default());
        reloaded.restore_theme(&store);
        assert_eq!(reloaded.theme, Theme::Light);

        store.insert(THEME_STORAGE_KEY.to_string(), "sepia".to_string());
        reloaded.restore_theme(&store);
        assert_eq!(reloaded.theme, Theme::Dark);
    }

    #[test]
    fn sign_out_resets_session_and_view() {
        let mut state = AppState::new(Config::default());
        assert_eq!(state.login_url(), LOCAL_IDENTITY_PROVIDER);
        state.sign_in("aaaaa-aa");
        state.navigate_to_id("admin");
        assert!(state.session.is_authenticated());

        state.sign_out();
        assert!(!state.session.is_authenticated());
        assert_eq!(state.view, View::Dashboard);
    }
}
