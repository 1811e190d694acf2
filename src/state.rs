//! Application state for the chat window.
//!
//! Everything the UI shows lives in [`AppState`]. Persisted parts (theme and
//! history) are read once in [`AppState::load`] and written back with
//! [`AppState::persist`] after a mutation that touches them.

use serde::{Deserialize, Serialize};

use crate::api::ConnectionStatus;
use crate::history::{ChatEntry, ChatHistory};
use crate::store::{Store, StoreError};

pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Chat,
    History,
}

/// Visual treatment of a message bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Normal,
    Emergency,
    Error,
    Success,
}

impl MessageKind {
    pub fn classify(text: &str, intent: Option<&str>, confidence: Option<f64>) -> Self {
        if intent == Some("ask_emergency") || text.contains('🚨') {
            MessageKind::Emergency
        } else if intent == Some("error") {
            MessageKind::Error
        } else if intent.is_some() && confidence.is_some_and(|c| c > 0.8) {
            MessageKind::Success
        } else {
            MessageKind::Normal
        }
    }

    pub fn of(entry: &ChatEntry) -> Self {
        Self::classify(&entry.text, entry.intent.as_deref(), entry.confidence)
    }
}

/// Why a message was not sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendBlocked {
    EmptyMessage,
    Offline,
    AwaitingReply,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub theme: Theme,
    pub active_tab: Tab,
    pub sidebar_open: bool,
    pub settings_open: bool,
    pub quick_actions_collapsed: bool,
    pub connection: ConnectionStatus,
    pub history: ChatHistory,
}

impl Default for AppState {
    fn default() -> Self {
        AppState {
            theme: Theme::default(),
            active_tab: Tab::default(),
            sidebar_open: false,
            settings_open: false,
            quick_actions_collapsed: false,
            connection: ConnectionStatus::checking(),
            history: ChatHistory::default(),
        }
    }
}

impl AppState {
    pub fn load(store: &Store) -> Result<Self, StoreError> {
        let theme = store
            .get(THEME_KEY)?
            .and_then(|raw| Theme::parse(&raw))
            .unwrap_or_default();
        let history = ChatHistory::load(store)?;
        tracing::debug!(theme = theme.as_str(), messages = history.len(), "state loaded");

        Ok(AppState {
            theme,
            history,
            ..AppState::default()
        })
    }

    pub fn persist(&self, store: &Store) -> Result<(), StoreError> {
        store.set(THEME_KEY, self.theme.as_str())?;
        self.history.save(store)
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
    }

    pub fn set_active_tab(&mut self, tab: Tab) {
        self.active_tab = tab;
    }

    pub fn toggle_sidebar(&mut self) {
        self.sidebar_open = !self.sidebar_open;
    }

    pub fn toggle_settings(&mut self) {
        self.settings_open = !self.settings_open;
    }

    pub fn toggle_quick_actions(&mut self) {
        self.quick_actions_collapsed = !self.quick_actions_collapsed;
    }

    pub fn set_connection(&mut self, status: ConnectionStatus) {
        self.connection = status;
    }

    pub fn record(&mut self, entry: ChatEntry) {
        self.history.push(entry);
    }

    pub fn clear_chat(&mut self) {
        self.history.clear();
    }

    /// Sending needs non-blank input, a live backend and no reply pending.
    pub fn check_send(&self, input: &str, awaiting_reply: bool) -> Result<(), SendBlocked> {
        if input.trim().is_empty() {
            Err(SendBlocked::EmptyMessage)
        } else if !self.connection.connected {
            Err(SendBlocked::Offline)
        } else if awaiting_reply {
            Err(SendBlocked::AwaitingReply)
        } else {
            Ok(())
        }
    }

    pub fn can_send(&self, input: &str) -> bool {
        self.check_send(input, false).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_message_kinds() {
        assert_eq!(MessageKind::classify("x", Some("ask_emergency"), None), MessageKind::Emergency);
        assert_eq!(MessageKind::classify("🚨 call now", None, None), MessageKind::Emergency);
        assert_eq!(MessageKind::classify("x", Some("error"), Some(0.99)), MessageKind::Error);
        assert_eq!(MessageKind::classify("x", Some("greet"), Some(0.9)), MessageKind::Success);
        assert_eq!(MessageKind::classify("x", Some("greet"), Some(0.8)), MessageKind::Normal);
        assert_eq!(MessageKind::classify("x", None, Some(0.95)), MessageKind::Normal);
    }

    #[test]
    fn theme_defaults_to_light_and_persists() {
        let store = Store::open_in_memory().unwrap();
        let mut state = AppState::load(&store).unwrap();
        assert_eq!(state.theme, Theme::Light);

        state.toggle_theme();
        state.record(ChatEntry::user("headache"));
        state.persist(&store).unwrap();

        let reloaded = AppState::load(&store).unwrap();
        assert_eq!(reloaded.theme, Theme::Dark);
        assert_eq!(reloaded.history.len(), 1);
        assert_eq!(reloaded.active_tab, Tab::Chat);
    }

    #[test]
    fn unknown_saved_theme_falls_back() {
        let store = Store::open_in_memory().unwrap();
        store.set(THEME_KEY, "sepia").unwrap();
        assert_eq!(AppState::load(&store).unwrap().theme, Theme::Light);
    }

    #[test]
    fn toggles_flip() {
        let mut state = AppState::default();
        state.toggle_sidebar();
        state.toggle_settings();
        state.toggle_quick_actions();
        assert!(state.sidebar_open && state.settings_open && state.quick_actions_collapsed);
        state.toggle_sidebar();
        assert!(!state.sidebar_open);
    }

    #[test]
    fn sending_requires_connection() {
        let mut state = AppState::default();
        assert!(!state.can_send("hello"));
        state.set_connection(ConnectionStatus {
            connected: true,
            message: "Connected".into(),
        });
        assert!(state.can_send("hello"));
        assert!(!state.can_send("   "));
    }

    #[test]
    fn send_rejections_name_their_reason() {
        let mut state = AppState::default();
        assert_eq!(state.check_send("  ", false), Err(SendBlocked::EmptyMessage));
        assert_eq!(state.check_send("fever", false), Err(SendBlocked::Offline));

        state.set_connection(ConnectionStatus {
            connected: true,
            message: "Connected".into(),
        });
        assert_eq!(state.check_send("fever", true), Err(SendBlocked::AwaitingReply));
        assert_eq!(state.check_send("fever", false), Ok(()));
    }
}
