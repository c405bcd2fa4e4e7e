use crate::domain::MatchRecorder;
use crate::interface_adapters::net::WsLink;
use crate::use_cases::{GameSettings, SessionRegistry};
use std::sync::Arc;

pub struct AppState {
    // Wait pool shared by every connection task.
    pub registry: SessionRegistry<WsLink>,
    // Persistence collaborator, called once per finished session.
    pub recorder: Arc<dyn MatchRecorder>,
    // Limits applied to every session.
    pub game_settings: GameSettings,
}
