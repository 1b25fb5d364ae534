use std::sync::Arc;

use crate::{
    config::Config,
    services::{question_bank::QuestionBank, session_store::SessionStore},
};
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub bank: Arc<dyn QuestionBank>,
    pub sessions: SessionStore,
    pub config: Config,
}

impl FromRef<AppState> for Arc<dyn QuestionBank> {
    fn from_ref(state: &AppState) -> Self {
        state.bank.clone()
    }
}

impl FromRef<AppState> for SessionStore {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
