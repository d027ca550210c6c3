//! HTTP API endpoints.
//!
//! Used by the page to render the provider picker before a session starts.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::llm::model_for;
use crate::state::AppState;
use crate::types::Provider;

/// Information about a supported provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Identifier to send back in `begin_session` (e.g. "gemini")
    pub id: String,
    /// Display name for the picker
    pub name: String,
    /// Model that will write the AI answers
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoResponse {
    pub question_count: usize,
    pub active_sessions: u32,
    pub providers: Vec<ProviderInfo>,
}

/// Describe the game and its providers.
///
/// GET /api/info
pub async fn info(State(state): State<Arc<AppState>>) -> Json<InfoResponse> {
    let providers = Provider::ALL
        .iter()
        .map(|provider| ProviderInfo {
            id: provider.id().to_string(),
            name: provider.display_name().to_string(),
            model: model_for(*provider).to_string(),
        })
        .collect();

    Json(InfoResponse {
        question_count: state.questions.len(),
        active_sessions: state.active_sessions(),
        providers,
    })
}
