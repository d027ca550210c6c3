//! WebSocket message dispatch
//!
//! Maps each client message onto one round controller operation for the
//! connection's session and answers with the resulting state.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::{AppState, GameError, Session};
use crate::types::GamePhase;

/// Spinner notice to send before a message that will call the AI provider
pub fn loading_notice(msg: &ClientMessage, session: &Session) -> Option<ServerMessage> {
    match msg {
        ClientMessage::StartRound if session.game.phase() == GamePhase::AwaitingStart => session
            .game
            .selected_provider()
            .map(ServerMessage::loading),
        _ => None,
    }
}

/// Handle one client message and return the messages to send back, in order
pub async fn handle_message(
    msg: ClientMessage,
    session: &mut Session,
    state: &AppState,
) -> Vec<ServerMessage> {
    let result = match msg {
        ClientMessage::BeginSession { api_key, provider } => {
            tracing::info!("Session {}: begin with {}", session.id, provider);
            session.game.begin_session(&api_key, provider)
        }
        ClientMessage::StartRound => {
            tracing::info!(
                "Session {}: start round {}",
                session.id,
                session.game.current_round() + 1
            );
            session.start_round(state).await
        }
        ClientMessage::SelectChoice { index } => session.game.select_choice(index),
        ClientMessage::SubmitGuess => session.game.submit_guess().map(|_| ()),
        ClientMessage::NextQuestion => session.game.advance_to_next(&state.questions).map(|_| ()),
        ClientMessage::PlayAgain => {
            tracing::info!("Session {}: play again", session.id);
            session.game.reset_game();
            Ok(())
        }
        ClientMessage::StopGame => {
            tracing::info!("Session {}: stop game", session.id);
            session.game.abort_session();
            Ok(())
        }
        ClientMessage::GetState => Ok(()),
    };

    let snapshot = ServerMessage::State {
        state: session.snapshot(&state.questions),
    };

    match result {
        Ok(()) => vec![snapshot],
        Err(e) => {
            let error = ServerMessage::Error {
                code: e.code().to_string(),
                msg: e.to_string(),
            };
            match &e {
                GameError::Validation(_) | GameError::InvalidPhase { .. } => {
                    tracing::warn!("Session {}: {}", session.id, e);
                    vec![error]
                }
                // Both of these changed the session, so the client needs fresh state
                GameError::AiFetch(_) | GameError::GameOver => {
                    tracing::info!("Session {}: {}", session.id, e);
                    vec![error, snapshot]
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{AnswerProvider, LlmResult};
    use crate::questions::QuestionBank;
    use crate::types::{ApiKey, Provider};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Echo;

    #[async_trait]
    impl AnswerProvider for Echo {
        async fn fetch_answer(
            &self,
            _prompt: &str,
            _api_key: &ApiKey,
            _provider: Provider,
        ) -> LlmResult<String> {
            Ok("echo".to_string())
        }
    }

    fn app_state() -> AppState {
        AppState::new(QuestionBank::builtin(), Arc::new(Echo))
    }

    #[test]
    fn test_loading_notice_only_when_round_can_start() {
        let mut session = Session::new();
        assert!(loading_notice(&ClientMessage::StartRound, &session).is_none());

        session.game.begin_session("key", Provider::Gemini).unwrap();
        assert!(matches!(
            loading_notice(&ClientMessage::StartRound, &session),
            Some(ServerMessage::Loading {
                provider: Provider::Gemini,
                ..
            })
        ));
        assert!(loading_notice(&ClientMessage::SubmitGuess, &session).is_none());
    }

    #[tokio::test]
    async fn test_validation_error_sends_only_error() {
        let state = app_state();
        let mut session = Session::new();

        let responses = handle_message(
            ClientMessage::BeginSession {
                api_key: "".to_string(),
                provider: Provider::OpenAi,
            },
            &mut session,
            &state,
        )
        .await;

        assert_eq!(responses.len(), 1);
        match &responses[0] {
            ServerMessage::Error { code, msg } => {
                assert_eq!(code, "VALIDATION");
                assert_eq!(msg, "Please enter your API key first");
            }
            other => panic!("Expected Error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_state_returns_snapshot() {
        let state = app_state();
        let mut session = Session::new();

        let responses = handle_message(ClientMessage::GetState, &mut session, &state).await;

        match responses.as_slice() {
            [ServerMessage::State { state }] => {
                assert_eq!(state.phase, GamePhase::AwaitingCredentials);
            }
            other => panic!("Expected a single State, got {:?}", other),
        }
    }
}
