mod game;

pub use game::{build_prompt, GameState};

use crate::llm::{AnswerProvider, HttpAnswerProvider, LlmConfig, LlmError};
use crate::protocol::GameSnapshot;
use crate::questions::QuestionBank;
use crate::types::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Recoverable input problems. Shown inline, never abort the session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please select an answer before submitting")]
    NoSelection,

    #[error("Please enter your API key first")]
    EmptyApiKey,

    #[error("Choice must be 0 or 1, got {0}")]
    InvalidChoice(usize),
}

/// Errors returned by round controller operations
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Fatal: the session has already been aborted when this is returned
    #[error(transparent)]
    AiFetch(#[from] LlmError),

    #[error("Cannot {operation} while in phase {phase:?}")]
    InvalidPhase {
        operation: &'static str,
        phase: GamePhase,
    },

    #[error("Game Over! You've completed all questions")]
    GameOver,
}

impl GameError {
    /// Protocol error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            GameError::Validation(_) => "VALIDATION",
            GameError::AiFetch(_) => "AI_FETCH_FAILED",
            GameError::InvalidPhase { .. } => "INVALID_PHASE",
            GameError::GameOver => "GAME_OVER",
        }
    }
}

/// Shared application state. Holds only read-only pieces; every session
/// owns its own `GameState`.
#[derive(Clone)]
pub struct AppState {
    pub questions: Arc<QuestionBank>,
    pub answers: Arc<dyn AnswerProvider>,
    active_sessions: Arc<AtomicU32>,
}

impl AppState {
    pub fn new(questions: QuestionBank, answers: Arc<dyn AnswerProvider>) -> Self {
        Self {
            questions: Arc::new(questions),
            answers,
            active_sessions: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Built-in questions and the real provider endpoints
    pub fn from_config(config: LlmConfig) -> Self {
        Self::new(
            QuestionBank::builtin(),
            Arc::new(HttpAnswerProvider::new(config)),
        )
    }

    /// Create a fresh, isolated session and count it as active
    pub fn open_session(&self) -> Session {
        let session = Session::new();
        let active = self.active_sessions.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!("Session {} opened ({} active)", session.id, active);
        session
    }

    pub fn close_session(&self, session: Session) {
        let active = self
            .active_sessions
            .fetch_sub(1, Ordering::SeqCst)
            .saturating_sub(1);
        tracing::info!(
            "Session {} closed at round {} with score {} ({} active)",
            session.id,
            session.game.current_round(),
            session.game.score(),
            active
        );
    }

    pub fn active_sessions(&self) -> u32 {
        self.active_sessions.load(Ordering::SeqCst)
    }
}

/// One player's game plus the randomness used to shuffle its answers
pub struct Session {
    pub id: SessionId,
    pub game: GameState,
    rng: StdRng,
}

impl Session {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Deterministic shuffles, for tests
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            game: GameState::new(),
            rng,
        }
    }

    /// Run `start_round` with this session's RNG and the shared provider
    pub async fn start_round(&mut self, state: &AppState) -> Result<(), GameError> {
        self.game
            .start_round(&state.questions, state.answers.as_ref(), &mut self.rng)
            .await
    }

    pub fn snapshot(&self, questions: &QuestionBank) -> GameSnapshot {
        GameSnapshot::new(&self.game, questions)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmResult;
    use async_trait::async_trait;

    struct FixedAnswer;

    #[async_trait]
    impl AnswerProvider for FixedAnswer {
        async fn fetch_answer(
            &self,
            _prompt: &str,
            _api_key: &ApiKey,
            _provider: Provider,
        ) -> LlmResult<String> {
            Ok("Probably pizza.".to_string())
        }
    }

    fn app_state() -> AppState {
        AppState::new(QuestionBank::builtin(), Arc::new(FixedAnswer))
    }

    #[test]
    fn test_sessions_are_isolated() {
        let state = app_state();
        let mut a = state.open_session();
        let b = state.open_session();

        assert_ne!(a.id, b.id);
        a.game.begin_session("key", Provider::Gemini).unwrap();
        assert_eq!(a.game.phase(), GamePhase::AwaitingStart);
        assert_eq!(b.game.phase(), GamePhase::AwaitingCredentials);
        assert_eq!(state.active_sessions(), 2);

        state.close_session(a);
        assert_eq!(state.active_sessions(), 1);
        state.close_session(b);
        assert_eq!(state.active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_session_start_round_uses_shared_provider() {
        let state = app_state();
        let mut session = Session::with_rng(StdRng::seed_from_u64(7));
        session.game.begin_session("key", Provider::OpenAi).unwrap();

        session.start_round(&state).await.unwrap();

        let answers = session.game.shuffled_answers().unwrap();
        assert!(answers
            .iter()
            .any(|a| a.origin == Origin::Ai && a.text == "Probably pizza."));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            GameError::from(ValidationError::NoSelection).code(),
            "VALIDATION"
        );
        assert_eq!(GameError::GameOver.code(), "GAME_OVER");
        let err = GameError::InvalidPhase {
            operation: "submit a guess",
            phase: GamePhase::AwaitingStart,
        };
        assert_eq!(err.code(), "INVALID_PHASE");
        assert_eq!(
            err.to_string(),
            "Cannot submit a guess while in phase AwaitingStart"
        );
    }
}
