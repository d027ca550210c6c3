use crate::questions::QuestionBank;
use crate::state::GameState;
use crate::types::*;
use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Enter credentials and pick a provider
    BeginSession {
        api_key: String,
        provider: Provider,
    },
    StartRound,
    SelectChoice {
        index: usize,
    },
    SubmitGuess,
    NextQuestion,
    PlayAgain,
    /// Also used for "change model / API key"
    StopGame,
    GetState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        session_id: SessionId,
        question_count: usize,
        server_now: String,
    },
    /// The AI answer is being generated; show a spinner until the next `state`
    Loading {
        provider: Provider,
        message: String,
    },
    State {
        state: GameSnapshot,
    },
    Error {
        code: String,
        msg: String,
    },
}

impl ServerMessage {
    pub fn loading(provider: Provider) -> Self {
        ServerMessage::Loading {
            provider,
            message: format!("Generating AI response using {}...", provider),
        }
    }
}

/// One of the two answers as shown to the player. The origin is only filled
/// in once the guess has been scored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerView {
    pub label: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,
}

/// Read-only view of a session for rendering. Never contains the API key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameSnapshot {
    pub phase: GamePhase,
    pub score: u32,
    pub current_round: usize,
    pub total_rounds: usize,
    pub question: Option<String>,
    pub answers: Vec<AnswerView>,
    pub user_choice: Option<usize>,
    /// Only revealed while showing feedback
    pub correct_index: Option<usize>,
    pub feedback: Option<String>,
    pub provider: Option<Provider>,
    pub error: bool,
    pub error_message: Option<String>,
    pub final_message: Option<String>,
}

impl GameSnapshot {
    pub fn new(game: &GameState, questions: &QuestionBank) -> Self {
        let phase = game.phase();
        let revealed = phase == GamePhase::ShowingFeedback;

        // While feedback is shown the round counter has already moved on
        let question_index = if revealed {
            game.current_round().checked_sub(1)
        } else {
            Some(game.current_round())
        };
        let question = match phase {
            GamePhase::AwaitingStart
            | GamePhase::FetchingAnswer
            | GamePhase::AwaitingGuess
            | GamePhase::ShowingFeedback => question_index
                .and_then(|i| questions.get(i))
                .map(|q| q.text.clone()),
            _ => None,
        };

        let answers = game
            .shuffled_answers()
            .map(|options| {
                options
                    .iter()
                    .zip(["A", "B"])
                    .map(|(option, label)| AnswerView {
                        label: label.to_string(),
                        text: option.text.clone(),
                        origin: revealed.then_some(option.origin),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let final_message = (phase == GamePhase::GameOver).then(|| {
            format!(
                "Game Over! Final Score: {} / {}",
                game.score(),
                questions.len()
            )
        });

        Self {
            phase,
            score: game.score(),
            current_round: game.current_round(),
            total_rounds: questions.len(),
            question,
            answers,
            user_choice: game.user_choice(),
            correct_index: if revealed { game.correct_index() } else { None },
            feedback: game.feedback().map(|f| f.message().to_string()),
            provider: game.selected_provider(),
            error: game.error_flag(),
            error_message: game.error_message().map(str::to_string),
            final_message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_parsing() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"t": "begin_session", "api_key": "abc", "provider": "openai"}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::BeginSession { api_key, provider } => {
                assert_eq!(api_key, "abc");
                assert_eq!(provider, Provider::OpenAi);
            }
            other => panic!("Unexpected message {:?}", other),
        }

        let msg: ClientMessage =
            serde_json::from_str(r#"{"t": "select_choice", "index": 1}"#).unwrap();
        assert!(matches!(msg, ClientMessage::SelectChoice { index: 1 }));

        let msg: ClientMessage = serde_json::from_str(r#"{"t": "next_question"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::NextQuestion));
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let result = serde_json::from_str::<ClientMessage>(
            r#"{"t": "begin_session", "api_key": "abc", "provider": "claude"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_fresh_snapshot() {
        let snapshot = GameSnapshot::new(&GameState::new(), &QuestionBank::builtin());
        assert_eq!(snapshot.phase, GamePhase::AwaitingCredentials);
        assert_eq!(snapshot.total_rounds, 10);
        assert!(snapshot.question.is_none());
        assert!(snapshot.answers.is_empty());
        assert!(snapshot.final_message.is_none());
    }

    #[test]
    fn test_snapshot_never_contains_api_key() {
        let mut game = GameState::new();
        game.begin_session("sk-very-secret", Provider::OpenAi).unwrap();
        let snapshot = GameSnapshot::new(&game, &QuestionBank::builtin());

        let json = serde_json::to_string(&ServerMessage::State { state: snapshot }).unwrap();
        assert!(!json.contains("sk-very-secret"));
        assert!(json.contains("\"t\":\"state\""));
        assert!(json.contains("\"provider\":\"openai\""));
    }

    #[test]
    fn test_loading_message_names_provider() {
        match ServerMessage::loading(Provider::Gemini) {
            ServerMessage::Loading { message, .. } => {
                assert_eq!(message, "Generating AI response using Gemini...");
            }
            other => panic!("Unexpected message {:?}", other),
        }
    }
}
