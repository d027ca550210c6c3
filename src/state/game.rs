use super::{GameError, ValidationError};
use crate::llm::AnswerProvider;
use crate::questions::QuestionBank;
use crate::types::*;
use rand::seq::SliceRandom;
use rand::Rng;

/// Wrap a question in the instructions that keep the AI answer human-sounding
pub fn build_prompt(question: &str) -> String {
    format!(
        "You are participating in a Turing Test. Your goal is to sound like a plain, practical human. \
         Provide a concise, natural, and conversational response, typically 1-2 sentences long. \
         Avoid conversational fillers like 'Hmm, that's a good question,' 'As an AI language model,' \
         'I'm glad you asked,' or similar overly chatty phrases. Do not use Gen Z slang or emojis. \
         Be direct and answer as a normal person would. \
         Answer the following question: '{}'",
        question
    )
}

/// All mutable state of one player's game.
///
/// Invariants: `shuffled_answers` is empty or holds exactly one human and one
/// AI option, `correct_index` is set iff answers are present and points at the
/// AI option, and `score <= current_round <= questions.len()`.
#[derive(Debug, Clone)]
pub struct GameState {
    score: u32,
    current_round: usize,
    shuffled_answers: Option<[AnswerOption; 2]>,
    correct_index: Option<usize>,
    user_choice: Option<usize>,
    feedback: Option<Feedback>,
    selected_provider: Option<Provider>,
    api_key: Option<ApiKey>,
    error_flag: bool,
    error_message: Option<String>,
    phase: GamePhase,
}

impl GameState {
    pub fn new() -> Self {
        Self {
            score: 0,
            current_round: 0,
            shuffled_answers: None,
            correct_index: None,
            user_choice: None,
            feedback: None,
            selected_provider: None,
            api_key: None,
            error_flag: false,
            error_message: None,
            phase: GamePhase::AwaitingCredentials,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn current_round(&self) -> usize {
        self.current_round
    }

    pub fn shuffled_answers(&self) -> Option<&[AnswerOption; 2]> {
        self.shuffled_answers.as_ref()
    }

    pub fn correct_index(&self) -> Option<usize> {
        self.correct_index
    }

    pub fn user_choice(&self) -> Option<usize> {
        self.user_choice
    }

    pub fn feedback(&self) -> Option<Feedback> {
        self.feedback
    }

    pub fn selected_provider(&self) -> Option<Provider> {
        self.selected_provider
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn error_flag(&self) -> bool {
        self.error_flag
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    fn require_phase(
        &self,
        operation: &'static str,
        allowed: &[GamePhase],
    ) -> Result<(), GameError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(GameError::InvalidPhase {
                operation,
                phase: self.phase,
            })
        }
    }

    fn clear_round(&mut self) {
        self.shuffled_answers = None;
        self.correct_index = None;
        self.user_choice = None;
        self.feedback = None;
    }

    /// Store credentials and get ready for the first round
    pub fn begin_session(&mut self, api_key: &str, provider: Provider) -> Result<(), GameError> {
        self.require_phase(
            "begin a session",
            &[GamePhase::AwaitingCredentials, GamePhase::Aborted],
        )?;
        let api_key = ApiKey::new(api_key).ok_or(ValidationError::EmptyApiKey)?;

        self.reset_game();
        self.selected_provider = Some(provider);
        self.api_key = Some(api_key);
        self.phase = GamePhase::AwaitingStart;

        tracing::info!("Session started with {}", provider);
        Ok(())
    }

    /// Fetch the AI answer for the current question and deal both answers.
    ///
    /// Any provider failure aborts the session before returning; the error
    /// flag and message stay set so the player can see what went wrong.
    pub async fn start_round<R: Rng + ?Sized>(
        &mut self,
        questions: &QuestionBank,
        answers: &dyn AnswerProvider,
        rng: &mut R,
    ) -> Result<(), GameError> {
        if self.phase == GamePhase::GameOver {
            return Err(GameError::GameOver);
        }
        self.require_phase("start a round", &[GamePhase::AwaitingStart])?;

        let question = match questions.get(self.current_round) {
            Some(q) => q.clone(),
            None => {
                self.phase = GamePhase::GameOver;
                return Err(GameError::GameOver);
            }
        };
        let (provider, api_key) = match (self.selected_provider, self.api_key.clone()) {
            (Some(provider), Some(api_key)) => (provider, api_key),
            _ => {
                return Err(GameError::InvalidPhase {
                    operation: "start a round without credentials",
                    phase: self.phase,
                })
            }
        };

        tracing::info!(
            "Round {}/{}: asking {} for an answer",
            self.current_round + 1,
            questions.len(),
            provider
        );
        self.phase = GamePhase::FetchingAnswer;

        let ai_answer = match answers
            .fetch_answer(&build_prompt(&question.text), &api_key, provider)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Aborting session after {} failure: {}", provider, e);
                self.abort_session();
                self.error_flag = true;
                self.error_message = Some(e.to_string());
                self.phase = GamePhase::Aborted;
                return Err(e.into());
            }
        };

        let mut options = [
            AnswerOption {
                text: question.human_answer,
                origin: Origin::Human,
            },
            AnswerOption {
                text: ai_answer,
                origin: Origin::Ai,
            },
        ];
        options.shuffle(rng);

        self.correct_index = options.iter().position(|o| o.origin == Origin::Ai);
        self.shuffled_answers = Some(options);
        self.user_choice = None;
        self.feedback = None;
        self.phase = GamePhase::AwaitingGuess;

        Ok(())
    }

    /// Record which answer the player currently thinks is the AI's
    pub fn select_choice(&mut self, index: usize) -> Result<(), GameError> {
        self.require_phase("select an answer", &[GamePhase::AwaitingGuess])?;
        if index > 1 {
            return Err(ValidationError::InvalidChoice(index).into());
        }
        self.user_choice = Some(index);
        Ok(())
    }

    /// Score the selected choice and move on to the feedback screen
    pub fn submit_guess(&mut self) -> Result<Feedback, GameError> {
        self.require_phase("submit a guess", &[GamePhase::AwaitingGuess])?;
        let choice = self.user_choice.ok_or(ValidationError::NoSelection)?;

        let feedback = if Some(choice) == self.correct_index {
            self.score += 1;
            Feedback::Correct
        } else {
            Feedback::Incorrect
        };
        self.feedback = Some(feedback);
        self.current_round += 1;
        self.phase = GamePhase::ShowingFeedback;

        tracing::info!(
            "Guess {:?}: score {}/{}",
            feedback,
            self.score,
            self.current_round
        );
        Ok(feedback)
    }

    /// Leave the feedback screen. Returns the new phase.
    pub fn advance_to_next(&mut self, questions: &QuestionBank) -> Result<GamePhase, GameError> {
        self.require_phase("advance to the next question", &[GamePhase::ShowingFeedback])?;

        self.clear_round();
        self.phase = if self.current_round < questions.len() {
            GamePhase::AwaitingStart
        } else {
            tracing::info!("Game over with score {}/{}", self.score, questions.len());
            GamePhase::GameOver
        };
        Ok(self.phase)
    }

    /// Start over with the same provider and key ("Play Again")
    pub fn reset_game(&mut self) {
        self.score = 0;
        self.current_round = 0;
        self.clear_round();
        self.error_flag = false;
        self.error_message = None;
        self.phase = if self.api_key.is_some() && self.selected_provider.is_some() {
            GamePhase::AwaitingStart
        } else {
            GamePhase::AwaitingCredentials
        };
    }

    /// Reset and forget the credentials ("Stop Game")
    pub fn abort_session(&mut self) {
        self.selected_provider = None;
        self.api_key = None;
        self.reset_game();
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
