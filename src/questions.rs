//! Fixed, ordered trivia questions with one human-written answer each.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Question {
    pub text: String,
    pub human_answer: String,
}

impl Question {
    pub fn new(text: impl Into<String>, human_answer: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            human_answer: human_answer.into(),
        }
    }
}

/// Answers collected from people before the game shipped
const BUILTIN_QUESTIONS: &[(&str, &str)] = &[
    (
        "What is your favorite way to spend a rainy afternoon?",
        "Curled up on the couch with a blanket and a book I've already read twice.",
    ),
    (
        "How do you usually get over a bad day?",
        "I go for a long walk, then call my sister and complain for ten minutes.",
    ),
    (
        "What's the best piece of advice you've ever gotten?",
        "My dad told me to never grocery shop hungry. Saved me a lot of money.",
    ),
    (
        "If you could live in any city for a year, where would it be?",
        "Lisbon. Good food, the ocean nearby, and it doesn't get too cold.",
    ),
    (
        "What food could you eat every day without getting tired of it?",
        "Rice with a fried egg on top. Cheap, fast, and it never gets old.",
    ),
    (
        "What was your first job?",
        "Bagging groceries at the supermarket down the street when I was sixteen.",
    ),
    (
        "How do you take your coffee?",
        "Black in the morning, with milk if it's after lunch.",
    ),
    (
        "What's a small thing that always makes you happy?",
        "Finding money in a jacket pocket from last winter.",
    ),
    (
        "What do you do to fall asleep when you can't?",
        "Put on a boring podcast and usually I'm out in fifteen minutes.",
    ),
    (
        "What's a skill you wish you had learned as a kid?",
        "Swimming properly. I can stay afloat but that's about it.",
    ),
];

/// Read-only question sequence, indexed by round number
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// The question set bundled with the application
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_QUESTIONS
                .iter()
                .map(|(text, answer)| Question::new(*text, *answer))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, round: usize) -> Option<&Question> {
        self.questions.get(round)
    }
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_bank_is_complete() {
        let bank = QuestionBank::builtin();
        assert_eq!(bank.len(), 10);
        assert!(!bank.is_empty());
        for i in 0..bank.len() {
            let q = bank.get(i).unwrap();
            assert!(!q.text.trim().is_empty());
            assert!(!q.human_answer.trim().is_empty());
        }
    }

    #[test]
    fn test_get_past_end() {
        let bank = QuestionBank::new(vec![Question::new("Q", "A")]);
        assert!(bank.get(0).is_some());
        assert!(bank.get(1).is_none());
    }
}
