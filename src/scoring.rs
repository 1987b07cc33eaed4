//! Guess scoring.
//!
//! Two passes over private copies of both codes: exact matches are counted and
//! consumed first, then each remaining guess digit consumes the first unused
//! matching secret digit. Consuming slots keeps repeated digits from being
//! counted twice.

use crate::error::GameResult;
use crate::types::{Code, CODE_LENGTH};

/// Feedback for one guess
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Score {
    pub well_placed: u8,
    pub misplaced: u8,
}

impl Score {
    pub fn is_solved(&self) -> bool {
        self.well_placed as usize == CODE_LENGTH
    }
}

/// Score `guess` against `secret`
pub fn score(secret: &Code, guess: &Code) -> Score {
    let mut secret_left: [Option<u8>; CODE_LENGTH] = (*secret.digits()).map(Some);
    let mut guess_left: [Option<u8>; CODE_LENGTH] = (*guess.digits()).map(Some);
    let mut result = Score::default();

    for i in 0..CODE_LENGTH {
        if secret_left[i] == guess_left[i] {
            result.well_placed += 1;
            secret_left[i] = None;
            guess_left[i] = None;
        }
    }

    for digit in guess_left.into_iter().flatten() {
        if let Some(slot) = secret_left.iter_mut().find(|s| **s == Some(digit)) {
            result.misplaced += 1;
            *slot = None;
        }
    }

    result
}

/// Validate raw digit sequences and score them
pub fn score_digits(secret: &[i64], guess: &[i64]) -> GameResult<Score> {
    let secret = Code::parse(secret)?;
    let guess = Code::parse(guess)?;
    Ok(score(&secret, &guess))
}
