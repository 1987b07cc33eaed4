//! Per-session state and its phase machine.
//!
//! `Game` is the authoritative record for one session. Phases only move
//! forward (SETUP → TRANSITION → GUESSING → GAME_OVER); the single way back is
//! [`Game::reset`]. Every operation checks the current phase first and leaves
//! the record untouched when it returns an error.

use chrono::{DateTime, Utc};
use rand::seq::IndexedRandom;
use rand::Rng;

use crate::error::{GameError, GameResult};
use crate::scoring;
use crate::types::*;

/// Result of a submitted guess
#[derive(Debug, Clone, PartialEq)]
pub struct GuessOutcome {
    pub guess: Guess,
    pub phase: GamePhase,
    pub is_victory: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct Game {
    code: GameCode,
    config: GameConfig,
    phase: GamePhase,
    secret: Option<Code>,
    guesses: Vec<Guess>,
    hints_remaining: u8,
    revealed_hints: Vec<Hint>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    is_victory: Option<bool>,
}

impl Game {
    pub fn new(code: GameCode, mut config: GameConfig) -> Self {
        // A hint per position at most
        config.max_hints = config.max_hints.min(CODE_LENGTH as u8);
        let hints_remaining = config.max_hints;

        Self {
            code,
            config,
            phase: GamePhase::Setup,
            secret: None,
            guesses: Vec::new(),
            hints_remaining,
            revealed_hints: Vec::new(),
            started_at: None,
            finished_at: None,
            is_victory: None,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn guesses(&self) -> &[Guess] {
        &self.guesses
    }

    pub fn hints_remaining(&self) -> u8 {
        self.hints_remaining
    }

    pub fn revealed_hints(&self) -> &[Hint] {
        &self.revealed_hints
    }

    pub fn is_victory(&self) -> Option<bool> {
        self.is_victory
    }

    fn require_phase(
        &self,
        expected: GamePhase,
        action: &'static str,
        allowed: &'static str,
    ) -> GameResult<()> {
        if self.phase != expected {
            return Err(GameError::InvalidPhase {
                action,
                allowed,
                current: self.phase,
            });
        }
        Ok(())
    }

    /// Store the secret and move to TRANSITION
    pub fn set_secret(&mut self, raw: &[i64]) -> GameResult<()> {
        self.require_phase(GamePhase::Setup, "Setting the secret code", "SETUP")?;
        let secret = Code::parse(raw)?;

        self.secret = Some(secret);
        self.phase = GamePhase::Transition;
        Ok(())
    }

    /// Start the clock and move to GUESSING
    pub fn start_guessing(&mut self, now: DateTime<Utc>) -> GameResult<()> {
        self.require_phase(GamePhase::Transition, "Starting the guessing phase", "TRANSITION")?;

        self.started_at = Some(now);
        self.phase = GamePhase::Guessing;
        Ok(())
    }

    /// Score a guess, record it, and end the game on a win or on the last attempt
    pub fn submit_guess(&mut self, raw: &[i64], now: DateTime<Utc>) -> GameResult<GuessOutcome> {
        self.require_phase(GamePhase::Guessing, "Submitting a guess", "GUESSING")?;
        if self.guesses.len() >= MAX_ATTEMPTS {
            return Err(GameError::AttemptsExhausted(MAX_ATTEMPTS));
        }
        let digits = Code::parse(raw)?;
        // GUESSING is only reachable through set_secret
        let secret = self
            .secret
            .ok_or_else(|| GameError::Validation("Secret code not set".to_string()))?;

        let score = scoring::score(&secret, &digits);
        let guess = Guess {
            id: self.guesses.len() as u32 + 1,
            digits,
            well_placed: score.well_placed,
            misplaced: score.misplaced,
        };
        self.guesses.push(guess.clone());

        if score.is_solved() {
            self.finish(true, now);
        } else if self.guesses.len() >= MAX_ATTEMPTS {
            self.finish(false, now);
        }

        Ok(GuessOutcome {
            guess,
            phase: self.phase,
            is_victory: self.is_victory,
        })
    }

    fn finish(&mut self, victory: bool, now: DateTime<Utc>) {
        self.phase = GamePhase::GameOver;
        self.is_victory = Some(victory);
        self.finished_at = Some(now);
    }

    /// Reveal one not-yet-revealed position, chosen uniformly at random
    pub fn request_hint<R: Rng + ?Sized>(&mut self, rng: &mut R) -> GameResult<HintReveal> {
        self.require_phase(GamePhase::Guessing, "Requesting a hint", "GUESSING")?;
        if self.hints_remaining == 0 {
            return Err(GameError::NoHintsRemaining);
        }
        let secret = self
            .secret
            .ok_or_else(|| GameError::Validation("Secret code not set".to_string()))?;

        let unrevealed: Vec<usize> = (0..CODE_LENGTH)
            .filter(|pos| !self.revealed_hints.iter().any(|h| h.position == *pos))
            .collect();
        let position = *unrevealed.choose(rng).ok_or(GameError::NoHintsRemaining)?;
        let digit = secret.digits()[position];

        self.hints_remaining -= 1;
        self.revealed_hints.push(Hint { position, digit });

        Ok(HintReveal {
            position,
            digit,
            hints_remaining: self.hints_remaining,
        })
    }

    /// Back to SETUP, keeping the code and configuration.
    ///
    /// Accepted from every phase so a game in progress can be abandoned.
    pub fn reset(&mut self) {
        self.phase = GamePhase::Setup;
        self.secret = None;
        self.guesses.clear();
        self.hints_remaining = self.config.max_hints;
        self.revealed_hints.clear();
        self.started_at = None;
        self.finished_at = None;
        self.is_victory = None;
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            game_code: self.code.clone(),
            game_phase: self.phase,
            guesses: self.guesses.clone(),
            max_attempts: MAX_ATTEMPTS,
            is_victory: self.is_victory,
            max_hints: self.config.max_hints,
            hints_remaining: self.hints_remaining,
            revealed_hints: self.revealed_hints.clone(),
            time_limit: self.config.time_limit,
            secret_code: match self.phase {
                GamePhase::GameOver => self.secret,
                _ => None,
            },
        }
    }

    /// Elapsed guessing time as of `now`; frozen once the game is over
    pub fn timer(&self, now: DateTime<Utc>) -> TimerInfo {
        let elapsed = self.started_at.map(|start| {
            let end = self.finished_at.unwrap_or(now);
            (end - start).num_milliseconds().max(0) as f64 / 1000.0
        });
        let limit = self.config.time_limit;

        let is_expired = match (elapsed, limit) {
            (Some(e), Some(l)) => e > l as f64,
            _ => false,
        };
        let time_remaining = match (elapsed, limit) {
            (Some(e), Some(l)) => Some((l as f64 - e).max(0.0)),
            _ => None,
        };

        TimerInfo {
            elapsed_time: elapsed,
            time_limit: limit,
            is_expired,
            time_remaining,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn new_game() -> Game {
        Game::new("ABC123".to_string(), GameConfig::default())
    }

    fn guessing_game(secret: [i64; 4]) -> Game {
        let mut game = new_game();
        game.set_secret(&secret).unwrap();
        game.start_guessing(Utc::now()).unwrap();
        game
    }

    #[test]
    fn test_new_game_starts_in_setup() {
        let game = new_game();
        assert_eq!(game.phase(), GamePhase::Setup);
        assert!(game.guesses().is_empty());
        assert_eq!(game.hints_remaining(), 2);
        assert!(game.revealed_hints().is_empty());
        assert_eq!(game.is_victory(), None);
    }

    #[test]
    fn test_forward_phase_flow() {
        let mut game = new_game();
        game.set_secret(&[1, 2, 3, 4]).unwrap();
        assert_eq!(game.phase(), GamePhase::Transition);

        game.start_guessing(Utc::now()).unwrap();
        assert_eq!(game.phase(), GamePhase::Guessing);

        let outcome = game.submit_guess(&[1, 2, 3, 4], Utc::now()).unwrap();
        assert_eq!(outcome.phase, GamePhase::GameOver);
        assert_eq!(outcome.is_victory, Some(true));
        assert_eq!(outcome.guess.well_placed, 4);
    }

    #[test]
    fn test_operations_rejected_outside_their_phase() {
        let mut game = new_game();
        assert!(matches!(
            game.start_guessing(Utc::now()),
            Err(GameError::InvalidPhase { current: GamePhase::Setup, .. })
        ));
        assert!(matches!(
            game.submit_guess(&[1, 2, 3, 4], Utc::now()),
            Err(GameError::InvalidPhase { .. })
        ));
        assert!(matches!(
            game.request_hint(&mut rand::rng()),
            Err(GameError::InvalidPhase { .. })
        ));

        game.set_secret(&[1, 2, 3, 4]).unwrap();
        assert!(matches!(
            game.set_secret(&[4, 3, 2, 1]),
            Err(GameError::InvalidPhase { current: GamePhase::Transition, .. })
        ));
        assert!(matches!(
            game.submit_guess(&[1, 2, 3, 4], Utc::now()),
            Err(GameError::InvalidPhase { .. })
        ));
    }

    #[test]
    fn test_invalid_secret_leaves_game_untouched() {
        let mut game = new_game();
        assert!(matches!(
            game.set_secret(&[1, 2, 3]),
            Err(GameError::Validation(_))
        ));
        assert!(matches!(
            game.set_secret(&[1, 2, 3, 0]),
            Err(GameError::Validation(_))
        ));
        assert_eq!(game.phase(), GamePhase::Setup);
        assert!(game.secret.is_none());
    }

    #[test]
    fn test_invalid_guess_is_not_recorded() {
        let mut game = guessing_game([1, 2, 3, 4]);
        assert!(matches!(
            game.submit_guess(&[1, 2, 3, 10], Utc::now()),
            Err(GameError::Validation(_))
        ));
        assert!(game.guesses().is_empty());
        assert_eq!(game.phase(), GamePhase::Guessing);
    }

    #[test]
    fn test_guess_ids_are_sequential() {
        let mut game = guessing_game([1, 2, 3, 4]);
        for expected in 1..=3 {
            let outcome = game.submit_guess(&[5, 6, 7, 8], Utc::now()).unwrap();
            assert_eq!(outcome.guess.id, expected);
            assert_eq!(outcome.phase, GamePhase::Guessing);
            assert_eq!(outcome.is_victory, None);
        }
        let ids: Vec<u32> = game.guesses().iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_ten_misses_end_the_game() {
        let mut game = guessing_game([1, 2, 3, 4]);
        for i in 0..MAX_ATTEMPTS {
            let outcome = game.submit_guess(&[4, 3, 2, 1], Utc::now()).unwrap();
            if i + 1 < MAX_ATTEMPTS {
                assert_eq!(outcome.phase, GamePhase::Guessing);
            } else {
                assert_eq!(outcome.phase, GamePhase::GameOver);
                assert_eq!(outcome.is_victory, Some(false));
            }
        }
        assert_eq!(game.guesses().len(), MAX_ATTEMPTS);
        assert!(matches!(
            game.submit_guess(&[1, 2, 3, 4], Utc::now()),
            Err(GameError::InvalidPhase { current: GamePhase::GameOver, .. })
        ));
    }

    #[test]
    fn test_win_on_last_attempt_is_a_victory() {
        let mut game = guessing_game([1, 2, 3, 4]);
        for _ in 0..MAX_ATTEMPTS - 1 {
            game.submit_guess(&[9, 9, 9, 9], Utc::now()).unwrap();
        }
        let outcome = game.submit_guess(&[1, 2, 3, 4], Utc::now()).unwrap();
        assert_eq!(outcome.phase, GamePhase::GameOver);
        assert_eq!(outcome.is_victory, Some(true));
    }

    #[test]
    fn test_attempts_exhausted_guard() {
        let mut game = guessing_game([1, 2, 3, 4]);
        for _ in 0..MAX_ATTEMPTS {
            let _ = game.submit_guess(&[9, 9, 9, 9], Utc::now());
        }
        // Force the phase back to exercise the attempt ceiling directly
        game.phase = GamePhase::Guessing;
        assert_eq!(
            game.submit_guess(&[1, 2, 3, 4], Utc::now()),
            Err(GameError::AttemptsExhausted(MAX_ATTEMPTS))
        );
        assert_eq!(game.guesses().len(), MAX_ATTEMPTS);
    }

    #[test]
    fn test_hint_budget() {
        let mut game = guessing_game([5, 6, 7, 8]);
        let mut rng = StdRng::seed_from_u64(7);

        let first = game.request_hint(&mut rng).unwrap();
        assert_eq!(first.hints_remaining, 1);
        let second = game.request_hint(&mut rng).unwrap();
        assert_eq!(second.hints_remaining, 0);

        assert_eq!(
            game.request_hint(&mut rng),
            Err(GameError::NoHintsRemaining)
        );

        assert_ne!(first.position, second.position);
        assert_eq!(game.revealed_hints().len(), 2);
        for hint in game.revealed_hints() {
            assert_eq!(hint.digit as usize, 5 + hint.position);
        }
    }

    #[test]
    fn test_hints_never_repeat_a_position() {
        let config = GameConfig {
            max_hints: 10,
            time_limit: None,
        };
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..50 {
            let mut game = Game::new("X".into(), config.clone());
            game.set_secret(&[1, 2, 3, 4]).unwrap();
            game.start_guessing(Utc::now()).unwrap();

            // Budget is clamped to one hint per position
            assert_eq!(game.hints_remaining(), 4);
            let mut positions: Vec<usize> = (0..4)
                .map(|_| game.request_hint(&mut rng).unwrap().position)
                .collect();
            positions.sort();
            assert_eq!(positions, vec![0, 1, 2, 3]);
            assert_eq!(
                game.request_hint(&mut rng),
                Err(GameError::NoHintsRemaining)
            );
        }
    }

    #[test]
    fn test_hint_positions_cover_every_slot() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut seen = [0u32; CODE_LENGTH];
        for _ in 0..400 {
            let mut game = guessing_game([1, 2, 3, 4]);
            let hint = game.request_hint(&mut rng).unwrap();
            seen[hint.position] += 1;
        }
        assert!(seen.iter().all(|&count| count > 50), "{:?}", seen);
    }

    #[test]
    fn test_hints_independent_of_guesses() {
        let mut game = guessing_game([1, 2, 3, 4]);
        game.submit_guess(&[5, 5, 5, 5], Utc::now()).unwrap();
        game.request_hint(&mut rand::rng()).unwrap();
        game.submit_guess(&[6, 6, 6, 6], Utc::now()).unwrap();
        assert_eq!(game.guesses().len(), 2);
        assert_eq!(game.hints_remaining(), 1);
    }

    #[test]
    fn test_reset_clears_everything_but_the_code() {
        let mut game = guessing_game([1, 2, 3, 4]);
        game.submit_guess(&[1, 2, 3, 5], Utc::now()).unwrap();
        game.request_hint(&mut rand::rng()).unwrap();

        game.reset();

        let snapshot = game.snapshot();
        assert_eq!(snapshot.game_code, "ABC123");
        assert_eq!(snapshot.game_phase, GamePhase::Setup);
        assert!(snapshot.guesses.is_empty());
        assert!(snapshot.revealed_hints.is_empty());
        assert_eq!(snapshot.hints_remaining, 2);
        assert_eq!(snapshot.is_victory, None);
        assert!(game.secret.is_none());
        assert_eq!(game.timer(Utc::now()).elapsed_time, None);

        // A new secret can be set after reset
        game.set_secret(&[9, 8, 7, 6]).unwrap();
        assert_eq!(game.phase(), GamePhase::Transition);
    }

    #[test]
    fn test_snapshot_hides_secret_until_game_over() {
        let mut game = new_game();
        game.set_secret(&[1, 2, 3, 4]).unwrap();
        assert_eq!(game.snapshot().secret_code, None);

        game.start_guessing(Utc::now()).unwrap();
        game.submit_guess(&[4, 3, 2, 1], Utc::now()).unwrap();
        assert_eq!(game.snapshot().secret_code, None);

        game.submit_guess(&[1, 2, 3, 4], Utc::now()).unwrap();
        assert_eq!(
            game.snapshot().secret_code,
            Some(Code::parse(&[1, 2, 3, 4]).unwrap())
        );
    }

    #[test]
    fn test_timer_before_start() {
        let game = Game::new(
            "T".into(),
            GameConfig {
                max_hints: 2,
                time_limit: Some(60),
            },
        );
        let timer = game.timer(Utc::now());
        assert_eq!(timer.elapsed_time, None);
        assert_eq!(timer.time_limit, Some(60));
        assert!(!timer.is_expired);
        assert_eq!(timer.time_remaining, None);
    }

    #[test]
    fn test_timer_counts_and_expires() {
        let mut game = Game::new(
            "T".into(),
            GameConfig {
                max_hints: 2,
                time_limit: Some(60),
            },
        );
        let start = Utc::now();
        game.set_secret(&[1, 2, 3, 4]).unwrap();
        game.start_guessing(start).unwrap();

        let timer = game.timer(start + Duration::seconds(15));
        assert_eq!(timer.elapsed_time, Some(15.0));
        assert_eq!(timer.time_remaining, Some(45.0));
        assert!(!timer.is_expired);

        let timer = game.timer(start + Duration::seconds(90));
        assert!(timer.is_expired);
        assert_eq!(timer.time_remaining, Some(0.0));
    }

    #[test]
    fn test_timer_freezes_at_game_over() {
        let mut game = guessing_game([1, 2, 3, 4]);
        let start = game.started_at.unwrap();
        game.submit_guess(&[1, 2, 3, 4], start + Duration::seconds(30))
            .unwrap();

        let later = game.timer(start + Duration::seconds(600));
        assert_eq!(later.elapsed_time, Some(30.0));
        assert!(!later.is_expired);
        assert_eq!(later.time_remaining, None);
    }
}
