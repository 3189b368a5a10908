//! Game Session Orchestration
//!
//! Sequences one game between the human and the computer:
//!
//! ```text
//! DetermineFirstMove -> SelectDice -> ThrowComputer -> ThrowHuman
//!                    -> Resolve -> Verify -> Done
//! ```
//!
//! Every random outcome the human could dispute goes through a commit
//! round: the digest is published, the human answers, then key and value
//! are disclosed and appended to the session ledger. All I/O goes through
//! the [`Presenter`] trait; this module only makes decisions.

use std::io;

use rand::{CryptoRng, RngCore};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::dice::Die;
use crate::core::rng::{secure_random_in_range, RangeError};
use crate::game::probability::{compute_matrix, ProbabilityMatrix};
use crate::proof::combine::{combine, CombineError};
use crate::proof::commitment::{commit, Disclosure};
use crate::proof::ledger::{LedgerError, VerificationLedger, VerificationOutcome};

/// Ledger context of the first-move round.
pub const FIRST_MOVE_CONTEXT: &str = "first-move-selection";
/// Ledger context of the computer's throw.
pub const COMPUTER_THROW_CONTEXT: &str = "computer-throw";
/// Ledger context of the human's throw.
pub const USER_THROW_CONTEXT: &str = "user-throw";

/// A participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    /// The person at the prompt.
    Human,
    /// The program.
    Computer,
}

/// Session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Commit round deciding who picks a die first.
    DetermineFirstMove,
    /// Both parties pick distinct dice.
    SelectDice,
    /// Commit round for the computer's throw.
    ThrowComputer,
    /// Commit round for the human's throw.
    ThrowHuman,
    /// Compare faces.
    Resolve,
    /// Ledger queries.
    Verify,
    /// Finished.
    Done,
}

/// What to do with an invalid answer at a game prompt.
///
/// Verification and help loops always re-prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputPolicy {
    /// Report the problem and ask again.
    #[default]
    Reprompt,
    /// Report the problem and end the session.
    Strict,
}

/// Final faces and winner of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameResult {
    /// Face thrown by the computer.
    pub computer_face: i64,
    /// Face thrown by the human.
    pub human_face: i64,
    /// Strictly higher face wins; `None` is a tie.
    pub winner: Option<Party>,
}

impl GameResult {
    /// Compare two faces. Equal faces are a tie, never re-thrown.
    pub fn resolve(computer_face: i64, human_face: i64) -> Self {
        let winner = if human_face > computer_face {
            Some(Party::Human)
        } else if computer_face > human_face {
            Some(Party::Computer)
        } else {
            None
        };

        Self {
            computer_face,
            human_face,
            winner,
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEnd {
    /// Game played to the end.
    Completed(GameResult),
    /// Human asked to exit (or input closed) during `phase`.
    Aborted {
        /// Phase the exit happened in.
        phase: SessionPhase,
    },
    /// Invalid answer under [`InputPolicy::Strict`].
    Rejected {
        /// Phase the answer was given in.
        phase: SessionPhase,
        /// What was wrong with it.
        error: InputError,
    },
}

/// A question for the human.
#[derive(Debug, Clone, PartialEq)]
pub enum Prompt {
    /// Guess the committed 0/1 value.
    GuessFirstMove,
    /// Pick a die; each option is `(display position, die)`.
    ChooseDie {
        /// Dice still available.
        options: Vec<(usize, Die)>,
        /// True when the human picks first.
        first: bool,
    },
    /// Contribution to a throw, in `[0, range)`.
    ThrowContribution {
        /// Ledger context of the round.
        context: &'static str,
        /// Face count of the die.
        range: u32,
    },
    /// Record to verify (index or label), or exit.
    VerifySelection,
    /// Disclosed key for a record.
    DisclosedKey {
        /// Record being verified.
        context: String,
    },
    /// Disclosed value for a record.
    DisclosedValue {
        /// Record being verified.
        context: String,
    },
}

/// Something the human should see.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A digest was published; key and value are withheld.
    CommitmentPublished {
        /// Round label.
        context: &'static str,
        /// Value range.
        range: u32,
        /// Uppercase hex digest.
        digest: String,
    },
    /// Key and value of a round were revealed.
    Disclosed {
        /// Round label.
        context: &'static str,
        /// Committed value.
        value: u32,
        /// Uppercase hex key.
        key: String,
    },
    /// First move decided.
    FirstMove {
        /// Who picks a die first.
        mover: Party,
        /// The human's guess.
        guess: u32,
    },
    /// A die was taken from the pool.
    DieChosen {
        /// Who took it.
        party: Party,
        /// Index into the session's dice.
        index: usize,
        /// The die.
        die: Die,
    },
    /// A throw resolved to a face.
    ThrowResolved {
        /// Whose throw.
        party: Party,
        /// Committed value.
        committed: u32,
        /// Human contribution.
        contribution: u32,
        /// `(committed + contribution) mod range`.
        index: u32,
        /// Face count.
        range: u32,
        /// Resulting face.
        face: i64,
    },
    /// The game is decided.
    GameOver(GameResult),
    /// Help screen with freshly computed odds.
    Help {
        /// Session dice.
        dice: Vec<Die>,
        /// Pairwise win probabilities.
        matrix: ProbabilityMatrix,
    },
    /// Answer was rejected.
    InvalidInput {
        /// Why.
        error: InputError,
    },
    /// Ledger listing `(display index, context)`.
    Ledger {
        /// Entries in round order.
        records: Vec<(usize, String)>,
    },
    /// Result of a verification query.
    Verification {
        /// What the human asked for.
        selector: String,
        /// Recorded digest, when the record exists.
        digest: Option<String>,
        /// Outcome.
        outcome: VerificationOutcome,
    },
    /// Session ended on the human's request.
    Aborted,
}

/// The presentation layer the session talks to.
pub trait Presenter {
    /// Ask a question and return one raw answer line.
    fn ask(&mut self, prompt: &Prompt) -> Result<String, PresenterError>;

    /// Show an event.
    fn notify(&mut self, event: &SessionEvent) -> Result<(), PresenterError>;
}

/// Presentation layer failures.
#[derive(Debug, Error)]
pub enum PresenterError {
    /// Input stream ended.
    #[error("input closed")]
    Closed,

    /// Terminal I/O failed.
    #[error("terminal I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A rejected answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// Not a number, `?` or `x`.
    #[error("not a number: {0:?}")]
    NotANumber(String),

    /// Number outside the offered choices.
    #[error("{value} is not in 0..{range}")]
    OutOfRange {
        /// Value given.
        value: u64,
        /// Exclusive upper bound.
        range: u32,
    },
}

/// Session failures (not user mistakes).
#[derive(Debug, Error)]
pub enum SessionError {
    /// Fewer than two dice to choose from.
    #[error("a session needs at least 2 dice, got {0}")]
    NotEnoughDice(usize),

    /// Die with more faces than a commit round supports.
    #[error("die has too many faces: {0}")]
    TooManyFaces(usize),

    /// Phase reached without the data earlier phases produce.
    #[error("invalid session state in phase {0:?}")]
    InvalidState(SessionPhase),

    /// Presentation layer failed.
    #[error(transparent)]
    Presenter(#[from] PresenterError),

    /// Ledger rejected a record.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Bad random range.
    #[error(transparent)]
    Range(#[from] RangeError),

    /// Bad combine input.
    #[error(transparent)]
    Combine(#[from] CombineError),
}

/// Parsed answer line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Reply {
    Exit,
    Help,
    Number(u64),
}

impl Reply {
    fn parse(line: &str) -> Result<Self, InputError> {
        let line = line.trim();
        if line.eq_ignore_ascii_case("x") {
            return Ok(Self::Exit);
        }
        if line == "?" {
            return Ok(Self::Help);
        }
        line.parse::<u64>()
            .map(Self::Number)
            .map_err(|_| InputError::NotANumber(line.to_string()))
    }
}

/// Outcome of asking for a value: either the value or the session's end.
enum Answer<T> {
    Value(T),
    Stop(SessionEnd),
}

enum Transition {
    Next(SessionPhase),
    End(SessionEnd),
}

/// Dice not yet taken, by index into the session's dice.
#[derive(Debug, Clone)]
struct DicePool {
    available: Vec<usize>,
}

impl DicePool {
    fn new(count: usize) -> Self {
        Self {
            available: (0..count).collect(),
        }
    }

    fn len(&self) -> usize {
        self.available.len()
    }

    /// Remove the die at display `position`, returning its index.
    fn take(&mut self, position: usize) -> Option<usize> {
        (position < self.available.len()).then(|| self.available.remove(position))
    }

    fn options(&self, dice: &[Die]) -> Vec<(usize, Die)> {
        self.available
            .iter()
            .enumerate()
            .map(|(pos, &idx)| (pos, dice[idx].clone()))
            .collect()
    }
}

/// One game between the human and the computer.
pub struct GameSession<R, P> {
    id: Uuid,
    dice: Vec<Die>,
    policy: InputPolicy,
    rng: R,
    presenter: P,
    ledger: VerificationLedger,
    phase: SessionPhase,
    first_mover: Option<Party>,
    computer_die: Option<usize>,
    human_die: Option<usize>,
    computer_face: Option<i64>,
    human_face: Option<i64>,
    result: Option<GameResult>,
}

impl<R: RngCore + CryptoRng, P: Presenter> GameSession<R, P> {
    /// Create a session over `dice` (at least two).
    pub fn new(dice: Vec<Die>, rng: R, presenter: P) -> Result<Self, SessionError> {
        if dice.len() < 2 {
            return Err(SessionError::NotEnoughDice(dice.len()));
        }
        if let Some(die) = dice.iter().find(|d| u32::try_from(d.face_count()).is_err()) {
            return Err(SessionError::TooManyFaces(die.face_count()));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            dice,
            policy: InputPolicy::default(),
            rng,
            presenter,
            ledger: VerificationLedger::new(),
            phase: SessionPhase::DetermineFirstMove,
            first_mover: None,
            computer_die: None,
            human_die: None,
            computer_face: None,
            human_face: None,
            result: None,
        })
    }

    /// Set the invalid-input policy for game prompts.
    pub fn with_policy(mut self, policy: InputPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Session identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Commitments disclosed so far.
    pub fn ledger(&self) -> &VerificationLedger {
        &self.ledger
    }

    /// Dice chosen as `(computer, human)`, once selection is done.
    pub fn chosen_dice(&self) -> Option<(&Die, &Die)> {
        Some((&self.dice[self.computer_die?], &self.dice[self.human_die?]))
    }

    /// The presentation layer.
    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Run the state machine until the session ends.
    pub fn run(&mut self) -> Result<SessionEnd, SessionError> {
        info!(session = %self.id, dice = self.dice.len(), "session started");

        loop {
            debug!(session = %self.id, phase = ?self.phase, "entering phase");

            let transition = match self.phase {
                SessionPhase::DetermineFirstMove => self.determine_first_move()?,
                SessionPhase::SelectDice => self.select_dice()?,
                SessionPhase::ThrowComputer => self.throw(Party::Computer)?,
                SessionPhase::ThrowHuman => self.throw(Party::Human)?,
                SessionPhase::Resolve => self.resolve()?,
                SessionPhase::Verify => self.verify()?,
                SessionPhase::Done => {
                    let result = self.result.ok_or(SessionError::InvalidState(SessionPhase::Done))?;
                    Transition::End(SessionEnd::Completed(result))
                }
            };

            match transition {
                Transition::Next(phase) => self.phase = phase,
                Transition::End(end) => {
                    info!(session = %self.id, phase = ?self.phase, end = ?end, "session ended");
                    self.phase = SessionPhase::Done;
                    return Ok(end);
                }
            }
        }
    }

    // =========================================================================
    // PHASES
    // =========================================================================

    fn determine_first_move(&mut self) -> Result<Transition, SessionError> {
        let (disclosure, guess) = match self.commit_round(FIRST_MOVE_CONTEXT, 2, Prompt::GuessFirstMove)? {
            Answer::Value(round) => round,
            Answer::Stop(end) => return Ok(Transition::End(end)),
        };

        let mover = if guess == disclosure.value {
            Party::Human
        } else {
            Party::Computer
        };
        debug!(session = %self.id, ?mover, "first move decided");

        self.first_mover = Some(mover);
        self.presenter.notify(&SessionEvent::FirstMove { mover, guess })?;
        Ok(Transition::Next(SessionPhase::SelectDice))
    }

    fn select_dice(&mut self) -> Result<Transition, SessionError> {
        let mover = self
            .first_mover
            .ok_or(SessionError::InvalidState(SessionPhase::SelectDice))?;
        let mut pool = DicePool::new(self.dice.len());

        let order = match mover {
            Party::Human => [Party::Human, Party::Computer],
            Party::Computer => [Party::Computer, Party::Human],
        };

        for (turn, party) in order.into_iter().enumerate() {
            let index = match party {
                Party::Computer => self.computer_pick(&mut pool)?,
                Party::Human => match self.human_pick(&mut pool, turn == 0)? {
                    Answer::Value(index) => index,
                    Answer::Stop(end) => return Ok(Transition::End(end)),
                },
            };

            match party {
                Party::Computer => self.computer_die = Some(index),
                Party::Human => self.human_die = Some(index),
            }
            self.presenter.notify(&SessionEvent::DieChosen {
                party,
                index,
                die: self.dice[index].clone(),
            })?;
        }

        Ok(Transition::Next(SessionPhase::ThrowComputer))
    }

    fn computer_pick(&mut self, pool: &mut DicePool) -> Result<usize, SessionError> {
        // Observed directly by the human, so no commitment is needed
        let position = secure_random_in_range(&mut self.rng, pool.len() as u32)? as usize;
        pool.take(position)
            .ok_or(SessionError::InvalidState(SessionPhase::SelectDice))
    }

    fn human_pick(&mut self, pool: &mut DicePool, first: bool) -> Result<Answer<usize>, SessionError> {
        let prompt = Prompt::ChooseDie {
            options: pool.options(&self.dice),
            first,
        };

        match self.ask_number(&prompt, pool.len() as u32)? {
            Answer::Value(position) => pool
                .take(position as usize)
                .map(Answer::Value)
                .ok_or(SessionError::InvalidState(SessionPhase::SelectDice)),
            Answer::Stop(end) => Ok(Answer::Stop(end)),
        }
    }

    fn throw(&mut self, party: Party) -> Result<Transition, SessionError> {
        let (context, die_index, next) = match party {
            Party::Computer => (COMPUTER_THROW_CONTEXT, self.computer_die, SessionPhase::ThrowHuman),
            Party::Human => (USER_THROW_CONTEXT, self.human_die, SessionPhase::Resolve),
        };
        let die_index = die_index.ok_or(SessionError::InvalidState(self.phase))?;
        let range = u32::try_from(self.dice[die_index].face_count())
            .map_err(|_| SessionError::TooManyFaces(self.dice[die_index].face_count()))?;

        let prompt = Prompt::ThrowContribution { context, range };
        let (disclosure, contribution) = match self.commit_round(context, range, prompt)? {
            Answer::Value(round) => round,
            Answer::Stop(end) => return Ok(Transition::End(end)),
        };

        let index = combine(disclosure.value, contribution, range)?;
        let face = self.dice[die_index]
            .face(index as usize)
            .ok_or(SessionError::InvalidState(self.phase))?;

        match party {
            Party::Computer => self.computer_face = Some(face),
            Party::Human => self.human_face = Some(face),
        }
        self.presenter.notify(&SessionEvent::ThrowResolved {
            party,
            committed: disclosure.value,
            contribution,
            index,
            range,
            face,
        })?;

        Ok(Transition::Next(next))
    }

    fn resolve(&mut self) -> Result<Transition, SessionError> {
        let (computer_face, human_face) = self
            .computer_face
            .zip(self.human_face)
            .ok_or(SessionError::InvalidState(SessionPhase::Resolve))?;

        let result = GameResult::resolve(computer_face, human_face);
        info!(session = %self.id, computer_face, human_face, winner = ?result.winner, "game resolved");

        self.result = Some(result);
        self.presenter.notify(&SessionEvent::GameOver(result))?;
        Ok(Transition::Next(SessionPhase::Verify))
    }

    fn verify(&mut self) -> Result<Transition, SessionError> {
        if self.ledger.is_empty() {
            return Ok(Transition::Next(SessionPhase::Done));
        }

        let records = self
            .ledger
            .list_records()
            .into_iter()
            .map(|(i, ctx)| (i, ctx.to_string()))
            .collect();
        self.presenter.notify(&SessionEvent::Ledger { records })?;

        loop {
            let Some(selector) = self.ask_raw(&Prompt::VerifySelection)? else {
                break;
            };
            let selector = selector.trim().to_string();

            let Some(record) = self.ledger.resolve(&selector) else {
                self.presenter.notify(&SessionEvent::Verification {
                    selector,
                    digest: None,
                    outcome: VerificationOutcome::NotFound,
                })?;
                continue;
            };
            let context = record.context.clone();
            let digest = record.digest_hex();

            let Some(key) = self.ask_raw(&Prompt::DisclosedKey { context: context.clone() })? else {
                break;
            };
            let Some(value) = self.ask_raw(&Prompt::DisclosedValue { context: context.clone() })? else {
                break;
            };

            let value = match Reply::parse(&value) {
                Ok(Reply::Number(v)) => match u32::try_from(v) {
                    Ok(v) => v,
                    Err(_) => {
                        self.report_invalid(InputError::OutOfRange { value: v, range: u32::MAX })?;
                        continue;
                    }
                },
                _ => {
                    self.report_invalid(InputError::NotANumber(value.trim().to_string()))?;
                    continue;
                }
            };

            let outcome = self.ledger.verify(&context, &key, value);
            debug!(session = %self.id, %context, ?outcome, "verification query");
            self.presenter.notify(&SessionEvent::Verification {
                selector,
                digest: Some(digest),
                outcome,
            })?;
        }

        Ok(Transition::Next(SessionPhase::Done))
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    /// Commit, collect the human's number, disclose and record.
    fn commit_round(
        &mut self,
        context: &'static str,
        range: u32,
        prompt: Prompt,
    ) -> Result<Answer<(Disclosure, u32)>, SessionError> {
        let commitment = commit(&mut self.rng, range)?;
        let digest = commitment.digest_hex();
        debug!(session = %self.id, context, range, %digest, "commitment published");

        self.presenter.notify(&SessionEvent::CommitmentPublished {
            context,
            range,
            digest,
        })?;

        let answer = match self.ask_number(&prompt, range)? {
            Answer::Value(answer) => answer,
            // The undisclosed commitment is dropped here
            Answer::Stop(end) => return Ok(Answer::Stop(end)),
        };

        let disclosure = commitment.disclose();
        self.ledger.record_disclosure(context, &disclosure)?;
        self.presenter.notify(&SessionEvent::Disclosed {
            context,
            value: disclosure.value,
            key: disclosure.key_hex(),
        })?;

        Ok(Answer::Value((disclosure, answer)))
    }

    /// Ask until a number in `[0, range)` arrives, the human exits, or the
    /// strict policy rejects an answer. `?` shows help and asks again.
    fn ask_number(&mut self, prompt: &Prompt, range: u32) -> Result<Answer<u32>, SessionError> {
        loop {
            let line = match self.presenter.ask(prompt) {
                Ok(line) => line,
                Err(PresenterError::Closed) => return self.abort(),
                Err(err) => return Err(err.into()),
            };

            let error = match Reply::parse(&line) {
                Ok(Reply::Exit) => return self.abort(),
                Ok(Reply::Help) => {
                    self.show_help()?;
                    continue;
                }
                Ok(Reply::Number(value)) if value < u64::from(range) => {
                    return Ok(Answer::Value(value as u32));
                }
                Ok(Reply::Number(value)) => InputError::OutOfRange { value, range },
                Err(err) => err,
            };

            self.report_invalid(error.clone())?;
            if self.policy == InputPolicy::Strict {
                return Ok(Answer::Stop(SessionEnd::Rejected {
                    phase: self.phase,
                    error,
                }));
            }
        }
    }

    /// Ask for free text; `None` means exit. `?` shows help and asks again.
    fn ask_raw(&mut self, prompt: &Prompt) -> Result<Option<String>, SessionError> {
        loop {
            let line = match self.presenter.ask(prompt) {
                Ok(line) => line,
                Err(PresenterError::Closed) => return Ok(None),
                Err(err) => return Err(err.into()),
            };

            match line.trim() {
                "?" => self.show_help()?,
                reply if reply.eq_ignore_ascii_case("x") => return Ok(None),
                _ => return Ok(Some(line)),
            }
        }
    }

    fn abort<T>(&mut self) -> Result<Answer<T>, SessionError> {
        info!(session = %self.id, phase = ?self.phase, "exit requested");
        self.presenter.notify(&SessionEvent::Aborted)?;
        Ok(Answer::Stop(SessionEnd::Aborted { phase: self.phase }))
    }

    fn report_invalid(&mut self, error: InputError) -> Result<(), SessionError> {
        warn!(session = %self.id, phase = ?self.phase, %error, "invalid input");
        self.presenter.notify(&SessionEvent::InvalidInput { error })?;
        Ok(())
    }

    fn show_help(&mut self) -> Result<(), SessionError> {
        let matrix = compute_matrix(&self.dice);
        self.presenter.notify(&SessionEvent::Help {
            dice: self.dice.clone(),
            matrix,
        })?;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
