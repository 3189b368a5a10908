//! Terminal Presenter
//!
//! Line-based [`Presenter`] over any `BufRead`/`Write` pair. Renders the
//! session's events as text and returns raw answer lines; every decision
//! stays in the session.

pub mod table;

use std::io::{self, BufRead, Write};

use crate::game::session::{
    Party, Presenter, PresenterError, Prompt, SessionEvent, COMPUTER_THROW_CONTEXT, FIRST_MOVE_CONTEXT,
    USER_THROW_CONTEXT,
};
use crate::proof::ledger::VerificationOutcome;

const MENU_FOOTER: &str = "X - exit\n? - help\n";

/// Presenter that reads answers from `input` and writes text to `output`.
pub struct TerminalPresenter<I, O> {
    input: I,
    output: O,
}

impl TerminalPresenter<io::StdinLock<'static>, io::Stdout> {
    /// Presenter bound to the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<I: BufRead, O: Write> TerminalPresenter<I, O> {
    /// Create a presenter over arbitrary streams.
    pub fn new(input: I, output: O) -> Self {
        Self { input, output }
    }

    /// Give back the output stream.
    pub fn into_output(self) -> O {
        self.output
    }
}

impl<I: BufRead, O: Write> Presenter for TerminalPresenter<I, O> {
    fn ask(&mut self, prompt: &Prompt) -> Result<String, PresenterError> {
        self.output.write_all(render_prompt(prompt).as_bytes())?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(PresenterError::Closed);
        }
        Ok(line.trim().to_string())
    }

    fn notify(&mut self, event: &SessionEvent) -> Result<(), PresenterError> {
        let text = render_event(event);
        if !text.is_empty() {
            writeln!(self.output, "{}", text)?;
        }
        Ok(())
    }
}

/// Text shown before reading an answer.
pub fn render_prompt(prompt: &Prompt) -> String {
    match prompt {
        Prompt::GuessFirstMove => {
            format!("Try to guess my selection.\n0 - 0\n1 - 1\n{}Your selection: ", MENU_FOOTER)
        }
        Prompt::ChooseDie { options, first } => {
            let mut text = String::from(if *first {
                "You make the first move. Choose your dice:\n"
            } else {
                "Choose your dice:\n"
            });
            for (pos, die) in options {
                text.push_str(&format!("{} - {}\n", pos, die));
            }
            text.push_str(MENU_FOOTER);
            text.push_str("Your selection: ");
            text
        }
        Prompt::ThrowContribution { range, .. } => {
            let mut text = format!("Add your number modulo {}.\n", range);
            for i in 0..*range {
                text.push_str(&format!("{} - {}\n", i, i));
            }
            text.push_str(MENU_FOOTER);
            text.push_str("Your selection: ");
            text
        }
        Prompt::VerifySelection => {
            "Enter a record number or context to verify, X to exit: ".to_string()
        }
        Prompt::DisclosedKey { context } => format!("Enter the disclosed key for {}: ", context),
        Prompt::DisclosedValue { context } => format!("Enter the disclosed number for {}: ", context),
    }
}

/// Text for an event; empty when there is nothing to show.
pub fn render_event(event: &SessionEvent) -> String {
    match event {
        SessionEvent::CommitmentPublished { context, range, digest } => {
            let intro = match *context {
                FIRST_MOVE_CONTEXT => "Let's determine who makes the first move.\n",
                COMPUTER_THROW_CONTEXT => "It's time for my throw.\n",
                USER_THROW_CONTEXT => "It's time for your throw.\n",
                _ => "",
            };
            format!(
                "{}I selected a random value in the range 0..{} (HMAC={}).",
                intro,
                range.saturating_sub(1),
                digest
            )
        }
        SessionEvent::Disclosed { context, value, key } => {
            if *context == FIRST_MOVE_CONTEXT {
                format!("My selection: {} (KEY={}).", value, key)
            } else {
                format!("My number is {} (KEY={}).", value, key)
            }
        }
        SessionEvent::FirstMove { mover, .. } => match mover {
            Party::Computer => "I make the first move.".to_string(),
            Party::Human => String::new(),
        },
        SessionEvent::DieChosen { party, die, .. } => match party {
            Party::Computer => format!("I choose the {} dice.", die),
            Party::Human => format!("You choose the {} dice.", die),
        },
        SessionEvent::ThrowResolved { party, committed, contribution, index, range, face } => {
            let whose = match party {
                Party::Computer => "My",
                Party::Human => "Your",
            };
            format!(
                "The result is {} + {} = {} (mod {}).\n{} throw is {}.",
                committed, contribution, index, range, whose, face
            )
        }
        SessionEvent::GameOver(result) => match result.winner {
            Some(Party::Human) => format!("You win ({} > {})!", result.human_face, result.computer_face),
            Some(Party::Computer) => format!("I win ({} > {})!", result.computer_face, result.human_face),
            None => format!("It's a tie ({} = {}).", result.human_face, result.computer_face),
        },
        SessionEvent::Help { dice, matrix } => {
            let faces = dice.first().map(|d| d.face_count()).unwrap_or(0);
            format!(
                "=== Game Help ===\n\
                 1. First move is decided by guessing my committed 0/1 value.\n\
                 2. Each throw adds your number to my committed number modulo the face count.\n\
                 3. After the game you can check every HMAC with the disclosed keys:\n   \
                 HMAC = HMAC-SHA3-256(key, number)\n\
                 \n=== Fair Random Protocol ===\n{}\n\
                 \nProbability of the win for the user:\n{}",
                table::render_protocol(faces),
                table::render_matrix(dice, matrix)
            )
        }
        SessionEvent::InvalidInput { error } => format!("Invalid selection: {}.", error),
        SessionEvent::Ledger { records } => {
            let mut text = String::from("=== Fairness Verification ===\nYou can verify any HMAC now:");
            for (index, context) in records {
                text.push_str(&format!("\n{} - Verify {}", index, context));
            }
            text
        }
        SessionEvent::Verification { selector, digest, outcome } => {
            let mut text = String::new();
            if let Some(digest) = digest {
                text.push_str(&format!("Original HMAC: {}\n", digest));
            }
            let mark = match outcome {
                VerificationOutcome::Success => "\u{2713} ",
                VerificationOutcome::Mismatch => "\u{2717} ",
                _ => "",
            };
            text.push_str(&format!("{}{}", mark, outcome));
            if *outcome == VerificationOutcome::NotFound {
                text.push_str(&format!(": {}", selector));
            }
            text
        }
        SessionEvent::Aborted => "Exiting game.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dice::Die;
    use crate::game::session::{GameResult, GameSession, SessionEnd};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Cursor;

    fn dice() -> Vec<Die> {
        ["2,2,4,4,9,9", "1,1,6,6,8,8", "3,3,5,5,7,7"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect()
    }

    #[test]
    fn test_ask_trims_and_detects_eof() {
        let mut presenter = TerminalPresenter::new(Cursor::new("  1 \n"), Vec::new());

        assert_eq!(presenter.ask(&Prompt::GuessFirstMove).unwrap(), "1");
        assert!(matches!(presenter.ask(&Prompt::GuessFirstMove), Err(PresenterError::Closed)));

        let output = String::from_utf8(presenter.into_output()).unwrap();
        assert_eq!(output.matches("Try to guess my selection.").count(), 2);
    }

    #[test]
    fn test_render_commitment_and_disclosure() {
        let commit = render_event(&SessionEvent::CommitmentPublished {
            context: FIRST_MOVE_CONTEXT,
            range: 2,
            digest: "ABCD".into(),
        });
        assert!(commit.ends_with("I selected a random value in the range 0..1 (HMAC=ABCD)."));

        let reveal = render_event(&SessionEvent::Disclosed {
            context: COMPUTER_THROW_CONTEXT,
            value: 3,
            key: "00FF".into(),
        });
        assert_eq!(reveal, "My number is 3 (KEY=00FF).");
    }

    #[test]
    fn test_render_game_over() {
        let win = render_event(&SessionEvent::GameOver(GameResult::resolve(3, 8)));
        assert_eq!(win, "You win (8 > 3)!");
        let tie = render_event(&SessionEvent::GameOver(GameResult::resolve(5, 5)));
        assert_eq!(tie, "It's a tie (5 = 5).");
    }

    #[test]
    fn test_render_verification() {
        let ok = render_event(&SessionEvent::Verification {
            selector: "1".into(),
            digest: Some("AA".into()),
            outcome: VerificationOutcome::Success,
        });
        assert_eq!(ok, "Original HMAC: AA\n\u{2713} HMAC verification SUCCESSFUL");

        let missing = render_event(&SessionEvent::Verification {
            selector: "7".into(),
            digest: None,
            outcome: VerificationOutcome::NotFound,
        });
        assert_eq!(missing, "No record found for this context: 7");
    }

    #[test]
    fn test_throw_prompt_lists_choices() {
        let text = render_prompt(&Prompt::ThrowContribution {
            context: USER_THROW_CONTEXT,
            range: 3,
        });
        assert!(text.starts_with("Add your number modulo 3.\n0 - 0\n1 - 1\n2 - 2\nX - exit"));
    }

    #[test]
    fn test_session_over_terminal() {
        let input = Cursor::new("?\n0\n0\n1\n2\n1\nDEAD\n0\nx\n");
        let presenter = TerminalPresenter::new(input, Vec::new());
        let mut session = GameSession::new(dice(), StdRng::seed_from_u64(42), presenter).unwrap();

        let end = session.run().unwrap();
        assert!(matches!(end, SessionEnd::Completed(_)));

        let first = &session.ledger().records()[0];
        let output = String::from_utf8(session.presenter().output.clone()).unwrap();

        assert!(output.contains("Probability of the win for the user:"));
        assert!(output.contains(&format!("(HMAC={}).", first.digest_hex())));
        assert!(output.contains(&format!("My selection: {} (KEY={}).", first.value, first.key_hex())));
        assert!(output.contains("1 - Verify first-move-selection"));
        assert!(output.contains("Original HMAC:"));
    }
}
