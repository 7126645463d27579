//! Yes/no gate in front of destructive operations.

use std::cell::RefCell;
use std::io::{BufRead, Write};

pub trait ConfirmationGate {
    fn confirm(&self, question: &str) -> bool;
}

/// Answers every question the same way (`--yes`, or scripted tests).
pub struct Preapproved(pub bool);

impl ConfirmationGate for Preapproved {
    fn confirm(&self, _question: &str) -> bool {
        self.0
    }
}

/// Asks on `output` and reads one answer line from `input`.
pub struct PromptConfirmation<'a, R, W> {
    input: RefCell<&'a mut R>,
    output: RefCell<&'a mut W>,
}

impl<'a, R: BufRead, W: Write> PromptConfirmation<'a, R, W> {
    pub fn new(input: &'a mut R, output: &'a mut W) -> Self {
        Self {
            input: RefCell::new(input),
            output: RefCell::new(output),
        }
    }
}

impl<R: BufRead, W: Write> ConfirmationGate for PromptConfirmation<'_, R, W> {
    fn confirm(&self, question: &str) -> bool {
        {
            let mut output = self.output.borrow_mut();
            if write!(output, "{} [y/N] ", question)
                .and_then(|_| output.flush())
                .is_err()
            {
                return false;
            }
        }

        let mut answer = String::new();
        match self.input.borrow_mut().read_line(&mut answer) {
            Ok(_) => is_yes(&answer),
            Err(e) => {
                tracing::warn!("Failed to read confirmation: {}", e);
                false
            }
        }
    }
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
