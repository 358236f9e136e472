//! Terminal stand-in for the platform biometric prompt.

use std::io::{self, BufRead, IsTerminal, Write};

use docstatus_core::{BiometricAuthenticator, BiometricOutcome, BiometricPrompt};

/// Asks for a `y` on the terminal instead of a fingerprint.
pub struct TerminalConfirm {
    assume_yes: bool,
}

impl TerminalConfirm {
    /// With `assume_yes` the prompt is skipped and always succeeds.
    pub const fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl BiometricAuthenticator for TerminalConfirm {
    fn can_authenticate(&self) -> bool {
        self.assume_yes || io::stdin().is_terminal()
    }

    fn authenticate(&self, prompt: BiometricPrompt) -> BiometricOutcome {
        if self.assume_yes {
            return BiometricOutcome::Success;
        }

        eprint!("{}\n{} [y/N] ", prompt.title, prompt.subtitle);
        if let Err(e) = io::stderr().flush() {
            return BiometricOutcome::Failed {
                reason: e.to_string(),
            };
        }

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => parse_answer(&answer),
            Err(e) => BiometricOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }
}

fn parse_answer(answer: &str) -> BiometricOutcome {
    match answer.trim() {
        a if a.eq_ignore_ascii_case("y") || a.eq_ignore_ascii_case("yes") => {
            BiometricOutcome::Success
        }
        "" => BiometricOutcome::Cancelled,
        _ => BiometricOutcome::Failed {
            reason: "not confirmed".to_string(),
        },
    }
}
