//! Biometric re-authentication for sensitive views.
//!
//! The prompt itself belongs to the platform. The SDK only decides what to
//! ask for and what the answer means; a failure never touches the session or
//! the history.

use crate::error::DocStatusError;

/// Text shown by the platform prompt.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct BiometricPrompt {
    /// Prompt title.
    pub title: String,
    /// Line under the title.
    pub subtitle: String,
    /// Label of the button that cancels the prompt.
    pub negative_button: String,
}

impl BiometricPrompt {
    /// Prompt guarding the verification history.
    #[must_use]
    pub fn history() -> Self {
        Self {
            title: "Confirm your identity".to_string(),
            subtitle: "Use your fingerprint or face to access the history".to_string(),
            negative_button: "Cancel".to_string(),
        }
    }
}

/// Result of showing the prompt.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum BiometricOutcome {
    /// The user authenticated.
    Success,
    /// Authentication failed or errored.
    Failed {
        /// Platform error text.
        reason: String,
    },
    /// The user dismissed the prompt.
    Cancelled,
}

/// Platform biometric prompt, implemented by the host app.
#[uniffi::export(with_foreign)]
pub trait BiometricAuthenticator: Send + Sync {
    /// Whether strong biometrics are enrolled and usable.
    fn can_authenticate(&self) -> bool;

    /// Shows `prompt` and reports the outcome once the user is done.
    fn authenticate(&self, prompt: BiometricPrompt) -> BiometricOutcome;
}

/// Runs the prompt and turns anything but success into an error.
///
/// # Errors
/// [`DocStatusError::BiometricUnavailable`] when the device cannot prompt,
/// [`DocStatusError::BiometricFailed`] when the user did not authenticate.
pub fn require_biometrics(
    authenticator: &dyn BiometricAuthenticator,
    prompt: BiometricPrompt,
) -> Result<(), DocStatusError> {
    if !authenticator.can_authenticate() {
        log::info!("biometrics unavailable, guarded view stays closed");
        return Err(DocStatusError::BiometricUnavailable);
    }

    match authenticator.authenticate(prompt) {
        BiometricOutcome::Success => Ok(()),
        BiometricOutcome::Failed { reason } => {
            log::info!("biometric authentication failed: {reason}");
            Err(DocStatusError::BiometricFailed { reason })
        }
        BiometricOutcome::Cancelled => Err(DocStatusError::BiometricFailed {
            reason: "cancelled".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        available: bool,
        outcome: BiometricOutcome,
    }

    impl BiometricAuthenticator for Fixed {
        fn can_authenticate(&self) -> bool {
            self.available
        }

        fn authenticate(&self, prompt: BiometricPrompt) -> BiometricOutcome {
            assert_eq!(prompt, BiometricPrompt::history());
            self.outcome.clone()
        }
    }

    #[test]
    fn test_unavailable_never_prompts() {
        let auth = Fixed {
            available: false,
            outcome: BiometricOutcome::Success,
        };
        assert!(matches!(
            require_biometrics(&auth, BiometricPrompt::history()),
            Err(DocStatusError::BiometricUnavailable)
        ));
    }

    #[test]
    fn test_outcomes() {
        let ok = Fixed {
            available: true,
            outcome: BiometricOutcome::Success,
        };
        assert!(require_biometrics(&ok, BiometricPrompt::history()).is_ok());

        let failed = Fixed {
            available: true,
            outcome: BiometricOutcome::Failed {
                reason: "too many attempts".to_string(),
            },
        };
        assert!(matches!(
            require_biometrics(&failed, BiometricPrompt::history()),
            Err(DocStatusError::BiometricFailed { reason }) if reason == "too many attempts"
        ));

        let cancelled = Fixed {
            available: true,
            outcome: BiometricOutcome::Cancelled,
        };
        assert!(require_biometrics(&cancelled, BiometricPrompt::history()).is_err());
    }
}
