//! Confirmation step before wiping the project
//!
//! This guards against accidental resets from the command line. It is not
//! an authentication boundary: the backend accepts `resetProject` from
//! anyone who can reach the endpoint.

use crate::GatewayError;

/// Proof that the reset passphrase was typed correctly.
///
/// Only [`ResetGate::confirm`] can create one.
#[derive(Debug)]
pub struct ResetToken {
    _confirmed: (),
}

/// Holds the configured passphrase
#[derive(Clone, Debug, Default)]
pub struct ResetGate {
    passphrase: Option<String>,
}

impl ResetGate {
    /// An empty passphrase disables reset
    pub fn new(passphrase: Option<String>) -> Self {
        Self {
            passphrase: passphrase.filter(|p| !p.is_empty()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.passphrase.is_some()
    }

    /// Compare `input` with the passphrase (exact match, no trimming)
    pub fn confirm(&self, input: &str) -> Result<ResetToken, GatewayError> {
        match &self.passphrase {
            None => Err(GatewayError::ResetDisabled),
            Some(expected) if expected == input => Ok(ResetToken { _confirmed: () }),
            Some(_) => {
                tracing::warn!("reset passphrase mismatch");
                Err(GatewayError::ResetDenied)
            }
        }
    }
}
