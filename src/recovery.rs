//! Interactive recovery of a secret from shares typed or pasted by an operator
//!
//! A [`RecoverySession`] is fed one line at a time. After every accepted line
//! it retries reconstruction; a share that cannot take part is dropped again
//! (only that share) and recorded as an advisory. Collection ends when the
//! reconstructed bytes pass the caller's acceptance check, or when the input
//! runs out.
//!
//! ```text
//!            +-------------------- feed ---------------------+
//!            v                                               |
//!       Collecting --feed(bad share)--> Rejected(line) ------+
//!            |                                               |
//!            +--feed(share completes secret)--> Recovered    |
//!            |                                               |
//!            +------------------ close ---------------> Exhausted
//! ```

use std::io;

use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::error::{MonumentError, RecoveryOutcome, Result, ShareRejection};
use crate::sharing::{self, Reconstruction};

/// Where a recovery session stands
#[derive(Debug)]
pub enum SessionState {
    /// Waiting for more shares
    Collecting,
    /// The last line was dropped for `reason`
    Rejected {
        line: Zeroizing<String>,
        reason: ShareRejection,
    },
    /// The secret was rebuilt and accepted
    Recovered(Zeroizing<Vec<u8>>),
    /// Input ended before the secret could be rebuilt
    Exhausted,
}

/// Transient state of one recovery attempt
pub struct RecoverySession<F> {
    candidates: Vec<Zeroizing<String>>,
    rejections: Vec<ShareRejection>,
    state: SessionState,
    accept: F,
    unrecognised: bool,
}

impl<F: Fn(&[u8]) -> bool> RecoverySession<F> {
    /// Starts an empty session
    ///
    /// `accept` decides whether reconstructed bytes are the real secret.
    /// Bytes it refuses are treated as "not enough shares yet".
    pub fn new(accept: F) -> Self {
        Self {
            candidates: Vec::new(),
            rejections: Vec::new(),
            state: SessionState::Collecting,
            accept,
            unrecognised: false,
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Shares currently held as candidates
    #[must_use]
    pub fn collected(&self) -> usize {
        self.candidates.len()
    }

    /// Every advisory rejection so far, oldest first
    #[must_use]
    pub fn rejections(&self) -> &[ShareRejection] {
        &self.rejections
    }

    /// Whether enough shares were held to rebuild something the acceptance
    /// check refused
    ///
    /// Usually means a share from another split with the same threshold and
    /// length is among the candidates.
    #[must_use]
    pub fn unrecognised_secret(&self) -> bool {
        self.unrecognised
    }

    /// Whether the session still takes input
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(
            self.state,
            SessionState::Recovered(_) | SessionState::Exhausted
        )
    }

    /// Offers one line of operator input
    ///
    /// Blank lines and `#` comments are skipped without changing state.
    pub fn feed(&mut self, line: &str) -> &SessionState {
        let line = line.trim();
        if self.is_finished() || line.is_empty() || line.starts_with('#') {
            return &self.state;
        }

        self.candidates.push(Zeroizing::new(line.to_string()));
        let candidates: Vec<&str> = self.candidates.iter().map(|c| c.as_str()).collect();

        self.state = match sharing::try_reconstruct(&candidates) {
            Reconstruction::Success(secret) if (self.accept)(secret.as_slice()) => {
                info!("secret recovered from {} shares", self.candidates.len());
                SessionState::Recovered(secret)
            }
            Reconstruction::Success(_) => {
                if !self.unrecognised {
                    warn!(
                        "{} shares rebuild something that is not the expected secret, \
                         one of them may belong to another monument",
                        self.candidates.len()
                    );
                    self.unrecognised = true;
                }
                debug!("reconstructed bytes are not the expected secret yet");
                SessionState::Collecting
            }
            Reconstruction::Insufficient {
                collected,
                required,
            } => {
                match required {
                    Some(required) => debug!("{collected} of {} shares collected", *required),
                    None => debug!("no shares collected"),
                }
                SessionState::Collecting
            }
            Reconstruction::InvalidShare { position, reason } => {
                warn!("share rejected: {reason}");
                let line = self.candidates.remove(position);
                self.rejections.push(reason.clone());
                SessionState::Rejected { line, reason }
            }
        };

        &self.state
    }

    /// Marks the end of input
    pub fn close(&mut self) {
        if !matches!(self.state, SessionState::Recovered(_)) {
            self.state = SessionState::Exhausted;
        }
    }

    /// Verdict of the session so far
    #[must_use]
    pub fn outcome(&self) -> RecoveryOutcome {
        match self.state {
            SessionState::Recovered(_) => RecoveryOutcome::Success,
            SessionState::Rejected { .. } => RecoveryOutcome::InvalidShare,
            SessionState::Collecting | SessionState::Exhausted => RecoveryOutcome::Insufficient,
        }
    }

    /// Consumes the session, yielding the secret if it was recovered
    ///
    /// # Errors
    /// Returns [`MonumentError::Recovery`] with [`RecoveryOutcome::Insufficient`]
    /// unless the session reached [`SessionState::Recovered`]
    pub fn into_secret(self) -> Result<Zeroizing<Vec<u8>>> {
        match self.state {
            SessionState::Recovered(secret) => Ok(secret),
            _ => Err(MonumentError::Recovery(RecoveryOutcome::Insufficient)),
        }
    }
}

/// Drives `session` from `lines` until it recovers the secret or input ends
///
/// `on_event` sees the state after every non-skipped line, so a front end can
/// tell the operator about rejected shares.
///
/// # Errors
/// Returns an error if reading input fails or input ends before recovery
pub fn run<F, I, E>(
    mut session: RecoverySession<F>,
    lines: I,
    mut on_event: E,
) -> Result<Zeroizing<Vec<u8>>>
where
    F: Fn(&[u8]) -> bool,
    I: IntoIterator<Item = io::Result<String>>,
    E: FnMut(&SessionState),
{
    for line in lines {
        let line = Zeroizing::new(line.map_err(MonumentError::io("reading shares"))?);
        let seen = session.collected() + session.rejections().len();
        session.feed(&line);

        if session.collected() + session.rejections().len() != seen {
            on_event(session.state());
        }
        if session.is_finished() {
            break;
        }
    }

    session.close();
    session.into_secret()
}
