//! Session-level error surface.
//!
//! Exactly one error is surfaced at a time; a new report replaces whatever
//! was showing.  The user can dismiss the banner without clearing the
//! underlying record, so logs and diagnostics still see the last failure.

use std::time::SystemTime;

// ---------------------------------------------------------------------------
// SessionError
// ---------------------------------------------------------------------------

/// One user-facing error with the time it was reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionError {
    pub message: String,
    pub timestamp: SystemTime,
}

impl SessionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timestamp: SystemTime::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionErrorChannel
// ---------------------------------------------------------------------------

/// Holds the most recent session error and whether it is visible.
#[derive(Debug, Default)]
pub struct SessionErrorChannel {
    current: Option<SessionError>,
    dismissed: bool,
}

impl SessionErrorChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Surface a new error, replacing any previous one and re-showing the
    /// banner even if the previous error had been dismissed.
    pub fn report(&mut self, message: impl Into<String>) {
        let error = SessionError::new(message);
        log::error!("session: {}", error.message);
        self.current = Some(error);
        self.dismissed = false;
    }

    /// Hide the banner.  The error record itself is kept.
    pub fn dismiss(&mut self) {
        self.dismissed = true;
    }

    /// Drop the error record entirely (session reset).
    pub fn clear(&mut self) {
        self.current = None;
        self.dismissed = false;
    }

    /// The error to display, `None` when there is nothing or it was
    /// dismissed.
    pub fn visible(&self) -> Option<&SessionError> {
        if self.dismissed {
            None
        } else {
            self.current.as_ref()
        }
    }

    /// The most recent error regardless of visibility.
    pub fn last(&self) -> Option<&SessionError> {
        self.current.as_ref()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
