//! Shopper-facing notices for failed cart operations.
//!
//! The store never notifies on its own. The UI passes each operation result
//! to [`report`], which emits exactly one [`Notice`] for a failure and
//! nothing for a commit or an ignored request.

use std::sync::{Mutex, PoisonError};

use crate::error::{CartError, CartOperation};

/// A human-readable failure message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub operation: CartOperation,
    pub message: &'static str,
    /// Underlying error, for logs. Not meant for shoppers.
    pub detail: String,
}

impl Notice {
    #[must_use]
    pub fn from_error(operation: CartOperation, error: &CartError) -> Self {
        Self {
            operation,
            message: error.user_message(operation),
            detail: error.to_string(),
        }
    }
}

/// Channel that delivers notices to the shopper.
pub trait Notifier {
    fn notify(&self, notice: Notice);
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(&self, notice: Notice) {
        (**self).notify(notice);
    }
}

/// Emit a notice if `result` is a failure.
///
/// Returns `true` when a notice was sent.
pub fn report<T, N: Notifier + ?Sized>(
    operation: CartOperation,
    result: &Result<T, CartError>,
    notifier: &N,
) -> bool {
    match result {
        Ok(_) => false,
        Err(error) => {
            notifier.notify(Notice::from_error(operation, error));
            true
        }
    }
}

/// Logs notices at WARN level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        tracing::warn!(
            operation = %notice.operation,
            detail = %notice.detail,
            "{}",
            notice.message
        );
    }
}

/// Collects notices so a UI can render them later.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices received so far.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return all pending notices.
    pub fn drain(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}
