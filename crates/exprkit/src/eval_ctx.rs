use crate::error::EvalError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cancellation context passed to every evaluation.
///
/// Clones share the same cancellation flag. Evaluators call [`EvalCtx::check`]
/// before doing work and before every sub-evaluation, so a cancelled or
/// expired context stops evaluation at the next step.
#[derive(Debug, Clone, Default)]
pub struct EvalCtx {
    cancelled: Option<Arc<AtomicBool>>,
    deadline: Option<Instant>,
}

/// Cancels every [`EvalCtx`] created alongside it.
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl EvalCtx {
    /// A context that is never cancelled.
    pub fn background() -> Self {
        EvalCtx::default()
    }

    pub fn with_cancel() -> (Self, CancelHandle) {
        let flag = Arc::new(AtomicBool::new(false));
        let ctx = EvalCtx {
            cancelled: Some(Arc::clone(&flag)),
            deadline: None,
        };
        (ctx, CancelHandle(flag))
    }

    /// Keeps the earlier of the existing and the given deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn check(&self) -> Result<(), EvalError> {
        if let Some(flag) = &self.cancelled {
            if flag.load(Ordering::Acquire) {
                return Err(EvalError::Cancelled);
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(EvalError::DeadlineExceeded);
            }
        }
        Ok(())
    }
}
