//!
//! Drop-time cleanup backstop.
//!
//! A `Finalizer` is attached to an owner held in an `Arc` and runs its
//! cleanup when the finalizer itself is dropped, unless `disarm` was called
//! first. It only keeps a `Weak` to the owner, so it never extends the
//! owner's life; if the owner is already gone there is nothing to clean.
//!
//! Cleanup is a backstop for callers that forgot to close explicitly.
//! Failures have no caller to go to and are logged, never propagated.
//!

use std::fmt;
use std::sync::{Arc, Weak};

use crate::error::Result;

type Cleanup = Box<dyn FnOnce() + Send>;

pub struct Finalizer {
    label: String,
    cleanup: Option<Cleanup>,
}

impl Finalizer {
    pub fn attach<T, F>(owner: &Arc<T>, label: impl Into<String>, cleanup: F) -> Finalizer
    where
        T: Send + Sync + 'static,
        F: FnOnce(&T) -> Result<()> + Send + 'static,
    {
        let owner: Weak<T> = Arc::downgrade(owner);
        let label = label.into();
        let log_label = label.clone();

        let run = move || {
            let Some(owner) = owner.upgrade() else {
                return;
            };
            if let Err(err) = cleanup(&owner) {
                tracing::warn!(owner = %log_label, error = %err, "finalizer cleanup failed");
            }
        };

        Finalizer {
            label,
            cleanup: Some(Box::new(run)),
        }
    }

    /// Mark the explicit release path as taken; the cleanup will not run.
    pub fn disarm(&mut self) {
        self.cleanup = None;
    }

    pub fn is_armed(&self) -> bool {
        self.cleanup.is_some()
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Drop for Finalizer {
    fn drop(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            tracing::debug!(owner = %self.label, "running finalizer");
            cleanup();
        }
    }
}

impl fmt::Debug for Finalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Finalizer")
            .field("label", &self.label)
            .field("armed", &self.is_armed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InterlinkError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Owner {
        cleanups: AtomicUsize,
    }

    #[test]
    fn test_runs_on_drop_when_armed() {
        let owner = Arc::new(Owner::default());
        let finalizer = Finalizer::attach(&owner, "owner", |o: &Owner| {
            o.cleanups.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert!(finalizer.is_armed());
        drop(finalizer);
        assert_eq!(owner.cleanups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_disarmed_does_not_run() {
        let owner = Arc::new(Owner::default());
        let mut finalizer = Finalizer::attach(&owner, "owner", |o: &Owner| {
            o.cleanups.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        finalizer.disarm();
        drop(finalizer);
        assert_eq!(owner.cleanups.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_does_not_keep_owner_alive() {
        let owner = Arc::new(Owner::default());
        let finalizer = Finalizer::attach(&owner, "owner", |_: &Owner| -> Result<()> {
            panic!("owner is gone, cleanup must not run");
        });
        assert_eq!(Arc::strong_count(&owner), 1);
        drop(owner);
        drop(finalizer);
    }

    #[test]
    fn test_cleanup_error_is_swallowed() {
        let owner = Arc::new(Owner::default());
        let finalizer = Finalizer::attach(&owner, "failing", |_: &Owner| {
            Err(InterlinkError::NotConnected {
                target: "nowhere".to_string(),
            })
        });
        assert_eq!(finalizer.label(), "failing");
        drop(finalizer);
    }
}
