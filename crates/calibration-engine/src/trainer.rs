//! Off-path background refitting with atomic coefficient publication.
//!
//! The least-squares solve is the one CPU-heavy operation in the
//! pipeline, so it runs on a blocking task while per-frame prediction
//! keeps serving the last published snapshot. Publication swaps a whole
//! `Arc<ModelCoefficients>` under a write lock, so readers never observe
//! a mismatched X/Y coefficient pair. Each refit request takes a ticket;
//! a fit only publishes while its ticket is still the newest, so a
//! superseded fit is simply dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tokio::task::JoinHandle;

use gazekit_gaze_model::CalibrationSample;

use crate::regression::{fit_ols, ModelCoefficients};

/// The published coefficient snapshot shared between the model, the
/// trainer, and predictors.
#[derive(Debug, Default)]
pub struct CoefficientSlot {
    coefficients: RwLock<Option<Arc<ModelCoefficients>>>,
    /// Bumped on every store or clear; predictors use it to notice
    /// refits and invalidate their caches.
    generation: AtomicU64,
    /// The newest refit ticket handed out.
    scheduled: AtomicU64,
}

impl CoefficientSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently published snapshot, if any fit has succeeded.
    pub fn load(&self) -> Option<Arc<ModelCoefficients>> {
        self.coefficients
            .read()
            .expect("coefficient slot lock poisoned")
            .clone()
    }

    /// Monotonic counter of publications and clears.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Hand out the next refit ticket, superseding all earlier ones.
    pub fn next_ticket(&self) -> u64 {
        self.scheduled.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Publish a snapshot if `ticket` is still the newest one issued.
    ///
    /// The check happens under the write lock, so a stale fit can never
    /// overwrite a newer one. Returns whether the snapshot was stored.
    pub fn publish_ticketed(&self, coefficients: ModelCoefficients, ticket: u64) -> bool {
        let mut guard = self
            .coefficients
            .write()
            .expect("coefficient slot lock poisoned");
        if self.scheduled.load(Ordering::SeqCst) != ticket {
            return false;
        }
        *guard = Some(Arc::new(coefficients));
        self.generation.fetch_add(1, Ordering::Release);
        true
    }

    /// Drop the published snapshot (session reset).
    pub fn clear(&self) {
        let mut guard = self
            .coefficients
            .write()
            .expect("coefficient slot lock poisoned");
        *guard = None;
        self.generation.fetch_add(1, Ordering::Release);
    }
}

/// Schedules least-squares refits off the per-frame critical path.
pub struct BackgroundTrainer {
    slot: Arc<CoefficientSlot>,
    handle: Option<JoinHandle<()>>,
}

impl BackgroundTrainer {
    /// Create a trainer publishing into the given slot.
    pub fn new(slot: Arc<CoefficientSlot>) -> Self {
        Self { slot, handle: None }
    }

    /// Request a refit over a snapshot of the training rows.
    ///
    /// Returns immediately; the fit runs on a blocking task. A request
    /// issued while an earlier fit is still running supersedes it — the
    /// earlier result is dropped at publication time. Skip conditions
    /// (insufficient or degenerate data) leave the published snapshot
    /// untouched.
    pub fn request_refit(&mut self, rows: Vec<CalibrationSample>) {
        let ticket = self.slot.next_ticket();
        let slot = Arc::clone(&self.slot);

        self.handle = Some(tokio::task::spawn_blocking(move || {
            match fit_ols(&rows) {
                Ok(coefficients) => {
                    if slot.publish_ticketed(coefficients, ticket) {
                        tracing::debug!(rows = rows.len(), ticket, "Background refit published");
                    } else {
                        tracing::debug!(ticket, "Background refit superseded, dropped");
                    }
                }
                Err(skip) => {
                    tracing::debug!(reason = %skip, "Background refit skipped");
                }
            }
        }));
    }

    /// Whether no fit is currently in flight.
    pub fn is_idle(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Wait for the in-flight fit, if any, to finish.
    ///
    /// Only needed by tests and shutdown paths; steady-state consumers
    /// read stale snapshots without waiting.
    pub async fn wait_idle(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.await.ok();
        }
    }
}
