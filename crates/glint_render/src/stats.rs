//! Render progress tracking.
//!
//! Workers update shared atomic counters as they claim and finish
//! chunks; observers take consistent-enough snapshots without blocking
//! the render. The time estimate extrapolates from the completed
//! fraction of the chunk list.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Shared counters for the pass in flight. Reset at the start of every
/// pass.
#[derive(Debug, Default)]
pub struct RenderStats {
    total_chunks: AtomicUsize,
    claimed_chunks: AtomicUsize,
    completed_chunks: AtomicUsize,
    /// Pixels whose color came back non-finite and was replaced
    clamped_pixels: AtomicUsize,
    started_at: Mutex<Option<Instant>>,
}

/// A point-in-time view of render progress.
#[derive(Clone, Copy, Debug)]
pub struct RenderProgress {
    /// Highest chunk index handed out so far
    pub claimed_chunks: usize,
    pub completed_chunks: usize,
    pub total_chunks: usize,
    pub clamped_pixels: usize,
    /// Completed fraction in [0, 1]
    pub fraction: f32,
    pub elapsed: Duration,
    /// Extrapolated time to finish; `None` until at least one chunk has
    /// completed
    pub estimated_remaining: Option<Duration>,
}

impl RenderStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset counters and start the pass clock.
    pub fn begin_pass(&self, total_chunks: usize) {
        self.total_chunks.store(total_chunks, Ordering::Relaxed);
        self.claimed_chunks.store(0, Ordering::Relaxed);
        self.completed_chunks.store(0, Ordering::Relaxed);
        self.clamped_pixels.store(0, Ordering::Relaxed);
        if let Ok(mut started) = self.started_at.lock() {
            *started = Some(Instant::now());
        }
    }

    pub fn note_claimed(&self, index: usize) {
        self.claimed_chunks.fetch_max(index + 1, Ordering::Relaxed);
    }

    pub fn note_completed(&self) {
        self.completed_chunks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn note_clamped_pixel(&self) {
        self.clamped_pixels.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the counters. Safe to call from any thread while a pass
    /// is running.
    pub fn snapshot(&self) -> RenderProgress {
        let total = self.total_chunks.load(Ordering::Relaxed);
        let completed = self.completed_chunks.load(Ordering::Relaxed);
        let claimed = self.claimed_chunks.load(Ordering::Relaxed);
        let clamped = self.clamped_pixels.load(Ordering::Relaxed);

        let elapsed = self
            .started_at
            .lock()
            .ok()
            .and_then(|s| *s)
            .map(|start| start.elapsed())
            .unwrap_or_default();

        let fraction = if total > 0 {
            (completed as f32 / total as f32).min(1.0)
        } else {
            0.0
        };

        let estimated_remaining = if completed > 0 && completed < total {
            let per_chunk = elapsed.as_secs_f64() / completed as f64;
            Some(Duration::from_secs_f64(per_chunk * (total - completed) as f64))
        } else if completed >= total && total > 0 {
            Some(Duration::ZERO)
        } else {
            None
        };

        RenderProgress {
            claimed_chunks: claimed,
            completed_chunks: completed,
            total_chunks: total,
            clamped_pixels: clamped,
            fraction,
            elapsed,
            estimated_remaining,
        }
    }
}
