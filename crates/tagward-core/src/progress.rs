//! Progress reporting seam for long-running metadata reads.
//!
//! The loader calls into a sink; binaries decide what a tick looks like.
//! `Sync` is required because ticks arrive from concurrent read workers.

/// Receives one tick per completed tag read, then a final `finish`.
pub trait ProgressSink: Sync {
    fn increment(&self);
    fn finish(&self);
}

/// Sink that ignores all progress, for tests and quiet commands.
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn increment(&self) {}
    fn finish(&self) {}
}
