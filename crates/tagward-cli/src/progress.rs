//! Console progress for long metadata reads: a background thread watches
//! an atomic counter and repaints one status line on stderr until the
//! loader calls `finish`.

use std::io::Write as _;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use tagward_core::progress::ProgressSink;

struct Shared {
    count: AtomicUsize,
    stop: AtomicBool,
    total: usize,
}

/// Progress sink that repaints `read N/M tracks` on stderr.
pub struct ConsoleProgress {
    shared: Arc<Shared>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl ConsoleProgress {
    pub fn start(total: usize) -> Self {
        let shared = Arc::new(Shared {
            count: AtomicUsize::new(0),
            stop: AtomicBool::new(false),
            total,
        });
        let handle = if total == 0 {
            None
        } else {
            eprintln!("Reading track metadata");
            let painter = shared.clone();
            Some(thread::spawn(move || {
                while !painter.stop.load(Ordering::Relaxed) {
                    let count = painter.count.load(Ordering::Relaxed);
                    eprint!("\rread {count}/{} tracks", painter.total);
                    let _ = std::io::stderr().flush();
                    thread::sleep(Duration::from_millis(200));
                }
            }))
        };
        Self {
            shared,
            handle: Mutex::new(handle),
        }
    }
}

impl ProgressSink for ConsoleProgress {
    fn increment(&self) {
        self.shared.count.fetch_add(1, Ordering::Relaxed);
    }

    fn finish(&self) {
        self.shared.stop.store(true, Ordering::Relaxed);
        let handle = self.handle.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.join();
            let count = self.shared.count.load(Ordering::Relaxed);
            eprintln!("\rread {count}/{} tracks", self.shared.total);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_is_safe_with_zero_total() {
        let progress = ConsoleProgress::start(0);
        progress.finish();
    }

    #[test]
    fn counts_match_increments() {
        let progress = ConsoleProgress::start(3);
        progress.increment();
        progress.increment();
        progress.increment();
        progress.finish();
        assert_eq!(progress.shared.count.load(Ordering::Relaxed), 3);
    }
}
