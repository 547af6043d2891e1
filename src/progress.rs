//! Progress-callback trait for conversion phase events.
//!
//! The OCR API processes a document as one opaque request, so progress is
//! reported per *phase* rather than per page: the caller learns when the
//! upload starts, when the vendor begins recognising, and when assembly
//! runs. That is exactly the granularity a status line or spinner needs.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers
//! can forward events to a terminal spinner, a status bar, or a log —
//! without the library knowing anything about how the host application
//! communicates. The trait is `Send + Sync` so a callback can be shared
//! across tasks.

use std::sync::Arc;

/// The phase a conversion is currently in, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionPhase {
    /// Resolving the input (path check or URL download).
    Resolving,
    /// Uploading the PDF and fetching the signed URL.
    Uploading,
    /// Waiting on the vendor's OCR request.
    Processing,
    /// Image handling, cleanup, and page assembly.
    Assembling,
}

impl ConversionPhase {
    /// Short human-readable label, suitable for a status line.
    pub fn label(&self) -> &'static str {
        match self {
            ConversionPhase::Resolving => "Resolving input",
            ConversionPhase::Uploading => "Uploading PDF",
            ConversionPhase::Processing => "Running OCR",
            ConversionPhase::Assembling => "Assembling Markdown",
        }
    }
}

/// Called by the conversion pipeline as it moves through phases.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called when a new phase begins.
    fn on_phase(&self, phase: ConversionPhase) {
        let _ = phase;
    }

    /// Called once after assembly with the recognised page count.
    fn on_complete(&self, page_count: usize) {
        let _ = page_count;
    }

    /// Called when the conversion fails, with a human-readable description.
    fn on_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in
/// [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct TrackingCallback {
        phases: Mutex<Vec<ConversionPhase>>,
        completed_pages: AtomicUsize,
        errors: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_phase(&self, phase: ConversionPhase) {
            self.phases.lock().unwrap().push(phase);
        }

        fn on_complete(&self, page_count: usize) {
            self.completed_pages.store(page_count, Ordering::SeqCst);
        }

        fn on_error(&self, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_phase(ConversionPhase::Uploading);
        cb.on_complete(3);
        cb.on_error("boom");
    }

    #[test]
    fn tracking_callback_sees_phases_in_order() {
        let tracker = TrackingCallback {
            phases: Mutex::new(Vec::new()),
            completed_pages: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
        };

        tracker.on_phase(ConversionPhase::Resolving);
        tracker.on_phase(ConversionPhase::Uploading);
        tracker.on_phase(ConversionPhase::Processing);
        tracker.on_phase(ConversionPhase::Assembling);
        tracker.on_complete(12);

        assert_eq!(
            *tracker.phases.lock().unwrap(),
            vec![
                ConversionPhase::Resolving,
                ConversionPhase::Uploading,
                ConversionPhase::Processing,
                ConversionPhase::Assembling,
            ]
        );
        assert_eq!(tracker.completed_pages.load(Ordering::SeqCst), 12);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn ConversionProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_phase(ConversionPhase::Processing);
        cb.on_complete(1);
    }

    #[test]
    fn phase_labels_are_distinct() {
        let labels = [
            ConversionPhase::Resolving.label(),
            ConversionPhase::Uploading.label(),
            ConversionPhase::Processing.label(),
            ConversionPhase::Assembling.label(),
        ];
        for (i, a) in labels.iter().enumerate() {
            for b in &labels[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
