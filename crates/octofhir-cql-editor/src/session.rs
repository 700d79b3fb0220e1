//! Debounced validation of an editor buffer
//!
//! Every buffer change re-arms a debounce timer. When the timer fires a
//! validation cycle runs and its result replaces the published view, unless
//! the buffer changed or another cycle started in the meantime: each cycle
//! carries a generation number and only the newest generation may publish.

use crate::aggregator::ErrorAggregator;
use crate::annotations::EditorView;
use log::debug;
use octofhir_cql_editor_diagnostics::{EditorError, NormalizedError};
use octofhir_cql_editor_parser::{ParseResult, parse};
use octofhir_cql_editor_services::SessionContext;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// The published result of one validation cycle
#[derive(Debug, Clone, Default)]
pub struct ValidationSnapshot {
    /// Generation of the cycle that produced this snapshot
    pub generation: u64,
    pub parse_result: Arc<ParseResult>,
    /// `None` when the buffer was blank
    pub outcome: Option<Vec<NormalizedError>>,
    pub view: EditorView,
    /// Set when the cycle failed as a whole
    pub error: Option<EditorError>,
}

impl ValidationSnapshot {
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

struct Shared {
    aggregator: ErrorAggregator,
    context: Mutex<SessionContext>,
    text: Mutex<String>,
    generation: AtomicU64,
    published: Mutex<ValidationSnapshot>,
    notify: watch::Sender<u64>,
}

impl Shared {
    /// Run one cycle; `None` when a newer generation superseded it
    async fn run_cycle(&self) -> Option<ValidationSnapshot> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let text = self.text.lock().clone();
        let context = self.context.lock().clone();
        let parse_result = Arc::new(parse(&text));

        let result = self
            .aggregator
            .aggregate(&text, &parse_result, &context)
            .await;

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("discarding validation cycle {generation}: superseded");
            return None;
        }

        let snapshot = match result {
            Ok(outcome) => ValidationSnapshot {
                generation,
                view: EditorView::from_outcome(outcome.as_deref()),
                parse_result,
                outcome,
                error: None,
            },
            Err(err) => {
                debug!("validation cycle {generation} failed: {err}");
                ValidationSnapshot {
                    generation,
                    parse_result,
                    outcome: None,
                    view: EditorView::default(),
                    error: Some(err),
                }
            }
        };
        *self.published.lock() = snapshot.clone();
        self.notify.send_replace(generation);
        Some(snapshot)
    }
}

/// Validation state of one editor pane.
///
/// Must be used inside a tokio runtime. Dropping the session cancels a
/// pending debounce timer.
pub struct EditorSession {
    shared: Arc<Shared>,
    debounce: Duration,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl EditorSession {
    pub fn new(aggregator: ErrorAggregator, context: SessionContext, debounce: Duration) -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                aggregator,
                context: Mutex::new(context),
                text: Mutex::new(String::new()),
                generation: AtomicU64::new(0),
                published: Mutex::new(ValidationSnapshot::default()),
                notify,
            }),
            debounce,
            timer: Mutex::new(None),
        }
    }

    /// Replace the buffer text and restart the debounce timer
    pub fn on_change(&self, text: impl Into<String>) {
        *self.shared.text.lock() = text.into();
        // Results of cycles for the previous text must not be published.
        self.shared.generation.fetch_add(1, Ordering::SeqCst);

        let shared = Arc::clone(&self.shared);
        let debounce = self.debounce;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            shared.run_cycle().await;
        });
        if let Some(previous) = self.timer.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Cancel any pending timer and validate the current text immediately
    pub async fn validate_now(&self) -> Option<ValidationSnapshot> {
        self.cancel_pending();
        self.shared.run_cycle().await
    }

    /// Cancel the pending debounce timer, if any
    pub fn cancel_pending(&self) {
        if let Some(handle) = self.timer.lock().take() {
            handle.abort();
        }
    }

    /// Replace the session context used by the next cycle
    pub fn set_context(&self, context: SessionContext) {
        *self.shared.context.lock() = context;
    }

    pub fn text(&self) -> String {
        self.shared.text.lock().clone()
    }

    /// The latest published snapshot
    pub fn snapshot(&self) -> ValidationSnapshot {
        self.shared.published.lock().clone()
    }

    /// The latest published view
    pub fn view(&self) -> EditorView {
        self.shared.published.lock().view.clone()
    }

    /// Receiver notified with the generation of every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.notify.subscribe()
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("debounce", &self.debounce)
            .field("generation", &self.shared.generation.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
