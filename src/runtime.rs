use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use completion_provider::{
    ChatMessage, CompletionProvider, CompletionRequest, CompletionResponse, ProviderFailure,
    RequestId,
};
use tracing::{debug, info, warn};

use crate::controller::CompletionHost;
use crate::error::{StartError, TransitionError};
use crate::workbench::Workbench;

/// Outcome of one provider call, queued for the owning thread.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResolution {
    pub request_id: RequestId,
    pub outcome: Result<CompletionResponse, ProviderFailure>,
}

type Waker = Box<dyn Fn() + Send + Sync>;

struct ActiveRequest {
    request_id: RequestId,
    join_handle: Option<JoinHandle<()>>,
}

/// Effect executor that runs provider calls on worker threads.
///
/// Resolutions are buffered until the owning thread drains them with
/// [`GenerationRuntime::flush_pending_events`]; only then are they applied to
/// the [`Workbench`]. At most one call is active at a time.
pub struct GenerationRuntime {
    workbench: Arc<Mutex<Workbench>>,
    provider: Arc<dyn CompletionProvider>,
    pending_events: Mutex<VecDeque<CompletionResolution>>,
    pending_signal: Condvar,
    next_request_id: AtomicU64,
    active_request: Mutex<Option<ActiveRequest>>,
    waker: Option<Waker>,
}

impl GenerationRuntime {
    pub fn new(workbench: Arc<Mutex<Workbench>>, provider: Arc<dyn CompletionProvider>) -> Arc<Self> {
        Self::build(workbench, provider, None)
    }

    /// Like [`Self::new`], but calls `waker` from the worker thread whenever a
    /// resolution is queued so an event loop can schedule a flush.
    pub fn with_waker(
        workbench: Arc<Mutex<Workbench>>,
        provider: Arc<dyn CompletionProvider>,
        waker: impl Fn() + Send + Sync + 'static,
    ) -> Arc<Self> {
        Self::build(workbench, provider, Some(Box::new(waker)))
    }

    fn build(
        workbench: Arc<Mutex<Workbench>>,
        provider: Arc<dyn CompletionProvider>,
        waker: Option<Waker>,
    ) -> Arc<Self> {
        Arc::new(Self {
            workbench,
            provider,
            pending_events: Mutex::new(VecDeque::new()),
            pending_signal: Condvar::new(),
            next_request_id: AtomicU64::new(1),
            active_request: Mutex::new(None),
            waker,
        })
    }

    pub fn workbench(&self) -> &Arc<Mutex<Workbench>> {
        &self.workbench
    }

    pub fn provider(&self) -> &Arc<dyn CompletionProvider> {
        &self.provider
    }

    /// Locks the workbench, tolerating poisoning.
    pub fn lock_workbench(&self) -> MutexGuard<'_, Workbench> {
        lock_unpoisoned(&self.workbench)
    }

    /// Sends `GENERATE` to the workbench with this runtime as the host.
    pub fn generate(self: &Arc<Self>) -> Result<(), TransitionError> {
        let mut host = Arc::clone(self);
        self.lock_workbench().generate(&mut host)
    }

    /// Sends `RETRY` to the workbench with this runtime as the host.
    pub fn retry(self: &Arc<Self>) -> Result<(), TransitionError> {
        let mut host = Arc::clone(self);
        self.lock_workbench().retry(&mut host)
    }

    /// Whether a provider call is still running or its resolution is not yet applied.
    pub fn is_busy(&self) -> bool {
        self.lock_active_request().is_some()
    }

    fn start_completion_internal(
        self: &Arc<Self>,
        messages: Vec<ChatMessage>,
    ) -> Result<RequestId, StartError> {
        let mut active_request = self.lock_active_request();
        if let Some(active) = active_request.as_ref() {
            debug!(active = active.request_id, "refusing second completion");
            return Err(StartError::AlreadyInFlight);
        }

        let request_id = self.next_request_id.fetch_add(1, Ordering::SeqCst);
        let request = CompletionRequest {
            request_id,
            messages,
        };
        let join_handle = self.spawn_worker(request)?;

        *active_request = Some(ActiveRequest {
            request_id,
            join_handle: Some(join_handle),
        });

        Ok(request_id)
    }

    fn spawn_worker(self: &Arc<Self>, request: CompletionRequest) -> Result<JoinHandle<()>, StartError> {
        let request_id = request.request_id;
        let runtime = Arc::clone(self);
        thread::Builder::new()
            .name(format!("storyloom-completion-{request_id}"))
            .spawn(move || runtime.run_worker(request))
            .map_err(|error| StartError::Spawn(error.to_string()))
    }

    fn run_worker(self: Arc<Self>, request: CompletionRequest) {
        let request_id = request.request_id;
        let profile = self.provider.profile();
        info!(
            request_id,
            provider = %profile.provider_id,
            model = %profile.model_id,
            messages = request.messages.len(),
            "completion started"
        );

        let provider = Arc::clone(&self.provider);
        let outcome = match catch_unwind(AssertUnwindSafe(|| provider.complete(request))) {
            Ok(outcome) => outcome,
            Err(_) => Err(ProviderFailure::other("Completion provider panicked")),
        };

        match &outcome {
            Ok(_) => info!(request_id, "completion resolved"),
            Err(failure) => warn!(request_id, %failure, "completion failed"),
        }

        self.enqueue_resolution(CompletionResolution {
            request_id,
            outcome,
        });
    }

    fn enqueue_resolution(&self, resolution: CompletionResolution) {
        lock_unpoisoned(&self.pending_events).push_back(resolution);
        self.pending_signal.notify_all();

        if let Some(waker) = &self.waker {
            waker();
        }
    }

    /// Blocks until a resolution is queued or `timeout` elapses.
    ///
    /// Returns whether at least one resolution is waiting to be flushed.
    pub fn wait_for_event(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut pending = lock_unpoisoned(&self.pending_events);
        while pending.is_empty() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            pending = match self.pending_signal.wait_timeout(pending, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        true
    }

    /// Applies every queued resolution to the workbench, in arrival order.
    ///
    /// Returns the number of resolutions drained, stale ones included.
    pub fn flush_pending_events(&self) -> usize {
        let mut drained = 0usize;

        loop {
            let resolution = lock_unpoisoned(&self.pending_events).pop_front();
            let Some(resolution) = resolution else {
                break;
            };

            let request_id = resolution.request_id;
            let applied = self
                .lock_workbench()
                .apply_resolution(request_id, resolution.outcome);
            if !applied {
                debug!(request_id, "stale resolution dropped");
            }
            self.clear_active_request_if_matching(request_id);
            drained += 1;
        }

        drained
    }

    /// Waits for and flushes resolutions until no call is active or `timeout`
    /// elapses. Returns whether the runtime ended idle.
    pub fn wait_until_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.flush_pending_events();
            if !self.is_busy() {
                return true;
            }

            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.wait_for_event(deadline - now);
        }
    }

    fn clear_active_request_if_matching(&self, request_id: RequestId) {
        let mut active_request = self.lock_active_request();
        let matches = active_request.as_ref().map(|active| active.request_id) == Some(request_id);
        if !matches {
            return;
        }

        let mut completed = match active_request.take() {
            Some(completed) => completed,
            None => return,
        };

        if let Some(join_handle) = completed.join_handle.take() {
            let is_current_thread = join_handle.thread().id() == thread::current().id();
            if !is_current_thread && join_handle.is_finished() {
                let _ = join_handle.join();
            }
        }
    }

    fn lock_active_request(&self) -> MutexGuard<'_, Option<ActiveRequest>> {
        lock_unpoisoned(&self.active_request)
    }
}

impl CompletionHost for Arc<GenerationRuntime> {
    fn start_completion(&mut self, messages: Vec<ChatMessage>) -> Result<RequestId, StartError> {
        self.start_completion_internal(messages)
    }
}

pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
