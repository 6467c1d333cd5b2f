//! Deterministic mock implementation of the shared `completion_provider` contract.
//!
//! This crate contains no transport logic and is intended for offline writing
//! sessions and contract-level integration testing.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use completion_provider::{
    CompletionProvider, CompletionRequest, CompletionResponse, ProviderFailure, ProviderProfile,
};

/// Stable provider identifier used for explicit startup selection.
pub const MOCK_PROVIDER_ID: &str = "mock";

/// One scripted resolution for a future call.
#[derive(Debug, Clone, PartialEq)]
pub enum MockOutcome {
    Reply(String),
    Response(CompletionResponse),
    Fail(ProviderFailure),
}

impl MockOutcome {
    #[must_use]
    pub fn reply(text: impl Into<String>) -> Self {
        Self::Reply(text.into())
    }

    fn resolve(self) -> Result<CompletionResponse, ProviderFailure> {
        match self {
            Self::Reply(text) => Ok(CompletionResponse::from_text(text)),
            Self::Response(response) => Ok(response),
            Self::Fail(failure) => Err(failure),
        }
    }
}

#[derive(Debug, Default)]
struct CallLog {
    requests: Vec<CompletionRequest>,
    in_flight: usize,
    max_in_flight: usize,
}

#[derive(Debug, Default)]
struct GateState {
    open: bool,
}

/// Handle that holds calls inside `complete` until released.
#[derive(Debug, Clone, Default)]
pub struct MockGate {
    inner: Arc<(Mutex<GateState>, Condvar)>,
}

impl MockGate {
    /// Lets every waiting and future call proceed.
    pub fn release(&self) {
        let (state, signal) = &*self.inner;
        lock_unpoisoned(state).open = true;
        signal.notify_all();
    }

    fn wait(&self) {
        let (state, signal) = &*self.inner;
        let mut guard = lock_unpoisoned(state);
        while !guard.open {
            guard = match signal.wait(guard) {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
    }
}

/// Deterministic mock provider used by `storyloom` tests and offline runs.
///
/// Scripted outcomes are consumed in order; once exhausted the provider
/// cycles through its fallback replies.
#[derive(Debug)]
pub struct MockProvider {
    scripted: Mutex<VecDeque<MockOutcome>>,
    fallback_replies: Vec<String>,
    fallback_index: Mutex<usize>,
    delay: Duration,
    gate: Option<MockGate>,
    calls: Mutex<CallLog>,
}

impl MockProvider {
    /// Creates a mock provider that resolves calls with `outcomes` in order.
    #[must_use]
    pub fn new(outcomes: Vec<MockOutcome>) -> Self {
        Self {
            scripted: Mutex::new(outcomes.into()),
            fallback_replies: vec!["The story continues.".to_string()],
            fallback_index: Mutex::new(0),
            delay: Duration::ZERO,
            gate: None,
            calls: Mutex::new(CallLog::default()),
        }
    }

    /// Creates a mock provider that always replies with the given texts, cycling.
    #[must_use]
    pub fn with_replies(replies: Vec<String>) -> Self {
        let mut provider = Self::new(Vec::new());
        let replies: Vec<String> = replies
            .into_iter()
            .filter(|reply| !reply.is_empty())
            .collect();
        if !replies.is_empty() {
            provider.fallback_replies = replies;
        }
        provider
    }

    /// Sleeps for `delay` inside every call.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Holds every call until the returned gate is released.
    #[must_use]
    pub fn gated(mut self) -> (Self, MockGate) {
        let gate = MockGate::default();
        self.gate = Some(gate.clone());
        (self, gate)
    }

    /// Queues another scripted outcome behind the existing ones.
    pub fn push_outcome(&self, outcome: MockOutcome) {
        lock_unpoisoned(&self.scripted).push_back(outcome);
    }

    /// Returns every request received so far, oldest first.
    #[must_use]
    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        lock_unpoisoned(&self.calls).requests.clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        lock_unpoisoned(&self.calls).requests.len()
    }

    /// Highest number of calls observed executing at the same time.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        lock_unpoisoned(&self.calls).max_in_flight
    }

    fn next_outcome(&self) -> MockOutcome {
        if let Some(outcome) = lock_unpoisoned(&self.scripted).pop_front() {
            return outcome;
        }

        let mut index = lock_unpoisoned(&self.fallback_index);
        let reply = self.fallback_replies[*index % self.fallback_replies.len()].clone();
        *index += 1;
        MockOutcome::Reply(reply)
    }

    /// Delay applied by the default offline provider.
    pub const DEFAULT_DELAY_MS: u64 = 200;
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::with_replies(vec![
            "The lantern guttered, and somewhere below the stairs a door that had been locked for years swung open.".to_string(),
            "She counted the footsteps twice before admitting that there were more of them than there were people in the house.".to_string(),
            "By morning the rain had stopped, but the river kept rising as if it remembered an older flood.".to_string(),
            "Nobody in the village spoke of the letter, yet everyone seemed to know what it said.".to_string(),
        ])
        .with_delay(Duration::from_millis(Self::DEFAULT_DELAY_MS))
    }
}

impl CompletionProvider for MockProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: MOCK_PROVIDER_ID.to_string(),
            model_id: "mock".to_string(),
        }
    }

    fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderFailure> {
        {
            let mut calls = lock_unpoisoned(&self.calls);
            calls.requests.push(request);
            calls.in_flight += 1;
            calls.max_in_flight = calls.max_in_flight.max(calls.in_flight);
        }

        if let Some(gate) = &self.gate {
            gate.wait();
        }
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }

        let outcome = self.next_outcome();
        lock_unpoisoned(&self.calls).in_flight -= 1;
        outcome.resolve()
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
