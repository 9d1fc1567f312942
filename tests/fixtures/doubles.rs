//! Scripted stand-ins for the text-generation service and routing engine.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use route_finder::error::{EngineError, GenerationError};
use route_finder::retrieval::{RouteRequest, RouteRow};
use route_finder::traits::{RoutingEngine, TextGenerator};

/// Answers each prompt kind from its own script. The last scripted answer
/// repeats once a script runs out; `None` answers and empty scripts are
/// service failures.
#[derive(Default)]
pub struct FakeGenerator {
    weights: Mutex<VecDeque<Option<String>>>,
    rationales: Mutex<VecDeque<Option<String>>>,
    landmarks: Mutex<VecDeque<Option<String>>>,
    explanations: Mutex<VecDeque<Option<String>>>,
    pauses: Vec<(String, Duration)>,
    in_flight: AtomicUsize,
    pub explanation_calls: Arc<AtomicUsize>,
    /// Highest number of calls seen running at the same time.
    pub max_in_flight: Arc<AtomicUsize>,
}

impl FakeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn weights(self, answer: impl Into<String>) -> Self {
        self.weights.lock().unwrap().push_back(Some(answer.into()));
        self
    }

    pub fn weights_fail(self) -> Self {
        self.weights.lock().unwrap().push_back(None);
        self
    }

    pub fn rationale(self, answer: impl Into<String>) -> Self {
        self.rationales.lock().unwrap().push_back(Some(answer.into()));
        self
    }

    pub fn rationale_fail(self) -> Self {
        self.rationales.lock().unwrap().push_back(None);
        self
    }

    pub fn landmarks(self, answer: impl Into<String>) -> Self {
        self.landmarks.lock().unwrap().push_back(Some(answer.into()));
        self
    }

    pub fn landmarks_fail(self) -> Self {
        self.landmarks.lock().unwrap().push_back(None);
        self
    }

    pub fn explanation(self, answer: impl Into<String>) -> Self {
        self.explanations.lock().unwrap().push_back(Some(answer.into()));
        self
    }

    pub fn explanation_fail(self) -> Self {
        self.explanations.lock().unwrap().push_back(None);
        self
    }

    /// Every call sleeps this long before answering.
    pub fn delayed(self, delay: Duration) -> Self {
        self.pause_when("", delay)
    }

    /// Calls whose prompt contains `marker` sleep this long. The first
    /// matching marker wins.
    pub fn pause_when(mut self, marker: &str, delay: Duration) -> Self {
        self.pauses.push((marker.to_string(), delay));
        self
    }

    fn next(script: &Mutex<VecDeque<Option<String>>>) -> Result<String, GenerationError> {
        let mut script = script.lock().unwrap();
        let answer = if script.len() > 1 {
            script.pop_front().flatten()
        } else {
            script.front().cloned().flatten()
        };
        answer.ok_or_else(|| GenerationError::Other("scripted failure".to_string()))
    }
}

impl TextGenerator for FakeGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some((_, delay)) = self.pauses.iter().find(|(marker, _)| prompt.contains(marker.as_str())) {
            thread::sleep(*delay);
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if prompt.contains("First JSON document") {
            self.explanation_calls.fetch_add(1, Ordering::SeqCst);
            Self::next(&self.explanations)
        } else if prompt.contains("Word list:") {
            Self::next(&self.landmarks)
        } else if prompt.contains("Weights:") {
            Self::next(&self.rationales)
        } else if prompt.contains("Criteria:") {
            Self::next(&self.weights)
        } else {
            Err(GenerationError::Other("unrecognized prompt".to_string()))
        }
    }
}

/// Panics on every call, like a collaborator with a bug.
pub struct PanickingGenerator;

impl TextGenerator for PanickingGenerator {
    fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        panic!("generator crashed");
    }
}

/// Replays scripted rows, repeating the last one, and records every request.
pub struct FakeEngine {
    rows: Mutex<VecDeque<Result<Option<RouteRow>, String>>>,
    pub calls: Arc<AtomicUsize>,
    pub requests: Arc<Mutex<Vec<RouteRequest>>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(VecDeque::new()),
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn returning(route: impl Into<String>, landmarks: Option<String>) -> Self {
        Self::new().then_row(route, landmarks)
    }

    pub fn then_row(self, route: impl Into<String>, landmarks: Option<String>) -> Self {
        let row = RouteRow::new(vec![Some(route.into()), landmarks]);
        self.rows.lock().unwrap().push_back(Ok(Some(row)));
        self
    }

    pub fn then_no_row(self) -> Self {
        self.rows.lock().unwrap().push_back(Ok(None));
        self
    }

    pub fn then_error(self, message: &str) -> Self {
        self.rows.lock().unwrap().push_back(Err(message.to_string()));
        self
    }
}

impl RoutingEngine for FakeEngine {
    fn generate_route(&self, request: &RouteRequest) -> Result<Option<RouteRow>, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let mut rows = self.rows.lock().unwrap();
        let next = if rows.len() > 1 { rows.pop_front() } else { rows.front().cloned() };
        match next {
            Some(Ok(row)) => Ok(row),
            Some(Err(message)) => Err(EngineError::Other(message)),
            None => Ok(None),
        }
    }
}
