//! The preference-to-route pipeline.
//!
//! ```text
//! validate -> (weights -> rationale) || landmarks -> retrieve route -> metrics -> explanation -> assemble
//! ```
//!
//! Weight, rationale and landmark failures are absorbed by their components.
//! Route retrieval, geometry measurement and explanation failures abort the
//! request.
//!
//! The worker pool only bounds how many searches run at once. Each search
//! forks its preference calls onto scoped threads, so a worker blocked on
//! external I/O never picks up another request's work.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crate::chat::ChatClient;
use crate::config::{Config, PipelineConfig};
use crate::error::{ConfigError, SearchError};
use crate::explanation::ExplanationGenerator;
use crate::landmarks::LandmarkExtractor;
use crate::metrics::MetricsCalculator;
use crate::model::{SearchRequest, SearchResult};
use crate::polyline::decode_geometry;
use crate::postgrest::PostgrestEngine;
use crate::rationale::WeightRationale;
use crate::retrieval::{RouteRequest, RouteRetriever};
use crate::traits::{RoutingEngine, TextGenerator};
use crate::vocabulary::LandmarkVocabulary;
use crate::weights::WeightResolver;

/// Runs searches on a bounded worker pool.
///
/// Cloning is cheap and shares the pool and the external clients.
pub struct SearchOrchestrator<G, E> {
    generator: Arc<G>,
    engine: Arc<E>,
    weights: WeightResolver,
    rationale: WeightRationale,
    landmarks: LandmarkExtractor,
    retriever: RouteRetriever,
    metrics: MetricsCalculator,
    explainer: ExplanationGenerator,
    pool: Arc<rayon::ThreadPool>,
}

impl<G, E> Clone for SearchOrchestrator<G, E> {
    fn clone(&self) -> Self {
        Self {
            generator: Arc::clone(&self.generator),
            engine: Arc::clone(&self.engine),
            weights: self.weights.clone(),
            rationale: self.rationale.clone(),
            landmarks: self.landmarks.clone(),
            retriever: self.retriever.clone(),
            metrics: self.metrics.clone(),
            explainer: self.explainer.clone(),
            pool: Arc::clone(&self.pool),
        }
    }
}

impl SearchOrchestrator<ChatClient, PostgrestEngine> {
    /// Wires the HTTP adapters and the vocabulary named by `config`.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let vocabulary = Arc::new(config.pipeline.vocabulary()?);
        let generator = ChatClient::new(config.chat.clone())?;
        let engine = PostgrestEngine::new(config.routing.clone())?;
        Self::new(&config.pipeline, vocabulary, generator, engine)
    }
}

impl<G, E> SearchOrchestrator<G, E>
where
    G: TextGenerator + 'static,
    E: RoutingEngine + 'static,
{
    pub fn new(
        config: &PipelineConfig,
        vocabulary: Arc<LandmarkVocabulary>,
        generator: G,
        engine: E,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_threads)
            .thread_name(|index| format!("route-finder-{index}"))
            .panic_handler(|payload| {
                tracing::error!(panic = panic_message(payload.as_ref()), "search worker panicked");
            })
            .build()?;

        Ok(Self {
            generator: Arc::new(generator),
            engine: Arc::new(engine),
            weights: WeightResolver::new(config.landmarks_weight, config.weight_tolerance),
            rationale: WeightRationale::new(),
            landmarks: LandmarkExtractor::new(vocabulary),
            retriever: RouteRetriever::new(config.route_policy()),
            metrics: MetricsCalculator::new(config.walking_speed_mps),
            explainer: ExplanationGenerator::new(config.explanation_policy(), config.strict_explanation_bounds),
            pool: Arc::new(pool),
        })
    }

    /// Runs one search on the worker pool, blocking the caller until done.
    ///
    /// A panicking collaborator surfaces as [`SearchError::WorkerLost`].
    pub fn search(&self, request: &SearchRequest) -> Result<SearchResult, SearchError> {
        self.pool.install(|| self.run_isolated(request))
    }

    /// Like [`search`](Self::search) but gives up after `timeout`.
    ///
    /// On timeout the pipeline keeps running on its worker until its current
    /// external call returns; its result is discarded.
    pub fn search_with_timeout(&self, request: SearchRequest, timeout: Duration) -> Result<SearchResult, SearchError> {
        let (tx, rx) = mpsc::channel();
        let this = self.clone();
        self.pool.spawn(move || {
            let _ = tx.send(this.run_isolated(&request));
        });

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                tracing::error!(?timeout, "search timed out");
                Err(SearchError::Timeout(timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(SearchError::WorkerLost),
        }
    }

    fn run_isolated(&self, request: &SearchRequest) -> Result<SearchResult, SearchError> {
        panic::catch_unwind(AssertUnwindSafe(|| self.run(request))).unwrap_or_else(|payload| {
            tracing::error!(panic = panic_message(payload.as_ref()), "search pipeline panicked");
            Err(SearchError::WorkerLost)
        })
    }

    fn run(&self, request: &SearchRequest) -> Result<SearchResult, SearchError> {
        let span = tracing::info_span!("search", start = %request.start(), end = %request.end());
        let _guard = span.enter();

        let generator = self.generator.as_ref();
        let preference = request.preference();

        let (weights, rationale, landmarks) = thread::scope(|scope| {
            let landmark_span = span.clone();
            let landmarks =
                scope.spawn(move || landmark_span.in_scope(|| self.landmarks.extract(generator, preference)));

            let weights = self.weights.resolve(generator, preference);
            let rationale = self.rationale.describe(generator, preference, &weights);
            let landmarks = landmarks.join().unwrap_or_else(|payload| panic::resume_unwind(payload));
            (weights, rationale, landmarks)
        });
        tracing::debug!(?weights, landmarks = ?landmarks.terms(), "interpreted preference");

        let route_request = RouteRequest {
            weights,
            landmarks,
            start: request.start(),
            end: request.end(),
        };
        let retrieved = self
            .retriever
            .retrieve(self.engine.as_ref(), &route_request)
            .inspect_err(|err| tracing::error!(error = %err, "route retrieval failed"))?;

        let route = decode_geometry(&retrieved.route)
            .inspect_err(|err| tracing::error!(error = %err, "route geometry is malformed"))?;
        let metrics = self
            .metrics
            .measure(&route)
            .inspect_err(|err| tracing::error!(error = %err, "route geometry cannot be measured"))?;
        tracing::debug!(distance_m = metrics.distance_m, duration_min = metrics.duration_min, "measured route");

        let explanation = self
            .explainer
            .explain(generator, preference, &retrieved.route, retrieved.landmarks.as_ref())
            .inspect_err(|err| tracing::error!(error = %err, "route explanation failed"))?;

        tracing::info!(
            distance_m = metrics.distance_m,
            duration_min = metrics.duration_min,
            details = explanation.details.len(),
            "search completed"
        );

        Ok(SearchResult {
            request: request.clone(),
            rationale,
            title: explanation.title,
            summary: explanation.summary,
            route,
            details: explanation.details,
            distance_m: metrics.distance_m,
            duration_min: metrics.duration_min,
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
