//! Bounded retry with exponential backoff and jitter for backend calls.
//!
//! Every remote call made by a stage goes through [`RemoteInvoker`]. For
//! `attempts` tries and a `backoff_factor`, a transient failure of attempt
//! `i` (0-indexed, not the last) waits
//! `backoff_factor * 2^i + uniform(0, max_jitter)` seconds before the next
//! attempt. A successful attempt never sleeps.
//!
//! Sleeping and jitter are injected through [`Sleeper`] and [`JitterSource`]
//! so tests run without real delay and with deterministic timing.

use async_trait::async_trait;
use rand::{RngExt, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;

use super::client::{GenerationRequest, GenerationResponse, LlmProvider};
use crate::error::LlmError;

/// Default number of attempts per call.
pub const DEFAULT_ATTEMPTS: u32 = 3;

/// Default backoff base in seconds.
pub const DEFAULT_BACKOFF_FACTOR: f64 = 1.0;

/// Default upper bound of the random jitter in seconds.
pub const DEFAULT_MAX_JITTER: f64 = 0.5;

/// Terminal failure of a remote call.
#[derive(Debug, Error)]
pub enum RemoteCallError {
    /// Every attempt failed transiently.
    #[error("remote call failed after {attempts} attempt(s): {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: LlmError,
    },

    /// An attempt failed in a way retrying cannot fix.
    #[error("remote call rejected: {0}")]
    Rejected(#[source] LlmError),

    /// Cancellation was observed before an attempt started.
    #[error("remote call cancelled before attempt {attempt}")]
    Cancelled { attempt: u32 },

    /// The per-call deadline ran out.
    #[error("remote call exceeded its {0:?} deadline")]
    DeadlineExceeded(Duration),
}

impl RemoteCallError {
    /// The last backend failure, when there was one.
    pub fn last_failure(&self) -> Option<&LlmError> {
        match self {
            RemoteCallError::Exhausted { source, .. } | RemoteCallError::Rejected(source) => {
                Some(source)
            }
            RemoteCallError::Cancelled { .. } | RemoteCallError::DeadlineExceeded(_) => None,
        }
    }
}

/// Classification of one attempt.
#[derive(Debug)]
pub enum AttemptOutcome {
    Success(GenerationResponse),
    /// Worth another attempt if any remain.
    Transient(LlmError),
    /// Propagate immediately.
    Terminal(LlmError),
}

impl AttemptOutcome {
    fn classify(result: Result<GenerationResponse, LlmError>) -> Self {
        match result {
            Ok(response) => AttemptOutcome::Success(response),
            Err(err) if err.is_transient() => AttemptOutcome::Transient(err),
            Err(err) => AttemptOutcome::Terminal(err),
        }
    }
}

/// Retry parameters shared by every online stage.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, at least 1.
    pub attempts: u32,
    /// Backoff base in seconds.
    pub backoff_factor: f64,
    /// Upper bound of the uniform jitter in seconds.
    pub max_jitter: f64,
    /// Budget for the whole call, including backoff sleeps.
    pub deadline: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            max_jitter: DEFAULT_MAX_JITTER,
            deadline: None,
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff_factor: f64) -> Self {
        Self {
            attempts,
            backoff_factor,
            ..Self::default()
        }
    }

    pub fn with_max_jitter(mut self, max_jitter: f64) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Delay after failed attempt `attempt` (0-indexed), given a jitter sample.
    pub fn backoff_delay(&self, attempt: u32, jitter_secs: f64) -> Duration {
        let base = self.backoff_factor * 2f64.powi(attempt as i32);
        Duration::try_from_secs_f64((base + jitter_secs).max(0.0)).unwrap_or(Duration::MAX)
    }
}

/// Sleep seam for backoff delays.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real sleeping on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Randomness seam for backoff jitter. Affects timing only.
pub trait JitterSource: Send + Sync {
    /// A sample in `[0, max)`, or 0 when `max` is not positive.
    fn sample(&self, max: f64) -> f64;
}

/// Jitter from the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngJitter;

impl JitterSource for ThreadRngJitter {
    fn sample(&self, max: f64) -> f64 {
        if max <= 0.0 {
            return 0.0;
        }
        rand::rng().random_range(0.0..max)
    }
}

/// Reproducible jitter from a seeded ChaCha stream.
#[derive(Debug)]
pub struct SeededJitter {
    rng: Mutex<ChaCha8Rng>,
}

impl SeededJitter {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }
}

impl JitterSource for SeededJitter {
    fn sample(&self, max: f64) -> f64 {
        if max <= 0.0 {
            return 0.0;
        }
        match self.rng.lock() {
            Ok(mut rng) => rng.random_range(0.0..max),
            Err(poisoned) => poisoned.into_inner().random_range(0.0..max),
        }
    }
}

/// Cooperative cancellation flag, checked before each attempt.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Executes generation requests with the retry policy.
pub struct RemoteInvoker {
    provider: Arc<dyn LlmProvider>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    jitter: Arc<dyn JitterSource>,
    cancellation: CancellationToken,
}

impl RemoteInvoker {
    /// Invoker with real sleeping and thread-RNG jitter.
    pub fn new(provider: Arc<dyn LlmProvider>, policy: RetryPolicy) -> Self {
        Self {
            provider,
            policy,
            sleeper: Arc::new(TokioSleeper),
            jitter: Arc::new(ThreadRngJitter),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_jitter(mut self, jitter: Arc<dyn JitterSource>) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Run `request`, retrying transient failures per the policy.
    pub async fn invoke(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, RemoteCallError> {
        let attempts = self.policy.attempts.max(1);
        let started = Instant::now();

        for attempt in 0..attempts {
            if self.cancellation.is_cancelled() {
                tracing::warn!(attempt = attempt + 1, "Remote call cancelled");
                return Err(RemoteCallError::Cancelled {
                    attempt: attempt + 1,
                });
            }

            let result = match self.remaining(started) {
                Some(remaining) if remaining.is_zero() => {
                    return Err(self.deadline_exceeded());
                }
                Some(remaining) => {
                    match tokio::time::timeout(remaining, self.provider.generate(request.clone()))
                        .await
                    {
                        Ok(result) => result,
                        Err(_) => return Err(self.deadline_exceeded()),
                    }
                }
                None => self.provider.generate(request.clone()).await,
            };

            let err = match AttemptOutcome::classify(result) {
                AttemptOutcome::Success(response) => {
                    if attempt > 0 {
                        tracing::info!(attempt = attempt + 1, "Remote call succeeded after retry");
                    }
                    return Ok(response);
                }
                AttemptOutcome::Terminal(err) => {
                    tracing::error!(attempt = attempt + 1, error = %err, "Non-transient remote failure");
                    return Err(RemoteCallError::Rejected(err));
                }
                AttemptOutcome::Transient(err) => err,
            };

            if attempt + 1 == attempts {
                tracing::error!(attempts, error = %err, "Remote call retries exhausted");
                return Err(RemoteCallError::Exhausted {
                    attempts,
                    source: err,
                });
            }

            let delay = self
                .policy
                .backoff_delay(attempt, self.jitter.sample(self.policy.max_jitter));
            if self.remaining(started).is_some_and(|remaining| delay >= remaining) {
                tracing::warn!(
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Backoff would outlast the deadline"
                );
                return Err(self.deadline_exceeded());
            }
            tracing::warn!(
                attempt = attempt + 1,
                max_attempts = attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Transient remote failure, backing off"
            );
            self.sleeper.sleep(delay).await;
        }

        // attempts >= 1, so the loop always returns.
        Err(RemoteCallError::Cancelled { attempt: attempts })
    }

    fn remaining(&self, started: Instant) -> Option<Duration> {
        self.policy
            .deadline
            .map(|deadline| deadline.saturating_sub(started.elapsed()))
    }

    fn deadline_exceeded(&self) -> RemoteCallError {
        let deadline = self.policy.deadline.unwrap_or_default();
        tracing::error!(deadline_ms = deadline.as_millis() as u64, "Remote call deadline exceeded");
        RemoteCallError::DeadlineExceeded(deadline)
    }
}

impl std::fmt::Debug for RemoteInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteInvoker")
            .field("policy", &self.policy)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::{Choice, Message, Usage};
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    /// Provider replaying a fixed script of attempt results.
    struct ScriptedProvider {
        script: Mutex<VecDeque<Result<GenerationResponse, LlmError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(script: Vec<Result<GenerationResponse, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn generate(
            &self,
            _request: GenerationRequest,
        ) -> Result<GenerationResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .expect("script lock")
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::RequestFailed("script exhausted".into())))
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl LlmProvider for SlowProvider {
        async fn generate(
            &self,
            _request: GenerationRequest,
        ) -> Result<GenerationResponse, LlmError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(ok_response("late"))
        }
    }

    #[derive(Default)]
    struct RecordingSleeper {
        slept: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        fn durations(&self) -> Vec<Duration> {
            self.slept.lock().expect("sleep log").clone()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.slept.lock().expect("sleep log").push(duration);
        }
    }

    struct FixedJitter(f64);

    impl JitterSource for FixedJitter {
        fn sample(&self, _max: f64) -> f64 {
            self.0
        }
    }

    fn ok_response(content: &str) -> GenerationResponse {
        GenerationResponse {
            id: "resp".to_string(),
            model: "test".to_string(),
            choices: vec![Choice {
                index: 0,
                message: Message::assistant(content),
                finish_reason: "stop".to_string(),
            }],
            usage: Usage::default(),
        }
    }

    fn transient() -> Result<GenerationResponse, LlmError> {
        Err(LlmError::ApiError {
            code: 503,
            message: "overloaded".to_string(),
        })
    }

    fn request() -> GenerationRequest {
        GenerationRequest::new("test", vec![Message::user("hello")])
    }

    fn invoker(
        provider: Arc<ScriptedProvider>,
        policy: RetryPolicy,
        sleeper: Arc<RecordingSleeper>,
    ) -> RemoteInvoker {
        RemoteInvoker::new(provider, policy)
            .with_sleeper(sleeper)
            .with_jitter(Arc::new(FixedJitter(0.0)))
    }

    #[tokio::test]
    async fn test_always_failing_call_makes_three_attempts_and_two_sleeps() {
        let provider = ScriptedProvider::new(vec![transient(), transient(), transient()]);
        let sleeper = Arc::new(RecordingSleeper::default());
        let invoker = invoker(provider.clone(), RetryPolicy::new(3, 1.0), sleeper.clone());

        let err = invoker.invoke(request()).await.expect_err("should exhaust");

        assert_eq!(provider.calls(), 3);
        assert_eq!(
            sleeper.durations(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
        match err {
            RemoteCallError::Exhausted { attempts, source } => {
                assert_eq!(attempts, 3);
                assert!(matches!(source, LlmError::ApiError { code: 503, .. }));
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_first_attempt_success_never_sleeps() {
        let provider = ScriptedProvider::new(vec![Ok(ok_response("plan"))]);
        let sleeper = Arc::new(RecordingSleeper::default());
        let invoker = invoker(provider.clone(), RetryPolicy::new(3, 1.0), sleeper.clone());

        let response = invoker.invoke(request()).await.expect("should succeed");

        assert_eq!(response.first_content(), Some("plan"));
        assert_eq!(provider.calls(), 1);
        assert!(sleeper.durations().is_empty());
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let provider = ScriptedProvider::new(vec![
            Err(LlmError::RateLimited("quota".into())),
            Ok(ok_response("lesson")),
        ]);
        let sleeper = Arc::new(RecordingSleeper::default());
        let invoker = invoker(provider.clone(), RetryPolicy::new(3, 0.5), sleeper.clone());

        let response = invoker.invoke(request()).await.expect("should recover");

        assert_eq!(response.first_content(), Some("lesson"));
        assert_eq!(provider.calls(), 2);
        assert_eq!(sleeper.durations(), vec![Duration::from_millis(500)]);
    }

    #[tokio::test]
    async fn test_terminal_failure_is_not_retried() {
        let provider = ScriptedProvider::new(vec![Err(LlmError::ApiError {
            code: 401,
            message: "bad key".into(),
        })]);
        let sleeper = Arc::new(RecordingSleeper::default());
        let invoker = invoker(provider.clone(), RetryPolicy::new(3, 1.0), sleeper.clone());

        let err = invoker.invoke(request()).await.expect_err("should reject");

        assert!(matches!(err, RemoteCallError::Rejected(_)));
        assert_eq!(provider.calls(), 1);
        assert!(sleeper.durations().is_empty());
    }

    #[tokio::test]
    async fn test_single_attempt_policy_fails_without_sleep() {
        let provider = ScriptedProvider::new(vec![transient()]);
        let sleeper = Arc::new(RecordingSleeper::default());
        let invoker = invoker(provider.clone(), RetryPolicy::new(1, 1.0), sleeper.clone());

        let err = invoker.invoke(request()).await.expect_err("should exhaust");

        assert!(matches!(err, RemoteCallError::Exhausted { attempts: 1, .. }));
        assert!(sleeper.durations().is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_checked_before_attempt() {
        let provider = ScriptedProvider::new(vec![Ok(ok_response("never"))]);
        let sleeper = Arc::new(RecordingSleeper::default());
        let token = CancellationToken::new();
        token.cancel();
        let invoker = invoker(provider.clone(), RetryPolicy::default(), sleeper)
            .with_cancellation(token);

        let err = invoker.invoke(request()).await.expect_err("cancelled");

        assert!(matches!(err, RemoteCallError::Cancelled { attempt: 1 }));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_deadline_stops_slow_attempt() {
        let sleeper = Arc::new(RecordingSleeper::default());
        let policy = RetryPolicy::new(3, 1.0).with_deadline(Duration::from_millis(20));
        let invoker = RemoteInvoker::new(Arc::new(SlowProvider), policy)
            .with_sleeper(sleeper.clone())
            .with_jitter(Arc::new(FixedJitter(0.0)));

        let err = invoker.invoke(request()).await.expect_err("deadline");

        assert!(matches!(err, RemoteCallError::DeadlineExceeded(_)));
        assert!(sleeper.durations().is_empty());
        assert!(err.last_failure().is_none());
    }

    #[tokio::test]
    async fn test_backoff_longer_than_deadline_ends_call_without_sleeping() {
        let provider = ScriptedProvider::new(vec![transient(), transient(), transient()]);
        let sleeper = Arc::new(RecordingSleeper::default());
        let policy = RetryPolicy::new(3, 1.0).with_deadline(Duration::from_millis(100));
        let invoker = invoker(provider.clone(), policy, sleeper.clone());

        let err = invoker.invoke(request()).await.expect_err("deadline");

        assert!(matches!(
            err,
            RemoteCallError::DeadlineExceeded(d) if d == Duration::from_millis(100)
        ));
        assert_eq!(provider.calls(), 1);
        assert!(sleeper.durations().is_empty());
    }

    #[tokio::test]
    async fn test_backoff_within_deadline_still_retries() {
        let provider = ScriptedProvider::new(vec![transient(), Ok(ok_response("quiz"))]);
        let sleeper = Arc::new(RecordingSleeper::default());
        let policy = RetryPolicy::new(3, 0.5).with_deadline(Duration::from_secs(30));
        let invoker = invoker(provider.clone(), policy, sleeper.clone());

        let response = invoker.invoke(request()).await.expect("should recover");

        assert_eq!(response.first_content(), Some("quiz"));
        assert_eq!(provider.calls(), 2);
        assert_eq!(sleeper.durations(), vec![Duration::from_millis(500)]);
    }

    #[tokio::test]
    async fn test_empty_choice_list_is_retried() {
        let provider =
            ScriptedProvider::new(vec![Err(LlmError::EmptyResponse), Ok(ok_response("plan"))]);
        let sleeper = Arc::new(RecordingSleeper::default());
        let invoker = invoker(provider.clone(), RetryPolicy::new(3, 1.0), sleeper.clone());

        let response = invoker.invoke(request()).await.expect("should recover");

        assert_eq!(response.first_content(), Some("plan"));
        assert_eq!(provider.calls(), 2);
        assert_eq!(sleeper.durations(), vec![Duration::from_secs(1)]);
    }

    #[test]
    fn test_backoff_delay_formula() {
        let policy = RetryPolicy::new(4, 1.5);
        assert_eq!(policy.backoff_delay(0, 0.0), Duration::from_secs_f64(1.5));
        assert_eq!(policy.backoff_delay(1, 0.0), Duration::from_secs_f64(3.0));
        assert_eq!(policy.backoff_delay(2, 0.25), Duration::from_secs_f64(6.25));
    }

    #[test]
    fn test_seeded_jitter_is_reproducible_and_bounded() {
        let a = SeededJitter::new(7);
        let b = SeededJitter::new(7);
        for _ in 0..20 {
            let x = a.sample(0.5);
            assert_eq!(x, b.sample(0.5));
            assert!((0.0..0.5).contains(&x));
        }
        assert_eq!(a.sample(0.0), 0.0);
    }

    #[test]
    fn test_thread_rng_jitter_range() {
        let jitter = ThreadRngJitter;
        for _ in 0..20 {
            let x = jitter.sample(DEFAULT_MAX_JITTER);
            assert!((0.0..DEFAULT_MAX_JITTER).contains(&x));
        }
        assert_eq!(jitter.sample(-1.0), 0.0);
    }
}
