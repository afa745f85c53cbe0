//! Device position lookup with bounded, delayed retries.
//!
//! A single lookup asks the [`PositionSource`] once. When the source reports
//! [`LocationError::PositionUnavailable`] and retries remain, the resolver waits
//! `retry_delay` and asks again. Every other failure, or running out of retries,
//! ends the lookup with no coordinates.

use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::{error::LocationError, model::Coordinates};

pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(2_000);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(15_000);
pub const DEFAULT_MAXIMUM_AGE: Duration = Duration::from_millis(86_400_000);

/// Options handed to the platform location service on every attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    /// Upper bound on a single attempt.
    pub timeout: Duration,
    /// Oldest cached fix the service may hand back.
    pub maximum_age: Duration,
    pub enable_high_accuracy: bool,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            maximum_age: DEFAULT_MAXIMUM_AGE,
            enable_high_accuracy: false,
        }
    }
}

/// The platform location service.
#[async_trait]
pub trait PositionSource: Send + Sync + Debug {
    async fn current_position(&self, options: &PositionOptions)
    -> Result<Coordinates, LocationError>;
}

/// Waits between attempts. Swappable so retry timing can be tested without a clock.
#[async_trait]
pub trait Delay: Send + Sync + Debug {
    async fn wait(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// A position stored in the configuration file.
///
/// With nothing stored it behaves like a device whose location services are off.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfiguredPosition {
    position: Option<Coordinates>,
}

impl ConfiguredPosition {
    pub fn new(position: Option<Coordinates>) -> Self {
        Self { position }
    }
}

#[async_trait]
impl PositionSource for ConfiguredPosition {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinates, LocationError> {
        self.position.ok_or(LocationError::PositionUnavailable)
    }
}

/// Outcome of a lookup, including how many attempts it took.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub coordinates: Option<Coordinates>,
    pub attempts: u32,
    /// Failure of the last attempt, if it failed.
    pub failure: Option<LocationError>,
}

#[derive(Debug, Clone)]
pub struct LocationResolver<S, D = TokioDelay> {
    source: S,
    delay: D,
    options: PositionOptions,
    retry_delay: Duration,
}

impl<S: PositionSource> LocationResolver<S> {
    pub fn new(source: S) -> Self {
        Self::with_delay(source, TokioDelay)
    }
}

impl<S: PositionSource, D: Delay> LocationResolver<S, D> {
    pub fn with_delay(source: S, delay: D) -> Self {
        Self {
            source,
            delay,
            options: PositionOptions::default(),
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn options(mut self, options: PositionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Resolve the current position, or `None` if it could not be obtained.
    pub async fn resolve(&self, max_retries: u32) -> Option<Coordinates> {
        self.resolve_with_report(max_retries).await.coordinates
    }

    /// Like [`Self::resolve`], but reports attempts and the last failure.
    ///
    /// Makes at most `max_retries + 1` attempts.
    pub async fn resolve_with_report(&self, max_retries: u32) -> Resolution {
        let mut retries_left = max_retries;
        let mut attempts: u32 = 0;

        loop {
            attempts = attempts.saturating_add(1);
            debug!(attempt = attempts, retries_left, "requesting current position");

            let failure = match self.attempt().await {
                Ok(coordinates) => {
                    if attempts > 1 {
                        info!("Position resolved after {} attempts", attempts);
                    }
                    return Resolution {
                        coordinates: Some(coordinates),
                        attempts,
                        failure: None,
                    };
                }
                Err(err) => err,
            };

            warn!(attempt = attempts, error = %failure, "geolocation error");

            if failure.is_retryable() && retries_left > 0 {
                retries_left -= 1;
                info!(
                    "Location temporarily unavailable, retrying in {:?} ({} retries left)",
                    self.retry_delay, retries_left
                );
                self.delay.wait(self.retry_delay).await;
                continue;
            }

            if failure == LocationError::PermissionDenied {
                warn!("User denied location access");
            }

            return Resolution {
                coordinates: None,
                attempts,
                failure: Some(failure),
            };
        }
    }

    async fn attempt(&self) -> Result<Coordinates, LocationError> {
        tokio::time::timeout(
            self.options.timeout,
            self.source.current_position(&self.options),
        )
        .await
        .unwrap_or(Err(LocationError::Timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        collections::VecDeque,
        sync::{
            Arc, Mutex,
            atomic::{AtomicU32, Ordering},
        },
    };

    const BERLIN: Coordinates = Coordinates::new(52.52, 13.405);

    /// Replays a fixed list of outcomes, then keeps failing as unavailable.
    #[derive(Debug, Default)]
    struct Scripted {
        outcomes: Mutex<VecDeque<Result<Coordinates, LocationError>>>,
        calls: AtomicU32,
    }

    impl Scripted {
        fn new(outcomes: impl IntoIterator<Item = Result<Coordinates, LocationError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into_iter().collect()),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PositionSource for Scripted {
        async fn current_position(
            &self,
            _options: &PositionOptions,
        ) -> Result<Coordinates, LocationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LocationError::PositionUnavailable))
        }
    }

    #[derive(Debug, Clone, Default)]
    struct RecordingDelay(Arc<Mutex<Vec<Duration>>>);

    impl RecordingDelay {
        fn waits(&self) -> Vec<Duration> {
            self.0.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Delay for RecordingDelay {
        async fn wait(&self, duration: Duration) {
            self.0.lock().unwrap().push(duration);
        }
    }

    fn resolver(
        outcomes: impl IntoIterator<Item = Result<Coordinates, LocationError>>,
    ) -> (LocationResolver<Scripted, RecordingDelay>, RecordingDelay) {
        let delay = RecordingDelay::default();
        let resolver = LocationResolver::with_delay(Scripted::new(outcomes), delay.clone());
        (resolver, delay)
    }

    #[tokio::test]
    async fn returns_coordinates_untouched() {
        let (resolver, delay) = resolver([Ok(BERLIN)]);

        let coords = resolver.resolve(DEFAULT_MAX_RETRIES).await;

        assert_eq!(coords, Some(Coordinates::new(52.52, 13.405)));
        assert_eq!(resolver.source().calls(), 1);
        assert!(delay.waits().is_empty());
    }

    #[tokio::test]
    async fn permission_denied_stops_immediately() {
        for max_retries in [0, 1, 5, 50] {
            let (resolver, delay) = resolver([Err(LocationError::PermissionDenied), Ok(BERLIN)]);

            let report = resolver.resolve_with_report(max_retries).await;

            assert_eq!(report.coordinates, None);
            assert_eq!(report.attempts, 1);
            assert_eq!(report.failure, Some(LocationError::PermissionDenied));
            assert_eq!(resolver.source().calls(), 1);
            assert!(delay.waits().is_empty());
        }
    }

    #[tokio::test]
    async fn timeout_is_not_retried() {
        let (resolver, _) = resolver([Err(LocationError::Timeout), Ok(BERLIN)]);

        let report = resolver.resolve_with_report(3).await;

        assert_eq!(report.coordinates, None);
        assert_eq!(report.attempts, 1);
    }

    #[tokio::test]
    async fn unavailable_exhausts_after_max_retries_plus_one() {
        for max_retries in 0..=6 {
            let (resolver, delay) = resolver([]);

            let report = resolver.resolve_with_report(max_retries).await;

            assert_eq!(report.coordinates, None);
            assert_eq!(report.attempts, max_retries + 1);
            assert_eq!(report.failure, Some(LocationError::PositionUnavailable));
            assert_eq!(resolver.source().calls(), max_retries + 1);
            assert_eq!(delay.waits(), vec![DEFAULT_RETRY_DELAY; max_retries as usize]);
        }
    }

    #[tokio::test]
    async fn success_on_last_allowed_attempt() {
        let max_retries = 5;
        let mut outcomes: Vec<_> = (0..max_retries)
            .map(|_| Err(LocationError::PositionUnavailable))
            .collect();
        outcomes.push(Ok(BERLIN));
        let (resolver, delay) = resolver(outcomes);

        let report = resolver.resolve_with_report(max_retries).await;

        assert_eq!(report.coordinates, Some(BERLIN));
        assert_eq!(report.attempts, max_retries + 1);
        assert_eq!(report.failure, None);
        assert_eq!(delay.waits().len(), max_retries as usize);
    }

    #[tokio::test]
    async fn largest_retry_budget_still_counts_attempts() {
        let (resolver, delay) = resolver([
            Err(LocationError::PositionUnavailable),
            Err(LocationError::PositionUnavailable),
            Ok(BERLIN),
        ]);

        let report = resolver.resolve_with_report(u32::MAX).await;

        assert_eq!(report.coordinates, Some(BERLIN));
        assert_eq!(report.attempts, 3);
        assert_eq!(delay.waits().len(), 2);
    }

    #[tokio::test]
    async fn non_retryable_failure_after_retries_stops() {
        let (resolver, delay) = resolver([
            Err(LocationError::PositionUnavailable),
            Err(LocationError::Other("driver crashed".into())),
            Ok(BERLIN),
        ]);

        let report = resolver.resolve_with_report(5).await;

        assert_eq!(report.coordinates, None);
        assert_eq!(report.attempts, 2);
        assert_eq!(delay.waits().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_waits_at_least_the_retry_delay() {
        let resolver = LocationResolver::new(Scripted::new([
            Err(LocationError::PositionUnavailable),
            Err(LocationError::PositionUnavailable),
            Ok(BERLIN),
        ]));
        let started = tokio::time::Instant::now();

        let coords = resolver.resolve(DEFAULT_MAX_RETRIES).await;

        assert_eq!(coords, Some(BERLIN));
        assert!(started.elapsed() >= DEFAULT_RETRY_DELAY * 2);
    }

    #[derive(Debug)]
    struct Hanging;

    #[async_trait]
    impl PositionSource for Hanging {
        async fn current_position(
            &self,
            _options: &PositionOptions,
        ) -> Result<Coordinates, LocationError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_source_times_out() {
        let resolver = LocationResolver::new(Hanging);

        let report = resolver.resolve_with_report(DEFAULT_MAX_RETRIES).await;

        assert_eq!(report.failure, Some(LocationError::Timeout));
        assert_eq!(report.attempts, 1);
    }

    #[tokio::test]
    async fn configured_position_without_value_is_unavailable() {
        let source = ConfiguredPosition::new(None);
        let err = source
            .current_position(&PositionOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, LocationError::PositionUnavailable);

        let source = ConfiguredPosition::new(Some(BERLIN));
        let resolver = LocationResolver::new(source);
        assert_eq!(resolver.resolve(0).await, Some(BERLIN));
    }

    #[test]
    fn default_options_prefer_low_accuracy() {
        let options = PositionOptions::default();
        assert_eq!(options.timeout, Duration::from_millis(15_000));
        assert_eq!(options.maximum_age, Duration::from_millis(86_400_000));
        assert!(!options.enable_high_accuracy);
    }
}
