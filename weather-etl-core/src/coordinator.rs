use std::sync::Arc;

use crate::{
    fanout,
    model::{CityQuery, FetchFailure, FetchReport, WeatherRecord},
    provider::WeatherProvider,
    retry::RetryPolicy,
};

/// Fans a provider out over a list of cities, retrying transient failures
/// per city, and collects every outcome.
#[derive(Debug, Clone)]
pub struct FetchCoordinator {
    provider: Arc<dyn WeatherProvider>,
    concurrency: usize,
    retry: RetryPolicy,
}

impl FetchCoordinator {
    pub fn new(provider: Arc<dyn WeatherProvider>, concurrency: usize, retry: RetryPolicy) -> Self {
        Self {
            provider,
            concurrency,
            retry,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Fetch every city and wait for all of them to finish.
    ///
    /// Never fails: cities that could not be fetched end up in
    /// [`FetchReport::failures`], even when that is all of them.
    pub async fn run_all(&self, cities: &[CityQuery]) -> FetchReport {
        tracing::info!(
            cities = cities.len(),
            concurrency = self.concurrency,
            max_attempts = self.retry.max_attempts,
            "Fetching weather"
        );

        let provider = Arc::clone(&self.provider);
        let retry = self.retry.clone();

        let (records, failures) =
            fanout::run_all(cities.to_vec(), self.concurrency, move |city| {
                let provider = Arc::clone(&provider);
                let retry = retry.clone();
                async move { fetch_city(provider.as_ref(), &retry, city).await }
            })
            .await;

        for failure in &failures {
            tracing::warn!(
                city = %failure.city,
                kind = %failure.kind,
                attempts = failure.attempts,
                error = %failure.message,
                "Failed to fetch weather"
            );
        }
        tracing::info!(
            fetched = records.len(),
            failed = failures.len(),
            "Fetch phase complete"
        );

        FetchReport { records, failures }
    }
}

async fn fetch_city(
    provider: &dyn WeatherProvider,
    retry: &RetryPolicy,
    city: CityQuery,
) -> Result<WeatherRecord, FetchFailure> {
    let (outcome, attempts) = retry.run(|_| provider.fetch(&city)).await;

    outcome.map_err(|err| FetchFailure {
        city: city.name.clone(),
        kind: err.kind(),
        attempts,
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog, error::FetchError, error::FetchErrorKind};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// How the fake upstream answers for a given city.
    #[derive(Debug, Clone)]
    enum Script {
        Ok,
        Always(FetchError),
        /// Fail with the error this many times, then succeed.
        FailThenOk(FetchError, usize),
    }

    #[derive(Debug, Default)]
    struct FakeProvider {
        scripts: HashMap<String, Script>,
        calls: Mutex<HashMap<String, usize>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl FakeProvider {
        fn with(scripts: impl IntoIterator<Item = (&'static str, Script)>) -> Self {
            Self {
                scripts: scripts
                    .into_iter()
                    .map(|(c, s)| (c.to_string(), s))
                    .collect(),
                ..Self::default()
            }
        }

        fn calls(&self, city: &str) -> usize {
            self.calls.lock().unwrap().get(city).copied().unwrap_or(0)
        }
    }

    fn record_for(city: &CityQuery) -> WeatherRecord {
        WeatherRecord {
            city: city.name.clone(),
            country: "XX".into(),
            temperature_c: 20.0,
            humidity_pct: 50,
            wind_speed_mps: 1.0,
            description: "few clouds".into(),
            observation_date: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        async fn fetch(&self, city: &CityQuery) -> Result<WeatherRecord, FetchError> {
            let call = {
                let mut calls = self.calls.lock().unwrap();
                let n = calls.entry(city.name.clone()).or_insert(0);
                *n += 1;
                *n
            };

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(2)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match self.scripts.get(&city.name).cloned().unwrap_or(Script::Ok) {
                Script::Ok => Ok(record_for(city)),
                Script::Always(err) => Err(err),
                Script::FailThenOk(err, failures) if call <= failures => Err(err),
                Script::FailThenOk(..) => Ok(record_for(city)),
            }
        }
    }

    fn timeout() -> FetchError {
        FetchError::Network("timed out".into())
    }

    fn unauthorized() -> FetchError {
        FetchError::HttpStatus {
            status: 401,
            body: "Invalid API key".into(),
        }
    }

    fn coordinator(provider: Arc<FakeProvider>, concurrency: usize) -> FetchCoordinator {
        FetchCoordinator::new(provider, concurrency, RetryPolicy::immediate(3))
    }

    #[tokio::test]
    async fn all_cities_succeed() {
        let cities = catalog::asian_capitals();
        let provider = Arc::new(FakeProvider::default());

        let report = coordinator(provider, 8).run_all(&cities).await;

        assert_eq!(report.records.len(), cities.len());
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn unauthorized_everywhere_is_not_an_error() {
        let cities = catalog::asian_capitals();
        let provider = Arc::new(FakeProvider {
            scripts: cities
                .iter()
                .map(|c| (c.name.clone(), Script::Always(unauthorized())))
                .collect(),
            ..FakeProvider::default()
        });

        let report = coordinator(Arc::clone(&provider), 8).run_all(&cities).await;

        assert!(report.records.is_empty());
        assert_eq!(report.failures.len(), cities.len());
        for failure in &report.failures {
            assert_eq!(failure.kind, FetchErrorKind::HttpClient);
            assert_eq!(failure.attempts, 1);
            assert_eq!(provider.calls(&failure.city), 1);
        }
    }

    #[tokio::test]
    async fn timeouts_are_isolated_after_retries() {
        let cities = catalog::asian_capitals();
        let provider = Arc::new(FakeProvider::with([
            ("Tokyo", Script::Always(timeout())),
            ("Seoul", Script::Always(timeout())),
        ]));

        let report = coordinator(Arc::clone(&provider), 5).run_all(&cities).await;

        assert_eq!(report.records.len(), cities.len() - 2);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.total(), cities.len());

        let mut failed: Vec<_> = report.failures.iter().map(|f| f.city.as_str()).collect();
        failed.sort_unstable();
        assert_eq!(failed, ["Seoul", "Tokyo"]);
        assert!(report.failures.iter().all(|f| f.kind == FetchErrorKind::Network && f.attempts == 3));
        assert_eq!(provider.calls("Tokyo"), 3);
        assert_eq!(provider.calls("Bangkok"), 1);
    }

    #[tokio::test]
    async fn transient_server_error_recovers() {
        let cities = vec![CityQuery::new("Hanoi", 21.03, 105.85)];
        let provider = Arc::new(FakeProvider::with([(
            "Hanoi",
            Script::FailThenOk(
                FetchError::HttpStatus {
                    status: 502,
                    body: String::new(),
                },
                2,
            ),
        )]));

        let report = coordinator(Arc::clone(&provider), 1).run_all(&cities).await;

        assert_eq!(report.records.len(), 1);
        assert!(report.failures.is_empty());
        assert_eq!(provider.calls("Hanoi"), 3);
    }

    #[tokio::test]
    async fn parse_errors_are_not_retried() {
        let cities = vec![CityQuery::new("Dili", -8.56, 125.57)];
        let provider = Arc::new(FakeProvider::with([(
            "Dili",
            Script::Always(FetchError::Parse("humidity 140 is outside 0..=100".into())),
        )]));

        let report = coordinator(Arc::clone(&provider), 2).run_all(&cities).await;

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, FetchErrorKind::Parse);
        assert_eq!(provider.calls("Dili"), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn respects_concurrency_limit() {
        let cities = catalog::asian_capitals();
        for limit in [1, 3, 7] {
            let provider = Arc::new(FakeProvider::default());
            let report = coordinator(Arc::clone(&provider), limit).run_all(&cities).await;

            assert_eq!(report.records.len(), cities.len());
            assert!(provider.peak.load(Ordering::SeqCst) <= limit);
        }
    }

    #[tokio::test]
    async fn empty_catalog() {
        let report = coordinator(Arc::new(FakeProvider::default()), 4).run_all(&[]).await;
        assert_eq!(report.total(), 0);
    }
}
