use std::time::Duration;

use anyhow::{Context, bail};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::FetchError,
    model::{CityQuery, WeatherRecord},
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

#[derive(Debug, Clone)]
pub struct OpenWeatherProviderBuilder {
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl OpenWeatherProviderBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Per-attempt timeout covering connect, request and body.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> anyhow::Result<OpenWeatherProvider> {
        if self.api_key.trim().is_empty() {
            bail!("OpenWeather API key is empty");
        }

        let http = Client::builder()
            .timeout(self.timeout)
            .build()
            .context("Failed to build HTTP client for OpenWeather")?;

        Ok(OpenWeatherProvider {
            api_key: self.api_key,
            base_url: self.base_url,
            http,
        })
    }
}

impl OpenWeatherProvider {
    pub fn builder(api_key: impl Into<String>) -> OpenWeatherProviderBuilder {
        OpenWeatherProviderBuilder {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn new(api_key: impl Into<String>) -> anyhow::Result<Self> {
        Self::builder(api_key).build()
    }

    async fn fetch_current(&self, city: &CityQuery) -> Result<WeatherRecord, FetchError> {
        let res = self
            .http
            .get(&self.base_url)
            .query(&[("lat", city.latitude), ("lon", city.longitude)])
            .query(&[("appid", self.api_key.as_str()), ("units", "metric")])
            .send()
            .await
            .map_err(|e| network_error("send request to OpenWeather", &e))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| network_error("read OpenWeather response body", &e))?;

        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        parse_current(&city.name, &body)
    }
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: i64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    sys: OwSys,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

/// Turn a current-weather body into a record for `city`.
fn parse_current(city: &str, body: &str) -> Result<WeatherRecord, FetchError> {
    let parsed: OwCurrentResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::Parse(format!("OpenWeather current JSON: {e}")))?;

    let description = parsed
        .weather
        .into_iter()
        .next()
        .map(|w| w.description)
        .ok_or_else(|| FetchError::Parse("OpenWeather response has an empty weather list".into()))?;

    let humidity_pct = u8::try_from(parsed.main.humidity)
        .ok()
        .filter(|h| *h <= 100)
        .ok_or_else(|| {
            FetchError::Parse(format!(
                "humidity {} is outside 0..=100",
                parsed.main.humidity
            ))
        })?;

    Ok(WeatherRecord {
        city: city.to_string(),
        country: parsed.sys.country,
        temperature_c: parsed.main.temp,
        humidity_pct,
        wind_speed_mps: parsed.wind.speed,
        description,
        observation_date: Utc::now().date_naive(),
    })
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch(&self, city: &CityQuery) -> Result<WeatherRecord, FetchError> {
        self.fetch_current(city).await
    }
}

fn network_error(action: &str, err: &reqwest::Error) -> FetchError {
    let reason = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    FetchError::Network(format!("Failed to {action}: {reason}: {err}"))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const WEATHER_PATH: &str = "/data/2.5/weather";

    fn tokyo() -> CityQuery {
        CityQuery::new("Tokyo", 35.69, 139.69)
    }

    fn tokyo_body() -> serde_json::Value {
        json!({
            "name": "Tokyo",
            "sys": { "country": "JP" },
            "main": { "temp": 15.2, "feels_like": 14.1, "humidity": 60 },
            "wind": { "speed": 3.1 },
            "weather": [{ "main": "Clear", "description": "clear sky" }]
        })
    }

    fn provider_for(server: &MockServer) -> OpenWeatherProvider {
        OpenWeatherProvider::builder("TEST_KEY")
            .base_url(format!("{}{WEATHER_PATH}", server.uri()))
            .timeout(Duration::from_millis(300))
            .build()
            .expect("provider should build")
    }

    async fn serve(server: &MockServer, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(WEATHER_PATH))
            .respond_with(response)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn fetch_tokyo_builds_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(WEATHER_PATH))
            .and(query_param("lat", "35.69"))
            .and(query_param("lon", "139.69"))
            .and(query_param("appid", "TEST_KEY"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tokyo_body()))
            .expect(1)
            .mount(&server)
            .await;

        let before = Utc::now().date_naive();
        let record = provider_for(&server).fetch(&tokyo()).await.unwrap();
        let after = Utc::now().date_naive();

        assert_eq!(record.city, "Tokyo");
        assert_eq!(record.country, "JP");
        assert_eq!(record.temperature_c, 15.2);
        assert_eq!(record.humidity_pct, 60);
        assert_eq!(record.wind_speed_mps, 3.1);
        assert_eq!(record.description, "clear sky");
        assert!(record.observation_date == before || record.observation_date == after);
    }

    #[tokio::test]
    async fn unauthorized_is_a_client_error() {
        let server = MockServer::start().await;
        serve(
            &server,
            ResponseTemplate::new(401).set_body_json(json!({ "cod": 401, "message": "Invalid API key" })),
        )
        .await;

        let err = provider_for(&server).fetch(&tokyo()).await.unwrap_err();

        match &err {
            FetchError::HttpStatus { status, body } => {
                assert_eq!(*status, 401);
                assert!(body.contains("Invalid API key"));
            }
            other => panic!("expected HttpStatus, got {other:?}"),
        }
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn server_error_is_retryable() {
        let server = MockServer::start().await;
        serve(&server, ResponseTemplate::new(503)).await;

        let err = provider_for(&server).fetch(&tokyo()).await.unwrap_err();
        assert!(matches!(err, FetchError::HttpStatus { status: 503, .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn slow_response_times_out_as_network_error() {
        let server = MockServer::start().await;
        serve(
            &server,
            ResponseTemplate::new(200)
                .set_body_json(tokyo_body())
                .set_delay(Duration::from_secs(2)),
        )
        .await;

        let err = provider_for(&server).fetch(&tokyo()).await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)), "got {err:?}");
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn missing_country_is_a_parse_error() {
        let server = MockServer::start().await;
        let mut body = tokyo_body();
        body["sys"] = json!({});
        serve(&server, ResponseTemplate::new(200).set_body_json(body)).await;

        let err = provider_for(&server).fetch(&tokyo()).await.unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)), "got {err:?}");
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn non_json_body_is_a_parse_error() {
        let server = MockServer::start().await;
        serve(&server, ResponseTemplate::new(200).set_body_string("<html>oops</html>")).await;

        let err = provider_for(&server).fetch(&tokyo()).await.unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[test]
    fn humidity_out_of_range_is_rejected() {
        for humidity in [101, 255, 300, -1] {
            let mut body = tokyo_body();
            body["main"]["humidity"] = json!(humidity);

            let err = parse_current("Tokyo", &body.to_string()).unwrap_err();
            assert!(
                matches!(&err, FetchError::Parse(msg) if msg.contains("humidity")),
                "humidity {humidity} gave {err:?}"
            );
        }
    }

    #[test]
    fn humidity_bounds_are_accepted() {
        for humidity in [0, 100] {
            let mut body = tokyo_body();
            body["main"]["humidity"] = json!(humidity);

            let record = parse_current("Tokyo", &body.to_string()).unwrap();
            assert_eq!(i64::from(record.humidity_pct), humidity);
        }
    }

    #[test]
    fn empty_weather_list_is_rejected() {
        let mut body = tokyo_body();
        body["weather"] = json!([]);

        let err = parse_current("Tokyo", &body.to_string()).unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[test]
    fn non_numeric_temperature_is_rejected() {
        let mut body = tokyo_body();
        body["main"]["temp"] = json!("warm");

        assert!(matches!(
            parse_current("Tokyo", &body.to_string()),
            Err(FetchError::Parse(_))
        ));
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let err = OpenWeatherProvider::new("").unwrap_err();
        assert!(err.to_string().contains("API key is empty"));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(250);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }
}
