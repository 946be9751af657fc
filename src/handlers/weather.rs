use crate::config::{Config, Units};
use crate::error::UserFacing;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("no city given")]
    EmptyCity,
    #[error("no weather API key configured")]
    MissingApiKey,
    #[error("weather service reported {code} for {city:?}")]
    NotFound { city: String, code: String },
    #[error("weather request failed")]
    Request(#[from] reqwest::Error),
    #[error("unexpected weather response")]
    Malformed(#[from] serde_json::Error),
}

impl UserFacing for WeatherError {
    fn user_message(&self) -> String {
        match self {
            WeatherError::EmptyCity | WeatherError::NotFound { .. } => "City not found".to_string(),
            WeatherError::MissingApiKey => "Weather API key is not configured".to_string(),
            WeatherError::Request(_) | WeatherError::Malformed(_) => {
                "Error fetching weather".to_string()
            }
        }
    }
}

#[derive(Deserialize)]
struct WeatherBody {
    main: MainBlock,
    weather: Vec<Condition>,
}

#[derive(Deserialize)]
struct MainBlock {
    temp: serde_json::Number,
}

#[derive(Deserialize)]
struct Condition {
    description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub city: String,
    pub temperature: String,
    pub description: String,
    pub units: Units,
}

impl fmt::Display for WeatherReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}{}, {}",
            self.city,
            self.temperature,
            self.units.symbol(),
            self.description
        )
    }
}

pub struct WeatherClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    units: Units,
}

impl WeatherClient {
    pub fn new(config: &Config) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.weather_base_url.trim_end_matches('/').to_string(),
            api_key: config.weather_api_key.clone().filter(|k| !k.trim().is_empty()),
            units: config.weather_units,
        })
    }

    /// One GET against the current-weather endpoint. No retry.
    pub async fn current(&self, city: &str) -> Result<WeatherReport, WeatherError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(WeatherError::EmptyCity);
        }
        let api_key = self.api_key.as_deref().ok_or(WeatherError::MissingApiKey)?;

        log::debug!("Fetching weather for {}", city);
        let response = self
            .client
            .get(format!("{}/data/2.5/weather", self.base_url))
            .query(&[("q", city), ("appid", api_key), ("units", self.units.as_str())])
            .send()
            .await?;

        // The service reports failures in the body's `cod` field, often
        // alongside a matching HTTP status, so the body is read either way.
        let body: Value = serde_json::from_slice(&response.bytes().await?)?;
        let code = match body.get("cod") {
            Some(code) => code,
            None => {
                return Err(WeatherError::Malformed(serde::de::Error::missing_field("cod")));
            }
        };
        if !is_success(code) {
            return Err(WeatherError::NotFound {
                city: city.to_string(),
                code: code.to_string(),
            });
        }

        let parsed: WeatherBody = serde_json::from_value(body)?;
        let description = match parsed.weather.into_iter().next() {
            Some(condition) => condition.description,
            None => {
                return Err(WeatherError::Malformed(serde::de::Error::invalid_length(
                    0,
                    &"at least one weather condition",
                )));
            }
        };

        Ok(WeatherReport {
            city: city.to_string(),
            temperature: parsed.main.temp.to_string(),
            description,
            units: self.units,
        })
    }
}

/// Only the integer 200 counts; a string `"200"` is treated as a failure.
fn is_success(code: &Value) -> bool {
    code.as_i64() == Some(200)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, key: Option<&str>) -> WeatherClient {
        let config = Config {
            weather_api_key: key.map(str::to_string),
            weather_base_url: server.uri(),
            ..Config::default()
        };
        WeatherClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn reports_temperature_and_description() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("q", "London"))
            .and(query_param("appid", "test-key"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "cod": 200,
                "main": {"temp": 14.5},
                "weather": [{"description": "light rain"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let report = client_for(&server, Some("test-key")).current("London").await.unwrap();
        assert_eq!(report.to_string(), "London: 14.5°C, light rain");
    }

    #[tokio::test]
    async fn string_cod_404_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "cod": "404",
                "message": "city not found"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server, Some("k")).current("Atlantis").await.unwrap_err();
        assert!(matches!(err, WeatherError::NotFound { .. }));
        assert_eq!(err.user_message(), "City not found");
    }

    #[tokio::test]
    async fn string_cod_200_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "cod": "200",
                "name": "London",
                "main": {"temp": 14.5},
                "weather": [{"description": "light rain"}]
            })))
            .mount(&server)
            .await;

        let err = client_for(&server, Some("k")).current("London").await.unwrap_err();
        assert!(matches!(err, WeatherError::NotFound { .. }));
    }

    #[tokio::test]
    async fn garbage_body_is_generic_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server, Some("k")).current("Paris").await.unwrap_err();
        assert!(matches!(err, WeatherError::Malformed(_)));
        assert_eq!(err.user_message(), "Error fetching weather");
    }

    #[tokio::test]
    async fn missing_fields_are_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "cod": 200,
                "main": {"temp": 3},
                "weather": []
            })))
            .mount(&server)
            .await;

        let err = client_for(&server, Some("k")).current("Oslo").await.unwrap_err();
        assert_eq!(err.user_message(), "Error fetching weather");
    }

    #[tokio::test]
    async fn no_request_without_key_or_city() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let err = client_for(&server, None).current("Rome").await.unwrap_err();
        assert!(matches!(err, WeatherError::MissingApiKey));
        let err = client_for(&server, Some("k")).current("   ").await.unwrap_err();
        assert!(matches!(err, WeatherError::EmptyCity));
    }

    #[test]
    fn imperial_report_uses_fahrenheit() {
        let report = WeatherReport {
            city: "Austin".to_string(),
            temperature: "91".to_string(),
            description: "clear sky".to_string(),
            units: Units::Imperial,
        };
        assert_eq!(report.to_string(), "Austin: 91°F, clear sky");
    }
}
