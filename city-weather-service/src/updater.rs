use common::errors::AppError;
use common::models::City;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, instrument, warn};

use crate::api_client::OpenMeteoClient;
use crate::store::CityStore;

pub const DATA_NOT_AVAILABLE: &str = "Data not available";
pub const REQUEST_TIMED_OUT: &str = "Request timed out";

/// Outcome of refreshing one city
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Temperature(f64),
    Unavailable,
    TimedOut,
    Failed(String),
}

impl Reading {
    fn from_result(result: Result<Option<f64>, AppError>) -> Self {
        match result {
            Ok(Some(temperature)) => Reading::Temperature(round2(temperature)),
            Ok(None) => Reading::Unavailable,
            Err(e) if e.is_timeout() => Reading::TimedOut,
            Err(e) => Reading::Failed(e.to_string()),
        }
    }

    pub fn into_json(self) -> Value {
        match self {
            Reading::Temperature(t) => Value::from(t),
            Reading::Unavailable => Value::from(DATA_NOT_AVAILABLE),
            Reading::TimedOut => Value::from(REQUEST_TIMED_OUT),
            Reading::Failed(message) => Value::from(format!("Error: {}", message)),
        }
    }
}

/// Round to two decimals from the exact stored value, ties to even
fn round2(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

/// Refreshes the temperature of every stored city
pub struct WeatherUpdater {
    store: Arc<CityStore>,
    weather_client: Arc<OpenMeteoClient>,
    semaphore: Arc<Semaphore>,
    concurrency: usize,
    cancellation_token: CancellationToken,
}

impl WeatherUpdater {
    pub fn new(
        store: Arc<CityStore>,
        weather_client: Arc<OpenMeteoClient>,
        concurrency: usize,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            store,
            weather_client,
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
            concurrency: concurrency.max(1),
            cancellation_token,
        }
    }

    /// Fetch every city and map country -> reading, in store order.
    ///
    /// With a concurrency of 1 cities are fetched one after another in store
    /// order; above that they fan out behind a semaphore.
    /// A failing city never aborts the batch; its error is reported inline.
    #[instrument(skip(self))]
    pub async fn update_all(&self) -> Map<String, Value> {
        let cities = self.store.list().await;
        info!(count = cities.len(), "Starting weather update");

        let readings = if self.concurrency == 1 {
            self.fetch_sequentially(cities).await
        } else {
            self.fetch_concurrently(cities).await
        };

        let mut report = Map::new();
        let mut successful = 0;
        let mut failed = 0;

        for (country, reading) in readings {
            if matches!(reading, Reading::Temperature(_)) {
                successful += 1;
            } else {
                failed += 1;
            }
            report.insert(country, reading.into_json());
        }

        info!(total = successful + failed, successful, failed, "Weather update completed");
        report
    }

    async fn fetch_sequentially(&self, cities: Vec<City>) -> Vec<(String, Reading)> {
        let mut readings = Vec::with_capacity(cities.len());

        for city in cities {
            let reading = tokio::select! {
                biased;
                _ = self.cancellation_token.cancelled() => cancelled(),
                reading = refresh_city(&city, &self.weather_client) => reading,
            };
            readings.push((city.country, reading));
        }

        readings
    }

    async fn fetch_concurrently(&self, cities: Vec<City>) -> Vec<(String, Reading)> {
        let mut handles = Vec::with_capacity(cities.len());

        for city in cities {
            let semaphore = self.semaphore.clone();
            let weather_client = self.weather_client.clone();
            let cancel = self.cancellation_token.clone();
            let country = city.country.clone();

            let handle = tokio::spawn(
                async move {
                    if cancel.is_cancelled() {
                        return cancelled();
                    }

                    let _permit = match semaphore.acquire().await {
                        Ok(p) => p,
                        Err(_) => return Reading::Failed("Semaphore closed".to_string()),
                    };

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => cancelled(),
                        reading = refresh_city(&city, &weather_client) => reading,
                    }
                }
                .in_current_span(),
            );

            handles.push((country, handle));
        }

        let mut readings = Vec::with_capacity(handles.len());

        for (country, handle) in handles {
            let reading = match handle.await {
                Ok(reading) => reading,
                Err(e) => {
                    error!(country = %country, error = %e, "Task join error");
                    Reading::Failed(e.to_string())
                }
            };
            readings.push((country, reading));
        }

        readings
    }
}

fn cancelled() -> Reading {
    Reading::Failed("Request cancelled".to_string())
}

#[instrument(skip(city, weather_client), fields(country = %city.country))]
async fn refresh_city(city: &City, weather_client: &OpenMeteoClient) -> Reading {
    let result = weather_client
        .get_temperature(&city.country, city.latitude, city.longitude)
        .await;

    if let Err(e) = &result {
        warn!(country = %city.country, error = %e, "Weather fetch failed");
    }

    Reading::from_result(result)
}
