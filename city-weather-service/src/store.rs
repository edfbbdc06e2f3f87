use common::errors::AppError;
use common::models::City;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};

/// In-memory list of cities, mirrored to a CSV file on every mutation.
///
/// The file is rewritten in full (header `country,capital,latitude,longitude`)
/// while the write lock is held, so concurrent mutations never interleave
/// their rewrites.
pub struct CityStore {
    path: PathBuf,
    cities: RwLock<Vec<City>>,
}

impl CityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cities: RwLock::new(Vec::new()),
        }
    }

    /// Create the store and load whatever the backing file holds.
    /// Load failures are logged and leave the store with the rows read so far.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let store = Self::new(path);
        if let Err(e) = store.load().await {
            error!(path = %store.path.display(), error = %e, "Error loading cities");
        }
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn list(&self) -> Vec<City> {
        self.cities.read().await.clone()
    }

    #[instrument(skip(self, city), fields(country = %city.country))]
    pub async fn add(&self, city: City) -> Result<(), AppError> {
        let mut cities = self.cities.write().await;

        let mut updated = cities.clone();
        updated.push(city);
        write_csv(&self.path, &updated).await?;
        *cities = updated;

        info!(count = cities.len(), "City added");
        Ok(())
    }

    /// Remove every city whose country matches `country`, ignoring case.
    /// Returns how many records were removed.
    #[instrument(skip(self))]
    pub async fn delete(&self, country: &str) -> Result<usize, AppError> {
        let mut cities = self.cities.write().await;

        let before = cities.len();
        let remaining: Vec<City> = cities
            .iter()
            .filter(|city| !city.matches_country(country))
            .cloned()
            .collect();
        let removed = before - remaining.len();

        if removed == 0 {
            return Err(AppError::not_found(format!(
                "City with country {} not found",
                country
            )));
        }

        write_csv(&self.path, &remaining).await?;
        *cities = remaining;

        info!(removed, count = cities.len(), "Cities deleted");
        Ok(removed)
    }

    /// Append the rows of the backing file to the in-memory list.
    /// A missing file is not an error. Returns the number of rows loaded.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<usize, AppError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    path = %self.path.display(),
                    "City file not found, starting with an empty city list"
                );
                return Ok(0);
            }
            Err(e) => return Err(e.into()),
        };

        let mut cities = self.cities.write().await;
        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let mut loaded = 0;

        for row in reader.deserialize::<City>() {
            cities.push(row?);
            loaded += 1;
        }

        info!(loaded, "Cities loaded");
        Ok(loaded)
    }

    pub async fn save(&self) -> Result<(), AppError> {
        let cities = self.cities.read().await;
        write_csv(&self.path, &cities).await
    }

    /// Write the current list to another file, leaving the backing file alone
    pub async fn save_to(&self, path: impl AsRef<Path>) -> Result<(), AppError> {
        let cities = self.cities.read().await;
        write_csv(path.as_ref(), &cities).await
    }
}

async fn write_csv(path: &Path, cities: &[City]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if cities.is_empty() {
        writer.write_record(["country", "capital", "latitude", "longitude"])?;
    }
    for city in cities {
        writer.serialize(city)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::storage(format!("Failed to flush CSV: {}", e)))?;

    tokio::fs::write(path, bytes).await?;
    Ok(())
}
