// src/database.rs
mod memory;
mod models;

use async_trait::async_trait;
use sqlx::{
    postgres::{PgArguments, PgPoolOptions},
    query::Query,
    PgPool, Postgres,
};
use tracing::info;

use crate::{config::DatabaseConfig, errors::StoreError, models::FlightInfo};
use models::{tracked_to_ns, FlightInfoRow, FLIGHT_INFO_COLUMNS};

pub use memory::MemoryStore;

/// New position for a stored record
#[derive(Debug, Clone, PartialEq)]
pub struct PositionUpdate {
    pub id: String,
    pub latitude: f32,
    pub longitude: f32,
}

impl PositionUpdate {
    pub fn new(id: impl Into<String>, latitude: f32, longitude: f32) -> Self {
        Self {
            id: id.into(),
            latitude,
            longitude,
        }
    }
}

/// Persistence boundary for tracked aircraft
///
/// `replace_all` and `commit_positions` are atomic: concurrent readers never
/// observe a partially applied replace or batch. Implementations may enforce
/// field limits themselves, but callers validate before writing.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Replace the entire content, returning the number of records written
    async fn replace_all(&self, records: Vec<FlightInfo>) -> Result<usize, StoreError>;

    /// Add a single record, failing on a duplicate id
    async fn insert(&self, record: FlightInfo) -> Result<(), StoreError>;

    async fn get(&self, id: &str) -> Result<Option<FlightInfo>, StoreError>;

    async fn all_records(&self) -> Result<Vec<FlightInfo>, StoreError>;

    /// Apply position updates as one batch, returning how many records
    /// actually changed. Updates for unknown ids are ignored.
    async fn commit_positions(&self, updates: Vec<PositionUpdate>) -> Result<usize, StoreError>;
}

/// Postgres backed record store
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

const INSERT_FLIGHT_INFO: &str = "INSERT INTO flight_infos (
        id, registration, first_seen, tracked_ns, latitude, longitude, last_update,
        speed, speed_type, heading, model, model_description, manufacturer, year,
        operator, vertical_speed, aircraft_type, departure, destination, grounded,
        call_sign, has_picture, flights_count
    ) VALUES (
        $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
        $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23
    )";

const UPDATE_POSITION: &str = "UPDATE flight_infos
    SET latitude = $2, longitude = $3
    WHERE id = $1 AND (latitude <> $2 OR longitude <> $3)";

impl Database {
    /// Wrap an existing pool, running pending migrations
    pub async fn new(pool: PgPool) -> Result<Self, StoreError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        info!(
            "Connecting to database, max_connections={}",
            config.max_connections
        );
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;
        Self::new(pool).await
    }

    fn insert_query(info: &FlightInfo) -> Query<'_, Postgres, PgArguments> {
        sqlx::query(INSERT_FLIGHT_INFO)
            .bind(&info.id)
            .bind(&info.registration)
            .bind(info.first_seen)
            .bind(tracked_to_ns(info.tracked))
            .bind(info.latitude)
            .bind(info.longitude)
            .bind(info.last_update)
            .bind(info.speed)
            .bind(info.speed_type.code())
            .bind(info.heading)
            .bind(&info.model)
            .bind(&info.model_description)
            .bind(&info.manufacturer)
            .bind(info.year)
            .bind(&info.operator)
            .bind(info.vertical_speed)
            .bind(info.aircraft_type.code())
            .bind(&info.departure)
            .bind(&info.destination)
            .bind(info.grounded)
            .bind(&info.call_sign)
            .bind(info.has_picture)
            .bind(info.flights_count)
    }
}

fn map_insert_error(id: &str, error: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_error) = &error {
        if db_error.is_unique_violation() {
            return StoreError::Duplicate(id.to_string());
        }
    }
    StoreError::Database(error)
}

#[async_trait]
impl RecordStore for Database {
    async fn replace_all(&self, records: Vec<FlightInfo>) -> Result<usize, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM flight_infos")
            .execute(&mut *tx)
            .await?;

        for info in &records {
            Self::insert_query(info)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_insert_error(&info.id, e))?;
        }

        tx.commit().await?;
        Ok(records.len())
    }

    async fn insert(&self, record: FlightInfo) -> Result<(), StoreError> {
        Self::insert_query(&record)
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_error(&record.id, e))?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<FlightInfo>, StoreError> {
        let row: Option<FlightInfoRow> = sqlx::query_as(&format!(
            "SELECT {FLIGHT_INFO_COLUMNS} FROM flight_infos WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(FlightInfo::from))
    }

    async fn all_records(&self) -> Result<Vec<FlightInfo>, StoreError> {
        let rows: Vec<FlightInfoRow> = sqlx::query_as(&format!(
            "SELECT {FLIGHT_INFO_COLUMNS} FROM flight_infos ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(FlightInfo::from).collect())
    }

    async fn commit_positions(&self, updates: Vec<PositionUpdate>) -> Result<usize, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut changed = 0;

        for update in &updates {
            let result = sqlx::query(UPDATE_POSITION)
                .bind(&update.id)
                .bind(update.latitude)
                .bind(update.longitude)
                .execute(&mut *tx)
                .await?;
            if result.rows_affected() > 0 {
                changed += 1;
            }
        }

        tx.commit().await?;
        Ok(changed)
    }
}
