use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::SeatingPlan;

/// Кеш одобренных планов секции для запросов студентов "моё место".
///
/// Записи лежат под номером поколения секции. `invalidate_section` увеличивает
/// поколение, поэтому список, прочитанный из БД до решения или удаления и
/// записанный после, попадает под старый ключ и больше не читается.
#[async_trait]
pub trait PlanCache: Send + Sync {
    /// Текущее поколение секции (0, если ещё не было инвалидаций).
    async fn generation(&self, section: Uuid) -> AppResult<u64>;

    async fn get_approved(&self, section: Uuid, generation: u64) -> AppResult<Option<Vec<SeatingPlan>>>;

    async fn put_approved(&self, section: Uuid, generation: u64, plans: &[SeatingPlan]) -> AppResult<()>;

    async fn invalidate_section(&self, section: Uuid) -> AppResult<()>;
}

pub fn generation_key(section: Uuid) -> String {
    format!("seating:approved:{}:gen", section)
}

pub fn approved_key(section: Uuid, generation: u64) -> String {
    format!("seating:approved:{}:{}", section, generation)
}

/// Redis-реализация. Кеш только ускоряет чтение: при ошибке сервис идёт в БД.
#[derive(Clone)]
pub struct SeatingCache {
    conn: MultiplexedConnection,
    ttl_seconds: u64,
}

impl SeatingCache {
    /// Открывает мультиплексированное соединение и проверяет его `PING`.
    pub async fn connect(redis_url: &str, ttl_seconds: u64) -> redis::RedisResult<Self> {
        let client = Client::open(redis_url)?;
        let mut conn = client.get_multiplexed_tokio_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(Self { conn, ttl_seconds })
    }
}

#[async_trait]
impl PlanCache for SeatingCache {
    async fn generation(&self, section: Uuid) -> AppResult<u64> {
        let mut conn = self.conn.clone();
        let generation: Option<u64> = conn.get(generation_key(section)).await?;
        Ok(generation.unwrap_or(0))
    }

    async fn get_approved(&self, section: Uuid, generation: u64) -> AppResult<Option<Vec<SeatingPlan>>> {
        let mut conn = self.conn.clone();
        let data: Option<String> = conn.get(approved_key(section, generation)).await?;
        let Some(data) = data else {
            return Ok(None);
        };

        let plans: Vec<SeatingPlan> = serde_json::from_str(&data)
            .map_err(|e| AppError::Internal(format!("cached seating plans unreadable: {}", e)))?;
        debug!("Seating cache hit for section {} (generation {})", section, generation);
        Ok(Some(plans))
    }

    async fn put_approved(&self, section: Uuid, generation: u64, plans: &[SeatingPlan]) -> AppResult<()> {
        let data = serde_json::to_string(plans)
            .map_err(|e| AppError::Internal(format!("failed to serialize seating plans: {}", e)))?;
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(approved_key(section, generation), data, self.ttl_seconds).await?;
        Ok(())
    }

    async fn invalidate_section(&self, section: Uuid) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let generation: u64 = conn.incr(generation_key(section), 1).await?;
        // Старая запись и так истечёт по TTL
        let _: () = conn.del(approved_key(section, generation - 1)).await?;
        info!("Seating cache for section {} moved to generation {}", section, generation);
        Ok(())
    }
}
