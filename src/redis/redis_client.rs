use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::{info, warn};

/// Result cache on top of a managed Redis connection. Values are stored as JSON.
#[derive(Clone)]
pub struct RedisClient {
    pub connection: ConnectionManager,
}

impl RedisClient {
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url).context("Failed to create Redis client")?;

        let connection = ConnectionManager::new(client)
            .await
            .context("Failed to establish Redis connection")?;

        info!("Successfully connected to Redis");

        Ok(Self { connection })
    }

    pub async fn set<T: serde::Serialize>(&mut self, key: &str, value: &T, expiry_seconds: Option<u64>) -> Result<()> {
        let json = serde_json::to_string(value).context("Failed to serialize value")?;

        let result = match expiry_seconds {
            Some(seconds) => self.connection.set_ex::<_, _, ()>(key, json, seconds).await,
            None => self.connection.set::<_, _, ()>(key, json).await,
        };

        if let Err(e) = result {
            if e.is_connection_dropped() || e.is_io_error() {
                warn!("  Redis connection lost, attempting reconnect...");
            }
            return Err(e).context("Failed to set key");
        }

        Ok(())
    }

    /// `Ok(None)` for a missing key.
    pub async fn get<T: serde::de::DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>> {
        let raw: Option<String> = self.connection.get(key).await.context("Failed to get key")?;

        raw.map(|json| serde_json::from_str(&json).context("Failed to deserialize value"))
            .transpose()
    }

    /// `INFO server` as `field -> value` pairs.
    pub async fn server_info(&mut self) -> Result<Vec<(String, String)>> {
        let raw = redis::cmd("INFO")
            .arg("server")
            .query_async::<String>(&mut self.connection)
            .await
            .context("Redis INFO failed")?;

        Ok(parse_info(&raw))
    }
}

fn parse_info(raw: &str) -> Vec<(String, String)> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_sections_are_flattened() {
        let raw = "# Server\r\nredis_version:7.2.4\r\nredis_mode:standalone\r\n\r\nuptime_in_seconds:42\r\n";
        let info = parse_info(raw);
        assert_eq!(info.len(), 3);
        assert_eq!(info[0], ("redis_version".to_string(), "7.2.4".to_string()));
        assert_eq!(info[2].1, "42");
    }
}
