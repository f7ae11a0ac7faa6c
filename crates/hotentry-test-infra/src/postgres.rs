use std::time::Duration;

use crate::{Result, TestInfraError};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::ImageExt;
use testcontainers::{ContainerAsync, GenericImage};
use typed_builder::TypedBuilder;

const POSTGRES_PORT: u16 = 5432;

#[derive(Debug, Clone, TypedBuilder)]
pub struct PostgresConfig {
    #[builder(default = "hotentry".to_string())]
    database: String,
    #[builder(default = "hotentry".to_string())]
    username: String,
    #[builder(default = "hotentry".to_string())]
    password: String,
    /// Pool size handed out by [`PostgresServer::pool`].
    #[builder(default = 5)]
    max_connections: u32,
    #[builder(default = 20)]
    connect_attempts: u32,
    #[builder(default = Duration::from_millis(500))]
    retry_delay: Duration,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A throwaway Postgres for store integration tests.
pub struct PostgresServer {
    container: ContainerAsync<GenericImage>,
    config: PostgresConfig,
}

impl PostgresServer {
    pub async fn new(config: PostgresConfig) -> Result<Self> {
        let container = GenericImage::new("postgres", "17-alpine")
            .with_exposed_port(POSTGRES_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stderr(
                "database system is ready to accept connections",
            ))
            .with_env_var("POSTGRES_DB", config.database.as_str())
            .with_env_var("POSTGRES_USER", config.username.as_str())
            .with_env_var("POSTGRES_PASSWORD", config.password.as_str())
            .start()
            .await?;

        Ok(Self { container, config })
    }

    pub async fn database_url(&self) -> Result<String> {
        let host = self.container.get_host().await?;
        let port = self.container.get_host_port_ipv4(POSTGRES_PORT).await?;
        Ok(format!(
            "postgres://{}:{}@{}:{}/{}",
            self.config.username, self.config.password, host, port, self.config.database
        ))
    }

    /// Opens a pool, retrying while the server finishes starting up.
    ///
    /// The image logs readiness once for its init pass and again for the
    /// real start, so the wait strategy can return before connections work.
    pub async fn pool(&self) -> Result<PgPool> {
        let url = self.database_url().await?;
        let attempts = self.config.connect_attempts.max(1);

        let mut attempt = 1;
        loop {
            match PgPoolOptions::new()
                .max_connections(self.config.max_connections)
                .connect(&url)
                .await
            {
                Ok(pool) => return Ok(pool),
                Err(source) if attempt >= attempts => {
                    return Err(TestInfraError::PostgresUnreachable { attempts, source });
                }
                Err(_) => {
                    attempt += 1;
                    tokio::time::sleep(self.config.retry_delay).await;
                }
            }
        }
    }

    pub fn container(&self) -> &ContainerAsync<GenericImage> {
        &self.container
    }
}
