use thiserror::Error;

#[derive(Debug, Error)]
pub enum TestInfraError {
    #[error("failed to start container: {0}")]
    Container(#[from] testcontainers::TestcontainersError),

    #[error("redis is not reachable: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("postgres did not accept connections after {attempts} attempts: {source}")]
    PostgresUnreachable {
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },
}

pub type Result<T> = std::result::Result<T, TestInfraError>;
