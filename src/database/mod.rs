mod connection;

pub use connection::{check_health, create_pool, retry_with_linear_backoff};
