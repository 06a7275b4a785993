//! Configuration, paths and logging setup for the account-link demo.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, ProviderKind, DEFAULT_IDENTITY_TOOLKIT_URL, DEFAULT_LOG_LEVEL, DEFAULT_TEST_EMAIL,
    DEFAULT_TEST_PASSWORD,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, log_config};
pub use paths::Paths;
