//! CLI command implementations.

mod demo;
mod run;

pub use demo::demo;
pub use run::interactive;

use account_link_engine::{AuthProvider, IdentityToolkitProvider, MemoryAuthProvider};
use anyhow::Result;
use link_config_and_utils::{Config, ProviderKind};
use std::sync::Arc;

/// Build the authentication backend selected in `config`.
pub fn build_provider(config: &Config) -> Result<Arc<dyn AuthProvider>> {
    let provider: Arc<dyn AuthProvider> = match config.provider {
        ProviderKind::Memory => Arc::new(MemoryAuthProvider::new()),
        ProviderKind::IdentityToolkit => Arc::new(IdentityToolkitProvider::from_config(config)?),
    };
    Ok(provider)
}
