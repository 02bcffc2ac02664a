//! Command execution context
//!
//! Shared setup for the commands that talk to Access Control: load the
//! config, check the connection settings, build the client.

use std::sync::Arc;

use log::debug;

use crate::cli::{GlobalOptions, OutputFormat};
use crate::client::AccessControlClient;
use crate::config::Config;
use crate::error::Result;

/// Context for command execution: the client and runtime options.
pub struct CommandContext {
    /// Access Control client; authenticates on first use
    pub client: Arc<AccessControlClient>,
    pub format: OutputFormat,
}

impl CommandContext {
    /// Load the config and build a client from it.
    ///
    /// # Errors
    /// Returns an error if the config cannot be loaded or lacks the base URL
    /// or credentials.
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let config = Config::load_at(opts.config_ref())?;
        let credentials = config.credentials()?;
        debug!("Connecting to {} as {}", credentials.base_url, credentials.username);
        let client = Arc::new(AccessControlClient::new(credentials)?);

        Ok(Self {
            client,
            format: opts.format,
        })
    }
}
