//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::sync::Arc;

use hardinfinity::domain::DEFAULT_PROGRAM_LENGTH;
use hardinfinity::domain::ports::IdentityVerifier;
use hardinfinity::outbound::persistence::DbPool;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) identity: Arc<dyn IdentityVerifier>,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) program_length: u32,
}

impl ServerConfig {
    /// Construct a configuration authenticating callers with `identity`.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, identity: Arc<dyn IdentityVerifier>) -> Self {
        Self {
            bind_addr,
            identity,
            db_pool: None,
            program_length: DEFAULT_PROGRAM_LENGTH,
        }
    }

    /// Attach a database connection pool for persistence adapters.
    ///
    /// Without a pool every repository is served by the in-memory store.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Days in a program, used for completion rates.
    #[must_use]
    pub fn with_program_length(mut self, program_length: u32) -> Self {
        self.program_length = program_length;
        self
    }
}
