//! Exchange Session Credentials
//!
//! The exchange authenticates every request with an application key
//! plus a session token. Both come from environment variables
//! (BETFAIR_APP_KEY, BETFAIR_SESSION_TOKEN) and are never read from
//! the config file. Session renewal is handled outside this process;
//! a 401 here means the operator needs to refresh the token.

use anyhow::{Context, Result};

/// Exchange API credential pair.
pub struct ExchangeAuth {
    /// Application key from BETFAIR_APP_KEY.
    app_key: String,
    /// Session token from BETFAIR_SESSION_TOKEN.
    session_token: String,
}

impl ExchangeAuth {
    /// Load credentials from environment variables.
    ///
    /// Required env vars: BETFAIR_APP_KEY, BETFAIR_SESSION_TOKEN.
    pub fn from_env() -> Result<Self> {
        let app_key = std::env::var("BETFAIR_APP_KEY").context("BETFAIR_APP_KEY not set")?;
        let session_token =
            std::env::var("BETFAIR_SESSION_TOKEN").context("BETFAIR_SESSION_TOKEN not set")?;

        Ok(Self {
            app_key,
            session_token,
        })
    }

    /// Application key header value.
    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    /// Session token header value.
    pub fn session_token(&self) -> &str {
        &self.session_token
    }
}
