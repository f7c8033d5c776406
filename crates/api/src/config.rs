use linkup_core::error::CoreError;
use linkup_core::otp::DEFAULT_OTP_TTL_SECS;
use linkup_core::plans::PlanCatalog;

/// Runtime settings for the linkup API process, read once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed to call the API from a browser.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// Drain window for in-flight requests after SIGTERM or Ctrl-C.
    pub shutdown_timeout_secs: u64,
    /// Seconds an issued OTP stays valid.
    pub otp_ttl_secs: i64,
    /// Optional JSON file replacing the built-in plan tiers.
    pub plan_catalog_file: Option<String>,
}

impl ServerConfig {
    /// Read settings from the environment, falling back to local defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    /// | `OTP_TTL_SECS`         | `300`                      |
    /// | `PLAN_CATALOG_FILE`    | unset (built-in tiers)     |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let otp_ttl_secs: i64 = std::env::var("OTP_TTL_SECS")
            .unwrap_or_else(|_| DEFAULT_OTP_TTL_SECS.to_string())
            .parse()
            .expect("OTP_TTL_SECS must be a valid i64");
        assert!(otp_ttl_secs > 0, "OTP_TTL_SECS must be positive");

        let plan_catalog_file = std::env::var("PLAN_CATALOG_FILE")
            .ok()
            .filter(|s| !s.trim().is_empty());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            otp_ttl_secs,
            plan_catalog_file,
        }
    }

    /// Load the plan catalog: the override file if configured, otherwise the
    /// built-in tiers.
    pub fn load_plan_catalog(&self) -> Result<PlanCatalog, CoreError> {
        match &self.plan_catalog_file {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    CoreError::Internal(format!("Cannot read plan catalog '{path}': {e}"))
                })?;
                PlanCatalog::from_json(&raw)
            }
            None => Ok(PlanCatalog::default()),
        }
    }
}
