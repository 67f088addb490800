use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub emr_api_url: String,
    pub emr_api_key: String,
    pub jwt_secret: String,
    pub facility_id: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            emr_api_url: env::var("EMR_API_URL")
                .unwrap_or_else(|_| {
                    warn!("EMR_API_URL not set, using empty value");
                    String::new()
                }),
            emr_api_key: env::var("EMR_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("EMR_API_KEY not set, using empty value");
                    String::new()
                }),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, using empty value");
                    String::new()
                }),
            facility_id: env::var("FACILITY_ID")
                .unwrap_or_else(|_| {
                    warn!("FACILITY_ID not set, using empty value");
                    String::new()
                }),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.emr_api_url.is_empty()
            && !self.jwt_secret.is_empty()
            && !self.facility_id.is_empty()
    }
}
