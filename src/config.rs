use std::env;

use anyhow::Context;

use crate::services::catalog::SlotCatalog;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub payment_webhook_secret: String,
    pub completion_sweep_secs: u64,
    pub catalog: SlotCatalog,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let ground = env::var("GROUND_SLOTS").ok();
        let net = env::var("NET_SLOTS").ok();
        let catalog = SlotCatalog::from_lists(ground.as_deref(), net.as_deref())
            .context("invalid GROUND_SLOTS or NET_SLOTS")?;

        Ok(Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "academy.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            payment_webhook_secret: env::var("PAYMENT_WEBHOOK_SECRET").unwrap_or_default(),
            completion_sweep_secs: env::var("COMPLETION_SWEEP_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(300),
            catalog,
        })
    }
}
