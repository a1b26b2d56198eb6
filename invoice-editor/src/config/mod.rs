use service_core::config::{self as core_config, get_env, get_flag};
use service_core::error::AppError;
use std::env;
use std::time::Duration;

use crate::editor::EditorSettings;
use crate::models::Currency;
use crate::print::PrintHeader;
use crate::services::line_items::RemovalPolicy;

#[derive(Debug, Clone)]
pub struct MongoConfig {
    /// Unset outside production means "keep invoices in memory".
    pub uri: Option<String>,
    pub database: String,
}

#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
    pub initial_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EditorConfig {
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub auth: AuthConfig,
    pub editor: EditorSettings,
    pub print: PrintHeader,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            common: core_config::Config::default(),
            mongodb: MongoConfig {
                uri: None,
                database: "invoice_db".to_string(),
            },
            auth: AuthConfig::default(),
            editor: EditorSettings::default(),
            print: PrintHeader::default(),
        }
    }
}

impl EditorConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common = core_config::Config::load()?;
        let is_prod = common.is_prod();
        let defaults = EditorSettings::default();

        let mongo_uri = if is_prod {
            Some(get_env("MONGODB_URI", None, is_prod)?)
        } else {
            env::var("MONGODB_URI").ok()
        };

        let removal_policy: RemovalPolicy = get_env("REMOVAL_POLICY", Some("keep_last"), false)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let default_currency: Currency = get_env("DEFAULT_CURRENCY", Some("MYR"), false)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let ack_ms: u64 = get_env("SAVE_ACK_MS", Some("2000"), false)?
            .parse()
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid SAVE_ACK_MS: {}", e)))?;

        let print_defaults = PrintHeader::default();
        let print = PrintHeader {
            issuer_name: env::var("ISSUER_NAME").unwrap_or(print_defaults.issuer_name),
            issuer_address: env::var("ISSUER_ADDRESS")
                .map(|lines| lines.split('|').map(|l| l.trim().to_string()).collect())
                .unwrap_or(print_defaults.issuer_address),
        };

        Ok(EditorConfig {
            mongodb: MongoConfig {
                uri: mongo_uri,
                database: get_env("MONGODB_DATABASE", Some("invoice_db"), false)?,
            },
            auth: AuthConfig {
                jwt_secret: env::var("AUTH_JWT_SECRET").ok(),
                initial_token: env::var("INITIAL_AUTH_TOKEN").ok(),
            },
            editor: EditorSettings {
                app_id: get_env("APP_ID", Some(defaults.app_id.as_str()), false)?,
                scope_by_user: get_flag("SCOPE_BY_USER", defaults.scope_by_user)?,
                removal_policy,
                ack_timeout: Duration::from_millis(ack_ms),
                seed_first_item: get_flag("SEED_FIRST_ITEM", defaults.seed_first_item)?,
                default_currency,
            },
            print,
            common,
        })
    }
}
