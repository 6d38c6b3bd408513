use std::env;

/// Runtime settings, read once at startup from the environment.
///
/// Kept as a plain struct (not `Lazy` statics) so tests can build state
/// without touching process-wide environment variables.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Telegram bot token, used to verify Mini App init data.
    pub bot_token: String,
    /// Public base URL of this service, used for payment return URLs.
    /// Trailing slashes are stripped. Empty if not deployed publicly.
    pub public_base: String,
    /// Telegram user id of the bot owner (admin endpoints).
    pub owner_id: i64,
    /// YooKassa shop id. `None` disables payment creation.
    pub yk_shop_id: Option<String>,
    /// YooKassa secret key. `None` disables payment creation.
    pub yk_secret_key: Option<String>,
    /// HTTP listening port.
    pub port: u16,
}

impl Settings {
    /// Reads settings from environment variables.
    ///
    /// `BOT_TOKEN` is required; everything else has a default or is optional.
    pub fn from_env() -> anyhow::Result<Self> {
        let bot_token = env::var("BOT_TOKEN")
            .map_err(|_| anyhow::anyhow!("BOT_TOKEN environment variable is not set"))?;

        let public_base = env::var("PUBLIC_BASE")
            .unwrap_or_default()
            .trim_end_matches('/')
            .to_string();

        let owner_id = env::var("OWNER_ID")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(0);

        let yk_shop_id = env::var("YK_SHOP_ID").ok().filter(|v| !v.is_empty());
        let yk_secret_key = env::var("YK_SECRET_KEY").ok().filter(|v| !v.is_empty());

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8000);

        Ok(Settings {
            bot_token,
            public_base,
            owner_id,
            yk_shop_id,
            yk_secret_key,
            port,
        })
    }

    /// Return URL shown to the user after a redirect payment completes.
    pub fn return_url(&self) -> String {
        if self.public_base.is_empty() {
            "https://t.me".to_string()
        } else {
            format!("{}/thankyou", self.public_base)
        }
    }
}

/// Admin grant limits
pub mod grant {
    /// Maximum gems a single admin grant may credit.
    /// Policy of the grant endpoint, not of the ledger.
    pub const MAX_GRANT_GEMS: u64 = 10_000;
}

/// Network configuration
pub mod network {
    use std::time::Duration;

    /// Request timeout for outbound payment-provider calls (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 15;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_return_url_with_public_base() {
        let settings = Settings {
            bot_token: "t".to_string(),
            public_base: "https://game.example.com".to_string(),
            owner_id: 1,
            yk_shop_id: None,
            yk_secret_key: None,
            port: 8000,
        };
        assert_eq!(settings.return_url(), "https://game.example.com/thankyou");
    }

    #[test]
    fn test_return_url_fallback() {
        let settings = Settings {
            bot_token: "t".to_string(),
            public_base: String::new(),
            owner_id: 1,
            yk_shop_id: None,
            yk_secret_key: None,
            port: 8000,
        };
        assert_eq!(settings.return_url(), "https://t.me");
    }
}
