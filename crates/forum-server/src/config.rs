use std::path::PathBuf;

use anyhow::{Context, bail};

use forum_api::Settings;
use forum_core::{BanExpiry, PenaltyPolicy};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub settings: Settings,
    pub ban_sweep_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let jwt_secret = get("FORUM_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("FORUM_JWT_SECRET is unset or still a placeholder");
        }

        let port: u16 = get("FORUM_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("FORUM_PORT must be a port number")?;

        let admin_usernames = get("FORUM_ADMIN_USERNAMES")
            .map(|v| {
                v.split(',')
                    .map(|name| name.trim().to_string())
                    .filter(|name| !name.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let comments_require_approval = parse_bool(get("FORUM_COMMENTS_REQUIRE_APPROVAL"))
            .context("FORUM_COMMENTS_REQUIRE_APPROVAL must be true or false")?;

        let defaults = PenaltyPolicy::default();
        let false_report_threshold = match get("FORUM_FALSE_REPORT_THRESHOLD") {
            Some(v) => v
                .parse()
                .context("FORUM_FALSE_REPORT_THRESHOLD must be a whole number")?,
            None => defaults.false_report_threshold,
        };
        if false_report_threshold == 0 {
            bail!("FORUM_FALSE_REPORT_THRESHOLD must be at least 1");
        }
        let ban_days: i64 = get("FORUM_REPORT_BAN_DAYS")
            .unwrap_or_else(|| "7".into())
            .parse()
            .context("FORUM_REPORT_BAN_DAYS must be a whole number")?;
        let ban_expiry: BanExpiry = match get("FORUM_BAN_EXPIRY") {
            Some(v) => v.parse()?,
            None => BanExpiry::default(),
        };

        let ban_sweep_secs = get("FORUM_BAN_SWEEP_SECS")
            .and_then(|v| v.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(3600); // 1 hour

        Ok(Config {
            host: get("FORUM_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_path: get("FORUM_DB_PATH")
                .unwrap_or_else(|| "forum.db".into())
                .into(),
            jwt_secret,
            settings: Settings {
                admin_usernames,
                comments_require_approval,
                penalty: PenaltyPolicy {
                    false_report_threshold,
                    ban_duration: chrono::Duration::days(ban_days.max(1)),
                    ban_expiry,
                },
            },
            ban_sweep_secs,
        })
    }
}

fn parse_bool(raw: Option<String>) -> anyhow::Result<bool> {
    let Some(raw) = raw else {
        return Ok(false);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("not a boolean: {}", other),
    }
}
