use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{domain::UserId, errors::Error, texts::Texts, Result};

/// Typed configuration for the relay.
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,
    pub operator_ids: Vec<UserId>,

    // Relay behavior
    pub legacy_reply_lookup: bool,
    pub drop_pending_updates: bool,
    pub texts: Texts,

    // Outbound throttling
    pub throttle_enabled: bool,
    pub global_min_interval: Duration,
    pub per_chat_min_interval: Duration,

    // Audit
    pub audit_log_path: Option<PathBuf>,
    pub audit_log_json: bool,
}

impl Config {
    /// Load config from `.env` (if present) and the process environment.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        // Required
        let telegram_bot_token = get("BOT_TOKEN").ok_or_else(|| {
            Error::Config("BOT_TOKEN environment variable is required".to_string())
        })?;
        let operator_ids = parse_operator_ids(get("ADMIN_ID").as_deref().unwrap_or_default())?;

        let legacy_reply_lookup =
            parse_bool(get("RELAY_LEGACY_REPLY_LOOKUP").as_deref()).unwrap_or(false);
        let drop_pending_updates =
            parse_bool(get("RELAY_DROP_PENDING_UPDATES").as_deref()).unwrap_or(true);

        let defaults = Texts::default();
        let texts = Texts {
            welcome: get("RELAY_WELCOME_TEXT").unwrap_or(defaults.welcome),
            confirmation: get("RELAY_CONFIRMATION_TEXT").unwrap_or(defaults.confirmation),
            start_prompt: get("RELAY_START_PROMPT_TEXT").unwrap_or(defaults.start_prompt),
            failure: get("RELAY_FAILURE_TEXT").unwrap_or(defaults.failure),
            ..defaults
        };

        // Throttling (defaults stay under Telegram flood limits)
        let throttle_enabled =
            parse_bool(get("RELAY_THROTTLE_ENABLED").as_deref()).unwrap_or(true);
        let global_min_interval = Duration::from_millis(
            parse_u64(get("RELAY_GLOBAL_MIN_INTERVAL_MS").as_deref()).unwrap_or(40),
        );
        let per_chat_min_interval = Duration::from_millis(
            parse_u64(get("RELAY_PER_CHAT_MIN_INTERVAL_MS").as_deref()).unwrap_or(1050),
        );

        // Audit logging
        let audit_log_path = get("AUDIT_LOG_PATH").map(PathBuf::from);
        let audit_log_json = parse_bool(get("AUDIT_LOG_JSON").as_deref()).unwrap_or(false);

        Ok(Self {
            telegram_bot_token,
            operator_ids,
            legacy_reply_lookup,
            drop_pending_updates,
            texts,
            throttle_enabled,
            global_min_interval,
            per_chat_min_interval,
            audit_log_path,
            audit_log_json,
        })
    }
}

/// Parse the comma separated operator list.
///
/// Every entry must be a numeric id; an empty list is rejected because a
/// relay without operators has nowhere to forward to.
pub fn parse_operator_ids(raw: &str) -> Result<Vec<UserId>> {
    let mut out = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let id = part
            .parse::<i64>()
            .map_err(|_| Error::Config(format!("ADMIN_ID contains an invalid id: {part:?}")))?;
        if !out.contains(&UserId(id)) {
            out.push(UserId(id));
        }
    }

    if out.is_empty() {
        return Err(Error::Config(
            "ADMIN_ID must list at least one operator id".to_string(),
        ));
    }
    Ok(out)
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn parse_bool(v: Option<&str>) -> Option<bool> {
    v.map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn parse_u64(v: Option<&str>) -> Option<u64> {
    v.and_then(|s| s.trim().parse::<u64>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
