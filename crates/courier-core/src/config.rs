use std::{env, fs, path::Path};

use crate::{errors::Error, Result};

/// Typed configuration, resolved once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,

    /// The single operator receiving relayed inquiries. `None` puts the
    /// bot into a "not configured" state: every inquiry is answered with a
    /// notice and nothing is relayed.
    pub admin_id: Option<i64>,

    /// Bound on the correlation table; oldest entries are evicted first.
    pub correlation_capacity: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() || telegram_bot_token.contains(' ') {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let admin_id = env_i64("TELEGRAM_ADMIN_ID");

        // One forward writes two rows, so the bound never goes below that.
        let correlation_capacity = env_usize("CORRELATION_CAPACITY").unwrap_or(4096).max(2);

        Ok(Self {
            telegram_bot_token,
            admin_id,
            correlation_capacity,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

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
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_i64(key: &str) -> Option<i64> {
    env_str(key).and_then(|s| s.trim().parse::<i64>().ok())
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key).and_then(|s| s.trim().parse::<usize>().ok())
}
