//! Runtime configuration loaded from the environment.
//!
//! Every knob has a documented default so the binary starts with nothing but
//! a database path. `.env` files are honored via `dotenv` in `main.rs`.

use chrono_tz::Tz;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Parse an env var, falling back to a default when unset or unparseable.
fn env_parse<T: FromStr + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Unparseable env var, using default");
            default
        }),
        Err(_) => default,
    }
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// All runtime settings for the assistant core.
#[derive(Debug, Clone)]
pub struct Settings {
    // Server
    pub host: String,
    pub port: u16,
    pub database_url: String,

    // Workspace
    pub workspace_dir: String,
    pub soul_file: String,
    /// Repository whose reflog feeds the VCS activity source. Empty means
    /// fall back to the workspace directory.
    pub vcs_repo_path: String,

    // Timezone & working hours
    pub timezone: Tz,
    pub working_hours_start: u32,
    pub working_hours_end: u32,

    // Scheduler & proactivity
    pub scheduler_enabled: bool,
    pub proactivity_level: u8,
    pub morning_briefing_hour: u32,
    pub evening_review_hour: u32,
    pub activity_digest_hour: u32,
    pub weekly_review_hour: u32,
    pub memory_consolidation_interval_min: u64,
    pub goal_check_interval_hours: u64,
    pub calendar_scan_interval_min: u64,
    pub strategist_interval_min: u64,
    pub screen_observation_retention_days: i64,

    // LLM provider
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,

    // Per-job LLM timeouts
    pub agent_chat_timeout: Duration,
    pub agent_briefing_timeout: Duration,
    pub agent_strategist_timeout: Duration,
    pub consolidation_llm_timeout: Duration,
}

impl Settings {
    /// Build settings from the process environment.
    ///
    /// An invalid `USER_TIMEZONE` falls back to UTC with a warning rather
    /// than failing startup.
    pub fn from_env() -> Self {
        let tz_name = env_string("USER_TIMEZONE", "UTC");
        let timezone = tz_name.parse::<Tz>().unwrap_or_else(|_| {
            tracing::warn!(timezone = %tz_name, "Invalid USER_TIMEZONE, falling back to UTC");
            Tz::UTC
        });

        Self {
            host: env_string("HOST", "127.0.0.1"),
            port: env_parse("PORT", 8700u16),
            database_url: env_string("DATABASE_URL", "sqlite://aegis.db?mode=rwc"),

            workspace_dir: env_string("WORKSPACE_DIR", "./data"),
            soul_file: env_string("SOUL_FILE", "soul.md"),
            vcs_repo_path: env_string("VCS_REPO_PATH", ""),

            timezone,
            working_hours_start: env_parse("WORKING_HOURS_START", 9u32),
            working_hours_end: env_parse("WORKING_HOURS_END", 17u32),

            scheduler_enabled: env_parse("SCHEDULER_ENABLED", true),
            proactivity_level: env_parse("PROACTIVITY_LEVEL", 3u8).clamp(1, 5),
            morning_briefing_hour: env_parse("MORNING_BRIEFING_HOUR", 8u32),
            evening_review_hour: env_parse("EVENING_REVIEW_HOUR", 21u32),
            activity_digest_hour: env_parse("ACTIVITY_DIGEST_HOUR", 18u32),
            weekly_review_hour: env_parse("WEEKLY_REVIEW_HOUR", 17u32),
            memory_consolidation_interval_min: env_parse("MEMORY_CONSOLIDATION_INTERVAL_MIN", 30u64),
            goal_check_interval_hours: env_parse("GOAL_CHECK_INTERVAL_HOURS", 4u64),
            calendar_scan_interval_min: env_parse("CALENDAR_SCAN_INTERVAL_MIN", 15u64),
            strategist_interval_min: env_parse("STRATEGIST_INTERVAL_MIN", 15u64),
            screen_observation_retention_days: env_parse("SCREEN_OBSERVATION_RETENTION_DAYS", 30i64),

            llm_api_key: env_string("LLM_API_KEY", ""),
            llm_base_url: env_string("LLM_BASE_URL", "https://openrouter.ai/api/v1"),
            llm_model: env_string("LLM_MODEL", "anthropic/claude-sonnet-4"),

            agent_chat_timeout: Duration::from_secs(env_parse("AGENT_CHAT_TIMEOUT", 120u64)),
            agent_briefing_timeout: Duration::from_secs(env_parse("AGENT_BRIEFING_TIMEOUT", 60u64)),
            agent_strategist_timeout: Duration::from_secs(env_parse("AGENT_STRATEGIST_TIMEOUT", 60u64)),
            consolidation_llm_timeout: Duration::from_secs(env_parse("CONSOLIDATION_LLM_TIMEOUT", 30u64)),
        }
    }

    /// Repository path for the VCS source, defaulting to the workspace.
    pub fn vcs_repo_or_workspace(&self) -> &str {
        if self.vcs_repo_path.is_empty() {
            &self.workspace_dir
        } else {
            &self.vcs_repo_path
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8700,
            database_url: "sqlite::memory:".to_string(),
            workspace_dir: "./data".to_string(),
            soul_file: "soul.md".to_string(),
            vcs_repo_path: String::new(),
            timezone: Tz::UTC,
            working_hours_start: 9,
            working_hours_end: 17,
            scheduler_enabled: true,
            proactivity_level: 3,
            morning_briefing_hour: 8,
            evening_review_hour: 21,
            activity_digest_hour: 18,
            weekly_review_hour: 17,
            memory_consolidation_interval_min: 30,
            goal_check_interval_hours: 4,
            calendar_scan_interval_min: 15,
            strategist_interval_min: 15,
            screen_observation_retention_days: 30,
            llm_api_key: String::new(),
            llm_base_url: "https://openrouter.ai/api/v1".to_string(),
            llm_model: "anthropic/claude-sonnet-4".to_string(),
            agent_chat_timeout: Duration::from_secs(120),
            agent_briefing_timeout: Duration::from_secs(60),
            agent_strategist_timeout: Duration::from_secs(60),
            consolidation_llm_timeout: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_defaults_when_env_empty() {
        env::remove_var("USER_TIMEZONE");
        env::remove_var("WORKING_HOURS_START");
        let settings = Settings::from_env();
        assert_eq!(settings.timezone, Tz::UTC);
        assert_eq!(settings.working_hours_start, 9);
        assert_eq!(settings.morning_briefing_hour, 8);
    }

    #[test]
    #[serial]
    fn test_valid_timezone() {
        env::set_var("USER_TIMEZONE", "America/New_York");
        let settings = Settings::from_env();
        assert_eq!(settings.timezone, chrono_tz::America::New_York);
        env::remove_var("USER_TIMEZONE");
    }

    #[test]
    #[serial]
    fn test_invalid_timezone_falls_back_to_utc() {
        env::set_var("USER_TIMEZONE", "Mars/Olympus_Mons");
        let settings = Settings::from_env();
        assert_eq!(settings.timezone, Tz::UTC);
        env::remove_var("USER_TIMEZONE");
    }

    #[test]
    #[serial]
    fn test_proactivity_level_clamped() {
        env::set_var("PROACTIVITY_LEVEL", "9");
        let settings = Settings::from_env();
        assert_eq!(settings.proactivity_level, 5);
        env::remove_var("PROACTIVITY_LEVEL");
    }

    #[test]
    #[serial]
    fn test_vcs_repo_fallback() {
        env::remove_var("VCS_REPO_PATH");
        let settings = Settings::from_env();
        assert_eq!(settings.vcs_repo_or_workspace(), settings.workspace_dir);
    }
}
