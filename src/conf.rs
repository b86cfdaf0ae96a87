use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// What happens to a live countdown when a session is resumed after the
/// process restarted mid-question. Elapsed time is not tracked durably, so
/// `RestartFull` is the default; `PreserveElapsed` trusts the snapshot's
/// last written remainder instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResumePolicy {
    RestartFull,
    PreserveElapsed,
}

impl Default for ResumePolicy {
    fn default() -> Self {
        ResumePolicy::RestartFull
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// Key for the generation backend. Absent means the CLI refuses to
    /// start an interview; the library itself never reads it.
    #[serde(default)]
    pub gemini_api_key: String,
    #[serde(default = "default_model")]
    pub gemini_model: String,
    #[serde(default = "default_base_url")]
    pub gemini_base_url: String,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub timer_resume_policy: ResumePolicy,
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
}

fn default_model() -> String {
    crate::ai::gemini::DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    crate::ai::gemini::DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_snapshot_path() -> String {
    "chrono-interviewer.json".to_string()
}

impl Settings {
    /// Reads settings from the environment (`GEMINI_API_KEY`,
    /// `TIMER_RESUME_POLICY`, ...); every field has a default except the
    /// API key.
    pub fn new() -> Result<Self, ConfigError> {
        let conf = Config::builder()
            .add_source(Environment::default())
            .build()?;
        conf.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            gemini_model: default_model(),
            gemini_base_url: default_base_url(),
            request_timeout_secs: default_timeout(),
            timer_resume_policy: ResumePolicy::default(),
            snapshot_path: default_snapshot_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resume_policy_deserializes_kebab_case() {
        let policy: ResumePolicy = serde_json::from_str("\"restart-full\"").unwrap();
        assert_eq!(policy, ResumePolicy::RestartFull);
        let policy: ResumePolicy = serde_json::from_str("\"preserve-elapsed\"").unwrap();
        assert_eq!(policy, ResumePolicy::PreserveElapsed);
    }

    #[test]
    fn defaults_are_sensible() {
        let settings = Settings::default();
        assert_eq!(settings.timer_resume_policy, ResumePolicy::RestartFull);
        assert_eq!(settings.request_timeout_secs, 30);
        assert!(!settings.gemini_model.is_empty());
    }
}
