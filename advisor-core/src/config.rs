use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ASSISTANT_ID is not set")]
    MissingAssistantId,

    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,
}

/// Process-wide configuration, built once at startup and passed by reference.
#[derive(Clone, PartialEq, Eq)]
pub struct AdvisorConfig {
    pub assistant_id: String,
    pub api_key: String,
    pub api_base: String,
    pub starters: Vec<String>,
    pub welcome_blurb: String,
    pub welcome_audio_url: Option<String>,
}

impl std::fmt::Debug for AdvisorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdvisorConfig")
            .field("assistant_id", &self.assistant_id)
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("starters", &self.starters)
            .field("welcome_blurb", &self.welcome_blurb)
            .field("welcome_audio_url", &self.welcome_audio_url)
            .finish()
    }
}

impl AdvisorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading from an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let assistant_id =
            non_empty(lookup("ASSISTANT_ID")).ok_or(ConfigError::MissingAssistantId)?;
        let api_key = non_empty(lookup("OPENAI_API_KEY")).ok_or(ConfigError::MissingApiKey)?;
        let api_base =
            non_empty(lookup("OPENAI_API_BASE")).unwrap_or_else(|| DEFAULT_API_BASE.into());

        // A malformed starter list degrades to no starters rather than
        // failing startup.
        let starters = lookup("CHAT_STARTERS")
            .and_then(|raw| serde_json::from_str::<Vec<String>>(&raw).ok())
            .unwrap_or_default();

        Ok(Self {
            assistant_id,
            api_key,
            api_base,
            starters,
            welcome_blurb: lookup("WELCOME_BLURB").unwrap_or_default(),
            welcome_audio_url: non_empty(lookup("WELCOME_AUDIO")),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
