use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Missing API key: {env_var} is not set for {provider_name}")]
    MissingApiKey {
        provider_name: String,
        env_var: String,
    },

    #[error("Unknown provider {0:?}")]
    Unknown(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Provider {
    #[default]
    OpenRouter,
    Grok,
    Openai,
    Gemini,
}

pub struct ProviderConfig {
    pub api_url: &'static str,
    pub model: &'static str,
    pub env_var: &'static str,
}

impl Provider {
    pub fn config(&self) -> ProviderConfig {
        match self {
            Provider::OpenRouter => ProviderConfig {
                api_url: "https://openrouter.ai/api/v1/chat/completions",
                model: "meta-llama/llama-3.1-8b-instruct:free",
                env_var: "OPENROUTER_API_KEY",
            },
            Provider::Grok => ProviderConfig {
                api_url: "https://api.x.ai/v1/chat/completions",
                model: "grok-4-fast",
                env_var: "XAI_API_KEY",
            },
            Provider::Openai => ProviderConfig {
                api_url: "https://api.openai.com/v1/chat/completions",
                model: "gpt-5.1",
                env_var: "OPENAI_API_KEY",
            },
            Provider::Gemini => ProviderConfig {
                api_url: "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions",
                model: "gemini-3-pro",
                env_var: "GEMINI_API_KEY",
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenRouter => "OpenRouter",
            Provider::Grok => "Grok",
            Provider::Openai => "OpenAI",
            Provider::Gemini => "Gemini",
        }
    }

    /// Validate that the API key is set for this provider
    pub fn validate_api_key(&self) -> Result<String, ProviderError> {
        let config = self.config();
        std::env::var(config.env_var).map_err(|_| ProviderError::MissingApiKey {
            provider_name: self.name().to_string(),
            env_var: config.env_var.to_string(),
        })
    }
}

impl FromStr for Provider {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openrouter" => Ok(Provider::OpenRouter),
            "grok" | "xai" => Ok(Provider::Grok),
            "openai" => Ok(Provider::Openai),
            "gemini" => Ok(Provider::Gemini),
            other => Err(ProviderError::Unknown(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_names_case_insensitively() {
        assert_eq!("OpenRouter".parse::<Provider>().unwrap(), Provider::OpenRouter);
        assert_eq!("xai".parse::<Provider>().unwrap(), Provider::Grok);
        assert_eq!(" gemini ".parse::<Provider>().unwrap(), Provider::Gemini);
        assert!("claude".parse::<Provider>().is_err());
    }

    #[test]
    fn every_provider_speaks_chat_completions() {
        for provider in [
            Provider::OpenRouter,
            Provider::Grok,
            Provider::Openai,
            Provider::Gemini,
        ] {
            assert!(provider.config().api_url.ends_with("/chat/completions"));
        }
    }
}
