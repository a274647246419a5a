//! Built-in presets for OpenAI-compatible completion providers.
//!
//! A preset supplies the base URL and the environment variable that usually
//! holds the provider's API key, so a config only has to name the provider.

#[derive(Debug, Clone)]
pub struct ProviderPreset {
    pub name: &'static str,
    pub base_url: &'static str,
    pub default_api_key_env: &'static str,
}

const PRESETS: &[ProviderPreset] = &[
    ProviderPreset {
        name: "uniapi",
        base_url: "https://api.uniapi.ai/v1",
        default_api_key_env: "UNIAPI_API_KEY",
    },
    ProviderPreset {
        name: "openai",
        base_url: "https://api.openai.com/v1",
        default_api_key_env: "OPENAI_API_KEY",
    },
    ProviderPreset {
        name: "openrouter",
        base_url: "https://openrouter.ai/api/v1",
        default_api_key_env: "OPENROUTER_API_KEY",
    },
    ProviderPreset {
        name: "fireworks",
        base_url: "https://api.fireworks.ai/inference/v1",
        default_api_key_env: "FIREWORKS_API_KEY",
    },
    ProviderPreset {
        name: "grok",
        base_url: "https://api.x.ai/v1",
        default_api_key_env: "XAI_API_KEY",
    },
    ProviderPreset {
        name: "together",
        base_url: "https://api.together.xyz/v1",
        default_api_key_env: "TOGETHER_API_KEY",
    },
    ProviderPreset {
        name: "groq",
        base_url: "https://api.groq.com/openai/v1",
        default_api_key_env: "GROQ_API_KEY",
    },
    ProviderPreset {
        name: "deepseek",
        base_url: "https://api.deepseek.com/v1",
        default_api_key_env: "DEEPSEEK_API_KEY",
    },
];

impl ProviderPreset {
    #[must_use]
    pub fn from_name(name: &str) -> Option<&'static ProviderPreset> {
        let name = name.to_lowercase();
        PRESETS.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn all() -> &'static [ProviderPreset] {
        PRESETS
    }

    #[must_use]
    pub fn names() -> String {
        PRESETS.iter().map(|p| p.name).collect::<Vec<_>>().join(", ")
    }
}
