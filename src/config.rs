use clap::Parser;
use std::time::Duration;
use crate::gateway::GenerationSettings;

// CLI argument structure, every option can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "hr-content-gateway")]
#[command(about = "Rate-limited proxy for AI-generated HR content")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    // Base URL of the OpenAI-compatible completion API
    #[arg(short, long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub upstream_url: String,

    // Completion API key; without it every request fails with 500
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    // Rate limit max requests per window
    #[arg(long, env = "RATE_LIMIT", default_value_t = 5)]
    pub rate_limit: u32,

    // Rate limit window in seconds
    #[arg(long, env = "RATE_WINDOW", default_value_t = 300)]
    pub rate_window: u64,

    // Upstream request timeout in seconds
    #[arg(long, env = "UPSTREAM_TIMEOUT", default_value_t = 30)]
    pub upstream_timeout: u64,

    // Default model (the only model with --fixed-params)
    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4o-mini")]
    pub model: String,

    #[arg(long, env = "MAX_TOKENS", default_value_t = 2000)]
    pub max_tokens: u32,

    #[arg(long, env = "TEMPERATURE", default_value_t = 0.7)]
    pub temperature: f32,

    // Longest accepted prompt, in characters
    #[arg(long, env = "MAX_PROMPT_CHARS", default_value_t = 2000)]
    pub max_prompt_chars: usize,

    // Ignore model / max_tokens / temperature sent by callers
    #[arg(long, env = "FIXED_PARAMS")]
    pub fixed_params: bool,

    // Do not add CORS headers
    #[arg(long, env = "DISABLE_CORS")]
    pub disable_cors: bool,
}

impl Args {
    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.rate_window)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout)
    }

    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            max_prompt_chars: self.max_prompt_chars,
            allow_overrides: !self.fixed_params,
        }
    }
}
