use std::sync::Arc;
use crate::error::{GatewayError, Result};
use crate::models::{ChatCompletionRequest, ChatMessage, GenerationRequest, GenerationResult};
use crate::upstream::CompletionBackend;

pub const SYSTEM_PROMPT: &str = "You are a professional HR and career expert. Generate high-quality, detailed content based on the user's requirements.";

// Generation parameters, either defaults or the only values allowed
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub max_prompt_chars: usize,
    // false: ignore model / max_tokens / temperature from callers
    pub allow_overrides: bool,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 2000,
            temperature: 0.7,
            max_prompt_chars: 2000,
            allow_overrides: true,
        }
    }
}

/// Validates generation requests and forwards them to the completion backend.
pub struct CompletionGateway {
    backend: Arc<dyn CompletionBackend>,
    credential: Option<String>,
    settings: GenerationSettings,
}

impl CompletionGateway {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        credential: Option<String>,
        settings: GenerationSettings,
    ) -> Self {
        let credential = credential
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        Self {
            backend,
            credential,
            settings,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credential.is_some()
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub fn ensure_configured(&self) -> Result<()> {
        self.credential().map(|_| ())
    }

    fn credential(&self) -> Result<&str> {
        self.credential
            .as_deref()
            .ok_or_else(|| GatewayError::Configuration("API key not configured".to_string()))
    }

    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationResult> {
        let credential = self.credential()?;

        let prompt = self.validate(&request)?;
        let upstream_request = self.build_request(prompt, &request);

        let response = self.backend.complete(credential, &upstream_request).await?;

        let content = response
            .first_content()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                GatewayError::UnexpectedResponse("no completion text in first choice".to_string())
            })?;

        Ok(GenerationResult {
            content,
            usage: response.usage,
        })
    }

    // Checks run in order, first failure wins
    fn validate<'a>(&self, request: &'a GenerationRequest) -> Result<&'a str> {
        let prompt = request
            .prompt
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| GatewayError::Validation("Prompt is required".to_string()))?;

        if request.kind.as_deref().is_none_or(|k| k.trim().is_empty()) {
            return Err(GatewayError::Validation("Type is required".to_string()));
        }

        if prompt.chars().count() > self.settings.max_prompt_chars {
            return Err(GatewayError::Validation("Prompt too long".to_string()));
        }

        Ok(prompt)
    }

    fn build_request(&self, prompt: &str, request: &GenerationRequest) -> ChatCompletionRequest {
        let settings = &self.settings;
        let (model, max_tokens, temperature) = if settings.allow_overrides {
            (
                request.model.clone().unwrap_or_else(|| settings.model.clone()),
                request.max_tokens.unwrap_or(settings.max_tokens),
                request.temperature.unwrap_or(settings.temperature),
            )
        } else {
            (settings.model.clone(), settings.max_tokens, settings.temperature)
        };

        ChatCompletionRequest {
            model,
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)],
            max_tokens,
            temperature,
        }
    }
}
