//! Gemini (Google) gateway.

use crate::error::{parse_retry_after, sanitize_error_message, NanoChefError, Result};
use crate::gateway::provider::AiGateway;
use crate::gateway::types::{EditResult, GatewayKind};
use crate::intake::ImagePayload;
use crate::recipe::{Recipe, RecipeSet};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Instant;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Text model used for recipe suggestion unless overridden.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";

const RECIPE_PROMPT: &str = r#"You are an experienced chef. Look at the ingredients in this photo and suggest 3 different meals that can be cooked mostly from them.

For every meal give:
- title: a short, appealing name
- cookingTime: an estimate such as "25 minutes"
- difficulty: one of Easy, Medium or Hard
- ingredients: everything needed, one item per entry
- instructions: the steps in order, one step per entry
- visualDescription: one sentence describing the plated dish, written for an image generator (e.g. "A rustic bowl of pasta with fresh basil and rising steam, professional food photography")

Answer with a JSON array only."#;

/// Gemini image model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Nano Banana - Gemini 2.5 Flash Image (fast, economical).
    #[default]
    NanoBanana,
    /// Nano Banana Pro - Gemini 3 Pro Image (highest quality).
    NanoBananaPro,
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NanoBanana => "gemini-2.5-flash-image",
            Self::NanoBananaPro => "nano-banana-pro-preview",
        }
    }
}

/// Builder for GeminiGateway.
#[derive(Debug, Clone, Default)]
pub struct GeminiGatewayBuilder {
    api_key: Option<String>,
    text_model: Option<String>,
    image_model: GeminiModel,
    base_url: Option<String>,
}

impl GeminiGatewayBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `GOOGLE_API_KEY`, then `API_KEY`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the model used for recipe suggestion.
    pub fn text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = Some(model.into());
        self
    }

    /// Sets the model used for dish synthesis and editing.
    pub fn image_model(mut self, model: GeminiModel) -> Self {
        self.image_model = model;
        self
    }

    /// Overrides the API root, e.g. for a proxy.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Builds the gateway.
    ///
    /// A missing key is not an error here; every call will fail with
    /// [`NanoChefError::Auth`] instead.
    pub fn build(self) -> GeminiGateway {
        let api_key = self
            .api_key
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .or_else(|| std::env::var("API_KEY").ok())
            .filter(|k| !k.trim().is_empty());

        if api_key.is_none() {
            tracing::warn!("no Gemini API key configured; every request will fail");
        }

        GeminiGateway {
            client: reqwest::Client::new(),
            api_key,
            text_model: self
                .text_model
                .unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
            image_model: self.image_model,
            base_url: self
                .base_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }
}

/// Gateway backed by the Gemini `generateContent` API.
pub struct GeminiGateway {
    client: reqwest::Client,
    api_key: Option<String>,
    text_model: String,
    image_model: GeminiModel,
    base_url: String,
}

impl GeminiGateway {
    /// Creates a new `GeminiGatewayBuilder`.
    pub fn builder() -> GeminiGatewayBuilder {
        GeminiGatewayBuilder::new()
    }

    /// Model used for recipe suggestion.
    pub fn text_model(&self) -> &str {
        &self.text_model
    }

    /// Model used for synthesis and editing.
    pub fn image_model(&self) -> GeminiModel {
        self.image_model
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| NanoChefError::Auth("GOOGLE_API_KEY not set and no API key provided".into()))
    }

    async fn generate_content(&self, model: &str, body: &GeminiRequest) -> Result<GeminiResponse> {
        let api_key = self.api_key()?;
        let start = Instant::now();
        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text, &headers));
        }

        let gemini_response: GeminiResponse = response.json().await?;
        tracing::debug!(
            model,
            duration_ms = start.elapsed().as_millis() as u64,
            candidates = gemini_response.candidates.len(),
            "generateContent complete"
        );
        Ok(gemini_response)
    }
}

#[async_trait]
impl AiGateway for GeminiGateway {
    async fn suggest_recipes(&self, image: &ImagePayload) -> Result<RecipeSet> {
        let body = GeminiRequest::recipes(image);
        let response = self.generate_content(&self.text_model, &body).await?;
        check_blocked(&response)?;

        let text = response_text(&response).ok_or_else(|| {
            NanoChefError::UnexpectedResponse("No response text generated".into())
        })?;
        let recipes = parse_recipes(&text)?;
        tracing::debug!(count = recipes.len(), "parsed recipe suggestions");
        Ok(recipes)
    }

    async fn synthesize_dish_image(&self, description: &str) -> Result<Option<ImagePayload>> {
        let body = GeminiRequest::dish_image(description);
        let response = self
            .generate_content(self.image_model.as_str(), &body)
            .await?;

        if let Err(e) = check_blocked(&response) {
            tracing::debug!("dish image not produced: {e}");
            return Ok(None);
        }
        Ok(first_image(&response))
    }

    async fn edit_image(&self, image: &ImagePayload, instruction: &str) -> Result<EditResult> {
        let body = GeminiRequest::edit(image, instruction);
        let response = self
            .generate_content(self.image_model.as_str(), &body)
            .await?;
        check_blocked(&response)?;
        Ok(edit_result(&response))
    }

    fn kind(&self) -> GatewayKind {
        GatewayKind::Gemini
    }

    async fn health_check(&self) -> Result<()> {
        let api_key = self.api_key()?;
        let url = format!("{}/models/{}", self.base_url, self.image_model.as_str());

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", api_key)
            .send()
            .await?;

        match response.status().as_u16() {
            401 | 403 => Err(NanoChefError::Auth("Invalid API key".into())),
            404 => Err(NanoChefError::InvalidRequest(
                "Model not found. Verify the model name is correct.".into(),
            )),
            s if !(200..300).contains(&s) => Err(NanoChefError::Api {
                status: s,
                message: "Health check failed".into(),
            }),
            _ => Ok(()),
        }
    }
}

fn parse_error(status: u16, text: &str, headers: &reqwest::header::HeaderMap) -> NanoChefError {
    let text = sanitize_error_message(text);
    if status == 402 {
        return NanoChefError::Billing(
            "Gemini billing issue: enable billing at https://aistudio.google.com".into(),
        );
    }
    if status == 404 {
        return NanoChefError::InvalidRequest(
            "Model not found. Verify the model name is correct.".into(),
        );
    }
    if status == 429 {
        let retry_after = parse_retry_after(headers).map(std::time::Duration::from_secs);
        return NanoChefError::RateLimited { retry_after };
    }
    if status == 401 || status == 403 {
        return NanoChefError::Auth(text);
    }
    let lower = text.to_lowercase();
    if lower.contains("safety")
        || lower.contains("blocked")
        || lower.contains("content_policy")
        || lower.contains("prohibited")
    {
        return NanoChefError::ContentBlocked(text);
    }
    NanoChefError::Api {
        status,
        message: text,
    }
}

/// Prompt-level blocks and safety finishes arrive as HTTP 200.
fn check_blocked(response: &GeminiResponse) -> Result<()> {
    if let Some(ref feedback) = response.prompt_feedback {
        if let Some(ref reason) = feedback.block_reason {
            let msg = feedback
                .block_reason_message
                .clone()
                .unwrap_or_else(|| format!("Prompt blocked: {}", reason));
            return Err(NanoChefError::ContentBlocked(msg));
        }
    }

    let finish_reason = response
        .candidates
        .first()
        .and_then(|c| c.finish_reason.as_deref());

    match finish_reason {
        Some(
            reason @ ("SAFETY"
            | "IMAGE_SAFETY"
            | "IMAGE_PROHIBITED_CONTENT"
            | "IMAGE_RECITATION"
            | "RECITATION"
            | "PROHIBITED_CONTENT"
            | "BLOCKLIST"),
        ) => Err(NanoChefError::ContentBlocked(format!(
            "Content blocked by Gemini safety filter: {}",
            reason
        ))),
        _ => Ok(()),
    }
}

fn first_candidate_parts(response: &GeminiResponse) -> &[GeminiPartResponse] {
    response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|c| c.parts.as_slice())
        .unwrap_or_default()
}

/// Concatenated non-thought text of the first candidate.
fn response_text(response: &GeminiResponse) -> Option<String> {
    let text: String = first_candidate_parts(response)
        .iter()
        .filter(|p| !p.thought)
        .filter_map(|p| p.text.as_deref())
        .collect();

    (!text.trim().is_empty()).then_some(text)
}

fn first_image(response: &GeminiResponse) -> Option<ImagePayload> {
    first_candidate_parts(response)
        .iter()
        .find_map(|p| p.inline_data.as_ref())
        .map(InlineData::to_payload)
}

/// Last image part and last text part win.
fn edit_result(response: &GeminiResponse) -> EditResult {
    let mut result = EditResult::default();
    for part in first_candidate_parts(response) {
        if let Some(ref inline) = part.inline_data {
            result.image = Some(inline.to_payload());
        } else if let Some(ref text) = part.text {
            if !part.thought && !text.is_empty() {
                result.text = Some(text.clone());
            }
        }
    }
    result
}

fn parse_recipes(text: &str) -> Result<RecipeSet> {
    let trimmed = strip_code_fence(text.trim());
    let recipes: Vec<Recipe> = serde_json::from_str(trimmed)?;
    Ok(RecipeSet::new(recipes))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn dish_prompt(description: &str) -> String {
    format!(
        "Professional food photography of {}, appetizing, soft natural light, shallow depth of field, photorealistic",
        description.trim()
    )
}

fn recipe_schema() -> serde_json::Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "title": { "type": "STRING" },
                "cookingTime": { "type": "STRING" },
                "difficulty": { "type": "STRING" },
                "ingredients": { "type": "ARRAY", "items": { "type": "STRING" } },
                "instructions": { "type": "ARRAY", "items": { "type": "STRING" } },
                "visualDescription": { "type": "STRING" }
            },
            "required": [
                "title",
                "cookingTime",
                "difficulty",
                "ingredients",
                "instructions",
                "visualDescription"
            ]
        }
    })
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - can be text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

impl GeminiRequestPart {
    fn image(image: &ImagePayload) -> Self {
        Self::InlineData {
            inline_data: GeminiInlineData {
                mime_type: image.content_type.clone(),
                data: image.data.clone(),
            },
        }
    }

    fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

impl GeminiRequest {
    fn recipes(image: &ImagePayload) -> Self {
        Self {
            contents: vec![GeminiContent {
                parts: vec![
                    GeminiRequestPart::image(image),
                    GeminiRequestPart::text(RECIPE_PROMPT),
                ],
            }],
            generation_config: GeminiConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(recipe_schema()),
                ..Default::default()
            },
        }
    }

    fn dish_image(description: &str) -> Self {
        Self {
            contents: vec![GeminiContent {
                parts: vec![GeminiRequestPart::text(dish_prompt(description))],
            }],
            generation_config: GeminiConfig {
                response_modalities: Some(vec!["IMAGE".to_string()]),
                ..Default::default()
            },
        }
    }

    fn edit(image: &ImagePayload, instruction: &str) -> Self {
        Self {
            contents: vec![GeminiContent {
                parts: vec![
                    GeminiRequestPart::image(image),
                    GeminiRequestPart::text(instruction),
                ],
            }],
            generation_config: GeminiConfig {
                response_modalities: Some(vec!["TEXT".to_string(), "IMAGE".to_string()]),
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

impl InlineData {
    fn to_payload(&self) -> ImagePayload {
        ImagePayload::new(self.data.clone(), self.mime_type.clone())
    }
}
