// SPDX-License-Identifier: MIT
//
// AI enhancement — optional polish of a theme's description and colors.
//
// The pipeline only sees the `Enhancer` trait: one prompt in, one reply
// out, within a deadline. `HttpEnhancer` speaks the OpenAI-compatible
// chat-completions protocol over `ureq`. Replies are treated as untrusted
// text: a description is trimmed and capped, and color suggestions are
// accepted only as `key: #hex` lines naming keys the theme already has.

use std::fmt::Write as _;
use std::sync::LazyLock;
use std::time::Duration;

use hf_color::ColorValue;
use hf_theme::ThemeDocument;
use hf_theme::merge::normalize_color;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;

use crate::config::AiConfig;
use crate::deadline::Deadline;

/// Longest description written back into a theme, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 200;

const SYSTEM_PROMPT: &str =
    "You are a designer of VS Code color themes. Answer with the requested content only.";

static SUGGESTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"`?([A-Za-z][A-Za-z0-9]*(?:\.[A-Za-z0-9]+)+)`?\s*:\s*`?(#[0-9A-Fa-f]{6}(?:[0-9A-Fa-f]{2})?)\b")
        .unwrap_or_else(|err| panic!("suggestion regex must compile: {err}"))
});

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum EnhanceError {
    #[error("enhancement deadline passed")]
    Timeout,
    #[error("service answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unreadable response: {0}")]
    Decode(#[source] std::io::Error),
    #[error("response carried no message")]
    Empty,
}

impl EnhanceError {
    /// Worth another attempt: timeouts at the transport level, rate limits,
    /// and server errors.
    const fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Timeout | Self::Decode(_) | Self::Empty => false,
        }
    }
}

// ─── Capability ──────────────────────────────────────────────────────────────

/// A text-completion service.
pub trait Enhancer: Send + Sync {
    /// Answer `prompt` before `deadline`.
    ///
    /// # Errors
    ///
    /// Whatever kept the service from answering.
    fn complete(&self, prompt: &str, deadline: Deadline) -> Result<String, EnhanceError>;
}

/// Chat-completions client.
#[derive(Debug, Clone)]
pub struct HttpEnhancer {
    agent: ureq::Agent,
    url: String,
    model: String,
    api_key: Option<String>,
    retries: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

impl HttpEnhancer {
    /// A client for `config.endpoint`, or `None` while no endpoint is set.
    /// The caller supplies the API key so nothing here reads the
    /// environment.
    #[must_use]
    pub fn from_config(config: &AiConfig, api_key: Option<String>) -> Option<Self> {
        let endpoint = config.endpoint.as_deref()?.trim_end_matches('/');
        let url = if endpoint.ends_with("/chat/completions") {
            endpoint.to_string()
        } else {
            format!("{endpoint}/chat/completions")
        };
        Some(Self {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(Duration::from_secs(10))
                .build(),
            url,
            model: config.model.clone(),
            api_key: api_key.filter(|key| !key.is_empty()),
            retries: config.retries,
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn attempt(&self, body: &serde_json::Value, deadline: Deadline) -> Result<String, EnhanceError> {
        let remaining = deadline.remaining().ok_or(EnhanceError::Timeout)?;
        let mut request = self.agent.post(&self.url).timeout(remaining);
        if let Some(key) = &self.api_key {
            request = request.set("Authorization", &format!("Bearer {key}"));
        }
        let response = match request.send_json(body) {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                return Err(EnhanceError::Status {
                    status,
                    body: response.into_string().unwrap_or_default(),
                });
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(EnhanceError::Transport(transport.to_string()));
            }
        };
        let reply: ChatResponse = response.into_json().map_err(EnhanceError::Decode)?;
        reply
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(EnhanceError::Empty)
    }
}

impl Enhancer for HttpEnhancer {
    fn complete(&self, prompt: &str, deadline: Deadline) -> Result<String, EnhanceError> {
        let body = json!({
            "model": self.model,
            "temperature": 0.3,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
        });

        let mut attempt = 0;
        loop {
            match self.attempt(&body, deadline) {
                Err(err) if err.is_transient() && attempt < self.retries => {
                    attempt += 1;
                    tracing::debug!(%err, attempt, "retrying completion");
                }
                result => return result,
            }
        }
    }
}

// ─── Prompts ─────────────────────────────────────────────────────────────────

fn description_prompt(doc: &ThemeDocument) -> String {
    format!(
        "Enhance this VS Code theme description to be more engaging and descriptive.\n\
         Keep it concise but compelling.\n\n\
         Theme: {}\n\
         Current description: {}\n\n\
         Highlight the unique visual character, mention who it suits, use vivid but \
         professional language, and stay under {MAX_DESCRIPTION_CHARS} characters. \
         Reply with the description only.",
        doc.metadata.display_name,
        doc.metadata.description.as_deref().unwrap_or(""),
    )
}

fn colors_prompt(doc: &ThemeDocument) -> String {
    let mut prompt = String::from(
        "Review these VS Code theme colors for WCAG contrast, harmony, eye strain and \
         consistency across UI elements.\n\nCurrent colors:\n",
    );
    for (key, value) in &doc.colors {
        let _ = writeln!(prompt, "{key}: {value}");
    }
    prompt.push_str(
        "\nReply with one `key: #rrggbb` line per color you would change and nothing else.",
    );
    prompt
}

// ─── Reply handling ──────────────────────────────────────────────────────────

/// Trim quotes and whitespace, cap at [`MAX_DESCRIPTION_CHARS`].
#[must_use]
pub fn clean_description(reply: &str) -> Option<String> {
    let text = reply.trim().trim_matches(['"', '\'', '`']).trim();
    if text.is_empty() {
        return None;
    }
    if text.chars().count() <= MAX_DESCRIPTION_CHARS {
        return Some(text.to_string());
    }
    let mut capped: String = text.chars().take(MAX_DESCRIPTION_CHARS - 3).collect();
    capped.truncate(capped.trim_end().len());
    capped.push_str("...");
    Some(capped)
}

/// Apply `key: #hex` suggestions from `reply` to keys already present.
/// Returns the keys that changed.
pub fn apply_color_suggestions(doc: &mut ThemeDocument, reply: &str) -> Vec<String> {
    let mut changed = Vec::new();
    for caps in SUGGESTION.captures_iter(reply) {
        let (key, value) = (&caps[1], &caps[2]);
        if !ColorValue::is_valid(value) {
            continue;
        }
        let Some(current) = doc.colors.get_mut(key) else {
            continue;
        };
        let value = normalize_color(value);
        if *current != value {
            tracing::debug!(key, from = %current, to = %value, "applying color suggestion");
            *current = value;
            changed.push(key.to_string());
        }
    }
    changed
}

/// What an enhancement pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enhancement {
    pub description: bool,
    pub colors: Vec<String>,
}

impl Enhancement {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.description && self.colors.is_empty()
    }
}

/// Run the enabled enhancement steps against `doc`.
///
/// Each step gets its own deadline. A failed step is logged and skipped;
/// enhancement never fails a build.
pub fn enhance(doc: &mut ThemeDocument, enhancer: &dyn Enhancer, config: &AiConfig) -> Enhancement {
    let theme = doc.metadata.name.clone();
    let mut outcome = Enhancement::default();

    if config.enhance_description {
        match enhancer.complete(&description_prompt(doc), Deadline::after(config.timeout())) {
            Ok(reply) => {
                if let Some(description) = clean_description(&reply) {
                    doc.metadata.description = Some(description);
                    outcome.description = true;
                }
            }
            Err(err) => tracing::warn!(theme = %theme, %err, "description enhancement failed"),
        }
    }

    if config.optimize_colors && !doc.colors.is_empty() {
        match enhancer.complete(&colors_prompt(doc), Deadline::after(config.timeout())) {
            Ok(reply) => outcome.colors = apply_color_suggestions(doc, &reply),
            Err(err) => tracing::warn!(theme = %theme, %err, "color optimization failed"),
        }
    }

    tracing::debug!(
        theme = %theme,
        description = outcome.description,
        colors = outcome.colors.len(),
        "enhancement finished"
    );
    outcome
}

// ─── Tests ───────────────────────────────────────────────────────────────────
