//! Blog content generation through an OpenAI-compatible chat API.
//!
//! The model is asked for a JSON object; the reply is free text, so the
//! first `{ ... }` block is extracted and parsed. When that fails the raw
//! text becomes the post content.

use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    Client,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

const EXCERPT_LEN: usize = 160;

#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("request to generation API failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generation API returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("generation API returned no content")]
    EmptyReply,

    #[error("invalid API key header value")]
    InvalidApiKey,
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub title: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratedContent {
    pub excerpt: String,
    pub content: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

const SYSTEM_PROMPT: &str = r#"You are an experienced content writer for a landing-page studio blog.
Answer with a single JSON object and nothing else, using exactly these keys:
{"excerpt": string, "content": string, "categories": [string], "tags": [string]}
"content" is the article body as HTML using <h2>, <p>, <ul> and <li> only."#;

pub fn build_prompt(request: &GenerateRequest) -> String {
    let mut parts = vec![format!("Write a blog post titled \"{}\".", request.title.trim())];

    if !request.categories.is_empty() {
        parts.push(format!("Categories: {}", request.categories.join(", ")));
    }
    if !request.tags.is_empty() {
        parts.push(format!("Tags: {}", request.tags.join(", ")));
    }
    if let Some(extra) = request.prompt.as_deref().map(str::trim) {
        if !extra.is_empty() {
            parts.push(format!("Additional instructions: {}", extra));
        }
    }

    parts.join("\n")
}

/// Slice from the first `{` to the last `}`, if any
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Plain text of an HTML fragment with whitespace collapsed
fn html_to_text(html: &str) -> String {
    // closing tags become word breaks so adjacent blocks don't run together
    let spaced = html.replace("</", " </");
    let text = ammonia::Builder::empty().clean(&spaced).to_string();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn make_excerpt(content: &str) -> String {
    let text = html_to_text(content);
    if text.chars().count() <= EXCERPT_LEN {
        return text;
    }
    let cut: String = text.chars().take(EXCERPT_LEN).collect();
    format!("{}...", cut.trim_end())
}

fn wrap_paragraphs(text: &str) -> String {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{}</p>", p.replace('\n', "<br>")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Turn the model's reply into structured content, never failing.
pub fn parse_generated(raw: &str, request: &GenerateRequest) -> GeneratedContent {
    let parsed = extract_json_object(raw)
        .and_then(|json| serde_json::from_str::<GeneratedContent>(json).ok())
        .filter(|c| !c.content.trim().is_empty());

    let mut content = match parsed {
        Some(content) => content,
        None => {
            tracing::warn!("generated text was not valid JSON, using raw text");
            GeneratedContent {
                content: wrap_paragraphs(raw),
                ..Default::default()
            }
        }
    };

    if content.excerpt.trim().is_empty() {
        content.excerpt = make_excerpt(&content.content);
    }
    if content.categories.is_empty() {
        content.categories = request.categories.clone();
    }
    if content.tags.is_empty() {
        content.tags = request.tags.clone();
    }
    content
}

#[derive(Debug, Clone)]
pub struct ContentGenerator {
    client: Client,
    config: GeneratorConfig,
}

impl ContentGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn headers(&self) -> Result<HeaderMap, GeneratorError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.config.api_key))
            .map_err(|_| GeneratorError::InvalidApiKey)?;
        headers.insert(header::AUTHORIZATION, bearer);
        Ok(headers)
    }

    /// Ask the model for a post and return its raw reply text
    pub async fn complete(&self, request: &GenerateRequest) -> Result<String, GeneratorError> {
        let url = format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        );
        let body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": build_prompt(request) }
            ],
            "temperature": 0.7
        });

        tracing::debug!(model = %self.config.model, title = %request.title, "requesting generated content");

        let response = self
            .client
            .post(url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = response.json().await?;
        reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(GeneratorError::EmptyReply)
    }

    pub async fn generate(&self, request: &GenerateRequest) -> Result<GeneratedContent, GeneratorError> {
        let raw = self.complete(request).await?;
        Ok(parse_generated(&raw, request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerateRequest {
        GenerateRequest {
            title: "Landing pages that convert".to_string(),
            categories: vec!["Marketing".to_string()],
            tags: vec!["cro".to_string(), "design".to_string()],
            prompt: Some("  Keep it short. ".to_string()),
        }
    }

    #[test]
    fn test_build_prompt() {
        let prompt = build_prompt(&request());
        assert!(prompt.contains("\"Landing pages that convert\""));
        assert!(prompt.contains("Categories: Marketing"));
        assert!(prompt.contains("Tags: cro, design"));
        assert!(prompt.contains("Additional instructions: Keep it short."));
    }

    #[test]
    fn test_parse_json_inside_code_fence() {
        let raw = "Sure!\n```json\n{\"excerpt\":\"Short\",\"content\":\"<p>Body</p>\",\"categories\":[\"Design\"],\"tags\":[\"ux\"]}\n```";
        let content = parse_generated(raw, &request());
        assert_eq!(content.excerpt, "Short");
        assert_eq!(content.content, "<p>Body</p>");
        assert_eq!(content.categories, vec!["Design"]);
        assert_eq!(content.tags, vec!["ux"]);
    }

    #[test]
    fn test_parse_fills_missing_fields_from_request() {
        let raw = r#"{"content":"<h2>Intro</h2><p>Hello world</p>"}"#;
        let content = parse_generated(raw, &request());
        assert_eq!(content.excerpt, "Intro Hello world");
        assert_eq!(content.categories, vec!["Marketing"]);
        assert_eq!(content.tags, vec!["cro", "design"]);
    }

    #[test]
    fn test_parse_falls_back_to_raw_text() {
        let raw = "First paragraph.\n\nSecond {broken json paragraph.";
        let content = parse_generated(raw, &request());
        assert_eq!(
            content.content,
            "<p>First paragraph.</p>\n<p>Second {broken json paragraph.</p>"
        );
        assert_eq!(content.excerpt, "First paragraph. Second {broken json paragraph.");
        assert_eq!(content.tags, vec!["cro", "design"]);
    }

    #[test]
    fn test_excerpt_truncates_long_text() {
        let long = "word ".repeat(100);
        let excerpt = make_excerpt(&long);
        assert!(excerpt.ends_with("..."));
        assert!(excerpt.chars().count() <= EXCERPT_LEN + 3);
    }

    #[test]
    fn test_excerpt_ignores_markup_inside_attributes() {
        let raw = r#"{"content":"<p title=\"a>b\">Hello</p> &amp; bye"}"#;
        let content = parse_generated(raw, &request());
        assert!(content.excerpt.starts_with("Hello"));
        assert!(content.excerpt.ends_with("bye"));
        assert!(!content.excerpt.contains("title"));
        assert!(!content.excerpt.contains("b\""));
        assert!(!content.excerpt.contains('<'));
    }
}
