use anyhow::{anyhow, Context, Result};
use models::{DerivedRecord, Insight};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Configuration for talking to a local Ollama server.
///
/// This crate intentionally only supports Ollama's local HTTP API.
/// It refuses to run if the configured base URL is not local.
#[derive(Debug, Clone)]
pub struct OllamaClientConfig {
    pub base_url: String,
    pub model: String,
}

impl OllamaClientConfig {
    /// Loads config from env vars:
    /// - `OLLAMA_BASE_URL` (default: `http://localhost:11434`)
    /// - `OLLAMA_MODEL`    (default: `llama3.2`)
    pub fn from_env() -> Self {
        let base_url = std::env::var("OLLAMA_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:11434".to_string());
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string());
        Self { base_url, model }
    }
}

/// A capability that turns a derived series into advisory insights.
///
/// Insights never feed back into the series; a failure here is reported to
/// the caller and otherwise inert.
pub trait InsightProvider {
    fn generate_insights(&self, series: &[DerivedRecord]) -> Result<Vec<Insight>>;
}

/// Minimal Ollama chat client (blocking HTTP).
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: Client,
    base_url: Url,
    model: String,
}

impl OllamaClient {
    pub fn new(config: OllamaClientConfig) -> Result<Self> {
        let base_url = validate_local_base_url(&config.base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url,
            model: config.model,
        })
    }

    /// Generic helper for a single-turn chat call.
    pub fn chat(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let endpoint = self
            .base_url
            .join("api/chat")
            .context("Failed to build Ollama /api/chat URL")?;

        let request = OllamaChatRequest {
            model: self.model.clone(),
            stream: false,
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
            options: Some(OllamaOptions {
                temperature: Some(0.0),
            }),
        };

        let response: OllamaChatResponse = self
            .http
            .post(endpoint.clone())
            .json(&request)
            .send()
            .with_context(|| format!("POST {endpoint} failed"))?
            .error_for_status()
            .with_context(|| format!("POST {endpoint} returned non-success status"))?
            .json()
            .with_context(|| format!("Failed to parse JSON response from {endpoint}"))?;

        let content = response
            .message
            .map(|m| m.content)
            .ok_or_else(|| anyhow!("Ollama response had no message content"))?;

        Ok(content.trim().to_string())
    }
}

const INSIGHT_SYSTEM_PROMPT: &str = "You are a personal-finance analyst. Reply with a raw JSON array of exactly three objects, each with the string fields \"title\", \"explanation\" and \"suggestion\". Do not wrap the array in any other object and do not add commentary.";

impl InsightProvider for OllamaClient {
    fn generate_insights(&self, series: &[DerivedRecord]) -> Result<Vec<Insight>> {
        let data = serde_json::to_string_pretty(series)
            .context("Failed to serialize the series for the insight prompt")?;
        let user_prompt = format!(
            "Analyze the following personal financial data and provide three distinct, \
             actionable insights. For each insight, provide a title, a data-driven \
             explanation, and a practical suggestion. The data represents monthly \
             snapshots of assets and liabilities.\n\nData:\n{data}\n\nFocus on trends \
             in net worth, asset allocation, liability changes, and overall financial \
             health. Provide concrete advice."
        );

        let reply = self.chat(INSIGHT_SYSTEM_PROMPT, &user_prompt)?;
        parse_insights(&reply)
    }
}

/// Parses the model's reply into insights, tolerating a markdown code fence
/// around the JSON array.
fn parse_insights(reply: &str) -> Result<Vec<Insight>> {
    let json = extract_json_array(reply)
        .ok_or_else(|| anyhow!("Model reply contained no JSON array"))?;
    let insights: Vec<Insight> =
        serde_json::from_str(json).context("Failed to parse insights JSON")?;
    if insights.is_empty() {
        return Err(anyhow!("Model reply contained no insights"));
    }
    Ok(insights)
}

fn extract_json_array(reply: &str) -> Option<&str> {
    let start = reply.find('[')?;
    let end = reply.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&reply[start..=end])
}

fn validate_local_base_url(base_url: &str) -> Result<Url> {
    let url =
        Url::parse(base_url).with_context(|| format!("Invalid OLLAMA_BASE_URL: {base_url}"))?;

    match url.scheme() {
        "http" => {}
        other => {
            return Err(anyhow!(
                "Unsupported scheme '{other}' for OLLAMA_BASE_URL (use http://localhost:11434)"
            ))
        }
    }

    let host = url
        .host_str()
        .ok_or_else(|| anyhow!("OLLAMA_BASE_URL is missing a host"))?;

    let is_local = host.eq_ignore_ascii_case("localhost") || host == "127.0.0.1" || host == "::1";

    if !is_local {
        return Err(anyhow!(
            "Refusing non-local OLLAMA_BASE_URL host '{host}'. This project only uses local Ollama (use http://localhost:11434)."
        ));
    }

    Ok(url)
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: Option<Message>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLY: &str = r#"[
        {"title": "Strong Asset Growth", "explanation": "Assets rose 6% month over month.", "suggestion": "Keep the contribution rate."},
        {"title": "Debt Paydown", "explanation": "Liabilities fell by 17000.", "suggestion": "Redirect the freed cash flow."},
        {"title": "Concentration Risk", "explanation": "Real estate dominates the balance sheet.", "suggestion": "Diversify gradually."}
    ]"#;

    #[test]
    fn parses_a_plain_json_array() {
        let insights = parse_insights(REPLY).unwrap();
        assert_eq!(insights.len(), 3);
        assert_eq!(insights[0].title, "Strong Asset Growth");
    }

    #[test]
    fn parses_an_array_wrapped_in_a_code_fence() {
        let fenced = format!("```json\n{REPLY}\n```");
        let insights = parse_insights(&fenced).unwrap();
        assert_eq!(insights.len(), 3);
    }

    #[test]
    fn rejects_a_reply_without_an_array() {
        assert!(parse_insights("no structured data here").is_err());
    }

    #[test]
    fn rejects_an_empty_array() {
        assert!(parse_insights("[]").is_err());
    }

    #[test]
    fn rejects_non_local_hosts() {
        assert!(validate_local_base_url("http://example.com:11434").is_err());
        assert!(validate_local_base_url("https://localhost:11434").is_err());
        assert!(validate_local_base_url("http://localhost:11434").is_ok());
    }
}
