use super::LlmClient;
use crate::config::ApiKey;
use crate::error::GenerationError;
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Minimal request/response structs for the Gemini generateContent API.
#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
    total_token_count: Option<u32>,
}

/// Gemini-based implementation of LlmClient.
pub struct GeminiClient {
    client: Client,
    api_key: ApiKey,
    model: String,
    api_base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: ApiKey, model: String, api_base_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(GeminiClient {
            client,
            api_key,
            model,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base_url, self.model
        )
    }

    fn call_generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let req = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        log::info!("Calling Gemini model {:?}", &self.model);

        let resp = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", self.api_key.expose())
            .json(&req)
            .send()
            .map_err(GenerationError::Transport)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        let parsed: GenerateResponse = resp.json().map_err(GenerationError::Decode)?;

        if let Some(usage) = &parsed.usage_metadata {
            log::info!(
                "Token usage: prompt={}, completion={}, total={}",
                usage.prompt_token_count.unwrap_or(0),
                usage.candidates_token_count.unwrap_or(0),
                usage.total_token_count.unwrap_or(0)
            );
        }

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        let message = clean_message(&text);
        if message.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(message)
    }
}

impl LlmClient for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        log::trace!("Commit-message prompt:\n{}", truncate(prompt, 3000));

        match self.call_generate(prompt) {
            Err(e) if e.is_transient() => {
                log::warn!("{e}; retrying once");
                self.call_generate(prompt)
            }
            other => other,
        }
    }
}

/// Trim the reply and unwrap it from a Markdown code fence if the model added one.
fn clean_message(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        if let Some(inner) = rest.strip_suffix("```") {
            // Drop an info string such as ```text on the opening line.
            let inner = match inner.split_once('\n') {
                Some((first, body)) if !first.trim().contains(' ') => body,
                _ => inner,
            };
            return inner.trim().to_string();
        }
    }
    trimmed.to_string()
}

/// Truncate long strings for debug logging.
fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...\n[truncated {} chars]", &s[..end], s.len() - end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockHttp;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, ResponseTemplate};

    const GENERATE_PATH: &str = "/v1beta/models/gemini-test:generateContent";

    fn client(base: String, timeout: Duration) -> GeminiClient {
        GeminiClient::new(ApiKey::new("test-key"), "gemini-test".into(), base, timeout).unwrap()
    }

    fn gemini_replying(template: ResponseTemplate) -> MockHttp {
        let http = MockHttp::start();
        http.mount(
            Mock::given(method("POST"))
                .and(path(GENERATE_PATH))
                .respond_with(template),
        );
        http
    }

    #[test]
    fn returns_candidate_text() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"feat: add cache\n\nStores style."}]}}],"usageMetadata":{"promptTokenCount":10,"candidatesTokenCount":5,"totalTokenCount":15}}"#;
        let http = MockHttp::start();
        http.mount(
            Mock::given(method("POST"))
                .and(path(GENERATE_PATH))
                .and(header("x-goog-api-key", "test-key"))
                .and(body_string_contains("PROMPT TEXT"))
                .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json")),
        );

        let message = client(http.uri(), Duration::from_secs(5))
            .generate("PROMPT TEXT")
            .unwrap();
        assert_eq!(message, "feat: add cache\n\nStores style.");

        let requests = http.received();
        assert_eq!(requests.len(), 1);
        // The key travels in the header only.
        assert!(requests[0].url.query().is_none());
    }

    #[test]
    fn api_error_is_reported_with_status() {
        let http = gemini_replying(
            ResponseTemplate::new(403).set_body_raw(r#"{"error":"denied"}"#, "application/json"),
        );

        let err = client(http.uri(), Duration::from_secs(5)).generate("p").unwrap_err();
        assert!(matches!(err, GenerationError::Api { status: 403, .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn server_error_is_not_retried() {
        let http = gemini_replying(ResponseTemplate::new(500).set_body_string("overloaded"));

        let err = client(http.uri(), Duration::from_secs(5)).generate("p").unwrap_err();
        assert!(matches!(err, GenerationError::Api { status: 500, .. }));
        assert_eq!(http.received().len(), 1);
    }

    #[test]
    fn timeout_is_retried_once() {
        let http = gemini_replying(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"candidates":[]}"#, "application/json")
                .set_delay(Duration::from_secs(2)),
        );

        let err = client(http.uri(), Duration::from_millis(200))
            .generate("p")
            .unwrap_err();
        assert!(err.is_transient());
        assert_eq!(http.received().len(), 2);
    }

    #[test]
    fn empty_candidates_are_an_error() {
        let http = gemini_replying(
            ResponseTemplate::new(200).set_body_raw(r#"{"candidates":[]}"#, "application/json"),
        );

        let err = client(http.uri(), Duration::from_secs(5)).generate("p").unwrap_err();
        assert!(matches!(err, GenerationError::EmptyResponse));
    }

    #[test]
    fn strips_code_fences() {
        assert_eq!(clean_message("```\nfix: typo\n```"), "fix: typo");
        assert_eq!(clean_message("```text\nfix: typo\n\nbody\n```"), "fix: typo\n\nbody");
        assert_eq!(clean_message("  docs: readme \n"), "docs: readme");
    }
}
