//! Resolution of `--guidelines` values into plain text.

use regex::Regex;
use reqwest::blocking::Client;
use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use crate::error::FetchError;

/// Where a `--guidelines` value points, decided once at the CLI boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuidelineSource {
    File(PathBuf),
    Url(String),
    Inline(String),
}

impl GuidelineSource {
    /// An existing file wins, then an http(s) URL, otherwise the value is the text itself.
    pub fn classify(value: &str) -> Self {
        let path = PathBuf::from(value);
        if !value.is_empty() && path.is_file() {
            GuidelineSource::File(path)
        } else if value.starts_with("http://") || value.starts_with("https://") {
            GuidelineSource::Url(value.to_string())
        } else {
            GuidelineSource::Inline(value.to_string())
        }
    }

    pub fn describe(&self) -> String {
        match self {
            GuidelineSource::File(path) => format!("file {}", path.display()),
            GuidelineSource::Url(url) => url.clone(),
            GuidelineSource::Inline(_) => "inline text".to_string(),
        }
    }

    /// Turn the source into trimmed guideline text.
    pub fn resolve(&self, timeout: Duration) -> Result<String, FetchError> {
        let text = match self {
            GuidelineSource::File(path) => {
                fs::read_to_string(path).map_err(|source| FetchError::ReadFile {
                    path: path.clone(),
                    source,
                })?
            }
            GuidelineSource::Url(url) => fetch(url, timeout)?,
            GuidelineSource::Inline(text) => text.clone(),
        };

        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(FetchError::Empty(self.describe()));
        }
        Ok(text)
    }
}

fn fetch(url: &str, timeout: Duration) -> Result<String, FetchError> {
    let network = |source| FetchError::Network {
        url: url.to_string(),
        source,
    };

    log::info!("Fetching guidelines from {url}");

    let client = Client::builder().timeout(timeout).build().map_err(network)?;
    let resp = client.get(url).send().map_err(network)?;

    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let is_html = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("html"));

    let body = resp.text().map_err(network)?;

    if is_html || looks_like_html(&body) {
        Ok(html_to_text(&body))
    } else {
        Ok(body)
    }
}

fn looks_like_html(body: &str) -> bool {
    let head: String = body.trim_start().chars().take(15).collect();
    let head = head.to_ascii_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

static DROPPED_BLOCKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|head|noscript)\b.*?</(script|style|head|noscript)\s*>")
        .expect("static regex")
});
static BREAKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(br|/p|/div|/li|/h[1-6]|/tr|/pre)\b[^>]*>").expect("static regex")
});
static LIST_ITEMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<li\b[^>]*>").expect("static regex"));
static TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("static regex"));
static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").expect("static regex"));

/// Reduce an HTML page to readable text, one block element per line.
pub fn html_to_text(html: &str) -> String {
    let text = DROPPED_BLOCKS.replace_all(html, "");
    let text = BREAKS.replace_all(&text, "\n");
    let text = LIST_ITEMS.replace_all(&text, "\n- ");
    let text = TAGS.replace_all(&text, "");

    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    text.lines()
        .map(|line| SPACES.replace_all(line.trim(), " ").into_owned())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockHttp;
    use std::net::TcpListener;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    /// Serve `template` at `/guidelines`. The server lives as long as the returned handle.
    fn guidelines_url(template: ResponseTemplate) -> (MockHttp, String) {
        let http = MockHttp::start();
        http.mount(
            Mock::given(method("GET"))
                .and(path("/guidelines"))
                .respond_with(template),
        );
        let url = format!("{}/guidelines", http.uri());
        (http, url)
    }

    #[test]
    fn classifies_file_url_and_inline() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("COMMITS.md");
        fs::write(&file, "rules").unwrap();

        assert_eq!(
            GuidelineSource::classify(file.to_str().unwrap()),
            GuidelineSource::File(file.clone())
        );
        assert_eq!(
            GuidelineSource::classify("https://example.com/guide"),
            GuidelineSource::Url("https://example.com/guide".into())
        );
        assert_eq!(
            GuidelineSource::classify("Use imperative mood"),
            GuidelineSource::Inline("Use imperative mood".into())
        );
        // A directory is not a guidelines file.
        assert!(matches!(
            GuidelineSource::classify(dir.path().to_str().unwrap()),
            GuidelineSource::Inline(_)
        ));
    }

    #[test]
    fn resolves_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("rules.txt");
        fs::write(&file, "\n  Prefix subjects with the component.\n").unwrap();

        let text = GuidelineSource::File(file).resolve(Duration::from_secs(1)).unwrap();
        assert_eq!(text, "Prefix subjects with the component.");
    }

    #[test]
    fn blank_inline_text_is_an_error() {
        let err = GuidelineSource::Inline("   ".into())
            .resolve(Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, FetchError::Empty(_)));
    }

    #[test]
    fn http_404_is_fetch_error() {
        let (_http, url) = guidelines_url(ResponseTemplate::new(404).set_body_string("missing"));
        let err = GuidelineSource::Url(url).resolve(Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[test]
    fn html_page_is_reduced_to_text() {
        let (_http, url) = guidelines_url(ResponseTemplate::new(200).set_body_raw(
            "<html><head><title>x</title></head><body><h1>Rules</h1><ul><li>Use &quot;fix:&quot;</li><li>No WIP</li></ul></body></html>",
            "text/html; charset=utf-8",
        ));
        let text = GuidelineSource::Url(url).resolve(Duration::from_secs(5)).unwrap();
        assert_eq!(text, "Rules\n- Use \"fix:\"\n- No WIP");
    }

    #[test]
    fn plain_text_url_is_returned_verbatim() {
        let (_http, url) = guidelines_url(
            ResponseTemplate::new(200).set_body_raw("Subjects under 50 chars.\n", "text/plain"),
        );
        let text = GuidelineSource::Url(url).resolve(Duration::from_secs(5)).unwrap();
        assert_eq!(text, "Subjects under 50 chars.");
    }

    #[test]
    fn unreachable_host_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = GuidelineSource::Url(format!("http://{addr}/"))
            .resolve(Duration::from_secs(2))
            .unwrap_err();
        assert!(matches!(err, FetchError::Network { .. }));
    }

    #[test]
    fn stalled_server_times_out() {
        let (http, url) = guidelines_url(
            ResponseTemplate::new(200)
                .set_body_string("too late")
                .set_delay(Duration::from_secs(3)),
        );

        let err = GuidelineSource::Url(url)
            .resolve(Duration::from_millis(200))
            .unwrap_err();
        assert!(matches!(err, FetchError::Network { .. }));
        assert_eq!(http.received().len(), 1);
    }

    #[test]
    fn sniffs_short_and_multibyte_html() {
        assert!(looks_like_html("<html>ok"));
        assert!(looks_like_html("  <HTML><p>a\u{e9}\u{e9}\u{e9}</p></HTML>"));
        assert!(looks_like_html("<!DOCTYPE html>"));
        assert!(!looks_like_html("- Use imperative mood"));
        assert!(!looks_like_html(""));
    }

    #[test]
    fn html_to_text_drops_scripts_and_collapses_space() {
        let html = "<p>One   <b>two</b></p><script>var x = 1;</script><p>three &amp; four</p>";
        assert_eq!(html_to_text(html), "One two\nthree & four");
    }
}
