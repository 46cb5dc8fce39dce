//! Web crawling for the documentation site.
//!
//! BFS crawl within the seed's host, keeping raw HTML for the parser stage.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use docgraph_core::CrawlSettings;
use tracing::{debug, info, warn};
use url::Url;

use crate::errors::{KnowledgeError, KnowledgeResult};
use crate::models::RawPage;

/// Configuration for a crawl operation.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub seed_url: Url,
    /// Pause between two fetches.
    pub delay: Duration,
    /// Max pages to fetch; unbounded when `None`.
    pub max_pages: Option<usize>,
}

impl CrawlConfig {
    pub fn from_settings(settings: &CrawlSettings) -> KnowledgeResult<Self> {
        Ok(Self {
            seed_url: Url::parse(&settings.seed_url)?,
            delay: Duration::from_millis(settings.delay_ms),
            max_pages: settings.max_pages,
        })
    }
}

/// Source of page HTML.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> KnowledgeResult<String>;
}

/// Fetches pages over HTTP(S), accepting HTML responses only.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(settings: &CrawlSettings) -> KnowledgeResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(|e| KnowledgeError::SourceFetch(format!("reqwest client: {}", e)))?;
        Ok(Self {
            client,
            user_agent: settings.user_agent.clone(),
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> KnowledgeResult<String> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(|e| KnowledgeError::SourceFetch(format!("HTTP fetch {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(KnowledgeError::SourceFetch(format!(
                "HTTP {} for {}",
                response.status(),
                url
            )));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !content_type.contains("text/html") && !content_type.contains("application/xhtml") {
            return Err(KnowledgeError::SourceFetch(format!(
                "non-HTML content-type '{}' for {}",
                content_type, url
            )));
        }

        response
            .text()
            .await
            .map_err(|e| KnowledgeError::SourceFetch(format!("read body: {}", e)))
    }
}

/// Crawl the seed's site using BFS.
///
/// Only follows http(s) links on the seed's host and port. A URL is marked
/// seen when first enqueued, so every normalized URL is fetched at most once.
/// Failed fetches are logged and contribute neither content nor links.
pub async fn crawl_site(
    fetcher: &dyn PageFetcher,
    config: &CrawlConfig,
) -> KnowledgeResult<Vec<RawPage>> {
    let seed_host = config
        .seed_url
        .host_str()
        .ok_or_else(|| KnowledgeError::SourceFetch("seed URL has no host".to_string()))?
        .to_string();
    let seed_port = config.seed_url.port_or_known_default();

    let mut seen: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<String> = VecDeque::new();
    let mut pages: Vec<RawPage> = Vec::new();

    let seed = normalize_url(&config.seed_url);
    seen.insert(seed.clone());
    queue.push_back(seed);

    let mut first = true;
    while let Some(url) = queue.pop_front() {
        if config.max_pages.is_some_and(|max| pages.len() >= max) {
            break;
        }

        if !first && !config.delay.is_zero() {
            tokio::time::sleep(config.delay).await;
        }
        first = false;

        debug!(url = %url, queued = queue.len(), "crawling page");

        let html = match fetcher.fetch(&url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(url = %url, error = %e, "skipping page");
                continue;
            }
        };

        for link in extract_links(&html, &url, &seed_host, seed_port) {
            if seen.insert(link.clone()) {
                queue.push_back(link);
            }
        }

        pages.push(RawPage { url, html });
    }

    info!(pages = pages.len(), seen = seen.len(), "crawl finished");
    Ok(pages)
}

/// Extract same-site links from HTML using CSS selectors.
fn extract_links(html: &str, base_url: &str, allowed_host: &str, allowed_port: Option<u16>) -> Vec<String> {
    let document = scraper::Html::parse_document(html);
    let Ok(selector) = scraper::Selector::parse("a[href]") else {
        return Vec::new();
    };

    let base = Url::parse(base_url).ok();

    let mut links = Vec::new();
    for el in document.select(&selector) {
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        if let Some(link) = resolve_link(href, base.as_ref(), allowed_host, allowed_port) {
            if !links.contains(&link) {
                links.push(link);
            }
        }
    }
    links
}

/// Resolve a link relative to a base URL, filtering to the crawl's site.
fn resolve_link(
    href: &str,
    base: Option<&Url>,
    allowed_host: &str,
    allowed_port: Option<u16>,
) -> Option<String> {
    if href.starts_with('#') || href.starts_with("javascript:") || href.starts_with("mailto:") {
        return None;
    }

    let resolved = if let Ok(abs) = Url::parse(href) {
        abs
    } else {
        base?.join(href).ok()?
    };

    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }

    if resolved.host_str() != Some(allowed_host) || resolved.port_or_known_default() != allowed_port {
        return None;
    }

    Some(normalize_url(&resolved))
}

/// Normalize URL: strip query and fragment.
fn normalize_url(url: &Url) -> String {
    let mut normalized = url.clone();
    normalized.set_query(None);
    normalized.set_fragment(None);
    normalized.to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn test_extract_links_same_host() {
        let html = r##"
        <html><body>
          <a href="/api-reference/hooks">Hooks</a>
          <a href="https://example.com/other">Other</a>
          <a href="/api-reference/types?tab=1#node">Types</a>
          <a href="#section">Fragment</a>
          <a href="javascript:void(0)">JS</a>
          <a href="mailto:team@reactflow.dev">Mail</a>
        </body></html>"##;

        let links = extract_links(html, "https://reactflow.dev/api-reference", "reactflow.dev", Some(443));
        assert_eq!(
            links,
            vec![
                "https://reactflow.dev/api-reference/hooks".to_string(),
                "https://reactflow.dev/api-reference/types".to_string(),
            ]
        );
    }

    #[test]
    fn test_normalize_url_strips_query_and_fragment() {
        let url = Url::parse("https://reactflow.dev/learn?ref=nav#intro").unwrap();
        assert_eq!(normalize_url(&url), "https://reactflow.dev/learn");
    }

    #[test]
    fn test_resolve_link_rejects_subdomain_and_scheme() {
        let base = Url::parse("https://reactflow.dev/").unwrap();
        assert!(resolve_link("https://pro.reactflow.dev/", Some(&base), "reactflow.dev", Some(443)).is_none());
        assert!(resolve_link("ftp://reactflow.dev/file", Some(&base), "reactflow.dev", Some(443)).is_none());
        assert!(resolve_link("http://reactflow.dev:8080/", Some(&base), "reactflow.dev", Some(443)).is_none());
    }

    #[test]
    fn test_resolve_link_resolves_relative() {
        let base = Url::parse("https://reactflow.dev/api-reference/").unwrap();
        let result = resolve_link("components", Some(&base), "reactflow.dev", Some(443));
        assert_eq!(
            result,
            Some("https://reactflow.dev/api-reference/components".to_string())
        );
    }

    /// In-memory site; records every fetch.
    struct FakeSite {
        pages: HashMap<String, String>,
        fetched: Mutex<Vec<String>>,
    }

    impl FakeSite {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, html)| (url.to_string(), html.to_string()))
                    .collect(),
                fetched: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for FakeSite {
        async fn fetch(&self, url: &str) -> KnowledgeResult<String> {
            self.fetched.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| KnowledgeError::SourceFetch(format!("HTTP 404 Not Found for {}", url)))
        }
    }

    fn config(seed: &str) -> CrawlConfig {
        CrawlConfig {
            seed_url: Url::parse(seed).unwrap(),
            delay: Duration::ZERO,
            max_pages: None,
        }
    }

    #[tokio::test]
    async fn test_crawl_visits_each_url_once_and_terminates() {
        let site = FakeSite::new(&[
            (
                "https://reactflow.dev/api-reference",
                r#"<a href="/api-reference/hooks">h</a><a href="/api-reference/types?x=1">t</a>"#,
            ),
            (
                "https://reactflow.dev/api-reference/hooks",
                r#"<a href="/api-reference">back</a><a href="/api-reference/types#node">t</a>"#,
            ),
            (
                "https://reactflow.dev/api-reference/types",
                r#"<a href="/api-reference/hooks">h</a><a href="https://github.com/xyflow">gh</a>"#,
            ),
        ]);

        let pages = crawl_site(&site, &config("https://reactflow.dev/api-reference"))
            .await
            .unwrap();

        let urls: Vec<&str> = pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://reactflow.dev/api-reference",
                "https://reactflow.dev/api-reference/hooks",
                "https://reactflow.dev/api-reference/types",
            ]
        );
        assert_eq!(site.fetched.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_crawl_continues_past_failed_fetch() {
        let site = FakeSite::new(&[(
            "https://reactflow.dev/",
            r#"<a href="/missing">gone</a><a href="/learn">learn</a>"#,
        ), (
            "https://reactflow.dev/learn",
            "<main><h1>Learn</h1></main>",
        )]);

        let pages = crawl_site(&site, &config("https://reactflow.dev/")).await.unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].url, "https://reactflow.dev/learn");
        assert!(site
            .fetched
            .lock()
            .unwrap()
            .contains(&"https://reactflow.dev/missing".to_string()));
    }

    #[tokio::test]
    async fn test_crawl_respects_max_pages() {
        let site = FakeSite::new(&[
            ("https://reactflow.dev/", r#"<a href="/a">a</a><a href="/b">b</a>"#),
            ("https://reactflow.dev/a", ""),
            ("https://reactflow.dev/b", ""),
        ]);
        let mut cfg = config("https://reactflow.dev/");
        cfg.max_pages = Some(2);

        let pages = crawl_site(&site, &cfg).await.unwrap();
        assert_eq!(pages.len(), 2);
    }
}
