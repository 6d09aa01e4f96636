//! HTTP observer: fetch a page and count tile anchors

use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use super::{Observation, Observer};

/// Counts `<a>` elements whose class attribute contains a fragment,
/// the same elements a `a[class*="fragment"]` selector would pick.
///
/// Comments and the contents of `<script>` and `<style>` are not markup
/// and are skipped. A quoted attribute value may contain `>`.
#[derive(Debug, Clone)]
pub struct TileMatcher {
    fragment: String,
    skip_re: Regex,
    anchor_re: Regex,
    class_re: Regex,
}

impl TileMatcher {
    pub fn new(fragment: impl Into<String>) -> Self {
        Self {
            fragment: fragment.into(),
            skip_re: Regex::new(
                r"(?is)<!--.*?-->|<script\b.*?</script\s*>|<style\b.*?</style\s*>",
            )
            .expect("valid skip regex"),
            anchor_re: Regex::new(r#"(?is)<a\b(?:[^>"']|"[^"]*"|'[^']*')*>"#)
                .expect("valid anchor regex"),
            class_re: Regex::new(r#"(?is)\sclass\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
                .expect("valid class regex"),
        }
    }

    /// Number of matching anchors in `html`
    pub fn count(&self, html: &str) -> u32 {
        let markup = self.skip_re.replace_all(html, " ");
        self.anchor_re
            .find_iter(&markup)
            .filter(|tag| self.matches_tag(tag.as_str()))
            .count() as u32
    }

    fn matches_tag(&self, tag: &str) -> bool {
        self.class_re.captures_iter(tag).any(|caps| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map(|class| class.as_str().contains(&self.fragment))
                .unwrap_or(false)
        })
    }
}

/// Fetches pages over HTTP and counts tiles with a [`TileMatcher`]
pub struct HttpObserver {
    client: reqwest::Client,
    matcher: TileMatcher,
}

impl HttpObserver {
    pub fn new(
        matcher: TileMatcher,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, ObserveError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| ObserveError::Client(e.to_string()))?;

        Ok(Self { client, matcher })
    }

    /// Fetch `url` and count its tiles
    pub async fn fetch_count(&self, url: &str) -> Result<u32, ObserveError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ObserveError::Timeout(e.to_string())
                } else {
                    ObserveError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ObserveError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ObserveError::Body(e.to_string()))?;

        Ok(self.matcher.count(&body))
    }
}

#[async_trait]
impl Observer for HttpObserver {
    async fn observe(&self, url: &str) -> Observation {
        match self.fetch_count(url).await {
            Ok(count) => Observation::Measured(count),
            Err(e) => Observation::Failed(e.to_string()),
        }
    }
}

/// Page fetch errors
#[derive(Debug, thiserror::Error)]
pub enum ObserveError {
    #[error("HTTP client error: {0}")]
    Client(String),

    #[error("Timeout loading page: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Page returned status {0}")]
    Status(u16),

    #[error("Failed to read page body: {0}")]
    Body(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve_once;

    const FRAGMENT: &str = "CategoryTile_categoryTile";

    fn page(tiles: usize) -> String {
        let mut html =
            String::from("<html><body><nav><a class=\"Nav_link\" href=\"/\">Home</a></nav>");
        for i in 0..tiles {
            html.push_str(&format!(
                "<a href=\"/c/{i}\" class=\"CategoryTile_categoryTile__x9Z2 active\">Tile {i}</a>"
            ));
        }
        html.push_str("</body></html>");
        html
    }

    #[test]
    fn test_counts_matching_anchors_only() {
        let matcher = TileMatcher::new(FRAGMENT);
        assert_eq!(matcher.count(&page(0)), 0);
        assert_eq!(matcher.count(&page(9)), 9);
    }

    #[test]
    fn test_class_quoting_variants() {
        let matcher = TileMatcher::new(FRAGMENT);
        let html = r#"
            <a class='CategoryTile_categoryTile__a'>one</a>
            <A
               data-id="2" CLASS="big CategoryTile_categoryTile__b">two</A>
            <a class=CategoryTile_categoryTile__c>three</a>
            <div class="CategoryTile_categoryTile__d">not an anchor</div>
            <abbr class="CategoryTile_categoryTile__e">not an anchor either</abbr>
            <a data-class="CategoryTile_categoryTile__f">attribute name differs</a>
        "#;
        assert_eq!(matcher.count(html), 3);
    }

    #[test]
    fn test_fragment_match_is_case_sensitive() {
        let matcher = TileMatcher::new(FRAGMENT);
        assert_eq!(matcher.count(r#"<a class="categorytile_categorytile">x</a>"#), 0);
    }

    #[test]
    fn test_angle_bracket_inside_attribute_value() {
        let matcher = TileMatcher::new(FRAGMENT);
        let html = r#"
            <a title="Jackets > Rain" class="CategoryTile_categoryTile__a">one</a>
            <a data-label='a>b' class='CategoryTile_categoryTile__b'>two</a>
        "#;
        assert_eq!(matcher.count(html), 2);
    }

    #[test]
    fn test_comments_and_scripts_are_not_counted() {
        let matcher = TileMatcher::new(FRAGMENT);
        let html = r#"
            <!-- <a class="CategoryTile_categoryTile__old">retired</a> -->
            <script>
                const tpl = '<a class="CategoryTile_categoryTile__tpl">x</a>';
            </script>
            <STYLE>a.x::after { content: '<a class="CategoryTile_categoryTile__s">'; }</STYLE>
            <a class="CategoryTile_categoryTile__live">live</a>
        "#;
        assert_eq!(matcher.count(html), 1);
    }

    #[tokio::test]
    async fn test_observe_counts_fetched_page() {
        let (addr, _request) = serve_once("200 OK", &page(5)).await;
        let observer = HttpObserver::new(
            TileMatcher::new(FRAGMENT),
            "tilewatch-test",
            Duration::from_secs(5),
        )
        .unwrap();

        let observation = observer.observe(&format!("http://{}/eu/mens/", addr)).await;
        assert_eq!(observation, Observation::Measured(5));
    }

    #[tokio::test]
    async fn test_error_status_is_a_failed_observation() {
        let (addr, _request) = serve_once("503 Service Unavailable", "").await;
        let observer = HttpObserver::new(
            TileMatcher::new(FRAGMENT),
            "tilewatch-test",
            Duration::from_secs(5),
        )
        .unwrap();

        match observer.observe(&format!("http://{}/eu/kids/", addr)).await {
            Observation::Failed(reason) => assert!(reason.contains("503")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_failed_observation() {
        let observer = HttpObserver::new(
            TileMatcher::new(FRAGMENT),
            "tilewatch-test",
            Duration::from_secs(2),
        )
        .unwrap();

        let observation = observer.observe("http://127.0.0.1:1/").await;
        assert!(matches!(observation, Observation::Failed(_)));
    }
}
