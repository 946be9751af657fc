use crate::config::Config;
use crate::error::UserFacing;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const USER_AGENT: &str = concat!("utilbot/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("empty search query")]
    EmptyQuery,
    #[error("no article matches {0:?}")]
    NotFound(String),
    #[error("{0:?} is a disambiguation page")]
    Ambiguous(String),
    #[error("encyclopedia request failed")]
    Request(#[from] reqwest::Error),
}

impl UserFacing for LookupError {
    fn user_message(&self) -> String {
        "No results found".to_string()
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Deserialize)]
struct SearchQuery {
    search: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Deserialize)]
struct ExtractResponse {
    query: Option<ExtractQuery>,
}

#[derive(Deserialize)]
struct ExtractQuery {
    pages: Vec<Page>,
}

#[derive(Deserialize)]
struct Page {
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    pageprops: Option<PageProps>,
}

#[derive(Deserialize)]
struct PageProps {
    disambiguation: Option<serde_json::Value>,
}

/// MediaWiki client returning a short plain-text summary of the best match
/// for a query.
pub struct WikiClient {
    client: Client,
    api_url: String,
    sentences: u32,
}

impl WikiClient {
    pub fn new(config: &Config) -> Result<Self, LookupError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            api_url: format!("{}/w/api.php", config.wiki_base_url.trim_end_matches('/')),
            sentences: config.wiki_sentences,
        })
    }

    pub async fn summary(&self, query: &str) -> Result<String, LookupError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(LookupError::EmptyQuery);
        }
        let title = self.best_title(query).await?;
        self.extract(&title).await
    }

    /// Resolve free text to an article title, like the search box does.
    async fn best_title(&self, query: &str) -> Result<String, LookupError> {
        let response: SearchResponse = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", "1"),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .query
            .and_then(|q| q.search.into_iter().next())
            .map(|hit| hit.title)
            .ok_or_else(|| LookupError::NotFound(query.to_string()))
    }

    async fn extract(&self, title: &str) -> Result<String, LookupError> {
        let sentences = self.sentences.to_string();
        let response: ExtractResponse = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("prop", "extracts|pageprops"),
                ("ppprop", "disambiguation"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("exsentences", sentences.as_str()),
                ("redirects", "1"),
                ("titles", title),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let page = response
            .query
            .and_then(|q| q.pages.into_iter().next())
            .ok_or_else(|| LookupError::NotFound(title.to_string()))?;

        if page.missing {
            return Err(LookupError::NotFound(title.to_string()));
        }
        if page.pageprops.and_then(|p| p.disambiguation).is_some() {
            return Err(LookupError::Ambiguous(title.to_string()));
        }

        match page.extract.map(|e| e.trim().to_string()) {
            Some(extract) if !extract.is_empty() => Ok(extract),
            _ => Err(LookupError::NotFound(title.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> WikiClient {
        let config = Config {
            wiki_base_url: server.uri(),
            ..Config::default()
        };
        WikiClient::new(&config).unwrap()
    }

    async fn mount_search(server: &MockServer, hits: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("list", "search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": {"search": hits}
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn summary_of_best_match() {
        let server = MockServer::start().await;
        mount_search(&server, json!([{"title": "Rust (programming language)"}])).await;
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("titles", "Rust (programming language)"))
            .and(query_param("exsentences", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": {"pages": [{
                    "title": "Rust (programming language)",
                    "extract": "Rust is a language. It is fast.\n"
                }]}
            })))
            .mount(&server)
            .await;

        let summary = client_for(&server).summary("rust lang").await.unwrap();
        assert_eq!(summary, "Rust is a language. It is fast.");
    }

    #[tokio::test]
    async fn no_search_hits() {
        let server = MockServer::start().await;
        mount_search(&server, json!([])).await;

        let err = client_for(&server).summary("qwxzv").await.unwrap_err();
        assert!(matches!(err, LookupError::NotFound(_)));
        assert_eq!(err.user_message(), "No results found");
    }

    #[tokio::test]
    async fn disambiguation_page_is_rejected() {
        let server = MockServer::start().await;
        mount_search(&server, json!([{"title": "Mercury"}])).await;
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("titles", "Mercury"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": {"pages": [{
                    "title": "Mercury",
                    "extract": "Mercury may refer to:",
                    "pageprops": {"disambiguation": ""}
                }]}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).summary("mercury").await.unwrap_err();
        assert!(matches!(err, LookupError::Ambiguous(_)));
    }

    #[tokio::test]
    async fn server_error_collapses_to_no_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server).summary("anything").await.unwrap_err();
        assert!(matches!(err, LookupError::Request(_)));
        assert_eq!(err.user_message(), "No results found");
    }

    #[tokio::test]
    async fn blank_query_skips_network() {
        let server = MockServer::start().await;
        let err = client_for(&server).summary("  ").await.unwrap_err();
        assert!(matches!(err, LookupError::EmptyQuery));
    }
}
