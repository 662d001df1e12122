use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::error::{CatalogError, Result};
use crate::models::{self, Item, Listing, RepoInfo};

// ---------------------------------------------------------------------------
// Internal response handling
// ---------------------------------------------------------------------------

/// Shared logic for building a configured [`Client`] and making requests.
#[derive(Clone)]
struct BaseClient {
    http: Client,
}

impl BaseClient {
    fn new(config: &Config) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        // GitHub rejects requests without a user agent.
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(concat!(
                "stalcraft-catalog/",
                env!("CARGO_PKG_VERSION")
            )),
        );

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        Ok(Self { http })
    }

    /// Map the status code to an error, or return the raw body.
    fn handle_response(&self, url: &str, response: Response) -> Result<Vec<u8>> {
        let status = response.status().as_u16();

        if (200..300).contains(&status) {
            return Ok(response.bytes()?.to_vec());
        }

        // Error bodies are best effort; GitHub sends `{ "message": ... }`.
        let data: serde_json::Value = response
            .json()
            .unwrap_or_else(|_| serde_json::Value::Object(serde_json::Map::new()));
        let msg = data
            .get("message")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| url.to_string());

        tracing::warn!(status, url, "request failed");

        match status {
            404 => Err(CatalogError::NotFound { message: msg }),
            403 | 429 => Err(CatalogError::RateLimited { message: msg }),
            _ => Err(CatalogError::Api {
                status,
                message: msg,
            }),
        }
    }

    fn get(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!(url, "GET");
        let resp = self.http.get(url).send()?;
        self.handle_response(url, resp)
    }

    fn get_as<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let body = self.get(url)?;
        models::from_slice(&body).map_err(|e| CatalogError::decode(url, e))
    }
}

// ---------------------------------------------------------------------------
// Public client
// ---------------------------------------------------------------------------

/// Entry point for the remote item database.
///
/// ```no_run
/// use stalcraft_catalog::{CatalogClient, Config};
///
/// let client = CatalogClient::new(&Config::default()).unwrap();
/// let listing = client.listing().list().unwrap();
/// println!("{} items", listing.len());
/// ```
#[derive(Clone)]
pub struct CatalogClient {
    base: BaseClient,
    database_url: String,
    repo_api_url: String,
}

impl CatalogClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            base: BaseClient::new(config)?,
            database_url: config.region_url(),
            repo_api_url: config.repo_api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Full URL of a document or icon path in the database.
    pub fn icon_url(&self, path: &str) -> String {
        join_url(&self.database_url, path)
    }

    // -- sub-client accessors ------------------------------------------------

    pub fn listing(&self) -> ListingClient<'_> {
        ListingClient { client: self }
    }

    pub fn items(&self) -> ItemsClient<'_> {
        ItemsClient { client: self }
    }

    pub fn repository(&self) -> RepositoryClient<'_> {
        RepositoryClient { client: self }
    }
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

// ===========================================================================
// Sub-clients
// ===========================================================================

// ---- Listing --------------------------------------------------------------

pub struct ListingClient<'a> {
    client: &'a CatalogClient,
}

impl ListingClient<'_> {
    /// Fetch `listing.json`, the index of every item document.
    pub fn list(&self) -> Result<Vec<Listing>> {
        let url = join_url(&self.client.database_url, "listing.json");
        self.client.base.get_as(&url)
    }
}

// ---- Items ----------------------------------------------------------------

pub struct ItemsClient<'a> {
    client: &'a CatalogClient,
}

impl ItemsClient<'_> {
    /// Fetch a single item document by its database path.
    pub fn get(&self, path: &str) -> Result<Item> {
        let url = join_url(&self.client.database_url, path);
        self.client.base.get_as(&url)
    }

    /// Fetch the item a listing entry points to, carrying over its icon path.
    pub fn get_listed(&self, listing: &Listing) -> Result<Item> {
        let mut item = self.get(&listing.data)?;
        if item.icon_path.is_none() {
            item.icon_path = listing.icon.clone();
        }
        Ok(item)
    }
}

// ---- Repository metadata --------------------------------------------------

pub struct RepositoryClient<'a> {
    client: &'a CatalogClient,
}

impl RepositoryClient<'_> {
    /// Repository metadata; `updated_at` drives the update check.
    pub fn info(&self) -> Result<RepoInfo> {
        self.client.base.get_as(&self.client.repo_api_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve one canned response on a local port; returns the base URL.
    fn serve_once(status: &'static str, content_type: &'static str, body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                line.clear();
            }
            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
        });
        format!("http://{addr}")
    }

    fn client_for(base: String) -> CatalogClient {
        let config = Config {
            database_url: base.clone(),
            repo_api_url: format!("{base}/repo"),
            ..Config::default()
        };
        CatalogClient::new(&config).unwrap()
    }

    #[test]
    fn join_url_normalises_slashes() {
        assert_eq!(join_url("https://a/b/", "/c.json"), "https://a/b/c.json");
        assert_eq!(join_url("https://a/b", "c.json"), "https://a/b/c.json");
    }

    #[test]
    fn icon_url_uses_region_root() {
        let config = Config {
            region: "global".into(),
            ..Config::default()
        };
        let client = CatalogClient::new(&config).unwrap();
        assert_eq!(
            client.icon_url("/icons/weapon/abc.png"),
            format!("{}/global/icons/weapon/abc.png", crate::config::DEFAULT_DATABASE_URL)
        );
    }

    #[test]
    fn non_json_success_body_is_a_decode_error() {
        let base = serve_once("200 OK", "text/html", "<html>not json</html>".into());
        match client_for(base).listing().list() {
            Err(CatalogError::Decode { context, .. }) => {
                assert!(context.ends_with("/ru/listing.json"), "{context}");
            }
            other => panic!("expected a decode error, got {other:?}"),
        }
    }

    #[test]
    fn missing_document_is_not_found() {
        let base = serve_once(
            "404 Not Found",
            "application/json",
            r#"{"message":"no such item"}"#.into(),
        );
        match client_for(base).items().get("/items/x.json") {
            Err(CatalogError::NotFound { message }) => assert_eq!(message, "no such item"),
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[test]
    fn rate_limit_is_reported() {
        let base = serve_once("403 Forbidden", "text/plain", "quota".into());
        assert!(matches!(
            client_for(base).repository().info(),
            Err(CatalogError::RateLimited { .. })
        ));
    }

    #[test]
    fn deeply_nested_item_is_fetched() {
        let mut block = r#"{"type":"usage","name":{"type":"text","text":"leaf"}}"#.to_string();
        for _ in 0..300 {
            block = format!(r#"{{"type":"list","elements":[{block}]}}"#);
        }
        let body = format!(
            r#"{{"id":"deep","name":{{"type":"text","text":"Deep"}},"infoBlocks":[{block}]}}"#
        );
        let base = serve_once("200 OK", "application/json", body);

        let item = client_for(base).items().get("/items/deep.json").unwrap();
        assert_eq!(item.info_blocks[0].depth(), 300);
    }
}
