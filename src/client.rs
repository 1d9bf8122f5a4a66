use crate::accounts::AccountService;
use crate::error::{ApiError, Form3Error};
use crate::models::ErrorBody;
use log::{debug, info};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client as HttpClient, Method, Request, StatusCode};
use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use std::time::Duration;
use url::Url;

const BASE_URL: &str = "https://api.form3.tech/v1/";
const USER_AGENT: &str = concat!("form3/", env!("CARGO_PKG_VERSION"));

/// Handle to the Form3 API.
///
/// Holds the base endpoint and the HTTP client requests are sent through.
/// Cloning is cheap and every call is independent, so one instance can be
/// shared between tasks.
#[derive(Debug, Clone)]
pub struct Client {
    http: HttpClient,
    base_url: Url,
}

impl Client {
    /// Create a new client with the default base URL and transport.
    pub fn new() -> Result<Self, Form3Error> {
        let http = HttpClient::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()?;

        let client = Self::with_http_client(http)?;
        info!("Initialized Form3 API client with default base URL");
        Ok(client)
    }

    /// Create a client that sends requests through the given `reqwest` client.
    ///
    /// Timeouts, proxies, TLS and connection pooling are all taken from `http`.
    pub fn with_http_client(http: HttpClient) -> Result<Self, Form3Error> {
        Ok(Self {
            http,
            base_url: normalize_base_url(BASE_URL)?,
        })
    }

    /// Override the base URL (useful for tests or proxies).
    ///
    /// A missing trailing slash is added so relative paths extend the root
    /// path instead of replacing its last segment.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, Form3Error> {
        self.base_url = normalize_base_url(base_url)?;
        info!("Updated Form3 API base URL to {}", self.base_url);
        Ok(self)
    }

    /// Base URL every request path is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Account operations.
    pub fn accounts(&self) -> AccountService<'_> {
        AccountService::new(self)
    }

    /// Resolve `uri` against the base URL.
    ///
    /// `uri` may be a relative path, an absolute path or a full URL; only its
    /// path and query survive; scheme, host and port always come from the
    /// base URL.
    pub fn resolve(&self, uri: &str) -> Result<Url, Form3Error> {
        let reference = Url::options().base_url(Some(&self.base_url)).parse(uri)?;
        let mut url = self.base_url.clone();
        url.set_path(reference.path());
        url.set_query(reference.query());
        Ok(url)
    }

    /// Build a request for `uri`, encoding `body` as JSON when present.
    pub fn new_request<B>(
        &self,
        method: Method,
        uri: &str,
        body: Option<&B>,
    ) -> Result<Request, Form3Error>
    where
        B: Serialize + ?Sized,
    {
        let url = self.resolve(uri)?;
        let mut builder = self.http.request(method, url);
        let payload = match body {
            Some(body) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                serde_json::to_vec(body).map_err(Form3Error::Encode)?
            }
            None => Vec::new(),
        };
        Ok(builder.body(payload).build()?)
    }

    /// Send a prepared request and decode the response.
    ///
    /// Returns `Ok(None)` for `204 No Content` and for empty 2xx bodies.
    pub async fn send<T: DeserializeOwned>(
        &self,
        request: Request,
    ) -> Result<Option<T>, Form3Error> {
        debug!("{} request to {}", request.method(), request.url());
        let response = self.http.execute(request).await?;
        let status = response.status();
        debug!("Received status {}", status);
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let body = response.bytes().await?;
        decode_response(status, &body)
    }

    /// Build and send a request in one step.
    pub async fn execute<B, T>(
        &self,
        method: Method,
        uri: &str,
        body: Option<&B>,
    ) -> Result<Option<T>, Form3Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.new_request(method, uri, body)?;
        self.send(request).await
    }

    /// Issue a GET and decode the response body.
    pub async fn get<T: DeserializeOwned>(&self, uri: &str) -> Result<Option<T>, Form3Error> {
        self.execute::<(), T>(Method::GET, uri, None).await
    }

    /// Issue a POST with `body` encoded as JSON.
    pub async fn post<B, T>(&self, uri: &str, body: &B) -> Result<Option<T>, Form3Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(Method::POST, uri, Some(body)).await
    }

    /// Issue a DELETE; any response body on success is ignored.
    pub async fn delete(&self, uri: &str) -> Result<(), Form3Error> {
        self.execute::<(), IgnoredAny>(Method::DELETE, uri, None)
            .await
            .map(|_| ())
    }
}

/// Interpret a response status and body.
///
/// Non-2xx statuses become [`Form3Error::Api`], carrying the body's
/// `error_message` or, for an empty body, the status reason phrase.
pub fn decode_response<T: DeserializeOwned>(
    status: StatusCode,
    body: &[u8],
) -> Result<Option<T>, Form3Error> {
    if status == StatusCode::NO_CONTENT {
        return Ok(None);
    }

    if !status.is_success() {
        if body.is_empty() {
            return Err(ApiError::from_status(status).into());
        }
        let error: ErrorBody = serde_json::from_slice(body)
            .map_err(|source| Form3Error::InvalidErrorBody { status, source })?;
        return Err(ApiError {
            status,
            message: error.error_message.unwrap_or_default(),
        }
        .into());
    }

    if body.is_empty() {
        return Ok(None);
    }
    serde_json::from_slice(body).map(Some).map_err(Form3Error::Decode)
}

fn normalize_base_url(raw: &str) -> Result<Url, Form3Error> {
    let mut url = Url::parse(raw)?;
    if url.cannot_be_a_base() {
        return Err(Form3Error::InvalidParameter(
            "base url must be a hierarchical URL",
        ));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(Form3Error::InvalidParameter(
            "base url must not include query or fragment",
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
