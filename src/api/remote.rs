//! Purpose: Provide an HTTP client for the larder recipe API.
//! Exports: `RemoteClient`, `ListOptions`.
//! Role: Blocking client mirroring the server routes; used by integration
//! tests and available as library API.
//! Invariants: Error envelopes round-trip back into `Error` with the
//! originating kind.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::core::error::{Error, ErrorKind};
use crate::core::record::Record;
use crate::core::table::Envelope;

type ApiResult<T> = Result<T, Error>;

pub struct RemoteClient {
    base_url: Url,
    agent: ureq::Agent,
}

/// Query-string knobs for the list route.
#[derive(Debug, Default, Clone)]
pub struct ListOptions {
    pub recipe_cuisine: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: RemoteError,
}

#[derive(Deserialize)]
struct RemoteError {
    kind: String,
    message: Option<String>,
    hint: Option<String>,
}

impl RemoteClient {
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        let agent = ureq::AgentBuilder::new().build();
        Ok(Self { base_url, agent })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn health(&self) -> ApiResult<()> {
        let url = build_url(&self.base_url, &["healthz"])?;
        let _: Value = self.request_json("GET", &url, None)?;
        Ok(())
    }

    pub fn list(&self, options: &ListOptions) -> ApiResult<Envelope> {
        let page = options.page.unwrap_or(1);
        let url = if page == 1 {
            build_url(&self.base_url, &["recipes"])?
        } else {
            build_url(&self.base_url, &["recipes", "page", &page.to_string()])?
        };
        let mut request = self
            .agent
            .request("GET", url.as_str())
            .set("Accept", "application/json");
        if let Some(cuisine) = &options.recipe_cuisine {
            request = request.query("recipe_cuisine", cuisine);
        }
        if let Some(per_page) = options.per_page {
            request = request.query("per_page", &per_page.to_string());
        }
        match request.call() {
            Ok(resp) => read_json_response(resp),
            Err(ureq::Error::Status(code, resp)) => Err(parse_error_response(code, resp)),
            Err(ureq::Error::Transport(err)) => Err(transport_error(err)),
        }
    }

    pub fn get(&self, id: usize) -> ApiResult<Record> {
        let url = build_url(&self.base_url, &["recipes", &id.to_string()])?;
        self.request_json("GET", &url, None)
    }

    pub fn create(&self, fields: &Record) -> ApiResult<Record> {
        let url = build_url(&self.base_url, &["recipes"])?;
        self.request_json("POST", &url, Some(&Value::Object(fields.clone())))
    }

    pub fn update(&self, id: usize, patch: &Record) -> ApiResult<Record> {
        let url = build_url(&self.base_url, &["recipes", &id.to_string()])?;
        self.request_json("PATCH", &url, Some(&Value::Object(patch.clone())))
    }

    pub fn rate(&self, id: usize, rating: f64) -> ApiResult<Record> {
        let url = build_url(&self.base_url, &["recipes", &id.to_string(), "ratings"])?;
        self.request_json("PUT", &url, Some(&json!({ "rating": rating })))
    }

    fn request_json<R>(&self, method: &str, url: &Url, body: Option<&Value>) -> ApiResult<R>
    where
        R: DeserializeOwned,
    {
        let request = self
            .agent
            .request(method, url.as_str())
            .set("Accept", "application/json");
        let response = match body {
            None => request.call(),
            Some(body) => {
                let payload = serde_json::to_string(body).map_err(|err| {
                    Error::new(ErrorKind::Internal)
                        .with_message("failed to encode request json")
                        .with_source(err)
                })?;
                request
                    .set("Content-Type", "application/json")
                    .send_string(&payload)
            }
        };

        match response {
            Ok(resp) => read_json_response(resp),
            Err(ureq::Error::Status(code, resp)) => Err(parse_error_response(code, resp)),
            Err(ureq::Error::Transport(err)) => Err(transport_error(err)),
        }
    }
}

fn transport_error(err: ureq::Transport) -> Error {
    Error::new(ErrorKind::Io)
        .with_message("request failed")
        .with_source(err)
}

fn normalize_base_url(raw: String) -> ApiResult<Url> {
    let mut url = Url::parse(&raw).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid remote base url")
            .with_source(err)
    })?;
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("remote base url must use http or https scheme"));
    }
    if url.path() != "/" && !url.path().is_empty() {
        return Err(
            Error::new(ErrorKind::Usage).with_message("remote base url must not include a path")
        );
    }
    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn build_url(base_url: &Url, segments: &[&str]) -> ApiResult<Url> {
    let mut url = base_url.clone();
    {
        let mut path = url.path_segments_mut().map_err(|_| {
            Error::new(ErrorKind::Usage).with_message("remote base url cannot be a base")
        })?;
        path.clear();
        for segment in segments {
            path.push(segment);
        }
    }
    Ok(url)
}

fn read_json_response<R>(response: ureq::Response) -> ApiResult<R>
where
    R: DeserializeOwned,
{
    let body = response.into_string().map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read response body")
            .with_source(err)
    })?;
    serde_json::from_str(&body).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("invalid response json")
            .with_source(err)
    })
}

fn parse_error_response(status: u16, response: ureq::Response) -> Error {
    let body = response.into_string().unwrap_or_default();
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&body) {
        return error_from_remote(envelope.error);
    }
    let kind = error_kind_from_status(status);
    Error::new(kind).with_message(format!("remote error status {status}"))
}

fn error_from_remote(remote: RemoteError) -> Error {
    let kind = parse_error_kind(&remote.kind);
    let mut err = Error::new(kind);
    if let Some(message) = remote.message {
        err = err.with_message(message);
    }
    if let Some(hint) = remote.hint {
        err = err.with_hint(hint);
    }
    err
}

fn parse_error_kind(raw: &str) -> ErrorKind {
    match raw {
        "Usage" => ErrorKind::Usage,
        "NotFound" => ErrorKind::NotFound,
        "InvalidInput" => ErrorKind::InvalidInput,
        "MalformedRequest" => ErrorKind::MalformedRequest,
        "Io" => ErrorKind::Io,
        _ => ErrorKind::Internal,
    }
}

fn error_kind_from_status(status: u16) -> ErrorKind {
    match status {
        400 => ErrorKind::MalformedRequest,
        403 => ErrorKind::InvalidInput,
        404 => ErrorKind::NotFound,
        _ => ErrorKind::Internal,
    }
}
