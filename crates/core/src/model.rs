//! Request and response types shared by the store, the network and the router.
//!
//! These are deliberately small: a request is identified by its method and URL,
//! and a response is a fully buffered snapshot that can be written to a bucket
//! and replayed later.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// HTTP request method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Method {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Other(String),
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Other(m) => m.as_str(),
        }
    }
}

impl FromStr for Method {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Ok(match upper.as_str() {
            "GET" => Self::Get,
            "HEAD" => Self::Head,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "PATCH" => Self::Patch,
            "DELETE" => Self::Delete,
            "OPTIONS" => Self::Options,
            _ => Self::Other(upper),
        })
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the consumer intends to do with the response.
///
/// Mirrors the fetch destination a browser attaches to each request. A
/// `Document` destination marks a page navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Document,
    Script,
    Style,
    Worker,
    Image,
    #[default]
    Other,
}

impl Destination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Script => "script",
            Self::Style => "style",
            Self::Worker => "worker",
            Self::Image => "image",
            Self::Other => "other",
        }
    }
}

impl FromStr for Destination {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "document" | "navigate" => Self::Document,
            "script" => Self::Script,
            "style" => Self::Style,
            "worker" | "sharedworker" | "serviceworker" => Self::Worker,
            "image" => Self::Image,
            _ => Self::Other,
        })
    }
}

/// An intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    /// Value of the Accept header, if the consumer sent one.
    pub accept: Option<String>,
    pub destination: Destination,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url, accept: None, destination: Destination::Other }
    }

    /// A plain GET with no accept header and no declared destination.
    pub fn get(url: Url) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn is_get(&self) -> bool {
        self.method == Method::Get
    }

    pub fn is_navigation(&self) -> bool {
        self.destination == Destination::Document
    }

    /// True if the Accept header asks for HTML.
    pub fn accepts_html(&self) -> bool {
        self.accept
            .as_deref()
            .is_some_and(|a| a.to_ascii_lowercase().contains("text/html"))
    }
}

/// Where a response handed back by the router came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    #[default]
    Network,
    Cache,
}

/// A buffered HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    /// Final URL the response was served from (after redirects).
    pub url: Url,
    pub source: ResponseSource,
}

impl Response {
    pub fn new(status: u16, url: Url, body: impl Into<Bytes>) -> Self {
        Self { status, headers: Vec::new(), body: body.into(), url, source: ResponseSource::Network }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Status in the 200-299 range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value matching `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Mark the response as replayed from a bucket.
    pub fn into_cached(mut self) -> Self {
        self.source = ResponseSource::Cache;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_method_parse() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!(" Post ".parse::<Method>().unwrap(), Method::Post);
        assert_eq!("PROPFIND".parse::<Method>().unwrap(), Method::Other("PROPFIND".into()));
        assert_eq!(Method::Other("PROPFIND".into()).as_str(), "PROPFIND");
    }

    #[test]
    fn test_destination_parse() {
        assert_eq!("navigate".parse::<Destination>().unwrap(), Destination::Document);
        assert_eq!("Script".parse::<Destination>().unwrap(), Destination::Script);
        assert_eq!("sharedworker".parse::<Destination>().unwrap(), Destination::Worker);
        assert_eq!("font".parse::<Destination>().unwrap(), Destination::Other);
    }

    #[test]
    fn test_request_builders() {
        let req = Request::get(url("https://app.test/quiz"))
            .with_accept("text/html,application/xhtml+xml")
            .with_destination(Destination::Document);
        assert!(req.is_get());
        assert!(req.is_navigation());
        assert!(req.accepts_html());

        let plain = Request::new(Method::Post, url("https://app.test/api/answer"));
        assert!(!plain.is_get());
        assert!(!plain.accepts_html());
    }

    #[test]
    fn test_response_headers() {
        let resp = Response::new(404, url("https://app.test/x"), "missing").with_header("Content-Type", "text/plain");
        assert!(!resp.is_success());
        assert_eq!(resp.content_type(), Some("text/plain"));
        assert_eq!(resp.header("CONTENT-TYPE"), Some("text/plain"));
        assert_eq!(resp.source, ResponseSource::Network);
        assert_eq!(resp.into_cached().source, ResponseSource::Cache);
    }
}
