//! Request identity keys.

use crate::model::{Method, Request};
use sha2::{Digest, Sha256};
use url::Url;

/// Compute the bucket key for a request identity (method + URL).
///
/// The URL is used as given, fragment excluded, so callers should canonicalize
/// before building a [`Request`].
pub fn compute_request_key(method: &Method, url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);

    let mut hasher = Sha256::new();
    hasher.update(method.as_str().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_str().as_bytes());
    hex::encode(hasher.finalize())
}

/// Shorthand for [`compute_request_key`] on a full request.
pub fn request_key(request: &Request) -> String {
    compute_request_key(&request.method, &request.url)
}
