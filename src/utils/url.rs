//! URL utility functions

use crate::error::Result;
use hyper::Uri;
use url::Url;

/// Join two paths with exactly one slash between them
pub fn single_joining_slash(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

/// Build the backend URI for a request, keeping the base path prefix and
/// merging both query strings
pub fn build_target_uri(base: &Url, request_uri: &Uri) -> Result<Uri> {
    let path = single_joining_slash(base.path(), request_uri.path());

    let query = match (base.query().filter(|q| !q.is_empty()), request_uri.query()) {
        (Some(b), Some(r)) if !r.is_empty() => Some(format!("{}&{}", b, r)),
        (Some(b), _) => Some(b.to_string()),
        (None, Some(r)) if !r.is_empty() => Some(r.to_string()),
        _ => None,
    };

    let authority = match base.port() {
        Some(port) => format!("{}:{}", base.host_str().unwrap_or_default(), port),
        None => base.host_str().unwrap_or_default().to_string(),
    };

    let mut target = format!("{}://{}{}", base.scheme(), authority, path);
    if let Some(query) = query {
        target.push('?');
        target.push_str(&query);
    }

    Ok(target.parse::<Uri>()?)
}
