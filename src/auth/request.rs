//! The request as seen by authentication strategies.

use http::{HeaderMap, Method, Uri, header, request::Parts};

use crate::auth::context::UserContext;

/// Request head plus the identity slot strategies fill in.
///
/// Strategies read the head through the accessors; only `set_user` mutates.
#[derive(Debug)]
pub struct AuthRequest {
    parts: Parts,
    user: Option<UserContext>,
}

impl AuthRequest {
    pub fn new(parts: Parts) -> Self {
        Self { parts, user: None }
    }

    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Header value as text, if present and valid ASCII.
    pub fn header(&self, name: impl header::AsHeaderName) -> Option<&str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn user_agent(&self) -> Option<String> {
        self.header(header::USER_AGENT).map(|s| s.to_string())
    }

    /// First value of a query-string parameter, percent-decoded.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.parts.uri.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    pub fn user(&self) -> Option<&UserContext> {
        self.user.as_ref()
    }

    pub fn set_user(&mut self, user: UserContext) {
        self.user = Some(user);
    }

    pub fn into_parts(self) -> (Parts, Option<UserContext>) {
        (self.parts, self.user)
    }
}

#[cfg(test)]
pub(crate) fn request_for(uri: &str, headers: &[(&str, &str)]) -> AuthRequest {
    let mut builder = http::Request::builder().uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let (parts, _) = builder.body(()).unwrap().into_parts();
    AuthRequest::new(parts)
}
