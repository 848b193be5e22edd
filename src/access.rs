//! Strategies for presenting a bearer access token on a protected-resource request.
//!
//! Each method both attaches a token and reads it back, so a credential can tell whether a
//! rejected request carried the token it currently holds.

// crates.io
use oauth2::http::{
	HeaderValue, Method, Uri,
	header::{AUTHORIZATION, CONTENT_TYPE},
	uri::PathAndQuery,
};
use url::form_urlencoded;
// self
use crate::{_prelude::*, error::ConfigError, http::HttpRequest};

const ACCESS_TOKEN: &str = "access_token";
const BEARER_PREFIX: &str = "Bearer ";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Attaches and extracts bearer access tokens.
pub trait AccessMethod
where
	Self: Send + Sync,
{
	/// Places `token` on `request`, replacing any token already present.
	fn attach(&self, request: &mut HttpRequest, token: &str) -> Result<()>;

	/// Reads the token carried by `request`, if any.
	fn extract(&self, request: &HttpRequest) -> Option<String>;
}

/// `Authorization: Bearer <token>` (RFC 6750 §2.1).
#[derive(Clone, Copy, Debug, Default)]
pub struct AuthorizationHeaderAccess;
impl AccessMethod for AuthorizationHeaderAccess {
	fn attach(&self, request: &mut HttpRequest, token: &str) -> Result<()> {
		let value = HeaderValue::from_str(&format!("{BEARER_PREFIX}{token}"))
			.map_err(|_| ConfigError::InvalidHeaderValue { header: "authorization" })?;

		request.headers_mut().insert(AUTHORIZATION, value);

		Ok(())
	}

	fn extract(&self, request: &HttpRequest) -> Option<String> {
		request
			.headers()
			.get_all(AUTHORIZATION)
			.iter()
			.filter_map(|value| value.to_str().ok())
			.find_map(|value| value.strip_prefix(BEARER_PREFIX))
			.map(Into::into)
	}
}

/// `access_token` URL query parameter (RFC 6750 §2.3).
#[derive(Clone, Copy, Debug, Default)]
pub struct QueryParameterAccess;
impl AccessMethod for QueryParameterAccess {
	fn attach(&self, request: &mut HttpRequest, token: &str) -> Result<()> {
		let original = request.uri().clone();
		let query = with_access_token(original.query().unwrap_or_default().as_bytes(), token);
		let path_and_query = format!("{}?{}", original.path(), String::from_utf8_lossy(&query));
		let mut parts = original.clone().into_parts();

		parts.path_and_query = Some(
			PathAndQuery::try_from(path_and_query)
				.map_err(|_| ConfigError::invalid_uri(&original))?,
		);
		*request.uri_mut() =
			Uri::from_parts(parts).map_err(|_| ConfigError::invalid_uri(&original))?;

		Ok(())
	}

	fn extract(&self, request: &HttpRequest) -> Option<String> {
		let query = request.uri().query()?;

		form_urlencoded::parse(query.as_bytes())
			.find(|(k, _)| k == ACCESS_TOKEN)
			.map(|(_, v)| v.into_owned())
	}
}

/// `access_token` field in a form-encoded body (RFC 6750 §2.2).
///
/// GET requests have no body to carry the field and are rejected, as are non-empty bodies that
/// are not `application/x-www-form-urlencoded`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FormEncodedBodyAccess;
impl AccessMethod for FormEncodedBodyAccess {
	fn attach(&self, request: &mut HttpRequest, token: &str) -> Result<()> {
		if *request.method() == Method::GET {
			return Err(
				ConfigError::FormAccessOnGet { method: request.method().to_string() }.into()
			);
		}

		if !request.body().is_empty() && !is_form_encoded(request) {
			let content_type = request
				.headers()
				.get(CONTENT_TYPE)
				.and_then(|value| value.to_str().ok())
				.unwrap_or("none")
				.to_owned();

			return Err(ConfigError::FormAccessOnNonFormBody { content_type }.into());
		}

		let body = with_access_token(request.body(), token);

		if !is_form_encoded(request) {
			request
				.headers_mut()
				.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
		}

		*request.body_mut() = body;

		Ok(())
	}

	fn extract(&self, request: &HttpRequest) -> Option<String> {
		if !is_form_encoded(request) {
			return None;
		}

		form_urlencoded::parse(request.body())
			.find(|(k, _)| k == ACCESS_TOKEN)
			.map(|(_, v)| v.into_owned())
	}
}

/// Drops every `access_token` pair from `raw` and appends a fresh one, leaving the bytes of the
/// other pairs untouched.
fn with_access_token(raw: &[u8], token: &str) -> Vec<u8> {
	let mut out = raw
		.split(|b| *b == b'&')
		.filter(|pair| {
			!pair.is_empty()
				&& !form_urlencoded::parse(pair).next().is_some_and(|(k, _)| k == ACCESS_TOKEN)
		})
		.collect::<Vec<_>>()
		.join(&b'&');

	if !out.is_empty() {
		out.push(b'&');
	}

	out.extend(
		form_urlencoded::Serializer::new(String::new())
			.append_pair(ACCESS_TOKEN, token)
			.finish()
			.into_bytes(),
	);

	out
}

pub(crate) fn is_form_encoded(request: &HttpRequest) -> bool {
	request
		.headers()
		.get(CONTENT_TYPE)
		.and_then(|value| value.to_str().ok())
		.and_then(|value| value.split(';').next())
		.is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}
