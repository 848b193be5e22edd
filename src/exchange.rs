//! One round trip against the token endpoint.
//!
//! [`TokenExchange`] turns a [`TokenRequest`] into a form-encoded POST, lets the configured
//! [`ClientAuthenticator`] decorate it, and classifies the answer:
//!
//! - 2xx parses as a [`TokenResponse`]; a body that does not fit becomes
//!   [`Error::UnparsableResponse`].
//! - Non-2xx with an OAuth error body becomes [`Error::TokenResponse`].
//! - Non-2xx with anything else becomes [`Error::UnparsableResponse`] carrying the raw body.
//!
//! Exchanges never retry; refresh policy lives in [`Credential`](crate::credential::Credential).

pub mod client_auth;
pub mod grant;
pub mod response;

pub use client_auth::*;
pub use grant::*;
pub use response::*;

// crates.io
use oauth2::{
	basic::BasicErrorResponse,
	http::{
		HeaderMap, HeaderValue, Method,
		header::{ACCEPT, CONTENT_TYPE},
	},
};
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	error::{ConfigError, TokenResponseError, UnparsableResponseError},
	http::{HttpRequest, HttpResponse, HttpTransport},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Grant plus the optional scope and extension parameters sent with it.
#[derive(Clone, Debug)]
pub struct TokenRequest {
	/// Grant-specific fields.
	pub grant: TokenGrant,
	/// Requested scopes; omitted from the form when empty.
	pub scopes: ScopeSet,
	/// Extension parameters appended after the grant fields.
	pub extra: Vec<(String, String)>,
}
impl TokenRequest {
	/// Creates a request for `grant` with no scopes or extension parameters.
	pub fn new(grant: TokenGrant) -> Self {
		Self { grant, scopes: ScopeSet::default(), extra: Vec::new() }
	}

	/// Sets the requested scopes.
	pub fn with_scopes(mut self, scopes: ScopeSet) -> Self {
		self.scopes = scopes;

		self
	}

	/// Appends an extension parameter.
	pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.extra.push((key.into(), value.into()));

		self
	}

	/// Form fields in wire order: `grant_type`, grant fields, `scope`, extension parameters.
	pub fn form_fields(&self) -> Vec<(String, String)> {
		let mut form = vec![("grant_type".to_owned(), self.grant.grant_type().to_owned())];

		self.grant.append_fields(&mut form);

		if !self.scopes.is_empty() {
			form.push(("scope".into(), self.scopes.normalized()));
		}

		form.extend(self.extra.iter().cloned());

		form
	}
}

/// Mutable view of an outgoing token request handed to a [`ClientAuthenticator`].
#[derive(Debug)]
pub struct TokenRequestParts {
	/// Token endpoint the request targets (the JWT audience for client assertions).
	pub endpoint: Url,
	/// Extra headers merged over the defaults.
	pub headers: HeaderMap,
	/// Ordered form fields.
	pub form: Vec<(String, String)>,
}
impl TokenRequestParts {
	/// Replaces every `key` field with a single `key=value`, keeping its first position.
	pub fn set_field(&mut self, key: &str, value: impl Into<String>) {
		let value = value.into();

		match self.form.iter().position(|(k, _)| k == key) {
			Some(idx) => {
				self.form[idx].1 = value;

				let mut seen = 0;

				self.form.retain(|(k, _)| {
					if k != key {
						return true;
					}

					seen += 1;

					seen == 1
				});
			},
			None => self.form.push((key.to_owned(), value)),
		}
	}

	fn into_http_request(self) -> Result<HttpRequest> {
		let body = form_urlencoded::Serializer::new(String::new())
			.extend_pairs(self.form.iter())
			.finish();
		let mut request = oauth2::http::Request::builder()
			.method(Method::POST)
			.uri(self.endpoint.as_str())
			.header(CONTENT_TYPE, HeaderValue::from_static("application/x-www-form-urlencoded"))
			.header(ACCEPT, HeaderValue::from_static("application/json"))
			.body(body.into_bytes())
			.map_err(ConfigError::from)?;

		for (name, value) in self.headers {
			if let Some(name) = name {
				request.headers_mut().insert(name, value);
			}
		}

		Ok(request)
	}
}

/// Token-endpoint client bound to one transport, endpoint, and client authenticator.
#[derive(Clone)]
pub struct TokenExchange {
	transport: Arc<dyn HttpTransport>,
	token_endpoint: Url,
	client_auth: Arc<dyn ClientAuthenticator>,
}
impl TokenExchange {
	/// Creates an exchange; the endpoint must be an `http` or `https` URL.
	pub fn new(
		transport: Arc<dyn HttpTransport>,
		token_endpoint: Url,
		client_auth: Arc<dyn ClientAuthenticator>,
	) -> Result<Self> {
		if !matches!(token_endpoint.scheme(), "http" | "https") {
			return Err(ConfigError::InvalidEndpoint {
				endpoint: "token",
				url: token_endpoint.into(),
			}
			.into());
		}

		Ok(Self { transport, token_endpoint, client_auth })
	}

	/// Token endpoint URL.
	pub fn token_endpoint(&self) -> &Url {
		&self.token_endpoint
	}

	/// Sends `request` and parses the answer. Never retries.
	pub async fn execute(&self, request: &TokenRequest) -> Result<TokenResponse> {
		let span = FlowSpan::new(FlowKind::TokenExchange, "execute");

		span.instrument(async move {
			obs::record_flow_outcome(FlowKind::TokenExchange, FlowOutcome::Attempt);

			let result = self.execute_inner(request).await;

			obs::record_result(FlowKind::TokenExchange, &result);

			result
		})
		.await
	}

	async fn execute_inner(&self, request: &TokenRequest) -> Result<TokenResponse> {
		let mut parts = TokenRequestParts {
			endpoint: self.token_endpoint.clone(),
			headers: HeaderMap::new(),
			form: request.form_fields(),
		};

		self.client_auth.authenticate(&mut parts)?;

		let response = self.transport.send(parts.into_http_request()?).await?;

		parse_token_response(&response)
	}
}
impl Debug for TokenExchange {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenExchange")
			.field("token_endpoint", &self.token_endpoint.as_str())
			.finish_non_exhaustive()
	}
}

/// Classifies a token-endpoint response.
pub fn parse_token_response(response: &HttpResponse) -> Result<TokenResponse> {
	let status = response.status().as_u16();
	let body = response.body();

	if response.status().is_success() {
		return deserialize::<TokenResponse>(body)
			.map_err(|source| unparsable(status, body, source).into());
	}

	match deserialize::<BasicErrorResponse>(body) {
		Ok(error) => Err(TokenResponseError { status, response: error }.into()),
		Err(source) => Err(unparsable(status, body, source).into()),
	}
}

fn deserialize<T>(body: &[u8]) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
where
	T: for<'de> Deserialize<'de>,
{
	let mut de = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut de)
}

fn unparsable(
	status: u16,
	body: &[u8],
	source: serde_path_to_error::Error<serde_json::Error>,
) -> UnparsableResponseError {
	UnparsableResponseError { status, body: String::from_utf8_lossy(body).into_owned(), source }
}
