//! Authorization request URLs.
//!
//! [`AuthorizationRequestUrl`] is an immutable parameter bag over the authorization endpoint.
//! The free functions pick the `response_type` for each flow variant.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, ScopeSet},
	flow::pkce::PkcePair,
};

/// Authorization endpoint plus ordered query parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationRequestUrl {
	endpoint: Url,
	params: Vec<(String, String)>,
	pkce: Option<PkcePair>,
}
impl AuthorizationRequestUrl {
	/// Starts a URL with `response_type` and `client_id`.
	pub fn new(endpoint: Url, response_type: &str, client_id: &ClientId) -> Self {
		Self { endpoint, params: Vec::new(), pkce: None }
			.with_param("response_type", response_type)
			.with_param("client_id", client_id.as_ref())
	}

	/// Sets `key`, replacing an existing value.
	pub fn with_param(mut self, key: &str, value: impl Into<String>) -> Self {
		let value = value.into();

		match self.params.iter_mut().find(|(k, _)| k == key) {
			Some(entry) => entry.1 = value,
			None => self.params.push((key.to_owned(), value)),
		}

		self
	}

	/// Sets `redirect_uri`.
	pub fn with_redirect_uri(self, redirect_uri: impl Into<String>) -> Self {
		self.with_param("redirect_uri", redirect_uri)
	}

	/// Sets `state`.
	pub fn with_state(self, state: impl Into<String>) -> Self {
		self.with_param("state", state)
	}

	/// Sets `scope`; an empty set leaves the parameter out.
	pub fn with_scopes(self, scopes: &ScopeSet) -> Self {
		if scopes.is_empty() {
			return self;
		}

		self.with_param("scope", scopes.normalized())
	}

	/// Adds `code_challenge` and `code_challenge_method`, keeping the pair for the token request.
	pub fn with_pkce(self, pkce: PkcePair) -> Self {
		let mut url = self
			.with_param("code_challenge", pkce.challenge())
			.with_param("code_challenge_method", PkcePair::METHOD);

		url.pkce = Some(pkce);

		url
	}

	/// Value of `key`, if set.
	pub fn param(&self, key: &str) -> Option<&str> {
		self.params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
	}

	/// PKCE pair whose challenge is on this URL.
	pub fn pkce(&self) -> Option<&PkcePair> {
		self.pkce.as_ref()
	}

	/// Renders the URL; query parameters already on the endpoint are kept first.
	pub fn to_url(&self) -> Url {
		let mut url = self.endpoint.clone();

		url.query_pairs_mut().extend_pairs(self.params.iter());

		url
	}
}
impl Display for AuthorizationRequestUrl {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.to_url().as_str())
	}
}

/// Authorization code flow URL (`response_type=code`).
pub fn authorization_code_url(endpoint: Url, client_id: &ClientId) -> AuthorizationRequestUrl {
	AuthorizationRequestUrl::new(endpoint, "code", client_id)
}

/// Implicit (browser client) flow URL (`response_type=token`).
pub fn browser_client_url(endpoint: Url, client_id: &ClientId) -> AuthorizationRequestUrl {
	AuthorizationRequestUrl::new(endpoint, "token", client_id)
}
