//! Crate-level error types shared by credentials, exchanges, flows, signers, and stores.

// crates.io
use oauth2::basic::BasicErrorResponse;
// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Credential store failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Programmer error or invalid local configuration.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, IO) before any HTTP status was received.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Token endpoint answered with a structured OAuth error body.
	#[error(transparent)]
	TokenResponse(#[from] TokenResponseError),
	/// Token endpoint answered with a body that does not match the expected schema.
	#[error(transparent)]
	UnparsableResponse(#[from] UnparsableResponseError),

	/// Authorization redirect carried neither or both of `code` and `error`.
	#[error("Authorization response URL is ambiguous: {reason}.")]
	AmbiguousResponseUrl {
		/// What made the redirect ambiguous.
		reason: &'static str,
	},
}
impl Error {
	/// HTTP status attached to the failure, if the token endpoint answered at all.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::TokenResponse(e) => Some(e.status),
			Self::UnparsableResponse(e) => Some(e.status),
			_ => None,
		}
	}

	/// Returns `true` for 4xx answers from the token endpoint.
	pub fn is_client_error(&self) -> bool {
		matches!(self.status(), Some(400..=499))
	}
}

/// Precondition violations and local configuration problems.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// An endpoint URL cannot be used.
	#[error("The {endpoint} endpoint is invalid: {url}.")]
	InvalidEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Offending URL.
		url: String,
	},
	/// A request URI could not be parsed or rebuilt.
	#[error("Request URI `{uri}` is invalid.")]
	InvalidRequestUri {
		/// Offending URI.
		uri: String,
	},
	/// A header value contains bytes that HTTP does not allow.
	#[error("Header value for {header} is invalid.")]
	InvalidHeaderValue {
		/// Header name.
		header: &'static str,
	},

	/// Form-encoded access tokens cannot ride on a GET request.
	#[error("The form-encoded body access method cannot be used with {method} requests.")]
	FormAccessOnGet {
		/// Offending HTTP method.
		method: String,
	},
	/// Form-encoded access tokens cannot be merged into a body of another media type.
	#[error("The form-encoded body access method cannot extend a {content_type} body.")]
	FormAccessOnNonFormBody {
		/// Content type of the existing body (`none` when absent).
		content_type: String,
	},
	/// A refresh token was supplied to a credential that cannot refresh.
	#[error(
		"Refresh tokens require a token server (transport, token endpoint, client authentication)."
	)]
	RefreshWithoutTokenServer,
	/// A PKCE-enabled flow was asked to redeem a code without the matching verifier.
	#[error("The authorization code flow uses PKCE but the token request has no code verifier.")]
	MissingPkceVerifier,
	/// Scope strings cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// Identifier validation failed.
	#[error(transparent)]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
	/// Token endpoint returned an `expires_in` that overflows the clock.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// A signer failed to produce a signature.
	#[error("Signature computation failed: {message}.")]
	Signing {
		/// Signer-supplied description.
		message: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}

	pub(crate) fn invalid_uri(uri: impl Display) -> Self {
		Self::InvalidRequestUri { uri: uri.to_string() }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Structured OAuth error returned by the token endpoint (`error`, `error_description`,
/// `error_uri`).
#[derive(Debug, ThisError)]
#[error("Token endpoint returned {status}: {}.", describe(.response))]
pub struct TokenResponseError {
	/// HTTP status code of the response.
	pub status: u16,
	/// Parsed error body.
	pub response: BasicErrorResponse,
}
impl TokenResponseError {
	/// OAuth `error` code, e.g. `invalid_grant`.
	pub fn error_code(&self) -> &str {
		self.response.error().as_ref()
	}
}

/// Non-success response whose body is not valid JSON in the expected schema.
#[derive(Debug, ThisError)]
#[error("Token endpoint returned {status} with an unparsable body.")]
pub struct UnparsableResponseError {
	/// HTTP status code of the response.
	pub status: u16,
	/// Raw response body kept for diagnostics.
	pub body: String,
	/// Structured parsing failure.
	#[source]
	pub source: serde_path_to_error::Error<serde_json::Error>,
}

fn describe(response: &BasicErrorResponse) -> String {
	match response.error_description() {
		Some(description) => format!("{} ({description})", response.error().as_ref()),
		None => response.error().as_ref().to_owned(),
	}
}
