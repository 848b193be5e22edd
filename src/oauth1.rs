//! OAuth 1.0a request signing (RFC 5849).
//!
//! [`OAuth1Authorizer`] builds a fresh [`OAuthParameters`] for every request (new nonce, new
//! timestamp), signs it with the configured [`OAuthSigner`], and sets the `Authorization`
//! header. It holds no per-request state and can be shared freely.

pub mod escape;
pub mod parameters;
pub mod signer;

pub use escape::escape;
pub use parameters::*;
pub use signer::*;

// crates.io
use oauth2::http::{HeaderValue, header::AUTHORIZATION};
// self
use crate::{
	_prelude::*,
	access::is_form_encoded,
	clock::{Clock, OsRandom, RandomSource, SystemClock},
	error::ConfigError,
	http::HttpRequest,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Signs outgoing requests with OAuth 1.0a.
pub struct OAuth1Authorizer {
	consumer_key: String,
	signer: Arc<dyn OAuthSigner>,
	token: Option<String>,
	callback: Option<String>,
	verifier: Option<String>,
	realm: Option<String>,
	version: Option<String>,
	clock: Arc<dyn Clock>,
	rng: Arc<dyn RandomSource>,
}
impl OAuth1Authorizer {
	/// Starts a builder with the required consumer key and signer.
	pub fn builder(
		consumer_key: impl Into<String>,
		signer: Arc<dyn OAuthSigner>,
	) -> OAuth1AuthorizerBuilder {
		OAuth1AuthorizerBuilder(Self {
			consumer_key: consumer_key.into(),
			signer,
			token: None,
			callback: None,
			verifier: None,
			realm: None,
			version: None,
			clock: Arc::new(SystemClock),
			rng: Arc::new(OsRandom),
		})
	}

	/// Signs `request` and sets its `Authorization` header.
	///
	/// Form fields are signed when the body is `application/x-www-form-urlencoded`.
	pub fn authorize(&self, request: &mut HttpRequest) -> Result<OAuthParameters> {
		let span = FlowSpan::new(FlowKind::OAuth1Signing, "authorize");

		span.in_scope(|| {
			obs::record_flow_outcome(span.kind(), FlowOutcome::Attempt);

			let result = self.authorize_inner(request);

			obs::record_result(span.kind(), &result);

			result
		})
	}

	fn authorize_inner(&self, request: &mut HttpRequest) -> Result<OAuthParameters> {
		let mut params = OAuthParameters {
			realm: self.realm.clone(),
			callback: self.callback.clone(),
			consumer_key: Some(self.consumer_key.clone()),
			nonce: Some(format!("{:x}", self.rng.next_u64() & i64::MAX as u64)),
			timestamp: Some(self.clock.now().unix_timestamp().to_string()),
			token: self.token.clone(),
			verifier: self.verifier.clone(),
			version: self.version.clone(),
			..Default::default()
		};
		let form = is_form_encoded(request).then(|| request.body().as_slice());

		params.sign(self.signer.as_ref(), request.method().as_str(), request.uri(), form)?;

		let header = HeaderValue::from_str(&params.authorization_header())
			.map_err(|_| ConfigError::InvalidHeaderValue { header: "authorization" })?;

		request.headers_mut().insert(AUTHORIZATION, header);

		Ok(params)
	}
}
impl Debug for OAuth1Authorizer {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuth1Authorizer")
			.field("consumer_key", &self.consumer_key)
			.field("signature_method", &self.signer.signature_method())
			.field("realm", &self.realm)
			.finish_non_exhaustive()
	}
}

/// Builder for [`OAuth1Authorizer`].
#[derive(Debug)]
pub struct OAuth1AuthorizerBuilder(OAuth1Authorizer);
impl OAuth1AuthorizerBuilder {
	/// Sets `oauth_token`.
	pub fn with_token(mut self, token: impl Into<String>) -> Self {
		self.0.token = Some(token.into());

		self
	}

	/// Sets `oauth_callback`.
	pub fn with_callback(mut self, callback: impl Into<String>) -> Self {
		self.0.callback = Some(callback.into());

		self
	}

	/// Sets `oauth_verifier`.
	pub fn with_verifier(mut self, verifier: impl Into<String>) -> Self {
		self.0.verifier = Some(verifier.into());

		self
	}

	/// Sets the header `realm`.
	pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
		self.0.realm = Some(realm.into());

		self
	}

	/// Sets `oauth_version` (usually `1.0`).
	pub fn with_version(mut self, version: impl Into<String>) -> Self {
		self.0.version = Some(version.into());

		self
	}

	/// Overrides the clock used for `oauth_timestamp`.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.0.clock = clock;

		self
	}

	/// Overrides the random source used for `oauth_nonce`.
	pub fn with_random_source(mut self, rng: Arc<dyn RandomSource>) -> Self {
		self.0.rng = rng;

		self
	}

	/// Finishes the authorizer.
	pub fn build(self) -> OAuth1Authorizer {
		self.0
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;
	use crate::_preludet::*;

	fn authorizer(rng: u64) -> OAuth1Authorizer {
		OAuth1Authorizer::builder("key", Arc::new(HmacSha1Signer::new("secret")))
			.with_token("tok")
			.with_realm("photos")
			.with_version("1.0")
			.with_clock(Arc::new(ManualClock::new(datetime!(2024-01-01 00:00 UTC))))
			.with_random_source(Arc::new(SequenceRng::new([rng])))
			.build()
	}

	#[test]
	fn signs_form_posts_and_sets_header() {
		let mut request = http::Request::builder()
			.method("POST")
			.uri("https://api.example.com/status?x=1")
			.header("content-type", "application/x-www-form-urlencoded; charset=utf-8")
			.body(b"status=hello+world".to_vec())
			.expect("Request fixture should build.");
		let params = authorizer(0xdead_beef).authorize(&mut request).expect("Signing should succeed.");

		assert_eq!(params.nonce.as_deref(), Some("deadbeef"));
		assert_eq!(params.timestamp.as_deref(), Some("1704067200"));

		let base = params
			.signature_base_string("POST", request.uri(), Some(request.body()))
			.expect("Base string should build.");

		assert!(base.contains("status%3Dhello%2520world"));
		assert_eq!(
			params.signature,
			Some(
				HmacSha1Signer::new("secret")
					.compute_signature(&base)
					.expect("Signing should succeed.")
			)
		);

		let header = request.headers()["authorization"].to_str().expect("Header should be ASCII.");

		assert!(header.starts_with("OAuth realm=\"photos\", oauth_consumer_key=\"key\", "));
		assert!(header.ends_with("oauth_token=\"tok\", oauth_version=\"1.0\""));
	}

	#[test]
	fn nonce_is_non_negative_hex() {
		let mut request = http::Request::builder()
			.uri("https://api.example.com/")
			.body(Vec::new())
			.expect("Request fixture should build.");
		let params = authorizer(u64::MAX).authorize(&mut request).expect("Signing should succeed.");

		assert_eq!(params.nonce.as_deref(), Some("7fffffffffffffff"));
	}

	#[test]
	fn non_form_bodies_are_not_signed() {
		let mut request = http::Request::builder()
			.method("POST")
			.uri("https://api.example.com/upload")
			.header("content-type", "application/json")
			.body(br#"{"a":1}"#.to_vec())
			.expect("Request fixture should build.");
		let params = authorizer(1).authorize(&mut request).expect("Signing should succeed.");
		let base = params
			.signature_base_string("POST", request.uri(), None)
			.expect("Base string should build.");

		assert_eq!(
			params.signature,
			Some(
				HmacSha1Signer::new("secret")
					.compute_signature(&base)
					.expect("Signing should succeed.")
			)
		);
	}
}
