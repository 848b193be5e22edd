//! Client authentication applied to token requests just before they are sent.
//!
//! - [`ClientSecretBasic`]: HTTP Basic with client id and secret.
//! - [`ClientSecretPost`]: `client_id` / `client_secret` form fields.
//! - [`JwtBearerAuth`]: signed JWT client assertion (RFC 7523).

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use oauth2::http::{HeaderValue, header::AUTHORIZATION};
use rsa::{RsaPrivateKey, pkcs1::EncodeRsaPrivateKey};
// self
use crate::{
	_prelude::*,
	auth::{ClientId, TokenSecret},
	clock::{Clock, OsRandom, RandomSource, SystemClock},
	error::ConfigError,
	exchange::TokenRequestParts,
};

const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Pre-send hook that authenticates the client on a token request.
pub trait ClientAuthenticator
where
	Self: Send + Sync,
{
	/// Decorates `parts` with client credentials.
	fn authenticate(&self, parts: &mut TokenRequestParts) -> Result<()>;
}

/// `Authorization: Basic base64(client_id:client_secret)`.
#[derive(Clone, Debug)]
pub struct ClientSecretBasic {
	client_id: ClientId,
	client_secret: TokenSecret,
}
impl ClientSecretBasic {
	/// Creates a Basic authenticator.
	pub fn new(client_id: ClientId, client_secret: impl Into<String>) -> Self {
		Self { client_id, client_secret: TokenSecret::new(client_secret) }
	}
}
impl ClientAuthenticator for ClientSecretBasic {
	fn authenticate(&self, parts: &mut TokenRequestParts) -> Result<()> {
		let encoded =
			STANDARD.encode(format!("{}:{}", self.client_id, self.client_secret.expose()));
		let value = HeaderValue::from_str(&format!("Basic {encoded}"))
			.map_err(|_| ConfigError::InvalidHeaderValue { header: "authorization" })?;

		parts.headers.insert(AUTHORIZATION, value);

		Ok(())
	}
}

/// `client_id` and optional `client_secret` sent as form fields.
///
/// Public clients (installed apps using PKCE) use this with no secret.
#[derive(Clone, Debug)]
pub struct ClientSecretPost {
	client_id: ClientId,
	client_secret: Option<TokenSecret>,
}
impl ClientSecretPost {
	/// Creates a form-field authenticator.
	pub fn new(client_id: ClientId, client_secret: Option<String>) -> Self {
		Self { client_id, client_secret: client_secret.map(TokenSecret::new) }
	}
}
impl ClientAuthenticator for ClientSecretPost {
	fn authenticate(&self, parts: &mut TokenRequestParts) -> Result<()> {
		parts.set_field("client_id", self.client_id.as_ref());

		if let Some(secret) = &self.client_secret {
			parts.set_field("client_secret", secret.expose());
		}

		Ok(())
	}
}

/// Produces a compact JWS for a given audience.
pub trait AssertionSigner
where
	Self: Send + Sync,
{
	/// Signs a fresh assertion addressed to `audience` (the token endpoint).
	fn sign_assertion(&self, audience: &str) -> Result<String>;
}

/// JWT-bearer client assertion.
///
/// Sets `grant_type=client_credentials`, `client_assertion_type`, and `client_assertion`,
/// replacing any values already on the request.
#[derive(Clone)]
pub struct JwtBearerAuth {
	signer: Arc<dyn AssertionSigner>,
}
impl JwtBearerAuth {
	/// Wraps an assertion signer.
	pub fn new(signer: Arc<dyn AssertionSigner>) -> Self {
		Self { signer }
	}
}
impl ClientAuthenticator for JwtBearerAuth {
	fn authenticate(&self, parts: &mut TokenRequestParts) -> Result<()> {
		let assertion = self.signer.sign_assertion(parts.endpoint.as_str())?;

		parts.set_field("grant_type", "client_credentials");
		parts.set_field("client_assertion_type", CLIENT_ASSERTION_TYPE);
		parts.set_field("client_assertion", assertion);

		Ok(())
	}
}
impl Debug for JwtBearerAuth {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("JwtBearerAuth(..)")
	}
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
	iss: &'a str,
	sub: &'a str,
	aud: &'a str,
	iat: i64,
	exp: i64,
	jti: String,
}

/// RS256 assertion signer.
///
/// Claims: `iss` = issuer, `sub` = subject (defaults to the issuer), `aud` = token endpoint,
/// `iat` = now, `exp` = now + lifetime (one hour by default), `jti` = 128 random bits in hex.
pub struct RsaAssertionSigner {
	issuer: String,
	subject: Option<String>,
	key_id: Option<String>,
	key: EncodingKey,
	lifetime: Duration,
	clock: Arc<dyn Clock>,
	rng: Arc<dyn RandomSource>,
}
impl RsaAssertionSigner {
	/// Creates a signer for `issuer` using the system clock and OS randomness.
	///
	/// Fails when the key cannot be serialized to PKCS#1 DER.
	pub fn new(issuer: impl Into<String>, key: &RsaPrivateKey) -> Result<Self> {
		let der =
			key.to_pkcs1_der().map_err(|e| ConfigError::Signing { message: e.to_string() })?;

		Ok(Self {
			issuer: issuer.into(),
			subject: None,
			key_id: None,
			key: EncodingKey::from_rsa_der(der.as_bytes()),
			lifetime: Duration::hours(1),
			clock: Arc::new(SystemClock),
			rng: Arc::new(OsRandom),
		})
	}

	/// Sets the `sub` claim.
	pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
		self.subject = Some(subject.into());

		self
	}

	/// Sets the `kid` header.
	pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
		self.key_id = Some(key_id.into());

		self
	}

	/// Overrides the assertion lifetime.
	pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
		self.lifetime = lifetime;

		self
	}

	/// Overrides the clock used for `iat`/`exp`.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Overrides the random source used for `jti`.
	pub fn with_random_source(mut self, rng: Arc<dyn RandomSource>) -> Self {
		self.rng = rng;

		self
	}
}
impl AssertionSigner for RsaAssertionSigner {
	fn sign_assertion(&self, audience: &str) -> Result<String> {
		let iat = self.clock.now().unix_timestamp();
		let claims = AssertionClaims {
			iss: &self.issuer,
			sub: self.subject.as_deref().unwrap_or(&self.issuer),
			aud: audience,
			iat,
			exp: iat + self.lifetime.whole_seconds(),
			jti: format!("{:016x}{:016x}", self.rng.next_u64(), self.rng.next_u64()),
		};
		let mut header = Header::new(Algorithm::RS256);

		header.kid = self.key_id.clone();

		jsonwebtoken::encode(&header, &claims, &self.key)
			.map_err(|e| ConfigError::Signing { message: e.to_string() }.into())
	}
}
impl Debug for RsaAssertionSigner {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RsaAssertionSigner")
			.field("issuer", &self.issuer)
			.field("subject", &self.subject)
			.field("key_id", &self.key_id)
			.field("lifetime", &self.lifetime)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
	use oauth2::http::HeaderMap;
	use rsa::{
		pkcs1v15::{Signature, VerifyingKey},
		signature::Verifier,
	};
	use sha2::Sha256;
	use time::macros::datetime;
	// self
	use super::*;
	use crate::_preludet::{ManualClock, SequenceRng};

	fn parts(form: &[(&str, &str)]) -> TokenRequestParts {
		TokenRequestParts {
			endpoint: Url::parse("https://auth.example.com/token")
				.expect("Endpoint fixture should parse."),
			headers: HeaderMap::new(),
			form: form.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect(),
		}
	}

	fn client_id() -> ClientId {
		ClientId::new("client-1").expect("Client fixture should be valid.")
	}

	#[test]
	fn client_secret_post_appends_fields() {
		let mut parts = parts(&[("grant_type", "refresh_token")]);

		ClientSecretPost::new(client_id(), Some("s".into()))
			.authenticate(&mut parts)
			.expect("Authentication should succeed.");

		assert_eq!(
			parts.form,
			[
				("grant_type".to_owned(), "refresh_token".to_owned()),
				("client_id".into(), "client-1".into()),
				("client_secret".into(), "s".into()),
			]
		);
	}

	#[test]
	fn client_secret_debug_is_redacted() {
		let auth = ClientSecretBasic::new(client_id(), "very-secret");

		assert!(!format!("{auth:?}").contains("very-secret"));
	}

	#[test]
	fn rsa_assertion_is_verifiable_and_sets_fixed_fields() {
		let mut os_rng = rsa::rand_core::OsRng;
		let key = RsaPrivateKey::new(&mut os_rng, 1024).expect("Test key should generate.");
		let verifying_key = VerifyingKey::<Sha256>::new(key.to_public_key());
		let signer = RsaAssertionSigner::new("svc@example.com", &key)
			.expect("Signer should accept the generated key.")
			.with_key_id("k1")
			.with_clock(Arc::new(ManualClock::new(datetime!(2024-01-01 00:00 UTC))))
			.with_random_source(Arc::new(SequenceRng::new([0xab_u64, 0xcd])));
		let mut parts = parts(&[("grant_type", "refresh_token"), ("refresh_token", "r")]);

		JwtBearerAuth::new(Arc::new(signer))
			.authenticate(&mut parts)
			.expect("Authentication should succeed.");

		let field = |key: &str| {
			parts.form.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone()).unwrap_or_default()
		};

		assert_eq!(field("grant_type"), "client_credentials");
		assert_eq!(field("client_assertion_type"), CLIENT_ASSERTION_TYPE);

		let jwt = field("client_assertion");
		let (signing_input, signature) =
			jwt.rsplit_once('.').expect("JWT should contain a signature segment.");
		let signature = Signature::try_from(
			URL_SAFE_NO_PAD.decode(signature).expect("Signature should be base64url.").as_slice(),
		)
		.expect("Signature bytes should parse.");

		verifying_key
			.verify(signing_input.as_bytes(), &signature)
			.expect("Signature should verify with the public key.");

		let segment = |idx: usize| -> serde_json::Value {
			let raw = signing_input.split('.').nth(idx).expect("JWT segment should exist.");

			let bytes = URL_SAFE_NO_PAD.decode(raw).expect("Segment should be base64url.");

			serde_json::from_slice(&bytes).expect("Segment should be JSON.")
		};
		let header = segment(0);

		assert_eq!(header["alg"], "RS256");
		assert_eq!(header["kid"], "k1");

		let claims = segment(1);

		assert_eq!(claims["iss"], "svc@example.com");
		assert_eq!(claims["sub"], "svc@example.com");
		assert_eq!(claims["aud"], "https://auth.example.com/token");
		assert_eq!(claims["iat"], 1_704_067_200);
		assert_eq!(claims["exp"], 1_704_070_800);
		assert_eq!(claims["jti"], "00000000000000ab00000000000000cd");
	}
}
