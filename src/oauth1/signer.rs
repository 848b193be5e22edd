//! Signature methods: HMAC-SHA1, HMAC-SHA256, and RSA-SHA1.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use rsa::{
	RsaPrivateKey,
	pkcs1v15::SigningKey,
	signature::{SignatureEncoding, Signer},
};
use sha1::Sha1;
use sha2::Sha256;
// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError, oauth1::escape};

/// Produces `oauth_signature` from a signature base string.
pub trait OAuthSigner
where
	Self: Send + Sync,
{
	/// Value of `oauth_signature_method`.
	fn signature_method(&self) -> &'static str;

	/// Signs `base_string`; the result is base64 encoded.
	fn compute_signature(&self, base_string: &str) -> Result<String>;
}

/// Shared-secret material for the HMAC methods.
///
/// The key is `escape(client_secret) & escape(token_secret)`; the `&` is always present, even
/// without a token secret.
#[derive(Clone, Debug, Default)]
pub struct HmacSecrets {
	/// Consumer (client) shared secret.
	pub client_shared_secret: Option<TokenSecret>,
	/// Token shared secret from the temporary or token credentials.
	pub token_shared_secret: Option<TokenSecret>,
}
impl HmacSecrets {
	fn signing_key(&self) -> String {
		let escaped = |secret: &Option<TokenSecret>| {
			secret.as_ref().map(|s| escape(s.expose())).unwrap_or_default()
		};

		format!("{}&{}", escaped(&self.client_shared_secret), escaped(&self.token_shared_secret))
	}
}

fn signing_error(e: impl Display) -> ConfigError {
	ConfigError::Signing { message: e.to_string() }
}

macro_rules! def_hmac_signer {
	($name:ident, $digest:ty, $method:literal, $doc:literal) => {
		#[doc = $doc]
		#[derive(Clone, Debug, Default)]
		pub struct $name(HmacSecrets);
		impl $name {
			/// Creates a signer from the client shared secret.
			pub fn new(client_shared_secret: impl Into<String>) -> Self {
				Self(HmacSecrets {
					client_shared_secret: Some(TokenSecret::new(client_shared_secret)),
					token_shared_secret: None,
				})
			}

			/// Sets the token shared secret.
			pub fn with_token_shared_secret(mut self, secret: impl Into<String>) -> Self {
				self.0.token_shared_secret = Some(TokenSecret::new(secret));

				self
			}

			/// Secret material used for the signing key.
			pub fn secrets(&self) -> &HmacSecrets {
				&self.0
			}
		}
		impl OAuthSigner for $name {
			fn signature_method(&self) -> &'static str {
				$method
			}

			fn compute_signature(&self, base_string: &str) -> Result<String> {
				let mut mac = Hmac::<$digest>::new_from_slice(self.0.signing_key().as_bytes())
					.map_err(signing_error)?;

				mac.update(base_string.as_bytes());

				Ok(STANDARD.encode(mac.finalize().into_bytes()))
			}
		}
	};
}

def_hmac_signer! { HmacSha1Signer, Sha1, "HMAC-SHA1", "`HMAC-SHA1` signer (RFC 5849 §3.4.2)." }
def_hmac_signer! { HmacSha256Signer, Sha256, "HMAC-SHA256", "`HMAC-SHA256` signer." }

/// `RSA-SHA1` signer (RFC 5849 §3.4.3) over the UTF-8 base string.
#[derive(Clone)]
pub struct RsaSha1Signer(SigningKey<Sha1>);
impl RsaSha1Signer {
	/// Wraps an already parsed private key.
	pub fn new(key: RsaPrivateKey) -> Self {
		Self(SigningKey::<Sha1>::new(key))
	}
}
impl OAuthSigner for RsaSha1Signer {
	fn signature_method(&self) -> &'static str {
		"RSA-SHA1"
	}

	fn compute_signature(&self, base_string: &str) -> Result<String> {
		let signature = self
			.0
			.try_sign(base_string.as_bytes())
			.map_err(signing_error)?;

		Ok(STANDARD.encode(signature.to_bytes()))
	}
}
impl Debug for RsaSha1Signer {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("RsaSha1Signer(..)")
	}
}
