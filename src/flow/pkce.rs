//! Proof Key for Code Exchange (RFC 7636).

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, auth::TokenSecret, clock::RandomSource};

const VERIFIER_BYTES: usize = 32;

/// PKCE verifier and its S256 challenge.
///
/// Only `S256` is produced. SHA-256 is always available here, so there is no `plain` fallback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PkcePair {
	verifier: TokenSecret,
	challenge: String,
}
impl PkcePair {
	/// Value of `code_challenge_method`.
	pub const METHOD: &'static str = "S256";

	/// Draws 32 random bytes for the verifier and derives the challenge.
	pub fn generate(rng: &dyn RandomSource) -> Self {
		let mut bytes = [0_u8; VERIFIER_BYTES];

		rng.fill_bytes(&mut bytes);

		Self::from_verifier(URL_SAFE_NO_PAD.encode(bytes))
	}

	/// Rebuilds the pair from a stored verifier.
	pub fn from_verifier(verifier: impl Into<String>) -> Self {
		let verifier = TokenSecret::new(verifier);
		let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.expose().as_bytes()));

		Self { verifier, challenge }
	}

	/// Verifier sent on the token request.
	pub fn verifier(&self) -> &TokenSecret {
		&self.verifier
	}

	/// Challenge sent on the authorization request.
	pub fn challenge(&self) -> &str {
		&self.challenge
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::SequenceRng;

	#[test]
	fn verifier_is_32_bytes_of_url_safe_base64() {
		let pair = PkcePair::generate(&SequenceRng::new([u64::MAX]));

		assert_eq!(pair.verifier().expose().len(), 43);
		assert_eq!(
			URL_SAFE_NO_PAD.decode(pair.verifier().expose()).expect("Verifier should decode."),
			[0xff; 32]
		);
		assert!(!pair.verifier().expose().contains(['+', '/', '=']));
	}

	#[test]
	fn challenge_matches_rfc_7636_appendix_b() {
		let pair = PkcePair::from_verifier("dBjftJeZ4CVP-mJ92K9ctDfDZ5DQTCTqbpJNUxEfARA");

		assert_eq!(pair.challenge(), "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
		assert_eq!(PkcePair::METHOD, "S256");
	}
}
