//! Successful token-endpoint response.

// crates.io
use serde::{Deserializer, de::Error as DeError};
// self
use crate::{_prelude::*, auth::TokenSecret};

/// Successful token response (RFC 6749 §5.1).
///
/// `expires_in` accepts JSON numbers and numeric strings since several providers quote it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
	/// Issued access token.
	pub access_token: TokenSecret,
	/// Token type, usually `Bearer`.
	#[serde(default)]
	pub token_type: String,
	/// Lifetime in seconds from the moment of issue.
	#[serde(default, deserialize_with = "lenient_seconds")]
	pub expires_in: Option<i64>,
	/// Refresh token, if one was issued or rotated.
	#[serde(default)]
	pub refresh_token: Option<TokenSecret>,
	/// Granted scopes when they differ from the requested ones.
	#[serde(default)]
	pub scope: Option<String>,
}
impl TokenResponse {
	/// Response carrying only an access token.
	pub fn bearer(access_token: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			token_type: "Bearer".into(),
			expires_in: None,
			refresh_token: None,
			scope: None,
		}
	}

	/// Sets the lifetime in seconds.
	pub fn with_expires_in(mut self, seconds: i64) -> Self {
		self.expires_in = Some(seconds);

		self
	}

	/// Sets the refresh token.
	pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}
}

fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Seconds {
		Number(i64),
		Text(String),
	}

	match Option::<Seconds>::deserialize(deserializer)? {
		None => Ok(None),
		Some(Seconds::Number(n)) => Ok(Some(n)),
		Some(Seconds::Text(s)) => s
			.trim()
			.parse()
			.map(Some)
			.map_err(|_| D::Error::custom(format!("expires_in is not numeric: {s:?}"))),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn expires_in_accepts_numbers_and_strings() {
		let numeric: TokenResponse =
			serde_json::from_str(r#"{"access_token":"a","token_type":"Bearer","expires_in":60}"#)
				.expect("Numeric expires_in should parse.");
		let quoted: TokenResponse =
			serde_json::from_str(r#"{"access_token":"a","token_type":"Bearer","expires_in":"60"}"#)
				.expect("Quoted expires_in should parse.");

		assert_eq!(numeric.expires_in, Some(60));
		assert_eq!(quoted, numeric);
		assert!(
			serde_json::from_str::<TokenResponse>(r#"{"access_token":"a","expires_in":"soon"}"#)
				.is_err()
		);
	}

	#[test]
	fn optional_fields_default() {
		let parsed: TokenResponse = serde_json::from_str(r#"{"access_token":"a"}"#)
			.expect("Minimal response should parse.");

		assert_eq!(parsed.token_type, "");
		assert_eq!(parsed.expires_in, None);
		assert_eq!(parsed.refresh_token, None);
		assert_eq!(parsed, TokenResponse { token_type: String::new(), ..TokenResponse::bearer("a") });
	}
}
