//! Parsing of the authorization redirect.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Authorization server's answer delivered on the redirect URI query.
///
/// Exactly one of `code` and `error` must be present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthorizationResponseUrl {
	/// The user granted access.
	Code {
		/// Authorization code to exchange.
		code: TokenSecret,
		/// Echoed `state`.
		state: Option<String>,
	},
	/// The user or server denied access.
	Denied {
		/// OAuth error code, e.g. `access_denied`.
		error: String,
		/// Human-readable description.
		error_description: Option<String>,
		/// Page with more information.
		error_uri: Option<String>,
		/// Echoed `state`.
		state: Option<String>,
	},
}
impl AuthorizationResponseUrl {
	/// Reads the redirect URL the user agent landed on.
	pub fn parse(url: &Url) -> Result<Self> {
		let mut code = None;
		let mut error = None;
		let mut error_description = None;
		let mut error_uri = None;
		let mut state = None;

		for (key, value) in url.query_pairs() {
			let slot = match key.as_ref() {
				"code" => &mut code,
				"error" => &mut error,
				"error_description" => &mut error_description,
				"error_uri" => &mut error_uri,
				"state" => &mut state,
				_ => continue,
			};

			slot.get_or_insert_with(|| value.into_owned());
		}

		match (code, error) {
			(Some(code), None) => Ok(Self::Code { code: TokenSecret::new(code), state }),
			(None, Some(error)) => Ok(Self::Denied { error, error_description, error_uri, state }),
			(None, None) =>
				Err(Error::AmbiguousResponseUrl { reason: "neither code nor error is present" }),
			(Some(_), Some(_)) =>
				Err(Error::AmbiguousResponseUrl { reason: "both code and error are present" }),
		}
	}

	/// Echoed `state`.
	pub fn state(&self) -> Option<&str> {
		match self {
			Self::Code { state, .. } | Self::Denied { state, .. } => state.as_deref(),
		}
	}

	/// Returns `true` when the echoed `state` equals the one sent on the authorization request.
	pub fn state_matches(&self, expected: &str) -> bool {
		self.state() == Some(expected)
	}

	/// Authorization code, if access was granted.
	pub fn code(&self) -> Option<&TokenSecret> {
		match self {
			Self::Code { code, .. } => Some(code),
			Self::Denied { .. } => None,
		}
	}
}
impl FromStr for AuthorizationResponseUrl {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		let url = Url::parse(s)
			.map_err(|_| crate::error::ConfigError::InvalidRequestUri { uri: s.to_owned() })?;

		Self::parse(&url)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn code_with_state() {
		let response: AuthorizationResponseUrl =
			"https://app.example.com/cb?code=abc&state=xyz".parse().expect("Redirect should parse.");

		assert_eq!(response.code().map(TokenSecret::expose), Some("abc"));
		assert!(response.state_matches("xyz"));
		assert!(!response.state_matches("other"));
	}

	#[test]
	fn denial_keeps_details() {
		let response: AuthorizationResponseUrl = "https://app.example.com/cb?error=access_denied\
			 &error_description=User+said+no&state=s"
			.parse()
			.expect("Redirect should parse.");

		assert_eq!(
			response,
			AuthorizationResponseUrl::Denied {
				error: "access_denied".into(),
				error_description: Some("User said no".into()),
				error_uri: None,
				state: Some("s".into()),
			}
		);
	}

	#[test]
	fn neither_or_both_is_ambiguous() {
		for raw in ["https://app.example.com/cb?state=s", "https://app.example.com/cb?code=c&error=e"]
		{
			let err = raw
				.parse::<AuthorizationResponseUrl>()
				.expect_err("Ambiguous redirect must be rejected.");

			assert!(matches!(err, Error::AmbiguousResponseUrl { .. }));
		}
	}
}
