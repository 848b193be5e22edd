//! Grant-specific token request fields.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// OAuth 2.0 grants understood by [`TokenExchange`](crate::exchange::TokenExchange).
#[derive(Clone, Debug)]
pub enum TokenGrant {
	/// Authorization code returned to the redirect URI (RFC 6749 §4.1.3).
	AuthorizationCode {
		/// Code from the authorization response.
		code: TokenSecret,
		/// Redirect URI used on the authorization request.
		redirect_uri: String,
		/// PKCE verifier paired with the challenge sent on the authorization request.
		code_verifier: Option<TokenSecret>,
	},
	/// Refresh token grant (RFC 6749 §6).
	RefreshToken {
		/// Refresh token to redeem.
		refresh_token: TokenSecret,
	},
	/// Resource owner password credentials grant (RFC 6749 §4.3).
	Password {
		/// Resource owner username.
		username: String,
		/// Resource owner password.
		password: TokenSecret,
	},
	/// Client credentials grant (RFC 6749 §4.4).
	ClientCredentials,
}
impl TokenGrant {
	/// Authorization code grant bound to `redirect_uri`.
	pub fn authorization_code(code: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
		Self::AuthorizationCode {
			code: TokenSecret::new(code),
			redirect_uri: redirect_uri.into(),
			code_verifier: None,
		}
	}

	/// Refresh token grant.
	pub fn refresh_token(refresh_token: impl Into<String>) -> Self {
		Self::RefreshToken { refresh_token: TokenSecret::new(refresh_token) }
	}

	/// Password grant.
	pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
		Self::Password { username: username.into(), password: TokenSecret::new(password) }
	}

	/// Value of the `grant_type` form field.
	pub fn grant_type(&self) -> &'static str {
		match self {
			Self::AuthorizationCode { .. } => "authorization_code",
			Self::RefreshToken { .. } => "refresh_token",
			Self::Password { .. } => "password",
			Self::ClientCredentials => "client_credentials",
		}
	}

	pub(crate) fn append_fields(&self, form: &mut Vec<(String, String)>) {
		match self {
			Self::AuthorizationCode { code, redirect_uri, code_verifier } => {
				form.push(("code".into(), code.expose().into()));
				form.push(("redirect_uri".into(), redirect_uri.clone()));

				if let Some(verifier) = code_verifier {
					form.push(("code_verifier".into(), verifier.expose().into()));
				}
			},
			Self::RefreshToken { refresh_token } =>
				form.push(("refresh_token".into(), refresh_token.expose().into())),
			Self::Password { username, password } => {
				form.push(("username".into(), username.clone()));
				form.push(("password".into(), password.expose().into()));
			},
			Self::ClientCredentials => (),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn pkce_verifier_rides_with_the_code() {
		let grant = TokenGrant::AuthorizationCode {
			code: "c".into(),
			redirect_uri: "urn:ietf:wg:oauth:2.0:oob".into(),
			code_verifier: Some("v".into()),
		};
		let mut form = Vec::new();

		grant.append_fields(&mut form);

		assert_eq!(form.last(), Some(&("code_verifier".to_owned(), "v".to_owned())));
		assert!(!format!("{grant:?}").contains("\"c\""));
	}

	#[test]
	fn password_fields_are_ordered() {
		let mut form = Vec::new();

		TokenGrant::password("alice", "pw").append_fields(&mut form);

		assert_eq!(
			form,
			[("username".to_owned(), "alice".to_owned()), ("password".into(), "pw".into())]
		);
	}
}
