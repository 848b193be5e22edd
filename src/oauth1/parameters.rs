//! Per-request OAuth 1.0a protocol parameters and the signature base string.

// crates.io
use oauth2::http::Uri;
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	oauth1::{
		escape::{escape, split_pairs},
		signer::OAuthSigner,
	},
};

/// OAuth 1.0a protocol parameters (RFC 5849 §3.1).
///
/// A fresh value is built for every request. Unset fields are left out of both the base string
/// and the `Authorization` header.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OAuthParameters {
	/// `realm`; header only, never signed.
	pub realm: Option<String>,
	/// `oauth_callback`.
	pub callback: Option<String>,
	/// `oauth_consumer_key`.
	pub consumer_key: Option<String>,
	/// `oauth_nonce`.
	pub nonce: Option<String>,
	/// `oauth_signature`.
	pub signature: Option<String>,
	/// `oauth_signature_method`.
	pub signature_method: Option<String>,
	/// `oauth_timestamp` in Unix seconds.
	pub timestamp: Option<String>,
	/// `oauth_token`.
	pub token: Option<String>,
	/// `oauth_verifier`.
	pub verifier: Option<String>,
	/// `oauth_version`.
	pub version: Option<String>,
}
impl OAuthParameters {
	/// Signed protocol parameters in header order; `oauth_signature` is excluded.
	fn protocol_params(&self) -> [(&'static str, Option<&str>); 8] {
		[
			("oauth_callback", self.callback.as_deref()),
			("oauth_consumer_key", self.consumer_key.as_deref()),
			("oauth_nonce", self.nonce.as_deref()),
			("oauth_signature_method", self.signature_method.as_deref()),
			("oauth_timestamp", self.timestamp.as_deref()),
			("oauth_token", self.token.as_deref()),
			("oauth_verifier", self.verifier.as_deref()),
			("oauth_version", self.version.as_deref()),
		]
	}

	/// Builds the signature base string (RFC 5849 §3.4.1).
	///
	/// Parameters come from the set protocol fields, every query parameter of `uri`, and
	/// `form` (a form-encoded body) when given. Repeated names are kept, and `oauth_signature`
	/// on the request itself is ignored. A parameter without `=` is emitted as a bare key.
	pub fn signature_base_string(
		&self,
		method: &str,
		uri: &Uri,
		form: Option<&[u8]>,
	) -> Result<String> {
		let mut params = self
			.protocol_params()
			.into_iter()
			.filter_map(|(key, value)| value.map(|v| (escape(key), Some(escape(v)))))
			.collect::<Vec<_>>();
		let mut request_params = split_pairs(uri.query().unwrap_or_default());

		if let Some(form) = form {
			request_params.extend(split_pairs(&String::from_utf8_lossy(form)));
		}

		params.extend(
			request_params
				.into_iter()
				.filter(|(key, _)| key != "oauth_signature")
				.map(|(key, value)| (escape(&key), value.as_deref().map(escape))),
		);
		params.sort();

		let normalized_params = params
			.iter()
			.map(|(key, value)| match value {
				Some(value) => format!("{key}={value}"),
				None => key.clone(),
			})
			.collect::<Vec<_>>()
			.join("&");

		Ok(format!(
			"{}&{}&{}",
			escape(&method.to_ascii_uppercase()),
			escape(&normalize_url(uri)?),
			escape(&normalized_params)
		))
	}

	/// Sets `oauth_signature_method` from `signer`, then computes `oauth_signature`.
	pub fn sign(
		&mut self,
		signer: &dyn OAuthSigner,
		method: &str,
		uri: &Uri,
		form: Option<&[u8]>,
	) -> Result<()> {
		self.signature_method = Some(signer.signature_method().to_owned());

		let base_string = self.signature_base_string(method, uri, form)?;

		self.signature = Some(signer.compute_signature(&base_string)?);

		Ok(())
	}

	/// `Authorization` header value: `OAuth realm="..", oauth_callback="..", ...`.
	pub fn authorization_header(&self) -> String {
		let mut header = String::from("OAuth");

		if let Some(realm) = &self.realm {
			header.push_str(&format!(" realm=\"{}\",", escape(realm)));
		}

		let [callback, consumer_key, nonce, signature_method, timestamp, token, verifier, version] =
			self.protocol_params();
		let ordered = [
			callback,
			consumer_key,
			nonce,
			("oauth_signature", self.signature.as_deref()),
			signature_method,
			timestamp,
			token,
			verifier,
			version,
		];

		for (key, value) in ordered {
			if let Some(value) = value {
				header.push_str(&format!(" {key}=\"{}\",", escape(value)));
			}
		}

		if header.ends_with(',') {
			header.pop();
		}

		header
	}
}

/// `scheme://host[:port]/path`, lowercased scheme and host, default ports dropped.
///
/// The path is taken verbatim, so an origin-only URL stays without a trailing slash.
fn normalize_url(uri: &Uri) -> Result<String> {
	let (Some(scheme), Some(host)) = (uri.scheme_str(), uri.host()) else {
		return Err(ConfigError::invalid_uri(uri).into());
	};
	let scheme = scheme.to_ascii_lowercase();
	let mut url = format!("{scheme}://{}", host.to_ascii_lowercase());

	match (scheme.as_str(), uri.port_u16()) {
		("http", Some(80)) | ("https", Some(443)) | (_, None) => (),
		(_, Some(port)) => url.push_str(&format!(":{port}")),
	}

	let raw_path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or_default();

	url.push_str(raw_path.split_once('?').map_or(raw_path, |(path, _)| path));

	Ok(url)
}
