//! Transport seam for token-endpoint round trips.
//!
//! The crate depends on an HTTP stack only through [`HttpTransport`]: send one
//! [`HttpRequest`], get back status, headers, and body. Timeouts, proxies, and TLS belong to the
//! transport. [`ReqwestTransport`] is the bundled implementation behind the `reqwest` feature.

// crates.io
pub use oauth2::{HttpRequest, HttpResponse};
// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Executes one HTTP request.
///
/// Implementations must not follow redirects for token requests and must surface network and IO
/// failures as [`TransportError`] rather than synthesizing a status code.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves with the full response.
	fn send(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// [`HttpTransport`] backed by a [`ReqwestClient`].
///
/// Configure any custom client to disable redirect following; token endpoints answer directly.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport(ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a transport with redirects disabled.
	pub fn new() -> Result<Self> {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(crate::error::ConfigError::from)?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let response = self.0.execute(request.try_into()?).await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new = HttpResponse::new(response.bytes().await?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}
