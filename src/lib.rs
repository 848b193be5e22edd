//! OAuth 1.0a request signing and OAuth 2.0 credential lifecycle: authorization URLs, grant
//! exchanges, bearer-token attachment, and lock-guarded refresh with 401-driven retry.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod access;
pub mod auth;
pub mod clock;
pub mod credential;
pub mod error;
pub mod exchange;
pub mod flow;
pub mod http;
pub mod oauth1;
pub mod obs;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for unit tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::{
		collections::VecDeque,
		sync::atomic::{AtomicUsize, Ordering},
		task::{Context, Poll},
	};
	// self
	use crate::{
		clock::RandomSource,
		error::TransportError,
		http::{HttpTransport, TransportFuture},
	};

	pub use crate::clock::ManualClock;
	pub use oauth2::{HttpRequest, HttpResponse, http};

	/// Deterministic [`RandomSource`] that replays a fixed sequence of `u64` values.
	///
	/// Byte requests are filled from the same sequence (little-endian), so PKCE verifiers and
	/// nonces become reproducible in tests.
	#[derive(Debug)]
	pub struct SequenceRng {
		values: Vec<u64>,
		cursor: AtomicUsize,
	}
	impl SequenceRng {
		/// Creates a source cycling through `values`.
		pub fn new(values: impl Into<Vec<u64>>) -> Self {
			let values = values.into();

			assert!(!values.is_empty(), "SequenceRng requires at least one value.");

			Self { values, cursor: AtomicUsize::new(0) }
		}
	}
	impl RandomSource for SequenceRng {
		fn next_u64(&self) -> u64 {
			let idx = self.cursor.fetch_add(1, Ordering::Relaxed);

			self.values[idx % self.values.len()]
		}

		fn fill_bytes(&self, buf: &mut [u8]) {
			for chunk in buf.chunks_mut(8) {
				let bytes = self.next_u64().to_le_bytes();

				chunk.copy_from_slice(&bytes[..chunk.len()]);
			}
		}
	}

	/// Scripted reply served by [`ScriptedTransport`].
	#[derive(Clone, Debug)]
	pub enum ScriptedReply {
		/// Responds with the given status and body.
		Respond {
			/// HTTP status code.
			status: u16,
			/// Raw response body.
			body: String,
		},
		/// Fails the request with a network error.
		Fail,
	}
	impl ScriptedReply {
		/// Shorthand for a JSON token response.
		pub fn json(status: u16, body: impl Into<String>) -> Self {
			Self::Respond { status, body: body.into() }
		}
	}

	/// In-process transport that replays scripted replies and records every request it sees.
	///
	/// Once the script is exhausted the last reply is repeated. Optional scheduler yields widen
	/// race windows for concurrency tests.
	#[derive(Debug, Default)]
	pub struct ScriptedTransport {
		replies: Mutex<VecDeque<ScriptedReply>>,
		last: Mutex<Option<ScriptedReply>>,
		requests: Mutex<Vec<HttpRequest>>,
		yields: usize,
	}
	impl ScriptedTransport {
		/// Creates a transport serving `replies` in order.
		pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
			Self { replies: Mutex::new(replies.into_iter().collect()), ..Default::default() }
		}

		/// Yields to the executor `count` times before answering each request.
		pub fn with_yields(mut self, count: usize) -> Self {
			self.yields = count;

			self
		}

		/// Number of requests received so far.
		pub fn calls(&self) -> usize {
			self.requests.lock().len()
		}

		/// Form body of the `idx`-th request as decoded pairs.
		pub fn form(&self, idx: usize) -> Vec<(String, String)> {
			let requests = self.requests.lock();

			url::form_urlencoded::parse(requests[idx].body()).into_owned().collect()
		}

		/// Header value of the `idx`-th request, if present.
		pub fn header(&self, idx: usize, name: &str) -> Option<String> {
			let requests = self.requests.lock();

			requests[idx].headers().get(name).and_then(|value| value.to_str().ok()).map(Into::into)
		}

		fn next_reply(&self) -> ScriptedReply {
			let mut replies = self.replies.lock();
			let mut last = self.last.lock();

			if let Some(reply) = replies.pop_front() {
				*last = Some(reply.clone());

				return reply;
			}

			last.clone().unwrap_or(ScriptedReply::Fail)
		}
	}

	struct YieldNow(bool);
	impl Future for YieldNow {
		type Output = ();

		fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
			if self.0 {
				return Poll::Ready(());
			}

			self.0 = true;
			cx.waker().wake_by_ref();

			Poll::Pending
		}
	}

	impl HttpTransport for ScriptedTransport {
		fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
			Box::pin(async move {
				self.requests.lock().push(request);

				for _ in 0..self.yields {
					YieldNow(false).await;
				}

				match self.next_reply() {
					ScriptedReply::Respond { status, body } => {
						let mut response = HttpResponse::new(body.into_bytes());

						*response.status_mut() = http::StatusCode::from_u16(status)
							.map_err(TransportError::network)?;
						response.headers_mut().insert(
							http::header::CONTENT_TYPE,
							http::HeaderValue::from_static("application/json"),
						);

						Ok(response)
					},
					ScriptedReply::Fail => Err(TransportError::Io(std::io::Error::new(
						std::io::ErrorKind::ConnectionRefused,
						"scripted transport failure",
					))),
				}
			})
		}
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use oauth2;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
