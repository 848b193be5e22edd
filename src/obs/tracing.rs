// self
use crate::{_prelude::*, obs::FlowKind};

/// Future returned by [`FlowSpan::instrument`]; a plain passthrough without the `tracing` feature.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`FlowSpan::instrument`]; a plain passthrough without the `tracing` feature.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// `oauth_credentials.flow` span tagged with the operation and its call site.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	kind: FlowKind,
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Opens a span for `kind` at `stage`.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		let span = tracing::info_span!("oauth_credentials.flow", flow = kind.as_str(), stage);
		#[cfg(not(feature = "tracing"))]
		let _ = stage;

		Self {
			kind,
			#[cfg(feature = "tracing")]
			span,
		}
	}

	/// Operation this span describes.
	pub fn kind(&self) -> FlowKind {
		self.kind
	}

	/// Runs a synchronous section inside the span.
	pub fn in_scope<R>(&self, f: impl FnOnce() -> R) -> R {
		#[cfg(feature = "tracing")]
		{
			self.span.in_scope(f)
		}
		#[cfg(not(feature = "tracing"))]
		{
			f()
		}
	}

	/// Attaches the span to `fut` so no guard is held across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a `debug` event for a failed operation.
pub fn debug_failure(kind: FlowKind, err: &Error) {
	#[cfg(feature = "tracing")]
	tracing::debug!(flow = kind.as_str(), status = err.status(), error = %err, "Operation failed.");

	#[cfg(not(feature = "tracing"))]
	let _ = (kind, err);
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn in_scope_returns_the_closure_value() {
		let span = FlowSpan::new(FlowKind::OAuth1Signing, "authorize");

		assert_eq!(span.kind(), FlowKind::OAuth1Signing);
		assert_eq!(span.in_scope(|| "signed"), "signed");
	}

	#[tokio::test]
	async fn instrumented_futures_resolve_unchanged() {
		let span = FlowSpan::new(FlowKind::CredentialRefresh, "refresh");

		assert_eq!(span.instrument(async { 42 }).await, 42);
	}
}
