// self
use crate::{
	_prelude::*,
	obs::{FlowKind, FlowOutcome, debug_failure},
};

/// Increments `oauth_credentials_flow_total{flow, outcome}` on the global recorder.
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		"oauth_credentials_flow_total",
		"flow" => kind.as_str(),
		"outcome" => outcome.as_str()
	)
	.increment(1);

	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome);
}

/// Records the terminal outcome of `result`, logging the error on failure.
pub fn record_result<T>(kind: FlowKind, result: &Result<T>) {
	match result {
		Ok(_) => record_flow_outcome(kind, FlowOutcome::Success),
		Err(e) => {
			debug_failure(kind, e);
			record_flow_outcome(kind, FlowOutcome::Failure);
		},
	}
}
