// self
use crate::obs::{SwapLeg, SwapOutcome};

/// Records a request outcome via the global metrics recorder (when enabled).
pub fn record_request(leg: SwapLeg, outcome: SwapOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_redirect_proxy_requests_total",
			"leg" => leg.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (leg, outcome);
	}
}

/// Publishes the current registry size via the global metrics recorder (when enabled).
pub fn record_binding_count(count: usize) {
	#[cfg(feature = "metrics")]
	{
		metrics::gauge!("oauth2_redirect_proxy_bindings").set(count as f64);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = count;
	}
}
