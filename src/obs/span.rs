// self
use crate::{_prelude::*, obs::SwapLeg};

/// Span wrapping the handling of one proxied request.
#[derive(Clone, Debug)]
pub struct RequestSpan(tracing::Span);
impl RequestSpan {
	/// Creates a span tagged with the leg and request host.
	pub fn new(leg: SwapLeg, host: &str) -> Self {
		Self(tracing::info_span!("oauth2_redirect_proxy.request", leg = leg.as_str(), host))
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> tracing::instrument::Instrumented<Fut>
	where
		Fut: Future,
	{
		use tracing::Instrument;

		fut.instrument(self.0.clone())
	}
}
