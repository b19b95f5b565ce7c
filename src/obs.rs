//! Observability helpers for the swap engine.
//!
//! # Feature Flags
//!
//! - Spans named `oauth2_redirect_proxy.request` carry the `leg` and `host` fields and are always
//!   emitted through `tracing`.
//! - Enable `metrics` to increment the `oauth2_redirect_proxy_requests_total` counter for every
//!   handled request, labeled by `leg` + `outcome`, and to publish the
//!   `oauth2_redirect_proxy_bindings` gauge.

mod metrics;
mod span;

pub use self::metrics::*;
pub use self::span::*;

// self
use crate::_prelude::*;

/// Direction a request took through the proxy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SwapLeg {
	/// Forwarded to a backend with its `Location` rewritten.
	Outbound,
	/// Callback from the identity provider redirected back to the caller.
	Inbound,
	/// No binding matched the request host.
	Unrouted,
}
impl SwapLeg {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			SwapLeg::Outbound => "outbound",
			SwapLeg::Inbound => "inbound",
			SwapLeg::Unrouted => "unrouted",
		}
	}
}
impl Display for SwapLeg {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SwapOutcome {
	/// A response other than a proxy-generated error was written.
	Success,
	/// The proxy answered with an error status.
	Failure,
}
impl SwapOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			SwapOutcome::Success => "success",
			SwapOutcome::Failure => "failure",
		}
	}
}
impl Display for SwapOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
