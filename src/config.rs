//! Runtime knobs for the swap engine and its backend transport.

// self
use crate::_prelude::*;

const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_BODY_SIZE_LIMIT: usize = 1024 * 1024;

/// Proxy configuration; every field has a default so partial documents deserialize.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
	/// Upper bound on a whole backend exchange, headers and body included.
	pub backend_timeout: Duration,
	/// Upper bound on establishing a backend connection.
	pub connect_timeout: Duration,
	/// Largest request body buffered for forwarding or form parsing.
	pub body_size_limit: usize,
}
impl ProxyConfig {
	/// Overrides the backend exchange timeout.
	pub fn with_backend_timeout(mut self, timeout: Duration) -> Self {
		self.backend_timeout = timeout;

		self
	}

	/// Overrides the backend connect timeout.
	pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
		self.connect_timeout = timeout;

		self
	}

	/// Overrides the request body limit.
	pub fn with_body_size_limit(mut self, limit: usize) -> Self {
		self.body_size_limit = limit;

		self
	}
}
impl Default for ProxyConfig {
	fn default() -> Self {
		Self {
			backend_timeout: DEFAULT_BACKEND_TIMEOUT,
			connect_timeout: DEFAULT_CONNECT_TIMEOUT,
			body_size_limit: DEFAULT_BODY_SIZE_LIMIT,
		}
	}
}
