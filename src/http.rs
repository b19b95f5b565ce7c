//! Transport primitives for reaching backends.
//!
//! The swap engine depends on [`BackendHttpClient`] only, so tests and embedders can swap in
//! their own HTTP stack. The default [`ReqwestHttpClient`] never follows redirects: the backend's
//! `Location` header is the thing the engine rewrites, so it must reach the engine untouched.

// self
use crate::_prelude::*;
#[cfg(feature = "reqwest")] use crate::config::ProxyConfig;

/// Boxed future returned by [`BackendHttpClient::execute`].
pub type BackendFuture<'a> =
	Pin<Box<dyn Future<Output = Result<Response<Body>, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of issuing one backend call.
///
/// Implementations receive a fully retargeted request (absolute `http://` URI, original `Host`
/// header, framing headers stripped) and must return the backend's response without following
/// redirects or decoding the body. Dropping the returned future must abandon the call, which is
/// how a disconnecting caller cancels the backend request.
pub trait BackendHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Executes `request` and streams back the backend response.
	fn execute(&self, request: Request<Bytes>) -> BackendFuture<'_>;
}
impl<T> BackendHttpClient for Arc<T>
where
	T: ?Sized + BackendHttpClient,
{
	fn execute(&self, request: Request<Bytes>) -> BackendFuture<'_> {
		(**self).execute(request)
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Builds a client honoring the configured timeouts with redirect following disabled.
	pub fn from_config(config: &ProxyConfig) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.timeout(config.backend_timeout)
			.connect_timeout(config.connect_timeout)
			.build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	///
	/// The caller is responsible for disabling redirect following on it.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl BackendHttpClient for ReqwestHttpClient {
	fn execute(&self, request: Request<Bytes>) -> BackendFuture<'_> {
		Box::pin(async move {
			let request = reqwest::Request::try_from(request).map_err(TransportError::request)?;
			let response = self.0.execute(request).await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new = Response::new(Body::from_stream(response.bytes_stream()));

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;

	#[test]
	fn reqwest_client_builds_from_default_config() {
		ReqwestHttpClient::from_config(&ProxyConfig::default())
			.expect("Default config should produce a reqwest client.");
	}
}
