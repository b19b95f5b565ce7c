//! The redirect-swap engine.
//!
//! Every request is routed purely by host: a request for a binding's external host takes the
//! outbound leg (forwarded to the backend, `Location` rewritten so the identity provider calls
//! back into the proxy), and a request for a binding's redirect URI host takes the inbound leg
//! (the callback is unpacked and the caller is sent to its original `redirect_uri`). No
//! per-flow state survives between the two legs; the `state` envelope carries all of it.

pub mod inbound;
pub mod outbound;
pub mod query;

// crates.io
use axum::{Router, extract::State, response::IntoResponse};
// self
use crate::{
	_prelude::*,
	binding::{BindingId, ProxyBinding},
	config::ProxyConfig,
	http::BackendHttpClient,
	obs::{self, RequestSpan, SwapLeg, SwapOutcome},
	registry::{BindingRegistry, Route},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Engine specialized for the crate's default reqwest transport.
pub type ReqwestRedirectSwapProxy = RedirectSwapProxy<ReqwestHttpClient>;

/// Owns the binding registry and the backend transport, and answers every proxied request.
///
/// Instances are independent: nothing is process-global, so tests can run several side by
/// side. Share one behind an [`Arc`] between the registration API and the HTTP server.
pub struct RedirectSwapProxy<C>
where
	C: BackendHttpClient,
{
	registry: BindingRegistry,
	http_client: C,
	config: ProxyConfig,
}
impl<C> RedirectSwapProxy<C>
where
	C: BackendHttpClient,
{
	/// Creates an engine that reuses the caller-provided transport.
	pub fn with_http_client(http_client: C, config: ProxyConfig) -> Self {
		Self { registry: BindingRegistry::default(), http_client, config }
	}

	/// Registry backing this engine.
	pub fn registry(&self) -> &BindingRegistry {
		&self.registry
	}

	/// Configuration in effect.
	pub fn config(&self) -> &ProxyConfig {
		&self.config
	}

	/// Inserts or replaces a binding; later requests route against it immediately.
	pub fn register_or_update(&self, binding: ProxyBinding) {
		self.registry.register_or_update(binding);
	}

	/// Removes a binding, failing with [`Error::NotRegistered`] when it is absent.
	pub fn unregister(&self, id: &BindingId) -> Result<()> {
		self.registry.unregister(id)
	}

	/// Handles one request and always produces a complete response.
	///
	/// Dropping the returned future (for example when the caller disconnects) drops the
	/// in-flight backend call with it.
	pub async fn handle(&self, request: Request<Body>) -> Response<Body> {
		let host = request_host(&request).unwrap_or_default().to_owned();
		let route = self.registry.route(&host);
		let leg = match &route {
			Route::Outbound(_) => SwapLeg::Outbound,
			Route::Inbound(_) => SwapLeg::Inbound,
			Route::Unmatched => SwapLeg::Unrouted,
		};
		let span = RequestSpan::new(leg, &host);

		span.instrument(async move {
			tracing::debug!(method = %request.method(), uri = %request.uri(), "proxying request");

			let result = match route {
				Route::Outbound(binding) => self.swap_outbound(&binding, request).await,
				Route::Inbound(binding) => self.recover_inbound(&binding, request).await,
				Route::Unmatched => Err(Error::Unrouted { host }),
			};

			finish(leg, result)
		})
		.await
	}

	pub(crate) async fn read_body(&self, headers: &HeaderMap, body: Body) -> Result<Bytes> {
		let limit = self.config.body_size_limit;
		let declared = headers
			.get(header::CONTENT_LENGTH)
			.and_then(|value| value.to_str().ok())
			.and_then(|value| value.parse::<usize>().ok());

		if declared.is_some_and(|len| len > limit) {
			return Err(Error::PayloadTooLarge { limit });
		}

		axum::body::to_bytes(body, limit)
			.await
			.map_err(|source| ProtocolError::UnreadableBody { source }.into())
	}
}
impl<C> RedirectSwapProxy<C>
where
	C: BackendHttpClient,
{
	/// Wraps the engine in an axum [`Router`] that sends every request through
	/// [`RedirectSwapProxy::handle`].
	pub fn router(self: Arc<Self>) -> Router {
		Router::new().fallback(proxy_handler::<C>).with_state(self)
	}
}
#[cfg(feature = "reqwest")]
impl RedirectSwapProxy<ReqwestHttpClient> {
	/// Creates an engine with its own reqwest transport built from `config`.
	pub fn new(config: ProxyConfig) -> Result<Self> {
		let http_client = ReqwestHttpClient::from_config(&config)?;

		Ok(Self::with_http_client(http_client, config))
	}
}
impl<C> Debug for RedirectSwapProxy<C>
where
	C: BackendHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RedirectSwapProxy")
			.field("bindings", &self.registry.len())
			.field("config", &self.config)
			.finish()
	}
}

async fn proxy_handler<C>(
	State(proxy): State<Arc<RedirectSwapProxy<C>>>,
	request: Request<Body>,
) -> Response<Body>
where
	C: BackendHttpClient,
{
	proxy.handle(request).await
}

fn finish(leg: SwapLeg, result: Result<Response<Body>>) -> Response<Body> {
	match result {
		Ok(response) => {
			obs::record_request(leg, SwapOutcome::Success);

			response
		},
		Err(e) => {
			match &e {
				Error::Config(_) => tracing::error!(error = %e, "binding is misconfigured"),
				Error::Unrouted { .. } => tracing::info!(error = %e, "no matching binding"),
				_ => tracing::warn!(error = %e, "request aborted"),
			}

			obs::record_request(leg, SwapOutcome::Failure);

			e.into_response()
		},
	}
}

/// Host the request was addressed to: the `Host` header, else the URI authority (HTTP/2).
fn request_host(request: &Request<Body>) -> Option<&str> {
	request
		.headers()
		.get(HOST)
		.and_then(|value| value.to_str().ok())
		.or_else(|| request.uri().authority().map(|authority| authority.as_str()))
}
