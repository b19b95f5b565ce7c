//! Let many internal environments share one OAuth 2.0 client registration by swapping
//! `redirect_uri` and `state` on the way out to the identity provider and unpacking them again
//! on the way back.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod binding;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod obs;
pub mod registry;
pub mod swap;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		binding::{BindingId, ProxyBinding},
		http::{BackendFuture, BackendHttpClient},
		swap::RedirectSwapProxy,
	};

	/// Request observed by a [`MockBackend`], kept for assertions.
	pub type RecordedRequest = Request<Bytes>;

	type Responder = dyn Fn(&Request<Bytes>) -> Result<Response<Body>, TransportError> + Send + Sync;

	/// In-process backend that answers every call through a closure and records what it saw.
	#[derive(Clone)]
	pub struct MockBackend {
		responder: Arc<Responder>,
		calls: Arc<Mutex<Vec<RecordedRequest>>>,
	}
	impl MockBackend {
		/// Builds a backend answering with `responder`.
		pub fn new(
			responder: impl Fn(&Request<Bytes>) -> Result<Response<Body>, TransportError>
			+ 'static
			+ Send
			+ Sync,
		) -> Self {
			Self { responder: Arc::new(responder), calls: Default::default() }
		}

		/// Backend that fails every call with a network error.
		pub fn unreachable() -> Self {
			Self::new(|_| Err(TransportError::network(std::io::Error::other("connection refused"))))
		}

		/// Requests received so far.
		pub fn calls(&self) -> Vec<RecordedRequest> {
			self.calls.lock().clone()
		}
	}
	impl BackendHttpClient for MockBackend {
		fn execute(&self, request: Request<Bytes>) -> BackendFuture<'_> {
			let outcome = (self.responder)(&request);

			self.calls.lock().push(request);

			Box::pin(async move { outcome })
		}
	}

	/// Builds a response with `status` and the provided header pairs, in order.
	pub fn backend_response(
		status: u16,
		headers: &[(&'static str, &str)],
		body: &'static str,
	) -> Response<Body> {
		let mut response = Response::new(Body::from(body));

		*response.status_mut() =
			StatusCode::from_u16(status).expect("Mock status code should be valid.");

		for (name, value) in headers {
			response.headers_mut().append(
				*name,
				HeaderValue::from_str(value).expect("Mock header value should be valid."),
			);
		}

		response
	}

	/// Binding fixture used across tests.
	pub fn binding(name: &str, external_host: &str, redirect_uri: &str) -> ProxyBinding {
		ProxyBinding::new(BindingId::new("default", name), external_host, redirect_uri)
			.with_path_prefixes(["/"])
			.with_backend("10.0.0.7", 8080)
	}

	/// Builds a proxy backed by `backend` with a single registered binding.
	pub fn proxy_with(backend: MockBackend, binding: ProxyBinding) -> RedirectSwapProxy<MockBackend> {
		let proxy = RedirectSwapProxy::with_http_client(backend, Default::default());

		proxy.register_or_update(binding);

		proxy
	}

	/// Builds a GET request carrying `host`.
	pub fn get(host: &str, path_and_query: &str) -> Request<Body> {
		Request::builder()
			.method(Method::GET)
			.uri(path_and_query)
			.header(HOST, host)
			.body(Body::empty())
			.expect("Test request should build.")
	}

	/// Collects a response body into a string.
	pub async fn body_string(response: Response<Body>) -> String {
		let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
			.await
			.expect("Response body should be readable.");

		String::from_utf8(bytes.to_vec()).expect("Response body should be UTF-8.")
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration,
	};

	pub use axum::{
		body::{Body, Bytes},
		http::{
			HeaderMap, HeaderValue, Method, Request, Response, StatusCode,
			header::{self, CONTENT_TYPE, HOST, LOCATION},
		},
	};
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use url::Url;

	pub use crate::error::{ConfigError, Error, ProtocolError, Result, TransportError};
}

pub use axum;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tower as _, tracing_subscriber as _};
