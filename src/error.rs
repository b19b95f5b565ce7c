//! Proxy-level error types shared by the registry, the swap engine, and transports.

// crates.io
use axum::response::IntoResponse;
// self
use crate::{_prelude::*, binding::BindingId};

/// Proxy-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical proxy error exposed by public APIs.
///
/// Every variant maps onto exactly one HTTP status via [`Error::status`], so request handlers
/// can bail out with `?` and still write a complete response.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Backend could not be reached or did not answer in time.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Request or backend response could not be decoded.
	#[error(transparent)]
	Protocol(#[from] ProtocolError),

	/// No binding with the given identity is registered.
	#[error("Binding `{id}` is not registered.")]
	NotRegistered {
		/// Identity passed to the removal call.
		id: BindingId,
	},
	/// No binding matches the request host.
	#[error("No binding matches host `{host}`.")]
	Unrouted {
		/// Host observed on the request.
		host: String,
	},
	/// Request body exceeds the configured limit.
	#[error("Request body exceeds {limit} bytes.")]
	PayloadTooLarge {
		/// Configured limit in bytes.
		limit: usize,
	},
}
impl Error {
	/// HTTP status written to the caller when a request fails with this error.
	pub fn status(&self) -> StatusCode {
		match self {
			Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
			Error::Transport(_) | Error::Protocol(_) => StatusCode::BAD_REQUEST,
			Error::NotRegistered { .. } => StatusCode::NOT_FOUND,
			Error::Unrouted { .. } => StatusCode::SERVICE_UNAVAILABLE,
			Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
		}
	}
}
impl IntoResponse for Error {
	fn into_response(self) -> axum::response::Response {
		self.status().into_response()
	}
}

/// Configuration failures raised while building the proxy or serving a misconfigured binding.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A binding's redirect URI cannot be parsed.
	#[error("Binding `{id}` has an invalid redirect URI `{redirect_uri}`.")]
	InvalidRedirect {
		/// Identity of the misconfigured binding.
		id: BindingId,
		/// Raw redirect URI as registered.
		redirect_uri: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Backend coordinates do not form a valid request URI.
	#[error("Backend target `{target}` is not a valid URI.")]
	InvalidBackend {
		/// Rendered `address:port` target.
		target: String,
		/// Underlying parsing failure.
		#[source]
		source: axum::http::uri::InvalidUri,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO) while calling a backend.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the backend.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request could not be converted for the underlying HTTP client.
	#[error("Backend request could not be built.")]
	Request {
		/// Transport-specific conversion error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific request conversion error.
	pub fn request(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Request { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Decoding failures on either leg of the redirect swap.
#[derive(Debug, ThisError)]
pub enum ProtocolError {
	/// Backend `Location` header is not a usable URL.
	#[error("Backend Location header `{location}` is invalid.")]
	InvalidLocation {
		/// Raw header value.
		location: String,
		/// Parsing failure, when the value was text at all.
		#[source]
		source: Option<url::ParseError>,
	},
	/// The `redirect_uri` carried by the backend `Location` is not a URL.
	#[error("The redirect_uri `{redirect_uri}` is invalid.")]
	InvalidRedirectUri {
		/// Raw parameter value.
		redirect_uri: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Callback request did not carry a `state` parameter.
	#[error("Callback request is missing the state parameter.")]
	MissingState,
	/// Callback `state` does not decode into an envelope.
	#[error("Callback state could not be decoded.")]
	UndecodableState {
		/// Structured decoding failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// The original redirect URI stored in the envelope is not a URL.
	#[error("Envelope redirect URI `{redirect_uri}` is invalid.")]
	InvalidEnvelopeRedirect {
		/// Raw envelope value.
		redirect_uri: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request body could not be read in full.
	#[error("Request body could not be read.")]
	UnreadableBody {
		/// Body stream failure, including exceeding the size limit mid-stream.
		#[source]
		source: axum::Error,
	},
	/// Callback POST did not carry a form body.
	#[error("Callback POST must be application/x-www-form-urlencoded.")]
	UnsupportedForm,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn statuses_follow_error_taxonomy() {
		let config = Error::from(ConfigError::InvalidRedirect {
			id: BindingId::new("ns", "name"),
			redirect_uri: ":bad".into(),
			source: url::ParseError::RelativeUrlWithoutBase,
		});

		assert_eq!(config.status(), StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(
			Error::from(TransportError::network(std::io::Error::other("refused"))).status(),
			StatusCode::BAD_REQUEST
		);
		assert_eq!(Error::from(ProtocolError::MissingState).status(), StatusCode::BAD_REQUEST);
		assert_eq!(
			Error::Unrouted { host: "nowhere".into() }.status(),
			StatusCode::SERVICE_UNAVAILABLE
		);
		assert_eq!(Error::PayloadTooLarge { limit: 1 }.status(), StatusCode::PAYLOAD_TOO_LARGE);
	}

	#[test]
	fn config_error_exposes_parse_source() {
		let err = Error::from(ConfigError::InvalidRedirect {
			id: BindingId::new("ns", "name"),
			redirect_uri: ":bad".into(),
			source: url::ParseError::RelativeUrlWithoutBase,
		});

		assert!(err.to_string().contains("ns/name"));

		let source = StdError::source(&err).expect("Config error should expose its source.");

		assert_eq!(source.to_string(), url::ParseError::RelativeUrlWithoutBase.to_string());
	}
}
