//! Proxy bindings: routable pairings between an external host and an internal backend.

// self
use crate::_prelude::*;

/// Stable identity of a binding, taken from the declarative object that owns it.
///
/// Identity drives upsert and removal only; requests are never routed by it.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BindingId {
	/// Namespace of the owning object.
	pub namespace: String,
	/// Name of the owning object.
	pub name: String,
}
impl BindingId {
	/// Creates an identity from its namespace and name.
	pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
		Self { namespace: namespace.into(), name: name.into() }
	}
}
impl Debug for BindingId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Binding({}/{})", self.namespace, self.name)
	}
}
impl Display for BindingId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}/{}", self.namespace, self.name)
	}
}
impl FromStr for BindingId {
	type Err = BindingIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.split_once('/') {
			Some((namespace, name)) if !name.contains('/') => Ok(Self::new(namespace, name)),
			_ => Err(BindingIdError { raw: s.to_owned() }),
		}
	}
}

/// Error returned when a `namespace/name` string cannot be split into a [`BindingId`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Binding identity `{raw}` must have the form namespace/name.")]
pub struct BindingIdError {
	/// Rejected input.
	pub raw: String,
}

/// One routable pairing between an externally visible host and an internal backend.
///
/// Field contents are not validated; the control loop that registers bindings owns that job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyBinding {
	/// Identity used for upsert and removal matching.
	pub id: BindingId,
	/// Host the proxy answers for when clients reach the backend's login UI.
	pub external_host: String,
	/// Callback URL registered with the external identity provider.
	#[serde(rename = "redirectURI")]
	pub redirect_uri: String,
	/// Request path prefixes whose responses get their `Location` rewritten; empty matches
	/// nothing.
	#[serde(default)]
	pub path_prefixes: Vec<String>,
	/// Backend network address (IP or DNS name).
	pub backend_address: String,
	/// Backend port.
	pub backend_port: u16,
}
impl ProxyBinding {
	/// Creates a binding with no path prefixes and an unset backend.
	pub fn new(
		id: BindingId,
		external_host: impl Into<String>,
		redirect_uri: impl Into<String>,
	) -> Self {
		Self {
			id,
			external_host: external_host.into(),
			redirect_uri: redirect_uri.into(),
			path_prefixes: Vec::new(),
			backend_address: String::new(),
			backend_port: 0,
		}
	}

	/// Replaces the path prefixes eligible for `Location` rewriting.
	pub fn with_path_prefixes<I, S>(mut self, prefixes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.path_prefixes = prefixes.into_iter().map(Into::into).collect();

		self
	}

	/// Points the binding at a backend address and port.
	pub fn with_backend(mut self, address: impl Into<String>, port: u16) -> Self {
		self.backend_address = address.into();
		self.backend_port = port;

		self
	}

	/// Whether responses to `path` are eligible for `Location` rewriting.
	pub fn matches_path(&self, path: &str) -> bool {
		self.path_prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
	}

	/// `address:port` authority of the backend, bracketing IPv6 literals.
	pub fn backend_authority(&self) -> String {
		if self.backend_address.contains(':') && !self.backend_address.starts_with('[') {
			format!("[{}]:{}", self.backend_address, self.backend_port)
		} else {
			format!("{}:{}", self.backend_address, self.backend_port)
		}
	}
}

/// Binding as held by the registry, with its redirect URI parsed once at registration.
#[derive(Clone, Debug)]
pub struct RegisteredBinding {
	binding: ProxyBinding,
	redirect: Result<Url, url::ParseError>,
}
impl RegisteredBinding {
	pub(crate) fn new(binding: ProxyBinding) -> Self {
		let redirect = Url::parse(&binding.redirect_uri);

		Self { binding, redirect }
	}

	/// Parsed redirect URI, or the configuration error describing why it does not parse.
	pub fn redirect_url(&self) -> Result<&Url, ConfigError> {
		self.redirect.as_ref().map_err(|e| ConfigError::InvalidRedirect {
			id: self.binding.id.clone(),
			redirect_uri: self.binding.redirect_uri.clone(),
			source: *e,
		})
	}

	/// `host[:port]` of the redirect URI, when it parses and has a host.
	pub fn redirect_authority(&self) -> Option<&str> {
		let url = self.redirect.as_ref().ok()?;

		url.host_str()?;

		Some(&url[url::Position::BeforeHost..url::Position::AfterPort])
	}
}
impl std::ops::Deref for RegisteredBinding {
	type Target = ProxyBinding;

	fn deref(&self) -> &Self::Target {
		&self.binding
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identity_round_trips_through_display() {
		let id = BindingId::new("team-a", "login");

		assert_eq!(id.to_string(), "team-a/login");
		assert_eq!("team-a/login".parse::<BindingId>(), Ok(id));
		assert!("no-namespace".parse::<BindingId>().is_err());
		assert!("a/b/c".parse::<BindingId>().is_err());
	}

	#[test]
	fn empty_prefix_list_matches_nothing() {
		let binding = ProxyBinding::new(BindingId::new("ns", "b"), "app", "https://cb");

		assert!(!binding.matches_path("/"));
		assert!(!binding.matches_path(""));

		let binding = binding.with_path_prefixes(["/login", "/oauth"]);

		assert!(binding.matches_path("/oauth/start"));
		assert!(!binding.matches_path("/static/app.js"));
	}

	#[test]
	fn backend_authority_brackets_ipv6() {
		let binding = ProxyBinding::new(BindingId::new("ns", "b"), "app", "https://cb");

		assert_eq!(binding.clone().with_backend("10.1.2.3", 80).backend_authority(), "10.1.2.3:80");
		assert_eq!(binding.with_backend("fd00::1", 8080).backend_authority(), "[fd00::1]:8080");
	}

	#[test]
	fn redirect_authority_keeps_explicit_port() {
		let id = BindingId::new("ns", "b");
		let registered =
			RegisteredBinding::new(ProxyBinding::new(id.clone(), "app", "https://proxy.example:8443/cb"));

		assert_eq!(registered.redirect_authority(), Some("proxy.example:8443"));

		let broken = RegisteredBinding::new(ProxyBinding::new(id, "app", ":):((#///`"));

		assert_eq!(broken.redirect_authority(), None);
		assert!(matches!(broken.redirect_url(), Err(ConfigError::InvalidRedirect { .. })));
	}

	#[test]
	fn binding_deserializes_from_camel_case() {
		let binding: ProxyBinding = serde_json::from_str(
			r#"{
				"id": {"namespace": "ns", "name": "b"},
				"externalHost": "app.internal",
				"redirectURI": "https://proxy.example/cb",
				"backendAddress": "10.0.0.1",
				"backendPort": 8080
			}"#,
		)
		.expect("Binding fixture should deserialize.");

		assert_eq!(binding.redirect_uri, "https://proxy.example/cb");
		assert!(binding.path_prefixes.is_empty());
	}
}
