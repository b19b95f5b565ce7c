//! The in-memory binding registry shared by the registration API and every request handler.
//!
//! Bindings live in an ordered list published as an immutable snapshot. Mutations take the
//! write lock, build the next list, and swap it in; readers clone the current snapshot under
//! the read lock and route against it without holding any lock. A reader therefore never
//! observes a half-applied update, and a mutation that returned is visible to every later
//! request.

// self
use crate::{
	_prelude::*,
	binding::{BindingId, ProxyBinding, RegisteredBinding},
	obs,
};

/// Immutable, registration-ordered view of the registry.
pub type Snapshot = Arc<[Arc<RegisteredBinding>]>;

/// Direction selected for a request by host matching.
#[derive(Clone, Debug)]
pub enum Route {
	/// Request host equals a binding's external host; forward to its backend.
	Outbound(Arc<RegisteredBinding>),
	/// Request host equals a binding's redirect URI host; recover the caller's redirect.
	Inbound(Arc<RegisteredBinding>),
	/// Nothing matches.
	Unmatched,
}

/// Ordered, identity-keyed collection of proxy bindings.
#[derive(Debug)]
pub struct BindingRegistry(RwLock<Snapshot>);
impl BindingRegistry {
	/// Inserts a new binding or replaces the one with the same identity, keeping its position.
	pub fn register_or_update(&self, binding: ProxyBinding) {
		let mut guard = self.0.write();
		let mut next = guard.to_vec();
		let registered = Arc::new(RegisteredBinding::new(binding));

		if registered.redirect_authority().is_none() {
			tracing::warn!(
				id = %registered.id,
				redirect_uri = %registered.redirect_uri,
				"binding redirect URI has no usable host"
			);
		}

		match next.iter().position(|existing| existing.id == registered.id) {
			Some(index) => {
				tracing::info!(
					id = %registered.id,
					host = %registered.external_host,
					address = %registered.backend_address,
					port = registered.backend_port,
					"update http backend"
				);

				next[index] = registered;
			},
			None => {
				tracing::info!(
					id = %registered.id,
					host = %registered.external_host,
					address = %registered.backend_address,
					port = registered.backend_port,
					"register http backend"
				);

				next.push(registered);
			},
		}

		obs::record_binding_count(next.len());

		*guard = next.into();
	}

	/// Removes the binding with `id`, keeping the order of the rest.
	pub fn unregister(&self, id: &BindingId) -> Result<()> {
		let mut guard = self.0.write();
		let Some(index) = guard.iter().position(|existing| &existing.id == id) else {
			return Err(Error::NotRegistered { id: id.clone() });
		};
		let mut next = guard.to_vec();

		next.remove(index);
		tracing::info!(%id, "unregister http backend");
		obs::record_binding_count(next.len());

		*guard = next.into();

		Ok(())
	}

	/// Consistent view for one routing decision.
	pub fn snapshot(&self) -> Snapshot {
		self.0.read().clone()
	}

	/// Number of registered bindings.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Whether no binding is registered.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Picks the route for a request addressed to `host`.
	///
	/// The first binding, in registration order, whose external host equals `host` wins; failing
	/// that, the first binding whose redirect URI authority equals `host`. Hosts compare ASCII
	/// case-insensitively and include the port when one is present.
	pub fn route(&self, host: &str) -> Route {
		let snapshot = self.snapshot();

		if let Some(binding) =
			snapshot.iter().find(|binding| binding.external_host.eq_ignore_ascii_case(host))
		{
			return Route::Outbound(Arc::clone(binding));
		}

		snapshot
			.iter()
			.find(|binding| {
				binding
					.redirect_authority()
					.is_some_and(|authority| authority.eq_ignore_ascii_case(host))
			})
			.map_or(Route::Unmatched, |binding| Route::Inbound(Arc::clone(binding)))
	}
}
impl Default for BindingRegistry {
	fn default() -> Self {
		Self(RwLock::new(Arc::from(Vec::new())))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::binding;

	fn ids(registry: &BindingRegistry) -> Vec<String> {
		registry.snapshot().iter().map(|binding| binding.id.name.clone()).collect()
	}

	#[test]
	fn register_twice_keeps_one_binding_in_place() {
		let registry = BindingRegistry::default();

		registry.register_or_update(binding("first", "a.internal", "https://proxy.example/cb"));
		registry.register_or_update(binding("second", "b.internal", "https://proxy.example/cb"));
		registry.register_or_update(
			binding("first", "a2.internal", "https://proxy2.example/cb").with_backend("10.9.9.9", 9),
		);

		assert_eq!(registry.len(), 2);
		assert_eq!(ids(&registry), ["first", "second"]);

		let snapshot = registry.snapshot();

		assert_eq!(snapshot[0].external_host, "a2.internal");
		assert_eq!(snapshot[0].redirect_uri, "https://proxy2.example/cb");
		assert_eq!(snapshot[0].backend_authority(), "10.9.9.9:9");
	}

	#[test]
	fn unregister_unknown_fails_and_leaves_registry_untouched() {
		let registry = BindingRegistry::default();

		registry.register_or_update(binding("first", "a.internal", "https://proxy.example/cb"));

		let err = registry
			.unregister(&BindingId::new("default", "does-not-exist"))
			.expect_err("Unknown identity should not be removable.");

		assert!(matches!(err, Error::NotRegistered { .. }));
		assert_eq!(registry.len(), 1);
	}

	#[test]
	fn unregister_preserves_order_of_remaining_bindings() {
		let registry = BindingRegistry::default();

		for name in ["a", "b", "c"] {
			registry.register_or_update(binding(name, name, "https://proxy.example/cb"));
		}

		registry
			.unregister(&BindingId::new("default", "b"))
			.expect("Registered identity should be removable.");

		assert_eq!(ids(&registry), ["a", "c"]);
		assert!(registry.unregister(&BindingId::new("default", "b")).is_err());
	}

	#[test]
	fn first_registered_binding_wins_shared_host() {
		let registry = BindingRegistry::default();

		registry.register_or_update(binding("older", "shared.internal", "https://proxy.example/cb"));
		registry.register_or_update(binding("newer", "shared.internal", "https://proxy.example/cb"));

		let Route::Outbound(selected) = registry.route("shared.internal") else {
			panic!("Shared host should route outbound.");
		};

		assert_eq!(selected.id.name, "older");

		let Route::Inbound(selected) = registry.route("proxy.example") else {
			panic!("Redirect host should route inbound.");
		};

		assert_eq!(selected.id.name, "older");
	}

	#[test]
	fn external_host_beats_later_redirect_host_match() {
		let registry = BindingRegistry::default();

		registry.register_or_update(binding("callback", "app.internal", "https://login.example/cb"));
		registry.register_or_update(binding("login-ui", "login.example", "https://other.example/cb"));

		assert!(matches!(registry.route("login.example"), Route::Outbound(b) if b.id.name == "login-ui"));
		assert!(matches!(registry.route("LOGIN.example"), Route::Outbound(_)));
		assert!(matches!(registry.route("nowhere.example"), Route::Unmatched));
	}

	#[test]
	fn unparsable_redirect_uri_never_matches_inbound() {
		let registry = BindingRegistry::default();

		registry.register_or_update(binding("broken", "app.internal", ":):((#///`"));
		registry.register_or_update(binding("ok", "ok.internal", "https://proxy.example/cb"));

		assert!(matches!(registry.route("proxy.example"), Route::Inbound(b) if b.id.name == "ok"));
		assert!(matches!(registry.route("app.internal"), Route::Outbound(b) if b.id.name == "broken"));
	}

	#[derive(Clone, Default)]
	struct CapturedLogs(Arc<Mutex<Vec<u8>>>);
	impl CapturedLogs {
		fn count(&self, needle: &str) -> usize {
			String::from_utf8_lossy(&self.0.lock()).matches(needle).count()
		}
	}
	impl std::io::Write for CapturedLogs {
		fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
			self.0.lock().extend_from_slice(buf);

			Ok(buf.len())
		}

		fn flush(&mut self) -> std::io::Result<()> {
			Ok(())
		}
	}

	#[test]
	fn unusable_redirect_uri_is_reported_once_at_registration() {
		let logs = CapturedLogs::default();
		let writer = logs.clone();
		let subscriber = tracing_subscriber::fmt()
			.with_writer(move || writer.clone())
			.with_ansi(false)
			.finish();

		tracing::subscriber::with_default(subscriber, || {
			let registry = BindingRegistry::default();

			registry.register_or_update(binding("broken", "app.internal", ":):((#///`"));
			registry.register_or_update(binding("ok", "ok.internal", "https://proxy.example/cb"));

			for host in ["proxy.example", "elsewhere.example", "other.example"] {
				registry.route(host);
			}
		});

		assert_eq!(logs.count("binding redirect URI has no usable host"), 1);
	}

	#[test]
	fn snapshot_is_stable_across_later_mutations() {
		let registry = BindingRegistry::default();

		registry.register_or_update(binding("a", "a.internal", "https://proxy.example/cb"));

		let before = registry.snapshot();

		registry.register_or_update(binding("b", "b.internal", "https://proxy.example/cb"));
		registry.unregister(&BindingId::new("default", "a")).expect("Binding should be removable.");

		assert_eq!(before.len(), 1);
		assert_eq!(before[0].id.name, "a");
		assert_eq!(ids(&registry), ["b"]);
	}

	#[test]
	fn concurrent_mutations_never_expose_partial_lists() {
		let registry = Arc::new(BindingRegistry::default());
		let writers: Vec<_> = (0..4)
			.map(|writer| {
				let registry = Arc::clone(&registry);

				std::thread::spawn(move || {
					for round in 0..200 {
						let name = format!("w{writer}-{}", round % 5);

						registry.register_or_update(binding(&name, &name, "https://proxy.example/cb"));

						if round % 3 == 0 {
							let _ = registry.unregister(&BindingId::new("default", name));
						}
					}
				})
			})
			.collect();

		for _ in 0..200 {
			let snapshot = registry.snapshot();
			let mut seen = std::collections::HashSet::new();

			assert!(snapshot.iter().all(|binding| seen.insert(binding.id.clone())));
		}
		for writer in writers {
			writer.join().expect("Writer thread should not panic.");
		}

		assert!(registry.len() <= 20);
	}
}
