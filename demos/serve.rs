//! Serves the redirect-swap proxy on a local port with bindings loaded from `PROXY_BINDINGS`
//! (a JSON array of bindings). Without it, a single demo binding forwards `app.localhost` to a
//! backend on `127.0.0.1:3000`.

// std
use std::{env, sync::Arc};
// crates.io
use color_eyre::Result;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
// self
use oauth2_redirect_proxy::{
	binding::ProxyBinding,
	config::ProxyConfig,
	swap::ReqwestRedirectSwapProxy,
};

const DEMO_BINDINGS: &str = r#"[{
	"id": { "namespace": "demo", "name": "app" },
	"externalHost": "app.localhost:8080",
	"redirectURI": "http://callback.localhost:8080/oauth2/callback",
	"pathPrefixes": ["/login"],
	"backendAddress": "127.0.0.1",
	"backendPort": 3000
}]"#;

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
		)
		.init();

	let listen = env::var("PROXY_LISTEN").unwrap_or_else(|_| "127.0.0.1:8080".into());
	let bindings = env::var("PROXY_BINDINGS").unwrap_or_else(|_| DEMO_BINDINGS.into());
	let bindings = serde_json::from_str::<Vec<ProxyBinding>>(&bindings)?;
	let proxy = ReqwestRedirectSwapProxy::new(ProxyConfig::default())?;

	for binding in bindings {
		proxy.register_or_update(binding);
	}

	tracing::info!(bindings = proxy.registry().len(), %listen, "serving redirect-swap proxy");

	let proxy = Arc::new(proxy);
	let listener = TcpListener::bind(&listen).await?;

	oauth2_redirect_proxy::axum::serve(listener, proxy.router())
		.with_graceful_shutdown(async {
			let _ = tokio::signal::ctrl_c().await;
		})
		.await?;

	Ok(())
}
