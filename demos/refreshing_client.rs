//! Demonstrates a reqwest client that renews an expired access token through the refresher
//! endpoint before sending, then keeps the rotated refresh token in the cookie jar.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use oauth2_refresher::{
	RefresherConfig, TokenPair, TokenRefresher,
	_preludet::{expired_jwt, fresh_jwt},
	reqwest::Client,
	store::{BackendKind, Backends},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let renewed = fresh_jwt();
	let refresher_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh").json_body(serde_json::json!({
				"token": "demo-refresh"
			}));
			then.status(200).json_body(serde_json::json!({
				"accessToken": renewed,
				"refreshToken": "rotated"
			}));
		})
		.await;
	let data_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/profile")
				.header("authorization", format!("Bearer {renewed}"));
			then.status(200).body("{\"name\":\"demo\"}");
		})
		.await;
	let config = RefresherConfig::builder(server.url("/api"))
		.refresher_endpoint(server.url("/auth/refresh"))
		.access_token_storage(BackendKind::Session, "at")
		.refresh_token_storage(BackendKind::Cookie, "rt")
		.bearer(true)
		.build()?;
	let backends = Backends::new(&config.base_url);
	let refresher = TokenRefresher::new(config, backends);

	refresher.store_tokens(&TokenPair {
		access_token: expired_jwt(),
		refresh_token: Some("demo-refresh".into()),
	})?;

	let client = refresher.client(Client::new());
	let body = client.get(server.url("/api/profile")).send().await?.text().await?;

	println!("Profile: {body}.");
	println!("Stored refresh token: {}.", refresher.store().refresh_token()?);

	refresher_mock.assert_async().await;
	data_mock.assert_async().await;

	Ok(())
}
