use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, QueryRejection},
        DefaultBodyLimit, Path, Query, State,
    },
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use ihbar_sdk::action::{ActionGetResponse, ActionPostRequest, ActionPostResponse, ActionsJson};
use ihbar_sdk::crypto::encrypt_memo;
use ihbar_sdk::variant::ACTIONS_PATH_PREFIX;
use ihbar_sdk::ActionVariant;
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::info;

use crate::blockhash::{BlockhashSource, RpcBlockhashSource};
use crate::config::ServerConfig;
use crate::error::{Result, ServerError};

pub const ACTION_VERSION: &str = "2.1.3";

const FORWARDED_PROTO: &str = "x-forwarded-proto";

pub struct AppState {
    pub config: ServerConfig,
    pub variants: Vec<ActionVariant>,
    pub blockhash: Arc<dyn BlockhashSource>,
    /// Attached to every response, errors included.
    pub response_headers: Vec<(HeaderName, HeaderValue)>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let blockhash = Arc::new(RpcBlockhashSource::new(
            config.rpc_url.clone(),
            config.rpc_timeout,
        ));
        Self::with_blockhash_source(config, blockhash)
    }

    pub fn with_blockhash_source(
        config: ServerConfig,
        blockhash: Arc<dyn BlockhashSource>,
    ) -> anyhow::Result<Self> {
        let variants = config.variants()?;
        let response_headers = action_headers(&config.blockchain_id)?;

        Ok(Self {
            config,
            variants,
            blockhash,
            response_headers,
        })
    }

    fn variant(&self, name: &str) -> Result<&ActionVariant> {
        self.variants
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| ServerError::UnknownAction(name.to_string()))
    }

    /// `PUBLIC_BASE_URL` when set, otherwise the request's `Host` with the scheme a
    /// TLS-terminating proxy reports in `X-Forwarded-Proto` (plain `http` without one).
    fn base_url(&self, headers: &HeaderMap) -> String {
        if let Some(base) = &self.config.public_base_url {
            return base.clone();
        }
        let scheme = headers
            .get(FORWARDED_PROTO)
            .and_then(|proto| proto.to_str().ok())
            .and_then(|proto| proto.split(',').next())
            .map(str::trim)
            .filter(|proto| matches!(*proto, "http" | "https"))
            .unwrap_or("http");
        headers
            .get(header::HOST)
            .and_then(|host| host.to_str().ok())
            .map(|host| format!("{}://{}", scheme, host))
            .unwrap_or_default()
    }
}

/// CORS and Solana Actions headers required by Blink clients.
pub fn action_headers(blockchain_id: &str) -> anyhow::Result<Vec<(HeaderName, HeaderValue)>> {
    Ok(vec![
        (
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ),
        (
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET,POST,PUT,OPTIONS"),
        ),
        (
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(
                "Content-Type, Authorization, Content-Encoding, Accept-Encoding, X-Accept-Action-Version, X-Accept-Blockchain-Ids",
            ),
        ),
        (
            header::ACCESS_CONTROL_EXPOSE_HEADERS,
            HeaderValue::from_static("X-Action-Version, X-Blockchain-Ids"),
        ),
        (
            HeaderName::from_static("x-action-version"),
            HeaderValue::from_static(ACTION_VERSION),
        ),
        (
            HeaderName::from_static("x-blockchain-ids"),
            HeaderValue::from_str(blockchain_id)
                .map_err(|e| anyhow::anyhow!("Invalid BLOCKCHAIN_ID {}: {}", blockchain_id, e))?,
        ),
    ])
}

pub fn router(state: Arc<AppState>) -> Router {
    let mut app: Router<Arc<AppState>> = Router::new()
        .route("/health", get(health))
        // Blink clients resolve the API from the site root through this file
        .route("/actions.json", get(actions_json).options(preflight))
        .route(
            &format!("{}/:action", ACTIONS_PATH_PREFIX),
            get(get_action).post(post_action).options(preflight),
        )
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(state.config.max_body_bytes)),
        );

    for (name, value) in &state.response_headers {
        app = app.layer(SetResponseHeaderLayer::overriding(
            name.clone(),
            value.clone(),
        ));
    }

    app.with_state(state)
}

pub async fn run(state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", state.config.host, state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Actions server listening on {}", addr);
    for variant in &state.variants {
        info!(
            "Serving {} (recipient {})",
            variant.path(),
            variant.recipient
        );
    }

    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn actions_json() -> Json<ActionsJson> {
    Json(ActionsJson::identity(ACTIONS_PATH_PREFIX))
}

/// Browsers send a CORS preflight before every cross-origin POST.
async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}

async fn get_action(
    State(state): State<Arc<AppState>>,
    Path(action): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ActionGetResponse>> {
    let variant = state.variant(&action)?;
    Ok(Json(variant.get_response(&state.base_url(&headers))))
}

async fn post_action(
    State(state): State<Arc<AppState>>,
    Path(action): Path<String>,
    query: std::result::Result<Query<Vec<(String, String)>>, QueryRejection>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Json<ActionPostResponse>> {
    let variant = state.variant(&action)?;

    let Query(params) = query.map_err(|e| ServerError::InvalidRequest(e.body_text()))?;
    let memo = variant.compose_memo(&params)?;

    // Over `MAX_BODY_BYTES` lands here too
    let body = body.map_err(|e| ServerError::InvalidRequest(e.body_text()))?;
    let request: ActionPostRequest = serde_json::from_slice(&body)
        .map_err(|e| ServerError::InvalidRequest(format!("Invalid request body: {}", e)))?;
    let account = Pubkey::from_str(&request.account).map_err(|_| ServerError::InvalidAccount)?;

    let ciphertext = encrypt_memo(&memo, &state.config.secret)?;
    let blockhash = state.blockhash.latest_blockhash().await?;
    let response = variant.post_response(&account, &ciphertext, blockhash)?;

    info!(
        "Built unsigned {} transaction for {} ({} byte memo)",
        variant.name,
        account,
        ciphertext.len()
    );
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ihbar_sdk::crypto::decrypt_memo;
    use ihbar_sdk::transaction::{deserialize_transaction, extract_memo};
    use serde_json::{json, Value};
    use solana_sdk::{hash::Hash, signature::Keypair, signer::Signer};
    use std::collections::HashMap;

    struct FixedBlockhash(Hash);

    #[async_trait]
    impl BlockhashSource for FixedBlockhash {
        async fn latest_blockhash(&self) -> Result<Hash> {
            Ok(self.0)
        }
    }

    /// Fails the way an unreachable RPC node does.
    struct UnreachableRpc;

    #[async_trait]
    impl BlockhashSource for UnreachableRpc {
        async fn latest_blockhash(&self) -> Result<Hash> {
            Err(ServerError::SolanaClient(
                solana_client::client_error::ClientErrorKind::Custom("connection refused".into())
                    .into(),
            ))
        }
    }

    fn test_config(extra: &[(&str, &str)]) -> ServerConfig {
        let mut vars: HashMap<String, String> = extra
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        vars.insert("SECRET_KEY".into(), Keypair::new().to_base58_string());
        ServerConfig::from_lookup(|key| vars.get(key).cloned()).unwrap()
    }

    async fn spawn_app(
        config: ServerConfig,
        blockhash: Arc<dyn BlockhashSource>,
    ) -> (String, Arc<AppState>) {
        let state = Arc::new(AppState::with_blockhash_source(config, blockhash).unwrap());
        let app = router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        (format!("http://127.0.0.1:{}", port), state)
    }

    fn assert_action_headers(response: &reqwest::Response) {
        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-allow-methods"], "GET,POST,PUT,OPTIONS");
        assert_eq!(headers["x-action-version"], ACTION_VERSION);
        assert_eq!(
            headers["x-blockchain-ids"],
            crate::config::DEVNET_BLOCKCHAIN_ID
        );
    }

    #[tokio::test]
    async fn test_get_describes_action() {
        let (base, _) =
            spawn_app(test_config(&[]), Arc::new(FixedBlockhash(Hash::new_unique()))).await;

        let response = reqwest::get(format!("{}/api/actions/benimHayatim", base))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_action_headers(&response);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["type"], "action");
        assert_eq!(body["title"], "SEN DEGIL ONLAR UYUMASIN");

        let action = &body["links"]["actions"][0];
        let href = action["href"].as_str().unwrap();
        assert!(href.starts_with(&format!("{}/api/actions/benimHayatim?", base)));
        assert!(href.contains("{sucluIsmi}"));
        assert!(href.contains("{ihbarMetni}"));
        assert_eq!(action["parameters"][0]["name"], "sucluIsmi");
        assert_eq!(action["parameters"][1]["name"], "ihbarMetni");
        assert_eq!(action["parameters"][1]["required"], true);
    }

    #[tokio::test]
    async fn test_get_uses_public_base_url() {
        let config = test_config(&[("PUBLIC_BASE_URL", "https://ihbar.example")]);
        let (base, _) = spawn_app(config, Arc::new(FixedBlockhash(Hash::new_unique()))).await;

        let body: Value = reqwest::get(format!("{}/api/actions/platformIhbar", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let href = body["links"]["actions"][0]["href"].as_str().unwrap();
        assert!(href.starts_with("https://ihbar.example/api/actions/platformIhbar?platform={platformAdi}"));
        assert_eq!(
            body["links"]["actions"][0]["parameters"]
                .as_array()
                .unwrap()
                .len(),
            4
        );
    }

    #[tokio::test]
    async fn test_options_preflight() {
        let (base, _) =
            spawn_app(test_config(&[]), Arc::new(FixedBlockhash(Hash::new_unique()))).await;

        let response = reqwest::Client::new()
            .request(
                reqwest::Method::OPTIONS,
                format!("{}/api/actions/benimHayatim", base),
            )
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_action_headers(&response);
        assert!(response.text().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_post_rejects_invalid_account() {
        let (base, _) =
            spawn_app(test_config(&[]), Arc::new(FixedBlockhash(Hash::new_unique()))).await;

        for body in [json!({ "account": "not-a-valid-key" }), json!({})] {
            let response = reqwest::Client::new()
                .post(format!("{}/api/actions/benimHayatim", base))
                .json(&body)
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), 400);
            assert_action_headers(&response);
            assert_eq!(response.text().await.unwrap(), "Invalid \"account\" provided");
        }
    }

    #[tokio::test]
    async fn test_post_builds_two_field_report() {
        let blockhash = Hash::new_unique();
        let (base, state) = spawn_app(test_config(&[]), Arc::new(FixedBlockhash(blockhash))).await;
        let payer = Keypair::new().pubkey();

        let response = reqwest::Client::new()
            .post(format!(
                "{}/api/actions/benimHayatim?suclu=Alice&ihbar=text",
                base
            ))
            .json(&json!({ "account": payer.to_string() }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_action_headers(&response);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["type"], "transaction");
        assert_eq!(body["message"], "İhbarınız başarıyla iletildi");

        let tx = deserialize_transaction(body["transaction"].as_str().unwrap()).unwrap();
        assert_eq!(tx.message.account_keys[0], payer);
        assert_eq!(tx.message.recent_blockhash, blockhash);
        assert!(tx
            .message
            .account_keys
            .contains(&state.config.benim_hayatim_recipient));

        let memo = decrypt_memo(&extract_memo(&tx).unwrap(), &state.config.secret).unwrap();
        assert_eq!(memo, "Suclu: Alice | Ihbar: text");
    }

    #[tokio::test]
    async fn test_post_builds_four_field_report() {
        let (base, state) =
            spawn_app(test_config(&[]), Arc::new(FixedBlockhash(Hash::new_unique()))).await;
        let payer = Keypair::new().pubkey();

        let response = reqwest::Client::new()
            .post(format!(
                "{}/api/actions/platformIhbar?platform=X&suclu=Y&zaman=Z&ihbar=W",
                base
            ))
            .json(&json!({ "account": payer.to_string() }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body: Value = response.json().await.unwrap();
        let tx = deserialize_transaction(body["transaction"].as_str().unwrap()).unwrap();
        assert!(tx
            .message
            .account_keys
            .contains(&state.config.platform_ihbar_recipient));
        let memo = decrypt_memo(&extract_memo(&tx).unwrap(), &state.config.secret).unwrap();
        assert_eq!(memo, "Platform : X| Suclu: Y | Zaman: Z | Ihbar: W");
    }

    #[tokio::test]
    async fn test_post_defaults_missing_fields() {
        let (base, state) =
            spawn_app(test_config(&[]), Arc::new(FixedBlockhash(Hash::new_unique()))).await;

        let body: Value = reqwest::Client::new()
            .post(format!("{}/api/actions/benimHayatim?suclu=&ihbar=metin", base))
            .json(&json!({ "account": Keypair::new().pubkey().to_string() }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        let tx = deserialize_transaction(body["transaction"].as_str().unwrap()).unwrap();
        let memo = decrypt_memo(&extract_memo(&tx).unwrap(), &state.config.secret).unwrap();
        assert_eq!(memo, "Suclu: sucluIsmi | Ihbar: metin");
    }

    #[tokio::test]
    async fn test_post_rpc_failure_is_generic_error() {
        let (base, _) = spawn_app(test_config(&[]), Arc::new(UnreachableRpc)).await;

        let response = reqwest::Client::new()
            .post(format!("{}/api/actions/benimHayatim", base))
            .json(&json!({ "account": Keypair::new().pubkey().to_string() }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        assert_action_headers(&response);
        assert_eq!(
            response.text().await.unwrap(),
            crate::error::GENERIC_ERROR_MESSAGE
        );
    }

    #[tokio::test]
    async fn test_post_malformed_body_and_oversize_report() {
        let (base, _) =
            spawn_app(test_config(&[]), Arc::new(FixedBlockhash(Hash::new_unique()))).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{}/api/actions/benimHayatim", base))
            .body("not json")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        assert_eq!(
            response.text().await.unwrap(),
            crate::error::GENERIC_ERROR_MESSAGE
        );

        // Does not fit in a single transaction packet
        let response = client
            .post(format!("{}/api/actions/benimHayatim", base))
            .query(&[("ihbar", "x".repeat(1500))])
            .json(&json!({ "account": Keypair::new().pubkey().to_string() }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
    }

    #[tokio::test]
    async fn test_post_oversize_body_is_generic_error() {
        let (base, _) =
            spawn_app(test_config(&[]), Arc::new(FixedBlockhash(Hash::new_unique()))).await;

        let response = reqwest::Client::new()
            .post(format!("{}/api/actions/benimHayatim", base))
            .json(&json!({
                "account": Keypair::new().pubkey().to_string(),
                "pad": "x".repeat(20_000),
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        assert_action_headers(&response);
        assert_eq!(
            response.text().await.unwrap(),
            crate::error::GENERIC_ERROR_MESSAGE
        );
    }

    #[tokio::test]
    async fn test_get_href_follows_forwarded_proto() {
        let (base, _) =
            spawn_app(test_config(&[]), Arc::new(FixedBlockhash(Hash::new_unique()))).await;
        let host = base.trim_start_matches("http://");

        let body: Value = reqwest::Client::new()
            .get(format!("{}/api/actions/benimHayatim", base))
            .header("X-Forwarded-Proto", "https, http")
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let href = body["links"]["actions"][0]["href"].as_str().unwrap();
        assert!(href.starts_with(&format!("https://{}/api/actions/benimHayatim?", host)));

        let body: Value = reqwest::get(format!("{}/api/actions/benimHayatim", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let href = body["links"]["actions"][0]["href"].as_str().unwrap();
        assert!(href.starts_with(&format!("http://{}/api/actions/benimHayatim?", host)));
    }

    #[tokio::test]
    async fn test_unknown_action_and_discovery() {
        let (base, _) =
            spawn_app(test_config(&[]), Arc::new(FixedBlockhash(Hash::new_unique()))).await;

        let response = reqwest::get(format!("{}/api/actions/yok", base))
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
        assert_action_headers(&response);

        let response = reqwest::get(format!("{}/actions.json", base)).await.unwrap();
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["rules"][0]["pathPattern"], "/api/actions/**");

        let body: Value = reqwest::get(format!("{}/health", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
    }
}
