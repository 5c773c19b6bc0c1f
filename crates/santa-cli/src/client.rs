//! Async HTTP client wrapping the santa JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Response, Url};
use santa_core::{
  exchange::{DrawOutcome, PairView, ParticipantView},
  game::{GameState, StateTransition},
  participant::{NewParticipant, Participant, ParticipantId, ParticipantUpdate},
};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;

/// Connection settings for the santa API.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
  pub base_url:   String,
  pub admin_code: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

#[derive(Deserialize)]
struct LoginResponse {
  token: String,
}

#[derive(Deserialize)]
struct CheckResponse {
  exists: bool,
}

/// Async HTTP client for the santa JSON API.
///
/// Admin calls need [`ApiClient::login`] first.
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
  token:  Option<String>,
}

/// Turn a non-2xx response into an error carrying the server's message.
async fn expect_success(resp: Response, what: &str) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let message = match resp.json::<ErrorBody>().await {
    Ok(body) => body.error,
    Err(_) => status.canonical_reason().unwrap_or("request failed").to_string(),
  };
  Err(anyhow!("{what} → {status}: {message}"))
}

async fn expect_json<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T> {
  expect_success(resp, what)
    .await?
    .json()
    .await
    .with_context(|| format!("deserialising response to {what}"))
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config, token: None })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  /// `/api/<segments...>` with each segment percent-encoded.
  fn url_with_segments(&self, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(&self.url(""))
      .with_context(|| format!("invalid server URL {:?}", self.config.base_url))?;
    url
      .path_segments_mut()
      .map_err(|_| anyhow!("server URL cannot be a base"))?
      .extend(segments);
    Ok(url)
  }

  fn admin(&self, req: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
    let token = self.token.as_deref().ok_or_else(|| anyhow!("not logged in"))?;
    Ok(req.bearer_auth(token))
  }

  // ── Public ────────────────────────────────────────────────────────────────

  /// `GET /api/game`
  pub async fn game(&self) -> Result<GameState> {
    let resp = self
      .client
      .get(self.url("/game"))
      .send()
      .await
      .context("GET /game failed")?;
    expect_json(resp, "GET /game").await
  }

  /// `POST /api/participants`
  pub async fn register(&self, input: &NewParticipant) -> Result<Participant> {
    let resp = self
      .client
      .post(self.url("/participants"))
      .json(input)
      .send()
      .await
      .context("POST /participants failed")?;
    expect_json(resp, "POST /participants").await
  }

  /// `GET /api/participants/{email}`
  pub async fn lookup(&self, email: &str) -> Result<ParticipantView> {
    let url = self.url_with_segments(&["participants", email])?;
    let resp = self
      .client
      .get(url)
      .send()
      .await
      .context("GET /participants/{email} failed")?;
    expect_json(resp, "GET /participants/{email}").await
  }

  /// `POST /api/participants/check`
  pub async fn check(&self, email: &str) -> Result<bool> {
    let resp = self
      .client
      .post(self.url("/participants/check"))
      .json(&json!({ "email": email }))
      .send()
      .await
      .context("POST /participants/check failed")?;
    let body: CheckResponse = expect_json(resp, "POST /participants/check").await?;
    Ok(body.exists)
  }

  // ── Session ───────────────────────────────────────────────────────────────

  /// `POST /api/admin/login` with the configured admin code.
  pub async fn login(&mut self) -> Result<()> {
    let code = self
      .config
      .admin_code
      .clone()
      .ok_or_else(|| anyhow!("admin code required (--admin-code or SANTA_ADMIN_CODE)"))?;
    let resp = self
      .client
      .post(self.url("/admin/login"))
      .json(&json!({ "code": code }))
      .send()
      .await
      .context("POST /admin/login failed")?;
    let body: LoginResponse = expect_json(resp, "POST /admin/login").await?;
    self.token = Some(body.token);
    Ok(())
  }

  /// `POST /api/admin/logout`
  pub async fn logout(&mut self) -> Result<()> {
    let req = self.admin(self.client.post(self.url("/admin/logout")))?;
    let resp = req.send().await.context("POST /admin/logout failed")?;
    expect_success(resp, "POST /admin/logout").await?;
    self.token = None;
    Ok(())
  }

  // ── Admin ─────────────────────────────────────────────────────────────────

  /// `GET /api/admin/participants`
  pub async fn participants(&self) -> Result<Vec<Participant>> {
    let req = self.admin(self.client.get(self.url("/admin/participants")))?;
    let resp = req.send().await.context("GET /admin/participants failed")?;
    expect_json(resp, "GET /admin/participants").await
  }

  /// `GET /api/admin/participants/{id}`
  pub async fn participant(&self, id: ParticipantId) -> Result<Participant> {
    let req = self.admin(self.client.get(self.url(&format!("/admin/participants/{id}"))))?;
    let resp = req.send().await.context("GET /admin/participants/{id} failed")?;
    expect_json(resp, "GET /admin/participants/{id}").await
  }

  /// `PUT /api/admin/participants/{id}`
  pub async fn update_participant(
    &self,
    id: ParticipantId,
    update: &ParticipantUpdate,
  ) -> Result<Participant> {
    let req = self.admin(self.client.put(self.url(&format!("/admin/participants/{id}"))))?;
    let resp = req
      .json(update)
      .send()
      .await
      .context("PUT /admin/participants/{id} failed")?;
    expect_json(resp, "PUT /admin/participants/{id}").await
  }

  /// `GET /api/admin/history`
  pub async fn history(&self) -> Result<Vec<StateTransition>> {
    let req = self.admin(self.client.get(self.url("/admin/history")))?;
    let resp = req.send().await.context("GET /admin/history failed")?;
    expect_json(resp, "GET /admin/history").await
  }

  /// `GET /api/admin/pairs`
  pub async fn pairs(&self) -> Result<Vec<PairView>> {
    let req = self.admin(self.client.get(self.url("/admin/pairs")))?;
    let resp = req.send().await.context("GET /admin/pairs failed")?;
    expect_json(resp, "GET /admin/pairs").await
  }

  /// `POST /api/admin/draw`
  pub async fn draw(&self) -> Result<DrawOutcome> {
    let req = self.admin(self.client.post(self.url("/admin/draw")))?;
    let resp = req.send().await.context("POST /admin/draw failed")?;
    expect_json(resp, "POST /admin/draw").await
  }

  /// `POST /api/admin/reset`
  pub async fn reset(&self) -> Result<GameState> {
    let req = self.admin(self.client.post(self.url("/admin/reset")))?;
    let resp = req.send().await.context("POST /admin/reset failed")?;
    expect_json(resp, "POST /admin/reset").await
  }

  /// `POST /api/admin/price-limit`
  pub async fn set_price_limit(&self, price_limit: f64) -> Result<GameState> {
    let req = self.admin(self.client.post(self.url("/admin/price-limit")))?;
    let resp = req
      .json(&json!({ "price_limit": price_limit }))
      .send()
      .await
      .context("POST /admin/price-limit failed")?;
    expect_json(resp, "POST /admin/price-limit").await
  }
}
