use std::collections::HashSet;
use std::future::Future;
use std::num::NonZeroU32;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{MatchSource, SourceError};
use crate::config::CollectorSettings;
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, ReqwestHttpClient};
use crate::retry::RetryConfig;
use crate::MatchRecord;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

const API_KEY_HEADER: &str = "X-Riot-Token";

/// Routing hosts for the league (platform) and match (regional) endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiotRoutes {
    pub platform: String,
    pub region: String,
}

impl RiotRoutes {
    pub fn new(platform: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            region: region.into(),
        }
    }

    fn challenger_url(&self) -> String {
        format!(
            "https://{}.api.riotgames.com/tft/league/v1/challenger",
            self.platform
        )
    }

    fn match_ids_url(&self, puuid: &str) -> String {
        format!(
            "https://{}.api.riotgames.com/tft/match/v1/matches/by-puuid/{}/ids",
            self.region,
            urlencoding::encode(puuid)
        )
    }

    fn match_url(&self, match_id: &str) -> String {
        format!(
            "https://{}.api.riotgames.com/tft/match/v1/matches/{}",
            self.region,
            urlencoding::encode(match_id)
        )
    }
}

impl Default for RiotRoutes {
    fn default() -> Self {
        Self::new("na1", "americas")
    }
}

#[derive(Debug, Deserialize)]
struct LeagueList {
    #[serde(default)]
    entries: Vec<LeagueEntry>,
}

#[derive(Debug, Deserialize)]
struct LeagueEntry {
    #[serde(default)]
    puuid: Option<String>,
}

/// Riot TFT API match source with client-side throttling and retries.
#[derive(Clone)]
pub struct RiotMatchSource {
    http_client: Arc<dyn HttpClient>,
    api_key: Option<String>,
    routes: RiotRoutes,
    retry: RetryConfig,
    limiter: Arc<DirectRateLimiter>,
    timeout_ms: u64,
}

impl RiotMatchSource {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        api_key: Option<String>,
        routes: RiotRoutes,
    ) -> Self {
        Self {
            http_client,
            api_key,
            routes,
            retry: RetryConfig::default(),
            limiter: Arc::new(RateLimiter::direct(quota_from_window(
                Duration::from_secs(120),
                100,
                20,
            ))),
            timeout_ms: 20_000,
        }
    }

    pub fn from_settings(settings: &CollectorSettings) -> Self {
        Self::new(
            Arc::new(ReqwestHttpClient::new()),
            settings.api_key.clone(),
            RiotRoutes::new(settings.platform.clone(), settings.region.clone()),
        )
        .with_retry(settings.retry_config())
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Allow `limit` requests per `window`, at most `burst` back to back.
    pub fn with_quota(mut self, window: Duration, limit: u32, burst: u32) -> Self {
        self.limiter = Arc::new(RateLimiter::direct(quota_from_window(window, limit, burst)));
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Player ids (puuids) of the first `limit` challenger ladder entries.
    pub async fn challenger_player_ids(&self, limit: usize) -> Result<Vec<String>, SourceError> {
        let league: LeagueList = self
            .get_json(HttpRequest::get(self.routes.challenger_url()))
            .await?;

        let total = league.entries.len();
        let ids = league
            .entries
            .into_iter()
            .filter_map(|entry| entry.puuid.filter(|puuid| !puuid.is_empty()))
            .take(limit)
            .collect::<Vec<_>>();

        info!(ladder_entries = total, selected = ids.len(), "loaded challenger ladder");
        Ok(ids)
    }

    pub async fn match_ids(&self, puuid: &str, count: usize) -> Result<Vec<String>, SourceError> {
        let request = HttpRequest::get(self.routes.match_ids_url(puuid))
            .with_query("count", count.to_string());
        self.get_json(request).await
    }

    pub async fn match_record(&self, match_id: &str) -> Result<MatchRecord, SourceError> {
        self.get_json(HttpRequest::get(self.routes.match_url(match_id)))
            .await
    }

    fn auth(&self) -> Result<HttpAuth, SourceError> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(HttpAuth::header(API_KEY_HEADER, key)),
            _ => Err(SourceError::configuration(
                "riot API key is missing; set XCOMP_RIOT_API_KEY",
            )),
        }
    }

    async fn get_json<T>(&self, request: HttpRequest) -> Result<T, SourceError>
    where
        T: DeserializeOwned,
    {
        let request = request
            .with_auth(&self.auth()?)
            .with_timeout_ms(self.timeout_ms);
        let url = request.url.clone();
        let mut attempt = 0_u32;

        loop {
            self.limiter.until_ready().await;

            let delay = match self.http_client.execute(request.clone()).await {
                Ok(response) if response.is_success() => {
                    return serde_json::from_str(&response.body).map_err(|error| {
                        SourceError::decode(format!("unexpected payload from {url}: {error}"))
                    });
                }
                Ok(response) if self.retry.should_retry_status(response.status) => {
                    if attempt >= self.retry.max_retries {
                        return Err(exhausted(response.status, &url));
                    }
                    let delay = self.retry.delay_for_response(
                        attempt,
                        response.status,
                        response.header("retry-after"),
                    );
                    warn!(
                        status = response.status,
                        %url,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "upstream asked to retry"
                    );
                    delay
                }
                Ok(response) => {
                    return Err(rejected(response.status, &url, &response.body));
                }
                Err(error) if error.retryable() && self.retry.retry_on_transport => {
                    if attempt >= self.retry.max_retries {
                        return Err(SourceError::unavailable(format!(
                            "too many retries for {url}: {}",
                            error.message()
                        )));
                    }
                    let delay = self.retry.delay_for_attempt(attempt);
                    warn!(%url, attempt, error = error.message(), "transport error; retrying");
                    delay
                }
                Err(error) => {
                    return Err(SourceError::unavailable(format!(
                        "transport error for {url}: {}",
                        error.message()
                    )));
                }
            };

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

fn exhausted(status: u16, url: &str) -> SourceError {
    if status == 429 {
        SourceError::rate_limited(format!("too many retries (429) for {url}"))
    } else {
        SourceError::unavailable(format!("too many retries ({status}) for {url}"))
    }
}

fn rejected(status: u16, url: &str, body: &str) -> SourceError {
    let message = format!("HTTP {status} for {url} body={body}");
    match status {
        401 | 403 => SourceError::configuration(message),
        500..=599 => SourceError::unavailable(message),
        _ => SourceError::invalid_request(message),
    }
}

fn quota_from_window(window: Duration, limit: u32, burst: u32) -> Quota {
    let safe_limit = limit.max(1);
    let burst = NonZeroU32::new(burst.clamp(1, safe_limit)).unwrap_or(NonZeroU32::MIN);

    let seconds_per_cell = (window.as_secs_f64() / f64::from(safe_limit)).max(0.001);
    Quota::with_period(Duration::from_secs_f64(seconds_per_cell))
        .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
        .allow_burst(burst)
}

impl MatchSource for RiotMatchSource {
    fn fetch<'a>(
        &'a self,
        player_ids: &'a [String],
        count_per_player: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<MatchRecord>, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let mut fetched = HashSet::new();
            let mut matches = Vec::new();
            let total = player_ids.len();

            for (index, puuid) in player_ids.iter().enumerate() {
                info!(player = index + 1, total, "fetching match ids");
                let ids = self.match_ids(puuid, count_per_player).await?;

                for match_id in ids {
                    if !fetched.insert(match_id.clone()) {
                        debug!(%match_id, "match already fetched in this run");
                        continue;
                    }
                    matches.push(self.match_record(&match_id).await?);
                }
            }

            Ok(matches)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::http_client::{HttpError, HttpResponse};
    use crate::source::SourceErrorKind;

    #[derive(Default)]
    struct ScriptedHttpClient {
        responses: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedHttpClient {
        fn new(responses: Vec<Result<HttpResponse, HttpError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().expect("requests lock").clone()
        }
    }

    impl HttpClient for ScriptedHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.requests.lock().expect("requests lock").push(request);
            let next = self
                .responses
                .lock()
                .expect("responses lock")
                .pop_front()
                .unwrap_or_else(|| Err(HttpError::non_retryable("script exhausted")));
            Box::pin(async move { next })
        }
    }

    fn source(client: Arc<ScriptedHttpClient>) -> RiotMatchSource {
        RiotMatchSource::new(client, Some(String::from("RGAPI-test")), RiotRoutes::default())
            .with_retry(RetryConfig::fixed(Duration::ZERO, 2))
            .with_quota(Duration::from_millis(1), 1_000, 1_000)
    }

    fn match_body(id: &str) -> String {
        format!(
            r#"{{"metadata":{{"match_id":"{id}"}},"info":{{"participants":[{{"placement":1,"traits":[{{"name":"TFT9_Noxus","num_units":3}}]}}]}}}}"#
        )
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_any_request() {
        let client = ScriptedHttpClient::new(Vec::new());
        let source = RiotMatchSource::new(client.clone(), None, RiotRoutes::default());

        let error = source
            .challenger_player_ids(10)
            .await
            .expect_err("must fail");

        assert_eq!(error.kind(), SourceErrorKind::Configuration);
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn rate_limited_requests_are_retried() {
        let client = ScriptedHttpClient::new(vec![
            Ok(HttpResponse::new(429, "").with_header("Retry-After", "0")),
            Ok(HttpResponse::ok_json(r#"["NA1_1","NA1_2"]"#)),
        ]);
        let source = source(client.clone());

        let ids = source.match_ids("puuid-1", 2).await.expect("ids");

        assert_eq!(ids, vec!["NA1_1", "NA1_2"]);
        let requests = client.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[0].headers.get("x-riot-token").map(String::as_str),
            Some("RGAPI-test")
        );
        assert_eq!(requests[0].query, vec![(String::from("count"), String::from("2"))]);
    }

    #[tokio::test]
    async fn exhausted_rate_limit_retries_are_fatal() {
        let client = ScriptedHttpClient::new(vec![
            Ok(HttpResponse::new(429, "")),
            Ok(HttpResponse::new(429, "")),
            Ok(HttpResponse::new(429, "")),
        ]);
        let source = source(client.clone());

        let error = source.match_ids("puuid-1", 2).await.expect_err("must fail");

        assert_eq!(error.kind(), SourceErrorKind::RateLimited);
        assert_eq!(client.requests().len(), 3);
    }

    #[tokio::test]
    async fn other_statuses_fail_without_retry() {
        let client = ScriptedHttpClient::new(vec![Ok(HttpResponse::new(404, "{\"status\":404}"))]);
        let source = source(client.clone());

        let error = source.match_record("NA1_404").await.expect_err("must fail");

        assert_eq!(error.kind(), SourceErrorKind::InvalidRequest);
        assert!(error.message().contains("404"));
        assert_eq!(client.requests().len(), 1);
    }

    #[tokio::test]
    async fn ladder_entries_without_puuid_are_skipped() {
        let client = ScriptedHttpClient::new(vec![Ok(HttpResponse::ok_json(
            r#"{"entries":[{"puuid":"a"},{"summonerId":"legacy"},{"puuid":"b"},{"puuid":"c"}]}"#,
        ))]);
        let source = source(client);

        let ids = source.challenger_player_ids(2).await.expect("ids");
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn fetch_skips_match_ids_already_fetched() {
        let client = ScriptedHttpClient::new(vec![
            Ok(HttpResponse::ok_json(r#"["NA1_1","NA1_2"]"#)),
            Ok(HttpResponse::ok_json(match_body("NA1_1"))),
            Ok(HttpResponse::ok_json(match_body("NA1_2"))),
            Ok(HttpResponse::ok_json(r#"["NA1_2","NA1_3"]"#)),
            Ok(HttpResponse::ok_json(match_body("NA1_3"))),
        ]);
        let source = source(client.clone());
        let players = vec![String::from("p1"), String::from("p2")];

        let matches = source.fetch(&players, 2).await.expect("matches");

        let ids = matches.iter().map(MatchRecord::match_id).collect::<Vec<_>>();
        assert_eq!(ids, vec!["NA1_1", "NA1_2", "NA1_3"]);
        assert_eq!(client.requests().len(), 5);
    }

    #[tokio::test]
    async fn malformed_payloads_are_decode_errors() {
        let client = ScriptedHttpClient::new(vec![Ok(HttpResponse::ok_json("not json"))]);
        let source = source(client);

        let error = source.match_ids("p1", 1).await.expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::Decode);
    }
}
