use crate::config::{AgentConfig, TrendMode};
use crate::normalize::dedup_rank;
use llm_client::BoxError;
use rand::Rng;
use rss::Channel;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// HTTP timeout for trend endpoints
const FETCH_TIMEOUT_SECS: u64 = 30;
/// Flat score for hot-mode rows; the feed carries no usable strength signal
const HOT_SCORE: f64 = 60.0;
/// Base pacing between seed expansions, plus up to 600ms jitter, to stay
/// polite with the suggest endpoint
const SEED_PACING_MS: u64 = 800;
const SEED_PACING_JITTER_MS: u64 = 600;

const DEFAULT_TRENDS_BASE_URL: &str = "https://trends.google.com";
const DEFAULT_SUGGEST_BASE_URL: &str = "https://suggestqueries.google.com";

/// Live trend acquisition. Rows are untrusted and duplicate-laden; the
/// pipeline runs them through the normalizer before use.
pub struct TrendsClient {
    client: reqwest::Client,
    mode: TrendMode,
    seeds: Vec<String>,
    geo: String,
    hl: String,
}

impl TrendsClient {
    pub fn new(cfg: &AgentConfig) -> Result<Self, BoxError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            mode: cfg.trend_mode,
            seeds: cfg.seeds.clone(),
            geo: cfg.geo.clone(),
            hl: cfg.hl.clone(),
        })
    }

    /// Raw `(term, score)` rows for the configured mode. An empty harvest is
    /// an acquisition failure; the caller routes it to the backup vocabulary.
    pub async fn fetch(&self) -> Result<Vec<(String, f64)>, BoxError> {
        let rows = match self.mode {
            TrendMode::Hot => self.fetch_hot().await?,
            TrendMode::Seeded => {
                let mut rows = self.fetch_seeded().await;
                // Mix in the daily hot feed for topical variety; losing it is
                // not fatal as long as the seeds produced something.
                match self.fetch_hot().await {
                    Ok(mut hot) => rows.append(&mut hot),
                    Err(e) => warn!(error = %e, "Hot feed unavailable, continuing with seeded rows"),
                }
                rows
            }
        };

        if rows.is_empty() {
            return Err("no usable trend rows".into());
        }
        Ok(rows)
    }

    /// Region's trending-searches RSS feed; every title scored flat.
    async fn fetch_hot(&self) -> Result<Vec<(String, f64)>, BoxError> {
        let base = std::env::var("TRENDS_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_TRENDS_BASE_URL.to_string());
        let url = format!("{}/trending/rss?geo={}", base.trim_end_matches('/'), self.geo);

        let content = self.client.get(&url).send().await?.bytes().await?;
        let channel = Channel::read_from(&content[..])?;

        let rows: Vec<(String, f64)> = channel
            .items()
            .iter()
            .filter_map(|item| item.title())
            .map(|title| (title.to_string(), HOT_SCORE))
            .collect();

        debug!(count = rows.len(), "Fetched hot trending rows");
        Ok(rows)
    }

    /// Expand each seed via the suggest endpoint and rank the harvest by how
    /// many seeds surfaced each term, normalized to 0-100. One failed seed
    /// is skipped, not fatal.
    async fn fetch_seeded(&self) -> Vec<(String, f64)> {
        let base = std::env::var("SUGGEST_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_SUGGEST_BASE_URL.to_string());

        let mut bag: Vec<String> = Vec::new();
        for (i, seed) in self.seeds.iter().enumerate() {
            if i > 0 {
                let jitter = rand::thread_rng().gen_range(0..SEED_PACING_JITTER_MS);
                tokio::time::sleep(Duration::from_millis(SEED_PACING_MS + jitter)).await;
            }

            match self.related_queries(&base, seed).await {
                Ok(mut related) => {
                    debug!(seed = %seed, count = related.len(), "Seed expanded");
                    bag.append(&mut related);
                }
                Err(e) => warn!(seed = %seed, error = %e, "Failed to expand seed"),
            }
        }

        score_by_frequency(&bag)
    }

    async fn related_queries(&self, base: &str, seed: &str) -> Result<Vec<String>, BoxError> {
        let url = Url::parse_with_params(
            &format!("{}/complete/search", base.trim_end_matches('/')),
            &[("client", "firefox"), ("hl", self.hl.as_str()), ("q", seed)],
        )?;

        let body: serde_json::Value = self.client.get(url).send().await?.json().await?;
        let suggestions = body
            .get(1)
            .and_then(|v| v.as_array())
            .ok_or("unexpected suggest response shape")?;

        Ok(suggestions
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.to_string())
            .collect())
    }
}

/// Frequency-ranked distinct terms, scores linearly normalized so the most
/// frequent term lands at 100.
fn score_by_frequency(terms: &[String]) -> Vec<(String, f64)> {
    if terms.is_empty() {
        return Vec::new();
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for term in terms {
        *counts.entry(term.as_str()).or_insert(0) += 1;
    }
    let max = counts.values().copied().max().unwrap_or(1) as f64;

    dedup_rank(terms)
        .into_iter()
        .map(|term| {
            let score = counts[term.as_str()] as f64 / max * 100.0;
            (term, (score * 100.0).round() / 100.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(mode: TrendMode, seeds: &[&str]) -> AgentConfig {
        AgentConfig {
            trend_mode: mode,
            seeds: seeds.iter().map(|s| s.to_string()).collect(),
            ..AgentConfig::default()
        }
    }

    fn rss_feed(titles: &[&str]) -> String {
        let items: String = titles
            .iter()
            .map(|t| format!("<item><title>{}</title></item>", t))
            .collect();
        format!(
            "<?xml version=\"1.0\"?><rss version=\"2.0\"><channel><title>Trends</title>{}</channel></rss>",
            items
        )
    }

    #[test]
    fn test_score_by_frequency_normalizes_to_100() {
        let terms: Vec<String> = ["a", "b", "a", "c", "a", "b"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let rows = score_by_frequency(&terms);
        assert_eq!(rows[0], ("a".to_string(), 100.0));
        assert_eq!(rows[1], ("b".to_string(), 66.67));
        assert_eq!(rows[2], ("c".to_string(), 33.33));
    }

    #[tokio::test]
    #[serial]
    async fn test_hot_mode_parses_trending_feed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/trending/rss"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(rss_feed(&["夜泣き 対策", "離乳食 鉄分"])),
            )
            .mount(&server)
            .await;
        std::env::set_var("TRENDS_BASE_URL", server.uri());

        let client = TrendsClient::new(&test_config(TrendMode::Hot, &[])).unwrap();
        let rows = client.fetch().await.unwrap();
        std::env::remove_var("TRENDS_BASE_URL");

        assert_eq!(
            rows,
            vec![
                ("夜泣き 対策".to_string(), HOT_SCORE),
                ("離乳食 鉄分".to_string(), HOT_SCORE),
            ]
        );
    }

    #[tokio::test]
    #[serial]
    async fn test_seeded_mode_ranks_across_seeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/complete/search"))
            .and(query_param("q", "離乳食"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                "離乳食",
                ["離乳食 鉄分", "離乳食 進め方"]
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/complete/search"))
            .and(query_param("q", "夜泣き"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                "夜泣き",
                ["離乳食 鉄分"]
            ])))
            .mount(&server)
            .await;
        // Hot feed down; seeded rows must carry the run on their own.
        Mock::given(method("GET"))
            .and(path("/trending/rss"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        std::env::set_var("SUGGEST_BASE_URL", server.uri());
        std::env::set_var("TRENDS_BASE_URL", server.uri());

        let client = TrendsClient::new(&test_config(TrendMode::Seeded, &["離乳食", "夜泣き"])).unwrap();
        let rows = client.fetch().await.unwrap();
        std::env::remove_var("SUGGEST_BASE_URL");
        std::env::remove_var("TRENDS_BASE_URL");

        assert_eq!(rows[0], ("離乳食 鉄分".to_string(), 100.0));
        assert_eq!(rows[1], ("離乳食 進め方".to_string(), 50.0));
    }

    #[tokio::test]
    #[serial]
    async fn test_empty_harvest_is_an_acquisition_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        std::env::set_var("SUGGEST_BASE_URL", server.uri());
        std::env::set_var("TRENDS_BASE_URL", server.uri());

        let client = TrendsClient::new(&test_config(TrendMode::Seeded, &["離乳食"])).unwrap();
        let result = client.fetch().await;
        std::env::remove_var("SUGGEST_BASE_URL");
        std::env::remove_var("TRENDS_BASE_URL");

        assert!(result.is_err());
    }
}
