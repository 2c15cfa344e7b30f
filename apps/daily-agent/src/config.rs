use llm_client::BoxError;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

/// Trend acquisition strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendMode {
    /// Expand domain seed terms via related-query suggestions.
    Seeded,
    /// Read the general trending-searches feed, no domain filtering.
    Hot,
}

impl FromStr for TrendMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "seeded" => Ok(TrendMode::Seeded),
            "hot" => Ok(TrendMode::Hot),
            other => Err(format!("expected 'seeded' or 'hot', got '{}'", other)),
        }
    }
}

/// Default seed terms for the childcare domain (comma-separated override via AGENT_SEEDS).
const DEFAULT_SEEDS: &str =
    "育児, 子育て, 赤ちゃん, 1歳, 2歳, 保育園, 夜泣き, 離乳食, イヤイヤ期, トイレトレーニング, 予防接種, 断乳";

/// Everything the pipeline needs, resolved once at startup and passed down.
/// All keys have defaults so a zero-configuration run works end to end
/// (dummy article text, console-only notification).
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Days within which a previously used topic is excluded from reselection.
    pub freshness_days: i64,
    /// Cap on merged candidates handed to the selector.
    pub max_candidates: usize,
    /// Candidates kept after ranking, before weighted sampling.
    pub top_k: usize,
    /// Sample pool size drawn without replacement.
    pub sample_size: usize,
    /// Minimum topic length in characters.
    pub min_topic_len: usize,
    /// Chance of picking uniformly among the top 3 instead of the best sample.
    pub override_probability: f64,
    pub history_path: PathBuf,
    pub article_dir: PathBuf,
    pub log_dir: PathBuf,
    pub trend_mode: TrendMode,
    pub seeds: Vec<String>,
    pub geo: String,
    pub hl: String,
    pub openai_api_key: Option<String>,
    pub slack_webhook_url: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            freshness_days: 10,
            max_candidates: 12,
            top_k: 10,
            sample_size: 5,
            min_topic_len: 2,
            override_probability: 0.25,
            history_path: PathBuf::from("data/trend_history.json"),
            article_dir: PathBuf::from("outputs"),
            log_dir: PathBuf::from("logs"),
            trend_mode: TrendMode::Seeded,
            seeds: split_seeds(DEFAULT_SEEDS),
            geo: "JP".to_string(),
            hl: "ja".to_string(),
            openai_api_key: None,
            slack_webhook_url: None,
        }
    }
}

impl AgentConfig {
    /// Build the configuration from environment variables.
    ///
    /// Unparseable overrides are setup errors, not runtime degradations:
    /// they fail the run before any side effect.
    pub fn from_env() -> Result<Self, BoxError> {
        let defaults = Self::default();

        Ok(Self {
            freshness_days: parse_env("AGENT_FRESHNESS_DAYS", defaults.freshness_days)?,
            max_candidates: parse_env("AGENT_MAX_CANDIDATES", defaults.max_candidates)?,
            top_k: parse_env("AGENT_TOP_K", defaults.top_k)?,
            sample_size: parse_env("AGENT_SAMPLE_SIZE", defaults.sample_size)?,
            min_topic_len: parse_env("AGENT_TOPIC_MIN_LEN", defaults.min_topic_len)?,
            override_probability: parse_env(
                "AGENT_OVERRIDE_PROBABILITY",
                defaults.override_probability,
            )?,
            history_path: env_string("AGENT_HISTORY_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.history_path),
            article_dir: env_string("AGENT_ARTICLE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.article_dir),
            log_dir: env_string("AGENT_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
            trend_mode: parse_env("AGENT_TREND_MODE", defaults.trend_mode)?,
            seeds: env_string("AGENT_SEEDS")
                .map(|s| split_seeds(&s))
                .unwrap_or(defaults.seeds),
            geo: env_string("AGENT_GEO").unwrap_or(defaults.geo),
            hl: env_string("AGENT_HL").unwrap_or(defaults.hl),
            openai_api_key: env_string("OPENAI_API_KEY"),
            slack_webhook_url: env_string("SLACK_WEBHOOK_URL"),
        })
    }
}

/// Non-empty trimmed value of an environment variable, if set.
fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T, BoxError>
where
    T: FromStr,
    T::Err: Display,
{
    match env_string(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| format!("invalid {}='{}': {}", key, raw, e).into()),
        None => Ok(default),
    }
}

fn split_seeds(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
