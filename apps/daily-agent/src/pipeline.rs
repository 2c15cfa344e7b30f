use crate::article::generate_article;
use crate::backup::backup_candidates;
use crate::config::AgentConfig;
use crate::history::HistoryStore;
use crate::normalize::{default_stopwords, is_valid, merge_candidates, normalize, Candidate};
use crate::notify::notify;
use crate::select::{select, Tuning};
use crate::storage::{append_run_log, save_markdown};
use crate::trends::TrendsClient;
use chrono::Local;
use llm_client::BoxError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

const HTTP_TIMEOUT_SECS: u64 = 60;

/// Where the candidate list came from. Acquisition failure is a state the
/// run passes through, not an exception it swallows.
enum Acquisition {
    Live(Vec<Candidate>),
    Backup(Vec<Candidate>),
}

/// What one invocation produced; also the JSONL run-log record.
#[derive(Serialize, Debug)]
pub struct RunOutcome {
    pub timestamp: String,
    pub topic: String,
    pub score: f64,
    pub source: &'static str,
    pub candidates: Vec<String>,
    pub article_path: Option<PathBuf>,
    pub notified: bool,
}

/// One linear pass: acquire, normalize, select, record, generate, save,
/// notify, log. Upstream failures degrade to fallbacks; only configuration
/// and history-write errors fail the run.
pub async fn run_once(cfg: &AgentConfig) -> Result<RunOutcome, BoxError> {
    let history = HistoryStore::new(&cfg.history_path);
    let recently_used = history.recently_used(cfg.freshness_days);
    let mut rng = StdRng::from_entropy();

    // 1. Acquire raw rows, falling back to the static vocabulary.
    let acquisition = match TrendsClient::new(cfg)?.fetch().await {
        Ok(rows) => {
            info!(rows = rows.len(), "Fetched raw trend rows");
            let candidates = refine(rows, cfg);
            if candidates.is_empty() {
                warn!("All trend rows failed validation, using backup vocabulary");
                Acquisition::Backup(backup_candidates(&recently_used, &mut rng))
            } else {
                Acquisition::Live(candidates)
            }
        }
        Err(e) => {
            warn!(error = %e, "Trend acquisition failed, using backup vocabulary");
            Acquisition::Backup(backup_candidates(&recently_used, &mut rng))
        }
    };
    let (candidates, source) = match &acquisition {
        Acquisition::Live(c) => (c, "live"),
        Acquisition::Backup(c) => (c, "backup"),
    };

    // 2. Select today's topic.
    let tuning = Tuning {
        top_k: cfg.top_k,
        sample_size: cfg.sample_size,
        override_probability: cfg.override_probability,
        ..Tuning::default()
    };
    let selection = select(candidates, &recently_used, &tuning, &mut rng);
    info!(topic = %selection.topic, score = selection.score, source, "Selected topic");

    // 3. Record the pick before any external side effect. This is the run's
    // one durable write; a failure here must not pass silently.
    history.append(&selection.topic, selection.score)?;

    // 4. Generate and deliver, best effort.
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()?;

    let article = generate_article(&http_client, cfg, &selection.topic).await;

    let timestamp = Local::now().format("%Y-%m-%d %H:%M").to_string();
    let considered: Vec<String> = candidates.iter().map(|c| c.term.clone()).collect();
    let head = format!(
        "📰 記事生成エージェント {}\n候補: {}",
        timestamp,
        considered.join(", ")
    );
    let message = format!("{}\n\n# {}\n\n{}", head, selection.topic, article);

    let article_path = match save_markdown(&selection.topic, &article, &cfg.article_dir) {
        Ok(path) => {
            info!(path = %path.display(), "Article saved");
            Some(path)
        }
        Err(e) => {
            warn!(error = %e, "Failed to save article");
            None
        }
    };

    let notified = match notify(&http_client, cfg.slack_webhook_url.as_deref(), &message).await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Notification failed");
            false
        }
    };

    let outcome = RunOutcome {
        timestamp,
        topic: selection.topic,
        score: selection.score,
        source,
        candidates: considered,
        article_path,
        notified,
    };

    if let Err(e) = append_run_log(&outcome, &cfg.log_dir) {
        warn!(error = %e, "Failed to append run log");
    }

    Ok(outcome)
}

/// Normalize, validate, and merge raw rows into ranked candidates.
fn refine(rows: Vec<(String, f64)>, cfg: &AgentConfig) -> Vec<Candidate> {
    let stopwords = default_stopwords();
    let cleaned: Vec<(String, f64)> = rows
        .into_iter()
        .map(|(term, score)| (normalize(&term), score))
        .filter(|(term, _)| is_valid(term, cfg.min_topic_len, &stopwords))
        .collect();
    merge_candidates(&cleaned, cfg.max_candidates)
}
