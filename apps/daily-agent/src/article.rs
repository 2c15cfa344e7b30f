use crate::config::AgentConfig;
use llm_client::{call_llm_with_retry, LlmProvider};
use tracing::{info, warn};

/// Produce the article body for the selected topic.
///
/// Uses the LLM when an API key is configured; otherwise, or when the LLM
/// fails after retries, substitutes the local dummy body so the run still
/// has something to record and notify.
pub async fn generate_article(
    client: &reqwest::Client,
    cfg: &AgentConfig,
    topic: &str,
) -> String {
    let Some(api_key) = cfg.openai_api_key.as_deref() else {
        info!("OPENAI_API_KEY not set, using dummy article");
        return dummy_article(topic);
    };

    let prompt = build_prompt(topic);
    match call_llm_with_retry(client, LlmProvider::OpenAI, api_key, prompt).await {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            warn!(error = %e, "Article generation failed, using dummy article");
            dummy_article(topic)
        }
    }
}

fn build_prompt(topic: &str) -> String {
    format!(
        "あなたは育児ジャンルの凄腕ライターです。要点を整理して論理的に書きます。\n\n\
         # テーマ\n{}\n\n\
         # 要求\n\
         - 導入→課題→解決策→まとめ（1200字前後）\n\
         - 根拠や数値を可能な範囲で明示\n",
        topic
    )
}

/// Placeholder body used before the model is wired up or when it fails.
pub fn dummy_article(topic: &str) -> String {
    format!(
        "【ダミー記事】\nテーマ: {}\n\n\
         本文生成の本番化前テスト中。OPENAI_API_KEY を設定すると本番生成に切り替わります。",
        topic
    )
}
