//! Domain expansion: turn a field of study into related job titles using the
//! completion provider. The titles become the request's domain keywords.

use std::sync::Arc;
use std::time::Duration;

use crate::embedding::CompletionProvider;

pub fn expansion_prompt(domain_interest: &str) -> String {
    format!(
        "List 5 distinct, professional job titles for a student specializing in '{domain_interest}'.\n\
         Return ONLY a comma-separated list of titles. No numbering or extra text."
    )
}

/// Split a comma-separated reply into trimmed, non-empty titles.
pub fn parse_titles(reply: &str) -> Vec<String> {
    reply
        .replace(['\r', '\n'], "")
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Ask `completion` for job titles related to `domain_interest`, waiting at
/// most `timeout` for the reply.
///
/// Failures and timeouts are logged and produce an empty list; the caller
/// then falls back to tokenizing the domain itself.
pub async fn expand_domain(
    completion: Arc<dyn CompletionProvider>,
    domain_interest: &str,
    timeout: Duration,
) -> Vec<String> {
    let domain = domain_interest.trim();
    if domain.is_empty() {
        return Vec::new();
    }

    let prompt = expansion_prompt(domain);
    let call = tokio::task::spawn_blocking(move || completion.complete(&prompt));
    let reply = match tokio::time::timeout(timeout, call).await {
        Ok(Ok(Ok(reply))) => reply,
        Ok(Ok(Err(e))) => {
            tracing::warn!(domain, error = %format!("{e:#}"), "domain expansion failed");
            return Vec::new();
        }
        Ok(Err(e)) => {
            tracing::warn!(domain, error = %e, "domain expansion task failed");
            return Vec::new();
        }
        Err(_) => {
            tracing::warn!(domain, timeout_ms = timeout.as_millis() as u64, "domain expansion timed out");
            return Vec::new();
        }
    };

    let titles = parse_titles(&reply);
    tracing::info!(domain, titles = ?titles, "expanded domain");
    titles
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned(&'static str);

    impl CompletionProvider for Canned {
        fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Stalled(Duration);

    impl CompletionProvider for Stalled {
        fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
            std::thread::sleep(self.0);
            Ok("Auditor".into())
        }
    }

    struct Broken;

    impl CompletionProvider for Broken {
        fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
            anyhow::bail!("quota exceeded")
        }
    }

    #[test]
    fn parse_strips_newlines_and_blanks() {
        let titles = parse_titles("Data Scientist, ML Engineer,\nData Analyst, , Statistician\n");
        assert_eq!(
            titles,
            vec!["Data Scientist", "ML Engineer", "Data Analyst", "Statistician"]
        );
    }

    #[test]
    fn prompt_names_the_domain() {
        assert!(expansion_prompt("marine biology").contains("'marine biology'"));
    }

    #[tokio::test]
    async fn expands_with_provider() {
        let titles = expand_domain(
            Arc::new(Canned("Auditor, Actuary")),
            "finance",
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(titles, vec!["Auditor", "Actuary"]);
    }

    #[tokio::test]
    async fn failure_yields_empty() {
        let timeout = Duration::from_secs(5);
        assert!(expand_domain(Arc::new(Broken), "finance", timeout).await.is_empty());
        assert!(expand_domain(Arc::new(Canned("x")), "   ", timeout).await.is_empty());
    }

    #[tokio::test]
    async fn slow_reply_times_out_empty() {
        let started = std::time::Instant::now();
        let titles = expand_domain(
            Arc::new(Stalled(Duration::from_millis(1500))),
            "finance",
            Duration::from_millis(100),
        )
        .await;
        assert!(titles.is_empty());
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
