//! Hybrid ranking: semantic candidates from the [`VectorIndex`] merged with
//! keyword rule scores.

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::config::RankingConfig;
use crate::index::{SemanticHit, VectorIndex};
use crate::profile::{Profile, Recommendation};
use crate::rules::{keywords_for, RuleScorer};

/// Reason attached to rows that qualified on semantic similarity alone.
pub const SEMANTIC_MATCH: &str = "Semantic Match";

pub struct HybridRanker {
    catalog: Arc<Catalog>,
    index: Arc<VectorIndex>,
    scorer: RuleScorer,
    config: RankingConfig,
}

/// Natural-language query sent to the vector index.
pub fn build_query(profile: &Profile, ai_keywords: &[String]) -> String {
    let mut query = format!(
        "{} career for {} {} person.",
        profile.life_goal, profile.mbti_code, profile.riasec_code
    );
    if let Some(domain) = profile.domain() {
        query.push_str(&format!(" specializing in {domain}."));
    }
    if !ai_keywords.is_empty() {
        query.push_str(&format!(" Interested in {}.", ai_keywords.join(", ")));
    }
    query
}

impl HybridRanker {
    pub fn new(catalog: Arc<Catalog>, index: Arc<VectorIndex>, config: RankingConfig) -> Self {
        Self {
            scorer: RuleScorer::from_config(&config),
            catalog,
            index,
            config,
        }
    }

    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    /// Rank the catalog for `profile`. Never fails: an unready index or a
    /// failed query embedding yields a rule-only ranking.
    pub async fn recommend(&self, profile: &Profile, ai_keywords: &[String]) -> Vec<Recommendation> {
        let query = build_query(profile, ai_keywords);
        tracing::debug!(%query, "semantic query");
        let hits = self.index.search(&query, self.config.semantic_top_k).await;
        self.rank(profile, ai_keywords, &hits)
    }

    /// Merge `hits` with rule scores. With no hits, every catalog row is a
    /// candidate with a semantic score of 0.
    pub fn rank(
        &self,
        profile: &Profile,
        ai_keywords: &[String],
        hits: &[SemanticHit],
    ) -> Vec<Recommendation> {
        let keywords = keywords_for(profile, ai_keywords);

        let candidates: Vec<(usize, f64)> = if hits.is_empty() {
            tracing::debug!(rows = self.catalog.len(), "no semantic candidates, rule-only scan");
            (0..self.catalog.len()).map(|row| (row, 0.0)).collect()
        } else {
            hits.iter()
                .filter(|h| h.row < self.catalog.len())
                .map(|h| (h.row, f64::from(h.score)))
                .collect()
        };

        let mut scored: Vec<(usize, f64, Vec<String>)> = candidates
            .into_iter()
            .filter_map(|(row, semantic)| {
                let rule = self.scorer.score(self.catalog.search_text(row), &keywords);
                let hybrid = semantic * self.config.semantic_weight + rule.score;
                (hybrid >= self.config.min_score).then_some((row, hybrid, rule.reasons))
            })
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(self.config.max_results);

        scored
            .into_iter()
            .filter_map(|(row, score, mut reasons)| {
                let occupation = self.catalog.get(row)?;
                if reasons.is_empty() {
                    reasons.push(SEMANTIC_MATCH.to_string());
                } else {
                    reasons.truncate(self.config.max_reasons);
                }
                Some(Recommendation {
                    code: occupation.code.clone(),
                    title: occupation.title.clone(),
                    description: occupation.description.clone(),
                    score,
                    reasoning: reasons,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Occupation;
    use crate::db::MemoryBlobStore;
    use crate::index::IndexSettings;
    use crate::profile::{EducationLevel, LifeGoal};
    use std::time::Duration;

    fn profile() -> Profile {
        Profile {
            life_goal: LifeGoal::Money,
            mbti_code: "ENTJ".into(),
            riasec_code: "E".into(),
            cognitive_scores: None,
            education_level: EducationLevel::Secondary,
            domain_interest: None,
        }
    }

    fn ranker(rows: Vec<Occupation>) -> HybridRanker {
        let catalog = Arc::new(Catalog::from_rows(rows));
        let index = VectorIndex::unavailable(
            Arc::clone(&catalog),
            Arc::new(MemoryBlobStore::new()),
            IndexSettings {
                dimensions: 4,
                cache_key: "test".into(),
                embed_timeout: Duration::from_secs(1),
            },
        );
        HybridRanker::new(catalog, index, RankingConfig::default())
    }

    fn quiet_rows(n: usize) -> Vec<Occupation> {
        (0..n)
            .map(|i| Occupation::new(format!("00-{i:04}.00"), "Gardener", "Tends plants quietly"))
            .collect()
    }

    #[test]
    fn query_includes_domain_and_keywords() {
        let mut p = profile();
        assert_eq!(build_query(&p, &[]), "Money career for ENTJ E person.");

        p.domain_interest = Some("  finance ".into());
        let q = build_query(&p, &["Analyst".into(), "Trader".into()]);
        assert_eq!(
            q,
            "Money career for ENTJ E person. specializing in finance. Interested in Analyst, Trader."
        );
    }

    #[test]
    fn semantic_threshold_boundary() {
        let r = ranker(quiet_rows(2));
        let hits = [
            SemanticHit { row: 0, score: 0.2 },
            SemanticHit { row: 1, score: 0.3 },
        ];
        let recs = r.rank(&profile(), &[], &hits);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].code, "00-0001.00");
        assert!((recs[0].score - 3.0).abs() < 1e-5);
        assert_eq!(recs[0].reasoning, vec![SEMANTIC_MATCH.to_string()]);
    }

    #[test]
    fn rule_only_scores_equal_rule_scores() {
        let rows = vec![
            Occupation::new("11-1011.00", "Chief Executives", "Manage finance and business strategy"),
            Occupation::new("00-0001.00", "Gardener", "Tends plants"),
            Occupation::new("13-2051.00", "Financial Analysts", "Finance investment banking"),
        ];
        let r = ranker(rows);
        let p = profile();
        let keywords = keywords_for(&p, &[]);
        let recs = r.rank(&p, &[], &[]);

        assert!(!recs.is_empty());
        for rec in &recs {
            let row = r.catalog.rows().iter().position(|o| o.code == rec.code).unwrap();
            let expected = RuleScorer::default().score(r.catalog.search_text(row), &keywords);
            assert_eq!(rec.score, expected.score);
        }
        assert!(recs.iter().all(|rec| rec.code != "00-0001.00"));
    }

    #[test]
    fn results_are_capped_and_sorted() {
        let rows: Vec<Occupation> = (0..40)
            .map(|i| {
                let desc = if i % 2 == 0 {
                    "chief executive manage finance business bank"
                } else {
                    "chief executive manage finance business"
                };
                Occupation::new(format!("11-{i:04}.00"), "Manager", desc)
            })
            .collect();
        let r = ranker(rows);
        let recs = r.rank(&profile(), &[], &[]);
        assert_eq!(recs.len(), 20);
        assert!(recs.windows(2).all(|w| w[0].score >= w[1].score));
        // Equal scores keep catalog order.
        assert_eq!(recs[0].code, "11-0000.00");
        assert_eq!(recs[1].code, "11-0002.00");
    }

    #[test]
    fn reasons_capped_at_three() {
        let rows = vec![Occupation::new(
            "11-1011.00",
            "Chief Executives",
            "Manage finance; sales strategy; analyze data",
        )];
        let r = ranker(rows);
        let mut p = profile();
        p.cognitive_scores = Some(crate::profile::CognitiveScores {
            reaction_time_ms: 300,
            number_memory: 13,
            verbal_memory: 45,
        });
        let recs = r.rank(&p, &[], &[]);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].reasoning.len(), 3);
    }

    #[test]
    fn hits_outside_catalog_are_ignored() {
        let r = ranker(quiet_rows(1));
        let hits = [SemanticHit { row: 7, score: 0.9 }];
        assert!(r.rank(&profile(), &[], &hits).is_empty());
    }

    #[tokio::test]
    async fn unready_index_falls_back_to_catalog_scan() {
        let r = ranker(vec![Occupation::new(
            "11-1011.00",
            "Chief Executives",
            "Plan business strategy and manage finance",
        )]);
        let recs = r.recommend(&profile(), &[]).await;
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].code, "11-1011.00");
    }
}
