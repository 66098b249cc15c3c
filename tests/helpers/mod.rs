#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use career_nexus::catalog::{Catalog, Occupation};
use career_nexus::db::BlobStore;
use career_nexus::embedding::EmbeddingProvider;
use career_nexus::index::IndexSettings;
use career_nexus::profile::{EducationLevel, LifeGoal, Profile};

/// Vocabulary for [`VocabProvider`]. One dimension per term.
pub const VOCAB: &[&str] = &["finance", "manage", "nurse", "pilot", "data", "career", "money"];

/// Deterministic bag-of-words embedder: component `i` is the number of times
/// `VOCAB[i]` occurs in the lowercased text.
#[derive(Default)]
pub struct VocabProvider {
    pub calls: AtomicUsize,
}

impl VocabProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EmbeddingProvider for VocabProvider {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = text.to_lowercase();
        Ok(VOCAB
            .iter()
            .map(|term| text.matches(term).count() as f32)
            .collect())
    }

    fn dimensions(&self) -> usize {
        VOCAB.len()
    }

    fn name(&self) -> &str {
        "vocab"
    }
}

/// Always fails.
pub struct FailingProvider;

impl EmbeddingProvider for FailingProvider {
    fn embed(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
        anyhow::bail!("provider offline")
    }

    fn dimensions(&self) -> usize {
        VOCAB.len()
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Fails for texts containing `marker`, otherwise behaves like [`VocabProvider`].
pub struct FlakyProvider {
    pub marker: &'static str,
    inner: VocabProvider,
}

impl FlakyProvider {
    pub fn new(marker: &'static str) -> Self {
        Self {
            marker,
            inner: VocabProvider::new(),
        }
    }
}

impl EmbeddingProvider for FlakyProvider {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        if text.contains(self.marker) {
            anyhow::bail!("rate limited");
        }
        self.inner.embed(text)
    }

    fn dimensions(&self) -> usize {
        VOCAB.len()
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

/// Sleeps before embedding texts containing `marker`.
pub struct SlowProvider {
    pub marker: &'static str,
    pub delay: Duration,
    inner: VocabProvider,
}

impl SlowProvider {
    pub fn new(marker: &'static str, delay: Duration) -> Self {
        Self {
            marker,
            delay,
            inner: VocabProvider::new(),
        }
    }
}

impl EmbeddingProvider for SlowProvider {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        if text.contains(self.marker) {
            std::thread::sleep(self.delay);
        }
        self.inner.embed(text)
    }

    fn dimensions(&self) -> usize {
        VOCAB.len()
    }

    fn name(&self) -> &str {
        "slow"
    }
}

/// Returns vectors one element short of the vocabulary width.
pub struct NarrowProvider;

impl EmbeddingProvider for NarrowProvider {
    fn embed(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
        Ok(vec![1.0; VOCAB.len() - 1])
    }

    fn dimensions(&self) -> usize {
        VOCAB.len() - 1
    }

    fn name(&self) -> &str {
        "narrow"
    }
}

/// Full-width vectors for catalog rows, one element short for texts
/// containing `marker`.
pub struct NarrowQueryProvider {
    pub marker: &'static str,
    inner: VocabProvider,
}

impl NarrowQueryProvider {
    pub fn new(marker: &'static str) -> Self {
        Self {
            marker,
            inner: VocabProvider::new(),
        }
    }
}

impl EmbeddingProvider for NarrowQueryProvider {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut v = self.inner.embed(text)?;
        if text.contains(self.marker) {
            v.pop();
        }
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        VOCAB.len()
    }

    fn name(&self) -> &str {
        "narrow-query"
    }
}

/// A blob store whose writes always fail.
pub struct ReadOnlyStore;

impl BlobStore for ReadOnlyStore {
    fn load(&self, _key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(None)
    }

    fn save(&self, _key: &str, _bytes: &[u8]) -> anyhow::Result<()> {
        anyhow::bail!("disk full")
    }
}

/// Small catalog with one clear match per vocabulary theme.
pub fn test_catalog() -> Arc<Catalog> {
    Arc::new(Catalog::from_rows(vec![
        Occupation::new(
            "11-1011.00",
            "Chief Executives",
            "Determine policies and manage finance and operations of a company.",
        ),
        Occupation::new(
            "29-1141.00",
            "Registered Nurses",
            "Nurse patients and coordinate care.",
        ),
        Occupation::new(
            "53-2011.00",
            "Airline Pilots",
            "Pilot and navigate aircraft.",
        ),
        Occupation::new(
            "15-2051.00",
            "Data Scientists",
            "Develop and implement data analytics methods.",
        ),
        Occupation::new(
            "37-3011.00",
            "Landscaping Workers",
            "Tend lawns and plant gardens.",
        ),
    ]))
}

pub fn settings() -> IndexSettings {
    IndexSettings {
        dimensions: VOCAB.len(),
        cache_key: "occupation-embeddings:test".into(),
        embed_timeout: Duration::from_secs(5),
    }
}

/// Money / ENTJ / E undergraduate interested in finance.
pub fn finance_profile() -> Profile {
    Profile {
        life_goal: LifeGoal::Money,
        mbti_code: "ENTJ".into(),
        riasec_code: "E".into(),
        cognitive_scores: None,
        education_level: EducationLevel::Undergrad,
        domain_interest: Some("finance".into()),
    }
}

pub fn profile(goal: LifeGoal, mbti: &str, riasec: &str) -> Profile {
    Profile {
        life_goal: goal,
        mbti_code: mbti.into(),
        riasec_code: riasec.into(),
        cognitive_scores: None,
        education_level: EducationLevel::Secondary,
        domain_interest: None,
    }
}
