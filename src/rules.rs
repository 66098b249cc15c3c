//! Rule-based keyword scoring.
//!
//! [`keywords_for`] turns a [`Profile`] into a [`KeywordSet`] through ordered
//! passes (domain, personality, aptitude, life goal, cognitive). A keyword keeps
//! the source of the first pass that inserted it. [`RuleScorer::score`] then
//! scores lowercased occupation text by substring containment.

use std::collections::{HashMap, HashSet};

use crate::config::RankingConfig;
use crate::profile::{CognitiveScores, EducationLevel, Profile};
use crate::taxonomy;

/// Where a keyword came from. Also the label used in reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordSource {
    MajorDegree,
    Personality,
    Aptitude,
    LifeGoal,
    Cognitive,
}

impl KeywordSource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::MajorDegree => "Major/Degree",
            Self::Personality => "Personality",
            Self::Aptitude => "Aptitude",
            Self::LifeGoal => "Life Goal",
            Self::Cognitive => "Cognitive",
        }
    }
}

impl std::fmt::Display for KeywordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Insertion-ordered keyword → source mapping. First writer wins.
#[derive(Debug, Clone, Default)]
pub struct KeywordSet {
    entries: Vec<(String, KeywordSource)>,
    index: HashMap<String, usize>,
}

impl KeywordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `keyword` unless already present. Returns whether it was inserted.
    pub fn insert(&mut self, keyword: &str, source: KeywordSource) -> bool {
        let keyword = keyword.trim().to_lowercase();
        if keyword.is_empty() || self.index.contains_key(&keyword) {
            return false;
        }
        self.index.insert(keyword.clone(), self.entries.len());
        self.entries.push((keyword, source));
        true
    }

    pub fn source_of(&self, keyword: &str) -> Option<KeywordSource> {
        self.index.get(keyword).map(|&i| self.entries[i].1)
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.index.contains_key(keyword)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, KeywordSource)> {
        self.entries.iter().map(|(k, s)| (k.as_str(), *s))
    }

    /// Domain (`Major/Degree`) keywords in insertion order.
    pub fn domain_keywords(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(|(_, s)| *s == KeywordSource::MajorDegree)
            .map(|(k, _)| k)
    }

    pub fn from_source(&self, source: KeywordSource) -> Vec<&str> {
        self.iter()
            .filter(|(_, s)| *s == source)
            .map(|(k, _)| k)
            .collect()
    }
}

/// Build the keyword set for a request.
///
/// `ai_keywords` are domain keywords already expanded by the completion
/// provider; when empty, undergraduates fall back to tokenizing their domain
/// interest.
pub fn keywords_for(profile: &Profile, ai_keywords: &[String]) -> KeywordSet {
    let mut set = KeywordSet::new();

    for kw in domain_keywords(profile, ai_keywords) {
        set.insert(&kw, KeywordSource::MajorDegree);
    }

    let mbti = profile.mbti_code.trim().to_uppercase();
    for kw in taxonomy::personality(&mbti) {
        set.insert(kw, KeywordSource::Personality);
    }

    let riasec = profile.riasec_code.trim().to_uppercase();
    for kw in taxonomy::aptitude(&riasec) {
        set.insert(kw, KeywordSource::Aptitude);
    }

    for kw in taxonomy::life_goal(profile.life_goal) {
        set.insert(kw, KeywordSource::LifeGoal);
    }

    if let Some(scores) = &profile.cognitive_scores {
        for kw in cognitive_keywords(scores) {
            set.insert(kw, KeywordSource::Cognitive);
        }
    }

    set
}

fn domain_keywords(profile: &Profile, ai_keywords: &[String]) -> Vec<String> {
    let expanded: Vec<String> = ai_keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    if !expanded.is_empty() {
        return expanded;
    }

    match (profile.education_level, profile.domain()) {
        (EducationLevel::Undergrad, Some(domain)) => domain
            .split_whitespace()
            .filter(|t| t.chars().count() > 3)
            .map(str::to_lowercase)
            .collect(),
        _ => Vec::new(),
    }
}

/// Keyword bands from the cognitive test results.
pub fn cognitive_keywords(scores: &CognitiveScores) -> Vec<&'static str> {
    let mut keywords = Vec::new();

    if scores.reaction_time_ms < 210 {
        keywords.extend_from_slice(taxonomy::FAST_REFLEX);
    } else if scores.reaction_time_ms > 280 {
        keywords.extend_from_slice(taxonomy::DELIBERATIVE);
    }

    if scores.number_memory >= 12 {
        keywords.extend_from_slice(taxonomy::HIGH_QUANT);
    } else if scores.number_memory >= 8 {
        keywords.extend_from_slice(taxonomy::MID_QUANT);
    }

    if scores.verbal_memory > 60 {
        keywords.extend_from_slice(taxonomy::VERBAL_HEAVY);
    } else if scores.verbal_memory < 30 {
        keywords.extend_from_slice(taxonomy::LOW_VERBAL);
    }

    keywords
}

/// Rule score for one occupation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleScore {
    pub score: f64,
    /// `"<Category> (<keyword>)"`, at most one per category.
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct RuleScorer {
    domain_bonus: f64,
    keyword_weight: f64,
}

impl Default for RuleScorer {
    fn default() -> Self {
        Self::from_config(&RankingConfig::default())
    }
}

impl RuleScorer {
    pub fn from_config(config: &RankingConfig) -> Self {
        Self {
            domain_bonus: config.domain_bonus,
            keyword_weight: config.keyword_weight,
        }
    }

    /// Score lowercased `text` against `keywords`.
    ///
    /// The domain bonus is awarded once, for the first domain keyword found.
    /// Every other contained keyword adds `keyword_weight`.
    pub fn score(&self, text: &str, keywords: &KeywordSet) -> RuleScore {
        let text = text.to_lowercase();
        let mut result = RuleScore::default();

        if let Some(hit) = keywords.domain_keywords().find(|dk| text.contains(*dk)) {
            result.score += self.domain_bonus;
            result
                .reasons
                .push(format!("{} ({hit})", KeywordSource::MajorDegree));
        }

        let mut seen: HashSet<KeywordSource> = HashSet::new();
        for (kw, source) in keywords.iter() {
            if source == KeywordSource::MajorDegree || !text.contains(kw) {
                continue;
            }
            result.score += self.keyword_weight;
            if seen.insert(source) {
                result.reasons.push(format!("{source} ({kw})"));
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::LifeGoal;

    fn profile(goal: LifeGoal, mbti: &str, riasec: &str) -> Profile {
        Profile {
            life_goal: goal,
            mbti_code: mbti.into(),
            riasec_code: riasec.into(),
            cognitive_scores: None,
            education_level: EducationLevel::Secondary,
            domain_interest: None,
        }
    }

    #[test]
    fn first_writer_wins() {
        // "manage" is in ENTJ (personality), E (aptitude) and Money (goal).
        let set = keywords_for(&profile(LifeGoal::Money, "ENTJ", "E"), &[]);
        assert_eq!(set.source_of("manage"), Some(KeywordSource::Personality));
        // "chief" first appears in aptitude E.
        assert_eq!(set.source_of("chief"), Some(KeywordSource::Aptitude));
        // "finance" only in Money.
        assert_eq!(set.source_of("finance"), Some(KeywordSource::LifeGoal));
    }

    #[test]
    fn domain_keywords_precede_taxonomy() {
        let mut p = profile(LifeGoal::Money, "ENTJ", "E");
        p.education_level = EducationLevel::Undergrad;
        p.domain_interest = Some("Finance and Banking".into());
        let set = keywords_for(&p, &[]);
        assert_eq!(set.source_of("finance"), Some(KeywordSource::MajorDegree));
        assert_eq!(set.source_of("banking"), Some(KeywordSource::MajorDegree));
        // "and" is too short to be a token.
        assert!(!set.contains("and"));
    }

    #[test]
    fn domain_tokens_only_for_undergrads() {
        let mut p = profile(LifeGoal::Money, "ENTJ", "E");
        p.domain_interest = Some("marine biology".into());
        let set = keywords_for(&p, &[]);
        assert!(set.domain_keywords().next().is_none());
    }

    #[test]
    fn ai_keywords_replace_tokenization() {
        let mut p = profile(LifeGoal::Achievement, "INTP", "I");
        p.education_level = EducationLevel::Undergrad;
        p.domain_interest = Some("data science".into());
        let ai = vec!["Data Scientist".to_string(), "ML Engineer".to_string()];
        let set = keywords_for(&p, &ai);
        let domain: Vec<&str> = set.domain_keywords().collect();
        assert_eq!(domain, vec!["data scientist", "ml engineer"]);
        assert!(!set.contains("science"));
    }

    #[test]
    fn ai_keywords_apply_regardless_of_level() {
        let p = profile(LifeGoal::Power, "ESTJ", "C");
        let set = keywords_for(&p, &["Auditor".to_string()]);
        assert_eq!(set.source_of("auditor"), Some(KeywordSource::MajorDegree));
    }

    #[test]
    fn unknown_codes_contribute_nothing() {
        let set = keywords_for(&profile(LifeGoal::Power, "ZZZZ", "Q"), &[]);
        assert!(set.from_source(KeywordSource::Personality).is_empty());
        assert!(set.from_source(KeywordSource::Aptitude).is_empty());
        assert!(!set.from_source(KeywordSource::LifeGoal).is_empty());
    }

    #[test]
    fn codes_are_case_insensitive() {
        let set = keywords_for(&profile(LifeGoal::Power, "entj", "e"), &[]);
        assert!(!set.from_source(KeywordSource::Personality).is_empty());
        assert!(!set.from_source(KeywordSource::Aptitude).is_empty());
    }

    #[test]
    fn cognitive_thresholds() {
        let high = CognitiveScores {
            reaction_time_ms: 200,
            number_memory: 13,
            verbal_memory: 65,
        };
        let kws = cognitive_keywords(&high);
        assert!(kws.contains(&"gamer"));
        assert!(kws.contains(&"statistic"));
        assert!(kws.contains(&"linguist"));

        let boundary = CognitiveScores {
            reaction_time_ms: 210,
            number_memory: 7,
            verbal_memory: 30,
        };
        assert!(cognitive_keywords(&boundary).is_empty());

        let upper = CognitiveScores {
            reaction_time_ms: 280,
            number_memory: 8,
            verbal_memory: 60,
        };
        assert_eq!(cognitive_keywords(&upper), taxonomy::MID_QUANT.to_vec());

        let slow = CognitiveScores {
            reaction_time_ms: 281,
            number_memory: 11,
            verbal_memory: 29,
        };
        let kws = cognitive_keywords(&slow);
        assert!(kws.contains(&"strategy"));
        assert!(kws.contains(&"logistic"));
        assert!(kws.contains(&"sport"));
        assert!(!kws.contains(&"backend"));
    }

    #[test]
    fn domain_bonus_awarded_once() {
        let mut set = KeywordSet::new();
        set.insert("data", KeywordSource::MajorDegree);
        set.insert("scientist", KeywordSource::MajorDegree);
        let scored = RuleScorer::default().score("Data Scientist: analyse data", &set);
        assert!((scored.score - 3.0).abs() < 1e-9);
        assert_eq!(scored.reasons, vec!["Major/Degree (data)".to_string()]);
    }

    #[test]
    fn other_keywords_add_half_point_with_one_reason_per_category() {
        let mut set = KeywordSet::new();
        set.insert("manage", KeywordSource::Personality);
        set.insert("executive", KeywordSource::Personality);
        set.insert("chief", KeywordSource::Aptitude);
        set.insert("surgeon", KeywordSource::LifeGoal);
        let scored = RuleScorer::default().score(
            "chief executives manage and manage again",
            &set,
        );
        // manage + executive + chief, each once regardless of repeats.
        assert!((scored.score - 1.5).abs() < 1e-9);
        assert_eq!(
            scored.reasons,
            vec![
                "Personality (manage)".to_string(),
                "Aptitude (chief)".to_string()
            ]
        );
    }

    #[test]
    fn no_hits_scores_zero() {
        let set = keywords_for(&profile(LifeGoal::Money, "ENTJ", "E"), &[]);
        let scored = RuleScorer::default().score("quiet gardening", &set);
        assert_eq!(scored, RuleScore::default());
    }
}
