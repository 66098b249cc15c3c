//! Request-side type definitions.
//!
//! Defines [`Profile`] (the psychometric/interest profile supplied per request),
//! its enums [`LifeGoal`] and [`EducationLevel`], optional [`CognitiveScores`],
//! and the [`Recommendation`] records returned to the caller.

use serde::{Deserialize, Serialize};

/// What the user wants most out of a career.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifeGoal {
    Money,
    Power,
    Achievement,
}

impl LifeGoal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Money => "Money",
            Self::Power => "Power",
            Self::Achievement => "Achievement",
        }
    }
}

impl std::fmt::Display for LifeGoal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LifeGoal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Money" | "money" => Ok(Self::Money),
            "Power" | "power" => Ok(Self::Power),
            "Achievement" | "achievement" => Ok(Self::Achievement),
            _ => Err(format!("unknown life goal: {s}")),
        }
    }
}

/// Highest completed schooling stage.
///
/// Serialized with the labels used by the intake form: `"10th"`, `"12th"`,
/// `"Undergrad"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EducationLevel {
    #[serde(rename = "10th", alias = "PreSecondary")]
    PreSecondary,
    #[serde(rename = "12th", alias = "Secondary")]
    Secondary,
    #[serde(rename = "Undergrad")]
    Undergrad,
}

impl EducationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreSecondary => "10th",
            Self::Secondary => "12th",
            Self::Undergrad => "Undergrad",
        }
    }
}

impl std::fmt::Display for EducationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Results of the reaction-time, number-memory and verbal-memory tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CognitiveScores {
    #[serde(alias = "reaction_time")]
    pub reaction_time_ms: i64,
    pub number_memory: i64,
    pub verbal_memory: i64,
}

/// A user profile. Transient: built per request and never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub life_goal: LifeGoal,
    /// Four-letter MBTI type, e.g. `"INTJ"`. Unknown codes are tolerated.
    pub mbti_code: String,
    /// Primary Holland (RIASEC) letter, e.g. `"I"`.
    pub riasec_code: String,
    #[serde(default)]
    pub cognitive_scores: Option<CognitiveScores>,
    pub education_level: EducationLevel,
    /// Field of study, only meaningful for undergraduates.
    #[serde(default)]
    pub domain_interest: Option<String>,
}

impl Profile {
    /// Domain interest with surrounding whitespace removed, `None` when blank.
    pub fn domain(&self) -> Option<&str> {
        self.domain_interest
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}

/// One ranked occupation with its explanation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub code: String,
    pub title: String,
    pub description: String,
    pub score: f64,
    /// Up to three human-readable reasons, most important first.
    pub reasoning: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_parses_intake_json() {
        let json = r#"{
            "life_goal": "Money",
            "mbti_code": "ENTJ",
            "riasec_code": "E",
            "cognitive_scores": {"reaction_time": 200, "number_memory": 13, "verbal_memory": 65},
            "education_level": "Undergrad",
            "domain_interest": "finance"
        }"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.life_goal, LifeGoal::Money);
        assert_eq!(profile.education_level, EducationLevel::Undergrad);
        assert_eq!(profile.cognitive_scores.unwrap().reaction_time_ms, 200);
        assert_eq!(profile.domain(), Some("finance"));
    }

    #[test]
    fn education_level_labels() {
        let level: EducationLevel = serde_json::from_str("\"10th\"").unwrap();
        assert_eq!(level, EducationLevel::PreSecondary);
        let level: EducationLevel = serde_json::from_str("\"Secondary\"").unwrap();
        assert_eq!(level, EducationLevel::Secondary);
        assert_eq!(EducationLevel::Undergrad.to_string(), "Undergrad");
    }

    #[test]
    fn optional_fields_default_to_none() {
        let json = r#"{"life_goal": "Power", "mbti_code": "ISTJ", "riasec_code": "C", "education_level": "12th"}"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert!(profile.cognitive_scores.is_none());
        assert!(profile.domain().is_none());
    }

    #[test]
    fn blank_domain_is_none() {
        let json = r#"{"life_goal": "Power", "mbti_code": "ISTJ", "riasec_code": "C", "education_level": "Undergrad", "domain_interest": "   "}"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert!(profile.domain().is_none());
    }

    #[test]
    fn life_goal_from_str() {
        assert_eq!("money".parse::<LifeGoal>().unwrap(), LifeGoal::Money);
        assert!("fame".parse::<LifeGoal>().is_err());
    }
}
