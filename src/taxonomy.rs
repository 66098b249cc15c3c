//! Static keyword taxonomy.
//!
//! Maps profile facet codes (MBTI type, RIASEC letter, life goal, cognitive
//! bands) to keyword stems matched against lowercased occupation text. Stems
//! such as `"psycholo"` or `"analy"` are intentional: they match every
//! inflection by substring.

use crate::profile::LifeGoal;

type Table = &'static [(&'static str, &'static [&'static str])];

const PERSONALITY: Table = &[
    // Analysts
    ("INTJ", &["strategic", "logical", "planning", "architect", "science", "theory", "develop", "executive"]),
    ("INTP", &["innovative", "curious", "theory", "analyze", "academic", "research", "computer", "philosophical"]),
    ("ENTJ", &["leader", "decisive", "bold", "manage", "director", "executive", "operation", "business"]),
    ("ENTP", &["intellectual", "challenge", "entrepreneur", "stock", "marketing", "creative", "venture"]),
    // Diplomats
    ("INFJ", &["counsel", "inspire", "complex", "creative", "writer", "psycholo", "human"]),
    ("INFP", &["poetic", "kind", "altruistic", "art", "music", "write", "social", "nonprofit"]),
    ("ENFJ", &["lead", "inspire", "teach", "public", "social", "politic", "service"]),
    ("ENFP", &["enthusiastic", "creative", "social", "journal", "event", "promotion", "diplomat"]),
    // Sentinels
    ("ISTJ", &["fact", "reliable", "account", "audit", "administra", "police", "legal", "system"]),
    ("ISFJ", &["protect", "warm", "nurse", "teach", "child", "medicine", "social"]),
    ("ESTJ", &["manage", "administer", "supervise", "contract", "finance", "insurance", "officer"]),
    ("ESFJ", &["care", "social", "sale", "teach", "nurse", "health", "provider"]),
    // Explorers
    ("ISTP", &["bold", "practical", "mechanic", "engineer", "pilot", "driver", "detective", "fire"]),
    ("ISFP", &["flexible", "charm", "art", "design", "fashion", "landscape", "music"]),
    ("ESTP", &["smart", "energy", "sale", "police", "detective", "entrepreneur", "paramedic"]),
    ("ESFP", &["spontaneous", "perform", "actor", "music", "entertain", "event", "tour"]),
];

const APTITUDE: Table = &[
    ("R", &["engineer", "mechanic", "driver", "pilot", "farm", "build", "technician", "hardware", "machine", "construct"]),
    ("I", &["analy", "scien", "research", "logic", "medic", "biolog", "chemist", "physic", "professor", "data"]),
    ("A", &["art", "design", "creat", "write", "music", "perform", "actor", "fashion", "media", "edit"]),
    ("S", &["social", "counsel", "teach", "nurse", "therap", "help", "care", "service", "psycholog", "human"]),
    ("E", &["manage", "business", "sale", "law", "politic", "entrepreneur", "chief", "lead", "project"]),
    ("C", &["account", "admin", "office", "clerk", "finance", "audit", "data", "record", "inventory", "quality"]),
];

const MONEY: &[&str] = &["chief", "executive", "manage", "finance", "invest", "bank", "surgeon", "lawyer", "corporate", "director"];
const POWER: &[&str] = &["politic", "chief", "executive", "judge", "director", "officer", "manage", "admin", "lead"];
const ACHIEVEMENT: &[&str] = &["research", "scien", "professor", "engineer", "architect", "invent", "doctor", "specialist"];

// Cognitive bands.
pub const FAST_REFLEX: &[&str] = &["pilot", "gamer", "emergency", "fire", "driver", "surgeon", "trade"];
pub const DELIBERATIVE: &[&str] = &["research", "writer", "architect", "strategy", "analy", "planning"];
pub const HIGH_QUANT: &[&str] = &["backend", "data", "math", "cyber", "statistic", "physic"];
pub const MID_QUANT: &[&str] = &["account", "finance", "code", "logistic"];
pub const VERBAL_HEAVY: &[&str] = &["law", "medic", "history", "linguist", "profess", "edit"];
pub const LOW_VERBAL: &[&str] = &["sport", "trade", "art", "perform"];

fn lookup(table: Table, code: &str) -> &'static [&'static str] {
    table
        .iter()
        .find(|(key, _)| *key == code)
        .map(|(_, words)| *words)
        .unwrap_or(&[])
}

/// Keywords for an MBTI type. `code` is expected uppercased; unknown types
/// yield an empty slice.
pub fn personality(code: &str) -> &'static [&'static str] {
    lookup(PERSONALITY, code)
}

/// Keywords for a RIASEC letter. `code` is expected uppercased.
pub fn aptitude(code: &str) -> &'static [&'static str] {
    lookup(APTITUDE, code)
}

pub fn life_goal(goal: LifeGoal) -> &'static [&'static str] {
    match goal {
        LifeGoal::Money => MONEY,
        LifeGoal::Power => POWER,
        LifeGoal::Achievement => ACHIEVEMENT,
    }
}
