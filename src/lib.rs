//! Hybrid occupation recommender.
//!
//! Career Nexus ranks occupations from an O*NET-style catalog against a user
//! profile (life goal, MBTI type, RIASEC letter, optional cognitive test
//! results, education level and domain interest). Two signals are blended:
//!
//! | Signal | Source | Weight |
//! |--------|--------|--------|
//! | **Rule score** | Keyword containment over title + description | +3.0 domain bonus (once), +0.5 per other keyword |
//! | **Semantic score** | Cosine similarity of profile query vs. occupation embedding | × 10 |
//!
//! Rows with a combined score below 2.5 are dropped; at most 20 are returned.
//!
//! # Architecture
//!
//! - **Index**: one embedding per catalog row, hydrated in a background task
//!   from a SQLite blob cache or computed through the embedding provider.
//!   Until it is ready, requests are ranked rule-only.
//! - **Embeddings**: local ONNX Runtime all-MiniLM-L6-v2 (384 dimensions) or
//!   the Gemini API
//! - **Expansion**: optional AI expansion of an undergraduate's field of study
//!   into related job titles
//!
//! # Modules
//!
//! - [`config`]: configuration loading from TOML files and environment variables
//! - [`catalog`]: the occupation catalog
//! - [`taxonomy`] and [`rules`]: keyword tables and rule scoring
//! - [`embedding`]: embedding and completion providers
//! - [`index`]: the semantic vector index and its cache codec
//! - [`ranker`]: hybrid merge, filter and sort
//! - [`engine`]: the request-facing service

pub mod catalog;
pub mod config;
pub mod db;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod expansion;
pub mod index;
pub mod profile;
pub mod ranker;
pub mod rules;
pub mod taxonomy;
