//! Loan Eligibility Assistant
//!
//! A conversational loan assistant that:
//! - Guides the user through income, debts, amount and tenure one turn at a time
//! - Estimates a credit score with a closed-form heuristic
//! - Checks eligibility against per-product thresholds
//! - Computes the EMI and renders a summary card
//! - Hands off-flow chatter to an LLM that never does the math itself
//!
//! TURN LOOP:
//! MESSAGE → KEYWORD? → STAGE → VALIDATE → ADVANCE | CONCLUDE | FALLBACK

pub mod api;
pub mod calculator;
pub mod classifier;
pub mod clock;
pub mod completion;
pub mod config;
pub mod conversational;
pub mod dialogue;
pub mod error;
pub mod models;
pub mod state;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use dialogue::{DialogueEngine, Step};
pub use conversational::FallbackResponder;
