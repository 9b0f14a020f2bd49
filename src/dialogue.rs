//! Dialogue state machine
//!
//! (state, message) → (state, reply)
//!
//! Every turn first looks for a loan keyword, which restarts the flow. Otherwise
//! the current stage decides how the message is read. Idle sessions are handed
//! to the conversational fallback.

use crate::calculator::{compute_emi, estimate_credit_score, format_summary};
use crate::classifier::{detect_loan_type, extract_first_integer};
use crate::clock::{Clock, SystemClock};
use crate::conversational::FallbackResponder;
use crate::models::{LoanQuote, LoanType, SessionState, Stage, TurnOutcome};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const RESET_REPLY: &str = "🔄 Chat reset. Choose: personal loan / auto loan / mortgage";

const MAX_TENURE_YEARS: u64 = 50;

/// Result of the synchronous part of a turn
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Reply produced by the guided flow
    Reply(TurnOutcome),
    /// No active flow; the message goes to the fallback and state is kept
    Delegate(SessionState),
}

pub struct DialogueEngine {
    fallback: FallbackResponder,
    clock: Arc<dyn Clock>,
}

impl DialogueEngine {
    pub fn new(fallback: FallbackResponder) -> Self {
        Self {
            fallback,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Process one chat turn
    pub async fn process_turn(&self, state: SessionState, message: &str) -> TurnOutcome {
        match self.step(state, message) {
            Step::Reply(outcome) => outcome,
            Step::Delegate(state) => {
                info!("No active loan flow, delegating to conversational fallback");
                let reply = self.fallback.respond(message.trim()).await;
                TurnOutcome::new(state, reply)
            }
        }
    }

    /// Explicit reset, independent of the current state
    pub fn reset_session() -> TurnOutcome {
        TurnOutcome::new(SessionState::Idle, RESET_REPLY)
    }

    /// Pure transition. Reads the clock only when rendering a summary.
    pub fn step(&self, state: SessionState, message: &str) -> Step {
        if let Some(loan_type) = detect_loan_type(message) {
            info!(%loan_type, "Loan type selected, starting new flow");
            return Step::Reply(TurnOutcome::new(
                SessionState::start(loan_type),
                format!("{} loan selected. Enter monthly income:", loan_type),
            ));
        }

        let SessionState::Collecting { loan_type, stage } = state else {
            return Step::Delegate(state);
        };

        debug!(%loan_type, %stage, "Dispatching on stage");

        let number = extract_first_integer(message);
        let collecting = |stage| SessionState::Collecting { loan_type, stage };

        let outcome = match (stage, number) {
            (Stage::AwaitingIncome, Some(income)) => TurnOutcome::new(
                collecting(Stage::AwaitingDebts { income }),
                "Enter total debts:",
            ),
            (Stage::AwaitingIncome, None) => TurnOutcome::new(state, "Enter income as a number."),

            (Stage::AwaitingDebts { income }, Some(debts)) => TurnOutcome::new(
                collecting(Stage::AwaitingAmount { income, debts }),
                "Enter loan amount:",
            ),
            (Stage::AwaitingDebts { .. }, None) => {
                TurnOutcome::new(state, "Enter debts as a number.")
            }

            (Stage::AwaitingAmount { income, debts }, Some(amount)) if amount > 0 => {
                TurnOutcome::new(
                    collecting(Stage::AwaitingTenure {
                        income,
                        debts,
                        amount,
                    }),
                    "Enter tenure in years:",
                )
            }
            (Stage::AwaitingAmount { .. }, _) => {
                TurnOutcome::new(state, "Enter loan amount as a number.")
            }

            (
                Stage::AwaitingTenure {
                    income,
                    debts,
                    amount,
                },
                Some(years),
            ) if (1..=MAX_TENURE_YEARS).contains(&years) => {
                // Bounded by MAX_TENURE_YEARS above
                let years = years as u32;
                self.conclude(loan_type, income, debts, amount, years)
                    .unwrap_or_else(|| TurnOutcome::new(state, "Enter tenure in years."))
            }
            (Stage::AwaitingTenure { .. }, _) => TurnOutcome::new(state, "Enter tenure in years."),
        };

        Step::Reply(outcome)
    }

    /// Terminal stage: decide eligibility and clear the session.
    ///
    /// `None` only if the EMI cannot be computed for the collected terms.
    fn conclude(
        &self,
        loan_type: LoanType,
        income: u64,
        debts: u64,
        amount: u64,
        years: u32,
    ) -> Option<TurnOutcome> {
        let product = loan_type.product();
        let score = estimate_credit_score(saturating_i64(income), saturating_i64(debts));

        if score < product.minimum_credit_score {
            info!(
                %loan_type,
                score,
                minimum = product.minimum_credit_score,
                "Applicant not eligible"
            );
            return Some(TurnOutcome::new(
                SessionState::Idle,
                format!("❌ Credit score {}. Not eligible.", score),
            ));
        }

        let emi = match compute_emi(amount, product.interest_rate_percent, years) {
            Ok(emi) => emi,
            Err(e) => {
                warn!(%loan_type, "Could not compute EMI: {}", e);
                return None;
            }
        };

        info!(%loan_type, score, "Applicant eligible");
        debug!(amount, years, emi, "EMI computed");

        let quote = LoanQuote {
            loan_type,
            income,
            debts,
            amount,
            years,
            emi,
            credit_score: score,
        };

        Some(TurnOutcome::new(
            SessionState::Idle,
            format_summary(&quote, self.clock.as_ref()),
        ))
    }
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
