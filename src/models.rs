//! Core data models for the loan assistant

use serde::{Deserialize, Serialize};
use std::fmt;

//
// ================= Loan Products =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LoanType {
    Personal,
    Auto,
    Mortgage,
}

impl LoanType {
    /// Canonical order. Keyword detection walks this list front to back.
    pub const ALL: [LoanType; 3] = [LoanType::Personal, LoanType::Auto, LoanType::Mortgage];

    /// Lowercase keyword matched against user messages
    pub fn keyword(self) -> &'static str {
        match self {
            LoanType::Personal => "personal",
            LoanType::Auto => "auto",
            LoanType::Mortgage => "mortgage",
        }
    }

    pub fn product(self) -> &'static LoanProduct {
        match self {
            LoanType::Personal => &LOAN_PRODUCTS[0],
            LoanType::Auto => &LOAN_PRODUCTS[1],
            LoanType::Mortgage => &LOAN_PRODUCTS[2],
        }
    }
}

impl fmt::Display for LoanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoanType::Personal => "Personal",
            LoanType::Auto => "Auto",
            LoanType::Mortgage => "Mortgage",
        };
        write!(f, "{}", s)
    }
}

/// Pricing and eligibility rule for one loan product
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoanProduct {
    pub loan_type: LoanType,
    pub interest_rate_percent: f64,
    pub minimum_credit_score: i64,
}

pub static LOAN_PRODUCTS: [LoanProduct; 3] = [
    LoanProduct {
        loan_type: LoanType::Personal,
        interest_rate_percent: 12.0,
        minimum_credit_score: 650,
    },
    LoanProduct {
        loan_type: LoanType::Auto,
        interest_rate_percent: 9.0,
        minimum_credit_score: 600,
    },
    LoanProduct {
        loan_type: LoanType::Mortgage,
        interest_rate_percent: 7.0,
        minimum_credit_score: 700,
    },
];

//
// ================= Session =================
//

/// Position in the guided input sequence.
///
/// Each variant carries exactly the values collected before it, so a value
/// cannot be read ahead of the stage that stores it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Stage {
    AwaitingIncome,
    AwaitingDebts {
        income: u64,
    },
    AwaitingAmount {
        income: u64,
        debts: u64,
    },
    AwaitingTenure {
        income: u64,
        debts: u64,
        amount: u64,
    },
}

/// Conversation state carried between turns by the session store
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    Collecting {
        loan_type: LoanType,
        stage: Stage,
    },
}

impl SessionState {
    /// Fresh flow for a newly selected loan type
    pub fn start(loan_type: LoanType) -> Self {
        SessionState::Collecting {
            loan_type,
            stage: Stage::AwaitingIncome,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    pub fn loan_type(&self) -> Option<LoanType> {
        match self {
            SessionState::Idle => None,
            SessionState::Collecting { loan_type, .. } => Some(*loan_type),
        }
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            SessionState::Idle => None,
            SessionState::Collecting { stage, .. } => Some(*stage),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::AwaitingIncome => "awaiting_income",
            Stage::AwaitingDebts { .. } => "awaiting_debts",
            Stage::AwaitingAmount { .. } => "awaiting_amount",
            Stage::AwaitingTenure { .. } => "awaiting_tenure",
        };
        write!(f, "{}", s)
    }
}

//
// ================= Turn Result =================
//

/// New session state plus the text to show the user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TurnOutcome {
    pub state: SessionState,
    pub reply: String,
}

impl TurnOutcome {
    pub fn new(state: SessionState, reply: impl Into<String>) -> Self {
        Self {
            state,
            reply: reply.into(),
        }
    }
}

//
// ================= Eligibility Quote =================
//

/// Everything needed to render the summary card for an eligible applicant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoanQuote {
    pub loan_type: LoanType,
    pub income: u64,
    pub debts: u64,
    pub amount: u64,
    pub years: u32,
    pub emi: f64,
    pub credit_score: i64,
}
