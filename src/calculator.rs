//! Eligibility calculator
//!
//! Deterministic finance functions: credit score heuristic, EMI,
//! confidence bar and the summary card. LLM is NOT involved here.

use crate::clock::Clock;
use crate::error::AssistantError;
use crate::models::LoanQuote;
use crate::Result;

const BASE_SCORE: i64 = 750;
const MIN_SCORE: i64 = 300;
const MAX_SCORE: i64 = 850;
const INCOME_STEP: i64 = 10_000;
const MAX_INCOME_BONUS: i64 = 50;
const DEBT_STEP: i64 = 5_000;

const SUMMARY_TIME_FORMAT: &str = "%d %b %Y, %I:%M %p";

/// Estimate a credit score in [300, 850] from income and debts.
///
/// Uses floor division, so negative inputs round toward negative infinity.
pub fn estimate_credit_score(income: i64, debts: i64) -> i64 {
    let bonus = income.div_euclid(INCOME_STEP).min(MAX_INCOME_BONUS);
    let penalty = debts.div_euclid(DEBT_STEP);

    BASE_SCORE
        .saturating_add(bonus)
        .saturating_sub(penalty)
        .clamp(MIN_SCORE, MAX_SCORE)
}

/// Equated monthly installment, rounded to two decimals.
///
/// EMI = P × r × (1 + r)^n / ((1 + r)^n − 1) with r = rate / 1200, n = years × 12.
/// A zero rate degenerates to straight-line repayment.
pub fn compute_emi(amount: u64, annual_rate_percent: f64, years: u32) -> Result<f64> {
    if amount == 0 {
        return Err(AssistantError::InvalidLoanTerms(
            "loan amount must be positive".to_string(),
        ));
    }
    if years == 0 {
        return Err(AssistantError::InvalidLoanTerms(
            "tenure must be at least one year".to_string(),
        ));
    }
    if !annual_rate_percent.is_finite() || annual_rate_percent < 0.0 {
        return Err(AssistantError::InvalidLoanTerms(format!(
            "interest rate {} is not a valid percentage",
            annual_rate_percent
        )));
    }

    let principal = amount as f64;
    let payments = years.saturating_mul(12);
    let r = annual_rate_percent / 1200.0;

    let emi = if r == 0.0 {
        principal / f64::from(payments)
    } else {
        let growth = (1.0 + r).powi(i32::try_from(payments).unwrap_or(i32::MAX));
        principal * r * growth / (growth - 1.0)
    };

    if !emi.is_finite() {
        return Err(AssistantError::InvalidLoanTerms(format!(
            "EMI is not representable for amount {} over {} years",
            amount, years
        )));
    }

    Ok(round_to_cents(emi))
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Bar graphic for the credit score tier
pub fn confidence_label(score: i64) -> &'static str {
    if score >= 750 {
        "██████████ 100%"
    } else if score >= 700 {
        "████████░░ 80%"
    } else if score >= 650 {
        "██████░░░░ 60%"
    } else {
        "████░░░░░░ 40%"
    }
}

/// Render the summary card shown to an eligible applicant
pub fn format_summary(quote: &LoanQuote, clock: &dyn Clock) -> String {
    let checked_on = clock.now().format(SUMMARY_TIME_FORMAT);

    format!(
        "💡 **Loan Summary Card**\n\n\
         🏦 Loan Type: {} Loan\n\
         💰 Monthly Income: ₹{}\n\
         📉 Existing Debts: ₹{}\n\
         📄 Loan Amount: ₹{}\n\
         ⏳ Tenure: {} years\n\n\
         📊 Credit Confidence:\n\
         {}\n\n\
         ✅ Status: Eligible\n\
         💸 Estimated EMI: ₹{:.2} / month\n\n\
         🕒 Checked on: {}\n\n\
         🔁 Click RESET to try another loan.",
        quote.loan_type,
        quote.income,
        quote.debts,
        quote.amount,
        quote.years,
        confidence_label(quote.credit_score),
        quote.emi,
        checked_on,
    )
}
