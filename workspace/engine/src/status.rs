use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::fmt;

use crate::error::{EngineError, Result};
use crate::store::Budget;

/// Utilization thresholds, in percent, for the warning bands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusThresholds {
    pub near_limit: f64,
    pub critical: f64,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            near_limit: 80.0,
            critical: 90.0,
        }
    }
}

/// Highest utilization band a budget has reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatusBand {
    Healthy,
    NearLimit,
    Critical,
    OverBudget,
}

impl StatusBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusBand::Healthy => "healthy",
            StatusBand::NearLimit => "near_limit",
            StatusBand::Critical => "critical",
            StatusBand::OverBudget => "over_budget",
        }
    }
}

impl fmt::Display for StatusBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Consumption and pacing of a budget as of a given day.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetStatus {
    pub budget_id: i32,
    pub budget_name: String,
    pub budget_amount: Decimal,
    pub spent_amount: Decimal,
    /// `amount - spent`; negative once the budget is exceeded.
    pub remaining_amount: Decimal,
    pub utilization_percent: f64,
    pub is_over_budget: bool,
    pub is_critical_limit: bool,
    pub is_near_limit: bool,
    pub status: StatusBand,
    pub days_total: i64,
    /// Zero or negative before the window starts.
    pub days_elapsed: i64,
    pub days_remaining: i64,
    pub daily_budget: Decimal,
    pub daily_spent: Decimal,
    pub projected_overrun: Decimal,
}

/// `spent / amount * 100`. The amount is positive for every stored budget.
///
/// `None` when the ratio does not fit into a decimal.
pub fn utilization(spent: Decimal, amount: Decimal) -> Option<f64> {
    if amount <= Decimal::ZERO {
        return Some(0.0);
    }
    spent
        .checked_div(amount)?
        .checked_mul(Decimal::ONE_HUNDRED)?
        .to_f64()
}

pub fn band(utilization: f64, thresholds: &StatusThresholds) -> StatusBand {
    if utilization >= 100.0 {
        StatusBand::OverBudget
    } else if utilization >= thresholds.critical {
        StatusBand::Critical
    } else if utilization >= thresholds.near_limit {
        StatusBand::NearLimit
    } else {
        StatusBand::Healthy
    }
}

/// Whole days between the window bounds and `today`.
///
/// Returns `(days_total, days_elapsed, days_remaining)`.
pub fn day_metrics(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> (i64, i64, i64) {
    let days_total = (end - start).num_days();
    let days_elapsed = (today - start).num_days();
    let days_remaining = (end - today).num_days().max(0);
    (days_total, days_elapsed, days_remaining)
}

pub fn classify(
    budget: &Budget,
    today: NaiveDate,
    thresholds: &StatusThresholds,
) -> Result<BudgetStatus> {
    let overflow = || EngineError::Overflow { operation: "classify" };

    let utilization_percent = utilization(budget.spent, budget.amount).ok_or_else(overflow)?;
    let (days_total, days_elapsed, days_remaining) =
        day_metrics(budget.start_date, budget.end_date, today);

    let daily_budget = if days_total > 0 {
        budget.amount / Decimal::from(days_total)
    } else {
        Decimal::ZERO
    };
    let daily_spent = if days_elapsed > 0 {
        budget.spent / Decimal::from(days_elapsed)
    } else {
        Decimal::ZERO
    };
    let projected_overrun = if daily_spent > Decimal::ZERO && days_remaining > 0 {
        daily_spent
            .checked_mul(Decimal::from(days_remaining))
            .and_then(|rest| rest.checked_add(budget.spent))
            .and_then(|total| total.checked_sub(budget.amount))
            .ok_or_else(overflow)?
            .max(Decimal::ZERO)
    } else {
        Decimal::ZERO
    };
    let remaining_amount = budget.amount.checked_sub(budget.spent).ok_or_else(overflow)?;

    Ok(BudgetStatus {
        budget_id: budget.id,
        budget_name: budget.name.clone(),
        budget_amount: budget.amount,
        spent_amount: budget.spent,
        remaining_amount,
        utilization_percent,
        is_over_budget: utilization_percent >= 100.0,
        is_critical_limit: utilization_percent >= thresholds.critical,
        is_near_limit: utilization_percent >= thresholds.near_limit,
        status: band(utilization_percent, thresholds),
        days_total,
        days_elapsed,
        days_remaining,
        daily_budget,
        daily_spent,
        projected_overrun,
    })
}
