use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::Result;
use crate::status::{classify, BudgetStatus, StatusBand, StatusThresholds};
use crate::store::Budget;

pub const OVER_BUDGET_STOP: &str =
    "You have exceeded your budget. Consider stopping non-essential spending.";
pub const OVER_BUDGET_RAISE: &str =
    "Consider increasing the budget amount for future periods.";
pub const CRITICAL_MONITOR: &str =
    "You are close to your budget limit. Monitor your spending carefully.";
pub const NEAR_LIMIT_PRIORITIZE: &str =
    "You have used most of your budget. Prioritize essential expenses.";
pub const HEALTHY_ON_TRACK: &str = "Your spending is on track.";
pub const UNSPENT_LATE: &str =
    "You have significant unspent funds with little time remaining in this budget period.";

/// Days left in the window at or below which low utilization is flagged.
const LATE_PERIOD_DAYS: i64 = 7;
/// Utilization below which funds count as significantly unspent.
const LOW_UTILIZATION_PERCENT: f64 = 50.0;

/// Spending pace of a budget and the advice derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetUtilization {
    pub budget_id: i32,
    pub utilization_percent: f64,
    pub status: StatusBand,
    /// Average spent per elapsed day.
    pub spending_velocity: Decimal,
    /// Day on which the remaining funds run out at the current pace.
    pub projected_completion_date: Option<NaiveDate>,
    pub days_remaining: i64,
    pub recommendations: Vec<String>,
}

pub fn spending_velocity(spent: Decimal, days_elapsed: i64) -> Decimal {
    if days_elapsed <= 0 {
        return Decimal::ZERO;
    }
    spent / Decimal::from(days_elapsed)
}

/// Only emitted while funds remain and spending is happening.
pub fn projected_completion_date(
    today: NaiveDate,
    amount: Decimal,
    spent: Decimal,
    velocity: Decimal,
) -> Option<NaiveDate> {
    if velocity <= Decimal::ZERO {
        return None;
    }
    let days = amount
        .checked_sub(spent)?
        .checked_div(velocity)?
        .trunc()
        .to_i64()?;
    if days <= 0 {
        return None;
    }
    today.checked_add_signed(Duration::days(days))
}

pub fn recommendations(status: &BudgetStatus) -> Vec<String> {
    let mut advice = Vec::new();

    match status.status {
        StatusBand::OverBudget => {
            advice.push(OVER_BUDGET_STOP.to_string());
            advice.push(OVER_BUDGET_RAISE.to_string());
        }
        StatusBand::Critical => advice.push(CRITICAL_MONITOR.to_string()),
        StatusBand::NearLimit => advice.push(NEAR_LIMIT_PRIORITIZE.to_string()),
        StatusBand::Healthy => advice.push(HEALTHY_ON_TRACK.to_string()),
    }

    if status.days_remaining <= LATE_PERIOD_DAYS
        && status.utilization_percent < LOW_UTILIZATION_PERCENT
    {
        advice.push(UNSPENT_LATE.to_string());
    }

    advice
}

pub fn analyze(
    budget: &Budget,
    today: NaiveDate,
    thresholds: &StatusThresholds,
) -> Result<BudgetUtilization> {
    let status = classify(budget, today, thresholds)?;
    let velocity = spending_velocity(budget.spent, status.days_elapsed);

    Ok(BudgetUtilization {
        budget_id: budget.id,
        utilization_percent: status.utilization_percent,
        status: status.status,
        spending_velocity: velocity,
        projected_completion_date: projected_completion_date(
            today,
            budget.amount,
            budget.spent,
            velocity,
        ),
        days_remaining: status.days_remaining,
        recommendations: recommendations(&status),
    })
}
