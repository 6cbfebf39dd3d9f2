use chrono::NaiveDate;
use model::entities::budget::BudgetPeriod;
use rust_decimal::Decimal;

use crate::status::{utilization, StatusThresholds};
use crate::store::Budget;

/// Query options for listing the budgets of a family.
///
/// `active_on` and `category_id` select the candidate set; every other field
/// narrows it after the spent amounts were refreshed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetFilter {
    /// Only budgets flagged active whose window contains this day.
    pub active_on: Option<NaiveDate>,
    pub category_id: Option<i32>,
    pub period: Option<BudgetPeriod>,
    pub is_active: Option<bool>,
    /// Excludes budgets ending before this day.
    pub date_from: Option<NaiveDate>,
    /// Excludes budgets starting after this day.
    pub date_to: Option<NaiveDate>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    pub is_over_budget: Option<bool>,
    pub is_near_limit: Option<bool>,
    pub has_unspent_funds: Option<bool>,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl BudgetFilter {
    pub fn matches(&self, budget: &Budget, thresholds: &StatusThresholds) -> bool {
        if self.active_on.is_some_and(|date| !budget.is_active_on(date)) {
            return false;
        }
        if self.category_id.is_some_and(|c| budget.category_id != Some(c)) {
            return false;
        }
        if self.period.is_some_and(|p| p != budget.period) {
            return false;
        }
        if self.is_active.is_some_and(|a| a != budget.is_active) {
            return false;
        }
        if self.date_from.is_some_and(|from| budget.end_date < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| budget.start_date > to) {
            return false;
        }
        if self.min_amount.is_some_and(|min| budget.amount < min) {
            return false;
        }
        if self.max_amount.is_some_and(|max| budget.amount > max) {
            return false;
        }

        // A ratio past the decimal range is far beyond any threshold.
        let used = utilization(budget.spent, budget.amount).unwrap_or(if budget.spent.is_sign_negative() {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
        if self.is_over_budget.is_some_and(|want| want != (used >= 100.0)) {
            return false;
        }
        if self
            .is_near_limit
            .is_some_and(|want| want != (used >= thresholds.near_limit))
        {
            return false;
        }
        if self
            .has_unspent_funds
            .is_some_and(|want| want != (budget.spent < budget.amount))
        {
            return false;
        }
        true
    }

    /// Filters, orders by `(start_date, id)` and cuts the requested page.
    pub fn apply(&self, budgets: Vec<Budget>, thresholds: &StatusThresholds) -> Vec<Budget> {
        let mut selected: Vec<Budget> = budgets
            .into_iter()
            .filter(|b| self.matches(b, thresholds))
            .collect();
        sort_by_window(&mut selected);

        let page = selected.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => page.take(limit).collect(),
            None => page.collect(),
        }
    }
}

/// Stable iteration order for every multi-budget operation.
pub fn sort_by_window(budgets: &mut [Budget]) {
    budgets.sort_by_key(|b| (b.start_date, b.id));
}
