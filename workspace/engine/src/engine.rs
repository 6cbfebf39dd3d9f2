use chrono::{NaiveDate, Utc};
use model::entities::budget::BudgetPeriod;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::error::{EngineError, Result};
use crate::filter::{sort_by_window, BudgetFilter};
use crate::overlap::ensure_no_overlap;
use crate::projection::{analyze, BudgetUtilization};
use crate::resync::{RecalcObserver, SpentRecalculator, TracingObserver};
use crate::status::{classify, BudgetStatus, StatusThresholds};
use crate::store::{with_deadline, Budget, BudgetStore, LedgerQuery};

/// Tunables of a [`BudgetEngine`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub thresholds: StatusThresholds,
    /// Upper bound for every single store or ledger call.
    pub call_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thresholds: StatusThresholds::default(),
            call_timeout: Some(Duration::from_secs(10)),
        }
    }
}

/// Input of [`BudgetEngine::create_budget`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewBudget {
    pub family_id: i32,
    pub name: String,
    pub amount: Decimal,
    pub period: BudgetPeriod,
    pub category_id: Option<i32>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Partial update. `None` leaves the field untouched; `category_id` uses a
/// nested option so a budget can be turned family-wide.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetPatch {
    pub name: Option<String>,
    pub amount: Option<Decimal>,
    pub period: Option<BudgetPeriod>,
    pub category_id: Option<Option<i32>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

/// Result of [`BudgetEngine::recalculate_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecalculationSummary {
    pub checked: usize,
    pub rewritten: usize,
    pub failed: usize,
}

/// Budget tracking over a budget store and a transaction ledger.
///
/// Every read refreshes the cached spent amount from the ledger first. Create
/// and update reject windows that collide with another active budget of the
/// same scope.
pub struct BudgetEngine {
    budgets: Arc<dyn BudgetStore>,
    ledger: Arc<dyn LedgerQuery>,
    observer: Arc<dyn RecalcObserver>,
    config: EngineConfig,
    today: Option<NaiveDate>,
}

impl BudgetEngine {
    pub fn new(budgets: Arc<dyn BudgetStore>, ledger: Arc<dyn LedgerQuery>, config: EngineConfig) -> Self {
        Self {
            budgets,
            ledger,
            observer: Arc::new(TracingObserver),
            config,
            today: None,
        }
    }

    /// Replaces the sink for recovered recalculation failures.
    pub fn with_observer(mut self, observer: Arc<dyn RecalcObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Pins "today" instead of reading the local clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Reference day for status, projections and limit checks.
    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    fn recalculator(&self) -> SpentRecalculator {
        SpentRecalculator::new(
            self.budgets.clone(),
            self.ledger.clone(),
            self.observer.clone(),
            self.config.call_timeout,
        )
    }

    async fn load(&self, operation: &'static str, id: i32) -> Result<Budget> {
        with_deadline("get_by_id", self.config.call_timeout, self.budgets.get_by_id(id))
            .await
            .map_err(|e| e.in_storage(operation))?
            .ok_or(EngineError::NotFound(id))
    }

    async fn store_update(&self, operation: &'static str, budget: &Budget) -> Result<Budget> {
        with_deadline("update", self.config.call_timeout, self.budgets.update(budget))
            .await
            .map_err(|e| e.in_storage(operation))
    }

    async fn ensure_period_free(
        &self,
        operation: &'static str,
        family_id: i32,
        category_id: Option<i32>,
        start: NaiveDate,
        end: NaiveDate,
        exclude_id: Option<i32>,
    ) -> Result<()> {
        let candidates = with_deadline(
            "get_by_period",
            self.config.call_timeout,
            self.budgets.get_by_period(family_id, start, end),
        )
        .await
        .map_err(|e| e.in_storage(operation))?;

        ensure_no_overlap(&candidates, category_id, start, end, exclude_id)
    }

    #[instrument(skip(self, new), fields(family_id = new.family_id, category_id = ?new.category_id))]
    pub async fn create_budget(&self, new: NewBudget) -> Result<Budget> {
        validate_name(&new.name)?;
        validate_amount(new.amount)?;
        validate_window(new.start_date, new.end_date)?;

        self.ensure_period_free(
            "create_budget",
            new.family_id,
            new.category_id,
            new.start_date,
            new.end_date,
            None,
        )
        .await?;

        let now = Utc::now();
        let candidate = Budget {
            id: 0,
            family_id: new.family_id,
            name: new.name.trim().to_string(),
            amount: new.amount,
            spent: Decimal::ZERO,
            period: new.period,
            category_id: new.category_id,
            start_date: new.start_date,
            end_date: new.end_date,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let created = with_deadline("create", self.config.call_timeout, self.budgets.create(candidate))
            .await
            .map_err(|e| e.in_storage("create_budget"))?;
        info!(budget_id = created.id, name = %created.name, "Budget created");

        Ok(self.recalculator().resync("create_budget", created).await)
    }

    #[instrument(skip(self))]
    pub async fn get_budget_by_id(&self, id: i32) -> Result<Budget> {
        let budget = self.load("get_budget_by_id", id).await?;
        Ok(self.recalculator().resync("get_budget_by_id", budget).await)
    }

    #[instrument(skip(self, filter))]
    pub async fn get_all_budgets(&self, family_id: i32, filter: &BudgetFilter) -> Result<Vec<Budget>> {
        let candidates: Vec<Budget> = if let Some(date) = filter.active_on {
            with_deadline(
                "get_active_budgets",
                self.config.call_timeout,
                self.budgets.get_active_budgets(family_id),
            )
            .await
            .map_err(|e| e.in_storage("get_all_budgets"))?
            .into_iter()
            .filter(|b| b.is_active_on(date))
            .collect()
        } else if let Some(category_id) = filter.category_id {
            with_deadline(
                "get_by_category",
                self.config.call_timeout,
                self.budgets.get_by_category(family_id, category_id),
            )
            .await
            .map_err(|e| e.in_storage("get_all_budgets"))?
        } else {
            with_deadline("get_all", self.config.call_timeout, self.budgets.get_all(family_id))
                .await
                .map_err(|e| e.in_storage("get_all_budgets"))?
        };

        let fresh = self.recalculator().resync_all("get_all_budgets", candidates).await;
        let page = filter.apply(fresh, &self.config.thresholds);
        debug!(count = page.len(), "Listed budgets");
        Ok(page)
    }

    #[instrument(skip(self, patch))]
    pub async fn update_budget(&self, id: i32, patch: BudgetPatch) -> Result<Budget> {
        let recalculator = self.recalculator();
        let current = self.load("update_budget", id).await?;
        let original = recalculator.resync("update_budget", current).await;
        let mut updated = original.clone();

        if let Some(name) = patch.name {
            validate_name(&name)?;
            updated.name = name.trim().to_string();
        }
        if let Some(amount) = patch.amount {
            validate_amount(amount)?;
            if amount < original.spent {
                return Err(EngineError::AlreadyExceeded {
                    amount,
                    spent: original.spent,
                });
            }
            updated.amount = amount;
        }
        if let Some(period) = patch.period {
            updated.period = period;
        }
        if let Some(category_id) = patch.category_id {
            updated.category_id = category_id;
        }
        if let Some(is_active) = patch.is_active {
            updated.is_active = is_active;
        }
        updated.start_date = patch.start_date.unwrap_or(original.start_date);
        updated.end_date = patch.end_date.unwrap_or(original.end_date);

        let window_changed =
            updated.start_date != original.start_date || updated.end_date != original.end_date;
        let scope_changed = updated.category_id != original.category_id;
        let reactivated = updated.is_active && !original.is_active;

        if window_changed {
            validate_window(updated.start_date, updated.end_date)?;
        }
        if updated.is_active && (window_changed || scope_changed || reactivated) {
            self.ensure_period_free(
                "update_budget",
                updated.family_id,
                updated.category_id,
                updated.start_date,
                updated.end_date,
                Some(updated.id),
            )
            .await?;
        }

        updated.updated_at = Utc::now();
        let stored = self.store_update("update_budget", &updated).await?;
        info!(budget_id = stored.id, "Budget updated");

        if window_changed || scope_changed {
            return Ok(recalculator.resync("update_budget", stored).await);
        }
        Ok(stored)
    }

    #[instrument(skip(self))]
    pub async fn delete_budget(&self, id: i32) -> Result<()> {
        self.load("delete_budget", id).await?;
        with_deadline("delete", self.config.call_timeout, self.budgets.delete(id))
            .await
            .map_err(|e| e.in_storage("delete_budget"))?;
        info!(budget_id = id, "Budget deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_active_budgets(&self, family_id: i32, date: NaiveDate) -> Result<Vec<Budget>> {
        let mut active: Vec<Budget> = with_deadline(
            "get_active_budgets",
            self.config.call_timeout,
            self.budgets.get_active_budgets(family_id),
        )
        .await
        .map_err(|e| e.in_storage("get_active_budgets"))?
        .into_iter()
        .filter(|b| b.is_active_on(date))
        .collect();
        sort_by_window(&mut active);

        Ok(self.recalculator().resync_all("get_active_budgets", active).await)
    }

    /// Adds `delta` to the cached spent amount without consulting the ledger.
    #[instrument(skip(self))]
    pub async fn update_budget_spent(&self, id: i32, delta: Decimal) -> Result<Budget> {
        let mut budget = self.load("update_budget_spent", id).await?;
        budget.spent = budget
            .spent
            .checked_add(delta)
            .ok_or(EngineError::AmountInvalid(delta))?;
        budget.updated_at = Utc::now();
        let stored = self.store_update("update_budget_spent", &budget).await?;
        debug!(budget_id = id, %delta, spent = %stored.spent, "Applied spent delta");
        Ok(stored)
    }

    /// Rejects a proposed expense that does not fit into a budget of the
    /// given scope active today. No configured budget means no limit.
    #[instrument(skip(self))]
    pub async fn check_budget_limits(
        &self,
        family_id: i32,
        category_id: Option<i32>,
        amount: Decimal,
    ) -> Result<()> {
        validate_amount(amount)?;
        let today = self.today();

        let scoped: Vec<Budget> = match category_id {
            Some(category_id) => with_deadline(
                "get_by_category",
                self.config.call_timeout,
                self.budgets.get_by_category(family_id, category_id),
            )
            .await
            .map_err(|e| e.in_storage("check_budget_limits"))?,
            None => with_deadline(
                "get_active_budgets",
                self.config.call_timeout,
                self.budgets.get_active_budgets(family_id),
            )
            .await
            .map_err(|e| e.in_storage("check_budget_limits"))?
            .into_iter()
            .filter(|b| b.is_family_wide())
            .collect(),
        };

        let mut applicable: Vec<Budget> = scoped.into_iter().filter(|b| b.is_active_on(today)).collect();
        sort_by_window(&mut applicable);

        let recalculator = self.recalculator();
        for budget in applicable {
            let budget = recalculator.resync("check_budget_limits", budget).await;
            let fits = budget
                .spent
                .checked_add(amount)
                .is_some_and(|total| total <= budget.amount);
            if !fits {
                info!(budget_id = budget.id, %amount, spent = %budget.spent, "Budget limit would be exceeded");
                return Err(EngineError::InsufficientFunds {
                    budget_id: budget.id,
                    name: budget.name,
                    available: budget.amount.saturating_sub(budget.spent),
                    requested: amount,
                });
            }
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_budget_status(&self, id: i32) -> Result<BudgetStatus> {
        let budget = self.get_budget_by_id(id).await?;
        classify(&budget, self.today(), &self.config.thresholds)
    }

    #[instrument(skip(self))]
    pub async fn calculate_budget_utilization(&self, id: i32) -> Result<BudgetUtilization> {
        let budget = self.get_budget_by_id(id).await?;
        analyze(&budget, self.today(), &self.config.thresholds)
    }

    #[instrument(skip(self))]
    pub async fn get_budgets_by_category(&self, family_id: i32, category_id: i32) -> Result<Vec<Budget>> {
        let mut budgets = with_deadline(
            "get_by_category",
            self.config.call_timeout,
            self.budgets.get_by_category(family_id, category_id),
        )
        .await
        .map_err(|e| e.in_storage("get_budgets_by_category"))?;
        sort_by_window(&mut budgets);

        Ok(self.recalculator().resync_all("get_budgets_by_category", budgets).await)
    }

    #[instrument(skip(self))]
    pub async fn validate_budget_period(
        &self,
        family_id: i32,
        category_id: Option<i32>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<()> {
        validate_window(start, end)?;
        self.ensure_period_free("validate_budget_period", family_id, category_id, start, end, None)
            .await
    }

    /// Recomputes the spent amount, surfacing ledger failures.
    #[instrument(skip(self))]
    pub async fn recalculate_budget_spent(&self, id: i32) -> Result<Budget> {
        let budget = self.load("recalculate_budget_spent", id).await?;
        let resynced = self
            .recalculator()
            .resync_strict("recalculate_budget_spent", budget)
            .await?;
        Ok(resynced.budget)
    }

    /// Recomputes every budget of a family. Individual failures are reported
    /// to the observer and counted.
    #[instrument(skip(self))]
    pub async fn recalculate_all(&self, family_id: i32) -> Result<RecalculationSummary> {
        let mut budgets = with_deadline("get_all", self.config.call_timeout, self.budgets.get_all(family_id))
            .await
            .map_err(|e| e.in_storage("recalculate_all"))?;
        sort_by_window(&mut budgets);

        let recalculator = self.recalculator();
        let mut summary = RecalculationSummary::default();
        for budget in budgets {
            summary.checked += 1;
            let budget_id = budget.id;
            match recalculator.resync_strict("recalculate_all", budget).await {
                Ok(resynced) if resynced.changed => summary.rewritten += 1,
                Ok(_) => {}
                Err(e) => {
                    self.observer.recalculation_failed("recalculate_all", budget_id, &e);
                    summary.failed += 1;
                }
            }
        }

        info!(
            checked = summary.checked,
            rewritten = summary.rewritten,
            failed = summary.failed,
            "Recalculated family budgets"
        );
        Ok(summary)
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(EngineError::NameInvalid);
    }
    Ok(())
}

fn validate_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(EngineError::AmountInvalid(amount));
    }
    Ok(())
}

fn validate_window(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if end < start {
        return Err(EngineError::PeriodInvalid { start, end });
    }
    Ok(())
}
