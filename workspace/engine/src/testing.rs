use chrono::{NaiveDate, Utc};
use model::entities::budget::BudgetPeriod;
use rust_decimal::Decimal;
use std::sync::Mutex;

use crate::error::{EngineError, ErrorKind};
use crate::resync::RecalcObserver;
use crate::store::Budget;

pub fn d(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Active monthly budget of family 1 with nothing spent.
pub fn budget(
    id: i32,
    name: &str,
    category_id: Option<i32>,
    amount: Decimal,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Budget {
    let now = Utc::now();
    Budget {
        id,
        family_id: 1,
        name: name.to_string(),
        amount,
        spent: Decimal::ZERO,
        period: BudgetPeriod::Monthly,
        category_id,
        start_date,
        end_date,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObservedFailure {
    pub operation: &'static str,
    pub budget_id: i32,
    pub kind: ErrorKind,
}

#[derive(Debug, Default)]
pub struct CollectingObserver {
    events: Mutex<Vec<ObservedFailure>>,
}

impl CollectingObserver {
    pub fn events(&self) -> Vec<ObservedFailure> {
        self.events.lock().unwrap().clone()
    }
}

impl RecalcObserver for CollectingObserver {
    fn recalculation_failed(&self, operation: &'static str, budget_id: i32, error: &EngineError) {
        self.events.lock().unwrap().push(ObservedFailure {
            operation,
            budget_id,
            kind: error.kind(),
        });
    }
}
