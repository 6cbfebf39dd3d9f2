//! Common transport-layer types of the budget API.
//! Request and response payloads are kept here so clients can deserialize
//! API responses without depending on the engine.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Generic API response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success flag
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

/// Error payload returned with every non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Machine readable error code, e.g. `OVERLAP_EXISTS`
    pub code: String,
    /// Always false
    pub success: bool,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            success: false,
        }
    }
}

// ===================== Budgets =====================

/// Request body for creating a budget.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CreateBudgetRequest {
    pub name: String,
    /// Spending ceiling, must be positive
    #[schema(value_type = String, example = "500.00")]
    pub amount: Decimal,
    /// One of daily, weekly, monthly, yearly, custom
    pub period: String,
    /// Omit for a family-wide budget
    pub category_id: Option<i32>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Request body for a partial budget update.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Default)]
pub struct UpdateBudgetRequest {
    pub name: Option<String>,
    #[schema(value_type = Option<String>)]
    pub amount: Option<Decimal>,
    pub period: Option<String>,
    /// Moves the budget to this category
    pub category_id: Option<i32>,
    /// Turns the budget family-wide; wins over `category_id`
    pub clear_category: Option<bool>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

/// Request body for adjusting the cached spent amount.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SpentDeltaRequest {
    /// Added to the spent amount, may be negative
    #[schema(value_type = String, example = "-12.50")]
    pub delta: Decimal,
}

/// Request body for checking a window against existing budgets.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ValidatePeriodRequest {
    pub category_id: Option<i32>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Budget response model.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct BudgetDto {
    pub id: i32,
    pub family_id: i32,
    pub name: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
    #[schema(value_type = String)]
    pub spent: Decimal,
    pub period: String,
    pub category_id: Option<i32>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
}

/// Consumption and pacing of a budget.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct BudgetStatusDto {
    pub budget_id: i32,
    pub budget_name: String,
    #[schema(value_type = String)]
    pub budget_amount: Decimal,
    #[schema(value_type = String)]
    pub spent_amount: Decimal,
    #[schema(value_type = String)]
    pub remaining_amount: Decimal,
    pub utilization_percent: f64,
    pub is_over_budget: bool,
    pub is_critical_limit: bool,
    pub is_near_limit: bool,
    /// healthy, near_limit, critical or over_budget
    pub status: String,
    pub days_total: i64,
    pub days_elapsed: i64,
    pub days_remaining: i64,
    #[schema(value_type = String)]
    pub daily_budget: Decimal,
    #[schema(value_type = String)]
    pub daily_spent: Decimal,
    #[schema(value_type = String)]
    pub projected_overrun: Decimal,
}

/// Spending pace with advice.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct BudgetUtilizationDto {
    pub budget_id: i32,
    pub utilization_percent: f64,
    pub status: String,
    #[schema(value_type = String)]
    pub spending_velocity: Decimal,
    pub projected_completion_date: Option<NaiveDate>,
    pub days_remaining: i64,
    pub recommendations: Vec<String>,
}

/// Outcome of a successful limit check.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct LimitCheckDto {
    pub category_id: Option<i32>,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub allowed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amounts_serialize_as_strings() {
        let request = SpentDeltaRequest {
            delta: Decimal::new(-1250, 2),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["delta"], "-12.50");

        let parsed: SpentDeltaRequest = serde_json::from_str(r#"{"delta":"7.5"}"#).unwrap();
        assert_eq!(parsed.delta, Decimal::new(75, 1));
    }

    #[test]
    fn test_update_request_fields_are_optional() {
        let parsed: UpdateBudgetRequest = serde_json::from_str(r#"{"amount":"600"}"#).unwrap();
        assert_eq!(parsed.amount, Some(Decimal::new(600, 0)));
        assert_eq!(parsed.name, None);
        assert_eq!(parsed.clear_category, None);
    }

    #[test]
    fn test_error_response_is_never_successful() {
        let err = ErrorResponse::new("Budget not found: 3", "BUDGET_NOT_FOUND");
        assert!(!err.success);
        assert_eq!(err.code, "BUDGET_NOT_FOUND");
    }
}
