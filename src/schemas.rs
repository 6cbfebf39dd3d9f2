use chrono::NaiveDate;
use engine::BudgetEngine;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use utoipa::{IntoParams, OpenApi, ToSchema};
use validator::Validate;

pub use common::{
    ApiResponse, BudgetDto, BudgetStatusDto, BudgetUtilizationDto, CreateBudgetRequest,
    ErrorResponse, LimitCheckDto, SpentDeltaRequest, UpdateBudgetRequest, ValidatePeriodRequest,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Budget engine over the same database
    pub engine: Arc<BudgetEngine>,
    /// Upper bound for a whole HTTP request
    pub request_timeout: Duration,
}

/// Query parameters for listing budgets
#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
pub struct BudgetListQuery {
    /// Only budgets active on this day (YYYY-MM-DD)
    pub active_on: Option<NaiveDate>,
    pub category_id: Option<i32>,
    /// daily, weekly, monthly, yearly or custom
    pub period: Option<String>,
    pub is_active: Option<bool>,
    /// Excludes budgets ending before this day
    pub date_from: Option<NaiveDate>,
    /// Excludes budgets starting after this day
    pub date_to: Option<NaiveDate>,
    #[param(value_type = Option<String>)]
    pub min_amount: Option<Decimal>,
    #[param(value_type = Option<String>)]
    pub max_amount: Option<Decimal>,
    pub is_over_budget: Option<bool>,
    pub is_near_limit: Option<bool>,
    pub has_unspent_funds: Option<bool>,
    /// Number of budgets to skip (default: 0)
    #[validate(range(max = 100000))]
    pub offset: Option<u64>,
    /// Page size (default: all)
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<u64>,
}

/// Query parameters for the active budgets endpoint
#[derive(Debug, Deserialize, IntoParams)]
pub struct ActiveBudgetsQuery {
    /// Reference day, defaults to today
    pub date: Option<NaiveDate>,
}

/// Query parameters for a limit check
#[derive(Debug, Deserialize, IntoParams)]
pub struct CheckLimitQuery {
    /// Omit to check family-wide budgets
    pub category_id: Option<i32>,
    /// Proposed expense
    #[param(value_type = String)]
    pub amount: Decimal,
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::budgets::create_budget,
        crate::handlers::budgets::get_budgets,
        crate::handlers::budgets::get_active_budgets,
        crate::handlers::budgets::check_budget_limits,
        crate::handlers::budgets::validate_budget_period,
        crate::handlers::budgets::get_budgets_by_category,
        crate::handlers::budgets::get_budget,
        crate::handlers::budgets::update_budget,
        crate::handlers::budgets::delete_budget,
        crate::handlers::budgets::update_budget_spent,
        crate::handlers::budgets::recalculate_budget_spent,
        crate::handlers::budgets::get_budget_status,
        crate::handlers::budgets::get_budget_utilization,
    ),
    components(
        schemas(
            ApiResponse<BudgetDto>,
            ApiResponse<Vec<BudgetDto>>,
            ApiResponse<BudgetStatusDto>,
            ApiResponse<BudgetUtilizationDto>,
            ApiResponse<LimitCheckDto>,
            ErrorResponse,
            HealthResponse,
            BudgetDto,
            BudgetStatusDto,
            BudgetUtilizationDto,
            LimitCheckDto,
            CreateBudgetRequest,
            UpdateBudgetRequest,
            SpentDeltaRequest,
            ValidatePeriodRequest,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "budgets", description = "Budget management and analytics endpoints"),
    ),
    info(
        title = "FamFin API",
        description = "Household budget tracking API - spending limits kept in sync with the family ledger",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
