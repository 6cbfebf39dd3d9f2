use axum::{http::StatusCode, response::Json};
use common::{BudgetDto, BudgetStatusDto, BudgetUtilizationDto, ErrorResponse};
use engine::{Budget, BudgetStatus, BudgetUtilization, EngineError, ErrorKind};
use tracing::{error, warn};

pub fn budget_to_dto(budget: Budget) -> BudgetDto {
    BudgetDto {
        id: budget.id,
        family_id: budget.family_id,
        name: budget.name,
        amount: budget.amount,
        spent: budget.spent,
        period: budget.period.to_string(),
        category_id: budget.category_id,
        start_date: budget.start_date,
        end_date: budget.end_date,
        is_active: budget.is_active,
    }
}

pub fn status_to_dto(status: BudgetStatus) -> BudgetStatusDto {
    BudgetStatusDto {
        budget_id: status.budget_id,
        budget_name: status.budget_name,
        budget_amount: status.budget_amount,
        spent_amount: status.spent_amount,
        remaining_amount: status.remaining_amount,
        utilization_percent: status.utilization_percent,
        is_over_budget: status.is_over_budget,
        is_critical_limit: status.is_critical_limit,
        is_near_limit: status.is_near_limit,
        status: status.status.to_string(),
        days_total: status.days_total,
        days_elapsed: status.days_elapsed,
        days_remaining: status.days_remaining,
        daily_budget: status.daily_budget,
        daily_spent: status.daily_spent,
        projected_overrun: status.projected_overrun,
    }
}

pub fn utilization_to_dto(utilization: BudgetUtilization) -> BudgetUtilizationDto {
    BudgetUtilizationDto {
        budget_id: utilization.budget_id,
        utilization_percent: utilization.utilization_percent,
        status: utilization.status.to_string(),
        spending_velocity: utilization.spending_velocity,
        projected_completion_date: utilization.projected_completion_date,
        days_remaining: utilization.days_remaining,
        recommendations: utilization.recommendations,
    }
}

pub fn status_code(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::AmountInvalid | ErrorKind::PeriodInvalid | ErrorKind::NameInvalid => {
            StatusCode::BAD_REQUEST
        }
        ErrorKind::OverlapExists | ErrorKind::AlreadyExceeded => StatusCode::CONFLICT,
        ErrorKind::InsufficientFunds => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::CalculationFailed => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
    }
}

/// Maps an engine error to the HTTP error envelope.
///
/// Internal failures are logged and replaced by a generic message.
pub fn engine_error(action: &str, err: EngineError) -> (StatusCode, Json<ErrorResponse>) {
    let kind = err.kind();
    let status = status_code(kind);

    let message = if status.is_server_error() {
        error!("Failed to {}: {}", action, err);
        format!("Failed to {}", action)
    } else {
        warn!("Rejected request to {}: {}", action, err);
        err.to_string()
    };

    (status, Json(ErrorResponse::new(message, kind.code())))
}

pub fn validation_error(message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(message, "VALIDATION_ERROR")),
    )
}
