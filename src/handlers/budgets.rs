use crate::helpers::converters::{
    budget_to_dto, engine_error, status_to_dto, utilization_to_dto, validation_error,
};
use crate::schemas::{
    ActiveBudgetsQuery, ApiResponse, AppState, BudgetDto, BudgetListQuery, BudgetStatusDto,
    BudgetUtilizationDto, CheckLimitQuery, CreateBudgetRequest, ErrorResponse, LimitCheckDto,
    SpentDeltaRequest, UpdateBudgetRequest, ValidatePeriodRequest,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use engine::{BudgetFilter, BudgetPatch, NewBudget};
use model::entities::budget::BudgetPeriod;
use std::str::FromStr;
use tracing::{debug, info, instrument, trace};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn parse_period(period: &str) -> Result<BudgetPeriod, ApiError> {
    BudgetPeriod::from_str(period).map_err(validation_error)
}

/// Create a new budget for a family
#[utoipa::path(
    post,
    path = "/api/v1/families/{family_id}/budgets",
    tag = "budgets",
    params(("family_id" = i32, Path, description = "Family ID")),
    request_body = CreateBudgetRequest,
    responses(
        (status = 201, description = "Budget created successfully", body = ApiResponse<BudgetDto>),
        (status = 400, description = "Invalid amount, name or date window", body = ErrorResponse),
        (status = 409, description = "Window overlaps another budget of the same scope", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_budget(
    Path(family_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<CreateBudgetRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BudgetDto>>), ApiError> {
    trace!("Entering create_budget function");
    let period = parse_period(&request.period)?;

    let new_budget = NewBudget {
        family_id,
        name: request.name,
        amount: request.amount,
        period,
        category_id: request.category_id,
        start_date: request.start_date,
        end_date: request.end_date,
    };

    let budget = state
        .engine
        .create_budget(new_budget)
        .await
        .map_err(|e| engine_error("create budget", e))?;

    info!("Budget created with ID: {}", budget.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(budget_to_dto(budget), "Budget created successfully")),
    ))
}

/// List the budgets of a family
#[utoipa::path(
    get,
    path = "/api/v1/families/{family_id}/budgets",
    tag = "budgets",
    params(("family_id" = i32, Path, description = "Family ID"), BudgetListQuery),
    responses(
        (status = 200, description = "Budgets retrieved successfully", body = ApiResponse<Vec<BudgetDto>>),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_budgets(
    Path(family_id): Path<i32>,
    Valid(Query(query)): Valid<Query<BudgetListQuery>>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<BudgetDto>>>), ApiError> {
    trace!("Entering get_budgets function");

    let filter = BudgetFilter {
        active_on: query.active_on,
        category_id: query.category_id,
        period: query.period.as_deref().map(parse_period).transpose()?,
        is_active: query.is_active,
        date_from: query.date_from,
        date_to: query.date_to,
        min_amount: query.min_amount,
        max_amount: query.max_amount,
        is_over_budget: query.is_over_budget,
        is_near_limit: query.is_near_limit,
        has_unspent_funds: query.has_unspent_funds,
        offset: query.offset.unwrap_or(0) as usize,
        limit: query.limit.map(|l| l as usize),
    };

    let budgets = state
        .engine
        .get_all_budgets(family_id, &filter)
        .await
        .map_err(|e| engine_error("retrieve budgets", e))?;

    debug!("Retrieved {} budgets for family {}", budgets.len(), family_id);
    let data = budgets.into_iter().map(budget_to_dto).collect();
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(data, "Budgets retrieved successfully")),
    ))
}

/// List the budgets active on a day
#[utoipa::path(
    get,
    path = "/api/v1/families/{family_id}/budgets/active",
    tag = "budgets",
    params(("family_id" = i32, Path, description = "Family ID"), ActiveBudgetsQuery),
    responses(
        (status = 200, description = "Active budgets retrieved successfully", body = ApiResponse<Vec<BudgetDto>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_active_budgets(
    Path(family_id): Path<i32>,
    Query(query): Query<ActiveBudgetsQuery>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<BudgetDto>>>), ApiError> {
    let date = query.date.unwrap_or_else(|| state.engine.today());
    debug!("Fetching budgets of family {} active on {}", family_id, date);

    let budgets = state
        .engine
        .get_active_budgets(family_id, date)
        .await
        .map_err(|e| engine_error("retrieve active budgets", e))?;

    let data = budgets.into_iter().map(budget_to_dto).collect();
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(data, "Active budgets retrieved successfully")),
    ))
}

/// Check whether a proposed expense fits the budgets of its scope
#[utoipa::path(
    get,
    path = "/api/v1/families/{family_id}/budgets/check-limit",
    tag = "budgets",
    params(("family_id" = i32, Path, description = "Family ID"), CheckLimitQuery),
    responses(
        (status = 200, description = "Expense fits every applicable budget", body = ApiResponse<LimitCheckDto>),
        (status = 400, description = "Invalid amount", body = ErrorResponse),
        (status = 422, description = "Expense would exceed a budget", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn check_budget_limits(
    Path(family_id): Path<i32>,
    Query(query): Query<CheckLimitQuery>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<LimitCheckDto>>), ApiError> {
    state
        .engine
        .check_budget_limits(family_id, query.category_id, query.amount)
        .await
        .map_err(|e| engine_error("check budget limits", e))?;

    let data = LimitCheckDto {
        category_id: query.category_id,
        amount: query.amount,
        allowed: true,
    };
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(data, "Expense is within budget")),
    ))
}

/// Check a date window against the existing budgets of a scope
#[utoipa::path(
    post,
    path = "/api/v1/families/{family_id}/budgets/validate-period",
    tag = "budgets",
    params(("family_id" = i32, Path, description = "Family ID")),
    request_body = ValidatePeriodRequest,
    responses(
        (status = 200, description = "Window is free", body = ApiResponse<bool>),
        (status = 400, description = "Window ends before it starts", body = ErrorResponse),
        (status = 409, description = "Window overlaps another budget of the same scope", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn validate_budget_period(
    Path(family_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<ValidatePeriodRequest>,
) -> Result<(StatusCode, Json<ApiResponse<bool>>), ApiError> {
    state
        .engine
        .validate_budget_period(family_id, request.category_id, request.start_date, request.end_date)
        .await
        .map_err(|e| engine_error("validate budget period", e))?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(true, "Budget period is available")),
    ))
}

/// List the budgets of a category
#[utoipa::path(
    get,
    path = "/api/v1/families/{family_id}/categories/{category_id}/budgets",
    tag = "budgets",
    params(
        ("family_id" = i32, Path, description = "Family ID"),
        ("category_id" = i32, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Budgets retrieved successfully", body = ApiResponse<Vec<BudgetDto>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_budgets_by_category(
    Path((family_id, category_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<BudgetDto>>>), ApiError> {
    let budgets = state
        .engine
        .get_budgets_by_category(family_id, category_id)
        .await
        .map_err(|e| engine_error("retrieve category budgets", e))?;

    let data = budgets.into_iter().map(budget_to_dto).collect();
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(data, "Budgets retrieved successfully")),
    ))
}

/// Get a budget by ID
#[utoipa::path(
    get,
    path = "/api/v1/budgets/{budget_id}",
    tag = "budgets",
    params(("budget_id" = i32, Path, description = "Budget ID")),
    responses(
        (status = 200, description = "Budget retrieved successfully", body = ApiResponse<BudgetDto>),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_budget(
    Path(budget_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<BudgetDto>>), ApiError> {
    let budget = state
        .engine
        .get_budget_by_id(budget_id)
        .await
        .map_err(|e| engine_error("retrieve budget", e))?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(budget_to_dto(budget), "Budget retrieved successfully")),
    ))
}

/// Update a budget
#[utoipa::path(
    put,
    path = "/api/v1/budgets/{budget_id}",
    tag = "budgets",
    params(("budget_id" = i32, Path, description = "Budget ID")),
    request_body = UpdateBudgetRequest,
    responses(
        (status = 200, description = "Budget updated successfully", body = ApiResponse<BudgetDto>),
        (status = 400, description = "Invalid amount, name or date window", body = ErrorResponse),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 409, description = "Overlapping window or amount below spent", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_budget(
    Path(budget_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateBudgetRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BudgetDto>>), ApiError> {
    trace!("Entering update_budget function");

    let category_id = if request.clear_category.unwrap_or(false) {
        Some(None)
    } else {
        request.category_id.map(Some)
    };

    let patch = BudgetPatch {
        name: request.name,
        amount: request.amount,
        period: request.period.as_deref().map(parse_period).transpose()?,
        category_id,
        start_date: request.start_date,
        end_date: request.end_date,
        is_active: request.is_active,
    };

    let budget = state
        .engine
        .update_budget(budget_id, patch)
        .await
        .map_err(|e| engine_error("update budget", e))?;

    info!("Budget {} updated", budget_id);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(budget_to_dto(budget), "Budget updated successfully")),
    ))
}

/// Delete a budget
#[utoipa::path(
    delete,
    path = "/api/v1/budgets/{budget_id}",
    tag = "budgets",
    params(("budget_id" = i32, Path, description = "Budget ID")),
    responses(
        (status = 200, description = "Budget deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_budget(
    Path(budget_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<String>>), ApiError> {
    state
        .engine
        .delete_budget(budget_id)
        .await
        .map_err(|e| engine_error("delete budget", e))?;

    info!("Budget {} deleted", budget_id);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(
            format!("Budget with id {} deleted successfully", budget_id),
            "Budget deleted successfully",
        )),
    ))
}

/// Adjust the cached spent amount of a budget by a delta
#[utoipa::path(
    post,
    path = "/api/v1/budgets/{budget_id}/spent",
    tag = "budgets",
    params(("budget_id" = i32, Path, description = "Budget ID")),
    request_body = SpentDeltaRequest,
    responses(
        (status = 200, description = "Spent amount adjusted", body = ApiResponse<BudgetDto>),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_budget_spent(
    Path(budget_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<SpentDeltaRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BudgetDto>>), ApiError> {
    let budget = state
        .engine
        .update_budget_spent(budget_id, request.delta)
        .await
        .map_err(|e| engine_error("update budget spent amount", e))?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(budget_to_dto(budget), "Spent amount updated successfully")),
    ))
}

/// Recompute the spent amount of a budget from the ledger
#[utoipa::path(
    post,
    path = "/api/v1/budgets/{budget_id}/recalculate",
    tag = "budgets",
    params(("budget_id" = i32, Path, description = "Budget ID")),
    responses(
        (status = 200, description = "Spent amount recalculated", body = ApiResponse<BudgetDto>),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 500, description = "Ledger query failed", body = ErrorResponse),
        (status = 504, description = "Ledger query timed out", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn recalculate_budget_spent(
    Path(budget_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<BudgetDto>>), ApiError> {
    let budget = state
        .engine
        .recalculate_budget_spent(budget_id)
        .await
        .map_err(|e| engine_error("recalculate budget", e))?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(budget_to_dto(budget), "Budget recalculated successfully")),
    ))
}

/// Get the consumption and pacing status of a budget
#[utoipa::path(
    get,
    path = "/api/v1/budgets/{budget_id}/status",
    tag = "budgets",
    params(("budget_id" = i32, Path, description = "Budget ID")),
    responses(
        (status = 200, description = "Budget status computed", body = ApiResponse<BudgetStatusDto>),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_budget_status(
    Path(budget_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<BudgetStatusDto>>), ApiError> {
    let status = state
        .engine
        .get_budget_status(budget_id)
        .await
        .map_err(|e| engine_error("compute budget status", e))?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(status_to_dto(status), "Budget status computed successfully")),
    ))
}

/// Get the spending pace, projection and recommendations of a budget
#[utoipa::path(
    get,
    path = "/api/v1/budgets/{budget_id}/utilization",
    tag = "budgets",
    params(("budget_id" = i32, Path, description = "Budget ID")),
    responses(
        (status = 200, description = "Budget utilization computed", body = ApiResponse<BudgetUtilizationDto>),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_budget_utilization(
    Path(budget_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<BudgetUtilizationDto>>), ApiError> {
    let utilization = state
        .engine
        .calculate_budget_utilization(budget_id)
        .await
        .map_err(|e| engine_error("compute budget utilization", e))?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(
            utilization_to_dto(utilization),
            "Budget utilization computed successfully",
        )),
    ))
}
