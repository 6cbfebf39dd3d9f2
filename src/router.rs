use crate::handlers::{
    budgets::{
        check_budget_limits, create_budget, delete_budget, get_active_budgets, get_budget,
        get_budget_status, get_budget_utilization, get_budgets, get_budgets_by_category,
        recalculate_budget_spent, update_budget, update_budget_spent, validate_budget_period,
    },
    health::health_check,
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let request_timeout = state.request_timeout;

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Family scoped budget routes
        .route(
            "/api/v1/families/:family_id/budgets",
            post(create_budget).get(get_budgets),
        )
        .route("/api/v1/families/:family_id/budgets/active", get(get_active_budgets))
        .route("/api/v1/families/:family_id/budgets/check-limit", get(check_budget_limits))
        .route(
            "/api/v1/families/:family_id/budgets/validate-period",
            post(validate_budget_period),
        )
        .route(
            "/api/v1/families/:family_id/categories/:category_id/budgets",
            get(get_budgets_by_category),
        )
        // Single budget routes
        .route(
            "/api/v1/budgets/:budget_id",
            get(get_budget).put(update_budget).delete(delete_budget),
        )
        .route("/api/v1/budgets/:budget_id/spent", post(update_budget_spent))
        .route("/api/v1/budgets/:budget_id/recalculate", post(recalculate_budget_spent))
        .route("/api/v1/budgets/:budget_id/status", get(get_budget_status))
        .route("/api/v1/budgets/:budget_id/utilization", get(get_budget_utilization))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
