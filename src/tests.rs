#[cfg(test)]
mod integration_tests {
    use crate::router::create_router;
    use crate::schemas::{
        ApiResponse, BudgetDto, BudgetStatusDto, BudgetUtilizationDto, CreateBudgetRequest,
        ErrorResponse, HealthResponse, LimitCheckDto, SpentDeltaRequest, UpdateBudgetRequest,
        ValidatePeriodRequest,
    };
    use crate::test_utils::test_utils::{
        init_test_tracing, insert_category, insert_expense, setup_test_app, setup_test_app_state,
        TEST_FAMILY,
    };
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn january(name: &str, amount: i64, category_id: Option<i32>) -> CreateBudgetRequest {
        CreateBudgetRequest {
            name: name.to_string(),
            amount: Decimal::new(amount, 0),
            period: "monthly".to_string(),
            category_id,
            start_date: d(2024, 1, 1),
            end_date: d(2024, 1, 31),
        }
    }

    async fn create(server: &TestServer, request: &CreateBudgetRequest) -> BudgetDto {
        let response = server
            .post(&format!("/api/v1/families/{}/budgets", TEST_FAMILY))
            .json(request)
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<ApiResponse<BudgetDto>>().data
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server.get("/health").await;

        response.assert_status(StatusCode::OK);
        let body: HealthResponse = response.json();
        assert_eq!(body.status, "healthy");
        assert_eq!(body.database, "connected");
    }

    #[tokio::test]
    async fn test_create_and_get_budget() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server
            .post("/api/v1/families/1/budgets")
            .json(&january("Household", 1000, None))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<BudgetDto> = response.json();
        assert!(body.success);
        assert_eq!(body.message, "Budget created successfully");
        assert_eq!(body.data.family_id, 1);
        assert_eq!(body.data.spent, Decimal::ZERO);
        assert_eq!(body.data.period, "monthly");
        assert!(body.data.is_active);

        let response = server.get(&format!("/api/v1/budgets/{}", body.data.id)).await;
        response.assert_status(StatusCode::OK);
        let fetched: ApiResponse<BudgetDto> = response.json();
        assert_eq!(fetched.data.name, "Household");
        assert_eq!(fetched.data.amount, Decimal::new(1000, 0));
    }

    #[tokio::test]
    async fn test_create_budget_rejects_invalid_input() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server
            .post("/api/v1/families/1/budgets")
            .json(&january("Household", 0, None))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "AMOUNT_INVALID");
        assert!(!body.success);

        let response = server
            .post("/api/v1/families/1/budgets")
            .json(&CreateBudgetRequest {
                start_date: d(2024, 2, 1),
                ..january("Household", 100, None)
            })
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<ErrorResponse>().code, "PERIOD_INVALID");

        let response = server
            .post("/api/v1/families/1/budgets")
            .json(&CreateBudgetRequest {
                period: "fortnightly".to_string(),
                ..january("Household", 100, None)
            })
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<ErrorResponse>().code, "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_overlapping_budget_is_rejected() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        create(&server, &january("Household", 1000, None)).await;

        let response = server
            .post("/api/v1/families/1/budgets")
            .json(&CreateBudgetRequest {
                start_date: d(2024, 1, 15),
                end_date: d(2024, 2, 15),
                ..january("Overlap", 500, None)
            })
            .await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<ErrorResponse>().code, "OVERLAP_EXISTS");

        // Touching windows are fine
        create(
            &server,
            &CreateBudgetRequest {
                start_date: d(2024, 1, 31),
                end_date: d(2024, 2, 29),
                ..january("February", 800, None)
            },
        )
        .await;

        // Category budgets live in their own scope
        create(&server, &january("Groceries", 300, Some(7))).await;

        let response = server
            .post("/api/v1/families/1/budgets/validate-period")
            .json(&ValidatePeriodRequest {
                category_id: Some(7),
                start_date: d(2024, 1, 20),
                end_date: d(2024, 2, 10),
            })
            .await;
        response.assert_status(StatusCode::CONFLICT);

        let response = server
            .post("/api/v1/families/1/budgets/validate-period")
            .json(&ValidatePeriodRequest {
                category_id: Some(8),
                start_date: d(2024, 1, 20),
                end_date: d(2024, 2, 10),
            })
            .await;
        response.assert_status(StatusCode::OK);
        assert!(response.json::<ApiResponse<bool>>().data);
    }

    #[tokio::test]
    async fn test_budget_status_follows_ledger() {
        let _guard = init_test_tracing();
        let state = setup_test_app_state().await;
        let db = state.db.clone();
        let server = TestServer::new(create_router(state)).unwrap();

        let groceries = insert_category(&db, "Groceries").await;
        let fuel = insert_category(&db, "Fuel").await;
        let budget = create(&server, &january("Household", 1000, None)).await;

        insert_expense(&db, Some(groceries), Decimal::new(300, 0), d(2024, 1, 5)).await;
        insert_expense(&db, Some(fuel), Decimal::new(250, 0), d(2024, 1, 12)).await;
        insert_expense(&db, Some(fuel), Decimal::new(99, 0), d(2024, 2, 1)).await;

        let response = server.get(&format!("/api/v1/budgets/{}/status", budget.id)).await;
        response.assert_status(StatusCode::OK);
        let status: BudgetStatusDto = response.json::<ApiResponse<BudgetStatusDto>>().data;
        assert_eq!(status.spent_amount, Decimal::new(550, 0));
        assert_eq!(status.remaining_amount, Decimal::new(450, 0));
        assert_eq!(status.utilization_percent, 55.0);
        assert_eq!(status.status, "healthy");
        assert!(!status.is_over_budget);

        let response = server.get(&format!("/api/v1/budgets/{}/utilization", budget.id)).await;
        response.assert_status(StatusCode::OK);
        let utilization: BudgetUtilizationDto = response.json::<ApiResponse<BudgetUtilizationDto>>().data;
        assert_eq!(utilization.budget_id, budget.id);
        assert_eq!(utilization.utilization_percent, 55.0);

        let response = server.get(&format!("/api/v1/budgets/{}", budget.id)).await;
        assert_eq!(response.json::<ApiResponse<BudgetDto>>().data.spent, Decimal::new(550, 0));
    }

    #[tokio::test]
    async fn test_limit_check() {
        let state = setup_test_app_state().await;
        let db = state.db.clone();
        let server = TestServer::new(create_router(state)).unwrap();

        let groceries = insert_category(&db, "Groceries").await;
        create(&server, &january("Groceries", 500, Some(groceries))).await;
        insert_expense(&db, Some(groceries), Decimal::new(300, 0), d(2024, 1, 10)).await;

        let response = server
            .get("/api/v1/families/1/budgets/check-limit")
            .add_query_param("category_id", groceries)
            .add_query_param("amount", "150")
            .await;
        response.assert_status(StatusCode::OK);
        let check: LimitCheckDto = response.json::<ApiResponse<LimitCheckDto>>().data;
        assert!(check.allowed);

        let response = server
            .get("/api/v1/families/1/budgets/check-limit")
            .add_query_param("category_id", groceries)
            .add_query_param("amount", "250")
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.json::<ErrorResponse>().code, "INSUFFICIENT_FUNDS");

        let response = server
            .get("/api/v1/families/1/budgets/check-limit")
            .add_query_param("category_id", groceries)
            .add_query_param("amount", "79228162514264337593543950335")
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.json::<ErrorResponse>().code, "INSUFFICIENT_FUNDS");

        // No budget for the scope means no limit
        let response = server
            .get("/api/v1/families/1/budgets/check-limit")
            .add_query_param("amount", "100000")
            .await;
        response.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_update_cannot_drop_amount_below_spent() {
        let state = setup_test_app_state().await;
        let db = state.db.clone();
        let server = TestServer::new(create_router(state)).unwrap();

        let groceries = insert_category(&db, "Groceries").await;
        let budget = create(&server, &january("Groceries", 500, Some(groceries))).await;
        insert_expense(&db, Some(groceries), Decimal::new(300, 0), d(2024, 1, 10)).await;

        let response = server
            .put(&format!("/api/v1/budgets/{}", budget.id))
            .json(&UpdateBudgetRequest {
                amount: Some(Decimal::new(200, 0)),
                ..Default::default()
            })
            .await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<ErrorResponse>().code, "ALREADY_EXCEEDED");

        let response = server
            .put(&format!("/api/v1/budgets/{}", budget.id))
            .json(&UpdateBudgetRequest {
                name: Some("Food".to_string()),
                amount: Some(Decimal::new(400, 0)),
                ..Default::default()
            })
            .await;
        response.assert_status(StatusCode::OK);
        let updated = response.json::<ApiResponse<BudgetDto>>().data;
        assert_eq!(updated.name, "Food");
        assert_eq!(updated.amount, Decimal::new(400, 0));
        assert_eq!(updated.category_id, Some(groceries));
    }

    #[tokio::test]
    async fn test_spent_delta_and_recalculation() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let budget = create(&server, &january("Household", 1000, None)).await;

        let response = server
            .post(&format!("/api/v1/budgets/{}/spent", budget.id))
            .json(&SpentDeltaRequest {
                delta: Decimal::new(4250, 2),
            })
            .await;
        response.assert_status(StatusCode::OK);
        assert_eq!(
            response.json::<ApiResponse<BudgetDto>>().data.spent,
            Decimal::new(4250, 2)
        );

        // The ledger is empty, so recalculation resets the cached amount
        let response = server
            .post(&format!("/api/v1/budgets/{}/recalculate", budget.id))
            .await;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.json::<ApiResponse<BudgetDto>>().data.spent, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_list_active_and_category_budgets() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        create(&server, &january("Household", 1000, None)).await;
        create(&server, &january("Groceries", 300, Some(7))).await;
        create(
            &server,
            &CreateBudgetRequest {
                start_date: d(2024, 3, 1),
                end_date: d(2024, 3, 31),
                ..january("March groceries", 300, Some(7))
            },
        )
        .await;

        let response = server.get("/api/v1/families/1/budgets").await;
        response.assert_status(StatusCode::OK);
        let all = response.json::<ApiResponse<Vec<BudgetDto>>>().data;
        assert_eq!(all.len(), 3);

        let response = server
            .get("/api/v1/families/1/budgets")
            .add_query_param("category_id", 7)
            .add_query_param("limit", 1)
            .await;
        let page = response.json::<ApiResponse<Vec<BudgetDto>>>().data;
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "Groceries");

        let response = server.get("/api/v1/families/1/budgets/active").await;
        let active = response.json::<ApiResponse<Vec<BudgetDto>>>().data;
        assert_eq!(active.len(), 2);

        let response = server
            .get("/api/v1/families/1/budgets/active")
            .add_query_param("date", "2024-03-10")
            .await;
        let active = response.json::<ApiResponse<Vec<BudgetDto>>>().data;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "March groceries");

        let response = server.get("/api/v1/families/1/categories/7/budgets").await;
        let by_category = response.json::<ApiResponse<Vec<BudgetDto>>>().data;
        let names: Vec<_> = by_category.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Groceries", "March groceries"]);

        let response = server
            .get("/api/v1/families/1/budgets")
            .add_query_param("limit", 0)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_and_missing_budget() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let budget = create(&server, &january("Household", 1000, None)).await;

        let response = server.delete(&format!("/api/v1/budgets/{}", budget.id)).await;
        response.assert_status(StatusCode::OK);

        let response = server.get(&format!("/api/v1/budgets/{}", budget.id)).await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<ErrorResponse>().code, "BUDGET_NOT_FOUND");

        let response = server.delete(&format!("/api/v1/budgets/{}", budget.id)).await;
        response.assert_status(StatusCode::NOT_FOUND);

        let response = server.get("/api/v1/budgets/999/status").await;
        response.assert_status(StatusCode::NOT_FOUND);
    }
}
