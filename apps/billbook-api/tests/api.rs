//! Router tests: real handlers, in-memory SQLite, no network.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use billbook_api::auth::CodeSender;
use billbook_api::{build_router, ApiConfig, ApiError, AppState};
use billbook_core::{Customer, Product, Role, StaffMember};
use billbook_db::{Database, DbConfig};

const ADMIN_PHONE: &str = "9876500000";
const SALES_PHONE: &str = "9876500001";

#[derive(Default)]
struct CapturingSender {
    codes: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl CodeSender for CapturingSender {
    async fn send(&self, phone: &str, code: &str) -> Result<(), ApiError> {
        self.codes
            .lock()
            .unwrap()
            .push((phone.to_string(), code.to_string()));
        Ok(())
    }
}

impl CapturingSender {
    fn last_code(&self) -> String {
        self.codes.lock().unwrap().last().unwrap().1.clone()
    }
}

struct TestApp {
    router: Router,
    sender: Arc<CapturingSender>,
    db: Database,
}

fn staff(phone: &str, role: Role) -> StaffMember {
    StaffMember {
        id: uuid::Uuid::new_v4().to_string(),
        name: format!("{} user", role),
        phone: phone.to_string(),
        role,
        is_active: true,
        created_at: Utc::now(),
    }
}

fn product(id: &str, sku: &str, price_paise: i64, tax_rate_bps: u32) -> Product {
    let now = Utc::now();
    Product {
        id: id.to_string(),
        sku: sku.to_string(),
        name: format!("Item {}", sku),
        category: None,
        hsn_code: None,
        price_paise,
        tax_rate_bps,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

fn customer(id: &str, phone: &str, state_code: &str, points: i64) -> Customer {
    let now = Utc::now();
    Customer {
        id: id.to_string(),
        name: "Asha Rao".to_string(),
        phone: phone.to_string(),
        email: None,
        state_code: Some(state_code.to_string()),
        gstin: None,
        loyalty_points: points,
        created_at: now,
        updated_at: now,
    }
}

async fn setup() -> TestApp {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();

    db.staff().insert(&staff(ADMIN_PHONE, Role::Admin)).await.unwrap();
    db.staff().insert(&staff(SALES_PHONE, Role::Sales)).await.unwrap();

    // ₹500 @ 5% and ₹50 @ 12%
    db.products().insert(&product("p-500", "SPA-01", 50_000, 500)).await.unwrap();
    db.products().insert(&product("p-50", "HAIR-01", 5_000, 1200)).await.unwrap();

    db.customers().insert(&customer("c-local", "9845012345", "29", 100)).await.unwrap();
    db.customers().insert(&customer("c-mh", "9845012346", "27", 0)).await.unwrap();

    let sender = Arc::new(CapturingSender::default());
    let state = AppState::new(ApiConfig::default(), db.clone(), sender.clone());

    TestApp {
        router: build_router(state),
        sender,
        db,
    }
}

impl TestApp {
    async fn call(&self, method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn login(&self, phone: &str) -> String {
        let (status, ticket) = self
            .call(Method::POST, "/auth/challenge", None, Some(json!({ "phone": phone })))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, session) = self
            .call(
                Method::POST,
                "/auth/verify",
                None,
                Some(json!({
                    "challengeId": ticket["challengeId"],
                    "code": self.sender.last_code(),
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", session);
        session["accessToken"].as_str().unwrap().to_string()
    }

    async fn open_session(&self, token: &str) -> String {
        let (status, view) = self.call(Method::POST, "/sessions", Some(token), None).await;
        assert_eq!(status, StatusCode::CREATED);
        view["sessionId"].as_str().unwrap().to_string()
    }

    async fn add_item(&self, token: &str, session: &str, product_id: &str) -> Value {
        let (status, view) = self
            .call(
                Method::POST,
                &format!("/sessions/{}/items", session),
                Some(token),
                Some(json!({ "productId": product_id })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", view);
        view
    }

    /// Row id of the product's line in a session view.
    fn row_id(view: &Value, product_id: &str) -> String {
        view["cart"]["items"]
            .as_array()
            .unwrap()
            .iter()
            .find(|i| i["productId"] == product_id)
            .unwrap()["id"]
            .as_str()
            .unwrap()
            .to_string()
    }
}

#[tokio::test]
async fn health_is_open() {
    let app = setup().await;
    let (status, body) = app.call(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], true);
    assert_eq!(body["store"]["stateCode"], "29");
}

#[tokio::test]
async fn protected_routes_need_a_token() {
    let app = setup().await;

    let (status, body) = app.call(Method::POST, "/sessions", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = app
        .call(Method::GET, "/products", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_code_is_rejected() {
    let app = setup().await;
    let (_, ticket) = app
        .call(Method::POST, "/auth/challenge", None, Some(json!({ "phone": SALES_PHONE })))
        .await;
    let wrong = if app.sender.last_code() == "111111" { "222222" } else { "111111" };

    let (status, body) = app
        .call(
            Method::POST,
            "/auth/verify",
            None,
            Some(json!({ "challengeId": ticket["challengeId"], "code": wrong })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn roles_gate_routes() {
    let app = setup().await;
    let sales = app.login(SALES_PHONE).await;

    let (status, body) = app.call(Method::GET, "/invoices", Some(&sales), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, _) = app
        .call(
            Method::POST,
            "/products",
            Some(&sales),
            Some(json!({ "sku": "X-1", "name": "X", "price": 10, "taxRate": 18 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.call(Method::GET, "/products?q=spa", Some(&sales), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn checkout_computes_totals_and_deducts_points() {
    let app = setup().await;
    let token = app.login(SALES_PHONE).await;
    let session = app.open_session(&token).await;

    let view = app.add_item(&token, &session, "p-500").await;
    let spa = TestApp::row_id(&view, "p-500");
    let view = app.add_item(&token, &session, "p-50").await;
    let hair = TestApp::row_id(&view, "p-50");

    // Numbers and strings go through the same parser
    let (status, _) = app
        .call(
            Method::PUT,
            &format!("/sessions/{}/items/{}/quantity", session, hair),
            Some(&token),
            Some(json!({ "quantity": "3" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call(
            Method::PUT,
            &format!("/sessions/{}/items/{}/discount", session, spa),
            Some(&token),
            Some(json!({ "discountPercent": 10 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, view) = app
        .call(
            Method::PUT,
            &format!("/sessions/{}/customer", session),
            Some(&token),
            Some(json!({ "customerId": "c-local" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["cart"]["jurisdiction"], "same_state");

    let (status, view) = app
        .call(
            Method::PUT,
            &format!("/sessions/{}/redemption", session),
            Some(&token),
            Some(json!({ "points": 40 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["totals"]["subTotal"], 60_000);
    assert_eq!(view["totals"]["cgst"], 2_025);
    assert_eq!(view["totals"]["igst"], 0);
    assert_eq!(view["totals"]["grandTotal"], 64_050);
    assert_eq!(view["totals"]["payableAfterRedemption"], 60_050);

    let (status, invoice) = app
        .call(Method::POST, &format!("/sessions/{}/checkout", session), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", invoice);
    assert_eq!(invoice["lines"].as_array().unwrap().len(), 2);
    assert_eq!(invoice["totals"]["loyaltyPointsRedeemed"], 40);

    let balance = app.db.customers().get("c-local").await.unwrap().loyalty_points;
    assert_eq!(balance, 60);

    // Session is closed
    let (status, _) = app
        .call(Method::GET, &format!("/sessions/{}", session), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn interstate_customer_switches_to_igst() {
    let app = setup().await;
    let token = app.login(SALES_PHONE).await;
    let session = app.open_session(&token).await;
    app.add_item(&token, &session, "p-500").await;

    let (_, view) = app
        .call(
            Method::PUT,
            &format!("/sessions/{}/customer", session),
            Some(&token),
            Some(json!({ "customerId": "c-mh" })),
        )
        .await;
    assert_eq!(view["cart"]["jurisdiction"], "different_state");
    assert_eq!(view["totals"]["igst"], 2_500);
    assert_eq!(view["totals"]["cgst"], 0);

    let (_, view) = app
        .call(Method::DELETE, &format!("/sessions/{}/customer", session), Some(&token), None)
        .await;
    assert_eq!(view["cart"]["jurisdiction"], "same_state");
    assert_eq!(view["totals"]["cgst"], 1_250);
}

#[tokio::test]
async fn bad_input_is_rejected_not_clamped() {
    let app = setup().await;
    let token = app.login(SALES_PHONE).await;
    let session = app.open_session(&token).await;
    let view = app.add_item(&token, &session, "p-500").await;
    let row = TestApp::row_id(&view, "p-500");
    let quantity_path = format!("/sessions/{}/items/{}/quantity", session, row);

    for bad in [json!("abc"), json!(-1), json!("1.5"), json!(1000)] {
        let (status, body) = app
            .call(Method::PUT, &quantity_path, Some(&token), Some(json!({ "quantity": bad })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", bad);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    let (status, _) = app
        .call(
            Method::PUT,
            &format!("/sessions/{}/items/{}/discount", session, row),
            Some(&token),
            Some(json!({ "discountPercent": "120" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Redemption needs a customer
    let (status, _) = app
        .call(
            Method::PUT,
            &format!("/sessions/{}/redemption", session),
            Some(&token),
            Some(json!({ "points": 10 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown row
    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/sessions/{}/items/nope/quantity", session),
            Some(&token),
            Some(json!({ "quantity": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    // Zero removes the row
    let (status, view) = app
        .call(Method::PUT, &quantity_path, Some(&token), Some(json!({ "quantity": 0 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(view["cart"]["items"].as_array().unwrap().is_empty());
    assert_eq!(view["totals"]["grandTotal"], 0);

    // Empty cart cannot be checked out
    let (status, _) = app
        .call(Method::POST, &format!("/sessions/{}/checkout", session), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn hold_and_resume() {
    let app = setup().await;
    let token = app.login(SALES_PHONE).await;
    let session = app.open_session(&token).await;
    app.add_item(&token, &session, "p-50").await;
    app.add_item(&token, &session, "p-50").await;

    let (status, held) = app
        .call(Method::POST, &format!("/sessions/{}/hold", session), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(held["itemCount"], 1);

    let (status, _) = app
        .call(Method::GET, &format!("/sessions/{}", session), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = app.call(Method::GET, "/sessions/held", Some(&token), None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, view) = app
        .call(
            Method::POST,
            &format!("/sessions/held/{}/resume", session),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(view["cart"]["items"][0]["quantity"], 2);

    let (_, list) = app.call(Method::GET, "/sessions/held", Some(&token), None).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn second_redemption_of_same_points_conflicts() {
    let app = setup().await;
    let token = app.login(SALES_PHONE).await;

    let mut sessions = Vec::new();
    for _ in 0..2 {
        let session = app.open_session(&token).await;
        app.add_item(&token, &session, "p-500").await;
        app.call(
            Method::PUT,
            &format!("/sessions/{}/customer", session),
            Some(&token),
            Some(json!({ "customerId": "c-local" })),
        )
        .await;
        app.call(
            Method::PUT,
            &format!("/sessions/{}/redemption", session),
            Some(&token),
            Some(json!({ "points": 80 })),
        )
        .await;
        sessions.push(session);
    }

    let (status, _) = app
        .call(Method::POST, &format!("/sessions/{}/checkout", sessions[0]), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .call(Method::POST, &format!("/sessions/{}/checkout", sessions[1]), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    // The losing session now sees the remaining balance
    let (_, view) = app
        .call(Method::GET, &format!("/sessions/{}", sessions[1]), Some(&token), None)
        .await;
    assert_eq!(view["cart"]["loyaltyPointsAvailable"], 20);
    assert_eq!(view["totals"]["loyaltyPointsRedeemed"], 20);
}

#[tokio::test]
async fn admin_manages_catalog_and_reads_reports() {
    let app = setup().await;
    let admin = app.login(ADMIN_PHONE).await;

    let (status, created) = app
        .call(
            Method::POST,
            "/products",
            Some(&admin),
            Some(json!({
                "sku": "nail-01",
                "name": "Manicure",
                "price": "₹450.00",
                "taxRate": "18%",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    assert_eq!(created["sku"], "NAIL-01");
    assert_eq!(created["pricePaise"], 45_000);
    assert_eq!(created["taxRateBps"], 1_800);

    let (status, body) = app
        .call(
            Method::POST,
            "/products",
            Some(&admin),
            Some(json!({ "sku": "NAIL-01", "name": "Again", "price": 1, "taxRate": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let session = app.open_session(&admin).await;
    app.add_item(&admin, &session, created["id"].as_str().unwrap()).await;
    let (status, invoice) = app
        .call(Method::POST, &format!("/sessions/{}/checkout", session), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, list) = app.call(Method::GET, "/invoices", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list[0]["id"], invoice["id"]);

    let (status, report) = app
        .call(Method::GET, "/reports/tax-summary", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["invoiceCount"], 1);
    assert_eq!(report["cgst"], 4_050);
    assert_eq!(report["totalTax"], 8_100);

    // Deactivated products cannot be billed
    let path = format!("/products/{}", created["id"].as_str().unwrap());
    let (status, _) = app.call(Method::DELETE, &path, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let session = app.open_session(&admin).await;
    let (status, _) = app
        .call(
            Method::POST,
            &format!("/sessions/{}/items", session),
            Some(&admin),
            Some(json!({ "productId": created["id"] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn customers_are_normalized_and_unique() {
    let app = setup().await;
    let token = app.login(SALES_PHONE).await;

    let (status, created) = app
        .call(
            Method::POST,
            "/customers",
            Some(&token),
            Some(json!({ "name": "Ravi", "phone": "+91 99000-11223", "stateCode": "33" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    assert_eq!(created["phone"], "9900011223");
    assert_eq!(created["loyaltyPoints"], 0);

    let (status, _) = app
        .call(
            Method::POST,
            "/customers",
            Some(&token),
            Some(json!({ "name": "Ravi again", "phone": "9900011223" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, found) = app
        .call(Method::GET, "/customers?phone=99000%2011223", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found[0]["id"], created["id"]);
}

#[tokio::test]
async fn only_admin_adds_staff() {
    let app = setup().await;
    let admin = app.login(ADMIN_PHONE).await;
    let sales = app.login(SALES_PHONE).await;

    let body = json!({ "name": "Kiran", "phone": "9876500002", "role": "manager" });
    let (status, _) = app.call(Method::POST, "/staff", Some(&sales), Some(body.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = app.call(Method::POST, "/staff", Some(&admin), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    assert_eq!(created["role"], "manager");

    // The new manager can sign in and read reports
    let manager = app.login("9876500002").await;
    let (status, me) = app.call(Method::GET, "/staff/me", Some(&manager), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["name"], "Kiran");

    let (status, _) = app.call(Method::GET, "/invoices", Some(&manager), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn concurrent_checkouts_write_one_invoice() {
    let app = setup().await;
    let token = app.login(SALES_PHONE).await;
    let session = app.open_session(&token).await;
    app.add_item(&token, &session, "p-500").await;
    app.call(
        Method::PUT,
        &format!("/sessions/{}/customer", session),
        Some(&token),
        Some(json!({ "customerId": "c-local" })),
    )
    .await;
    app.call(
        Method::PUT,
        &format!("/sessions/{}/redemption", session),
        Some(&token),
        Some(json!({ "points": 30 })),
    )
    .await;

    let path = format!("/sessions/{}/checkout", session);
    let ((first, _), (second, _)) = tokio::join!(
        app.call(Method::POST, &path, Some(&token), None),
        app.call(Method::POST, &path, Some(&token), None),
    );

    let mut statuses = [first, second];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::NOT_FOUND]);

    assert_eq!(app.db.invoices().recent(10).await.unwrap().len(), 1);
    let balance = app.db.customers().get("c-local").await.unwrap().loyalty_points;
    assert_eq!(balance, 70);
}

#[tokio::test]
async fn mutation_after_checkout_is_not_found() {
    let app = setup().await;
    let token = app.login(SALES_PHONE).await;
    let session = app.open_session(&token).await;
    app.add_item(&token, &session, "p-50").await;

    let (status, _) = app
        .call(Method::POST, &format!("/sessions/{}/checkout", session), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .call(
            Method::POST,
            &format!("/sessions/{}/items", session),
            Some(&token),
            Some(json!({ "productId": "p-500" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn held_cart_resumes_once() {
    let app = setup().await;
    let token = app.login(SALES_PHONE).await;
    let session = app.open_session(&token).await;
    app.add_item(&token, &session, "p-50").await;

    let (status, _) = app
        .call(Method::POST, &format!("/sessions/{}/hold", session), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let path = format!("/sessions/held/{}/resume", session);
    let ((first, _), (second, _)) = tokio::join!(
        app.call(Method::POST, &path, Some(&token), None),
        app.call(Method::POST, &path, Some(&token), None),
    );

    let mut statuses = [first, second];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::NOT_FOUND]);

    let (_, health) = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(health["openSessions"], 1);
}
