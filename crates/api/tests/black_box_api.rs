use chrono::{Duration as ChronoDuration, Utc};
use invoicefy_api::app::{AppServices, build_app};
use invoicefy_auth::{JwtClaims, Role};
use invoicefy_core::{TenantId, UserId};
use invoicefy_infra::config::AppConfig;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory store, ephemeral port.
        let mut config = AppConfig::default();
        config.auth.jwt_secret = JWT_SECRET.to_string();
        config.auth.bcrypt_cost = 4;
        let app = build_app(&config, AppServices::in_memory(&config.auth));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(tenant_id: TenantId, roles: Vec<Role>) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: UserId::new(),
        tenant_id,
        roles,
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn create_customer(client: &reqwest::Client, srv: &TestServer, token: &str, name: &str) -> String {
    let res = client
        .post(srv.url("/customers"))
        .bearer_auth(token)
        .json(&json!({ "name": name, "email": "billing@globex.test", "city": "Pune" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    body["id"].as_str().unwrap().to_string()
}

fn invoice_body(customer_id: &str) -> Value {
    json!({
        "customer_id": customer_id,
        "invoice_date": "2024-03-01",
        "due_date": "2024-03-31",
        "items": [
            { "name": "Widget", "quantity": 2, "unit_price": "50.00" },
            { "name": "Gadget", "quantity": 1, "unit_price": 25.005 }
        ],
        "discount_percentage": 10,
        "tax_percentage": 18,
        "subtotal": "1.00",
        "total": "1.00"
    })
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for path in ["/whoami", "/customers", "/invoices", "/dashboard/stats"] {
        let res = client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{path}");
    }

    let res = client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn tenant_context_is_derived_from_token() {
    let srv = TestServer::spawn().await;

    let tenant_id = TenantId::new();
    let token = mint_jwt(tenant_id, vec![Role::admin()]);

    let client = reqwest::Client::new();
    let res = client.get(srv.url("/whoami")).bearer_auth(token).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["tenant_id"].as_str().unwrap(), tenant_id.to_string());
    assert!(body["roles"].as_array().unwrap().iter().any(|r| r == "admin"));
}

#[tokio::test]
async fn register_then_login_issues_working_tokens() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/auth/register"))
        .json(&json!({ "email": "Owner@Shop.test", "password": "secret1", "shop_name": "Corner Store" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let registered: Value = res.json().await.unwrap();
    assert_eq!(registered["user"]["email"], "owner@shop.test");

    let token = registered["token"].as_str().unwrap();
    let shop: Value = client
        .get(srv.url("/shop"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(shop["shop_name"], "Corner Store");

    let res = client
        .post(srv.url("/auth/register"))
        .json(&json!({ "email": "owner@shop.test", "password": "secret2", "shop_name": "Copycat" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client
        .post(srv.url("/auth/login"))
        .json(&json!({ "email": "owner@shop.test", "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_credentials");

    let res = client
        .post(srv.url("/auth/login"))
        .json(&json!({ "email": "owner@shop.test", "password": "secret1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let login: Value = res.json().await.unwrap();
    assert_eq!(login["user"]["tenant_id"], registered["user"]["tenant_id"]);
}

#[tokio::test]
async fn invoice_lifecycle_create_status_update_delete() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(TenantId::new(), vec![Role::admin()]);
    let customer_id = create_customer(&client, &srv, &token, "Globex").await;

    let res = client
        .post(srv.url("/invoices"))
        .bearer_auth(&token)
        .json(&invoice_body(&customer_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let invoice: Value = res.json().await.unwrap();
    let id = invoice["id"].as_str().unwrap().to_string();

    // Client totals are ignored; everything is recomputed.
    assert_eq!(invoice["invoice_number"], "INV-000001");
    assert_eq!(invoice["status"], "unpaid");
    assert_eq!(invoice["subtotal"], "125.01");
    assert_eq!(invoice["discount_amount"], "12.50");
    assert_eq!(invoice["tax_amount"], "20.25");
    assert_eq!(invoice["total"], "132.76");
    assert_eq!(invoice["items"][1]["amount"], "25.01");
    assert_eq!(invoice["customer_name"], "Globex");
    assert_eq!(invoice["version"], 1);

    let res = client
        .patch(srv.url(&format!("/invoices/{id}/status?status=paid&expected_version=1")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let paid: Value = res.json().await.unwrap();
    assert_eq!(paid["status"], "paid");
    assert_eq!(paid["total"], "132.76");
    assert_eq!(paid["version"], 2);

    // Stale version token.
    let res = client
        .patch(srv.url(&format!("/invoices/{id}/status?status=overdue&expected_version=1")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client
        .patch(srv.url(&format!("/invoices/{id}/status?status=refunded")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_status");

    let mut update = invoice_body(&customer_id);
    update["items"] = json!([{ "name": "Widget", "quantity": 1, "unit_price": 100 }]);
    update["tax_percentage"] = json!(10);
    let res = client
        .put(srv.url(&format!("/invoices/{id}")))
        .bearer_auth(&token)
        .json(&update)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["total"], "99.00");
    assert_eq!(updated["status"], "paid");

    let stats: Value = client
        .get(srv.url("/dashboard/stats"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["total_invoices"], 1);
    assert_eq!(stats["paid_revenue"], "99.00");

    let res = client
        .delete(srv.url(&format!("/invoices/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(srv.url(&format!("/invoices/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_invoices_are_rejected_and_not_saved() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(TenantId::new(), vec![Role::admin()]);
    let customer_id = create_customer(&client, &srv, &token, "Globex").await;

    let mut empty = invoice_body(&customer_id);
    empty["items"] = json!([]);
    let mut bad_percentage = invoice_body(&customer_id);
    bad_percentage["discount_percentage"] = json!(150);
    let mut no_customer = invoice_body(&customer_id);
    no_customer["customer_id"] = json!(UserId::new().to_string());

    for (body, code) in [
        (empty, "empty_items"),
        (bad_percentage, "invalid_percentage"),
        (no_customer, "missing_customer"),
    ] {
        let res = client
            .post(srv.url("/invoices"))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let err: Value = res.json().await.unwrap();
        assert_eq!(err["error"], code);
    }

    let listed: Value = client
        .get(srv.url("/invoices"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn preview_computes_totals_without_saving() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(TenantId::new(), vec![Role::admin()]);

    let res = client
        .post(srv.url("/invoices/preview"))
        .bearer_auth(&token)
        .json(&json!({
            "items": [{ "name": "Service", "quantity": 1, "unit_price": 100 }],
            "discount_percentage": 10,
            "tax_percentage": 10
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["subtotal"], "100.00");
    assert_eq!(body["discount_amount"], "10.00");
    assert_eq!(body["tax_amount"], "9.00");
    assert_eq!(body["total"], "99.00");
}

#[tokio::test]
async fn oversized_totals_are_rejected_with_a_json_error() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(TenantId::new(), vec![Role::admin()]);
    let customer_id = create_customer(&client, &srv, &token, "Globex").await;

    let items: Vec<Value> = (0..800)
        .map(|i| json!({ "name": format!("Bulk {i}"), "quantity": "1000000000000", "unit_price": "1000000000000" }))
        .collect();

    let res = client
        .post(srv.url("/invoices/preview"))
        .bearer_auth(&token)
        .json(&json!({ "items": items, "discount_percentage": 100, "tax_percentage": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "amount_too_large");

    let mut body = invoice_body(&customer_id);
    body["items"] = json!(items);
    let res = client
        .post(srv.url("/invoices"))
        .bearer_auth(&token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Nothing was saved and the server is still answering.
    let stats: Value = client
        .get(srv.url("/dashboard/stats"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["total_invoices"], 0);
}

#[tokio::test]
async fn unauthorized_access_blocked_for_writes() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(TenantId::new(), vec![Role::new("viewer")]);

    let res = client
        .post(srv.url("/customers"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Acme" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client.get(srv.url("/customers")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn tenant_isolation_blocks_cross_tenant_reads_and_writes() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let owner = mint_jwt(TenantId::new(), vec![Role::admin()]);
    let stranger = mint_jwt(TenantId::new(), vec![Role::admin()]);

    let customer_id = create_customer(&client, &srv, &owner, "Globex").await;

    let res = client
        .get(srv.url(&format!("/customers/{customer_id}")))
        .bearer_auth(&stranger)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .delete(srv.url(&format!("/customers/{customer_id}")))
        .bearer_auth(&stranger)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Another tenant's customer cannot be invoiced.
    let res = client
        .post(srv.url("/invoices"))
        .bearer_auth(&stranger)
        .json(&invoice_body(&customer_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let listed: Value = client
        .get(srv.url("/customers"))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn product_prices_are_snapshotted_onto_invoices() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(TenantId::new(), vec![Role::admin()]);
    let customer_id = create_customer(&client, &srv, &token, "Globex").await;

    let product: Value = client
        .post(srv.url("/products"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Consulting hour", "price": 40, "unit": "hr" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let product_id = product["id"].as_str().unwrap();
    assert_eq!(product["price"], "40.00");

    let mut body = invoice_body(&customer_id);
    body["items"] = json!([{ "product_id": product_id, "quantity": 3 }]);
    body["discount_percentage"] = json!(0);
    body["tax_percentage"] = json!(0);
    let invoice: Value = client
        .post(srv.url("/invoices"))
        .bearer_auth(&token)
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(invoice["total"], "120.00");

    let res = client
        .put(srv.url(&format!("/products/{product_id}")))
        .bearer_auth(&token)
        .json(&json!({ "name": "Consulting hour", "price": 55 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let id = invoice["id"].as_str().unwrap();
    let reloaded: Value = client
        .get(srv.url(&format!("/invoices/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reloaded["items"][0]["unit_price"], "40.00");
    assert_eq!(reloaded["total"], "120.00");
}
