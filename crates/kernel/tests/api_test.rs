#![allow(clippy::unwrap_used, clippy::expect_used)]
//! End-to-end API tests driven through the real router.

mod common;

use axum::http::{Method, StatusCode, header};
use serde_json::{Value, json};

use common::{FRONTEND_URL, PUBLIC_URL, TestApp, response_json};
use leadflow_test_utils::{STRONG_PASSWORD, assert, target_body, test_lead, unique_name, user_body};

async fn create_target(app: &TestApp, token: &str, name: &str) -> Value {
    let response = app.post("/targets", Some(token), target_body(name)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    response_json(response).await
}

async fn create_lead(app: &TestApp, body: Value) -> Value {
    let response = app.post("/leads", None, body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    response_json(response).await
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn lead_list_filters_sorts_and_paginates() {
    const T1: i64 = 1_700_000_000;
    let app = TestApp::new().await;
    let token = app.staff_token().await;

    let mut matching = Vec::new();
    for i in 0..5 {
        let lead = create_lead(&app, test_lead(&format!("Lead {i}")).body()).await;
        matching.push(lead["id"].as_i64().unwrap());
    }
    for id in &matching[..2] {
        let response = app
            .patch(&format!("/leads/{id}/status"), &token, json!({"status": "processing"}))
            .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    let cancelled = create_lead(&app, test_lead("Cancelled").body()).await;
    app.patch(
        &format!("/leads/{}/status", cancelled["id"]),
        &token,
        json!({"status": "cancelled"}),
    )
    .await;
    let too_old = create_lead(&app, test_lead("Too Old").body()).await;

    let mut stamps: Vec<(i64, i64)> = matching
        .iter()
        .enumerate()
        .map(|(offset, id)| (*id, T1 + offset as i64 * 60))
        .collect();
    stamps.push((cancelled["id"].as_i64().unwrap(), T1 + 30));
    stamps.push((too_old["id"].as_i64().unwrap(), T1 - 3_600));
    for (id, created_at) in stamps {
        sqlx::query("UPDATE leads SET created_at = ? WHERE id = ?")
            .bind(created_at)
            .bind(id)
            .execute(&app.db)
            .await
            .unwrap();
    }

    let uri = "/leads?status=new,processing\
        &created_from=2023-11-14T22:13:20Z&created_to=2023-11-14T22:23:20Z\
        &page=1&size=2&sort_by=created_at:desc";
    let response = app.get(uri, &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = response_json(response).await;

    assert::item_count(&page, 2);
    assert_eq!(page["items"][0]["id"].as_i64(), Some(matching[4]));
    assert_eq!(page["items"][1]["id"].as_i64(), Some(matching[3]));
    assert::json_eq(
        &page["pagination"],
        &json!({
            "page": 1,
            "size": 2,
            "total": 5,
            "total_pages": 3,
            "has_next": true,
            "has_prev": false,
        }),
    );
}

#[tokio::test]
async fn lead_list_filters_by_target() {
    let app = TestApp::new().await;
    let token = app.staff_token().await;
    let target = create_target(&app, &token, "Spring Campaign").await;
    let target_id: uuid::Uuid = target["id"].as_str().unwrap().parse().unwrap();

    create_lead(&app, test_lead("Attributed").from_target(target_id).body()).await;
    create_lead(&app, test_lead("Walk In").body()).await;

    let page = response_json(app.get(&format!("/leads?target_id={target_id}"), &token).await).await;
    assert::item_count(&page, 1);
    assert_eq!(page["items"][0]["full_name"], "Attributed");
    assert_eq!(page["items"][0]["target_id"], target["id"]);
}

#[tokio::test]
async fn empty_list_reports_zero_pages() {
    let app = TestApp::new().await;
    let token = app.staff_token().await;

    let page = response_json(app.get("/deals", &token).await).await;
    assert::item_count(&page, 0);
    assert_eq!(page["pagination"]["total"], 0);
    assert_eq!(page["pagination"]["total_pages"], 0);
    assert_eq!(page["pagination"]["has_next"], false);
}

#[tokio::test]
async fn bad_list_parameters_are_rejected() {
    let app = TestApp::new().await;
    let token = app.staff_token().await;

    for uri in [
        "/leads?sort_by=hashed_password",
        "/leads?sort_by=created_at:sideways",
        "/leads?status=won",
        "/leads?page=0",
        "/leads?size=500",
        "/leads?created_from=2024-02-01T00:00:00Z&created_to=2024-01-01T00:00:00Z",
        "/leads?created_from=last-week",
    ] {
        let response = app.get(uri, &token).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert::has_key(&response_json(response).await, "error");
    }
}

#[tokio::test]
async fn contact_search_matches_name_or_phone() {
    let app = TestApp::new().await;
    let token = app.staff_token().await;

    create_lead(&app, test_lead("Grace Hopper").with_phone("+15550001").body()).await;
    create_lead(&app, test_lead("Alan Turing").with_phone("+44777").body()).await;

    let by_name = response_json(app.get("/contacts?q=HOPPER", &token).await).await;
    assert::item_count(&by_name, 1);
    assert_eq!(by_name["items"][0]["full_name"], "Grace Hopper");

    let by_phone = response_json(app.get("/contacts?q=44777", &token).await).await;
    assert::item_count(&by_phone, 1);
    assert_eq!(by_phone["items"][0]["full_name"], "Alan Turing");
}

// =============================================================================
// Targets and clicks
// =============================================================================

#[tokio::test]
async fn target_summary_reports_link_and_counters() {
    let app = TestApp::new().await;
    let token = app.staff_token().await;

    let created = create_target(&app, &token, "Instagram Ads").await;
    let id = created["id"].as_str().unwrap().to_string();

    let response = app.get(&format!("/targets/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let target = response_json(response).await;
    assert_eq!(target["name"], "Instagram Ads");
    assert_eq!(target["url"], format!("{PUBLIC_URL}/c/{id}"));
    assert::contains(target["url"].as_str().unwrap(), &id);
    assert_eq!(target["clicks"], 0);
    assert_eq!(target["leads"], 0);

    let click = app
        .call(Method::GET, &format!("/c/{id}"), None, None)
        .await;
    assert_eq!(click.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        click.headers()[header::LOCATION],
        format!("{FRONTEND_URL}/leads/?target_id={id}").as_str()
    );

    create_lead(&app, test_lead("Clicked Through").from_target(id.parse().unwrap()).body()).await;

    let target = response_json(app.get(&format!("/targets/{id}"), &token).await).await;
    assert_eq!(target["clicks"], 1);
    assert_eq!(target["leads"], 1);
}

#[tokio::test]
async fn unknown_targets_are_not_found() {
    let app = TestApp::new().await;
    let missing = uuid::Uuid::now_v7();

    let click = app
        .call(Method::GET, &format!("/c/{missing}"), None, None)
        .await;
    assert_eq!(click.status(), StatusCode::NOT_FOUND);

    let lead = app
        .post("/leads", None, test_lead("Lost").from_target(missing).body())
        .await;
    assert_eq!(lead.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Leads, comments and deals
// =============================================================================

#[tokio::test]
async fn creating_a_lead_also_creates_a_contact() {
    let app = TestApp::new().await;
    let token = app.staff_token().await;

    let lead = create_lead(&app, test_lead("Katherine Johnson").body()).await;
    assert_eq!(lead["status"], "new");

    let contacts = response_json(app.get("/contacts", &token).await).await;
    assert::item_count(&contacts, 1);
    assert_eq!(contacts["items"][0]["lead_id"], lead["id"]);
    assert_eq!(contacts["items"][0]["email"], lead["email"]);
}

#[tokio::test]
async fn lead_status_and_comments() {
    let app = TestApp::new().await;
    let token = app.staff_token().await;
    let lead = create_lead(&app, test_lead("Margaret Hamilton").body()).await;
    let other = create_lead(&app, test_lead("Someone Else").body()).await;
    let lead_id = lead["id"].as_i64().unwrap();

    let response = app
        .patch(&format!("/leads/{lead_id}/status"), &token, json!({"status": "processing"}))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let fetched = response_json(app.get(&format!("/leads/{lead_id}"), &token).await).await;
    assert_eq!(fetched["status"], "processing");

    let response = app
        .post(
            &format!("/leads/{lead_id}/comments"),
            Some(&token),
            json!({"comment": "Called, no answer"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let comment = response_json(response).await;
    let comment_id = comment["id"].as_i64().unwrap();

    let listed = response_json(app.get(&format!("/leads/{lead_id}/comments"), &token).await).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    // The comment does not belong to the other lead
    let wrong = app
        .get(&format!("/leads/{}/comments/{comment_id}", other["id"]), &token)
        .await;
    assert_eq!(wrong.status(), StatusCode::NOT_FOUND);
    let wrong = app
        .delete(&format!("/leads/{}/comments/{comment_id}", other["id"]), &token)
        .await;
    assert_eq!(wrong.status(), StatusCode::NOT_FOUND);

    let removed = app
        .delete(&format!("/leads/{lead_id}/comments/{comment_id}"), &token)
        .await;
    assert_eq!(removed.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn deal_creation_moves_lead_to_deal() {
    let app = TestApp::new().await;
    let token = app.staff_token().await;
    let lead = create_lead(&app, test_lead("Ada Lovelace").body()).await;

    let response = app
        .post("/deals", Some(&token), json!({"lead_id": lead["id"], "deal_sum": 1250.5}))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let deal = response_json(response).await;
    assert_eq!(deal["status"], "processing");
    assert_eq!(deal["deal_sum"], 1250.5);

    let fetched = response_json(app.get(&format!("/leads/{}", lead["id"]), &token).await).await;
    assert_eq!(fetched["status"], "deal");

    let by_id = response_json(app.get(&format!("/deals?q={}", deal["id"]), &token).await).await;
    assert::item_count(&by_id, 1);

    let missing = app
        .post("/deals", Some(&token), json!({"lead_id": 9999, "deal_sum": 1.0}))
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = TestApp::new().await;

    let response = app.call(Method::GET, "/leads", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));

    let response = app.get("/leads", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_rejects_bad_credentials_uniformly() {
    let app = TestApp::new().await;
    let username = unique_name("ada");
    app.create_user(&username, STRONG_PASSWORD, false).await;

    let missing_form = app.call(Method::POST, "/auth/token", None, None).await;
    assert!(missing_form.status().is_client_error());

    let wrong = login_status(&app, &username, "Wr0ng!Password").await;
    let unknown = login_status(&app, "nobody", STRONG_PASSWORD).await;
    assert_eq!(wrong.0, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.0, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.1, unknown.1);
}

async fn login_status(app: &TestApp, username: &str, password: &str) -> (StatusCode, Value) {
    let response = app
        .request(
            axum::http::Request::post("/auth/token")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(axum::body::Body::from(format!(
                    "username={username}&password={}",
                    password.replace('!', "%21")
                )))
                .unwrap(),
        )
        .await;
    (response.status(), response_json(response).await)
}

#[tokio::test]
async fn token_kinds_are_not_interchangeable() {
    let app = TestApp::new().await;
    let username = unique_name("grace");
    app.create_user(&username, STRONG_PASSWORD, false).await;
    let pair = app.login(&username, STRONG_PASSWORD).await;
    assert_eq!(pair.token_type, "Bearer");

    let me = app.get("/auth/me", &pair.access_token).await;
    assert_eq!(me.status(), StatusCode::OK);
    let me = response_json(me).await;
    assert_eq!(me["username"], username.as_str());
    assert!(me.get("hashed_password").is_none());

    // Refresh token where an access token is required
    let response = app.get("/auth/me", &pair.refresh_token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Access token where a refresh token is required
    let response = app
        .post("/auth/refresh", None, json!({"refresh_token": pair.access_token}))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .post("/auth/refresh", None, json!({"refresh_token": pair.refresh_token}))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let refreshed = response_json(response).await;
    assert::has_key(&refreshed, "access_token");
    assert::has_key(&refreshed, "refresh_token");
}

#[tokio::test]
async fn tokens_of_deleted_users_stop_working() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let username = unique_name("temp");
    let user = app.create_user(&username, STRONG_PASSWORD, false).await;
    let pair = app.login(&username, STRONG_PASSWORD).await;

    let response = app.delete(&format!("/users/{}", user.id), &admin).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.get("/auth/me", &pair.access_token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let response = app
        .post("/auth/refresh", None, json!({"refresh_token": pair.refresh_token}))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_old_password_leaves_credential_unchanged() {
    let app = TestApp::new().await;
    let username = unique_name("hopper");
    app.create_user(&username, STRONG_PASSWORD, false).await;
    let token = app.login(&username, STRONG_PASSWORD).await.access_token;

    let response = app
        .post(
            "/auth/change-password",
            Some(&token),
            json!({"old_password": "Not!MyPassw0rd", "new_password": "N3w!Password"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Still logs in with the original password
    app.login(&username, STRONG_PASSWORD).await;
}

#[tokio::test]
async fn change_password_enforces_policy_then_applies() {
    let app = TestApp::new().await;
    let username = unique_name("lamarr");
    app.create_user(&username, STRONG_PASSWORD, false).await;
    let token = app.login(&username, STRONG_PASSWORD).await.access_token;

    let weak = app
        .post(
            "/auth/change-password",
            Some(&token),
            json!({"old_password": STRONG_PASSWORD, "new_password": "password"}),
        )
        .await;
    assert_eq!(weak.status(), StatusCode::BAD_REQUEST);

    let ok = app
        .post(
            "/auth/change-password",
            Some(&token),
            json!({"old_password": STRONG_PASSWORD, "new_password": "N3w!Password"}),
        )
        .await;
    assert_eq!(ok.status(), StatusCode::NO_CONTENT);

    let (status, _) = login_status(&app, &username, STRONG_PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    app.login(&username, "N3w!Password").await;
}

// =============================================================================
// User administration
// =============================================================================

#[tokio::test]
async fn only_superusers_manage_users() {
    let app = TestApp::new().await;
    let staff = app.staff_token().await;
    let admin = app.admin_token().await;
    let username = unique_name("newbie");

    let forbidden = app
        .post("/users", Some(&staff), user_body(&username, STRONG_PASSWORD, false))
        .await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let created = app
        .post("/users", Some(&admin), user_body(&username, STRONG_PASSWORD, false))
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);

    let duplicate = app
        .post("/users", Some(&admin), user_body(&username, STRONG_PASSWORD, false))
        .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let weak = app
        .post("/users", Some(&admin), user_body(&unique_name("weak"), "short", false))
        .await;
    assert_eq!(weak.status(), StatusCode::BAD_REQUEST);

    let admins = response_json(app.get("/users?is_superuser=true", &staff).await).await;
    assert::item_count(&admins, 1);
}

// =============================================================================
// Telegram bot
// =============================================================================

#[tokio::test]
async fn bot_registers_and_updates_telegram_users() {
    let app = TestApp::new().await;
    let token = app.staff_token().await;
    let target = create_target(&app, &token, "Telegram Channel").await;

    let created = app
        .bot_call(Method::POST, "/telegram", Some(json!({"user_id": 555})))
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    assert_eq!(response_json(created).await["lang"], "ru");

    let duplicate = app
        .bot_call(Method::POST, "/telegram", Some(json!({"user_id": 555})))
        .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let lang = app
        .bot_call(Method::PATCH, "/telegram/555", Some(json!({"lang": "EN"})))
        .await;
    assert_eq!(lang.status(), StatusCode::NO_CONTENT);

    let assigned = app
        .bot_call(
            Method::PATCH,
            "/telegram/555/assign-company",
            Some(json!({"company_id": target["id"]})),
        )
        .await;
    assert_eq!(assigned.status(), StatusCode::NO_CONTENT);

    let user = response_json(app.bot_call(Method::GET, "/telegram/555", None).await).await;
    assert_eq!(user["lang"], "en");
    assert_eq!(user["company_id"], target["id"]);

    // Staff may read too
    let read = app.get("/telegram/555", &token).await;
    assert_eq!(read.status(), StatusCode::OK);

    let deleted = app.bot_call(Method::DELETE, "/telegram/555", None).await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
    let gone = app.bot_call(Method::GET, "/telegram/555", None).await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bot_routes_require_the_shared_secret() {
    let app = TestApp::new().await;
    let token = app.staff_token().await;

    let response = app
        .post("/telegram", Some(&token), json!({"user_id": 1}))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn health_reports_components() {
    let app = TestApp::new().await;
    let response = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], true);
    assert_eq!(body["cache_stats"]["l2_enabled"], false);
}
