use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, CardGroup, Organization};
use serde_json::Value;
use tower::{Service, ServiceExt};

const AUTH: &str = "Basic YTpi";

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, AUTH)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, AUTH)
        .body(String::new())
        .unwrap()
}

async fn call<S>(app: &mut S, request: Request<String>) -> axum::response::Response
where
    S: Service<Request<String>, Response = axum::response::Response, Error = std::convert::Infallible>,
{
    app.ready().await.unwrap().call(request).await.unwrap()
}

// --- auth ---

#[tokio::test]
async fn missing_auth_returns_401() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/organizations")
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(r#"{"name":"Acme"}"#.to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- organizations ---

#[tokio::test]
async fn create_organization_returns_201() {
    let resp = app()
        .oneshot(json_request("POST", "/api/organizations", r#"{"name":"Acme"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let org: Organization = body_json(resp).await;
    assert_eq!(org.name, "Acme");
}

#[tokio::test]
async fn duplicate_organization_returns_409() {
    let mut app = app().into_service();
    let first = call(&mut app, json_request("POST", "/api/organizations", r#"{"name":"Acme"}"#)).await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let second = call(&mut app, json_request("POST", "/api/organizations", r#"{"name":"Acme"}"#)).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn create_organization_malformed_json_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/api/organizations", r#"{"title":1}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- resources under a missing organization ---

#[tokio::test]
async fn skill_for_unknown_org_returns_404() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/organizations/999/skills",
            r#"{"name":"s","components":[]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_unknown_activity_provider_returns_404() {
    let resp = app()
        .oneshot(empty_request("DELETE", "/api/organizations/1/activity-providers/2"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_unknown_card_group_returns_404() {
    let resp = app()
        .oneshot(json_request(
            "PUT",
            "/api/card-groups/42",
            r#"{"name":"g","cardIds":[],"organization":{"id":1}}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- cards and groups ---

#[tokio::test]
async fn cards_land_in_default_group_and_groups_update() {
    let mut app = app().into_service();

    let resp = call(&mut app, json_request("POST", "/api/organizations", r#"{"name":"Acme"}"#)).await;
    let org: Organization = body_json(resp).await;
    let org_id = org.id;

    // two cards
    let mut card_ids = Vec::new();
    for title in ["One", "Two"] {
        let body = format!(
            r#"{{"configuration":{{}},"organization":{{"id":{org_id}}},"template":{{"id":332}},"title":"{title}","description":null,"summary":null}}"#
        );
        let resp = call(&mut app, json_request("POST", "/api/cards", &body)).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let card: Value = body_json(resp).await;
        card_ids.push(card["id"].as_u64().unwrap());
    }

    // unknown template is rejected
    let body = format!(
        r#"{{"configuration":{{}},"organization":{{"id":{org_id}}},"template":{{"id":1}},"title":"x","description":null,"summary":null}}"#
    );
    let resp = call(&mut app, json_request("POST", "/api/cards", &body)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // default group lists both cards
    let resp = call(
        &mut app,
        empty_request("GET", &format!("/api/organizations/{org_id}/card-groups/?name=ws-activity")),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let listing: Value = body_json(resp).await;
    let results = listing["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    let parent: CardGroup = serde_json::from_value(results[0].clone()).unwrap();
    assert_eq!(parent.card_ids, card_ids);

    // new group with the first card
    let body = format!(
        r#"{{"name":"quizzes","cardIds":[{}],"organization":{{"id":{org_id}}}}}"#,
        card_ids[0]
    );
    let resp = call(&mut app, json_request("POST", "/api/card-groups", &body)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // same name again conflicts
    let resp = call(&mut app, json_request("POST", "/api/card-groups", &body)).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // replace parent membership
    let body = format!(
        r#"{{"name":"ws-activity","cardIds":[{}],"organization":{{"id":{org_id}}}}}"#,
        card_ids[1]
    );
    let resp = call(&mut app, json_request("PUT", &format!("/api/card-groups/{}", parent.id), &body)).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    let resp = call(&mut app, empty_request("GET", &format!("/api/card-groups/{}", parent.id))).await;
    let updated: CardGroup = body_json(resp).await;
    assert_eq!(updated.card_ids, vec![card_ids[1]]);

    // unfiltered listing has both groups
    let resp = call(
        &mut app,
        empty_request("GET", &format!("/api/organizations/{org_id}/card-groups/")),
    )
    .await;
    let listing: Value = body_json(resp).await;
    assert_eq!(listing["results"].as_array().unwrap().len(), 2);
}

// --- activity providers ---

#[tokio::test]
async fn activity_provider_lifecycle() {
    let mut app = app().into_service();

    let resp = call(&mut app, json_request("POST", "/api/organizations", r#"{"name":"Acme"}"#)).await;
    let org: Organization = body_json(resp).await;

    let resp = call(
        &mut app,
        json_request(
            "POST",
            &format!("/api/organizations/{}/activity-providers", org.id),
            r#"{"name":"LMS","key":"k","secret":"s","active":true,"rootAccess":true}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let provider: Value = body_json(resp).await;
    assert_eq!(provider["rootAccess"], true);
    let id = provider["id"].as_u64().unwrap();

    let uri = format!("/api/organizations/{}/activity-providers/{id}", org.id);
    let resp = call(&mut app, empty_request("DELETE", &uri)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = call(&mut app, empty_request("DELETE", &uri)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- memberships ---

#[tokio::test]
async fn membership_rejects_unknown_role() {
    let mut app = app().into_service();

    let resp = call(&mut app, json_request("POST", "/api/organizations", r#"{"name":"Acme"}"#)).await;
    let org: Organization = body_json(resp).await;

    let body = |role: &str| {
        format!(
            r#"{{"user":{{"name":"Ada","email":"ada@example.com"}},"organization":{{"id":{}}},"role":"{role}","invitationUrlTemplate":"t"}}"#,
            org.id
        )
    };
    let resp = call(&mut app, json_request("POST", "/api/memberships", &body("owner"))).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let resp = call(&mut app, json_request("POST", "/api/memberships", &body("guest"))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
