use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use dreadarr::config::Config;
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Default API key seeded by migration (must match m20240101_initial.rs)
const DEFAULT_API_KEY: &str = "dreadarr_default_api_key_please_regenerate";

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_url = "sqlite::memory:".to_string();

    let state = dreadarr::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    dreadarr::api::router(state).await
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn authed(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("X-Api-Key", DEFAULT_API_KEY)
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn test_auth_endpoints() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(get("/api/watchmode/status"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/watchmode/status")
                .header("X-Api-Key", "wrong-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/watchmode/status")
                .header("X-Api-Key", DEFAULT_API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_flow() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({"username": "admin", "password": "wrong"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({"username": "admin", "password": "password"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["username"], "admin");
    assert_eq!(json["data"]["is_admin"], true);
    assert!(json["data"]["api_key"].is_string());
}

#[tokio::test]
async fn test_content_browse_and_detail() {
    let app = spawn_app().await;

    let response = app.clone().oneshot(get("/api/content")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"].as_array().unwrap().len(), 0);

    let response = app
        .clone()
        .oneshot(authed(
            "POST",
            "/api/admin/content",
            serde_json::json!({
                "title": "The Thing",
                "release_year": 1982,
                "critics_rating": 8.4,
                "users_rating": 8.2,
                "average_rating": 8.3,
                "content_type": "movie"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created = body_json(response).await;
    let id = created["data"]["id"].as_i64().unwrap();
    assert_eq!(created["data"]["title"], "The Thing");

    let response = app
        .clone()
        .oneshot(get(&format!("/api/content/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["release_year"], 1982);

    let response = app
        .clone()
        .oneshot(get("/api/content/999999"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_content_filtering_and_sorting() {
    let app = spawn_app().await;

    for (title, year, rating) in [
        ("Halloween", 1978, 8.0),
        ("Candyman", 1992, 7.0),
        ("Hereditary", 2018, 7.8),
    ] {
        let response = app
            .clone()
            .oneshot(authed(
                "POST",
                "/api/admin/content",
                serde_json::json!({
                    "title": title,
                    "release_year": year,
                    "average_rating": rating,
                    "content_type": "movie"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // Decade token keeps only the 90s entry.
    let response = app
        .clone()
        .oneshot(get("/api/content?year=1990s"))
        .await
        .unwrap();
    let json = body_json(response).await;
    let titles: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Candyman"]);

    // Unknown sort keys fall back to rating descending.
    let response = app
        .clone()
        .oneshot(get("/api/content?sortBy=bogus:desc"))
        .await
        .unwrap();
    let json = body_json(response).await;
    let titles: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Halloween", "Hereditary", "Candyman"]);

    let response = app
        .clone()
        .oneshot(get("/api/content?minRating=7.5"))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_hidden_content_visibility() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(authed(
            "POST",
            "/api/admin/content",
            serde_json::json!({"title": "Banned Tape", "content_type": "movie"}),
        ))
        .await
        .unwrap();
    let id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(authed(
            "POST",
            &format!("/api/admin/content/{id}/hide"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Anonymous browsing never sees hidden rows, even when asked to.
    let response = app
        .clone()
        .oneshot(get("/api/content?includeHidden=true"))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 0);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/content?includeHidden=true")
                .header("X-Api-Key", DEFAULT_API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["hidden"], true);
}

#[tokio::test]
async fn test_subgenres_crud() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(authed(
            "POST",
            "/api/admin/subgenres",
            serde_json::json!({"name": "Slasher"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let slasher_id = json["data"]["id"].as_i64().unwrap();
    assert_eq!(json["data"]["slug"], "slasher");

    // Duplicate slug rejected.
    let response = app
        .clone()
        .oneshot(authed(
            "POST",
            "/api/admin/subgenres",
            serde_json::json!({"name": "Slasher"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(authed(
            "POST",
            "/api/admin/subgenres",
            serde_json::json!({"name": "Found Footage"}),
        ))
        .await
        .unwrap();
    let found_footage_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = app.clone().oneshot(get("/api/subgenres")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);

    let response = app
        .clone()
        .oneshot(authed(
            "PUT",
            "/api/admin/subgenres/reorder",
            serde_json::json!({"ordered_ids": [found_footage_id, slasher_id]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["id"].as_i64().unwrap(), found_footage_id);

    let response = app
        .clone()
        .oneshot(authed(
            "PUT",
            &format!("/api/admin/subgenres/{slasher_id}"),
            serde_json::json!({"is_active": false}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Inactive subgenres disappear from the public list.
    let response = app.clone().oneshot(get("/api/subgenres")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/admin/subgenres/{found_footage_id}"))
                .header("X-Api-Key", DEFAULT_API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_usage_status_and_override() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/watchmode/status")
                .header("X-Api-Key", DEFAULT_API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["used"], 0);
    assert_eq!(json["data"]["limit"], 1000);
    assert_eq!(json["data"]["remaining"], 1000);

    let response = app
        .clone()
        .oneshot(authed(
            "PUT",
            "/api/admin/watchmode/usage",
            serde_json::json!({"count": 250}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["used"], 250);
    assert_eq!(json["data"]["remaining"], 750);

    let response = app
        .clone()
        .oneshot(authed(
            "PUT",
            "/api/admin/watchmode/usage",
            serde_json::json!({"count": -1}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_feedback_and_issues() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/feedback")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({"message": "More 80s slashers please"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/feedback")
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::json!({"message": "   "}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(get("/api/admin/feedback"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/admin/feedback")
                .header("X-Api-Key", DEFAULT_API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["category"], "general");

    // Issues against a missing catalog entry are rejected.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/issues")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({"content_id": 4242, "description": "Wrong poster"})
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(authed(
            "POST",
            "/api/admin/content",
            serde_json::json!({"title": "Suspiria", "content_type": "movie"}),
        ))
        .await
        .unwrap();
    let content_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/issues")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({"content_id": content_id, "description": "Wrong poster"})
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let issue_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(authed(
            "PUT",
            &format!("/api/admin/issues/{issue_id}"),
            serde_json::json!({"status": "resolved"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "resolved");

    let response = app
        .clone()
        .oneshot(authed(
            "PUT",
            &format!("/api/admin/issues/{issue_id}"),
            serde_json::json!({"status": "bogus"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_watchlist_requires_session() {
    let app = spawn_app().await;

    let response = app.clone().oneshot(get("/api/watchlist")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_watchlist_flow() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({"username": "admin", "password": "password"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get("set-cookie")
        .expect("login should set a session cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(authed(
            "POST",
            "/api/admin/content",
            serde_json::json!({"title": "Nosferatu", "release_year": 1922, "content_type": "movie"}),
        ))
        .await
        .unwrap();
    let content_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/watchlist")
                .header("Cookie", &cookie)
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({"content_id": content_id}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/watchlist")
                .header("Cookie", &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["title"], "Nosferatu");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/watchlist/{content_id}"))
                .header("Cookie", &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/watchlist/{content_id}"))
                .header("Cookie", &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_content_subgenre_row_management() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(authed(
            "POST",
            "/api/admin/content",
            serde_json::json!({
                "title": "Suspiria",
                "release_year": 1977,
                "content_type": "movie"
            }),
        ))
        .await
        .unwrap();
    let id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(authed(
            "POST",
            "/api/admin/subgenres",
            serde_json::json!({"name": "Giallo"}),
        ))
        .await
        .unwrap();
    let subgenre_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(authed(
            "GET",
            &format!("/api/admin/content/{id}/subgenres"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 0);

    // Tag with a single row, leaving any existing tags alone.
    let response = app
        .clone()
        .oneshot(authed(
            "POST",
            &format!("/api/admin/content/{id}/subgenres"),
            serde_json::json!({"subgenre_id": subgenre_id}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(authed(
            "GET",
            &format!("/api/admin/content/{id}/subgenres"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["name"], "Giallo");

    let response = app
        .clone()
        .oneshot(authed(
            "POST",
            &format!("/api/admin/content/{id}/subgenres"),
            serde_json::json!({"subgenre_id": 9999}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(authed(
            "DELETE",
            &format!("/api/admin/content/{id}/subgenres/{subgenre_id}"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Removing an absent tag is a 404, not a silent success.
    let response = app
        .clone()
        .oneshot(authed(
            "DELETE",
            &format!("/api/admin/content/{id}/subgenres/{subgenre_id}"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(authed(
            "GET",
            &format!("/api/admin/content/{id}/subgenres"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_content_platform_listing() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(authed(
            "POST",
            "/api/admin/content",
            serde_json::json!({
                "title": "Nosferatu",
                "release_year": 1922,
                "content_type": "movie"
            }),
        ))
        .await
        .unwrap();
    let id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(authed(
            "GET",
            &format!("/api/admin/content/{id}/platforms"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 0);

    let response = app
        .clone()
        .oneshot(authed(
            "GET",
            "/api/admin/content/999999/platforms",
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_system_status() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(get("/api/system/status"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(authed("GET", "/api/system/status", serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["database"], "ok");
    assert!(json["data"]["uptime_seconds"].is_u64());
    assert!(json["data"]["version"].is_string());
}

#[tokio::test]
async fn test_admin_content_validation() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(authed(
            "POST",
            "/api/admin/content",
            serde_json::json!({"title": "", "content_type": "movie"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(authed(
            "POST",
            "/api/admin/content",
            serde_json::json!({"title": "X", "content_type": "documentary"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Movies cannot carry series-only fields.
    let response = app
        .clone()
        .oneshot(authed(
            "POST",
            "/api/admin/content",
            serde_json::json!({"title": "X", "content_type": "movie", "seasons": 2}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
