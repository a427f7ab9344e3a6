pub mod config;
pub mod events;
pub mod matching;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;
pub mod store;

use std::sync::Arc;

use axum::routing::{delete, get, patch, post};
use axum::Router;
use campus_shared::clients::rabbitmq::RabbitMQClient;
use campus_shared::middleware::{metrics_middleware, JwtSecret};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use config::AppConfig;
use routes::{blocks, discover, health, likes, matches, profiles, reports, requests};
use store::MatchStore;

pub struct AppState {
    pub store: Arc<dyn MatchStore>,
    pub config: AppConfig,
    /// `None` when the broker was unreachable at startup; events are skipped.
    pub rabbitmq: Option<RabbitMQClient>,
    pub metrics_handle: PrometheusHandle,
}

impl JwtSecret for AppState {
    fn jwt_secret(&self) -> &str {
        &self.config.jwt_secret
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        .route("/profiles", post(profiles::create_profile))
        .route(
            "/profiles/me",
            get(profiles::get_my_profile).patch(profiles::update_my_profile),
        )
        .route("/discover", get(discover::discover_profiles))
        .route("/discover/dating", get(discover::discover_dating))
        .route("/likes", post(likes::send_like))
        .route("/matches", get(matches::list_matches))
        .route("/matches/stats", get(matches::match_stats))
        .route("/matches/:id", delete(matches::unmatch))
        .route("/blocks", get(blocks::list_blocked))
        .route(
            "/blocks/:id",
            post(blocks::block_user).delete(blocks::unblock_user),
        )
        .route(
            "/requests",
            get(requests::list_requests).post(requests::create_request),
        )
        .route("/reports", post(reports::report_user))
        .route("/requests/mine", get(requests::my_requests))
        .route(
            "/requests/:id",
            patch(requests::update_request).delete(requests::delete_request),
        )
        .route("/requests/:id/members", get(requests::request_members))
        .route(
            "/requests/:id/join",
            post(requests::join_request).delete(requests::leave_request),
        )
        .layer(axum::middleware::from_fn(metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use campus_shared::types::auth::{Claims, UserRole};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::matching::profile::fixtures::{dater, profile, strings};
    use crate::matching::profile::Profile;
    use crate::store::InMemoryStore;

    fn app(store: Arc<InMemoryStore>) -> (Router, String) {
        let config = AppConfig::default();
        let secret = config.jwt_secret.clone();
        let state = Arc::new(AppState {
            store,
            config,
            rabbitmq: None,
            metrics_handle: PrometheusBuilder::new().build_recorder().handle(),
        });
        (build_router(state), secret)
    }

    fn bearer(user: Uuid, secret: &str) -> String {
        let token = encode(
            &Header::default(),
            &Claims::new(user, UserRole::Student, 600),
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();
        format!("Bearer {token}")
    }

    async fn call(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn like(from: Uuid, to: Uuid, kind: &str, secret: &str) -> Request<Body> {
        Request::post("/likes")
            .header("Authorization", bearer(from, secret))
            .header("Content-Type", "application/json")
            .body(Body::from(json!({ "target_id": to, "kind": kind }).to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn reciprocal_likes_over_http() {
        let store = Arc::new(InMemoryStore::new());
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        store.upsert_profile(profile(a)).await;
        store.upsert_profile(profile(b)).await;
        let (router, secret) = app(store.clone());

        let (status, body) = call(&router, like(a, b, "friend", &secret)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["matched"], false);

        let (status, body) = call(&router, like(b, a, "friend", &secret)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["matched"], true);
        assert!(body["data"]["chat_id"].is_string());

        let req = Request::get("/matches/stats")
            .header("Authorization", bearer(a, &secret))
            .body(Body::empty())
            .unwrap();
        let (_, body) = call(&router, req).await;
        assert_eq!(body["data"]["total"], 1);
        assert_eq!(body["data"]["friend"], 1);
    }

    #[tokio::test]
    async fn self_like_is_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let a = Uuid::new_v4();
        store.upsert_profile(profile(a)).await;
        let (router, secret) = app(store.clone());

        let (status, _) = call(&router, like(a, a, "friend", &secret)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(store.like_count().await, 0);
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let (router, _) = app(Arc::new(InMemoryStore::new()));
        let req = Request::get("/matches").body(Body::empty()).unwrap();
        let (status, _) = call(&router, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn discover_applies_query_filters() {
        let store = Arc::new(InMemoryStore::new());
        let viewer = Profile {
            interests: strings(&["AI/ML"]),
            ..profile(Uuid::new_v4())
        };
        let cs = Profile {
            branch: Some("CSE".into()),
            interests: strings(&["AI/ML"]),
            ..profile(Uuid::new_v4())
        };
        let mech = Profile {
            branch: Some("Mechanical".into()),
            ..profile(Uuid::new_v4())
        };
        store.upsert_profile(viewer.clone()).await;
        store.upsert_profile(cs.clone()).await;
        store.upsert_profile(mech).await;
        let (router, secret) = app(store);

        let req = Request::get("/discover?branch=CSE")
            .header("Authorization", bearer(viewer.id, &secret))
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(&router, req).await;
        assert_eq!(status, StatusCode::OK);
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["id"], cs.id.to_string());
    }

    #[tokio::test]
    async fn dating_feed_empty_for_non_dater() {
        let store = Arc::new(InMemoryStore::new());
        let viewer = profile(Uuid::new_v4());
        store.upsert_profile(viewer.clone()).await;
        store
            .upsert_profile(dater(Uuid::new_v4(), "female", "everyone"))
            .await;
        let (router, secret) = app(store);

        let req = Request::get("/discover/dating")
            .header("Authorization", bearer(viewer.id, &secret))
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(&router, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn request_join_creates_match_with_owner() {
        let store = Arc::new(InMemoryStore::new());
        let (owner, joiner) = (Uuid::new_v4(), Uuid::new_v4());
        store.upsert_profile(profile(owner)).await;
        store.upsert_profile(profile(joiner)).await;
        let (router, secret) = app(store.clone());

        let req = Request::post("/requests")
            .header("Authorization", bearer(owner, &secret))
            .header("Content-Type", "application/json")
            .body(Body::from(
                json!({ "title": "Hackathon team", "category": "project" }).to_string(),
            ))
            .unwrap();
        let (status, body) = call(&router, req).await;
        assert_eq!(status, StatusCode::OK);
        let request_id = body["data"]["id"].as_str().unwrap().to_string();

        let req = Request::post(format!("/requests/{request_id}/join"))
            .header("Authorization", bearer(joiner, &secret))
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(&router, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["match_created"], true);
        assert_eq!(store.match_count().await, 1);
        assert_eq!(store.chat_count().await, 1);
    }

    #[tokio::test]
    async fn invalid_request_payload_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let owner = Uuid::new_v4();
        store.upsert_profile(profile(owner)).await;
        let (router, secret) = app(store);

        let req = Request::post("/requests")
            .header("Authorization", bearer(owner, &secret))
            .header("Content-Type", "application/json")
            .body(Body::from(json!({ "title": "", "category": "project" }).to_string()))
            .unwrap();
        let (status, _) = call(&router, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_reports_degraded_without_broker() {
        let (router, _) = app(Arc::new(InMemoryStore::new()));
        let req = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = call(&router, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "campus-matching");
    }

    fn json_request(method: &str, uri: &str, user: Uuid, secret: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", bearer(user, secret))
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_as(uri: &str, user: Uuid, secret: &str) -> Request<Body> {
        Request::get(uri)
            .header("Authorization", bearer(user, secret))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn profile_lifecycle_over_http() {
        let store = Arc::new(InMemoryStore::new());
        let (router, secret) = app(store);
        let me = Uuid::new_v4();

        let create = json!({ "name": "Meera", "branch": "Civil", "interests": ["Robotics"] });
        let (status, body) = call(&router, json_request("POST", "/profiles", me, &secret, create.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], me.to_string());
        assert_eq!(body["data"]["onboarding_completed"], false);

        let (status, _) = call(&router, json_request("POST", "/profiles", me, &secret, create)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let patch = json!({ "onboarding_completed": true, "personality_wake_cycle": "night-owl" });
        let (status, body) = call(&router, json_request("PATCH", "/profiles/me", me, &secret, patch)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["onboarding_completed"], true);
        assert_eq!(body["data"]["branch"], "Civil");

        let (_, body) = call(&router, get_as("/profiles/me", me, &secret)).await;
        assert_eq!(body["data"]["personality_wake_cycle"], "night-owl");

        let bad = json!({ "personality_social_level": 42 });
        let (status, _) = call(&router, json_request("PATCH", "/profiles/me", me, &secret, bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn blocked_list_and_reports() {
        let store = Arc::new(InMemoryStore::new());
        let (me, them) = (Uuid::new_v4(), Uuid::new_v4());
        store.upsert_profile(profile(me)).await;
        store.upsert_profile(profile(them)).await;
        let (router, secret) = app(store.clone());

        let req = Request::post(format!("/blocks/{them}"))
            .header("Authorization", bearer(me, &secret))
            .body(Body::empty())
            .unwrap();
        call(&router, req).await;
        let (status, body) = call(&router, get_as("/blocks", me, &secret)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["id"], them.to_string());

        let report = json!({ "reported_id": them, "reason": "spam links" });
        let (status, _) = call(&router, json_request("POST", "/reports", me, &secret, report)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(store.report_count().await, 1);

        let own = json!({ "reported_id": me, "reason": "oops" });
        let (status, _) = call(&router, json_request("POST", "/reports", me, &secret, own)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn owner_manages_request_over_http() {
        let store = Arc::new(InMemoryStore::new());
        let (owner, member, late) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        for id in [owner, member, late] {
            store.upsert_profile(profile(id)).await;
        }
        let (router, secret) = app(store.clone());

        let create = json!({ "title": "Badminton doubles", "category": "sports" });
        let (_, body) = call(&router, json_request("POST", "/requests", owner, &secret, create)).await;
        let request_id = body["data"]["id"].as_str().unwrap().to_string();

        let join = Request::post(format!("/requests/{request_id}/join"))
            .header("Authorization", bearer(member, &secret))
            .body(Body::empty())
            .unwrap();
        call(&router, join).await;

        let (_, body) = call(&router, get_as(&format!("/requests/{request_id}/members"), late, &secret)).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["id"], member.to_string());

        let close = json!({ "status": "closed" });
        let uri = format!("/requests/{request_id}");
        let (status, _) = call(&router, json_request("PATCH", &uri, member, &secret, close.clone())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, body) = call(&router, json_request("PATCH", &uri, owner, &secret, close)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "closed");

        let join = Request::post(format!("/requests/{request_id}/join"))
            .header("Authorization", bearer(late, &secret))
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(&router, join).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "E4002");

        let (_, body) = call(&router, get_as("/requests/mine", owner, &secret)).await;
        assert_eq!(body["data"][0]["member_count"], 1);

        let delete = Request::delete(&uri)
            .header("Authorization", bearer(owner, &secret))
            .body(Body::empty())
            .unwrap();
        let (status, _) = call(&router, delete).await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = call(&router, get_as("/requests/mine", owner, &secret)).await;
        assert_eq!(body["data"], json!([]));
    }
}
