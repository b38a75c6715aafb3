use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use delivery_dispatch::api::rest::router;
use delivery_dispatch::engine::DispatchSettings;
use delivery_dispatch::eta::RegressionEtaModel;
use delivery_dispatch::routing::StraightLineRouteProvider;
use delivery_dispatch::state::AppState;
use delivery_dispatch::store::InMemoryStore;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

fn state() -> Arc<AppState> {
    Arc::new(AppState::new(
        Arc::new(InMemoryStore::new()),
        Arc::new(StraightLineRouteProvider::new(30.0)),
        Arc::new(RegressionEtaModel::default()),
        DispatchSettings::default(),
        64,
    ))
}

fn setup() -> axum::Router {
    router(state())
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn create_driver(app: &axum::Router, name: &str, lat: f64, lng: f64) -> Value {
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/drivers",
            json!({ "name": name, "location": { "lat": lat, "lng": lng } }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    body_json(res).await
}

async fn create_delivery(app: &axum::Router) -> Value {
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/deliveries",
            json!({
                "pickup": { "lat": 14.5547, "lng": 121.0244 },
                "dropoff": { "lat": 14.5650, "lng": 121.0300 }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    body_json(res).await
}

#[tokio::test]
async fn health_returns_ok() {
    let app = setup();
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["drivers"], 0);
    assert_eq!(body["deliveries"], 0);
    assert_eq!(body["geofences"], 0);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let app = setup();
    let response = app.oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("pending_deliveries"));
}

#[tokio::test]
async fn create_driver_returns_available_driver() {
    let app = setup();
    let body = create_driver(&app, "Ana", 14.5547, 121.0244).await;

    assert_eq!(body["name"], "Ana");
    assert_eq!(body["current_load"], 0);
    assert_eq!(body["available"], true);
    assert!(!body["id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn create_driver_rejects_blank_name() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/drivers",
            json!({ "name": "  ", "location": { "lat": 14.55, "lng": 121.02 } }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_driver_rejects_out_of_range_location() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/drivers",
            json!({ "name": "Ben", "location": { "lat": 95.0, "lng": 121.02 } }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("lat/lng"));
}

#[tokio::test]
async fn list_drivers_after_creation() {
    let app = setup();
    create_driver(&app, "Ana", 14.55, 121.02).await;
    create_driver(&app, "Ben", 14.56, 121.03).await;

    let res = app.oneshot(get_request("/drivers")).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn update_driver_location() {
    let app = setup();
    let driver = create_driver(&app, "Carla", 14.55, 121.02).await;
    let id = driver["id"].as_str().unwrap();

    let res = app
        .oneshot(json_request(
            "PATCH",
            &format!("/drivers/{id}/location"),
            json!({ "location": { "lat": 14.6, "lng": 121.05 } }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["location"]["lat"], 14.6);
    assert_eq!(body["location"]["lng"], 121.05);
}

#[tokio::test]
async fn update_unknown_driver_returns_404() {
    let app = setup();
    let res = app
        .oneshot(json_request(
            "PATCH",
            &format!("/drivers/{}/location", Uuid::new_v4()),
            json!({ "location": { "lat": 14.6, "lng": 121.05 } }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_delivery_starts_pending() {
    let app = setup();
    let body = create_delivery(&app).await;

    assert_eq!(body["status"], "pending");
    assert!(body["assigned_driver"].is_null());
    assert!(body["eta_minutes"].is_null());
}

#[tokio::test]
async fn get_nonexistent_delivery_returns_404() {
    let app = setup();
    let res = app
        .oneshot(get_request(&format!("/deliveries/{}", Uuid::new_v4())))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body = body_json(res).await;
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn pending_delivery_cannot_jump_to_delivered() {
    let app = setup();
    let delivery = create_delivery(&app).await;
    let id = delivery["id"].as_str().unwrap();

    let res = app
        .oneshot(json_request(
            "PATCH",
            &format!("/deliveries/{id}/status"),
            json!({ "status": "delivered" }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn geofence_lifecycle() {
    let app = setup();
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/geofences",
            json!({
                "name": "Ayala Triangle",
                "boundary": [
                    { "lat": 14.553, "lng": 121.022 },
                    { "lat": 14.553, "lng": 121.026 },
                    { "lat": 14.557, "lng": 121.026 },
                    { "lat": 14.557, "lng": 121.022 }
                ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let geofence = body_json(res).await;
    let id = geofence["id"].as_str().unwrap().to_string();
    assert_eq!(geofence["boundary"].as_array().unwrap().len(), 5);

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/geofences/check",
            json!({ "lat": 14.5547, "lng": 121.0244 }),
        ))
        .await
        .unwrap();
    let body = body_json(res).await;
    assert_eq!(body["inside_geofence"], true);
    assert_eq!(body["geofence_name"], "Ayala Triangle");

    let res = app
        .clone()
        .oneshot(empty_request("DELETE", &format!("/geofences/{id}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .oneshot(json_request(
            "POST",
            "/geofences/check",
            json!({ "lat": 14.5547, "lng": 121.0244 }),
        ))
        .await
        .unwrap();
    let body = body_json(res).await;
    assert_eq!(body["inside_geofence"], false);
    assert!(body["geofence_name"].is_null());
}

#[tokio::test]
async fn geofence_with_two_vertices_is_rejected() {
    let app = setup();
    let res = app
        .oneshot(json_request(
            "POST",
            "/geofences",
            json!({
                "name": "Line",
                "boundary": [
                    { "lat": 14.55, "lng": 121.02 },
                    { "lat": 14.56, "lng": 121.03 }
                ]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn full_assignment_flow() {
    let app = setup();
    let driver = create_driver(&app, "Dina", 14.5540, 121.0240).await;
    let driver_id = driver["id"].as_str().unwrap().to_string();
    let delivery = create_delivery(&app).await;
    let delivery_id = delivery["id"].as_str().unwrap().to_string();

    let res = app
        .clone()
        .oneshot(empty_request("POST", "/deliveries/assign"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let report = body_json(res).await;
    assert_eq!(report["total_assigned"], 1);
    assert_eq!(report["outcomes"][0]["outcome"], "assigned");
    assert_eq!(report["outcomes"][0]["driver_id"], driver_id.as_str());
    assert!(report["outcomes"][0]["eta_minutes"].as_f64().unwrap() > 0.0);

    let res = app
        .clone()
        .oneshot(get_request(&format!("/deliveries/{delivery_id}")))
        .await
        .unwrap();
    let body = body_json(res).await;
    assert_eq!(body["status"], "assigned");
    assert_eq!(body["assigned_driver"], driver_id.as_str());

    let res = app
        .clone()
        .oneshot(get_request(&format!("/routes/{delivery_id}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let route = body_json(res).await;
    assert_eq!(route["waypoints"].as_array().unwrap().len(), 3);

    let res = app.clone().oneshot(get_request("/drivers")).await.unwrap();
    let drivers = body_json(res).await;
    assert_eq!(drivers[0]["current_load"], 1);
    assert_eq!(drivers[0]["available"], false);

    for status in ["in_transit", "delivered"] {
        let res = app
            .clone()
            .oneshot(json_request(
                "PATCH",
                &format!("/deliveries/{delivery_id}/status"),
                json!({ "status": status }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["status"], status);
    }

    let res = app.clone().oneshot(get_request("/drivers")).await.unwrap();
    let drivers = body_json(res).await;
    assert_eq!(drivers[0]["current_load"], 0);
    assert_eq!(drivers[0]["available"], true);

    let res = app
        .oneshot(get_request("/activity_logs?limit=100"))
        .await
        .unwrap();
    let body = body_json(res).await;
    let kinds: Vec<&str> = body["activity_logs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["activity_type"].as_str().unwrap())
        .collect();
    assert_eq!(kinds[0], "update_delivery");
    assert!(kinds.contains(&"assign_driver"));
    assert!(kinds.contains(&"add_driver"));
}

#[tokio::test]
async fn assign_without_drivers_leaves_delivery_pending() {
    let app = setup();
    let delivery = create_delivery(&app).await;
    let delivery_id = delivery["id"].as_str().unwrap().to_string();

    let res = app
        .clone()
        .oneshot(empty_request("POST", "/deliveries/assign"))
        .await
        .unwrap();
    let report = body_json(res).await;
    assert_eq!(report["total_assigned"], 0);
    assert_eq!(report["outcomes"][0]["outcome"], "skipped_no_driver");

    let res = app
        .oneshot(get_request(&format!("/deliveries/{delivery_id}")))
        .await
        .unwrap();
    assert_eq!(body_json(res).await["status"], "pending");
}

#[tokio::test]
async fn missing_route_returns_404() {
    let app = setup();
    let res = app
        .oneshot(get_request(&format!("/routes/{}", Uuid::new_v4())))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn suggest_route_returns_route_and_model_estimates() {
    let app = setup();
    let res = app
        .oneshot(json_request(
            "POST",
            "/route/suggest",
            json!({
                "origin": { "lat": 14.5547, "lng": 121.0244 },
                "destination": { "lat": 14.5176, "lng": 121.0509 }
            }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["route_coordinates"].as_array().unwrap().len(), 2);
    assert!(body["distance_km"].as_f64().unwrap() > 4.0);
    assert!(body["estimated_time_route"].as_f64().unwrap() > 0.0);
    assert!(body["estimated_time_model"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn activity_logs_are_limited() {
    let app = setup();
    for name in ["A", "B", "C"] {
        create_driver(&app, name, 14.55, 121.02).await;
    }

    let res = app
        .oneshot(get_request("/activity_logs?limit=2"))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    let logs = body["activity_logs"].as_array().unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0]["details"].as_str().unwrap(), "Added driver C at 14.55, 121.02");
}

#[tokio::test]
async fn driver_load_metric_follows_delivery_lifecycle() {
    let app = setup();
    let driver = create_driver(&app, "Ella", 14.5540, 121.0240).await;
    let driver_id = driver["id"].as_str().unwrap().to_string();
    let delivery = create_delivery(&app).await;
    let delivery_id = delivery["id"].as_str().unwrap().to_string();

    let res = app
        .clone()
        .oneshot(empty_request("POST", "/deliveries/assign"))
        .await
        .unwrap();
    assert_eq!(body_json(res).await["total_assigned"], 1);

    let res = app.clone().oneshot(get_request("/metrics")).await.unwrap();
    let body = body_string(res).await;
    assert!(body.contains(&format!("driver_load{{driver_id=\"{driver_id}\"}} 1")));

    let res = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/deliveries/{delivery_id}/status"),
            json!({ "status": "delivered" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.oneshot(get_request("/metrics")).await.unwrap();
    let body = body_string(res).await;
    assert!(body.contains(&format!("driver_load{{driver_id=\"{driver_id}\"}} 0")));
    assert!(!body.contains(&format!("driver_load{{driver_id=\"{driver_id}\"}} 1")));
}
