//! Интеграционные тесты HTTP API реестра на SQLite в памяти.

#[cfg(test)]
mod tests {
    use crate::api::rate_limit::RateLimiter;
    use crate::api::{build_router, AppState};
    use crate::services::registry_service::{self, NewServer};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use sea_orm::{ConnectOptions, Database, DatabaseConnection};
    use std::collections::HashSet;
    use serde_json::{json, Value};
    use tokio::task::JoinSet;
    use tower::ServiceExt;
    use vpnhub_migration::{Migrator, MigratorTrait};

    async fn test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    async fn build_test_app(max_requests: u32) -> (axum::Router, DatabaseConnection) {
        let db = test_db().await;
        let state = AppState {
            db: db.clone(),
            rate_limiter: RateLimiter::per_minute(max_requests),
        };
        (build_router(state), db)
    }

    async fn send(
        app: &axum::Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn amsterdam() -> Value {
        json!({
            "name": "Amsterdam VPS",
            "country": "Netherlands",
            "ip_address": "45.67.89.123",
            "config_data": "[Interface]..."
        })
    }

    fn server_ids(listing: &Value) -> Vec<i64> {
        listing["servers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["id"].as_i64().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_health_check() {
        let (app, _db) = build_test_app(100).await;
        let (status, body) = send(&app, "GET", "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["database"], json!(true));
    }

    #[tokio::test]
    async fn test_create_applies_defaults() {
        let (app, _db) = build_test_app(100).await;
        let (status, body) = send(&app, "POST", "/api/v1/servers", Some(amsterdam())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        let server = &body["server"];
        assert!(server["id"].as_i64().is_some());
        assert_eq!(server["name"], json!("Amsterdam VPS"));
        assert_eq!(server["port"], json!(51820));
        assert_eq!(server["ssh_port"], json!(22));
        assert_eq!(server["max_users"], json!(100));
        assert_eq!(server["current_users"], json!(0));
        assert_eq!(server["config_type"], json!("amnezia"));
        assert_eq!(server["config_data"], json!("[Interface]..."));
        assert_eq!(server["is_active"], json!(true));
        assert_eq!(server["city"], Value::Null);
        assert_eq!(server["latitude"], Value::Null);
    }

    #[tokio::test]
    async fn test_deactivate_scenario() {
        let (app, _db) = build_test_app(100).await;
        let (_, created) = send(&app, "POST", "/api/v1/servers", Some(amsterdam())).await;
        let id = created["server"]["id"].as_i64().unwrap();

        let (status, body) = send(&app, "DELETE", &format!("/api/v1/servers?id={id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));

        let (_, active) = send(&app, "GET", "/api/v1/servers?active=true", None).await;
        assert!(server_ids(&active).is_empty());
        let (_, default) = send(&app, "GET", "/api/v1/servers", None).await;
        assert!(server_ids(&default).is_empty());

        let (_, all) = send(&app, "GET", "/api/v1/servers?active=false", None).await;
        assert_eq!(server_ids(&all), vec![id]);
        assert_eq!(all["servers"][0]["is_active"], json!(false));

        // Повторная деактивация не считается ошибкой
        let (status, body) = send(&app, "DELETE", &format!("/api/v1/servers?id={id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
    }

    #[tokio::test]
    async fn test_missing_required_field_rejected() {
        let (app, _db) = build_test_app(100).await;

        for field in ["name", "country", "ip_address", "config_data"] {
            let mut body = amsterdam();
            body.as_object_mut().unwrap().remove(field);

            let (status, response) = send(&app, "POST", "/api/v1/servers", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(response["success"], json!(false));
            assert!(
                response["error"].as_str().unwrap().starts_with(field),
                "ошибка должна называть поле {field}: {response}"
            );
        }

        let (_, all) = send(&app, "GET", "/api/v1/servers?active=false", None).await;
        assert!(server_ids(&all).is_empty(), "реестр должен остаться пустым");
    }

    #[tokio::test]
    async fn test_numeric_strings_are_coerced() {
        let (app, _db) = build_test_app(100).await;
        let mut body = amsterdam();
        let obj = body.as_object_mut().unwrap();
        obj.insert("port".into(), json!("443"));
        obj.insert("ssh_port".into(), json!("2222"));
        obj.insert("latitude".into(), json!("52.37"));
        obj.insert("longitude".into(), json!("4.89"));
        obj.insert("ping_ms".into(), json!(""));
        obj.insert("bandwidth_mbps".into(), json!(1000));
        obj.insert("max_users".into(), json!("50"));
        obj.insert("city".into(), json!(""));

        let (status, response) = send(&app, "POST", "/api/v1/servers", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        let server = &response["server"];
        assert_eq!(server["port"], json!(443));
        assert_eq!(server["ssh_port"], json!(2222));
        assert_eq!(server["latitude"], json!(52.37));
        assert_eq!(server["longitude"], json!(4.89));
        assert_eq!(server["ping_ms"], Value::Null);
        assert_eq!(server["bandwidth_mbps"], json!(1000));
        assert_eq!(server["max_users"], json!(50));
        assert_eq!(server["city"], Value::Null);
    }

    #[tokio::test]
    async fn test_malformed_numbers_rejected() {
        let (app, _db) = build_test_app(100).await;
        let cases = [
            ("ping_ms", json!("fast")),
            ("port", json!("70000")),
            ("max_users", json!(-1)),
            ("latitude", json!("NaN")),
        ];

        for (field, value) in cases {
            let mut body = amsterdam();
            body.as_object_mut().unwrap().insert(field.into(), value);
            if field == "latitude" {
                body.as_object_mut()
                    .unwrap()
                    .insert("longitude".into(), json!(4.89));
            }

            let (status, response) = send(&app, "POST", "/api/v1/servers", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "поле {field}");
            assert!(response["error"].as_str().unwrap().starts_with(field));
        }
    }

    #[tokio::test]
    async fn test_malformed_json_body() {
        let (app, _db) = build_test_app(100).await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/servers")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_listing_keeps_insertion_order() {
        let (app, _db) = build_test_app(100).await;
        let mut ids = Vec::new();
        for name in ["A", "B", "C"] {
            let mut body = amsterdam();
            body["name"] = json!(name);
            let (_, created) = send(&app, "POST", "/api/v1/servers", Some(body)).await;
            ids.push(created["server"]["id"].as_i64().unwrap());
        }

        let (_, listing) = send(&app, "GET", "/api/v1/servers", None).await;
        assert_eq!(server_ids(&listing), ids);
        let names: Vec<_> = listing["servers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let (_app, db) = build_test_app(100).await;
        let data = NewServer {
            name: Some("Frankfurt".into()),
            country: Some("Germany".into()),
            ip_address: Some("10.1.2.3".into()),
            config_data: Some("cfg".into()),
            ..Default::default()
        };

        let first = registry_service::create_server(&db, data.clone()).await.unwrap();
        registry_service::deactivate_server(&db, first.id).await.unwrap();
        let second = registry_service::create_server(&db, data).await.unwrap();

        assert_ne!(first.id, second.id);
        assert!(second.id > first.id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_keep_every_record() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}?mode=rwc", dir.path().join("registry.db").display());
        let mut opts = ConnectOptions::new(url);
        opts.max_connections(8);
        let db = Database::connect(opts).await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let mut tasks = JoinSet::new();
        for i in 0..40 {
            let db = db.clone();
            tasks.spawn(async move {
                let data = NewServer {
                    name: Some(format!("node-{i}")),
                    country: Some("Germany".into()),
                    ip_address: Some(format!("10.0.0.{}", i + 1)),
                    config_data: Some("cfg".into()),
                    ..Default::default()
                };
                let server = registry_service::create_server(&db, data).await.unwrap();
                let deactivated = i % 3 == 0;
                if deactivated {
                    registry_service::deactivate_server(&db, server.id).await.unwrap();
                }
                // Параллельное чтение не должно мешать записи
                registry_service::list_servers(&db, true).await.unwrap();
                (server.id, deactivated)
            });
        }

        let mut created = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            created.push(joined.unwrap());
        }

        let ids: HashSet<i32> = created.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids.len(), 40);

        let all = registry_service::list_servers(&db, false).await.unwrap();
        assert_eq!(all.len(), 40);
        assert!(all.iter().all(|s| ids.contains(&s.id)));

        let inactive: HashSet<i32> = created
            .iter()
            .filter(|(_, deactivated)| *deactivated)
            .map(|(id, _)| *id)
            .collect();
        assert_eq!(inactive.len(), 14);
        for server in &all {
            assert_eq!(server.is_active, !inactive.contains(&server.id), "{}", server.name);
        }

        let active = registry_service::list_servers(&db, true).await.unwrap();
        assert_eq!(active.len(), 26);
    }

    #[tokio::test]
    async fn test_empty_active_flag_lists_active_only() {
        let (app, db) = build_test_app(100).await;
        send(&app, "POST", "/api/v1/servers", Some(amsterdam())).await;
        let (_, body) = send(&app, "POST", "/api/v1/servers", Some(amsterdam())).await;
        let id = body["server"]["id"].as_i64().unwrap() as i32;
        registry_service::deactivate_server(&db, id).await.unwrap();

        let (status, body) = send(&app, "GET", "/api/v1/servers?active=", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["servers"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_deactivate_errors() {
        let (app, _db) = build_test_app(100).await;

        let (status, body) = send(&app, "DELETE", "/api/v1/servers?id=999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], json!(false));

        let (status, _) = send(&app, "DELETE", "/api/v1/servers", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "DELETE", "/api/v1/servers?id=abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_active_flag() {
        let (app, _db) = build_test_app(100).await;
        let (status, body) = send(&app, "GET", "/api/v1/servers?active=maybe", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("active"));
    }

    #[tokio::test]
    async fn test_best_server_selection() {
        let (app, _db) = build_test_app(100).await;

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/best-server",
            Some(json!({ "latitude": 52.0, "longitude": 4.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "пустой реестр");

        let servers = [
            ("Amsterdam", 52.37, 4.89, 100),
            ("Tokyo", 35.68, 139.69, 100),
            ("Full Rotterdam", 51.92, 4.48, 0),
        ];
        for (name, lat, lon, max_users) in servers {
            let mut body = amsterdam();
            let obj = body.as_object_mut().unwrap();
            obj.insert("name".into(), json!(name));
            obj.insert("latitude".into(), json!(lat));
            obj.insert("longitude".into(), json!(lon));
            obj.insert("max_users".into(), json!(max_users));
            send(&app, "POST", "/api/v1/servers", Some(body)).await;
        }

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/best-server",
            Some(json!({ "latitude": "51.9", "longitude": "4.5" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["server"]["name"], json!("Amsterdam"));
        assert!(body["reason"].is_string());

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/best-server",
            Some(json!({ "latitude": 51.9 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/best-server",
            Some(json!({ "latitude": 120.0, "longitude": 4.5 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stats() {
        let (app, _db) = build_test_app(100).await;
        let mut ids = Vec::new();
        for (name, country) in [("a", "Netherlands"), ("b", "netherlands"), ("c", "Germany")] {
            let mut body = amsterdam();
            body["name"] = json!(name);
            body["country"] = json!(country);
            let (_, created) = send(&app, "POST", "/api/v1/servers", Some(body)).await;
            ids.push(created["server"]["id"].as_i64().unwrap());
        }
        send(&app, "DELETE", &format!("/api/v1/servers?id={}", ids[2]), None).await;

        let (status, stats) = send(&app, "GET", "/api/v1/admin/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["total"], json!(3));
        assert_eq!(stats["active"], json!(2));
        assert_eq!(stats["inactive"], json!(1));
        assert_eq!(stats["countries"], json!(1));
        assert_eq!(stats["capacity"], json!(200));
        assert_eq!(stats["online_users"], json!(0));
    }

    #[tokio::test]
    async fn test_rate_limit() {
        let (app, _db) = build_test_app(2).await;

        for _ in 0..2 {
            let (status, _) = send(&app, "GET", "/api/v1/servers", None).await;
            assert_eq!(status, StatusCode::OK);
        }
        let (status, body) = send(&app, "GET", "/api/v1/servers", None).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["success"], json!(false));

        // /health не ограничивается
        let (status, _) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
    }
}
