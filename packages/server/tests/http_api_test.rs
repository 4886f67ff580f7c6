//! HTTP API Tests over the libsql Backend
//!
//! Drives the full router (CORS and trace layers included) against a
//! temporary database, following one training tree through its lifecycle.

#[cfg(test)]
mod http_api_tests {
    use anyhow::Result;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;
    use trainingtree_core::RequirementSkeleton;
    use trainingtree_server::{
        build_service, cors_layer, create_router, AppState, ServerConfig, StorageBackend,
    };

    async fn create_test_app() -> Result<(Router, AppState, TempDir)> {
        let temp_dir = TempDir::new()?;
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            storage: StorageBackend::Libsql(temp_dir.path().join("api.db")),
            max_depth: Some(32),
            cors_allow_origin: None,
        };
        let state = AppState {
            service: Arc::new(build_service(&config).await?),
        };
        let app = create_router(state.clone(), cors_layer(None)?);
        Ok((app, state, temp_dir))
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        let request = match body {
            Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_training_tree_lifecycle() -> Result<()> {
        let (app, state, _temp_dir) = create_test_app().await?;

        let skeleton = state
            .service
            .stores()
            .skeletons
            .save_skeleton(RequirementSkeleton::new("Use parameterized queries"))
            .await?;

        let (status, root) = call(
            &app,
            "POST",
            "/api/trainingTreeNodes",
            Some(json!({"node_type": "CategoryNode", "categoryNode": {"name": "Injection"}})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let root_id = root["id"].as_i64().unwrap();

        let (status, child) = call(
            &app,
            "POST",
            "/api/trainingTreeNodes",
            Some(json!({
                "node_type": "RequirementNode",
                "parent_id": root_id,
                "requirementNode": {"requirement_skeleton_id": skeleton.id}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let child_id = child["id"].as_i64().unwrap();
        assert_eq!(
            child["requirementNode"]["requirement_skeleton"]["short_name"],
            "Use parameterized queries"
        );

        let (status, tree) = call(&app, "GET", &format!("/api/trainingTreeNodes/{}", root_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(tree["categoryNode"]["name"], "Injection");
        assert_eq!(tree["children"][0]["id"], child_id);
        assert_eq!(tree["children"][0]["children"], json!([]));

        let (status, _) = call(&app, "DELETE", &format!("/api/trainingTreeNodes/{}", root_id), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(&app, "GET", &format!("/api/trainingTreeNodes/{}", root_id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NODE_NOT_FOUND");

        let (status, hits) = call(
            &app,
            "GET",
            &format!("/api/_search/trainingTreeNodes/parent_id:{}", root_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(hits.as_array().map(Vec::len), Some(1));

        Ok(())
    }

    #[tokio::test]
    async fn test_children_of_missing_node_and_bad_id() -> Result<()> {
        let (app, _state, _temp_dir) = create_test_app().await?;

        let (status, body) = call(&app, "GET", "/api/TrainingTreeNode/childrenOf/41", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NODE_NOT_FOUND");

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/trainingTreeNodes/not-a-number")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        Ok(())
    }
}
