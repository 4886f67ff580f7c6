//! Training Tree Node Endpoints
//!
//! # Endpoints
//!
//! - `GET /api/health` - Health check endpoint
//! - `POST /api/trainingTreeNodes` - Create a node (optionally with its extension)
//! - `PUT /api/trainingTreeNodes` - Update a node, or create it when it has no id
//! - `GET /api/trainingTreeNodes` - List all nodes
//! - `GET /api/trainingTreeNodes/:id` - Hydrated node with its subtree
//! - `DELETE /api/trainingTreeNodes/:id` - Delete a node (children are kept)
//! - `GET /api/_search/trainingTreeNodes/:query` - Search nodes
//! - `GET /api/TrainingTreeNode/rootNode/:id` - Root node of a training
//! - `GET /api/TrainingTreeNode/childrenOf/:id` - Direct children of a node

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::headers::{entity_alert, failure_alert, EntityAction};
use crate::{AppState, HttpError};
use trainingtree_core::{
    BranchNode, CategoryNode, CustomSlideNode, GeneratedSlideNode, HydratedNode,
    NodeExtensionRecord, NodeId, RequirementNodeRecord, SaveRequest, TreeNode, TreeServiceError,
};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

/// Body of a create or update request
///
/// Generic node fields at the top level, plus at most one extension object
/// under the same key a hydrated node uses for it. Extension objects are only
/// accepted when the node is being created.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNodeBody {
    #[serde(flatten)]
    pub node: TreeNode,
    #[serde(default)]
    pub custom_slide_node: Option<CustomSlideNode>,
    #[serde(default)]
    pub branch_node: Option<BranchNode>,
    #[serde(default)]
    pub requirement_node: Option<RequirementNodeRecord>,
    #[serde(default)]
    pub generated_slide_node: Option<GeneratedSlideNode>,
    #[serde(default)]
    pub category_node: Option<CategoryNode>,
}

impl CreateNodeBody {
    fn has_extension(&self) -> bool {
        self.custom_slide_node.is_some()
            || self.branch_node.is_some()
            || self.requirement_node.is_some()
            || self.generated_slide_node.is_some()
            || self.category_node.is_some()
    }

    /// Split into the node and its optional extension record
    fn into_parts(self) -> Result<(TreeNode, Option<NodeExtensionRecord>), HttpError> {
        let mut extensions: Vec<NodeExtensionRecord> = [
            self.custom_slide_node.map(NodeExtensionRecord::CustomSlideNode),
            self.branch_node.map(NodeExtensionRecord::BranchNode),
            self.requirement_node.map(NodeExtensionRecord::RequirementNode),
            self.generated_slide_node
                .map(NodeExtensionRecord::GeneratedSlideNode),
            self.category_node.map(NodeExtensionRecord::CategoryNode),
        ]
        .into_iter()
        .flatten()
        .collect();

        if extensions.len() > 1 {
            return Err(HttpError::new(
                "At most one extension may accompany a node",
                "INVALID_REQUEST",
            ));
        }
        Ok((self.node, extensions.pop()))
    }
}

/// Node returned by a create request
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum CreatedNode {
    Plain(TreeNode),
    Hydrated(HydratedNode),
}

impl CreatedNode {
    fn id(&self) -> Option<NodeId> {
        match self {
            Self::Plain(node) => node.id,
            Self::Hydrated(node) => node.id(),
        }
    }
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route(
            "/api/trainingTreeNodes",
            post(create_node).put(update_node).get(list_nodes),
        )
        .route(
            "/api/trainingTreeNodes/:id",
            get(get_node).delete(delete_node),
        )
        .route("/api/_search/trainingTreeNodes/:query", get(search_nodes))
        .route("/api/TrainingTreeNode/rootNode/:id", get(root_node))
        .route("/api/TrainingTreeNode/childrenOf/:id", get(children_of))
        .with_state(state)
}

async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn create_from_body(state: &AppState, body: CreateNodeBody) -> Result<Response, HttpError> {
    let (node, extension) = body.into_parts()?;

    let result = match extension {
        Some(extension) => state
            .service
            .create_with_extension(node, extension)
            .await
            .map(CreatedNode::Hydrated),
        None => state
            .service
            .create_or_update(SaveRequest::Create(node))
            .await
            .map(CreatedNode::Plain),
    };

    let created = match result {
        Ok(created) => created,
        Err(TreeServiceError::InvalidRequest(reason)) => {
            tracing::debug!("Rejected training tree node creation: {}", reason);
            let headers = failure_alert(&reason);
            let err = HttpError::from(TreeServiceError::InvalidRequest(reason));
            return Ok((headers, err).into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let id = created
        .id()
        .ok_or_else(|| HttpError::new("Created node has no id", "INTERNAL_ERROR"))?;
    let location = HeaderValue::from_str(&format!("/api/trainingTreeNodes/{}", id))
        .map_err(|e| HttpError::new(e.to_string(), "INTERNAL_ERROR"))?;

    let mut headers = entity_alert(EntityAction::Created, id);
    headers.insert(header::LOCATION, location);

    Ok((StatusCode::CREATED, headers, Json(created)).into_response())
}

/// Create a new node
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/trainingTreeNodes \
///   -H "Content-Type: application/json" \
///   -d '{"node_type":"BranchNode","parent_id":1,"branchNode":{"name":"Injection"}}'
/// ```
async fn create_node(
    State(state): State<AppState>,
    Json(body): Json<CreateNodeBody>,
) -> Result<Response, HttpError> {
    tracing::debug!("REST request to save TrainingTreeNode: {:?}", body.node);
    create_from_body(&state, body).await
}

/// Update an existing node; a node without id is created (201)
///
/// Updates only touch the generic row, so an extension object next to an id
/// is rejected.
async fn update_node(
    State(state): State<AppState>,
    Json(body): Json<CreateNodeBody>,
) -> Result<Response, HttpError> {
    tracing::debug!("REST request to update TrainingTreeNode: {:?}", body.node);

    let Some(id) = body.node.id else {
        return create_from_body(&state, body).await;
    };

    if body.has_extension() {
        let reason = "extension records cannot be changed through a node update";
        tracing::debug!("Rejected update of TrainingTreeNode {}: {}", id, reason);
        let err = HttpError::new(reason, "INVALID_REQUEST");
        return Ok((failure_alert(reason), err).into_response());
    }

    let updated = state
        .service
        .create_or_update(SaveRequest::Update(body.node))
        .await?;

    Ok((entity_alert(EntityAction::Updated, id), Json(updated)).into_response())
}

async fn list_nodes(State(state): State<AppState>) -> Result<Json<Vec<TreeNode>>, HttpError> {
    tracing::debug!("REST request to get all TrainingTreeNodes");
    Ok(Json(state.service.list_all().await?))
}

async fn get_node(
    State(state): State<AppState>,
    Path(id): Path<NodeId>,
) -> Result<Json<HydratedNode>, HttpError> {
    tracing::debug!("REST request to get TrainingTreeNode: {}", id);
    Ok(Json(state.service.hydrate(id).await?))
}

async fn delete_node(
    State(state): State<AppState>,
    Path(id): Path<NodeId>,
) -> Result<Response, HttpError> {
    tracing::debug!("REST request to delete TrainingTreeNode: {}", id);
    state.service.delete_cascade(id).await?;
    Ok((StatusCode::OK, entity_alert(EntityAction::Deleted, id)).into_response())
}

async fn search_nodes(
    State(state): State<AppState>,
    Path(query): Path<String>,
) -> Result<Json<Vec<TreeNode>>, HttpError> {
    tracing::debug!("REST request to search TrainingTreeNodes for query {}", query);
    Ok(Json(state.service.search(&query).await?))
}

async fn root_node(
    State(state): State<AppState>,
    Path(training_id): Path<NodeId>,
) -> Result<Json<TreeNode>, HttpError> {
    tracing::debug!("REST request to get root node of Training: {}", training_id);
    Ok(Json(state.service.root_of(training_id).await?))
}

async fn children_of(
    State(state): State<AppState>,
    Path(id): Path<NodeId>,
) -> Result<Json<Vec<TreeNode>>, HttpError> {
    tracing::debug!("REST request to get children of TrainingTreeNode: {}", id);
    Ok(Json(state.service.children_of(id).await?))
}
