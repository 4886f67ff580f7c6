//! Alert headers read by the SecurityRAT frontend
//!
//! Successful writes carry `X-securityRATApp-alert` (a translation key) and
//! `X-securityRATApp-params` (the entity id). A rejected create carries a
//! `Failure` header with the reason.

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use trainingtree_core::NodeId;

pub const ALERT_HEADER: &str = "x-securityratapp-alert";
pub const PARAMS_HEADER: &str = "x-securityratapp-params";
pub const FAILURE_HEADER: &str = "failure";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityAction {
    Created,
    Updated,
    Deleted,
}

impl EntityAction {
    fn alert_key(&self) -> &'static str {
        match self {
            Self::Created => "securityRATApp.trainingTreeNode.created",
            Self::Updated => "securityRATApp.trainingTreeNode.updated",
            Self::Deleted => "securityRATApp.trainingTreeNode.deleted",
        }
    }
}

pub fn entity_alert(action: EntityAction, id: NodeId) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static(ALERT_HEADER),
        HeaderValue::from_static(action.alert_key()),
    );
    headers.insert(HeaderName::from_static(PARAMS_HEADER), HeaderValue::from(id));
    headers
}

/// `Failure` header; reasons that are not valid header text are dropped
pub fn failure_alert(reason: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(reason) {
        headers.insert(HeaderName::from_static(FAILURE_HEADER), value);
    }
    headers
}
