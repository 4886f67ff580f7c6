use super::*;
use crate::models::{
    BranchNode, CategoryNode, CustomSlideNode, GeneratedSlideNode, RequirementNodeRecord,
    RequirementSkeleton, Training,
};

fn create_test_service() -> TreeService {
    TreeService::new(TreeStores::in_memory(), TreeServiceConfig::default()).unwrap()
}

fn branch(name: &str) -> NodeExtensionRecord {
    NodeExtensionRecord::BranchNode(BranchNode {
        id: None,
        node_id: 0,
        name: name.to_string(),
        anchor: None,
    })
}

fn category(name: &str) -> NodeExtensionRecord {
    NodeExtensionRecord::CategoryNode(CategoryNode {
        id: None,
        node_id: 0,
        name: name.to_string(),
        category_id: Some(3),
        anchor: None,
    })
}

async fn add_branch(service: &TreeService, parent: Option<NodeId>, name: &str) -> NodeId {
    let node = TreeNode {
        parent_id: parent,
        ..TreeNode::new(NodeType::BranchNode)
    };
    service
        .create_with_extension(node, branch(name))
        .await
        .unwrap()
        .id()
        .unwrap()
}

/// Category root under training 1 with one requirement child
async fn seed_category_with_requirement(service: &TreeService) -> (NodeId, NodeId, RequirementSkeleton) {
    let skeleton = service
        .stores()
        .skeletons
        .save_skeleton(RequirementSkeleton::new("Passwords are hashed"))
        .await
        .unwrap();

    let root = service
        .create_with_extension(
            TreeNode::root(NodeType::CategoryNode, 1),
            category("Authentication"),
        )
        .await
        .unwrap();
    let root_id = root.id().unwrap();

    let child = service
        .create_with_extension(
            TreeNode::child(NodeType::RequirementNode, root_id),
            NodeExtensionRecord::RequirementNode(RequirementNodeRecord {
                id: None,
                node_id: 0,
                requirement_skeleton_id: skeleton.id.unwrap(),
                anchor: None,
            }),
        )
        .await
        .unwrap();

    (root_id, child.id().unwrap(), skeleton)
}

#[tokio::test]
async fn test_hydrate_leaf_has_no_children() {
    let service = create_test_service();
    let id = add_branch(&service, None, "Leaf").await;

    let hydrated = service.hydrate(id).await.unwrap();
    assert!(hydrated.children.is_empty());
    assert_eq!(hydrated.branch_node().unwrap().name, "Leaf");
}

#[tokio::test]
async fn test_hydrate_category_with_requirement_child() {
    let service = create_test_service();
    let (root_id, child_id, skeleton) = seed_category_with_requirement(&service).await;

    let tree = service.hydrate(root_id).await.unwrap();
    assert_eq!(tree.node_type(), NodeType::CategoryNode);
    assert_eq!(tree.category_node().unwrap().name, "Authentication");
    assert_eq!(tree.children.len(), 1);

    let child = &tree.children[0];
    assert_eq!(child.id(), Some(child_id));
    assert!(child.children.is_empty());
    assert!(child.branch_node().is_none());

    let requirement = child.requirement_node().unwrap();
    assert_eq!(requirement.node_id, child_id);
    assert_eq!(requirement.requirement_skeleton, skeleton);
}

#[tokio::test]
async fn test_hydrate_returns_every_level() {
    let service = create_test_service();
    let root = add_branch(&service, None, "level 0").await;

    let mut parent = root;
    for level in 1..=6 {
        parent = add_branch(&service, Some(parent), &format!("level {}", level)).await;
    }

    let tree = service.hydrate(root).await.unwrap();
    assert_eq!(tree.depth(), 7);
    assert_eq!(tree.subtree_size(), 7);

    let mut cursor = &tree;
    for level in 0..=6 {
        assert_eq!(cursor.branch_node().unwrap().name, format!("level {}", level));
        if level < 6 {
            assert_eq!(cursor.children.len(), 1);
            cursor = &cursor.children[0];
        }
    }
}

#[tokio::test]
async fn test_hydrate_keeps_sibling_order() {
    let service = create_test_service();
    let root = add_branch(&service, None, "root").await;

    let unordered = add_branch(&service, Some(root), "unordered").await;
    for (name, order) in [("second", 2), ("first", 1)] {
        service
            .create_with_extension(
                TreeNode::child(NodeType::BranchNode, root).with_sort_order(order),
                branch(name),
            )
            .await
            .unwrap();
    }

    let tree = service.hydrate(root).await.unwrap();
    let names: Vec<_> = tree
        .children
        .iter()
        .map(|c| c.branch_node().unwrap().name.clone())
        .collect();
    assert_eq!(names, vec!["first", "second", "unordered"]);
    assert_eq!(tree.children[2].id(), Some(unordered));
}

#[tokio::test]
async fn test_hydrate_mixed_types_set_matching_extension_only() {
    let service = create_test_service();
    let root = add_branch(&service, None, "root").await;

    service
        .create_with_extension(
            TreeNode::child(NodeType::CustomSlideNode, root),
            NodeExtensionRecord::CustomSlideNode(CustomSlideNode {
                id: None,
                node_id: 0,
                name: "Welcome".to_string(),
                content: Some("# Hello".to_string()),
                anchor: Some(1),
            }),
        )
        .await
        .unwrap();
    service
        .create_with_extension(
            TreeNode::child(NodeType::GeneratedSlideNode, root),
            NodeExtensionRecord::GeneratedSlideNode(GeneratedSlideNode {
                id: None,
                node_id: 0,
                opt_column_id: Some(12),
                anchor: None,
            }),
        )
        .await
        .unwrap();

    let tree = service.hydrate(root).await.unwrap();
    for child in &tree.children {
        assert_eq!(child.extension.node_type(), child.node_type());
    }
    assert!(tree.children[0].custom_slide_node().is_some());
    assert!(tree.children[1].generated_slide_node().is_some());
}

#[tokio::test]
async fn test_hydrate_missing_node() {
    let service = create_test_service();
    let err = service.hydrate(99).await.unwrap_err();
    assert!(matches!(err, TreeServiceError::NodeNotFound { id: 99 }));
}

#[tokio::test]
async fn test_hydrate_missing_extension_is_inconsistent() {
    let service = create_test_service();
    let node = service
        .create(TreeNode::new(NodeType::CategoryNode))
        .await
        .unwrap();

    let err = service.hydrate(node.id.unwrap()).await.unwrap_err();
    assert!(matches!(
        err,
        TreeServiceError::InconsistentState {
            node_type: NodeType::CategoryNode,
            ..
        }
    ));
}

#[tokio::test]
async fn test_hydrate_missing_skeleton_is_inconsistent() {
    let service = create_test_service();
    let err = service
        .create_with_extension(
            TreeNode::new(NodeType::RequirementNode),
            NodeExtensionRecord::RequirementNode(RequirementNodeRecord {
                id: None,
                node_id: 0,
                requirement_skeleton_id: 404,
                anchor: None,
            }),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, TreeServiceError::InconsistentState { .. }));
}

#[tokio::test]
async fn test_hydrate_respects_max_depth() {
    let stores = TreeStores::in_memory();
    let unbounded = TreeService::new(stores.clone(), TreeServiceConfig::default()).unwrap();
    let root = add_branch(&unbounded, None, "root").await;
    let child = add_branch(&unbounded, Some(root), "child").await;
    add_branch(&unbounded, Some(child), "grandchild").await;

    let bounded = TreeService::new(stores.clone(), TreeServiceConfig::with_max_depth(1)).unwrap();
    assert_eq!(bounded.config().max_depth, Some(1));
    let err = bounded.hydrate(root).await.unwrap_err();
    assert!(matches!(
        err,
        TreeServiceError::DepthLimitExceeded { node_id, max_depth: 1 } if node_id == child
    ));

    // A subtree within the bound hydrates normally
    assert_eq!(bounded.hydrate(child).await.unwrap().subtree_size(), 2);

    let exact = TreeService::new(stores, TreeServiceConfig::with_max_depth(2)).unwrap();
    assert_eq!(exact.hydrate(root).await.unwrap().depth(), 3);
}

#[tokio::test]
async fn test_new_rejects_invalid_config() {
    let result = TreeService::new(TreeStores::in_memory(), TreeServiceConfig::with_max_depth(0));
    assert!(matches!(result, Err(TreeServiceError::InvalidConfig(_))));
}

#[tokio::test]
async fn test_delete_cascade_removes_from_every_store() {
    let service = create_test_service();
    let id = add_branch(&service, None, "doomed").await;
    assert_eq!(service.search("BranchNode").await.unwrap().len(), 1);

    service.delete_cascade(id).await.unwrap();

    let stores = service.stores();
    assert_eq!(stores.nodes.get_node(id).await.unwrap(), None);
    assert_eq!(stores.extensions.find(NodeType::BranchNode, id).await.unwrap(), None);
    assert!(service.search("BranchNode").await.unwrap().is_empty());
    assert!(matches!(
        service.hydrate(id).await.unwrap_err(),
        TreeServiceError::NodeNotFound { .. }
    ));
}

#[tokio::test]
async fn test_delete_cascade_leaves_children_dangling() {
    let service = create_test_service();
    let (root_id, child_id, _) = seed_category_with_requirement(&service).await;

    service.delete_cascade(root_id).await.unwrap();

    let nodes = &service.stores().nodes;
    assert_eq!(nodes.get_node(root_id).await.unwrap(), None);
    let orphan = nodes.get_node(child_id).await.unwrap().unwrap();
    assert_eq!(orphan.parent_id, Some(root_id));

    // The orphan still hydrates on its own
    let hydrated = service.hydrate(child_id).await.unwrap();
    assert!(hydrated.requirement_node().is_some());
}

#[tokio::test]
async fn test_delete_cascade_missing_node() {
    let service = create_test_service();
    let err = service.delete_cascade(5).await.unwrap_err();
    assert!(matches!(err, TreeServiceError::NodeNotFound { id: 5 }));
}

#[tokio::test]
async fn test_delete_cascade_missing_extension_deletes_nothing() {
    let service = create_test_service();
    let node = service
        .create(TreeNode::new(NodeType::BranchNode))
        .await
        .unwrap();
    let id = node.id.unwrap();

    let err = service.delete_cascade(id).await.unwrap_err();
    assert!(matches!(err, TreeServiceError::InconsistentState { .. }));

    assert!(service.stores().nodes.get_node(id).await.unwrap().is_some());
    assert_eq!(service.search(&format!("id:{}", id)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_rejects_preassigned_id() {
    let service = create_test_service();
    let node = TreeNode {
        id: Some(12),
        ..TreeNode::new(NodeType::BranchNode)
    };

    let err = service.create(node).await.unwrap_err();
    match err {
        TreeServiceError::InvalidRequest(reason) => {
            assert_eq!(reason, "id must not be pre-assigned")
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(service.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_assigns_id_and_indexes() {
    let service = create_test_service();
    let created = service
        .create(TreeNode::root(NodeType::CategoryNode, 8))
        .await
        .unwrap();

    let id = created.id.unwrap();
    let hits = service.search("training_id:8").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, Some(id));
}

#[tokio::test]
async fn test_update_replaces_and_reindexes() {
    let service = create_test_service();
    let id = add_branch(&service, None, "node").await;

    let mut node = service.stores().nodes.get_node(id).await.unwrap().unwrap();
    node.sort_order = Some(42);
    let updated = service.update(node).await.unwrap();

    assert_eq!(updated.sort_order, Some(42));
    assert_eq!(service.search("sort_order:42").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_without_id_creates() {
    let service = create_test_service();
    let created = service
        .update(TreeNode::new(NodeType::BranchNode))
        .await
        .unwrap();
    assert!(created.id.is_some());
    assert_eq!(service.list_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_missing_node() {
    let service = create_test_service();
    let node = TreeNode {
        id: Some(77),
        ..TreeNode::new(NodeType::BranchNode)
    };
    let err = service.update(node).await.unwrap_err();
    assert!(matches!(err, TreeServiceError::NodeNotFound { id: 77 }));
}

#[tokio::test]
async fn test_update_cannot_change_node_type() {
    let service = create_test_service();
    let id = add_branch(&service, None, "node").await;

    let changed = TreeNode {
        id: Some(id),
        ..TreeNode::new(NodeType::CategoryNode)
    };
    let err = service.update(changed).await.unwrap_err();
    assert!(matches!(err, TreeServiceError::InvalidRequest(_)));

    let stored = service.stores().nodes.get_node(id).await.unwrap().unwrap();
    assert_eq!(stored.node_type, NodeType::BranchNode);
}

#[tokio::test]
async fn test_create_or_update_dispatch() {
    let service = create_test_service();

    let created = service
        .create_or_update(SaveRequest::Create(TreeNode::new(NodeType::BranchNode)))
        .await
        .unwrap();

    let err = service
        .create_or_update(SaveRequest::Create(created.clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, TreeServiceError::InvalidRequest(_)));

    let moved = TreeNode {
        anchor: Some(3),
        ..created
    };
    let updated = service
        .create_or_update(SaveRequest::Update(moved))
        .await
        .unwrap();
    assert_eq!(updated.anchor, Some(3));
}

#[tokio::test]
async fn test_create_with_extension_validates_before_writing() {
    let service = create_test_service();

    let err = service
        .create_with_extension(TreeNode::new(NodeType::CategoryNode), branch("wrong"))
        .await
        .unwrap_err();
    assert!(matches!(err, TreeServiceError::InvalidRequest(_)));

    let mut saved_extension = branch("already saved");
    if let NodeExtensionRecord::BranchNode(record) = &mut saved_extension {
        record.id = Some(1);
    }
    let err = service
        .create_with_extension(TreeNode::new(NodeType::BranchNode), saved_extension)
        .await
        .unwrap_err();
    assert!(matches!(err, TreeServiceError::InvalidRequest(_)));

    assert!(service.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_root_of() {
    let service = create_test_service();
    let trainings = &service.stores().trainings;
    let training = trainings
        .save_training(Training::new("Secure coding"))
        .await
        .unwrap();
    let empty = trainings
        .save_training(Training::new("Empty training"))
        .await
        .unwrap();
    let training_id = training.id.unwrap();

    let root = service
        .create(TreeNode::root(NodeType::CategoryNode, training_id))
        .await
        .unwrap();
    // A non-root node of the same training is not a candidate
    service
        .create(TreeNode::child(NodeType::BranchNode, root.id.unwrap()).with_training(training_id))
        .await
        .unwrap();

    assert_eq!(service.root_of(training_id).await.unwrap(), root);

    let err = service.root_of(empty.id.unwrap()).await.unwrap_err();
    assert!(matches!(err, TreeServiceError::RootNotFound { .. }));

    let err = service.root_of(1234).await.unwrap_err();
    assert!(matches!(err, TreeServiceError::TrainingNotFound { id: 1234 }));
}

#[tokio::test]
async fn test_children_of() {
    let service = create_test_service();
    let root = add_branch(&service, None, "root").await;
    let first = add_branch(&service, Some(root), "a").await;
    let grandchild = add_branch(&service, Some(first), "a.1").await;
    let second = add_branch(&service, Some(root), "b").await;

    let ids: Vec<_> = service
        .children_of(root)
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.id.unwrap())
        .collect();
    assert_eq!(ids, vec![first, second]);
    assert!(!ids.contains(&grandchild));

    assert!(service.children_of(second).await.unwrap().is_empty());

    let err = service.children_of(500).await.unwrap_err();
    assert!(matches!(err, TreeServiceError::NodeNotFound { id: 500 }));
}

#[tokio::test]
async fn test_list_all_ascending_id() {
    let service = create_test_service();
    for _ in 0..3 {
        add_branch(&service, None, "n").await;
    }
    let ids: Vec<_> = service
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.id.unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_search_rejects_empty_and_unknown_field() {
    let service = create_test_service();
    assert!(matches!(
        service.search("  ").await.unwrap_err(),
        TreeServiceError::InvalidRequest(_)
    ));
    assert!(matches!(
        service.search("title:foo").await.unwrap_err(),
        TreeServiceError::InvalidRequest(_)
    ));
}
