use axum::http::StatusCode;
use axum_test::TestServer;
use plantree::api::create_router;
use plantree::db::Database;
use plantree::models::*;
use uuid::Uuid;

fn setup() -> TestServer {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    let app = create_router(db);
    TestServer::new(app).expect("Failed to create test server")
}

async fn create_test_workspace(server: &TestServer) -> Workspace {
    server
        .post("/api/v1/workspaces")
        .json(&CreateWorkspaceInput {
            name: "Test Workspace".to_string(),
            description: None,
        })
        .await
        .json::<Workspace>()
}

async fn create_node(
    server: &TestServer,
    workspace_id: Uuid,
    name: &str,
    parent_id: Option<Uuid>,
) -> Node {
    server
        .post(&format!("/api/v1/workspaces/{}/nodes", workspace_id))
        .json(&CreateNodeInput {
            parent_id,
            name: name.to_string(),
            ..CreateNodeInput::default()
        })
        .await
        .json::<Node>()
}

async fn set_status(server: &TestServer, node_id: Uuid, status: NodeStatus) -> Node {
    let response = server
        .put(&format!("/api/v1/nodes/{}/status", node_id))
        .json(&SetStatusInput { status })
        .await;
    response.assert_status_ok();
    response.json::<Node>()
}

async fn get_node(server: &TestServer, node_id: Uuid) -> Node {
    server
        .get(&format!("/api/v1/nodes/{}", node_id))
        .await
        .json::<Node>()
}

mod workspaces {
    use super::*;

    #[tokio::test]
    async fn creates_and_lists_workspaces() {
        let server = setup();
        let created = create_test_workspace(&server).await;

        let response = server.get("/api/v1/workspaces").await;

        response.assert_status_ok();
        let all: Vec<Workspace> = response.json();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, created.id);
    }

    #[tokio::test]
    async fn create_returns_201() {
        let server = setup();

        let response = server
            .post("/api/v1/workspaces")
            .json(&CreateWorkspaceInput {
                name: "New".to_string(),
                description: Some("desc".to_string()),
            })
            .await;

        response.assert_status(StatusCode::CREATED);
    }

    #[tokio::test]
    async fn get_missing_workspace_returns_404() {
        let server = setup();

        let response = server
            .get(&format!("/api/v1/workspaces/{}", Uuid::new_v4()))
            .await;

        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn updates_workspace_name() {
        let server = setup();
        let ws = create_test_workspace(&server).await;

        let response = server
            .put(&format!("/api/v1/workspaces/{}", ws.id))
            .json(&UpdateWorkspaceInput {
                name: Some("Renamed".to_string()),
                description: None,
            })
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Workspace>().name, "Renamed");
    }

    #[tokio::test]
    async fn delete_returns_204_then_404() {
        let server = setup();
        let ws = create_test_workspace(&server).await;

        server
            .delete(&format!("/api/v1/workspaces/{}", ws.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        server
            .delete(&format!("/api/v1/workspaces/{}", ws.id))
            .await
            .assert_status_not_found();
    }
}

mod nodes {
    use super::*;

    #[tokio::test]
    async fn creates_node_with_defaults() {
        let server = setup();
        let ws = create_test_workspace(&server).await;

        let response = server
            .post(&format!("/api/v1/workspaces/{}/nodes", ws.id))
            .json(&serde_json::json!({ "name": "Platform" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["type"], "project");
        assert_eq!(body["status"], "idea");
        assert_eq!(body["auto_status"], true);
        assert_eq!(body["is_critical"], true);
        assert_eq!(body["depth"], 0);
    }

    #[tokio::test]
    async fn create_with_missing_parent_returns_400() {
        let server = setup();
        let ws = create_test_workspace(&server).await;

        let response = server
            .post(&format!("/api/v1/workspaces/{}/nodes", ws.id))
            .json(&CreateNodeInput {
                parent_id: Some(Uuid::new_v4()),
                name: "Orphan".to_string(),
                ..CreateNodeInput::default()
            })
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn lists_roots_and_children() {
        let server = setup();
        let ws = create_test_workspace(&server).await;
        let root = create_node(&server, ws.id, "Root", None).await;
        create_node(&server, ws.id, "Child", Some(root.id)).await;

        let roots: Vec<Node> = server
            .get(&format!("/api/v1/workspaces/{}/nodes/roots", ws.id))
            .await
            .json();
        assert_eq!(roots.len(), 1);

        let children: Vec<Node> = server
            .get(&format!("/api/v1/nodes/{}/children", root.id))
            .await
            .json();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name, "Child");
        assert_eq!(children[0].node_type, NodeType::Domain);

        let all: Vec<Node> = server
            .get(&format!("/api/v1/workspaces/{}/nodes", ws.id))
            .await
            .json();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn returns_nested_tree() {
        let server = setup();
        let ws = create_test_workspace(&server).await;
        let root = create_node(&server, ws.id, "Root", None).await;
        let child = create_node(&server, ws.id, "Child", Some(root.id)).await;
        create_node(&server, ws.id, "Grandchild", Some(child.id)).await;

        let response = server
            .get(&format!("/api/v1/workspaces/{}/tree", ws.id))
            .await;

        response.assert_status_ok();
        let tree: Vec<NodeTreeNode> = response.json();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].children[0].children[0].node.name, "Grandchild");
    }

    #[tokio::test]
    async fn updates_descriptive_fields() {
        let server = setup();
        let ws = create_test_workspace(&server).await;
        let node = create_node(&server, ws.id, "Old", None).await;

        let response = server
            .put(&format!("/api/v1/nodes/{}", node.id))
            .json(&UpdateNodeInput {
                name: Some("New".to_string()),
                description: Some("Details".to_string()),
                ..UpdateNodeInput::default()
            })
            .await;

        response.assert_status_ok();
        let updated: Node = response.json();
        assert_eq!(updated.name, "New");
        assert_eq!(updated.description, Some("Details".to_string()));
    }

    #[tokio::test]
    async fn get_missing_node_returns_404() {
        let server = setup();

        server
            .get(&format!("/api/v1/nodes/{}", Uuid::new_v4()))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn delete_re_derives_the_former_parent() {
        let server = setup();
        let ws = create_test_workspace(&server).await;
        let parent = create_node(&server, ws.id, "Parent", None).await;
        let done = create_node(&server, ws.id, "Done", Some(parent.id)).await;
        let blocker = create_node(&server, ws.id, "Blocker", Some(parent.id)).await;
        set_status(&server, done.id, NodeStatus::Complete).await;
        assert_eq!(get_node(&server, parent.id).await.status(), NodeStatus::Idea);

        server
            .delete(&format!("/api/v1/nodes/{}", blocker.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        assert_eq!(get_node(&server, parent.id).await.status(), NodeStatus::Complete);
    }
}

mod status {
    use super::*;

    #[tokio::test]
    async fn manual_edit_pins_node_and_propagates() {
        let server = setup();
        let ws = create_test_workspace(&server).await;
        let root = create_node(&server, ws.id, "Root", None).await;
        let child = create_node(&server, ws.id, "Child", Some(root.id)).await;

        let edited = set_status(&server, child.id, NodeStatus::InProgress).await;

        assert_eq!(edited.status_source, StatusSource::Pinned(NodeStatus::InProgress));
        assert_eq!(
            get_node(&server, root.id).await.status_source,
            StatusSource::Derived(NodeStatus::InProgress)
        );
    }

    #[tokio::test]
    async fn rejects_unknown_status() {
        let server = setup();
        let ws = create_test_workspace(&server).await;
        let node = create_node(&server, ws.id, "Node", None).await;

        let response = server
            .put(&format!("/api/v1/nodes/{}/status", node.id))
            .json(&serde_json::json!({ "status": "done" }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn edit_on_missing_node_returns_404() {
        let server = setup();

        let response = server
            .put(&format!("/api/v1/nodes/{}/status", Uuid::new_v4()))
            .json(&SetStatusInput {
                status: NodeStatus::Complete,
            })
            .await;

        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn enable_auto_status_recomputes_node() {
        let server = setup();
        let ws = create_test_workspace(&server).await;
        let parent = create_node(&server, ws.id, "Parent", None).await;
        let child = create_node(&server, ws.id, "Child", Some(parent.id)).await;
        set_status(&server, parent.id, NodeStatus::Testing).await;
        set_status(&server, child.id, NodeStatus::Planned).await;

        let response = server
            .post(&format!("/api/v1/nodes/{}/auto-status", parent.id))
            .await;

        response.assert_status_ok();
        let parent: Node = response.json();
        assert_eq!(parent.status_source, StatusSource::Derived(NodeStatus::Planned));
    }

    #[tokio::test]
    async fn toggle_critical_flips_flag_and_re_derives_parent() {
        let server = setup();
        let ws = create_test_workspace(&server).await;
        let parent = create_node(&server, ws.id, "Parent", None).await;
        let done = create_node(&server, ws.id, "Done", Some(parent.id)).await;
        let optional = create_node(&server, ws.id, "Optional", Some(parent.id)).await;
        set_status(&server, done.id, NodeStatus::Complete).await;

        let response = server
            .post(&format!("/api/v1/nodes/{}/critical", optional.id))
            .await;

        response.assert_status_ok();
        assert!(!response.json::<Node>().is_critical);
        assert_eq!(get_node(&server, parent.id).await.status(), NodeStatus::Complete);
    }

    #[tokio::test]
    async fn reports_progress() {
        let server = setup();
        let ws = create_test_workspace(&server).await;
        let parent = create_node(&server, ws.id, "Parent", None).await;
        for (name, status) in [
            ("A", NodeStatus::Complete),
            ("B", NodeStatus::Complete),
            ("C", NodeStatus::InProgress),
        ] {
            let child = create_node(&server, ws.id, name, Some(parent.id)).await;
            set_status(&server, child.id, status).await;
        }

        let response = server
            .get(&format!("/api/v1/nodes/{}/progress", parent.id))
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(
            body,
            serde_json::json!({ "total": 3, "complete": 2, "in_progress": 1, "percentage": 67 })
        );
    }

    #[tokio::test]
    async fn cycle_in_parent_chain_returns_409() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("plantree.db");
        let db = Database::open(path.clone()).expect("Failed to open database");
        db.migrate().expect("Failed to migrate");
        let ws = db
            .create_workspace(CreateWorkspaceInput {
                name: "Looped".to_string(),
                description: None,
            })
            .expect("Failed to create workspace");
        let create = |name: &str, parent_id| {
            db.create_node(
                ws.id,
                CreateNodeInput {
                    parent_id,
                    name: name.to_string(),
                    ..CreateNodeInput::default()
                },
            )
            .expect("Failed to create node")
        };
        let a = create("A", None);
        let b = create("B", Some(a.id));
        let c = create("C", Some(b.id));

        // Point A back at B so the walk up from C loops.
        let raw = rusqlite::Connection::open(&path).expect("Failed to open raw connection");
        raw.execute(
            "UPDATE nodes SET parent_id = ? WHERE id = ?",
            (b.id.to_string(), a.id.to_string()),
        )
        .expect("Failed to rewrite parent");
        drop(raw);

        let server = TestServer::new(create_router(db)).expect("Failed to create test server");
        let response = server
            .put(&format!("/api/v1/nodes/{}/status", c.id))
            .json(&SetStatusInput {
                status: NodeStatus::Complete,
            })
            .await;

        response.assert_status(StatusCode::CONFLICT);
        assert!(response.text().contains("cycle"));
    }

    #[tokio::test]
    async fn progress_on_missing_node_returns_404() {
        let server = setup();

        server
            .get(&format!("/api/v1/nodes/{}/progress", Uuid::new_v4()))
            .await
            .assert_status_not_found();
    }
}

mod scaffold {
    use super::*;

    fn plan() -> ScaffoldInput {
        ScaffoldInput {
            project_name: "Farm Platform".to_string(),
            summary: None,
            nodes: vec![ProposedNode {
                name: "Field Ops".to_string(),
                node_type: None,
                description: None,
                is_critical: true,
                children: vec![],
            }],
        }
    }

    #[tokio::test]
    async fn creates_ghost_nodes_and_confirms_them() {
        let server = setup();
        let ws = create_test_workspace(&server).await;

        let response = server
            .post(&format!("/api/v1/workspaces/{}/scaffold", ws.id))
            .json(&plan())
            .await;

        response.assert_status(StatusCode::CREATED);
        let result: ScaffoldResult = response.json();
        assert_eq!(result.created_node_ids.len(), 1);

        let ghost = get_node(&server, result.created_node_ids[0]).await;
        assert!(!ghost.confirmed);
        assert_eq!(ghost.parent_id, Some(result.project.id));

        let response = server
            .post(&format!("/api/v1/nodes/{}/confirm", ghost.id))
            .await;
        response.assert_status_ok();
        assert!(response.json::<Node>().confirmed);
    }

    #[tokio::test]
    async fn scaffold_into_missing_workspace_returns_404() {
        let server = setup();

        server
            .post(&format!("/api/v1/workspaces/{}/scaffold", Uuid::new_v4()))
            .json(&plan())
            .await
            .assert_status_not_found();
    }
}

mod security_auth {
    use super::*;
    use plantree::api::create_router_with_config;
    use plantree::config::ServerConfig;

    fn setup_with_auth(api_key: &str) -> TestServer {
        let db = Database::open_memory().expect("Failed to create database");
        db.migrate().expect("Failed to migrate");
        let app = create_router_with_config(db, &ServerConfig::with_api_key(api_key));
        TestServer::new(app).expect("Failed to create test server")
    }

    #[tokio::test]
    async fn health_endpoint_is_accessible_without_auth() {
        let server = setup_with_auth("test-secret-key");

        server.get("/api/v1/health").await.assert_status_ok();
    }

    #[tokio::test]
    async fn protected_endpoint_requires_auth() {
        let server = setup_with_auth("test-secret-key");

        let response = server.get("/api/v1/workspaces").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn protected_endpoint_accepts_valid_bearer_token() {
        let server = setup_with_auth("test-secret-key");

        let response = server
            .get("/api/v1/workspaces")
            .add_header("Authorization", "Bearer test-secret-key")
            .await;

        response.assert_status_ok();
    }

    #[tokio::test]
    async fn protected_endpoint_rejects_invalid_bearer_token() {
        let server = setup_with_auth("test-secret-key");

        let response = server
            .get("/api/v1/workspaces")
            .add_header("Authorization", "Bearer wrong-key")
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn protected_endpoint_rejects_malformed_auth_header() {
        let server = setup_with_auth("test-secret-key");

        let response = server
            .get("/api/v1/workspaces")
            .add_header("Authorization", "Basic dXNlcjpwYXNz")
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}
