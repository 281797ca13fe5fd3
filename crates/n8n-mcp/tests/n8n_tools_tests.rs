//! End-to-end tests for the n8n MCP tools and resources.
//!
//! A wiremock server stands in for the n8n instance. Its URI plus
//! `/api/v1` is the configured API URL, so webhook calls land on the same
//! mock under `/webhook/...`.

use n8n_mcp::{
    all_resources, all_tools, ApiErrorKind, McpRequest, McpServer, N8nClients, N8nConfig,
    ToolContext, ToolResult,
};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-api-key";

/// Test fixture wiring a mock n8n instance to a fully registered server.
struct TestFixture {
    /// Mock n8n server.
    n8n: MockServer,
    /// MCP server under test.
    server: McpServer,
    /// Clients behind the server's tools.
    clients: N8nClients,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    async fn with_config(adjust: impl FnOnce(&mut N8nConfig)) -> Self {
        let n8n = MockServer::start().await;
        let mut config = N8nConfig::new(format!("{}/api/v1", n8n.uri()), API_KEY);
        adjust(&mut config);

        let clients = N8nClients::from_config(config).unwrap();
        let server = McpServer::n8n();
        server.register_tools(all_tools(&clients)).await;
        server.register_resources(all_resources(&clients)).await;

        Self {
            n8n,
            server,
            clients,
        }
    }

    async fn call(&self, tool: &str, args: Value) -> ToolResult {
        self.server
            .call_tool(tool, args, &ToolContext::new())
            .await
            .unwrap()
    }
}

fn data_of(result: &ToolResult) -> Value {
    serde_json::from_str(result.text_at(1).unwrap()).unwrap()
}

// ============================================================================
// Workflows
// ============================================================================

#[tokio::test]
async fn test_workflow_list_filters_active() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/workflows"))
        .and(header("X-N8N-API-KEY", API_KEY))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {
                    "id": "a",
                    "name": "Active flow",
                    "active": true,
                    "nodes": [{"name": "Start"}],
                    "updatedAt": "2024-05-01T10:00:00.000Z"
                },
                {
                    "id": "b",
                    "name": "Idle flow",
                    "active": false,
                    "updatedAt": "2024-04-01T10:00:00.000Z"
                }
            ],
            "nextCursor": null
        })))
        .expect(1)
        .mount(&fixture.n8n)
        .await;

    let result = fixture.call("workflow_list", json!({"active": true})).await;

    assert!(!result.is_error);
    assert_eq!(
        result.text_at(0),
        Some("Found 1 workflow(s) (filtered by active=true)")
    );

    let data = data_of(&result);
    let listed = data.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], "a");
    assert_eq!(listed[0]["name"], "Active flow");
    assert_eq!(listed[0]["active"], true);
    assert_eq!(listed[0]["updatedAt"], "2024-05-01T10:00:00.000Z");
    assert!(listed[0].get("nodes").is_none());
}

#[tokio::test]
async fn test_workflow_update_reads_then_puts_filtered_settings() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/workflows/wf-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "wf-1",
            "name": "Old name",
            "active": false,
            "nodes": [{"name": "Start", "type": "n8n-nodes-base.start"}],
            "connections": {},
            "settings": {
                "timezone": "Europe/Berlin",
                "callerPolicy": "workflowsFromSameOwner",
                "executionOrder": "v1"
            }
        })))
        .expect(1)
        .mount(&fixture.n8n)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/v1/workflows/wf-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "wf-1",
            "name": "New name",
            "active": false
        })))
        .expect(1)
        .mount(&fixture.n8n)
        .await;

    let result = fixture
        .call("workflow_update", json!({"workflowId": "wf-1", "name": "New name"}))
        .await;

    assert!(!result.is_error);
    assert!(result
        .text_at(0)
        .unwrap()
        .starts_with("Workflow updated successfully. Changes applied: name"));

    let requests = fixture.n8n.received_requests().await.unwrap();
    let put = requests
        .iter()
        .find(|r| r.method.to_string() == "PUT")
        .unwrap();
    let body: Value = serde_json::from_slice(&put.body).unwrap();

    assert_eq!(body["name"], "New name");
    assert_eq!(body["nodes"][0]["name"], "Start");
    assert_eq!(body["settings"]["timezone"], "Europe/Berlin");
    assert_eq!(body["settings"]["executionOrder"], "v1");
    assert!(body["settings"].get("callerPolicy").is_none());
    assert!(body.get("id").is_none());
}

#[tokio::test]
async fn test_workflow_update_without_changes() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/workflows/wf-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "wf-1",
            "name": "Unchanged",
            "active": true
        })))
        .mount(&fixture.n8n)
        .await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&fixture.n8n)
        .await;

    let result = fixture
        .call("workflow_update", json!({"workflowId": "wf-1"}))
        .await;

    assert!(!result.is_error);
    assert_eq!(
        result.text_at(0),
        Some("No changes requested - workflow unchanged")
    );
}

#[tokio::test]
async fn test_missing_required_argument_is_tool_error() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .server
        .handle_request(
            McpRequest::new(1i64, "tools/call")
                .with_params(json!({"name": "workflow_read", "arguments": {}})),
        )
        .await;

    let result = response.result.unwrap();
    assert_eq!(result["isError"], true);
    assert!(result["content"][0]["text"]
        .as_str()
        .unwrap()
        .contains("Missing required parameter: workflowId"));
}

// ============================================================================
// Tags
// ============================================================================

#[tokio::test]
async fn test_tag_delete_not_found() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/tags/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Tag not found"})),
        )
        .mount(&fixture.n8n)
        .await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&fixture.n8n)
        .await;

    let result = fixture.call("tag_delete", json!({"id": "missing"})).await;

    assert!(result.is_error);
    assert_eq!(result.content.len(), 1);
    let text = result.text_at(0).unwrap();
    assert!(text.starts_with("Error: "));
    assert!(text.contains("Tag not found"));
    assert!(text.contains("(Status: 404)"));
}

#[tokio::test]
async fn test_tag_delete_names_the_tag() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/tags/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "t1",
            "name": "production"
        })))
        .mount(&fixture.n8n)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/tags/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "t1",
            "name": "production"
        })))
        .expect(1)
        .mount(&fixture.n8n)
        .await;

    let result = fixture.call("tag_delete", json!({"id": "t1"})).await;

    assert!(!result.is_error);
    assert_eq!(
        result.text_at(0),
        Some("Tag \"production\" (t1) deleted successfully")
    );
}

// ============================================================================
// Variables and projects
// ============================================================================

#[tokio::test]
async fn test_variable_create_requires_license() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/variables"))
        .respond_with(
            ResponseTemplate::new(402).set_body_json(json!({"message": "Payment required"})),
        )
        .mount(&fixture.n8n)
        .await;

    let result = fixture
        .call("variable_create", json!({"key": "API_HOST", "value": "example.com"}))
        .await;

    assert!(result.is_error);
    assert!(result.text_at(0).unwrap().contains("enterprise license"));
}

#[tokio::test]
async fn test_variable_list_forbidden_is_empty() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/variables"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "Forbidden"})))
        .mount(&fixture.n8n)
        .await;

    let result = fixture.call("variable_list", json!({})).await;

    assert!(!result.is_error);
    assert_eq!(result.text_at(0), Some("Found 0 variable(s)."));
    assert_eq!(data_of(&result), json!([]));
}

#[tokio::test]
async fn test_project_list_license_forbidden_is_empty() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/projects"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "message": "Your license does not allow for feat:projectRole:admin"
        })))
        .mount(&fixture.n8n)
        .await;

    let result = fixture.call("project_list", json!({})).await;

    assert!(!result.is_error);
    assert_eq!(result.text_at(0), Some("Found 0 project(s)."));
}

#[tokio::test]
async fn test_project_list_other_forbidden_is_error() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/projects"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "Forbidden"})))
        .mount(&fixture.n8n)
        .await;

    let result = fixture.call("project_list", json!({})).await;

    assert!(result.is_error);
}

#[tokio::test]
async fn test_variable_create_accepts_empty_value() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/variables"))
        .and(body_json(json!({"key": "EMPTY", "value": ""})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "v9",
            "key": "EMPTY",
            "value": ""
        })))
        .expect(1)
        .mount(&fixture.n8n)
        .await;

    let result = fixture
        .call("variable_create", json!({"key": "EMPTY", "value": ""}))
        .await;

    assert!(!result.is_error);
    assert_eq!(result.text_at(0), Some("Variable \"EMPTY\" created successfully"));
    assert_eq!(data_of(&result)["id"], "v9");
}

#[tokio::test]
async fn test_variable_delete_by_key_lists_then_deletes() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/variables"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "v1", "key": "API_HOST"},
                {"id": "v2", "key": "API_TOKEN"}
            ]
        })))
        .expect(1)
        .mount(&fixture.n8n)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/variables/v2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&fixture.n8n)
        .await;

    let result = fixture
        .call("variable_delete", json!({"key": "API_TOKEN"}))
        .await;

    assert!(!result.is_error);
    assert_eq!(
        result.text_at(0),
        Some("Variable with key \"API_TOKEN\" deleted successfully")
    );
    assert_eq!(data_of(&result), json!({"id": "v2", "deleted": true}));
}

#[tokio::test]
async fn test_variable_delete_unknown_key_is_not_found() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/variables"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "v1", "key": "API_HOST"}]
        })))
        .mount(&fixture.n8n)
        .await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&fixture.n8n)
        .await;

    let result = fixture
        .call("variable_delete", json!({"key": "API_TOKEN"}))
        .await;

    assert!(result.is_error);
    assert_eq!(
        result.text_at(0),
        Some("Error: Variable with key \"API_TOKEN\" not found")
    );

    let err = fixture
        .clients
        .variables
        .delete_by_key("API_TOKEN", None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::NotFound);
}

#[tokio::test]
async fn test_variable_delete_forbidden_mentions_license() {
    let fixture = TestFixture::new().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/variables/v1"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "Forbidden"})))
        .expect(1)
        .mount(&fixture.n8n)
        .await;

    let result = fixture.call("variable_delete", json!({"id": "v1"})).await;

    assert!(result.is_error);
    assert_eq!(
        result.text_at(0),
        Some("Error: Variable deletion not available in current license or permission level (Status: 403)")
    );
}

#[tokio::test]
async fn test_project_writes_rewrite_license_errors() {
    let fixture = TestFixture::new().await;
    let forbidden = ResponseTemplate::new(403)
        .set_body_json(json!({"message": "Your license does not allow for feat:projectRole:admin"}));

    Mock::given(method("POST"))
        .and(path("/api/v1/projects"))
        .and(body_json(json!({"name": "Ops"})))
        .respond_with(forbidden.clone())
        .expect(1)
        .mount(&fixture.n8n)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/v1/projects/p1"))
        .respond_with(forbidden.clone())
        .expect(1)
        .mount(&fixture.n8n)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/projects/p1"))
        .respond_with(forbidden)
        .expect(1)
        .mount(&fixture.n8n)
        .await;

    let created = fixture
        .call("project_create", json!({"name": "Ops", "description": "ignored"}))
        .await;
    let updated = fixture
        .call("project_update", json!({"id": "p1", "name": "Ops 2"}))
        .await;
    let deleted = fixture.call("project_delete", json!({"id": "p1"})).await;

    assert_eq!(
        created.text_at(0),
        Some("Error: Project creation not available in current license tier (Status: 403)")
    );
    assert_eq!(
        updated.text_at(0),
        Some("Error: Project update not available in current license tier (Status: 403)")
    );
    assert_eq!(
        deleted.text_at(0),
        Some("Error: Project deletion not available in current license tier (Status: 403)")
    );
    assert!(created.is_error && updated.is_error && deleted.is_error);
}

#[tokio::test]
async fn test_project_force_delete_sends_query() {
    let fixture = TestFixture::new().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/projects/p1"))
        .and(query_param("force", "true"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&fixture.n8n)
        .await;

    let result = fixture
        .call("project_delete", json!({"id": "p1", "force": true}))
        .await;

    assert!(!result.is_error);
    assert_eq!(
        result.text_at(0),
        Some("Project with ID \"p1\" force deleted successfully")
    );
}

#[tokio::test]
async fn test_project_update_with_empty_response() {
    let fixture = TestFixture::new().await;

    Mock::given(method("PATCH"))
        .and(path("/api/v1/projects/p1"))
        .and(body_json(json!({"name": "Ops 2"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&fixture.n8n)
        .await;

    let result = fixture
        .call("project_update", json!({"id": "p1", "name": "Ops 2"}))
        .await;

    assert!(!result.is_error);
    assert_eq!(
        result.text_at(0),
        Some("Project \"Ops 2\" (p1) updated successfully")
    );
}

// ============================================================================
// Users and credentials
// ============================================================================

#[tokio::test]
async fn test_user_change_role_with_empty_response() {
    let fixture = TestFixture::new().await;

    Mock::given(method("PATCH"))
        .and(path("/api/v1/users/u1/role"))
        .and(body_json(json!({"newRoleName": "global:admin"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&fixture.n8n)
        .await;

    let result = fixture
        .call("user_change_role", json!({"id": "u1", "role": "admin"}))
        .await;

    assert!(!result.is_error);
    assert_eq!(
        result.text_at(0),
        Some("User role changed to admin successfully")
    );
    assert_eq!(data_of(&result), json!({"id": "u1", "role": "global:admin"}));
}

#[tokio::test]
async fn test_user_change_role_returns_updated_user() {
    let fixture = TestFixture::new().await;

    Mock::given(method("PATCH"))
        .and(path("/api/v1/users/u1/role"))
        .and(body_json(json!({"newRoleName": "global:member"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": "u1",
                "email": "ada@example.com",
                "role": "global:member",
                "settings": {"theme": "dark"}
            }
        })))
        .expect(1)
        .mount(&fixture.n8n)
        .await;

    let result = fixture
        .call("user_change_role", json!({"id": "u1", "role": "member"}))
        .await;

    assert!(!result.is_error);
    let data = data_of(&result);
    assert_eq!(data["email"], "ada@example.com");
    assert_eq!(data["role"], "global:member");
    assert!(data.get("settings").is_none());
}

#[tokio::test]
async fn test_user_change_role_rejects_owner_locally() {
    let fixture = TestFixture::new().await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&fixture.n8n)
        .await;

    let result = fixture
        .call("user_change_role", json!({"id": "u1", "role": "owner"}))
        .await;

    assert!(result.is_error);
    assert_eq!(
        result.text_at(0),
        Some("Error: Owner role cannot be changed via API")
    );
}

#[tokio::test]
async fn test_credential_move_posts_share_target() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/credentials/c1/share"))
        .and(body_json(json!({"shareWithId": "u2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&fixture.n8n)
        .await;

    let result = fixture
        .call("credential_move", json!({"id": "c1", "newOwnerId": "u2"}))
        .await;

    assert!(!result.is_error);
    assert_eq!(
        result.text_at(0),
        Some("Successfully moved/shared credential with ID c1")
    );
    assert_eq!(data_of(&result), json!({"success": true}));
}

#[tokio::test]
async fn test_credential_create_requires_object_data() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "c1"})))
        .expect(0)
        .mount(&fixture.n8n)
        .await;

    let err = fixture
        .server
        .call_tool(
            "credential_create",
            json!({"name": "Slack", "type": "slackApi", "data": "token"}),
            &ToolContext::new(),
        )
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Credential data must be an object"));
}

// ============================================================================
// Executions, source control and security audit
// ============================================================================

#[tokio::test]
async fn test_execution_run_takes_execution_id() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/workflows/wf-1/execute"))
        .and(body_json(json!({"input": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "executionId": 1234,
            "mode": "trigger"
        })))
        .expect(1)
        .mount(&fixture.n8n)
        .await;

    let result = fixture
        .call("execution_run", json!({"workflowId": "wf-1", "data": {"input": 1}}))
        .await;

    assert!(!result.is_error);
    assert_eq!(
        result.text_at(0),
        Some("Workflow execution started with ID: 1234")
    );
    let data = data_of(&result);
    assert_eq!(data["id"], "1234");
    assert_eq!(data["workflowId"], "wf-1");
    assert_eq!(data["mode"], "trigger");
}

#[tokio::test]
async fn test_execution_run_falls_back_to_id() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/workflows/wf-2/execute"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "exec-9"})))
        .expect(1)
        .mount(&fixture.n8n)
        .await;

    let result = fixture
        .call("execution_run", json!({"workflowId": "wf-2"}))
        .await;

    assert!(!result.is_error);
    assert_eq!(
        result.text_at(0),
        Some("Workflow execution started with ID: exec-9")
    );
    assert_eq!(data_of(&result)["status"], "running");
}

#[tokio::test]
async fn test_execution_list_negative_limit_returns_all() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/executions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": 1, "workflowId": "wf-1", "status": "success", "finished": true},
                {"id": 2, "workflowId": "wf-1", "status": "error", "finished": true},
                {"id": 3, "workflowId": "wf-2", "status": "success", "finished": true}
            ]
        })))
        .mount(&fixture.n8n)
        .await;

    let all = fixture.call("execution_list", json!({"limit": -1})).await;
    assert_eq!(all.text_at(0), Some("Found 3 execution(s)."));

    let two = fixture.call("execution_list", json!({"limit": 2.0})).await;
    assert_eq!(two.text_at(0), Some("Found 2 execution(s)."));
    assert_eq!(data_of(&two)["totalAvailable"], 3);
}

#[tokio::test]
async fn test_source_control_pull_reports_conflicts() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/source-control/pull"))
        .and(body_json(json!({"force": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "filesUpdated": 3,
            "hasConflicts": true,
            "conflicts": ["workflows/a.json"]
        })))
        .expect(1)
        .mount(&fixture.n8n)
        .await;

    let result = fixture
        .call("source_control_pull", json!({"force": true}))
        .await;

    assert!(!result.is_error);
    assert_eq!(
        result.text_at(0),
        Some("Successfully pulled changes. 3 files updated. Conflicts detected in 1 file(s).")
    );
}

#[tokio::test]
async fn test_security_audit_sends_workflow_ids() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/security/audit/generate"))
        .and(query_param("workflowIds", "a,b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "auditDate": "2024-05-01T00:00:00Z",
            "summary": {
                "totalWorkflows": 2,
                "issuesFound": 1,
                "highIssues": 1
            },
            "workflowResults": [{
                "workflowId": "a",
                "workflowName": "Alpha",
                "issues": [{"id": "i1", "severity": "high", "title": "Hardcoded secret"}]
            }]
        })))
        .expect(1)
        .mount(&fixture.n8n)
        .await;

    let result = fixture
        .call("security_audit_generate", json!({"workflowIds": ["a", "b"]}))
        .await;

    assert!(!result.is_error);
    assert_eq!(
        result.text_at(0),
        Some("Successfully generated security audit for 2 workflows")
    );
    assert_eq!(data_of(&result)["summary"]["highIssues"], 1);
}

// ============================================================================
// Tags and workflow tags
// ============================================================================

#[tokio::test]
async fn test_tag_list_passes_search() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/tags"))
        .and(query_param("search", "prod"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "t1", "name": "production"}]
        })))
        .expect(1)
        .mount(&fixture.n8n)
        .await;

    let result = fixture.call("tag_list", json!({"search": "prod"})).await;

    assert!(!result.is_error);
    assert_eq!(result.text_at(0), Some("Found 1 tag(s) matching \"prod\"."));
}

#[tokio::test]
async fn test_tag_create_validation_error() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/tags"))
        .and(body_json(json!({"name": "production"})))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "Tag already exists"})),
        )
        .expect(1)
        .mount(&fixture.n8n)
        .await;

    let result = fixture.call("tag_create", json!({"name": "production"})).await;

    assert!(result.is_error);
    assert_eq!(
        result.text_at(0),
        Some("Error: Tag creation failed due to validation: Tag already exists (Status: 400)")
    );
}

#[tokio::test]
async fn test_workflow_tags_update_puts_tag_refs() {
    let fixture = TestFixture::new().await;

    Mock::given(method("PUT"))
        .and(path("/api/v1/workflows/wf-1/tags"))
        .and(body_json(json!([{"id": "t1"}, {"id": "t2"}])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "t1", "name": "production"},
            {"id": "t2", "name": "billing"}
        ])))
        .expect(1)
        .mount(&fixture.n8n)
        .await;

    let result = fixture
        .call(
            "workflow_tags_update",
            json!({"workflowId": "wf-1", "tagIds": ["t1", "t2"]}),
        )
        .await;

    assert!(!result.is_error);
    assert_eq!(
        result.text_at(0),
        Some("Successfully updated tags for workflow wf-1")
    );
    assert_eq!(data_of(&result).as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_workflow_tags_list() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/workflows/wf-1/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "t1", "name": "production"}
        ])))
        .expect(1)
        .mount(&fixture.n8n)
        .await;

    let result = fixture
        .call("workflow_tags_list", json!({"workflowId": "wf-1"}))
        .await;

    assert!(!result.is_error);
    assert_eq!(
        result.text_at(0),
        Some("Successfully retrieved 1 tags for workflow wf-1")
    );
}

// ============================================================================
// Webhooks and transport errors
// ============================================================================

#[tokio::test]
async fn test_webhook_posts_with_basic_auth() {
    let fixture = TestFixture::with_config(|config| {
        config.webhook_username = Some("user".to_string());
        config.webhook_password = Some("pass".to_string());
    })
    .await;

    // Webhooks must not carry the API key.
    Mock::given(header_exists("X-N8N-API-KEY"))
        .and(path("/webhook/orders"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&fixture.n8n)
        .await;

    Mock::given(method("POST"))
        .and(path("/webhook/orders"))
        .and(header("authorization", "Basic dXNlcjpwYXNz"))
        .and(header("x-source", "tests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"received": true})))
        .expect(1)
        .mount(&fixture.n8n)
        .await;

    let result = fixture
        .call(
            "execution_run_webhook",
            json!({
                "workflowName": "orders",
                "data": {"orderId": 42},
                "headers": {"x-source": "tests"}
            }),
        )
        .await;

    assert!(!result.is_error, "{:?}", result.text_at(0));
    assert_eq!(result.text_at(0), Some("Webhook executed successfully"));

    let data = data_of(&result);
    assert_eq!(data["status"], 200);
    assert_eq!(data["data"]["received"], true);

    let requests = fixture.n8n.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body, json!({"orderId": 42}));
}

#[tokio::test]
async fn test_webhook_failure_status() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/webhook/broken"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"code": 404})))
        .mount(&fixture.n8n)
        .await;

    let result = fixture
        .call("execution_run_webhook", json!({"workflowName": "broken"}))
        .await;

    assert!(result.is_error);
    assert!(result
        .text_at(0)
        .unwrap()
        .starts_with("Error: Webhook execution failed with status 404"));
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    // Nothing listens on port 9 locally.
    let clients =
        N8nClients::from_config(N8nConfig::new("http://127.0.0.1:9/api/v1", API_KEY)).unwrap();

    let err = clients.tags.list(Default::default()).await.unwrap_err();

    assert_eq!(err.kind, ApiErrorKind::Network);
    assert_eq!(err.status_code, None);
}

#[tokio::test]
async fn test_rejected_api_key_is_authentication_error() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "unauthorized"})))
        .mount(&fixture.n8n)
        .await;

    let err = fixture.clients.users.list().await.unwrap_err();

    assert_eq!(err.kind, ApiErrorKind::Authentication);
    assert_eq!(err.status_code, Some(401));
}

// ============================================================================
// JSON-RPC end to end
// ============================================================================

#[tokio::test]
async fn test_resources_read_tags() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "1", "name": "prod", "color": "#ff0000", "updatedAt": "2024-02-01T00:00:00Z"},
                {"id": "2", "name": "dev", "updatedAt": "2024-03-01T00:00:00Z"}
            ]
        })))
        .mount(&fixture.n8n)
        .await;

    let response = fixture
        .server
        .handle_request(
            McpRequest::new(7i64, "resources/read").with_params(json!({"uri": "n8n://tags"})),
        )
        .await;

    assert!(response.error.is_none());
    let result = response.result.unwrap();
    assert_eq!(result["contents"][0]["uri"], "n8n://tags");

    let document: Value =
        serde_json::from_str(result["contents"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(document["resourceType"], "tags");
    assert_eq!(document["count"], 2);
    assert_eq!(document["_links"]["self"], "n8n://tags");
    assert_eq!(document["recentTags"][0]["name"], "dev");
}

#[tokio::test]
async fn test_resources_read_failure_is_internal_error() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
        .mount(&fixture.n8n)
        .await;

    let response = fixture
        .server
        .handle_request(
            McpRequest::new(8i64, "resources/read").with_params(json!({"uri": "n8n://users"})),
        )
        .await;

    let error = response.error.unwrap();
    assert_eq!(error.code, -32603);
    assert!(error.message.starts_with("Failed to retrieve users: "));
}

#[tokio::test]
async fn test_tools_list_over_json_rpc() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .server
        .handle_request(McpRequest::new(2i64, "tools/list"))
        .await;

    let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();
    let names: Vec<&str> = tools.iter().filter_map(|t| t["name"].as_str()).collect();

    assert_eq!(tools.len(), 38);
    assert!(names.contains(&"workflow_list"));
    assert!(names.contains(&"execution_run_webhook"));
    assert!(names.contains(&"security_audit_generate"));
    assert!(tools.iter().all(|t| t["inputSchema"]["type"] == "object"));
}
