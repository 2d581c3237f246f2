use httpmock::prelude::*;
use regdiag::db::turso::TursoClient;
use regdiag::error::DiagError;
use serde_json::json;
use url::Url;

fn client_for(server: &MockServer, token: &str) -> TursoClient {
    let base = Url::parse(&server.base_url()).expect("mock base url");
    TursoClient::new(reqwest::Client::new(), &base, token).expect("build client")
}

#[tokio::test]
async fn execute_sends_the_statement_with_bearer_auth() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/execute")
            .header("authorization", "Bearer test-token")
            .json_body(json!({"stmt": "SELECT 1 as test"}));
        then.status(200)
            .json_body(json!({"results": {"columns": ["test"], "rows": [[1]]}}));
    });

    let client = client_for(&server, "test-token");
    let set = client.execute("SELECT 1 as test").await.expect("execute");

    mock.assert();
    assert_eq!(set.columns, vec!["test"]);
    assert_eq!(set.rows, vec![vec![json!(1)]]);
}

#[tokio::test]
async fn bare_result_sets_are_accepted() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/execute");
        then.status(200)
            .json_body(json!({"columns": ["name"], "rows": [["empresas"], ["valorizaciones"]]}));
    });

    let client = client_for(&server, "test-token");
    let tables = client.list_tables().await.expect("list tables");

    assert_eq!(tables, vec!["empresas", "valorizaciones"]);
}

#[tokio::test]
async fn auth_failures_surface_status_and_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/execute");
        then.status(401).body("unauthorized: token expired");
    });

    let client = client_for(&server, "stale-token");
    let err = client.execute("SELECT 1").await.expect_err("should fail");

    match err {
        DiagError::TursoApi { status, message } => {
            assert_eq!(status, 401);
            assert!(message.contains("unauthorized"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn count_reads_the_first_cell() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST)
            .path("/v1/execute")
            .json_body(json!({"stmt": "SELECT COUNT(*) FROM empresas"}));
        then.status(200)
            .json_body(json!({"results": {"columns": ["COUNT(*)"], "rows": [[3]]}}));
    });

    let client = client_for(&server, "test-token");
    assert_eq!(client.count_empresas().await.expect("count"), 3);
}

#[tokio::test]
async fn init_schema_executes_one_statement_per_call() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/v1/execute");
        then.status(200)
            .json_body(json!({"results": {"columns": [], "rows": []}}));
    });

    let client = client_for(&server, "test-token");
    client.init_schema().await.expect("init schema");

    // One CREATE TABLE plus three CREATE INDEX statements.
    mock.assert_hits(4);
}

#[tokio::test]
async fn probe_insert_is_fire_and_forget() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/v1/execute").json_body(json!({
            "stmt": "INSERT OR IGNORE INTO empresas (ruc, razon_social, fuente_datos) \
                     VALUES ('12345678901', 'EMPRESA DE PRUEBA S.A.C.', 'TEST')"
        }));
        then.status(200)
            .json_body(json!({"results": {"columns": [], "rows": []}}));
    });

    let client = client_for(&server, "test-token");
    client.insert_probe_row().await.expect("insert probe row");

    mock.assert();
}
