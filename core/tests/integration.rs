//! Full page cycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives `TodoApp` over real
//! HTTP through `UreqTransport`. Validates that the client's request
//! building, response parsing, cache refresh and mutation callbacks work
//! end-to-end with the actual server. A small cookie server checks how
//! `UreqTransport` honours the credentials mode.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{http::header, routing::get, Router};
use todo_client::{
    ApiError, ClientConfig, CredentialsMode, HttpMethod, HttpRequest, IntentError, ListView,
    MutationStatus, QueryKey, QueryState, TodoApp, TodoClient, Transport, UreqTransport,
};

/// Start the mock server on its own thread and return its address.
fn spawn_server() -> SocketAddr {
    spawn_router(mock_server::app())
}

fn client(addr: SocketAddr) -> TodoClient {
    TodoClient::new(ClientConfig::new(&format!("http://{addr}")))
}

fn titles(app: &TodoApp) -> Vec<(String, bool)> {
    app.cache()
        .data(QueryKey::TodoList)
        .map(|todos| todos.iter().map(|t| (t.title.clone(), t.completed)).collect())
        .unwrap_or_default()
}

#[test]
fn client_crud_lifecycle() {
    let addr = spawn_server();
    let client = client(addr);
    let transport = UreqTransport::new();

    assert!(client.list(&transport).unwrap().is_empty());

    let created = client.create(&transport, "Integration test").unwrap();
    assert_eq!(created.title, "Integration test");
    assert!(!created.completed);
    let id = created.id;

    assert_eq!(client.get(&transport, id).unwrap(), created);

    let updated = client.update(&transport, id, true).unwrap();
    assert_eq!(updated.title, "Integration test");
    assert!(updated.completed);

    assert_eq!(client.list(&transport).unwrap().len(), 1);

    client.destroy(&transport, id).unwrap();
    assert!(matches!(client.get(&transport, id), Err(ApiError::NotFound)));
    assert!(matches!(client.destroy(&transport, id), Err(ApiError::NotFound)));
    assert!(client.list(&transport).unwrap().is_empty());
}

#[test]
fn backend_rejects_short_titles_the_client_would_block() {
    let addr = spawn_server();
    let err = client(addr)
        .create(&UreqTransport::new(), "abc")
        .unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 400, .. }));
}

#[test]
fn page_cycle_against_live_server() {
    let addr = spawn_server();
    let transport = UreqTransport::new();
    let mut app = TodoApp::new(client(addr));

    // empty list
    assert_eq!(app.load(), QueryState::Pending);
    app.run_until_idle(&transport);
    assert_eq!(app.view(Instant::now()).list, ListView::Empty);

    // invalid title is blocked locally
    app.change_title("");
    assert!(matches!(app.submit(), Err(IntentError::Invalid(_))));
    assert_eq!(app.run_until_idle(&transport), 0);

    // create, then the refetch shows it
    app.change_title("Buy milk");
    app.submit().unwrap();
    assert_eq!(app.run_until_idle(&transport), 2);
    assert_eq!(titles(&app), vec![("Buy milk".to_string(), false)]);
    let id = app.cache().data(QueryKey::TodoList).unwrap()[0].id;

    // toggle twice returns to the original value
    assert_eq!(app.toggle(id), Ok(true));
    app.run_until_idle(&transport);
    assert_eq!(titles(&app), vec![("Buy milk".to_string(), true)]);
    assert_eq!(app.toggle(id), Ok(false));
    app.run_until_idle(&transport);
    assert_eq!(titles(&app), vec![("Buy milk".to_string(), false)]);

    // delete, then delete again
    app.destroy(id).unwrap();
    app.run_until_idle(&transport);
    assert!(titles(&app).is_empty());

    app.destroy(id).unwrap();
    app.run_until_idle(&transport);
    assert_eq!(app.destroy_mutation().status(), MutationStatus::Error);
    assert_eq!(app.view(Instant::now()).list, ListView::Empty);
}

#[test]
fn unreachable_backend_offers_retry() {
    // bind then drop so nothing is listening on the port
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let transport = UreqTransport::new();
    let mut app = TodoApp::new(client(addr));

    app.load();
    app.run_until_idle(&transport);
    assert!(matches!(app.load(), QueryState::Failed { error: ApiError::Transport(_) }));

    let toast = app.toaster().all()[0].clone();
    assert!(toast.message.starts_with("Error: "));
    app.retry(toast.id).unwrap();
    let retried = app.poll_request().unwrap();
    assert_eq!(retried.request, app.client().build_list_todos());
    let outcome = transport.execute(retried.request);
    assert!(outcome.is_err());
    app.complete(retried.ticket, outcome);
    assert_eq!(app.toaster().all().len(), 1);
}

/// Serve a router on its own thread and return its address.
fn spawn_router(router: Router) -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            axum::serve(listener, router).await
        })
        .unwrap();
    });

    addr
}

/// `/login` sets a session cookie, `/whoami` echoes the cookie header back.
fn session_server() -> SocketAddr {
    spawn_router(
        Router::new()
            .route(
                "/login",
                get(|| async { ([(header::SET_COOKIE, "session=abc123; Path=/")], "ok") }),
            )
            .route(
                "/whoami",
                get(|headers: axum::http::HeaderMap| async move {
                    headers
                        .get(header::COOKIE)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string()
                }),
            ),
    )
}

fn get_with(addr: SocketAddr, path: &str, credentials: CredentialsMode) -> HttpRequest {
    HttpRequest {
        method: HttpMethod::Get,
        path: format!("http://{addr}{path}"),
        headers: Vec::new(),
        body: None,
        credentials,
    }
}

#[test]
fn include_credentials_keeps_cookies_between_requests() {
    let addr = session_server();
    let transport = UreqTransport::new();

    let login = transport
        .execute(get_with(addr, "/login", CredentialsMode::Include))
        .unwrap();
    assert_eq!(login.status, 200);

    let whoami = transport
        .execute(get_with(addr, "/whoami", CredentialsMode::Include))
        .unwrap();
    assert_eq!(whoami.body, "session=abc123");
}

#[test]
fn omit_credentials_sends_no_cookies() {
    let addr = session_server();
    let transport = UreqTransport::new();

    transport
        .execute(get_with(addr, "/login", CredentialsMode::Include))
        .unwrap();
    let whoami = transport
        .execute(get_with(addr, "/whoami", CredentialsMode::Omit))
        .unwrap();
    assert_eq!(whoami.status, 200);
    assert_eq!(whoami.body, "");
}

#[test]
fn cookies_from_omitting_requests_are_not_kept() {
    let addr = session_server();
    let transport = UreqTransport::new();

    transport
        .execute(get_with(addr, "/login", CredentialsMode::Omit))
        .unwrap();
    let whoami = transport
        .execute(get_with(addr, "/whoami", CredentialsMode::Include))
        .unwrap();
    assert_eq!(whoami.body, "");
}
