use aerogear_pipes::authentication::rest::RestAuthenticationModuleBuilder;
use aerogear_pipes::{
    AUTH_TOKEN_HEADER, AuthenticationModule, HeaderAndBody, PipeError, RestAuthenticationModule,
    Result, channel,
};
use httpmock::prelude::*;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const TOKEN: &str = "abc123";

fn builder(server: &MockServer) -> RestAuthenticationModuleBuilder {
    RestAuthenticationModule::builder().base_url(server.url("/todo-server"))
}

async fn login(module: &RestAuthenticationModule, username: &str, password: &str) -> Result<HeaderAndBody> {
    let (callback, completion) = channel();
    module.login(username, password, callback).unwrap();
    completion.await
}

async fn enroll(module: &RestAuthenticationModule, user_data: HashMap<String, String>) -> Result<HeaderAndBody> {
    let (callback, completion) = channel();
    module.enroll(user_data, callback).unwrap();
    completion.await
}

fn user_data(username: &str) -> HashMap<String, String> {
    [
        ("username", username),
        ("password", "123"),
        ("firstname", "Summers"),
        ("lastname", "Pittman"),
        ("role", "admin"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[tokio::test]
async fn login_fails_with_401() {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/todo-server/auth/login")
            .json_body(json!({"username": "fail", "password": "pw"}));
        then.status(401).body("Unauthorized");
    });

    let module = builder(&server).build().unwrap();
    let err = login(&module, "fail", "pw").await.unwrap_err();

    mock.assert();
    assert_eq!(err.status_code(), Some(401));
    assert_eq!(err.body(), Some("Unauthorized"));
    assert!(!module.is_authenticated());
    assert_eq!(module.auth_token(), "");
}

#[tokio::test]
async fn login_succeeds_with_token_in_body() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST)
            .path("/todo-server/auth/login")
            .header("content-type", "application/json")
            .json_body(json!({"username": "ok", "password": "pw"}));
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"Auth-Token":"abc123"}"#);
    });

    let module = builder(&server).build().unwrap();
    let response = login(&module, "ok", "pw").await.unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.field(AUTH_TOKEN_HEADER).as_deref(), Some(TOKEN));
    assert!(module.is_authenticated());
    assert_eq!(module.auth_token(), TOKEN);
    assert_eq!(module.credential().as_deref(), Some(TOKEN));
}

#[tokio::test]
async fn login_reads_token_from_response_header() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/todo-server/auth/login");
        then.status(200).header(AUTH_TOKEN_HEADER, "from-header").body("{}");
    });

    let module = builder(&server).build().unwrap();
    login(&module, "ok", "pw").await.unwrap();

    assert_eq!(module.auth_token(), "from-header");
}

#[tokio::test]
async fn login_falls_back_to_body_when_token_header_is_empty() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/todo-server/auth/login");
        then.status(200)
            .header(AUTH_TOKEN_HEADER, "")
            .body(r#"{"Auth-Token":"abc123"}"#);
    });

    let module = builder(&server).build().unwrap();
    login(&module, "ok", "pw").await.unwrap();

    assert!(module.is_authenticated());
    assert_eq!(module.auth_token(), TOKEN);
}

#[tokio::test]
async fn login_without_token_in_response_fails() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/todo-server/auth/login");
        then.status(200).body(r#"{"welcome":"ok"}"#);
    });

    let module = builder(&server).build().unwrap();
    let err = login(&module, "ok", "pw").await.unwrap_err();

    assert!(matches!(err, PipeError::Parse(_)));
    assert!(!module.is_authenticated());
    assert_eq!(module.auth_token(), "");
}

#[tokio::test]
async fn login_payload_escapes_special_characters() {
    let server = MockServer::start_async().await;
    let username = r#"o'brien, "the admin""#;
    let password = "p,w'\"}";
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/todo-server/auth/login")
            .json_body(json!({"username": username, "password": password}));
        then.status(200).body(r#"{"Auth-Token":"abc123"}"#);
    });

    let module = builder(&server).build().unwrap();
    login(&module, username, password).await.unwrap();

    mock.assert();
    assert!(module.is_authenticated());
}

#[tokio::test]
async fn failed_relogin_leaves_existing_session_untouched() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST)
            .path("/todo-server/auth/login")
            .json_body(json!({"username": "ok", "password": "pw"}));
        then.status(200).body(r#"{"Auth-Token":"abc123"}"#);
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/todo-server/auth/login")
            .json_body(json!({"username": "fail", "password": "pw"}));
        then.status(401).body("Unauthorized");
    });

    let module = builder(&server).build().unwrap();
    login(&module, "ok", "pw").await.unwrap();
    let before = module.session();

    assert!(login(&module, "fail", "pw").await.is_err());
    assert_eq!(module.session(), before);
}

#[tokio::test]
async fn enroll_succeeds_and_logs_in() {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/todo-server/auth/enroll")
            .json_body(json!({
                "username": "ok",
                "password": "123",
                "firstname": "Summers",
                "lastname": "Pittman",
                "role": "admin"
            }));
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"username":"ok","Auth-Token":"abc123"}"#);
    });

    let module = builder(&server).build().unwrap();
    let response = enroll(&module, user_data("ok")).await.unwrap();

    mock.assert();
    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["username"], "ok");
    assert!(module.is_authenticated());
    assert_eq!(module.auth_token(), TOKEN);
}

#[tokio::test]
async fn enroll_fails_with_400() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/todo-server/auth/enroll");
        then.status(400).body(r#"{"error":"username taken"}"#);
    });

    let module = builder(&server).build().unwrap();
    let err = enroll(&module, user_data("dup")).await.unwrap_err();

    assert_eq!(err.status_code(), Some(400));
    assert!(!err.is_unauthorized());
    assert!(!module.is_authenticated());
    assert_eq!(module.auth_token(), "");
}

#[tokio::test]
async fn logout_resets_session_and_sends_token() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/todo-server/auth/login");
        then.status(200).body(r#"{"Auth-Token":"abc123"}"#);
    });
    let logout_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/todo-server/auth/logout")
            .header(AUTH_TOKEN_HEADER, TOKEN);
        then.status(200).body("");
    });

    let module = builder(&server).build().unwrap();
    login(&module, "ok", "pw").await.unwrap();
    assert!(module.is_authenticated());

    let (callback, completion) = channel::<()>();
    module.logout(callback).unwrap();
    completion.await.unwrap();

    logout_mock.assert();
    assert!(!module.is_authenticated());
    assert_eq!(module.auth_token(), "");
}

#[tokio::test]
async fn logout_when_never_logged_in_still_resets() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST)
            .path("/todo-server/auth/logout")
            .header_missing(AUTH_TOKEN_HEADER);
        then.status(204);
    });

    let module = builder(&server).build().unwrap();
    let (callback, completion) = channel::<()>();
    module.logout(callback).unwrap();
    completion.await.unwrap();

    assert!(!module.is_authenticated());
    assert_eq!(module.auth_token(), "");
}

#[tokio::test]
async fn custom_endpoints_are_used() {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST).path("/todo-server/session/new");
        then.status(200).body(r#"{"Auth-Token":"abc123"}"#);
    });

    let module = builder(&server)
        .login_endpoint("/session/new")
        .build()
        .unwrap();
    assert_eq!(module.login_endpoint(), "/session/new");
    assert_eq!(
        module.login_url(),
        format!("{}/session/new", server.url("/todo-server"))
    );

    login(&module, "ok", "pw").await.unwrap();
    mock.assert();
}

#[tokio::test]
async fn every_call_completes_exactly_once() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST)
            .path("/todo-server/auth/login")
            .json_body(json!({"username": "ok", "password": "pw"}));
        then.status(200).body(r#"{"Auth-Token":"abc123"}"#);
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/todo-server/auth/login")
            .json_body(json!({"username": "fail", "password": "pw"}));
        then.status(401).body("Unauthorized");
    });

    let module = builder(&server).build().unwrap();
    let successes = Arc::new(AtomicUsize::new(0));
    let failures = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for i in 0..10 {
        let successes = successes.clone();
        let failures = failures.clone();
        let username = if i % 2 == 0 { "ok" } else { "fail" };
        let handle = module
            .login(
                username,
                "pw",
                Box::new(move |result: Result<HeaderAndBody>| match result {
                    Ok(_) => {
                        successes.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(_) => {
                        failures.fetch_add(1, Ordering::SeqCst);
                    }
                }),
            )
            .unwrap();
        handles.push(handle);
    }

    for handle in handles {
        handle.join().await.unwrap();
    }

    assert_eq!(successes.load(Ordering::SeqCst), 5);
    assert_eq!(failures.load(Ordering::SeqCst), 5);
    assert!(module.is_authenticated());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_logins_never_expose_torn_state() {
    let server = MockServer::start_async().await;
    for user in ["alice", "bob"] {
        server.mock(|when, then| {
            when.method(POST)
                .path("/todo-server/auth/login")
                .json_body(json!({"username": user, "password": "pw"}));
            then.status(200)
                .body(format!(r#"{{"Auth-Token":"token-{}"}}"#, user));
        });
    }

    let module = Arc::new(builder(&server).build().unwrap());

    let observer = {
        let module = module.clone();
        tokio::spawn(async move {
            for _ in 0..2_000 {
                let session = module.session();
                assert_eq!(session.is_authenticated(), !session.token().is_empty());
                tokio::task::yield_now().await;
            }
        })
    };

    let mut completions = Vec::new();
    for round in 0..20 {
        let user = if round % 2 == 0 { "alice" } else { "bob" };
        let (callback, completion) = channel();
        module.login(user, "pw", callback).unwrap();
        completions.push(completion);
    }
    for completion in completions {
        completion.await.unwrap();
    }
    observer.await.unwrap();

    let token = module.auth_token();
    assert!(token == "token-alice" || token == "token-bob");
    assert!(module.is_authenticated());
}

#[test]
fn runtime_shutdown_during_login_fails_callback_once() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/todo-server/auth/login");
        then.status(200)
            .delay(Duration::from_secs(5))
            .body(r#"{"Auth-Token":"abc123"}"#);
    });

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let module = builder(&server)
        .runtime(runtime.handle().clone())
        .build()
        .unwrap();

    let outcomes = Arc::new(Mutex::new(Vec::new()));
    let recorded = outcomes.clone();
    module
        .login(
            "ok",
            "pw",
            Box::new(move |result: Result<HeaderAndBody>| {
                recorded.lock().unwrap().push(result);
            }),
        )
        .unwrap();

    runtime.shutdown_timeout(Duration::from_millis(200));

    let outcomes = outcomes.lock().unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(outcomes[0], Err(PipeError::Internal(_))));
    assert!(!module.is_authenticated());
    assert_eq!(module.auth_token(), "");
}

#[test]
fn build_fails_fast_on_malformed_url() {
    let result = RestAuthenticationModule::builder()
        .base_url("localhost with spaces")
        .build();
    assert!(matches!(result, Err(PipeError::InvalidConfiguration(_))));
}
