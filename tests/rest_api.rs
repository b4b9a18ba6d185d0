use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use gimbal_panel::client::config::ClientConfig;
use gimbal_panel::client::models::app_state::ControlSession;
use gimbal_panel::client::services::rest_api::{RestCall, RestClient};
use gimbal_panel::common::error::PanelError;
use gimbal_panel::common::models::{ConnectReply, ConnectRequest, DeviceAction};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    body: String,
}

/// Canned backend: answers `(method, path)` with a fixed status and body and
/// records every request it sees.
struct FakeBackend {
    url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeBackend {
    async fn start(routes: Vec<(&'static str, &'static str, u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let routes: HashMap<(String, String), (u16, String)> = routes
            .into_iter()
            .map(|(m, p, code, body)| ((m.to_string(), p.to_string()), (code, body)))
            .collect();
        let routes = Arc::new(routes);
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = requests.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else { break };
                let routes = routes.clone();
                let recorded = recorded.clone();
                tokio::spawn(async move {
                    let mut reader = BufReader::new(stream);
                    let mut request_line = String::new();
                    if reader.read_line(&mut request_line).await.unwrap_or(0) == 0 {
                        return;
                    }
                    let mut parts = request_line.split_whitespace();
                    let method = parts.next().unwrap_or_default().to_string();
                    let path = parts.next().unwrap_or_default().to_string();

                    let mut content_length = 0usize;
                    loop {
                        let mut line = String::new();
                        reader.read_line(&mut line).await.unwrap();
                        let line = line.trim_end();
                        if line.is_empty() {
                            break;
                        }
                        if let Some((name, value)) = line.split_once(':') {
                            if name.eq_ignore_ascii_case("content-length") {
                                content_length = value.trim().parse().unwrap_or(0);
                            }
                        }
                    }
                    let mut body = vec![0u8; content_length];
                    reader.read_exact(&mut body).await.unwrap();

                    recorded.lock().unwrap().push(Recorded {
                        method: method.clone(),
                        path: path.clone(),
                        body: String::from_utf8_lossy(&body).to_string(),
                    });

                    let (code, payload) = routes
                        .get(&(method, path))
                        .cloned()
                        .unwrap_or((404, json!({"detail": "Not Found"}).to_string()));
                    let response = format!(
                        "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        code,
                        payload.len(),
                        payload
                    );
                    let mut stream = reader.into_inner();
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        Self {
            url: format!("http://{}", addr),
            requests,
        }
    }

    fn config(&self) -> ClientConfig {
        let url = self.url.clone();
        ClientConfig::from_lookup(move |key| (key == "PANEL_BACKEND_URL").then(|| url.clone())).unwrap()
    }

    fn client(&self) -> RestClient {
        RestClient::new(&self.config()).unwrap()
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

#[tokio::test]
async fn port_list_prefills_first_port() {
    let backend = FakeBackend::start(vec![(
        "GET",
        "/api/ports",
        200,
        json!({"ports": ["/dev/ttyUSB0", "/dev/ttyUSB1"]}).to_string(),
    )])
    .await;
    let rest = backend.client();
    let mut session = ControlSession::new(&backend.config());

    session.on_rest_outcome(rest.execute(RestCall::ListPorts).await);

    assert_eq!(session.port_options, vec!["/dev/ttyUSB0", "/dev/ttyUSB1"]);
    assert_eq!(session.settings.selected_port, "/dev/ttyUSB0");
    assert!(session.log.is_empty());
}

#[tokio::test]
async fn port_list_failure_is_logged_once() {
    let backend = FakeBackend::start(vec![("GET", "/api/ports", 200, "<html>oops</html>".to_string())]).await;
    let rest = backend.client();
    assert!(matches!(rest.list_ports().await, Err(PanelError::Decode(_))));

    let mut session = ControlSession::new(&backend.config());
    session.on_rest_outcome(rest.execute(RestCall::ListPorts).await);
    assert_eq!(session.log.len(), 1);
    assert!(session.log.latest().unwrap().message.starts_with("Failed to load ports:"));
    assert!(session.port_options.is_empty());
}

#[tokio::test]
async fn connect_posts_port_and_baud() {
    let backend = FakeBackend::start(vec![(
        "POST",
        "/api/connect",
        200,
        json!({"status": "ok", "port": "/dev/ttyUSB0"}).to_string(),
    )])
    .await;
    let rest = backend.client();
    let mut session = ControlSession::new(&backend.config());
    session.set_port("/dev/ttyUSB0".to_string());
    session.set_baud(115_200);

    let effects = session.connect();
    assert_eq!(effects.len(), 1);
    let reply = rest
        .connect(&ConnectRequest { port: "/dev/ttyUSB0".into(), baud: 115_200 })
        .await
        .unwrap();
    assert_eq!(reply, ConnectReply::Accepted { status: "ok".into() });
    session.on_rest_outcome(gimbal_panel::client::services::rest_api::RestOutcome::Connect(Ok(reply)));
    assert_eq!(session.log.latest().unwrap().message, "Connect req: ok");

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/api/connect");
    let body: Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body, json!({"port": "/dev/ttyUSB0", "baud": 115200}));
}

#[tokio::test]
async fn rejected_connect_reports_detail() {
    let backend = FakeBackend::start(vec![(
        "POST",
        "/api/connect",
        400,
        json!({"detail": "busy"}).to_string(),
    )])
    .await;
    let rest = backend.client();
    let mut session = ControlSession::new(&backend.config());

    let outcome = rest
        .execute(RestCall::Connect(ConnectRequest { port: "COM4".into(), baud: 9600 }))
        .await;
    session.on_rest_outcome(outcome);
    assert_eq!(session.log.latest().unwrap().message, "Error: busy");
}

#[tokio::test]
async fn empty_port_sends_nothing() {
    let backend = FakeBackend::start(Vec::new()).await;
    let mut session = ControlSession::new(&backend.config());

    assert!(session.connect().is_empty());
    assert_eq!(session.log.len(), 1);
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn device_actions_hit_their_endpoints() {
    let ok = || json!({"status": "ok"}).to_string();
    let backend = FakeBackend::start(vec![
        ("POST", "/api/gimbal/center", 200, ok()),
        ("POST", "/api/gimbal/stop", 200, ok()),
        ("POST", "/api/camera/photo", 200, ok()),
        ("POST", "/api/camera/record", 200, json!({"status": "ok", "action": "toggle"}).to_string()),
        ("POST", "/api/disconnect", 200, json!({"status": "disconnected"}).to_string()),
    ])
    .await;
    let rest = backend.client();

    for action in DeviceAction::ALL {
        rest.trigger(action).await.unwrap();
    }
    assert_eq!(rest.disconnect().await.unwrap(), "disconnected");

    let requests = backend.requests();
    let paths: Vec<&str> = requests.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "/api/gimbal/center",
            "/api/gimbal/stop",
            "/api/camera/photo",
            "/api/camera/record",
            "/api/disconnect",
        ]
    );
    assert!(requests[0].body.is_empty());
    let record: Value = serde_json::from_str(&requests[3].body).unwrap();
    assert_eq!(record, json!({"action": "toggle"}));
}

#[tokio::test]
async fn failing_action_surfaces_status() {
    let backend = FakeBackend::start(vec![(
        "POST",
        "/api/gimbal/center",
        500,
        json!({"detail": "Failed to send command"}).to_string(),
    )])
    .await;
    let rest = backend.client();
    let mut session = ControlSession::new(&backend.config());

    let outcome = rest.execute(RestCall::Action(DeviceAction::Center)).await;
    session.on_rest_outcome(outcome);
    let line = &session.log.latest().unwrap().message;
    assert!(line.starts_with("Center request failed: HTTP 500"), "got {}", line);
}
