//! HTTP transport against a local single-shot server

use beaver_domain::error::Error;
use beaver_domain::ports::GraphQlTransport;
use beaver_infrastructure::config::ApiConfig;
use beaver_infrastructure::sdk::HttpGraphQlTransport;
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serve one request with `status` and `body`; yields the received JSON body
async fn serve_once(status: &'static str, body: Value) -> (String, JoinHandle<Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}/api/gql", listener.local_addr().unwrap());

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        let mut buf = [0u8; 4096];

        let request_body = loop {
            let read = socket.read(&mut buf).await.unwrap();
            assert!(read > 0, "connection closed before the request completed");
            received.extend_from_slice(&buf[..read]);

            let text = String::from_utf8_lossy(&received).to_string();
            let Some(header_end) = text.find("\r\n\r\n") else {
                continue;
            };
            let length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if received.len() >= header_end + 4 + length {
                break received[header_end + 4..header_end + 4 + length].to_vec();
            }
        };

        let payload = body.to_string();
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{payload}",
            payload.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();

        serde_json::from_slice(&request_body).unwrap()
    });

    (endpoint, server)
}

fn transport(endpoint: String) -> HttpGraphQlTransport {
    HttpGraphQlTransport::new(&ApiConfig {
        endpoint,
        timeout_secs: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn test_posts_query_and_returns_data() {
    let (endpoint, server) =
        serve_once("200 OK", json!({ "data": { "serverConfig": { "name": "CB" } } })).await;
    let transport = transport(endpoint);

    let data = transport
        .request(
            "query serverConfig { serverConfig { name } }",
            json!({ "lang": "en" }),
        )
        .await
        .unwrap();

    assert_eq!(data, json!({ "serverConfig": { "name": "CB" } }));
    let sent = server.await.unwrap();
    assert_eq!(sent["query"], "query serverConfig { serverConfig { name } }");
    assert_eq!(sent["variables"], json!({ "lang": "en" }));
    assert_eq!(transport.transport_name(), "http");
}

#[tokio::test]
async fn test_graphql_errors_fail_the_request() {
    let (endpoint, server) = serve_once(
        "200 OK",
        json!({ "data": null, "errors": [{ "message": "Session expired" }] }),
    )
    .await;

    let err = transport(endpoint)
        .request("query driverList { driverList { id } }", json!({}))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::GraphQl { ref operation, ref messages }
            if operation == "driverList" && messages == &["Session expired".to_string()]
    ));
    server.await.unwrap();
}

#[tokio::test]
async fn test_http_error_status_is_a_transport_error() {
    let (endpoint, server) = serve_once("500 Internal Server Error", json!({})).await;

    let err = transport(endpoint)
        .request("query serverConfig { serverConfig { name } }", json!({}))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transport { .. }));
    server.await.unwrap();
}
