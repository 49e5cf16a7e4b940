//! End-to-end calls against a local mock server.

use std::io::Read;
use std::time::Duration;

use httpcall::{Client, Error, Method, Params, PostOptions, RequestConfig};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Answers with the request's path and query
struct EchoUri;

impl Respond for EchoUri {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let uri = match request.url.query() {
            Some(query) => format!("{}?{}", request.url.path(), query),
            None => request.url.path().to_string(),
        };
        ResponseTemplate::new(200).set_body_string(uri)
    }
}

/// Answers with the request body unchanged
struct EchoBody;

impl Respond for EchoBody {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_bytes(request.body.clone())
    }
}

fn content_type(request: &Request) -> Option<String> {
    request
        .headers
        .iter()
        .find(|(name, _)| name.as_str().eq_ignore_ascii_case("content-type"))
        .map(|(_, values)| values.last().as_str().to_string())
}

/// Parses a multipart body with the boundary announced in `Content-Type` and
/// answers with the value of one field. A missing header, or a body framed
/// with another boundary, answers 400.
struct EchoMultipartField(&'static str);

impl Respond for EchoMultipartField {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let boundary = content_type(request).and_then(|value| {
            value
                .strip_prefix("multipart/form-data; boundary=")
                .map(str::to_string)
        });
        let Some(boundary) = boundary else {
            return ResponseTemplate::new(400).set_body_string("no multipart content type");
        };
        let closing = format!("--{}--\r\n", boundary);
        if !request.body.starts_with(format!("--{}", boundary).as_bytes())
            || !request.body.ends_with(closing.as_bytes())
        {
            return ResponseTemplate::new(400).set_body_string("body framed with another boundary");
        }

        let mut reader =
            multipart::server::Multipart::with_body(std::io::Cursor::new(request.body.clone()), boundary);
        while let Ok(Some(mut field)) = reader.read_entry() {
            if &*field.headers.name == self.0 {
                let mut value = String::new();
                if field.data.read_to_string(&mut value).is_ok() {
                    return ResponseTemplate::new(200).set_body_string(value);
                }
            }
        }
        ResponseTemplate::new(400).set_body_string("field not found")
    }
}

#[tokio::test]
async fn get_echoes_path() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/TestGet"))
        .respond_with(EchoUri)
        .mount(&server)
        .await;

    let client = Client::new();
    let url = format!("{}/TestGet", server.uri());

    let result = client.get("get-1", &url, Params::new(), TIMEOUT).await.unwrap();
    assert_eq!(result.status(), 200);
    assert_eq!(result.body(), "/TestGet");

    let result = client.get("get-2", &url, None::<Params>, TIMEOUT).await.unwrap();
    assert_eq!(result.body(), "/TestGet");
}

#[tokio::test]
async fn get_appends_escaped_query() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "a b&c"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("found"))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new();
    let query = Params::new().with("q", "a b&c").with("page", 2u32);
    let result = client
        .get("get-3", &format!("{}/search", server.uri()), query, TIMEOUT)
        .await
        .unwrap();
    assert_eq!(result.body(), "found");
}

#[tokio::test]
async fn post_form_sends_default_content_type() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("test=TestPost"))
        .respond_with(ResponseTemplate::new(200).set_body_string("TestPost"))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new();
    let result = client
        .post("post-1", &server.uri(), Params::from([("test", "TestPost")]), None, TIMEOUT, false)
        .await
        .unwrap();
    assert_eq!(result.status(), 200);
    assert_eq!(result.body(), "TestPost");
}

#[tokio::test]
async fn post_multipart_field_parsed_by_server() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(EchoMultipartField("test"))
        .mount(&server)
        .await;

    let client = Client::new();
    let form = Params::new().with("test", "TestMultipart").with("other", 7i64);
    let result = client
        .post("post-2", &server.uri(), form, None, TIMEOUT, true)
        .await
        .unwrap();
    assert_eq!(result.status(), 200);
    assert_eq!(result.body(), "TestMultipart");
}

#[tokio::test]
async fn multipart_post_announces_body_boundary() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(EchoMultipartField("test"))
        .expect(2)
        .mount(&server)
        .await;

    let client = Client::new();
    let result = client
        .post("post-3", &server.uri(), json!({"test": "X", "n": 1}), None, TIMEOUT, true)
        .await
        .unwrap();
    assert_eq!((result.status(), result.body()), (200, "X"));

    // A well-formed envelope without the matching header is refused.
    let form = httpcall::MultipartForm::new().add_field("test", "X").finish().unwrap();
    let config = RequestConfig::builder(Method::Post, &server.uri())
        .unwrap()
        .payload(form.body)
        .build()
        .unwrap();
    let result = client.execute("post-4", config).await.unwrap();
    assert_eq!(result.status(), 400);
}

#[tokio::test]
async fn get_then_post_splits_query_and_body() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("test", "TestPost"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("test=TestPost"))
        .respond_with(ResponseTemplate::new(200).set_body_string("TestPost"))
        .expect(1)
        .mount(&server)
        .await;

    let params = Params::from([("test", "TestPost")]);
    let result = Client::new()
        .get_then_post("gp-1", &server.uri(), params.clone(), params, TIMEOUT)
        .await
        .unwrap();
    assert_eq!(result.body(), "TestPost");
}

#[tokio::test]
async fn put_and_delete_send_raw_body() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(EchoBody)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(EchoBody)
        .mount(&server)
        .await;

    let client = Client::new();
    let result = client.put("put-1", &server.uri(), "TestPut", TIMEOUT).await.unwrap();
    assert_eq!((result.status(), result.body()), (200, "TestPut"));

    let result = client
        .delete("del-1", &server.uri(), "a b&c=d", TIMEOUT)
        .await
        .unwrap();
    assert_eq!(result.body(), "a b&c=d");
}

#[tokio::test]
async fn head_returns_status_without_body() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/resource"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let result = Client::new()
        .head("head-1", &format!("{}/resource", server.uri()), "", TIMEOUT)
        .await
        .unwrap();
    assert_eq!(result.status(), 204);
    assert!(result.body().is_empty());
}

#[tokio::test]
async fn caller_headers_override_defaults() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("content-type", "text/plain"))
        .and(header("x-request-source", "billing"))
        .and(header("connection", "Keep-Alive"))
        .and(body_string("plain text"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let headers = Params::new()
        .with("Content-Type", "text/plain")
        .with("X-Request-Source", "billing");
    let options = PostOptions::new(TIMEOUT).headers(headers).keep_alive(true);
    let result = Client::new()
        .post_with("hdr-1", &server.uri(), "plain text", options)
        .await
        .unwrap();
    assert_eq!(result.status(), 202);
}

#[tokio::test]
async fn keep_alive_calls_with_different_timeouts_share_a_client() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(3)
        .mount(&server)
        .await;

    let transport = std::sync::Arc::new(httpcall::HttpTransport::new());
    let client = Client::builder().transport(transport.clone()).build();
    for i in 0..3u64 {
        let options = PostOptions::new(Duration::from_millis(1000 + 250 * i)).keep_alive(true);
        let result = client
            .post_with(&format!("ka-{}", i), &server.uri(), Params::from([("n", i)]), options)
            .await
            .unwrap();
        assert_eq!(result.body(), "ok");
    }
    assert_eq!(transport.client_count(), 1);
}

#[tokio::test]
async fn timeout_shorter_than_delay_is_transport_error() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("success")
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let client = Client::new();
    let url = format!("{}/TestGet", server.uri());

    let result = client
        .get("slow-1", &url, Params::new(), Duration::from_secs(3))
        .await
        .unwrap();
    assert_eq!((result.status(), result.body()), (200, "success"));

    let err = client
        .get("slow-2", &url, Params::new(), Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(err.is_transport(), "unexpected error: {}", err);
    assert!(err.is_timeout());
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn unsupported_parameter_type_sends_nothing() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = Client::new();
    let err = client
        .post("bad-1", &server.uri(), json!({"nested": {"a": 1}}), None, TIMEOUT, false)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedType(_)));

    let err = client
        .get("bad-2", &server.uri(), json!({"flag": true}), TIMEOUT)
        .await
        .unwrap_err();
    assert!(err.is_unsupported_type());
}

#[tokio::test]
async fn json_mapping_is_accepted_as_form() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string("test=X"))
        .respond_with(ResponseTemplate::new(200).set_body_string("X"))
        .expect(1)
        .mount(&server)
        .await;

    let result = Client::new()
        .post("json-1", &server.uri(), json!({"test": "X"}), None, TIMEOUT, false)
        .await
        .unwrap();
    assert_eq!(result.body(), "X");
}

#[tokio::test]
async fn connection_refused_is_transport_error() {
    init_tracing();
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = Client::new()
        .put("refused-1", &format!("http://{}/", addr), "x", TIMEOUT)
        .await
        .unwrap_err();
    assert!(err.is_transport());
    assert!(!err.is_timeout());
}

#[tokio::test]
async fn truncated_body_keeps_status() {
    init_tracing();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 1024];
        let _ = socket.read(&mut buf).await;
        socket
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nshort")
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });

    let err = Client::new()
        .get("short-1", &format!("http://{}/", addr), Params::new(), TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ReadBody { status: 200, .. }), "unexpected error: {}", err);
    assert_eq!(err.status(), Some(200));
}
