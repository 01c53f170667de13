//! Tests for the HTTP server implementation.

#[cfg(test)]
mod server_tests {
    use std::collections::VecDeque;
    use std::io;
    use std::path::PathBuf;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::task::{Context, Poll};
    use std::time::Duration;
    use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
    use tokio::net::{TcpListener, TcpStream};

    use crate::parser::{Headers, Method, PATH_HEADER};
    use crate::server::{
        build_response, content_length, find_separator, handle_connection, mime, normalize_path,
        read_request, Error, HandlerResult, HttpResponse, HttpServer, Resolution, Router,
        ServerConfig, StaticFiles, StatusCode, Structured,
    };

    // Mock TcpStream for testing, delivering its input one segment per read
    struct MockTcpStream {
        segments: VecDeque<Vec<u8>>,
        // Stall instead of reporting EOF once the segments run out
        hang: bool,
        write_data: Vec<u8>,
        shut_down: bool,
    }

    impl MockTcpStream {
        fn new(read_data: &[u8]) -> Self {
            Self::segmented(vec![read_data.to_vec()])
        }

        fn segmented(segments: Vec<Vec<u8>>) -> Self {
            Self {
                segments: segments.into(),
                hang: false,
                write_data: Vec::new(),
                shut_down: false,
            }
        }

        fn hanging(mut self) -> Self {
            self.hang = true;
            self
        }

        fn written(&self) -> String {
            String::from_utf8_lossy(&self.write_data).into_owned()
        }
    }

    impl AsyncRead for MockTcpStream {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            let this = self.get_mut();
            match this.segments.pop_front() {
                Some(mut segment) => {
                    let n = segment.len().min(buf.remaining());
                    buf.put_slice(&segment[..n]);
                    if n < segment.len() {
                        this.segments.push_front(segment.split_off(n));
                    }
                    Poll::Ready(Ok(()))
                }
                // The runtime timer wakes the task when the read times out
                None if this.hang => Poll::Pending,
                None => Poll::Ready(Ok(())),
            }
        }
    }

    impl AsyncWrite for MockTcpStream {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            let this = self.get_mut();
            this.write_data.extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            self.get_mut().shut_down = true;
            Poll::Ready(Ok(()))
        }
    }

    fn text_route(router: &mut Router, method: Method, path: &str, reply: &'static str) {
        router.add(method, path, move |_headers, _body| Ok(HandlerResult::Text(reply.to_string())));
    }

    async fn run(stream: &mut MockTcpStream, router: &Router) -> Result<(), Error> {
        handle_connection(stream, router, &ServerConfig::default()).await
    }

    /// Split a response into (status line, headers, body).
    fn split_response(raw: &str) -> (String, Vec<(String, String)>, String) {
        let (head, body) = raw.split_once("\r\n\r\n").expect("response has no header terminator");
        let mut lines = head.split("\r\n");
        let status = lines.next().unwrap_or_default().to_string();
        let headers = lines
            .filter_map(|l| l.split_once(": "))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        (status, headers, body.to_string())
    }

    fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn temp_root(name: &str) -> PathBuf {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let dir = std::env::temp_dir().join(format!(
            "hookhttp-{name}-{}-{}",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::SeqCst)
        ));
        std::fs::create_dir_all(dir.join("www")).unwrap();
        std::fs::create_dir_all(dir.join("static")).unwrap();
        std::fs::create_dir_all(dir.join("apps")).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_handle_connection_with_valid_request() {
        let mut stream = MockTcpStream::new(b"GET /test HTTP/1.1\r\nHost: localhost\r\n\r\n");
        let mut router = Router::new();
        text_route(&mut router, Method::GET, "/test", "Test response");

        let result = run(&mut stream, &router).await;
        assert!(result.is_ok());

        let (status, headers, body) = split_response(&stream.written());
        assert_eq!(status, "HTTP/1.1 200 OK");
        assert_eq!(header(&headers, "Content-Type"), Some("text/plain"));
        assert_eq!(header(&headers, "Content-Length"), Some("13"));
        assert_eq!(header(&headers, "Connection"), Some("close"));
        assert_eq!(body, "Test response");
        assert!(stream.shut_down);
    }

    #[tokio::test]
    async fn test_body_assembled_across_segments() {
        let seen = Arc::new(Mutex::new(None));
        let mut router = Router::new();
        let sink = Arc::clone(&seen);
        router.add(Method::POST, "/send", move |_headers, body| {
            *sink.lock().unwrap() = body.map(str::to_string);
            Ok(Structured::new(201, "stored", "text/plain").into())
        });

        let payload = "channel=tech&text=hello+world";
        let request = format!(
            "POST /send HTTP/1.1\r\nHost: localhost\r\nContent-Length: {}\r\n\r\n{payload}TRAILING",
            payload.len()
        );
        // One byte per read
        let segments = request.bytes().map(|b| vec![b]).collect();
        let mut stream = MockTcpStream::segmented(segments);

        run(&mut stream, &router).await.unwrap();

        assert!(stream.written().starts_with("HTTP/1.1 201 Created\r\n"));
        assert_eq!(seen.lock().unwrap().as_deref(), Some(payload));
    }

    #[tokio::test]
    async fn test_short_body_when_peer_closes_early() {
        let mut router = Router::new();
        router.add(Method::POST, "/echo", |_headers, body| {
            Ok(HandlerResult::Bytes(body.unwrap_or_default().as_bytes().to_vec()))
        });

        let mut stream = MockTcpStream::new(b"POST /echo HTTP/1.1\r\nContent-Length: 50\r\n\r\nonly-this");
        run(&mut stream, &router).await.unwrap();

        let (status, headers, body) = split_response(&stream.written());
        assert_eq!(status, "HTTP/1.1 200 OK");
        assert_eq!(header(&headers, "Content-Type"), Some("application/octet-stream"));
        assert_eq!(body, "only-this");
    }

    #[tokio::test]
    async fn test_handle_connection_with_not_found() {
        let mut stream = MockTcpStream::new(b"POST /nonexistent HTTP/1.1\r\nHost: localhost\r\n\r\n");
        let mut router = Router::new();
        text_route(&mut router, Method::GET, "/test", "Test response");

        let result = run(&mut stream, &router).await;
        assert!(matches!(result, Err(Error::NotFound(ref p)) if p == "/nonexistent"));

        let response = stream.written();
        assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(response.contains("Not found: /nonexistent"));
        assert!(stream.shut_down);
    }

    #[tokio::test]
    async fn test_handle_connection_with_method_not_allowed() {
        let mut stream = MockTcpStream::new(b"PUT /a HTTP/1.1\r\nHost: localhost\r\n\r\n");
        let mut router = Router::new();
        text_route(&mut router, Method::GET, "/a", "get");
        text_route(&mut router, Method::POST, "/a", "post");

        let result = run(&mut stream, &router).await;
        assert!(matches!(result, Err(Error::MethodNotAllowed(Method::PUT, _))));

        let (status, headers, body) = split_response(&stream.written());
        assert_eq!(status, "HTTP/1.1 405 Method Not Allowed");
        assert_eq!(header(&headers, "Allow"), Some("GET, POST"));
        assert!(body.contains("Method PUT not allowed for path: /a"));
    }

    #[tokio::test]
    async fn test_extension_method_gets_method_not_allowed() {
        let mut stream = MockTcpStream::new(b"PROPFIND /a HTTP/1.1\r\nHost: localhost\r\n\r\n");
        let mut router = Router::new();
        text_route(&mut router, Method::GET, "/a", "get");

        let result = run(&mut stream, &router).await;
        assert!(matches!(result, Err(Error::MethodNotAllowed(Method::Other(ref m), _)) if m == "PROPFIND"));

        let (status, headers, _) = split_response(&stream.written());
        assert_eq!(status, "HTTP/1.1 405 Method Not Allowed");
        assert_eq!(header(&headers, "Allow"), Some("GET"));
    }

    #[tokio::test]
    async fn test_any_version_token_is_served() {
        let mut router = Router::new();
        text_route(&mut router, Method::GET, "/a", "get");

        for version in ["HTTP/2.0", "HTTP/1.2"] {
            let request = format!("GET /a {version}\r\n\r\n");
            let mut stream = MockTcpStream::new(request.as_bytes());
            run(&mut stream, &router).await.unwrap();

            let (status, _, body) = split_response(&stream.written());
            assert_eq!(status, "HTTP/1.1 200 OK", "status for {version}");
            assert_eq!(body, "get");
        }
    }

    #[tokio::test]
    async fn test_handle_connection_with_invalid_request() {
        let mut stream = MockTcpStream::new(b"INVALID REQUEST\r\n\r\n");
        let router = Router::new();

        let result = run(&mut stream, &router).await;
        assert!(matches!(result, Err(Error::ParseError(_))));

        let response = stream.written();
        assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(response.contains("Malformed request line: INVALID REQUEST"));
        assert!(stream.shut_down);
    }

    #[tokio::test]
    async fn test_peer_closing_without_data_gets_no_response() {
        let mut stream = MockTcpStream::new(b"");
        let result = run(&mut stream, &Router::new()).await;
        assert!(result.is_ok());
        assert!(stream.written().is_empty());
        assert!(stream.shut_down);
    }

    #[tokio::test]
    async fn test_header_timeout_proceeds_with_partial_data() {
        let mut router = Router::new();
        text_route(&mut router, Method::GET, "/slow", "made it");
        let config = ServerConfig {
            header_timeout: Duration::from_millis(50),
            ..ServerConfig::default()
        };

        // No blank line ever arrives
        let mut stream = MockTcpStream::new(b"GET /slow HTTP/1.1\r\nHost: localhost\r\n").hanging();
        handle_connection(&mut stream, &router, &config).await.unwrap();

        let (status, _, body) = split_response(&stream.written());
        assert_eq!(status, "HTTP/1.1 200 OK");
        assert_eq!(body, "made it");
    }

    #[tokio::test]
    async fn test_body_timeout_proceeds_with_partial_body() {
        let mut router = Router::new();
        router.add(Method::POST, "/echo", |_headers, body| {
            Ok(HandlerResult::Bytes(body.unwrap_or_default().as_bytes().to_vec()))
        });
        let config = ServerConfig {
            body_timeout: Some(Duration::from_millis(50)),
            ..ServerConfig::default()
        };

        let mut stream =
            MockTcpStream::new(b"POST /echo HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc").hanging();
        handle_connection(&mut stream, &router, &config).await.unwrap();

        let (_, headers, body) = split_response(&stream.written());
        assert_eq!(body, "abc");
        assert_eq!(header(&headers, "Content-Length"), Some("3"));
    }

    #[tokio::test]
    async fn test_oversized_header_is_rejected() {
        let config = ServerConfig {
            max_header_size: 64,
            ..ServerConfig::default()
        };
        let request = format!("GET / HTTP/1.1\r\nX-Filler: {}\r\n\r\n", "a".repeat(200));
        let mut stream = MockTcpStream::new(request.as_bytes());

        let result = handle_connection(&mut stream, &Router::new(), &config).await;
        assert!(matches!(result, Err(Error::HeaderTooLarge(64))));
        assert!(stream.written().starts_with("HTTP/1.1 431 Request Header Fields Too Large\r\n"));
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let called = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&called);
        let mut router = Router::new();
        router.add(Method::POST, "/upload", move |_headers, _body| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(HandlerResult::Text("ok".into()))
        });
        let config = ServerConfig {
            max_body_size: 16,
            ..ServerConfig::default()
        };

        let mut stream = MockTcpStream::new(b"POST /upload HTTP/1.1\r\nContent-Length: 17\r\n\r\n");
        let result = handle_connection(&mut stream, &router, &config).await;

        assert!(matches!(result, Err(Error::PayloadTooLarge(17, 16))));
        assert!(stream.written().starts_with("HTTP/1.1 413 Payload Too Large\r\n"));
        assert_eq!(called.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_index_variants_resolve_both_ways() {
        let mut router = Router::new();
        text_route(&mut router, Method::GET, "/index.html", "index page");
        let mut stream = MockTcpStream::new(b"GET / HTTP/1.1\r\n\r\n");
        run(&mut stream, &router).await.unwrap();
        assert!(stream.written().ends_with("index page"));

        let mut router = Router::new();
        text_route(&mut router, Method::GET, "/", "root page");
        for target in ["/index.html", "/index.htm"] {
            let request = format!("GET {target} HTTP/1.1\r\n\r\n");
            let mut stream = MockTcpStream::new(request.as_bytes());
            run(&mut stream, &router).await.unwrap();
            assert!(stream.written().ends_with("root page"));
        }
    }

    #[tokio::test]
    async fn test_structured_result_with_status_and_cookie() {
        let mut router = Router::new();
        router.add(Method::POST, "/login", |_headers, _body| {
            Ok(Structured::new(401, "no", "text/plain")
                .with_header("Set-Cookie", "auth=false; Path=/")
                .with_header("Content-Length", "999")
                .into())
        });

        let mut stream = MockTcpStream::new(b"POST /login HTTP/1.1\r\n\r\n");
        run(&mut stream, &router).await.unwrap();

        let (status, headers, body) = split_response(&stream.written());
        assert_eq!(status, "HTTP/1.1 401 Unauthorized");
        assert_eq!(body, "no");
        assert_eq!(header(&headers, "Content-Length"), Some("2"));
        assert_eq!(header(&headers, "Set-Cookie"), Some("auth=false; Path=/"));
        assert_eq!(headers.iter().filter(|(k, _)| k == "Content-Length").count(), 1);
    }

    #[tokio::test]
    async fn test_plain_mapping_serialized_as_json() {
        let mut router = Router::new();
        router.add(Method::GET, "/data", |_headers, _body| Ok(serde_json::json!({ "a": 1 }).into()));

        let mut stream = MockTcpStream::new(b"GET /data HTTP/1.1\r\n\r\n");
        run(&mut stream, &router).await.unwrap();

        let (status, headers, body) = split_response(&stream.written());
        assert_eq!(status, "HTTP/1.1 200 OK");
        assert_eq!(header(&headers, "Content-Type"), Some("application/json"));
        let decoded: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(decoded, serde_json::json!({ "a": 1 }));
    }

    #[tokio::test]
    async fn test_handler_sees_headers_and_query_target() {
        let mut router = Router::new();
        router.add(Method::GET, "/messages", |headers, _body| {
            let target = headers.get(PATH_HEADER).unwrap_or_default().to_string();
            let auth = headers.get("cookie").unwrap_or_default().to_string();
            Ok(HandlerResult::json(&[target, auth])?)
        });

        let mut stream =
            MockTcpStream::new(b"GET /messages?channel=tech HTTP/1.1\r\nCookie: auth=true\r\n\r\n");
        run(&mut stream, &router).await.unwrap();

        let (_, _, body) = split_response(&stream.written());
        assert_eq!(body, r#"["/messages?channel=tech","auth=true"]"#);
    }

    #[tokio::test]
    async fn test_handler_error_yields_500() {
        let mut router = Router::new();
        router.add(Method::GET, "/boom", |_headers, _body| {
            Err(Error::InternalError("database unavailable".to_string()))
        });

        let mut stream = MockTcpStream::new(b"GET /boom HTTP/1.1\r\n\r\n");
        let result = run(&mut stream, &router).await;

        assert!(matches!(result, Err(Error::InternalError(_))));
        let (status, _, body) = split_response(&stream.written());
        assert_eq!(status, "HTTP/1.1 500 Internal Server Error");
        assert!(body.contains("database unavailable"));
        assert!(stream.shut_down);
    }

    #[tokio::test]
    async fn test_handler_panic_yields_500() {
        let mut router = Router::new();
        router.add(Method::GET, "/panic", |_headers, _body| panic!("handler exploded"));

        let mut stream = MockTcpStream::new(b"GET /panic HTTP/1.1\r\n\r\n");
        let result = run(&mut stream, &router).await;

        assert!(result.is_err());
        let (status, _, body) = split_response(&stream.written());
        assert_eq!(status, "HTTP/1.1 500 Internal Server Error");
        assert!(body.contains("handler exploded"));
        assert!(stream.shut_down);
    }

    #[tokio::test]
    async fn test_text_results() {
        let root = temp_root("text");
        std::fs::write(root.join("www/page.html"), "<p>page</p>").unwrap();

        let file = build_response(HandlerResult::Text("www/page.html".into()), &root).await;
        assert_eq!(file.status, StatusCode::Ok);
        assert_eq!(file.content_type, "text/html");
        assert_eq!(file.body, b"<p>page</p>");

        let missing = build_response(HandlerResult::Text("www/none.html".into()), &root).await;
        assert_eq!(missing.status, StatusCode::NotFound);

        let markup = build_response(HandlerResult::Text("<h1>v1.0</h1>".into()), &root).await;
        assert_eq!(markup.content_type, "text/plain");
        assert_eq!(markup.body, b"<h1>v1.0</h1>");

        let plain = build_response(HandlerResult::Text("hello".into()), &root).await;
        assert_eq!(plain.status, StatusCode::Ok);
        assert_eq!(plain.body, b"hello");

        std::fs::remove_dir_all(root).unwrap();
    }

    #[tokio::test]
    async fn test_static_fallback() {
        let root = temp_root("static");
        std::fs::write(root.join("www/index.html"), "<h1>home</h1>").unwrap();
        std::fs::write(root.join("static/app.css"), "body{}").unwrap();
        std::fs::write(root.join("apps/data.json"), "{}").unwrap();
        std::fs::write(root.join("secret.txt"), "hidden").unwrap();
        let config = ServerConfig {
            document_root: root.clone(),
            ..ServerConfig::default()
        };
        let router = Router::new();

        let cases = [
            ("/", "HTTP/1.1 200 OK", Some("text/html")),
            ("/app.css", "HTTP/1.1 200 OK", Some("text/css")),
            ("/data.json", "HTTP/1.1 200 OK", Some("application/json")),
            ("/missing.css", "HTTP/1.1 404 Not Found", Some("text/plain")),
            ("/archive.xyz", "HTTP/1.1 404 Not Found", Some("text/plain")),
            ("/../secret.txt", "HTTP/1.1 404 Not Found", Some("text/plain")),
        ];
        for (path, expected_status, expected_type) in cases {
            let request = format!("GET {path} HTTP/1.1\r\n\r\n");
            let mut stream = MockTcpStream::new(request.as_bytes());
            let _ = handle_connection(&mut stream, &router, &config).await;

            let (status, headers, _) = split_response(&stream.written());
            assert_eq!(status, expected_status, "status for {path}");
            assert_eq!(header(&headers, "Content-Type"), expected_type, "type for {path}");
        }

        std::fs::remove_dir_all(root).unwrap();
    }

    #[tokio::test]
    async fn test_static_fallback_head_omits_body() {
        let root = temp_root("head");
        std::fs::write(root.join("static/app.css"), "body{}").unwrap();
        let config = ServerConfig {
            document_root: root.clone(),
            ..ServerConfig::default()
        };

        let mut stream = MockTcpStream::new(b"HEAD /app.css HTTP/1.1\r\n\r\n");
        handle_connection(&mut stream, &Router::new(), &config).await.unwrap();

        let (status, headers, body) = split_response(&stream.written());
        assert_eq!(status, "HTTP/1.1 200 OK");
        assert_eq!(header(&headers, "Content-Type"), Some("text/css"));
        assert_eq!(header(&headers, "Content-Length"), Some("6"));
        assert!(body.is_empty());

        std::fs::remove_dir_all(root).unwrap();
    }

    #[tokio::test]
    async fn test_static_fallback_skipped_for_post() {
        let root = temp_root("post");
        std::fs::write(root.join("static/app.css"), "body{}").unwrap();
        let config = ServerConfig {
            document_root: root.clone(),
            ..ServerConfig::default()
        };

        let mut stream = MockTcpStream::new(b"POST /app.css HTTP/1.1\r\n\r\n");
        let result = handle_connection(&mut stream, &Router::new(), &config).await;
        assert!(matches!(result, Err(Error::NotFound(_))));

        std::fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn test_mime_classification() {
        let statics = StaticFiles::new(&ServerConfig::default());
        assert!(statics.base_dir("text/html").unwrap().ends_with("www"));
        assert!(statics.base_dir("text/css").unwrap().ends_with("static"));
        assert!(statics.base_dir("application/javascript").unwrap().ends_with("static"));
        assert!(statics.base_dir("image/png").unwrap().ends_with("static"));
        assert!(statics.base_dir("application/json").unwrap().ends_with("apps"));
        assert!(matches!(statics.base_dir("video/mp4"), Err(Error::UnsupportedMime(_))));
        assert!(matches!(statics.resolve("/noext"), Err(Error::UnsupportedMime(_))));

        assert_eq!(mime::guess("/a/b.CSS"), Some("text/css"));
        assert_eq!(mime::guess("/x.json?v=2"), Some("application/json"));
        assert_eq!(mime::guess_or_default("/blob.bin"), mime::DEFAULT_MIME_TYPE);
    }

    #[test]
    fn test_router_precedence() {
        let mut router = Router::new();
        text_route(&mut router, Method::GET, "/a", "get-a");
        router.any("/a", |_h, _b| Ok(HandlerResult::Text("any-a".into())));
        router.any("/b", |_h, _b| Ok(HandlerResult::Text("any-b".into())));

        let call = |resolution: Resolution| match resolution {
            Resolution::Found(handler) => match handler(&Headers::new(), None) {
                Ok(HandlerResult::Text(t)) => t,
                other => panic!("unexpected handler output {other:?}"),
            },
            other => panic!("expected a handler, got {other:?}"),
        };

        assert_eq!(call(router.resolve(&Method::GET, "/a")), "get-a");
        assert_eq!(call(router.resolve(&Method::DELETE, "/a")), "any-a");
        assert_eq!(call(router.resolve(&Method::PATCH, "b")), "any-b");
        assert!(matches!(router.resolve(&Method::GET, "/c"), Resolution::NotFound));
        assert_eq!(router.len(), 3);
    }

    #[test]
    fn test_router_wrong_method_lists_allowed() {
        let mut router = Router::new();
        text_route(&mut router, Method::POST, "/a", "post");
        text_route(&mut router, Method::GET, "/a", "get");
        text_route(&mut router, Method::DELETE, "/other", "x");

        match router.resolve(&Method::PUT, "/a") {
            Resolution::WrongMethod(allowed) => assert_eq!(allowed, vec![Method::GET, Method::POST]),
            other => panic!("expected WrongMethod, got {other:?}"),
        }

        let endpoints = router.endpoints();
        assert_eq!(endpoints[0], (Some(&Method::GET), "/a"));
        assert_eq!(endpoints[2], (Some(&Method::DELETE), "/other"));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/a"), "/a");
        assert_eq!(normalize_path("a"), "/a");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/m?x=1"), "/m");
    }

    #[test]
    fn test_status_reasons() {
        assert_eq!(StatusCode::from_u16(201).reason_phrase(), "Created");
        assert_eq!(StatusCode::from_u16(405), StatusCode::MethodNotAllowed);
        assert_eq!(StatusCode::from_u16(418).reason_phrase(), "OK");
        assert_eq!(StatusCode::from_u16(418).code(), 418);
    }

    #[test]
    fn test_response_header_replace_and_lookup() {
        let response = HttpResponse::new(StatusCode::Ok)
            .with_header("X-Token", "one")
            .with_header("x-token", "two")
            .append_header("Set-Cookie", "a=1")
            .append_header("Set-Cookie", "b=2");

        assert_eq!(response.header("X-TOKEN"), Some("two"));
        assert_eq!(response.header("set-cookie"), Some("a=1"));
        assert_eq!(response.header("server"), Some("hookhttp"));
        assert_eq!(response.header("missing"), None);
        assert_eq!(response.headers.iter().filter(|(k, _)| k == "Set-Cookie").count(), 2);
    }

    #[test]
    fn test_head_bytes_keep_content_length() {
        let response = HttpResponse::text(StatusCode::Ok, "hello");
        let head = String::from_utf8(response.head_bytes()).unwrap();
        assert!(head.ends_with("Content-Length: 5\r\nConnection: close\r\n\r\n"));
        assert_eq!(response.to_bytes().len(), head.len() + 5);
    }

    #[test]
    fn test_response_header_order_preserved() {
        let bytes = HttpResponse::new(StatusCode::Ok)
            .append_header("X-First", "1")
            .append_header("X-Second", "2")
            .with_body_string("hi")
            .to_bytes();
        let text = String::from_utf8(bytes).unwrap();
        let first = text.find("X-First").unwrap();
        let second = text.find("X-Second").unwrap();
        assert!(first < second);
        assert!(text.ends_with("Content-Length: 2\r\nConnection: close\r\n\r\nhi"));
    }

    #[test]
    fn test_framing_helpers() {
        assert_eq!(find_separator(b"GET / HTTP/1.1\r\n\r\nbody"), Some(14));
        assert_eq!(find_separator(b"GET / HTTP/1.1\r\n"), None);
        assert_eq!(content_length(b"POST / HTTP/1.1\r\ncontent-LENGTH:  42"), 42);
        assert_eq!(content_length(b"POST / HTTP/1.1\r\nContent-Length: nope"), 0);
        assert_eq!(content_length(b"POST / HTTP/1.1"), 0);
    }

    #[tokio::test]
    async fn test_read_request_splits_head_and_body() {
        let mut stream = MockTcpStream::segmented(vec![
            b"POST /x HTTP/1.1\r\nContent-Le".to_vec(),
            b"ngth: 4\r\n\r".to_vec(),
            b"\nab".to_vec(),
            b"cdEXTRA".to_vec(),
        ]);
        let raw = read_request(&mut stream, &ServerConfig::default()).await.unwrap().unwrap();
        assert_eq!(raw.head, b"POST /x HTTP/1.1\r\nContent-Length: 4");
        assert_eq!(raw.body, b"abcd");
    }

    async fn spawn_server(server: HttpServer) -> (std::net::SocketAddr, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let _ = server.serve(listener).await;
        });
        (addr, handle)
    }

    #[tokio::test]
    async fn test_end_to_end_over_tcp() {
        let mut server = HttpServer::new(ServerConfig::default());
        server.add_route(Method::POST, "/echo", |_headers, body| {
            Ok(Structured::new(200, body.unwrap_or_default(), "text/plain").into())
        });
        let (addr, handle) = spawn_server(server).await;

        let mut client = TcpStream::connect(addr).await.unwrap();
        client.write_all(b"POST /echo HTTP/1.1\r\nHost: test\r\nContent-Length: 11\r\n\r\nhello").await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        client.write_all(b" world").await.unwrap();

        let mut response = String::new();
        client.read_to_string(&mut response).await.unwrap();

        let (status, headers, body) = split_response(&response);
        assert_eq!(status, "HTTP/1.1 200 OK");
        assert_eq!(header(&headers, "Connection"), Some("close"));
        assert_eq!(body, "hello world");

        handle.abort();
    }

    #[tokio::test]
    async fn test_any_route_over_tcp() {
        let mut server = HttpServer::new(ServerConfig::default());
        server
            .add_route(Method::GET, "/hook", |_headers, _body| Ok("get hook".into()))
            .add_any_route("/hook", |headers, _body| {
                let path = headers.get(PATH_HEADER).unwrap_or_default();
                Ok(format!("any hook {path}").into())
            });
        let (addr, handle) = spawn_server(server).await;

        let cases = [
            ("GET", "get hook"),
            ("DELETE", "any hook /hook?x=1"),
            ("PROPFIND", "any hook /hook?x=1"),
        ];
        for (method, expected) in cases {
            let mut client = TcpStream::connect(addr).await.unwrap();
            let request = format!("{method} /hook?x=1 HTTP/1.1\r\nHost: test\r\n\r\n");
            client.write_all(request.as_bytes()).await.unwrap();

            let mut response = String::new();
            client.read_to_string(&mut response).await.unwrap();

            let (status, _, body) = split_response(&response);
            assert_eq!(status, "HTTP/1.1 200 OK", "status for {method}");
            assert_eq!(body, expected, "body for {method}");
        }

        handle.abort();
    }

    #[tokio::test]
    async fn test_connection_limit_response() {
        let config = ServerConfig {
            max_connections: 0,
            ..ServerConfig::default()
        };
        let (addr, handle) = spawn_server(HttpServer::new(config)).await;

        let mut client = TcpStream::connect(addr).await.unwrap();
        let mut response = String::new();
        client.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 503 Service Unavailable\r\n"));
        assert!(response.contains("Server is at capacity, please try again later"));

        handle.abort();
    }
}
