//! A small chat service built on hookhttp.
//!
//! Log in with `POST /login` (form fields `username`, `password`, optional
//! `peerId`), then use the `auth=true` cookie to list channels, read and post
//! messages, and register as a peer. Pages under `www/` and assets under
//! `static/` are served by the static fallback.
//!
//! Run with `cargo run --example chat_server -- --server-port 8000`.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use hookhttp::parser::{cookies, parse_form, parse_query, PATH_HEADER};
use hookhttp::{HandlerResult, Headers, HttpServer, Method, ServerConfig, ServerError, Structured};
use serde::Serialize;
use serde_json::json;

const CHANNELS: [&str; 3] = ["general", "random", "tech"];

/// Peers not seen for this long are dropped from listings.
const PEER_TTL_SECS: u64 = 300;

#[derive(Debug, Clone, Serialize)]
struct Message {
    sender: String,
    text: String,
    timestamp: u64,
}

#[derive(Debug, Clone, Serialize)]
struct Peer {
    username: String,
    ip: String,
    port: u16,
    last_seen: u64,
}

#[derive(Default)]
struct ChatStore {
    messages: HashMap<String, Vec<Message>>,
    peers: HashMap<String, Peer>,
}

type Store = Arc<Mutex<ChatStore>>;

fn lock(store: &Store) -> Result<MutexGuard<'_, ChatStore>, ServerError> {
    store
        .lock()
        .map_err(|_| ServerError::InternalError("chat store poisoned".to_string()))
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn authorized(headers: &Headers) -> bool {
    cookies(headers).get("auth").is_some_and(|v| v == "true")
}

fn unauthorized() -> HandlerResult {
    json!({ "error": "Unauthorized" }).into()
}

fn check_user(username: &str, password: &str) -> bool {
    matches!(
        (username, password),
        ("admin", "password") | ("user1", "password1") | ("user2", "password2")
    )
}

fn register_routes(server: &mut HttpServer, store: &Store) {
    let s = Arc::clone(store);
    server.add_route(Method::POST, "/login", move |_headers, body| {
        let form = parse_form(body.unwrap_or_default());
        let username = form.get("username").map(String::as_str).unwrap_or_default();
        let password = form.get("password").map(String::as_str).unwrap_or_default();

        if !check_user(username, password) {
            log::warn!("Rejected login for {username:?}");
            return Ok(Structured::new(401, "<h1>401 Unauthorized</h1>", "text/html").into());
        }

        if let Some(peer_id) = form.get("peerId").filter(|id| !id.is_empty()) {
            lock(&s)?.peers.insert(
                peer_id.clone(),
                Peer {
                    username: username.to_string(),
                    ip: "127.0.0.1".to_string(),
                    port: 0,
                    last_seen: now(),
                },
            );
        }

        log::info!("{username} logged in");
        Ok(Structured::new(200, format!("<p>Welcome, {username}</p>"), "text/html")
            .with_header("Set-Cookie", "auth=true; Path=/; HttpOnly")
            .into())
    });

    server.add_route(Method::GET, "/login.html", |_headers, _body| {
        Ok(HandlerResult::Text("www/login.html".to_string()))
    });

    server.add_route(Method::GET, "/", |headers, _body| {
        if authorized(headers) {
            Ok(HandlerResult::Text("www/index.html".to_string()))
        } else {
            Ok(Structured::new(
                401,
                "<html><body><h1>401 Unauthorized</h1><a href='/login.html'>Login</a></body></html>",
                "text/html",
            )
            .into())
        }
    });

    server.add_route(Method::GET, "/channels", |headers, _body| {
        if !authorized(headers) {
            return Ok(unauthorized());
        }
        HandlerResult::json(&json!({ "channels": CHANNELS }))
    });

    let s = Arc::clone(store);
    server.add_route(Method::GET, "/messages", move |headers, _body| {
        if !authorized(headers) {
            return Ok(unauthorized());
        }
        let target = headers.get(PATH_HEADER).unwrap_or("/messages");
        let query = target.split_once('?').map(|(_, q)| parse_query(q)).unwrap_or_default();
        let channel = query.get("channel").map(String::as_str).unwrap_or("general");

        let store = lock(&s)?;
        let messages = store.messages.get(channel).cloned().unwrap_or_default();
        HandlerResult::json(&json!({ "channel": channel, "messages": messages }))
    });

    let s = Arc::clone(store);
    server.add_route(Method::POST, "/send", move |headers, body| {
        if !authorized(headers) {
            return Ok(unauthorized());
        }
        let form = parse_form(body.unwrap_or_default());
        let channel = form.get("channel").cloned().unwrap_or_else(|| "general".to_string());
        if !CHANNELS.contains(&channel.as_str()) {
            return Ok(Structured::new(400, format!("unknown channel {channel}"), "text/plain").into());
        }

        let message = Message {
            sender: form.get("sender").cloned().unwrap_or_else(|| "anonymous".to_string()),
            text: form.get("text").cloned().unwrap_or_default(),
            timestamp: now(),
        };
        lock(&s)?.messages.entry(channel).or_default().push(message.clone());
        HandlerResult::json(&json!({ "status": "ok", "message": message }))
    });

    let s = Arc::clone(store);
    server.add_route(Method::POST, "/submit-info", move |headers, body| {
        if !authorized(headers) {
            return Ok(unauthorized());
        }
        let form = parse_form(body.unwrap_or_default());
        let (Some(peer_id), Some(ip), Some(port)) = (
            form.get("peerId"),
            form.get("ip").and_then(|ip| ip.parse::<IpAddr>().ok()),
            form.get("port").and_then(|p| p.parse::<u16>().ok()),
        ) else {
            return Ok(Structured::new(400, "peerId, ip and port are required", "text/plain").into());
        };

        let mut store = lock(&s)?;
        let peer = store.peers.entry(peer_id.clone()).or_insert_with(|| Peer {
            username: form.get("username").cloned().unwrap_or_default(),
            ip: String::new(),
            port: 0,
            last_seen: 0,
        });
        peer.ip = ip.to_string();
        peer.port = port;
        peer.last_seen = now();
        HandlerResult::json(&json!({ "status": "registered", "peerId": peer_id }))
    });

    let s = Arc::clone(store);
    server.add_route(Method::GET, "/get-list", move |headers, _body| {
        if !authorized(headers) {
            return Ok(unauthorized());
        }
        let mut store = lock(&s)?;
        let cutoff = now().saturating_sub(PEER_TTL_SECS);
        store.peers.retain(|_, peer| peer.last_seen >= cutoff);
        HandlerResult::json(&json!({ "peers": store.peers }))
    });
}

/// Chat demo server.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    server_ip: IpAddr,

    /// Port to listen on
    #[arg(long, default_value_t = 8000)]
    server_port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = ServerConfig {
        addr: SocketAddr::new(args.server_ip, args.server_port),
        ..ServerConfig::default()
    };

    let store: Store = Arc::new(Mutex::new(ChatStore {
        messages: CHANNELS.iter().map(|c| (c.to_string(), Vec::new())).collect(),
        ..ChatStore::default()
    }));

    let mut server = HttpServer::new(config);
    register_routes(&mut server, &store);

    server.start().await?;

    Ok(())
}
