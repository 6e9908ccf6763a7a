#![allow(dead_code)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use tempfile::TempDir;

pub const AS_OF: &str = "2026-10-19";

#[derive(Default)]
struct ServerState {
    /// Keyed by `"{endpoint}:{type}"`, e.g. `"detail:inc"`.
    responses: HashMap<String, (u16, String)>,
    webhook_status: Option<u16>,
    webhook_bodies: Vec<Value>,
    api_hits: Vec<String>,
}

/// Throwaway HTTP/1.1 server standing in for both the cninfo API and the
/// chat webhook. Unknown API routes answer with an empty record list.
pub struct FakeServer {
    base: String,
    state: Arc<Mutex<ServerState>>,
}

impl FakeServer {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake server");
        let base = format!("http://{}", listener.local_addr().expect("local addr"));
        let state = Arc::new(Mutex::new(ServerState::default()));
        let shared = Arc::clone(&state);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                let state = Arc::clone(&shared);
                thread::spawn(move || handle_connection(stream, &state));
            }
        });
        Self { base, state }
    }

    pub fn base_url(&self) -> String {
        self.base.clone()
    }

    pub fn webhook_url(&self) -> String {
        format!("{}/webhook", self.base)
    }

    pub fn set_rows(&self, endpoint: &str, api_type: &str, rows: Value) {
        let body = json!({"code": 200, "msg": "success", "data": {"records": rows}});
        self.set_raw(endpoint, api_type, 200, &body.to_string());
    }

    pub fn set_raw(&self, endpoint: &str, api_type: &str, status: u16, body: &str) {
        self.state
            .lock()
            .expect("state lock")
            .responses
            .insert(format!("{endpoint}:{api_type}"), (status, body.to_string()));
    }

    pub fn set_webhook_status(&self, status: u16) {
        self.state.lock().expect("state lock").webhook_status = Some(status);
    }

    pub fn webhook_bodies(&self) -> Vec<Value> {
        self.state.lock().expect("state lock").webhook_bodies.clone()
    }

    pub fn api_hits(&self) -> Vec<String> {
        self.state.lock().expect("state lock").api_hits.clone()
    }
}

fn handle_connection(stream: TcpStream, state: &Mutex<ServerState>) {
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    let target = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or("/")
        .to_string();

    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
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
    if reader.read_exact(&mut body).is_err() {
        return;
    }

    let (path, query) = target.split_once('?').unwrap_or((target.as_str(), ""));
    let (status, reply) = {
        let mut state = state.lock().expect("state lock");
        if path == "/webhook" {
            let parsed = serde_json::from_slice(&body).unwrap_or(Value::Null);
            state.webhook_bodies.push(parsed);
            let status = state.webhook_status.unwrap_or(200);
            (status, r#"{"errcode":0,"errmsg":"ok"}"#.to_string())
        } else {
            let api_type = query
                .split('&')
                .find_map(|pair| pair.strip_prefix("type="))
                .unwrap_or("");
            let key = format!("{}:{}", path.trim_start_matches('/'), api_type);
            state.api_hits.push(target.clone());
            state
                .responses
                .get(&key)
                .cloned()
                .unwrap_or((200, r#"{"code":200,"data":{"records":[]}}"#.to_string()))
        }
    };

    let mut stream = stream;
    let response = format!(
        "HTTP/1.1 {} Fake\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reply.len(),
        reply
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

pub struct TestEnv {
    _tmp: TempDir,
    pub data_dir: PathBuf,
    pub server: FakeServer,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let data_dir = tmp.path().join("data");
        Self {
            _tmp: tmp,
            data_dir,
            server: FakeServer::start(),
        }
    }

    /// Command isolated from the caller's environment and working directory.
    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("cninfo-watch");
        cmd.current_dir(self._tmp.path())
            .env_remove("WECHAT_WEBHOOK")
            .env_remove("CNINFO_BASE_URL")
            .env("RUST_LOG", "warn")
            .env("NO_PROXY", "127.0.0.1")
            .env("no_proxy", "127.0.0.1")
            .arg("--data-dir")
            .arg(&self.data_dir);
        cmd
    }

    /// `run` pointed at the fake server, pinned to [`AS_OF`].
    pub fn run_cmd(&self) -> Command {
        let mut cmd = self.cmd();
        cmd.args(["--json", "run", "--as-of", AS_OF])
            .arg("--base-url")
            .arg(self.server.base_url())
            .arg("--webhook")
            .arg(self.server.webhook_url());
        cmd
    }

    pub fn run_json(&self, extra: &[&str]) -> Value {
        let out = self
            .run_cmd()
            .args(extra)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("valid json output")
    }

    pub fn json(&self, args: &[&str]) -> Value {
        let out = self
            .cmd()
            .arg("--json")
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("valid json output")
    }

    pub fn snapshot_path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }
}

pub fn row(seccode: &str, name: &str, holder: &str, change: i64, vary_date: &str) -> Value {
    json!({
        "SECCODE": seccode,
        "SECNAME": name,
        "DECLAREDATE": vary_date,
        "VARYDATE": vary_date,
        "F002V": holder,
        "F004N": change,
    })
}
