use std::sync::{Arc, Mutex};

use ai_js_anti_obfuscation::ai::{ChatRequest, RawResponse, Transport};
use ai_js_anti_obfuscation::core::{
    ConfigOverrides, ConfigStore, DeobfuscateTask, StoredConfig,
};
use ai_js_anti_obfuscation::errors::DeobfuscateError;
use ai_js_anti_obfuscation::secret::{SecretProvider, StaticSecret};
use ai_js_anti_obfuscation::worker::{deobfuscate_task, ensure_api_key};
use async_trait::async_trait;
use tempfile::TempDir;
use url::Url;

#[derive(Debug, Clone)]
struct SentRequest {
    url: Url,
    api_key: String,
    body: ChatRequest,
}

/// Answers every request with a fixed status and body and records what was sent.
#[derive(Clone)]
struct StubTransport {
    status: u16,
    body: String,
    sent: Arc<Mutex<Vec<SentRequest>>>,
}

impl StubTransport {
    fn replying(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn completion(content: &str) -> Self {
        let body = serde_json::json!({
            "choices": [{ "message": { "content": content } }]
        });
        Self::replying(200, &body.to_string())
    }

    fn sent(&self) -> Vec<SentRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn post_json(
        &self,
        url: &Url,
        api_key: &str,
        body: &ChatRequest,
    ) -> Result<RawResponse, DeobfuscateError> {
        self.sent.lock().unwrap().push(SentRequest {
            url: url.clone(),
            api_key: api_key.to_string(),
            body: body.clone(),
        });
        Ok(RawResponse {
            status: self.status,
            body: self.body.clone().into_bytes(),
        })
    }
}

struct UnreachableTransport;

#[async_trait]
impl Transport for UnreachableTransport {
    async fn post_json(
        &self,
        _url: &Url,
        _api_key: &str,
        _body: &ChatRequest,
    ) -> Result<RawResponse, DeobfuscateError> {
        Err(DeobfuscateError::Transport(
            "failed to send request: connection refused".to_string(),
        ))
    }
}

/// Counts prompts so tests can check the user is asked at most once.
struct CountingSecret {
    key: String,
    asked: usize,
}

impl SecretProvider for CountingSecret {
    fn api_key(&mut self) -> Result<String, DeobfuscateError> {
        self.asked += 1;
        Ok(self.key.clone())
    }
}

struct Workspace {
    dir: TempDir,
    store: ConfigStore,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::at(dir.path().join("home").join("config.json"));
        Self { dir, store }
    }

    fn with_key(key: &str) -> Self {
        let ws = Self::new();
        ws.store
            .save(&StoredConfig {
                silicon_flow_api_key: Some(key.to_string()),
                ..StoredConfig::default()
            })
            .unwrap();
        ws
    }

    fn task(&self, source: &str) -> DeobfuscateTask {
        let input = self.dir.path().join("bundle.js");
        std::fs::write(&input, source).unwrap();
        DeobfuscateTask {
            input,
            output: self.dir.path().join("out").join("bundle_output.js"),
            overrides: ConfigOverrides::default(),
        }
    }
}

#[tokio::test]
async fn test_end_to_end_writes_cleaned_output() {
    let ws = Workspace::with_key("sk-stored");
    let task = ws.task("var a=1;var b=2;");
    let transport = StubTransport::completion("```js\nvar count=1;var total=2;\n```");

    let report = deobfuscate_task(
        &task,
        &ws.store,
        &mut StaticSecret("unused".to_string()),
        transport.clone(),
    )
    .await
    .unwrap();

    let written = std::fs::read_to_string(&task.output).unwrap();
    assert_eq!(written, "var count=1;var total=2;");
    assert_eq!(report.output, task.output);
    assert_eq!(report.input_bytes, "var a=1;var b=2;".len());
    assert_eq!(report.output_bytes, written.len());
    assert_eq!(report.model, "Qwen/Qwen2.5-Coder-32B-Instruct");

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].url.as_str(),
        "https://api.siliconflow.cn/v1/chat/completions"
    );
    assert_eq!(sent[0].api_key, "sk-stored");
    assert!(sent[0].body.messages[0].content.ends_with("var a=1;var b=2;"));
}

#[tokio::test]
async fn test_merged_parameters_reach_the_request() {
    let ws = Workspace::new();
    ws.store
        .save(&StoredConfig {
            silicon_flow_api_key: Some("sk-stored".to_string()),
            model: Some("stored/model".to_string()),
            top_k: Some(7),
            api_base: Some("http://localhost:9000/v1".to_string()),
            ..StoredConfig::default()
        })
        .unwrap();
    let mut task = ws.task("x()");
    task.overrides.max_tokens = Some(1234);
    let transport = StubTransport::completion("renamed()");

    deobfuscate_task(
        &task,
        &ws.store,
        &mut StaticSecret("unused".to_string()),
        transport.clone(),
    )
    .await
    .unwrap();

    let sent = transport.sent();
    let body = &sent[0].body;
    assert_eq!(
        sent[0].url.as_str(),
        "http://localhost:9000/v1/chat/completions"
    );
    assert_eq!(body.model, "stored/model");
    assert_eq!(body.max_tokens, 1234);
    assert_eq!(body.top_k, 7);
    assert!((body.temperature - 0.2).abs() < f64::EPSILON);
    assert_eq!(body.n, 1);
    assert!(!body.stream);
}

#[tokio::test]
async fn test_missing_key_is_prompted_once_and_persisted() {
    let ws = Workspace::new();
    let task = ws.task("a()");
    let transport = StubTransport::completion("run()");
    let mut secrets = CountingSecret {
        key: "sk-typed".to_string(),
        asked: 0,
    };

    deobfuscate_task(&task, &ws.store, &mut secrets, transport.clone())
        .await
        .unwrap();

    assert_eq!(secrets.asked, 1);
    assert_eq!(transport.sent()[0].api_key, "sk-typed");
    assert_eq!(ws.store.load().unwrap().api_key(), Some("sk-typed"));

    // A second run reuses the stored key
    deobfuscate_task(&task, &ws.store, &mut secrets, transport.clone())
        .await
        .unwrap();
    assert_eq!(secrets.asked, 1);
}

#[tokio::test]
async fn test_explicit_key_is_used_but_not_persisted() {
    let ws = Workspace::with_key("sk-stored");
    let mut task = ws.task("a()");
    task.overrides.api_key = Some("sk-flag".to_string());
    let transport = StubTransport::completion("run()");

    deobfuscate_task(
        &task,
        &ws.store,
        &mut StaticSecret("unused".to_string()),
        transport.clone(),
    )
    .await
    .unwrap();

    assert_eq!(transport.sent()[0].api_key, "sk-flag");
    assert_eq!(ws.store.load().unwrap().api_key(), Some("sk-stored"));
}

#[test]
fn test_failed_key_persistence_aborts() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, "").unwrap();
    let store = ConfigStore::at(blocker.join("config.json"));
    let mut stored = StoredConfig::default();

    let result = ensure_api_key(
        &ConfigOverrides::default(),
        &mut stored,
        &store,
        &mut StaticSecret("sk-typed".to_string()),
    );
    assert!(
        matches!(result, Err(DeobfuscateError::ConfigIo { .. })),
        "Expected ConfigIo, got {result:?}"
    );
}

#[tokio::test]
async fn test_empty_key_entry_stops_before_any_request() {
    let ws = Workspace::new();
    let task = ws.task("a()");
    let transport = StubTransport::completion("run()");

    let result = deobfuscate_task(
        &task,
        &ws.store,
        &mut StaticSecret("   ".to_string()),
        transport.clone(),
    )
    .await;

    assert!(matches!(result, Err(DeobfuscateError::MissingApiKey)));
    assert!(transport.sent().is_empty());
    assert!(!task.output.exists());
}

#[tokio::test]
async fn test_api_error_is_surfaced_unchanged() {
    let ws = Workspace::with_key("sk-stored");
    let task = ws.task("a()");
    let transport = StubTransport::replying(
        429,
        r#"{"code":429,"message":"rate limited","data":null}"#,
    );

    let err = deobfuscate_task(
        &task,
        &ws.store,
        &mut StaticSecret("unused".to_string()),
        transport,
    )
    .await
    .unwrap_err();

    assert_eq!(err.to_string(), "SiliconFlow API error (code=429): rate limited");
    assert!(!task.output.exists());
}

#[tokio::test]
async fn test_transport_failure_is_surfaced_unchanged() {
    let ws = Workspace::with_key("sk-stored");
    let task = ws.task("a()");

    let err = deobfuscate_task(
        &task,
        &ws.store,
        &mut StaticSecret("unused".to_string()),
        UnreachableTransport,
    )
    .await
    .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Failed to send HTTP request: failed to send request: connection refused"
    );
}

#[tokio::test]
async fn test_empty_choices_fail_without_writing() {
    let ws = Workspace::with_key("sk-stored");
    let task = ws.task("a()");
    let transport = StubTransport::replying(200, r#"{"choices":[]}"#);

    let result = deobfuscate_task(
        &task,
        &ws.store,
        &mut StaticSecret("unused".to_string()),
        transport,
    )
    .await;

    assert!(matches!(result, Err(DeobfuscateError::EmptyResponse)));
    assert!(!task.output.exists());
}

#[tokio::test]
async fn test_unreadable_input_is_input_error() {
    let ws = Workspace::with_key("sk-stored");
    let mut task = ws.task("a()");
    task.input = ws.dir.path().join("gone.js");
    let transport = StubTransport::completion("run()");

    let result = deobfuscate_task(
        &task,
        &ws.store,
        &mut StaticSecret("unused".to_string()),
        transport.clone(),
    )
    .await;

    assert!(matches!(result, Err(DeobfuscateError::InputRead { .. })));
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn test_unwritable_output_is_output_error() {
    let ws = Workspace::with_key("sk-stored");
    let mut task = ws.task("a()");
    let blocker = ws.dir.path().join("blocker");
    std::fs::write(&blocker, "").unwrap();
    task.output = blocker.join("out.js");

    let result = deobfuscate_task(
        &task,
        &ws.store,
        &mut StaticSecret("unused".to_string()),
        StubTransport::completion("run()"),
    )
    .await;

    assert!(matches!(result, Err(DeobfuscateError::OutputWrite { .. })));
}

#[tokio::test]
async fn test_malformed_config_stops_the_run() {
    let ws = Workspace::new();
    std::fs::create_dir_all(ws.store.path().parent().unwrap()).unwrap();
    std::fs::write(ws.store.path(), "not json").unwrap();
    let task = ws.task("a()");
    let transport = StubTransport::completion("run()");

    let result = deobfuscate_task(
        &task,
        &ws.store,
        &mut StaticSecret("sk".to_string()),
        transport.clone(),
    )
    .await;

    assert!(matches!(result, Err(DeobfuscateError::ConfigParse { .. })));
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn test_non_utf8_input_is_still_sent() {
    let ws = Workspace::with_key("sk-stored");
    let task = ws.task("");
    // Latin-1 "café"
    std::fs::write(&task.input, b"var s=\"caf\xe9\";").unwrap();
    let transport = StubTransport::completion("var label=\"caf\u{fffd}\";");

    let report = deobfuscate_task(
        &task,
        &ws.store,
        &mut StaticSecret("unused".to_string()),
        transport.clone(),
    )
    .await
    .unwrap();

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].body.messages[0].content.ends_with("var s=\"caf\u{fffd}\";"));
    assert_eq!(report.input_bytes, 13);
    assert!(task.output.exists());
}
