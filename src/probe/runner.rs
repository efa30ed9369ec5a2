//! Probe execution and response classification.

use log::{debug, info, warn};
use serde_json::Value;

use crate::credentials::Credentials;
use crate::error::ProbeError;
use crate::outcome::ProbeResult;
use crate::probe::descriptor::{
    ProbeDescriptor, RequestTemplate, SuccessPredicate, TargetKind, fill_credentials,
};
use crate::probe::request::candidate_text;
use crate::probe::transport::{HttpReply, HttpRequest, SocketRequest, Transport};

const EXCERPT_LEN: usize = 100;
const ERROR_BODY_LEN: usize = 300;

fn excerpt(text: &str, len: usize) -> String {
    let mut out: String = text.chars().take(len).collect();
    if text.chars().count() > len {
        out.push_str("...");
    }
    out
}

/// Classify an HTTP reply against a descriptor.
///
/// Returns the operator-facing detail on success.
pub fn classify(descriptor: &ProbeDescriptor, reply: &HttpReply) -> Result<String, ProbeError> {
    match reply.status {
        200 => {}
        401 if descriptor.kind == TargetKind::TokenGatedRest => {
            return Err(ProbeError::AuthExpired { status: reply.status });
        }
        status => {
            return Err(ProbeError::HttpStatus {
                status,
                body: excerpt(reply.body.trim(), ERROR_BODY_LEN),
            });
        }
    }

    let text = match descriptor.success {
        SuccessPredicate::StatusOk => serde_json::from_str::<Value>(&reply.body)
            .ok()
            .and_then(|body| candidate_text(&body).ok()),
        SuccessPredicate::HasCandidates => {
            let body: Value = serde_json::from_str(&reply.body)
                .map_err(|e| ProbeError::ShapeMismatch(format!("body is not JSON: {}", e)))?;
            Some(candidate_text(&body)?)
        }
    };

    let text = text.unwrap_or_default();
    if let Some(failed) = descriptor.secondary.iter().find(|p| !p.holds(&text)) {
        debug!("{}: secondary check failed: {:?}", descriptor.name, failed);
        return Err(ProbeError::PartialMatch {
            excerpt: excerpt(&text, EXCERPT_LEN),
        });
    }

    if text.is_empty() {
        Ok(format!("HTTP {}", reply.status))
    } else {
        Ok(format!("Response: {}", excerpt(&text, EXCERPT_LEN)))
    }
}

/// Runs descriptors against a transport, one at a time
pub struct ProbeRunner<T: Transport> {
    transport: T,
}

impl<T: Transport> ProbeRunner<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run one probe; every failure mode is folded into the result
    pub async fn run(&self, descriptor: &ProbeDescriptor, credentials: &Credentials) -> ProbeResult {
        info!("Running probe {} ({:?})", descriptor.name, descriptor.kind);

        let result = match self.execute(descriptor, credentials).await {
            Ok(detail) => ProbeResult::success(descriptor.name, detail),
            Err(err) => ProbeResult::from_error(descriptor.name, &err),
        };

        if result.outcome.is_failure() {
            warn!("Probe {} failed: {}", descriptor.name, result.detail);
        } else {
            info!("Probe {} -> {}", descriptor.name, result.outcome);
        }
        result
    }

    /// Run every descriptor in order; earlier failures never stop later probes
    pub async fn run_all(&self, descriptors: &[ProbeDescriptor], credentials: &Credentials) -> Vec<ProbeResult> {
        let mut results = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            results.push(self.run(descriptor, credentials).await);
        }
        results
    }

    async fn execute(&self, descriptor: &ProbeDescriptor, credentials: &Credentials) -> Result<String, ProbeError> {
        if let Some(credential) = credentials.first_missing(&descriptor.credentials) {
            return Err(ProbeError::MissingCredential { credential });
        }

        match &descriptor.request {
            RequestTemplate::Http { url, bearer, body } => {
                let request = HttpRequest {
                    url: fill_credentials(url, credentials),
                    bearer: bearer.as_deref().map(|b| fill_credentials(b, credentials)),
                    body: body.clone(),
                    timeout: descriptor.timeout,
                };
                let reply = self.transport.post_json(request).await?;
                classify(descriptor, &reply)
            }
            RequestTemplate::Socket { url, setup } => {
                let frame = serde_json::to_string(setup)
                    .map_err(|e| ProbeError::Transport(format!("could not encode setup frame: {}", e)))?;
                let request = SocketRequest {
                    url: fill_credentials(url, credentials),
                    frame,
                    timeout: descriptor.timeout,
                };
                self.transport.send_setup(request).await?;
                Ok("Connected and setup message sent".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::TestImage;
    use crate::config::Config;
    use crate::credentials::CredentialKind;
    use crate::outcome::{Outcome, WarningReason};
    use crate::probe::descriptor::{self, ProbeName};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockTransport {
        reply: Result<HttpReply, ProbeError>,
        socket: Result<(), ProbeError>,
        http_calls: AtomicUsize,
        socket_calls: AtomicUsize,
        last_request: Mutex<Option<HttpRequest>>,
    }

    impl MockTransport {
        fn replying(status: u16, body: Value) -> Self {
            Self {
                reply: Ok(HttpReply::new(status, body.to_string())),
                socket: Ok(()),
                http_calls: AtomicUsize::new(0),
                socket_calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }
        }

        fn failing(err: ProbeError) -> Self {
            Self {
                reply: Err(err.clone()),
                socket: Err(err),
                ..Self::replying(200, json!({}))
            }
        }

        fn calls(&self) -> usize {
            self.http_calls.load(Ordering::SeqCst) + self.socket_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn post_json(&self, request: HttpRequest) -> Result<HttpReply, ProbeError> {
            self.http_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request);
            self.reply.clone()
        }

        async fn send_setup(&self, _request: SocketRequest) -> Result<(), ProbeError> {
            self.socket_calls.fetch_add(1, Ordering::SeqCst);
            self.socket.clone()
        }
    }

    fn candidates(text: &str) -> Value {
        json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
    }

    fn all_credentials() -> Credentials {
        Credentials::default()
            .with_api_key("key-123")
            .with_project_id("proj")
            .with_access_token(format!("ya29.{}", "a".repeat(60)))
    }

    fn image() -> TestImage {
        TestImage::from_bytes(vec![1, 2, 3], "image/png")
    }

    #[tokio::test]
    async fn test_rest_success() {
        let runner = ProbeRunner::new(MockTransport::replying(200, candidates("Hello back")));
        let result = runner
            .run(&descriptor::gemini_rest(&Config::default()), &all_credentials())
            .await;
        assert_eq!(result.outcome, Outcome::Success);
        assert!(result.detail.contains("Hello back"));
    }

    #[tokio::test]
    async fn test_rest_fills_api_key_in_url() {
        let runner = ProbeRunner::new(MockTransport::replying(200, candidates("ok")));
        runner
            .run(&descriptor::gemini_rest(&Config::default()), &all_credentials())
            .await;
        let request = runner.transport().last_request.lock().unwrap().clone().unwrap();
        assert!(request.url.ends_with("gemini-2.0-flash-exp:generateContent?key=key-123"));
        assert!(request.bearer.is_none());
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_call() {
        let runner = ProbeRunner::new(MockTransport::replying(200, candidates("unused")));
        let config = Config::default();

        for descriptor in descriptor::declared(&config, &image()) {
            let result = runner.run(&descriptor, &Credentials::default()).await;
            assert_eq!(result.outcome, Outcome::Failure);
            assert!(result.detail.starts_with("Missing credential"));
        }
        assert_eq!(runner.transport().calls(), 0);
    }

    #[tokio::test]
    async fn test_vertex_requires_token_as_well_as_project() {
        let runner = ProbeRunner::new(MockTransport::replying(200, json!({})));
        let creds = Credentials::default().with_project_id("proj");
        let result = runner.run(&descriptor::vertex_ai(&Config::default()), &creds).await;
        assert_eq!(result.outcome, Outcome::Failure);
        assert!(result.detail.contains(CredentialKind::AccessToken.env_var()));
        assert_eq!(runner.transport().calls(), 0);
    }

    #[tokio::test]
    async fn test_401_token_gated_is_token_expired() {
        let runner = ProbeRunner::new(MockTransport::replying(401, json!({"error": {"code": 401}})));
        let result = runner
            .run(&descriptor::vertex_ai(&Config::default()), &all_credentials())
            .await;
        assert_eq!(result.outcome, Outcome::Warning(WarningReason::TokenExpired));
        let request = runner.transport().last_request.lock().unwrap().clone().unwrap();
        assert!(request.bearer.unwrap().starts_with("ya29."));
        assert!(request.url.contains("/projects/proj/"));
    }

    #[tokio::test]
    async fn test_401_non_token_gated_is_failure() {
        let config = Config::default();
        for descriptor in [descriptor::gemini_rest(&config), descriptor::multimodal(&config, &image())] {
            let runner = ProbeRunner::new(MockTransport::replying(401, json!({})));
            let result = runner.run(&descriptor, &all_credentials()).await;
            assert_eq!(result.outcome, Outcome::Failure);
            assert!(result.detail.contains("401"));
        }
    }

    #[tokio::test]
    async fn test_vertex_200_is_success_without_candidates() {
        let runner = ProbeRunner::new(MockTransport::replying(200, json!({})));
        let result = runner
            .run(&descriptor::vertex_ai(&Config::default()), &all_credentials())
            .await;
        assert_eq!(result.outcome, Outcome::Success);
    }

    #[tokio::test]
    async fn test_200_without_candidates_is_failure() {
        let runner = ProbeRunner::new(MockTransport::replying(200, json!({"usageMetadata": {}})));
        let result = runner
            .run(&descriptor::gemini_rest(&Config::default()), &all_credentials())
            .await;
        assert_eq!(result.outcome, Outcome::Failure);
        assert!(result.detail.contains("no candidates"));
    }

    #[tokio::test]
    async fn test_other_status_is_failure() {
        let runner = ProbeRunner::new(MockTransport::replying(500, json!({"error": "boom"})));
        let result = runner
            .run(&descriptor::vertex_ai(&Config::default()), &all_credentials())
            .await;
        assert_eq!(result.outcome, Outcome::Failure);
        assert!(result.detail.contains("500"));
    }

    #[tokio::test]
    async fn test_transport_error_is_failure_with_detail() {
        let runner = ProbeRunner::new(MockTransport::failing(ProbeError::Transport("timed out".to_string())));
        let result = runner
            .run(&descriptor::gemini_rest(&Config::default()), &all_credentials())
            .await;
        assert_eq!(result.outcome, Outcome::Failure);
        assert!(result.detail.contains("timed out"));
    }

    #[tokio::test]
    async fn test_multimodal_marker_found() {
        let runner = ProbeRunner::new(MockTransport::replying(200, candidates("It says FINAL TEST")));
        let result = runner
            .run(&descriptor::multimodal(&Config::default(), &image()), &all_credentials())
            .await;
        assert_eq!(result.outcome, Outcome::Success);
    }

    #[tokio::test]
    async fn test_multimodal_marker_missing_is_partial() {
        let runner = ProbeRunner::new(MockTransport::replying(200, candidates("A blue box with some lines")));
        let result = runner
            .run(&descriptor::multimodal(&Config::default(), &image()), &all_credentials())
            .await;
        assert_eq!(result.outcome, Outcome::Warning(WarningReason::PartialMatch));
        assert!(result.detail.contains("A blue box"));
    }

    #[tokio::test]
    async fn test_socket_success_and_failure() {
        let config = Config::default();
        let runner = ProbeRunner::new(MockTransport::replying(200, json!({})));
        let result = runner.run(&descriptor::gemini_live(&config), &all_credentials()).await;
        assert_eq!(result.outcome, Outcome::Success);
        assert_eq!(runner.transport().socket_calls.load(Ordering::SeqCst), 1);
        assert_eq!(runner.transport().http_calls.load(Ordering::SeqCst), 0);

        let runner = ProbeRunner::new(MockTransport::failing(ProbeError::Transport("handshake".to_string())));
        let result = runner.run(&descriptor::gemini_live(&config), &all_credentials()).await;
        assert_eq!(result.outcome, Outcome::Failure);
    }

    #[tokio::test]
    async fn test_run_all_yields_one_result_per_probe() {
        let runner = ProbeRunner::new(MockTransport::failing(ProbeError::Transport("down".to_string())));
        let descriptors = descriptor::declared(&Config::default(), &image());
        let results = runner.run_all(&descriptors, &all_credentials()).await;

        let names: Vec<ProbeName> = results.iter().map(|r| r.probe).collect();
        assert_eq!(names, ProbeName::ALL.to_vec());
        assert_eq!(runner.transport().calls(), 4);
    }

    #[test]
    fn test_classify_non_json_body() {
        let descriptor = descriptor::gemini_rest(&Config::default());
        let err = classify(&descriptor, &HttpReply::new(200, "<html>")).unwrap_err();
        assert!(matches!(err, ProbeError::ShapeMismatch(_)));
    }

    #[test]
    fn test_excerpt_truncates() {
        assert_eq!(excerpt("abcdef", 3), "abc...");
        assert_eq!(excerpt("abc", 3), "abc");
    }
}
