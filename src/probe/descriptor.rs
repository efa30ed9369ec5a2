//! Static probe configuration.
//!
//! Descriptors are fixed at startup from `Config`. Credential placeholders in
//! URLs and bearer templates are only filled in when a probe runs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::asset::TestImage;
use crate::config::Config;
use crate::credentials::{CredentialKind, Credentials};
use crate::probe::request::{GenerateContentRequest, GenerationConfig, Part, SetupFrame};

/// The declared probes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProbeName {
    GeminiRest,
    GeminiLive,
    VertexAi,
    Multimodal,
}

impl ProbeName {
    /// Declared run order
    pub const ALL: [ProbeName; 4] = [
        ProbeName::GeminiRest,
        ProbeName::GeminiLive,
        ProbeName::VertexAi,
        ProbeName::Multimodal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeName::GeminiRest => "gemini-rest",
            ProbeName::GeminiLive => "gemini-live",
            ProbeName::VertexAi => "vertex-ai",
            ProbeName::Multimodal => "multimodal",
        }
    }

    pub fn kind(&self) -> TargetKind {
        match self {
            ProbeName::GeminiRest => TargetKind::Rest,
            ProbeName::GeminiLive => TargetKind::StreamingSocket,
            ProbeName::VertexAi => TargetKind::TokenGatedRest,
            ProbeName::Multimodal => TargetKind::MultimodalRest,
        }
    }

    /// Credentials that must be set before any I/O is attempted
    pub fn required_credentials(&self) -> Vec<CredentialKind> {
        match self {
            ProbeName::VertexAi => vec![CredentialKind::ProjectId, CredentialKind::AccessToken],
            ProbeName::GeminiRest | ProbeName::GeminiLive | ProbeName::Multimodal => vec![CredentialKind::ApiKey],
        }
    }

    pub fn timeout(&self, config: &Config) -> Duration {
        let ms = match self {
            ProbeName::GeminiRest => config.gemini.timeout_ms,
            ProbeName::GeminiLive => config.live.timeout_ms,
            ProbeName::VertexAi => config.vertex.timeout_ms,
            ProbeName::Multimodal => config.multimodal.timeout_ms,
        };
        Duration::from_millis(ms)
    }
}

impl fmt::Display for ProbeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProbeName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProbeName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = ProbeName::ALL.iter().map(|n| n.as_str()).collect();
                format!("unknown probe '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Rest,
    StreamingSocket,
    TokenGatedRest,
    MultimodalRest,
}

/// What a 200 response must look like to count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessPredicate {
    StatusOk,
    HasCandidates,
}

/// Content checks that demote a success to a partial match
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecondaryPredicate {
    /// Case-insensitive; one hit is enough
    ContainsAny { markers: Vec<String> },
}

impl SecondaryPredicate {
    pub fn holds(&self, text: &str) -> bool {
        match self {
            SecondaryPredicate::ContainsAny { markers } => {
                let haystack = text.to_uppercase();
                markers.iter().any(|m| haystack.contains(&m.to_uppercase()))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestTemplate {
    Http {
        url: String,
        bearer: Option<String>,
        body: Value,
    },
    Socket {
        url: String,
        setup: SetupFrame,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeDescriptor {
    pub name: ProbeName,
    pub kind: TargetKind,
    pub credentials: Vec<CredentialKind>,
    pub request: RequestTemplate,
    pub success: SuccessPredicate,
    pub secondary: Vec<SecondaryPredicate>,
    pub timeout: Duration,
}

/// Replace `{api_key}`, `{project_id}` and `{access_token}` with whatever is set
pub fn fill_credentials(template: &str, credentials: &Credentials) -> String {
    let mut out = template.to_string();
    for (placeholder, kind) in [
        ("{api_key}", CredentialKind::ApiKey),
        ("{project_id}", CredentialKind::ProjectId),
        ("{access_token}", CredentialKind::AccessToken),
    ] {
        if let Some(value) = credentials.get(kind) {
            out = out.replace(placeholder, value);
        }
    }
    out
}

fn to_body(request: &GenerateContentRequest) -> Value {
    // Plain data structs; serialization cannot fail
    serde_json::to_value(request).unwrap_or(Value::Null)
}

/// Text generation over REST, API key in the query string
pub fn gemini_rest(config: &Config) -> ProbeDescriptor {
    let gemini = &config.gemini;
    let request = GenerateContentRequest::new(vec![Part::text(&gemini.prompt)]).with_generation_config(
        GenerationConfig {
            temperature: Some(gemini.temperature),
            top_k: Some(gemini.top_k),
            top_p: Some(gemini.top_p),
            max_output_tokens: Some(gemini.max_output_tokens),
            ..Default::default()
        },
    );

    ProbeDescriptor {
        name: ProbeName::GeminiRest,
        kind: ProbeName::GeminiRest.kind(),
        credentials: ProbeName::GeminiRest.required_credentials(),
        request: RequestTemplate::Http {
            url: gemini.url.replace("{model}", &gemini.model),
            bearer: None,
            body: to_body(&request),
        },
        success: SuccessPredicate::HasCandidates,
        secondary: Vec::new(),
        timeout: ProbeName::GeminiRest.timeout(config),
    }
}

/// Live socket: handshake plus one setup frame
pub fn gemini_live(config: &Config) -> ProbeDescriptor {
    let live = &config.live;
    ProbeDescriptor {
        name: ProbeName::GeminiLive,
        kind: ProbeName::GeminiLive.kind(),
        credentials: ProbeName::GeminiLive.required_credentials(),
        request: RequestTemplate::Socket {
            url: live.url.clone(),
            setup: SetupFrame::new(&live.model, live.response_modalities.clone(), &live.voice),
        },
        success: SuccessPredicate::StatusOk,
        secondary: Vec::new(),
        timeout: ProbeName::GeminiLive.timeout(config),
    }
}

/// Vertex AI with a bearer token; 401 is an expected, distinguishable state
pub fn vertex_ai(config: &Config) -> ProbeDescriptor {
    let vertex = &config.vertex;
    let request = GenerateContentRequest::new(vec![Part::text(&vertex.prompt)])
        .with_role("user")
        .with_generation_config(GenerationConfig {
            temperature: Some(vertex.temperature),
            max_output_tokens: Some(vertex.max_output_tokens),
            disable_prompt_logging: Some(vertex.disable_prompt_logging),
            disable_data_retention: Some(vertex.disable_data_retention),
            ..Default::default()
        });

    let url = vertex
        .url
        .replace("{region}", &vertex.region)
        .replace("{model}", &vertex.model);

    ProbeDescriptor {
        name: ProbeName::VertexAi,
        kind: ProbeName::VertexAi.kind(),
        credentials: ProbeName::VertexAi.required_credentials(),
        request: RequestTemplate::Http {
            url,
            bearer: Some("{access_token}".to_string()),
            body: to_body(&request),
        },
        success: SuccessPredicate::StatusOk,
        secondary: Vec::new(),
        timeout: ProbeName::VertexAi.timeout(config),
    }
}

/// Image + prompt; the reply should mention the text drawn into the image
pub fn multimodal(config: &Config, image: &TestImage) -> ProbeDescriptor {
    let request = GenerateContentRequest::new(vec![
        Part::text(&config.multimodal.prompt),
        Part::inline(image.mime_type(), image.to_base64()),
    ]);

    ProbeDescriptor {
        name: ProbeName::Multimodal,
        kind: ProbeName::Multimodal.kind(),
        credentials: ProbeName::Multimodal.required_credentials(),
        request: RequestTemplate::Http {
            url: config.gemini.url.replace("{model}", &config.gemini.model),
            bearer: None,
            body: to_body(&request),
        },
        success: SuccessPredicate::HasCandidates,
        secondary: vec![SecondaryPredicate::ContainsAny {
            markers: config.multimodal.markers.clone(),
        }],
        timeout: ProbeName::Multimodal.timeout(config),
    }
}

/// Every probe, in declared order
pub fn declared(config: &Config, image: &TestImage) -> Vec<ProbeDescriptor> {
    vec![gemini_rest(config), gemini_live(config), vertex_ai(config), multimodal(config, image)]
}

/// Build one descriptor; `image` is only called for the multimodal probe
pub fn build<E, F>(name: ProbeName, config: &Config, image: F) -> Result<ProbeDescriptor, E>
where
    F: FnOnce() -> Result<TestImage, E>,
{
    Ok(match name {
        ProbeName::GeminiRest => gemini_rest(config),
        ProbeName::GeminiLive => gemini_live(config),
        ProbeName::VertexAi => vertex_ai(config),
        ProbeName::Multimodal => multimodal(config, &image()?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> TestImage {
        TestImage::from_bytes(vec![0x89, b'P', b'N', b'G'], "image/png")
    }

    #[test]
    fn test_probe_name_round_trip_strings() {
        for name in ProbeName::ALL {
            assert_eq!(name.as_str().parse::<ProbeName>().unwrap(), name);
        }
        assert!("gemini".parse::<ProbeName>().is_err());
    }

    #[test]
    fn test_declared_order() {
        let names: Vec<ProbeName> = declared(&Config::default(), &image()).iter().map(|d| d.name).collect();
        assert_eq!(names, ProbeName::ALL.to_vec());
    }

    #[test]
    fn test_kinds_and_credentials() {
        let probes = declared(&Config::default(), &image());
        assert_eq!(probes[0].kind, TargetKind::Rest);
        assert_eq!(probes[1].kind, TargetKind::StreamingSocket);
        assert_eq!(probes[2].kind, TargetKind::TokenGatedRest);
        assert_eq!(probes[3].kind, TargetKind::MultimodalRest);
        assert_eq!(
            probes[2].credentials,
            vec![CredentialKind::ProjectId, CredentialKind::AccessToken]
        );
        assert!(probes[3].timeout > probes[0].timeout);
    }

    #[test]
    fn test_vertex_url_uses_region() {
        let mut config = Config::default();
        config.vertex.region = "europe-west4".to_string();
        let RequestTemplate::Http { url, bearer, .. } = vertex_ai(&config).request else {
            panic!("vertex probe must be HTTP");
        };
        assert!(url.starts_with("https://europe-west4-aiplatform.googleapis.com/"));
        assert!(url.contains("/locations/europe-west4/"));
        assert!(url.contains("{project_id}"));
        assert_eq!(bearer.as_deref(), Some("{access_token}"));
    }

    #[test]
    fn test_multimodal_body_carries_image() {
        let probe = multimodal(&Config::default(), &image());
        let RequestTemplate::Http { body, .. } = probe.request else {
            panic!("multimodal probe must be HTTP");
        };
        assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["data"], "iVBORw==");
    }

    #[test]
    fn test_fill_credentials() {
        let creds = Credentials::default().with_api_key("k123").with_project_id("proj");
        assert_eq!(
            fill_credentials("https://x/{project_id}?key={api_key}", &creds),
            "https://x/proj?key=k123"
        );
        // Unknown values stay as placeholders
        assert_eq!(fill_credentials("{access_token}", &creds), "{access_token}");
    }

    #[test]
    fn test_build_only_asks_multimodal_for_the_image() {
        let config = Config::default();
        for name in [ProbeName::GeminiRest, ProbeName::GeminiLive, ProbeName::VertexAi] {
            let built = build(name, &config, || Err::<TestImage, _>("no image"));
            assert_eq!(built.unwrap().name, name);
        }
        let err = build(ProbeName::Multimodal, &config, || Err::<TestImage, _>("no image")).unwrap_err();
        assert_eq!(err, "no image");
    }

    #[test]
    fn test_name_metadata_matches_descriptors() {
        let config = Config::default();
        for probe in declared(&config, &image()) {
            assert_eq!(probe.kind, probe.name.kind());
            assert_eq!(probe.credentials, probe.name.required_credentials());
            assert_eq!(probe.timeout, probe.name.timeout(&config));
        }
    }

    #[test]
    fn test_contains_any_is_case_insensitive() {
        let predicate = SecondaryPredicate::ContainsAny {
            markers: vec!["FINAL TEST".to_string(), "INTEGRATION".to_string()],
        };
        assert!(predicate.holds("The image says 'Final Test'"));
        assert!(predicate.holds("integration check"));
        assert!(!predicate.holds("A light blue rectangle"));
    }
}
