//! Credential source.
//!
//! Built once at startup and passed into every probe. A missing credential is
//! an expected state, so nothing here fails.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const VERTEX_PROJECT_ID: &str = "VERTEX_PROJECT_ID";
pub const VERTEX_ACCESS_TOKEN: &str = "VERTEX_ACCESS_TOKEN";

/// One credential a probe may require
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    ApiKey,
    ProjectId,
    AccessToken,
}

impl CredentialKind {
    pub const ALL: [CredentialKind; 3] = [
        CredentialKind::ApiKey,
        CredentialKind::ProjectId,
        CredentialKind::AccessToken,
    ];

    /// Environment variable that supplies this credential
    pub fn env_var(&self) -> &'static str {
        match self {
            CredentialKind::ApiKey => GEMINI_API_KEY,
            CredentialKind::ProjectId => VERTEX_PROJECT_ID,
            CredentialKind::AccessToken => VERTEX_ACCESS_TOKEN,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CredentialKind::ApiKey => "Gemini API Key",
            CredentialKind::ProjectId => "Project ID",
            CredentialKind::AccessToken => "Access Token",
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.env_var())
    }
}

/// The full credential set for a run
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    api_key: Option<String>,
    project_id: Option<String>,
    access_token: Option<String>,
}

impl Credentials {
    /// Read credentials from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build credentials from any name -> value lookup; empty values count as absent
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self {
            api_key: read(GEMINI_API_KEY),
            project_id: read(VERTEX_PROJECT_ID),
            access_token: read(VERTEX_ACCESS_TOKEN),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    pub fn get(&self, kind: CredentialKind) -> Option<&str> {
        match kind {
            CredentialKind::ApiKey => self.api_key.as_deref(),
            CredentialKind::ProjectId => self.project_id.as_deref(),
            CredentialKind::AccessToken => self.access_token.as_deref(),
        }
    }

    pub fn has(&self, kind: CredentialKind) -> bool {
        self.get(kind).is_some()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// First credential from `required` that is not set
    pub fn first_missing(&self, required: &[CredentialKind]) -> Option<CredentialKind> {
        required.iter().copied().find(|kind| !self.has(*kind))
    }

    /// Presence of every credential, in declaration order
    pub fn status(&self) -> Vec<(CredentialKind, bool)> {
        CredentialKind::ALL.iter().map(|kind| (*kind, self.has(*kind))).collect()
    }
}

// Values stay out of logs and debug output
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key.is_some())
            .field("project_id", &self.project_id.is_some())
            .field("access_token", &self.access_token.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_from_lookup_all_present() {
        let creds = Credentials::from_lookup(lookup(&[
            (GEMINI_API_KEY, "key"),
            (VERTEX_PROJECT_ID, "proj"),
            (VERTEX_ACCESS_TOKEN, "ya29.token"),
        ]));
        assert_eq!(creds.get(CredentialKind::ApiKey), Some("key"));
        assert_eq!(creds.get(CredentialKind::ProjectId), Some("proj"));
        assert_eq!(creds.access_token(), Some("ya29.token"));
    }

    #[test]
    fn test_empty_values_are_absent() {
        let creds = Credentials::from_lookup(lookup(&[(GEMINI_API_KEY, ""), (VERTEX_PROJECT_ID, "  ")]));
        assert!(!creds.has(CredentialKind::ApiKey));
        assert!(!creds.has(CredentialKind::ProjectId));
        assert!(!creds.has(CredentialKind::AccessToken));
    }

    #[test]
    fn test_first_missing() {
        let creds = Credentials::default().with_project_id("proj");
        assert_eq!(
            creds.first_missing(&[CredentialKind::ProjectId, CredentialKind::AccessToken]),
            Some(CredentialKind::AccessToken)
        );
        assert_eq!(creds.first_missing(&[CredentialKind::ProjectId]), None);
        assert_eq!(creds.first_missing(&[]), None);
    }

    #[test]
    fn test_status_order() {
        let creds = Credentials::default().with_api_key("key");
        assert_eq!(
            creds.status(),
            vec![
                (CredentialKind::ApiKey, true),
                (CredentialKind::ProjectId, false),
                (CredentialKind::AccessToken, false),
            ]
        );
    }

    #[test]
    fn test_debug_hides_values() {
        let creds = Credentials::default().with_api_key("secret-key");
        let debug_str = format!("{:?}", creds);
        assert!(debug_str.contains("Credentials"));
        assert!(!debug_str.contains("secret-key"));
    }
}
