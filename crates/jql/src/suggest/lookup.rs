//! Value lookup collaborators.
//!
//! Field values and history-predicate values come from outside the parser.
//! The HTTP implementation talks to the autocomplete endpoint of an issue
//! server; the static one serves a fixed map.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use serde::Deserialize;

use crate::config::LookupConfig;
use crate::errors::LookupError;
use crate::text::{starts_with_ignore_case, unquote};

use super::Suggestion;

/// What to look values up for. Also the response cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LookupRequest {
    /// Values of a field, optionally narrowed by what was typed.
    Field {
        field_name: String,
        field_value: Option<String>,
    },
    /// Values of a history predicate such as `BY` or `FROM`.
    Predicate {
        predicate_name: String,
        predicate_value: Option<String>,
        field_name: Option<String>,
    },
}

impl LookupRequest {
    /// Name of the field or predicate the values belong to.
    pub fn subject(&self) -> &str {
        match self {
            LookupRequest::Field { field_name, .. } => field_name,
            LookupRequest::Predicate { predicate_name, .. } => predicate_name,
        }
    }

    /// The partial value typed so far.
    pub fn typed(&self) -> Option<&str> {
        match self {
            LookupRequest::Field { field_value, .. } => field_value.as_deref(),
            LookupRequest::Predicate {
                predicate_value, ..
            } => predicate_value.as_deref(),
        }
    }

    /// Query string parameters for the HTTP endpoint.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        match self {
            LookupRequest::Field {
                field_name,
                field_value,
            } => {
                pairs.push(("fieldName", field_name.clone()));
                if let Some(value) = field_value {
                    pairs.push(("fieldValue", value.clone()));
                }
            }
            LookupRequest::Predicate {
                predicate_name,
                predicate_value,
                field_name,
            } => {
                pairs.push(("predicateName", predicate_name.clone()));
                if let Some(value) = predicate_value {
                    pairs.push(("predicateValue", value.clone()));
                }
                if let Some(field) = field_name {
                    pairs.push(("fieldName", field.clone()));
                }
            }
        }
        pairs
    }
}

/// Source of field and predicate values.
///
/// Failures are reported, never panicked on; the caller degrades them to an
/// empty list.
pub trait ValueLookup: Send + Sync {
    fn lookup(
        &self,
        request: &LookupRequest,
    ) -> impl Future<Output = Result<Vec<Suggestion>, LookupError>> + Send;
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    results: Option<Vec<Suggestion>>,
}

/// Decode `{"results": [{"value": .., "displayName": ..}]}`. A `null`
/// document or `null` results member is an empty list.
pub(crate) fn decode_results(body: &str) -> Result<Vec<Suggestion>, LookupError> {
    let response: Option<LookupResponse> =
        serde_json::from_str(body).map_err(|e| LookupError::Decode(e.to_string()))?;
    Ok(response.and_then(|r| r.results).unwrap_or_default())
}

/// Looks values up over HTTP with a blocking client on tokio's blocking pool.
#[derive(Clone)]
pub struct HttpValueLookup {
    url: String,
    agent: ureq::Agent,
}

impl std::fmt::Debug for HttpValueLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpValueLookup")
            .field("url", &self.url)
            .finish()
    }
}

impl HttpValueLookup {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        HttpValueLookup {
            url: url.into(),
            agent,
        }
    }

    fn fetch(
        agent: &ureq::Agent,
        url: &str,
        pairs: &[(&'static str, String)],
    ) -> Result<Vec<Suggestion>, LookupError> {
        let mut request = agent.get(url);
        for (key, value) in pairs {
            request = request.query(*key, value);
        }
        let mut response = request
            .call()
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| LookupError::Transport(e.to_string()))?;
        decode_results(&body)
    }
}

impl ValueLookup for HttpValueLookup {
    fn lookup(
        &self,
        request: &LookupRequest,
    ) -> impl Future<Output = Result<Vec<Suggestion>, LookupError>> + Send {
        let agent = self.agent.clone();
        let url = self.url.clone();
        let pairs = request.query_pairs();
        async move {
            tokio::task::spawn_blocking(move || Self::fetch(&agent, &url, &pairs))
                .await
                .map_err(|e| LookupError::Join(e.to_string()))?
        }
    }
}

/// Serves values from memory, keyed by field or predicate name.
///
/// Values are stored as they would be inserted (`"In Progress"` keeps its
/// quotes) and displayed unquoted. A lookup returns the values whose display
/// starts with the typed text.
#[derive(Debug, Clone, Default)]
pub struct StaticValueLookup {
    values: HashMap<String, Vec<Suggestion>>,
}

impl StaticValueLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register values for a field or predicate name (case-insensitive).
    pub fn with_values<I, S>(mut self, subject: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.values.entry(subject.to_lowercase()).or_default();
        for value in values {
            let value = value.into();
            let display = unquote(&value);
            entry.push(Suggestion::new(value, display));
        }
        self
    }

    fn matching(&self, request: &LookupRequest) -> Vec<Suggestion> {
        let typed = request.typed().unwrap_or_default();
        self.values
            .get(&request.subject().to_lowercase())
            .map(|values| {
                values
                    .iter()
                    .filter(|s| starts_with_ignore_case(&s.display_name, typed))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl ValueLookup for StaticValueLookup {
    fn lookup(
        &self,
        request: &LookupRequest,
    ) -> impl Future<Output = Result<Vec<Suggestion>, LookupError>> + Send {
        std::future::ready(Ok(self.matching(request)))
    }
}

/// The lookup a configuration asks for: HTTP when a URL is set, otherwise
/// an empty static map.
#[derive(Debug, Clone)]
pub enum ConfiguredLookup {
    Http(HttpValueLookup),
    Static(StaticValueLookup),
}

impl ConfiguredLookup {
    pub fn from_config(config: &LookupConfig) -> Self {
        match &config.url {
            Some(url) => ConfiguredLookup::Http(HttpValueLookup::new(url.clone(), config.timeout())),
            None => ConfiguredLookup::Static(StaticValueLookup::new()),
        }
    }
}

impl ValueLookup for ConfiguredLookup {
    fn lookup(
        &self,
        request: &LookupRequest,
    ) -> impl Future<Output = Result<Vec<Suggestion>, LookupError>> + Send {
        async move {
            match self {
                ConfiguredLookup::Http(lookup) => lookup.lookup(request).await,
                ConfiguredLookup::Static(lookup) => lookup.lookup(request).await,
            }
        }
    }
}
