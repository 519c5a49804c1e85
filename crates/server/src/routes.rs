//! API route definitions

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use jql::output::JsonError;
use jql::replace::{self, Completion, Selection};
use jql::suggest::{AutoComplete, SuggestOutcome, Suggestions, ValueLookup};
use jql::text::char_len;
use jql::ParseReport;

/// Shared application state
pub type AppState<L> = Arc<AutoComplete<L>>;

/// Rejections carry the same error document as `jql --json`.
type ApiError = (StatusCode, Json<JsonError>);

/// Create API routes
pub fn create_routes<L: ValueLookup + 'static>(session: AppState<L>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/jql/parse", get(parse_query))
        .route("/jql/suggest", get(suggest))
        .route("/jql/complete", post(complete))
        .with_state(session)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "jql-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Query text and caret shared by the read endpoints
#[derive(Debug, Deserialize)]
pub struct QueryParams {
    /// Query text (default: empty)
    #[serde(default)]
    jql: String,
    /// Caret as a character index (default: end of the query)
    caret: Option<usize>,
}

/// Reject a caret past the end of the query.
fn check_caret(caret: usize, len: usize, command: &str) -> Result<usize, ApiError> {
    if caret > len {
        tracing::debug!(caret, len, "caret out of range");
        return Err((
            StatusCode::BAD_REQUEST,
            Json(JsonError::caret_out_of_range(caret, len, command)),
        ));
    }
    Ok(caret)
}

/// Validity, expectation and last-seen values for a query
async fn parse_query<L: ValueLookup>(
    Query(params): Query<QueryParams>,
    State(session): State<AppState<L>>,
) -> Result<Json<ParseReport>, ApiError> {
    let len = char_len(&params.jql);
    let caret = check_caret(params.caret.unwrap_or(len), len, "parse")?;
    Ok(Json(ParseReport::new(
        session.parser(),
        &params.jql,
        Some(caret),
    )))
}

/// Suggestion response
#[derive(Debug, Serialize)]
pub struct SuggestResponse {
    /// Whether the suggestion list should be open
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Suggestions>,
}

/// Suggestions at the caret
async fn suggest<L: ValueLookup>(
    Query(params): Query<QueryParams>,
    State(session): State<AppState<L>>,
) -> Result<Json<SuggestResponse>, ApiError> {
    let len = char_len(&params.jql);
    let caret = check_caret(params.caret.unwrap_or(len), len, "suggest")?;

    let suggestions = match session.suggest_detached(&params.jql, caret).await {
        SuggestOutcome::Show(suggestions) => Some(suggestions),
        SuggestOutcome::Hide | SuggestOutcome::Stale => None,
    };
    Ok(Json(SuggestResponse {
        visible: suggestions.is_some(),
        suggestions,
    }))
}

/// Completion request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRequest {
    pub jql: String,
    /// Start of the selection, or the caret
    pub caret: usize,
    /// End of the selection when text is selected
    #[serde(default)]
    pub selection_end: Option<usize>,
    /// Chosen suggestion value
    pub value: String,
}

/// Splice a chosen suggestion into the query
async fn complete<L: ValueLookup>(
    State(session): State<AppState<L>>,
    Json(request): Json<CompleteRequest>,
) -> Result<Json<Completion>, ApiError> {
    let len = char_len(&request.jql);
    let caret = check_caret(request.caret, len, "complete")?;
    let selection = match request.selection_end {
        Some(end) => Selection::new(caret, check_caret(end, len, "complete")?),
        None => Selection::caret(caret),
    };

    let parser = session.parser();
    let before: String = request.jql.chars().take(selection.start).collect();
    let outcome = parser.parse(&before);
    Ok(Json(replace::complete(
        parser,
        &outcome,
        &request.jql,
        selection,
        &request.value,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_test::TestServer;
    use jql::suggest::StaticValueLookup;
    use jql::JqlMetadata;
    use serde_json::Value;

    fn create_test_app() -> TestServer {
        let metadata = JqlMetadata::from_json(
            r#"{"fields": [
                  {"value": "status", "displayName": "Status", "operators": ["=", "!="],
                   "types": ["java.lang.String"], "auto": "true", "searchable": "true"}],
                "reservedWords": ["and", "or", "order", "by"]}"#,
        )
        .unwrap();
        let lookup = StaticValueLookup::new().with_values("status", ["Open", "Closed"]);
        let session = AutoComplete::new(metadata, lookup);
        TestServer::new(create_routes(Arc::new(session))).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = create_test_app();
        let response = server.get("/health").await;
        response.assert_status_ok();
        response.assert_json(&serde_json::json!({
            "status": "ok",
            "service": "jql-api",
            "version": env!("CARGO_PKG_VERSION")
        }));
    }

    #[tokio::test]
    async fn test_parse_defaults_to_empty_query() {
        let server = create_test_app();
        let response = server.get("/jql/parse").await;
        response.assert_status_ok();
        let report: Value = response.json();
        assert_eq!(report["valid"], true);
        assert_eq!(report["caret"], 0);
    }

    #[tokio::test]
    async fn test_suggest_detached_skips_debounce() {
        let server = create_test_app();
        let response = server
            .get("/jql/suggest")
            .add_query_param("jql", "status = O")
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["visible"], true);
        assert_eq!(body["suggestions"]["values"][0]["value"], "Open");
    }

    #[tokio::test]
    async fn test_caret_past_end_is_bad_request() {
        let server = create_test_app();
        let response = server
            .get("/jql/suggest")
            .add_query_param("jql", "sta")
            .add_query_param("caret", "4")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "INVALID_ARGUMENT");
    }
}
