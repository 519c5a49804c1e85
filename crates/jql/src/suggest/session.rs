//! A suggestion session for one query editor.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::AutocompleteConfig;
use crate::errors::JqlError;
use crate::metadata::JqlMetadata;
use crate::parser::{ParseOutcome, Parser};
use crate::replace::{self, Completion, Selection};
use crate::report::Validity;

use super::cache::ResponseCache;
use super::dispatcher::{Dispatcher, PendingLookup, Plan};
use super::lookup::ValueLookup;
use super::Suggestions;

/// Default debounce before a lookup is issued.
pub const DEFAULT_QUERY_DELAY: Duration = Duration::from_millis(250);

/// Result of one suggestion pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestOutcome {
    Show(Suggestions),
    /// Nothing to suggest; close the list.
    Hide,
    /// A newer pass started before this one finished. Ignore it.
    Stale,
}

/// Parser, dispatcher, lookup and response cache for one editor.
///
/// Every call to [`suggest`](Self::suggest) takes a ticket from a sequence
/// counter. A pass whose ticket is no longer the latest when its values
/// arrive reports [`SuggestOutcome::Stale`] instead of suggestions.
pub struct AutoComplete<L> {
    parser: Parser,
    dispatcher: Dispatcher,
    lookup: L,
    cache: ResponseCache,
    sequence: AtomicU64,
    query_delay: Duration,
    last_parse: Mutex<Option<ParseOutcome>>,
}

impl<L: ValueLookup> AutoComplete<L> {
    pub fn new(metadata: JqlMetadata, lookup: L) -> Self {
        AutoComplete {
            parser: metadata.parser(),
            dispatcher: Dispatcher::new(metadata),
            lookup,
            cache: ResponseCache::new(),
            sequence: AtomicU64::new(0),
            query_delay: DEFAULT_QUERY_DELAY,
            last_parse: Mutex::new(None),
        }
    }

    /// Apply debounce and group size settings.
    pub fn with_config(mut self, config: &AutocompleteConfig) -> Self {
        self.query_delay = config.query_delay();
        self.dispatcher = self
            .dispatcher
            .with_max_suggestions(config.max_suggestions());
        self
    }

    pub fn with_query_delay(mut self, delay: Duration) -> Self {
        self.query_delay = delay;
        self
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    pub fn metadata(&self) -> &JqlMetadata {
        self.dispatcher.metadata()
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Number of suggestion passes started so far.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    fn last_parse(&self) -> MutexGuard<'_, Option<ParseOutcome>> {
        self.last_parse
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// A pass without a ticket is never stale.
    fn is_stale(&self, ticket: Option<u64>) -> bool {
        ticket.is_some_and(|ticket| self.sequence() != ticket)
    }

    /// Start a suggestion pass for `text` with the caret at character
    /// `caret`.
    ///
    /// Parsing, the dispatch decision and the sequence bump happen before
    /// this returns; only the lookup waits on the returned future.
    pub fn suggest(
        &self,
        text: &str,
        caret: usize,
    ) -> impl std::future::Future<Output = SuggestOutcome> + Send + '_ {
        let before_caret: String = text.chars().take(caret).collect();
        let outcome = self.parser.parse(&before_caret);
        let plan = self.dispatcher.plan(&outcome);
        let ticket = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_parse() = Some(outcome);

        async move {
            match plan {
                Plan::Hide => SuggestOutcome::Hide,
                Plan::Show(suggestions) => SuggestOutcome::Show(suggestions),
                Plan::Lookup(pending) => self.resolve(pending, Some(ticket)).await,
            }
        }
    }

    /// A pass outside the editor's sequence, for one session shared by many
    /// editors. It takes no ticket, skips the debounce and leaves the last
    /// parse alone.
    pub async fn suggest_detached(&self, text: &str, caret: usize) -> SuggestOutcome {
        let before_caret: String = text.chars().take(caret).collect();
        let plan = self.dispatcher.plan(&self.parser.parse(&before_caret));
        match plan {
            Plan::Hide => SuggestOutcome::Hide,
            Plan::Show(suggestions) => SuggestOutcome::Show(suggestions),
            Plan::Lookup(pending) => self.resolve(pending, None).await,
        }
    }

    async fn resolve(&self, pending: PendingLookup, ticket: Option<u64>) -> SuggestOutcome {
        let results = match self.cache.get(pending.request()) {
            Some(results) => {
                debug!(request = ?pending.request(), "lookup cache hit");
                results
            }
            None => {
                if ticket.is_some() && !self.query_delay.is_zero() {
                    tokio::time::sleep(self.query_delay).await;
                }
                if self.is_stale(ticket) {
                    debug!(?ticket, "dropping stale pass before lookup");
                    return SuggestOutcome::Stale;
                }
                match self.lookup.lookup(pending.request()).await {
                    Ok(results) => {
                        self.cache.insert(pending.request().clone(), results.clone());
                        results
                    }
                    Err(error) => {
                        warn!(%error, request = ?pending.request(), "value lookup failed");
                        Vec::new()
                    }
                }
            }
        };

        if self.is_stale(ticket) {
            debug!(?ticket, "dropping stale lookup response");
            return SuggestOutcome::Stale;
        }
        match pending.resolve(results) {
            Some(suggestions) => SuggestOutcome::Show(suggestions),
            None => SuggestOutcome::Hide,
        }
    }

    /// Parse the whole text for the valid/invalid indicator.
    pub fn validate(&self, text: &str) -> Validity {
        Validity::of(&self.parser.parse(text))
    }

    /// Splice a chosen suggestion into `text` using the last suggestion
    /// pass.
    pub fn complete(
        &self,
        text: &str,
        selection: Selection,
        value: &str,
    ) -> Result<Completion, JqlError> {
        let guard = self.last_parse();
        let outcome = guard.as_ref().ok_or(JqlError::NotParsed)?;
        Ok(replace::complete(
            &self.parser,
            outcome,
            text,
            selection,
            value,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggest::StaticValueLookup;

    #[test]
    fn test_complete_requires_a_suggestion_pass() {
        let session = AutoComplete::new(JqlMetadata::default(), StaticValueLookup::new());
        let error = session
            .complete("sta", Selection::caret(3), "status")
            .unwrap_err();
        assert!(matches!(error, JqlError::NotParsed));
    }

    #[tokio::test]
    async fn test_sequence_advances_per_pass() {
        let session = AutoComplete::new(JqlMetadata::default(), StaticValueLookup::new());
        assert_eq!(session.sequence(), 0);
        session.suggest("", 0).await;
        session.suggest("a", 1).await;
        assert_eq!(session.sequence(), 2);
    }

    #[tokio::test]
    async fn test_detached_pass_takes_no_ticket() {
        let session = AutoComplete::new(JqlMetadata::default(), StaticValueLookup::new());
        assert_eq!(session.suggest_detached("", 0).await, SuggestOutcome::Hide);
        assert_eq!(session.sequence(), 0);
        assert!(session.complete("", Selection::caret(0), "x").is_err());
    }

    #[test]
    fn test_config_applies_delay_and_cap() {
        let config = AutocompleteConfig {
            query_delay_ms: Some(10),
            max_suggestions: Some(3),
        };
        let session = AutoComplete::new(JqlMetadata::default(), StaticValueLookup::new())
            .with_config(&config);
        assert_eq!(session.query_delay, Duration::from_millis(10));
        assert_eq!(session.dispatcher.max_suggestions(), 3);
    }

    #[test]
    fn test_validate_reports_annotation() {
        let session = AutoComplete::new(JqlMetadata::default(), StaticValueLookup::new());
        assert!(session.validate("a = b").valid);
        let validity = session.validate("a = b c");
        assert!(!validity.valid);
        assert!(validity.message.is_some());
    }
}
