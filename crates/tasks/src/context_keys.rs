//! The context keys shared across the built-in task library. A separate
//! module so every task file references the same canonical key rather than
//! redeclaring its own copy of the name string.

use skein_context::ContextKey;

use crate::events::SourceItem;

/// The user's current query. Mutated in place by `refineQuery` on a
/// reflection cycle.
pub static QUERY: ContextKey<String> = ContextKey::new("query");

/// The ordered research steps produced by `planning`.
pub static PLAN: ContextKey<Vec<String>> = ContextKey::new("plan");

/// The structured search results gathered by `webSearch`.
pub static SOURCES: ContextKey<Vec<SourceItem>> = ContextKey::new("sources");

/// The answer drafted by `writer`, read by `reflector`, `completion`, and
/// `suggestions`.
pub static DRAFT_ANSWER: ContextKey<String> = ContextKey::new("draftAnswer");

/// The reflector's most recent critique, consumed by `refineQuery`.
pub static CRITIQUE: ContextKey<String> = ContextKey::new("critique");

/// Follow-up questions proposed by `suggestions`.
pub static SUGGESTIONS: ContextKey<Vec<String>> = ContextKey::new("suggestions");
