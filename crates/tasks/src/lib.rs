//! # skein-tasks
//!
//! The built-in task library (spec §4.9): `completion`, `planning`,
//! `webSearch`, `writer`, `reflector` (the spec's "analyzer / reflector"),
//! `refineQuery`, and `suggestions`. Every task is an ordinary
//! `skein_workflow::TaskDefinition` built from `task_fn` — none of this
//! crate's functionality needs engine-level special casing, matching spec
//! §4.9's framing that the task set is wired purely through the engine's
//! existing routing primitives.

mod completion;
mod context_keys;
mod events;
mod library;
mod planning;
mod reflector;
mod refine_query;
mod suggestions;
mod web_search;
mod writer;

pub use completion::build_completion_task;
pub use context_keys::{CRITIQUE, DRAFT_ANSWER, PLAN, QUERY, SOURCES, SUGGESTIONS};
pub use events::{AnswerEvent, AnswerStatus, SourceItem, ANSWER, SOURCES_EVENT};
pub use library::TaskLibrary;
pub use planning::build_planning_task;
pub use reflector::build_reflector_task;
pub use refine_query::build_refine_query_task;
pub use suggestions::build_suggestions_task;
pub use web_search::build_web_search_task;
pub use writer::build_writer_task;
