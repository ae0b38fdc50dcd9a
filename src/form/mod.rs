pub mod catalog;
pub mod classifier;
pub mod intent;
pub mod locator;
pub mod orchestrator;
pub mod platform;
pub mod report;
pub mod resolver;
pub mod runner;
pub mod submit;

pub use catalog::{default_candidates, reveal_candidates, submit_candidates, CandidateCatalog};
pub use classifier::{OutcomeClassifier, SubmissionOutcome, Verdict};
pub use intent::{FieldIntent, FieldMap, FieldValue};
pub use locator::{CandidateList, CandidateQuery, Locator, TagScope};
pub use orchestrator::FillOrchestrator;
pub use platform::AtsPlatform;
pub use report::{FieldFill, FillReport, FillResult};
pub use resolver::{FieldResolver, Match, ResolvedField, Unresolved};
pub use runner::FormRunner;
pub use submit::{SubmissionDriver, SubmitAttempt};
