pub mod cancel;
pub mod compare;
pub mod dedupe;
pub mod engine;
pub mod index;
pub mod matcher;
pub mod normalize;
pub mod orchestrator;
pub mod progress;
pub mod search;

pub use cancel::CancelFlag;
pub use compare::compare;
pub use dedupe::dedupe_found;
pub use engine::{reconcile, ReconcileError, Searchers};
pub use index::LibraryIndex;
pub use matcher::{match_libraries, MatchOutcome, MatchState, MatchedPair};
pub use orchestrator::{AuditError, AuditOrchestrator};
pub use progress::{CollectingSink, NullSink, ProgressEvent, ProgressSink, TracingSink};
pub use search::CatalogReconciler;
