//! Service layer - detection logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on one stage of turning SMS into pending transactions.

mod category;
mod identify;
mod listener;
pub mod parser;
mod pending;
mod pipeline;
mod stats;

pub use category::CategorySuggester;
pub use identify::SenderIdentifier;
pub use listener::{ListenerState, ListeningController, TransactionCallback};
pub use parser::{MessageParser, ParseOutcome, Tier};
pub use pending::PendingStore;
pub use pipeline::DetectionPipeline;
pub use stats::{DetectionStats, StatsRecorder};
