//! taxrag-engine
//!
//! Question answering over one tax document: context fusion, cached scored
//! retrieval and answer composition with source attribution.

pub mod answer;
pub mod cache;
pub mod compose;
pub mod conversation;
pub mod corpus;
pub mod engine;
pub mod format;
pub mod retriever;
pub mod session_store;

pub use answer::{AnswerKind, AnswerResult, SourceRef};
pub use cache::QueryCache;
pub use compose::{suggest_followups, AnswerComposer};
pub use conversation::{ConversationState, ConversationSummary, ConversationTurn};
pub use corpus::{Corpus, CorpusStatus};
pub use engine::{EngineSession, EngineStats, RagEngine};
pub use retriever::{RetrievalOutcome, ScoredRetriever};
pub use session_store::SessionStore;
