pub mod coordinator;
pub mod ranker;
pub mod similarity;

pub use coordinator::GroupCoordinator;
pub use ranker::{rank, DEFAULT_TOP_K};
pub use similarity::cosine_similarity;
