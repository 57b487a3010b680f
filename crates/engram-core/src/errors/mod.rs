mod consolidation_error;
mod embedding_error;
mod engram_error;
mod ingest_error;
mod retrieval_error;
mod storage_error;

pub use consolidation_error::ConsolidationError;
pub use embedding_error::EmbeddingError;
pub use engram_error::{EngramError, EngramResult};
pub use ingest_error::IngestError;
pub use retrieval_error::RetrievalError;
pub use storage_error::StorageError;
