//! americano-extraction - Concept extraction from lecture content
//!
//! Sends lecture chunks to a content-generation service and collects the
//! medical concepts it names. Each chunk's call goes through the retry loop
//! and circuit breaker from `americano-resilience` independently, so one
//! bad chunk never sinks the batch.
//!
//! ## Usage
//!
//! ```ignore
//! let generator = Arc::new(HttpContentGenerator::new(&config.generator)?);
//! let extractor = BatchExtractor::new(generator, caller, circuits, config);
//! let summary = extractor.extract(chunks, &cancel).await?;
//! println!("{} of {} chunks succeeded", summary.succeeded, summary.total);
//! ```

pub mod config;
pub mod error;
pub mod generator;
pub mod llm;
pub mod orchestrator;
pub mod prompt;
pub mod stats;
pub mod types;

pub use config::{DEFAULT_CIRCUIT_KEY, ExtractionConfig, GeneratorConfig};
pub use error::{ExtractionError, Result};
pub use generator::{ContentGenerator, GenerateError, GenerationContext};
pub use llm::HttpContentGenerator;
pub use orchestrator::BatchExtractor;
pub use stats::{ExtractionStats, OutcomeCounts};
pub use types::{
    BatchChunkResult, BatchOutcome, BatchSummary, ChunkId, ContentChunk, ExtractedConcept,
    GeneratedContent,
};
