pub mod collection;
pub mod config;
pub mod converter;
pub mod error;
pub mod fallback;
pub mod ladder;
pub mod pipeline;
pub mod types;

pub use collection::{CollectionDocument, NormalizedInput, ENVELOPE_KEY};
pub use config::{ConfigLoader, ConfigValidator, DocsConfig};
pub use converter::{ConversionOptions, Converter, PostmanConverter, ServerEntry};
pub use error::AppError;
pub use fallback::{FallbackOutcome, SubprocessFallback};
pub use ladder::{ConversionLadder, ConversionResult, LadderOutcome};
pub use pipeline::{ConversionPipeline, PipelineOutcome, PipelineReport};
pub use types::*;
