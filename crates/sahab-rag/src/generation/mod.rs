//! Answer generation: prompt assembly, streaming and localization

pub mod citation;
pub mod prompt;
pub mod streamer;
pub mod translation;

pub use citation::section_references;
pub use prompt::{PromptAssembler, PASSAGE_SEPARATOR};
pub use streamer::{
    FragmentStream, GenerationOutcome, GenerationRun, GenerationState, GenerationStream,
    GenerationStreamer, GENERATION_ERROR_PREFIX,
};
pub use translation::{split_keep_whitespace, Localizer};
