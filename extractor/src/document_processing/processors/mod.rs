// Processors turn extracted content into model input

pub mod assembler;
pub mod relevance;

pub use assembler::ContentAssembler;
pub use relevance::RelevanceFilter;
