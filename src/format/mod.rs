//! Bitstream layout shared by the encoder and the decoder.

pub mod context;
pub mod context_map;
pub mod distance;
pub mod header;
pub mod tables;
pub mod tokens;

pub use context::{distance_context, ContextMode, NUM_DISTANCE_CONTEXTS, NUM_LITERAL_CONTEXTS};
pub use context_map::{read_context_map, write_context_map};
pub use distance::{DistanceCode, DistanceRing};
pub use header::{MetaBlockHeader, MAX_METABLOCK_LEN, MAX_WINDOW_BITS, MIN_WINDOW_BITS};
pub use tokens::Command;
