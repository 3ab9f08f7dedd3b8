pub mod decoder;
pub mod encoder;
pub mod lengths;
pub mod serialize;
pub mod tables;

pub use decoder::HuffmanDecoder;
pub use encoder::{CodeLayout, HuffmanEncoder};
pub use lengths::build_code_lengths;
pub use serialize::{read_prefix_code, write_prefix_code};
