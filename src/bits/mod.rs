pub mod reader;
pub mod writer;

pub use reader::BitReader;
pub use writer::{BitWriter, Snapshot};
