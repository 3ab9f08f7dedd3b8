//! Encoder pipeline: match search, block splitting, context modeling and
//! serialization.

pub mod compress;
pub mod context_model;
pub mod histogram;
pub mod match_finder;
pub mod splitter;

pub use compress::{compress_stream, raw_stream};
pub use context_model::{build_context_model, ContextModel};
pub use histogram::{BlockHistograms, Histogram};
pub use match_finder::{find_commands, MatchFinder};
pub use splitter::{plan_meta_blocks, BlockSplitter, CommandLayout, MetaBlockPlan};
