use crate::format::ContextMode;
use crate::huffman::HuffmanDecoder;

/// Where the decoder will resume
///
/// Every state names the next unit of input to read. A unit is read in full
/// or not at all, so a state can always be retried with more input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecoderState {
    StreamHeader,
    MetaBlockHeader,
    /// Bytes of a raw meta-block still to copy
    RawBytes { remaining: usize },
    ContextMaps,
    CodeTables,
    Command,
    /// Literals of the current command, then its copy
    InsertLiterals { remaining: usize, copy_len: u32 },
    Distance { copy_len: u32 },
    CopyBytes { distance: usize, remaining: usize },
    Trailer,
    Done,
    Failed,
}

/// Progress through the current meta-block
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetaBlockProgress {
    /// Uncompressed bytes not yet produced
    pub remaining: usize,
    pub is_last: bool,
}

/// Context maps read ahead of the code tables
#[derive(Clone, Debug)]
pub struct ContextMaps {
    pub mode: ContextMode,
    pub literal_map: Vec<u8>,
    pub num_literal_trees: usize,
    pub distance_map: Vec<u8>,
    pub num_distance_trees: usize,
}

/// Everything needed to decode the commands of a compressed meta-block
#[derive(Clone, Debug)]
pub struct BlockTables {
    pub maps: ContextMaps,
    pub literal_trees: Vec<HuffmanDecoder>,
    pub command_tree: HuffmanDecoder,
    pub distance_trees: Vec<HuffmanDecoder>,
}

impl BlockTables {
    #[inline]
    pub fn literal_tree(&self, p1: u8, p2: u8) -> &HuffmanDecoder {
        let tree = self.maps.literal_map[self.maps.mode.context_id(p1, p2)];
        &self.literal_trees[tree as usize]
    }

    #[inline]
    pub fn distance_tree(&self, context: usize) -> &HuffmanDecoder {
        &self.distance_trees[self.maps.distance_map[context] as usize]
    }
}
