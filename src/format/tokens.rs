use super::tables::{encode_copy_length, encode_insert_length, command_symbol, LengthCode};

/// One LZ77 command: `insert_len` literals followed by a copy of `copy_len`
/// bytes from `distance` bytes back
///
/// `copy_len == 0` marks an insert-only command, which may only end a
/// meta-block; its copy is coded with copy code 0 and never performed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Command {
    pub insert_len: u32,
    pub copy_len: u32,
    pub distance: u32,
}

impl Command {
    pub fn new(insert_len: u32, copy_len: u32, distance: u32) -> Self {
        Self { insert_len, copy_len, distance }
    }

    /// A command carrying only literals
    pub fn insert_only(insert_len: u32) -> Self {
        Self { insert_len, copy_len: 0, distance: 0 }
    }

    pub fn is_insert_only(&self) -> bool {
        self.copy_len == 0
    }

    /// Returns the uncompressed size this command represents
    pub fn uncompressed_size(&self) -> usize {
        self.insert_len as usize + self.copy_len as usize
    }

    /// Length codes for the insert and copy parts
    pub fn length_codes(&self) -> (LengthCode, LengthCode) {
        let insert = encode_insert_length(self.insert_len);
        let copy = if self.is_insert_only() {
            LengthCode { code: 0, extra_value: 0, extra_bits: 0 }
        } else {
            encode_copy_length(self.copy_len)
        };
        (insert, copy)
    }

    /// Symbol in the command alphabet
    pub fn symbol(&self) -> usize {
        let (insert, copy) = self.length_codes();
        command_symbol(insert.code, copy.code)
    }
}
