//! Buffer sizing: worst-case compressed size and encoder working memory.

use oxilzo_core::CompressionMode;

/// Hash table entries used by the fast encoder.
pub(crate) const FAST_DICT_SIZE: usize = 1 << 14;

/// Hash head entries used by the exhaustive encoder.
pub(crate) const EXHAUSTIVE_HASH_SIZE: usize = 1 << 16;

/// Chain entries used by the exhaustive encoder (covers the whole window).
pub(crate) const EXHAUSTIVE_CHAIN_SIZE: usize = 1 << 16;

/// Worst-case compressed size for an input of `len` bytes.
///
/// `len + len / 64 + 16 + 3`, saturating instead of wrapping.
pub const fn worst_case_bound(len: usize) -> usize {
    len.saturating_add(len / 64).saturating_add(16 + 3)
}

/// Working memory required by the encoder of `mode`, in bytes.
pub const fn work_mem_size(mode: CompressionMode) -> usize {
    WorkMem::entries(mode) * std::mem::size_of::<u32>()
}

/// Scratch tables for one compression call.
///
/// Allocated per call and dropped on every exit path.
#[derive(Debug, Clone)]
pub struct WorkMem {
    mode: CompressionMode,
    tables: Vec<u32>,
}

impl WorkMem {
    /// Allocate zeroed working memory for `mode`.
    pub fn new(mode: CompressionMode) -> Self {
        Self {
            mode,
            tables: vec![0; Self::entries(mode)],
        }
    }

    const fn entries(mode: CompressionMode) -> usize {
        match mode {
            CompressionMode::Fast => FAST_DICT_SIZE,
            CompressionMode::Exhaustive => EXHAUSTIVE_HASH_SIZE + EXHAUSTIVE_CHAIN_SIZE,
        }
    }

    /// The mode this memory was sized for.
    pub fn mode(&self) -> CompressionMode {
        self.mode
    }

    /// Size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.tables.len() * std::mem::size_of::<u32>()
    }

    /// Clear all tables and hand them out.
    pub(crate) fn reset(&mut self) -> &mut [u32] {
        self.tables.fill(0);
        &mut self.tables
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worst_case_bound() {
        assert_eq!(worst_case_bound(0), 19);
        assert_eq!(worst_case_bound(64), 64 + 1 + 19);
        assert_eq!(worst_case_bound(65536), 65536 + 1024 + 19);
        assert_eq!(worst_case_bound(usize::MAX), usize::MAX);
    }

    #[test]
    fn test_fast_needs_less_memory() {
        assert!(work_mem_size(CompressionMode::Fast) <= work_mem_size(CompressionMode::Exhaustive));
    }

    #[test]
    fn test_work_mem_matches_mode() {
        let mem = WorkMem::new(CompressionMode::Exhaustive);
        assert_eq!(mem.mode(), CompressionMode::Exhaustive);
        assert_eq!(mem.size_bytes(), work_mem_size(CompressionMode::Exhaustive));
    }
}
