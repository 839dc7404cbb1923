//! Compressed-block verification.

use crate::decode::decompress_into;
use oxilzo_core::error::Result;

/// Check that `packed` is a well-formed LZO1X block.
///
/// The block is fully decoded into `scratch`, which must be large enough to
/// hold the uncompressed data. No other memory is used and `packed` is left
/// unchanged; only success or failure is reported.
pub fn optimize(packed: &[u8], scratch: &mut [u8]) -> Result<()> {
    let produced = decompress_into(packed, scratch)?;
    tracing::trace!(packed = packed.len(), produced, "block verified");
    Ok(())
}
