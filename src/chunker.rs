//! Splits a payload into fixed-size pieces, twice over: once into per-input
//! parts (`PART_SIZE` bytes each, one part per funding slot) and once more
//! into per-push chunks (`CHUNK_SIZE` bytes each, `ceil(PART_SIZE /
//! CHUNK_SIZE)` chunks per full part).
//!
//! Grounded in `injection/chunk.go`'s `dataToChunks`/`dataToParts`. Unlike
//! the original, no index byte is prepended to each part (see
//! SPEC_FULL.md §9): this crate relies on the funding slots' own ordering to
//! recover chunk order on extraction, not on an embedded byte.

use crate::error::Error;

/// Splits `data` into consecutive slices of at most `size` bytes each,
/// preserving order. The final slice may be shorter than `size`.
pub fn chunk(data: &[u8], size: usize) -> Result<Vec<&[u8]>, Error> {
    if size == 0 {
        return Err(Error::InvalidChunkSize);
    }

    if data.is_empty() {
        return Ok(Vec::new());
    }

    Ok(data.chunks(size).collect())
}

/// Splits a payload into ordered parts, one per funding slot.
pub fn parts(data: &[u8]) -> Result<Vec<&[u8]>, Error> {
    chunk(data, crate::config::PART_SIZE)
}

/// Splits a single part into the ordered chunks its redeem script will hash.
pub fn chunks_of_part(part: &[u8]) -> Result<Vec<&[u8]>, Error> {
    chunk(part, crate::config::CHUNK_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_size_is_rejected() {
        assert!(matches!(chunk(b"abc", 0), Err(Error::InvalidChunkSize)));
    }

    #[test]
    fn empty_payload_chunks_to_nothing() {
        assert_eq!(chunk(b"", 4).unwrap(), Vec::<&[u8]>::new());
    }

    #[test]
    fn exact_multiple_leaves_no_short_tail() {
        let data = [0u8; 8];
        let out = chunk(&data, 4).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].len(), 4);
        assert_eq!(out[1].len(), 4);
    }

    #[test]
    fn remainder_forms_a_short_final_chunk() {
        let data = [0u8; 10];
        let out = chunk(&data, 4).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[2].len(), 2);
    }

    #[test]
    fn ordering_is_preserved() {
        let data: Vec<u8> = (0..20u8).collect();
        let out = chunk(&data, 6).unwrap();
        let rejoined: Vec<u8> = out.into_iter().flatten().copied().collect();
        assert_eq!(rejoined, data);
    }

    #[test]
    fn a_full_part_yields_three_chunks() {
        let data = [0u8; 1461];
        let out = chunks_of_part(&data).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].len(), 520);
        assert_eq!(out[1].len(), 520);
        assert_eq!(out[2].len(), 421);
    }
}
