//! Sortable byte encoding for point dimensions.
//!
//! Each dimension of a point is stored as 4 big-endian bytes whose
//! lexicographic order matches the numeric order of the encoded float:
//! non-negative values get their sign bit flipped, negative values get all
//! bits flipped. Bounding-box comparisons and tree splits can then work on
//! raw bytes without decoding.

/// Bytes occupied by one encoded dimension.
pub const BYTES_PER_DIM: usize = 4;

#[inline]
fn sortable_bits(bits: u32) -> u32 {
    if bits & 0x8000_0000 != 0 {
        !bits
    } else {
        bits ^ 0x8000_0000
    }
}

#[inline]
fn float_bits(sortable: u32) -> u32 {
    if sortable & 0x8000_0000 != 0 {
        sortable ^ 0x8000_0000
    } else {
        !sortable
    }
}

/// Encode one dimension into `dest[offset..offset + 4]`.
///
/// # Panics
///
/// Panics if `dest` is too short.
#[inline]
pub fn encode_dimension(value: f32, dest: &mut [u8], offset: usize) {
    let sortable = sortable_bits(value.to_bits());
    dest[offset..offset + BYTES_PER_DIM].copy_from_slice(&sortable.to_be_bytes());
}

/// Decode the dimension stored at `packed[offset..offset + 4]`.
///
/// # Panics
///
/// Panics if `packed` is too short.
#[inline]
#[must_use]
pub fn decode_dimension(packed: &[u8], offset: usize) -> f32 {
    let mut be = [0u8; BYTES_PER_DIM];
    be.copy_from_slice(&packed[offset..offset + BYTES_PER_DIM]);
    f32::from_bits(float_bits(u32::from_be_bytes(be)))
}

/// Encode a full point into a fresh packed buffer.
#[must_use]
pub fn pack_point(values: &[f32]) -> Vec<u8> {
    let mut packed = vec![0u8; values.len() * BYTES_PER_DIM];
    for (i, &v) in values.iter().enumerate() {
        encode_dimension(v, &mut packed, i * BYTES_PER_DIM);
    }
    packed
}
