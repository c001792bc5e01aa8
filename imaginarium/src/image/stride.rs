/// Aligns a value to 4-byte boundary.
pub(crate) fn align_stride(n: usize) -> usize {
    (n + 3) & !3
}

/// Copies `rows` rows of `row_bytes` each out of a buffer with `stride`
/// bytes per row, dropping the padding.
pub(crate) fn strip_stride_padding(
    src: &[u8],
    row_bytes: usize,
    rows: usize,
    stride: usize,
) -> Vec<u8> {
    if row_bytes == stride {
        return src[..row_bytes * rows].to_vec();
    }

    let mut packed = Vec::with_capacity(row_bytes * rows);
    for y in 0..rows {
        packed.extend_from_slice(&src[y * stride..y * stride + row_bytes]);
    }
    packed
}
