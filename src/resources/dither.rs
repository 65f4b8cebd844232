//! 4×4 ordered-dither table used to break up banding in the scattering integral.

/// Bayer ordering, row-major.
pub const DITHER_PATTERN: [u8; 16] = [0, 8, 2, 10, 12, 4, 14, 6, 3, 11, 1, 9, 15, 7, 13, 5];

/// Side length of the dither texture.
pub const DITHER_SIZE: u32 = 4;

/// Dither coefficients `k / 16`, indexed `[row][column]`.
#[must_use]
pub fn dither_matrix() -> [[f32; 4]; 4] {
    let mut matrix = [[0.0; 4]; 4];
    for (i, &k) in DITHER_PATTERN.iter().enumerate() {
        matrix[i / 4][i % 4] = f32::from(k) / 16.0;
    }
    matrix
}

/// RGBA8 texels for the dither texture; each coefficient is truncated to a
/// byte and replicated into all four channels.
#[must_use]
pub fn dither_texels() -> Vec<[u8; 4]> {
    DITHER_PATTERN
        .iter()
        .map(|&k| [(u32::from(k) * 255 / 16) as u8; 4])
        .collect()
}
