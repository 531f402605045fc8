//! Work decomposition for the render pass.
//!
//! The image is cut into rectangular tiles, and the tile list is
//! replicated once per subpixel sample cell. Workers claim entries
//! from the resulting list with an atomic counter, so a chunk is the
//! unit of scheduling, progress and cancellation.

/// A rectangular tile of the image rendered for one sample cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chunk {
    /// Left edge in pixels
    pub x: u32,
    /// Top edge in pixels
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Which cell of the stratified subpixel grid this chunk samples
    pub subpixel: (u32, u32),
}

/// Round a requested sample count to the nearest perfect square, with a
/// minimum of one. Stratified sampling places samples on a square grid,
/// so only square counts are representable.
pub fn nearest_square_sample_count(requested: u32) -> u32 {
    let root = (requested.max(1) as f32).sqrt().round() as u32;
    root.max(1) * root.max(1)
}

/// Generate the chunk list for an image.
///
/// `samples_per_pixel` must already be a perfect square. Tiles cover
/// every pixel exactly once per sample cell; edge tiles shrink instead
/// of overlapping.
pub fn generate_chunks(
    image_width: u32,
    image_height: u32,
    chunk_size: u32,
    samples_per_pixel: u32,
) -> Vec<Chunk> {
    let grid = (samples_per_pixel as f32).sqrt() as u32;
    let cols = image_width.div_ceil(chunk_size);
    let rows = image_height.div_ceil(chunk_size);

    let mut chunks = Vec::with_capacity((cols * rows * grid * grid) as usize);
    for sy in 0..grid {
        for sx in 0..grid {
            for row in 0..rows {
                for col in 0..cols {
                    let x = col * chunk_size;
                    let y = row * chunk_size;
                    chunks.push(Chunk {
                        x,
                        y,
                        width: chunk_size.min(image_width - x),
                        height: chunk_size.min(image_height - y),
                        subpixel: (sx, sy),
                    });
                }
            }
        }
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_square_rounding() {
        assert_eq!(nearest_square_sample_count(0), 1);
        assert_eq!(nearest_square_sample_count(1), 1);
        assert_eq!(nearest_square_sample_count(2), 1);
        assert_eq!(nearest_square_sample_count(3), 4);
        assert_eq!(nearest_square_sample_count(4), 4);
        assert_eq!(nearest_square_sample_count(7), 9);
        assert_eq!(nearest_square_sample_count(16), 16);
        assert_eq!(nearest_square_sample_count(20), 16);
        assert_eq!(nearest_square_sample_count(21), 25);
    }

    #[test]
    fn test_chunks_cover_image_exactly_once() {
        let (width, height) = (100u32, 70u32);
        let chunks = generate_chunks(width, height, 32, 1);

        let mut covered = vec![0u32; (width * height) as usize];
        for chunk in &chunks {
            assert!(chunk.x + chunk.width <= width);
            assert!(chunk.y + chunk.height <= height);
            for y in chunk.y..chunk.y + chunk.height {
                for x in chunk.x..chunk.x + chunk.width {
                    covered[(y * width + x) as usize] += 1;
                }
            }
        }
        assert!(covered.iter().all(|&c| c == 1));
    }

    #[test]
    fn test_chunk_count_scales_with_samples() {
        let single = generate_chunks(64, 64, 32, 1);
        assert_eq!(single.len(), 4);

        let four = generate_chunks(64, 64, 32, 4);
        assert_eq!(four.len(), 16);

        // Each sample cell covers the image once
        for sy in 0..2 {
            for sx in 0..2 {
                let count = four.iter().filter(|c| c.subpixel == (sx, sy)).count();
                assert_eq!(count, 4);
            }
        }
    }

    #[test]
    fn test_edge_tiles_shrink() {
        let chunks = generate_chunks(33, 33, 32, 1);
        assert_eq!(chunks.len(), 4);

        let corner = chunks
            .iter()
            .find(|c| c.x == 32 && c.y == 32)
            .expect("corner tile");
        assert_eq!(corner.width, 1);
        assert_eq!(corner.height, 1);
    }

    #[test]
    fn test_image_smaller_than_chunk() {
        let chunks = generate_chunks(5, 3, 32, 1);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].width, 5);
        assert_eq!(chunks[0].height, 3);
    }
}
