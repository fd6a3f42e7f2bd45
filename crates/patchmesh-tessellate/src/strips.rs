//! Triangle strip indices over the flattened vertex array.

/// Strip indices for a `width × height` vertex array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripLayout {
    /// `num_strips * strip_len` indices.
    pub indices: Vec<u32>,
    /// Number of strips.
    pub num_strips: usize,
    /// Indices per strip.
    pub strip_len: usize,
}

impl StripLayout {
    /// Run strips along the longer array dimension so there are as few as
    /// possible.
    ///
    /// Row strips (`width >= height`) pair row `j` with row `j + 1`. Column
    /// strips pair column `j` with column `j + 1`, walking rows bottom-up so
    /// both orientations wind the same way.
    pub fn new(width: usize, height: usize) -> Self {
        if width == 0 || height == 0 {
            return Self {
                indices: Vec::new(),
                num_strips: 0,
                strip_len: 0,
            };
        }

        let index = |x: usize, y: usize| (y * width + x) as u32;
        let rows = width >= height;
        let (num_strips, strip_len) = if rows {
            (height - 1, width * 2)
        } else {
            (width - 1, height * 2)
        };

        let mut indices = Vec::with_capacity(num_strips * strip_len);
        for j in 0..num_strips {
            if rows {
                for i in 0..width {
                    indices.push(index(i, j));
                    indices.push(index(i, j + 1));
                }
            } else {
                for y in (0..height).rev() {
                    indices.push(index(j, y));
                    indices.push(index(j + 1, y));
                }
            }
        }

        Self {
            indices,
            num_strips,
            strip_len,
        }
    }
}
