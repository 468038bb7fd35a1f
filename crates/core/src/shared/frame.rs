use std::sync::Arc;

use ndarray::ArrayView3;

/// One decoded camera frame: contiguous RGB bytes in row-major order.
///
/// Pixel data sits behind an `Arc` so the capture worker, the inference
/// worker and the UI can hold the same frame without copying it.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Arc<[u8]>,
    width: u32,
    height: u32,
    channels: u8,
    sequence: u64,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, sequence: u64) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data: data.into(),
            width,
            height,
            channels,
            sequence,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Position of this frame in its capture session, starting at 0.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Expands RGB data to RGBA with an opaque alpha channel.
    pub fn to_rgba(&self) -> Vec<u8> {
        if self.channels == 4 {
            return self.data.to_vec();
        }
        let channels = self.channels.max(1) as usize;
        let mut rgba = Vec::with_capacity(self.data.len() / channels * 4);
        for px in self.data.chunks_exact(channels) {
            match px {
                [r, g, b, ..] => rgba.extend_from_slice(&[*r, *g, *b, 255]),
                [v, ..] => rgba.extend_from_slice(&[*v, *v, *v, 255]),
                [] => {}
            }
        }
        rgba
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
