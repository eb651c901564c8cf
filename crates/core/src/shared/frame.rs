use ndarray::{ArrayView3, ArrayViewMut3};
use serde::{Deserialize, Serialize};

/// Byte order of the color channels in a [`Frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    #[default]
    Rgb,
    Bgr,
}

/// A single camera frame or image: contiguous 3-channel bytes in row-major
/// order (height x width x channels).
///
/// The channel order is carried with the pixels so adapters that expect a
/// specific convention can convert at their boundary.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    order: ChannelOrder,
    index: usize,
    timestamp_ms: f64,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            order: ChannelOrder::Rgb,
            index,
            timestamp_ms: 0.0,
        }
    }

    pub fn with_channel_order(mut self, order: ChannelOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_timestamp_ms(mut self, timestamp_ms: f64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn channel_order(&self) -> ChannelOrder {
        self.order
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn timestamp_ms(&self) -> f64 {
        self.timestamp_ms
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Copies the pixel rectangle starting at `(x, y)` into a new frame.
    ///
    /// The rectangle is intersected with the frame bounds, so the result may
    /// be smaller than requested (or empty). Index, timestamp and channel
    /// order are inherited.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Frame {
        let x0 = x.min(self.width);
        let y0 = y.min(self.height);
        let x1 = x.saturating_add(width).min(self.width);
        let y1 = y.saturating_add(height).min(self.height);
        let cw = x1 - x0;
        let ch = y1 - y0;

        let c = self.channels as usize;
        let stride = self.width as usize * c;
        let row_len = cw as usize * c;
        let mut data = Vec::with_capacity(row_len * ch as usize);
        for row in y0 as usize..y1 as usize {
            let start = row * stride + x0 as usize * c;
            data.extend_from_slice(&self.data[start..start + row_len]);
        }

        Frame {
            data,
            width: cw,
            height: ch,
            channels: self.channels,
            order: self.order,
            index: self.index,
            timestamp_ms: self.timestamp_ms,
        }
    }

    /// Returns a frame whose channels follow `order`, swapping the first and
    /// third channel of every pixel when the orders differ.
    pub fn to_channel_order(&self, order: ChannelOrder) -> Frame {
        if order == self.order || self.channels < 3 {
            return Frame {
                order,
                ..self.clone()
            };
        }
        let mut converted = self.clone();
        for px in converted.data.chunks_exact_mut(self.channels as usize) {
            px.swap(0, 2);
        }
        converted.order = order;
        converted
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
