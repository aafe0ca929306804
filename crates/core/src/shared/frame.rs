use std::fmt;
use std::marker::PhantomData;

use ndarray::ArrayView3;

/// Number of interleaved color channels in every [`Frame`].
pub const CHANNELS: usize = 3;

/// Channel order marker carried by a [`Frame`] at the type level.
pub trait ChannelOrder: Send + Sync + 'static {
    const NAME: &'static str;
}

/// Blue, green, red: the order decoders hand out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bgr;

/// Red, green, blue: the order the detection model consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb;

impl ChannelOrder for Bgr {
    const NAME: &'static str = "BGR";
}

impl ChannelOrder for Rgb {
    const NAME: &'static str = "RGB";
}

/// A still image: contiguous 8-bit, 3-channel pixels in row-major
/// (height × width × channel) order.
///
/// The channel order is part of the type, so a decoded image can never be
/// handed to the model without going through the preprocessor first.
pub struct Frame<O: ChannelOrder> {
    data: Vec<u8>,
    width: u32,
    height: u32,
    order: PhantomData<O>,
}

/// Output of the image decoder.
pub type DecodedImage = Frame<Bgr>;

/// Output of the preprocessor, input of the detector.
pub type PreprocessedImage = Frame<Rgb>;

impl<O: ChannelOrder> Frame<O> {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            order: PhantomData,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channel_order(&self) -> &'static str {
        O::NAME
    }

    /// Pixel at (`row`, `col`) in this frame's channel order.
    pub fn pixel(&self, row: u32, col: u32) -> [u8; CHANNELS] {
        let start = ((row as usize) * (self.width as usize) + col as usize) * CHANNELS;
        [self.data[start], self.data[start + 1], self.data[start + 2]]
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (self.height as usize, self.width as usize, CHANNELS)
    }
}

impl<O: ChannelOrder> Clone for Frame<O> {
    fn clone(&self) -> Self {
        Self::new(self.data.clone(), self.width, self.height)
    }
}

impl<O: ChannelOrder> PartialEq for Frame<O> {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height && self.data == other.data
    }
}

impl<O: ChannelOrder> fmt::Debug for Frame<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("order", &O::NAME)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}
