// THEORY:
// The `Pixel` module is the most fundamental unit of the pipeline. It is a
// "dumb" data container for a single 3-channel sample plus the handful of
// operations that can be computed from the sample alone: packing to and from
// the 24-bit bus word, and the unsigned per-channel distance used by the
// sharpness metric. Anything that needs more than two pixels (windows,
// metrics, decisions) belongs in higher modules.
//
// Key architectural principles:
// 1.  **Fixed wire layout**: the packed word places R in the low byte, G in
//     the middle byte and B in the high byte. Every boundary port and every
//     stored cell uses this exact layout; it is the one representation the
//     whole design agrees on.
// 2.  **Unsigned-safe arithmetic**: `channel_delta` is the two-sided
//     "larger minus smaller" form, so it can never underflow and equal
//     channels yield exactly 0.
// 3.  **Value semantics**: a pixel is 3 bytes, `Copy`, immutable once
//     produced. Equality is channel-wise.

pub mod pixel {
    pub type Byte = u8;
    pub type Channel = Byte;
    /// A 24-bit packed pixel word carried in the low bits of a `u32`.
    pub type PackedWord = u32;
    pub type ChannelDelta = u16;
    /// Accumulator for summed channel deltas (27 terms of at most 255 each).
    pub type MetricSum = u32;
    pub type Threshold = u16;

    /// A single 8-bit-per-channel RGB sample.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pixel {
        pub red: Channel,
        pub green: Channel,
        pub blue: Channel,
    }

    impl Pixel {
        pub const BLACK: Pixel = Pixel::new(0, 0, 0);
        pub const WHITE: Pixel = Pixel::new(255, 255, 255);

        pub const fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Self { red, green, blue }
        }

        /// Packs the channels into the 24-bit bus word: R low, G middle, B high.
        pub const fn pack(&self) -> PackedWord {
            self.red as PackedWord
                | (self.green as PackedWord) << 8
                | (self.blue as PackedWord) << 16
        }

        /// Recovers a pixel from a 24-bit bus word. Bits above 23 are ignored.
        pub const fn unpack(word: PackedWord) -> Self {
            Self {
                red: (word & 0xff) as Channel,
                green: ((word >> 8) & 0xff) as Channel,
                blue: ((word >> 16) & 0xff) as Channel,
            }
        }

        /// Unsigned distance between two channel values (larger minus smaller).
        pub fn channel_delta(a: Channel, b: Channel) -> ChannelDelta {
            if a > b {
                (a - b) as ChannelDelta
            } else {
                (b - a) as ChannelDelta
            }
        }

        /// Sum of the three per-channel distances to `other`.
        /// A pixel's deviation from itself is exactly 0.
        pub fn deviation(&self, other: &Pixel) -> MetricSum {
            Self::channel_delta(self.red, other.red) as MetricSum
                + Self::channel_delta(self.green, other.green) as MetricSum
                + Self::channel_delta(self.blue, other.blue) as MetricSum
        }
    }
}
