//! Binary foreground/background classification of mask pixels.
//!
//! Masks are expected to be pre-thresholded: white hold blobs on a black
//! background. Anti-aliased or lossy-compressed edges land on either side
//! of the threshold depending on how bright they are.

use crate::types::Rgb;

/// Decides whether a pixel sample belongs to a hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelClassifier {
    threshold: u8,
}

impl PixelClassifier {
    /// Classifier that accepts samples whose channels all exceed `threshold`.
    #[must_use]
    pub const fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    /// The channel threshold in use.
    #[must_use]
    pub const fn threshold(&self) -> u8 {
        self.threshold
    }

    /// `true` iff every channel is strictly greater than the threshold.
    #[must_use]
    pub const fn is_foreground(&self, sample: Rgb<u8>) -> bool {
        let [r, g, b] = sample.0;
        r > self.threshold && g > self.threshold && b > self.threshold
    }
}

impl Default for PixelClassifier {
    fn default() -> Self {
        Self::new(crate::DetectConfig::DEFAULT_THRESHOLD)
    }
}
