use serde::{Deserialize, Serialize};

/// Pixel dimensions of a frame, surface or capture mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

const RATIO_4_3: f64 = 4.0 / 3.0;
const RATIO_16_9: f64 = 16.0 / 9.0;

/// Capture aspect ratios a camera pipeline can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectRatio {
    Ratio4x3,
    Ratio16x9,
}

impl AspectRatio {
    /// Picks the ratio nearest to `max(w, h) / min(w, h)`. Ties go to 4:3.
    pub fn closest(width: u32, height: u32) -> Self {
        let long = width.max(height) as f64;
        let short = width.min(height).max(1) as f64;
        let ratio = long / short;
        if (ratio - RATIO_4_3).abs() <= (ratio - RATIO_16_9).abs() {
            AspectRatio::Ratio4x3
        } else {
            AspectRatio::Ratio16x9
        }
    }
}

/// Chooses the capture size to request for a preview on `screen`.
///
/// Each candidate is scored by how far its width is from the screen height scaled to the
/// candidate's height (`round(candidate.height / screen.width * screen.height)`); lower
/// scores first, ties broken by smaller width. The first ranked candidate wider than
/// `screen.height` wins; if none is, the largest candidate is returned.
///
/// Returns `None` only when `candidates` is empty.
pub fn select_output_size(candidates: &[Size], screen: Size) -> Option<Size> {
    let largest = candidates
        .iter()
        .copied()
        .max_by_key(|s| (s.width, s.height))?;

    if screen.width == 0 {
        return Some(largest);
    }

    let mut ranked: Vec<(u64, Size)> = candidates
        .iter()
        .map(|&candidate| {
            let relative_height = (candidate.height as f64 / screen.width as f64
                * screen.height as f64)
                .round() as i64;
            let score = (relative_height - candidate.width as i64).unsigned_abs();
            (score, candidate)
        })
        .collect();
    ranked.sort_by_key(|&(score, size)| (score, size.width));

    let picked = ranked
        .into_iter()
        .map(|(_, size)| size)
        .find(|size| size.width > screen.height)
        .unwrap_or(largest);
    Some(picked)
}
