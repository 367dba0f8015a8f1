/// Threshold classification and status colouring.
///
/// Submodules:
/// - `thresholds` — severity scale and the flow/threshold classifier.
/// - `colors` — fixed severity palette for the three map layers.

pub mod colors;
pub mod thresholds;
