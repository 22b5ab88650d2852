//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Largest size that fits inside `limit` while keeping the aspect ratio of
/// `source`. Never upscales; never returns a zero edge.
///
/// # Examples
/// ```
/// # use shelf_gal::imaging::fit_within;
/// // 1600x1200 landscape into a 100x100 box → 100x75
/// assert_eq!(fit_within((1600, 1200), (100, 100)), (100, 75));
///
/// // Already small enough → unchanged
/// assert_eq!(fit_within((80, 60), (100, 100)), (80, 60));
/// ```
pub fn fit_within(source: (u32, u32), limit: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = limit;

    if src_w == 0 || src_h == 0 {
        return (src_w, src_h);
    }
    if src_w <= max_w && src_h <= max_h {
        return source;
    }

    let scale = (max_w as f64 / src_w as f64).min(max_h as f64 / src_h as f64);
    let w = ((src_w as f64 * scale).round() as u32).clamp(1, max_w.max(1));
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, max_h.max(1));
    (w, h)
}
