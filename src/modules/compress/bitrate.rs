const BYTES_PER_MB: u64 = 1_048_576;

/// Share of the size budget left for the video stream after container overhead.
pub const USABLE_FRACTION: f64 = 0.95;

/// Video bitrate in kbit/s that lands an encode of `duration_s` seconds
/// near `target_mb` megabytes.
///
/// The caller guarantees `duration_s > 0`. The result is never below 1.
pub fn compute_bitrate_kbps(target_mb: u32, duration_s: f64) -> u64 {
    let size_bits = u64::from(target_mb) * BYTES_PER_MB * 8;
    let usable_bits = (size_bits as f64 * USABLE_FRACTION) as u64;
    let seconds = (duration_s.ceil() as u64).max(1);

    let bitrate_bps = (usable_bits / seconds).max(1);
    (bitrate_bps / 1024).max(1)
}
