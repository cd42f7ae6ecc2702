//! Amount arithmetic shared by quoting, execution and deployment.

use alloy_primitives::U256;

use crate::error::{EngineError, EngineResult};

/// Slippage is applied in parts-per-million so fractional percentages survive.
const PPM: u64 = 1_000_000;

/// Minimum acceptable output for `amount` with `slippage_percent` tolerance,
/// i.e. `amount * (1 - slippage_percent / 100)` rounded down.
pub fn apply_slippage(amount: U256, slippage_percent: f64) -> EngineResult<U256> {
    if !slippage_percent.is_finite() || !(0.0..=100.0).contains(&slippage_percent) {
        return Err(EngineError::InvalidTradeParameters(format!(
            "slippage tolerance must be between 0 and 100 percent, got {}",
            slippage_percent
        )));
    }

    let tolerance_ppm = (slippage_percent * 10_000.0).round() as u64;
    let keep = U256::from(PPM - tolerance_ppm.min(PPM));
    let ppm = U256::from(PPM);

    // Split to avoid overflowing on amounts near U256::MAX.
    let whole = amount / ppm;
    let rest = amount % ppm;
    Ok(whole * keep + rest * keep / ppm)
}

/// Gas limit with a percentage safety buffer, rounded up:
/// `ceil(estimate * (100 + buffer_percent) / 100)`.
pub fn gas_limit_with_buffer(estimate: u64, buffer_percent: u32) -> u64 {
    let scaled = estimate as u128 * (100 + buffer_percent as u128);
    let limit = scaled.div_ceil(100);
    u64::try_from(limit).unwrap_or(u64::MAX)
}

/// Basis points returned by a pool into a percentage.
pub fn bps_to_percent(bps: U256) -> f64 {
    bps.saturating_to::<u64>() as f64 / 100.0
}
