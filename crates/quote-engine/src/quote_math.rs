//! Pure price math: basis-point spreads, tick rounding, deviation. No I/O,
//! no state — every function here is a value transform, following the
//! source crate's `price_at_bps`/`should_replace` style.

pub fn bp_to_decimal(bp: f64) -> f64 {
    bp / 10_000.0
}

/// Full-spread offset used for placement. Note this is *not* half-spread:
/// `bid_target`/`ask_target` each move the full `spread_bp` off mid. The
/// half-spread form lives in `risk_bid_projection`/`risk_ask_projection`
/// below; the two are deliberately asymmetric.
pub fn bid_target(mid: f64, spread_bp: f64) -> f64 {
    mid - mid * bp_to_decimal(spread_bp)
}

pub fn ask_target(mid: f64, spread_bp: f64) -> f64 {
    mid + mid * bp_to_decimal(spread_bp)
}

/// Half-spread projection used only by the risk pass.
pub fn risk_bid_projection(mid: f64, spread_bp: f64) -> f64 {
    let spread_amount = mid * bp_to_decimal(spread_bp);
    mid - spread_amount / 2.0
}

pub fn risk_ask_projection(mid: f64, spread_bp: f64) -> f64 {
    let spread_amount = mid * bp_to_decimal(spread_bp);
    mid + spread_amount / 2.0
}

/// Half-away-from-zero rounding to the nearest multiple of `tick`.
pub fn round_to_tick(price: f64, tick: f64) -> f64 {
    if tick <= 0.0 {
        return price;
    }
    (price / tick).round() * tick
}

pub fn max_dev_abs(price: f64, pct: f64) -> f64 {
    price * pct / 100.0
}

pub fn dev(a: f64, b: f64) -> f64 {
    (a - b).abs()
}
