use rand::Rng;

use crate::config::{MAX_PRICE_DELTA, SEED_PRICE_MAX, SEED_PRICE_MIN};

/// Next synthetic price for a product.
///
/// With no usable last price, seeds a whole number in [100, 999]. Otherwise
/// applies a uniform relative move in [-5%, +5%] and rounds to cents. A
/// candidate that rounds to <= 0 is discarded and the last price is kept.
pub fn next_price<R: Rng>(rng: &mut R, last: Option<f64>) -> f64 {
    let last = match last {
        Some(p) if p.is_finite() && p > 0.0 => p,
        // Absent, or a corrupt base that could walk into non-positive territory.
        _ => return seed_price(rng),
    };

    let delta = rng.gen_range(-MAX_PRICE_DELTA..=MAX_PRICE_DELTA);
    let candidate = round_cents(last * (1.0 + delta));
    if candidate <= 0.0 {
        last
    } else {
        candidate
    }
}

pub fn seed_price<R: Rng>(rng: &mut R) -> f64 {
    f64::from(rng.gen_range(SEED_PRICE_MIN..=SEED_PRICE_MAX))
}

/// Half away from zero, i.e. half-up for the positive prices handled here.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
