//! Exchange rate derivation from price ticks

use crate::ticks::PriceTick;

/// An exchange rate together with its provenance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rate {
    /// Units of the destination asset per unit of the source asset
    pub value: f64,
    /// True when no tick was available and the neutral rate was assumed
    pub assumed: bool,
}

impl Rate {
    /// Neutral 1:1 rate used before the first tick arrives
    pub const ASSUMED: Self = Self {
        value: 1.0,
        assumed: true,
    };
}

/// Derive a rate from a quoted price and size
///
/// The quote is for `size` units, so the per-unit rate is `price / size`.
/// Degenerate quotes (zero or non-finite size, zero price when inverted)
/// fall back to the neutral rate of 1.0.
#[must_use]
pub fn calculate_rate(price: f64, size: f64, inverted: bool) -> f64 {
    if !(size.is_finite() && size > 0.0 && price.is_finite()) {
        return 1.0;
    }
    let per_unit = price / size;
    if inverted {
        if per_unit > 0.0 { 1.0 / per_unit } else { 1.0 }
    } else {
        per_unit
    }
}

/// Rate for a conversion, given the latest tick for the pair if any
///
/// In the natural orientation the user sells the base asset, so the
/// maker's buy price applies. Inverted conversions price off the maker's
/// sell side before taking the reciprocal.
#[must_use]
pub fn effective_rate(tick: Option<&PriceTick>, inverted: bool) -> Rate {
    match tick {
        Some(t) => {
            let price = if inverted { t.sell_price } else { t.buy_price };
            Rate {
                value: calculate_rate(price, t.size, inverted),
                assumed: false,
            }
        }
        None => Rate::ASSUMED,
    }
}
