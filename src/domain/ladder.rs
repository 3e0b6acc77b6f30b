//! Exchange price ladder — the fixed grid of permitted odds.
//!
//! Betfair-style exchanges only accept prices from a non-uniform grid
//! between 1.01 and 1000, with the tick size growing by price band
//! (0.01 below 2.00, 0.02 up to 3.00, and so on up to 10.00 ticks at
//! the top of the ladder). Every price the decision path compares or
//! emits is snapped here, at the point where a raw quote enters the
//! system; an unsnapped price is the single most common cause of
//! rejected orders.
//!
//! Prices are handled internally as integer centi-units so float noise
//! can never make a valid ladder price compare unequal.

/// Lowest price on the ladder.
pub const MIN_PRICE: f64 = 1.01;

/// Highest price on the ladder.
pub const MAX_PRICE: f64 = 1000.0;

/// Ladder bands in centi-units: (inclusive upper bound, tick size).
///
/// The lower bound of each band is the upper bound of the previous one;
/// the first band starts just above 1.00. Band tops (2.00, 3.00, ...)
/// are themselves valid prices and belong to the band below them.
const BANDS: &[(i64, i64)] = &[
    (200, 1),       // 1.01  – 2.00  : 0.01
    (300, 2),       // 2.02  – 3.00  : 0.02
    (400, 5),       // 3.05  – 4.00  : 0.05
    (600, 10),      // 4.10  – 6.00  : 0.10
    (1_000, 20),    // 6.20  – 10.00 : 0.20
    (2_000, 50),    // 10.50 – 20.00 : 0.50
    (3_000, 100),   // 21.00 – 30.00 : 1.00
    (5_000, 200),   // 32.00 – 50.00 : 2.00
    (10_000, 500),  // 55.00 – 100.0 : 5.00
    (100_000, 1_000), // 110.0 – 1000 : 10.00
];

const MIN_CENTI: i64 = 101;
const MAX_CENTI: i64 = 100_000;

/// Tolerance when mapping an f64 price onto the centi grid.
const CENTI_EPSILON: f64 = 1e-6;

fn to_centi(price: f64) -> i64 {
    (price * 100.0).round() as i64
}

fn from_centi(centi: i64) -> f64 {
    centi as f64 / 100.0
}

/// Lower bound (exclusive) of the band with the given index.
fn band_floor(idx: usize) -> i64 {
    if idx == 0 { 100 } else { BANDS[idx - 1].0 }
}

/// Index of the band containing `centi` (assumes in-range input).
fn band_of(centi: i64) -> usize {
    BANDS
        .iter()
        .position(|&(upper, _)| centi <= upper)
        .unwrap_or(BANDS.len() - 1)
}

/// True iff `price` lies exactly on the ladder.
pub fn is_valid(price: f64) -> bool {
    let scaled = price * 100.0;
    let centi = scaled.round() as i64;
    if (scaled - centi as f64).abs() > CENTI_EPSILON {
        return false;
    }
    if !(MIN_CENTI..=MAX_CENTI).contains(&centi) {
        return false;
    }
    let band = band_of(centi);
    (centi - band_floor(band)) % BANDS[band].1 == 0
}

/// Largest ladder price at or below `price`; clamps out-of-range input.
pub fn snap_down(price: f64) -> f64 {
    from_centi(snap_down_centi(to_centi(price)))
}

/// Smallest ladder price at or above `price`; clamps out-of-range input.
pub fn snap_up(price: f64) -> f64 {
    from_centi(snap_up_centi(to_centi(price)))
}

/// Nearest ladder price to `price` (ties resolve downward); clamps
/// out-of-range input to the nearest bound rather than erroring.
pub fn snap(price: f64) -> f64 {
    let centi = to_centi(price);
    let down = snap_down_centi(centi);
    let up = snap_up_centi(centi);
    if centi - down <= up - centi {
        from_centi(down)
    } else {
        from_centi(up)
    }
}

fn snap_down_centi(centi: i64) -> i64 {
    let centi = centi.clamp(MIN_CENTI, MAX_CENTI);
    let band = band_of(centi);
    let floor = band_floor(band);
    let step = BANDS[band].1;
    let snapped = floor + (centi - floor) / step * step;
    // The first band's floor (1.00) is below the ladder minimum.
    snapped.max(MIN_CENTI)
}

fn snap_up_centi(centi: i64) -> i64 {
    let centi = centi.clamp(MIN_CENTI, MAX_CENTI);
    let band = band_of(centi);
    let floor = band_floor(band);
    let step = BANDS[band].1;
    floor + (centi - floor + step - 1) / step * step
}

/// Zero-based position of a valid centi price within the full ladder.
fn tick_index(centi: i64) -> i64 {
    let band = band_of(centi);
    let mut index = 0;
    for idx in 0..band {
        index += (BANDS[idx].0 - band_floor(idx)) / BANDS[idx].1;
    }
    // The first band floor (1.00) sits off-ladder, hence the -1.
    index + (centi - band_floor(band)) / BANDS[band].1 - 1
}

/// Total number of prices on the ladder.
fn ladder_len() -> i64 {
    tick_index(MAX_CENTI) + 1
}

/// Centi price at a zero-based ladder position (clamped).
fn price_at_index(index: i64) -> i64 {
    let index = index.clamp(0, ladder_len() - 1) + 1;
    let mut remaining = index;
    for (idx, &(upper, step)) in BANDS.iter().enumerate() {
        let floor = band_floor(idx);
        let in_band = (upper - floor) / step;
        if remaining <= in_band {
            return floor + remaining * step;
        }
        remaining -= in_band;
    }
    MAX_CENTI
}

/// Move `n` ticks from the snapped price, clamped to the ladder bounds.
pub fn ticks_away(price: f64, n: i64) -> f64 {
    let centi = to_centi(snap(price));
    from_centi(price_at_index(tick_index(centi) + n))
}

/// Signed tick distance from `from` to `to` (both snapped first).
pub fn ticks_between(from: f64, to: f64) -> i64 {
    tick_index(to_centi(snap(to))) - tick_index(to_centi(snap(from)))
}
