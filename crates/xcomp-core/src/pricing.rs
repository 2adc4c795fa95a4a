//! Price function contract: `(win_rate, top4_rate, pick_rate) -> close`.

/// Maps composition rates to a bounded synthetic close price.
///
/// Implementations are injected by the caller; the market treats the output
/// as an opaque number.
pub trait PriceFunction: Send + Sync {
    fn price(&self, win_rate: f64, top4_rate: f64, pick_rate: f64) -> f64;
}

impl<F> PriceFunction for F
where
    F: Fn(f64, f64, f64) -> f64 + Send + Sync,
{
    fn price(&self, win_rate: f64, top4_rate: f64, pick_rate: f64) -> f64 {
        self(win_rate, top4_rate, pick_rate)
    }
}

/// Weighted sum of the three rates. With rates in `[0, 1]` and non-negative
/// weights the close is bounded by the sum of the weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearPrice {
    pub win_weight: f64,
    pub top4_weight: f64,
    pub pick_weight: f64,
}

impl Default for LinearPrice {
    fn default() -> Self {
        Self {
            win_weight: 50.0,
            top4_weight: 30.0,
            pick_weight: 20.0,
        }
    }
}

impl PriceFunction for LinearPrice {
    fn price(&self, win_rate: f64, top4_rate: f64, pick_rate: f64) -> f64 {
        self.win_weight * win_rate + self.top4_weight * top4_rate + self.pick_weight * pick_rate
    }
}
