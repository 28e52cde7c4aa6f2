use serde::{Deserialize, Serialize};

/// Upper bound used by the open-ended ranges.
pub const PRICE_CEILING: f64 = 100_000_000.0;

/// Inclusive price bounds, in rupees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    pub const ANY: PriceRange = PriceRange { min: 0.0, max: PRICE_CEILING };

    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Resolve one of the browse page's range keys. Unknown keys mean "any".
    pub fn from_key(key: &str) -> Self {
        match key {
            "0-500000" => Self::new(0.0, 500_000.0),
            "500000-2000000" => Self::new(500_000.0, 2_000_000.0),
            "2000000-5000000" => Self::new(2_000_000.0, 5_000_000.0),
            "5000000-10000000" => Self::new(5_000_000.0, 10_000_000.0),
            "10000000-20000000" => Self::new(10_000_000.0, 20_000_000.0),
            "20000000+" => Self::new(20_000_000.0, PRICE_CEILING),
            _ => Self::ANY,
        }
    }

    pub fn contains(&self, price: f64) -> bool {
        price >= self.min && price <= self.max
    }
}

impl Default for PriceRange {
    fn default() -> Self {
        Self::ANY
    }
}

/// Format a price as whole rupees with Indian digit grouping, e.g. `₹25,00,000`.
pub fn format_inr(price: f64) -> String {
    let rounded = price.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let grouped = if digits.len() <= 3 {
        digits
    } else {
        let (head, tail) = digits.split_at(digits.len() - 3);
        let mut groups: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 0 {
            let start = end.saturating_sub(2);
            groups.push(&head[start..end]);
            end = start;
        }
        groups.reverse();
        format!("{},{}", groups.join(","), tail)
    };

    if negative {
        format!("-₹{}", grouped)
    } else {
        format!("₹{}", grouped)
    }
}
