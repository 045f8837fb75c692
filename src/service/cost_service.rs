//! Quote computation. All currency math is integer cents; views convert
//! to a 2-decimal dollar figure at the edge.

/// Per-gram rates and the lab minimum, in cents.
#[derive(Debug, Clone, Copy)]
pub struct RateCard {
    pub filament_cents_per_g: i64,
    pub resin_cents_per_g: i64,
    pub minimum_cents: i64,
}

/// Computes the quoted cost in cents: weight times the material rate,
/// floored at the lab minimum charge.
pub fn quote_cents(weight_g: f64, material: Option<&str>, rates: &RateCard) -> i64 {
    let rate = if is_resin(material) {
        rates.resin_cents_per_g
    } else {
        rates.filament_cents_per_g
    };
    let raw = (weight_g * rate as f64).round() as i64;
    raw.max(rates.minimum_cents)
}

/// Dollar representation for JSON views.
pub fn cents_to_usd(cents: i64) -> f64 {
    cents as f64 / 100.0
}

fn is_resin(material: Option<&str>) -> bool {
    material
        .map(|m| m.to_ascii_lowercase().contains("resin"))
        .unwrap_or(false)
}
