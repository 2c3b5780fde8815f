//! Currency to points conversion by purchase channel.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Bonus applied by the card-reader channel.
pub const CARD_READER_BONUS: f64 = 0.05;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseMethod {
    /// Prepaid point card bought at a discount.
    Card,
    /// Card reader top-up with a percentage bonus.
    CardReader,
    /// List price.
    #[default]
    Original,
    /// Points received as a discounted gift.
    Gift,
    /// Unrecognised channel; treated as list price.
    #[serde(other)]
    Other,
}

impl PurchaseMethod {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "card" => Self::Card,
            "cardreader" => Self::CardReader,
            "original" => Self::Original,
            "gift" => Self::Gift,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::CardReader => "cardreader",
            Self::Original => "original",
            Self::Gift => "gift",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for PurchaseMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Points bought with `investment`.
///
/// Discounted channels divide by `discount` and round to whole points; a discount of 0 or
/// less means no discount. Negative investments buy nothing.
pub fn points_for(investment: f64, method: PurchaseMethod, discount: f64) -> f64 {
    let investment = investment.max(0.0);
    match method {
        PurchaseMethod::Card | PurchaseMethod::Gift if discount > 0.0 => {
            (investment / discount).round()
        }
        PurchaseMethod::CardReader => investment * (1.0 + CARD_READER_BONUS),
        _ => investment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discounted_channels_round_to_whole_points() {
        assert_eq!(points_for(1000.0, PurchaseMethod::Card, 0.9), 1111.0);
        assert_eq!(points_for(1000.0, PurchaseMethod::Gift, 0.85), 1176.0);
    }

    #[test]
    fn missing_discount_passes_through() {
        assert_eq!(points_for(1000.0, PurchaseMethod::Card, 0.0), 1000.0);
        assert_eq!(points_for(1000.0, PurchaseMethod::Gift, -1.0), 1000.0);
    }

    #[test]
    fn card_reader_adds_bonus() {
        assert!((points_for(1000.0, PurchaseMethod::CardReader, 0.0) - 1050.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_methods_and_negative_investment() {
        assert_eq!(PurchaseMethod::from_label("crypto"), PurchaseMethod::Other);
        assert_eq!(points_for(500.0, PurchaseMethod::Other, 0.5), 500.0);
        assert_eq!(points_for(-500.0, PurchaseMethod::Original, 0.0), 0.0);
    }

    #[test]
    fn deserializes_lowercase_labels_and_unknowns() {
        let method: PurchaseMethod = serde_json::from_str("\"cardreader\"").expect("known");
        assert_eq!(method, PurchaseMethod::CardReader);
        let method: PurchaseMethod = serde_json::from_str("\"voucher\"").expect("other");
        assert_eq!(method, PurchaseMethod::Other);
    }
}
