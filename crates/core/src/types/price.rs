//! Whole-yuan price amounts.
//!
//! Item guide prices, order deposits and order totals are stored as integer
//! yuan; furniture in this catalogue is never priced in fen.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A non-negative amount in whole yuan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(i32);

impl Price {
    /// Zero yuan.
    pub const ZERO: Self = Self(0);

    /// Create a price, rejecting negative amounts.
    #[must_use]
    pub const fn new(yuan: i32) -> Option<Self> {
        if yuan < 0 { None } else { Some(Self(yuan)) }
    }

    /// Amount in yuan.
    #[must_use]
    pub const fn yuan(&self) -> i32 {
        self.0
    }

    /// Amount still owed once `deposit` has been paid.
    #[must_use]
    pub const fn balance_after(&self, deposit: Self) -> Self {
        let owed = self.0.saturating_sub(deposit.0);
        if owed < 0 { Self::ZERO } else { Self(owed) }
    }
}

impl fmt::Display for Price {
    /// Formats with a currency sign and thousands separators (`¥12,800`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        write!(f, "¥{grouped}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_negative() {
        assert_eq!(Price::new(-1), None);
        assert_eq!(Price::new(0), Some(Price::ZERO));
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Price::new(0).map(|p| p.to_string()).as_deref(), Some("¥0"));
        assert_eq!(Price::new(980).map(|p| p.to_string()).as_deref(), Some("¥980"));
        assert_eq!(
            Price::new(12_800).map(|p| p.to_string()).as_deref(),
            Some("¥12,800")
        );
        assert_eq!(
            Price::new(1_280_000).map(|p| p.to_string()).as_deref(),
            Some("¥1,280,000")
        );
    }

    #[test]
    fn test_balance_after_deposit() {
        let price = Price::new(10_000).unwrap_or_default();
        let deposit = Price::new(2_000).unwrap_or_default();
        assert_eq!(price.balance_after(deposit).yuan(), 8_000);
        assert_eq!(deposit.balance_after(price), Price::ZERO);
    }

    #[test]
    fn test_balance_in_const_context() {
        const OWED: Price = Price(500).balance_after(Price(200));
        const OVERPAID: Price = Price(200).balance_after(Price(500));
        assert_eq!(OWED.yuan(), 300);
        assert_eq!(OVERPAID, Price::ZERO);
    }
}
