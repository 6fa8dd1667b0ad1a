//! # Idempotency Keys
//!
//! POS connectors replay events: webhook retries, overlapping batch syncs,
//! manual re-imports. Every sale event is reduced to a deterministic
//! reference key, stored on each ledger row it produces, so a replay can be
//! recognised and ignored.
//!
//! ## Key Format
//! ```text
//! with order id:     {order_id}_{item_name}_{YYYY-MM-DD}
//! without order id:  {item_name}_{YYYY-MM-DD}
//! ```
//!
//! Without an order id, two genuine sales of the same item on the same day
//! collapse into one key. That weaker guarantee is accepted: connectors that
//! cannot supply an order id are expected to aggregate per item per day.

use chrono::NaiveDate;

/// Derives the reference key for a sale event.
///
/// A blank order id is treated as absent.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use stockline_core::idempotency::reference_key;
///
/// let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
/// assert_eq!(reference_key(Some("ord-981"), "Soda Can", date), "ord-981_Soda Can_2026-03-14");
/// assert_eq!(reference_key(None, "Soda Can", date), "Soda Can_2026-03-14");
/// assert_eq!(reference_key(Some("  "), "Soda Can", date), "Soda Can_2026-03-14");
/// ```
pub fn reference_key(order_id: Option<&str>, item_name: &str, sale_date: NaiveDate) -> String {
    let item_name = item_name.trim();
    let date = sale_date.format("%Y-%m-%d");

    match order_id.map(str::trim).filter(|id| !id.is_empty()) {
        Some(order_id) => format!("{}_{}_{}", order_id, item_name, date),
        None => format!("{}_{}", item_name, date),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    #[test]
    fn test_key_is_deterministic() {
        let a = reference_key(Some("ord-1"), "Margarita", date(14));
        let b = reference_key(Some("ord-1"), "Margarita", date(14));
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_distinguishes_orders_items_and_dates() {
        let base = reference_key(Some("ord-1"), "Margarita", date(14));
        assert_ne!(base, reference_key(Some("ord-2"), "Margarita", date(14)));
        assert_ne!(base, reference_key(Some("ord-1"), "Mojito", date(14)));
        assert_ne!(base, reference_key(Some("ord-1"), "Margarita", date(15)));
    }

    #[test]
    fn test_item_name_is_trimmed() {
        assert_eq!(
            reference_key(None, "  Margarita ", date(14)),
            reference_key(None, "Margarita", date(14))
        );
    }
}
