//! Money arithmetic and display helpers.
//!
//! Pure functions - no database access.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

/// Round to specified decimal places using banker's rounding (ROUND_HALF_EVEN).
///
/// Banker's rounding rounds to the nearest even number when the value is exactly
/// halfway between two possibilities. This reduces cumulative rounding bias.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use tourbook_pricing::pricing::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(2));   // rounds to even
/// assert_eq!(round_money(dec!(3.5), 0), dec!(4));   // rounds to even
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

/// Total for `group_size` units at a flat per-unit price.
///
/// Returns `None` when the product does not fit in a `Decimal`.
pub fn per_unit_total(unit_price: Decimal, group_size: u32) -> Option<Decimal> {
    unit_price
        .checked_mul(Decimal::from(group_size))
        .map(|total| round_money(total, 2))
}

/// Display symbol for a currency code. Unknown codes fall back to the rupee.
pub fn currency_symbol(currency: &str) -> &'static str {
    match currency.to_ascii_uppercase().as_str() {
        "INR" => "₹",
        "USD" => "$",
        "EUR" => "€",
        _ => "₹",
    }
}

/// Amount with its currency symbol, trailing zeros dropped (`₹8000`, `$12.5`).
pub fn format_amount(amount: Decimal, currency: &str) -> String {
    format!("{}{}", currency_symbol(currency), amount.normalize())
}
