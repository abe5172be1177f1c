// clinic_shop/src/pricing.rs

//! Order pricing. Pure: the same lines and policy always give the same totals.
//!
//! Amounts are integer cents, so currency rounding only happens once, when tax
//! is derived from the subtotal.

use serde::Serialize;

/// 7% sales tax.
pub const TAX_RATE_BASIS_POINTS: i64 = 700;
/// $5.99 flat shipping.
pub const FLAT_SHIPPING_CENTS: i64 = 599;
/// Orders strictly above $50.00 ship free.
pub const FREE_SHIPPING_THRESHOLD_CENTS: i64 = 5_000;

const BASIS_POINTS_PER_UNIT: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
  pub tax_rate_basis_points: i64,
  pub flat_shipping_cents: i64,
  pub free_shipping_threshold_cents: i64,
}

impl Default for PricingPolicy {
  fn default() -> Self {
    Self {
      tax_rate_basis_points: TAX_RATE_BASIS_POINTS,
      flat_shipping_cents: FLAT_SHIPPING_CENTS,
      free_shipping_threshold_cents: FREE_SHIPPING_THRESHOLD_CENTS,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
  pub subtotal_cents: i64,
  pub tax_cents: i64,
  pub shipping_cents: i64,
  pub total_cents: i64,
}

impl PricingPolicy {
  /// Prices `(unit_price_cents, quantity)` pairs.
  pub fn price<I>(&self, lines: I) -> PriceBreakdown
  where
    I: IntoIterator<Item = (i64, i32)>,
  {
    let subtotal_cents = lines
      .into_iter()
      .map(|(unit_price_cents, quantity)| unit_price_cents.saturating_mul(i64::from(quantity)))
      .fold(0_i64, i64::saturating_add);

    let shipping_cents = if subtotal_cents > self.free_shipping_threshold_cents {
      0
    } else {
      self.flat_shipping_cents
    };
    let tax_cents = self.tax_on(subtotal_cents);

    PriceBreakdown {
      subtotal_cents,
      tax_cents,
      shipping_cents,
      total_cents: subtotal_cents.saturating_add(tax_cents).saturating_add(shipping_cents),
    }
  }

  /// Tax rounded half-up to the cent.
  fn tax_on(&self, subtotal_cents: i64) -> i64 {
    let scaled = subtotal_cents.saturating_mul(self.tax_rate_basis_points);
    scaled.saturating_add(BASIS_POINTS_PER_UNIT / 2) / BASIS_POINTS_PER_UNIT
  }
}
