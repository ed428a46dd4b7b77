//! Pure scoring kernels
//!
//! Stateless building blocks for the disambiguation engine: textual
//! similarity blending, tolerant date comparison, and unit-aware quantity
//! standardization. The stateful orchestration lives in `engine`.

mod dates;
mod similarity;
mod units;

pub use dates::{dates_equal, normalize_dashes, parse_date, period_matches, years_equal, ParsedDate};
pub use similarity::{blended_similarity, magnitude_similarity, parse_float};
pub use units::{BaseQuantity, UnitRegistry, CURRENCY_BASE};
