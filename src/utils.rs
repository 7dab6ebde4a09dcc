//! Common small functions used throughout the crate
//!
//! These are left public for the convenience of the user, for example the
//! consistent scientific formatting used by the command line summaries.

use std::fmt::LowerExp;

// Alias for the format! macro out of laziness
pub use std::format as f;

/// Extends primitives with more specific formatting options
pub trait NumberFmt {
    /// Better scientific number formatting
    ///
    /// The default is not very consistent for scientific in particular, so this
    /// allows easy definition.
    ///
    /// Works for anything that can be represented as scientific using the
    /// LowerExp trait.
    ///
    /// ```rust
    /// # use serafin::utils::NumberFmt;
    /// assert_eq!((-1.0_f64).sci(5, 2), "-1.00000e+00".to_string());
    /// assert_eq!(1234.0_f64.sci(3, 2), "1.234e+03".to_string());
    /// assert_eq!(0.00125_f64.sci(2, 3), "1.25e-003".to_string());
    /// ```
    fn sci(&self, precision: usize, exp_pad: usize) -> String;
}

impl<T: LowerExp> NumberFmt for T {
    fn sci(&self, precision: usize, exp_pad: usize) -> String {
        let mut num = f!("{:.precision$e}", &self, precision = precision);
        let exp = match num.find('e') {
            Some(i) => num.split_off(i),
            None => return num,
        };
        // Make sure the exponent is signed
        let (sign, exp) = match exp.strip_prefix("e-") {
            Some(exp) => ('-', exp),
            None => ('+', &exp[1..]),
        };
        // Pad the exponent with zeros if needed and put it back on the number
        num.push_str(&f!("e{}{:0>pad$}", sign, exp, pad = exp_pad));
        num
    }
}

/// Smallest and largest finite values of a slice
///
/// Returns `None` for an empty slice or one without any finite value.
///
/// ```rust
/// # use serafin::utils::value_range;
/// assert_eq!(value_range(&[3.0, -1.0, f64::NAN, 2.0]), Some((-1.0, 3.0)));
/// assert_eq!(value_range(&[]), None);
/// ```
pub fn value_range(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |range, v| match range {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
