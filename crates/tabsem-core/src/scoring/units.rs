//! Unit registry and quantity standardization
//!
//! Quantity cells ("5 km", "$3.50", "12,000 m²") and KB quantity edges
//! (value + unit-entity symbol) are both reduced to base-unit magnitudes
//! before comparison. The registry is instance-local (owned by the engine),
//! linear-factor based, and defines currencies explicitly since no unit
//! system carries them: dollar is the base, the other currencies use fixed
//! reference rates.

use std::collections::{BTreeMap, HashMap};

use regex::Regex;

use super::similarity::parse_float;

/// A magnitude expressed in its base unit.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseQuantity {
    pub unit: String,
    pub magnitude: f64,
}

/// Base unit of the currency dimension; comparisons in it get the looser
/// matching threshold.
pub const CURRENCY_BASE: &str = "dollar";

/// Two magnitudes within this ratio band count as the same measurement
/// (a cell often repeats one quantity in two units).
const DUPLICATE_RATIO: f64 = 0.98;

#[derive(Debug, Clone)]
struct UnitDef {
    base: String,
    factor: f64,
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Alias → base-unit conversion table.
pub struct UnitRegistry {
    aliases: HashMap<String, UnitDef>,
    quantity_pattern: Regex,
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl UnitRegistry {
    /// Empty registry; callers add their own definitions.
    pub fn new() -> Self {
        Self {
            aliases: HashMap::new(),
            // currency-symbol prefix form, then number-unit form
            quantity_pattern: Regex::new(
                r"(?x)
                (?P<cur>[$\u{20AC}\u{00A3}\u{00A5}])\s*(?P<val_cur>\d[\d,]*(?:\.\d+)?)
                | (?P<val>\d[\d,]*(?:\.\d+)?)\s*(?P<unit>[A-Za-z\u{00B0}\u{00B5}%][\w/\u{00B2}\u{00B3}%]*)?
                ",
            )
            .expect("quantity pattern is valid"),
        }
    }

    /// Registry pre-loaded with the common dimensions (length, mass, time,
    /// speed, area, volume, data, energy, power, pressure, frequency,
    /// temperature, percent) and the supported currencies.
    pub fn with_defaults() -> Self {
        let mut reg = Self::new();

        reg.define_all(&["m", "metre", "meter"], "metre", 1.0);
        reg.define_all(&["km", "kilometre", "kilometer"], "metre", 1000.0);
        reg.define_all(&["cm", "centimetre", "centimeter"], "metre", 0.01);
        reg.define_all(&["mm", "millimetre", "millimeter"], "metre", 0.001);
        reg.define_all(&["mi", "mile"], "metre", 1609.344);
        reg.define_all(&["ft", "foot", "feet"], "metre", 0.3048);
        reg.define_all(&["in", "inch"], "metre", 0.0254);
        reg.define_all(&["yd", "yard"], "metre", 0.9144);
        reg.define_all(&["nmi", "nautical mile"], "metre", 1852.0);

        reg.define_all(&["kg", "kilogram"], "kilogram", 1.0);
        reg.define_all(&["g", "gram"], "kilogram", 0.001);
        reg.define_all(&["mg", "milligram"], "kilogram", 1e-6);
        reg.define_all(&["t", "tonne", "ton", "metric ton"], "kilogram", 1000.0);
        reg.define_all(&["lb", "pound"], "kilogram", 0.453_592_37);
        reg.define_all(&["oz", "ounce"], "kilogram", 0.028_349_523_125);

        reg.define_all(&["s", "sec", "second"], "second", 1.0);
        reg.define_all(&["min", "minute"], "second", 60.0);
        reg.define_all(&["h", "hr", "hour"], "second", 3600.0);
        reg.define_all(&["day"], "second", 86_400.0);
        reg.define_all(&["week"], "second", 604_800.0);
        reg.define_all(&["yr", "year"], "second", 31_557_600.0);

        reg.define_all(&["m/s", "metre per second"], "metre_per_second", 1.0);
        reg.define_all(&["km/h", "kph", "kilometre per hour"], "metre_per_second", 1.0 / 3.6);
        reg.define_all(&["mph", "mile per hour"], "metre_per_second", 0.447_04);
        reg.define_all(&["kn", "knot"], "metre_per_second", 0.514_444);

        reg.define_all(&["m\u{00B2}", "m2", "square metre", "square meter"], "square_metre", 1.0);
        reg.define_all(&["km\u{00B2}", "km2", "square kilometre"], "square_metre", 1e6);
        reg.define_all(&["ha", "hectare"], "square_metre", 1e4);
        reg.define_all(&["acre"], "square_metre", 4046.856_422_4);

        reg.define_all(&["m\u{00B3}", "m3", "cubic metre"], "cubic_metre", 1.0);
        reg.define_all(&["l", "litre", "liter"], "cubic_metre", 0.001);
        reg.define_all(&["ml", "millilitre"], "cubic_metre", 1e-6);
        reg.define_all(&["gal", "gallon"], "cubic_metre", 0.003_785_411_784);

        reg.define_all(&["b", "byte"], "byte", 1.0);
        reg.define_all(&["kb", "kilobyte"], "byte", 1e3);
        reg.define_all(&["mb", "megabyte"], "byte", 1e6);
        reg.define_all(&["gb", "gigabyte"], "byte", 1e9);
        reg.define_all(&["tb", "terabyte"], "byte", 1e12);
        reg.define_all(&["bit"], "byte", 0.125);

        reg.define_all(&["j", "joule"], "joule", 1.0);
        reg.define_all(&["kj", "kilojoule"], "joule", 1e3);
        reg.define_all(&["kwh", "kilowatt hour"], "joule", 3.6e6);
        reg.define_all(&["cal", "calorie"], "joule", 4.184);
        reg.define_all(&["kcal", "kilocalorie"], "joule", 4184.0);

        reg.define_all(&["w", "watt"], "watt", 1.0);
        reg.define_all(&["kw", "kilowatt"], "watt", 1e3);
        reg.define_all(&["mw", "megawatt"], "watt", 1e6);
        reg.define_all(&["hp", "horsepower"], "watt", 745.7);

        reg.define_all(&["pa", "pascal"], "pascal", 1.0);
        reg.define_all(&["kpa", "kilopascal"], "pascal", 1e3);
        reg.define_all(&["bar"], "pascal", 1e5);
        reg.define_all(&["atm", "atmosphere"], "pascal", 101_325.0);
        reg.define_all(&["psi"], "pascal", 6894.757);

        reg.define_all(&["hz", "hertz"], "hertz", 1.0);
        reg.define_all(&["khz", "kilohertz"], "hertz", 1e3);
        reg.define_all(&["mhz", "megahertz"], "hertz", 1e6);
        reg.define_all(&["ghz", "gigahertz"], "hertz", 1e9);

        reg.define_all(&["k", "kelvin"], "kelvin", 1.0);

        reg.define_all(&["%", "percent"], "ratio", 0.01);

        // currencies: dollar is the base of the dimension
        reg.define_all(&["$", "dollar", "usd", "united states dollar"], CURRENCY_BASE, 1.0);
        reg.define_all(&["\u{20AC}", "euro"], CURRENCY_BASE, 1.1);
        reg.define_all(&["\u{00A5}", "yen", "japanese yen"], CURRENCY_BASE, 0.0082);
        reg.define_all(&["chinese yuan", "yuan", "renminbi"], CURRENCY_BASE, 0.16);
        reg.define_all(&["\u{00A3}", "pound sterling"], CURRENCY_BASE, 1.32);
        reg.define_all(&["south korean won", "won"], CURRENCY_BASE, 0.000_82);
        reg.define_all(&["russian ruble", "ruble"], CURRENCY_BASE, 0.01);
        reg.define_all(&["australian dollar"], CURRENCY_BASE, 0.75);

        reg
    }

    /// Register one alias.
    pub fn define(&mut self, alias: &str, base: &str, factor: f64) {
        self.aliases.insert(
            Self::canonical(alias),
            UnitDef {
                base: base.to_string(),
                factor,
            },
        );
    }

    fn define_all(&mut self, aliases: &[&str], base: &str, factor: f64) {
        for alias in aliases {
            self.define(alias, base, factor);
        }
    }

    fn canonical(alias: &str) -> String {
        alias.trim().to_lowercase().replace('_', " ")
    }

    fn resolve(&self, unit: &str) -> Option<&UnitDef> {
        let canonical = Self::canonical(unit);
        if let Some(def) = self.aliases.get(&canonical) {
            return Some(def);
        }
        // plural form
        canonical
            .strip_suffix('s')
            .and_then(|singular| self.aliases.get(singular))
    }

    /// Convert one (value, unit) pair to its base unit.
    pub fn to_base(&self, value: f64, unit: &str) -> Option<BaseQuantity> {
        let def = self.resolve(unit)?;
        Some(BaseQuantity {
            unit: def.base.clone(),
            magnitude: value * def.factor,
        })
    }

    /// Standardize a KB-side measurement: a raw value string plus the unit
    /// symbol resolved from the unit entity.
    pub fn standardize_value(&self, value: &str, unit: &str) -> Option<BaseQuantity> {
        let parsed = parse_float(value)?;
        self.to_base(parsed, unit)
    }

    /// Extract every unit-bearing quantity from free text and fold them into
    /// base-unit magnitudes, suppressing near-duplicate magnitudes of the
    /// same dimension (a cell quoting one measurement in two units).
    pub fn standardize_text(&self, text: &str) -> BTreeMap<String, Vec<f64>> {
        let mut standardized: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for capture in self.quantity_pattern.captures_iter(text) {
            let converted = if let Some(symbol) = capture.name("cur") {
                let value = capture.name("val_cur").and_then(|v| parse_float(v.as_str()));
                value.and_then(|v| self.to_base(v, symbol.as_str()))
            } else {
                let value = capture.name("val").and_then(|v| parse_float(v.as_str()));
                let unit = capture.name("unit");
                match (value, unit) {
                    (Some(v), Some(u)) => self.to_base(v, u.as_str()),
                    _ => None,
                }
            };
            let Some(quantity) = converted else { continue };

            let magnitudes = standardized.entry(quantity.unit).or_default();
            let duplicate = magnitudes.iter().any(|&existing| {
                let ratio = if quantity.magnitude != 0.0 {
                    existing / quantity.magnitude
                } else if existing == 0.0 {
                    1.0
                } else {
                    0.0
                };
                ratio > DUPLICATE_RATIO && ratio < 1.0 / DUPLICATE_RATIO
            });
            if !duplicate {
                magnitudes.push(quantity.magnitude);
            }
        }
        standardized
    }
}

// ============================================================================
// TESTS
// ============================================================================
