use std::fmt;
use std::num::NonZeroU64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Billing currencies known to this crate.
pub enum Currency {
    Sek,
    Eur,
    Usd,
}

impl Currency {
    /// Map a three-letter ISO 4217 code to a known currency.
    ///
    /// Returns `None` for any code this crate does not know; callers must not fall back to a
    /// default currency.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "SEK" => Some(Self::Sek),
            "EUR" => Some(Self::Eur),
            "USD" => Some(Self::Usd),
            _ => None,
        }
    }

    /// ISO 4217 code.
    pub fn code(self) -> &'static str {
        match self {
            Self::Sek => "SEK",
            Self::Eur => "EUR",
            Self::Usd => "USD",
        }
    }

    /// Number of fraction digits used when displaying amounts.
    pub fn fraction_digits(self) -> u32 {
        match self {
            Self::Sek | Self::Eur | Self::Usd => 2,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Non-negative monetary amount.
///
/// The magnitude is kept exactly as `minor_units / factor`, where `factor` is specific to the
/// gateway that reported the cost (e.g. ten-thousandths for 46elks).
pub struct Amount {
    currency: Currency,
    minor_units: u64,
    factor: NonZeroU64,
}

impl Amount {
    /// Build an amount from an integer count of scaled minor units.
    pub fn from_minor_units(currency: Currency, minor_units: u64, factor: NonZeroU64) -> Self {
        Self {
            currency,
            minor_units,
            factor,
        }
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn minor_units(&self) -> u64 {
        self.minor_units
    }

    pub fn factor(&self) -> NonZeroU64 {
        self.factor
    }

    /// Decimal magnitude. Lossy for very large values; use [`Amount`]'s `Display` for output.
    pub fn value(&self) -> f64 {
        self.minor_units as f64 / self.factor.get() as f64
    }

    /// Magnitude rounded half-to-even to the currency's fraction digits, in display units.
    fn rounded_display_units(&self) -> u128 {
        let scale = 10u128.pow(self.currency.fraction_digits());
        let factor = u128::from(self.factor.get());
        let scaled = u128::from(self.minor_units) * scale;

        let quotient = scaled / factor;
        let remainder = scaled % factor;
        let twice = remainder * 2;

        if twice > factor || (twice == factor && quotient % 2 == 1) {
            quotient + 1
        } else {
            quotient
        }
    }
}

impl fmt::Display for Amount {
    /// Formats as `"<ISO code> <magnitude>"` using US-English grouping, e.g. `USD 1,234.50`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.currency.fraction_digits();
        let scale = 10u128.pow(digits);
        let units = self.rounded_display_units();

        let integer = group_thousands(units / scale);
        if digits == 0 {
            return write!(f, "{} {integer}", self.currency.code());
        }

        let fraction = units % scale;
        write!(
            f,
            "{} {integer}.{fraction:0width$}",
            self.currency.code(),
            width = digits as usize
        )
    }
}

fn group_thousands(value: u128) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
