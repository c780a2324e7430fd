//! Primitive value synthesis.
//!
//! Stateless helpers producing one random value per call for the supported
//! column types. The random source is always passed in, so callers control
//! seeding.

use crate::error::SynthError;
use crate::schema::{ColumnDef, DataType};
use crate::value::Value;
use chrono::{Days, NaiveDate};
use rand::Rng;

/// Bound for synthesized integers: signed values fall in `[-INT_BOUND, INT_BOUND]`
pub const INT_BOUND: i64 = 10_000;

/// Length used for column types without a known generator
pub const FALLBACK_TEXT_LENGTH: u32 = 10;

/// Probability that a value of a NULL-able column survives null injection
pub const DEFAULT_KEEP_PROBABILITY: f64 = 0.8;

const TEXT_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz ";

/// Days from 1970-01-01 to 2037-12-31 inclusive
const DATE_SPAN_DAYS: u64 = 24_836;

/// Random integer in `[-INT_BOUND, INT_BOUND]`, or `[0, INT_BOUND]` when unsigned
pub fn random_int<R: Rng + ?Sized>(rng: &mut R, unsigned: bool) -> i64 {
    if unsigned {
        rng.random_range(0..=INT_BOUND)
    } else {
        rng.random_range(-INT_BOUND..=INT_BOUND)
    }
}

/// Random lowercase text with spaces, length in `1..=max_len`
pub fn random_varchar<R: Rng + ?Sized>(rng: &mut R, max_len: u32) -> Result<String, SynthError> {
    if max_len == 0 {
        return Err(SynthError::ZeroLength);
    }
    let len = rng.random_range(1..=max_len);
    Ok((0..len)
        .map(|_| TEXT_ALPHABET[rng.random_range(0..TEXT_ALPHABET.len())] as char)
        .collect())
}

/// Random decimal literal with `total` digits, `fraction` of them after the point
pub fn random_decimal<R: Rng + ?Sized>(
    rng: &mut R,
    total: u32,
    fraction: u32,
    unsigned: bool,
) -> Result<String, SynthError> {
    if total < fraction {
        return Err(SynthError::DecimalPrecision { total, fraction });
    }

    // Digit-wise draws keep the integer part uniform for any precision
    let int_digits: String = (0..total - fraction)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect();
    let int_part = match int_digits.trim_start_matches('0') {
        "" => "0",
        digits => digits,
    };
    let negative = !unsigned && int_part != "0" && rng.random_bool(0.5);

    let mut out = String::with_capacity(total as usize + 2);
    if negative {
        out.push('-');
    }
    out.push_str(int_part);
    if fraction > 0 {
        out.push('.');
        out.extend((0..fraction).map(|_| char::from(b'0' + rng.random_range(0..10u8))));
    }
    Ok(out)
}

/// Random date between 1970-01-01 and 2037-12-31
pub fn random_date<R: Rng + ?Sized>(rng: &mut R) -> NaiveDate {
    let epoch = NaiveDate::default();
    let offset = rng.random_range(0..=DATE_SPAN_DAYS);
    epoch.checked_add_days(Days::new(offset)).unwrap_or(epoch)
}

/// Check that a column's type arguments fit its datatype
pub fn validate_args(datatype: &DataType, args: &[u32]) -> Result<(), SynthError> {
    let expected = match datatype {
        DataType::Varchar => 1,
        DataType::Decimal => 2,
        DataType::Int | DataType::Date | DataType::Other(_) => return Ok(()),
    };
    if args.len() != expected {
        return Err(SynthError::Arity {
            datatype: datatype.to_string(),
            expected,
            found: args.len(),
        });
    }
    match datatype {
        DataType::Varchar if args[0] == 0 => Err(SynthError::ZeroLength),
        DataType::Decimal if args[0] < args[1] => Err(SynthError::DecimalPrecision {
            total: args[0],
            fraction: args[1],
        }),
        _ => Ok(()),
    }
}

/// One random value for a column's datatype, arguments and signedness
pub fn random_value<R: Rng + ?Sized>(rng: &mut R, column: &ColumnDef) -> Result<Value, SynthError> {
    validate_args(&column.datatype, &column.type_args)?;
    let unsigned = column.is_unsigned();
    let value = match column.datatype {
        DataType::Int => Value::Int(random_int(rng, unsigned)),
        DataType::Varchar => Value::Text(random_varchar(rng, column.type_args[0])?),
        DataType::Decimal => Value::Decimal(random_decimal(
            rng,
            column.type_args[0],
            column.type_args[1],
            unsigned,
        )?),
        DataType::Date => Value::Date(random_date(rng)),
        DataType::Other(_) => Value::Text(random_varchar(rng, FALLBACK_TEXT_LENGTH)?),
    };
    Ok(value)
}

/// `len` random values for a column
pub fn random_list<R: Rng + ?Sized>(
    rng: &mut R,
    column: &ColumnDef,
    len: usize,
) -> Result<Vec<Value>, SynthError> {
    validate_args(&column.datatype, &column.type_args)?;
    (0..len).map(|_| random_value(rng, column)).collect()
}

/// Keep `value` with probability `keep_probability`, otherwise blank it
pub fn gen_null<R: Rng + ?Sized>(rng: &mut R, value: Value, keep_probability: f64) -> Value {
    let p = if keep_probability.is_nan() {
        1.0
    } else {
        keep_probability.clamp(0.0, 1.0)
    };
    if rng.random_bool(p) {
        value
    } else {
        Value::Blank
    }
}
