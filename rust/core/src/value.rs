// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value decoding - "decode this as T"
//!
//! One operation shared by both encodings: text tokens from log lines and
//! big-endian payloads from unformatted records are turned into typed values.
//!
//! - Floats use [fast-float](https://docs.rs/fast-float), accepting Fortran
//!   `D` exponents (`1.5D-03`)
//! - Integers use [lexical-core](https://docs.rs/lexical-core)
//! - Binary payloads are big-endian arrays; a single element decodes to a scalar

use crate::error::{Error, Result};
use std::borrow::Cow;
use std::fmt;

/// Decoder tag for a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ValueKind {
    Float,
    Int,
    Bool,
    Str,
}

impl ValueKind {
    /// Parse a decoder tag (`float`, `int`, `bool`, `str`)
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "float" | "real" | "f64" => Some(Self::Float),
            "int" | "integer" | "i32" => Some(Self::Int),
            "bool" | "logical" => Some(Self::Bool),
            "str" | "string" | "char" => Some(Self::Str),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Str => "str",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded scalar or array value
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    Float(f64),
    Int(i64),
    Bool(bool),
    Str(String),
    FloatArray(Vec<f64>),
    IntArray(Vec<i64>),
    BoolArray(Vec<bool>),
}

impl Value {
    /// Decode a text token as `kind`
    pub fn from_text(input: &str, kind: ValueKind) -> Result<Self> {
        Ok(match kind {
            ValueKind::Float => Value::Float(f64::from_text(input)?),
            ValueKind::Int => Value::Int(i64::from_text(input)?),
            ValueKind::Bool => Value::Bool(bool::from_text(input)?),
            ValueKind::Str => Value::Str(String::from_text(input)?),
        })
    }

    /// Decode a text token, inferring its kind first
    pub fn infer(input: &str) -> Self {
        let kind = determine_kind(input);
        Self::from_text(input, kind).unwrap_or_else(|_| Value::Str(input.trim().to_string()))
    }

    /// Decode a big-endian record payload as `kind`
    pub fn from_be_payload(bytes: &[u8], kind: ValueKind) -> Result<Self> {
        Ok(match kind {
            ValueKind::Float => {
                let mut values = f64::from_be_payload(bytes)?;
                if values.len() == 1 {
                    Value::Float(values.remove(0))
                } else {
                    Value::FloatArray(values)
                }
            }
            ValueKind::Int => {
                let mut values = i64::from_be_payload(bytes)?;
                if values.len() == 1 {
                    Value::Int(values.remove(0))
                } else {
                    Value::IntArray(values)
                }
            }
            ValueKind::Bool => {
                let mut values = bool::from_be_payload(bytes)?;
                if values.len() == 1 {
                    Value::Bool(values.remove(0))
                } else {
                    Value::BoolArray(values)
                }
            }
            ValueKind::Str => Value::Str(String::from_be_payload(bytes)?.remove(0)),
        })
    }

    /// Kind of the elements held by this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Float(_) | Value::FloatArray(_) => ValueKind::Float,
            Value::Int(_) | Value::IntArray(_) => ValueKind::Int,
            Value::Bool(_) | Value::BoolArray(_) => ValueKind::Bool,
            Value::Str(_) => ValueKind::Str,
        }
    }

    /// Get as float (integers widen)
    #[inline]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get float data as a slice (scalars are a one-element slice)
    pub fn as_float_slice(&self) -> Option<&[f64]> {
        match self {
            Value::Float(f) => Some(std::slice::from_ref(f)),
            Value::FloatArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int_slice(&self) -> Option<&[i64]> {
        match self {
            Value::Int(i) => Some(std::slice::from_ref(i)),
            Value::IntArray(v) => Some(v),
            _ => None,
        }
    }

    /// Number of elements (1 for scalars and strings)
    pub fn len(&self) -> usize {
        match self {
            Value::FloatArray(v) => v.len(),
            Value::IntArray(v) => v.len(),
            Value::BoolArray(v) => v.len(),
            _ => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Types that can be decoded from a text token or a big-endian payload
pub trait Decode: Sized {
    /// Schema tag this type decodes as
    const KIND: ValueKind;

    /// Decode one whitespace-trimmed text token
    fn from_text(input: &str) -> Result<Self>;

    /// Decode every element of a big-endian payload
    fn from_be_payload(bytes: &[u8]) -> Result<Vec<Self>>;
}

/// Split a payload into fixed-width elements, rejecting ragged lengths
fn chunks<const N: usize>(bytes: &[u8], kind: ValueKind) -> Result<impl Iterator<Item = [u8; N]> + '_> {
    if bytes.len() % N != 0 {
        return Err(Error::invalid_value(
            kind,
            format!("{}-byte payload is not a multiple of {}", bytes.len(), N),
        ));
    }
    Ok(bytes.chunks_exact(N).map(|chunk| {
        let mut buf = [0u8; N];
        buf.copy_from_slice(chunk);
        buf
    }))
}

impl Decode for f64 {
    const KIND: ValueKind = ValueKind::Float;

    fn from_text(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
        // Fortran double-precision exponent: 1.0D+02
        let normalized: Cow<str> = if trimmed.bytes().any(|b| b == b'd' || b == b'D') {
            Cow::Owned(trimmed.replace(['d', 'D'], "e"))
        } else {
            Cow::Borrowed(trimmed)
        };
        fast_float::parse::<f64, _>(normalized.as_ref())
            .map_err(|_| Error::invalid_value(ValueKind::Float, input))
    }

    fn from_be_payload(bytes: &[u8]) -> Result<Vec<Self>> {
        Ok(chunks::<8>(bytes, Self::KIND)?.map(f64::from_be_bytes).collect())
    }
}

impl Decode for i64 {
    const KIND: ValueKind = ValueKind::Int;

    fn from_text(input: &str) -> Result<Self> {
        lexical_core::parse::<i64>(input.trim().as_bytes())
            .map_err(|_| Error::invalid_value(ValueKind::Int, input))
    }

    /// Integers on disk are 32-bit; widened on decode
    fn from_be_payload(bytes: &[u8]) -> Result<Vec<Self>> {
        Ok(chunks::<4>(bytes, Self::KIND)?
            .map(|b| i32::from_be_bytes(b) as i64)
            .collect())
    }
}

impl Decode for i32 {
    const KIND: ValueKind = ValueKind::Int;

    fn from_text(input: &str) -> Result<Self> {
        lexical_core::parse::<i32>(input.trim().as_bytes())
            .map_err(|_| Error::invalid_value(ValueKind::Int, input))
    }

    fn from_be_payload(bytes: &[u8]) -> Result<Vec<Self>> {
        Ok(chunks::<4>(bytes, Self::KIND)?.map(i32::from_be_bytes).collect())
    }
}

impl Decode for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn from_text(input: &str) -> Result<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "t" | "true" | ".true." | "yes" | "on" | "1" => Ok(true),
            "f" | "false" | ".false." | "no" | "off" | "0" => Ok(false),
            _ => Err(Error::invalid_value(ValueKind::Bool, input)),
        }
    }

    /// Fortran logicals: any non-zero 32-bit word is true
    fn from_be_payload(bytes: &[u8]) -> Result<Vec<Self>> {
        Ok(chunks::<4>(bytes, Self::KIND)?
            .map(|b| i32::from_be_bytes(b) != 0)
            .collect())
    }
}

impl Decode for String {
    const KIND: ValueKind = ValueKind::Str;

    fn from_text(input: &str) -> Result<Self> {
        Ok(input.trim().to_string())
    }

    /// The whole payload is one string
    fn from_be_payload(bytes: &[u8]) -> Result<Vec<Self>> {
        let text = std::str::from_utf8(bytes).map_err(|_| {
            Error::invalid_value(ValueKind::Str, String::from_utf8_lossy(bytes).into_owned())
        })?;
        Ok(vec![text.trim().to_string()])
    }
}

/// Decode a text token as `T`
#[inline]
pub fn parse_as<T: Decode>(input: &str) -> Result<T> {
    T::from_text(input)
}

/// Decode every whitespace-separated token on a line as `T`
pub fn parse_all<T: Decode>(line: &str) -> Result<Vec<T>> {
    line.split_whitespace().map(T::from_text).collect()
}

/// Infer the most specific kind a text token decodes as.
/// Order: bool (`T`/`F`/`true`/`false`), int, float, str.
pub fn determine_kind(input: &str) -> ValueKind {
    let trimmed = input.trim();
    let lower = trimmed.to_ascii_lowercase();
    if matches!(
        lower.as_str(),
        "t" | "f" | "true" | "false" | ".true." | ".false."
    ) {
        ValueKind::Bool
    } else if i64::from_text(trimmed).is_ok() {
        ValueKind::Int
    } else if f64::from_text(trimmed).is_ok() && !is_special_float_word(&lower) {
        ValueKind::Float
    } else {
        ValueKind::Str
    }
}

/// `inf`/`nan` spelled as words are labels in logs, not numbers
#[inline]
fn is_special_float_word(lower: &str) -> bool {
    let unsigned = lower.trim_start_matches(['+', '-']);
    unsigned.starts_with("inf") || unsigned.starts_with("nan")
}

/// Normalise a free-text label into a map key: lowercase, runs of
/// non-alphanumerics collapsed to `_`, no leading/trailing `_`.
pub fn normalise_key(label: &str) -> String {
    let mut key = String::with_capacity(label.len());
    let mut pending_sep = false;
    for ch in label.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !key.is_empty() {
                key.push('_');
            }
            pending_sep = false;
            key.extend(ch.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_floats() {
        assert_eq!(parse_as::<f64>("3.25").unwrap(), 3.25);
        assert_eq!(parse_as::<f64>("  -1.5E-10 ").unwrap(), -1.5e-10);
        assert_eq!(parse_as::<f64>("1.0D+02").unwrap(), 100.0);
        assert_eq!(parse_as::<f64>("+2.").unwrap(), 2.0);
        assert!(parse_as::<f64>("*****").is_err());
    }

    #[test]
    fn test_text_ints_and_bools() {
        assert_eq!(parse_as::<i64>("42").unwrap(), 42);
        assert_eq!(parse_as::<i64>("-7").unwrap(), -7);
        assert!(parse_as::<i64>("4.2").is_err());
        assert!(parse_as::<bool>("T").unwrap());
        assert!(!parse_as::<bool>(".FALSE.").unwrap());
        assert!(parse_as::<bool>("maybe").is_err());
    }

    #[test]
    fn test_parse_all() {
        let row: Vec<f64> = parse_all("  1.0  2.5   -3.0 ").unwrap();
        assert_eq!(row, vec![1.0, 2.5, -3.0]);
        assert!(parse_all::<i64>("1 2 x").is_err());
    }

    #[test]
    fn test_determine_kind() {
        assert_eq!(determine_kind("T"), ValueKind::Bool);
        assert_eq!(determine_kind("12"), ValueKind::Int);
        assert_eq!(determine_kind("1.2e3"), ValueKind::Float);
        assert_eq!(determine_kind("0.5D0"), ValueKind::Float);
        assert_eq!(determine_kind("Inf"), ValueKind::Str);
        assert_eq!(determine_kind("Si"), ValueKind::Str);
        assert_eq!(Value::infer(" 8 "), Value::Int(8));
    }

    #[test]
    fn test_binary_float_payload() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1.5f64.to_be_bytes());
        assert_eq!(
            Value::from_be_payload(&bytes, ValueKind::Float).unwrap(),
            Value::Float(1.5)
        );

        bytes.extend_from_slice(&(-2.0f64).to_be_bytes());
        assert_eq!(
            Value::from_be_payload(&bytes, ValueKind::Float).unwrap(),
            Value::FloatArray(vec![1.5, -2.0])
        );

        assert!(Value::from_be_payload(&bytes[..5], ValueKind::Float).is_err());
    }

    #[test]
    fn test_binary_int_bool_str_payloads() {
        let bytes: Vec<u8> = [3i32, -1].iter().flat_map(|v| v.to_be_bytes()).collect();
        assert_eq!(
            Value::from_be_payload(&bytes, ValueKind::Int).unwrap(),
            Value::IntArray(vec![3, -1])
        );
        assert_eq!(
            Value::from_be_payload(&bytes[..4], ValueKind::Bool).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            Value::from_be_payload(&0i32.to_be_bytes(), ValueKind::Bool).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            Value::from_be_payload(b"  Silicon   ", ValueKind::Str).unwrap(),
            Value::Str("Silicon".to_string())
        );
        assert!(Value::from_be_payload(&[0xff, 0xfe], ValueKind::Str).is_err());
    }

    #[test]
    fn test_empty_payload_is_empty_array() {
        let value = Value::from_be_payload(&[], ValueKind::Float).unwrap();
        assert_eq!(value, Value::FloatArray(Vec::new()));
        assert!(value.is_empty());
    }

    #[test]
    fn test_normalise_key() {
        assert_eq!(normalise_key("Total Energy (eV)"), "total_energy_ev");
        assert_eq!(normalise_key("  --cut-off--  "), "cut_off");
        assert_eq!(normalise_key("CELL"), "cell");
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(ValueKind::from_tag("Float"), Some(ValueKind::Float));
        assert_eq!(ValueKind::from_tag("logical"), Some(ValueKind::Bool));
        assert_eq!(ValueKind::from_tag("complex"), None);
        assert_eq!(ValueKind::Int.to_string(), "int");
    }
}
