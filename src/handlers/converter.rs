use super::format_float;
use crate::error::UserFacing;
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("expected a value ending in C or F, got {0:?}")]
    UnknownUnit(String),
    #[error("could not parse {literal:?} as a number")]
    BadNumber {
        literal: String,
        #[source]
        source: std::num::ParseFloatError,
    },
}

impl UserFacing for ConvertError {
    fn user_message(&self) -> String {
        match self {
            ConvertError::UnknownUnit(_) => "Invalid format".to_string(),
            ConvertError::BadNumber { .. } => "Conversion error".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Temperature {
    Celsius(f64),
    Fahrenheit(f64),
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Temperature::Celsius(v) => write!(f, "{}°C", format_float(*v)),
            Temperature::Fahrenheit(v) => write!(f, "{}°F", format_float(*v)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
    pub from: Temperature,
    pub to: Temperature,
}

impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.from, self.to)
    }
}

pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

pub fn fahrenheit_to_celsius(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0
}

/// Convert `25C` or `77F` (case-insensitive) to the other scale.
pub fn convert(input: &str) -> Result<Conversion, ConvertError> {
    let value = input.trim().to_uppercase();

    if let Some(literal) = value.strip_suffix('C') {
        let c = parse_number(literal)?;
        Ok(Conversion {
            from: Temperature::Celsius(c),
            to: Temperature::Fahrenheit(celsius_to_fahrenheit(c)),
        })
    } else if let Some(literal) = value.strip_suffix('F') {
        let f = parse_number(literal)?;
        Ok(Conversion {
            from: Temperature::Fahrenheit(f),
            to: Temperature::Celsius(fahrenheit_to_celsius(f)),
        })
    } else {
        Err(ConvertError::UnknownUnit(input.to_string()))
    }
}

fn parse_number(literal: &str) -> Result<f64, ConvertError> {
    literal
        .trim()
        .parse::<f64>()
        .map_err(|source| ConvertError::BadNumber {
            literal: literal.to_string(),
            source,
        })
}
