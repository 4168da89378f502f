// gramian_core/src/utils/serde_helpers.rs

//! Field adapters for measures that may be infinite (singular Gramians) or NaN.
//!
//! Finite values stay plain numbers; `inf`, `-inf` and `nan` are written as strings so
//! that formats without non-finite numbers (JSON) keep them.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum Repr {
    Number(f64),
    Text(String),
}

impl Repr {
    fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            Repr::Number(value)
        } else if value.is_nan() {
            Repr::Text("nan".to_string())
        } else if value > 0.0 {
            Repr::Text("inf".to_string())
        } else {
            Repr::Text("-inf".to_string())
        }
    }

    fn into_f64(self) -> Result<f64, String> {
        match self {
            Repr::Number(v) => Ok(v),
            Repr::Text(text) => match text.to_ascii_lowercase().as_str() {
                "inf" | "+inf" | "infinity" => Ok(f64::INFINITY),
                "-inf" | "-infinity" => Ok(f64::NEG_INFINITY),
                "nan" => Ok(f64::NAN),
                _ => Err(format!("expected a number, \"inf\", \"-inf\" or \"nan\", got {text:?}")),
            },
        }
    }
}

pub mod non_finite_f64 {
    use super::Repr;
    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Repr::from_f64(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Repr::deserialize(deserializer)?.into_f64().map_err(D::Error::custom)
    }
}

pub mod non_finite_option {
    use super::Repr;
    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.map(Repr::from_f64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<Repr>::deserialize(deserializer)?
            .map(Repr::into_f64)
            .transpose()
            .map_err(D::Error::custom)
    }
}

pub mod non_finite_vec {
    use super::Repr;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(values.iter().map(|&v| Repr::from_f64(v)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec::<Repr>::deserialize(deserializer)?
            .into_iter()
            .map(|r| r.into_f64().map_err(D::Error::custom))
            .collect()
    }
}
