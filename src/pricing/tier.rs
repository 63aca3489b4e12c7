//! Group-size tiers and their stored representation.
//!
//! A tier maps an inclusive group-size range to one price. Stored records
//! carry tiers either as a JSON array or as a JSON-encoded string of that
//! array; [`TierSource`] folds both into one decode step so nothing past the
//! boundary has to care which form arrived.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::schedule::PriceSchedule;

/// Largest group size any entity may declare.
pub const MAX_CAPACITY: u32 = 20;

/// Price for a group whose size falls in `[min_size, max_size]`.
///
/// `price` is `None` while the tier is being authored and nobody has typed a
/// price yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TierRecord")]
pub struct Tier {
    #[serde(rename = "minPeople")]
    pub min_size: u32,
    #[serde(rename = "maxPeople")]
    pub max_size: u32,
    #[serde(serialize_with = "serialize_price")]
    pub price: Option<Decimal>,
}

impl Tier {
    pub fn new(min_size: u32, max_size: u32, price: Option<Decimal>) -> Self {
        Self {
            min_size,
            max_size,
            price,
        }
    }

    /// Tier with a price set.
    pub fn priced(min_size: u32, max_size: u32, price: Decimal) -> Self {
        Self::new(min_size, max_size, Some(price))
    }

    /// Tier with no price yet.
    pub fn unpriced(min_size: u32, max_size: u32) -> Self {
        Self::new(min_size, max_size, None)
    }

    pub fn contains(&self, group_size: u32) -> bool {
        self.min_size <= group_size && group_size <= self.max_size
    }

    /// The price, if it is usable for charging (set and strictly positive).
    pub fn usable_price(&self) -> Option<Decimal> {
        self.price.filter(|p| *p > Decimal::ZERO)
    }
}

/// Wire shape of a tier: `{ minPeople, maxPeople, price: string|number }`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TierRecord {
    min_people: u32,
    max_people: u32,
    #[serde(default)]
    price: Value,
}

impl TryFrom<TierRecord> for Tier {
    type Error = String;

    fn try_from(record: TierRecord) -> Result<Self, Self::Error> {
        let price = amount_from_value(&record.price)?;
        Ok(Tier::new(record.min_people, record.max_people, price))
    }
}

/// Prices go back out as strings; an unset price is the empty string.
fn serialize_price<S: Serializer>(price: &Option<Decimal>, serializer: S) -> Result<S::Ok, S::Error> {
    match price {
        Some(amount) => serializer.serialize_str(&amount.to_string()),
        None => serializer.serialize_str(""),
    }
}

/// Read an amount that may arrive as a number, a numeric string, an empty
/// string or null. Empty and null mean "not set".
pub(crate) fn amount_from_value(value: &Value) -> Result<Option<Decimal>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<Decimal>()
                .map(Some)
                .map_err(|_| format!("price {:?} is not a number", s))
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Some(Decimal::from(i)))
            } else if let Some(f) = n.as_f64() {
                Decimal::try_from(f)
                    .map(Some)
                    .map_err(|_| format!("price {} is out of range", n))
            } else {
                Err(format!("price {} is out of range", n))
            }
        }
        other => Err(format!("price must be a string or number, got {}", other)),
    }
}

/// Lenient serde adapter for optional amounts on stored records.
///
/// Old records hold blanks and junk in amount columns; those read as unset
/// instead of failing the whole record.
pub(crate) fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(amount_from_value(&value).ok().flatten())
}

/// Stored tier data could not be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed tier data: {0}")]
pub struct TierParseError(pub String);

/// The two forms stored tier data arrives in.
#[derive(Debug, Clone, PartialEq)]
pub enum TierSource {
    /// A native array of tiers.
    Raw(Vec<Tier>),
    /// A JSON string holding the array.
    Encoded(String),
}

impl TierSource {
    /// Classify a stored value. `null` means no tiers were stored.
    pub fn from_value(value: Value) -> Result<Option<Self>, TierParseError> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(TierSource::Encoded(s))),
            Value::Array(_) => serde_json::from_value::<Vec<Tier>>(value)
                .map(|tiers| Some(TierSource::Raw(tiers)))
                .map_err(|e| TierParseError(e.to_string())),
            other => Err(TierParseError(format!(
                "expected an array or a JSON string, got {}",
                other
            ))),
        }
    }

    /// Normalize into a schedule sorted by `min_size`.
    pub fn into_schedule(self) -> Result<PriceSchedule, TierParseError> {
        match self {
            TierSource::Raw(tiers) => Ok(PriceSchedule::from_tiers(tiers)),
            TierSource::Encoded(text) => {
                if text.trim().is_empty() {
                    return Ok(PriceSchedule::default());
                }
                let tiers: Option<Vec<Tier>> =
                    serde_json::from_str(&text).map_err(|e| TierParseError(e.to_string()))?;
                Ok(PriceSchedule::from_tiers(tiers.unwrap_or_default()))
            }
        }
    }
}

/// Decode whatever was stored under `groupPricingTiers`.
pub fn decode_tiers(value: Option<Value>) -> Result<PriceSchedule, TierParseError> {
    match value {
        None => Ok(PriceSchedule::default()),
        Some(value) => match TierSource::from_value(value)? {
            Some(source) => source.into_schedule(),
            None => Ok(PriceSchedule::default()),
        },
    }
}
