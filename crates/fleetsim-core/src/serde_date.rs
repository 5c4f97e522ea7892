//! `YYYY-MM-DD` serde representation for [`time::Date`].

use serde::de::Error;
use serde::{Deserialize, Deserializer, Serializer};
use time::Date;

use crate::id::{format_date, parse_date};

pub fn serialize<S>(value: &Date, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_date(*value))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(D::Error::custom)
}

pub mod option {
    use super::{format_date, parse_date, Date, Deserialize, Deserializer, Error, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S>(value: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_some(&format_date(*date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| parse_date(&raw).map_err(D::Error::custom))
            .transpose()
    }
}
