//! RFC 3339 (ISO-8601) encoding for span timestamps.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	let formatted = value.format(&Rfc3339).map_err(serde::ser::Error::custom)?;

	serializer.serialize_str(&formatted)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = String::deserialize(deserializer)?;

	OffsetDateTime::parse(&raw, &Rfc3339).map_err(serde::de::Error::custom)
}

/// Text form used by the trace renderer; falls back to the unix timestamp when the value has no
/// RFC 3339 representation.
pub fn display(value: &OffsetDateTime) -> String {
	value.format(&Rfc3339).unwrap_or_else(|_| value.unix_timestamp().to_string())
}

pub mod option {
	use super::*;

	pub fn serialize<S>(value: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let formatted = value
			.as_ref()
			.map(|value| value.format(&Rfc3339))
			.transpose()
			.map_err(serde::ser::Error::custom)?;

		formatted.serialize(serializer)
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
	where
		D: Deserializer<'de>,
	{
		Option::<String>::deserialize(deserializer)?
			.map(|raw| OffsetDateTime::parse(&raw, &Rfc3339))
			.transpose()
			.map_err(serde::de::Error::custom)
	}
}
