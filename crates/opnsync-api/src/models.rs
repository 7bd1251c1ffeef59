// Router API wire types
//
// These mirror the JSON the router sends and expects. They are deliberately
// loose (strings everywhere, lenient flag parsing) because OPNsense encodes
// booleans as "0"/"1", alias content as newline-separated text, and empty
// maps as `[]`. `opnsync-core` converts them into validated domain types.

use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, DeserializeOwned, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::Error;

// ── Reservations ────────────────────────────────────────────────────

/// A static DHCP reservation as exchanged with the router.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRecord {
    /// Only present when a record is fetched individually; search results
    /// carry the UUID as the map key instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default)]
    pub mac: String,
    #[serde(default, alias = "ip")]
    pub ipaddr: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default, alias = "description")]
    pub descr: String,
    #[serde(default, with = "flag")]
    pub disabled: bool,
    #[serde(default)]
    pub interface: String,
}

/// `GET dhcpv4/leases/searchReservations` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReservationSearchResponse {
    /// UUID → record, in document order.
    #[serde(default, deserialize_with = "map_or_empty_seq")]
    pub reservations: IndexMap<String, ReservationRecord>,
}

// ── Aliases ─────────────────────────────────────────────────────────

/// A firewall alias as exchanged with the router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub alias_type: String,
    #[serde(default, with = "content_lines")]
    pub content: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "enabled_by_default", with = "flag")]
    pub enabled: bool,
    #[serde(default, alias = "update_freq")]
    pub updatefreq: String,
}

fn enabled_by_default() -> bool {
    true
}

/// `GET firewall/alias/searchItem` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AliasSearchResponse {
    #[serde(default, deserialize_with = "map_or_empty_seq")]
    pub aliases: IndexMap<String, AliasRecord>,
}

// ── Mutation / reconfigure envelopes ────────────────────────────────

/// Response to add/set/del calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(
        default,
        deserialize_with = "validation_map",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub validations: BTreeMap<String, String>,
}

impl MutationResponse {
    /// Turn a `status != "ok"` body into [`Error::Api`].
    pub fn ensure_ok(self) -> Result<Self, Error> {
        if self.status.eq_ignore_ascii_case("ok") {
            return Ok(self);
        }
        Err(Error::Api {
            status: 200,
            message: self
                .message
                .unwrap_or_else(|| format!("router reported status '{}'", self.status)),
            validations: self.validations,
        })
    }
}

/// Response to `service/reconfigure` and `alias/reconfigure`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconfigureResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub changed: bool,
}

impl ReconfigureResponse {
    pub fn ensure_ok(self) -> Result<Self, Error> {
        if self.status.eq_ignore_ascii_case("ok") {
            return Ok(self);
        }
        Err(Error::Api {
            status: 200,
            message: self
                .message
                .unwrap_or_else(|| format!("reconfigure returned status '{}'", self.status)),
            validations: BTreeMap::new(),
        })
    }
}

// ── Decoding helpers ────────────────────────────────────────────────

/// Decode a JSON value into `T`, keeping a body preview on failure.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    serde_json::from_value::<T>(value.clone()).map_err(|e| {
        let body = value.to_string();
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body,
        }
    })
}

/// Single-item getters answer either `{"<key>": {...}}` or the bare record.
pub fn unwrap_item(value: Value, key: &str) -> Value {
    match value {
        Value::Object(mut map) if map.get(key).is_some_and(Value::is_object) => {
            map.remove(key).unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Wrap a record as `{"<key>": record}` for add/set bodies.
pub fn wrap_item<T: Serialize>(key: &str, record: &T) -> Result<Value, Error> {
    let inner = serde_json::to_value(record).map_err(|e| Error::Deserialization {
        message: format!("failed to encode {key}: {e}"),
        body: String::new(),
    })?;
    let mut map = serde_json::Map::new();
    map.insert(key.to_owned(), inner);
    Ok(Value::Object(map))
}

/// PHP serializes empty associative arrays as `[]`; accept both shapes.
fn map_or_empty_seq<'de, D, T>(deserializer: D) -> Result<IndexMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    struct MapOrSeq<T>(std::marker::PhantomData<T>);

    impl<'de, T: Deserialize<'de>> Visitor<'de> for MapOrSeq<T> {
        type Value = IndexMap<String, T>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map keyed by UUID or an empty array")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut out = IndexMap::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((k, v)) = access.next_entry::<String, T>()? {
                out.insert(k, v);
            }
            Ok(out)
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            if access.next_element::<de::IgnoredAny>()?.is_some() {
                return Err(de::Error::custom("expected an empty array"));
            }
            Ok(IndexMap::new())
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(IndexMap::new())
        }
    }

    deserializer.deserialize_any(MapOrSeq(std::marker::PhantomData))
}

/// Validation messages arrive as strings or arrays of strings.
fn validation_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(field, reason)| {
            let reason = match reason {
                Value::String(s) => s,
                Value::Array(items) => items
                    .iter()
                    .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_owned))
                    .collect::<Vec<_>>()
                    .join("; "),
                other => other.to_string(),
            };
            (field, reason)
        })
        .collect())
}

/// `"0"`/`"1"` flags, also accepting real booleans and numbers.
mod flag {
    use serde::de::{self, Deserializer};
    use serde::{Deserialize, Serializer};
    use serde_json::Value;

    pub(super) fn serialize<S: Serializer>(value: &bool, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(if *value { "1" } else { "0" })
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        match Value::deserialize(d)? {
            Value::Bool(b) => Ok(b),
            Value::Number(n) => Ok(n.as_i64().is_some_and(|v| v != 0)),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "" | "0" | "false" | "no" | "off" => Ok(false),
                other => Err(de::Error::custom(format!("invalid flag value '{other}'"))),
            },
            Value::Null => Ok(false),
            other => Err(de::Error::custom(format!("invalid flag value {other}"))),
        }
    }
}

/// Alias content travels as newline-separated text; arrays are accepted too.
mod content_lines {
    use super::{Deserialize, Deserializer, Serializer, Value};
    use serde::de;

    pub(super) fn serialize<S: Serializer>(value: &[String], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.join("\n"))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        let lines = |text: &str| -> Vec<String> {
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_owned)
                .collect()
        };
        match Value::deserialize(d)? {
            Value::String(s) => Ok(lines(&s)),
            Value::Array(items) => items
                .into_iter()
                .map(|v| match v {
                    Value::String(s) => Ok(s.trim().to_owned()),
                    other => Err(de::Error::custom(format!("invalid alias entry {other}"))),
                })
                .collect(),
            Value::Null => Ok(Vec::new()),
            other => Err(de::Error::custom(format!("invalid alias content {other}"))),
        }
    }
}
