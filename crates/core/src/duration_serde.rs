//! Serde helpers for `Duration`/`Option<Duration>` as milliseconds, in the
//! style of `nebula-execution`'s `serde_duration_opt`.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Serialize/deserialize `Duration` as an integer number of milliseconds.
pub mod duration_millis {
    use super::{Deserialize, Deserializer, Duration, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
        (duration.as_millis() as u64).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Serialize/deserialize `Option<Duration>` as an optional integer of milliseconds.
pub mod duration_millis_opt {
    use super::{Deserialize, Deserializer, Duration, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match duration {
            Some(d) => (d.as_millis() as u64).serialize(s),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let opt: Option<u64> = Option::deserialize(d)?;
        Ok(opt.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(serde::Serialize, serde::Deserialize)]
    struct Wrapper {
        #[serde(with = "duration_millis_opt")]
        d: Option<Duration>,
    }

    #[test]
    fn opt_duration_roundtrips_through_json() {
        let w = Wrapper { d: Some(Duration::from_millis(250)) };
        let json = serde_json::to_string(&w).unwrap();
        assert_eq!(json, r#"{"d":250}"#);
        let back: Wrapper = serde_json::from_str(&json).unwrap();
        assert_eq!(back.d, Some(Duration::from_millis(250)));
    }

    #[test]
    fn none_serializes_as_null() {
        let w = Wrapper { d: None };
        let json = serde_json::to_string(&w).unwrap();
        assert_eq!(json, r#"{"d":null}"#);
    }
}
