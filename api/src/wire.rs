//! Response envelopes used by the League API.
//!
//! Single-item reads come back as `{"result": {"Item": {...}}}`, queries as
//! `{"Items": [...], "Count": n}`. A missing record is an empty object.
use serde::{Deserialize, Serialize};

use crate::{Match, Prediction};

#[derive(Deserialize, Debug)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ItemEnvelope<T> {
    #[serde(default = "Option::default")]
    pub result: Option<ItemResult<T>>,
}

impl<T> Default for ItemEnvelope<T> {
    fn default() -> Self {
        Self { result: None }
    }
}

impl<T> ItemEnvelope<T> {
    pub fn into_item(self) -> Option<T> {
        self.result.and_then(|r| r.item)
    }
}

#[derive(Deserialize, Debug)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ItemResult<T> {
    #[serde(rename = "Item", default = "Option::default")]
    pub item: Option<T>,
}

#[derive(Deserialize, Debug)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct QueryResult<T> {
    #[serde(rename = "Items", default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(rename = "Count", default)]
    pub count: u32,
}

impl<T> Default for QueryResult<T> {
    fn default() -> Self {
        Self { items: Vec::new(), count: 0 }
    }
}

#[derive(Serialize, Debug)]
pub struct ScheduleBody<'a> {
    pub schedule: &'a [Match],
}

#[derive(Serialize, Debug)]
pub struct MembersBody<'a> {
    pub members: &'a [String],
}

#[derive(Serialize, Debug)]
pub struct PredictionsBody<'a> {
    pub predictions: &'a [Prediction],
}

/// RFC 3339 timestamps where the empty string stands for "not set".
pub mod optional_timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => DateTime::parse_from_rfc3339(s)
                .map(|ts| Some(ts.with_timezone(&Utc)))
                .map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PredictionSet, Schedule};
    use chrono::{TimeZone, Utc};

    #[test]
    fn empty_object_is_a_missing_item() {
        let raw: ItemEnvelope<PredictionSet> = serde_json::from_str("{}").unwrap();
        assert!(raw.into_item().is_none());
    }

    #[test]
    fn schedule_with_blank_end_parses() {
        let body = r#"{"result":{"Item":{"tournament":"IPL","modified":"","schedule":[
            {"start":"2020-09-19T14:00:00.000Z","end":"","left":"MI","right":"CSK",
             "completed":false,"winner":"","mom":""}]}}}"#;
        let raw: ItemEnvelope<Schedule> = serde_json::from_str(body).unwrap();
        let schedule = raw.into_item().unwrap();
        assert_eq!(schedule.schedule.len(), 1);
        let m = &schedule.schedule[0];
        assert_eq!(m.start, Utc.with_ymd_and_hms(2020, 9, 19, 14, 0, 0).unwrap());
        assert!(m.end.is_none());
    }

    #[test]
    fn absent_end_serializes_as_empty_string() {
        let m = Match {
            start: Utc.with_ymd_and_hms(2020, 9, 19, 14, 0, 0).unwrap(),
            left: "MI".into(),
            right: "CSK".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["end"], "");
        assert_eq!(json["left"], "MI");
    }

    #[test]
    fn query_result_without_items_is_empty() {
        let raw: QueryResult<crate::LeagueMember> = serde_json::from_str(r#"{"Count":0}"#).unwrap();
        assert!(raw.items.is_empty());
    }
}
