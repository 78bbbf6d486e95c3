//! Typed record views
//!
//! Every struct here describes the **local** form of a document, i.e. what
//! [`crate::mapping::to_local`] produces. Keys the mapping tables do not
//! translate (`bottleType`, `weightUnits`, `quantity`, ...) keep their
//! database spelling through `#[serde(rename)]`.
//!
//! Timestamps are seconds since the Unix epoch, except
//! [`SleepTimerData::timer_start_time_ms`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::Document;
use crate::error::Result;

/// Kind of diaper change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiaperMode {
    Pee,
    Poo,
    Both,
    Dry,
}

/// Poo color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PooColor {
    Yellow,
    Green,
    Brown,
    Black,
    Red,
}

/// Poo consistency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PooConsistency {
    Runny,
    Soft,
    Solid,
    Hard,
}

/// Feeding mode of a feed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedMode {
    Breast,
    Bottle,
    Solids,
}

/// Breast side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedSide {
    Left,
    Right,
    None,
}

impl FeedSide {
    /// The other breast; `None` stays `None`
    pub fn opposite(self) -> Self {
        match self {
            FeedSide::Left => FeedSide::Right,
            FeedSide::Right => FeedSide::Left,
            FeedSide::None => FeedSide::None,
        }
    }

    /// Database spelling
    pub fn as_str(self) -> &'static str {
        match self {
            FeedSide::Left => "left",
            FeedSide::Right => "right",
            FeedSide::None => "none",
        }
    }
}

/// Child gender as stored by the app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Boy,
    Girl,
    #[serde(other)]
    Other,
}

/// Measurement system preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitsSystem {
    Metric,
    Imperial,
}

impl UnitsSystem {
    /// Unit selectors used for growth entries in this system
    pub fn growth_units(self) -> (WeightUnits, HeightUnits, HeadUnits) {
        match self {
            UnitsSystem::Metric => (WeightUnits::Kg, HeightUnits::Cm, HeadUnits::Hcm),
            UnitsSystem::Imperial => (WeightUnits::Lbs, HeightUnits::Inches, HeadUnits::Hinches),
        }
    }
}

/// Weight unit selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnits {
    Kg,
    Lbs,
}

/// Height unit selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeightUnits {
    Cm,
    Inches,
}

/// Head circumference unit selector (`hcm` = head cm, `hinches` = head inches)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadUnits {
    Hcm,
    Hinches,
}

/// Bottle contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BottleType {
    #[default]
    Formula,
    #[serde(rename = "Breast Milk")]
    BreastMilk,
    Mixed,
}

/// Bottle volume unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeUnits {
    #[default]
    Ml,
    Oz,
}

/// Child profile (`childs/{child_id}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildData {
    #[serde(default)]
    pub uid: String,
    pub name: String,
    /// `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,
    /// Minutes from midnight
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub night_start_min: Option<i64>,
    /// Minutes from midnight
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub morning_cutoff_min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_naps: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
}

/// Reference to a child in a user profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildRef {
    pub cid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

/// User profile (`users/{uid}`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    #[serde(rename = "childList", default)]
    pub child_list: Vec<ChildRef>,
}

/// In-progress sleep session (`sleep/{child_id}`, field `timer`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SleepTimerData {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub paused: bool,
    /// Server timestamp map (`{"seconds": ...}`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_timestamp_sec: Option<f64>,
    /// Milliseconds, unlike every other timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_start_time_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Document>,
}

/// In-progress feeding session (`feed/{child_id}`, field `timer`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedTimerData {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub paused: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_timestamp_sec: Option<f64>,
    /// Absolute session start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_start_time_sec: Option<f64>,
    /// Start of the current run; reset on side switch and resume
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_start_time_sec: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_duration_sec: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_duration_sec: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_side: Option<FeedSide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_side: Option<FeedSide>,
}

/// `sleep/{child_id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SleepDocumentData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer: Option<SleepTimerData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefs: Option<Document>,
}

/// `feed/{child_id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedDocumentData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer: Option<FeedTimerData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefs: Option<Document>,
}

/// `diaper/{child_id}`; diapers are instant events, so no timer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiaperDocumentData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefs: Option<Document>,
}

/// `health/{child_id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthDocumentData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefs: Option<Document>,
}

/// Completed sleep (`sleep/{child_id}/intervals/{id}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepIntervalData {
    pub start_sec: f64,
    pub duration_sec: f64,
    /// Timezone offset, negative west of UTC
    pub offset_min: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_offset_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Document>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_sec: Option<f64>,
}

/// Feed entry (`feed/{child_id}/intervals/{id}`), nursing or bottle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedIntervalData {
    pub mode: FeedMode,
    pub start_sec: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_side: Option<FeedSide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_sec: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_duration_sec: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_duration_sec: Option<f64>,
    pub offset_min: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_offset_min: Option<f64>,
    #[serde(rename = "bottleType", default, skip_serializing_if = "Option::is_none")]
    pub bottle_type: Option<BottleType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<VolumeUnits>,
}

/// Pee / poo amounts of a diaper change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiaperQuantity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pee: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poo: Option<f64>,
}

/// Diaper change (`diaper/{child_id}/intervals/{id}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaperData {
    pub mode: DiaperMode,
    pub start_sec: f64,
    pub last_updated_sec: f64,
    pub offset_min: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<DiaperQuantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<PooColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistency: Option<PooConsistency>,
}

/// Growth measurement (`health/{child_id}/data/{id}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<f64>,
    #[serde(rename = "weightUnits")]
    pub weight_units: WeightUnits,
    #[serde(rename = "heightUnits")]
    pub height_units: HeightUnits,
    #[serde(rename = "headUnits")]
    pub head_units: HeadUnits,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_sec: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_min: Option<f64>,
}

/// Deserialize a local-form document into a record type
pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}

/// Serialize a record into a local-form document
pub fn to_document<T: Serialize>(record: &T) -> Result<Document> {
    match serde_json::to_value(record)? {
        Value::Object(doc) => Ok(doc),
        other => Err(crate::Error::invalid_input(format!(
            "record did not serialize to a document: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bottle_type_spelling() {
        assert_eq!(serde_json::to_value(BottleType::BreastMilk).unwrap(), json!("Breast Milk"));
        assert_eq!(serde_json::to_value(VolumeUnits::Oz).unwrap(), json!("oz"));
    }

    #[test]
    fn test_unknown_gender_maps_to_other() {
        let gender: Gender = serde_json::from_value(json!("nonbinary")).unwrap();
        assert_eq!(gender, Gender::Other);
    }

    #[test]
    fn test_feed_interval_from_local_document() {
        let doc = json!({
            "mode": "bottle",
            "start_sec": 100.0,
            "offset_min": -300.0,
            "bottleType": "Mixed",
            "amount": 90.0,
            "units": "ml",
        });
        let interval: FeedIntervalData =
            from_document(doc.as_object().cloned().unwrap()).unwrap();

        assert_eq!(interval.mode, FeedMode::Bottle);
        assert_eq!(interval.bottle_type, Some(BottleType::Mixed));
        assert_eq!(interval.units, Some(VolumeUnits::Ml));
        assert!(interval.last_side.is_none());
    }

    #[test]
    fn test_units_system_growth_units() {
        assert_eq!(
            UnitsSystem::Imperial.growth_units(),
            (WeightUnits::Lbs, HeightUnits::Inches, HeadUnits::Hinches)
        );
    }

    #[test]
    fn test_feed_side_opposite() {
        assert_eq!(FeedSide::Left.opposite(), FeedSide::Right);
        assert_eq!(FeedSide::None.opposite(), FeedSide::None);
    }
}
