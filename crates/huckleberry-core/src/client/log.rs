// Instant entries: bottles, diapers, growth measurements

use serde_json::{Value, json};
use tracing::info;

use super::{EntryQuery, HuckleberryClient};
use crate::error::{Error, Result};
use crate::paths::Tracker;
use crate::records::{
    BottleType, DiaperData, DiaperMode, DiaperQuantity, FeedIntervalData, FeedMode, GrowthData,
    PooColor, PooConsistency, UnitsSystem, VolumeUnits, to_document,
};

/// A bottle feeding to log
///
/// Missing type and units fall back to the client's configured defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BottleEntry {
    pub amount: f64,
    pub bottle_type: Option<BottleType>,
    pub units: Option<VolumeUnits>,
}

impl BottleEntry {
    /// A bottle of `amount` with default type and units
    pub fn new(amount: f64) -> Self {
        Self {
            amount,
            bottle_type: None,
            units: None,
        }
    }
}

/// A diaper change to log
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiaperEntry {
    pub mode: DiaperMode,
    pub pee_amount: Option<f64>,
    pub poo_amount: Option<f64>,
    /// Only valid for `poo` and `both`
    pub color: Option<PooColor>,
    /// Only valid for `poo` and `both`
    pub consistency: Option<PooConsistency>,
}

impl DiaperEntry {
    pub fn new(mode: DiaperMode) -> Self {
        Self {
            mode,
            pee_amount: None,
            poo_amount: None,
            color: None,
            consistency: None,
        }
    }

    fn validate(&self) -> Result<()> {
        let has_poo = matches!(self.mode, DiaperMode::Poo | DiaperMode::Both);
        if !has_poo && (self.color.is_some() || self.consistency.is_some()) {
            return Err(Error::invalid_input(
                "color and consistency only apply to poo diapers",
            ));
        }
        for amount in [self.pee_amount, self.poo_amount].into_iter().flatten() {
            if !amount.is_finite() || amount < 0.0 {
                return Err(Error::invalid_input(format!(
                    "diaper amount must be a non-negative number. Got: {}",
                    amount
                )));
            }
        }
        Ok(())
    }
}

/// A growth measurement to log
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthEntry {
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub head: Option<f64>,
    pub units: UnitsSystem,
}

impl GrowthEntry {
    fn validate(&self) -> Result<()> {
        let measurements = [self.weight, self.height, self.head];
        if measurements.iter().all(Option::is_none) {
            return Err(Error::invalid_input(
                "growth entry needs at least one of weight, height or head",
            ));
        }
        for value in measurements.into_iter().flatten() {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::invalid_input(format!(
                    "growth measurements must be positive. Got: {}",
                    value
                )));
            }
        }
        Ok(())
    }
}

impl HuckleberryClient {
    /// Record a bottle feeding
    pub async fn log_bottle_feeding(
        &self,
        child_id: &str,
        bottle: BottleEntry,
    ) -> Result<FeedIntervalData> {
        if !bottle.amount.is_finite() || bottle.amount <= 0.0 {
            return Err(Error::invalid_input(format!(
                "bottle amount must be positive. Got: {}",
                bottle.amount
            )));
        }

        let now = self.now();
        let offset = f64::from(self.offset_min());
        let bottle_type = bottle.bottle_type.unwrap_or(self.config.default_bottle_type);
        let units = bottle.units.unwrap_or(self.config.default_bottle_units);

        let interval = FeedIntervalData {
            mode: FeedMode::Bottle,
            start_sec: now,
            last_side: None,
            last_updated_sec: Some(now),
            left_duration_sec: None,
            right_duration_sec: None,
            offset_min: offset,
            end_offset_min: Some(offset),
            bottle_type: Some(bottle_type),
            amount: Some(bottle.amount),
            units: Some(units),
        };
        let entry_id = self
            .create_entry(Tracker::Feed, child_id, &to_document(&interval)?)
            .await?;

        let fields = json!({
            "prefs.lastBottle": {
                "mode": FeedMode::Bottle,
                "start_sec": now,
                "bottleType": bottle_type,
                "bottleAmount": bottle.amount,
                "bottleUnits": units,
                "offset_min": offset,
            },
            "prefs.bottleType": bottle_type,
            "prefs.bottleAmount": bottle.amount,
            "prefs.bottleUnits": units,
        });
        let table = Tracker::Feed.table_kind().table();
        self.merge_local(&Tracker::Feed.document(child_id), fields, table)
            .await?;

        info!(child_id, entry_id = %entry_id, amount = bottle.amount, ?units, "bottle logged");
        Ok(interval)
    }

    /// Record a diaper change
    pub async fn log_diaper(&self, child_id: &str, diaper: DiaperEntry) -> Result<DiaperData> {
        diaper.validate()?;

        let now = self.now();
        let offset = f64::from(self.offset_min());
        let quantity = if diaper.pee_amount.is_some() || diaper.poo_amount.is_some() {
            Some(DiaperQuantity {
                pee: diaper.pee_amount,
                poo: diaper.poo_amount,
            })
        } else {
            None
        };

        let change = DiaperData {
            mode: diaper.mode,
            start_sec: now,
            last_updated_sec: now,
            offset_min: offset,
            quantity,
            color: diaper.color,
            consistency: diaper.consistency,
        };
        let entry_id = self
            .create_entry(Tracker::Diaper, child_id, &to_document(&change)?)
            .await?;

        let fields = json!({
            "prefs.lastDiaper": {
                "mode": diaper.mode,
                "start_sec": now,
                "offset_min": offset,
            },
        });
        let table = Tracker::Diaper.table_kind().table();
        self.merge_local(&Tracker::Diaper.document(child_id), fields, table)
            .await?;

        info!(child_id, entry_id = %entry_id, mode = ?diaper.mode, "diaper logged");
        Ok(change)
    }

    /// Record a growth measurement
    pub async fn log_growth(&self, child_id: &str, growth: GrowthEntry) -> Result<GrowthData> {
        growth.validate()?;

        let now = self.now();
        let offset = f64::from(self.offset_min());
        let (weight_units, height_units, head_units) = growth.units.growth_units();

        let measurement = GrowthData {
            weight: growth.weight,
            height: growth.height,
            head: growth.head,
            weight_units,
            height_units,
            head_units,
            start_sec: Some(now),
            offset_min: Some(offset),
        };

        let mut entry = to_document(&measurement)?;
        entry.insert("type".into(), Value::from("health"));
        entry.insert("mode".into(), Value::from("growth"));
        entry.insert("isNight".into(), Value::Bool(false));
        entry.insert("last_updated_sec".into(), Value::from(now));
        entry.insert("end_offset_min".into(), Value::from(offset));
        let entry_id = self.create_entry(Tracker::Health, child_id, &entry).await?;

        let mut last_entry = to_document(&measurement)?;
        last_entry.insert("mode".into(), Value::from("growth"));
        let mut fields = serde_json::Map::new();
        fields.insert("prefs.lastGrowthEntry".into(), Value::Object(last_entry));
        let table = Tracker::Health.table_kind().table();
        self.merge_local(&Tracker::Health.document(child_id), Value::Object(fields), table)
            .await?;

        info!(child_id, entry_id = %entry_id, "growth logged");
        Ok(measurement)
    }

    /// Most recent growth measurement, if any
    pub async fn latest_growth(&self, child_id: &str) -> Result<Option<GrowthData>> {
        let mut entries = self.growth_entries(child_id, EntryQuery::latest(1)).await?;
        Ok(entries.pop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diaper_color_requires_poo() {
        let mut entry = DiaperEntry::new(DiaperMode::Pee);
        entry.color = Some(PooColor::Yellow);
        assert!(entry.validate().is_err());

        entry.mode = DiaperMode::Both;
        assert!(entry.validate().is_ok());
    }

    #[test]
    fn test_diaper_negative_amount() {
        let mut entry = DiaperEntry::new(DiaperMode::Pee);
        entry.pee_amount = Some(-1.0);
        assert!(entry.validate().is_err());
    }

    #[test]
    fn test_growth_needs_a_measurement() {
        let empty = GrowthEntry {
            weight: None,
            height: None,
            head: None,
            units: UnitsSystem::Metric,
        };
        assert!(empty.validate().is_err());

        let weight_only = GrowthEntry {
            weight: Some(5.2),
            ..empty
        };
        assert!(weight_only.validate().is_ok());

        let zero_head = GrowthEntry {
            head: Some(0.0),
            ..weight_only
        };
        assert!(zero_head.validate().is_err());
    }
}
