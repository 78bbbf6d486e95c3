// Sleep timer operations
//
// The sleep timer lives in `sleep/{child_id}.timer` and is written with the
// standard table, so `timer_start_time_ms` stays in milliseconds. A pause
// stamps `local_timestamp_sec`; resuming moves the start forward by the
// paused span, so `now - start` is always the time actually slept.

use serde_json::json;
use tracing::info;

use super::{HuckleberryClient, server_timestamp, timer_uuid};
use crate::error::{Error, Result};
use crate::paths::Tracker;
use crate::records::{SleepIntervalData, SleepTimerData, to_document};

impl HuckleberryClient {
    async fn sleep_timer(&self, child_id: &str) -> Result<SleepTimerData> {
        Ok(self.sleep_document(child_id).await?.timer.unwrap_or_default())
    }

    async fn active_sleep_timer(&self, child_id: &str) -> Result<SleepTimerData> {
        let timer = self.sleep_timer(child_id).await?;
        if !timer.active {
            return Err(Error::invalid_state(format!(
                "no sleep in progress for child {}",
                child_id
            )));
        }
        Ok(timer)
    }

    fn idle_sleep_timer(now: f64) -> SleepTimerData {
        SleepTimerData {
            active: false,
            paused: false,
            timestamp: Some(server_timestamp(now)),
            local_timestamp_sec: Some(now),
            ..SleepTimerData::default()
        }
    }

    /// Start a sleep timer
    pub async fn start_sleep(&self, child_id: &str) -> Result<SleepTimerData> {
        if self.sleep_timer(child_id).await?.active {
            return Err(Error::invalid_state(format!(
                "sleep already in progress for child {}",
                child_id
            )));
        }

        let now = self.now();
        let timer = SleepTimerData {
            active: true,
            paused: false,
            timestamp: Some(server_timestamp(now)),
            local_timestamp_sec: Some(now),
            timer_start_time_ms: Some(now * 1000.0),
            uuid: Some(timer_uuid()),
            details: None,
        };

        let table = Tracker::Sleep.table_kind().table();
        self.merge_local(&Tracker::Sleep.document(child_id), json!({ "timer": &timer }), table)
            .await?;

        info!(child_id, "sleep started");
        Ok(timer)
    }

    /// Pause the running sleep timer
    pub async fn pause_sleep(&self, child_id: &str) -> Result<()> {
        let timer = self.active_sleep_timer(child_id).await?;
        if timer.paused {
            return Err(Error::invalid_state(format!(
                "sleep already paused for child {}",
                child_id
            )));
        }

        let now = self.now();
        let fields = json!({
            "timer.paused": true,
            "timer.local_timestamp_sec": now,
            "timer.timestamp": server_timestamp(now),
        });
        let table = Tracker::Sleep.table_kind().table();
        self.merge_local(&Tracker::Sleep.document(child_id), fields, table)
            .await?;

        info!(child_id, "sleep paused");
        Ok(())
    }

    /// Resume a paused sleep timer
    pub async fn resume_sleep(&self, child_id: &str) -> Result<()> {
        let timer = self.active_sleep_timer(child_id).await?;
        if !timer.paused {
            return Err(Error::invalid_state(format!(
                "sleep is not paused for child {}",
                child_id
            )));
        }

        let now = self.now();
        let paused_at = timer.local_timestamp_sec.unwrap_or(now);
        let paused_ms = (now - paused_at).max(0.0) * 1000.0;
        let start_ms = timer.timer_start_time_ms.unwrap_or(paused_at * 1000.0) + paused_ms;

        let fields = json!({
            "timer.paused": false,
            "timer.timer_start_time_ms": start_ms,
            "timer.local_timestamp_sec": now,
            "timer.timestamp": server_timestamp(now),
        });
        let table = Tracker::Sleep.table_kind().table();
        self.merge_local(&Tracker::Sleep.document(child_id), fields, table)
            .await?;

        info!(child_id, paused_sec = paused_ms / 1000.0, "sleep resumed");
        Ok(())
    }

    /// Discard the running sleep without recording it
    pub async fn cancel_sleep(&self, child_id: &str) -> Result<()> {
        self.active_sleep_timer(child_id).await?;

        let timer = Self::idle_sleep_timer(self.now());
        let table = Tracker::Sleep.table_kind().table();
        self.merge_local(&Tracker::Sleep.document(child_id), json!({ "timer": &timer }), table)
            .await?;

        info!(child_id, "sleep cancelled");
        Ok(())
    }

    /// Stop the sleep timer and record the interval
    ///
    /// A paused timer ends at the moment it was paused.
    pub async fn complete_sleep(&self, child_id: &str) -> Result<SleepIntervalData> {
        let timer = self.active_sleep_timer(child_id).await?;

        let now = self.now();
        let offset = f64::from(self.offset_min());
        let end = if timer.paused {
            timer.local_timestamp_sec.unwrap_or(now)
        } else {
            now
        };
        let start = timer.timer_start_time_ms.map_or(end, |ms| ms / 1000.0);

        let interval = SleepIntervalData {
            start_sec: start,
            duration_sec: (end - start).max(0.0),
            offset_min: offset,
            end_offset_min: Some(offset),
            details: timer.details.clone(),
            last_updated_sec: Some(now),
        };
        let entry_id = self
            .create_entry(Tracker::Sleep, child_id, &to_document(&interval)?)
            .await?;

        let fields = json!({
            "timer": Self::idle_sleep_timer(now),
            "prefs.lastSleep": {
                "start_sec": interval.start_sec,
                "duration_sec": interval.duration_sec,
                "offset_min": interval.offset_min,
            },
        });
        let table = Tracker::Sleep.table_kind().table();
        self.merge_local(&Tracker::Sleep.document(child_id), fields, table)
            .await?;

        info!(child_id, entry_id = %entry_id, duration_sec = interval.duration_sec, "sleep completed");
        Ok(interval)
    }
}
