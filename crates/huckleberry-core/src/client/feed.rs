// Nursing timer operations
//
// The feed timer is written with the feed table: `timer_start_time_sec` is
// in seconds and marks the start of the current run on the active side. Each
// time a run ends (pause, switch, complete) its elapsed time is added to that
// side's duration.

use serde_json::json;
use tracing::info;

use super::{HuckleberryClient, server_timestamp, timer_uuid};
use crate::error::{Error, Result};
use crate::paths::Tracker;
use crate::records::{FeedIntervalData, FeedMode, FeedSide, FeedTimerData, to_document};

fn breast_side(side: FeedSide) -> Result<FeedSide> {
    match side {
        FeedSide::Left | FeedSide::Right => Ok(side),
        FeedSide::None => Err(Error::invalid_input("feeding side must be left or right")),
    }
}

/// Add the current run to the active side's duration
fn close_run(timer: &mut FeedTimerData, now: f64) {
    if timer.paused {
        return;
    }
    let run_start = timer.timer_start_time_sec.unwrap_or(now);
    let elapsed = (now - run_start).max(0.0);
    match timer.active_side {
        Some(FeedSide::Left) => {
            timer.left_duration_sec = Some(timer.left_duration_sec.unwrap_or(0.0) + elapsed)
        }
        Some(FeedSide::Right) => {
            timer.right_duration_sec = Some(timer.right_duration_sec.unwrap_or(0.0) + elapsed)
        }
        _ => {}
    }
    timer.timer_start_time_sec = Some(now);
}

impl HuckleberryClient {
    async fn active_feed_timer(&self, child_id: &str) -> Result<FeedTimerData> {
        let timer = self.feed_document(child_id).await?.timer.unwrap_or_default();
        if !timer.active {
            return Err(Error::invalid_state(format!(
                "no feeding in progress for child {}",
                child_id
            )));
        }
        Ok(timer)
    }

    async fn write_feed_timer(&self, child_id: &str, timer: &FeedTimerData) -> Result<()> {
        let table = Tracker::Feed.table_kind().table();
        self.merge_local(&Tracker::Feed.document(child_id), json!({ "timer": timer }), table)
            .await
    }

    fn idle_feed_timer(now: f64) -> FeedTimerData {
        FeedTimerData {
            timestamp: Some(server_timestamp(now)),
            local_timestamp_sec: Some(now),
            ..FeedTimerData::default()
        }
    }

    /// Start nursing on `side`
    pub async fn start_feeding(&self, child_id: &str, side: FeedSide) -> Result<FeedTimerData> {
        let side = breast_side(side)?;
        let current = self.feed_document(child_id).await?.timer.unwrap_or_default();
        if current.active {
            return Err(Error::invalid_state(format!(
                "feeding already in progress for child {}",
                child_id
            )));
        }

        let now = self.now();
        let timer = FeedTimerData {
            active: true,
            paused: false,
            timestamp: Some(server_timestamp(now)),
            local_timestamp_sec: Some(now),
            feed_start_time_sec: Some(now),
            timer_start_time_sec: Some(now),
            uuid: Some(timer_uuid()),
            left_duration_sec: Some(0.0),
            right_duration_sec: Some(0.0),
            last_side: Some(FeedSide::None),
            active_side: Some(side),
        };
        self.write_feed_timer(child_id, &timer).await?;

        info!(child_id, side = side.as_str(), "feeding started");
        Ok(timer)
    }

    /// Pause nursing, banking the time on the active side
    pub async fn pause_feeding(&self, child_id: &str) -> Result<FeedTimerData> {
        let mut timer = self.active_feed_timer(child_id).await?;
        if timer.paused {
            return Err(Error::invalid_state(format!(
                "feeding already paused for child {}",
                child_id
            )));
        }

        let now = self.now();
        close_run(&mut timer, now);
        timer.paused = true;
        timer.last_side = timer.active_side;
        timer.local_timestamp_sec = Some(now);
        timer.timestamp = Some(server_timestamp(now));
        self.write_feed_timer(child_id, &timer).await?;

        info!(child_id, "feeding paused");
        Ok(timer)
    }

    /// Resume nursing, optionally on another side
    pub async fn resume_feeding(
        &self,
        child_id: &str,
        side: Option<FeedSide>,
    ) -> Result<FeedTimerData> {
        let mut timer = self.active_feed_timer(child_id).await?;
        if !timer.paused {
            return Err(Error::invalid_state(format!(
                "feeding is not paused for child {}",
                child_id
            )));
        }

        let side = match side.or(timer.active_side) {
            Some(side) => breast_side(side)?,
            None => FeedSide::Left,
        };

        let now = self.now();
        timer.paused = false;
        timer.active_side = Some(side);
        timer.timer_start_time_sec = Some(now);
        timer.local_timestamp_sec = Some(now);
        timer.timestamp = Some(server_timestamp(now));
        self.write_feed_timer(child_id, &timer).await?;

        info!(child_id, side = side.as_str(), "feeding resumed");
        Ok(timer)
    }

    /// Move nursing to the other side
    ///
    /// A paused timer switches sides and stays paused.
    pub async fn switch_feeding_side(&self, child_id: &str) -> Result<FeedTimerData> {
        let mut timer = self.active_feed_timer(child_id).await?;
        let current = breast_side(timer.active_side.unwrap_or(FeedSide::None))?;

        let now = self.now();
        close_run(&mut timer, now);
        timer.last_side = Some(current);
        timer.active_side = Some(current.opposite());
        timer.local_timestamp_sec = Some(now);
        timer.timestamp = Some(server_timestamp(now));
        self.write_feed_timer(child_id, &timer).await?;

        info!(
            child_id,
            from = current.as_str(),
            to = current.opposite().as_str(),
            "feeding side switched"
        );
        Ok(timer)
    }

    /// Discard the running feeding without recording it
    pub async fn cancel_feeding(&self, child_id: &str) -> Result<()> {
        self.active_feed_timer(child_id).await?;
        self.write_feed_timer(child_id, &Self::idle_feed_timer(self.now()))
            .await?;

        info!(child_id, "feeding cancelled");
        Ok(())
    }

    /// Stop nursing and record the interval
    pub async fn complete_feeding(&self, child_id: &str) -> Result<FeedIntervalData> {
        let mut timer = self.active_feed_timer(child_id).await?;

        let now = self.now();
        let offset = f64::from(self.offset_min());
        close_run(&mut timer, now);

        let left = timer.left_duration_sec.unwrap_or(0.0);
        let right = timer.right_duration_sec.unwrap_or(0.0);
        let start = timer
            .feed_start_time_sec
            .or(timer.timer_start_time_sec)
            .unwrap_or(now);
        let last_side = timer.active_side.or(timer.last_side).unwrap_or(FeedSide::None);

        let interval = FeedIntervalData {
            mode: FeedMode::Breast,
            start_sec: start,
            last_side: Some(last_side),
            last_updated_sec: Some(now),
            left_duration_sec: Some(left),
            right_duration_sec: Some(right),
            offset_min: offset,
            end_offset_min: Some(offset),
            bottle_type: None,
            amount: None,
            units: None,
        };
        let entry_id = self
            .create_entry(Tracker::Feed, child_id, &to_document(&interval)?)
            .await?;

        let fields = json!({
            "timer": Self::idle_feed_timer(now),
            "prefs.lastNursing": {
                "mode": FeedMode::Breast,
                "start_sec": start,
                "duration_sec": left + right,
                "left_duration_sec": left,
                "right_duration_sec": right,
                "offset_min": offset,
            },
            "prefs.lastSide": {
                "start_sec": start,
                "last_side": last_side,
            },
        });
        let table = Tracker::Feed.table_kind().table();
        self.merge_local(&Tracker::Feed.document(child_id), fields, table)
            .await?;

        info!(child_id, entry_id = %entry_id, left_sec = left, right_sec = right, "feeding completed");
        Ok(interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_run_banks_active_side() {
        let mut timer = FeedTimerData {
            active: true,
            timer_start_time_sec: Some(100.0),
            left_duration_sec: Some(30.0),
            right_duration_sec: Some(0.0),
            active_side: Some(FeedSide::Left),
            ..FeedTimerData::default()
        };
        close_run(&mut timer, 160.0);
        assert_eq!(timer.left_duration_sec, Some(90.0));
        assert_eq!(timer.right_duration_sec, Some(0.0));
        assert_eq!(timer.timer_start_time_sec, Some(160.0));
    }

    #[test]
    fn test_close_run_ignores_paused_timer() {
        let mut timer = FeedTimerData {
            active: true,
            paused: true,
            timer_start_time_sec: Some(100.0),
            right_duration_sec: Some(12.0),
            active_side: Some(FeedSide::Right),
            ..FeedTimerData::default()
        };
        close_run(&mut timer, 500.0);
        assert_eq!(timer.right_duration_sec, Some(12.0));
        assert_eq!(timer.timer_start_time_sec, Some(100.0));
    }

    #[test]
    fn test_breast_side_rejects_none() {
        assert!(breast_side(FeedSide::None).is_err());
        assert_eq!(breast_side(FeedSide::Right).unwrap(), FeedSide::Right);
    }
}
