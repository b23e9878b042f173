//! # Autosave
//!
//! The host drives time: it calls [`crate::EditorService::tick`] from its own
//! event loop and the schedule decides whether a save is due. A single slot
//! under [`AUTOSAVE_KEY`] holds the latest export envelope.

use playbook_common::{KeyValueStore, StorageResult};
use std::time::{Duration, Instant};

use crate::settings::EditorSettings;

pub const AUTOSAVE_KEY: &str = "playbook-autosave";

#[derive(Debug, Clone, Default)]
pub struct AutosaveSchedule {
    interval: Option<Duration>,
    next_due: Option<Instant>,
}

impl AutosaveSchedule {
    pub fn disarmed() -> Self {
        Self::default()
    }

    /// Re-arm from the settings; disarms when autosave is off
    pub fn arm(&mut self, settings: &EditorSettings, now: Instant) {
        if settings.auto_save_due() {
            let interval = Duration::from_millis(settings.auto_save_interval);
            self.interval = Some(interval);
            self.next_due = Some(now + interval);
        } else {
            self.disarm();
        }
    }

    pub fn disarm(&mut self) {
        self.interval = None;
        self.next_due = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// True when a save is due at `now`; the next deadline is then `now + interval`
    pub fn poll(&mut self, now: Instant) -> bool {
        match (self.next_due, self.interval) {
            (Some(due), Some(interval)) if now >= due => {
                self.next_due = Some(now + interval);
                true
            }
            _ => false,
        }
    }
}

pub fn write_autosave(store: &dyn KeyValueStore, envelope: &str) -> StorageResult<()> {
    store.set(AUTOSAVE_KEY, envelope)
}

pub fn read_autosave(store: &dyn KeyValueStore) -> StorageResult<Option<String>> {
    store.get(AUTOSAVE_KEY)
}

pub fn clear_autosave(store: &dyn KeyValueStore) -> StorageResult<()> {
    store.remove(AUTOSAVE_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use playbook_common::MemoryStore;

    #[test]
    fn test_schedule_fires_and_rearms() {
        let start = Instant::now();
        let mut schedule = AutosaveSchedule::disarmed();
        schedule.arm(&EditorSettings::default(), start);

        assert!(!schedule.poll(start + Duration::from_secs(29)));
        assert!(schedule.poll(start + Duration::from_secs(30)));
        assert!(!schedule.poll(start + Duration::from_secs(31)));
        assert_eq!(
            schedule.next_due(),
            Some(start + Duration::from_secs(60))
        );
    }

    #[test]
    fn test_disabled_setting_disarms() {
        let start = Instant::now();
        let mut schedule = AutosaveSchedule::disarmed();
        schedule.arm(&EditorSettings::default(), start);

        let off = EditorSettings {
            enable_auto_save: false,
            ..EditorSettings::default()
        };
        schedule.arm(&off, start);

        assert!(!schedule.is_armed());
        assert!(!schedule.poll(start + Duration::from_secs(3600)));
    }

    #[test]
    fn test_slot_round_trip() {
        let store = MemoryStore::new();
        write_autosave(&store, "{}").unwrap();
        assert_eq!(read_autosave(&store).unwrap().as_deref(), Some("{}"));

        clear_autosave(&store).unwrap();
        assert_eq!(read_autosave(&store).unwrap(), None);
    }
}
