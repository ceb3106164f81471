use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::event::{Event, RegionFilter};

/// Where the calendar keeps its events and the preferred region.
///
/// The calendar core only ever reads a snapshot and writes a whole
/// collection back; implementations own any caching or sync semantics.
pub trait EventStore {
    fn load_events(&self) -> anyhow::Result<Vec<Event>>;
    fn save_events(&self, events: &[Event]) -> anyhow::Result<()>;
    fn load_region(&self) -> anyhow::Result<RegionFilter>;
    fn save_region(&self, region: RegionFilter) -> anyhow::Result<()>;

    /// Replaces the stored event with the same id.
    fn update_event(&self, event: &Event) -> anyhow::Result<()> {
        let mut events = self.load_events()?;
        let slot = events
            .iter_mut()
            .find(|stored| stored.id == event.id)
            .ok_or_else(|| anyhow!("event not found: {}", event.id))?;
        *slot = event.clone();
        self.save_events(&events)
    }

    fn delete_event(&self, id: &str) -> anyhow::Result<Event> {
        let mut events = self.load_events()?;
        let idx = events
            .iter()
            .position(|stored| stored.id == id)
            .ok_or_else(|| anyhow!("event not found: {id}"))?;
        let removed = events.remove(idx);
        self.save_events(&events)?;
        Ok(removed)
    }

    fn add_event(&self, event: Event) -> anyhow::Result<()> {
        let mut events = self.load_events()?;
        if events.iter().any(|stored| stored.id == event.id) {
            return Err(anyhow!("event id already exists: {}", event.id));
        }
        events.push(event);
        self.save_events(&events)
    }
}

/// File-backed fallback store: `events.json` holds a JSON array of events,
/// `region` holds the preferred region filter as plain text.
#[derive(Debug)]
pub struct LocalStore {
    pub data_dir: PathBuf,
    pub events_path: PathBuf,
    pub region_path: PathBuf,
}

impl LocalStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let events_path = data_dir.join("events.json");
        let region_path = data_dir.join("region");

        info!(
            data_dir = %data_dir.display(),
            events = %events_path.display(),
            region = %region_path.display(),
            "opened local store"
        );

        Ok(Self {
            data_dir,
            events_path,
            region_path,
        })
    }
}

impl EventStore for LocalStore {
    #[tracing::instrument(skip(self))]
    fn load_events(&self) -> anyhow::Result<Vec<Event>> {
        if !self.events_path.exists() {
            debug!(file = %self.events_path.display(), "no events file yet");
            return Ok(Vec::new());
        }

        let raw = fs::read_to_string(&self.events_path)
            .with_context(|| format!("failed reading {}", self.events_path.display()))?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        let events: Vec<Event> = serde_json::from_str(&raw)
            .with_context(|| format!("failed parsing {}", self.events_path.display()))?;
        debug!(count = events.len(), "loaded events");
        Ok(events)
    }

    #[tracing::instrument(skip(self, events), fields(count = events.len()))]
    fn save_events(&self, events: &[Event]) -> anyhow::Result<()> {
        let serialized = serde_json::to_string_pretty(events)?;
        write_atomic(&self.events_path, serialized.as_bytes())
            .context("failed to save events.json")
    }

    #[tracing::instrument(skip(self))]
    fn load_region(&self) -> anyhow::Result<RegionFilter> {
        if !self.region_path.exists() {
            return Ok(RegionFilter::All);
        }

        let raw = fs::read_to_string(&self.region_path)
            .with_context(|| format!("failed reading {}", self.region_path.display()))?;
        let trimmed = raw.trim();
        match RegionFilter::from_key(trimmed) {
            Some(region) => Ok(region),
            None => {
                warn!(value = %trimmed, "unrecognized stored region; using All");
                Ok(RegionFilter::All)
            }
        }
    }

    #[tracing::instrument(skip(self))]
    fn save_region(&self, region: RegionFilter) -> anyhow::Result<()> {
        write_atomic(&self.region_path, region.as_key().as_bytes())
            .context("failed to save region")
    }
}

#[tracing::instrument(skip(path, payload))]
fn write_atomic(path: &Path, payload: &[u8]) -> anyhow::Result<()> {
    debug!(file = %path.display(), bytes = payload.len(), "writing atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(payload)?;
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::datetime::DateKey;
    use crate::event::Region;

    fn sample(club: &str, date: &str, region: Region) -> Event {
        Event::new(
            club.to_string(),
            DateKey::parse(date).expect("valid key"),
            region,
        )
    }

    #[test]
    fn missing_files_load_as_defaults() {
        let temp = tempdir().expect("tempdir");
        let store = LocalStore::open(temp.path()).expect("open store");
        assert!(store.load_events().expect("load events").is_empty());
        assert_eq!(store.load_region().expect("load region"), RegionFilter::All);
    }

    #[test]
    fn events_persist_in_order() {
        let temp = tempdir().expect("tempdir");
        let store = LocalStore::open(temp.path()).expect("open store");
        let events = vec![
            sample("b", "2024-03-02", Region::Gauteng),
            sample("a", "2024-03-01", Region::Kzn),
        ];
        store.save_events(&events).expect("save events");
        assert_eq!(store.load_events().expect("load events"), events);
    }

    #[test]
    fn region_round_trips_and_bad_value_falls_back() {
        let temp = tempdir().expect("tempdir");
        let store = LocalStore::open(temp.path()).expect("open store");

        store
            .save_region(RegionFilter::Only(Region::Gauteng))
            .expect("save region");
        assert_eq!(
            store.load_region().expect("load region"),
            RegionFilter::Only(Region::Gauteng)
        );

        fs::write(&store.region_path, "Cape").expect("write junk");
        assert_eq!(store.load_region().expect("load region"), RegionFilter::All);
    }

    #[test]
    fn malformed_event_date_fails_load() {
        let temp = tempdir().expect("tempdir");
        let store = LocalStore::open(temp.path()).expect("open store");
        fs::write(
            &store.events_path,
            r#"[{"id":"x","club":"c","date":"03/01/2024","region":"KZN"}]"#,
        )
        .expect("write events");

        let err = store.load_events().expect_err("malformed date must fail");
        assert!(format!("{err:#}").contains("events.json"));
    }

    #[test]
    fn update_and_delete_by_id() {
        let temp = tempdir().expect("tempdir");
        let store = LocalStore::open(temp.path()).expect("open store");
        let first = sample("a", "2024-03-01", Region::Kzn);
        let second = sample("b", "2024-03-02", Region::Kzn);
        store.add_event(first.clone()).expect("add first");
        store.add_event(second.clone()).expect("add second");
        assert!(store.add_event(first.clone()).is_err());

        let mut changed = second.clone();
        changed.club = "renamed".to_string();
        store.update_event(&changed).expect("update");

        let removed = store.delete_event(&first.id).expect("delete");
        assert_eq!(removed.id, first.id);
        assert_eq!(store.load_events().expect("load"), vec![changed]);

        assert!(store.delete_event("missing").is_err());
        assert!(store.update_event(&first).is_err());
    }
}
