use std::collections::BTreeMap;

use tracing::debug;

use crate::datetime::DateKey;
use crate::event::Event;

/// Events bucketed by their own date key.
///
/// Buckets keep source order. Nothing is deduplicated: two events that share
/// an id both land in their bucket.
#[derive(Debug, Clone, Default)]
pub struct EventIndex {
    buckets: BTreeMap<DateKey, Vec<Event>>,
    total: usize,
}

impl EventIndex {
    #[tracing::instrument(skip_all, fields(events = events.len()))]
    pub fn build(events: &[Event]) -> Self {
        let mut buckets: BTreeMap<DateKey, Vec<Event>> = BTreeMap::new();
        for event in events {
            buckets.entry(event.date).or_default().push(event.clone());
        }

        debug!(dates = buckets.len(), "built event index");
        Self {
            buckets,
            total: events.len(),
        }
    }

    pub fn events_on(&self, key: &DateKey) -> &[Event] {
        self.buckets.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn dates(&self) -> impl Iterator<Item = &DateKey> {
        self.buckets.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DateKey, &[Event])> {
        self.buckets.iter().map(|(key, events)| (key, events.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Region;

    fn event(id: &str, date: &str, region: Region) -> Event {
        let mut event = Event::new(
            format!("club {id}"),
            DateKey::parse(date).expect("valid key"),
            region,
        );
        event.id = id.to_string();
        event
    }

    #[test]
    fn every_event_lands_in_exactly_one_bucket() {
        let events = vec![
            event("a", "2024-03-01", Region::Kzn),
            event("b", "2024-03-02", Region::Gauteng),
            event("c", "2024-03-01", Region::Gauteng),
            event("d", "2024-04-15", Region::Kzn),
        ];
        let index = EventIndex::build(&events);

        assert_eq!(index.len(), 4);
        assert_eq!(index.dates().count(), 3);

        let mut seen: Vec<String> = Vec::new();
        for (key, bucket) in index.iter() {
            for event in bucket {
                assert_eq!(&event.date, key);
                seen.push(event.id.clone());
            }
        }
        seen.sort();
        assert_eq!(seen, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn bucket_keeps_source_order() {
        let events = vec![
            event("z", "2024-03-01", Region::Gauteng),
            event("a", "2024-03-01", Region::Kzn),
            event("m", "2024-03-01", Region::Gauteng),
        ];
        let index = EventIndex::build(&events);
        let key = DateKey::parse("2024-03-01").expect("valid key");
        let ids: Vec<&str> = index.events_on(&key).iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[test]
    fn duplicate_ids_are_not_collapsed() {
        let events = vec![
            event("dup", "2024-03-01", Region::Kzn),
            event("dup", "2024-03-01", Region::Kzn),
        ];
        let index = EventIndex::build(&events);
        let key = DateKey::parse("2024-03-01").expect("valid key");
        assert_eq!(index.events_on(&key).len(), 2);
    }

    #[test]
    fn missing_date_is_an_empty_slice() {
        let index = EventIndex::build(&[]);
        let key = DateKey::parse("2024-03-01").expect("valid key");
        assert!(index.events_on(&key).is_empty());
        assert!(index.is_empty());
    }
}
