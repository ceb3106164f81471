use std::cmp::Reverse;

use crate::event::Event;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditableEvent {
    pub event: Event,
    pub can_edit: bool,
}

/// Only the owner may edit. Without a signed-in user nothing is editable,
/// including legacy events that carry no owner.
pub fn can_edit(event: &Event, current_user: Option<&str>) -> bool {
    match current_user {
        Some(user) => event.is_owned_by(user),
        None => false,
    }
}

pub fn can_create(current_user: Option<&str>) -> bool {
    current_user.is_some()
}

pub fn decorate(events: &[Event], current_user: Option<&str>) -> Vec<EditableEvent> {
    events
        .iter()
        .map(|event| EditableEvent {
            event: event.clone(),
            can_edit: can_edit(event, current_user),
        })
        .collect()
}

/// The "my events" listing: the user's own events, latest date first.
pub fn editable_events(events: &[Event], current_user: Option<&str>) -> Vec<Event> {
    let Some(user) = current_user else {
        return Vec::new();
    };

    let mut mine: Vec<Event> = events
        .iter()
        .filter(|event| event.is_owned_by(user))
        .cloned()
        .collect();
    mine.sort_by_key(|event| Reverse(event.date));
    mine
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datetime::DateKey;
    use crate::event::Region;

    fn event(date: &str, owner: Option<&str>) -> Event {
        let mut event = Event::new(
            format!("club {date}"),
            DateKey::parse(date).expect("valid key"),
            Region::Kzn,
        );
        event.owner_id = owner.map(str::to_string);
        event
    }

    #[test]
    fn nobody_signed_in_means_nothing_editable() {
        let events = vec![event("2024-03-01", Some("u1")), event("2024-03-02", None)];
        let decorated = decorate(&events, None);
        assert_eq!(decorated.len(), 2);
        assert!(decorated.iter().all(|entry| !entry.can_edit));
        assert!(!can_create(None));
        assert!(editable_events(&events, None).is_empty());
    }

    #[test]
    fn only_owner_can_edit() {
        let events = vec![
            event("2024-03-01", Some("u1")),
            event("2024-03-02", Some("u2")),
            event("2024-03-03", None),
        ];
        let flags: Vec<bool> = decorate(&events, Some("u1"))
            .into_iter()
            .map(|entry| entry.can_edit)
            .collect();
        assert_eq!(flags, vec![true, false, false]);
        assert!(can_create(Some("u1")));
    }

    #[test]
    fn my_events_sorted_latest_first() {
        let events = vec![
            event("2024-01-15", Some("u1")),
            event("2024-06-01", Some("u2")),
            event("2024-05-20", Some("u1")),
            event("2023-12-31", Some("u1")),
        ];
        let dates: Vec<String> = editable_events(&events, Some("u1"))
            .iter()
            .map(|event| event.date.to_string())
            .collect();
        assert_eq!(dates, vec!["2024-05-20", "2024-01-15", "2023-12-31"]);
    }
}
