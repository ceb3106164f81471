use anyhow::{anyhow, bail};
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, instrument};

use crate::calendar::{CalendarQuery, build_snapshot, events_on_date};
use crate::cli::{AddArgs, Command, EditArgs, ShowArgs};
use crate::config::CalendarConfig;
use crate::datastore::EventStore;
use crate::datetime::DateKey;
use crate::event::{Event, EventDraft, EventPatch};
use crate::navigation::{Direction, Navigator};
use crate::permissions::{can_create, can_edit, decorate, editable_events};
use crate::render::Renderer;

/// Per-invocation inputs shared by every command.
#[derive(Debug, Clone)]
pub struct Session<'a> {
    pub user: Option<&'a str>,
    pub today: NaiveDate,
    pub now: DateTime<Utc>,
}

pub fn dispatch<S: EventStore>(
    store: &S,
    cfg: &CalendarConfig,
    renderer: &mut Renderer,
    session: &Session<'_>,
    command: Command,
) -> anyhow::Result<()> {
    debug!(?command, user = ?session.user, "dispatching command");

    match command {
        Command::Show(args) => cmd_show(store, cfg, renderer, session, args),
        Command::Add(args) => cmd_add(store, session, args).map(|event| {
            println!("Created event {} on {}", event.id, event.date);
        }),
        Command::Edit(args) => cmd_edit(store, session, args).map(|event| {
            println!("Updated event {}", event.id);
        }),
        Command::Delete { id } => cmd_delete(store, session, &id).map(|event| {
            println!("Deleted event {} ({})", event.id, event.club);
        }),
        Command::Mine => {
            let user = require_user(session)?;
            let events = store.load_events()?;
            let mine = editable_events(&events, Some(user));
            renderer.print_events(&decorate(&mine, Some(user)))
        }
        Command::Day { date } => {
            let events = store.load_events()?;
            let region = store.load_region()?;
            let on_date = events_on_date(&events, region, &date);
            println!("Events on {date} ({region})");
            renderer.print_events(&decorate(&on_date, session.user))
        }
    }
}

/// Builds the navigator the `show` arguments describe.
pub fn navigator_for(cfg: &CalendarConfig, args: &ShowArgs, today: NaiveDate) -> Navigator {
    let cursor = args.date.map(|key| key.date()).unwrap_or(today);
    let mut nav = Navigator::new(cursor, args.view.unwrap_or(cfg.default_view));

    nav.step(Direction::Prev, u32::from(args.prev));
    nav.step(Direction::Next, u32::from(args.next));
    if args.today {
        nav.go_to_today(today);
    }
    if let Some(key) = args.select {
        nav.select(key);
    }
    nav
}

#[instrument(skip(store, cfg, renderer, session))]
fn cmd_show<S: EventStore>(
    store: &S,
    cfg: &CalendarConfig,
    renderer: &mut Renderer,
    session: &Session<'_>,
    args: ShowArgs,
) -> anyhow::Result<()> {
    let region = match args.region {
        Some(region) => {
            store.save_region(region)?;
            region
        }
        None => store.load_region()?,
    };

    let events = store.load_events()?;
    let nav = navigator_for(cfg, &args, session.today);
    let query = CalendarQuery::from_navigator(&nav, region, session.today, cfg);
    let snapshot = build_snapshot(&events, &query);
    renderer.print_snapshot(&snapshot)?;

    if let Some(selected) = nav.selected() {
        println!();
        println!("Events on {selected}");
        renderer.print_events(&decorate(&snapshot.selected_events, session.user))?;
    }
    Ok(())
}

#[instrument(skip(store, session))]
fn cmd_add<S: EventStore>(store: &S, session: &Session<'_>, args: AddArgs) -> anyhow::Result<Event> {
    if !can_create(session.user) {
        bail!("sign in with --user to create events");
    }

    let draft = EventDraft {
        club: args.club,
        date: args.date,
        region: args.region,
        owner_id: session.user.map(str::to_string),
    };
    let event = draft.into_event(session.now)?;
    store.add_event(event.clone())?;

    info!(id = %event.id, date = %event.date, "created event");
    Ok(event)
}

#[instrument(skip(store, session))]
fn cmd_edit<S: EventStore>(store: &S, session: &Session<'_>, args: EditArgs) -> anyhow::Result<Event> {
    let patch = EventPatch {
        club: args.club,
        date: args.date,
        region: args.region,
    };
    if patch.is_empty() {
        bail!("nothing to change: pass --club, --date or --region");
    }

    let mut event = find_editable(store, session, &args.id)?;
    event.apply(patch, session.now)?;
    store.update_event(&event)?;

    info!(id = %event.id, "updated event");
    Ok(event)
}

#[instrument(skip(store, session))]
fn cmd_delete<S: EventStore>(store: &S, session: &Session<'_>, id: &str) -> anyhow::Result<Event> {
    find_editable(store, session, id)?;
    let removed = store.delete_event(id)?;

    info!(id = %removed.id, "deleted event");
    Ok(removed)
}

fn find_editable<S: EventStore>(store: &S, session: &Session<'_>, id: &str) -> anyhow::Result<Event> {
    let user = require_user(session)?;
    let event = store
        .load_events()?
        .into_iter()
        .find(|event| event.id == id)
        .ok_or_else(|| anyhow!("event not found: {id}"))?;

    if !can_edit(&event, Some(user)) {
        bail!("event {id} belongs to another user");
    }
    Ok(event)
}

fn require_user<'a>(session: &Session<'a>) -> anyhow::Result<&'a str> {
    session
        .user
        .ok_or_else(|| anyhow!("this command needs --user"))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use tempfile::tempdir;

    use super::*;
    use crate::datastore::LocalStore;
    use crate::event::{Region, RegionFilter};
    use crate::grid::ViewMode;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn session(user: Option<&str>) -> Session<'_> {
        Session {
            user,
            today: ymd(2024, 3, 20),
            now: Utc.with_ymd_and_hms(2024, 3, 20, 8, 0, 0).single().expect("valid now"),
        }
    }

    fn add_args(club: &str, date: &str) -> AddArgs {
        AddArgs {
            club: club.to_string(),
            date: DateKey::parse(date).expect("valid key"),
            region: Region::Kzn,
        }
    }

    #[test]
    fn navigator_applies_steps_then_today() {
        let cfg = CalendarConfig::default();
        let args = ShowArgs {
            view: Some(ViewMode::Month),
            date: Some(DateKey::parse("2024-01-31").expect("valid key")),
            next: 1,
            ..ShowArgs::default()
        };
        let nav = navigator_for(&cfg, &args, ymd(2024, 3, 20));
        assert_eq!(nav.cursor(), ymd(2024, 2, 29));

        let args = ShowArgs {
            today: true,
            prev: 3,
            ..ShowArgs::default()
        };
        let nav = navigator_for(&cfg, &args, ymd(2024, 3, 20));
        assert_eq!(nav.cursor(), ymd(2024, 3, 20));
        assert_eq!(nav.view(), ViewMode::Month);
    }

    #[test]
    fn add_requires_user() {
        let temp = tempdir().expect("tempdir");
        let store = LocalStore::open(temp.path()).expect("open store");
        assert!(cmd_add(&store, &session(None), add_args("A", "2024-03-01")).is_err());
        assert!(store.load_events().expect("load").is_empty());
    }

    #[test]
    fn owner_can_edit_and_delete_but_others_cannot() {
        let temp = tempdir().expect("tempdir");
        let store = LocalStore::open(temp.path()).expect("open store");
        let created = cmd_add(&store, &session(Some("u1")), add_args(" A ", "2024-03-01"))
            .expect("create event");
        assert_eq!(created.club, "A");
        assert_eq!(created.owner_id.as_deref(), Some("u1"));

        let edit = EditArgs {
            id: created.id.clone(),
            club: Some("B".to_string()),
            date: None,
            region: None,
        };
        assert!(cmd_edit(&store, &session(Some("u2")), edit.clone()).is_err());
        assert!(cmd_edit(&store, &session(None), edit.clone()).is_err());
        let edited = cmd_edit(&store, &session(Some("u1")), edit).expect("owner edit");
        assert_eq!(edited.club, "B");
        assert_eq!(edited.id, created.id);

        assert!(cmd_delete(&store, &session(Some("u2")), &created.id).is_err());
        cmd_delete(&store, &session(Some("u1")), &created.id).expect("owner delete");
        assert!(store.load_events().expect("load").is_empty());
    }

    #[test]
    fn show_saves_requested_region() {
        let temp = tempdir().expect("tempdir");
        let store = LocalStore::open(temp.path()).expect("open store");
        let cfg = CalendarConfig::default();
        let mut renderer = Renderer::plain();
        let args = ShowArgs {
            region: Some(RegionFilter::Only(Region::Gauteng)),
            ..ShowArgs::default()
        };
        dispatch(&store, &cfg, &mut renderer, &session(None), Command::Show(args))
            .expect("show");
        assert_eq!(
            store.load_region().expect("load region"),
            RegionFilter::Only(Region::Gauteng)
        );
    }
}
