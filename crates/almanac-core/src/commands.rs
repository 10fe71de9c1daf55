use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, anyhow};
use chrono::{Datelike, NaiveDate, NaiveTime};
use tracing::{debug, info, instrument, warn};

use crate::calendar::{
    days_in_month, events_on_day, first_day_of_month, last_day_of_month, parse_date_expr,
    parse_wall_clock, week_dates, weeks_in_month,
};
use crate::cli::Invocation;
use crate::config::Config;
use crate::conflict::{
    DEFAULT_CONFLICT_HORIZON_DAYS, MAX_CONFLICT_HORIZON_DAYS, find_series_conflicts,
};
use crate::datastore::EventStore;
use crate::event::{Event, EventDraft, RepeatType};
use crate::filter::{CalendarView, filter_events};
use crate::notify::{Clock, DEFAULT_POLL_INTERVAL, NotificationPoller, NotificationSession};
use crate::recurrence::expand_events;
use crate::render::Renderer;

/// Placeholder id for an event that has not been stored yet.
const UNSAVED_ID: &str = "new";

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "add",
        "edit",
        "delete",
        "info",
        "list",
        "month",
        "week",
        "conflicts",
        "notify",
        "watch",
        "show",
        "help",
        "version",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(store, cfg, renderer, inv, clock), fields(command = %inv.command))]
pub fn dispatch<S, C>(
    store: &mut S,
    cfg: &Config,
    renderer: &mut Renderer,
    inv: Invocation,
    clock: C,
) -> anyhow::Result<()>
where
    S: EventStore,
    C: Clock,
{
    let today = clock.now().date();
    let command = inv.command.as_str();

    debug!(
        command,
        selectors = ?inv.selectors,
        args = ?inv.command_args,
        "dispatching command"
    );

    match command {
        "add" => cmd_add(store, cfg, renderer, &inv.command_args, today),
        "edit" => cmd_edit(store, cfg, renderer, &inv, today),
        "delete" => cmd_delete(store, &inv),
        "info" => cmd_info(store, renderer, &inv),
        "list" => cmd_list(store, cfg, renderer, &inv.command_args, today),
        "month" => cmd_month(store, renderer, &inv.command_args, today),
        "week" => cmd_week(store, renderer, &inv.command_args, today),
        "conflicts" => cmd_conflicts(store, cfg, renderer, &inv),
        "notify" => cmd_notify(store, renderer, &clock),
        "watch" => cmd_watch(store, cfg, renderer, &inv.command_args, clock),
        "show" => cmd_show(cfg),
        "help" => cmd_help(),
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

#[instrument(skip(store, cfg, renderer, args, today))]
fn cmd_add<S: EventStore>(
    store: &mut S,
    cfg: &Config,
    renderer: &mut Renderer,
    args: &[String],
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command add");

    let (words, mods) = parse_words_and_mods(args, today)?;
    let start = mods.iter().find_map(|one_mod| match one_mod {
        Mod::Start(time) => Some(*time),
        _ => None,
    });
    let end = mods.iter().find_map(|one_mod| match one_mod {
        Mod::End(time) => Some(*time),
        _ => None,
    });

    let mut draft = EventDraft::new(
        words.join(" "),
        today,
        start.ok_or_else(|| anyhow!("add: start:HH:MM is required"))?,
        end.ok_or_else(|| anyhow!("add: end:HH:MM is required"))?,
    );
    apply_mods(&mut draft, &mods);

    if draft.title.trim().is_empty() {
        return Err(anyhow!("add: title is required"));
    }

    let candidate = draft.clone().into_event(UNSAVED_ID.to_string());
    candidate.validate()?;

    let events = store.list()?;
    warn_about_conflicts(cfg, renderer, &candidate, &events)?;

    let event = store.create(draft)?;
    debug!(id = %event.id, "event added");
    println!("Created event {}.", event.id);
    Ok(())
}

#[instrument(skip(store, cfg, renderer, inv, today))]
fn cmd_edit<S: EventStore>(
    store: &mut S,
    cfg: &Config,
    renderer: &mut Renderer,
    inv: &Invocation,
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command edit");

    let (id, rest) = resolve_target(inv, "edit")?;
    let events = store.list()?;
    let current = events
        .iter()
        .find(|event| event.id == id)
        .ok_or_else(|| anyhow!("no event with id {id}"))?;

    let (words, mods) = parse_words_and_mods(rest, today)?;
    if words.is_empty() && mods.is_empty() {
        return Err(anyhow!("edit: nothing to change"));
    }

    let mut draft = current.to_draft();
    if !words.is_empty() {
        draft.title = words.join(" ");
    }
    apply_mods(&mut draft, &mods);

    let updated = draft.into_event(id.to_string());
    updated.validate()?;
    warn_about_conflicts(cfg, renderer, &updated, &events)?;

    match store.update(updated)? {
        Some(event) => {
            println!("Modified event {}.", event.id);
            Ok(())
        }
        None => Err(anyhow!("no event with id {id}")),
    }
}

#[instrument(skip(store, inv))]
fn cmd_delete<S: EventStore>(store: &mut S, inv: &Invocation) -> anyhow::Result<()> {
    info!("command delete");

    let (id, _) = resolve_target(inv, "delete")?;
    if !store.delete(id)? {
        return Err(anyhow!("no event with id {id}"));
    }

    println!("Deleted event {id}.");
    Ok(())
}

#[instrument(skip(store, renderer, inv))]
fn cmd_info<S: EventStore>(
    store: &mut S,
    renderer: &mut Renderer,
    inv: &Invocation,
) -> anyhow::Result<()> {
    info!("command info");

    let (id, _) = resolve_target(inv, "info")?;
    let events = store.list()?;
    let event = events
        .iter()
        .find(|event| event.id == id)
        .ok_or_else(|| anyhow!("no event with id {id}"))?;

    renderer.print_event_info(event)
}

#[instrument(skip(store, cfg, renderer, args, today))]
fn cmd_list<S: EventStore>(
    store: &mut S,
    cfg: &Config,
    renderer: &mut Renderer,
    args: &[String],
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command list");

    let mut view = match cfg.get("default.view") {
        Some(raw) => raw.parse::<CalendarView>().context("invalid default.view")?,
        None => CalendarView::default(),
    };
    let mut reference = today;
    let mut terms = Vec::new();

    for (idx, arg) in args.iter().enumerate() {
        if idx == 0
            && let Some(explicit) = CalendarView::from_key(arg)
        {
            view = explicit;
        } else if let Some(expr) = arg.strip_prefix("date:") {
            reference = parse_date_expr(expr, today)?;
        } else {
            terms.push(arg.as_str());
        }
    }

    let events = store.list()?;
    let search_term = terms.join(" ");
    let matched = filter_events(&events, &search_term, reference, view);

    debug!(%view, %reference, matched = matched.len(), "list filtered");
    if matched.is_empty() {
        println!("No matching events.");
        return Ok(());
    }

    renderer.print_event_table(&matched)
}

#[instrument(skip(store, renderer, args, today))]
fn cmd_month<S: EventStore>(
    store: &mut S,
    renderer: &mut Renderer,
    args: &[String],
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command month");

    let reference = reference_date(args, today)?;
    let events = store.list()?;
    let month_events = occurrences_as_events(
        &events,
        first_day_of_month(reference),
        last_day_of_month(reference),
    );

    let busy_days: Vec<u32> = (1..=days_in_month(reference.year(), reference.month() as i32))
        .filter(|day| !events_on_day(&month_events, *day as i32).is_empty())
        .collect();

    renderer.print_month_grid(reference, &weeks_in_month(reference), &busy_days)?;

    if !month_events.is_empty() {
        println!();
        let mut listed: Vec<&Event> = month_events.iter().collect();
        listed.sort_by_key(|event| event.starts_at());
        renderer.print_event_table(&listed)?;
    }
    Ok(())
}

#[instrument(skip(store, renderer, args, today))]
fn cmd_week<S: EventStore>(
    store: &mut S,
    renderer: &mut Renderer,
    args: &[String],
    today: NaiveDate,
) -> anyhow::Result<()> {
    info!("command week");

    let reference = reference_date(args, today)?;
    let dates = week_dates(reference);
    let events = store.list()?;
    let occurrences = expand_events(&events, dates[0], dates[6]);

    let days: Vec<(NaiveDate, Vec<&Event>)> = dates
        .iter()
        .map(|date| {
            let mut on_day: Vec<&Event> = occurrences
                .iter()
                .filter(|occurrence| occurrence.date == *date)
                .map(|occurrence| occurrence.event)
                .collect();
            on_day.sort_by_key(|event| event.start_time);
            (*date, on_day)
        })
        .collect();

    renderer.print_week(reference, &days)
}

#[instrument(skip(store, cfg, renderer, inv))]
fn cmd_conflicts<S: EventStore>(
    store: &mut S,
    cfg: &Config,
    renderer: &mut Renderer,
    inv: &Invocation,
) -> anyhow::Result<()> {
    info!("command conflicts");

    let (id, _) = resolve_target(inv, "conflicts")?;
    let events = store.list()?;
    let candidate = events
        .iter()
        .find(|event| event.id == id)
        .ok_or_else(|| anyhow!("no event with id {id}"))?;

    let conflicts = find_series_conflicts(candidate, &events, conflict_horizon(cfg)?);
    renderer.print_conflicts(candidate, &conflicts)
}

#[instrument(skip(store, renderer, clock))]
fn cmd_notify<S: EventStore, C: Clock>(
    store: &mut S,
    renderer: &mut Renderer,
    clock: &C,
) -> anyhow::Result<()> {
    info!("command notify");

    let events = store.list()?;
    let mut session = NotificationSession::new();
    let fired = session.poll(&events, clock.now());
    if fired.is_empty() {
        println!("No upcoming events.");
        return Ok(());
    }

    renderer.print_notifications(fired)
}

/// Polls until interrupted, or for `ticks:N` rounds when given.
#[instrument(skip(store, cfg, renderer, args, clock))]
fn cmd_watch<S: EventStore, C: Clock>(
    store: &mut S,
    cfg: &Config,
    renderer: &mut Renderer,
    args: &[String],
    clock: C,
) -> anyhow::Result<()> {
    info!("command watch");

    let mut remaining = None;
    for arg in args {
        let Some(raw) = arg.strip_prefix("ticks:") else {
            return Err(anyhow!("watch: unexpected argument {arg}"));
        };
        let ticks = raw
            .parse::<u64>()
            .with_context(|| format!("watch: invalid tick count {raw}"))?;
        remaining = Some(ticks);
    }

    let interval = match cfg.get_u64("notify.interval")? {
        Some(0) | None => DEFAULT_POLL_INTERVAL,
        Some(secs) => Duration::from_secs(secs),
    };
    let mut poller = NotificationPoller::new(clock, interval);
    info!(interval_secs = interval.as_secs(), "watching for upcoming events");

    loop {
        if remaining == Some(0) {
            return Ok(());
        }

        let events = store.list()?;
        let fired = poller.tick(&events);
        if !fired.is_empty() {
            renderer.print_notifications(&fired)?;
        }

        if let Some(left) = remaining.as_mut() {
            *left -= 1;
            if *left == 0 {
                return Ok(());
            }
        }
        std::thread::sleep(poller.interval());
    }
}

fn cmd_show(cfg: &Config) -> anyhow::Result<()> {
    let sorted: BTreeMap<&String, &String> = cfg.iter().collect();
    for (k, v) in sorted {
        println!("{k}={v}");
    }
    Ok(())
}

fn cmd_help() -> anyhow::Result<()> {
    println!(
        "Commands: add, edit, delete, info, list [week|month], month, week, conflicts, notify, watch, show, help, version"
    );
    println!(
        "Modifiers: date:<expr> start:HH:MM end:HH:MM desc: location: category: repeat: every: until: notify:"
    );
    Ok(())
}

fn conflict_horizon(cfg: &Config) -> anyhow::Result<i64> {
    let Some(days) = cfg.get_u64("conflict.horizon")? else {
        return Ok(DEFAULT_CONFLICT_HORIZON_DAYS);
    };

    i64::try_from(days)
        .ok()
        .filter(|days| *days <= MAX_CONFLICT_HORIZON_DAYS)
        .ok_or_else(|| {
            anyhow!("conflict.horizon must be at most {MAX_CONFLICT_HORIZON_DAYS} days, got {days}")
        })
}

/// Prints a warning table when `candidate` clashes with stored events.
/// The caller still saves; overlapping events are allowed.
fn warn_about_conflicts(
    cfg: &Config,
    renderer: &mut Renderer,
    candidate: &Event,
    events: &[Event],
) -> anyhow::Result<()> {
    let conflicts = find_series_conflicts(candidate, events, conflict_horizon(cfg)?);
    if conflicts.is_empty() {
        return Ok(());
    }

    warn!(
        id = %candidate.id,
        conflicts = conflicts.len(),
        "event overlaps existing events, saving anyway"
    );
    renderer.print_conflicts(candidate, &conflicts)
}

/// The event id named before the command, or else its first argument.
fn resolve_target<'a>(inv: &'a Invocation, command: &str) -> anyhow::Result<(&'a str, &'a [String])> {
    if let Some(id) = inv.selectors.first() {
        return Ok((id.as_str(), &inv.command_args));
    }

    match inv.command_args.split_first() {
        Some((id, rest)) => Ok((id.as_str(), rest)),
        None => Err(anyhow!("{command}: event id is required")),
    }
}

fn reference_date(args: &[String], today: NaiveDate) -> anyhow::Result<NaiveDate> {
    match args {
        [] => Ok(today),
        [one] => parse_date_expr(one.strip_prefix("date:").unwrap_or(one), today),
        _ => Err(anyhow!("expected at most one date, got: {}", args.join(" "))),
    }
}

/// Each occurrence in `[from, to]` as its own event dated on that day.
fn occurrences_as_events(events: &[Event], from: NaiveDate, to: NaiveDate) -> Vec<Event> {
    expand_events(events, from, to)
        .into_iter()
        .map(|occurrence| {
            let mut event = occurrence.event.clone();
            event.date = occurrence.date;
            event
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mod {
    Title(String),
    Date(NaiveDate),
    Start(NaiveTime),
    End(NaiveTime),
    Description(String),
    Location(String),
    Category(String),
    Repeat(RepeatType),
    Every(u32),
    Until(NaiveDate),
    Notify(u32),
}

#[instrument(skip(args, today))]
fn parse_words_and_mods(
    args: &[String],
    today: NaiveDate,
) -> anyhow::Result<(Vec<String>, Vec<Mod>)> {
    let mut words = Vec::new();
    let mut mods = Vec::new();

    let mut literal = false;
    for arg in args {
        if arg == "--" {
            literal = true;
            continue;
        }

        if !literal && let Some(one_mod) = parse_one_mod(arg, today)? {
            mods.push(one_mod);
            continue;
        }

        words.push(arg.clone());
    }

    Ok((words, mods))
}

fn parse_one_mod(tok: &str, today: NaiveDate) -> anyhow::Result<Option<Mod>> {
    let Some(split) = tok.find([':', '=']) else {
        return Ok(None);
    };
    let key = tok[..split].to_ascii_lowercase();
    let value = &tok[split + 1..];

    let parsed = match key.as_str() {
        "title" => Mod::Title(value.to_string()),
        "date" => Mod::Date(parse_date_expr(value, today)?),
        "start" => Mod::Start(parse_wall_clock(value)?),
        "end" => Mod::End(parse_wall_clock(value)?),
        "desc" | "description" => Mod::Description(value.to_string()),
        "loc" | "location" => Mod::Location(value.to_string()),
        "cat" | "category" => Mod::Category(value.to_string()),
        "repeat" => Mod::Repeat(
            RepeatType::from_key(value)
                .ok_or_else(|| anyhow!("unknown repeat type: {value}"))?,
        ),
        "every" => Mod::Every(
            value
                .parse()
                .with_context(|| format!("invalid repeat interval: {value}"))?,
        ),
        "until" => Mod::Until(parse_date_expr(value, today)?),
        "notify" => Mod::Notify(
            value
                .parse()
                .with_context(|| format!("invalid notification minutes: {value}"))?,
        ),
        _ => return Ok(None),
    };

    Ok(Some(parsed))
}

fn apply_mods(draft: &mut EventDraft, mods: &[Mod]) {
    for one_mod in mods {
        match one_mod {
            Mod::Title(title) => draft.title = title.clone(),
            Mod::Date(date) => draft.date = *date,
            Mod::Start(time) => draft.start_time = *time,
            Mod::End(time) => draft.end_time = *time,
            Mod::Description(text) => draft.description = text.clone(),
            Mod::Location(text) => draft.location = text.clone(),
            Mod::Category(text) => draft.category = text.clone(),
            Mod::Repeat(kind) => {
                draft.repeat.kind = *kind;
                if *kind == RepeatType::None {
                    draft.repeat.end_date = None;
                }
            }
            Mod::Every(interval) => draft.repeat.interval = (*interval).max(1),
            Mod::Until(date) => draft.repeat.end_date = Some(*date),
            Mod::Notify(minutes) => draft.notification_time = *minutes,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;
    use crate::datastore::MemoryEventStore;
    use crate::notify::FixedClock;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, 1).expect("valid date")
    }

    fn clock() -> FixedClock {
        FixedClock(
            NaiveDateTime::parse_from_str("2024-10-01T08:55:00", "%Y-%m-%dT%H:%M:%S")
                .expect("valid datetime"),
        )
    }

    fn strings(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|token| token.to_string()).collect()
    }

    fn invocation(selectors: &[&str], command: &str, args: &[&str]) -> Invocation {
        Invocation {
            selectors: strings(selectors),
            command: command.to_string(),
            command_args: strings(args),
        }
    }

    fn run(store: &mut MemoryEventStore, inv: Invocation) -> anyhow::Result<()> {
        run_with(store, &Config::defaults(), inv)
    }

    fn run_with(store: &mut MemoryEventStore, cfg: &Config, inv: Invocation) -> anyhow::Result<()> {
        let mut renderer = Renderer::new(cfg).expect("renderer");
        dispatch(store, cfg, &mut renderer, inv, clock())
    }

    #[test]
    fn command_abbreviations_must_be_unique() {
        let known = known_command_names();
        assert_eq!(expand_command_abbrev("con", &known), Some("conflicts"));
        assert_eq!(expand_command_abbrev("li", &known), Some("list"));
        assert_eq!(expand_command_abbrev("w", &known), None);
        assert_eq!(expand_command_abbrev("week", &known), Some("week"));
    }

    #[test]
    fn modifiers_parse_and_unknown_keys_stay_words() {
        let (words, mods) = parse_words_and_mods(
            &strings(&[
                "Team",
                "sync",
                "date:tomorrow",
                "start:09:30",
                "end=10:00",
                "repeat:weekly",
                "every:2",
                "see:notes",
                "--",
                "notify:5",
            ]),
            today(),
        )
        .expect("parse");

        assert_eq!(words, strings(&["Team", "sync", "see:notes", "notify:5"]));
        assert_eq!(
            mods,
            vec![
                Mod::Date(NaiveDate::from_ymd_opt(2024, 10, 2).expect("valid date")),
                Mod::Start(NaiveTime::from_hms_opt(9, 30, 0).expect("valid time")),
                Mod::End(NaiveTime::from_hms_opt(10, 0, 0).expect("valid time")),
                Mod::Repeat(RepeatType::Weekly),
                Mod::Every(2),
            ]
        );
    }

    #[test]
    fn bad_modifier_values_are_errors() {
        assert!(parse_one_mod("start:25:00", today()).is_err());
        assert!(parse_one_mod("repeat:hourly", today()).is_err());
        assert!(parse_one_mod("every:-1", today()).is_err());
    }

    #[test]
    fn add_requires_times_and_title() {
        let mut store = MemoryEventStore::new();
        assert!(run(&mut store, invocation(&[], "add", &["Lunch", "start:12:00"])).is_err());
        assert!(run(&mut store, invocation(&[], "add", &["start:12:00", "end:13:00"])).is_err());
        assert!(run(&mut store, invocation(&[], "add", &["Late", "start:13:00", "end:12:00"])).is_err());
        assert!(store.list().expect("list").is_empty());
    }

    #[test]
    fn add_saves_even_when_conflicting() {
        let mut store = MemoryEventStore::new();
        run(
            &mut store,
            invocation(&[], "add", &["Standup", "start:09:00", "end:09:30", "loc:Room A"]),
        )
        .expect("first add");
        run(
            &mut store,
            invocation(&[], "add", &["Review", "start:09:15", "end:10:00", "notify:5"]),
        )
        .expect("second add");

        let events = store.list().expect("list");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].date, today());
        assert_eq!(events[0].location, "Room A");
        assert_eq!(events[1].id, "2");
        assert_eq!(events[1].notification_time, 5);
    }

    #[test]
    fn oversized_inputs_are_errors() {
        let mut store = MemoryEventStore::new();
        let err = run(
            &mut store,
            invocation(&[], "add", &["x", "date:+99999999999999d", "start:09:00", "end:10:00"]),
        )
        .expect_err("date offset out of range");
        assert!(format!("{err:#}").contains("out of range"));

        let mut cfg = Config::defaults();
        cfg.apply_overrides(vec![(
            "conflict.horizon".to_string(),
            "9999999999999".to_string(),
        )]);
        let add = invocation(&[], "add", &["x", "start:09:00", "end:10:00"]);
        let err = run_with(&mut store, &cfg, add).expect_err("horizon too large");
        assert!(err.to_string().contains("conflict.horizon"));
        assert!(store.list().expect("list").is_empty());

        cfg.apply_overrides(vec![(
            "conflict.horizon".to_string(),
            MAX_CONFLICT_HORIZON_DAYS.to_string(),
        )]);
        let add = invocation(&[], "add", &["x", "start:09:00", "end:10:00"]);
        run_with(&mut store, &cfg, add).expect("horizon at the cap");
    }

    #[test]
    fn edit_and_delete_by_id() {
        let mut store = MemoryEventStore::new();
        run(
            &mut store,
            invocation(&[], "add", &["Standup", "start:09:00", "end:09:30"]),
        )
        .expect("add");

        run(
            &mut store,
            invocation(&["1"], "edit", &["Daily", "standup", "repeat:daily", "until:+7d"]),
        )
        .expect("edit");
        let edited = store.list().expect("list").remove(0);
        assert_eq!(edited.title, "Daily standup");
        assert_eq!(edited.repeat.kind, RepeatType::Daily);
        assert_eq!(
            edited.repeat.end_date,
            NaiveDate::from_ymd_opt(2024, 10, 8)
        );

        assert!(run(&mut store, invocation(&[], "edit", &["9", "title:x"])).is_err());
        assert!(run(&mut store, invocation(&[], "delete", &["9"])).is_err());
        run(&mut store, invocation(&[], "delete", &["1"])).expect("delete");
        assert!(store.list().expect("list").is_empty());
    }

    #[test]
    fn views_and_notify_run_against_store() {
        let mut store = MemoryEventStore::new();
        run(
            &mut store,
            invocation(&[], "add", &["Standup", "start:09:00", "end:09:30", "repeat:weekly"]),
        )
        .expect("add");

        run(&mut store, invocation(&[], "list", &["week", "standup"])).expect("list");
        run(&mut store, invocation(&[], "month", &["date:+1m"])).expect("month");
        run(&mut store, invocation(&[], "week", &[])).expect("week");
        run(&mut store, invocation(&["1"], "conflicts", &[])).expect("conflicts");
        run(&mut store, invocation(&["1"], "info", &[])).expect("info");
        assert!(run(&mut store, invocation(&["2"], "info", &[])).is_err());
        run(&mut store, invocation(&[], "notify", &[])).expect("notify");
        run(&mut store, invocation(&[], "watch", &["ticks:1"])).expect("watch");
        assert!(run(&mut store, invocation(&[], "week", &["soon"])).is_err());
    }

    #[test]
    fn occurrences_carry_their_own_date() {
        let mut event = EventDraft::new(
            "gym".to_string(),
            today(),
            NaiveTime::from_hms_opt(7, 0, 0).expect("valid time"),
            NaiveTime::from_hms_opt(8, 0, 0).expect("valid time"),
        );
        event.repeat.kind = RepeatType::Weekly;
        let events = vec![event.into_event("1".to_string())];

        let month = occurrences_as_events(
            &events,
            today(),
            NaiveDate::from_ymd_opt(2024, 10, 31).expect("valid date"),
        );
        let days: Vec<u32> = month.iter().map(|event| event.date.day()).collect();
        assert_eq!(days, vec![1, 8, 15, 22, 29]);
    }
}
