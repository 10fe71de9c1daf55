use std::time::Duration;

use chrono::{Local, NaiveDateTime, TimeDelta};
use serde::Serialize;
use tracing::{debug, instrument, trace};

use crate::event::Event;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// A notification waiting to be shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: String,
    pub message: String,
}

impl Notification {
    pub fn for_event(event: &Event) -> Self {
        Self {
            id: event.id.clone(),
            message: notification_message(event),
        }
    }
}

pub fn notification_message(event: &Event) -> String {
    format!(
        "{}분 후 {} 일정이 시작됩니다.",
        event.notification_time, event.title
    )
}

/// Whether `now` lies in `[start - notificationTime, start]`.
pub fn is_within_notice_window(event: &Event, now: NaiveDateTime) -> bool {
    let until_start = event.starts_at() - now;
    let notice = TimeDelta::minutes(i64::from(event.notification_time));
    until_start >= TimeDelta::zero() && until_start <= notice
}

/// Events whose notice window contains `now` and that have not fired yet.
#[instrument(skip(events, notified), fields(count = events.len(), notified = notified.len()))]
pub fn upcoming_events<'a>(
    events: &'a [Event],
    now: NaiveDateTime,
    notified: &[String],
) -> Vec<&'a Event> {
    events
        .iter()
        .filter(|event| !notified.contains(&event.id))
        .filter(|event| is_within_notice_window(event, now))
        .collect()
}

/// Caller-owned notification state for one session.
#[derive(Debug, Clone, Default)]
pub struct NotificationSession {
    notifications: Vec<Notification>,
    notified_events: Vec<String>,
}

impl NotificationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn notified_events(&self) -> &[String] {
        &self.notified_events
    }

    /// Runs one polling step and returns the notifications it appended.
    #[instrument(skip(self, events), fields(count = events.len()))]
    pub fn poll(&mut self, events: &[Event], now: NaiveDateTime) -> &[Notification] {
        let first_new = self.notifications.len();

        for event in upcoming_events(events, now, &self.notified_events) {
            // duplicate ids inside one snapshot fire once
            if self.notified_events.contains(&event.id) {
                continue;
            }
            debug!(id = %event.id, starts_at = %event.starts_at(), "notification fired");
            self.notified_events.push(event.id.clone());
            self.notifications.push(Notification::for_event(event));
        }

        trace!(
            fired = self.notifications.len() - first_new,
            pending = self.notifications.len(),
            "poll finished"
        );
        &self.notifications[first_new..]
    }

    /// Dismisses the notification at `index`. The event stays in the
    /// notified set so it does not fire again. Out of range is a no-op.
    pub fn remove_notification(&mut self, index: usize) -> Option<Notification> {
        if index < self.notifications.len() {
            Some(self.notifications.remove(index))
        } else {
            debug!(
                index,
                len = self.notifications.len(),
                "dismiss index out of range"
            );
            None
        }
    }

    pub fn reset(&mut self) {
        self.notifications.clear();
        self.notified_events.clear();
    }
}

/// Source of the current wall-clock instant.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// A session driven on a fixed cadence. The host calls [`tick`] once per
/// interval; each tick runs to completion before the next one starts.
///
/// [`tick`]: NotificationPoller::tick
#[derive(Debug)]
pub struct NotificationPoller<C: Clock> {
    clock: C,
    interval: Duration,
    session: NotificationSession,
}

impl<C: Clock> NotificationPoller<C> {
    pub fn new(clock: C, interval: Duration) -> Self {
        Self {
            clock,
            interval,
            session: NotificationSession::new(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn session(&self) -> &NotificationSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut NotificationSession {
        &mut self.session
    }

    pub fn tick(&mut self, events: &[Event]) -> Vec<Notification> {
        let now = self.clock.now();
        self.session.poll(events, now).to_vec()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;
    use crate::event::EventDraft;

    fn at(raw: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").expect("valid datetime")
    }

    fn meeting(id: &str, title: &str, date: &str, start: &str, notice: u32) -> Event {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("valid date");
        let start = crate::calendar::parse_wall_clock(start).expect("valid time");
        let mut draft = EventDraft::new(
            title.to_string(),
            date,
            start,
            NaiveTime::from_hms_opt(23, 0, 0).expect("valid time"),
        );
        draft.notification_time = notice;
        draft.into_event(id.to_string())
    }

    fn ids(events: &[&Event]) -> Vec<String> {
        events.iter().map(|event| event.id.clone()).collect()
    }

    #[test]
    fn fires_inside_window_with_second_precision() {
        let events = vec![
            meeting("1", "event 1", "2024-06-29", "09:00", 1),
            meeting("2", "event 2", "2024-07-03", "10:00", 1),
            meeting("6", "이벤트 6", "2024-06-30", "09:00:30", 1),
        ];

        let result = upcoming_events(&events, at("2024-06-30T09:00:00"), &[]);
        assert_eq!(ids(&result), vec!["6"]);
    }

    #[test]
    fn skips_already_notified() {
        let events = vec![
            meeting("6", "이벤트 6", "2024-06-30", "09:00:30", 1),
            meeting("7", "이벤트 7", "2024-06-30", "09:00:30", 1),
        ];

        let result = upcoming_events(&events, at("2024-06-30T09:00:00"), &["6".to_string()]);
        assert_eq!(ids(&result), vec!["7"]);
    }

    #[test]
    fn window_not_yet_open() {
        let events = vec![meeting("1", "이벤트 1", "2024-06-30", "09:01:01", 1)];
        assert!(upcoming_events(&events, at("2024-06-30T09:00:00"), &[]).is_empty());
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let events = vec![meeting("1", "team", "2024-10-01", "10:00", 10)];

        assert_eq!(upcoming_events(&events, at("2024-10-01T09:50:00"), &[]).len(), 1);
        assert_eq!(upcoming_events(&events, at("2024-10-01T10:00:00"), &[]).len(), 1);
        assert!(upcoming_events(&events, at("2024-10-01T09:49:00"), &[]).is_empty());
        assert!(upcoming_events(&events, at("2024-10-01T10:00:01"), &[]).is_empty());
    }

    #[test]
    fn message_format() {
        let event = meeting("1", "event 1", "2024-06-29", "09:30", 1);
        assert_eq!(notification_message(&event), "1분 후 event 1 일정이 시작됩니다.");
    }

    #[test]
    fn session_starts_empty_and_records_fired_events() {
        let events = vec![meeting("1", "기존 회의", "2024-10-01", "00:10", 10)];
        let mut session = NotificationSession::new();

        assert!(session.poll(&events, at("2024-09-30T23:00:00")).is_empty());
        assert!(session.notifications().is_empty());

        let fired = session.poll(&events, at("2024-10-01T00:00:00")).to_vec();
        assert_eq!(
            fired,
            vec![Notification {
                id: "1".to_string(),
                message: "10분 후 기존 회의 일정이 시작됩니다.".to_string(),
            }]
        );
        assert_eq!(session.notified_events(), ["1".to_string()]);
    }

    #[test]
    fn never_fires_twice() {
        let events = vec![meeting("3", "회의 1", "2024-10-01", "00:11", 10)];
        let mut session = NotificationSession::new();

        session.poll(&events, at("2024-10-01T00:01:00"));
        session.poll(&events, at("2024-10-01T00:02:00"));
        session.poll(&events, at("2024-10-01T00:11:00"));

        assert_eq!(session.notifications().len(), 1);
        assert_eq!(session.notified_events(), ["3".to_string()]);
    }

    #[test]
    fn dismiss_keeps_notified_set() {
        let events = vec![
            meeting("3", "회의 1", "2024-10-01", "00:11", 10),
            meeting("4", "회의 2", "2024-10-01", "00:12", 10),
        ];
        let mut session = NotificationSession::new();

        session.poll(&events, at("2024-10-01T00:01:00"));
        session.poll(&events, at("2024-10-01T00:02:00"));
        assert_eq!(session.notifications().len(), 2);
        assert_eq!(session.notified_events(), ["3".to_string(), "4".to_string()]);

        let removed = session.remove_notification(0).expect("notification at index 0");
        assert_eq!(removed.id, "3");
        assert_eq!(session.notifications().len(), 1);
        assert_eq!(session.notifications()[0].id, "4");
        assert_eq!(session.notified_events(), ["3".to_string(), "4".to_string()]);

        assert!(session.poll(&events, at("2024-10-01T00:03:00")).is_empty());
    }

    #[test]
    fn dismiss_out_of_range_is_noop() {
        let events = vec![meeting("1", "a", "2024-10-01", "00:10", 10)];
        let mut session = NotificationSession::new();
        session.poll(&events, at("2024-10-01T00:05:00"));

        assert!(session.remove_notification(5).is_none());
        assert_eq!(session.notifications().len(), 1);
    }

    #[test]
    fn lapsed_events_are_skipped() {
        let events = vec![meeting("1", "a", "2024-10-01", "00:10", 10)];
        let mut session = NotificationSession::new();

        assert!(session.poll(&events, at("2024-10-01T00:15:00")).is_empty());
        assert!(session.notified_events().is_empty());
    }

    #[test]
    fn duplicate_ids_in_snapshot_fire_once() {
        let events = vec![
            meeting("1", "a", "2024-10-01", "00:10", 10),
            meeting("1", "a", "2024-10-01", "00:10", 10),
        ];
        let mut session = NotificationSession::new();

        assert_eq!(session.poll(&events, at("2024-10-01T00:05:00")).len(), 1);
    }

    #[test]
    fn reset_allows_refiring() {
        let events = vec![meeting("1", "a", "2024-10-01", "00:10", 10)];
        let mut session = NotificationSession::new();
        session.poll(&events, at("2024-10-01T00:05:00"));

        session.reset();
        assert!(session.notifications().is_empty());
        assert_eq!(session.poll(&events, at("2024-10-01T00:06:00")).len(), 1);
    }

    #[test]
    fn poller_uses_its_clock() {
        let events = vec![meeting("1", "a", "2024-10-01", "00:10", 10)];
        let mut poller = NotificationPoller::new(
            FixedClock(at("2024-09-30T12:00:00")),
            DEFAULT_POLL_INTERVAL,
        );

        assert!(poller.tick(&events).is_empty());

        *poller.clock_mut() = FixedClock(at("2024-10-01T00:00:00"));
        let fired = poller.tick(&events);
        assert_eq!(fired.len(), 1);
        assert_eq!(poller.session().notified_events(), ["1".to_string()]);
        assert_eq!(poller.interval(), Duration::from_secs(1));
    }
}
