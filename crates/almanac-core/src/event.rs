use anyhow::anyhow;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::calendar::{event_date_serde, wall_clock_serde};

pub const DEFAULT_NOTIFICATION_MINUTES: u32 = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RepeatType {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RepeatType {
    pub fn as_key(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    pub fn from_key(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            "yearly" => Some(Self::Yearly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RepeatInfo {
    #[serde(rename = "type")]
    pub kind: RepeatType,

    pub interval: u32,

    /// Last date a series may land on, inclusive.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "event_date_serde::option"
    )]
    pub end_date: Option<NaiveDate>,
}

impl Default for RepeatInfo {
    fn default() -> Self {
        Self {
            kind: RepeatType::None,
            interval: 1,
            end_date: None,
        }
    }
}

impl RepeatInfo {
    pub fn is_recurring(&self) -> bool {
        self.kind != RepeatType::None
    }
}

/// An event as submitted to the persistence layer, before it has an id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EventDraft {
    pub title: String,

    #[serde(with = "event_date_serde")]
    pub date: NaiveDate,

    #[serde(with = "wall_clock_serde")]
    pub start_time: NaiveTime,

    #[serde(with = "wall_clock_serde")]
    pub end_time: NaiveTime,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub location: String,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub repeat: RepeatInfo,

    #[serde(default = "default_notification_minutes")]
    pub notification_time: u32,
}

fn default_notification_minutes() -> u32 {
    DEFAULT_NOTIFICATION_MINUTES
}

impl EventDraft {
    pub fn new(title: String, date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            title,
            date,
            start_time,
            end_time,
            description: String::new(),
            location: String::new(),
            category: String::new(),
            repeat: RepeatInfo::default(),
            notification_time: DEFAULT_NOTIFICATION_MINUTES,
        }
    }

    pub fn into_event(self, id: String) -> Event {
        Event {
            id,
            title: self.title,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            description: self.description,
            location: self.location,
            category: self.category,
            repeat: self.repeat,
            notification_time: self.notification_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Event {
    pub id: String,

    pub title: String,

    #[serde(with = "event_date_serde")]
    pub date: NaiveDate,

    #[serde(with = "wall_clock_serde")]
    pub start_time: NaiveTime,

    #[serde(with = "wall_clock_serde")]
    pub end_time: NaiveTime,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub location: String,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub repeat: RepeatInfo,

    #[serde(default = "default_notification_minutes")]
    pub notification_time: u32,
}

impl Event {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }

    pub fn ends_at(&self) -> NaiveDateTime {
        self.date.and_time(self.end_time)
    }

    pub fn is_recurring(&self) -> bool {
        self.repeat.is_recurring()
    }

    pub fn to_draft(&self) -> EventDraft {
        EventDraft {
            title: self.title.clone(),
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            description: self.description.clone(),
            location: self.location.clone(),
            category: self.category.clone(),
            repeat: self.repeat.clone(),
            notification_time: self.notification_time,
        }
    }

    /// Checks the invariants the scheduling engine expects but does not enforce.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.start_time > self.end_time {
            return Err(anyhow!(
                "event {}: start time {} is after end time {}",
                self.id,
                self.start_time.format("%H:%M"),
                self.end_time.format("%H:%M")
            ));
        }
        if let Some(end_date) = self.repeat.end_date
            && end_date < self.date
        {
            return Err(anyhow!(
                "event {}: repeat end date {end_date} precedes event date {}",
                self.id,
                self.date
            ));
        }
        Ok(())
    }
}
