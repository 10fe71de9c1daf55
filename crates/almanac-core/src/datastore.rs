use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::event::{Event, EventDraft};

/// Persistence collaborator. `list` returns the full current snapshot.
pub trait EventStore {
    fn list(&self) -> anyhow::Result<Vec<Event>>;

    fn create(&mut self, draft: EventDraft) -> anyhow::Result<Event>;

    /// Replaces the stored event with the same id. `None` when no such event exists.
    fn update(&mut self, event: Event) -> anyhow::Result<Option<Event>>;

    /// `false` when no event had the id.
    fn delete(&mut self, id: &str) -> anyhow::Result<bool>;
}

/// Next decimal id: one past the largest numeric id, `"1"` for an empty collection.
/// Fails once the largest id is `u64::MAX`.
pub fn next_event_id(events: &[Event]) -> anyhow::Result<String> {
    let max = events
        .iter()
        .filter_map(|event| event.id.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    max.checked_add(1)
        .map(|id| id.to_string())
        .ok_or_else(|| anyhow!("event id space exhausted: largest id is {max}"))
}

fn replace_event(events: &mut [Event], event: Event) -> Option<Event> {
    let slot = events.iter_mut().find(|existing| existing.id == event.id)?;
    *slot = event.clone();
    Some(event)
}

#[derive(Debug, Clone, Default)]
pub struct MemoryEventStore {
    events: Vec<Event>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<Event>) -> Self {
        Self { events }
    }
}

impl EventStore for MemoryEventStore {
    fn list(&self) -> anyhow::Result<Vec<Event>> {
        Ok(self.events.clone())
    }

    fn create(&mut self, draft: EventDraft) -> anyhow::Result<Event> {
        let event = draft.into_event(next_event_id(&self.events)?);
        self.events.push(event.clone());
        Ok(event)
    }

    fn update(&mut self, event: Event) -> anyhow::Result<Option<Event>> {
        Ok(replace_event(&mut self.events, event))
    }

    fn delete(&mut self, id: &str) -> anyhow::Result<bool> {
        let before = self.events.len();
        self.events.retain(|event| event.id != id);
        Ok(self.events.len() != before)
    }
}

/// Events kept as JSON lines in `<data_dir>/events.data`.
#[derive(Debug)]
pub struct DataStore {
    pub data_dir: PathBuf,
    pub events_path: PathBuf,
}

impl DataStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let events_path = data_dir.join("events.data");
        if !events_path.exists() {
            fs::write(&events_path, "")?;
        }

        info!(
            data_dir = %data_dir.display(),
            events = %events_path.display(),
            "opened datastore"
        );

        Ok(Self {
            data_dir,
            events_path,
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn load_events(&self) -> anyhow::Result<Vec<Event>> {
        load_jsonl(&self.events_path).context("failed to load events.data")
    }

    #[tracing::instrument(skip(self, events))]
    pub fn save_events(&self, events: &[Event]) -> anyhow::Result<()> {
        save_jsonl_atomic(&self.events_path, events).context("failed to save events.data")
    }
}

impl EventStore for DataStore {
    fn list(&self) -> anyhow::Result<Vec<Event>> {
        self.load_events()
    }

    #[tracing::instrument(skip(self, draft), fields(title = %draft.title))]
    fn create(&mut self, draft: EventDraft) -> anyhow::Result<Event> {
        let mut events = self.load_events()?;
        let event = draft.into_event(next_event_id(&events)?);
        events.push(event.clone());
        self.save_events(&events)?;
        debug!(id = %event.id, count = events.len(), "event created");
        Ok(event)
    }

    #[tracing::instrument(skip(self, event), fields(id = %event.id))]
    fn update(&mut self, event: Event) -> anyhow::Result<Option<Event>> {
        let mut events = self.load_events()?;
        let Some(updated) = replace_event(&mut events, event) else {
            debug!("update target not found");
            return Ok(None);
        };
        self.save_events(&events)?;
        Ok(Some(updated))
    }

    #[tracing::instrument(skip(self))]
    fn delete(&mut self, id: &str) -> anyhow::Result<bool> {
        let events = self.load_events()?;
        let before = events.len();
        let kept: Vec<Event> = events.into_iter().filter(|event| event.id != id).collect();
        if kept.len() == before {
            debug!("delete target not found");
            return Ok(false);
        }
        info!(before, after = kept.len(), "deleted event");
        self.save_events(&kept)?;
        Ok(true)
    }
}

#[tracing::instrument(skip(path))]
fn load_jsonl(path: &Path) -> anyhow::Result<Vec<Event>> {
    debug!(file = %path.display(), "loading jsonl");
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let event: Event = serde_json::from_str(trimmed)
            .with_context(|| format!("failed parsing {} line {}", path.display(), idx + 1))?;
        out.push(event);
    }

    debug!(count = out.len(), "loaded events from jsonl");
    Ok(out)
}

#[tracing::instrument(skip(path, events))]
fn save_jsonl_atomic(path: &Path, events: &[Event]) -> anyhow::Result<()> {
    debug!(file = %path.display(), count = events.len(), "saving jsonl atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    for event in events {
        let serialized = serde_json::to_string(event)?;
        writeln!(temp, "{serialized}")?;
    }
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}
