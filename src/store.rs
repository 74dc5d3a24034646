use log::{debug, info, warn};

use crate::{
    clock::SharedClock,
    error::StoryError,
    kv::{KeyValueStore, KvError},
    payload::ImagePayload,
    story::Story,
};

/// The key the whole collection is persisted under.
pub const STORIES_KEY: &str = "stories";

/// Canonical, expiry-filtered story collection.
///
/// Every mutation writes the full collection back under [`STORIES_KEY`].
/// That is fine for a handful of stories but would need incremental
/// persistence for large collections.
pub struct StoryStore {
    kv: Box<dyn KeyValueStore>,
    clock: SharedClock,
    stories: Vec<Story>,
}

impl StoryStore {
    pub fn open(kv: Box<dyn KeyValueStore>, clock: SharedClock) -> Self {
        let mut store = StoryStore {
            kv,
            clock,
            stories: Vec::new(),
        };
        store.load();
        store
    }

    /// Reload from persistence, dropping expired stories. Unreadable data is
    /// treated as an empty collection.
    pub fn load(&mut self) -> &[Story] {
        let persisted = self.read_persisted();
        let now = self.clock.now_millis();
        let total = persisted.len();
        let live: Vec<Story> = persisted
            .into_iter()
            .filter(|story| !story.is_expired(now))
            .collect();

        if live.len() != total {
            info!("dropped {} expired stories on load", total - live.len());
            if let Err(e) = persist(self.kv.as_mut(), &live) {
                warn!("failed to write back live stories: {}", e);
            }
        }
        self.stories = live;
        &self.stories
    }

    /// Remove expired stories. Returns how many were removed; nothing is
    /// written when that is zero.
    pub fn sweep(&mut self) -> usize {
        let now = self.clock.now_millis();
        let total = self.stories.len();
        if !self.stories.iter().any(|story| story.is_expired(now)) {
            debug!("sweep found nothing to remove");
            return 0;
        }

        self.stories.retain(|story| !story.is_expired(now));
        let removed = total - self.stories.len();
        info!("swept {} expired stories", removed);
        if let Err(e) = persist(self.kv.as_mut(), &self.stories) {
            warn!("failed to persist swept stories: {}", e);
        }
        removed
    }

    /// Append a new story. The collection is persisted before it changes in
    /// memory, so a failed write leaves the store as it was.
    pub fn add(&mut self, image: ImagePayload) -> Result<Story, StoryError> {
        let now = self.clock.now_millis();
        let id = match self.stories.last() {
            Some(last) if last.id >= now => last.id + 1,
            _ => now,
        };
        let story = Story {
            id,
            image,
            timestamp: now,
        };

        let mut updated = self.stories.clone();
        updated.push(story.clone());
        persist(self.kv.as_mut(), &updated)?;
        self.stories = updated;

        info!("story {} added ({} total)", story.id, self.stories.len());
        Ok(story)
    }

    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    /// An owned copy of the collection, detached from later mutations.
    pub fn snapshot(&self) -> Vec<Story> {
        self.stories.clone()
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    fn read_persisted(&self) -> Vec<Story> {
        let raw = match self.kv.get(STORIES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("failed to read stories, starting empty: {}", e);
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(stories) => stories,
            Err(e) => {
                warn!("ignoring malformed stored stories: {}", e);
                Vec::new()
            }
        }
    }
}

fn persist(kv: &mut dyn KeyValueStore, stories: &[Story]) -> Result<(), KvError> {
    let json = serde_json::to_string(stories)?;
    kv.set(STORIES_KEY, json)
}
