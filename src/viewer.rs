use log::debug;

use crate::{
    error::StoryError,
    gesture::{Direction, SwipeTracker, TapZone},
    story::Story,
};

/// How long each story is shown before auto-advancing.
pub const STORY_DURATION_MILLIS: u64 = 3000;
/// Progress timer cadence.
pub const TICK_INTERVAL_MILLIS: u64 = 30;

/// What a viewer operation did, so the owner can keep its timer in step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// An index was (re-)entered with progress reset to zero.
    Entered(usize),
    Closed,
    Unchanged,
}

#[derive(Debug)]
struct Session {
    snapshot: Vec<Story>,
    index: usize,
    elapsed: u64,
    swipe: SwipeTracker,
}

/// Full-screen sequential viewer.
///
/// The session keeps its own copy of the stories it was opened with. A sweep
/// that expires a story mid-view does not close the viewer; the stale story
/// stays visible until the session moves past it.
#[derive(Debug, Default)]
pub struct Viewer {
    session: Option<Session>,
    generation: u64,
}

impl Viewer {
    /// Start a session over `snapshot`, replacing any open one. The snapshot
    /// is owned by the session and never re-read from the store.
    pub fn open(&mut self, snapshot: Vec<Story>, index: usize) -> Result<Transition, StoryError> {
        if snapshot.is_empty() {
            return Err(StoryError::EmptyCollection);
        }
        if index >= snapshot.len() {
            return Err(StoryError::IndexOutOfRange {
                index,
                len: snapshot.len(),
            });
        }

        debug!("opening viewer at {} of {}", index, snapshot.len());
        self.session = Some(Session {
            snapshot,
            index,
            elapsed: 0,
            swipe: SwipeTracker::default(),
        });
        Ok(self.enter(index))
    }

    pub fn close(&mut self) -> Transition {
        match self.session.take() {
            Some(_) => {
                debug!("closing viewer");
                Transition::Closed
            }
            None => Transition::Unchanged,
        }
    }

    /// One progress timer period. Reaching the full duration advances once.
    pub fn tick(&mut self) -> Transition {
        let Some(session) = self.session.as_mut() else {
            return Transition::Unchanged;
        };
        session.elapsed += TICK_INTERVAL_MILLIS;
        if session.elapsed >= STORY_DURATION_MILLIS {
            self.advance()
        } else {
            Transition::Unchanged
        }
    }

    pub fn advance(&mut self) -> Transition {
        let Some(session) = self.session.as_ref() else {
            return Transition::Unchanged;
        };
        let next = session.index + 1;
        if next < session.snapshot.len() {
            self.enter(next)
        } else {
            self.close()
        }
    }

    pub fn retreat(&mut self) -> Transition {
        match self.index() {
            Some(index) => self.enter(index.saturating_sub(1)),
            None => Transition::Unchanged,
        }
    }

    pub fn touch_start(&mut self, x: f64) {
        if let Some(session) = self.session.as_mut() {
            session.swipe.start(x);
        }
    }

    pub fn touch_move(&mut self, x: f64) {
        if let Some(session) = self.session.as_mut() {
            session.swipe.track(x);
        }
    }

    /// Short touches are left to [`Viewer::tap`].
    pub fn touch_end(&mut self) -> Transition {
        let direction = match self.session.as_mut() {
            Some(session) => session.swipe.finish(),
            None => None,
        };
        match direction {
            Some(Direction::Forward) => self.advance(),
            Some(Direction::Backward) => self.retreat(),
            None => Transition::Unchanged,
        }
    }

    pub fn tap(&mut self, x: f64, width: f64) -> Transition {
        if self.session.is_none() {
            return Transition::Unchanged;
        }
        match TapZone::from_position(x, width) {
            Some(TapZone::Previous) => self.retreat(),
            Some(TapZone::Close) => self.close(),
            Some(TapZone::Next) => self.advance(),
            None => Transition::Unchanged,
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn index(&self) -> Option<usize> {
        self.session.as_ref().map(|session| session.index)
    }

    pub fn current(&self) -> Option<&Story> {
        self.session
            .as_ref()
            .and_then(|session| session.snapshot.get(session.index))
    }

    pub fn len(&self) -> usize {
        self.session
            .as_ref()
            .map_or(0, |session| session.snapshot.len())
    }

    /// Percentage of the current story's display time, 0 to 100.
    pub fn progress(&self) -> f64 {
        self.session.as_ref().map_or(0.0, |session| {
            let elapsed = session.elapsed.min(STORY_DURATION_MILLIS);
            elapsed as f64 / STORY_DURATION_MILLIS as f64 * 100.0
        })
    }

    /// Progress bar fill per story: full before the current one, live for the
    /// current one, empty after.
    pub fn segments(&self) -> Vec<f64> {
        let Some(session) = self.session.as_ref() else {
            return Vec::new();
        };
        let progress = self.progress();
        (0..session.snapshot.len())
            .map(|i| match i.cmp(&session.index) {
                std::cmp::Ordering::Less => 100.0,
                std::cmp::Ordering::Equal => progress,
                std::cmp::Ordering::Greater => 0.0,
            })
            .collect()
    }

    /// Bumped every time an index is entered. Timer ticks carry the
    /// generation they were started for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn enter(&mut self, index: usize) -> Transition {
        match self.session.as_mut() {
            Some(session) => {
                session.index = index;
                session.elapsed = 0;
                self.generation += 1;
                Transition::Entered(index)
            }
            None => Transition::Unchanged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Transition, Viewer, STORY_DURATION_MILLIS, TICK_INTERVAL_MILLIS};
    use crate::{error::StoryError, payload::ImagePayload, story::Story};

    fn stories(n: u64) -> Vec<Story> {
        (0..n)
            .map(|i| Story {
                id: i + 1,
                image: ImagePayload::parse(format!("data:image/jpeg;base64,{}", i)).unwrap(),
                timestamp: 0,
            })
            .collect()
    }

    fn open_at(n: u64, index: usize) -> Viewer {
        let mut viewer = Viewer::default();
        viewer.open(stories(n), index).unwrap();
        viewer
    }

    #[test]
    fn open_empty_is_rejected() {
        let mut viewer = Viewer::default();
        let result = viewer.open(Vec::new(), 0);
        assert!(matches!(result, Err(StoryError::EmptyCollection)));
        assert!(!viewer.is_open());
    }

    #[test]
    fn open_out_of_range_is_rejected() {
        let mut viewer = Viewer::default();
        let result = viewer.open(stories(2), 2);
        assert!(matches!(
            result,
            Err(StoryError::IndexOutOfRange { index: 2, len: 2 })
        ));
        assert!(!viewer.is_open());
        assert_eq!(viewer.generation(), 0);
    }

    #[test]
    fn open_starts_at_zero_progress() {
        let viewer = open_at(3, 1);
        assert_eq!(viewer.index(), Some(1));
        assert_eq!(viewer.progress(), 0.0);
        assert_eq!(viewer.current().unwrap().id, 2);
    }

    #[test]
    fn advancing_to_the_end_closes() {
        for len in 1..5u64 {
            for start in 0..len as usize {
                let mut viewer = open_at(len, start);
                let steps = len as usize - 1 - start;
                for n in 1..=steps {
                    assert_eq!(viewer.advance(), Transition::Entered(start + n));
                }
                assert_eq!(viewer.index(), Some(start + steps));
                assert_eq!(viewer.advance(), Transition::Closed);
                assert!(!viewer.is_open());
            }
        }
    }

    #[test]
    fn retreat_at_zero_stays() {
        let mut viewer = open_at(3, 0);
        for _ in 0..5 {
            assert_eq!(viewer.retreat(), Transition::Entered(0));
            assert_eq!(viewer.index(), Some(0));
        }
    }

    #[test]
    fn retreat_resets_progress() {
        let mut viewer = open_at(3, 2);
        viewer.tick();
        viewer.tick();
        assert!(viewer.progress() > 0.0);
        assert_eq!(viewer.retreat(), Transition::Entered(1));
        assert_eq!(viewer.progress(), 0.0);
    }

    #[test]
    fn ticks_to_full_duration_advance_once() {
        let mut viewer = open_at(3, 0);
        let ticks = STORY_DURATION_MILLIS / TICK_INTERVAL_MILLIS;
        let mut transitions = Vec::new();
        for _ in 0..ticks {
            let transition = viewer.tick();
            if transition != Transition::Unchanged {
                transitions.push(transition);
            }
        }
        assert_eq!(transitions, vec![Transition::Entered(1)]);
        assert_eq!(viewer.progress(), 0.0);
    }

    #[test]
    fn ticks_on_last_story_close_once() {
        let mut viewer = open_at(1, 0);
        let ticks = STORY_DURATION_MILLIS / TICK_INTERVAL_MILLIS;
        for _ in 0..ticks - 1 {
            assert_eq!(viewer.tick(), Transition::Unchanged);
        }
        assert_eq!(viewer.tick(), Transition::Closed);
        assert_eq!(viewer.tick(), Transition::Unchanged);
    }

    #[test]
    fn progress_tracks_elapsed() {
        let mut viewer = open_at(2, 0);
        for _ in 0..50 {
            viewer.tick();
        }
        assert!((viewer.progress() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn segments() {
        let mut viewer = open_at(4, 0);
        viewer.advance();
        viewer.advance();
        for _ in 0..25 {
            viewer.tick();
        }
        assert_eq!(viewer.segments(), vec![100.0, 100.0, 25.0, 0.0]);

        viewer.close();
        assert!(viewer.segments().is_empty());
    }

    #[test]
    fn swipe_navigation() {
        let mut viewer = open_at(3, 1);

        viewer.touch_start(200.0);
        viewer.touch_move(150.0);
        assert_eq!(viewer.touch_end(), Transition::Unchanged);
        assert_eq!(viewer.index(), Some(1));

        viewer.touch_start(200.0);
        viewer.touch_move(149.0);
        assert_eq!(viewer.touch_end(), Transition::Entered(2));

        viewer.touch_start(100.0);
        viewer.touch_move(151.0);
        assert_eq!(viewer.touch_end(), Transition::Entered(1));
    }

    #[test]
    fn tap_zones() {
        let mut viewer = open_at(3, 1);
        assert_eq!(viewer.tap(10.0, 300.0), Transition::Entered(0));
        assert_eq!(viewer.tap(290.0, 300.0), Transition::Entered(1));
        assert_eq!(viewer.tap(150.0, 300.0), Transition::Closed);
        assert_eq!(viewer.tap(150.0, 300.0), Transition::Unchanged);
    }

    #[test]
    fn closed_viewer_ignores_navigation() {
        let mut viewer = Viewer::default();
        assert_eq!(viewer.advance(), Transition::Unchanged);
        assert_eq!(viewer.retreat(), Transition::Unchanged);
        assert_eq!(viewer.tick(), Transition::Unchanged);
        assert_eq!(viewer.close(), Transition::Unchanged);
        viewer.touch_start(0.0);
        assert_eq!(viewer.touch_end(), Transition::Unchanged);
    }

    #[test]
    fn reopen_replaces_session() {
        let mut viewer = open_at(3, 2);
        let generation = viewer.generation();
        assert_eq!(viewer.open(stories(1), 0).unwrap(), Transition::Entered(0));
        assert_eq!(viewer.len(), 1);
        assert!(viewer.generation() > generation);
    }

    #[test]
    fn every_entry_bumps_generation() {
        let mut viewer = open_at(3, 0);
        let mut last = viewer.generation();
        for step in 0..3 {
            let transition = match step {
                0 => viewer.advance(),
                _ => viewer.retreat(),
            };
            assert!(matches!(transition, Transition::Entered(_)));
            assert!(viewer.generation() > last);
            last = viewer.generation();
        }
    }
}
