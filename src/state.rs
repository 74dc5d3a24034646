use std::{ops::ControlFlow, time::Duration};

use log::{debug, info, warn};
use tokio::sync::{
    mpsc::{UnboundedReceiver, UnboundedSender},
    oneshot,
};

use crate::{
    clock::SharedClock,
    payload::ImagePayload,
    response::{Response, StorySummary, ViewerFrame},
    store::StoryStore,
    time_ago::time_ago,
    timer::TimerHandle,
    viewer::{Transition, Viewer, TICK_INTERVAL_MILLIS},
};

pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug)]
pub enum Command {
    Ping,
    List,
    Add(ImagePayload),
    Open(usize),
    Close,
    Next,
    Previous,
    TouchStart(f64),
    TouchMove(f64),
    TouchEnd,
    Tap { x: f64, width: f64 },
    View,
    Sweep,
}

#[derive(Debug)]
pub enum Event {
    Command(Command, oneshot::Sender<Response>),
    ProgressTick { generation: u64 },
    Sweep,
    Shutdown,
}

struct ProgressTimer {
    generation: u64,
    handle: TimerHandle,
}

/// Owns the story store, the viewer and every timer. Only ever touched from
/// the task running [`run`].
pub struct State {
    store: StoryStore,
    viewer: Viewer,
    clock: SharedClock,
    events: UnboundedSender<Event>,
    _sweep_timer: TimerHandle,
    progress_timer: Option<ProgressTimer>,
}

impl State {
    pub fn new(store: StoryStore, clock: SharedClock, events: UnboundedSender<Event>) -> Self {
        let sweep_timer = TimerHandle::repeating(SWEEP_INTERVAL, events.clone(), || Event::Sweep);
        State {
            store,
            viewer: Viewer::default(),
            clock,
            events,
            _sweep_timer: sweep_timer,
            progress_timer: None,
        }
    }

    pub fn handle_event(&mut self, event: Event) -> ControlFlow<()> {
        match event {
            Event::Command(command, reply) => {
                let response = self.handle_command(command);
                if reply.send(response).is_err() {
                    debug!("requester went away before the reply");
                }
            }
            Event::ProgressTick { generation } => self.progress_tick(generation),
            Event::Sweep => {
                self.store.sweep();
            }
            Event::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    pub fn handle_command(&mut self, command: Command) -> Response {
        match command {
            Command::Ping => Response::Pong,
            Command::List => Response::Stories(self.summaries()),
            Command::Add(image) => match self.store.add(image) {
                Ok(story) => Response::Added(story.id),
                Err(e) => {
                    warn!("failed to add story: {}", e);
                    Response::Error(e.to_string())
                }
            },
            Command::Open(index) => match self.viewer.open(self.store.snapshot(), index) {
                Ok(transition) => {
                    info!("viewer opened at story {}", index);
                    self.navigated(transition)
                }
                Err(e) => Response::Error(e.to_string()),
            },
            Command::Close => {
                let transition = self.viewer.close();
                self.navigated(transition)
            }
            Command::Next => {
                let transition = self.viewer.advance();
                self.navigated(transition)
            }
            Command::Previous => {
                let transition = self.viewer.retreat();
                self.navigated(transition)
            }
            Command::TouchStart(x) => {
                self.viewer.touch_start(x);
                Response::Ok
            }
            Command::TouchMove(x) => {
                self.viewer.touch_move(x);
                Response::Ok
            }
            Command::TouchEnd => {
                let transition = self.viewer.touch_end();
                self.navigated(transition)
            }
            Command::Tap { x, width } => {
                let transition = self.viewer.tap(x, width);
                self.navigated(transition)
            }
            Command::View => Response::Viewer(self.frame()),
            Command::Sweep => Response::Swept(self.store.sweep()),
        }
    }

    fn progress_tick(&mut self, generation: u64) {
        match &self.progress_timer {
            Some(timer) if timer.generation == generation => {}
            // Queued by a timer that has since been cancelled
            _ => return,
        }
        let transition = self.viewer.tick();
        if transition != Transition::Unchanged {
            self.navigated(transition);
        }
    }

    fn navigated(&mut self, transition: Transition) -> Response {
        if transition == Transition::Closed {
            info!("viewer closed");
        }
        self.sync_progress_timer();
        Response::Navigated(self.viewer.index())
    }

    /// Exactly one progress timer while the viewer is open, started fresh for
    /// every entered index. The old timer is always cancelled first.
    fn sync_progress_timer(&mut self) {
        if !self.viewer.is_open() {
            if let Some(timer) = self.progress_timer.take() {
                timer.handle.cancel();
                debug!("progress timer cancelled");
            }
            return;
        }

        let generation = self.viewer.generation();
        if matches!(&self.progress_timer, Some(timer) if timer.generation == generation) {
            return;
        }
        if let Some(timer) = self.progress_timer.take() {
            timer.handle.cancel();
        }
        let handle = TimerHandle::repeating(
            Duration::from_millis(TICK_INTERVAL_MILLIS),
            self.events.clone(),
            move || Event::ProgressTick { generation },
        );
        debug!("progress timer started for generation {}", generation);
        self.progress_timer = Some(ProgressTimer {
            generation,
            handle,
        });
    }

    fn summaries(&self) -> Vec<StorySummary> {
        let now = self.clock.now_millis();
        self.store
            .stories()
            .iter()
            .map(|story| StorySummary {
                id: story.id,
                timestamp: story.timestamp,
                label: time_ago(story.timestamp, now),
            })
            .collect()
    }

    fn frame(&self) -> Option<ViewerFrame> {
        let story = self.viewer.current()?;
        Some(ViewerFrame {
            index: self.viewer.index()?,
            count: self.viewer.len(),
            progress: self.viewer.progress(),
            segments: self.viewer.segments(),
            label: time_ago(story.timestamp, self.clock.now_millis()),
            id: story.id,
            image: story.image.as_str().to_string(),
        })
    }
}

/// Drive the state from its event queue until shutdown. Dropping the state on
/// the way out cancels the sweep and progress timers.
pub async fn run(mut state: State, mut events: UnboundedReceiver<Event>) {
    while let Some(event) = events.recv().await {
        if state.handle_event(event).is_break() {
            break;
        }
    }
    info!("story state shutting down");
}

/// Send a command to the state task and wait for its reply.
pub async fn send_command(
    events: &UnboundedSender<Event>,
    command: Command,
) -> anyhow::Result<Response> {
    let (reply, response) = oneshot::channel();
    events
        .send(Event::Command(command, reply))
        .map_err(|_| anyhow::format_err!("story state is not running"))?;
    Ok(response.await?)
}
