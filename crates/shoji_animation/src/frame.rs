//! Animation-frame scheduling
//!
//! Widgets never wait on timers. They ask the host for the next paint via a
//! [`FrameScheduler`] and stage style changes across frames. The scheduler is a
//! seam: a browser-like host drives [`ManualFrames`] once per paint, tests can
//! drive it by hand or use [`ImmediateFrames`] to run everything synchronously.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// Callback run on a future animation frame
pub type FrameCallback = Box<dyn FnOnce()>;

/// Source of animation frames
pub trait FrameScheduler {
    /// Run `callback` before the next paint
    fn request_frame(&self, callback: FrameCallback);

    /// Number of callbacks waiting for a frame
    fn pending(&self) -> usize {
        0
    }
}

/// Frame queue advanced explicitly with [`ManualFrames::tick`]
///
/// Callbacks requested while a frame is running are deferred to the next
/// frame, which is what makes [`after_frames`] span real paint cycles.
#[derive(Default)]
pub struct ManualFrames {
    queue: RefCell<VecDeque<FrameCallback>>,
    frame: Cell<u64>,
}

impl ManualFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one frame; returns how many callbacks ran
    pub fn tick(&self) -> usize {
        let due: Vec<FrameCallback> = self.queue.borrow_mut().drain(..).collect();
        let frame = self.frame.get() + 1;
        self.frame.set(frame);

        tracing::trace!(frame, callbacks = due.len(), "animation frame");
        let count = due.len();
        for callback in due {
            callback();
        }
        count
    }

    /// Tick until the queue is empty or `max_frames` frames ran
    pub fn run_until_idle(&self, max_frames: usize) -> usize {
        let mut frames = 0;
        while frames < max_frames && !self.queue.borrow().is_empty() {
            self.tick();
            frames += 1;
        }
        frames
    }

    /// Frames run so far
    pub fn frame_count(&self) -> u64 {
        self.frame.get()
    }
}

impl FrameScheduler for ManualFrames {
    fn request_frame(&self, callback: FrameCallback) {
        self.queue.borrow_mut().push_back(callback);
    }

    fn pending(&self) -> usize {
        self.queue.borrow().len()
    }
}

/// Scheduler that runs every callback synchronously
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateFrames;

impl FrameScheduler for ImmediateFrames {
    fn request_frame(&self, callback: FrameCallback) {
        callback();
    }
}

/// Run `callback` after `count` frames have elapsed
///
/// `after_frames(scheduler, 2, f)` is the double-rAF pattern: the first frame
/// commits whatever style was just written, the second applies the next one.
/// A `count` of zero runs the callback immediately.
pub fn after_frames(scheduler: Rc<dyn FrameScheduler>, count: usize, callback: FrameCallback) {
    if count == 0 {
        callback();
        return;
    }

    let next = scheduler.clone();
    scheduler.request_frame(Box::new(move || after_frames(next, count - 1, callback)));
}
