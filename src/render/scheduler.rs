//! Frame-batched rendering
//!
//! Partial text is re-rendered at most once per frame. A dirty flag plus a
//! single pending frame handle: marking dirty while a frame is already
//! scheduled just waits for that frame.

/// Handle of a requested frame callback
pub type FrameHandle = u64;

/// Host frame clock (an animation-frame source or a test double).
///
/// The host calls the renderer's `on_frame` when a requested frame fires.
pub trait FrameClock {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Frame clock driven by hand, for tests and synchronous hosts
#[derive(Debug, Default, Clone)]
pub struct ManualFrames {
    next: FrameHandle,
    pending: Option<FrameHandle>,
    requested: usize,
    cancelled: usize,
}

impl ManualFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// The outstanding frame, if any
    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Total frames requested so far
    pub fn requested(&self) -> usize {
        self.requested
    }

    /// Total frames cancelled so far
    pub fn cancelled(&self) -> usize {
        self.cancelled
    }

    /// Consume the outstanding frame, returning whether there was one
    pub fn fire(&mut self) -> bool {
        self.pending.take().is_some()
    }
}

impl FrameClock for ManualFrames {
    fn request_frame(&mut self) -> FrameHandle {
        self.next += 1;
        self.requested += 1;
        self.pending = Some(self.next);
        self.next
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
            self.cancelled += 1;
        }
    }
}

impl<F: FrameClock + ?Sized> FrameClock for &mut F {
    fn request_frame(&mut self) -> FrameHandle {
        (**self).request_frame()
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        (**self).cancel_frame(handle)
    }
}

/// Dirty flag plus at most one pending frame
#[derive(Debug, Default)]
pub struct RenderScheduler {
    dirty: bool,
    pending: Option<FrameHandle>,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn has_pending_frame(&self) -> bool {
        self.pending.is_some()
    }

    /// Mark text dirty, requesting a frame unless one is already pending
    pub fn mark_dirty(&mut self, clock: &mut impl FrameClock) {
        self.dirty = true;
        if self.pending.is_none() {
            self.pending = Some(clock.request_frame());
        }
    }

    /// The pending frame fired. Returns whether a render is due.
    pub fn frame_fired(&mut self) -> bool {
        self.pending = None;
        std::mem::take(&mut self.dirty)
    }

    /// Render now instead of on the next frame. Returns whether a render is due.
    pub fn flush_now(&mut self, clock: &mut impl FrameClock) -> bool {
        self.cancel_pending(clock);
        std::mem::take(&mut self.dirty)
    }

    /// Drop the pending frame and the dirty flag
    pub fn cancel(&mut self, clock: &mut impl FrameClock) {
        self.cancel_pending(clock);
        self.dirty = false;
    }

    fn cancel_pending(&mut self, clock: &mut impl FrameClock) {
        if let Some(handle) = self.pending.take() {
            clock.cancel_frame(handle);
        }
    }
}
