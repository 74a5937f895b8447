use crate::frame::Frame;

/// Display-refresh hook supplied by the embedder (an animation-frame request, a
/// winit redraw request, a test counter).
pub trait FrameHost {
    /// Arrange for exactly one frame callback at the next refresh boundary.
    fn schedule_frame(&mut self);
}

/// Host that only counts scheduling calls. Used headless and in tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CountingHost {
    pub scheduled: u64,
}

impl FrameHost for CountingHost {
    fn schedule_frame(&mut self) {
        self.scheduled += 1;
    }
}

/// Coalesces redraw requests into at most one paint per refresh.
///
/// A single boolean latch: `request_redraw` sets it and schedules a callback only when
/// it was clear; `begin_frame` clears it before painting, so a request issued while
/// painting lands in the following frame.
#[derive(Debug, Default)]
pub struct RedrawScheduler {
    scheduled: bool,
    next_frame: Frame,
}

impl RedrawScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when this call scheduled a new callback.
    pub fn request_redraw<H: FrameHost + ?Sized>(&mut self, host: &mut H) -> bool {
        if self.scheduled {
            tracing::trace!("redraw already scheduled; coalesced");
            return false;
        }
        self.scheduled = true;
        host.schedule_frame();
        true
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    /// Frame callback entry point. Clears the latch and returns the frame to paint,
    /// or `None` for a spurious callback with nothing pending.
    pub fn begin_frame(&mut self) -> Option<Frame> {
        if !self.scheduled {
            return None;
        }
        self.scheduled = false;
        let frame = self.next_frame;
        self.next_frame = frame.next();
        Some(frame)
    }

    /// Number of paints handed out so far.
    pub fn frames_painted(&self) -> u64 {
        self.next_frame.index
    }
}

#[cfg(test)]
mod tests {
    use super::{CountingHost, RedrawScheduler};
    use crate::frame::Frame;

    #[test]
    fn requests_within_one_frame_coalesce() {
        let mut host = CountingHost::default();
        let mut sched = RedrawScheduler::new();

        assert!(sched.request_redraw(&mut host));
        for _ in 0..9 {
            assert!(!sched.request_redraw(&mut host));
        }
        assert_eq!(host.scheduled, 1);

        assert_eq!(sched.begin_frame(), Some(Frame::new(0)));
        assert_eq!(sched.begin_frame(), None);
        assert_eq!(sched.frames_painted(), 1);
    }

    #[test]
    fn request_during_paint_defers_to_next_frame() {
        let mut host = CountingHost::default();
        let mut sched = RedrawScheduler::new();
        sched.request_redraw(&mut host);

        let frame = sched.begin_frame().expect("scheduled");
        assert!(!sched.is_scheduled());
        // Painting `frame` triggers another request.
        assert!(sched.request_redraw(&mut host));
        assert_eq!(host.scheduled, 2);
        assert_eq!(sched.begin_frame(), Some(frame.next()));
    }
}
