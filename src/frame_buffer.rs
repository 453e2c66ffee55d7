/*! Client-side Frame Buffer.

Queues complete frames decoded off the wire and forwards them to a
display sink, gated by a credit/window flow-control scheme and by
pacing mode. See `proto::client::R_FRAME`/`proto::server` for the
messages this buffer sits between.
*/

use std::collections::VecDeque;

use crate::grid::Grid;

/// How delivery to the display sink is paced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Frames are forwarded to the display only on a timer tick (see
    /// [`FrameBuffer::on_tick`]), one per tick.
    Paced,
    /// Frames are meant to be forwarded as soon as possible; the event
    /// loop should call [`FrameBuffer::drain`] right after each
    /// [`FrameBuffer::enqueue`] rather than waiting on a pacing timer.
    /// `on_tick` is a no-op in this mode.
    FreeRun,
}

/// Client-side frame queue with credit-based flow control.
///
/// At construction the buffer grants `max_credit` credits to the network
/// side (the caller issuing `R_FRAME`). Spending a credit (a sent
/// `R_FRAME`) is tracked by [`FrameBuffer::spend_credit`]; delivering a
/// queued frame to the display grants one back. A completed frame
/// arriving when the queue already holds `max_credit` frames is a
/// protocol violation — the server sent more frames than it had been
/// granted credit for.
pub struct FrameBuffer {
    mode: Mode,
    max_credit: usize,
    credits: usize,
    queue: VecDeque<Grid>,
    paused: bool,
}

impl FrameBuffer {
    /// Build a new buffer with `max_credit` credits (the default per the
    /// protocol is 5) and the given pacing mode.
    #[must_use]
    pub fn new(mode: Mode, max_credit: usize) -> Self {
        Self {
            mode,
            max_credit,
            credits: max_credit,
            queue: VecDeque::new(),
            paused: false,
        }
    }

    /// Credits currently available to spend on a new `R_FRAME`.
    #[must_use]
    pub fn credits_available(&self) -> usize {
        self.credits
    }

    /// Spend one credit, if any are available. Returns `false` (and does
    /// nothing) if the buffer has none left to grant.
    pub fn spend_credit(&mut self) -> bool {
        if self.credits == 0 {
            return false;
        }
        self.credits -= 1;
        true
    }

    /// Enqueue a just-decoded, complete frame (after `A_FRAME_END`). Does
    /// not itself forward anything to a sink — call [`FrameBuffer::drain`]
    /// (free-run) or rely on [`FrameBuffer::on_tick`] (paced) to do that.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ProtocolError::CreditOverflow`] if the
    /// queue already holds `max_credit` frames: the server sent a frame
    /// it had no outstanding credit for.
    pub fn enqueue(&mut self, frame: Grid) -> Result<(), crate::Error> {
        if self.queue.len() >= self.max_credit {
            return Err(crate::ProtocolError::CreditOverflow.into());
        }
        self.queue.push_back(frame);
        Ok(())
    }

    /// Forward exactly one queued frame to `sink`, if any is queued,
    /// granting back one credit. Returns whether a frame was delivered.
    pub fn deliver_one(&mut self, sink: &mut impl FnMut(&Grid)) -> bool {
        let Some(frame) = self.queue.pop_front() else {
            return false;
        };
        sink(&frame);
        self.credits += 1;
        true
    }

    /// Drain and forward every queued frame, in FIFO order.
    pub fn drain(&mut self, sink: &mut impl FnMut(&Grid)) -> usize {
        let mut delivered = 0;
        while self.deliver_one(sink) {
            delivered += 1;
        }
        delivered
    }

    /// Called by the client event loop on each pacing timer tick.
    /// Forwards at most one frame, and only if not paused and not in
    /// `FreeRun` mode (free-run delivery happens eagerly on enqueue).
    pub fn on_tick(&mut self, sink: &mut impl FnMut(&Grid)) -> bool {
        if self.paused || self.mode == Mode::FreeRun {
            return false;
        }
        self.deliver_one(sink)
    }

    /// Enter step mode: delivery stops until [`FrameBuffer::step`] or
    /// [`FrameBuffer::resume`] is called.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Whether the buffer is currently paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Forward exactly one queued frame, regardless of mode or pause
    /// state. A no-op, not an error, if the queue is empty.
    pub fn step(&mut self, sink: &mut impl FnMut(&Grid)) -> bool {
        self.deliver_one(sink)
    }

    /// Leave step mode. In `FreeRun` mode, immediately drains everything
    /// that built up while paused; in `Paced` mode, delivery resumes on
    /// the next timer tick.
    pub fn resume(&mut self, sink: &mut impl FnMut(&Grid)) {
        self.paused = false;
        if self.mode == Mode::FreeRun {
            self.drain(sink);
        }
    }

    /// Stop: pause and discard any buffered, undelivered frames.
    pub fn stop(&mut self) {
        self.paused = true;
        self.queue.clear();
    }

    /// Number of frames currently queued, awaiting delivery.
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }
}
