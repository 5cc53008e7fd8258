//! Frame pacing: the acquire -> record -> submit -> present -> recreate cycle.
//!
//! [`FramePacer`] drives one render iteration safely across N overlapping
//! frame slots and M swapchain images. It owns the pacing *state* - the
//! round-robin slot index, the per-image fence table, and the deferred
//! rebuild flag - while all device work goes through the [`FrameBackend`]
//! collaborator and all window state through [`FrameSource`]. That seam is
//! what lets every pacing property be tested against a scripted backend
//! with no GPU present.
//!
//! # Per-iteration protocol
//!
//! 1. Zero-area extent: skip entirely, re-check next iteration.
//! 2. Pending rebuild (deferred present result or window resize): rebuild
//!    before touching the swapchain again.
//! 3. Wait on the current slot's in-flight fence. This bounds how far the
//!    CPU can run ahead of the GPU to the slot count.
//! 4. Acquire an image. Out-of-date aborts the iteration through a
//!    rebuild without advancing the slot; the iteration retries from the
//!    top on the next call.
//! 5. If the per-image fence table says another slot is still writing the
//!    acquired image (possible whenever M != N or timing skews), wait on
//!    that slot's fence before reusing the image.
//! 6. Record through the draw callback, submit, present.
//! 7. Stale present results set the deferred flag rather than rebuilding
//!    mid-iteration; the rebuild runs after the slot index advances.
//!
//! Waits use a finite timeout. A slot that never signals surfaces as
//! [`FrameError::SlotTimeout`] instead of hanging the process.

use std::time::Duration;

use ash::vk;
use thiserror::Error;
use tracing::{debug, warn};

use prism_rhi::RhiError;

/// Default deadline for in-flight fence waits.
pub const DEFAULT_SLOT_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of an image acquire request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// An image is ready to render into.
    Ready {
        /// Swapchain image index.
        image: u32,
        /// The swapchain still works but no longer matches the surface.
        suboptimal: bool,
    },
    /// The swapchain is stale and must be rebuilt before use.
    OutOfDate,
}

/// Outcome of a present request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    /// The image was queued for presentation.
    Presented,
    /// Presented, but the swapchain no longer matches the surface.
    Suboptimal,
    /// The swapchain is stale; the image may not have been presented.
    OutOfDate,
}

/// What a call to [`FramePacer::run_frame`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A frame was recorded, submitted, and queued for presentation.
    Rendered,
    /// The drawable extent had zero area; nothing was done.
    SkippedZeroExtent,
    /// The swapchain was stale at acquire; it was rebuilt and no frame was
    /// drawn. The same slot retries on the next call.
    Recreated,
}

/// Fatal frame-loop errors.
///
/// Recoverable conditions (out-of-date, suboptimal, zero extent) never
/// appear here; they are absorbed by the pacing protocol.
#[derive(Error, Debug)]
pub enum FrameError {
    /// An in-flight fence did not signal within the deadline. Either the
    /// GPU is wedged or a submission was lost.
    #[error("frame slot {slot} did not complete within {timeout:?}")]
    SlotTimeout {
        /// The slot whose fence timed out.
        slot: usize,
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// Any other device failure (device lost, out of memory, recording
    /// failure).
    #[error(transparent)]
    Device(#[from] RhiError),
}

/// Window-side collaborator: drawable size and the resize flag.
pub trait FrameSource {
    /// Current drawable extent in pixels. Zero area means minimized.
    fn drawable_extent(&self) -> vk::Extent2D;

    /// Returns whether a resize was observed since the last call, and
    /// clears the flag.
    fn take_resize_observed(&mut self) -> bool;
}

/// Device-side collaborator: everything the pacing protocol asks of the
/// swapchain, queues, and synchronization primitives.
///
/// The production implementation wraps the Vulkan swapchain and per-slot
/// resources; tests substitute a scripted fake.
pub trait FrameBackend {
    /// Recording context handed to the draw callback.
    type Recorder;

    /// Number of frame slots (fixed for the backend's lifetime).
    fn slot_count(&self) -> usize;

    /// Number of swapchain images in the current generation.
    fn image_count(&self) -> usize;

    /// Blocks until `slot`'s in-flight fence signals (slot-reuse gate).
    fn wait_slot(&mut self, slot: usize, timeout: Duration) -> Result<(), RhiError>;

    /// Blocks until `slot`'s in-flight fence signals, where `slot` is the
    /// previous owner of an image about to be reused (write-after-read
    /// gate). Distinct from [`wait_slot`](Self::wait_slot) so callers and
    /// tests can tell the two gates apart.
    fn wait_image_owner(&mut self, slot: usize, timeout: Duration) -> Result<(), RhiError>;

    /// Requests the next presentable image, signaling `slot`'s
    /// image-available semaphore when it is ready.
    fn acquire(&mut self, slot: usize) -> Result<AcquireOutcome, RhiError>;

    /// Resets and begins `slot`'s command buffer and opens the render pass
    /// on `image`'s framebuffer.
    fn begin_recording(&mut self, slot: usize, image: u32) -> Result<Self::Recorder, RhiError>;

    /// Closes the render pass and finalizes the command buffer.
    fn finish_recording(&mut self, slot: usize, recorder: Self::Recorder) -> Result<(), RhiError>;

    /// Resets `slot`'s fence and submits its commands, gated on
    /// image-available and signaling render-finished plus the fence.
    fn submit(&mut self, slot: usize, image: u32) -> Result<(), RhiError>;

    /// Queues `image` for presentation, gated on render-finished.
    fn present(&mut self, slot: usize, image: u32) -> Result<PresentOutcome, RhiError>;

    /// Rebuilds the swapchain and everything bound to it for `extent`.
    /// Returns the new swapchain image count.
    fn rebuild(&mut self, extent: vk::Extent2D) -> Result<usize, RhiError>;
}

/// The frame-pacing state machine.
///
/// Holds no Vulkan handles. One instance drives exactly one backend; the
/// slot count and the fence-table length must track the backend's values,
/// which [`run_frame`](Self::run_frame) maintains on every rebuild.
pub struct FramePacer {
    /// Round-robin frame slot index.
    current_slot: usize,
    /// Fixed number of frame slots.
    slot_count: usize,
    /// Per-image fence table: image index -> slot currently writing it.
    images_in_flight: Vec<Option<usize>>,
    /// A stale present or window resize was observed; rebuild before the
    /// next acquire.
    rebuild_pending: bool,
    /// Deadline for fence waits.
    slot_timeout: Duration,
}

impl FramePacer {
    /// Creates a pacer for `slot_count` frame slots over `image_count`
    /// swapchain images.
    pub fn new(slot_count: usize, image_count: usize) -> Self {
        assert!(slot_count > 0, "at least one frame slot is required");
        Self {
            current_slot: 0,
            slot_count,
            images_in_flight: vec![None; image_count],
            rebuild_pending: false,
            slot_timeout: DEFAULT_SLOT_TIMEOUT,
        }
    }

    /// Overrides the fence-wait deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.slot_timeout = timeout;
        self
    }

    /// The slot the next frame will use.
    #[inline]
    pub fn current_slot(&self) -> usize {
        self.current_slot
    }

    /// The per-image fence table (image index -> owning slot).
    #[inline]
    pub fn images_in_flight(&self) -> &[Option<usize>] {
        &self.images_in_flight
    }

    /// Whether a rebuild is pending for the next iteration.
    #[inline]
    pub fn rebuild_pending(&self) -> bool {
        self.rebuild_pending
    }

    /// Runs one iteration of the frame cycle.
    ///
    /// `draw` receives the backend's recording context and must only issue
    /// drawing commands; synchronization is this function's job alone.
    ///
    /// # Errors
    ///
    /// Only fatal conditions are returned; see [`FrameError`]. Stale
    /// swapchain states are handled internally by rebuilding.
    pub fn run_frame<B, S, F>(
        &mut self,
        backend: &mut B,
        source: &mut S,
        draw: F,
    ) -> Result<FrameOutcome, FrameError>
    where
        B: FrameBackend,
        S: FrameSource,
        F: FnOnce(&mut B::Recorder),
    {
        let extent = source.drawable_extent();
        if extent.width == 0 || extent.height == 0 {
            debug!("Zero-area extent, skipping frame");
            return Ok(FrameOutcome::SkippedZeroExtent);
        }

        if source.take_resize_observed() {
            self.rebuild_pending = true;
        }
        if self.rebuild_pending {
            self.rebuild(backend, extent)?;
        }

        let slot = self.current_slot;

        // Slot-reuse gate: the previous submission that used this slot must
        // have fully retired before its command buffer is reset.
        self.wait(backend, slot, WaitGate::Slot)?;

        let (image, suboptimal) = match backend.acquire(slot)? {
            AcquireOutcome::Ready { image, suboptimal } => (image, suboptimal),
            AcquireOutcome::OutOfDate => {
                debug!("Swapchain out of date at acquire, rebuilding");
                // The slot index stays put: this iteration drew nothing, so
                // advancing would skew the round-robin accounting.
                self.rebuild(backend, extent)?;
                return Ok(FrameOutcome::Recreated);
            }
        };

        if suboptimal {
            // The acquire signaled the slot's semaphore, so the frame must
            // run to submission; the rebuild happens after present.
            debug!("Swapchain suboptimal at acquire, deferring rebuild");
            self.rebuild_pending = true;
        }

        // Write-after-read gate: the acquired image may still be referenced
        // by a submission from a different slot.
        let image_idx = image as usize;
        if let Some(owner) = self.images_in_flight.get(image_idx).copied().flatten() {
            if owner != slot {
                self.wait(backend, owner, WaitGate::ImageOwner)?;
            }
        }
        if image_idx < self.images_in_flight.len() {
            self.images_in_flight[image_idx] = Some(slot);
        } else {
            warn!(
                "Acquired image index {} outside fence table of {} entries",
                image_idx,
                self.images_in_flight.len()
            );
        }

        let mut recorder = backend.begin_recording(slot, image)?;
        draw(&mut recorder);
        backend.finish_recording(slot, recorder)?;

        backend.submit(slot, image)?;

        match backend.present(slot, image)? {
            PresentOutcome::Presented => {}
            PresentOutcome::Suboptimal | PresentOutcome::OutOfDate => {
                debug!("Stale present result, deferring rebuild");
                self.rebuild_pending = true;
            }
        }

        // The frame reached submission, so this slot's fence is armed and
        // the rotation advances.
        self.current_slot = (self.current_slot + 1) % self.slot_count;

        if source.take_resize_observed() {
            self.rebuild_pending = true;
        }
        if self.rebuild_pending {
            let extent = source.drawable_extent();
            if extent.width > 0 && extent.height > 0 {
                self.rebuild(backend, extent)?;
            }
            // Zero extent: leave the flag set and retry next iteration.
        }

        Ok(FrameOutcome::Rendered)
    }

    fn rebuild<B: FrameBackend>(
        &mut self,
        backend: &mut B,
        extent: vk::Extent2D,
    ) -> Result<(), FrameError> {
        let image_count = backend.rebuild(extent)?;
        // New swapchain generation: nothing is in flight against it.
        self.images_in_flight = vec![None; image_count];
        self.rebuild_pending = false;
        debug!(
            "Swapchain rebuilt at {}x{} with {} images",
            extent.width, extent.height, image_count
        );
        Ok(())
    }

    fn wait<B: FrameBackend>(
        &self,
        backend: &mut B,
        slot: usize,
        gate: WaitGate,
    ) -> Result<(), FrameError> {
        let result = match gate {
            WaitGate::Slot => backend.wait_slot(slot, self.slot_timeout),
            WaitGate::ImageOwner => backend.wait_image_owner(slot, self.slot_timeout),
        };
        result.map_err(|e| match e {
            RhiError::Timeout(timeout) => FrameError::SlotTimeout { slot, timeout },
            other => FrameError::Device(other),
        })
    }
}

#[derive(Clone, Copy)]
enum WaitGate {
    Slot,
    ImageOwner,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Everything the fake backend was asked to do, in order.
    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        WaitSlot(usize),
        WaitImage(usize),
        Acquire(usize),
        Begin(usize, u32),
        Finish(usize),
        Submit(usize, u32),
        Present(usize, u32),
        Rebuild(u32, u32),
    }

    struct FakeRecorder {
        slot: usize,
        image: u32,
    }

    /// Scripted backend. Images are handed out round-robin; specific
    /// acquire/present calls (1-based) can be scripted to fail.
    struct FakeBackend {
        slot_count: usize,
        image_count: usize,
        next_image: u32,
        events: Vec<Event>,
        acquire_calls: usize,
        present_calls: usize,
        out_of_date_acquires: HashSet<usize>,
        suboptimal_acquires: HashSet<usize>,
        suboptimal_presents: HashSet<usize>,
        rebuild_image_count: Option<usize>,
        timeout_waits: bool,
    }

    impl FakeBackend {
        fn new(slot_count: usize, image_count: usize) -> Self {
            Self {
                slot_count,
                image_count,
                next_image: 0,
                events: Vec::new(),
                acquire_calls: 0,
                present_calls: 0,
                out_of_date_acquires: HashSet::new(),
                suboptimal_acquires: HashSet::new(),
                suboptimal_presents: HashSet::new(),
                rebuild_image_count: None,
                timeout_waits: false,
            }
        }

        fn count<F: Fn(&Event) -> bool>(&self, pred: F) -> usize {
            self.events.iter().filter(|e| pred(e)).count()
        }
    }

    impl FrameBackend for FakeBackend {
        type Recorder = FakeRecorder;

        fn slot_count(&self) -> usize {
            self.slot_count
        }

        fn image_count(&self) -> usize {
            self.image_count
        }

        fn wait_slot(&mut self, slot: usize, timeout: Duration) -> Result<(), RhiError> {
            self.events.push(Event::WaitSlot(slot));
            if self.timeout_waits {
                return Err(RhiError::Timeout(timeout));
            }
            Ok(())
        }

        fn wait_image_owner(&mut self, slot: usize, timeout: Duration) -> Result<(), RhiError> {
            self.events.push(Event::WaitImage(slot));
            if self.timeout_waits {
                return Err(RhiError::Timeout(timeout));
            }
            Ok(())
        }

        fn acquire(&mut self, slot: usize) -> Result<AcquireOutcome, RhiError> {
            self.events.push(Event::Acquire(slot));
            self.acquire_calls += 1;
            if self.out_of_date_acquires.contains(&self.acquire_calls) {
                return Ok(AcquireOutcome::OutOfDate);
            }
            let image = self.next_image;
            self.next_image = (self.next_image + 1) % self.image_count as u32;
            Ok(AcquireOutcome::Ready {
                image,
                suboptimal: self.suboptimal_acquires.contains(&self.acquire_calls),
            })
        }

        fn begin_recording(
            &mut self,
            slot: usize,
            image: u32,
        ) -> Result<Self::Recorder, RhiError> {
            self.events.push(Event::Begin(slot, image));
            Ok(FakeRecorder { slot, image })
        }

        fn finish_recording(
            &mut self,
            slot: usize,
            recorder: Self::Recorder,
        ) -> Result<(), RhiError> {
            assert_eq!(recorder.slot, slot);
            self.events.push(Event::Finish(slot));
            Ok(())
        }

        fn submit(&mut self, slot: usize, image: u32) -> Result<(), RhiError> {
            self.events.push(Event::Submit(slot, image));
            Ok(())
        }

        fn present(&mut self, slot: usize, image: u32) -> Result<PresentOutcome, RhiError> {
            self.events.push(Event::Present(slot, image));
            self.present_calls += 1;
            if self.suboptimal_presents.contains(&self.present_calls) {
                return Ok(PresentOutcome::Suboptimal);
            }
            Ok(PresentOutcome::Presented)
        }

        fn rebuild(&mut self, extent: vk::Extent2D) -> Result<usize, RhiError> {
            self.events.push(Event::Rebuild(extent.width, extent.height));
            if let Some(count) = self.rebuild_image_count {
                self.image_count = count;
            }
            self.next_image = 0;
            Ok(self.image_count)
        }
    }

    struct FakeSource {
        extent: vk::Extent2D,
        resized: bool,
    }

    impl FakeSource {
        fn new(width: u32, height: u32) -> Self {
            Self {
                extent: vk::Extent2D { width, height },
                resized: false,
            }
        }
    }

    impl FrameSource for FakeSource {
        fn drawable_extent(&self) -> vk::Extent2D {
            self.extent
        }

        fn take_resize_observed(&mut self) -> bool {
            std::mem::take(&mut self.resized)
        }
    }

    fn run_ok(
        pacer: &mut FramePacer,
        backend: &mut FakeBackend,
        source: &mut FakeSource,
        draws: &mut u32,
    ) -> FrameOutcome {
        pacer
            .run_frame(backend, source, |_recorder| *draws += 1)
            .expect("frame should not fail")
    }

    #[test]
    fn slots_rotate_round_robin() {
        let mut backend = FakeBackend::new(2, 3);
        let mut source = FakeSource::new(800, 600);
        let mut pacer = FramePacer::new(2, 3);
        let mut draws = 0;

        for i in 0..6 {
            assert_eq!(pacer.current_slot(), i % 2);
            run_ok(&mut pacer, &mut backend, &mut source, &mut draws);
        }
        assert_eq!(draws, 6);
    }

    #[test]
    fn every_slot_reuse_is_gated_by_its_fence() {
        let mut backend = FakeBackend::new(2, 3);
        let mut source = FakeSource::new(800, 600);
        let mut pacer = FramePacer::new(2, 3);
        let mut draws = 0;

        for _ in 0..10 {
            run_ok(&mut pacer, &mut backend, &mut source, &mut draws);
        }

        // Before the n-th recording on a slot, its fence must have been
        // waited on at least n times: no two submissions share a slot
        // concurrently.
        let mut waits = [0usize; 2];
        let mut begins = [0usize; 2];
        for event in &backend.events {
            match *event {
                Event::WaitSlot(slot) => waits[slot] += 1,
                Event::Begin(slot, _) => {
                    begins[slot] += 1;
                    assert!(
                        waits[slot] >= begins[slot],
                        "slot {} was recorded {} times but only waited on {} times",
                        slot,
                        begins[slot],
                        waits[slot]
                    );
                }
                _ => {}
            }
        }
        assert_eq!(begins, [5, 5]);
    }

    #[test]
    fn round_robin_fairness_over_100_iterations() {
        // 2 frame slots, 3 swapchain images, steady state, no resize.
        let mut backend = FakeBackend::new(2, 3);
        let mut source = FakeSource::new(800, 600);
        let mut pacer = FramePacer::new(2, 3);
        let mut draws = 0;

        for _ in 0..100 {
            let outcome = run_ok(&mut pacer, &mut backend, &mut source, &mut draws);
            assert_eq!(outcome, FrameOutcome::Rendered);
        }

        assert_eq!(backend.count(|e| *e == Event::WaitSlot(0)), 50);
        assert_eq!(backend.count(|e| *e == Event::WaitSlot(1)), 50);
        assert_eq!(draws, 100);
        assert_eq!(backend.count(|e| matches!(e, Event::Rebuild(..))), 0);
    }

    #[test]
    fn image_reuse_across_slots_waits_on_prior_owner() {
        // 2 slots over a single image: every frame after the first reuses
        // the image from the other slot.
        let mut backend = FakeBackend::new(2, 1);
        let mut source = FakeSource::new(800, 600);
        let mut pacer = FramePacer::new(2, 1);
        let mut draws = 0;

        run_ok(&mut pacer, &mut backend, &mut source, &mut draws);
        assert_eq!(backend.count(|e| matches!(e, Event::WaitImage(_))), 0);
        assert_eq!(pacer.images_in_flight(), &[Some(0)]);

        run_ok(&mut pacer, &mut backend, &mut source, &mut draws);
        assert_eq!(
            backend.count(|e| *e == Event::WaitImage(0)),
            1,
            "second frame must wait on slot 0, the image's previous owner"
        );
        assert_eq!(pacer.images_in_flight(), &[Some(1)]);

        run_ok(&mut pacer, &mut backend, &mut source, &mut draws);
        assert_eq!(backend.count(|e| *e == Event::WaitImage(1)), 1);
    }

    #[test]
    fn same_slot_image_reuse_needs_no_cross_wait() {
        // 2 slots over 2 images: image i always maps back to slot i, so the
        // slot-reuse gate already covers the image.
        let mut backend = FakeBackend::new(2, 2);
        let mut source = FakeSource::new(800, 600);
        let mut pacer = FramePacer::new(2, 2);
        let mut draws = 0;

        for _ in 0..20 {
            run_ok(&mut pacer, &mut backend, &mut source, &mut draws);
        }
        assert_eq!(backend.count(|e| matches!(e, Event::WaitImage(_))), 0);
    }

    #[test]
    fn out_of_date_acquire_rebuilds_without_drawing() {
        let mut backend = FakeBackend::new(2, 3);
        backend.out_of_date_acquires.insert(5);
        let mut source = FakeSource::new(800, 600);
        let mut pacer = FramePacer::new(2, 3);
        let mut draws = 0;

        for _ in 0..4 {
            assert_eq!(
                run_ok(&mut pacer, &mut backend, &mut source, &mut draws),
                FrameOutcome::Rendered
            );
        }
        let slot_before = pacer.current_slot();

        // Iteration 5: acquire reports out of date.
        let outcome = run_ok(&mut pacer, &mut backend, &mut source, &mut draws);
        assert_eq!(outcome, FrameOutcome::Recreated);
        assert_eq!(draws, 4, "the draw callback must not run on a stale frame");
        assert_eq!(backend.count(|e| matches!(e, Event::Rebuild(..))), 1);
        assert_eq!(
            pacer.current_slot(),
            slot_before,
            "a failed acquire must not advance the slot rotation"
        );

        // Iteration 6 proceeds normally with a fresh image.
        let outcome = run_ok(&mut pacer, &mut backend, &mut source, &mut draws);
        assert_eq!(outcome, FrameOutcome::Rendered);
        assert_eq!(draws, 5);
        assert_eq!(backend.count(|e| matches!(e, Event::Rebuild(..))), 1);
    }

    #[test]
    fn consecutive_acquire_failures_hold_the_slot() {
        let mut backend = FakeBackend::new(2, 3);
        backend.out_of_date_acquires.insert(1);
        backend.out_of_date_acquires.insert(2);
        backend.out_of_date_acquires.insert(3);
        let mut source = FakeSource::new(800, 600);
        let mut pacer = FramePacer::new(2, 3);
        let mut draws = 0;

        for _ in 0..3 {
            let outcome = run_ok(&mut pacer, &mut backend, &mut source, &mut draws);
            assert_eq!(outcome, FrameOutcome::Recreated);
            assert_eq!(pacer.current_slot(), 0);
        }
        assert_eq!(draws, 0);

        run_ok(&mut pacer, &mut backend, &mut source, &mut draws);
        assert_eq!(draws, 1);
        assert_eq!(pacer.current_slot(), 1);
    }

    #[test]
    fn rebuild_resets_fence_table_to_new_image_count() {
        let mut backend = FakeBackend::new(2, 3);
        backend.rebuild_image_count = Some(4);
        let mut source = FakeSource::new(800, 600);
        let mut pacer = FramePacer::new(2, 3);
        let mut draws = 0;

        // Populate the table first.
        for _ in 0..3 {
            run_ok(&mut pacer, &mut backend, &mut source, &mut draws);
        }
        assert!(pacer.images_in_flight().iter().any(|e| e.is_some()));

        // A stale acquire returns before any image is claimed, so the
        // table can be observed exactly as the rebuild left it.
        backend.out_of_date_acquires.insert(4);
        let outcome = run_ok(&mut pacer, &mut backend, &mut source, &mut draws);
        assert_eq!(outcome, FrameOutcome::Recreated);

        assert_eq!(pacer.images_in_flight().len(), 4);
        assert!(
            pacer.images_in_flight().iter().all(|e| e.is_none()),
            "every fence-table entry must be cleared by a rebuild"
        );

        // The next frame claims an image from the new generation; the slot
        // held through the failed acquire (slot 1 after three frames).
        run_ok(&mut pacer, &mut backend, &mut source, &mut draws);
        assert_eq!(pacer.images_in_flight().len(), 4);
        assert_eq!(pacer.images_in_flight()[0], Some(1));
    }

    #[test]
    fn zero_extent_skips_without_touching_the_backend() {
        let mut backend = FakeBackend::new(2, 3);
        let mut source = FakeSource::new(0, 0);
        let mut pacer = FramePacer::new(2, 3);
        let mut draws = 0;

        for _ in 0..5 {
            let outcome = run_ok(&mut pacer, &mut backend, &mut source, &mut draws);
            assert_eq!(outcome, FrameOutcome::SkippedZeroExtent);
        }
        assert_eq!(draws, 0);
        assert!(backend.events.is_empty(), "minimized frames issue no work");

        // Restored window renders again.
        source.extent = vk::Extent2D {
            width: 800,
            height: 600,
        };
        let outcome = run_ok(&mut pacer, &mut backend, &mut source, &mut draws);
        assert_eq!(outcome, FrameOutcome::Rendered);
        assert_eq!(draws, 1);
    }

    #[test]
    fn suboptimal_present_defers_rebuild_past_submission() {
        let mut backend = FakeBackend::new(2, 3);
        backend.suboptimal_presents.insert(2);
        let mut source = FakeSource::new(800, 600);
        let mut pacer = FramePacer::new(2, 3);
        let mut draws = 0;

        run_ok(&mut pacer, &mut backend, &mut source, &mut draws);
        let outcome = run_ok(&mut pacer, &mut backend, &mut source, &mut draws);
        assert_eq!(outcome, FrameOutcome::Rendered);
        assert_eq!(draws, 2, "the suboptimal frame still submits and draws");

        // Rebuild happened after the present, within the same iteration.
        let rebuild_pos = backend
            .events
            .iter()
            .position(|e| matches!(e, Event::Rebuild(..)))
            .expect("rebuild must run");
        let present_pos = backend
            .events
            .iter()
            .rposition(|e| matches!(e, Event::Present(..)))
            .unwrap();
        assert!(rebuild_pos > present_pos);
        assert!(!pacer.rebuild_pending());
    }

    #[test]
    fn suboptimal_acquire_renders_then_rebuilds() {
        let mut backend = FakeBackend::new(2, 3);
        backend.suboptimal_acquires.insert(3);
        let mut source = FakeSource::new(800, 600);
        let mut pacer = FramePacer::new(2, 3);
        let mut draws = 0;

        for _ in 0..3 {
            run_ok(&mut pacer, &mut backend, &mut source, &mut draws);
        }
        assert_eq!(draws, 3, "suboptimal acquire must not drop the frame");
        assert_eq!(backend.count(|e| matches!(e, Event::Rebuild(..))), 1);
    }

    #[test]
    fn rebuild_requested_while_minimized_stays_pending() {
        // A rebuild became due (e.g. stale present) and the window was
        // minimized before it could run: the flag must survive until the
        // extent is usable again. No zero-size swapchain is ever built.
        let mut backend = FakeBackend::new(2, 3);
        let mut pacer = FramePacer::new(2, 3);
        pacer.rebuild_pending = true;
        let mut source = FakeSource::new(0, 0);

        let outcome = pacer
            .run_frame(&mut backend, &mut source, |_: &mut FakeRecorder| {})
            .unwrap();
        assert_eq!(outcome, FrameOutcome::SkippedZeroExtent);
        assert!(pacer.rebuild_pending(), "pending rebuild survives minimize");

        source.extent = vk::Extent2D {
            width: 640,
            height: 480,
        };
        let outcome = pacer
            .run_frame(&mut backend, &mut source, |_: &mut FakeRecorder| {})
            .unwrap();
        assert_eq!(outcome, FrameOutcome::Rendered);
        assert_eq!(backend.count(|e| matches!(e, Event::Rebuild(..))), 1);
        assert!(!pacer.rebuild_pending());
    }

    #[test]
    fn wait_timeout_is_a_distinct_fatal_error() {
        let mut backend = FakeBackend::new(2, 3);
        backend.timeout_waits = true;
        let mut source = FakeSource::new(800, 600);
        let timeout = Duration::from_millis(250);
        let mut pacer = FramePacer::new(2, 3).with_timeout(timeout);

        let err = pacer
            .run_frame(&mut backend, &mut source, |_: &mut FakeRecorder| {})
            .unwrap_err();

        match err {
            FrameError::SlotTimeout { slot, timeout: t } => {
                assert_eq!(slot, 0);
                assert_eq!(t, timeout);
            }
            other => panic!("expected SlotTimeout, got {:?}", other),
        }
    }

    #[test]
    fn device_errors_propagate_unchanged() {
        struct FailingAcquire(FakeBackend);
        impl FrameBackend for FailingAcquire {
            type Recorder = FakeRecorder;
            fn slot_count(&self) -> usize {
                self.0.slot_count()
            }
            fn image_count(&self) -> usize {
                self.0.image_count()
            }
            fn wait_slot(&mut self, slot: usize, timeout: Duration) -> Result<(), RhiError> {
                self.0.wait_slot(slot, timeout)
            }
            fn wait_image_owner(&mut self, slot: usize, timeout: Duration) -> Result<(), RhiError> {
                self.0.wait_image_owner(slot, timeout)
            }
            fn acquire(&mut self, _slot: usize) -> Result<AcquireOutcome, RhiError> {
                Err(RhiError::Vulkan(vk::Result::ERROR_DEVICE_LOST))
            }
            fn begin_recording(
                &mut self,
                slot: usize,
                image: u32,
            ) -> Result<Self::Recorder, RhiError> {
                self.0.begin_recording(slot, image)
            }
            fn finish_recording(
                &mut self,
                slot: usize,
                recorder: Self::Recorder,
            ) -> Result<(), RhiError> {
                self.0.finish_recording(slot, recorder)
            }
            fn submit(&mut self, slot: usize, image: u32) -> Result<(), RhiError> {
                self.0.submit(slot, image)
            }
            fn present(&mut self, slot: usize, image: u32) -> Result<PresentOutcome, RhiError> {
                self.0.present(slot, image)
            }
            fn rebuild(&mut self, extent: vk::Extent2D) -> Result<usize, RhiError> {
                self.0.rebuild(extent)
            }
        }

        let mut backend = FailingAcquire(FakeBackend::new(2, 3));
        let mut source = FakeSource::new(800, 600);
        let mut pacer = FramePacer::new(2, 3);

        let err = pacer
            .run_frame(&mut backend, &mut source, |_: &mut FakeRecorder| {})
            .unwrap_err();

        match err {
            FrameError::Device(e) => assert!(e.is_device_lost()),
            other => panic!("expected Device error, got {:?}", other),
        }
    }

    #[test]
    fn submission_order_per_frame() {
        let mut backend = FakeBackend::new(2, 3);
        let mut source = FakeSource::new(800, 600);
        let mut pacer = FramePacer::new(2, 3);

        pacer
            .run_frame(&mut backend, &mut source, |recorder| {
                // The recorder reflects the slot and image this frame runs on.
                assert_eq!(recorder.slot, 0);
                assert_eq!(recorder.image, 0);
            })
            .unwrap();

        assert_eq!(
            backend.events,
            vec![
                Event::WaitSlot(0),
                Event::Acquire(0),
                Event::Begin(0, 0),
                Event::Finish(0),
                Event::Submit(0, 0),
                Event::Present(0, 0),
            ]
        );
    }
}
