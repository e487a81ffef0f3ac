//! Per-frame composition of the neutral gate, the gesture lock and the
//! swipe detectors.
//!
//! The dispatcher owns the only `GestureLock` of a pipeline and is the only
//! place detectors are built, so every detector shares that lock.  One
//! `tick` runs, in order: clock check, lock release, neutral update (with
//! subscriber notification), then each detector in registration order.

use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::GestureError;
use crate::gesture_lock::{GestureLock, GestureLockHandle};
use crate::hand_tracking::{JointFrame, PoseSource};
use crate::neutral::{NeutralPositionDetector, NeutralState};
use crate::sexp::bool_str;
use crate::swipe::{DetectorMode, DirectionalSwipeDetector, SwipeCallbacks, SwipeEvent};

/// Index of a detector within its dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DetectorId(usize);

pub type NeutralCallback = Box<dyn FnMut(NeutralState)>;

pub struct GestureDispatcher {
    config: Config,
    lock: GestureLockHandle,
    neutral: NeutralPositionDetector,
    detectors: Vec<DirectionalSwipeDetector>,
    neutral_subscribers: Vec<NeutralCallback>,
    last_tick: Option<f64>,
}

impl GestureDispatcher {
    pub fn new(config: Config) -> Result<Self, GestureError> {
        config.validate()?;
        info!("Gesture dispatcher created: {}", config.config_sexp());
        Ok(Self {
            lock: GestureLock::shared(&config.lock),
            neutral: NeutralPositionDetector::new(config.neutral.clone()),
            detectors: Vec::new(),
            neutral_subscribers: Vec::new(),
            last_tick: None,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Add a four-direction detector.
    pub fn add_detector(&mut self, callbacks: SwipeCallbacks) -> DetectorId {
        self.add_detector_with_mode(DetectorMode::Unified, callbacks)
    }

    /// Add a detector in the given mode, sharing this dispatcher's lock.
    pub fn add_detector_with_mode(
        &mut self,
        mode: DetectorMode,
        callbacks: SwipeCallbacks,
    ) -> DetectorId {
        let detector = DirectionalSwipeDetector::new(
            self.config.swipe.clone(),
            mode,
            callbacks,
            Rc::clone(&self.lock),
        );
        self.detectors.push(detector);
        let id = DetectorId(self.detectors.len() - 1);
        debug!("Detector {} added ({})", id.0, mode.as_str());
        id
    }

    /// Subscribe to neutral-state changes.  Called from within the tick,
    /// after the gate is recomputed and before any detector runs.
    pub fn subscribe_neutral(&mut self, f: impl FnMut(NeutralState) + 'static) {
        self.neutral_subscribers.push(Box::new(f));
    }

    pub fn detector(&self, id: DetectorId) -> Option<&DirectionalSwipeDetector> {
        self.detectors.get(id.0)
    }

    pub fn detector_count(&self) -> usize {
        self.detectors.len()
    }

    /// Pull the latest frame from `source` and run one tick.  The clock is
    /// checked first, so a rejected tick does not consume a frame.
    pub fn tick_source(
        &mut self,
        source: &mut dyn PoseSource,
        now: f64,
    ) -> Result<Vec<SwipeEvent>, GestureError> {
        self.check_clock(now)?;
        let frame = source.latest_frame();
        self.tick(frame.as_ref(), now)
    }

    /// Run one frame.  `now` must be finite and strictly increase between
    /// calls; a rejected tick leaves every piece of state untouched.
    pub fn tick(
        &mut self,
        frame: Option<&JointFrame>,
        now: f64,
    ) -> Result<Vec<SwipeEvent>, GestureError> {
        self.check_clock(now)?;
        self.last_tick = Some(now);

        self.lock.advance(now);

        if self.neutral.update(frame) {
            let state = self.neutral.state();
            for subscriber in &mut self.neutral_subscribers {
                subscriber(state);
            }
        }
        let neutral = self.neutral.is_neutral();

        let events = self
            .detectors
            .iter_mut()
            .filter_map(|detector| detector.update(frame, now, neutral))
            .collect();
        Ok(events)
    }

    fn check_clock(&self, now: f64) -> Result<(), GestureError> {
        if !now.is_finite() {
            warn!("Rejected tick at non-finite time {}", now);
            return Err(GestureError::NonFiniteTime(now));
        }
        if let Some(previous) = self.last_tick {
            if now <= previous {
                warn!("Rejected tick at {:.4}s (previous {:.4}s)", now, previous);
                return Err(GestureError::NonMonotonicClock { previous, now });
            }
        }
        Ok(())
    }

    pub fn is_neutral(&self) -> bool {
        self.neutral.is_neutral()
    }

    pub fn distance(&self) -> f64 {
        self.neutral.distance()
    }

    pub fn is_blocked(&self) -> bool {
        self.lock.is_blocked()
    }

    pub fn remaining_block_time(&self, now: f64) -> f64 {
        self.lock.remaining_block_time(now)
    }

    /// Clear all tracking, the lock and the clock.  Subscribers and
    /// detectors stay registered.
    pub fn reset(&mut self) {
        self.neutral.reset();
        self.lock.reset();
        for detector in &mut self.detectors {
            detector.reset();
        }
        self.last_tick = None;
    }

    /// Generate s-expression for status output.
    pub fn status_sexp(&self) -> String {
        let now = self.last_tick.unwrap_or(0.0);
        let detectors: Vec<String> = self.detectors.iter().map(|d| d.status_sexp()).collect();
        format!(
            "(:neutral {} :distance {:.4} :lock {} :detectors ({}))",
            bool_str(self.neutral.is_neutral()),
            self.neutral.distance(),
            self.lock.status_sexp(now),
            detectors.join(" "),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand_tracking::{HandJoint, Vec3};
    use crate::swipe::{Direction, TRACKED_JOINT};
    use std::cell::{Cell, RefCell};

    type Fired = Rc<RefCell<Vec<SwipeEvent>>>;

    /// A neutral hand (tips 5mm apart) with the middle tip at (x, y).
    fn neutral_frame(x: f64, y: f64) -> JointFrame {
        JointFrame::new()
            .with_joint(HandJoint::ThumbTip, Vec3::new(0.0, 0.0, 0.0))
            .with_joint(HandJoint::IndexTip, Vec3::new(0.005, 0.0, 0.0))
            .with_joint(TRACKED_JOINT, Vec3::new(x, y, 0.0))
    }

    fn open_frame(x: f64, y: f64) -> JointFrame {
        neutral_frame(x, y).with_joint(HandJoint::IndexTip, Vec3::new(0.05, 0.0, 0.0))
    }

    fn recorder() -> (Fired, SwipeCallbacks) {
        let fired: Fired = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&fired);
        (fired, SwipeCallbacks::all(move |e| sink.borrow_mut().push(e)))
    }

    fn six_cm_dispatcher() -> GestureDispatcher {
        let mut config = Config::default();
        config.swipe.horizontal_threshold_m = 0.06;
        GestureDispatcher::new(config).unwrap()
    }

    fn assert_spaced(events: &[SwipeEvent], block: f64) {
        for pair in events.windows(2) {
            assert!(
                pair[1].time - pair[0].time >= block - 1e-9,
                "events closer than {}s: {:?}",
                block,
                pair,
            );
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = Config::default();
        config.neutral.threshold_m = 0.0;
        assert!(GestureDispatcher::new(config).is_err());
    }

    #[test]
    fn test_left_swipe_through_dispatcher() {
        let mut dispatcher = six_cm_dispatcher();
        let (fired, callbacks) = recorder();
        dispatcher.add_detector(callbacks);

        let mut returned = Vec::new();
        for k in 0..=7 {
            let frame = neutral_frame(-(k as f64) / 100.0, 0.0);
            returned.extend(dispatcher.tick(Some(&frame), k as f64 / 10.0).unwrap());
        }
        assert_eq!(returned.len(), 1);
        assert_eq!(returned[0].direction, Direction::Left);
        assert_eq!(*fired.borrow(), returned, "callback and return value agree");
        assert!(dispatcher.is_blocked());
    }

    #[test]
    fn test_detectors_share_one_lock() {
        let mut dispatcher = six_cm_dispatcher();
        let (fired_a, callbacks_a) = recorder();
        let (fired_b, callbacks_b) = recorder();
        dispatcher.add_detector(callbacks_a);
        dispatcher.add_detector(callbacks_b);

        let mut all = Vec::new();
        for k in 0..=30 {
            let frame = neutral_frame(-(k as f64) / 100.0, 0.0);
            all.extend(dispatcher.tick(Some(&frame), k as f64 / 10.0).unwrap());
        }
        assert_eq!(fired_a.borrow()[0].time, 0.6);
        assert!(
            fired_b.borrow().iter().all(|e| e.time != 0.6),
            "second detector must be suppressed at 0.6s"
        );
        assert_spaced(&all, 0.2);
    }

    #[test]
    fn test_mutual_exclusion_on_fast_motion() {
        let mut dispatcher = GestureDispatcher::new(Config::default()).unwrap();
        let (_, callbacks_a) = recorder();
        let (_, callbacks_b) = recorder();
        dispatcher.add_detector(callbacks_a);
        dispatcher.add_detector_with_mode(DetectorMode::Single(Direction::Right), callbacks_b);

        // 3cm per 50ms: both detectors qualify repeatedly.
        let mut all = Vec::new();
        for k in 0..=60 {
            let frame = neutral_frame(k as f64 * 0.03, 0.0);
            all.extend(dispatcher.tick(Some(&frame), k as f64 / 20.0).unwrap());
        }
        assert!(all.len() > 1, "expected repeated swipes, got {:?}", all);
        assert_spaced(&all, 0.2);
    }

    #[test]
    fn test_lock_released_before_detectors_run() {
        let mut dispatcher = six_cm_dispatcher();
        let (fired, callbacks) = recorder();
        dispatcher.add_detector(callbacks);
        for k in 0..=12 {
            let frame = neutral_frame(-(k as f64) / 100.0, 0.0);
            dispatcher.tick(Some(&frame), k as f64 / 10.0).unwrap();
        }
        let times: Vec<f64> = fired.borrow().iter().map(|e| e.time).collect();
        assert_eq!(times, vec![0.6, 1.2]);
    }

    #[test]
    fn test_open_hand_never_fires() {
        let mut dispatcher = six_cm_dispatcher();
        let (fired, callbacks) = recorder();
        let id = dispatcher.add_detector(callbacks);
        for k in 0..=10 {
            let frame = open_frame(-(k as f64) / 50.0, 0.0);
            dispatcher.tick(Some(&frame), k as f64 / 10.0).unwrap();
            assert!(dispatcher.detector(id).unwrap().state().is_idle());
        }
        assert!(fired.borrow().is_empty());
        assert!(!dispatcher.is_neutral());
    }

    #[test]
    fn test_hand_loss_resets_everything() {
        let mut dispatcher = six_cm_dispatcher();
        let (fired, callbacks) = recorder();
        let id = dispatcher.add_detector(callbacks);
        for k in 0..=4 {
            let frame = neutral_frame(-(k as f64) / 100.0, 0.0);
            dispatcher.tick(Some(&frame), k as f64 / 10.0).unwrap();
        }
        let distance = dispatcher.distance();

        let events = dispatcher.tick(None, 0.5).unwrap();
        assert!(events.is_empty());
        assert!(!dispatcher.is_neutral());
        assert_eq!(dispatcher.distance(), distance);
        assert!(dispatcher.detector(id).unwrap().state().is_idle());

        // Resuming bootstraps a fresh window: 0.05m more is not enough.
        for k in 6..=11 {
            let frame = neutral_frame(-(k as f64) / 100.0, 0.0);
            dispatcher.tick(Some(&frame), k as f64 / 10.0).unwrap();
        }
        assert!(fired.borrow().is_empty());
    }

    #[test]
    fn test_neutral_subscribers_notified_on_change() {
        let mut dispatcher = six_cm_dispatcher();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        dispatcher.subscribe_neutral(move |state| sink.borrow_mut().push(state.neutral));

        dispatcher.tick(Some(&neutral_frame(0.0, 0.0)), 0.1).unwrap();
        dispatcher.tick(Some(&neutral_frame(0.0, 0.0)), 0.2).unwrap();
        dispatcher.tick(Some(&open_frame(0.0, 0.0)), 0.3).unwrap();
        dispatcher.tick(None, 0.4).unwrap();
        dispatcher.tick(Some(&neutral_frame(0.0, 0.0)), 0.5).unwrap();

        assert_eq!(*seen.borrow(), vec![true, false, true]);
    }

    #[test]
    fn test_non_monotonic_tick_rejected() {
        let mut dispatcher = six_cm_dispatcher();
        let (_, callbacks) = recorder();
        let id = dispatcher.add_detector(callbacks);
        dispatcher.tick(Some(&neutral_frame(0.0, 0.0)), 1.0).unwrap();
        let before = *dispatcher.detector(id).unwrap().state();

        let err = dispatcher.tick(Some(&neutral_frame(-0.5, 0.0)), 1.0).unwrap_err();
        assert_eq!(err, GestureError::NonMonotonicClock { previous: 1.0, now: 1.0 });
        assert!(dispatcher.tick(None, 0.5).is_err());
        assert_eq!(*dispatcher.detector(id).unwrap().state(), before);
        assert!(dispatcher.is_neutral(), "rejected tick must not touch the gate");
    }

    #[test]
    fn test_non_finite_tick_rejected() {
        let mut dispatcher = six_cm_dispatcher();
        let (fired, callbacks) = recorder();
        let id = dispatcher.add_detector(callbacks);
        for k in 0..=5 {
            let frame = neutral_frame(-(k as f64) / 100.0, 0.0);
            dispatcher.tick(Some(&frame), k as f64 / 10.0).unwrap();
        }
        let before = *dispatcher.detector(id).unwrap().state();

        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = dispatcher.tick(Some(&neutral_frame(-0.1, 0.0)), bad).unwrap_err();
            assert!(matches!(err, GestureError::NonFiniteTime(_)), "got {:?}", err);
        }
        assert_eq!(*dispatcher.detector(id).unwrap().state(), before);
        assert!(fired.borrow().is_empty());

        // The clock still orders later ticks and the gesture completes.
        assert!(dispatcher.tick(None, 0.4).is_err());
        let events = dispatcher.tick(Some(&neutral_frame(-0.06, 0.0)), 0.6).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].direction, Direction::Left);
    }

    #[test]
    fn test_rejected_tick_source_keeps_frame() {
        let mut dispatcher = six_cm_dispatcher();
        let (_, callbacks) = recorder();
        dispatcher.add_detector(callbacks);

        let pulls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&pulls);
        let mut source = move || {
            counter.set(counter.get() + 1);
            Some(neutral_frame(0.0, 0.0))
        };
        dispatcher.tick_source(&mut source, 1.0).unwrap();
        assert!(dispatcher.tick_source(&mut source, 1.0).is_err());
        assert!(dispatcher.tick_source(&mut source, f64::NAN).is_err());
        assert_eq!(pulls.get(), 1, "rejected ticks must not pull a frame");
    }

    #[test]
    fn test_tick_source() {
        let mut dispatcher = six_cm_dispatcher();
        let (fired, callbacks) = recorder();
        dispatcher.add_detector(callbacks);

        let mut k = 0;
        let mut source = move || {
            let frame = neutral_frame(-(k as f64) / 100.0, 0.0);
            k += 1;
            Some(frame)
        };
        for step in 0..=6 {
            dispatcher.tick_source(&mut source, step as f64 / 10.0).unwrap();
        }
        assert_eq!(fired.borrow().len(), 1);
    }

    #[test]
    fn test_remaining_block_time() {
        let mut dispatcher = six_cm_dispatcher();
        let (_, callbacks) = recorder();
        dispatcher.add_detector(callbacks);
        for k in 0..=6 {
            let frame = neutral_frame(-(k as f64) / 100.0, 0.0);
            dispatcher.tick(Some(&frame), k as f64 / 10.0).unwrap();
        }
        assert!((dispatcher.remaining_block_time(0.65) - 0.15).abs() < 1e-9);
        assert_eq!(dispatcher.remaining_block_time(1.0), 0.0);
    }

    #[test]
    fn test_reset() {
        let mut dispatcher = six_cm_dispatcher();
        let (_, callbacks) = recorder();
        let id = dispatcher.add_detector(callbacks);
        for k in 0..=6 {
            let frame = neutral_frame(-(k as f64) / 100.0, 0.0);
            dispatcher.tick(Some(&frame), k as f64 / 10.0).unwrap();
        }
        dispatcher.reset();
        assert!(!dispatcher.is_blocked());
        assert!(!dispatcher.is_neutral());
        assert!(dispatcher.detector(id).unwrap().state().is_idle());
        assert!(dispatcher.tick(None, 0.0).is_ok(), "clock restarts after reset");
        assert_eq!(dispatcher.detector_count(), 1);
    }

    #[test]
    fn test_status_sexp() {
        let mut dispatcher = six_cm_dispatcher();
        let (_, callbacks) = recorder();
        dispatcher.add_detector(callbacks);
        dispatcher.tick(Some(&neutral_frame(0.0, 0.0)), 0.1).unwrap();
        let sexp = dispatcher.status_sexp();
        assert!(sexp.contains(":neutral t"));
        assert!(sexp.contains(":distance 0.0050"));
        assert!(sexp.contains(":lock (:blocked nil"));
        assert!(sexp.contains(":detectors ((:mode :unified"));
    }
}
