use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::board::bindings::VariableBindings;
use crate::board::error::{EvaluateError, EvaluateResult};
use crate::board::input::StrokeInput;
use crate::board::model::{Color, Point, DEFAULT_ANCHOR};
use crate::board::overlay::{render_markup, ResultOverlay, Typesetter};
use crate::board::service::EvaluationService;
use crate::board::state::{can_transition, EvaluationPhase, SessionFlags};
use crate::board::surface::RasterSurface;
use crate::board::wire::{CalculateRequest, EvaluationItem};

pub const DEFAULT_MATERIALIZE_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Time between a response arriving and its results showing up. Every
    /// result of one response shares the same due time.
    pub materialize_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            materialize_delay: DEFAULT_MATERIALIZE_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotMounted,
    AlreadySubmitting,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EvaluateOutcome {
    /// The response was applied; `items` results are scheduled at `anchor`.
    Completed { items: usize, anchor: Point },
    /// The request is running in the background; drive it with `tick`.
    Submitted,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TickReport {
    pub completed: Option<EvaluateOutcome>,
    pub materialized: usize,
    pub typeset: bool,
    pub reset: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct PendingResult {
    due: Instant,
    markup: String,
    position: Point,
}

enum Submission {
    Ready(CalculateRequest),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Viewport {
    width: u32,
    height: u32,
    top_offset: u32,
}

type ServiceResponse = EvaluateResult<Vec<EvaluationItem>>;

/// One drawing board: surface, variables, overlay, and the round trips to
/// the evaluation service that tie them together.
///
/// Everything here runs on the UI thread. `submit` moves only the HTTP call
/// to a worker; its answer is applied from `tick`.
pub struct BoardSession {
    surface: Option<RasterSurface>,
    input: StrokeInput,
    bindings: VariableBindings,
    overlay: ResultOverlay,
    anchor: Point,
    phase: EvaluationPhase,
    reset_requested: bool,
    pending: Vec<PendingResult>,
    deferred_mount: Option<Viewport>,
    in_flight: Option<Receiver<ServiceResponse>>,
    last_error: Option<EvaluateError>,
    service: Arc<dyn EvaluationService>,
    typesetter: Box<dyn Typesetter>,
    config: SessionConfig,
}

impl BoardSession {
    pub fn new(
        service: Arc<dyn EvaluationService>,
        typesetter: Box<dyn Typesetter>,
        config: SessionConfig,
    ) -> Self {
        Self {
            surface: None,
            input: StrokeInput::default(),
            bindings: VariableBindings::default(),
            overlay: ResultOverlay::default(),
            anchor: DEFAULT_ANCHOR,
            phase: EvaluationPhase::Idle,
            reset_requested: false,
            pending: Vec::new(),
            deferred_mount: None,
            in_flight: None,
            last_error: None,
            service,
            typesetter,
            config,
        }
    }

    /// Create the surface, or resize it when already mounted. A resize while
    /// a request is in flight waits until its response has been applied, so
    /// the anchor comes from the drawing that was sent.
    pub fn mount(&mut self, viewport_width: u32, viewport_height: u32, top_offset: u32) {
        if self.is_submitting() && self.surface.is_some() {
            tracing::debug!(
                width = viewport_width,
                height = viewport_height,
                top_offset,
                "deferring resize until the in-flight evaluation settles"
            );
            self.deferred_mount = Some(Viewport {
                width: viewport_width,
                height: viewport_height,
                top_offset,
            });
            return;
        }
        match self.surface.as_mut() {
            Some(surface) => surface.resize(viewport_width, viewport_height, top_offset),
            None => {
                let surface =
                    RasterSurface::for_viewport(viewport_width, viewport_height, top_offset);
                tracing::debug!(
                    width = surface.width(),
                    height = surface.height(),
                    "mounted raster surface"
                );
                self.surface = Some(surface);
            }
        }
        self.input.handle_pointer_up();
    }

    pub fn is_mounted(&self) -> bool {
        self.surface.is_some()
    }

    pub fn surface(&self) -> Option<&RasterSurface> {
        self.surface.as_ref()
    }

    pub fn bindings(&self) -> &VariableBindings {
        &self.bindings
    }

    pub fn overlay(&self) -> &ResultOverlay {
        &self.overlay
    }

    pub fn anchor(&self) -> Point {
        self.anchor
    }

    pub fn phase(&self) -> EvaluationPhase {
        self.phase
    }

    pub fn is_submitting(&self) -> bool {
        self.phase.is_submitting()
    }

    pub fn flags(&self) -> SessionFlags {
        SessionFlags {
            is_drawing: self.input.is_drawing(),
            is_submitting: self.is_submitting(),
            reset_requested: self.reset_requested,
        }
    }

    pub fn last_error(&self) -> Option<&EvaluateError> {
        self.last_error.as_ref()
    }

    pub fn pending_results(&self) -> usize {
        self.pending.len()
    }

    /// Earliest time a scheduled result becomes visible.
    pub fn next_due(&self) -> Option<Instant> {
        self.pending.iter().map(|pending| pending.due).min()
    }

    /// Nothing in flight and nothing waiting to be shown.
    pub fn is_settled(&self) -> bool {
        self.phase == EvaluationPhase::Idle && self.pending.is_empty()
    }

    pub fn color(&self) -> Color {
        self.input.color()
    }

    pub fn set_color(&mut self, color: Color) {
        self.input.set_color(color);
    }

    pub fn select_swatch(&mut self, index: usize) -> bool {
        self.input.select_swatch(index)
    }

    pub fn pointer_down(&mut self, point: Point) {
        if self.is_submitting() {
            tracing::debug!("ignoring pointer down while an evaluation is in flight");
            return;
        }
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        self.input.handle_pointer_down(surface, point);
    }

    pub fn pointer_move(&mut self, point: Point) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        self.input.handle_pointer_move(surface, point);
    }

    pub fn pointer_up(&mut self) {
        self.input.handle_pointer_up();
    }

    pub fn pointer_leave(&mut self) {
        self.input.handle_pointer_up();
    }

    /// Drag handler for overlay entry `index`.
    pub fn reposition_result(&mut self, index: usize, position: Point) -> bool {
        self.overlay.reposition(index, position)
    }

    /// Send the drawing and wait for the answer.
    pub fn evaluate(&mut self, now: Instant) -> EvaluateResult<EvaluateOutcome> {
        let request = match self.begin_submission()? {
            Submission::Ready(request) => request,
            Submission::Skipped(reason) => return Ok(EvaluateOutcome::Skipped(reason)),
        };
        let response = self.service.calculate(&request);
        self.finish_submission(response, now)
    }

    /// Send the drawing from a worker thread. The answer is applied by a
    /// later `tick`.
    pub fn submit(&mut self) -> EvaluateResult<EvaluateOutcome> {
        let request = match self.begin_submission()? {
            Submission::Ready(request) => request,
            Submission::Skipped(reason) => return Ok(EvaluateOutcome::Skipped(reason)),
        };

        let (tx, rx) = mpsc::channel();
        let service = Arc::clone(&self.service);
        let spawned = std::thread::Builder::new()
            .name("math-board-evaluate".into())
            .spawn(move || {
                let _ = tx.send(service.calculate(&request));
            });

        match spawned {
            Ok(_) => {
                self.in_flight = Some(rx);
                Ok(EvaluateOutcome::Submitted)
            }
            Err(err) => self.finish_submission(
                Err(EvaluateError::transport(format!(
                    "spawn evaluation worker: {err}"
                ))),
                Instant::now(),
            ),
        }
    }

    /// Ask for a reset on the next `tick`.
    pub fn request_reset(&mut self) {
        self.reset_requested = true;
    }

    /// Clear the surface, overlay and variables, and forget any scheduled or
    /// in-flight results.
    pub fn reset(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.clear();
        }
        self.overlay.reset();
        self.bindings.reset();
        self.anchor = DEFAULT_ANCHOR;
        self.pending.clear();
        if self.in_flight.take().is_some() {
            tracing::debug!("discarding in-flight evaluation on reset");
        }
        self.input.handle_pointer_up();
        self.last_error = None;
        self.reset_requested = false;
        self.transition(EvaluationPhase::Idle);
        self.apply_deferred_mount();
        tracing::debug!("board session reset");
    }

    /// Drive the session from the event loop: apply a requested reset, pick
    /// up a finished background request, show results that are due, and
    /// flush typesetting.
    pub fn tick(&mut self, now: Instant) -> EvaluateResult<TickReport> {
        let mut report = TickReport::default();
        if self.reset_requested {
            self.reset();
            report.reset = true;
        }

        let mut failure = None;
        if let Some(response) = self.poll_in_flight() {
            match self.finish_submission(response, now) {
                Ok(outcome) => report.completed = Some(outcome),
                Err(err) => failure = Some(err),
            }
        }

        report.materialized = self.materialize_due(now);
        report.typeset = self.overlay.flush_typeset(self.typesetter.as_mut());

        match failure {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }

    fn begin_submission(&mut self) -> EvaluateResult<Submission> {
        if self.is_submitting() {
            tracing::debug!("evaluation already in flight; ignoring trigger");
            return Ok(Submission::Skipped(SkipReason::AlreadySubmitting));
        }
        let Some(surface) = self.surface.as_ref() else {
            tracing::debug!("evaluation requested before the surface was mounted");
            return Ok(Submission::Skipped(SkipReason::NotMounted));
        };

        let image = surface.export_snapshot().map_err(|err| {
            tracing::warn!(error = %err, "failed to snapshot surface");
            err
        })?;
        let request = CalculateRequest {
            image,
            dict_of_vars: self.bindings.snapshot(),
        };

        self.input.handle_pointer_up();
        self.last_error = None;
        self.transition(EvaluationPhase::Submitting);
        Ok(Submission::Ready(request))
    }

    fn poll_in_flight(&mut self) -> Option<ServiceResponse> {
        let rx = self.in_flight.as_ref()?;
        let response = match rx.try_recv() {
            Ok(response) => response,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(EvaluateError::transport(
                "evaluation worker exited without a response",
            )),
        };
        self.in_flight = None;
        Some(response)
    }

    fn finish_submission(
        &mut self,
        response: ServiceResponse,
        now: Instant,
    ) -> EvaluateResult<EvaluateOutcome> {
        let settled = if self.pending.is_empty() {
            EvaluationPhase::Idle
        } else {
            EvaluationPhase::Materializing
        };

        let items = match response {
            Ok(items) => items,
            Err(err) => {
                self.transition(settled);
                self.apply_deferred_mount();
                tracing::warn!(error = %err, "evaluation failed; board left unchanged");
                self.last_error = Some(err.clone());
                return Err(err);
            }
        };

        let assigned = self.bindings.apply_assignments(&items);

        let anchor = self
            .surface
            .as_ref()
            .map(RasterSurface::anchor)
            .unwrap_or(DEFAULT_ANCHOR);
        self.anchor = anchor;
        if let Some(surface) = self.surface.as_mut() {
            surface.clear();
        }

        let due = now + self.config.materialize_delay;
        for item in &items {
            self.pending.push(PendingResult {
                due,
                markup: render_markup(&item.expression, &item.answer),
                position: anchor,
            });
        }
        self.transition(if self.pending.is_empty() {
            EvaluationPhase::Idle
        } else {
            EvaluationPhase::Materializing
        });
        self.apply_deferred_mount();

        tracing::info!(
            items = items.len(),
            assigned,
            anchor_x = anchor.x,
            anchor_y = anchor.y,
            "evaluation completed"
        );
        Ok(EvaluateOutcome::Completed {
            items: items.len(),
            anchor,
        })
    }

    fn apply_deferred_mount(&mut self) {
        if let Some(viewport) = self.deferred_mount.take() {
            self.mount(viewport.width, viewport.height, viewport.top_offset);
        }
    }

    fn materialize_due(&mut self, now: Instant) -> usize {
        if self.pending.is_empty() {
            return 0;
        }
        let mut materialized = 0;
        for pending in std::mem::take(&mut self.pending) {
            if pending.due <= now {
                self.overlay.append(pending.markup, pending.position);
                materialized += 1;
            } else {
                self.pending.push(pending);
            }
        }
        if self.pending.is_empty() && self.phase == EvaluationPhase::Materializing {
            self.transition(EvaluationPhase::Idle);
        }
        materialized
    }

    fn transition(&mut self, next: EvaluationPhase) {
        if !can_transition(self.phase, next) {
            tracing::warn!(from = ?self.phase, to = ?next, "unexpected evaluation phase change");
        }
        if self.phase != next {
            tracing::debug!(from = ?self.phase, to = ?next, "evaluation phase");
        }
        self.phase = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::overlay::LogTypesetter;
    use std::sync::Mutex;

    struct CannedService {
        response: ServiceResponse,
        requests: Mutex<Vec<CalculateRequest>>,
    }

    impl CannedService {
        fn new(response: ServiceResponse) -> Arc<Self> {
            Arc::new(Self {
                response,
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    impl EvaluationService for CannedService {
        fn calculate(&self, request: &CalculateRequest) -> ServiceResponse {
            self.requests.lock().unwrap().push(request.clone());
            self.response.clone()
        }
    }

    fn session(service: Arc<CannedService>) -> BoardSession {
        BoardSession::new(service, Box::new(LogTypesetter), SessionConfig::default())
    }

    #[test]
    fn evaluate_before_mount_is_a_no_op() {
        let service = CannedService::new(Ok(vec![EvaluationItem::new("1", "1", false)]));
        let mut session = session(Arc::clone(&service));
        let outcome = session.evaluate(Instant::now()).unwrap();
        assert_eq!(outcome, EvaluateOutcome::Skipped(SkipReason::NotMounted));
        assert!(service.requests.lock().unwrap().is_empty());
        assert!(!session.is_submitting());
    }

    #[test]
    fn pointer_events_before_mount_are_ignored() {
        let service = CannedService::new(Ok(Vec::new()));
        let mut session = session(service);
        session.pointer_down(Point::new(1.0, 1.0));
        session.pointer_move(Point::new(5.0, 5.0));
        session.pointer_up();
        assert!(!session.flags().is_drawing);
    }

    #[test]
    fn results_wait_for_the_delay() {
        let service = CannedService::new(Ok(vec![
            EvaluationItem::new("a", "1", false),
            EvaluationItem::new("b", "2", false),
        ]));
        let mut session = session(service);
        session.mount(100, 100, 0);

        let start = Instant::now();
        session.evaluate(start).unwrap();
        assert_eq!(session.pending_results(), 2);
        assert_eq!(session.phase(), EvaluationPhase::Materializing);
        assert_eq!(session.next_due(), Some(start + DEFAULT_MATERIALIZE_DELAY));

        let early = session.tick(start + Duration::from_millis(199)).unwrap();
        assert_eq!(early.materialized, 0);
        assert!(session.overlay().is_empty());

        let due = session.tick(start + DEFAULT_MATERIALIZE_DELAY).unwrap();
        assert_eq!(due.materialized, 2);
        assert!(due.typeset);
        assert!(session.is_settled());
    }

    #[test]
    fn request_carries_current_bindings() {
        let service = CannedService::new(Ok(vec![EvaluationItem::new("x", "5", true)]));
        let mut session = session(Arc::clone(&service));
        session.mount(64, 64, 0);
        session.evaluate(Instant::now()).unwrap();
        session.evaluate(Instant::now()).unwrap();

        let requests = service.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].dict_of_vars.is_empty());
        assert_eq!(
            requests[1].dict_of_vars.get("x").map(String::as_str),
            Some("5")
        );
        assert!(requests[1].image.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn requested_reset_applies_on_tick() {
        let service = CannedService::new(Ok(vec![EvaluationItem::new("x", "5", true)]));
        let mut session = session(service);
        session.mount(64, 64, 0);
        session.evaluate(Instant::now()).unwrap();

        session.request_reset();
        assert!(session.flags().reset_requested);
        let report = session.tick(Instant::now()).unwrap();
        assert!(report.reset);
        assert!(!session.flags().reset_requested);
        assert!(session.bindings().is_empty());
        assert_eq!(session.pending_results(), 0);
    }
}
