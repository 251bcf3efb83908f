//! Workout session engine.
//!
//! `WorkoutController` owns the single active session, the timer that drives
//! rest countdowns, and the store both are persisted to. States:
//!
//! - **NoSession** → `start_workout` → **Active**
//! - **Active** → `complete_set` → **Active** (set counter advances)
//! - **Active** → `start_rest` → **Resting**
//! - **Resting** → `skip_rest` or countdown expiry → **Active**
//! - **Active** → `next_exercise` → **Active** (next exercise, set 1)
//! - any session → `end_workout` → summary recorded, back to **NoSession**
//!
//! Transitions whose preconditions do not hold are silent no-ops. The one
//! exception is starting a workout while another is running, which is
//! rejected with [`Error::SessionActive`] so progress is never dropped
//! without a summary.
//!
//! Every mutating call writes the session snapshot before returning, so a
//! controller reopened over the same store resumes where the last one
//! stopped.

use crate::history::WorkoutHistory;
use crate::store::{keys, KeyValueStore, StoreExt};
use crate::timer::{format_time, Cue, CueSink, Timer, TimerEvent, TimerState, TracingCues};
use crate::{
    ActiveSession, CompletedSet, CompletedWorkout, Error, Result, SessionPhase, TemplateExercise,
    WorkoutTemplate, DEFAULT_REST_SECONDS,
};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

pub struct WorkoutController<S: KeyValueStore> {
    store: S,
    session: Option<ActiveSession>,
    timer: Timer,
    cues: Box<dyn CueSink>,
    default_rest_seconds: u32,
}

impl<S: KeyValueStore> WorkoutController<S> {
    /// Open the controller, resuming any session persisted in `store`
    pub fn open(store: S) -> Self {
        Self::open_at(store, Utc::now())
    }

    pub fn open_at(store: S, now: DateTime<Utc>) -> Self {
        // A finished session is stored as an absent key; older blobs used `null`
        let session = store
            .load::<Option<ActiveSession>>(keys::ACTIVE_WORKOUT)
            .flatten()
            .map(|session| restore_snapshot(session, now));

        let mut timer = Timer::new();
        if let Some(ref session) = session {
            let elapsed = (now - session.start_time).num_seconds().max(0);
            let rest = session.is_resting().then_some(session.rest_time_left);
            timer.restore(u32::try_from(elapsed).unwrap_or(u32::MAX), rest);
            tracing::info!(
                "Resumed workout '{}' at exercise {} set {}",
                session.template.name,
                session.current_exercise_index + 1,
                session.current_set
            );
        }

        Self {
            store,
            session,
            timer,
            cues: Box::new(TracingCues),
            default_rest_seconds: DEFAULT_REST_SECONDS,
        }
    }

    /// Replace the cue sink (terminal bell, speaker, ...)
    pub fn with_cues(mut self, cues: impl CueSink + 'static) -> Self {
        self.cues = Box::new(cues);
        self
    }

    /// Rest used for exercises whose template rest is zero
    pub fn with_default_rest(mut self, seconds: u32) -> Self {
        self.default_rest_seconds = seconds.max(1);
        self
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    pub fn start_workout(&mut self, template: &WorkoutTemplate) -> Result<()> {
        self.start_workout_at(template, Utc::now())
    }

    /// Begin a session on a copy of `template`
    pub fn start_workout_at(&mut self, template: &WorkoutTemplate, now: DateTime<Utc>) -> Result<()> {
        if let Some(ref active) = self.session {
            tracing::warn!(
                "Refusing to start '{}': '{}' is still in progress",
                template.name,
                active.template.name
            );
            return Err(Error::SessionActive);
        }

        if template.exercises.is_empty() {
            tracing::warn!("Starting template '{}' with no exercises", template.name);
        }

        self.session = Some(ActiveSession::new(template.clone(), now));
        self.timer.reset();
        self.timer.start();
        self.cues.play(Cue::Start);
        tracing::info!("Started workout '{}'", template.name);
        self.persist()
    }

    /// Log a set for the current exercise and move the set counter on
    ///
    /// Resting is a separate step (`start_rest`) so callers can skip it.
    pub fn complete_set(&mut self, reps: u32, weight: Option<f64>) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            tracing::debug!("complete_set ignored: no active session");
            return Ok(());
        };
        if session.is_resting() {
            tracing::debug!("complete_set ignored: resting");
            return Ok(());
        }
        let Some(exercise) = session.current_exercise() else {
            tracing::debug!("complete_set ignored: no exercise at index {}", session.current_exercise_index);
            return Ok(());
        };

        let set = CompletedSet {
            exercise_id: exercise.id().to_string(),
            set_number: session.current_set,
            reps,
            weight,
        };
        tracing::debug!(
            "Completed set {} of '{}': {} reps",
            set.set_number,
            exercise.name(),
            reps
        );
        session.completed_sets.push(set);
        session.current_set += 1;
        self.persist()
    }

    pub fn start_rest(&mut self) -> Result<()> {
        self.start_rest_at(Utc::now())
    }

    /// Start the rest countdown configured for the current exercise
    pub fn start_rest_at(&mut self, now: DateTime<Utc>) -> Result<()> {
        let default_rest = self.default_rest_seconds;
        let Some(session) = self.session.as_mut() else {
            tracing::debug!("start_rest ignored: no active session");
            return Ok(());
        };
        if session.is_resting() {
            tracing::debug!("start_rest ignored: already resting");
            return Ok(());
        }
        let Some(exercise) = session.current_exercise() else {
            tracing::debug!("start_rest ignored: no current exercise");
            return Ok(());
        };

        let duration = match exercise.rest_seconds {
            0 => default_rest,
            secs => secs,
        };
        session.phase = SessionPhase::Resting;
        session.rest_time_left = duration;
        session.rest_ends_at = Some(now + Duration::seconds(i64::from(duration)));
        self.timer.start_rest(duration);
        self.cues.play(Cue::Rest);
        tracing::debug!("Resting for {}s", duration);
        self.persist()
    }

    /// End the rest countdown early
    pub fn skip_rest(&mut self) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            tracing::debug!("skip_rest ignored: no active session");
            return Ok(());
        };
        if !session.is_resting() {
            return Ok(());
        }

        end_rest(session);
        self.timer.skip_rest();
        tracing::debug!("Rest finished");
        self.persist()
    }

    /// Advance the timer by one second
    ///
    /// When the rest countdown expires the session returns to Active as if
    /// `skip_rest` had been called.
    pub fn tick(&mut self) -> Result<Option<TimerEvent>> {
        let Some(session) = self.session.as_mut() else {
            return Ok(None);
        };

        let event = self.timer.tick();
        if !session.is_resting() {
            return Ok(event);
        }

        session.rest_time_left = self.timer.state().rest_time_left;
        if event == Some(TimerEvent::RestComplete) {
            end_rest(session);
            self.cues.play(Cue::Finish);
            tracing::debug!("Rest countdown complete");
        }
        self.persist()?;
        Ok(event)
    }

    /// Move to the next exercise, resetting the set counter
    ///
    /// Ignored while resting and on the last exercise; past the last
    /// exercise the caller should end the workout instead.
    pub fn next_exercise(&mut self) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            tracing::debug!("next_exercise ignored: no active session");
            return Ok(());
        };
        if session.is_resting() {
            tracing::debug!("next_exercise ignored: resting");
            return Ok(());
        }
        if session.current_exercise_index + 1 >= session.template.exercises.len() {
            tracing::debug!("next_exercise ignored: already on the last exercise");
            return Ok(());
        }

        session.current_exercise_index += 1;
        session.current_set = 1;
        end_rest(session);
        tracing::debug!("Advanced to exercise {}", session.current_exercise_index + 1);
        self.persist()
    }

    pub fn end_workout(&mut self) -> Result<Option<CompletedWorkout>> {
        self.end_workout_at(Utc::now())
    }

    /// Finish the session, record its summary and clear it
    ///
    /// Cancelling and finishing are the same call. Without a session this
    /// returns `Ok(None)`.
    pub fn end_workout_at(&mut self, now: DateTime<Utc>) -> Result<Option<CompletedWorkout>> {
        let Some(session) = self.session.as_ref() else {
            tracing::debug!("end_workout ignored: no active session");
            return Ok(None);
        };

        let summary = summarize(session, now);
        // History first: if it cannot be written the session stays resumable
        WorkoutHistory::update(&mut self.store, |history| history.record(summary.clone()))?;

        self.session = None;
        self.timer.reset();
        self.persist()?;
        Ok(Some(summary))
    }

    /// Drop the session without recording anything
    pub fn discard_workout(&mut self) -> Result<bool> {
        let Some(session) = self.session.take() else {
            return Ok(false);
        };
        tracing::info!("Discarded workout '{}'", session.template.name);
        self.timer.reset();
        self.persist()?;
        Ok(true)
    }

    // ------------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------------

    pub fn session(&self) -> Option<&ActiveSession> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn current_exercise(&self) -> Option<&TemplateExercise> {
        self.session.as_ref().and_then(|s| s.current_exercise())
    }

    /// Target set count of the current exercise
    pub fn target_sets(&self) -> Option<u32> {
        self.current_exercise().map(|e| e.sets)
    }

    /// Sets still to do before the target is reached
    pub fn sets_remaining(&self) -> Option<u32> {
        let session = self.session.as_ref()?;
        let target = session.current_exercise()?.sets;
        Some(target.saturating_sub(session.current_set.saturating_sub(1)))
    }

    /// Whether the target set count for the current exercise has been met
    pub fn is_exercise_complete(&self) -> bool {
        self.sets_remaining() == Some(0)
    }

    pub fn is_last_exercise(&self) -> bool {
        self.session
            .as_ref()
            .map(|s| s.current_exercise_index + 1 >= s.template.exercises.len())
            .unwrap_or(false)
    }

    pub fn timer_state(&self) -> TimerState {
        self.timer.state()
    }

    pub fn elapsed_display(&self) -> String {
        format_time(self.timer.state().time_elapsed)
    }

    pub fn rest_display(&self) -> String {
        format_time(self.timer.state().rest_time_left)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn persist(&mut self) -> Result<()> {
        match self.session {
            Some(ref session) => self.store.save(keys::ACTIVE_WORKOUT, session),
            None => self.store.delete(keys::ACTIVE_WORKOUT),
        }
    }
}

fn end_rest(session: &mut ActiveSession) {
    session.phase = SessionPhase::Active;
    session.rest_time_left = 0;
    session.rest_ends_at = None;
}

/// Bring a stored snapshot back within the session invariants
///
/// Set numbers start at 1 and the exercise index stays in range. A rest
/// that ran out by the wall clock while nothing was ticking is over.
fn restore_snapshot(mut session: ActiveSession, now: DateTime<Utc>) -> ActiveSession {
    if session.current_set == 0 {
        tracing::warn!("Stored session has set number 0, resetting to 1");
        session.current_set = 1;
    }

    let exercises = session.template.exercises.len();
    if exercises > 0 && session.current_exercise_index >= exercises {
        tracing::warn!(
            "Stored exercise index {} is out of range for {} exercises",
            session.current_exercise_index,
            exercises
        );
        session.current_exercise_index = exercises - 1;
    }

    if !session.is_resting() {
        session.rest_time_left = 0;
        session.rest_ends_at = None;
        return session;
    }

    let remaining = match session.rest_ends_at {
        Some(ends_at) => {
            let ms = (ends_at - now).num_milliseconds().max(0);
            let secs = u32::try_from((ms + 999) / 1000).unwrap_or(u32::MAX);
            secs.min(session.rest_time_left)
        }
        None => session.rest_time_left,
    };
    if remaining == 0 {
        tracing::debug!("Rest ran out while the session was closed");
        end_rest(&mut session);
    } else {
        session.rest_time_left = remaining;
    }
    session
}

fn summarize(session: &ActiveSession, now: DateTime<Utc>) -> CompletedWorkout {
    let elapsed_ms = (now - session.start_time).num_milliseconds().max(0);
    let duration_minutes = (elapsed_ms as f64 / 60_000.0).round() as i64;

    CompletedWorkout {
        id: Uuid::new_v4().to_string(),
        template_id: session.template.id.clone(),
        name: session.template.name.clone(),
        date: now,
        duration_minutes,
        exercises: session.template.exercises.len(),
        completed_sets: session.completed_sets.len(),
        total_reps: session.total_reps(),
    }
}
