//! Fallback to the remote intent classifier.

use std::sync::Arc;

use tracing::{debug, warn};

use super::direct::AppPick;
use super::{Decision, Outcome, Route, Router};
use crate::kernel::dialogue::should_merge_context;
use crate::kernel::intent::registry::{intent_key, StepSpec};
use crate::kernel::intent::{
    keys, Action, Classification, Entities, Executor, IntentClassifier, IntentKind,
};
use crate::kernel::parse::numeric::first_integer;
use crate::kernel::parse::text::{contains_words, word_count};
use crate::kernel::parse::{extract_steps, normalize};
use crate::kernel::speech::planner::Cue;
use crate::kernel::telemetry::TelemetryEvent;
use crate::kernel::time::Timestamp;
use crate::services::apps::{extract_close_target, extract_open_target};

/// What a classifier label turns into once entities are filled in.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Mapped {
    Action(Action),
    /// A step intent with no magnitude in the utterance.
    NeedSteps(StepSpec),
    Adjust { less: bool },
    Choice { base: IntentKind, ids: Vec<String> },
    UnknownApp,
    Unsupported,
}

/// "volume to 40", "set it at 30 percent".
pub(super) fn wants_absolute(text: &str) -> bool {
    let t = normalize(text);
    contains_words(&t, "to") || contains_words(&t, "percent") || text.contains('%')
}

/// "volume up to 50" names a level, not a step count.
pub(super) fn absolute_level(spec: StepSpec, text: &str) -> Option<Action> {
    if spec.base != IntentKind::VolumeChange || !wants_absolute(text) {
        return None;
    }
    let value = first_integer(text)?;
    Some(Action::new(IntentKind::SetVolume, Entities::new().with(keys::VALUE, value.min(100))))
}

impl<E: Executor, C: IntentClassifier> Router<E, C> {
    pub(super) fn classify(&mut self, text: &str, t0: &str, now: Timestamp) -> Decision {
        let route = Route::Classifier;
        let Some(result) = self.classifier.classify(text) else {
            warn!("intent classifier unavailable");
            self.telemetry.record(TelemetryEvent::ClassifierUnavailable);
            self.history.break_chain();
            self.speak(Cue::NotSure);
            return Decision::new(route, Outcome::Failed);
        };
        let label = intent_key(&result.intent);
        debug!(
            label = %label,
            confidence = result.confidence,
            margin = result.margin(),
            "classified"
        );

        if !self.confident(&result) {
            if let Some(decision) = self.merge_with_context(&result, &label, text, t0, now) {
                return decision;
            }
            self.context.clear_context();
            self.history.break_chain();
            self.speak(Cue::NotSure);
            return Decision::new(route, Outcome::Rejected);
        }

        match self.map_classified(&label, text) {
            Mapped::Action(action) => self.perform(action, Some(text), route, now),
            Mapped::NeedSteps(spec) => self.step_request(spec, None, text, route, now),
            Mapped::Adjust { less } => self.adjust(less, text, route, now),
            Mapped::Choice { base, ids } => self.ask_choice(base, ids, route, now),
            Mapped::UnknownApp => {
                self.history.break_chain();
                self.speak(Cue::AppNotFound);
                Decision::new(route, Outcome::Rejected)
            }
            Mapped::Unsupported => {
                debug!(label = %label, "no mapping for label");
                self.history.break_chain();
                self.speak(Cue::NotImplemented);
                Decision::new(route, Outcome::Rejected)
            }
        }
    }

    pub(super) fn confident(&self, result: &Classification) -> bool {
        let cfg = &self.config.classifier;
        result.confidence >= cfg.min_confidence && result.margin() >= cfg.min_margin
    }

    /// "and spotify" right after "open chrome" opens spotify too.
    fn merge_with_context(
        &mut self,
        result: &Classification,
        label: &str,
        text: &str,
        t0: &str,
        now: Timestamp,
    ) -> Option<Decision> {
        let config = Arc::clone(&self.config);
        if result.confidence < config.classifier.context_min_confidence {
            return None;
        }
        let linkers = &config.phrases.followup_linkers;
        let words: Vec<&str> = t0.split_whitespace().collect();
        if word_count(t0) > config.classifier.followup_max_words
            || !words.iter().any(|w| linkers.contains(*w))
        {
            return None;
        }
        let ctx = self.context.get_context(now).cloned()?;
        if !should_merge_context(ctx.intent, label) {
            debug!(context = %ctx.intent, label, "context not merged");
            return None;
        }
        if !matches!(ctx.intent, IntentKind::OpenApp | IntentKind::CloseApp) {
            return None;
        }
        let rest: Vec<&str> = words.into_iter().filter(|w| !linkers.contains(*w)).collect();
        let AppPick::One(id) = self.resolve_app(&rest.join(" ")) else {
            return None;
        };
        // Consumed; a successful merge sets a fresh one.
        self.context.clear_context();
        debug!(context = %ctx.intent, app = %id, "merged with context");
        let action = Action::new(ctx.intent, Entities::new().with(keys::APP, id));
        Some(self.perform(action, Some(text), Route::Classifier, now))
    }

    /// Fills entities for a classifier label from the utterance itself.
    pub(super) fn map_classified(&self, label: &str, text: &str) -> Mapped {
        if let Some(spec) = self.steps.spec(label) {
            if let Some(action) = absolute_level(spec, text) {
                return Mapped::Action(action);
            }
            return match extract_steps(text) {
                Some(steps) => Mapped::Action(Action::step(
                    spec.base,
                    spec.direction,
                    steps,
                    &Entities::new(),
                )),
                None => Mapped::NeedSteps(spec),
            };
        }

        match label {
            "more_action" => return Mapped::Adjust { less: false },
            "less_action" => return Mapped::Adjust { less: true },
            _ => {}
        }

        let Ok(kind) = label.parse::<IntentKind>() else {
            return Mapped::Unsupported;
        };
        match kind {
            IntentKind::OpenApp | IntentKind::CloseApp => {
                let t = normalize(text);
                let target = if kind == IntentKind::OpenApp {
                    extract_open_target(&t)
                } else {
                    extract_close_target(&t)
                };
                match self.resolve_app(&target.unwrap_or(t)) {
                    AppPick::One(id) => {
                        Mapped::Action(Action::new(kind, Entities::new().with(keys::APP, id)))
                    }
                    AppPick::Many(ids) => Mapped::Choice { base: kind, ids },
                    AppPick::Missing => Mapped::UnknownApp,
                }
            }
            IntentKind::SetVolume => match first_integer(text) {
                Some(value) => Mapped::Action(Action::new(
                    kind,
                    Entities::new().with(keys::VALUE, value.min(100)),
                )),
                None => Mapped::Unsupported,
            },
            IntentKind::VolumeChange | IntentKind::BrightnessChange => Mapped::Unsupported,
            IntentKind::WindowSwitchStep | IntentKind::WindowSwitchEnd => Mapped::Unsupported,
            other => Mapped::Action(Action::bare(other)),
        }
    }
}
