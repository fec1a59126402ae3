//! Headless model of a mounted field widget.
//!
//! A widget owns a copy of its field definition and current value(s), writes user
//! input through to the store, and reacts to reset signals from the bus:
//! - `Reset` follows the field's `formResetBehavior`
//!   (`reset` -> default, `preserve` -> keep, `increment` -> advance by `step`).
//! - `ForceReset` reloads the definition from the store and takes its default,
//!   whatever the behavior. A widget whose code disappeared is detached.
//!
//! A widget that falls behind the bus resynchronizes from the store: if no
//! configuration was committed meanwhile, every missed signal was a `Reset` and is
//! replayed on top of the stored value; otherwise the definition is reloaded and
//! the stored values are adopted.

use tokio::sync::broadcast::{Receiver, error::RecvError, error::TryRecvError};
use tracing::{debug, trace};

use crate::config::{FieldDefinition, FieldKind, FieldValue, ResetBehavior};
use crate::form::deriver::{FieldEntry, action_count_code, action_times_code, derive_field};
use crate::form::signals::ResetSignal;
use crate::form::store::FormStore;

static UNSET: FieldValue = FieldValue::Unset;

pub struct FieldWidget {
    store: FormStore,
    field: FieldDefinition,
    entries: Vec<FieldEntry>,
    signals: Receiver<ResetSignal>,
    detached: bool,
    /// Store generation the definition was taken from.
    generation: u64,
}

impl FieldWidget {
    /// Mount the widget for `code`, picking up any value already in the store.
    /// Returns `None` if the current configuration has no such field.
    pub fn mount(store: &FormStore, code: &str) -> Option<Self> {
        // Subscribe first so no signal emitted after the lookup is missed.
        let signals = store.subscribe_resets();
        let (config, generation) = store.config_generation();
        let field = config.find_field(code)?.clone();
        let entries = derive_field(&field)
            .into_iter()
            .map(|e| match store.get_field_value(&e.code) {
                Some(value) => FieldEntry::new(e.code, value),
                None => e,
            })
            .collect();
        trace!(target: "qrscout::widget", %code, "Widget mounted");
        Some(Self {
            store: store.clone(),
            field,
            entries,
            signals,
            detached: false,
            generation,
        })
    }

    pub fn code(&self) -> &str {
        &self.field.code
    }

    pub fn field(&self) -> &FieldDefinition {
        &self.field
    }

    /// Primary value (the only one for non-composite fields).
    pub fn value(&self) -> &FieldValue {
        self.entries
            .first()
            .map_or(&UNSET, |e| &e.value)
    }

    pub fn entries(&self) -> &[FieldEntry] {
        &self.entries
    }

    /// `true` once a configuration replacement removed this widget's field.
    pub fn is_detached(&self) -> bool {
        self.detached
    }

    /// User input for a single-valued field.
    pub fn set_value(&mut self, value: FieldValue) {
        if self.detached || self.field.kind == FieldKind::ActionTracker {
            return;
        }
        if let Some(entry) = self.entries.first_mut() {
            entry.value = value.clone();
            self.store.update_value(&entry.code, value);
        }
    }

    /// Record one occurrence of `action` at `at_secs` on an action tracker:
    /// bumps its count and appends the time to its comma-separated times.
    pub fn record_action(&mut self, action: &str, at_secs: f64) -> bool {
        if self.detached || self.field.kind != FieldKind::ActionTracker {
            return false;
        }
        let count_code = action_count_code(&self.field.code, action);
        let times_code = action_times_code(&self.field.code, action);
        let mut found = false;
        for entry in &mut self.entries {
            if entry.code == count_code {
                let n = entry.value.as_number().unwrap_or(0.0);
                entry.value = FieldValue::Number(n + 1.0);
            } else if entry.code == times_code {
                let mut times = entry.value.as_text().unwrap_or_default().to_string();
                if !times.is_empty() {
                    times.push(',');
                }
                times.push_str(&format!("{at_secs:.1}"));
                entry.value = FieldValue::Text(times);
            } else {
                continue;
            }
            found = true;
            self.store.update_value(&entry.code, entry.value.clone());
        }
        found
    }

    /// Apply one reset signal.
    pub fn apply(&mut self, signal: ResetSignal) {
        if self.detached {
            return;
        }
        match signal {
            ResetSignal::ForceReset => self.reload(),
            ResetSignal::Reset => match self.field.form_reset_behavior {
                ResetBehavior::Preserve => {
                    trace!(target: "qrscout::widget", code = %self.field.code, "Reset ignored (preserve)");
                }
                ResetBehavior::Reset => self.restore_default(),
                ResetBehavior::Increment => self.increment(),
            },
        }
    }

    /// Apply every signal already queued, without waiting. Returns how many were applied.
    pub fn process_pending(&mut self) -> usize {
        let mut applied = 0;
        loop {
            match self.signals.try_recv() {
                Ok(signal) => {
                    self.apply(signal);
                    applied += 1;
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    self.resync(skipped);
                    applied += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Closed) => {
                    self.detached = true;
                    break;
                }
            }
        }
        applied
    }

    /// Wait for the next signal and apply it. Returns `None` once the bus is gone.
    pub async fn next_signal(&mut self) -> Option<ResetSignal> {
        loop {
            match self.signals.recv().await {
                Ok(signal) => {
                    self.apply(signal);
                    return Some(signal);
                }
                Err(RecvError::Lagged(skipped)) => self.resync(skipped),
                Err(RecvError::Closed) => {
                    self.detached = true;
                    return None;
                }
            }
        }
    }

    /// Catch up after `skipped` signals were dropped from the bus.
    fn resync(&mut self, skipped: u64) {
        if self.detached {
            return;
        }
        if self.store.config_generation().1 == self.generation {
            debug!(target: "qrscout::widget", code = %self.field.code, skipped, "Missed reset signals; replaying");
            self.pull_from_store();
            let replays = match self.field.form_reset_behavior {
                ResetBehavior::Increment => skipped,
                ResetBehavior::Reset | ResetBehavior::Preserve => 1,
            };
            for _ in 0..replays {
                self.apply(ResetSignal::Reset);
            }
        } else {
            debug!(target: "qrscout::widget", code = %self.field.code, skipped, "Missed configuration change; reloading");
            self.reload();
            if !self.detached {
                self.pull_from_store();
            }
        }
    }

    fn pull_from_store(&mut self) {
        for entry in &mut self.entries {
            if let Some(value) = self.store.get_field_value(&entry.code) {
                entry.value = value;
            }
        }
    }

    fn reload(&mut self) {
        let (config, generation) = self.store.config_generation();
        self.generation = generation;
        match config.find_field(&self.field.code) {
            Some(field) => {
                self.field = field.clone();
                self.entries = derive_field(&self.field);
                trace!(target: "qrscout::widget", code = %self.field.code, "Widget reinitialized");
            }
            None => {
                debug!(target: "qrscout::widget", code = %self.field.code, "Field removed by new configuration; detaching");
                self.detached = true;
            }
        }
    }

    fn restore_default(&mut self) {
        self.entries = derive_field(&self.field);
        self.write_all();
    }

    fn increment(&mut self) {
        let current = self.value().as_number();
        match current {
            Some(n) if self.field.kind.is_numeric() => {
                let mut next = n + self.field.step.unwrap_or(1.0);
                if let Some(max) = self.field.max {
                    next = next.min(max);
                }
                self.set_value(FieldValue::Number(next));
            }
            _ => self.restore_default(),
        }
    }

    fn write_all(&self) {
        for entry in &self.entries {
            self.store.update_value(&entry.code, entry.value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Configuration, bundled_config};
    use serde_json::json;

    fn store() -> FormStore {
        FormStore::new(bundled_config().unwrap())
    }

    fn alt_config() -> Configuration {
        serde_json::from_value(json!({
            "title": "Alt",
            "page_title": "Alt",
            "defaultTheme": "dark",
            "delimiter": ",",
            "theme": {"light": {}, "dark": {}},
            "sections": [{
                "name": "Auto",
                "fields": [{
                    "title": "Coral", "type": "counter", "code": "autoCoral",
                    "required": false, "formResetBehavior": "preserve", "defaultValue": 5
                }]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn mount_unknown_code_fails() {
        assert!(FieldWidget::mount(&store(), "nope").is_none());
    }

    #[test]
    fn set_value_writes_through() {
        let s = store();
        let mut w = FieldWidget::mount(&s, "comments").unwrap();
        w.set_value(FieldValue::Text("quick".into()));
        assert_eq!(s.get_field_value("comments"), Some(FieldValue::Text("quick".into())));
        assert_eq!(w.value(), &FieldValue::Text("quick".into()));
    }

    #[test]
    fn reset_restores_default() {
        let s = store();
        let mut w = FieldWidget::mount(&s, "autoCoral").unwrap();
        w.set_value(FieldValue::Number(6.0));
        s.reset_fields();
        assert_eq!(w.process_pending(), 1);
        assert_eq!(w.value(), &FieldValue::Number(0.0));
        assert_eq!(s.get_field_value("autoCoral"), Some(FieldValue::Number(0.0)));
    }

    #[test]
    fn preserve_ignores_reset() {
        let s = store();
        let mut w = FieldWidget::mount(&s, "scouter").unwrap();
        w.set_value(FieldValue::Text("ZY".into()));
        s.reset_fields();
        w.process_pending();
        assert_eq!(s.get_field_value("scouter"), Some(FieldValue::Text("ZY".into())));
    }

    #[test]
    fn increment_advances_match_number() {
        let s = store();
        let mut w = FieldWidget::mount(&s, "matchNumber").unwrap();
        w.set_value(FieldValue::Number(12.0));
        s.reset_fields();
        w.process_pending();
        assert_eq!(s.get_field_value("matchNumber"), Some(FieldValue::Number(13.0)));
    }

    #[test]
    fn increment_clamps_to_max() {
        let mut cfg = bundled_config().unwrap();
        for section in &mut cfg.sections {
            for field in &mut section.fields {
                if field.code == "driverSkill" {
                    field.form_reset_behavior = ResetBehavior::Increment;
                }
            }
        }
        let s = FormStore::new(cfg);
        let mut w = FieldWidget::mount(&s, "driverSkill").unwrap();
        w.set_value(FieldValue::Number(5.0));
        w.apply(ResetSignal::Reset);
        assert_eq!(w.value(), &FieldValue::Number(5.0));
    }

    #[test]
    fn action_tracker_records_and_resets() {
        let s = store();
        let mut w = FieldWidget::mount(&s, "pickup").unwrap();
        assert_eq!(w.entries().len(), 4);
        assert!(w.record_action("coral", 3.0));
        assert!(w.record_action("coral", 7.5));
        assert!(!w.record_action("ball", 1.0));

        assert_eq!(s.get_field_value("pickup_coral_count"), Some(FieldValue::Number(2.0)));
        assert_eq!(
            s.get_field_value("pickup_coral_times"),
            Some(FieldValue::Text("3.0,7.5".into()))
        );

        s.reset_fields();
        w.process_pending();
        assert_eq!(s.get_field_value("pickup_coral_count"), Some(FieldValue::Number(0.0)));
        assert_eq!(s.get_field_value("pickup_coral_times"), Some(FieldValue::Text(String::new())));
    }

    #[test]
    fn force_reset_reloads_from_new_config() {
        let s = store();
        let mut coral = FieldWidget::mount(&s, "autoCoral").unwrap();
        let mut comments = FieldWidget::mount(&s, "comments").unwrap();
        coral.set_value(FieldValue::Number(9.0));

        s.set_form_data(alt_config());
        coral.process_pending();
        comments.process_pending();

        assert_eq!(coral.value(), &FieldValue::Number(5.0));
        assert_eq!(coral.field().form_reset_behavior, ResetBehavior::Preserve);
        assert!(!coral.is_detached());
        assert!(comments.is_detached());

        // Detached widgets no longer write to the store.
        comments.set_value(FieldValue::Text("late".into()));
        assert_eq!(s.get_field_value("comments"), None);
    }

    /// Emit more resets than the bus retains, so the widget's receiver lags.
    fn flood_resets(s: &FormStore) {
        for _ in 0..20 {
            s.reset_fields();
        }
    }

    #[test]
    fn lagged_preserve_widget_keeps_value() {
        let s = store();
        let mut w = FieldWidget::mount(&s, "scouter").unwrap();
        w.set_value(FieldValue::Text("ZY".into()));
        flood_resets(&s);
        w.process_pending();
        assert_eq!(w.value(), &FieldValue::Text("ZY".into()));
        assert_eq!(s.get_field_value("scouter"), Some(FieldValue::Text("ZY".into())));
    }

    #[test]
    fn lagged_reset_widget_restores_default() {
        let s = store();
        let mut w = FieldWidget::mount(&s, "autoCoral").unwrap();
        w.set_value(FieldValue::Number(6.0));
        flood_resets(&s);
        w.process_pending();
        assert_eq!(w.value(), &FieldValue::Number(0.0));
        assert_eq!(s.get_field_value("autoCoral"), Some(FieldValue::Number(0.0)));
    }

    #[test]
    fn lagged_increment_widget_counts_every_reset() {
        let s = store();
        let mut w = FieldWidget::mount(&s, "matchNumber").unwrap();
        w.set_value(FieldValue::Number(12.0));
        flood_resets(&s);
        w.process_pending();
        assert_eq!(w.value(), &FieldValue::Number(32.0));
        assert_eq!(s.get_field_value("matchNumber"), Some(FieldValue::Number(32.0)));
    }

    #[test]
    fn lag_across_config_replacement_adopts_store_values() {
        let s = store();
        let mut coral = FieldWidget::mount(&s, "autoCoral").unwrap();
        let mut comments = FieldWidget::mount(&s, "comments").unwrap();
        coral.set_value(FieldValue::Number(9.0));

        s.set_form_data(alt_config());
        flood_resets(&s);
        coral.process_pending();
        comments.process_pending();

        assert_eq!(coral.field().form_reset_behavior, ResetBehavior::Preserve);
        assert_eq!(coral.value(), &FieldValue::Number(5.0));
        assert_eq!(s.get_field_value("autoCoral"), Some(FieldValue::Number(5.0)));
        assert!(comments.is_detached());
    }

    #[tokio::test]
    async fn next_signal_waits_for_bus() {
        let s = store();
        let mut w = FieldWidget::mount(&s, "autoCoral").unwrap();
        w.set_value(FieldValue::Number(3.0));

        let store = s.clone();
        tokio::spawn(async move {
            store.reset_fields();
        });

        assert_eq!(w.next_signal().await, Some(ResetSignal::Reset));
        assert_eq!(w.value(), &FieldValue::Number(0.0));
    }
}
