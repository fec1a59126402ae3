use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::config::{
    self, ConfigError, Configuration, FieldDefinition, FieldValue, TransportFailure,
    fetch_config_text, parse_config,
};
use crate::export;
use crate::form::deriver::{FieldEntry, derive};
use crate::form::signals::{ResetBus, ResetSignal};
use crate::match_data::{MatchRecord, TeamOption, team_options};

/// Snapshot of everything the store holds.
///
/// A snapshot always pairs a configuration with the value list derived from it
/// (plus any updates made since), never a mix of two configurations.
#[derive(Debug, Clone)]
pub struct FormState {
    form_data: Arc<Configuration>,
    field_values: Vec<FieldEntry>,
    index: HashMap<String, usize>,
    match_data: Arc<Vec<MatchRecord>>,
    /// Bumped on every configuration commit.
    generation: u64,
}

impl FormState {
    fn new(form_data: Arc<Configuration>, match_data: Arc<Vec<MatchRecord>>) -> Self {
        let (field_values, index) = derive_indexed(&form_data);
        Self {
            form_data,
            field_values,
            index,
            match_data,
            generation: 0,
        }
    }

    pub fn config(&self) -> &Arc<Configuration> {
        &self.form_data
    }

    /// Values in stable (declaration) order.
    pub fn field_values(&self) -> &[FieldEntry] {
        &self.field_values
    }

    pub fn get(&self, code: &str) -> Option<&FieldValue> {
        self.index.get(code).map(|&i| &self.field_values[i].value)
    }

    pub fn match_data(&self) -> &Arc<Vec<MatchRecord>> {
        &self.match_data
    }

    /// Number of configuration commits since the store was created.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Insert or overwrite a value. Returns `true` if `code` was not known yet.
    fn upsert(&mut self, code: &str, value: FieldValue) -> bool {
        match self.index.get(code) {
            Some(&i) => {
                self.field_values[i].value = value;
                false
            }
            None => {
                self.index.insert(code.to_string(), self.field_values.len());
                self.field_values.push(FieldEntry::new(code, value));
                true
            }
        }
    }
}

fn derive_indexed(config: &Configuration) -> (Vec<FieldEntry>, HashMap<String, usize>) {
    let values = derive(config);
    let index = values
        .iter()
        .enumerate()
        .map(|(i, e)| (e.code.clone(), i))
        .collect();
    (values, index)
}

/// Form state store.
///
/// Cheap to clone: clones share the same state and reset bus, so the
/// store is constructed once at startup and handed to every consumer. All writes go
/// through a single `watch` sender, which serializes them; readers always borrow a
/// consistent [`FormState`].
#[derive(Debug, Clone)]
pub struct FormStore {
    state: Arc<watch::Sender<FormState>>,
    bus: ResetBus,
    default_config: Arc<Configuration>,
    /// Built on demand by `fetch_config_from_url` when not supplied.
    client: Option<reqwest::Client>,
}

impl FormStore {
    /// Create a store whose initial (and reset) configuration is `default_config`.
    pub fn new(default_config: Configuration) -> Self {
        let default_config = Arc::new(default_config);
        let initial = FormState::new(default_config.clone(), Arc::new(Vec::new()));
        let (state, _) = watch::channel(initial);
        Self {
            state: Arc::new(state),
            bus: ResetBus::new(),
            default_config,
            client: None,
        }
    }

    /// Create a store from the configuration bundled with the crate.
    pub fn with_bundled_default() -> Result<Self, ConfigError> {
        Ok(Self::new(config::bundled_config()?))
    }

    /// Use a custom HTTP client for [`FormStore::fetch_config_from_url`].
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn bus(&self) -> &ResetBus {
        &self.bus
    }

    /// Current value of `code`, or `None` if no such code exists.
    pub fn get_field_value(&self, code: &str) -> Option<FieldValue> {
        self.state.borrow().get(code).cloned()
    }

    /// Set the value of `code`, appending a new entry if the code is unknown.
    pub fn update_value(&self, code: &str, value: FieldValue) {
        let mut appended = false;
        self.state.send_modify(|s| appended = s.upsert(code, value));
        if appended {
            // Tolerated so a widget/config mismatch does not lose input, but it
            // usually points at a configuration bug.
            warn!(
                target: "qrscout::store",
                %code,
                "Value written for a code the configuration does not declare"
            );
        }
    }

    /// Replace the configuration wholesale and regenerate every value.
    ///
    /// `ForceReset` is emitted before the new state is committed, but while the
    /// write lock is held, so a listener that reacts by reading the store already
    /// sees the new configuration together with its derived values.
    pub fn set_form_data(&self, config: Configuration) {
        self.commit(Arc::new(config));
    }

    /// Alias of [`FormStore::set_form_data`].
    pub fn replace_configuration(&self, config: Configuration) {
        self.set_form_data(config);
    }

    fn commit(&self, config: Arc<Configuration>) {
        let (values, index) = derive_indexed(&config);
        let fields = values.len();
        let title = config.title.clone();

        self.state.send_modify(|s| {
            self.bus.emit(ResetSignal::ForceReset);
            s.form_data = config;
            s.field_values = values;
            s.index = index;
            s.generation += 1;
        });

        info!(target: "qrscout::store", %title, fields, "Configuration applied");
    }

    /// Parse and validate `text`, then apply it. On failure the store is untouched.
    pub fn set_config(&self, text: &str) -> Result<(), ConfigError> {
        match parse_config(text) {
            Ok(config) => {
                self.set_form_data(config);
                Ok(())
            }
            Err(err) => {
                warn!(target: "qrscout::store", kind = ?err.kind(), error = %err, "Rejected configuration");
                Err(err)
            }
        }
    }

    /// Fetch a configuration over HTTP and apply it via [`FormStore::set_config`].
    pub async fn fetch_config_from_url(&self, url: &str) -> Result<(), ConfigError> {
        let client = match &self.client {
            Some(client) => client.clone(),
            None => config::http_client().map_err(|e| ConfigError::Transport {
                url: url.to_string(),
                failure: TransportFailure::Network(e),
            })?,
        };
        let text = fetch_config_text(&client, url).await.inspect_err(|err| {
            warn!(target: "qrscout::store", %url, error = %err, "Configuration fetch failed");
        })?;
        self.set_config(&text)
    }

    /// Re-apply the default configuration. Calling it repeatedly yields identical values.
    pub fn reset_to_default_config(&self) {
        debug!(target: "qrscout::store", "Restoring default configuration");
        self.commit(self.default_config.clone());
    }

    /// Ask every mounted widget to reset according to its own behavior.
    /// Returns the number of widgets notified.
    pub fn reset_fields(&self) -> usize {
        debug!(target: "qrscout::store", "User reset requested");
        self.bus.emit(ResetSignal::Reset)
    }

    pub fn get_config(&self) -> Arc<Configuration> {
        self.state.borrow().form_data.clone()
    }

    /// Current configuration together with its commit generation, read atomically.
    pub fn config_generation(&self) -> (Arc<Configuration>, u64) {
        let state = self.state.borrow();
        (state.form_data.clone(), state.generation)
    }

    /// Look up a field definition by section name and code.
    pub fn field_definition(&self, section: &str, code: &str) -> Option<FieldDefinition> {
        self.state
            .borrow()
            .form_data
            .field_in_section(section, code)
            .cloned()
    }

    /// Copy of the current values in stable order.
    pub fn field_values(&self) -> Vec<FieldEntry> {
        self.state.borrow().field_values.clone()
    }

    /// Consistent copy of the whole state.
    pub fn snapshot(&self) -> FormState {
        self.state.borrow().clone()
    }

    /// Current values joined with the configuration's delimiter.
    pub fn export_string(&self) -> String {
        let state = self.state.borrow();
        export::export_string(&state.field_values, &state.form_data.delimiter)
    }

    /// Value shown in the floating banner, if the configuration enables one.
    pub fn floating_value(&self) -> Option<FieldValue> {
        let state = self.state.borrow();
        let floating = state.form_data.floating_field.as_ref()?;
        if !floating.show {
            return None;
        }
        state.get(&floating.code_value).cloned()
    }

    pub fn set_match_data(&self, data: Vec<MatchRecord>) {
        let matches = data.len();
        let data = Arc::new(data);
        self.state.send_modify(|s| s.match_data = data);
        debug!(target: "qrscout::store", matches, "Match data stored");
    }

    pub fn match_data(&self) -> Arc<Vec<MatchRecord>> {
        self.state.borrow().match_data.clone()
    }

    /// Teams for the match currently entered in the field `match_code`.
    pub fn team_options(&self, match_code: &str) -> Vec<TeamOption> {
        let state = self.state.borrow();
        let Some(number) = state.get(match_code).and_then(FieldValue::as_number) else {
            return Vec::new();
        };
        if number < 1.0 || number.fract() != 0.0 || number > f64::from(u32::MAX) {
            return Vec::new();
        }
        team_options(&state.match_data, number as u32)
    }

    /// Receive a notification on every state change.
    pub fn subscribe(&self) -> watch::Receiver<FormState> {
        self.state.subscribe()
    }

    pub fn subscribe_resets(&self) -> broadcast::Receiver<ResetSignal> {
        self.bus.subscribe()
    }
}
