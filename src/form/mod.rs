#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

/*!
Form state module for QRScout.

This module wires together:
- `deriver`: turns a `Configuration` into the flat, ordered value list
- `store`: the shared `FormStore` (config + values + match data)
- `signals`: the reset bus (`Reset` / `ForceReset`)
- `widget`: a headless field widget that reacts to reset signals

Typical usage:
- Construct a `FormStore` once at startup and clone it into consumers.
- Mount a `FieldWidget` per rendered input.
- Call `FormStore::reset_fields` for a user reset, or `set_config` to hot-swap.

Example:
```no_run
use qrscout::config::FieldValue;
use qrscout::form::{FieldWidget, FormStore};

let store = FormStore::with_bundled_default()?;
let mut widget = FieldWidget::mount(&store, "autoCoral").expect("field exists");
widget.set_value(FieldValue::Number(3.0));
store.reset_fields();
widget.process_pending();
# Ok::<(), qrscout::config::ConfigError>(())
```
*/

pub mod deriver;
pub mod signals;
pub mod store;
pub mod widget;

// Re-exports for convenient access from `qrscout::form::*`
pub use deriver::{FieldEntry, action_count_code, action_times_code, derive, derive_field};
pub use signals::{ResetBus, ResetSignal};
pub use store::{FormState, FormStore};
pub use widget::FieldWidget;
