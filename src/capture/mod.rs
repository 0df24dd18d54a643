mod form;

pub use form::{EntryForm, ManualCategory, CATEGORY_REQUIRED_MESSAGE, QUANTITY_REQUIRED_MESSAGE};
