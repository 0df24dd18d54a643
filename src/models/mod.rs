pub mod live_reading;
pub mod redemption;
pub mod waste_entry;

pub use live_reading::LiveReading;
pub use redemption::Redemption;
pub use waste_entry::{EntryDraft, EntryOrigin, WasteCategory, WasteEntry};
