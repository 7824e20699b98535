pub mod document;
pub mod extract;
pub mod families;

pub use document::{SaveDocument, parse_document};
pub use extract::{ParsedSave, parse_save};
pub use families::{LOG_TAGS, memory_family, sort_priority};
