//! Core library for charsheet.
//! Provides the character sheet row model (notes, traits, skills, techniques, spells,
//! equipment), a versioned XML codec with byte-for-byte re-save guarantees, change
//! notification, undo, and derived skill levels.

pub mod codec;
mod document;
pub mod kinds;
pub mod notify;
pub mod prereq;
pub mod resolve;
pub mod row;
mod save;
pub mod settings;
pub mod skill_default;
pub mod statics;
pub mod undo;
pub mod weapon;
pub mod xml;

pub use codec::LoadState;
pub use document::Document;
pub use kinds::{Family, RowKind};
pub use notify::{Notifier, NotifierTarget};
pub use row::{CaseSensitivity, Row, RowId};
pub use save::{LineEnding, LoadedSheet, SheetFormat};
pub use settings::Settings;
pub use xml::CodecError;
