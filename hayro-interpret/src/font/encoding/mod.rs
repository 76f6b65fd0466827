mod glyph_names;
mod mac_expert;
mod mac_roman;
mod standard;
mod symbol;
mod win_ansi;
mod zapf_dings;

pub(crate) use glyph_names::*;
pub(crate) use mac_expert::*;
pub(crate) use mac_roman::*;
pub(crate) use standard::*;
pub(crate) use symbol::*;
pub(crate) use win_ansi::*;
pub(crate) use zapf_dings::*;
