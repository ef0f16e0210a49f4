//! Target-annotated intermediate representation.
//!
//! A [`modules::Module`] is an ordered list of functions. Each function owns a
//! body [`modules::Region`], regions own [`modules::Block`]s and blocks own
//! [`modules::operation::Operation`]s, which may themselves nest further regions. Values
//! are plain SSA identifiers ([`modules::operand::Value`]) unique within a
//! function.
//!
//! The crate provides a textual printer, a `chumsky` based parser (feature
//! `chumsky`, on by default), a verifier and a couple of analyses used by
//! rewriting passes.

pub mod analysis;
pub mod modules;
pub mod types;
pub mod utils;
