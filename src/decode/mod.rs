//! Response decoder module
//!
//! Supports: JSON collection pages, CSV (`$resultFormat=CSV`)
//!
//! # Overview
//!
//! Decoders turn a raw body into a typed page and report what the
//! paginator needs to know about it. A body that cannot be understood is a
//! protocol error; nothing is guessed.

mod decoders;
mod types;

pub use decoders::{decode_entity, CsvDecoder, JsonCollectionDecoder};
pub use types::{CollectionPage, CsvTable, PageDecoder};
