//! Core layer: pure transformations.
//!
//! Nothing here performs I/O. URL shaping, cache fingerprints, payload
//! sniffing and response interpretation all live at this layer so the
//! effectful edges stay thin.

pub mod disposition;
pub mod fingerprint;
pub mod interpret;
pub mod sniff;
pub mod url;

pub use disposition::extract_filename;
pub use fingerprint::fingerprint;
pub use interpret::interpret;
pub use sniff::{is_json, is_xml, xml_to_value};
