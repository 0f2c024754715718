pub mod document;
pub mod srs;
