pub mod analysis;
pub mod srs_section;
