pub mod ai;
pub mod documents;
pub mod docx;
pub mod srs;
pub mod storage;
pub mod worker;
