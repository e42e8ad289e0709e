pub mod status;
pub mod survey;
pub mod topics;
