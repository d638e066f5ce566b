pub mod domain;
pub mod synchronizer;
