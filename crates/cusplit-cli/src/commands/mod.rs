pub mod batch;
pub mod config;
pub mod input;
pub mod mail;
pub mod matching;
pub mod split;
