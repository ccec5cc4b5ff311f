pub mod attributes;
pub mod climate;
pub mod commands;
pub mod device;
pub mod output;
pub mod snapshot;
