pub mod data_collection;
pub mod evaluation;
pub mod modeling;
pub mod optimization;
pub mod phases;
pub mod production;
pub mod settings;
