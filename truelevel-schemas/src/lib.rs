pub mod car_count;
pub mod chemical;
pub mod container;
pub mod file_formats;
pub mod package;
pub mod site;
pub mod snapshot;
pub mod visit;
