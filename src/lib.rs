pub mod loader;
pub mod output;
pub mod regions;
pub mod scoring;
pub mod segment;
pub mod selector;
pub mod util;
pub mod utilization;
