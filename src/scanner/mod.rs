pub mod classifier;
pub mod frame;
pub mod history;
pub mod reconcile;
pub mod state;

mod controller;
mod loop_worker;

pub use controller::ScanController;
