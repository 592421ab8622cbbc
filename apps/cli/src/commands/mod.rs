pub mod autopilot;
pub mod follow;
pub mod present;
pub mod react;
