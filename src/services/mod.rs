pub mod orchestrator;
pub mod reconciler;
pub mod webhook;
