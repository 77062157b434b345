// UI module - GUI logic and event loop bridge
//
// This module contains:
// - EventLoopBridge: Marshals updates from the reader, state and tokio threads onto the Slint event loop
// - GuiController: Main controller that wires the UI to the serial connector and state management

pub mod bridge;
pub mod controller;

pub use bridge::{EventLoopBridge, EventLoopBridgeHandle};
pub use controller::GuiController;
