//! UI Modules
//!
//! Each module implements the Module trait and handles its own:
//! - Key input processing
//! - Command handling
//! - Rendering
//!
//! Modules:
//! - greeter: greeting panel, update control, object inspectors

pub mod greeter;
