//! Domain layer - Greeter contract model and panel state
//!
//! Nothing in here talks to the network. The panel reaches the chain only
//! through the [`greeter::ContractGateway`] trait.

pub mod greeter;
