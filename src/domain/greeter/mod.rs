//! Greeter contract: interface descriptor, address table, panel state

pub mod abi;
pub mod addresses;
pub mod gateway;
pub mod inspector;
pub mod panel;

#[cfg(test)]
pub mod testing;

pub use addresses::{AddressTable, ContractTarget};
pub use gateway::{
    ContractGateway, GreetingEvent, PrepareTicket, PreparedWrite, SubscriptionId, WriteRequest,
};
pub use panel::{GreetingPanel, PrepareState, ReadStatus};
