//! Actions that modules can return to communicate with the app

/// Actions returned by modules to communicate state changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// No action needed
    None,

    /// Broadcast the prepared greeting update
    Submit,

    /// Re-read the greeting without waiting for a block
    Refresh,

    /// Show notification in status bar
    Notify(String, NotifyLevel),

    /// Open command line with optional prefix
    OpenCommand(Option<String>),

    /// Move to the previous (`false`) or next (`true`) endpoint
    CycleEndpoint(bool),

    /// Connect to the endpoint at this index
    SwitchEndpoint(usize),

    /// Toggle the help popup
    ToggleHelp,

    /// Request quit
    Quit,
}

/// Notification levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Warn,
}
