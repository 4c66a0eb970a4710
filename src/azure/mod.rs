//! Azure Resource Manager interaction.
//!
//! This module handles all Azure-related operations:
//! - [`transport`] - The outbound call seam and the HTTPS implementation
//! - [`auth`] - Bearer token acquisition
//! - [`cli`] - Command execution for Azure CLI
//! - [`api`] - Service limits, SKU catalog and reservations
//! - [`graph`] - Azure Resource Graph usage query
//! - [`replay`] - Recorded response playback

mod api;
mod auth;
mod cli;
mod graph;
mod replay;
mod transport;

// Re-export public types and functions
pub use api::{take_property, validate_location, validate_vm_type, ArmApi};
pub use auth::{acquire_token, TokenSource};
pub use cli::{access_token_command, az_access_token};
pub use graph::{query_body, running_instances_query};
pub use replay::ReplayTransport;
pub use transport::{ensure_success, parse_body, ArmOperation, ArmRequest, ArmTransport, HttpTransport};
