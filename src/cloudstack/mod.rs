pub mod builder;
pub mod client;
pub mod converters;
pub mod rest;
pub mod types;

use crate::core::config::ClientConfig;
use crate::core::errors::CloudError;
use crate::core::kernel::ReqwestTransport;

// Re-export main types for easier importing
pub use builder::{connect, ClientBuilder};
pub use client::CloudStackClient;
pub use rest::CloudStackApi;
pub use types::{Network, Nic, ServiceOffering, Template, TemplateFilter, VirtualMachine};

/// Create the project-scoped typed API from a loaded configuration
pub fn create_cloudstack_api(
    config: ClientConfig,
) -> Result<CloudStackApi<ReqwestTransport>, CloudError> {
    ClientBuilder::new(config).build_api()
}
