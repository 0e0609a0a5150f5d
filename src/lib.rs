pub mod cli;
pub mod cloudstack;
pub mod core;

pub use cloudstack::{connect, CloudStackApi, CloudStackClient};
pub use core::{
    config::{ClientConfig, ConfigError, Credentials},
    errors::{CloudError, ProtocolErrorKind, TransportErrorKind},
    kernel::{Payload, ReqwestTransport, Transport},
    types::{AsyncOptions, JobStatus, ParameterSet},
};
