mod clock;
mod net;
mod service;

pub use clock::BootClock;
pub use net::{advertise_address, local_ipv4_addrs};
pub use service::{restart_process, ServiceAction, ServiceControl};

pub type Result<T> = std::result::Result<T, SystemError>;

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("No non-loopback IPv4 address available")]
    NoRoutableAddress,

    #[error("Service control closed")]
    ControlClosed,
}
