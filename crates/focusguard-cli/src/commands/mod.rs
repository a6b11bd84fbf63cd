pub mod block;
pub mod config;
pub mod msg;
pub mod rules;
pub mod timer;

use focusguard_core::Service;

/// Open the service over the default store, running the first-install
/// repair if needed.
pub fn open_service() -> Result<Service, Box<dyn std::error::Error>> {
    Ok(Service::open()?)
}
