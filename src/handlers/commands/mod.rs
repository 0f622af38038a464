//! Command handlers module
//!
//! Each command registers its handlers in a `spec()` function; the binary
//! collects them with [`register_all`].

pub mod admin;
pub mod counter;
pub mod echo;
pub mod main_menu;

pub use admin::AdminCommand;
pub use counter::CounterCommand;
pub use echo::EchoCommand;
pub use main_menu::MainMenuCommand;

use crate::engine::registry::HandlerRegistry;
use crate::utils::errors::RegistrationError;

/// Register every demo command
pub fn register_all(registry: &mut HandlerRegistry) -> Result<(), RegistrationError> {
    registry.register(main_menu::spec())?;
    registry.register(counter::spec())?;
    registry.register(echo::spec())?;
    registry.register(admin::spec())?;
    Ok(())
}
