//! Command-line extension wiring
//!
//! Host applications that expose a clap command tree can mount an object cache
//! command bundle under the fixed `redis` namespace. The bundle itself is
//! supplied by the caller; this module only performs the registration.

use clap::Command;
use tracing::debug;

/// Namespace under which the command bundle is registered
pub const CLI_NAMESPACE: &str = "redis";

/// Mount `bundle` on `app` as the `redis` subcommand.
pub fn register_cli(app: Command, bundle: Command) -> Command {
    debug!("Registering object cache commands under '{}'", CLI_NAMESPACE);
    app.subcommand(bundle.name(CLI_NAMESPACE))
}
