//! `nova new` command implementation.

use crate::cli::setup::open_store;
use crate::config::Config;
use crate::error::Result;

/// Run the new command.
///
/// Creates an empty session and prints its id.
///
/// # Errors
///
/// Returns an error if the storage backend fails.
pub fn run(config: &Config) -> Result<()> {
    let mut store = open_store(config)?;
    let id = store.create()?;
    println!("{id}");
    Ok(())
}
