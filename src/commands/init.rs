use crate::commands::Out;
use crate::{Config, Result};
use std::path::Path;
use tracing::debug;

/// Creates the home directory and:
/// - Creates an initial `config.json` file with default settings
/// - Creates the expenses file and the task database
///
/// # Arguments
/// - `daybook_home` - The directory that will be the root of the home directory, e.g.
///   `$HOME/daybook`
///
/// # Errors
/// - Returns an error if the home directory is already initialized or any file operations fail.
pub async fn init(daybook_home: &Path) -> Result<Out<()>> {
    let config = Config::create(daybook_home).await?;
    debug!("Created {}", config.config_path().display());
    let message = format!(
        "Successfully created the daybook directory at {}",
        config.root().display()
    );
    config.close().await;
    Ok(message.into())
}
