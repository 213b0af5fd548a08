//! Password protection and removal

use lopdf::Permissions;
use tracing::info;

use crate::config::ProcessingConfig;
use crate::error::{Result, TransformError};
use crate::pdf::{open, write, EncryptOptions, LoadOptions, PdfDocument};
use crate::progress::Progress;

/// What a protected document still allows: printing and nothing else
pub fn protected_permissions() -> Permissions {
    Permissions::PRINTABLE
}

/// Encrypt with one password used as both user and owner password
///
/// Readers must enter the password to open the file; once open, only
/// printing is permitted. Modifying, copying, annotating, form filling,
/// accessibility extraction and assembly are all denied.
pub fn protect(
    input: &[u8],
    password: &str,
    config: &ProcessingConfig,
    progress: &mut Progress<'_>,
) -> Result<Vec<u8>> {
    if password.is_empty() {
        return Err(TransformError::EmptyPassword.into());
    }
    progress.checkpoint()?;

    let mut document = open(input, config)?;
    // Streams cannot be compressed once encrypted
    document.lopdf_mut().compress();
    progress.advance(1, 2);

    document.encrypt(&EncryptOptions {
        user_password: password.to_string(),
        owner_password: password.to_string(),
        permissions: protected_permissions(),
    })?;
    progress.advance(2, 2);

    info!(pages = document.page_count(), "protect complete");
    write(document, config, progress)
}

/// Open with a password and write the document back without encryption
///
/// A wrong password fails with [`LoadError::PasswordRequired`]. Documents that
/// were never encrypted pass through unchanged in content.
///
/// [`LoadError::PasswordRequired`]: crate::error::LoadError::PasswordRequired
pub fn unlock(
    input: &[u8],
    password: &str,
    config: &ProcessingConfig,
    progress: &mut Progress<'_>,
) -> Result<Vec<u8>> {
    config.check_size(input)?;
    progress.checkpoint()?;

    let options = if password.is_empty() {
        LoadOptions::default()
    } else {
        LoadOptions::with_password(password)
    };
    let document = PdfDocument::load(input, &options)?;

    info!(pages = document.page_count(), "unlock complete");
    write(document, config, progress)
}
