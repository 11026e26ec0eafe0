//! Driver checks run at startup and once per frame.

use crate::core::platform::backend::{DriverString, GlError, GraphicsBackend};
use crate::core::rendering::render::RenderError;

/// Upper bound on errors drained in one check, in case a lost context
/// keeps reporting
const MAX_ERRORS_PER_CHECK: usize = 64;

/// Drain the driver error queue, logging each error as a warning.
///
/// Errors are reported after the fact and roll nothing back; the frame that
/// caused them has already been issued.
pub fn check_for_errors<B: GraphicsBackend>(gl: &B) -> Vec<GlError> {
    let mut errors = vec![];
    while errors.len() < MAX_ERRORS_PER_CHECK {
        let Some(error) = GlError::from_gl(gl.get_error()) else {
            break;
        };
        log::warn!("OpenGL error: {}", error);
        errors.push(error);
    }
    errors
}

/// Fail if any of `required` is not advertised by the driver. Every missing
/// extension is reported before failing.
pub fn check_compatibility<B, S>(gl: &B, required: &[S]) -> Result<(), RenderError>
where
    B: GraphicsBackend,
    S: AsRef<str>,
{
    let supported = gl.supported_extensions();
    let missing: Vec<String> = required
        .iter()
        .map(AsRef::as_ref)
        .filter(|extension| !supported.contains(*extension))
        .map(|extension| {
            log::warn!("The extension {} has not been found on your system", extension);
            extension.to_string()
        })
        .collect();

    if !missing.is_empty() {
        log::error!("Your system is not compatible, see the warnings above");
        return Err(RenderError::MissingExtensions(missing));
    }
    log::info!("Your system seems to be compatible");
    Ok(())
}

pub fn log_driver_info<B: GraphicsBackend>(gl: &B) {
    log::info!("Graphics: {}", gl.get_parameter_string(DriverString::Version));
    log::info!("Renderer: {}", gl.get_parameter_string(DriverString::Renderer));
    log::info!("Vendor: {}", gl.get_parameter_string(DriverString::Vendor));
}
