mod contact;
mod health_check;

pub use contact::*;
pub use health_check::*;

/// Format an error together with its chain of sources, one per paragraph,
/// so that `{:?}` in logs shows the root cause.
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
