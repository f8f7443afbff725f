use anyhow::Result;

use crate::cli::OutputFormat;
use crate::output::print_state;
use crate::state::StateFile;

pub fn list(state: &StateFile, format: OutputFormat) -> Result<()> {
    print_state(state, format);
    Ok(())
}
