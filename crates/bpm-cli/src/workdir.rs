//! Loads the working bundle rooted at the CLI's current directory.
//!
//! This is the one place the CLI touches the filesystem directly (besides
//! the Manifester's own writes): everything else flows through the
//! Fetcher/Cache Store/Manifester stack, which the CLI only orchestrates.

use std::path::Path;

use bpm_assemble::{Assembler, SimplePolicyParser};
use bpm_core::model::Bundle;
use bpm_core::{Result, Version};

/// Placeholder version for the working bundle itself. The working bundle is
/// never stored in the cache or referenced as someone else's requirement, so
/// this value never leaves the process.
const WORKING_VERSION: &str = "v0.0.0-working";

pub fn load_working_bundle(dir: &Path) -> Result<Bundle> {
    let files = bpm_cache::load_dir(dir)?;
    let parser = SimplePolicyParser;
    let assembler = Assembler::new(&parser);
    assembler.assemble(&files, Version::parse(WORKING_VERSION)?)
}
