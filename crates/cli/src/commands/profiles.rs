//! `cartstorm profiles`: list the built-in user profiles.

use std::io::{self, Write};

use cartstorm_loadtest::{FlowStep, Profile, ProfileError, Routine, profile};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfilesError {
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error("Failed to print profiles: {0}")]
    Output(#[from] io::Error),
}

/// Print every built-in profile with its wait time and transactions.
pub fn list() -> Result<(), ProfilesError> {
    let profiles = profile::all()?;
    let mut stdout = io::stdout().lock();
    write_profiles(&mut stdout, &profiles)?;
    Ok(())
}

fn write_profiles(out: &mut impl Write, profiles: &[Profile]) -> io::Result<()> {
    for profile in profiles {
        writeln!(out, "{} (wait {})", profile.name(), profile.wait())?;
        writeln!(out, "  {}", profile.description())?;
        match profile.routine() {
            Routine::Weighted(mix) => {
                let total = mix.total_weight();
                for (task, weight) in mix.tasks() {
                    writeln!(out, "    {:<22} {weight:>3}/{total}", task.label())?;
                }
            }
            Routine::PurchaseFlow => {
                for step in FlowStep::ALL {
                    writeln!(out, "    {step}")?;
                }
            }
        }
    }
    Ok(())
}
