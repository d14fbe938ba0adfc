//! Persisted "onboarding was shown" flag.

use crate::repo::flag_repo::FlagRepository;
use crate::repo::tracker_repo::RepoResult;

pub const ONBOARDING_SHOWN_KEY: &str = "onboarding_shown";

pub fn was_onboarding_shown(flags: &impl FlagRepository) -> RepoResult<bool> {
    flags.get_flag(ONBOARDING_SHOWN_KEY)
}

pub fn mark_onboarding_shown(flags: &impl FlagRepository) -> RepoResult<()> {
    flags.set_flag(ONBOARDING_SHOWN_KEY, true)
}
