use super::{has_category, transform_observation, validate_observation};
use crate::model::Observation;
use crate::model::ronin::profile_url;
use crate::profile::{BaseProfile, TransformContext};
use crate::validation::Validation;

pub struct SocialHistoryProfile;

impl BaseProfile<Observation> for SocialHistoryProfile {
    fn name(&self) -> &'static str {
        "RoninSocialHistory"
    }

    fn profile_url(&self) -> &'static str {
        profile_url::OBSERVATION_SOCIAL_HISTORY
    }

    fn qualifies(&self, resource: &Observation) -> bool {
        has_category(resource, "social-history")
    }

    fn transform_internal(&self, original: &Observation, ctx: &TransformContext<'_>) -> (Option<Observation>, Validation) {
        transform_observation(original, ctx, self.profile_url())
    }

    fn validate(&self, resource: &Observation, _ctx: &TransformContext<'_>, validation: &mut Validation) {
        validate_observation(resource, self.profile_url(), validation);
    }
}
