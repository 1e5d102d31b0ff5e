use super::{has_category, transform_observation, validate_observation};
use crate::model::Observation;
use crate::model::ronin::profile_url;
use crate::profile::{BaseProfile, TransformContext};
use crate::validation::{IssueTemplate, LocationPath, Validation};

pub struct LaboratoryResultProfile;

impl BaseProfile<Observation> for LaboratoryResultProfile {
    fn name(&self) -> &'static str {
        "RoninLaboratoryResult"
    }

    fn profile_url(&self) -> &'static str {
        profile_url::OBSERVATION_LABORATORY_RESULT
    }

    fn qualifies(&self, resource: &Observation) -> bool {
        has_category(resource, "laboratory")
    }

    fn transform_internal(&self, original: &Observation, ctx: &TransformContext<'_>) -> (Option<Observation>, Validation) {
        transform_observation(original, ctx, self.profile_url())
    }

    fn validate(&self, resource: &Observation, _ctx: &TransformContext<'_>, validation: &mut Validation) {
        validate_observation(resource, self.profile_url(), validation);

        // Results that reached a final state must say when they were taken.
        let resulted = matches!(resource.status.as_deref(), Some("final" | "amended" | "corrected"));
        validation.check_true(
            !resulted || resource.effective.is_some(),
            IssueTemplate::error(
                "RONIN_LABOBS_001",
                "effective[x] is required when a laboratory result is final, amended or corrected",
            ),
            &LocationPath::new("Observation").field("effective"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::observation::tests::observation;
    use crate::registry::client::tests::client_with;
    use crate::tenant::Tenant;
    use serde_json::json;

    #[test]
    fn test_final_result_requires_effective() {
        let client = client_with(vec![], vec![]);
        let tenant = Tenant::new("test");
        let ctx = TransformContext::new(&tenant, &client);

        let mut original = observation("laboratory", json!({}));
        assert!(LaboratoryResultProfile.transform(&original, &ctx).is_accepted());

        original.effective = None;
        let outcome = LaboratoryResultProfile.transform(&original, &ctx);
        assert_eq!(outcome.validation.errors().next().unwrap().code, "RONIN_LABOBS_001");

        original.status = Some("preliminary".to_string());
        assert!(LaboratoryResultProfile.transform(&original, &ctx).is_accepted());
    }
}
