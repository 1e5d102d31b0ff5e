use super::{has_category, transform_observation, validate_observation};
use crate::model::ronin::{profile_url, system};
use crate::model::{Observation, ObservationValue};
use crate::profile::{BaseProfile, TransformContext};
use crate::validation::issues;
use crate::validation::{IssueTemplate, LocationPath, Validation};

const CODE_ELEMENT: &str = "Observation.code";

pub struct VitalSignsProfile;

impl BaseProfile<Observation> for VitalSignsProfile {
    fn name(&self) -> &'static str {
        "RoninVitalSigns"
    }

    fn profile_url(&self) -> &'static str {
        profile_url::OBSERVATION_VITAL_SIGNS
    }

    fn qualifies(&self, resource: &Observation) -> bool {
        has_category(resource, "vital-signs")
    }

    fn transform_internal(&self, original: &Observation, ctx: &TransformContext<'_>) -> (Option<Observation>, Validation) {
        transform_observation(original, ctx, self.profile_url())
    }

    fn validate(&self, resource: &Observation, ctx: &TransformContext<'_>, validation: &mut Validation) {
        validate_observation(resource, self.profile_url(), validation);
        let location = LocationPath::new("Observation");

        match &resource.value {
            Some(ObservationValue::Quantity(quantity)) => {
                let location = location.field("valueQuantity");
                validation.check_not_null(
                    quantity.value.as_ref(),
                    issues::required_field("valueQuantity.value"),
                    &location.field("value"),
                );
                validation.check_true(
                    quantity.code.is_none() || quantity.system.as_deref() == Some(system::UCUM),
                    IssueTemplate::error(
                        "RONIN_VSOBS_002",
                        "Quantity system must be UCUM when a unit code is given",
                    ),
                    &location.field("system"),
                );
            }
            Some(other) => {
                validation.add(
                    IssueTemplate::error(
                        "RONIN_VSOBS_001",
                        format!("Vital signs value must be a Quantity, found {}", other.type_name()),
                    ),
                    &location.field("value"),
                );
            }
            None => {}
        }

        if let (Some(code), Some(allowed)) = (
            resource.code.as_ref(),
            ctx.registry.resolve_value_set(None, CODE_ELEMENT, Some(self.profile_url())),
        ) {
            let listed = code.coding.iter().any(|c| allowed.iter().any(|a| a.same_code(c)));
            let value = code
                .coding
                .iter()
                .filter_map(|c| c.code.as_deref())
                .collect::<Vec<_>>()
                .join(", ");
            validation.check_true(
                listed,
                issues::invalid_value_set(CODE_ELEMENT, &value),
                &location.field("code"),
            );
        }
    }
}
