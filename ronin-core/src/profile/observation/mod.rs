//! Observation profiles, chosen by `Observation.category`.

mod laboratory;
mod social_history;
mod vital_signs;

pub use laboratory::LaboratoryResultProfile;
pub use social_history::SocialHistoryProfile;
pub use vital_signs::VitalSignsProfile;

use super::{
    ProfileSelector, TransformContext, require_id, ronin_meta, validate_meta_profile,
    validate_reference_type, validate_ronin_identifiers, with_ronin_identifiers,
};
use crate::localization::{Localizable, localize};
use crate::model::ronin::system;
use crate::model::{CodedEnum, Observation, ObservationStatus};
use crate::validation::issues;
use crate::validation::{LocationPath, Validation};

pub fn observation_selector() -> ProfileSelector<Observation> {
    ProfileSelector::new(vec![
        Box::new(LaboratoryResultProfile),
        Box::new(VitalSignsProfile),
        Box::new(SocialHistoryProfile),
    ])
}

fn has_category(observation: &Observation, code: &str) -> bool {
    observation.has_category(system::OBSERVATION_CATEGORY, code)
}

/// Field mapping shared by every observation profile.
fn transform_observation(
    original: &Observation,
    ctx: &TransformContext<'_>,
    profile_url: &str,
) -> (Option<Observation>, Validation) {
    let mut validation = Validation::new();
    let Some(id) = require_id(original, &mut validation) else {
        return (None, validation);
    };

    let transformed = Observation {
        id: Some(localize(id, ctx.tenant)),
        meta: Some(ronin_meta(original.meta.as_ref(), profile_url)),
        identifier: with_ronin_identifiers(&original.identifier, Some(id), ctx.tenant),
        subject: original.subject.localize(ctx.tenant),
        encounter: original.encounter.localize(ctx.tenant),
        other: original.other.localize(ctx.tenant),
        ..original.clone()
    };

    (Some(transformed), validation)
}

fn validate_observation(resource: &Observation, profile_url: &str, validation: &mut Validation) {
    let location = LocationPath::new("Observation");

    validate_ronin_identifiers(&resource.identifier, &location, validation);
    validate_meta_profile(resource.meta.as_ref(), profile_url, &location, validation);

    if validation.check_not_null(
        resource.status.as_ref(),
        issues::required_field("status"),
        &location.field("status"),
    ) && let Some(status) = resource.status.as_deref()
    {
        validation.check_true(
            ObservationStatus::is_member(status),
            issues::invalid_value_set("Observation.status", status),
            &location.field("status"),
        );
    }

    validation.check_not_null(resource.code.as_ref(), issues::required_field("code"), &location.field("code"));

    if validation.check_not_null(
        resource.subject.as_ref(),
        issues::required_field("subject"),
        &location.field("subject"),
    ) {
        validate_reference_type(
            resource.subject.as_ref(),
            &["Patient", "Location"],
            &location.field("subject"),
            validation,
        );
    }
}
