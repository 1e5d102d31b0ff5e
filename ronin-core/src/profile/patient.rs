use super::{
    BaseProfile, ContactPointProfile, TransformContext, require_id, ronin_meta,
    validate_meta_profile, validate_reference_type, validate_ronin_identifiers,
    with_ronin_identifiers,
};
use crate::localization::{Localizable, localize};
use crate::model::ronin::{profile_url, system};
use crate::model::{AdministrativeGender, CodedEnum, Identifier, Patient};
use crate::validation::issues;
use crate::validation::{IssueTemplate, LocationPath, Validation};

/// HL7 v2 identifier type for medical record numbers.
const V2_IDENTIFIER_TYPE: &str = "http://terminology.hl7.org/CodeSystem/v2-0203";
const MRN_TYPE_CODE: &str = "MR";

pub struct PatientProfile {
    telecom: ContactPointProfile,
}

impl PatientProfile {
    pub fn new() -> Self {
        Self {
            telecom: ContactPointProfile::new("Patient.telecom", profile_url::PATIENT),
        }
    }
}

impl Default for PatientProfile {
    fn default() -> Self {
        Self::new()
    }
}

/// Source identifiers typed `MR` re-issued under the Ronin MRN system.
fn mrn_identifiers(identifiers: &[Identifier]) -> Vec<Identifier> {
    identifiers
        .iter()
        .filter(|i| i.system.as_deref() != Some(system::MRN))
        .filter(|i| {
            i.type_
                .as_ref()
                .is_some_and(|t| t.has_coding(V2_IDENTIFIER_TYPE, MRN_TYPE_CODE))
        })
        .filter_map(|i| i.value.as_deref())
        .map(|value| Identifier::new(system::MRN, value))
        .collect()
}

impl BaseProfile<Patient> for PatientProfile {
    fn name(&self) -> &'static str {
        "RoninPatient"
    }

    fn profile_url(&self) -> &'static str {
        profile_url::PATIENT
    }

    fn transform_internal(&self, original: &Patient, ctx: &TransformContext<'_>) -> (Option<Patient>, Validation) {
        let mut validation = Validation::new();
        let location = LocationPath::new("Patient");

        let Some(id) = require_id(original, &mut validation) else {
            return (None, validation);
        };

        let (telecom, telecom_validation) =
            self.telecom.transform(&original.telecom, ctx, &location.field("telecom"));
        validation.merge(telecom_validation);

        let mut identifier = with_ronin_identifiers(&original.identifier, Some(id), ctx.tenant);
        identifier.extend(mrn_identifiers(&original.identifier));

        let transformed = Patient {
            id: Some(localize(id, ctx.tenant)),
            meta: Some(ronin_meta(original.meta.as_ref(), profile_url::PATIENT)),
            identifier,
            telecom,
            general_practitioner: original.general_practitioner.localize(ctx.tenant),
            managing_organization: original.managing_organization.localize(ctx.tenant),
            other: original.other.localize(ctx.tenant),
            ..original.clone()
        };

        (Some(transformed), validation)
    }

    fn validate(&self, resource: &Patient, _ctx: &TransformContext<'_>, validation: &mut Validation) {
        let location = LocationPath::new("Patient");

        validate_ronin_identifiers(&resource.identifier, &location, validation);
        validate_meta_profile(resource.meta.as_ref(), profile_url::PATIENT, &location, validation);

        validation.check_true(
            resource
                .identifier
                .iter()
                .any(|i| i.system.as_deref() == Some(system::MRN) && i.value.is_some()),
            IssueTemplate::error("RONIN_PAT_001", "Identifier with MRN system is required"),
            &location.field("identifier"),
        );

        validation.check_true(
            !resource.name.is_empty(),
            issues::required_field("name"),
            &location.field("name"),
        );

        if validation.check_not_null(
            resource.gender.as_ref(),
            issues::required_field("gender"),
            &location.field("gender"),
        ) && let Some(gender) = resource.gender.as_deref()
        {
            validation.check_true(
                AdministrativeGender::is_member(gender),
                issues::invalid_value_set("Patient.gender", gender),
                &location.field("gender"),
            );
        }

        validation.check_not_null(
            resource.birth_date.as_ref(),
            issues::required_field("birthDate"),
            &location.field("birthDate"),
        );

        for (index, telecom) in resource.telecom.iter().enumerate() {
            let location = location.element("telecom", index);
            self.telecom.validate_structural(telecom, &location, validation);
            self.telecom.validate_canonical_form(telecom, &location, validation);
        }

        for (index, practitioner) in resource.general_practitioner.iter().enumerate() {
            validate_reference_type(
                Some(practitioner),
                &["Organization", "Practitioner", "PractitionerRole"],
                &location.element("generalPractitioner", index),
                validation,
            );
        }
        validate_reference_type(
            resource.managing_organization.as_ref(),
            &["Organization"],
            &location.field("managingOrganization"),
            validation,
        );
    }
}
