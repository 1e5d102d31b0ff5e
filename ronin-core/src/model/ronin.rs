//! Canonical Ronin URIs: identifier systems, extension URLs and profile URLs.

/// Identifier and code systems.
pub mod system {
    pub const TENANT: &str = "http://projectronin.com/id/tenantId";
    pub const FHIR_ID: &str = "http://projectronin.com/id/fhir";
    pub const MRN: &str = "http://projectronin.com/id/mrn";
    pub const DATA_AUTHORITY: &str = "http://projectronin.com/id/dataAuthorityId";

    /// Root of the Ronin code systems. Tenant specific variants insert the
    /// tenant mnemonic as a path segment: `{CODE_SYSTEM_BASE}/{tenant}/{name}`.
    pub const CODE_SYSTEM_BASE: &str = "http://projectronin.io/fhir/CodeSystem";

    pub const OBSERVATION_CATEGORY: &str =
        "http://terminology.hl7.org/CodeSystem/observation-category";
    pub const CONDITION_CATEGORY: &str = "http://terminology.hl7.org/CodeSystem/condition-category";
    pub const CONDITION_CLINICAL: &str = "http://terminology.hl7.org/CodeSystem/condition-clinical";
    pub const IDENTIFIER_TYPE: &str = "http://projectronin.io/fhir/CodeSystem/RoninIdentifierType";
    pub const UCUM: &str = "http://unitsofmeasure.org";

    /// Tenant specific code system for a named element, e.g. `ContactPointSystem`.
    pub fn tenant_code_system(tenant: &str, name: &str) -> String {
        format!("{}/{}/{}", CODE_SYSTEM_BASE, tenant, name)
    }
}

pub const DATA_AUTHORITY_VALUE: &str = "EHR Data Authority";

/// Provenance extension URLs.
pub mod extension_url {
    pub const TENANT_SOURCE_TELECOM_SYSTEM: &str =
        "http://projectronin.io/fhir/StructureDefinition/Extension/tenant-sourceTelecomSystem";
    pub const TENANT_SOURCE_TELECOM_USE: &str =
        "http://projectronin.io/fhir/StructureDefinition/Extension/tenant-sourceTelecomUse";
}

pub mod profile_url {
    pub const PATIENT: &str = "http://projectronin.io/fhir/StructureDefinition/ronin-patient";
    pub const CONDITION: &str =
        "http://projectronin.io/fhir/StructureDefinition/ronin-conditionProblemsHealthConcerns";
    pub const OBSERVATION_LABORATORY_RESULT: &str =
        "http://projectronin.io/fhir/StructureDefinition/ronin-observationLaboratoryResult";
    pub const OBSERVATION_VITAL_SIGNS: &str =
        "http://projectronin.io/fhir/StructureDefinition/ronin-observationVitalSigns";
    pub const OBSERVATION_SOCIAL_HISTORY: &str =
        "http://projectronin.io/fhir/StructureDefinition/ronin-observationSocialHistory";
}
