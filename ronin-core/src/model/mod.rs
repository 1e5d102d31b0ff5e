//! Clinical data model: FHIR datatypes, closed code sets and the resources
//! the profiles transform.

pub mod codes;
pub mod datatypes;
pub mod resources;
pub mod ronin;

pub use codes::{
    AdministrativeGender, CodedEnum, ConditionClinicalStatus, ContactPointSystem, ContactPointUse,
    ObservationStatus,
};
pub use datatypes::{
    CodeableConcept, Coding, ContactPoint, Extension, ExtensionValue, HumanName, Identifier, Meta,
    Period, PrimitiveExtension, Quantity, Range, Reference,
};
pub use resources::{
    Abatement, Condition, DomainResource, Effective, Observation, ObservationValue, Onset, Patient,
};
