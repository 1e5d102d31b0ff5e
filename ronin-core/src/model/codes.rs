//! Closed FHIR code sets that canonical resources must use.

/// A FHIR `code` bound to a required, closed set of values.
pub trait CodedEnum: Sized + Copy + 'static {
    /// Every legal member, in definition order.
    const VALUES: &'static [Self];

    fn code(&self) -> &'static str;

    fn from_code(code: &str) -> Option<Self> {
        Self::VALUES.iter().copied().find(|v| v.code() == code)
    }

    fn is_member(code: &str) -> bool {
        Self::from_code(code).is_some()
    }

    /// Comma separated list of legal codes, for diagnostics.
    fn codes() -> String {
        Self::VALUES
            .iter()
            .map(|v| v.code())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactPointSystem {
    Phone,
    Fax,
    Email,
    Pager,
    Url,
    Sms,
    Other,
}

impl CodedEnum for ContactPointSystem {
    const VALUES: &'static [Self] = &[
        Self::Phone,
        Self::Fax,
        Self::Email,
        Self::Pager,
        Self::Url,
        Self::Sms,
        Self::Other,
    ];

    fn code(&self) -> &'static str {
        match self {
            Self::Phone => "phone",
            Self::Fax => "fax",
            Self::Email => "email",
            Self::Pager => "pager",
            Self::Url => "url",
            Self::Sms => "sms",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactPointUse {
    Home,
    Work,
    Temp,
    Old,
    Mobile,
}

impl CodedEnum for ContactPointUse {
    const VALUES: &'static [Self] = &[Self::Home, Self::Work, Self::Temp, Self::Old, Self::Mobile];

    fn code(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Work => "work",
            Self::Temp => "temp",
            Self::Old => "old",
            Self::Mobile => "mobile",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdministrativeGender {
    Male,
    Female,
    Other,
    Unknown,
}

impl CodedEnum for AdministrativeGender {
    const VALUES: &'static [Self] = &[Self::Male, Self::Female, Self::Other, Self::Unknown];

    fn code(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionClinicalStatus {
    Active,
    Recurrence,
    Relapse,
    Inactive,
    Remission,
    Resolved,
}

impl ConditionClinicalStatus {
    /// Statuses permitted once a condition has abated.
    pub fn is_abated(&self) -> bool {
        matches!(self, Self::Inactive | Self::Remission | Self::Resolved)
    }
}

impl CodedEnum for ConditionClinicalStatus {
    const VALUES: &'static [Self] = &[
        Self::Active,
        Self::Recurrence,
        Self::Relapse,
        Self::Inactive,
        Self::Remission,
        Self::Resolved,
    ];

    fn code(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Recurrence => "recurrence",
            Self::Relapse => "relapse",
            Self::Inactive => "inactive",
            Self::Remission => "remission",
            Self::Resolved => "resolved",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObservationStatus {
    Registered,
    Preliminary,
    Final,
    Amended,
    Corrected,
    Cancelled,
    EnteredInError,
    Unknown,
}

impl CodedEnum for ObservationStatus {
    const VALUES: &'static [Self] = &[
        Self::Registered,
        Self::Preliminary,
        Self::Final,
        Self::Amended,
        Self::Corrected,
        Self::Cancelled,
        Self::EnteredInError,
        Self::Unknown,
    ];

    fn code(&self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Preliminary => "preliminary",
            Self::Final => "final",
            Self::Amended => "amended",
            Self::Corrected => "corrected",
            Self::Cancelled => "cancelled",
            Self::EnteredInError => "entered-in-error",
            Self::Unknown => "unknown",
        }
    }
}
