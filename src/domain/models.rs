//! Application data model.
//!
//! The draft is split into three independently replaceable sections plus a
//! step pointer. Serialized field names follow the persisted camelCase
//! layout so older saved drafts stay readable.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A closed set of options rendered as a cycling choice field.
///
/// The `Default` variant is the "nothing selected yet" value and always
/// comes first in [`Choice::ALL`].
pub trait Choice: Copy + PartialEq + Default + 'static {
    const ALL: &'static [Self];

    fn label(&self) -> &'static str;

    fn is_specified(&self) -> bool {
        *self != Self::default()
    }

    /// Returns the next (or previous) option, wrapping around.
    fn cycle(self, forward: bool) -> Self {
        let len = Self::ALL.len();
        let index = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        let next = if forward {
            (index + 1) % len
        } else {
            (index + len - 1) % len
        };
        Self::ALL[next]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Gender {
    #[default]
    #[serde(rename = "", alias = "unspecified")]
    Unspecified,
    Male,
    Female,
}

impl Choice for Gender {
    const ALL: &'static [Self] = &[Gender::Unspecified, Gender::Male, Gender::Female];

    fn label(&self) -> &'static str {
        match self {
            Gender::Unspecified => "",
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MaritalStatus {
    #[default]
    #[serde(rename = "", alias = "unspecified")]
    Unspecified,
    Single,
    Married,
    Divorced,
    Widowed,
}

impl Choice for MaritalStatus {
    const ALL: &'static [Self] = &[
        MaritalStatus::Unspecified,
        MaritalStatus::Single,
        MaritalStatus::Married,
        MaritalStatus::Divorced,
        MaritalStatus::Widowed,
    ];

    fn label(&self) -> &'static str {
        match self {
            MaritalStatus::Unspecified => "",
            MaritalStatus::Single => "Single",
            MaritalStatus::Married => "Married",
            MaritalStatus::Divorced => "Divorced",
            MaritalStatus::Widowed => "Widowed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EmploymentStatus {
    #[default]
    #[serde(rename = "", alias = "unspecified")]
    Unspecified,
    Employed,
    Unemployed,
    #[serde(alias = "self-employed")]
    SelfEmployed,
    Retired,
    Student,
}

impl Choice for EmploymentStatus {
    const ALL: &'static [Self] = &[
        EmploymentStatus::Unspecified,
        EmploymentStatus::Employed,
        EmploymentStatus::Unemployed,
        EmploymentStatus::SelfEmployed,
        EmploymentStatus::Retired,
        EmploymentStatus::Student,
    ];

    fn label(&self) -> &'static str {
        match self {
            EmploymentStatus::Unspecified => "",
            EmploymentStatus::Employed => "Employed",
            EmploymentStatus::Unemployed => "Unemployed",
            EmploymentStatus::SelfEmployed => "Self-employed",
            EmploymentStatus::Retired => "Retired",
            EmploymentStatus::Student => "Student",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HousingStatus {
    #[default]
    #[serde(rename = "", alias = "unspecified")]
    Unspecified,
    Rent,
    Own,
    WithFamily,
    Other,
}

impl Choice for HousingStatus {
    const ALL: &'static [Self] = &[
        HousingStatus::Unspecified,
        HousingStatus::Rent,
        HousingStatus::Own,
        HousingStatus::WithFamily,
        HousingStatus::Other,
    ];

    fn label(&self) -> &'static str {
        match self {
            HousingStatus::Unspecified => "",
            HousingStatus::Rent => "Renting",
            HousingStatus::Own => "Own home",
            HousingStatus::WithFamily => "Living with family",
            HousingStatus::Other => "Other",
        }
    }
}

/// Step 1 section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersonalInformation {
    pub name: String,
    pub national_id: String,
    /// ISO `YYYY-MM-DD`.
    pub date_of_birth: String,
    pub gender: Gender,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub phone: String,
    pub email: String,
}

/// Step 2 section. Numeric fields are absent until the step validates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FamilyFinancialInformation {
    pub marital_status: MaritalStatus,
    pub dependents: Option<u32>,
    pub employment_status: EmploymentStatus,
    pub monthly_income: Option<f64>,
    pub housing_status: HousingStatus,
}

/// Step 3 section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SituationDescriptions {
    pub current_financial_situation: String,
    pub employment_circumstances: String,
    pub reason_for_applying: String,
}

/// The three sections together; this is what gets submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApplicationData {
    pub personal: PersonalInformation,
    pub family_financial: FamilyFinancialInformation,
    pub situations: SituationDescriptions,
}

/// One of the three wizard steps.
///
/// Persisted as a bare integer. Out-of-range values read back from disk are
/// clamped rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub enum Step {
    #[default]
    One,
    Two,
    Three,
}

impl Step {
    pub const ALL: [Step; 3] = [Step::One, Step::Two, Step::Three];

    pub fn clamped(value: i64) -> Self {
        match value {
            i64::MIN..=1 => Step::One,
            2 => Step::Two,
            _ => Step::Three,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Step::One => 1,
            Step::Two => 2,
            Step::Three => 3,
        }
    }

    pub fn next(self) -> Option<Step> {
        match self {
            Step::One => Some(Step::Two),
            Step::Two => Some(Step::Three),
            Step::Three => None,
        }
    }

    pub fn previous(self) -> Option<Step> {
        match self {
            Step::One => None,
            Step::Two => Some(Step::One),
            Step::Three => Some(Step::Two),
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::One => "Personal Information",
            Step::Two => "Family & Financial Information",
            Step::Three => "Situation Descriptions",
        }
    }

    pub fn section(self) -> Section {
        match self {
            Step::One => Section::Personal,
            Step::Two => Section::FamilyFinancial,
            Step::Three => Section::Situations,
        }
    }

    /// Fields of this step in display order.
    pub fn fields(self) -> &'static [FieldId] {
        match self {
            Step::One => &[
                FieldId::Name,
                FieldId::NationalId,
                FieldId::DateOfBirth,
                FieldId::Gender,
                FieldId::Phone,
                FieldId::Email,
                FieldId::Address,
                FieldId::City,
                FieldId::State,
                FieldId::Country,
            ],
            Step::Two => &[
                FieldId::MaritalStatus,
                FieldId::Dependents,
                FieldId::EmploymentStatus,
                FieldId::MonthlyIncome,
                FieldId::HousingStatus,
            ],
            Step::Three => &[
                FieldId::CurrentFinancialSituation,
                FieldId::EmploymentCircumstances,
                FieldId::ReasonForApplying,
            ],
        }
    }
}

impl From<i64> for Step {
    fn from(value: i64) -> Self {
        Step::clamped(value)
    }
}

impl From<Step> for u8 {
    fn from(step: Step) -> Self {
        step.number()
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// The in-progress application: data plus the step the user is on.
///
/// Serializes to `{ "data": {...}, "step": n }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationDraft {
    pub data: ApplicationData,
    #[serde(rename = "step")]
    pub current_step: Step,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Personal,
    FamilyFinancial,
    Situations,
}

impl Section {
    pub fn key(self) -> &'static str {
        match self {
            Section::Personal => "personal",
            Section::FamilyFinancial => "familyFinancial",
            Section::Situations => "situations",
        }
    }
}

/// A whole-section replacement.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionUpdate {
    Personal(PersonalInformation),
    FamilyFinancial(FamilyFinancialInformation),
    Situations(SituationDescriptions),
}

impl SectionUpdate {
    pub fn section(&self) -> Section {
        match self {
            SectionUpdate::Personal(_) => Section::Personal,
            SectionUpdate::FamilyFinancial(_) => Section::FamilyFinancial,
            SectionUpdate::Situations(_) => Section::Situations,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Date,
    Choice,
    Number,
    LongText,
}

/// Every field on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldId {
    Name,
    NationalId,
    DateOfBirth,
    Gender,
    Phone,
    Email,
    Address,
    City,
    State,
    Country,
    MaritalStatus,
    Dependents,
    EmploymentStatus,
    MonthlyIncome,
    HousingStatus,
    CurrentFinancialSituation,
    EmploymentCircumstances,
    ReasonForApplying,
}

impl FieldId {
    /// Wire name of the field.
    pub fn key(self) -> &'static str {
        match self {
            FieldId::Name => "name",
            FieldId::NationalId => "nationalId",
            FieldId::DateOfBirth => "dateOfBirth",
            FieldId::Gender => "gender",
            FieldId::Phone => "phone",
            FieldId::Email => "email",
            FieldId::Address => "address",
            FieldId::City => "city",
            FieldId::State => "state",
            FieldId::Country => "country",
            FieldId::MaritalStatus => "maritalStatus",
            FieldId::Dependents => "dependents",
            FieldId::EmploymentStatus => "employmentStatus",
            FieldId::MonthlyIncome => "monthlyIncome",
            FieldId::HousingStatus => "housingStatus",
            FieldId::CurrentFinancialSituation => "currentFinancialSituation",
            FieldId::EmploymentCircumstances => "employmentCircumstances",
            FieldId::ReasonForApplying => "reasonForApplying",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FieldId::Name => "Full name",
            FieldId::NationalId => "National ID",
            FieldId::DateOfBirth => "Date of birth (YYYY-MM-DD)",
            FieldId::Gender => "Gender",
            FieldId::Phone => "Phone",
            FieldId::Email => "Email",
            FieldId::Address => "Address",
            FieldId::City => "City",
            FieldId::State => "State",
            FieldId::Country => "Country",
            FieldId::MaritalStatus => "Marital status",
            FieldId::Dependents => "Number of dependents",
            FieldId::EmploymentStatus => "Employment status",
            FieldId::MonthlyIncome => "Monthly income",
            FieldId::HousingStatus => "Housing status",
            FieldId::CurrentFinancialSituation => "Current financial situation",
            FieldId::EmploymentCircumstances => "Employment circumstances",
            FieldId::ReasonForApplying => "Reason for applying",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            FieldId::DateOfBirth => FieldKind::Date,
            FieldId::Gender
            | FieldId::MaritalStatus
            | FieldId::EmploymentStatus
            | FieldId::HousingStatus => FieldKind::Choice,
            FieldId::Dependents | FieldId::MonthlyIncome => FieldKind::Number,
            FieldId::CurrentFinancialSituation
            | FieldId::EmploymentCircumstances
            | FieldId::ReasonForApplying => FieldKind::LongText,
            _ => FieldKind::Text,
        }
    }

    pub fn step(self) -> Step {
        Step::ALL
            .into_iter()
            .find(|step| step.fields().contains(&self))
            .unwrap_or(Step::One)
    }

    /// Whether the field offers AI drafting help.
    pub fn supports_suggestions(self) -> bool {
        self.kind() == FieldKind::LongText
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
