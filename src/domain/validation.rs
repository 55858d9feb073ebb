//! Per-step validation rules.
//!
//! Each validator is a pure function from the step's raw input to either the
//! section value to store or the per-field messages to display. Nothing here
//! reads the clock; callers pass `today`.

use super::errors::FieldErrors;
use super::models::{
    Choice, EmploymentStatus, FamilyFinancialInformation, FieldId, HousingStatus, MaritalStatus,
    PersonalInformation, SituationDescriptions,
};
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

pub const MSG_REQUIRED: &str = "This field is required";
pub const MSG_EMAIL: &str = "Please enter a valid email address";
pub const MSG_DATE: &str = "Please enter a valid date (YYYY-MM-DD)";
pub const MSG_MIN_AGE: &str = "You must be at least 18 years old.";
pub const MSG_NUMBER: &str = "Please enter a valid number";
pub const MSG_NON_NEGATIVE: &str = "Please enter a number greater than or equal to 0";
pub const MSG_WHOLE_NUMBER: &str = "Please enter a whole number";

pub const MINIMUM_AGE_YEARS: i32 = 18;
pub const DATE_FORMAT: &str = "%Y-%m-%d";

static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+$").expect("email pattern compiles"));

/// Latest birth date that still counts as an adult on `today`.
///
/// Same month and day, eighteen years earlier. When that day does not exist
/// (Feb 29 in a non-leap year) it rolls over to Mar 1.
pub fn adult_cutoff(today: NaiveDate) -> NaiveDate {
    let year = today.year() - MINIMUM_AGE_YEARS;
    NaiveDate::from_ymd_opt(year, today.month(), today.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
        .unwrap_or(today)
}

fn require(errors: &mut FieldErrors, field: FieldId, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.insert(field, MSG_REQUIRED);
        false
    } else {
        true
    }
}

fn require_choice<C: Choice>(errors: &mut FieldErrors, field: FieldId, value: C) {
    if !value.is_specified() {
        errors.insert(field, MSG_REQUIRED);
    }
}

/// Step 1.
pub fn validate_personal(
    input: &PersonalInformation,
    today: NaiveDate,
) -> Result<PersonalInformation, FieldErrors> {
    let mut errors = FieldErrors::new();

    require(&mut errors, FieldId::Name, &input.name);
    require(&mut errors, FieldId::NationalId, &input.national_id);
    require_choice(&mut errors, FieldId::Gender, input.gender);
    require(&mut errors, FieldId::Phone, &input.phone);
    require(&mut errors, FieldId::Address, &input.address);
    require(&mut errors, FieldId::City, &input.city);
    require(&mut errors, FieldId::State, &input.state);
    require(&mut errors, FieldId::Country, &input.country);

    if require(&mut errors, FieldId::Email, &input.email) && !EMAIL_SHAPE.is_match(input.email.trim())
    {
        errors.insert(FieldId::Email, MSG_EMAIL);
    }

    if require(&mut errors, FieldId::DateOfBirth, &input.date_of_birth) {
        match NaiveDate::parse_from_str(input.date_of_birth.trim(), DATE_FORMAT) {
            Ok(dob) if dob > adult_cutoff(today) => errors.insert(FieldId::DateOfBirth, MSG_MIN_AGE),
            Ok(_) => {}
            Err(_) => errors.insert(FieldId::DateOfBirth, MSG_DATE),
        }
    }

    errors.into_result(input.clone())
}

/// Raw step 2 input as typed: choices are already typed, numbers are text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FamilyFinancialForm {
    pub marital_status: MaritalStatus,
    pub dependents: String,
    pub employment_status: EmploymentStatus,
    pub monthly_income: String,
    pub housing_status: HousingStatus,
}

impl From<&FamilyFinancialInformation> for FamilyFinancialForm {
    fn from(section: &FamilyFinancialInformation) -> Self {
        Self {
            marital_status: section.marital_status,
            dependents: section.dependents.map(|d| d.to_string()).unwrap_or_default(),
            employment_status: section.employment_status,
            monthly_income: section
                .monthly_income
                .map(|m| m.to_string())
                .unwrap_or_default(),
            housing_status: section.housing_status,
        }
    }
}

fn parse_non_negative(errors: &mut FieldErrors, field: FieldId, raw: &str) -> Option<f64> {
    if !require(errors, field, raw) {
        return None;
    }
    match raw.trim().parse::<f64>() {
        Ok(value) if !value.is_finite() => {
            errors.insert(field, MSG_NUMBER);
            None
        }
        Ok(value) if value < 0.0 => {
            errors.insert(field, MSG_NON_NEGATIVE);
            None
        }
        Ok(value) => Some(value),
        Err(_) => {
            errors.insert(field, MSG_NUMBER);
            None
        }
    }
}

/// Step 2. On success the numeric text is coerced into the stored section.
pub fn validate_family_financial(
    form: &FamilyFinancialForm,
) -> Result<FamilyFinancialInformation, FieldErrors> {
    let mut errors = FieldErrors::new();

    require_choice(&mut errors, FieldId::MaritalStatus, form.marital_status);
    require_choice(&mut errors, FieldId::EmploymentStatus, form.employment_status);
    require_choice(&mut errors, FieldId::HousingStatus, form.housing_status);

    let dependents = parse_non_negative(&mut errors, FieldId::Dependents, &form.dependents)
        .and_then(|value| {
            if value.fract() != 0.0 {
                errors.insert(FieldId::Dependents, MSG_WHOLE_NUMBER);
                None
            } else if value > f64::from(u32::MAX) {
                errors.insert(FieldId::Dependents, MSG_NUMBER);
                None
            } else {
                Some(value as u32)
            }
        });
    let monthly_income = parse_non_negative(&mut errors, FieldId::MonthlyIncome, &form.monthly_income);

    errors.into_result(FamilyFinancialInformation {
        marital_status: form.marital_status,
        dependents,
        employment_status: form.employment_status,
        monthly_income,
        housing_status: form.housing_status,
    })
}

/// Step 3.
pub fn validate_situations(
    input: &SituationDescriptions,
) -> Result<SituationDescriptions, FieldErrors> {
    let mut errors = FieldErrors::new();

    require(
        &mut errors,
        FieldId::CurrentFinancialSituation,
        &input.current_financial_situation,
    );
    require(
        &mut errors,
        FieldId::EmploymentCircumstances,
        &input.employment_circumstances,
    );
    require(&mut errors, FieldId::ReasonForApplying, &input.reason_for_applying);

    errors.into_result(input.clone())
}
