//! Request bodies and the checks applied before they reach a shard.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use tracing::info;

use crate::core::{Result, ShardError};
use crate::domain::{LocationPatch, NewLocation, NewTravelPlan, TravelPlanPatch};

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_NAME_LEN: usize = 200;

lazy_static! {
    static ref CURRENCY: Regex = Regex::new(r"^[A-Z]{3}$").unwrap();
    static ref ISO_DATE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
}

#[derive(Debug, Default, Deserialize)]
pub struct CreatePlanRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub budget: Option<f64>,
    pub currency: Option<String>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePlanRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub budget: Option<f64>,
    pub currency: Option<String>,
    pub is_public: Option<bool>,
    pub version: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateLocationRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub arrival_date: Option<String>,
    pub departure_date: Option<String>,
    pub budget: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateLocationRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub visit_order: Option<i64>,
    pub arrival_date: Option<String>,
    pub departure_date: Option<String>,
    pub budget: Option<f64>,
    pub notes: Option<String>,
    pub version: Option<i64>,
}

impl CreatePlanRequest {
    /// Validate and attach the id that will decide the plan's shard.
    pub fn into_new_plan(self, id: String) -> Result<NewTravelPlan> {
        let title = match self.title {
            Some(title) => check_text("title", title, MAX_TITLE_LEN)?,
            None => return Err(reject("title is required")),
        };
        let start_date = parse_date("start_date", self.start_date.as_deref())?;
        let end_date = parse_date("end_date", self.end_date.as_deref())?;
        check_date_order("start_date", start_date, "end_date", end_date)?;
        check_budget(self.budget)?;
        check_currency(self.currency.as_deref())?;

        Ok(NewTravelPlan {
            id,
            title,
            description: self.description,
            start_date,
            end_date,
            budget: self.budget,
            currency: self.currency,
            is_public: self.is_public,
        })
    }
}

impl UpdatePlanRequest {
    /// Validate and split into the patch and the version the caller saw.
    pub fn into_patch(self) -> Result<(TravelPlanPatch, i32)> {
        let version = match self.version {
            Some(version) => check_version(version)?,
            None => return Err(reject("version is required")),
        };
        let title = self
            .title
            .map(|title| check_text("title", title, MAX_TITLE_LEN))
            .transpose()?;
        let start_date = parse_date("start_date", self.start_date.as_deref())?;
        let end_date = parse_date("end_date", self.end_date.as_deref())?;
        check_date_order("start_date", start_date, "end_date", end_date)?;
        check_budget(self.budget)?;
        check_currency(self.currency.as_deref())?;

        let patch = TravelPlanPatch {
            title,
            description: self.description,
            start_date,
            end_date,
            budget: self.budget,
            currency: self.currency,
            is_public: self.is_public,
        };
        Ok((patch, version))
    }
}

impl CreateLocationRequest {
    pub fn into_new_location(self) -> Result<NewLocation> {
        let name = match self.name {
            Some(name) => check_text("name", name, MAX_NAME_LEN)?,
            None => return Err(reject("name is required")),
        };
        check_coordinates(self.latitude, self.longitude)?;
        let arrival_date = parse_date("arrival_date", self.arrival_date.as_deref())?;
        let departure_date = parse_date("departure_date", self.departure_date.as_deref())?;
        check_date_order("arrival_date", arrival_date, "departure_date", departure_date)?;
        check_budget(self.budget)?;

        Ok(NewLocation {
            name,
            address: self.address,
            latitude: self.latitude,
            longitude: self.longitude,
            arrival_date,
            departure_date,
            budget: self.budget,
            notes: self.notes,
        })
    }
}

impl UpdateLocationRequest {
    /// Validate and split into the patch and the optional expected version.
    pub fn into_patch(self) -> Result<(LocationPatch, Option<i32>)> {
        let version = self.version.map(check_version).transpose()?;
        let name = self
            .name
            .map(|name| check_text("name", name, MAX_NAME_LEN))
            .transpose()?;
        check_coordinates(self.latitude, self.longitude)?;
        let visit_order = self.visit_order.map(check_visit_order).transpose()?;
        let arrival_date = parse_date("arrival_date", self.arrival_date.as_deref())?;
        let departure_date = parse_date("departure_date", self.departure_date.as_deref())?;
        check_date_order("arrival_date", arrival_date, "departure_date", departure_date)?;
        check_budget(self.budget)?;

        let patch = LocationPatch {
            name,
            address: self.address,
            latitude: self.latitude,
            longitude: self.longitude,
            visit_order,
            arrival_date,
            departure_date,
            budget: self.budget,
            notes: self.notes,
        };
        Ok((patch, version))
    }
}

fn reject(reason: impl Into<String>) -> ShardError {
    let reason = reason.into();
    info!(reason = %reason, "request failed validation");
    ShardError::validation(reason)
}

fn check_text(field: &str, value: String, max_len: usize) -> Result<String> {
    if value.trim().is_empty() {
        return Err(reject(format!("{field} must not be blank")));
    }
    if value.chars().count() > max_len {
        return Err(reject(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(value)
}

/// Accepts only `YYYY-MM-DD` naming a real calendar day.
pub fn parse_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>> {
    let Some(value) = value else {
        return Ok(None);
    };
    if !ISO_DATE.is_match(value) {
        return Err(reject(format!("{field} must be a date in YYYY-MM-DD format")));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| reject(format!("{field} is not a valid calendar date")))
}

fn check_date_order(
    first_field: &str,
    first: Option<NaiveDate>,
    second_field: &str,
    second: Option<NaiveDate>,
) -> Result<()> {
    if let (Some(first), Some(second)) = (first, second)
        && first > second
    {
        return Err(reject(format!(
            "{first_field} must not be after {second_field}"
        )));
    }
    Ok(())
}

/// Non-negative with at most two decimal places.
pub fn check_budget(budget: Option<f64>) -> Result<()> {
    let Some(budget) = budget else {
        return Ok(());
    };
    if !budget.is_finite() || budget < 0.0 {
        return Err(reject("budget must be a non-negative amount"));
    }
    let repr = budget.to_string();
    if let Some((_, fraction)) = repr.split_once('.')
        && fraction.len() > 2
    {
        return Err(reject("budget must have at most two decimal places"));
    }
    Ok(())
}

pub fn check_currency(currency: Option<&str>) -> Result<()> {
    match currency {
        Some(code) if !CURRENCY.is_match(code) => Err(reject(
            "currency must be a three-letter uppercase code",
        )),
        _ => Ok(()),
    }
}

fn check_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Result<()> {
    if let Some(latitude) = latitude
        && !(-90.0..=90.0).contains(&latitude)
    {
        return Err(reject("latitude must be between -90 and 90"));
    }
    if let Some(longitude) = longitude
        && !(-180.0..=180.0).contains(&longitude)
    {
        return Err(reject("longitude must be between -180 and 180"));
    }
    Ok(())
}

fn check_version(version: i64) -> Result<i32> {
    match i32::try_from(version) {
        Ok(version) if version > 0 => Ok(version),
        _ => Err(reject("version must be a positive integer")),
    }
}

fn check_visit_order(visit_order: i64) -> Result<i32> {
    match i32::try_from(visit_order) {
        Ok(visit_order) if visit_order > 0 => Ok(visit_order),
        _ => Err(reject("visit_order must be a positive integer")),
    }
}
