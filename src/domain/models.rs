use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TravelPlan {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget: Option<f64>,
    pub currency: Option<String>,
    pub is_public: bool,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The columns returned by the global plan listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TravelPlanSummary {
    pub id: String,
    pub title: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget: Option<f64>,
    pub currency: Option<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Location {
    pub id: String,
    pub travel_plan_id: String,
    pub name: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub visit_order: i32,
    pub arrival_date: Option<NaiveDate>,
    pub departure_date: Option<NaiveDate>,
    pub budget: Option<f64>,
    pub notes: Option<String>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A plan together with its locations in visit order.
#[derive(Debug, Clone, Serialize)]
pub struct PlanDetails {
    #[serde(flatten)]
    pub plan: TravelPlan,
    pub locations: Vec<Location>,
    pub shard: String,
}

/// Input for a new plan. The id decides the shard and is chosen by the caller.
#[derive(Debug, Clone, Default)]
pub struct NewTravelPlan {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget: Option<f64>,
    pub currency: Option<String>,
    pub is_public: Option<bool>,
}

/// Fields to change on a plan; `None` leaves the stored value as it is.
#[derive(Debug, Clone, Default)]
pub struct TravelPlanPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget: Option<f64>,
    pub currency: Option<String>,
    pub is_public: Option<bool>,
}

impl TravelPlanPatch {
    pub fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.start_date.is_some()
            || self.end_date.is_some()
            || self.budget.is_some()
            || self.currency.is_some()
            || self.is_public.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewLocation {
    pub name: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub arrival_date: Option<NaiveDate>,
    pub departure_date: Option<NaiveDate>,
    pub budget: Option<f64>,
    pub notes: Option<String>,
}

/// Fields to change on a location; `None` leaves the stored value as it is.
#[derive(Debug, Clone, Default)]
pub struct LocationPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub visit_order: Option<i32>,
    pub arrival_date: Option<NaiveDate>,
    pub departure_date: Option<NaiveDate>,
    pub budget: Option<f64>,
    pub notes: Option<String>,
}

impl LocationPatch {
    pub fn has_changes(&self) -> bool {
        self.name.is_some()
            || self.address.is_some()
            || self.latitude.is_some()
            || self.longitude.is_some()
            || self.visit_order.is_some()
            || self.arrival_date.is_some()
            || self.departure_date.is_some()
            || self.budget.is_some()
            || self.notes.is_some()
    }
}
