// Column lists shared by every statement that decodes into a domain row.
// NUMERIC budgets are read back as float8.

macro_rules! plan_columns {
    () => {
        "id, title, description, start_date, end_date, budget::float8 AS budget, \
         currency, is_public, version, created_at, updated_at"
    };
}

macro_rules! plan_summary_columns {
    () => {
        "id, title, start_date, end_date, budget::float8 AS budget, currency, is_public, \
         created_at"
    };
}

macro_rules! location_columns {
    () => {
        "id, travel_plan_id, name, address, latitude, longitude, visit_order, \
         arrival_date, departure_date, budget::float8 AS budget, notes, version, \
         created_at, updated_at"
    };
}
