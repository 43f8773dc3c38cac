pub mod access_queries;
pub mod station_queries;
