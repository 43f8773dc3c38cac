pub mod access_commands;
pub mod station_commands;
