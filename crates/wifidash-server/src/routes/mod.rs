pub mod access_points;
pub mod anomalies;
pub mod cause_codes;
pub mod clients;
pub mod health;
pub mod hosts;
pub mod load;
pub mod os_distribution;
pub mod time_series;
pub mod venue;
