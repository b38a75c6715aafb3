pub mod activity;
pub mod assignment;
pub mod delivery;
pub mod driver;
pub mod geofence;
pub mod route;
