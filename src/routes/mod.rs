pub mod tenancy;

pub use tenancy::tenancy_routes;
