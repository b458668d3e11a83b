pub mod default_route;
pub mod permit_route;
