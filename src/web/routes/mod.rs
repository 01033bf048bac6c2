pub mod bill_routes;
pub mod contract_routes;
pub mod dashboard_routes;
pub mod report_routes;
pub mod residency_routes;
pub mod room_routes;
pub mod settings_routes;
pub mod tenant_routes;
