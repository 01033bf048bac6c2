//! Data access for every aggregate, one sub-module per area.
//! Public functions are re-exported here so handlers can call
//! `crate::db::services::*` directly.

pub mod bill_service;
pub mod contract_service;
pub mod dashboard_service;
pub mod report_service;
pub mod residency_service;
pub mod room_service;
pub mod settings_service;
pub mod tenant_service;

pub use bill_service::*;
pub use contract_service::*;
pub use dashboard_service::*;
pub use report_service::*;
pub use residency_service::*;
pub use room_service::*;
pub use settings_service::*;
pub use tenant_service::*;
