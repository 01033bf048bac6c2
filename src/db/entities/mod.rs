//! SeaORM entities, one module per table.

pub mod bill;
pub mod contract;
pub mod contract_tenant;
pub mod residency_record;
pub mod room;
pub mod setting;
pub mod tenant;
pub mod user;

pub mod prelude {
    pub use super::room::Entity as Room;
    pub use super::room::Model as RoomModel;
    pub use super::room::ActiveModel as RoomActiveModel;
    pub use super::room::Column as RoomColumn;

    pub use super::tenant::Entity as Tenant;
    pub use super::tenant::Model as TenantModel;
    pub use super::tenant::ActiveModel as TenantActiveModel;
    pub use super::tenant::Column as TenantColumn;

    pub use super::contract::Entity as Contract;
    pub use super::contract::Model as ContractModel;
    pub use super::contract::ActiveModel as ContractActiveModel;
    pub use super::contract::Column as ContractColumn;

    pub use super::contract_tenant::Entity as ContractTenant;
    pub use super::contract_tenant::Model as ContractTenantModel;
    pub use super::contract_tenant::ActiveModel as ContractTenantActiveModel;
    pub use super::contract_tenant::Column as ContractTenantColumn;

    pub use super::bill::Entity as Bill;
    pub use super::bill::Model as BillModel;
    pub use super::bill::ActiveModel as BillActiveModel;
    pub use super::bill::Column as BillColumn;

    pub use super::residency_record::Entity as ResidencyRecord;
    pub use super::residency_record::Model as ResidencyRecordModel;
    pub use super::residency_record::ActiveModel as ResidencyRecordActiveModel;
    pub use super::residency_record::Column as ResidencyRecordColumn;

    pub use super::setting::Entity as Setting;
    pub use super::setting::Model as SettingModel;
    pub use super::setting::ActiveModel as SettingActiveModel;
    pub use super::setting::Column as SettingColumn;

    pub use super::user::Entity as User;
    pub use super::user::Model as UserModel;
    pub use super::user::ActiveModel as UserActiveModel;
    pub use super::user::Column as UserColumn;
}
