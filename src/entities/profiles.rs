use sea_orm::entity::prelude::*;

/// Business profile, one per account. The OTP pair (`otp`,
/// `otp_created_at`) is always set or cleared together.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub account_id: i32,

    pub phone_no: Option<String>,

    pub business_name: Option<String>,

    /// Pending 6-digit code for the signup/login flows.
    pub otp: Option<String>,

    pub otp_created_at: Option<DateTimeUtc>,

    pub is_verified: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Account,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
