use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub numero: i64,
    pub cliente: Option<String>,
    pub estado: String,
    pub total: i64,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub payment_allocations: Option<Json>,
    pub metodo_pago: Option<String>,
    pub payment_status: Option<String>,
    pub paid_at: Option<DateTimeWithTimeZone>,
    pub credit_empleado_id: Option<String>,
    pub credit_empleado_nombre: Option<String>,
    pub credit_monto: Option<i64>,
    pub credit_asignado_en: Option<DateTimeWithTimeZone>,
    pub credit_liquidado_en: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
