pub use sea_orm_migration::prelude::*;

mod m20240115_000001_create_users_table;
mod m20240115_000002_create_gyms_table;
mod m20240115_000003_create_programs_table;
mod m20240115_000004_create_carts_table;
mod m20240115_000005_create_cart_items_table;
mod m20240115_000006_create_payments_table;
mod m20240115_000007_create_purchased_programs_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240115_000001_create_users_table::Migration),
            Box::new(m20240115_000002_create_gyms_table::Migration),
            Box::new(m20240115_000003_create_programs_table::Migration),
            Box::new(m20240115_000004_create_carts_table::Migration),
            Box::new(m20240115_000005_create_cart_items_table::Migration),
            Box::new(m20240115_000006_create_payments_table::Migration),
            Box::new(m20240115_000007_create_purchased_programs_table::Migration),
        ]
    }
}
