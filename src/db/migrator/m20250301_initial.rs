use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Product categories seeded on first run.
const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("General", "general"),
    ("Electronics", "electronics"),
    ("Groceries", "groceries"),
    ("Clothing", "clothing"),
    ("Stationery", "stationery"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Accounts)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Profiles)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(PasswordResetOtps)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Categories)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Products)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Parties)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Customers)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Suppliers)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(SupplierInfos)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Expenses)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Invoices)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(InvoiceItems)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Seed default product categories
        for (name, slug) in DEFAULT_CATEGORIES {
            let insert = sea_orm_migration::sea_query::Query::insert()
                .into_table(Categories)
                .columns([
                    crate::entities::categories::Column::Name,
                    crate::entities::categories::Column::Slug,
                ])
                .values_panic([(*name).into(), (*slug).into()])
                .to_owned();

            manager.exec_stmt(insert).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InvoiceItems).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Invoices).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expenses).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SupplierInfos).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Suppliers).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Customers).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Parties).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Products).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PasswordResetOtps).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Profiles).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts).to_owned())
            .await?;

        Ok(())
    }
}
