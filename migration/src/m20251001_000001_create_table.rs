use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Name,
    Email,
    PasswordHash,
    Role,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Shops {
    Table,
    Id,
    Name,
    Address,
    Phone,
    Website,
    VendorId,
    Longitude,
    Latitude,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Parts {
    Table,
    Id,
    Name,
    Model,
    Company,
    Brand,
    PartType,
    VehicleYear,
    Compatibility,
    CountInStock,
    Price,
    Images,
    Description,
    Rating,
    NumReviews,
    VendorId,
    ShopId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Reviews {
    Table,
    Id,
    PartId,
    UserId,
    Name,
    Rating,
    Comment,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
    UserId,
    ShippingAddress,
    PaymentMethod,
    Phone,
    CollectionDate,
    IsPaid,
    PaidAt,
    IsDelivered,
    DeliveredAt,
    SmsSentAt,
    SmsError,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum OrderItems {
    Table,
    Id,
    OrderId,
    Name,
    Qty,
    Price,
    ProductId,
}

#[derive(DeriveIden)]
enum CompanyMeta {
    Table,
    Id,
    Company,
    Image,
    UpdatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ModelMeta {
    Table,
    Id,
    Company,
    Model,
    Image,
    UpdatedBy,
    CreatedAt,
    UpdatedAt,
}

fn id_col<T: IntoIden>(name: T) -> ColumnDef {
    ColumnDef::new(name)
        .integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

fn timestamp_col<T: IntoIden>(name: T) -> ColumnDef {
    ColumnDef::new(name)
        .timestamp_with_time_zone()
        .not_null()
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(id_col(Users::Id))
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::Role).string_len(16).not_null())
                    .col(timestamp_col(Users::CreatedAt))
                    .col(timestamp_col(Users::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // Vendor ownership is enforced by the application, not by a constraint.
        manager
            .create_table(
                Table::create()
                    .table(Shops::Table)
                    .if_not_exists()
                    .col(id_col(Shops::Id))
                    .col(ColumnDef::new(Shops::Name).string().not_null())
                    .col(ColumnDef::new(Shops::Address).string().null())
                    .col(ColumnDef::new(Shops::Phone).string().null())
                    .col(ColumnDef::new(Shops::Website).string().null())
                    .col(ColumnDef::new(Shops::VendorId).integer().not_null())
                    .col(
                        ColumnDef::new(Shops::Longitude)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Shops::Latitude)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(timestamp_col(Shops::CreatedAt))
                    .col(timestamp_col(Shops::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-shops-vendor_id")
                    .table(Shops::Table)
                    .col(Shops::VendorId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-shops-location")
                    .table(Shops::Table)
                    .col(Shops::Latitude)
                    .col(Shops::Longitude)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Parts::Table)
                    .if_not_exists()
                    .col(id_col(Parts::Id))
                    .col(ColumnDef::new(Parts::Name).string().not_null())
                    .col(ColumnDef::new(Parts::Model).string().null())
                    .col(ColumnDef::new(Parts::Company).string().null())
                    .col(ColumnDef::new(Parts::Brand).string().null())
                    .col(ColumnDef::new(Parts::PartType).string().null())
                    .col(ColumnDef::new(Parts::VehicleYear).integer().null())
                    .col(ColumnDef::new(Parts::Compatibility).json().not_null())
                    .col(
                        ColumnDef::new(Parts::CountInStock)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Parts::Price).double().not_null())
                    .col(ColumnDef::new(Parts::Images).json().not_null())
                    .col(ColumnDef::new(Parts::Description).text().null())
                    .col(
                        ColumnDef::new(Parts::Rating)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Parts::NumReviews)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Parts::VendorId).integer().not_null())
                    .col(ColumnDef::new(Parts::ShopId).integer().not_null())
                    .col(timestamp_col(Parts::CreatedAt))
                    .col(timestamp_col(Parts::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx-parts-shop_id", Parts::ShopId),
            ("idx-parts-company", Parts::Company),
            ("idx-parts-brand", Parts::Brand),
            ("idx-parts-part_type", Parts::PartType),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Parts::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_table(
                Table::create()
                    .table(Reviews::Table)
                    .if_not_exists()
                    .col(id_col(Reviews::Id))
                    .col(ColumnDef::new(Reviews::PartId).integer().not_null())
                    .col(ColumnDef::new(Reviews::UserId).integer().not_null())
                    .col(ColumnDef::new(Reviews::Name).string().not_null())
                    .col(ColumnDef::new(Reviews::Rating).integer().not_null())
                    .col(ColumnDef::new(Reviews::Comment).text().null())
                    .col(timestamp_col(Reviews::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-reviews-part_id")
                            .from(Reviews::Table, Reviews::PartId)
                            .to(Parts::Table, Parts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-reviews-part_id-user_id")
                    .table(Reviews::Table)
                    .col(Reviews::PartId)
                    .col(Reviews::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(id_col(Orders::Id))
                    .col(ColumnDef::new(Orders::UserId).integer().not_null())
                    .col(ColumnDef::new(Orders::ShippingAddress).json().not_null())
                    .col(ColumnDef::new(Orders::PaymentMethod).string().null())
                    .col(ColumnDef::new(Orders::Phone).string().null())
                    .col(ColumnDef::new(Orders::CollectionDate).date().null())
                    .col(
                        ColumnDef::new(Orders::IsPaid)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Orders::PaidAt).timestamp_with_time_zone().null())
                    .col(
                        ColumnDef::new(Orders::IsDelivered)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Orders::DeliveredAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Orders::SmsSentAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Orders::SmsError).text().null())
                    .col(timestamp_col(Orders::CreatedAt))
                    .col(timestamp_col(Orders::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-orders-user_id")
                    .table(Orders::Table)
                    .col(Orders::UserId)
                    .to_owned(),
            )
            .await?;

        // product_id is a weak reference: parts may be deleted after ordering.
        manager
            .create_table(
                Table::create()
                    .table(OrderItems::Table)
                    .if_not_exists()
                    .col(id_col(OrderItems::Id))
                    .col(ColumnDef::new(OrderItems::OrderId).integer().not_null())
                    .col(ColumnDef::new(OrderItems::Name).string().not_null())
                    .col(ColumnDef::new(OrderItems::Qty).integer().not_null())
                    .col(ColumnDef::new(OrderItems::Price).double().not_null())
                    .col(ColumnDef::new(OrderItems::ProductId).integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-order-items-order_id")
                            .from(OrderItems::Table, OrderItems::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CompanyMeta::Table)
                    .if_not_exists()
                    .col(id_col(CompanyMeta::Id))
                    .col(
                        ColumnDef::new(CompanyMeta::Company)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(CompanyMeta::Image).string().null())
                    .col(ColumnDef::new(CompanyMeta::UpdatedBy).integer().null())
                    .col(timestamp_col(CompanyMeta::CreatedAt))
                    .col(timestamp_col(CompanyMeta::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ModelMeta::Table)
                    .if_not_exists()
                    .col(id_col(ModelMeta::Id))
                    .col(ColumnDef::new(ModelMeta::Company).string().not_null())
                    .col(ColumnDef::new(ModelMeta::Model).string().not_null())
                    .col(ColumnDef::new(ModelMeta::Image).string().null())
                    .col(ColumnDef::new(ModelMeta::UpdatedBy).integer().null())
                    .col(timestamp_col(ModelMeta::CreatedAt))
                    .col(timestamp_col(ModelMeta::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-model-meta-company-model")
                    .table(ModelMeta::Table)
                    .col(ModelMeta::Company)
                    .col(ModelMeta::Model)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ModelMeta::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CompanyMeta::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OrderItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Reviews::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Parts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Shops::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}
