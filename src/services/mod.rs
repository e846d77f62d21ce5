pub mod auth_service;
pub mod farmer_service;
pub mod order_service;
pub mod product_service;
pub mod upload_service;
pub mod user_service;

use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, Select};

use crate::domain::{DomainError, Page, PageRequest};

/// Run a select through the SeaORM paginator
pub(crate) async fn fetch_page<E>(
    db: &DatabaseConnection,
    select: Select<E>,
    request: PageRequest,
) -> Result<Page<E::Model>, DomainError>
where
    E: EntityTrait,
    E::Model: Sync + 'static,
{
    let paginator = select.paginate(db, request.page_size);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(request.index()).await?;
    Ok(Page::new(items, total, request))
}
