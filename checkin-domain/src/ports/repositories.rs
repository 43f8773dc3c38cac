use async_trait::async_trait;

use crate::entities::AccessBook;

#[async_trait]
pub trait AccessRepository: Send + Sync {
    async fn load(&self) -> anyhow::Result<AccessBook>;
    async fn save(&self, book: &AccessBook) -> anyhow::Result<()>;
}
