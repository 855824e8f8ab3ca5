//! Errors - ドメイン層のエラー型

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("entity id must not be empty")]
    EmptyEntityId,
}
