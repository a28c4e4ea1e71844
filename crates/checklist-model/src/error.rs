use thiserror::Error;

use crate::status::TaxonomicStatus;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("status {status} cannot be assigned to a {target}")]
    StatusKindMismatch {
        status: TaxonomicStatus,
        target: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, ModelError>;
