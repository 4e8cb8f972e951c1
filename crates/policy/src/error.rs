use thiserror::Error;

#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("failed to parse plan document: {0}")]
    Plan(#[from] simd_json::Error),
    #[error(transparent)]
    Manifest(#[from] infractl_k8s::ManifestError),
}

pub type Result<T> = std::result::Result<T, PolicyError>;
