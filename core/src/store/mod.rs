mod local;
mod mirror;
pub mod naming;

pub use local::{ArtifactStore, ArtifactStream, StoredArtifact};
pub use mirror::ArtifactMirror;
