use crate::marker::InjectionMarker;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InjectionError {
    #[error("injection marker `{marker}` not found in the {} source", .marker.stage())]
    MarkerNotFound { marker: InjectionMarker },
    #[error(
        "injection marker `{marker}` occurs {count} times in the {} source; expected exactly once",
        .marker.stage()
    )]
    MarkerRepeated {
        marker: InjectionMarker,
        count: usize,
    },
    #[error("unknown shader chunk `{0}`")]
    UnknownChunk(String),
    #[error("shader chunk `{0}` exceeds the include depth limit")]
    IncludeDepth(String),
}
