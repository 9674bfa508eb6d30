use derive_more::{Display, From};

pub type Result<T> = core::result::Result<T, IsoFieldError>;

#[derive(Debug, Display, From)]
pub enum IsoFieldError {
    /// Vertex buffer length is not a multiple of 3, so it cannot describe
    /// a triangle soup.
    #[display("vertex count {_0} is not a multiple of 3")]
    #[from(ignore)]
    RaggedVertexBuffer(usize),

    /// Normal buffer length does not match the vertex buffer length.
    #[display("{normals} normals for {vertices} vertices")]
    NormalCountMismatch { vertices: usize, normals: usize },

    /// Reading or writing a mesh file failed.
    #[display("i/o error: {_0}")]
    Io(std::io::Error),

    /// A PLY file did not match the subset of the format this crate emits.
    #[display("malformed ply at line {line}: {reason}")]
    MalformedPly { line: usize, reason: String },
}

impl std::error::Error for IsoFieldError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}
