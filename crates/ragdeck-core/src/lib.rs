pub mod api;
pub mod config;
pub mod graph;
pub mod session;
pub mod upload;

pub use api::{
    ApiError, ApiResponse, Document, HealthStatus, HttpClient, QueryMode, QueryRequest, RagApi,
    StreamChunk, StreamFraming, UploadKind,
};
pub use config::Config;
pub use graph::{adapt, AdaptedGraph, AdapterOptions, GraphData, GraphEdge, GraphNode, NetworkView};
pub use session::{Exchange, QueryController, QueryMetrics, SessionError, SessionEvent, Transcript};
pub use upload::{validate_upload, UploadError};
