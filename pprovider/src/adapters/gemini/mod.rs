mod decode;
mod normalize;
mod provider;
mod transport;
mod types;

pub use decode::{decode_stream, decode_unary};
pub use normalize::{gemini_role, merge_adjacent, normalize, parse_data_uri};
pub use provider::GeminiProvider;
pub use transport::{
    API_VERSION, GeminiHttpTransport, GeminiTransport, TransportRequest, build_endpoint,
};
pub use types::{
    GeminiCandidate, GeminiContent, GeminiFunctionCall, GeminiFunctionDeclaration,
    GeminiFunctionResponse, GeminiGenerationConfig, GeminiInlineData, GeminiPart,
    GeminiPromptFeedback, GeminiRequest, GeminiResponse, GeminiRole, GeminiSafetySetting,
    GeminiTool, GeminiUsageMetadata,
};
