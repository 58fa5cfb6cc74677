//! Message normalization: MIME parsing, body selection and attachment text.

mod attachment;
mod html;
mod normalizer;

pub use attachment::{AttachmentKind, sniff_kind};
pub use html::strip_html;
pub use normalizer::ContentNormalizer;
