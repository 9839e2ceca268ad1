// ABOUTME: Charset adapters that transcode declared non-UTF-8 documents to UTF-8.
// ABOUTME: EncodingRsAdapter resolves WHATWG labels; closures can be used as adapters too.

use encoding_rs::Encoding;

use crate::error::FeedError;

/// Transcodes a document whose XML declaration names a non-UTF-8 encoding.
///
/// Called by the decoder with the declared label and the full input buffer.
/// Must return the same document as UTF-8 bytes.
pub trait CharsetAdapter: Send + Sync {
    fn adapt(&self, charset: &str, input: &[u8]) -> Result<Vec<u8>, FeedError>;
}

impl<F> CharsetAdapter for F
where
    F: Fn(&str, &[u8]) -> Result<Vec<u8>, FeedError> + Send + Sync,
{
    fn adapt(&self, charset: &str, input: &[u8]) -> Result<Vec<u8>, FeedError> {
        self(charset, input)
    }
}

/// Default adapter backed by `encoding_rs`.
///
/// Unknown labels are rejected. Malformed byte sequences become U+FFFD.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodingRsAdapter;

impl CharsetAdapter for EncodingRsAdapter {
    fn adapt(&self, charset: &str, input: &[u8]) -> Result<Vec<u8>, FeedError> {
        let encoding = Encoding::for_label(charset.trim().as_bytes())
            .ok_or_else(|| FeedError::charset(charset, "unknown encoding label"))?;

        let (decoded, actual, had_errors) = encoding.decode(input);
        if had_errors {
            tracing::debug!(
                declared = charset,
                used = actual.name(),
                "replaced malformed sequences while transcoding feed"
            );
        }
        Ok(decoded.into_owned().into_bytes())
    }
}

/// Adapter that refuses every non-UTF-8 declaration.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8OnlyAdapter;

impl CharsetAdapter for Utf8OnlyAdapter {
    fn adapt(&self, charset: &str, _input: &[u8]) -> Result<Vec<u8>, FeedError> {
        Err(FeedError::charset(charset, "only UTF-8 input is accepted"))
    }
}
