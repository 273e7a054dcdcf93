use super::StringService;
use crate::error::{ProxyError, Result};
use async_trait::async_trait;

/// Local implementation of the string service
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicStringService;

#[async_trait]
impl StringService for BasicStringService {
    async fn uppercase(&self, s: String) -> Result<String> {
        if s.is_empty() {
            return Err(ProxyError::EmptyString);
        }
        Ok(s.to_uppercase())
    }

    fn count(&self, s: &str) -> usize {
        s.len()
    }
}
