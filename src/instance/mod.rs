use crate::error::{ProxyError, Result};
use std::fmt;
use url::Url;

/// A remote instance of the string service, normalized to a full locator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    /// Address as it appeared in the configuration
    address: String,
    /// Canonical locator
    url: Url,
}

impl Instance {
    /// Parse an instance address (`host[:port][/path]`).
    ///
    /// Addresses without a scheme get `http://` prepended, and an address
    /// with no path is routed to `/<operation>`. Only `http` and `https`
    /// schemes are accepted.
    pub fn parse(address: &str, operation: &str) -> Result<Self> {
        let address = address.trim();
        if address.is_empty() {
            return Err(ProxyError::InvalidInstance(
                "instance address cannot be empty".to_string(),
            ));
        }

        let locator = if address.contains("://") {
            address.to_string()
        } else {
            format!("http://{}", address)
        };

        let mut url = Url::parse(&locator)
            .map_err(|e| ProxyError::InvalidInstance(format!("{}: {}", address, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ProxyError::InvalidInstance(format!(
                "{}: unsupported scheme {}",
                address,
                url.scheme()
            )));
        }

        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err(ProxyError::InvalidInstance(format!(
                "{}: missing host",
                address
            )));
        }

        // The url crate reports "/" for http URLs without a path
        if url.path().is_empty() || url.path() == "/" {
            url.set_path(&format!("/{}", operation.trim_start_matches('/')));
        }

        Ok(Self {
            address: address.to_string(),
            url,
        })
    }

    /// Address as configured
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Normalized locator
    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// Split a comma-separated instance list, trimming whitespace around each
/// entry. An empty (or all-whitespace) list yields no instances.
pub fn split_instances(instances: &str) -> Vec<String> {
    if instances.trim().is_empty() {
        return Vec::new();
    }

    instances
        .split(',')
        .map(|s| s.trim().to_string())
        .collect()
}
