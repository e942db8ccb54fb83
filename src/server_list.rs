use crate::error::{Error, Result};
use crate::transport::ServerEndpoint;

/// Public master server list.
pub const DEFAULT_SERVER_LIST_URL: &str = "http://dplogin.com/serverlist.php";

/// Lazily downloaded copy of the master server list.
#[derive(Debug, Clone)]
pub struct ServerList {
  url: String,
  cached: Option<String>,
}

impl Default for ServerList {
  fn default() -> Self {
    Self::new(DEFAULT_SERVER_LIST_URL)
  }
}

impl ServerList {
  pub fn new(url: impl Into<String>) -> Self {
    Self {
      url: url.into(),
      cached: None,
    }
  }

  pub fn url(&self) -> &str {
    &self.url
  }

  /// Whether `endpoint` appears on the list, downloading it first when
  /// nothing is cached or `force` is set.
  pub async fn contains(
    &mut self,
    endpoint: &ServerEndpoint,
    force: bool,
  ) -> Result<bool> {
    if force || self.cached.is_none() {
      // a failed download keeps the previous copy
      self.cached = Some(fetch(&self.url).await?);
    }

    Ok(self.cached.as_deref().is_some_and(|text| lists(text, endpoint)))
  }
}

/// Substring check for `host:port` in the list body.
pub fn lists(text: &str, endpoint: &ServerEndpoint) -> bool {
  text.contains(&endpoint.to_string())
}

async fn fetch(url: &str) -> Result<String> {
  tracing::debug!(url, "fetching server list");
  let response = reqwest::get(url)
    .await
    .and_then(reqwest::Response::error_for_status)
    .map_err(Error::ServerListUnavailable)?;
  response.text().await.map_err(Error::ServerListUnavailable)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn matches_host_and_port_together() {
    let body = "10.0.0.1:27910\n10.0.0.2:27911\n";
    assert!(lists(body, &ServerEndpoint::new("10.0.0.1", 27910)));
    assert!(!lists(body, &ServerEndpoint::new("10.0.0.2", 27910)));
  }

  #[tokio::test]
  async fn unreachable_list_is_a_distinct_error() {
    let mut list = ServerList::new("http://127.0.0.1:1/serverlist.php");
    let err = list
      .contains(&ServerEndpoint::new("10.0.0.1", 27910), false)
      .await
      .unwrap_err();

    assert!(matches!(err, Error::ServerListUnavailable(_)));
    assert!(!err.is_connection_error());
  }

  #[tokio::test]
  async fn failed_forced_download_keeps_previous_list() {
    let endpoint = ServerEndpoint::new("10.0.0.1", 27910);
    let mut list = ServerList {
      url: "http://127.0.0.1:1/serverlist.php".to_string(),
      cached: Some("10.0.0.1:27910\n".to_string()),
    };

    let err = list.contains(&endpoint, true).await.unwrap_err();
    assert!(matches!(err, Error::ServerListUnavailable(_)));

    assert!(list.contains(&endpoint, false).await.expect("cached list"));
  }
}
