use crate::explorer::ExplorerQuery;
use crate::onboarding::OAuthCallback;
use anyhow::{bail, Context, Result};
use std::fmt;
use url::Url;

/// Locations the terminal can be launched on or navigate between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    /// The wizard, optionally entered through an OAuth redirect.
    Connect(Option<OAuthCallback>),
    Explorer {
        connection_id: String,
        query: ExplorerQuery,
    },
}

impl Route {
    /// Accepts an absolute URL or a path with an optional query string.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let (path, query) = match Url::parse(input) {
            Ok(url) if url.has_host() => (url.path().to_string(), url.query().unwrap_or_default().to_string()),
            _ => match input.split_once('?') {
                Some((path, query)) => (path.to_string(), query.to_string()),
                None => (input.to_string(), String::new()),
            },
        };

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] | ["dashboard"] => Ok(Route::Dashboard),
            ["connect"] => Ok(Route::Connect(OAuthCallback::parse(&query))),
            ["connections", id] => {
                let connection_id = urlencoding::decode(id)
                    .with_context(|| format!("Connection id in {input} is not valid UTF-8"))?
                    .into_owned();
                Ok(Route::Explorer {
                    connection_id,
                    query: ExplorerQuery::parse(&query),
                })
            }
            _ => bail!("Unknown location: {input}"),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Dashboard => f.write_str("/"),
            Route::Connect(_) => f.write_str("/connect"),
            Route::Explorer {
                connection_id,
                query,
            } => write!(
                f,
                "/connections/{}?{}",
                urlencoding::encode(connection_id),
                query
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explorer::ExplorerTab;
    use crate::onboarding::CallbackOutcome;

    #[test]
    fn parses_dashboard_and_wizard() {
        assert_eq!(Route::parse("/").unwrap(), Route::Dashboard);
        assert_eq!(Route::parse("").unwrap(), Route::Dashboard);
        assert_eq!(Route::parse("/connect").unwrap(), Route::Connect(None));
    }

    #[test]
    fn wizard_route_carries_oauth_callback() {
        let route = Route::parse("https://app.example.test/connect?status=success&connectorId=jira").unwrap();
        match route {
            Route::Connect(Some(callback)) => {
                assert_eq!(callback.outcome, CallbackOutcome::Success);
                assert_eq!(callback.connector_id.as_deref(), Some("jira"));
            }
            other => panic!("unexpected route {other:?}"),
        }
    }

    #[test]
    fn explorer_route_round_trips() {
        let route = Route::parse("/connections/team%20a?tab=items&q=bug").unwrap();
        let Route::Explorer {
            ref connection_id,
            ref query,
        } = route
        else {
            panic!("expected explorer");
        };
        assert_eq!(connection_id, "team a");
        assert_eq!(query.tab, ExplorerTab::Items);
        assert_eq!(query.search.as_deref(), Some("bug"));
        assert_eq!(route.to_string(), "/connections/team%20a?tab=items&q=bug");
        assert_eq!(Route::parse(&route.to_string()).unwrap(), route);
    }

    #[test]
    fn unknown_paths_are_rejected() {
        assert!(Route::parse("/settings").is_err());
        assert!(Route::parse("/connections").is_err());
    }
}
