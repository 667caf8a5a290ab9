//! Route classification: which requests bypass the cache.

use serde::{Deserialize, Serialize};

use crate::config::{DYNAMIC_ENDPOINTS, DYNAMIC_PREFIX};

/// Class of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Always forwarded to the network, never touches cache storage.
    Dynamic,
    /// Served cache-first with network fallback.
    Static,
}

/// The set of dynamic routes: path prefixes plus exact endpoint paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Any path starting with one of these is dynamic.
    pub prefixes: Vec<String>,
    /// Any path equal to one of these is dynamic.
    pub exact: Vec<String>,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            prefixes: vec![DYNAMIC_PREFIX.to_string()],
            exact: DYNAMIC_ENDPOINTS.iter().map(|&p| p.to_string()).collect(),
        }
    }
}

impl RouteConfig {
    /// Classifies a URL path.
    #[must_use]
    pub fn classify(&self, path: &str) -> RouteClass {
        let dynamic = self.prefixes.iter().any(|p| path.starts_with(p.as_str()))
            || self.exact.iter().any(|e| e == path);
        if dynamic {
            RouteClass::Dynamic
        } else {
            RouteClass::Static
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn endpoints_are_dynamic() {
        let routes = RouteConfig::default();
        for path in ["/api/anything", "/chat", "/lead", "/tts", "/stt", "/recap"] {
            assert_eq!(routes.classify(path), RouteClass::Dynamic, "{path}");
        }
    }

    #[test]
    fn endpoints_match_exactly() {
        let routes = RouteConfig::default();
        assert_eq!(routes.classify("/chat/history"), RouteClass::Static);
        assert_eq!(routes.classify("/chats"), RouteClass::Static);
        assert_eq!(routes.classify("/api"), RouteClass::Static);
    }

    #[test]
    fn assets_are_static() {
        let routes = RouteConfig::default();
        assert_eq!(routes.classify("/"), RouteClass::Static);
        assert_eq!(routes.classify("/granny-b-logo.png"), RouteClass::Static);
    }

    #[test]
    fn empty_config_is_all_static() {
        let routes = RouteConfig {
            prefixes: Vec::new(),
            exact: Vec::new(),
        };
        assert_eq!(routes.classify("/api/x"), RouteClass::Static);
    }

    proptest! {
        #[test]
        fn anything_under_api_prefix_is_dynamic(rest in "[a-zA-Z0-9/_.-]{0,40}") {
            let routes = RouteConfig::default();
            let path = format!("/api/{rest}");
            prop_assert_eq!(routes.classify(&path), RouteClass::Dynamic);
        }

        #[test]
        fn image_paths_are_static(name in "[a-z0-9-]{1,20}") {
            let routes = RouteConfig::default();
            let path = format!("/{name}.png");
            prop_assert_eq!(routes.classify(&path), RouteClass::Static);
        }
    }
}
