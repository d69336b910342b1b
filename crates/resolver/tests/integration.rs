//! Integration tests for resolver crate

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use httpmock::prelude::*;
    use pacsmith_errors::{Error, NetworkError, PackageError};
    use pacsmith_events::{channel, AppEvent, EventSender, ResolverEvent};
    use pacsmith_resolver::*;
    use pacsmith_types::Version;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Upstream source backed by a fixed table
    #[derive(Default)]
    struct FakeUpstream {
        packages: HashMap<String, UpstreamPackage>,
        queries: AtomicUsize,
        fail: bool,
    }

    impl FakeUpstream {
        fn with(mut self, name: &str, version: &str, depends: &[&str], makedepends: &[&str]) -> Self {
            self.packages.insert(
                name.to_string(),
                UpstreamPackage {
                    name: name.to_string(),
                    version: version.to_string(),
                    depends: depends.iter().map(|d| (*d).to_string()).collect(),
                    makedepends: makedepends.iter().map(|d| (*d).to_string()).collect(),
                },
            );
            self
        }
    }

    #[async_trait]
    impl UpstreamSource for FakeUpstream {
        async fn query(&self, names: &[String]) -> Result<Vec<UpstreamPackage>, Error> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(NetworkError::UpstreamQuery {
                    message: "service unavailable".into(),
                }
                .into());
            }
            Ok(names
                .iter()
                .filter_map(|n| self.packages.get(n).cloned())
                .collect())
        }
    }

    /// Hosted versions keyed by name
    #[derive(Default)]
    struct FakeIndex(HashMap<String, Version>);

    impl FakeIndex {
        fn with(mut self, name: &str, version: &str) -> Self {
            self.0.insert(name.to_string(), Version::parse(version).unwrap());
            self
        }
    }

    #[async_trait]
    impl PackageIndex for FakeIndex {
        async fn is_new(&self, name: &str, version: &Version) -> Result<bool, Error> {
            Ok(self.0.get(name).is_none_or(|hosted| version > hosted))
        }
    }

    fn no_events() -> Option<EventSender> {
        None
    }

    fn roots(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| (*n).to_string()).collect()
    }

    #[tokio::test]
    async fn test_discover_follows_runtime_and_build_dependencies() {
        let upstream = FakeUpstream::default()
            .with("app", "1.0-1", &["libfoo>=2", "glibc"], &["builder-tool"])
            .with("libfoo", "2.1-1", &["libbar"], &[])
            .with("libbar", "0.3-1", &[], &[])
            .with("builder-tool", "5-1", &[], &[]);
        let graph = DependencyGraph::discover(&upstream, &roots(&["app"]), &no_events())
            .await
            .unwrap();

        let mut names: Vec<_> = graph.nodes().map(|n| n.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["app", "builder-tool", "libbar", "libfoo"]);
        assert!(graph.get("glibc").is_none());
        // one query per breadth-first round
        assert_eq!(upstream.queries.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_groups_partition_every_node_once() {
        let upstream = FakeUpstream::default()
            .with("a", "1-1", &["shared"], &[])
            .with("b", "1-1", &[], &["shared"])
            .with("shared", "1-1", &[], &[])
            .with("c", "1-1", &["c-dep"], &[])
            .with("c-dep", "1-1", &[], &[]);
        let graph = DependencyGraph::discover(&upstream, &roots(&["a", "b", "c"]), &no_events())
            .await
            .unwrap();

        let groups = graph.groups();
        assert_eq!(groups.len(), 2);
        let total: usize = groups.iter().map(Vec::len).sum();
        assert_eq!(total, graph.len());

        let group_of = |name: &str| {
            groups
                .iter()
                .position(|g| g.iter().any(|id| graph.node(*id).name == name))
                .unwrap()
        };
        assert_eq!(group_of("a"), group_of("b"));
        assert_eq!(group_of("a"), group_of("shared"));
        assert_ne!(group_of("a"), group_of("c"));
        assert_eq!(group_of("c"), group_of("c-dep"));
    }

    #[tokio::test]
    async fn test_resolve_classifies_updates_and_rechecks() {
        let upstream = FakeUpstream::default()
            .with("neovim-git", "0.1.0-1", &["libvterm"], &["cmake"])
            .with("libvterm", "0.3-1", &[], &[])
            .with("ca-certificates", "20150402-1", &[], &[]);
        let index = FakeIndex::default()
            .with("neovim-git", "0.1.0-1")
            .with("libvterm", "0.2-1")
            .with("ca-certificates", "20150402-1");

        let resolver = UpdateResolver::new(Arc::new(upstream));
        let groups = resolver
            .resolve(
                "mikkel/repo",
                &roots(&["neovim-git", "ca-certificates"]),
                &index,
            )
            .await
            .unwrap();

        assert_eq!(
            groups,
            vec![UpdateGroup {
                updates: vec!["libvterm".to_string()],
                rechecks: vec!["neovim-git".to_string()],
            }]
        );
    }

    #[tokio::test]
    async fn test_resolve_aborts_on_failure() {
        let (tx, mut rx) = channel();
        let upstream = FakeUpstream {
            fail: true,
            ..FakeUpstream::default()
        };
        let resolver = UpdateResolver::new(Arc::new(upstream)).with_event_sender(tx);
        let err = resolver
            .resolve("mikkel/repo", &roots(&["app"]), &FakeIndex::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Network(NetworkError::UpstreamQuery { .. })));

        let mut failed = false;
        while let Ok(event) = rx.try_recv() {
            if let AppEvent::Resolver(ResolverEvent::ResolutionFailed { repo, failure }) = event {
                assert_eq!(repo, "mikkel/repo");
                assert_eq!(failure.code.as_deref(), Some("network.upstream_query"));
                failed = true;
            }
        }
        assert!(failed);
    }

    #[tokio::test]
    async fn test_resolve_rejects_bad_upstream_version() {
        let upstream = FakeUpstream::default().with("app", "not a version", &[], &[]);
        let resolver = UpdateResolver::new(Arc::new(upstream));
        let err = resolver
            .resolve("mikkel/repo", &roots(&["app"]), &FakeIndex::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Version(_)));
    }

    #[tokio::test]
    async fn test_resolve_rejects_bad_dependency() {
        let upstream = FakeUpstream::default().with("app", "1-1", &[">=2"], &[]);
        let err = DependencyGraph::discover(&upstream, &roots(&["app"]), &no_events())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Package(PackageError::InvalidDependency { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_roots_are_reported() {
        let (tx, mut rx) = channel();
        let upstream = FakeUpstream::default().with("known", "1-1", &[], &[]);
        let tx = Some(tx);
        DependencyGraph::discover(&upstream, &roots(&["known", "gone"]), &tx)
            .await
            .unwrap();

        let mut missing = None;
        while let Ok(event) = rx.try_recv() {
            if let AppEvent::Resolver(ResolverEvent::PackagesNotFound { names }) = event {
                missing = Some(names);
            }
        }
        assert_eq!(missing, Some(vec!["gone".to_string()]));
    }

    #[tokio::test]
    async fn test_aur_client_info_query() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/rpc/")
                .query_param("v", "5")
                .query_param("type", "info")
                .query_param("arg[]", "ca-certificates");
            then.status(200).json_body(json!({
                "version": 5,
                "type": "multiinfo",
                "resultcount": 1,
                "results": [{
                    "Name": "ca-certificates",
                    "Version": "20150402-1",
                    "Depends": ["ca-certificates-mozilla"],
                    "MakeDepends": ["asciidoc"],
                    "Popularity": 1.5
                }]
            }));
        });

        let client = AurClient::new(server.url("/rpc/"), Duration::from_secs(5), 100).unwrap();
        let found = client.query(&roots(&["ca-certificates"])).await.unwrap();

        mock.assert();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].version, "20150402-1");
        assert_eq!(found[0].depends, vec!["ca-certificates-mozilla"]);
        assert_eq!(found[0].makedepends, vec!["asciidoc"]);
    }

    #[tokio::test]
    async fn test_aur_client_batches_names() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/rpc/").query_param("type", "info");
            then.status(200)
                .json_body(json!({"version": 5, "type": "multiinfo", "resultcount": 0, "results": []}));
        });

        let client = AurClient::new(server.url("/rpc/"), Duration::from_secs(5), 2).unwrap();
        let found = client.query(&roots(&["a", "b", "c"])).await.unwrap();

        mock.assert_hits(2);
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_aur_client_errors() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/error/");
            then.status(200)
                .json_body(json!({"version": 5, "type": "error", "resultcount": 0, "results": [], "error": "Incorrect request type specified."}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/down/");
            then.status(503);
        });

        let client = AurClient::new(server.url("/error/"), Duration::from_secs(5), 10).unwrap();
        let err = client.query(&roots(&["x"])).await.unwrap_err();
        let Error::Network(NetworkError::UpstreamQuery { message }) = err else {
            panic!("expected upstream query error");
        };
        assert!(message.contains("Incorrect request type"));

        let client = AurClient::new(server.url("/down/"), Duration::from_secs(5), 10).unwrap();
        let err = client.query(&roots(&["x"])).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Network(NetworkError::HttpError { status: 503, .. })
        ));
    }
}
