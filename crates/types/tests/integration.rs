//! Integration tests for types

#[cfg(test)]
mod tests {
    use pacsmith_types::*;
    use proptest::prelude::*;
    use std::cmp::Ordering;

    fn version_strategy() -> impl Strategy<Value = String> {
        (
            proptest::option::of(0u64..3),
            "[0-9a-z]{1,3}([._+~][0-9a-z]{1,3}){0,3}",
            1u32..4,
            proptest::option::of(0u32..3),
        )
            .prop_map(|(epoch, pkgver, rel, minor)| {
                let mut s = String::new();
                if let Some(epoch) = epoch {
                    s.push_str(&format!("{epoch}:"));
                }
                s.push_str(&pkgver);
                s.push_str(&format!("-{rel}"));
                if let Some(minor) = minor {
                    s.push_str(&format!(".{minor}"));
                }
                s
            })
    }

    proptest! {
        #[test]
        fn compare_is_reflexive(a in version_strategy()) {
            prop_assert_eq!(compare(&a, &a).unwrap(), Ordering::Equal);
        }

        #[test]
        fn compare_is_antisymmetric(a in version_strategy(), b in version_strategy()) {
            let ab = compare(&a, &b).unwrap();
            let ba = compare(&b, &a).unwrap();
            prop_assert_eq!(ab, ba.reverse());
        }

        #[test]
        fn compare_is_transitive(
            a in version_strategy(),
            b in version_strategy(),
            c in version_strategy(),
        ) {
            let mut sorted = [
                Version::parse(&a).unwrap(),
                Version::parse(&b).unwrap(),
                Version::parse(&c).unwrap(),
            ];
            sorted.sort();
            prop_assert!(sorted[0] <= sorted[1]);
            prop_assert!(sorted[1] <= sorted[2]);
            prop_assert!(sorted[0] <= sorted[2]);
        }

        #[test]
        fn display_round_trips(a in version_strategy()) {
            let version = Version::parse(&a).unwrap();
            prop_assert_eq!(version.to_string(), a);
        }
    }

    #[test]
    fn test_filename_examples() {
        let cases = [
            ("ca-certificates-20150402-1-any.pkg.tar.xz", "ca-certificates", "20150402-1", Arch::Any),
            ("pulseaudio-raop2-8.0-1-x86_64.pkg.tar.xz", "pulseaudio-raop2", "8.0-1", Arch::X86_64),
        ];
        for (filename, name, version, arch) in cases {
            let parsed = PackageFilename::parse(filename).unwrap();
            assert_eq!(parsed.name, name);
            assert_eq!(parsed.version, version);
            assert_eq!(parsed.arch, arch);
        }
        assert!(matches!(
            PackageFilename::parse("zlib-1.2.8-any.pkg.tar.xz"),
            Err(pacsmith_errors::PackageError::InvalidFilename { .. })
        ));
    }

    #[test]
    fn test_version_serde_as_string() {
        let version = Version::parse("1:2.0-3").unwrap();
        let json = serde_json::to_string(&version).unwrap();
        assert_eq!(json, r#""1:2.0-3""#);
        let back: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(back, version);
        assert!(serde_json::from_str::<Version>(r#""nope""#).is_err());
    }

    #[test]
    fn test_package_depends_names() {
        let package = Package {
            name: "a".into(),
            version: "1.0-1".into(),
            depends: vec!["glibc>=2.20".into(), "sh".into()],
            ..Package::default()
        };
        let names: Vec<&str> = package.depends_names().collect();
        assert_eq!(names, vec!["glibc", "sh"]);
        assert_eq!(package.parsed_version().unwrap().pkgrel(), "1");
    }

    #[test]
    fn test_repo_record_json() {
        let json = r#"{
            "owner": "o",
            "name": "r",
            "archs": ["x86_64", "i686"],
            "source_owner": "o",
            "source_name": "pkgbuilds",
            "source_branch": "master",
            "build_branch": "build"
        }"#;
        let record: RepoRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.key(), RepoKey::new("o", "r"));
        assert_eq!(record.archs, vec![Arch::X86_64, Arch::I686]);
        assert!(record.last_check.is_none());
        assert!(!record.private);
    }
}
