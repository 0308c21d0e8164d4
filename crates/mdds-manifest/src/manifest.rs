//! Package manifest (`meta_package.json5`) parsing and validation.
//!
//! A manifest declares plain dependencies under `depends` / `test_depends`
//! and meta-layer dependencies under the required `meta_dds` block. Each
//! entry is either a depends string (`name[@range]`) or a single-entry
//! `{name: "range"}` object. Parsing produces an immutable
//! [`PackageManifest`] or fails with the first problem encountered.

use crate::walk::{for_each, put_into, require_array, require_object, require_str, Mapping, WalkError};
use camino::{Utf8Path, Utf8PathBuf};
use mdds_core::types::{Dependency, DependencyError, MetaDependency, RangeError, VersionRange};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

/// Errors from walking a parsed manifest document
#[derive(Error, Debug)]
pub enum ParseError {
    #[error(transparent)]
    Schema(#[from] WalkError),

    #[error(transparent)]
    Dependency(#[from] DependencyError),

    #[error(transparent)]
    Range(#[from] RangeError),
}

/// Errors from loading a manifest from text or disk
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("{origin}: invalid manifest document: {message}")]
    Document { origin: String, message: String },

    #[error("{origin}: invalid package manifest: {source}")]
    Invalid {
        origin: String,
        #[source]
        source: ParseError,
    },

    #[error("Failed to read manifest {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A fully parsed `meta_package.json5` manifest.
///
/// Built in one parse call and never mutated afterward. Duplicate names
/// are kept as distinct entries; merging is the resolver's concern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageManifest {
    /// The dependencies declared with the `depends` field, if any.
    pub depends: Vec<Dependency>,
    /// The dependencies declared with the `test_depends` field, if any.
    pub test_depends: Vec<Dependency>,
    /// The dependencies declared with the `meta_dds.depends` field, if any.
    pub meta_depends: Vec<MetaDependency>,
    /// The dependencies declared with the `meta_dds.test_depends` field, if any.
    pub meta_test_depends: Vec<MetaDependency>,
}

const META_DDS_REQUIRED: &str = "Do you really need mdds? Consider using dds proper. If you do, \
     add an empty meta_dds: {} object to your meta_package.json5";

impl PackageManifest {
    /// Validate a parsed document and assemble the manifest.
    ///
    /// Unrecognized top-level keys are ignored; everything the schema does
    /// name is validated, and the first rejection aborts the whole parse.
    pub fn from_document(data: &Value) -> Result<Self, ParseError> {
        let mut manifest = PackageManifest::default();

        Mapping::new("Root of package manifest should be a JSON object")
            .if_key(
                "depends",
                dependency_array(&mut manifest.depends, "depends"),
            )
            .if_key(
                "test_depends",
                dependency_array(&mut manifest.test_depends, "test_depends"),
            )
            .required_key("meta_dds", META_DDS_REQUIRED, |value| {
                Mapping::new("`meta_dds' should be an object")
                    .if_key(
                        "depends",
                        meta_dependency_array(&mut manifest.meta_depends, "meta_dds.depends"),
                    )
                    .if_key(
                        "test_depends",
                        meta_dependency_array(
                            &mut manifest.meta_test_depends,
                            "meta_dds.test_depends",
                        ),
                    )
                    .walk(value)
            })
            .walk(data)?;

        Ok(manifest)
    }

    /// Parse manifest text, annotating any failure with `origin`.
    ///
    /// The text is relaxed JSON: comments, trailing commas and unquoted
    /// keys are all accepted by the underlying document parser.
    pub fn load_str(content: &str, origin: &str) -> Result<Self, ManifestError> {
        debug!(origin, "parsing package manifest");

        let data: Value = json5::from_str(content).map_err(|err| ManifestError::Document {
            origin: origin.to_string(),
            message: err.to_string(),
        })?;

        Self::from_document(&data).map_err(|source| ManifestError::Invalid {
            origin: origin.to_string(),
            source,
        })
    }

    /// Read and parse a manifest file, using the path as the origin label
    pub fn load_file(path: &Utf8Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::load_str(&content, path.as_str())
    }

    /// Serialize back to a document with canonical depends strings.
    ///
    /// Exact ranges render as `name@X.Y.Z`, the any-version range as the
    /// bare name, and everything else as `name@A..B`, so a reparse yields
    /// equal dependency sequences.
    pub fn to_document(&self) -> Value {
        json!({
            "depends": dep_strings(&self.depends),
            "test_depends": dep_strings(&self.test_depends),
            "meta_dds": {
                "depends": meta_dep_strings(&self.meta_depends),
                "test_depends": meta_dep_strings(&self.meta_test_depends),
            },
        })
    }
}

fn dep_strings(deps: &[Dependency]) -> Value {
    Value::Array(deps.iter().map(|dep| Value::String(dep.to_string())).collect())
}

fn meta_dep_strings(deps: &[MetaDependency]) -> Value {
    Value::Array(deps.iter().map(|dep| Value::String(dep.to_string())).collect())
}

fn str_to_dependency(value: &Value) -> Result<Dependency, ParseError> {
    let text = require_str::<ParseError>(value, "Dependency should be a string")?;
    Ok(Dependency::parse(text)?)
}

/// Convert a `{name: "range"}` object entry into a dependency.
///
/// The range string is mandatory in this form; a multi-entry object is
/// rejected rather than treated as several declarations.
fn object_entry(value: &Value) -> Result<Dependency, ParseError> {
    let entries = require_object::<ParseError>(value, "Dependency object entries should be objects")?;

    let mut iter = entries.iter();
    let (name, range_value) = match (iter.next(), iter.next()) {
        (Some(entry), None) => entry,
        _ => {
            return Err(WalkError::reject(
                "Dependency objects should contain exactly one `name: range' entry",
            )
            .into())
        }
    };

    let range_text = require_str::<ParseError>(range_value, "Dependency object values should be strings")?;
    let range = VersionRange::parse(range_text)?;
    Ok(Dependency::new(name.clone(), range))
}

fn dependency_array<'a>(
    sink: &'a mut Vec<Dependency>,
    key_name: &'static str,
) -> impl FnMut(&Value) -> Result<(), ParseError> + 'a {
    move |value| {
        let items = require_array::<ParseError>(
            value,
            &format!("`{}' should be an array of dependencies", key_name),
        )?;
        for_each(items, |item| {
            if item.is_string() {
                put_into(&mut *sink, str_to_dependency)(item)
            } else if item.is_object() {
                sink.push(object_entry(item)?);
                Ok(())
            } else {
                Err(WalkError::reject(format!(
                    "`{}' should be an array of strings or objects",
                    key_name
                ))
                .into())
            }
        })
    }
}

// Same shape as dependency_array, but entries land in the meta-layer
// sequence of the enclosing block.
fn meta_dependency_array<'a>(
    sink: &'a mut Vec<MetaDependency>,
    key_name: &'static str,
) -> impl FnMut(&Value) -> Result<(), ParseError> + 'a {
    move |value| {
        let items = require_array::<ParseError>(
            value,
            &format!("`{}' should be an array of dependencies", key_name),
        )?;
        for_each(items, |item| {
            if item.is_string() {
                put_into(&mut *sink, |value| {
                    str_to_dependency(value).map(MetaDependency::from)
                })(item)
            } else if item.is_object() {
                sink.push(MetaDependency::from(object_entry(item)?));
                Ok(())
            } else {
                Err(WalkError::reject(format!(
                    "`{}' should be an array of strings or objects",
                    key_name
                ))
                .into())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdds_core::types::Version;

    fn parse(text: &str) -> Result<PackageManifest, ManifestError> {
        PackageManifest::load_str(text, "<test>")
    }

    fn parse_ok(text: &str) -> PackageManifest {
        parse(text).unwrap()
    }

    fn invalid(err: ManifestError) -> ParseError {
        match err {
            ManifestError::Invalid { source, .. } => source,
            other => panic!("expected Invalid, got: {:?}", other),
        }
    }

    #[test]
    fn test_empty_meta_dds_parses() {
        let manifest = parse_ok(r#"{"meta_dds": {}}"#);
        assert!(manifest.depends.is_empty());
        assert!(manifest.test_depends.is_empty());
        assert!(manifest.meta_depends.is_empty());
        assert!(manifest.meta_test_depends.is_empty());
    }

    #[test]
    fn test_missing_meta_dds_fails() {
        let err = invalid(parse(r#"{"depends": ["foo"]}"#).unwrap_err());
        assert!(matches!(err, ParseError::Schema(_)));
        assert!(err.to_string().contains("meta_dds"));
    }

    #[test]
    fn test_root_must_be_object() {
        let err = invalid(parse("[1, 2, 3]").unwrap_err());
        assert!(err.to_string().contains("Root of package manifest"));
    }

    #[test]
    fn test_bare_name_accepts_any_version() {
        let manifest = parse_ok(r#"{"depends": ["foo"], "meta_dds": {}}"#);
        assert_eq!(manifest.depends.len(), 1);
        assert_eq!(manifest.depends[0].name, "foo");
        assert!(manifest.depends[0].range.is_any());
    }

    #[test]
    fn test_exact_depends_string() {
        let manifest = parse_ok(r#"{"depends": ["foo@1.2.3"], "meta_dds": {}}"#);
        assert_eq!(manifest.depends[0].range.low(), &Version::new(1, 2, 3));
        assert_eq!(manifest.depends[0].range.high(), &Version::new(1, 2, 3));
    }

    #[test]
    fn test_object_entry_interval() {
        let manifest = parse_ok(r#"{"depends": [{"foo": "1.0.0..2.0.0"}], "meta_dds": {}}"#);
        assert_eq!(manifest.depends[0].name, "foo");
        assert_eq!(manifest.depends[0].range.low(), &Version::new(1, 0, 0));
        assert_eq!(manifest.depends[0].range.high(), &Version::new(2, 0, 0));
    }

    #[test]
    fn test_object_entry_inverted_interval_rejected() {
        let err = invalid(parse(r#"{"depends": [{"foo": "2.0.0..1.0.0"}], "meta_dds": {}}"#).unwrap_err());
        assert!(matches!(
            err,
            ParseError::Range(RangeError::InvertedBounds { .. })
        ));
    }

    #[test]
    fn test_object_entry_caret() {
        let manifest = parse_ok(r#"{"depends": [{"foo": "^1.2.0"}], "meta_dds": {}}"#);
        assert_eq!(manifest.depends[0].range.low(), &Version::new(1, 2, 0));
        assert_eq!(manifest.depends[0].range.high(), &Version::new(2, 0, 0));
    }

    #[test]
    fn test_object_entry_value_must_be_string() {
        let err = invalid(parse(r#"{"depends": [{"foo": 1}], "meta_dds": {}}"#).unwrap_err());
        assert!(matches!(err, ParseError::Schema(_)));
        assert!(err.to_string().contains("should be strings"));
    }

    #[test]
    fn test_object_entry_single_key_only() {
        let err = invalid(
            parse(r#"{"depends": [{"foo": "1.0.0", "bar": "2.0.0"}], "meta_dds": {}}"#).unwrap_err(),
        );
        assert!(matches!(err, ParseError::Schema(_)));
        assert!(err.to_string().contains("exactly one"));
    }

    #[test]
    fn test_non_string_non_object_entry_rejected() {
        let err = invalid(parse(r#"{"depends": [42], "meta_dds": {}}"#).unwrap_err());
        assert!(matches!(err, ParseError::Schema(_)));
        assert!(err.to_string().contains("depends"));
    }

    #[test]
    fn test_depends_must_be_array() {
        let err = invalid(parse(r#"{"depends": "foo", "meta_dds": {}}"#).unwrap_err());
        assert!(err.to_string().contains("`depends' should be an array"));
    }

    #[test]
    fn test_meta_dds_must_be_object() {
        let err = invalid(parse(r#"{"meta_dds": "yes"}"#).unwrap_err());
        assert!(err.to_string().contains("`meta_dds' should be an object"));
    }

    #[test]
    fn test_bad_depends_string_rejected() {
        let err = invalid(parse(r#"{"depends": ["foo@bogus"], "meta_dds": {}}"#).unwrap_err());
        assert!(matches!(err, ParseError::Dependency(_)));
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_document_order_preserved() {
        let manifest = parse_ok(
            r#"{"depends": ["b", "a", {"c": "1.0.0"}, "a@2.0.0"], "meta_dds": {}}"#,
        );
        let names: Vec<&str> = manifest.depends.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c", "a"]);
    }

    #[test]
    fn test_duplicates_not_merged() {
        let manifest = parse_ok(r#"{"depends": ["foo@1.0.0", "foo@2.0.0"], "meta_dds": {}}"#);
        assert_eq!(manifest.depends.len(), 2);
    }

    #[test]
    fn test_test_depends() {
        let manifest = parse_ok(r#"{"test_depends": ["catch2@^2.13.0"], "meta_dds": {}}"#);
        assert!(manifest.depends.is_empty());
        assert_eq!(manifest.test_depends.len(), 1);
        assert_eq!(manifest.test_depends[0].name, "catch2");
    }

    #[test]
    fn test_meta_entries_route_to_meta_sequences() {
        let manifest = parse_ok(
            r#"{
                "depends": ["zlib@1.2.0"],
                "meta_dds": {
                    "depends": ["freetype@2.11.0", {"llvm": "^7.1.0"}],
                    "test_depends": ["gtest"]
                }
            }"#,
        );

        // Entries under meta_dds must never leak into the plain sequences.
        assert_eq!(manifest.depends.len(), 1);
        assert_eq!(manifest.depends[0].name, "zlib");
        assert!(manifest.test_depends.is_empty());

        assert_eq!(manifest.meta_depends.len(), 2);
        assert_eq!(manifest.meta_depends[0].dep.name, "freetype");
        assert_eq!(manifest.meta_depends[1].dep.name, "llvm");
        assert_eq!(
            manifest.meta_depends[1].dep.range.high(),
            &Version::new(8, 0, 0)
        );

        assert_eq!(manifest.meta_test_depends.len(), 1);
        assert_eq!(manifest.meta_test_depends[0].dep.name, "gtest");
    }

    #[test]
    fn test_meta_configuration_pairs_empty() {
        let manifest = parse_ok(r#"{"meta_dds": {"depends": [{"llvm": "^7.1.0"}]}}"#);
        assert!(manifest.meta_depends[0].configuration.is_empty());
    }

    #[test]
    fn test_unknown_top_level_keys_ignored() {
        let manifest = parse_ok(
            r#"{"name": "acme", "namespace": "acme", "version": "1.0.0", "meta_dds": {}}"#,
        );
        assert!(manifest.depends.is_empty());
    }

    #[test]
    fn test_relaxed_json_accepted() {
        let manifest = parse_ok(
            r#"{
                // mdds manifest with relaxed syntax
                depends: [
                    'foo@1.2.3',
                ],
                meta_dds: {},
            }"#,
        );
        assert_eq!(manifest.depends.len(), 1);
        assert_eq!(manifest.depends[0].name, "foo");
    }

    #[test]
    fn test_document_syntax_error_carries_origin() {
        let err = PackageManifest::load_str("{not valid", "pkg/meta_package.json5").unwrap_err();
        match &err {
            ManifestError::Document { origin, .. } => {
                assert_eq!(origin, "pkg/meta_package.json5");
            }
            other => panic!("expected Document, got: {:?}", other),
        }
        assert!(err.to_string().contains("pkg/meta_package.json5"));
    }

    #[test]
    fn test_invalid_manifest_error_carries_origin() {
        let err = PackageManifest::load_str("{}", "pkg/meta_package.json5").unwrap_err();
        assert!(err.to_string().contains("pkg/meta_package.json5"));
        assert!(err.to_string().contains("invalid package manifest"));
    }

    #[test]
    fn test_round_trip() {
        let manifest = parse_ok(
            r#"{
                "depends": ["foo", "bar@1.2.3", {"baz": "1.0.0..2.0.0"}, "qux@^0.3.1"],
                "test_depends": ["catch2@^2.13.0"],
                "meta_dds": {
                    "depends": ["freetype@2.11.0", {"llvm": "^7.1.0"}],
                    "test_depends": ["gtest"]
                }
            }"#,
        );

        let serialized = serde_json::to_string(&manifest.to_document()).unwrap();
        let reparsed = PackageManifest::load_str(&serialized, "<round-trip>").unwrap();
        assert_eq!(manifest, reparsed);
    }

    #[test]
    fn test_parallel_parsing_is_independent() {
        let text = r#"{
            "depends": ["foo@1.2.3", {"bar": "^0.4.0"}],
            "meta_dds": {"depends": ["baz"]}
        }"#;
        let expected = parse_ok(text);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                std::thread::spawn(move || {
                    PackageManifest::load_str(text, &format!("thread-{}", i)).unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }

    #[test]
    fn test_load_file() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta_package.json5");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"{{"depends": ["foo@1.2.3"], "meta_dds": {{}}}}"#).unwrap();

        let utf8_path = Utf8Path::from_path(&path).unwrap();
        let manifest = PackageManifest::load_file(utf8_path).unwrap();
        assert_eq!(manifest.depends[0].name, "foo");
    }

    #[test]
    fn test_load_file_missing() {
        let err = PackageManifest::load_file(Utf8Path::new("/no/such/meta_package.json5"))
            .unwrap_err();
        match &err {
            ManifestError::Io { path, .. } => {
                assert_eq!(path, "/no/such/meta_package.json5");
            }
            other => panic!("expected Io, got: {:?}", other),
        }
    }

    #[test]
    fn test_first_error_wins() {
        // Both `depends' and `meta_dds.depends' are malformed; traversal
        // order means the `depends' failure is the one reported.
        let err = invalid(
            parse(r#"{"depends": [42], "meta_dds": {"depends": [true]}}"#).unwrap_err(),
        );
        assert!(err.to_string().contains("`depends'"));
        assert!(!err.to_string().contains("meta_dds.depends"));
    }
}
