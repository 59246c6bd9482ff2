//! Source iteration integration tests.

use std::fs;

use dpservice::decoder::Format;
use dpservice::sources::Sources;
use dpservice::{Error, Scheme};
use tempfile::TempDir;

fn read_all(mut sources: Sources) -> Vec<(String, i64)> {
    let mut out = Vec::new();
    while let Some(source) = sources.next_source().unwrap() {
        let name = source.name().to_string();
        let doc: serde_json::Value = source.into_decoder().decode().unwrap().unwrap();
        out.push((name, doc["n"].as_i64().unwrap()));
    }
    out
}

#[test]
fn test_directory_yields_every_file() {
    let dir = TempDir::new().unwrap();
    for i in 0..4 {
        fs::write(dir.path().join(format!("obj{i}.yaml")), format!("n: {i}\n")).unwrap();
    }
    fs::create_dir(dir.path().join("nested")).unwrap();
    fs::write(dir.path().join("nested/ignored.yaml"), "n: 9\n").unwrap();

    let sources = Sources::new([dir.path().display().to_string()]);
    let mut read = read_all(sources);
    read.sort();

    assert_eq!(read.len(), 4);
    assert!(read.iter().all(|(_, n)| *n != 9));
    assert!(read[0].0.ends_with("obj0.yaml"));
}

#[test]
fn test_file_url_and_order() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.json");
    let b = dir.path().join("b.yaml");
    fs::write(&a, "{}").unwrap();
    fs::write(&b, "{}").unwrap();

    let mut sources = Sources::new([
        b.display().to_string(),
        format!("file://{}", a.display()),
    ]);

    let first = sources.next_source().unwrap().unwrap();
    assert_eq!(first.format(), Some(Format::Yaml));
    let second = sources.next_source().unwrap().unwrap();
    assert_eq!(second.extension(), Some("json"));
    assert_eq!(second.format(), Some(Format::Json));

    assert!(sources.next_source().unwrap().is_none());
    assert!(matches!(sources.next_source(), Err(Error::SourcesExhausted)));
}

#[test]
fn test_unsupported_scheme() {
    let mut sources = Sources::new(["https://example.com/objects.yaml"]);
    assert!(matches!(
        sources.next_source(),
        Err(Error::UnsupportedSource { .. })
    ));
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.yaml");
    let mut sources = Sources::new([missing.display().to_string()]);
    assert!(matches!(
        sources.next_source(),
        Err(Error::SourceIo { .. })
    ));
}

#[test]
fn test_objects_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("objects.yaml");
    fs::write(
        &path,
        "kind: Interface\nmetadata:\n  id: vm1\n---\nkind: VirtualIP\nmetadata:\n  interfaceId: vm1\nspec:\n  ip: 20.0.0.1\n",
    )
    .unwrap();

    let scheme = Scheme::with_defaults();
    let mut sources = Sources::new([path.display().to_string()]);
    let source = sources.next_source().unwrap().unwrap();
    let names: Vec<String> = source
        .objects(&scheme)
        .map(|o| o.unwrap().name())
        .collect();

    assert_eq!(names, ["interface/vm1", "virtualip/vm1"]);
}
