//! Manifest id allocation and media-type properties.

use std::fs;
use std::path::Path;

use epub_replenish::{Error, register_images};
use tempfile::TempDir;

const OPF: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="uuid_id">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Weekly Digest</dc:title>
  </metadata>
  <manifest>
    <item id="id3" href="index.html" media-type="application/xhtml+xml"/>
    <item id="id7" href="stylesheet.css" media-type="text/css"/>
    <item id="idX" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
  </manifest>
  <spine toc="idX">
    <itemref idref="id3"/>
  </spine>
</package>"#;

fn setup(opf: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("content.opf"), opf).unwrap();
    dir
}

fn read_opf(dir: &Path) -> String {
    fs::read_to_string(dir.join("content.opf")).unwrap()
}

#[test]
fn allocates_strictly_increasing_ids_above_existing_max() {
    let dir = setup(OPF);
    let saved = vec![
        dir.path().join("images/a.png"),
        dir.path().join("images/b.jpg"),
    ];
    register_images(dir.path(), &saved).unwrap();

    let opf = read_opf(dir.path());
    // max over {id3, id7} is 7; idX has no numeric suffix and is ignored
    assert!(opf.contains(r#"id="id8""#));
    assert!(opf.contains(r#"id="id9""#));
    assert!(opf.contains(r#"href="images/a.png""#));
    assert!(opf.contains(r#"href="images/b.jpg""#));
    assert!(opf.contains(r#"media-type="image/png""#));
    assert!(opf.contains(r#"media-type="image/jpeg""#));
    assert_eq!(opf.matches("<item ").count(), 5);
}

#[test]
fn existing_items_survive_untouched() {
    let dir = setup(OPF);
    let saved = vec![dir.path().join("images/a.png")];
    register_images(dir.path(), &saved).unwrap();

    let opf = read_opf(dir.path());
    assert!(opf.contains(r#"id="id3""#));
    assert!(opf.contains(r#"id="id7""#));
    assert!(opf.contains(r#"id="idX""#));
    assert!(opf.contains(r#"href="index.html""#));
    assert!(opf.contains("<dc:title>Weekly Digest</dc:title>"));
    assert!(opf.contains(r#"<itemref idref="id3""#));
}

#[test]
fn empty_id_pool_starts_at_one() {
    let opf = r#"<?xml version="1.0"?>
<package>
  <manifest>
    <item id="cover" href="cover.html" media-type="application/xhtml+xml"/>
  </manifest>
</package>"#;
    let dir = setup(opf);
    let saved = vec![dir.path().join("images/a.png")];
    register_images(dir.path(), &saved).unwrap();

    assert!(read_opf(dir.path()).contains(r#"id="id1""#));
}

#[test]
fn unsupported_extension_is_fatal() {
    let dir = setup(OPF);
    let saved = vec![dir.path().join("images/anim.gif")];
    let err = register_images(dir.path(), &saved).unwrap_err();
    assert!(matches!(err, Error::UnsupportedMediaType(_)));
}

#[test]
fn missing_manifest_document_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = register_images(dir.path(), &[]).unwrap_err();
    assert!(matches!(err, Error::InvalidEpub(_)));
}

#[test]
fn document_without_manifest_is_rejected() {
    let dir = setup(r#"<?xml version="1.0"?><package><metadata/></package>"#);
    let saved = vec![dir.path().join("images/a.png")];
    let err = register_images(dir.path(), &saved).unwrap_err();
    assert!(matches!(err, Error::InvalidEpub(_)));
}

#[test]
fn no_images_means_no_new_items() {
    let dir = setup(OPF);
    register_images(dir.path(), &[]).unwrap();
    assert_eq!(read_opf(dir.path()).matches("<item ").count(), 3);
}
