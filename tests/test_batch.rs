use cookdown::{find_recipe_files, run_batch, BatchOptions, ParserRegistry};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::{json, Value};
use std::fs::{self, File};
use std::io::Write;
use std::sync::Arc;
use tempfile::tempdir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

fn gzip(data: &Value) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(serde_json::to_string(data).unwrap().as_bytes())
        .unwrap();
    encoder.finish().unwrap()
}

#[test]
fn test_directory_batch_with_archive_fan_out() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input");
    let output = dir.path().join("output");
    fs::create_dir(&input).unwrap();

    fs::write(
        input.join("pancakes.crumb"),
        json!({"name": "Pancakes", "steps": [{"order": 0, "step": "Flip"}]}).to_string(),
    )
    .unwrap();
    fs::write(input.join("broken.crumb"), "{").unwrap();
    fs::write(input.join("readme.md"), "# not a recipe").unwrap();

    let mut zip = ZipWriter::new(File::create(input.join("export.paprikarecipes")).unwrap());
    for name in ["Soup", "Stew"] {
        zip.start_file(format!("{name}.paprikarecipe"), SimpleFileOptions::default())
            .unwrap();
        zip.write_all(&gzip(&json!({"name": name}))).unwrap();
    }
    zip.finish().unwrap();

    let registry = ParserRegistry::with_defaults();
    let files = find_recipe_files(&input, false, &registry);
    assert_eq!(files.len(), 3);

    let report = run_batch(
        files,
        &BatchOptions::new(&output).workers(2),
        Arc::new(registry),
    )
    .unwrap();

    assert_eq!(report.total(), 4);
    assert_eq!(report.converted.len(), 3);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, input.join("broken.crumb"));

    for name in ["Pancakes", "Soup", "Stew"] {
        assert!(output.join(format!("{name}.md")).is_file(), "{name} missing");
    }
    assert!(report
        .converted
        .iter()
        .any(|(source, _)| source == &input.join("export.paprikarecipes").join("Soup.paprikarecipe")));
}

#[test]
fn test_recursive_discovery() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    fs::create_dir_all(&nested).unwrap();
    fs::write(nested.join("deep.crumb"), "{}").unwrap();
    fs::write(dir.path().join("top.CRUMB"), "{}").unwrap();

    let registry = ParserRegistry::with_defaults();
    assert_eq!(find_recipe_files(dir.path(), false, &registry).len(), 1);
    assert_eq!(find_recipe_files(dir.path(), true, &registry).len(), 2);
}

#[test]
fn test_corrupt_archive_member_does_not_drop_siblings() {
    let dir = tempdir().unwrap();
    let archive = dir.path().join("export.paprikarecipes");
    let output = dir.path().join("out");

    let mut zip = ZipWriter::new(File::create(&archive).unwrap());
    zip.start_file("Good.paprikarecipe", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(&gzip(&json!({"name": "Good"}))).unwrap();
    zip.start_file("Bad.paprikarecipe", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(b"not gzip").unwrap();
    zip.finish().unwrap();

    let report = run_batch(
        vec![archive.clone()],
        &BatchOptions::new(&output),
        Arc::new(ParserRegistry::with_defaults()),
    )
    .unwrap();

    assert_eq!(
        report.converted,
        vec![(archive.join("Good.paprikarecipe"), output.join("Good.md"))]
    );
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, archive.join("Bad.paprikarecipe"));
    assert!(output.join("Good.md").is_file());
}
