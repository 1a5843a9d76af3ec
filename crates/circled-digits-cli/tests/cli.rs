//! Black-box tests for the batch binary.

use std::path::Path;

use assert_cmd::Command;
use image::{ImageBuffer, Luma};
use predicates::prelude::*;

const BACKDROP: u8 = 128;

fn write_png(path: &Path, width: u32, height: u32, f: impl Fn(u32, u32) -> u8) {
    let img: ImageBuffer<Luma<u8>, Vec<u8>> =
        ImageBuffer::from_fn(width, height, |x, y| Luma([f(x, y)]));
    img.save(path).unwrap();
}

/// 80x60 artwork: a grid of dark blobs on a constant backdrop, inset past
/// every filter kernel radius.
fn artwork_pixel(x: u32, y: u32) -> u8 {
    for gy in 0..4i32 {
        for gx in 0..6i32 {
            let dx = x as i32 - (19 + gx * 8);
            let dy = y as i32 - (19 + gy * 8);
            if dx * dx + dy * dy <= 9 {
                return 40;
            }
        }
    }
    BACKDROP
}

/// 240x180 cover photo: artwork pasted at (60, 50), a dark 8x8 glyph in the
/// annotation region 55 px below the artwork center.
fn photo_pixel(x: u32, y: u32) -> u8 {
    if (60..140).contains(&x) && (50..110).contains(&y) {
        return artwork_pixel(x - 60, y - 50);
    }
    if (96..104).contains(&x) && (131..139).contains(&y) {
        return 25;
    }
    BACKDROP
}

fn square_template_pixel(x: u32, y: u32) -> u8 {
    if (3..11).contains(&x) && (3..11).contains(&y) {
        255
    } else {
        0
    }
}

fn bar_template_pixel(_x: u32, y: u32) -> u8 {
    if y == 6 || y == 7 {
        255
    } else {
        0
    }
}

struct Fixture {
    root: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let covers = root.path().join("covers");
        let templates = root.path().join("templates");
        std::fs::create_dir(&covers).unwrap();
        std::fs::create_dir(&templates).unwrap();

        write_png(&root.path().join("title.png"), 80, 60, artwork_pixel);
        write_png(&covers.join("cover01.png"), 240, 180, photo_pixel);
        write_png(&templates.join("42.png"), 14, 14, square_template_pixel);
        write_png(&templates.join("13.png"), 14, 14, bar_template_pixel);

        Self { root }
    }

    fn arg(&self, name: &str) -> String {
        self.root.path().join(name).display().to_string()
    }
}

fn bin() -> Command {
    Command::cargo_bin("circled-digits").unwrap()
}

#[test]
fn batch_run_writes_crop_and_results() {
    let fx = Fixture::new();
    bin()
        .args(["--title-img", &fx.arg("title.png")])
        .args(["--img-dir", &fx.arg("covers")])
        .args(["--output-dir", &fx.arg("out")])
        .args(["--templates-dir", &fx.arg("templates")])
        .args(["--method", "edgeTemplate"])
        .assert()
        .success();

    let out = fx.root.path().join("out");
    assert!(out.join("cover01_circledDigits.png").is_file());

    let json = std::fs::read_to_string(out.join("results.json")).unwrap();
    let records: serde_json::Value = serde_json::from_str(&json).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 1);

    let record = &records[0];
    assert!(record["sourceFilename"]
        .as_str()
        .unwrap()
        .ends_with("cover01.png"));
    assert_eq!(record["ocrResult"]["evaluatedDigits"], "42");
    let scores = record["ocrResult"]["digits2MatchResMap"].as_object().unwrap();
    assert_eq!(scores.len(), 2);
    assert!(scores["42"].as_f64().unwrap() > scores["13"].as_f64().unwrap());
}

#[test]
fn unknown_method_fails_before_reading_any_image() {
    let fx = Fixture::new();
    bin()
        .args(["--title-img", &fx.arg("missing.png")]) // never opened
        .args(["--img-dir", &fx.arg("covers")])
        .args(["--output-dir", &fx.arg("out")])
        .args(["--templates-dir", &fx.arg("templates")])
        .args(["--method", "hough"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "unsupported extraction method 'hough'",
        ));
}

#[test]
fn missing_reference_fails_the_run() {
    let fx = Fixture::new();
    bin()
        .args(["--img-dir", &fx.arg("covers")])
        .args(["--output-dir", &fx.arg("out")])
        .args(["--templates-dir", &fx.arg("templates")])
        .args(["--method", "edgeTemplate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot load or read image"));
    assert!(!fx.root.path().join("out").exists());
}

#[test]
fn empty_template_directory_fails_the_run() {
    let fx = Fixture::new();
    let empty = fx.root.path().join("empty");
    std::fs::create_dir(&empty).unwrap();
    bin()
        .args(["--title-img", &fx.arg("title.png")])
        .args(["--img-dir", &fx.arg("covers")])
        .args(["--output-dir", &fx.arg("out")])
        .args(["--templates-dir", &empty.display().to_string()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no digit templates loaded"));
}

#[test]
fn unreadable_photo_is_skipped_not_fatal() {
    let fx = Fixture::new();
    let covers = fx.root.path().join("covers");
    std::fs::write(covers.join("broken.png"), b"not a png").unwrap();

    bin()
        .args(["--title-img", &fx.arg("title.png")])
        .args(["--img-dir", &fx.arg("covers")])
        .args(["--output-dir", &fx.arg("out")])
        .args(["--templates-dir", &fx.arg("templates")])
        .args(["--method", "edgeTemplate"])
        .assert()
        .success()
        .stderr(predicate::str::contains("skipping"));

    let json =
        std::fs::read_to_string(fx.root.path().join("out").join("results.json")).unwrap();
    let records: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(records.as_array().unwrap().len(), 1);
}
