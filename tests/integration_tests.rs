use desksort::cli::{Cli, CliError, run};
/// Integration tests for desksort
///
/// These tests run complete sorts on temporary directory trees and check the
/// resulting layout on disk.
///
/// Test categories:
/// 1. Basic sorting workflows
/// 2. Classification and normalization
/// 3. Recursion and pruning
/// 4. Archive expansion
/// 5. Idempotence and restricted folders
/// 6. Configuration, reporting and errors
use desksort::file_category::Category;
use desksort::file_organizer::{FileOperation, OrganizeError};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary root to sort plus a separate directory for config and report
/// files, so they never end up inside the tree being sorted.
struct TestFixture {
    root: TempDir,
    aux: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        let fixture = TestFixture {
            root: TempDir::new().expect("Failed to create temp directory"),
            aux: TempDir::new().expect("Failed to create aux directory"),
        };
        fixture.write_config("");
        fixture
    }

    fn path(&self) -> &Path {
        self.root.path()
    }

    fn config_path(&self) -> PathBuf {
        self.aux.path().join("config.toml")
    }

    fn write_config(&self, content: &str) {
        fs::write(self.config_path(), content).expect("Failed to write config");
    }

    /// A quiet CLI invocation on the fixture root with the fixture config.
    fn cli(&self) -> Cli {
        Cli {
            root: self.path().to_path_buf(),
            config: Some(self.config_path()),
            report: None,
            quiet: true,
            verbose: 0,
        }
    }

    fn sort(&self) -> desksort::SortReport {
        run(&self.cli()).expect("sort should succeed")
    }

    /// Create a file, creating parent directories as needed.
    fn create_file(&self, rel_path: &str, content: &[u8]) {
        let file_path = self.path().join(rel_path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        let mut file = File::create(&file_path).expect("Failed to create file");
        file.write_all(content)
            .expect("Failed to write file content");
    }

    fn create_text_file(&self, rel_path: &str, content: &str) {
        self.create_file(rel_path, content.as_bytes());
    }

    fn create_zip(&self, rel_path: &str, entries: &[(&str, &str)]) {
        let path = self.path().join(rel_path);
        let mut writer = zip::ZipWriter::new(File::create(path).expect("Failed to create zip"));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, content) in entries {
            writer.start_file(*name, options).expect("Failed to start entry");
            writer
                .write_all(content.as_bytes())
                .expect("Failed to write entry");
        }
        writer.finish().expect("Failed to finish zip");
    }

    fn create_tar_gz(&self, rel_path: &str, entries: &[(&str, &str)]) {
        let path = self.path().join(rel_path);
        let encoder = GzEncoder::new(
            File::create(path).expect("Failed to create tar.gz"),
            Compression::default(),
        );
        let mut builder = tar::Builder::new(encoder);
        for (name, content) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, name, content.as_bytes())
                .expect("Failed to append entry");
        }
        builder
            .into_inner()
            .expect("Failed to finish tar")
            .finish()
            .expect("Failed to finish gzip");
    }

    fn assert_dir_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_dir(), "Directory should exist: {}", path.display());
    }

    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_file(), "File should exist: {}", path.display());
    }

    fn assert_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "Path should not exist: {}", path.display());
    }

    /// Every file and directory under the root, relative and sorted.
    fn snapshot(&self) -> Vec<PathBuf> {
        let mut entries = Vec::new();
        Self::walk_dir(self.path(), self.path(), &mut entries);
        entries.sort();
        entries
    }

    fn walk_dir(root: &Path, dir: &Path, entries: &mut Vec<PathBuf>) {
        if let Ok(read_dir) = fs::read_dir(dir) {
            for entry in read_dir.flatten() {
                let path = entry.path();
                entries.push(path.strip_prefix(root).unwrap().to_path_buf());
                if path.is_dir() {
                    Self::walk_dir(root, &path, entries);
                }
            }
        }
    }
}

// ============================================================================
// Test Suite 1: Basic Sorting
// ============================================================================

#[test]
fn test_sort_empty_directory_leaves_it_empty() {
    let fixture = TestFixture::new();

    let report = fixture.sort();

    assert_eq!(report.total_placed(), 0);
    // All six category folders are created and then pruned again.
    assert_eq!(report.pruned_dirs.len(), 6);
    assert!(fixture.snapshot().is_empty());
}

#[test]
fn test_sort_single_image() {
    let fixture = TestFixture::new();
    fixture.create_text_file("photo.png", "png");

    fixture.sort();

    fixture.assert_file_exists("images/photo.png");
    fixture.assert_not_exists("photo.png");
    fixture.assert_not_exists("video");
}

#[test]
fn test_sort_mixed_files() {
    let fixture = TestFixture::new();
    fixture.create_text_file("holiday.jpeg", "jpeg");
    fixture.create_text_file("film.mov", "mov");
    fixture.create_text_file("notes.txt", "txt");
    fixture.create_text_file("voice.amr", "amr");
    fixture.create_text_file("setup.exe", "exe");

    let report = fixture.sort();

    fixture.assert_file_exists("images/holiday.jpeg");
    fixture.assert_file_exists("video/film.mov");
    fixture.assert_file_exists("documents/notes.txt");
    fixture.assert_file_exists("audio/voice.amr");
    fixture.assert_file_exists("other/setup.exe");
    assert_eq!(report.total_placed(), 5);
}

// ============================================================================
// Test Suite 2: Classification and Normalization
// ============================================================================

#[test]
fn test_every_registered_extension_is_classified() {
    let fixture = TestFixture::new();
    let table: &[(&str, &[&str])] = &[
        ("images", &["JPEG", "png", "Jpg", "svg"]),
        ("video", &["avi", "MP4", "mov", "mkv"]),
        (
            "documents",
            &["doc", "DOCX", "txt", "pdf", "xlsx", "pptx", "csv", "xml", "Json"],
        ),
        ("audio", &["mp3", "OGG", "wav", "amr"]),
    ];

    for (_, extensions) in table {
        for ext in *extensions {
            fixture.create_text_file(&format!("file_{}.{}", ext.to_lowercase(), ext), "x");
        }
    }

    fixture.sort();

    for (folder, extensions) in table {
        for ext in *extensions {
            fixture.assert_file_exists(&format!("{}/file_{}.{}", folder, ext.to_lowercase(), ext));
        }
    }
}

#[test]
fn test_unknown_and_missing_extensions_go_to_other() {
    let fixture = TestFixture::new();
    fixture.create_text_file("tool.bin", "bin");
    fixture.create_text_file("LICENSE", "mit");
    fixture.create_text_file("page.HTML", "html");

    let report = fixture.sort();

    fixture.assert_file_exists("other/tool.bin");
    fixture.assert_file_exists("other/LICENSE");
    fixture.assert_file_exists("other/page.HTML");
    let unknown: Vec<_> = report.unknown_extensions.iter().cloned().collect();
    assert_eq!(unknown, vec!["BIN", "HTML"]);
}

#[test]
fn test_cyrillic_names_are_transliterated_with_extension_kept() {
    let fixture = TestFixture::new();
    fixture.create_text_file("Привіт.TXT", "hello");
    fixture.create_text_file("пісня 1.mp3", "mp3");

    let report = fixture.sort();

    fixture.assert_file_exists("documents/Privit.TXT");
    fixture.assert_file_exists("audio/pisnya__.mp3");
    fixture.assert_not_exists("Привіт.TXT");
    assert_eq!(report.renamed.len(), 2);
}

#[test]
fn test_digits_and_symbols_are_replaced() {
    let fixture = TestFixture::new();
    fixture.create_text_file("Scan (2024) #3.pdf", "pdf");

    fixture.sort();

    fixture.assert_file_exists("documents/Scan__________.pdf");
}

#[test]
fn test_multi_dot_name_is_classified_by_last_extension() {
    let fixture = TestFixture::new();
    fixture.create_text_file("my.photo.jpg", "jpg");
    fixture.create_text_file("v1.2 final.docx", "docx");

    fixture.sort();

    fixture.assert_file_exists("images/my.photo.jpg");
    fixture.assert_file_exists("documents/v_._final.docx");
}

#[test]
fn test_known_and_unknown_extensions_are_reported() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.png", "x");
    fixture.create_text_file("b.PNG", "x");
    fixture.create_text_file("c.psd", "x");

    let report = fixture.sort();

    assert_eq!(
        report.known_extensions.iter().collect::<Vec<_>>(),
        vec!["PNG"]
    );
    assert_eq!(
        report.unknown_extensions.iter().collect::<Vec<_>>(),
        vec!["PSD"]
    );
    assert_eq!(report.files_in(Category::Images).len(), 2);
    assert_eq!(report.files_in(Category::Other).len(), 1);
}

// ============================================================================
// Test Suite 3: Recursion and Pruning
// ============================================================================

#[test]
fn test_deeply_nested_file_is_found_and_dirs_pruned() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a/b/c/d/e/deep.txt", "deep");

    let report = fixture.sort();

    fixture.assert_file_exists("documents/deep.txt");
    for dir in ["a", "a/b", "a/b/c", "a/b/c/d", "a/b/c/d/e"] {
        fixture.assert_not_exists(dir);
        assert!(report.pruned_dirs.contains(&report.root.join(dir)));
    }
}

#[test]
fn test_directory_with_category_name_below_root_is_sorted() {
    let fixture = TestFixture::new();
    fixture.create_text_file("projects/images/logo.svg", "svg");
    fixture.create_text_file("projects/readme.txt", "readme");

    fixture.sort();

    fixture.assert_file_exists("images/logo.svg");
    fixture.assert_file_exists("documents/readme.txt");
    fixture.assert_not_exists("projects");
}

// ============================================================================
// Test Suite 4: Archive Expansion
// ============================================================================

#[test]
fn test_zip_with_cyrillic_name_is_expanded() {
    let fixture = TestFixture::new();
    fixture.create_zip("Фото.zip", &[("a.jpg", "jpeg")]);

    let report = fixture.sort();

    fixture.assert_file_exists("archives/Foto/a.jpg");
    fixture.assert_not_exists("Фото.zip");
    assert_eq!(
        report.files_in(Category::Archives),
        &[report.root.join("archives").join("Foto").join("a.jpg")]
    );
    assert!(report.known_extensions.contains("ZIP"));
}

#[test]
fn test_broken_zip_is_deleted() {
    let fixture = TestFixture::new();
    fixture.create_text_file("bad.zip", "definitely not a zip");

    let report = fixture.sort();

    fixture.assert_not_exists("bad.zip");
    fixture.assert_not_exists("archives/bad");
    assert_eq!(report.discarded_archives.len(), 1);
}

#[test]
fn test_broken_archive_does_not_stop_siblings() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a_broken.tar.gz", "garbage");
    fixture.create_text_file("z_song.mp3", "mp3");

    fixture.sort();

    fixture.assert_not_exists("a_broken.tar.gz");
    fixture.assert_file_exists("audio/z_song.mp3");
}

#[test]
fn test_nested_tar_gz_is_expanded() {
    let fixture = TestFixture::new();
    fs::create_dir_all(fixture.path().join("downloads")).unwrap();
    fixture.create_tar_gz("downloads/site.tar.gz", &[("index.html", "<p>hi</p>")]);

    fixture.sort();

    fixture.assert_file_exists("archives/site/index.html");
    fixture.assert_not_exists("downloads");
}

#[test]
fn test_extracted_contents_are_not_resorted() {
    let fixture = TestFixture::new();
    fixture.create_zip("bundle.zip", &[("Setup 1.exe", "exe"), ("pic.png", "png")]);

    fixture.sort();

    fixture.assert_file_exists("archives/bundle/Setup 1.exe");
    fixture.assert_file_exists("archives/bundle/pic.png");
    fixture.assert_not_exists("images/pic.png");
}

#[test]
fn test_broken_tar_is_deleted() {
    let fixture = TestFixture::new();
    fixture.create_text_file("old.tar", &"not a tar header ".repeat(64));

    let report = fixture.sort();

    fixture.assert_not_exists("old.tar");
    fixture.assert_not_exists("archives/old");
    assert_eq!(report.discarded_archives.len(), 1);
}

#[test]
fn test_archives_with_same_folder_name_collide() {
    let fixture = TestFixture::new();
    fixture.create_zip("pack1.zip", &[("notes.txt", "from pack1")]);
    fixture.create_zip("pack2.zip", &[("notes.txt", "from pack2")]);

    let result = run(&fixture.cli());

    match result {
        Err(CliError::Organize(OrganizeError::NameCollision { operation, .. })) => {
            assert_eq!(operation, FileOperation::Move);
        }
        other => panic!("expected a name collision, got {other:?}"),
    }
    assert_eq!(
        fs::read_to_string(fixture.path().join("archives/pack_/notes.txt")).unwrap(),
        "from pack1"
    );
    fixture.assert_not_exists("pack1.zip");
    fixture.assert_file_exists("pack2.zip");
}

#[test]
fn test_dot_only_archive_name_is_unpacked_inside_archives() {
    let fixture = TestFixture::new();
    fixture.create_zip("...zip", &[("escaped.txt", "x")]);

    fixture.sort();

    fixture.assert_file_exists("archives/_/escaped.txt");
    fixture.assert_not_exists("escaped.txt");
    fixture.assert_not_exists("...zip");
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_name_is_sorted() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let fixture = TestFixture::new();
    let raw_name = OsStr::from_bytes(b"caf\xe9.txt");
    fs::write(fixture.path().join(raw_name), "latin-1").expect("Failed to create file");

    let report = fixture.sort();

    fixture.assert_file_exists("documents/caf\u{FFFD}.txt");
    assert!(!fixture.path().join(raw_name).exists());
    assert_eq!(report.renamed.len(), 1);
}

// ============================================================================
// Test Suite 5: Idempotence and Restricted Folders
// ============================================================================

#[test]
fn test_second_run_changes_nothing() {
    let fixture = TestFixture::new();
    fixture.create_text_file("Звіт 2023.docx", "docx");
    fixture.create_text_file("inbox/cat.PNG", "png");
    fixture.create_text_file("inbox/misc/data", "raw");
    fixture.create_zip("pack.zip", &[("inner.txt", "inner")]);

    fixture.sort();
    let after_first = fixture.snapshot();

    let second = fixture.sort();
    let after_second = fixture.snapshot();

    assert_eq!(after_first, after_second);
    assert_eq!(second.total_placed(), 0);
    assert!(second.renamed.is_empty());
}

#[test]
fn test_files_inside_category_folders_are_untouched() {
    let fixture = TestFixture::new();
    fixture.create_text_file("images/Not Normalized 1.png", "png");
    fixture.create_text_file("documents/song.mp3", "mp3");
    fixture.create_text_file("archives/old.zip", "not even a zip");
    fixture.create_text_file("other/photo.jpg", "jpg");

    let report = fixture.sort();

    fixture.assert_file_exists("images/Not Normalized 1.png");
    fixture.assert_file_exists("documents/song.mp3");
    fixture.assert_file_exists("archives/old.zip");
    fixture.assert_file_exists("other/photo.jpg");
    assert_eq!(report.total_placed(), 0);
    assert!(report.discarded_archives.is_empty());
}

// ============================================================================
// Test Suite 6: Configuration, Reporting and Errors
// ============================================================================

#[test]
fn test_config_adds_extensions() {
    let fixture = TestFixture::new();
    fixture.write_config("[categories]\nimages = [\"gif\"]\naudio = [\"FLAC\"]\n");
    fixture.create_text_file("anim.GIF", "gif");
    fixture.create_text_file("track.flac", "flac");

    fixture.sort();

    fixture.assert_file_exists("images/anim.GIF");
    fixture.assert_file_exists("audio/track.flac");
}

#[test]
fn test_excluded_files_stay_in_place() {
    let fixture = TestFixture::new();
    fixture.write_config(
        "[filters]\nskip_hidden = true\n\n[filters.exclude]\nfilenames = [\"desktop.ini\"]\n",
    );
    fixture.create_text_file("keep/desktop.ini", "[shell]");
    fixture.create_text_file(".secret", "x");
    fixture.create_text_file("doc.txt", "x");

    fixture.sort();

    fixture.assert_file_exists("keep/desktop.ini");
    fixture.assert_file_exists(".secret");
    fixture.assert_file_exists("documents/doc.txt");
    fixture.assert_dir_exists("keep");
}

#[test]
fn test_invalid_config_is_an_error() {
    let fixture = TestFixture::new();
    fixture.write_config("[categories]\nimages = [\"a.b\"]\n");
    fixture.create_text_file("photo.png", "png");

    let result = run(&fixture.cli());

    assert!(matches!(result, Err(CliError::Config(_))));
    fixture.assert_file_exists("photo.png");
}

#[test]
fn test_report_is_written_as_json() {
    let fixture = TestFixture::new();
    fixture.create_text_file("photo.png", "png");
    fixture.create_text_file("blob.xyz", "xyz");
    let report_path = fixture.aux.path().join("report.json");

    let mut cli = fixture.cli();
    cli.report = Some(report_path.clone());
    run(&cli).expect("sort should succeed");

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(json["placed"]["images"].as_array().unwrap().len(), 1);
    assert_eq!(json["known_extensions"][0], "PNG");
    assert_eq!(json["unknown_extensions"][0], "XYZ");
}

#[test]
fn test_report_inside_root_is_not_sorted() {
    let fixture = TestFixture::new();
    fixture.create_text_file("photo.png", "png");
    fixture.create_text_file("sort-report.json", "{}");

    let mut cli = fixture.cli();
    cli.report = Some(fixture.path().join("sort-report.json"));
    run(&cli).expect("sort should succeed");

    fixture.assert_file_exists("sort-report.json");
    fixture.assert_not_exists("documents/sort-report.json");
}

#[test]
fn test_name_collision_aborts_without_overwriting() {
    let fixture = TestFixture::new();
    fixture.create_text_file("x/a b.txt", "first");
    fixture.create_text_file("y/a_b.txt", "second");

    let result = run(&fixture.cli());

    match result {
        Err(CliError::Organize(OrganizeError::NameCollision { operation, .. })) => {
            assert_eq!(operation, FileOperation::Move);
        }
        other => panic!("expected a name collision, got {other:?}"),
    }
    assert_eq!(
        fs::read_to_string(fixture.path().join("documents/a_b.txt")).unwrap(),
        "first"
    );
    fixture.assert_file_exists("y/a_b.txt");
}

#[test]
fn test_missing_root_is_an_error() {
    let fixture = TestFixture::new();
    let mut cli = fixture.cli();
    cli.root = fixture.path().join("does-not-exist");

    let result = run(&cli);

    assert!(matches!(
        result,
        Err(CliError::Organize(OrganizeError::InvalidRoot { .. }))
    ));
}

#[test]
fn test_binary_exit_status() {
    let fixture = TestFixture::new();
    fixture.create_text_file("photo.png", "png");

    let ok = Command::new(env!("CARGO_BIN_EXE_desksort"))
        .arg(fixture.path())
        .arg("--config")
        .arg(fixture.config_path())
        .arg("--quiet")
        .output()
        .expect("Failed to run binary");
    assert!(ok.status.success());
    fixture.assert_file_exists("images/photo.png");

    let failed = Command::new(env!("CARGO_BIN_EXE_desksort"))
        .arg(fixture.path().join("missing"))
        .arg("--config")
        .arg(fixture.config_path())
        .arg("--quiet")
        .output()
        .expect("Failed to run binary");
    assert!(!failed.status.success());
    assert!(String::from_utf8_lossy(&failed.stderr).contains("missing"));
}
