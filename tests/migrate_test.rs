use std::fs;

use anyhow::Result;
use mcpp_migrate::config::Config;
use mcpp_migrate::migrate::{self, MigrationOptions};
use tempfile::tempdir;

fn options(src: &std::path::Path, dest: &std::path::Path) -> MigrationOptions {
    MigrationOptions {
        src_dir: src.to_path_buf(),
        dest_dir: dest.to_path_buf(),
        managed_types_file: None,
        config: Config::default(),
    }
}

#[test]
fn test_run_converts_into_destination() -> Result<()> {
    let src = tempdir()?;
    let dest = tempdir()?;
    fs::write(src.path().join("a.cpp"), "Shape* s = new Shape();\n")?;
    fs::write(src.path().join("b.h"), "public __gc class Shape\n{\n};\n")?;
    fs::write(src.path().join("readme.txt"), "Shape* s;\n")?;

    let report = migrate::run(&options(src.path(), dest.path()))?;

    assert!(report.is_success());
    assert_eq!(report.converted.len(), 2);
    assert!(report.backups.is_empty());
    assert!(report.managed_types.contains(&"Shape".to_string()));
    assert_eq!(
        fs::read_to_string(dest.path().join("a.cpp"))?,
        "Shape ^ s = gcnew Shape();\n"
    );
    assert_eq!(
        fs::read_to_string(dest.path().join("b.h"))?,
        "public ref class Shape\n{\n};\n"
    );
    assert!(!dest.path().join("readme.txt").exists());
    Ok(())
}

#[test]
fn test_in_place_run_keeps_backups() -> Result<()> {
    let src = tempdir()?;
    fs::write(src.path().join("a.h"), "__gc class Shape;\n")?;

    let report = migrate::run(&options(src.path(), src.path()))?;

    assert_eq!(report.backups, vec![src.path().join("a.h.bak")]);
    assert_eq!(fs::read_to_string(src.path().join("a.h.bak"))?, "__gc class Shape;\n");
    assert_eq!(fs::read_to_string(src.path().join("a.h"))?, "ref class Shape;\n");
    Ok(())
}

#[test]
fn test_user_type_list_is_applied() -> Result<()> {
    let src = tempdir()?;
    let dest = tempdir()?;
    let types = src.path().join("types.txt");
    fs::write(&types, "# external assemblies\n\nVendor::Gauge\n")?;
    fs::write(src.path().join("a.cpp"), "Vendor::Gauge* g;\n")?;

    let mut opts = options(src.path(), dest.path());
    opts.managed_types_file = Some(types);
    let report = migrate::run(&opts)?;

    assert!(report.managed_types.contains(&"Vendor::Gauge".to_string()));
    assert_eq!(fs::read_to_string(dest.path().join("a.cpp"))?, "Vendor::Gauge ^ g;\n");
    Ok(())
}

#[test]
fn test_failed_file_does_not_stop_others() -> Result<()> {
    let src = tempdir()?;
    let dest = tempdir()?;
    fs::write(src.path().join("a.h"), "__property int get_X() {\n  return x;\n")?;
    fs::write(src.path().join("b.h"), "int* p = NULL;\n")?;

    let report = migrate::run(&options(src.path(), dest.path()))?;

    assert!(!report.is_success());
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("Unterminated"));
    assert!(!dest.path().join("a.h").exists());
    assert_eq!(fs::read_to_string(dest.path().join("b.h"))?, "int* p = nullptr;\n");
    Ok(())
}

#[test]
fn test_list_types_does_not_write() -> Result<()> {
    let src = tempdir()?;
    fs::write(src.path().join("a.h"), "__gc __interface IShape;\n__value enum Kind { A };\n")?;

    let report = migrate::list_types(&options(src.path(), src.path()))?;

    assert_eq!(report.managed_types[1..], ["IShape".to_string()]);
    assert!(report.converted.is_empty());
    assert_eq!(
        fs::read_to_string(src.path().join("a.h"))?,
        "__gc __interface IShape;\n__value enum Kind { A };\n"
    );
    Ok(())
}

#[test]
fn test_unreadable_file_is_reported_once() -> Result<()> {
    let src = tempdir()?;
    let dest = tempdir()?;
    fs::write(src.path().join("a.h"), [0xff, 0xfe, 0x00])?;
    fs::write(src.path().join("b.h"), "int* p = NULL;\n")?;

    let report = migrate::run(&options(src.path(), dest.path()))?;

    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("a.h"));
    assert_eq!(report.converted, vec![dest.path().join("b.h")]);
    assert!(!dest.path().join("a.h").exists());
    Ok(())
}
