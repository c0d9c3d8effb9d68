//! Build tooling for Cadence plugins.
//!
//! Usage: cargo xtask bundle <package> [--release] [--install]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Directories searched for workspace packages.
const PACKAGE_DIRS: [&str; 2] = ["demos", "crates"];

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 || args[1] != "bundle" {
        print_usage();
        std::process::exit(1);
    }

    let package = &args[2];
    let release = args.iter().any(|a| a == "--release");
    let install = args.iter().any(|a| a == "--install");

    if let Err(e) = bundle(package, release, install) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_usage() {
    eprintln!("Usage: cargo xtask bundle <package> [--release] [--install]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  bundle    Build a plugin and assemble its .lv2 bundle");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --release    Build in release mode");
    eprintln!("  --install    Install to the user LV2 directory");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  cargo xtask bundle cadence-synth --release --install");
}

fn bundle(package: &str, release: bool, install: bool) -> Result<(), String> {
    println!("Bundling {} (release: {})...", package, release);

    let workspace_root = get_workspace_root()?;
    let package_dir = find_package_dir(&workspace_root, package)?;

    println!("Building...");
    let mut cmd = Command::new("cargo");
    cmd.arg("build")
        .arg("-p")
        .arg(package)
        .current_dir(&workspace_root);

    if release {
        cmd.arg("--release");
    }

    let status = cmd.status().map_err(|e| format!("Failed to run cargo: {}", e))?;
    if !status.success() {
        return Err("Build failed".to_string());
    }

    let target_dir = workspace_root
        .join("target")
        .join(if release { "release" } else { "debug" });
    let binary_name = library_file_name(&package.replace('-', "_"));
    let binary_path = target_dir.join(&binary_name);

    if !binary_path.exists() {
        return Err(format!("Built library not found: {}", binary_path.display()));
    }

    // Plugin descriptions shipped next to the package's Cargo.toml
    let ttl_files = find_ttl_files(&package_dir)?;
    let plugin_ttl = ttl_files
        .first()
        .ok_or_else(|| format!("No .ttl file found in {}", package_dir.display()))?;
    let plugin_ttl_content = fs::read_to_string(plugin_ttl)
        .map_err(|e| format!("Failed to read {}: {}", plugin_ttl.display(), e))?;
    let uri = detect_plugin_uri(&plugin_ttl_content)
        .ok_or_else(|| format!("No plugin URI found in {}", plugin_ttl.display()))?;

    let bundle_name = format!("{}.lv2", package);
    let bundle_dir = workspace_root.join("target").join("bundle").join(&bundle_name);

    if bundle_dir.exists() {
        fs::remove_dir_all(&bundle_dir)
            .map_err(|e| format!("Failed to remove old bundle: {}", e))?;
    }
    fs::create_dir_all(&bundle_dir).map_err(|e| format!("Failed to create bundle dir: {}", e))?;

    fs::copy(&binary_path, bundle_dir.join(&binary_name))
        .map_err(|e| format!("Failed to copy library: {}", e))?;

    let mut see_also = Vec::new();
    for ttl in &ttl_files {
        let file_name = ttl
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| format!("Invalid file name: {}", ttl.display()))?;
        fs::copy(ttl, bundle_dir.join(file_name))
            .map_err(|e| format!("Failed to copy {}: {}", file_name, e))?;
        see_also.push(file_name.to_string());
    }

    fs::write(
        bundle_dir.join("manifest.ttl"),
        create_manifest(&uri, &binary_name, &see_also),
    )
    .map_err(|e| format!("Failed to write manifest.ttl: {}", e))?;

    println!("LV2 bundle created: {}", bundle_dir.display());

    if install {
        install_lv2(&bundle_dir, &bundle_name)?;
    }

    Ok(())
}

fn get_workspace_root() -> Result<PathBuf, String> {
    let output = Command::new("cargo")
        .args(["locate-project", "--workspace", "--message-format=plain"])
        .output()
        .map_err(|e| format!("Failed to locate workspace: {}", e))?;

    if !output.status.success() {
        return Err("Failed to locate workspace".to_string());
    }

    let cargo_toml = String::from_utf8_lossy(&output.stdout);
    let path = PathBuf::from(cargo_toml.trim());
    path.parent()
        .map(|p| p.to_path_buf())
        .ok_or_else(|| "Invalid workspace path".to_string())
}

/// Find the directory whose Cargo.toml declares `name = "<package>"`.
fn find_package_dir(workspace_root: &Path, package: &str) -> Result<PathBuf, String> {
    for parent in PACKAGE_DIRS {
        let Ok(entries) = fs::read_dir(workspace_root.join(parent)) else {
            continue;
        };
        for entry in entries.flatten() {
            let dir = entry.path();
            if let Ok(content) = fs::read_to_string(dir.join("Cargo.toml")) {
                if package_name(&content) == Some(package) {
                    return Ok(dir);
                }
            }
        }
    }
    Err(format!("Package not found: {}", package))
}

/// The `name` key of a manifest's `[package]` table.
fn package_name(cargo_toml: &str) -> Option<&str> {
    let mut in_package = false;
    for line in cargo_toml.lines().map(str::trim) {
        if line.starts_with('[') {
            in_package = line == "[package]";
            continue;
        }
        if !in_package {
            continue;
        }
        if let Some(value) = line.strip_prefix("name") {
            let value = value.trim_start().strip_prefix('=')?.trim();
            return value.strip_prefix('"')?.strip_suffix('"');
        }
    }
    None
}

fn find_ttl_files(dir: &Path) -> Result<Vec<PathBuf>, String> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| format!("Failed to read dir: {}", e))?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "ttl"))
        .filter(|path| path.file_name().is_some_and(|name| name != "manifest.ttl"))
        .collect();
    files.sort();
    Ok(files)
}

/// First full-URI subject in a Turtle document.
fn detect_plugin_uri(ttl: &str) -> Option<String> {
    ttl.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('@') && !line.starts_with('#'))
        .find_map(|line| {
            let rest = line.strip_prefix('<')?;
            let end = rest.find('>')?;
            Some(rest[..end].to_string())
        })
}

/// Platform file name of a cdylib.
fn library_file_name(lib_name: &str) -> String {
    if cfg!(target_os = "macos") {
        format!("lib{}.dylib", lib_name)
    } else if cfg!(target_os = "windows") {
        format!("{}.dll", lib_name)
    } else {
        format!("lib{}.so", lib_name)
    }
}

fn create_manifest(uri: &str, binary_name: &str, see_also: &[String]) -> String {
    let see_also = see_also
        .iter()
        .map(|file| format!("<{}>", file))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"@prefix lv2:  <http://lv2plug.in/ns/lv2core#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .

<{uri}>
    a lv2:Plugin ;
    lv2:binary <{binary_name}> ;
    rdfs:seeAlso {see_also} .
"#,
        uri = uri,
        binary_name = binary_name,
        see_also = see_also
    )
}

/// User LV2 directory for the current platform.
fn lv2_install_dir() -> Result<PathBuf, String> {
    if cfg!(target_os = "windows") {
        let appdata = std::env::var("APPDATA").map_err(|_| "APPDATA not set")?;
        return Ok(PathBuf::from(appdata).join("LV2"));
    }

    let home = std::env::var("HOME").map_err(|_| "HOME not set")?;
    let home = PathBuf::from(home);
    if cfg!(target_os = "macos") {
        Ok(home.join("Library").join("Audio").join("Plug-Ins").join("LV2"))
    } else {
        Ok(home.join(".lv2"))
    }
}

fn install_lv2(bundle_dir: &Path, bundle_name: &str) -> Result<(), String> {
    let lv2_dir = lv2_install_dir()?;
    fs::create_dir_all(&lv2_dir).map_err(|e| format!("Failed to create LV2 dir: {}", e))?;

    let dest = lv2_dir.join(bundle_name);

    // Remove existing installation
    if dest.exists() {
        fs::remove_dir_all(&dest).map_err(|e| format!("Failed to remove old installation: {}", e))?;
    }

    copy_dir_all(bundle_dir, &dest)?;

    println!("LV2 installed to: {}", dest.display());
    Ok(())
}

fn copy_dir_all(src: &Path, dst: &Path) -> Result<(), String> {
    fs::create_dir_all(dst).map_err(|e| format!("Failed to create dir: {}", e))?;

    for entry in fs::read_dir(src).map_err(|e| format!("Failed to read dir: {}", e))? {
        let entry = entry.map_err(|e| format!("Failed to read entry: {}", e))?;
        let ty = entry
            .file_type()
            .map_err(|e| format!("Failed to get file type: {}", e))?;

        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if ty.is_dir() {
            copy_dir_all(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)
                .map_err(|e| format!("Failed to copy file: {}", e))?;
        }
    }

    Ok(())
}
